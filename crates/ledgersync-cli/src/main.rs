use anyhow::Result;

fn main() -> Result<()> {
    ledgersync_cli::run(std::env::args())
}
