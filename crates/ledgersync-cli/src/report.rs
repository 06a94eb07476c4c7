use anstyle::{AnsiColor, Color, Style};
use ledgersync::error::MalformedRecord;
use ledgersync::reconcile::ReconcileOutcome;

/// End-of-run summary: what was added (in final ledger order), which
/// accounts are stale, and which records were skipped.
pub fn print_summary(
    outcome: &ReconcileOutcome,
    stale: &[String],
    malformed: &[MalformedRecord],
    wrote: bool,
) {
    let added_style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let stale_style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    let skip_style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
    let reset = Style::new();

    if outcome.is_unchanged() {
        println!(
            "✓ Ledger already up to date ({} transaction(s))",
            outcome.ledger.len()
        );
    } else {
        let verb = if wrote { "added" } else { "would add" };
        println!(
            "{added_style}{}{reset} transaction(s) {verb}, ledger now {} row(s)",
            outcome.added.len(),
            outcome.ledger.len()
        );
        for txn in outcome.ledger.entries() {
            if outcome.added.contains(&txn.id) {
                println!(
                    "  {} {:>10} {} {}",
                    txn.transacted_at, txn.amount, txn.account, txn.description
                );
            }
        }
    }

    if !stale.is_empty() {
        println!(
            "{stale_style}{}{reset} account(s) with stale balances: {}",
            stale.len(),
            stale.join(", ")
        );
    }

    for record in malformed {
        println!("{skip_style}skipped{reset} {record}");
    }
}
