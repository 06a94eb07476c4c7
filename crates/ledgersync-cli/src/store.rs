//! CSV ledger store.
//!
//! The ledger itself is written to a temp file and renamed into place, so
//! an aborted run never leaves a torn ledger behind. The account history is
//! append-only; the highlight sidecar is rewritten each run.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use ledgersync::Decimal;
use ledgersync::model::{AccountSnapshot, HighlightSet, Ledger, Transaction};
use serde::{Deserialize, Serialize};
use tracing::info;

const LEDGER_FILE: &str = "ledger.csv";
const HISTORY_FILE: &str = "account_history.csv";
const HIGHLIGHT_FILE: &str = "last_run.json";

/// Fixed ledger column order, decoupled from the model's field order.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    account: String,
    id: String,
    description: String,
    amount: Decimal,
    payee: String,
    transacted_at: NaiveDate,
    #[serde(default)]
    category: String,
    #[serde(default)]
    subcategory: String,
}

impl From<&Transaction> for LedgerRow {
    fn from(txn: &Transaction) -> Self {
        LedgerRow {
            account: txn.account.clone(),
            id: txn.id.clone(),
            description: txn.description.clone(),
            amount: txn.amount,
            payee: txn.payee.clone(),
            transacted_at: txn.transacted_at,
            category: txn.category.clone(),
            subcategory: txn.subcategory.clone(),
        }
    }
}

impl From<LedgerRow> for Transaction {
    fn from(row: LedgerRow) -> Self {
        Transaction {
            id: row.id,
            account: row.account,
            description: row.description,
            payee: row.payee,
            amount: row.amount,
            transacted_at: row.transacted_at,
            category: row.category,
            subcategory: row.subcategory,
        }
    }
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    acct_name: &'a str,
    date_updated: NaiveDateTime,
    balance: Decimal,
    date_run: NaiveDateTime,
}

/// Identity-keyed highlight metadata for presentation layers.
#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightMeta {
    pub run_at: NaiveDateTime,
    pub new_ids: Vec<String>,
}

pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LedgerStore { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Reads the prior ledger. A missing file is the first run and yields
    /// an empty ledger; any other failure is fatal, since assuming empty
    /// would mass-duplicate rows on the next write.
    pub fn read_ledger(&self) -> Result<Ledger> {
        let path = self.path(LEDGER_FILE);
        if !path.exists() {
            return Ok(Ledger::default());
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open ledger: {}", path.display()))?;
        let mut entries = Vec::new();
        for row in reader.deserialize::<LedgerRow>() {
            let row =
                row.with_context(|| format!("Failed to read ledger: {}", path.display()))?;
            entries.push(row.into());
        }
        Ok(Ledger::from_entries(entries))
    }

    pub fn write_ledger(&self, ledger: &Ledger) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data dir: {}", self.dir.display()))?;

        let path = self.path(LEDGER_FILE);
        let tmp = self.path("ledger.csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)
                .with_context(|| format!("Failed to create ledger: {}", tmp.display()))?;
            for txn in ledger.entries() {
                writer.serialize(LedgerRow::from(txn))?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace ledger: {}", path.display()))?;

        info!(rows = ledger.len(), path = %path.display(), "wrote ledger");
        Ok(())
    }

    /// Appends one history row per snapshot. The header is only written
    /// when the file does not hold one yet.
    pub fn append_history(&self, snapshots: &[AccountSnapshot]) -> Result<()> {
        if snapshots.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data dir: {}", self.dir.display()))?;

        let path = self.path(HISTORY_FILE);
        // An empty file still needs the header, regardless of how it came
        // to exist.
        let write_header = fs::metadata(&path).map_or(true, |meta| meta.len() == 0);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open history: {}", path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for snapshot in snapshots {
            writer.serialize(HistoryRow {
                acct_name: &snapshot.account_name,
                date_updated: snapshot.balance_updated_at,
                balance: snapshot.balance,
                date_run: snapshot.run_at,
            })?;
        }
        writer.flush()?;

        info!(rows = snapshots.len(), path = %path.display(), "appended account history");
        Ok(())
    }

    /// Rewrites the highlight sidecar with this run's added ids, sorted for
    /// stable output.
    pub fn write_highlights(&self, run_at: NaiveDateTime, added: &HighlightSet) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data dir: {}", self.dir.display()))?;

        let mut new_ids: Vec<String> = added.iter().cloned().collect();
        new_ids.sort_unstable();
        let meta = HighlightMeta { run_at, new_ids };

        let path = self.path(HIGHLIGHT_FILE);
        let contents = serde_json::to_string_pretty(&meta)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write highlights: {}", path.display()))?;
        Ok(())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.path(LEDGER_FILE)
    }
}
