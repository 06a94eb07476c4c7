use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::Decimal;

/// A single ledger row. `id` is the stable identifier assigned by the
/// source system and the only deduplication key; everything else is
/// payload that the ledger owns once the row has been written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account: String,
    pub description: String,
    pub payee: String,
    pub amount: Decimal,
    pub transacted_at: NaiveDate,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
}

/// Per-run balance reading for one account. One row is appended to the
/// history log every run regardless of whether anything changed; snapshots
/// are never merged or deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_name: String,
    pub balance: Decimal,
    pub balance_updated_at: NaiveDateTime,
    pub run_at: NaiveDateTime,
}

/// The persisted, deduplicated sequence of transactions accumulated across
/// runs. Kept sorted ascending by `transacted_at` with merge-relative order
/// among equal dates; rows are never deleted or mutated aside from the
/// positional resort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<Transaction>,
}

impl Ledger {
    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        Ledger { entries }
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ids added to the ledger in the current run. Identity-based on purpose:
/// the final written order is fully re-sorted, so a row-index range computed
/// before sorting would not point at the same logical rows afterwards.
pub type HighlightSet = HashSet<String>;

/// Static per-account correction applied before any other processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// Replace the account's display name; propagates to all transactions.
    Rename(String),
    /// Drop the account entirely: no snapshot, no transactions.
    Exclude,
}

pub const DEFAULT_THRESHOLD_DAYS: i64 = 3;

/// Everything a run needs from the outside world, threaded explicitly
/// instead of read from ambient environment.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub now: NaiveDateTime,
    pub threshold_days: i64,
    /// Keyed by source account id.
    pub corrections: BTreeMap<String, Correction>,
}

impl RunContext {
    pub fn new(now: NaiveDateTime) -> Self {
        RunContext {
            now,
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            corrections: BTreeMap::new(),
        }
    }
}
