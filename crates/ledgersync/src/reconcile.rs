//! Merging a freshly fetched batch into the persisted ledger without
//! duplicating rows across overlapping fetch windows.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{HighlightSet, Ledger, Transaction};

/// Result of merging one fetched batch into the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub ledger: Ledger,
    /// Ids of the rows introduced by this run, for presentation marking.
    pub added: HighlightSet,
}

impl ReconcileOutcome {
    /// True when the batch introduced nothing new. The returned ledger then
    /// equals the input exactly and callers may skip the write round-trip.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty()
    }
}

/// Merges `incoming` into `existing`, appending only transactions whose id
/// has not been seen before.
///
/// Re-fetching the same transaction across overlapping date windows is
/// expected; duplicates are discarded silently, and an existing row is
/// preserved field-for-field even when the same id reappears upstream with
/// different values. Duplicate ids within the batch itself keep the first
/// occurrence.
///
/// The returned ledger is stable-sorted ascending by `transacted_at`:
/// among equal dates existing rows precede newly added ones, and newly
/// added ones keep their source order. `existing` is never mutated.
pub fn reconcile(existing: &Ledger, incoming: Vec<Transaction>) -> ReconcileOutcome {
    let mut seen: HashSet<String> = existing
        .entries()
        .iter()
        .map(|txn| txn.id.clone())
        .collect();

    let mut novel = Vec::new();
    for txn in incoming {
        if seen.insert(txn.id.clone()) {
            novel.push(txn);
        }
    }

    if novel.is_empty() {
        return ReconcileOutcome {
            ledger: existing.clone(),
            added: HighlightSet::new(),
        };
    }

    let added: HighlightSet = novel.iter().map(|txn| txn.id.clone()).collect();

    let mut entries = existing.entries().to_vec();
    entries.extend(novel);
    entries.sort_by_key(|txn| txn.transacted_at);

    debug!(
        added = added.len(),
        total = entries.len(),
        "merged batch into ledger"
    );

    ReconcileOutcome {
        ledger: Ledger::from_entries(entries),
        added,
    }
}
