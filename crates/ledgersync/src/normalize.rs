//! Mapping raw source records into canonical snapshots and transactions.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::Deserialize;
use tracing::warn;

use crate::Decimal;
use crate::error::MalformedRecord;
use crate::model::{AccountSnapshot, Correction, RunContext, Transaction};

/// Raw account object as returned by the source `/accounts` endpoint.
///
/// Validation-relevant fields are optional at the serde layer so a single
/// malformed record can be skipped without failing the whole payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAccount {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default, rename = "balance-date")]
    pub balance_date: Option<i64>,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// Raw transaction object. `posted` and `transacted_at` are epoch seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub posted: Option<i64>,
    #[serde(default)]
    pub transacted_at: Option<i64>,
}

/// Output of one normalization pass over a fetched payload.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub snapshots: Vec<AccountSnapshot>,
    pub transactions: Vec<Transaction>,
    pub malformed: Vec<MalformedRecord>,
}

/// Maps raw accounts into snapshots and transactions, applying the
/// correction table from `ctx` first. Pure aside from tracing; records
/// missing required fields are skipped and reported, never fatal.
pub fn normalize(raw_accounts: Vec<RawAccount>, ctx: &RunContext) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (index, raw) in raw_accounts.into_iter().enumerate() {
        normalize_account(index, raw, ctx, &mut batch);
    }
    batch
}

fn normalize_account(index: usize, raw: RawAccount, ctx: &RunContext, batch: &mut NormalizedBatch) {
    let label = raw
        .id
        .clone()
        .or_else(|| raw.name.clone())
        .unwrap_or_else(|| format!("#{index}"));

    // Corrections are keyed by the source account id.
    let correction = raw.id.as_deref().and_then(|id| ctx.corrections.get(id));
    if let Some(Correction::Exclude) = correction {
        return;
    }

    let skip = |field: &'static str, batch: &mut NormalizedBatch| {
        warn!(account = %label, field, "skipping malformed account");
        batch.malformed.push(MalformedRecord::Account {
            account: label.clone(),
            field,
        });
    };

    let Some(name) = raw.name else {
        skip("name", batch);
        return;
    };
    let Some(balance) = raw.balance else {
        skip("balance", batch);
        return;
    };
    let Some(balance_date) = raw.balance_date else {
        skip("balance-date", batch);
        return;
    };
    let Some(balance_updated_at) = epoch_to_local(balance_date) else {
        skip("balance-date", batch);
        return;
    };

    let name = match correction {
        Some(Correction::Rename(renamed)) => renamed.clone(),
        _ => name,
    };

    batch.snapshots.push(AccountSnapshot {
        account_name: name.clone(),
        balance,
        balance_updated_at,
        run_at: ctx.now,
    });

    for raw_txn in raw.transactions {
        match normalize_transaction(&name, raw_txn) {
            Ok(txn) => batch.transactions.push(txn),
            Err(err) => {
                warn!(%err, "skipping malformed transaction");
                batch.malformed.push(err);
            }
        }
    }
}

fn normalize_transaction(
    account: &str,
    raw: RawTransaction,
) -> Result<Transaction, MalformedRecord> {
    let Some(id) = raw.id else {
        return Err(MalformedRecord::Transaction {
            account: account.to_owned(),
            transaction_id: None,
            field: "id",
        });
    };
    let missing = |field: &'static str| MalformedRecord::Transaction {
        account: account.to_owned(),
        transaction_id: Some(id.clone()),
        field,
    };

    let amount = raw.amount.ok_or_else(|| missing("amount"))?;
    // The source dates transactions twice; `transacted_at` wins, `posted`
    // fills in when it is absent.
    let date_epoch = raw
        .transacted_at
        .or(raw.posted)
        .ok_or_else(|| missing("transacted_at"))?;
    let transacted_at = epoch_to_local(date_epoch)
        .ok_or_else(|| missing("transacted_at"))?
        .date();

    Ok(Transaction {
        id: id.clone(),
        account: account.to_owned(),
        description: raw.description.unwrap_or_default(),
        payee: raw.payee.unwrap_or_default(),
        amount,
        transacted_at,
        category: String::new(),
        subcategory: String::new(),
    })
}

/// Converts source epoch seconds into a local timestamp. None for epochs
/// chrono cannot represent.
pub(crate) fn epoch_to_local(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&Local).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_account(value: serde_json::Value) -> RawAccount {
        serde_json::from_value(value).unwrap()
    }

    fn ctx() -> RunContext {
        RunContext::new("2024-01-05T08:00:00".parse().unwrap())
    }

    #[test]
    fn maps_accounts_and_transactions() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance": "1204.50",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                {
                    "id": "txn-1",
                    "description": "Coffee",
                    "amount": "-4.50",
                    "payee": "Cafe",
                    "posted": 1_700_000_000i64,
                    "transacted_at": 1_699_900_000i64
                }
            ]
        }));

        let batch = normalize(vec![raw], &ctx());

        assert!(batch.malformed.is_empty());
        assert_eq!(batch.snapshots.len(), 1);
        let snapshot = &batch.snapshots[0];
        assert_eq!(snapshot.account_name, "Checking");
        assert_eq!(snapshot.balance, "1204.50".parse::<Decimal>().unwrap());
        assert_eq!(snapshot.balance_updated_at, epoch_to_local(1_700_000_000).unwrap());
        assert_eq!(snapshot.run_at, ctx().now);

        assert_eq!(batch.transactions.len(), 1);
        let txn = &batch.transactions[0];
        assert_eq!(txn.id, "txn-1");
        assert_eq!(txn.account, "Checking");
        assert_eq!(txn.amount, "-4.50".parse::<Decimal>().unwrap());
        assert_eq!(txn.transacted_at, epoch_to_local(1_699_900_000).unwrap().date());
        assert_eq!(txn.category, "");
        assert_eq!(txn.subcategory, "");
    }

    #[test]
    fn transaction_date_falls_back_to_posted() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance": "0",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "id": "txn-1", "amount": "1.00", "posted": 1_700_000_000i64 }
            ]
        }));

        let batch = normalize(vec![raw], &ctx());

        assert!(batch.malformed.is_empty());
        assert_eq!(
            batch.transactions[0].transacted_at,
            epoch_to_local(1_700_000_000).unwrap().date()
        );
    }

    #[test]
    fn missing_transactions_defaults_to_empty() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance": "0",
            "balance-date": 1_700_000_000i64
        }));

        let batch = normalize(vec![raw], &ctx());

        assert_eq!(batch.snapshots.len(), 1);
        assert!(batch.transactions.is_empty());
        assert!(batch.malformed.is_empty());
    }

    #[test]
    fn malformed_transaction_is_skipped_not_fatal() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance": "0",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "id": "txn-1", "posted": 1_700_000_000i64 },
                { "id": "txn-2", "amount": "2.00", "posted": 1_700_000_000i64 }
            ]
        }));

        let batch = normalize(vec![raw], &ctx());

        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].id, "txn-2");
        assert_eq!(
            batch.malformed,
            vec![MalformedRecord::Transaction {
                account: "Checking".into(),
                transaction_id: Some("txn-1".into()),
                field: "amount",
            }]
        );
    }

    #[test]
    fn transaction_without_id_is_reported() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance": "0",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "amount": "2.00", "posted": 1_700_000_000i64 }
            ]
        }));

        let batch = normalize(vec![raw], &ctx());

        assert!(batch.transactions.is_empty());
        assert_eq!(
            batch.malformed,
            vec![MalformedRecord::Transaction {
                account: "Checking".into(),
                transaction_id: None,
                field: "id",
            }]
        );
    }

    #[test]
    fn transaction_without_any_date_is_reported() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance": "0",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "id": "txn-1", "amount": "2.00" }
            ]
        }));

        let batch = normalize(vec![raw], &ctx());

        assert!(batch.transactions.is_empty());
        assert_eq!(
            batch.malformed,
            vec![MalformedRecord::Transaction {
                account: "Checking".into(),
                transaction_id: Some("txn-1".into()),
                field: "transacted_at",
            }]
        );
    }

    #[test]
    fn malformed_account_skips_its_transactions() {
        let broken = raw_account(json!({
            "id": "ACT-1",
            "name": "Checking",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "id": "txn-1", "amount": "2.00", "posted": 1_700_000_000i64 }
            ]
        }));
        let intact = raw_account(json!({
            "id": "ACT-2",
            "name": "Savings",
            "balance": "50.00",
            "balance-date": 1_700_000_000i64
        }));

        let batch = normalize(vec![broken, intact], &ctx());

        assert_eq!(batch.snapshots.len(), 1);
        assert_eq!(batch.snapshots[0].account_name, "Savings");
        assert!(batch.transactions.is_empty());
        assert_eq!(
            batch.malformed,
            vec![MalformedRecord::Account {
                account: "ACT-1".into(),
                field: "balance",
            }]
        );
    }

    #[test]
    fn rename_correction_propagates_to_transactions() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "SIMPLEFIN CHK 0231",
            "balance": "0",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "id": "txn-1", "amount": "2.00", "posted": 1_700_000_000i64 }
            ]
        }));
        let mut ctx = ctx();
        ctx.corrections
            .insert("ACT-1".into(), Correction::Rename("Checking".into()));

        let batch = normalize(vec![raw], &ctx);

        assert_eq!(batch.snapshots[0].account_name, "Checking");
        assert_eq!(batch.transactions[0].account, "Checking");
    }

    #[test]
    fn exclude_correction_drops_the_account() {
        let raw = raw_account(json!({
            "id": "ACT-1",
            "name": "Closed card",
            "balance": "0",
            "balance-date": 1_700_000_000i64,
            "transactions": [
                { "id": "txn-1", "amount": "2.00", "posted": 1_700_000_000i64 }
            ]
        }));
        let mut ctx = ctx();
        ctx.corrections.insert("ACT-1".into(), Correction::Exclude);

        let batch = normalize(vec![raw], &ctx);

        assert!(batch.snapshots.is_empty());
        assert!(batch.transactions.is_empty());
        assert!(batch.malformed.is_empty());
    }
}
