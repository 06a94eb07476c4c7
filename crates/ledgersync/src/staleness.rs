//! Flagging accounts whose upstream balance data has gone stale.

use crate::model::AccountSnapshot;

/// Returns the accounts whose balance-update timestamp lags the run time by
/// strictly more than `threshold_days` whole days. The delta is the absolute
/// difference truncated to whole days (total elapsed seconds / 86400), so a
/// delta equal to the threshold is not flagged.
pub fn stale_accounts(snapshots: &[AccountSnapshot], threshold_days: i64) -> Vec<String> {
    snapshots
        .iter()
        .filter(|snapshot| {
            let days = (snapshot.run_at - snapshot.balance_updated_at).num_days().abs();
            days > threshold_days
        })
        .map(|snapshot| snapshot.account_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decimal;
    use chrono::NaiveDateTime;

    fn snapshot(name: &str, updated_at: &str, run_at: &str) -> AccountSnapshot {
        AccountSnapshot {
            account_name: name.into(),
            balance: Decimal::new(100_00, 2),
            balance_updated_at: updated_at.parse::<NaiveDateTime>().unwrap(),
            run_at: run_at.parse::<NaiveDateTime>().unwrap(),
        }
    }

    #[test]
    fn flags_account_beyond_threshold() {
        let snapshots = vec![snapshot("Checking", "2024-01-01T00:00:00", "2024-01-05T00:00:00")];

        assert_eq!(stale_accounts(&snapshots, 3), vec!["Checking"]);
    }

    #[test]
    fn delta_equal_to_threshold_is_not_flagged() {
        let snapshots = vec![snapshot("Checking", "2024-01-01T00:00:00", "2024-01-04T00:00:00")];

        assert!(stale_accounts(&snapshots, 3).is_empty());
    }

    #[test]
    fn fractional_days_truncate() {
        // 3 days and 23 hours still truncates to 3 whole days.
        let snapshots = vec![snapshot("Checking", "2024-01-01T00:00:00", "2024-01-04T23:00:00")];

        assert!(stale_accounts(&snapshots, 3).is_empty());
    }

    #[test]
    fn delta_is_absolute() {
        // Balance timestamp ahead of the run clock counts the same way.
        let snapshots = vec![snapshot("Checking", "2024-01-10T00:00:00", "2024-01-05T00:00:00")];

        assert_eq!(stale_accounts(&snapshots, 3), vec!["Checking"]);
    }

    #[test]
    fn keeps_snapshot_order_and_only_stale_accounts() {
        let snapshots = vec![
            snapshot("Fresh", "2024-01-05T00:00:00", "2024-01-05T12:00:00"),
            snapshot("Dormant", "2023-12-01T00:00:00", "2024-01-05T12:00:00"),
            snapshot("Lagging", "2024-01-01T00:00:00", "2024-01-05T12:00:00"),
        ];

        assert_eq!(stale_accounts(&snapshots, 3), vec!["Dormant", "Lagging"]);
    }
}
