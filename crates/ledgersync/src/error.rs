use std::fmt;

/// A raw record skipped during normalization because a required field was
/// absent. Accumulated per batch and surfaced in the end-of-run summary;
/// the rest of the batch still reconciles normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    /// An account record missing a required field. Its transactions are
    /// skipped along with it.
    Account { account: String, field: &'static str },
    /// A transaction record missing a required field.
    Transaction {
        account: String,
        transaction_id: Option<String>,
        field: &'static str,
    },
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account { account, field } => {
                write!(f, "account '{account}': missing required field '{field}'")
            }
            Self::Transaction {
                account,
                transaction_id: Some(id),
                field,
            } => {
                write!(
                    f,
                    "account '{account}', transaction '{id}': missing required field '{field}'"
                )
            }
            Self::Transaction {
                account,
                transaction_id: None,
                field,
            } => {
                write!(f, "account '{account}': transaction missing required field '{field}'")
            }
        }
    }
}

impl std::error::Error for MalformedRecord {}
