pub mod error;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod staleness;

pub type Decimal = rust_decimal::Decimal;

pub use model::{AccountSnapshot, Correction, HighlightSet, Ledger, RunContext, Transaction};
pub use reconcile::{ReconcileOutcome, reconcile};
