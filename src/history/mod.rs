pub mod ledger;

pub use ledger::{HistoryEntry, HistoryLedger};
