//! finsync-core: shared ledger types and calendar helpers for the import pipeline

pub mod finance;
pub mod time;

pub use finance::{CandidateEntry, ClassificationRule, Direction, LedgerEntry, MatchType};
pub use time::{add_months_clamped, today_in};
