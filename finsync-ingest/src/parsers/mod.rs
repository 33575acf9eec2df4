//! Per-format statement parsers. Each one turns raw text into candidates with
//! canonical dates and unsigned amounts.

pub mod credit_card;
pub mod generic_feed;
pub mod structured_ledger;

pub use credit_card::{parse_credit_card_statement, project_installments};
pub use generic_feed::{parse_generic_feed, FeedParser, FeedScanner, LineKind, Transition};
pub use structured_ledger::parse_structured_ledger;
