//! finsync-ingest: statement text cleanup, format detection and the per-format parsers.

pub mod types;
pub mod normalize;
pub mod amount;
pub mod detect;
pub mod parsers;

pub use types::{CardIssuer, CreditCardRow, CreditCardStatement, StatementFormat};
pub use detect::{detect_format, Detection};
pub use normalize::clean_line;
pub use amount::normalize_amount;
