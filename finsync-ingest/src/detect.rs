//! Statement format detection.
//!
//! Keyword families overlap ("resumen de cuenta" is printed on both wallet
//! exports and card statements), so ledger signals are checked before card
//! keywords. The generic feed is the universal fallback.

use crate::parsers::structured_ledger::row_shape_re;
use crate::types::StatementFormat;

/// Headers printed verbatim on wallet account exports
const LEDGER_HEADERS: &[&str] = &["RESUMEN DE CUENTA", "DETALLE DE MOVIMIENTOS"];

/// Matched case-insensitively
const LEDGER_PHRASES: &[&str] = &["mercado pago"];

/// Matched case-insensitively against the whole text
const CARD_KEYWORDS: &[&str] = &[
    "tarjeta de crédito",
    "tarjeta de credito",
    "cuota/plan",
    "resumen de cuenta",
    "pago mínimo",
    "pago minimo",
    "consumos tarjeta",
    "naranja x",
];

/// Outcome of format detection, with the signal that decided it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub format: StatementFormat,
    pub signal: String,
}

impl Detection {
    fn new(format: StatementFormat, signal: impl Into<String>) -> Self {
        Self {
            format,
            signal: signal.into(),
        }
    }
}

/// Classify raw text into a statement format. Never fails.
pub fn detect_format(text: &str) -> Detection {
    if let Some(signal) = ledger_signal(text) {
        return Detection::new(StatementFormat::StructuredLedger, signal);
    }

    let lower = text.to_lowercase();
    if let Some(keyword) = CARD_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        return Detection::new(StatementFormat::CreditCard, format!("keyword '{keyword}'"));
    }

    Detection::new(StatementFormat::GenericFeed, "default")
}

fn ledger_signal(text: &str) -> Option<String> {
    if let Some(header) = LEDGER_HEADERS.iter().find(|h| text.contains(*h)) {
        return Some(format!("header '{header}'"));
    }

    let lower = text.to_lowercase();
    if let Some(phrase) = LEDGER_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Some(format!("phrase '{phrase}'"));
    }

    row_shape_re()
        .is_match(text)
        .then(|| "date/amount/balance row".to_string())
}
