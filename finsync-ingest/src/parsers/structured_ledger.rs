//! Wallet account export parser (PDF text)
//!
//! Expected extracted text (page items joined with spaces):
//!   RESUMEN DE CUENTA ... DETALLE DE MOVIMIENTOS
//!   Fecha Descripción ID de la operación Valor Saldo
//!   01-01-2026 Pago Google 139632256637 $ -37.866,12 $ 342.235,94
//!
//! Rows are matched against the whole text, not line by line, because PDF
//! extraction often returns a page as one long line.

use std::sync::OnceLock;

use anyhow::Result;
use chrono::NaiveDate;
use finsync_core::{CandidateEntry, Direction};
use regex::{Captures, Regex};
use tracing::debug;

use crate::amount::normalize_amount;

/// "DD-MM-YYYY"
const ROW_DATE: &str = r"(?P<date>\d{2}-\d{2}-\d{4})";

/// "$ -37.866,12 $ 342.235,94": signed value, then the running balance
const VALUE_BALANCE: &str = r"\$\s*(?P<value>-?[\d.,]+)\s+\$\s*(?P<balance>[\d.,]+)";

/// Any "date ... $ value $ balance" row. Format detection keys on the same shape.
pub(crate) fn row_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("{ROW_DATE}.*{VALUE_BALANCE}")).expect("invalid ledger row pattern"))
}

fn parse_dd_mm_yyyy(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d-%m-%Y").ok()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a candidate from a row capture; the value's sign decides direction.
fn row_to_candidate(caps: &Captures) -> Option<CandidateEntry> {
    let date = parse_dd_mm_yyyy(&caps["date"])?;
    let value = normalize_amount(&caps["value"])?;
    let description = collapse_whitespace(&caps["desc"]);
    if description.is_empty() {
        return None;
    }

    Some(CandidateEntry::new(
        caps[0].trim(),
        date,
        description,
        value.abs(),
        Direction::from_signed(value),
    ))
}

/// Parse a structured ledger export into candidates.
///
/// The primary pattern expects an operation id (10+ digits) and a trailing
/// balance. The looser `date description $ value` pattern is used only when
/// the primary one finds nothing.
pub fn parse_structured_ledger(text: &str) -> Result<Vec<CandidateEntry>> {
    // DATE DESCRIPTION ID VALUE BALANCE
    let row_re = Regex::new(&format!(
        r"{ROW_DATE}\s+(?P<desc>.+?)\s+(?P<id>\d{{10,}})\s+{VALUE_BALANCE}"
    ))?;

    // DATE DESCRIPTION VALUE
    let alt_re = Regex::new(concat!(
        r"(?P<date>\d{2}-\d{2}-\d{4})\s+",
        r"(?P<desc>[\p{L}*' ]+?)\s+",
        r"\$\s*(?P<value>-?[\d.,]+)"
    ))?;

    let mut out: Vec<CandidateEntry> = row_re
        .captures_iter(text)
        .filter_map(|caps| row_to_candidate(&caps))
        .collect();

    if out.is_empty() {
        out = alt_re
            .captures_iter(text)
            .filter_map(|caps| row_to_candidate(&caps))
            .collect();
        debug!(rows = out.len(), "structured ledger: secondary pattern");
    } else {
        debug!(rows = out.len(), "structured ledger: primary pattern");
    }

    Ok(out)
}
