//! Credit-card statement parser (Naranja X layout, PDF text)
//!
//! Expected purchase section:
//!   FECHA    TARJETA    CUPON  DETALLE    CUOTA/PLAN    $
//!   17/11/25 NX Virtual 64     CEFIROGAS  02/12         114.501,58
//!
//! A row billed as installment 2 of 12 also yields projected rows for
//! installments 3..12, one month apart, so upcoming charges show up in review.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use finsync_core::{add_months_clamped, CandidateEntry, Direction};
use regex::{Captures, Regex};
use tracing::debug;

use crate::amount::normalize_amount;
use crate::types::{CardIssuer, CreditCardRow, CreditCardStatement};

const UNKNOWN_HOLDER: &str = "Titular Desconocido";
const FALLBACK_DESCRIPTION: &str = "Consumo";

/// Column layout: date, card label, voucher, detail, optional installment pair, amount
const ROW_PATTERN: &str = concat!(
    r"(?P<date>\d{2}/\d{2}/\d{2})\b[ \t]+",
    r"(?P<card>.+?)[ \t]+",
    r"(?P<voucher>\d+)[ \t]+",
    r"(?P<desc>.+?)[ \t]+",
    r"(?:(?P<current>\d{2})/(?P<total>\d{2})[ \t]+)?",
    r"(?P<amount>\d[\d.]*,\d{2})"
);

/// Line-level fallbacks, loosest last. The first one that yields rows wins.
const LINE_PATTERNS: &[(&str, &str)] = &[
    (
        "full date + installments",
        r"^(?P<date>\d{2}/\d{2}/\d{4})[ \t]+(?P<desc>.+?)[ \t]+(?P<current>\d{2})/(?P<total>\d{2})[ \t]+(?P<amount>\d[\d.]*,\d{2})",
    ),
    (
        "full date + amount",
        r"^(?P<date>\d{2}/\d{2}/\d{4})[ \t]+(?P<desc>.+?)[ \t]+(?P<amount>\d[\d.]*,\d{2})",
    ),
    (
        "short date + installments",
        r"(?P<date>\d{2}/\d{2}/\d{2})\b[ \t]+(?P<desc>.+)[ \t]+(?P<current>\d{2})/(?P<total>\d{2})[ \t]+(?P<amount>[\d.,]+)",
    ),
];

/// Parse "DD/MM/YY" (20YY) or "DD/MM/YYYY"
fn parse_card_date(s: &str) -> Option<NaiveDate> {
    let mut it = s.trim().split('/');
    let d: u32 = it.next()?.parse().ok()?;
    let m: u32 = it.next()?.parse().ok()?;
    let y_str = it.next()?;
    let mut y: i32 = y_str.parse().ok()?;
    if y_str.len() == 2 {
        y += 2000;
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Detail text of a loose row: whatever follows the last voucher-like number
fn fallback_description(middle: &str) -> String {
    let tokens: Vec<&str> = middle.split_whitespace().collect();
    let after_voucher = tokens
        .iter()
        .rposition(|t| t.len() >= 4 && t.chars().all(|c| c.is_ascii_digit()))
        .map(|i| tokens[i + 1..].join(" "))
        .filter(|s| !s.is_empty());

    match after_voucher {
        Some(desc) => desc,
        None if !tokens.is_empty() => tokens.join(" "),
        None => FALLBACK_DESCRIPTION.to_string(),
    }
}

fn installment_pair(caps: &Captures) -> (Option<u32>, Option<u32>) {
    let current = caps.name("current").and_then(|m| m.as_str().parse().ok());
    let total = caps.name("total").and_then(|m| m.as_str().parse().ok());
    match (current, total) {
        (Some(c), Some(t)) if c > 0 && t > 0 => (Some(c), Some(t)),
        _ => (None, None),
    }
}

fn build_row(
    raw: &str,
    date: NaiveDate,
    description: String,
    amount: f64,
    pair: (Option<u32>, Option<u32>),
) -> CreditCardRow {
    let (current, total) = pair;
    CreditCardRow {
        entry: CandidateEntry::new(raw.trim(), date, description, amount, Direction::Out),
        current_installment: current,
        total_installments: total,
        original_amount: total.map(|t| amount * t as f64),
    }
}

/// One projected row per installment left after `row`, each with the billed
/// per-installment amount, the purchase day held fixed and the counter appended.
pub fn project_installments(row: &CreditCardRow) -> Vec<CreditCardRow> {
    let remaining = row.remaining_installments();
    let (Some(current), Some(total)) = (row.current_installment, row.total_installments) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(remaining as usize);
    for k in (current + 1)..=total {
        let Some(date) = add_months_clamped(row.entry.date, k - current) else {
            continue;
        };
        let description = format!("{} (Cuota {}/{})", row.entry.description, k, total);
        out.push(CreditCardRow {
            entry: CandidateEntry::new(
                row.entry.raw_text.clone(),
                date,
                description,
                row.entry.amount,
                Direction::Out,
            ),
            current_installment: Some(k),
            total_installments: Some(total),
            original_amount: row.original_amount,
        });
    }
    out
}

fn column_rows(text: &str) -> Result<Vec<CreditCardRow>> {
    let row_re = Regex::new(ROW_PATTERN)?;
    let rows = row_re
        .captures_iter(text)
        .filter_map(|caps| {
            let date = parse_card_date(&caps["date"])?;
            let amount = normalize_amount(&caps["amount"])?;
            let description = caps["desc"].trim().to_string();
            Some(build_row(&caps[0], date, description, amount, installment_pair(&caps)))
        })
        .collect();
    Ok(rows)
}

fn line_rows(text: &str) -> Result<Vec<CreditCardRow>> {
    for (name, pattern) in LINE_PATTERNS {
        let re = Regex::new(pattern)?;
        let rows: Vec<CreditCardRow> = text
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let caps = re.captures(line)?;
                let date = parse_card_date(&caps["date"])?;
                let amount = normalize_amount(&caps["amount"])?;
                let description = fallback_description(&caps["desc"]);
                Some(build_row(line, date, description, amount, installment_pair(&caps)))
            })
            .collect();

        if !rows.is_empty() {
            debug!(pattern = name, rows = rows.len(), "credit card: line fallback matched");
            return Ok(rows);
        }
    }
    Ok(Vec::new())
}

/// Parse a credit-card statement.
///
/// Returns `Ok(None)` when no purchase row could be found with any pattern;
/// the caller should then try the generic feed parser on the same text.
/// `today` is the statement date and the year for the "DD/MM" due date.
pub fn parse_credit_card_statement(text: &str, today: NaiveDate) -> Result<Option<CreditCardStatement>> {
    let holder_re = Regex::new(r"(?im)Consumos tarjeta de cr[ée]dito de (?P<name>.+?)\s*$")?;
    let total_re = Regex::new(r"(?i)\bTotal\s*\$?\s*(?P<amount>\d[\d.,]*)")?;
    let due_re = Regex::new(r"(?i)vencimiento.+?(?P<day>\d{2})/(?P<month>\d{2})")?;

    let mut rows = column_rows(text)?;
    if rows.is_empty() {
        debug!("credit card: column pattern found no rows, trying line patterns");
        rows = line_rows(text)?;
    }
    if rows.is_empty() {
        debug!("credit card: statement unparseable");
        return Ok(None);
    }

    let card_holder = holder_re
        .captures(text)
        .map(|c| c["name"].trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOLDER.to_string());

    let total_amount = total_re
        .captures(text)
        .and_then(|c| normalize_amount(&c["amount"]))
        .unwrap_or(0.0);

    let due_date = due_re.captures(text).and_then(|c| {
        let day: u32 = c["day"].parse().ok()?;
        let month: u32 = c["month"].parse().ok()?;
        NaiveDate::from_ymd_opt(today.year(), month, day)
    });

    let future_installments: Vec<CreditCardRow> = rows.iter().flat_map(project_installments).collect();
    debug!(
        rows = rows.len(),
        projected = future_installments.len(),
        "credit card statement parsed"
    );

    Ok(Some(CreditCardStatement {
        card_holder,
        issuer: CardIssuer::detect(text),
        statement_date: today,
        due_date,
        total_amount,
        rows,
        future_installments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 12, 10)
    }

    #[test]
    fn test_scenario_installment_row() {
        let text = "17/11/25 NX Virtual 64 CEFIROGAS 02/12 114.501,58";
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();

        assert_eq!(stmt.rows.len(), 1);
        let row = &stmt.rows[0];
        assert_eq!(row.entry.date, date(2025, 11, 17));
        assert_eq!(row.entry.amount, 114501.58);
        assert_eq!(row.entry.description, "CEFIROGAS");
        assert_eq!(row.entry.direction, Direction::Out);
        assert_eq!(row.current_installment, Some(2));
        assert_eq!(row.total_installments, Some(12));
        assert_eq!(row.original_amount, Some(114501.58 * 12.0));
        assert_eq!(row.remaining_installments(), 10);

        assert_eq!(stmt.future_installments.len(), 10);
        let first = &stmt.future_installments[0];
        assert_eq!(first.current_installment, Some(3));
        assert_eq!(first.entry.date, date(2025, 12, 17));
        assert_eq!(first.entry.description, "CEFIROGAS (Cuota 3/12)");
        let last = &stmt.future_installments[9];
        assert_eq!(last.current_installment, Some(12));
        assert_eq!(last.entry.date, date(2026, 9, 17));
        assert!(stmt.future_installments.iter().all(|r| r.entry.amount == 114501.58));

        assert_eq!(stmt.candidates().len(), 11);
    }

    #[test]
    fn test_two_of_five_projects_three() {
        let text = "05/03/25 NX Fisica 1020 ZAPATERIA 02/05 10.000,00";
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();
        let projected = &stmt.future_installments;
        assert_eq!(projected.len(), 3);
        let counters: Vec<_> = projected.iter().map(|r| r.current_installment.unwrap()).collect();
        assert_eq!(counters, vec![3, 4, 5]);
        let dates: Vec<_> = projected.iter().map(|r| r.entry.date).collect();
        assert_eq!(dates, vec![date(2025, 4, 5), date(2025, 5, 5), date(2025, 6, 5)]);
        assert!(projected.iter().all(|r| r.entry.amount == 10_000.0));
    }

    #[test]
    fn test_single_charge_and_last_installment() {
        let text = "18/11/25 NX Virtual 65 SUPERMERCADO DIA 20.000,00\n19/11/25 NX Virtual 66 FRAVEGA 06/06 9.999,99";
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();
        assert_eq!(stmt.rows.len(), 2);
        assert_eq!(stmt.rows[0].entry.description, "SUPERMERCADO DIA");
        assert_eq!(stmt.rows[0].current_installment, None);
        assert_eq!(stmt.rows[0].original_amount, None);
        assert_eq!(stmt.rows[1].current_installment, Some(6));
        assert_eq!(stmt.rows[1].remaining_installments(), 0);
        assert_eq!(stmt.rows[0].remaining_installments(), 0);
        assert!(stmt.future_installments.is_empty());
    }

    #[test]
    fn test_header_fields() {
        let text = r#"Naranja X
Consumos tarjeta de crédito de MARIA GOMEZ
Fechas importantes: vencimiento el lunes 05/12
Total $ 134.501,57
17/11/25 NX Virtual 64 CEFIROGAS 02/12 114.501,58
"#;
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();
        assert_eq!(stmt.card_holder, "MARIA GOMEZ");
        assert_eq!(stmt.issuer, CardIssuer::NaranjaX);
        assert_eq!(stmt.due_date, Some(date(2025, 12, 5)));
        assert_eq!(stmt.total_amount, 134501.57);
        assert_eq!(stmt.statement_date, today());
    }

    #[test]
    fn test_defaults_without_labels() {
        let stmt = parse_credit_card_statement("17/11/25 NX Virtual 64 CEFIROGAS 114.501,58", today())
            .unwrap()
            .unwrap();
        assert_eq!(stmt.card_holder, UNKNOWN_HOLDER);
        assert_eq!(stmt.issuer, CardIssuer::Unknown);
        assert_eq!(stmt.due_date, None);
        assert_eq!(stmt.total_amount, 0.0);
    }

    #[test]
    fn test_full_date_line_fallbacks() {
        let text = "Detalle de consumos\n17/11/2025 CEFIROGAS 02/03 1.000,00\n18/11/2025 KIOSCO 500,00";
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();
        // the installment pattern matched first, so only its rows are kept
        assert_eq!(stmt.rows.len(), 1);
        assert_eq!(stmt.rows[0].entry.description, "CEFIROGAS");
        assert_eq!(stmt.future_installments.len(), 1);

        let stmt = parse_credit_card_statement("18/11/2025 KIOSCO 500,00", today()).unwrap().unwrap();
        assert_eq!(stmt.rows.len(), 1);
        assert_eq!(stmt.rows[0].entry.amount, 500.0);
        assert_eq!(stmt.rows[0].current_installment, None);
    }

    #[test]
    fn test_short_date_line_fallback() {
        // no card/voucher columns, so the column pattern cannot match
        let text = "17/11/25 NETFLIX.COM 01/03 7.999,00";
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();
        assert_eq!(stmt.rows.len(), 1);
        assert_eq!(stmt.rows[0].entry.description, "NETFLIX.COM");
        assert_eq!(stmt.future_installments.len(), 2);

        let text = "20/11/25 COMPRA ONLINE 01/02 100,00";
        let stmt = parse_credit_card_statement(text, today()).unwrap().unwrap();
        assert_eq!(stmt.rows[0].entry.description, "COMPRA ONLINE");
        assert_eq!(stmt.rows[0].entry.date, date(2025, 11, 20));
    }

    #[test]
    fn test_unparseable_statement() {
        let text = "Resumen de cuenta\nTarjeta de crédito\nNo registra consumos";
        assert!(parse_credit_card_statement(text, today()).unwrap().is_none());
    }

    #[test]
    fn test_projection_clamps_month_end() {
        let row = build_row("raw", date(2025, 1, 31), "GYM".to_string(), 50.0, (Some(1), Some(4)));
        let dates: Vec<_> = project_installments(&row).iter().map(|r| r.entry.date).collect();
        assert_eq!(dates, vec![date(2025, 2, 28), date(2025, 3, 31), date(2025, 4, 30)]);
    }

    #[test]
    fn test_fallback_description() {
        assert_eq!(fallback_description("NX Virtual 4455 NETFLIX"), "NETFLIX");
        assert_eq!(fallback_description("COMPRA ONLINE"), "COMPRA ONLINE");
        assert_eq!(fallback_description("NX 4455"), "NX 4455");
        assert_eq!(fallback_description("  "), FALLBACK_DESCRIPTION);
    }
}
