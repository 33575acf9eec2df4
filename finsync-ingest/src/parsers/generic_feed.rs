//! Generic wallet feed parser (screenshot OCR / pasted activity)
//!
//! Expected text after OCR, one item per line:
//!   1 de diciembre Saldo del día $ 342.235 94
//!   02 de diciembre
//!   Pago con tarjeta - $ 5.370 00
//!   En Dlo*amazon Music
//!   28 de noviembre
//!   + $ 1.250 50
//!   Ingreso de dinero
//!
//! Date headers apply to every following amount until the next header.
//! Amount and merchant detail often land on separate lines, so an amount line
//! with a poor description may absorb the line after it.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use finsync_core::{CandidateEntry, Direction};
use regex::Regex;
use tracing::debug;

use crate::amount::normalize_amount;
use crate::normalize::clean_lines;

const MONTHS: [(&str, u32); 12] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Running-balance headers carry one of these words
const BALANCE_MARKERS: &[&str] = &["saldo", "balance"];

const OUTFLOW_WORDS: &[&str] = &["pago", "compra", "transferencia"];
const INFLOW_WORDS: &[&str] = &["rendimiento", "ingreso", "recib"];

/// Descriptions that say what kind of movement it was, but not with whom
const FILLER_PHRASES: &[&str] = &[
    "pago con tarjeta",
    "transferencia",
    "pago a",
    "pago",
    "compra",
    "debit",
    "débito",
    "rendimiento diario",
    "ingreso de dinero",
];

const FALLBACK_IN: &str = "Ingreso detectado";
const FALLBACK_OUT: &str = "Gasto detectado";

/// What a single cleaned line looks like to the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// "1 de diciembre Saldo del día ...": sets the date, never a transaction
    BalanceHeader(NaiveDate),
    DateOnly(NaiveDate),
    /// Compact "date + amount" line
    DateWithAmount(NaiveDate),
    Amount,
    Text,
}

/// An amount found inside a line
#[derive(Debug, Clone, PartialEq)]
pub struct AmountMatch {
    pub sign: Option<Direction>,
    pub value: f64,
    /// Byte range of the whole match (sign and `$` included)
    pub start: usize,
    pub end: usize,
}

/// Compiled patterns plus the reference date used for year inference
pub struct FeedParser {
    date_re: Regex,
    amount_re: Regex,
    connector_re: Regex,
    today: NaiveDate,
}

impl FeedParser {
    pub fn new(today: NaiveDate) -> Result<Self> {
        Ok(Self {
            date_re: Regex::new(r"(?i)^(?P<day>\d{1,2})\s+(?:de\s+)?(?P<month>[a-z]+)")?,
            // "+ $ 107,63", "-$2.112,49", "$ 5.370 00" (space before superscript cents)
            amount_re: Regex::new(
                r"(?P<sign>[+\-])?\s*\$\s*(?P<value>[\d.]+(?:,| )\d{2})\b",
            )?,
            connector_re: Regex::new(r"(?i)^en\s+")?,
            today,
        })
    }

    /// Parse a leading "02 de diciembre" / "2 diciembre" into a date.
    ///
    /// Months more than two ahead of the current one belong to last year.
    pub fn parse_date(&self, line: &str) -> Option<NaiveDate> {
        let caps = self.date_re.captures(line)?;
        let day: u32 = caps["day"].parse().ok()?;
        let month_name = caps["month"].to_lowercase();
        let month = MONTHS
            .iter()
            .find(|(name, _)| *name == month_name)
            .map(|(_, m)| *m)?;

        let mut year = self.today.year();
        if month > self.today.month() + 2 {
            year -= 1;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub fn find_amount(&self, line: &str) -> Option<AmountMatch> {
        let caps = self.amount_re.captures(line)?;
        let whole = caps.get(0)?;
        let value = normalize_amount(&caps["value"])?;
        let sign = caps.name("sign").and_then(|s| Direction::from_sign(s.as_str()));
        Some(AmountMatch {
            sign,
            value,
            start: whole.start(),
            end: whole.end(),
        })
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let has_amount = self.amount_re.is_match(line);
        match self.parse_date(line) {
            Some(date) => {
                let lower = line.to_lowercase();
                if BALANCE_MARKERS.iter().any(|m| lower.contains(m)) {
                    LineKind::BalanceHeader(date)
                } else if has_amount {
                    LineKind::DateWithAmount(date)
                } else {
                    LineKind::DateOnly(date)
                }
            }
            None if has_amount => LineKind::Amount,
            None => LineKind::Text,
        }
    }

    /// Byte length of a leading date token, 0 when there is none
    fn date_prefix_len(&self, line: &str) -> usize {
        self.date_re.find(line).map(|m| m.end()).unwrap_or(0)
    }

    fn strip_connector(&self, line: &str) -> String {
        self.connector_re.replace(line, "").trim().to_string()
    }
}

/// Result of processing the line under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    DateSet(NaiveDate),
    BalanceHeader(NaiveDate),
    /// A candidate was emitted; `merged_next` means the following line was consumed
    Emitted { merged_next: bool },
    Skipped,
    End,
}

/// Line scanner with an explicit cursor.
///
/// `last_date` starts at today and follows every date header. When an amount
/// line's description is poor, the line right after it may be merged in and
/// is then skipped by advancing the cursor past it.
pub struct FeedScanner<'a> {
    parser: &'a FeedParser,
    lines: Vec<String>,
    cursor: usize,
    last_date: NaiveDate,
    entries: Vec<CandidateEntry>,
}

impl<'a> FeedScanner<'a> {
    pub fn new(parser: &'a FeedParser, text: &str) -> Self {
        Self {
            parser,
            lines: clean_lines(text),
            cursor: 0,
            last_date: parser.today,
            entries: Vec::new(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn entries(&self) -> &[CandidateEntry] {
        &self.entries
    }

    pub fn step(&mut self) -> Transition {
        let Some(line) = self.lines.get(self.cursor).cloned() else {
            return Transition::End;
        };
        self.cursor += 1;

        match self.parser.classify(&line) {
            LineKind::BalanceHeader(date) => {
                self.last_date = date;
                Transition::BalanceHeader(date)
            }
            LineKind::DateOnly(date) => {
                self.last_date = date;
                Transition::DateSet(date)
            }
            LineKind::DateWithAmount(date) => {
                self.last_date = date;
                let skip = self.parser.date_prefix_len(&line);
                self.emit(&line, skip)
            }
            LineKind::Amount => self.emit(&line, 0),
            LineKind::Text => Transition::Skipped,
        }
    }

    pub fn run(mut self) -> Vec<CandidateEntry> {
        while self.step() != Transition::End {}
        self.entries
    }

    /// Emit a candidate from an amount line whose first `skip` bytes are a date prefix
    fn emit(&mut self, line: &str, skip: usize) -> Transition {
        let Some(amount) = self.parser.find_amount(line) else {
            return Transition::Skipped;
        };
        let skip = if skip <= amount.start { skip } else { 0 };

        let mut description = format!("{}{}", &line[skip..amount.start], &line[amount.end..])
            .trim()
            .to_string();

        // inferred from the amount line alone, before any detail is merged in
        let direction = amount.sign.unwrap_or_else(|| infer_direction(&description));

        let mut merged_next = false;
        if is_poor_description(&description) {
            if let Some(detail) = self.next_detail_line() {
                description = self.parser.strip_connector(&detail);
                self.cursor += 1;
                merged_next = true;
            }
        }

        let description = description
            .trim_start_matches(|c| c == '-' || c == '+')
            .trim()
            .to_string();
        let description = if description.chars().count() < 2 {
            match direction {
                Direction::In => FALLBACK_IN.to_string(),
                Direction::Out => FALLBACK_OUT.to_string(),
            }
        } else {
            description
        };

        self.entries.push(CandidateEntry::new(
            line,
            self.last_date,
            description,
            amount.value,
            direction,
        ));
        Transition::Emitted { merged_next }
    }

    /// The line after the cursor, if it is plain detail text
    fn next_detail_line(&self) -> Option<String> {
        let next = self.lines.get(self.cursor)?;
        let is_text = self.parser.classify(next) == LineKind::Text;
        (is_text && next.chars().count() > 2).then(|| next.clone())
    }
}

/// Empty, very short, or carrying a movement-type label
fn is_poor_description(description: &str) -> bool {
    let lower = description.to_lowercase();
    description.chars().count() < 3 || FILLER_PHRASES.iter().any(|p| lower.contains(p))
}

fn infer_direction(description: &str) -> Direction {
    let lower = description.to_lowercase();
    if OUTFLOW_WORDS.iter().any(|w| lower.contains(w)) {
        Direction::Out
    } else if INFLOW_WORDS.iter().any(|w| lower.contains(w)) {
        Direction::In
    } else {
        Direction::Out
    }
}

/// Parse free-form wallet activity text into candidates.
///
/// `today` seeds the carried date and anchors year inference.
pub fn parse_generic_feed(text: &str, today: NaiveDate) -> Result<Vec<CandidateEntry>> {
    let parser = FeedParser::new(today)?;
    let entries = FeedScanner::new(&parser, text).run();
    debug!(rows = entries.len(), "generic feed parsed");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 12, 15)
    }

    #[test]
    fn test_scenario_payment_on_next_line() {
        let txns = parse_generic_feed("02 de diciembre\n- $ 5.370 00\nPago a Carcor", today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, date(2025, 12, 2));
        assert_eq!(txns[0].amount, 5370.00);
        assert_eq!(txns[0].direction, Direction::Out);
        assert_eq!(txns[0].description, "Pago a Carcor");
        assert_eq!(txns[0].raw_text, "- $ 5.370 00");
    }

    #[test]
    fn test_scenario_income() {
        let txns = parse_generic_feed("28 de noviembre\n+ $ 1.250 50\nIngreso de dinero", today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, date(2025, 11, 28));
        assert_eq!(txns[0].amount, 1250.50);
        assert_eq!(txns[0].direction, Direction::In);
        assert_eq!(txns[0].description, "Ingreso de dinero");
    }

    #[test]
    fn test_date_carries_forward() {
        let text = "03 de diciembre\nSpotify - $ 2.999,00\nNetflix - $ 7.999,00\n01 de diciembre\nUber - $ 3.500,00";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].date, date(2025, 12, 3));
        assert_eq!(txns[1].date, date(2025, 12, 3));
        assert_eq!(txns[2].date, date(2025, 12, 1));
    }

    #[test]
    fn test_defaults_to_today_without_header() {
        let txns = parse_generic_feed("Kiosco - $ 1.200,00", today()).unwrap();
        assert_eq!(txns[0].date, today());
    }

    #[test]
    fn test_year_inference() {
        let parser = FeedParser::new(date(2026, 1, 10)).unwrap();
        assert_eq!(parser.parse_date("28 de noviembre"), Some(date(2025, 11, 28)));
        assert_eq!(parser.parse_date("3 de marzo"), Some(date(2026, 3, 3)));
        assert_eq!(parser.parse_date("4 abril"), Some(date(2025, 4, 4)));
        assert_eq!(parser.parse_date("31 de febrero"), None);
        assert_eq!(parser.parse_date("2 compras"), None);
    }

    #[test]
    fn test_balance_header_sets_date_only() {
        let text = "1 de diciembre Saldo del día $ 342.235 94\nCafé - $ 2.500,00";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, date(2025, 12, 1));
        assert_eq!(txns[0].description, "Café");
    }

    #[test]
    fn test_compact_date_and_amount_line() {
        let txns = parse_generic_feed("5 de diciembre Farmacia - $ 8.400,10", today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, date(2025, 12, 5));
        assert_eq!(txns[0].amount, 8400.10);
        assert_eq!(txns[0].description, "Farmacia");
    }

    #[test]
    fn test_direction_inferred_without_sign() {
        let text = "Rendimiento diario $ 107,63\nCompra Mercado $ 2.112,49\nVarios $ 10,00";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].direction, Direction::In);
        assert_eq!(txns[1].direction, Direction::Out);
        assert_eq!(txns[2].direction, Direction::Out);
    }

    #[test]
    fn test_filler_replaced_by_detail_without_connector() {
        let text = "Pago con tarjeta - $ 1.099,00\nEn Dlo*amazon Music";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns[0].description, "Dlo*amazon Music");
    }

    #[test]
    fn test_filler_with_merchant_is_replaced_by_detail() {
        let text = "Pago Netflix - $ 100,00\nEn Dlo*netflix";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "Dlo*netflix");

        let txns = parse_generic_feed("Transferencia a - $ 15.000,00\nJuan Perez", today()).unwrap();
        assert_eq!(txns[0].description, "Juan Perez");
    }

    #[test]
    fn test_direction_inferred_before_detail_merge() {
        // no sign and an empty remainder: default OUT, even though the detail reads as income
        let txns = parse_generic_feed("$ 1.250,50\nIngreso de dinero", today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].direction, Direction::Out);
        assert_eq!(txns[0].description, "Ingreso de dinero");

        let txns = parse_generic_feed("Rendimiento diario $ 107,63\nCuenta remunerada", today()).unwrap();
        assert_eq!(txns[0].direction, Direction::In);
        assert_eq!(txns[0].description, "Cuenta remunerada");
    }

    #[test]
    fn test_specific_description_does_not_merge() {
        let text = "Supermercado Dia - $ 12.000,00\nFarmacity - $ 3.000,00";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].description, "Supermercado Dia");
        assert_eq!(txns[1].description, "Farmacity");
    }

    #[test]
    fn test_next_amount_or_date_line_is_not_merged() {
        let text = "- $ 100,00\n- $ 200,00\n- $ 300,00\n02 de diciembre";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 3);
        assert!(txns.iter().all(|t| t.description == "Gasto detectado"));

        let txns = parse_generic_feed("+ $ 50,00", today()).unwrap();
        assert_eq!(txns[0].description, "Ingreso detectado");
    }

    #[test]
    fn test_scanner_transitions() {
        let parser = FeedParser::new(today()).unwrap();
        let mut scanner = FeedScanner::new(&parser, "02 de diciembre\n- $ 5.370 00\nPago a Carcor\nhola");
        assert_eq!(scanner.step(), Transition::DateSet(date(2025, 12, 2)));
        assert_eq!(scanner.cursor(), 1);
        assert_eq!(scanner.step(), Transition::Emitted { merged_next: true });
        assert_eq!(scanner.cursor(), 3);
        assert_eq!(scanner.step(), Transition::Skipped);
        assert_eq!(scanner.step(), Transition::End);
        assert_eq!(scanner.entries().len(), 1);
        assert_eq!(scanner.last_date(), date(2025, 12, 2));
    }

    #[test]
    fn test_classify_lines() {
        let parser = FeedParser::new(today()).unwrap();
        assert_eq!(parser.classify("02 de diciembre"), LineKind::DateOnly(date(2025, 12, 2)));
        assert_eq!(
            parser.classify("1 de diciembre Saldo $ 10,00"),
            LineKind::BalanceHeader(date(2025, 12, 1))
        );
        assert_eq!(
            parser.classify("5 de diciembre - $ 10,00"),
            LineKind::DateWithAmount(date(2025, 12, 5))
        );
        assert_eq!(parser.classify("-$2.112,49"), LineKind::Amount);
        assert_eq!(parser.classify("Pago a Carcor"), LineKind::Text);
    }

    #[test]
    fn test_noise_is_cleaned_before_parsing() {
        let text = "pe 02 de diciembre\n© - $ 5.370 00\n=> Pago a Carcor";
        let txns = parse_generic_feed(text, today()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, date(2025, 12, 2));
        assert_eq!(txns[0].description, "Pago a Carcor");
    }
}
