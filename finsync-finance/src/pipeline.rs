//! Import pipeline: raw statement text in, review-ready candidates out.
//!
//! detect format -> format parser (generic feed on zero rows) -> ids and
//! source tag -> classification rules -> duplicate flags.

use chrono::NaiveDate;
use finsync_core::{CandidateEntry, ClassificationRule, LedgerEntry};
use finsync_ingest::parsers::{parse_credit_card_statement, parse_generic_feed, parse_structured_ledger};
use finsync_ingest::{detect_format, CreditCardStatement, StatementFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category_rules::ClassificationEngine;
use crate::duplicates::DuplicateDetector;
use crate::error::PipelineError;

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub detected: StatementFormat,
    /// Format whose parser produced the candidates (differs from `detected` after a fallback)
    pub format: StatementFormat,
    pub statement: Option<CreditCardStatement>,
    pub candidates: Vec<CandidateEntry>,
}

impl ImportBatch {
    pub fn duplicate_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.duplicate).count()
    }

    pub fn categorized_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_categorized()).count()
    }

    pub fn selected_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.selected).count()
    }
}

/// Parsed rows before classification
struct Parsed {
    format: StatementFormat,
    statement: Option<CreditCardStatement>,
    candidates: Vec<CandidateEntry>,
}

/// A stateless pipeline bound to the run's reference date
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    today: NaiveDate,
}

impl Pipeline {
    /// `today` seeds date carry-forward and year inference in the parsers
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Detect, parse, classify and flag duplicates.
    ///
    /// `ledger` may hold entries of any account; only `account_id` is compared.
    pub fn run(
        &self,
        text: &str,
        rules: &[ClassificationRule],
        ledger: &[LedgerEntry],
        account_id: &str,
    ) -> Result<ImportBatch, PipelineError> {
        let detection = detect_format(text);
        debug!(format = %detection.format, signal = %detection.signal, "format detected");

        let Parsed {
            format,
            statement,
            mut candidates,
        } = self.parse(text, detection.format)?;

        if candidates.is_empty() {
            return Err(PipelineError::NoMovementsDetected);
        }

        for (i, c) in candidates.iter_mut().enumerate() {
            c.id = format!("line-{:04}", i + 1);
            c.source = Some(format.key().to_string());
        }

        let categorized = ClassificationEngine::new(rules).classify_all(&mut candidates);
        let duplicates = DuplicateDetector::new(ledger, account_id).flag_all(&mut candidates);

        info!(
            format = %format,
            candidates = candidates.len(),
            categorized,
            duplicates,
            "import batch ready for review"
        );

        Ok(ImportBatch {
            detected: detection.format,
            format,
            statement,
            candidates,
        })
    }

    fn parse(&self, text: &str, detected: StatementFormat) -> Result<Parsed, PipelineError> {
        match detected {
            StatementFormat::StructuredLedger => {
                let candidates = parse_structured_ledger(text)?;
                if !candidates.is_empty() {
                    return Ok(Parsed {
                        format: StatementFormat::StructuredLedger,
                        statement: None,
                        candidates,
                    });
                }
                debug!("structured ledger found no rows, falling back to generic feed");
            }
            StatementFormat::CreditCard => {
                if let Some(statement) = parse_credit_card_statement(text, self.today)? {
                    let candidates = statement.candidates();
                    return Ok(Parsed {
                        format: StatementFormat::CreditCard,
                        statement: Some(statement),
                        candidates,
                    });
                }
                debug!("credit card statement unparseable, falling back to generic feed");
            }
            StatementFormat::GenericFeed => {}
        }

        Ok(Parsed {
            format: StatementFormat::GenericFeed,
            statement: None,
            candidates: parse_generic_feed(text, self.today)?,
        })
    }
}
