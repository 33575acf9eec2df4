use chrono::NaiveDate;
use finsync_core::CandidateEntry;
use serde::{Deserialize, Serialize};

/// Source-layout family of a piece of statement text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementFormat {
    /// Wallet export with date / description / operation id / value / balance columns
    StructuredLedger,
    CreditCard,
    /// Screenshot OCR or pasted wallet activity
    GenericFeed,
}

impl StatementFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::StructuredLedger => "structured_ledger",
            Self::CreditCard => "credit_card",
            Self::GenericFeed => "generic_feed",
        }
    }
}

impl std::fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardIssuer {
    NaranjaX,
    Visa,
    Mastercard,
    Unknown,
}

impl CardIssuer {
    /// Guess the issuer from keywords anywhere in the statement
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("naranja") {
            CardIssuer::NaranjaX
        } else if lower.contains("visa") {
            CardIssuer::Visa
        } else if lower.contains("mastercard") {
            CardIssuer::Mastercard
        } else {
            CardIssuer::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CardIssuer::NaranjaX => "Naranja X",
            CardIssuer::Visa => "Visa",
            CardIssuer::Mastercard => "Mastercard",
            CardIssuer::Unknown => "Desconocida",
        }
    }
}

/// One purchase row of a credit-card statement, or a projected future installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardRow {
    pub entry: CandidateEntry,
    pub current_installment: Option<u32>,
    pub total_installments: Option<u32>,
    /// Per-installment amount times the installment count, when known
    pub original_amount: Option<f64>,
}

impl CreditCardRow {
    /// Installments left after this one, if the row carries a counter
    pub fn remaining_installments(&self) -> u32 {
        match (self.current_installment, self.total_installments) {
            (Some(current), Some(total)) if current < total => total - current,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardStatement {
    pub card_holder: String,
    pub issuer: CardIssuer,
    pub statement_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub rows: Vec<CreditCardRow>,
    pub future_installments: Vec<CreditCardRow>,
}

impl CreditCardStatement {
    /// Billed rows followed by their projected installments, as review candidates
    pub fn candidates(&self) -> Vec<CandidateEntry> {
        self.rows
            .iter()
            .chain(self.future_installments.iter())
            .map(|row| row.entry.clone())
            .collect()
    }
}
