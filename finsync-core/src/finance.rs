//! Ledger types shared by the parsers, the classifier and the commit step

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether money entered or left the account. Amounts never carry a sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl Direction {
    /// Direction implied by an explicit `+`/`-` marker.
    pub fn from_sign(sign: &str) -> Option<Self> {
        match sign.trim() {
            "+" => Some(Direction::In),
            "-" => Some(Direction::Out),
            _ => None,
        }
    }

    /// Direction of a signed statement value: negative is money out.
    pub fn from_signed(value: f64) -> Self {
        if value < 0.0 {
            Direction::Out
        } else {
            Direction::In
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

/// A provisional transaction extracted from text, pending review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntry {
    pub id: String,
    /// The (normalized) text the entry was extracted from
    pub raw_text: String,
    pub date: NaiveDate,
    pub description: String,
    /// Non-negative magnitude; see `direction`
    pub amount: f64,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<String>,
    pub selected: bool,
    pub duplicate: bool,
    /// Statement format that produced this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CandidateEntry {
    /// Create an unclassified, selected candidate. The id is assigned by the pipeline.
    pub fn new(
        raw_text: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        direction: Direction,
    ) -> Self {
        Self {
            id: String::new(),
            raw_text: raw_text.into(),
            date,
            description: description.into(),
            amount: amount.abs(),
            direction,
            category_id: None,
            sub_category_id: None,
            selected: true,
            duplicate: false,
            source: None,
        }
    }

    pub fn is_categorized(&self) -> bool {
        self.category_id.is_some()
    }

    /// Selected and categorized: the only candidates a commit accepts
    pub fn is_committable(&self) -> bool {
        self.selected && self.is_categorized()
    }
}

/// How a rule pattern is compared against a description
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    #[default]
    Contains,
    Equals,
    StartsWith,
}

/// A stored pattern-to-category mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRule {
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<String>,
    /// Overrides the parsed direction when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ClassificationRule {
    /// Create an active `contains` rule
    pub fn contains(pattern: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_type: MatchType::Contains,
            category_id: category_id.into(),
            sub_category_id: None,
            direction: None,
            active: true,
        }
    }

    /// Case-insensitive test of this rule's pattern against a description.
    /// Inactive rules never match.
    pub fn matches(&self, description: &str) -> bool {
        if !self.active {
            return false;
        }
        let text = description.to_lowercase();
        let pattern = self.pattern.to_lowercase();
        match self.match_type {
            MatchType::Contains => text.contains(&pattern),
            MatchType::Equals => text == pattern,
            MatchType::StartsWith => text.starts_with(&pattern),
        }
    }

    /// Pattern text used to de-duplicate rules
    pub fn normalized_pattern(&self) -> String {
        self.pattern.trim().to_lowercase()
    }
}

/// A committed transaction on an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub direction: Direction,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<String>,
}

impl LedgerEntry {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        direction: Direction,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            amount: amount.abs(),
            direction,
            account_id: account_id.into(),
            category_id: None,
            sub_category_id: None,
        }
    }

    /// Convert a reviewed candidate. Returns None unless it is selected and categorized.
    pub fn from_candidate(candidate: &CandidateEntry, account_id: &str) -> Option<Self> {
        if !candidate.is_committable() {
            return None;
        }
        Some(Self {
            date: candidate.date,
            description: candidate.description.clone(),
            amount: candidate.amount,
            direction: candidate.direction,
            account_id: account_id.to_string(),
            category_id: candidate.category_id.clone(),
            sub_category_id: candidate.sub_category_id.clone(),
        })
    }
}
