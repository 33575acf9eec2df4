//! Ledger commit and rule learning from committed movements.
//!
//! A committed description that no active rule recognized becomes a new
//! `contains` rule bound to the category the user picked, so the next import
//! of the same merchant classifies itself.

use std::collections::HashSet;

use finsync_core::{CandidateEntry, ClassificationRule, LedgerEntry};
use tracing::{debug, warn};

use crate::category_rules::ClassificationEngine;
use crate::error::{CommitError, StoreError};

/// Words shorter than this never become part of a learned pattern
const MIN_WORD_CHARS: usize = 4;
const PATTERN_WORDS: usize = 2;

/// Where learned rules are written
pub trait RuleStore {
    fn save_rule(&mut self, rule: &ClassificationRule) -> Result<(), StoreError>;
}

/// Vec-backed store
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    pub rules: Vec<ClassificationRule>,
}

impl RuleStore for MemoryRuleStore {
    fn save_rule(&mut self, rule: &ClassificationRule) -> Result<(), StoreError> {
        self.rules.push(rule.clone());
        Ok(())
    }
}

/// Outcome of persisting a batch of learned rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearningReport {
    pub saved: usize,
    pub failed: usize,
}

/// Turn reviewed candidates into ledger entries for `account_id`.
///
/// Only selected, categorized candidates are committed.
pub fn commit(candidates: &[CandidateEntry], account_id: &str) -> Result<Vec<LedgerEntry>, CommitError> {
    let entries: Vec<LedgerEntry> = candidates
        .iter()
        .filter_map(|c| LedgerEntry::from_candidate(c, account_id))
        .collect();

    if entries.is_empty() {
        return Err(CommitError::NothingToCommit);
    }
    debug!(committed = entries.len(), skipped = candidates.len() - entries.len(), "commit");
    Ok(entries)
}

/// Lower-cased first two words longer than three characters
fn pattern_from_description(description: &str) -> Option<String> {
    let words: Vec<String> = description
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .take(PATTERN_WORDS)
        .map(|w| w.to_lowercase())
        .collect();

    (!words.is_empty()).then(|| words.join(" "))
}

/// Derive new rules from committed candidates that `rules` did not recognize.
///
/// Uncategorized candidates are ignored. Patterns are unique within the result,
/// first occurrence wins.
pub fn learn_rules(committed: &[CandidateEntry], rules: &[ClassificationRule]) -> Vec<ClassificationRule> {
    let engine = ClassificationEngine::new(rules);
    let mut seen = HashSet::new();
    let mut learned = Vec::new();

    for c in committed {
        let Some(category_id) = c.category_id.as_deref() else {
            continue;
        };
        if engine.find_match(&c.description).is_some() {
            continue;
        }
        let Some(pattern) = pattern_from_description(&c.description) else {
            continue;
        };

        let mut rule = ClassificationRule::contains(pattern, category_id);
        rule.sub_category_id = c.sub_category_id.clone();
        if seen.insert(rule.normalized_pattern()) {
            learned.push(rule);
        }
    }

    learned
}

/// Write each rule independently. A failed write is logged and skipped.
pub fn persist_rules<S: RuleStore + ?Sized>(store: &mut S, rules: &[ClassificationRule]) -> LearningReport {
    let mut report = LearningReport::default();
    for rule in rules {
        match store.save_rule(rule) {
            Ok(()) => report.saved += 1,
            Err(e) => {
                warn!(pattern = %rule.pattern, error = %e, "failed to save learned rule");
                report.failed += 1;
            }
        }
    }
    report
}
