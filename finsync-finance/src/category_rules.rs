//! Ordered pattern rules mapping candidate descriptions to categories.
//!
//! First active matching rule wins, in stored order. A candidate nothing
//! matches stays in the batch, just uncategorized.

use finsync_core::{CandidateEntry, ClassificationRule};

/// Linear first-match scan over the stored rule list
pub struct ClassificationEngine<'a> {
    rules: &'a [ClassificationRule],
}

impl<'a> ClassificationEngine<'a> {
    pub fn new(rules: &'a [ClassificationRule]) -> Self {
        Self { rules }
    }

    /// First active rule whose pattern matches `description`
    pub fn find_match(&self, description: &str) -> Option<&'a ClassificationRule> {
        self.rules.iter().find(|r| r.matches(description))
    }

    /// Apply the matching rule to a candidate. Returns whether one matched.
    pub fn classify(&self, candidate: &mut CandidateEntry) -> bool {
        let Some(rule) = self.find_match(&candidate.description) else {
            return false;
        };
        candidate.category_id = Some(rule.category_id.clone());
        candidate.sub_category_id = rule.sub_category_id.clone();
        if let Some(direction) = rule.direction {
            candidate.direction = direction;
        }
        true
    }

    /// Classify every candidate in place, returning how many matched
    pub fn classify_all(&self, candidates: &mut [CandidateEntry]) -> usize {
        let mut matched = 0;
        for c in candidates.iter_mut() {
            if self.classify(c) {
                matched += 1;
            }
        }
        matched
    }
}
