//! Flag candidates that likely already exist in the destination ledger.
//!
//! Same account, same date, same direction and an amount within a cent.

use finsync_core::{CandidateEntry, LedgerEntry};

const AMOUNT_TOLERANCE: f64 = 0.01;

pub struct DuplicateDetector<'a> {
    existing: Vec<&'a LedgerEntry>,
}

impl<'a> DuplicateDetector<'a> {
    /// Only entries of `account_id` take part in the comparison
    pub fn new(ledger: &'a [LedgerEntry], account_id: &str) -> Self {
        Self {
            existing: ledger.iter().filter(|e| e.account_id == account_id).collect(),
        }
    }

    pub fn is_duplicate(&self, candidate: &CandidateEntry) -> bool {
        self.existing.iter().any(|e| {
            (e.amount - candidate.amount).abs() < AMOUNT_TOLERANCE
                && e.direction == candidate.direction
                && e.date == candidate.date
        })
    }

    /// Set the duplicate flag on every candidate; duplicates start deselected.
    /// Returns the number flagged.
    pub fn flag_all(&self, candidates: &mut [CandidateEntry]) -> usize {
        let mut flagged = 0;
        for c in candidates.iter_mut() {
            c.duplicate = self.is_duplicate(c);
            c.selected = !c.duplicate;
            if c.duplicate {
                flagged += 1;
            }
        }
        flagged
    }
}
