//! Error types for the finance pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Every parser strategy came back empty. Not fatal: the user can edit the text and retry.
    #[error("no movements detected in the text")]
    NoMovementsDetected,

    #[error("parse error: {0}")]
    Parse(#[from] anyhow::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommitError {
    #[error("no selected movements with a category to commit")]
    NothingToCommit,
}

/// A single rule write the store refused
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("rule rejected: {0}")]
    Rejected(String),
}
