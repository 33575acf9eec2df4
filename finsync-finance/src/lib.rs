//! finsync-finance: rule-based classification, duplicate flagging, the import
//! pipeline and the post-commit rule learning step

pub mod error;
pub mod category_rules;
pub mod duplicates;
pub mod pipeline;
pub mod learning;

pub use error::{CommitError, PipelineError, StoreError};
pub use category_rules::ClassificationEngine;
pub use duplicates::DuplicateDetector;
pub use pipeline::{ImportBatch, Pipeline};
pub use learning::{commit, learn_rules, persist_rules, LearningReport, MemoryRuleStore, RuleStore};
