//! JSON files backing the CLI: rule list, ledger, and scan review output.

use anyhow::{Context, Result};
use finsync_core::{ClassificationRule, LedgerEntry};
use finsync_finance::{ImportBatch, RuleStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Missing file reads as `T::default()`
async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(T::default());
    }
    let s = fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Rules held in memory and written back with `flush`.
///
/// A rule whose pattern is already stored is rejected, so learning never
/// piles up copies of the same pattern across imports.
#[derive(Debug)]
pub struct JsonRuleStore {
    path: PathBuf,
    rules: Vec<ClassificationRule>,
}

impl JsonRuleStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rules = read_json_or_default(&path).await?;
        Ok(Self { path, rules })
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub async fn flush(&self) -> Result<()> {
        write_json(&self.path, &self.rules).await
    }
}

impl RuleStore for JsonRuleStore {
    fn save_rule(&mut self, rule: &ClassificationRule) -> Result<(), StoreError> {
        let pattern = rule.normalized_pattern();
        if pattern.is_empty() {
            return Err(StoreError::Rejected("empty pattern".to_string()));
        }
        if self.rules.iter().any(|r| r.normalized_pattern() == pattern) {
            return Err(StoreError::Rejected(format!("pattern '{pattern}' already stored")));
        }
        self.rules.push(rule.clone());
        Ok(())
    }
}

pub async fn load_ledger(path: &Path) -> Result<Vec<LedgerEntry>> {
    read_json_or_default(path).await
}

/// Append entries to the ledger file, returning the new total
pub async fn append_ledger(path: &Path, entries: &[LedgerEntry]) -> Result<usize> {
    let mut ledger = load_ledger(path).await?;
    ledger.extend_from_slice(entries);
    write_json(path, &ledger).await?;
    Ok(ledger.len())
}

pub async fn write_review(path: &Path, batch: &ImportBatch) -> Result<()> {
    write_json(path, batch).await
}

pub async fn read_review(path: &Path) -> Result<ImportBatch> {
    let s = fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse review file {}", path.display()))
}
