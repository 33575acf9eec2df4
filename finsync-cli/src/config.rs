use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_finsync_home;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub store: StoreSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// IANA zone used to compute the run's "today"
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSection {
    /// Relative paths resolve under the finsync home
    pub rules_path: PathBuf,
    pub ledger_path: PathBuf,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            timezone: "America/Argentina/Buenos_Aires".to_string(),
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("rules.json"),
            ledger_path: PathBuf::from("ledger.json"),
        }
    }
}

impl Config {
    pub fn rules_path(&self, home: &Path) -> PathBuf {
        resolve(home, &self.store.rules_path)
    }

    pub fn ledger_path(&self, home: &Path) -> PathBuf {
        resolve(home, &self.store.ledger_path)
    }
}

fn resolve(home: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home.join(p)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finsync_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Missing file means defaults. The timezone is validated here, not at first use.
pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    cfg.pipeline
        .timezone
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", cfg.pipeline.timezone))?;
    Ok(cfg)
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
