use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FINSYNC_HOME`, else `$HOME/.finsync`
pub fn finsync_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINSYNC_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finsync"))
}

pub fn ensure_finsync_home() -> Result<PathBuf> {
    let dir = finsync_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
