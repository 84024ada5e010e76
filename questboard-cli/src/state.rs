use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$QUESTBOARD_HOME`, or `~/.questboard`.
pub fn questboard_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("QUESTBOARD_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".questboard"))
}

pub fn ensure_questboard_home() -> Result<PathBuf> {
    let dir = questboard_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
