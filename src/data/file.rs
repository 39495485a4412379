//! JSON matchday files.
//!
//! One file holds one matchday: a JSON array of match records. A directory
//! of such files is a season, loaded in file-name order.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{validate_slate, MatchSource};
use crate::types::Match;

/// A matchday stored as a JSON file on disk.
pub struct FileMatchSource {
    path: PathBuf,
}

impl FileMatchSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatchSource for FileMatchSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load_matches(&self) -> Result<Vec<Match>> {
        let path = self.path.display();
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read matchday file: {path}"))?;
        let matches: Vec<Match> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse matchday file: {path}"))?;
        validate_slate(&matches).with_context(|| format!("Invalid matchday file: {path}"))?;

        debug!(path = %path, matches = matches.len(), "Matchday loaded");
        Ok(matches)
    }
}

/// Load every `*.json` matchday in `dir`, sorted by file name.
pub fn load_matchdays(dir: &Path) -> Result<Vec<Vec<Match>>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read matchday directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let matchdays = files
        .iter()
        .map(|p| FileMatchSource::new(p).load_matches())
        .collect::<Result<Vec<_>>>()?;

    info!(dir = %dir.display(), matchdays = matchdays.len(), "Matchdays loaded");
    Ok(matchdays)
}
