//! Mock match source for integration testing.
//!
//! Provides a deterministic `MatchSource` that serves a fixed slate from
//! memory and counts how often it is read.

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use parlay::data::MatchSource;
use parlay::types::Match;

/// An in-memory match source whose slate and failures are controllable
/// from test code.
pub struct MockSource {
    name: String,
    matches: Vec<Match>,
    loads: Arc<Mutex<usize>>,
    /// If set, every load returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockSource {
    /// A source serving the default six-match slate.
    pub fn new(name: &str) -> Self {
        Self::with_matches(name, Self::default_matches())
    }

    pub fn with_matches(name: &str, matches: Vec<Match>) -> Self {
        Self {
            name: name.to_string(),
            matches,
            loads: Arc::new(Mutex::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent loads to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn load_count(&self) -> usize {
        *self.loads.lock().unwrap()
    }

    /// One matchday with a mix of value and no-value outcomes.
    pub fn default_matches() -> Vec<Match> {
        vec![
            Match::new("Ajax - PSV", [0.45, 0.28, 0.27], [2.35, 3.50, 3.40]),
            Match::new("AZ - Twente", [0.50, 0.25, 0.25], [2.05, 3.70, 4.10]),
            Match::new("Feyenoord - Utrecht", [0.62, 0.21, 0.17], [1.70, 4.20, 5.00]),
            Match::new("Heerenveen - Go Ahead Eagles", [0.38, 0.27, 0.35], [2.60, 3.60, 2.75]),
            Match::new("NEC - Sparta", [0.48, 0.27, 0.25], [2.10, 3.45, 3.90]),
            Match::new("Fortuna Sittard - Heracles", [0.41, 0.28, 0.31], [2.55, 3.40, 2.90]),
        ]
    }
}

impl MatchSource for MockSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load_matches(&self) -> Result<Vec<Match>> {
        *self.loads.lock().unwrap() += 1;
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self.matches.clone())
    }
}
