//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section and field has a default, so a partial (or missing) file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::backtest::simulation::MonteCarloConfig;
use crate::engine::combiner::CombinerConfig;
use crate::strategy::kelly::KellyConfig;
use crate::strategy::ranking::{Ranking, SelectionFilter};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub kelly: KellyConfig,
    pub simulation: MonteCarloConfig,
}

/// Parlay enumeration and portfolio search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub min_ev: f64,
    pub min_probability: Option<f64>,
    pub ranking: Ranking,
    /// Fixtures in one matchday; portfolios never span more.
    pub max_slate_matches: usize,
    /// Portfolios (or parlays) to report; 0 means all.
    pub top_n: usize,
    pub show_progress: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_ev: 0.0,
            min_probability: None,
            ranking: Ranking::Ev,
            max_slate_matches: 10,
            top_n: 10,
            show_progress: true,
        }
    }
}

impl SearchConfig {
    pub fn filter(&self) -> SelectionFilter {
        SelectionFilter {
            min_ev: self.min_ev,
            min_probability: self.min_probability,
        }
    }

    pub fn top_n(&self) -> Option<usize> {
        (self.top_n > 0).then_some(self.top_n)
    }

    pub fn combiner_config(&self) -> CombinerConfig {
        CombinerConfig {
            max_slate_matches: self.max_slate_matches,
            top_n: self.top_n(),
            show_progress: self.show_progress,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory (the crate root
        // under `cargo test`).
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert_eq!(cfg.search.max_slate_matches, 10);
            assert!(cfg.kelly.multiplier > 0.0);
            assert!(cfg.kelly.multiplier <= 1.0);
            assert!(cfg.simulation.num_seeds > 0);
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [kelly]
            bankroll = 250.0

            [search.ranking]
            kind = "probability"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.kelly.bankroll, 250.0);
        assert_eq!(cfg.kelly.multiplier, 0.15);
        assert_eq!(cfg.search.ranking, Ranking::Probability);
        assert_eq!(cfg.search.top_n(), Some(10));
        assert_eq!(cfg.simulation.starting_capital, 100.0);
    }

    #[test]
    fn test_simulation_sampling_mode() {
        use crate::backtest::simulation::SamplingMode;

        let cfg: AppConfig = toml::from_str(
            r#"
            [simulation]
            sampling = "replay"
            num_bins = 20
            "#,
        )
        .unwrap();
        assert_eq!(cfg.simulation.sampling, SamplingMode::Replay);
        assert_eq!(cfg.simulation.num_bins, 20);
        assert_eq!(cfg.simulation.discrepancy_threshold, 1.0);
        assert_eq!(AppConfig::default().simulation.sampling, SamplingMode::Stratified);
    }

    #[test]
    fn test_zero_top_n_means_all() {
        let search = SearchConfig {
            top_n: 0,
            ..SearchConfig::default()
        };
        assert_eq!(search.top_n(), None);
        assert_eq!(search.combiner_config().top_n, None);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = AppConfig::load_or_default("/nonexistent/parlay.toml").unwrap();
        assert_eq!(cfg.search.min_ev, 0.0);
        assert!(AppConfig::load("/nonexistent/parlay.toml").is_err());
    }
}
