//! Parlay ranking and selection filters.
//!
//! Ranking is pluggable: the enumerator scores every surviving parlay
//! through a `ParlayRanker`, and the built-in `Ranking` covers pure EV,
//! pure probability and a weighted blend of the two.

use serde::{Deserialize, Serialize};

use crate::engine::evaluator::Evaluation;

/// Scores an evaluated parlay; higher ranks first.
pub trait ParlayRanker: Send + Sync {
    fn score(&self, evaluation: &Evaluation) -> f64;
}

/// Built-in ranking criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ranking {
    /// Expected value of a unit stake.
    #[default]
    Ev,
    /// Joint probability of the parlay landing.
    Probability,
    /// `ev_weight × EV + probability_weight × probability`.
    Blended {
        ev_weight: f64,
        probability_weight: f64,
    },
}

impl ParlayRanker for Ranking {
    fn score(&self, evaluation: &Evaluation) -> f64 {
        match *self {
            Ranking::Ev => evaluation.expected_value,
            Ranking::Probability => evaluation.probability,
            Ranking::Blended {
                ev_weight,
                probability_weight,
            } => ev_weight * evaluation.expected_value + probability_weight * evaluation.probability,
        }
    }
}

/// Which parlays are good enough to keep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionFilter {
    /// EV must be strictly greater than this.
    pub min_ev: f64,
    /// Joint probability must be strictly greater than this, when set.
    #[serde(default)]
    pub min_probability: Option<f64>,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self {
            min_ev: 0.0,
            min_probability: None,
        }
    }
}

impl SelectionFilter {
    /// Keep every parlay regardless of EV.
    pub fn accept_all() -> Self {
        Self {
            min_ev: f64::NEG_INFINITY,
            min_probability: None,
        }
    }

    pub fn accepts(&self, evaluation: &Evaluation) -> bool {
        evaluation.expected_value > self.min_ev
            && self
                .min_probability
                .map_or(true, |floor| evaluation.probability > floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_scores() {
        let e = Evaluation::from_parts(0.5, 3.0); // EV = 0.5
        assert_eq!(Ranking::Ev.score(&e), 0.5);
        assert_eq!(Ranking::Probability.score(&e), 0.5);
        let blended = Ranking::Blended {
            ev_weight: 0.25,
            probability_weight: 0.75,
        };
        assert!((blended.score(&e) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_deserialize_tagged() {
        let r: Ranking =
            toml::from_str("kind = \"blended\"\nev_weight = 0.25\nprobability_weight = 0.75")
                .unwrap();
        assert_eq!(
            r,
            Ranking::Blended {
                ev_weight: 0.25,
                probability_weight: 0.75
            }
        );
        let r: Ranking = serde_json::from_str(r#"{"kind":"ev"}"#).unwrap();
        assert_eq!(r, Ranking::Ev);
    }

    #[test]
    fn test_filter_is_strict() {
        let filter = SelectionFilter::default();
        assert!(!filter.accepts(&Evaluation::from_parts(0.5, 2.0))); // EV exactly 0
        assert!(filter.accepts(&Evaluation::from_parts(0.5, 2.1)));
    }

    #[test]
    fn test_filter_probability_floor() {
        let filter = SelectionFilter {
            min_ev: 0.0,
            min_probability: Some(0.3),
        };
        assert!(!filter.accepts(&Evaluation::from_parts(0.2, 10.0)));
        assert!(filter.accepts(&Evaluation::from_parts(0.4, 3.0)));
    }

    #[test]
    fn test_accept_all() {
        assert!(SelectionFilter::accept_all().accepts(&Evaluation::from_parts(0.1, 1.5)));
    }
}
