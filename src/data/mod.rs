//! Match data sources.
//!
//! Defines the `MatchSource` trait that loaders (files, scrapers) implement,
//! and the validation every slate passes before it reaches the engine.

pub mod file;

use std::collections::HashSet;

use anyhow::Result;

use crate::types::{FixtureSet, Match, OutcomeLabel, ParlayError};

/// How far the three outcome probabilities may drift from summing to 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.02;

/// Abstraction over wherever a matchday's fixtures come from.
#[cfg_attr(test, mockall::automock)]
pub trait MatchSource {
    /// Human-readable source name for logs.
    fn name(&self) -> String;

    /// Load one slate of matches.
    fn load_matches(&self) -> Result<Vec<Match>>;
}

/// Check a slate before it is searched.
///
/// Rejects out-of-range probabilities, probability sums away from 1,
/// odds that are not above 1, duplicate fixtures and oversized slates.
pub fn validate_slate(matches: &[Match]) -> Result<(), ParlayError> {
    if matches.len() > FixtureSet::CAPACITY {
        return Err(ParlayError::TooManyFixtures {
            count: matches.len(),
            max: FixtureSet::CAPACITY,
        });
    }

    let mut seen = HashSet::new();
    for m in matches {
        validate_match(m)?;
        if !seen.insert(m.fixture.as_str()) {
            return Err(ParlayError::DuplicateFixture(m.fixture.clone()));
        }
    }
    Ok(())
}

fn validate_match(m: &Match) -> Result<(), ParlayError> {
    let invalid = |reason: String| ParlayError::InvalidMatch {
        fixture: m.fixture.clone(),
        reason,
    };

    for label in OutcomeLabel::ALL {
        let p = m.probability(label);
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(invalid(format!("{label} probability {p} outside [0, 1]")));
        }
        let odds = m.odds(label);
        if !odds.is_finite() || odds <= 1.0 {
            return Err(invalid(format!("{label} odds {odds} must exceed 1.0")));
        }
    }

    let sum = m.probability_sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(invalid(format!("probabilities sum to {sum:.4}")));
    }
    Ok(())
}
