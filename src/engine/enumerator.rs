//! Parlay enumeration.
//!
//! Generates every size-`k` parlay from an outcome pool, drops the ones
//! that use two outcomes of the same fixture, evaluates the rest and ranks
//! them.

use serde::Serialize;
use tracing::debug;

use super::combinations::{binomial, Combinations};
use super::evaluator::{evaluate, Evaluation};
use super::expander::OutcomePool;
use crate::strategy::kelly::kelly_fraction;
use crate::strategy::ranking::{ParlayRanker, Ranking, SelectionFilter};
use crate::types::{FixtureSet, Outcome};

// ---------------------------------------------------------------------------
// Parlay
// ---------------------------------------------------------------------------

/// An accumulator bet: one outcome from each of `size()` distinct fixtures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parlay {
    pub legs: Vec<Outcome>,
    #[serde(skip)]
    pub fixtures: FixtureSet,
    pub expected_value: f64,
    pub probability: f64,
    pub odds: f64,
    /// Ranking score assigned by the enumerator.
    pub score: f64,
}

impl Parlay {
    /// Build and evaluate a parlay, scoring it by EV. Panics on empty `legs`.
    pub fn from_legs(legs: Vec<Outcome>) -> Self {
        let evaluation = evaluate(&legs);
        let fixtures = legs.iter().map(|o| o.slot).collect();
        Self::assemble(legs, fixtures, evaluation, evaluation.expected_value)
    }

    fn assemble(legs: Vec<Outcome>, fixtures: FixtureSet, evaluation: Evaluation, score: f64) -> Self {
        Self {
            legs,
            fixtures,
            expected_value: evaluation.expected_value,
            probability: evaluation.probability,
            odds: evaluation.odds,
            score,
        }
    }

    pub fn size(&self) -> usize {
        self.legs.len()
    }

    pub fn evaluation(&self) -> Evaluation {
        Evaluation {
            expected_value: self.expected_value,
            probability: self.probability,
            odds: self.odds,
        }
    }

    /// Fractional Kelly stake for the whole parlay.
    pub fn kelly(&self, multiplier: f64) -> f64 {
        kelly_fraction(self.probability, Some(self.odds), multiplier)
    }
}

/// A parlay with its recommended stake as a fraction of bankroll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizedParlay {
    #[serde(flatten)]
    pub parlay: Parlay,
    pub stake_fraction: f64,
}

// ---------------------------------------------------------------------------
// Enumerator
// ---------------------------------------------------------------------------

pub struct ParlayEnumerator {
    filter: SelectionFilter,
    ranker: Box<dyn ParlayRanker>,
}

impl Default for ParlayEnumerator {
    fn default() -> Self {
        Self::new(SelectionFilter::default(), Ranking::default())
    }
}

impl ParlayEnumerator {
    pub fn new(filter: SelectionFilter, ranker: impl ParlayRanker + 'static) -> Self {
        Self {
            filter,
            ranker: Box::new(ranker),
        }
    }

    pub fn filter(&self) -> &SelectionFilter {
        &self.filter
    }

    /// Every valid size-`k` parlay that passes the selection filter,
    /// best score first.
    pub fn enumerate(&self, pool: &OutcomePool, k: usize) -> Vec<Parlay> {
        self.collect(pool, k, &self.filter)
    }

    /// Every valid size-`k` parlay, unfiltered, best score first.
    pub fn enumerate_all(&self, pool: &OutcomePool, k: usize) -> Vec<Parlay> {
        self.collect(pool, k, &SelectionFilter::accept_all())
    }

    fn collect(&self, pool: &OutcomePool, k: usize, filter: &SelectionFilter) -> Vec<Parlay> {
        let outcomes = pool.outcomes();
        let mut candidates = 0usize;
        let mut parlays = Vec::new();

        for indices in Combinations::new(outcomes.len(), k) {
            let fixtures: FixtureSet = indices.iter().map(|&i| outcomes[i].slot).collect();
            // Two outcomes from the same fixture collapse into one slot.
            if fixtures.len() != k {
                continue;
            }
            candidates += 1;

            let evaluation = evaluate(indices.iter().map(|&i| &outcomes[i]));
            if !filter.accepts(&evaluation) {
                continue;
            }

            let legs = indices.iter().map(|&i| outcomes[i].clone()).collect();
            let score = self.ranker.score(&evaluation);
            parlays.push(Parlay::assemble(legs, fixtures, evaluation, score));
        }

        parlays.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            size = k,
            combinations = binomial(outcomes.len(), k),
            valid = candidates,
            kept = parlays.len(),
            "Parlays enumerated"
        );

        parlays
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
