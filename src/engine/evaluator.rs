//! Expected-value evaluation of a parlay.
//!
//! Legs are treated as independent events: the joint probability is the
//! product of leg probabilities and the payout is the product of the odds.

use serde::Serialize;

use crate::types::Outcome;

/// EV, joint probability and combined odds of a unit stake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub expected_value: f64,
    pub probability: f64,
    pub odds: f64,
}

impl Evaluation {
    pub fn from_parts(probability: f64, odds: f64) -> Self {
        Self {
            expected_value: expected_value(probability, odds),
            probability,
            odds,
        }
    }
}

/// EV of a unit stake: win `odds - 1` with `probability`, otherwise lose 1.
pub fn expected_value(probability: f64, odds: f64) -> f64 {
    probability * (odds - 1.0) - (1.0 - probability)
}

/// Evaluate a parlay. Panics on an empty leg list.
pub fn evaluate<'a, I>(legs: I) -> Evaluation
where
    I: IntoIterator<Item = &'a Outcome>,
{
    let (mut probabilities, mut odds): (Vec<f64>, Vec<f64>) =
        legs.into_iter().map(|o| (o.probability, o.odds)).unzip();
    assert!(!probabilities.is_empty(), "cannot evaluate a parlay without legs");

    Evaluation::from_parts(joint_probability(&mut probabilities), product(&mut odds))
}

/// Joint probability of independent legs.
fn joint_probability(probabilities: &mut [f64]) -> f64 {
    product(probabilities)
}

// Factors are multiplied in sorted order so the result is independent of leg order.
fn product(factors: &mut [f64]) -> f64 {
    factors.sort_by(|a, b| a.total_cmp(b));
    factors.iter().product()
}
