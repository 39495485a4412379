//! Outcome expansion.
//!
//! Turns match records into the flat pool of outcomes the enumerator
//! draws parlay legs from. Every outcome keeps its fixture id and slot so
//! later stages can group by fixture.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{FixtureSet, Match, Outcome, OutcomeLabel, ParlayError};

/// Expand one match into its Win/Draw/Loss outcomes.
pub fn expand(m: &Match, slot: usize) -> [Outcome; 3] {
    OutcomeLabel::ALL.map(|label| Outcome {
        fixture: m.fixture.clone(),
        slot,
        label,
        probability: m.probability(label),
        odds: m.odds(label),
    })
}

/// Flattened outcome pool for one slate of matches.
#[derive(Debug, Clone, Default)]
pub struct OutcomePool {
    outcomes: Vec<Outcome>,
    fixture_count: usize,
}

impl OutcomePool {
    /// Expand a slate. Matches sharing a fixture id share a slot.
    pub fn from_matches(matches: &[Match]) -> Result<Self, ParlayError> {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut outcomes = Vec::with_capacity(matches.len() * 3);

        for m in matches {
            let next = slots.len();
            let slot = *slots.entry(m.fixture.as_str()).or_insert(next);
            if slot >= FixtureSet::CAPACITY {
                return Err(ParlayError::TooManyFixtures {
                    count: matches.len(),
                    max: FixtureSet::CAPACITY,
                });
            }
            outcomes.extend(expand(m, slot));
        }

        debug!(
            matches = matches.len(),
            fixtures = slots.len(),
            outcomes = outcomes.len(),
            "Outcome pool built"
        );

        Ok(Self {
            outcomes,
            fixture_count: slots.len(),
        })
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of distinct fixtures represented in the pool.
    pub fn fixture_count(&self) -> usize {
        self.fixture_count
    }
}
