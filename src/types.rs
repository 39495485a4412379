//! Shared types for the PARLAY engine.
//!
//! These types form the data model used across all modules: the match
//! records supplied by loaders, the outcomes expanded from them, the
//! fixture sets used for disjointness checks, and the domain error enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A single fixture with three mutually exclusive outcomes.
///
/// Probabilities are our estimates, odds are the bookmaker's decimal odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub fixture: String,
    pub win_probability: f64,
    pub draw_probability: f64,
    pub loss_probability: f64,
    pub win_odds: f64,
    pub draw_odds: f64,
    pub loss_odds: f64,
    /// Scheduled kickoff, when the loader knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickoff: Option<DateTime<Utc>>,
}

impl Match {
    /// Build a match from `[win, draw, loss]` probabilities and odds.
    pub fn new(fixture: impl Into<String>, probabilities: [f64; 3], odds: [f64; 3]) -> Self {
        Self {
            fixture: fixture.into(),
            win_probability: probabilities[0],
            draw_probability: probabilities[1],
            loss_probability: probabilities[2],
            win_odds: odds[0],
            draw_odds: odds[1],
            loss_odds: odds[2],
            kickoff: None,
        }
    }

    /// Estimated probability of one outcome.
    pub fn probability(&self, label: OutcomeLabel) -> f64 {
        match label {
            OutcomeLabel::Win => self.win_probability,
            OutcomeLabel::Draw => self.draw_probability,
            OutcomeLabel::Loss => self.loss_probability,
        }
    }

    /// Decimal odds offered for one outcome.
    pub fn odds(&self, label: OutcomeLabel) -> f64 {
        match label {
            OutcomeLabel::Win => self.win_odds,
            OutcomeLabel::Draw => self.draw_odds,
            OutcomeLabel::Loss => self.loss_odds,
        }
    }

    /// Sum of the three outcome probabilities (should be ~1.0).
    pub fn probability_sum(&self) -> f64 {
        self.win_probability + self.draw_probability + self.loss_probability
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (W {:.0}% @ {:.2} | D {:.0}% @ {:.2} | L {:.0}% @ {:.2})",
            self.fixture,
            self.win_probability * 100.0,
            self.win_odds,
            self.draw_probability * 100.0,
            self.draw_odds,
            self.loss_probability * 100.0,
            self.loss_odds,
        )
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a fixture from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeLabel {
    Win,
    Draw,
    Loss,
}

impl OutcomeLabel {
    /// All labels in expansion order.
    pub const ALL: [OutcomeLabel; 3] = [OutcomeLabel::Win, OutcomeLabel::Draw, OutcomeLabel::Loss];
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeLabel::Win => write!(f, "Win"),
            OutcomeLabel::Draw => write!(f, "Draw"),
            OutcomeLabel::Loss => write!(f, "Loss"),
        }
    }
}

/// One bettable outcome of a fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub fixture: String,
    /// Position of the fixture within the loaded slate; used for fixture sets.
    #[serde(skip)]
    pub slot: usize,
    pub label: OutcomeLabel,
    pub probability: f64,
    pub odds: f64,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({:.1}% @ {:.2})",
            self.fixture,
            self.label,
            self.probability * 100.0,
            self.odds
        )
    }
}

// ---------------------------------------------------------------------------
// Fixture sets
// ---------------------------------------------------------------------------

/// Set of fixture slots, stored as a 64-bit mask.
///
/// Union and cardinality are single instructions, which keeps the
/// disjointness test in the portfolio search cheap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FixtureSet(u64);

impl FixtureSet {
    /// Maximum number of distinct fixtures a slate may contain.
    pub const CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self(0)
    }

    /// Add a fixture slot. Panics if `slot >= CAPACITY`.
    pub fn insert(&mut self, slot: usize) {
        assert!(slot < Self::CAPACITY, "fixture slot {slot} out of range");
        self.0 |= 1u64 << slot;
    }

    pub fn contains(&self, slot: usize) -> bool {
        slot < Self::CAPACITY && self.0 & (1u64 << slot) != 0
    }

    pub fn union(self, other: FixtureSet) -> FixtureSet {
        FixtureSet(self.0 | other.0)
    }

    pub fn is_disjoint(self, other: FixtureSet) -> bool {
        self.0 & other.0 == 0
    }

    /// Number of fixtures in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<usize> for FixtureSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = FixtureSet::new();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for PARLAY.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParlayError {
    #[error("Count specification needs {required} matches but only {available} are available")]
    SlateTooLarge { required: usize, available: usize },

    #[error("Requested {requested} parlays of size {size} but only {available} qualify")]
    InsufficientParlays {
        size: usize,
        requested: usize,
        available: usize,
    },

    #[error("Invalid parlay size: {0}")]
    InvalidSize(usize),

    #[error("Invalid match {fixture}: {reason}")]
    InvalidMatch { fixture: String, reason: String },

    #[error("Duplicate fixture in slate: {0}")]
    DuplicateFixture(String),

    #[error("Too many fixtures: {count} (max {max})")]
    TooManyFixtures { count: usize, max: usize },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
