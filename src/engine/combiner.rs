//! Portfolio search.
//!
//! Given a count specification (how many parlays of each size) and the
//! qualifying parlay pool for every size, finds all portfolios whose
//! members never share a fixture and ranks them by total EV.
//!
//! Parlays live in per-size arenas; groupings and cross-product tuples are
//! index vectors into those arenas, and only the top-N accepted portfolios
//! are materialised.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use super::combinations::{Combinations, CrossProduct};
use super::enumerator::{Parlay, SizedParlay};
use crate::strategy::kelly::KellySizer;
use crate::types::{FixtureSet, ParlayError};

// ---------------------------------------------------------------------------
// Count specification
// ---------------------------------------------------------------------------

/// Requested number of parlays per parlay size, e.g. `1:6,2:2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSpec(BTreeMap<usize, usize>);

impl CountSpec {
    pub fn new(counts: BTreeMap<usize, usize>) -> Self {
        Self(counts)
    }

    /// `(size, count)` pairs with a non-zero count, smallest size first.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&size, &count)| (size, count))
    }

    /// Fixtures a complete portfolio would occupy: `Σ size × count`.
    pub fn required_matches(&self) -> usize {
        self.entries().map(|(size, count)| size * count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

impl FromIterator<(usize, usize)> for CountSpec {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for CountSpec {
    type Err = ParlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut counts = BTreeMap::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (size, count) = part.split_once(':').ok_or_else(|| {
                ParlayError::InvalidConfig(format!("expected size:count, got '{part}'"))
            })?;
            let size: usize = size.trim().parse().map_err(|_| {
                ParlayError::InvalidConfig(format!("invalid parlay size '{size}'"))
            })?;
            let count: usize = count.trim().parse().map_err(|_| {
                ParlayError::InvalidConfig(format!("invalid parlay count '{count}'"))
            })?;
            *counts.entry(size).or_insert(0) += count;
        }
        Ok(Self(counts))
    }
}

impl fmt::Display for CountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries()
            .map(|(size, count)| format!("{size}:{count}"))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// A set of fixture-disjoint parlays selected together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    /// Members grouped by size, smallest size first.
    pub members: Vec<SizedParlay>,
    pub total_ev: f64,
}

impl Portfolio {
    /// Union of the fixtures used by every member.
    pub fn fixtures(&self) -> FixtureSet {
        self.members
            .iter()
            .fold(FixtureSet::new(), |acc, m| acc.union(m.parlay.fixtures))
    }

    /// Sum of each member's own fixture count.
    pub fn fixture_total(&self) -> usize {
        self.members.iter().map(|m| m.parlay.fixtures.len()).sum()
    }

    /// Whether no fixture is used twice across members.
    pub fn is_disjoint(&self) -> bool {
        self.fixtures().len() == self.fixture_total()
    }

    pub fn members_of_size(&self, size: usize) -> impl Iterator<Item = &SizedParlay> {
        self.members.iter().filter(move |m| m.parlay.size() == size)
    }
}

// ---------------------------------------------------------------------------
// Combiner
// ---------------------------------------------------------------------------

/// Portfolio search configuration.
#[derive(Debug, Clone)]
pub struct CombinerConfig {
    /// Upper bound on fixtures one portfolio may span (one matchday).
    pub max_slate_matches: usize,
    /// Number of portfolios to return; `None` returns every accepted one.
    pub top_n: Option<usize>,
    /// Draw a progress bar during the cross-product traversal.
    pub show_progress: bool,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            max_slate_matches: 10,
            top_n: Some(10),
            show_progress: false,
        }
    }
}

/// `count` parlays of one size, stored as indices into that size's pool.
#[derive(Debug, Clone)]
struct Grouping {
    members: Vec<usize>,
    fixtures: FixtureSet,
    fixture_total: usize,
    expected_value: f64,
}

/// Per-size arena and its groupings.
struct SizeSlot<'a> {
    count: usize,
    pool: &'a [Parlay],
    groupings: Vec<Grouping>,
}

/// Accepted cross-product tuple, one grouping index per size.
#[derive(Debug)]
struct Candidate {
    total_ev: f64,
    tuple: Vec<usize>,
}

// Higher EV ranks first; ties go to the earlier tuple.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_ev
            .total_cmp(&other.total_ev)
            .then_with(|| other.tuple.cmp(&self.tuple))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Accepted tuples, bounded to the best `limit` when a limit is set.
struct Shortlist {
    limit: Option<usize>,
    heap: BinaryHeap<Reverse<Candidate>>,
    accepted: usize,
}

impl Shortlist {
    fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            heap: BinaryHeap::new(),
            accepted: 0,
        }
    }

    fn push(&mut self, candidate: Candidate) {
        self.accepted += 1;
        match self.limit {
            Some(0) => {}
            Some(n) if self.heap.len() >= n => {
                // Replace the current worst only when the newcomer beats it.
                if let Some(mut worst) = self.heap.peek_mut() {
                    if candidate > worst.0 {
                        *worst = Reverse(candidate);
                    }
                }
            }
            _ => self.heap.push(Reverse(candidate)),
        }
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    /// Kept candidates, best first.
    fn into_ranked(self) -> Vec<Candidate> {
        // Ascending order of `Reverse` is descending order of candidates.
        self.heap.into_sorted_vec().into_iter().map(|Reverse(c)| c).collect()
    }
}

pub struct PortfolioCombiner {
    config: CombinerConfig,
}

impl PortfolioCombiner {
    pub fn new(config: CombinerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CombinerConfig {
        &self.config
    }

    /// Reject specifications that cannot be filled from `available_fixtures`.
    pub fn validate(&self, spec: &CountSpec, available_fixtures: usize) -> Result<(), ParlayError> {
        if let Some((size, _)) = spec.entries().find(|(size, _)| *size == 0) {
            return Err(ParlayError::InvalidSize(size));
        }
        let available = available_fixtures.min(self.config.max_slate_matches);
        let required = spec.required_matches();
        if required > available {
            return Err(ParlayError::SlateTooLarge {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Search every fixture-disjoint portfolio satisfying `spec`.
    ///
    /// `pools` maps each parlay size to its qualifying parlays. Errors are
    /// raised before any search starts; an infeasible but valid request
    /// returns an empty list.
    pub fn combine(
        &self,
        spec: &CountSpec,
        pools: &BTreeMap<usize, Vec<Parlay>>,
        available_fixtures: usize,
        sizer: &KellySizer,
    ) -> Result<Vec<Portfolio>, ParlayError> {
        self.validate(spec, available_fixtures)?;

        let mut slots = Vec::new();
        for (size, count) in spec.entries() {
            let pool = pools.get(&size).map(Vec::as_slice).unwrap_or(&[]);
            if pool.len() < count {
                return Err(ParlayError::InsufficientParlays {
                    size,
                    requested: count,
                    available: pool.len(),
                });
            }
            slots.push(SizeSlot {
                count,
                pool,
                groupings: Vec::new(),
            });
        }

        if slots.is_empty() {
            return Ok(Vec::new());
        }

        for (slot, (size, _)) in slots.iter_mut().zip(spec.entries()) {
            slot.groupings = groupings(slot.pool, slot.count);
            debug!(
                size,
                count = slot.count,
                pool = slot.pool.len(),
                groupings = slot.groupings.len(),
                "Groupings built"
            );
        }

        let shortlist = self.search(&slots);
        let accepted = shortlist.accepted;
        let candidates = shortlist.into_ranked();

        let portfolios: Vec<Portfolio> = candidates
            .iter()
            .map(|c| materialise(&slots, c, sizer))
            .collect();

        info!(
            spec = %spec,
            accepted,
            returned = portfolios.len(),
            best_ev = portfolios.first().map(|p| format!("{:.4}", p.total_ev)).unwrap_or_default(),
            "Portfolio search complete"
        );

        Ok(portfolios)
    }

    /// Walk the cross-product of per-size groupings, keeping the best
    /// `top_n` disjoint tuples.
    fn search(&self, slots: &[SizeSlot<'_>]) -> Shortlist {
        let tuples = CrossProduct::new(slots.iter().map(|s| s.groupings.len()).collect());
        let progress = self.progress_bar(tuples.total());

        let mut shortlist = Shortlist::new(self.config.top_n);
        for tuple in tuples {
            progress.inc(1);

            let mut union = FixtureSet::new();
            let mut fixture_total = 0;
            let mut total_ev = 0.0;
            for (slot, &g) in slots.iter().zip(&tuple) {
                let grouping = &slot.groupings[g];
                union = union.union(grouping.fixtures);
                fixture_total += grouping.fixture_total;
                total_ev += grouping.expected_value;
            }

            // Any shared fixture shrinks the union below the summed sizes.
            if union.len() == fixture_total {
                shortlist.push(Candidate { total_ev, tuple });
            }
        }
        progress.finish_and_clear();
        debug!(accepted = shortlist.accepted, kept = shortlist.len(), "Cross-product searched");

        shortlist
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message("searching portfolios");
        bar
    }
}

/// All `count`-subsets of `pool` whose members are mutually disjoint.
///
/// Subsets that already overlap internally can never be part of an
/// accepted portfolio and are dropped here.
fn groupings(pool: &[Parlay], count: usize) -> Vec<Grouping> {
    Combinations::new(pool.len(), count)
        .filter_map(|members| {
            let fixtures = members
                .iter()
                .fold(FixtureSet::new(), |acc, &i| acc.union(pool[i].fixtures));
            let fixture_total: usize = members.iter().map(|&i| pool[i].fixtures.len()).sum();
            if fixtures.len() != fixture_total {
                return None;
            }
            let expected_value = members.iter().map(|&i| pool[i].expected_value).sum();
            Some(Grouping {
                members,
                fixtures,
                fixture_total,
                expected_value,
            })
        })
        .collect()
}

/// Turn an accepted index tuple into a portfolio with stake fractions.
///
/// Each member's Kelly stake is divided by the number of parlays of its
/// size, since those parlays share the same slice of bankroll.
fn materialise(slots: &[SizeSlot<'_>], candidate: &Candidate, sizer: &KellySizer) -> Portfolio {
    let mut members = Vec::new();
    for (slot, &g) in slots.iter().zip(&candidate.tuple) {
        for &i in &slot.groupings[g].members {
            let parlay = slot.pool[i].clone();
            let stake_fraction =
                sizer.stake_fraction(parlay.probability, Some(parlay.odds)) / slot.count as f64;
            members.push(SizedParlay {
                parlay,
                stake_fraction,
            });
        }
    }
    Portfolio {
        members,
        total_ev: candidate.total_ev,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
