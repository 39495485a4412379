//! Strategy layer: ranking, Kelly sizing, single-bet selection, and the
//! planner that drives the engine end to end.

pub mod kelly;
pub mod ranking;
pub mod singles;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::AppConfig;
use crate::data::{validate_slate, MatchSource};
use crate::engine::combiner::{CountSpec, Portfolio, PortfolioCombiner};
use crate::engine::enumerator::{ParlayEnumerator, SizedParlay};
use crate::engine::expander::OutcomePool;
use crate::types::{Match, ParlayError};
use kelly::KellySizer;

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Pipelines expansion → enumeration → portfolio search → Kelly sizing.
///
/// Holds no slate state; every call works on the matches it is given.
pub struct ParlayPlanner {
    enumerator: ParlayEnumerator,
    combiner: PortfolioCombiner,
    sizer: KellySizer,
    top_n: Option<usize>,
}

impl ParlayPlanner {
    pub fn new(
        enumerator: ParlayEnumerator,
        combiner: PortfolioCombiner,
        sizer: KellySizer,
        top_n: Option<usize>,
    ) -> Self {
        Self {
            enumerator,
            combiner,
            sizer,
            top_n,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ParlayEnumerator::new(config.search.filter(), config.search.ranking),
            PortfolioCombiner::new(config.search.combiner_config()),
            KellySizer::new(config.kelly.clone()),
            config.search.top_n(),
        )
    }

    pub fn enumerator(&self) -> &ParlayEnumerator {
        &self.enumerator
    }

    pub fn sizer(&self) -> &KellySizer {
        &self.sizer
    }

    /// Best qualifying parlays of one size, each with its Kelly stake.
    pub fn best_parlays(&self, matches: &[Match], size: usize) -> Result<Vec<SizedParlay>, ParlayError> {
        let pool = OutcomePool::from_matches(matches)?;
        let mut parlays = self.enumerator.enumerate(&pool, size);
        if let Some(n) = self.top_n {
            parlays.truncate(n);
        }

        let sized: Vec<SizedParlay> = parlays
            .into_iter()
            .map(|parlay| {
                let stake_fraction = self.sizer.stake_fraction(parlay.probability, Some(parlay.odds));
                SizedParlay {
                    parlay,
                    stake_fraction,
                }
            })
            .collect();

        info!(
            size,
            matches = matches.len(),
            returned = sized.len(),
            best_ev = sized.first().map(|p| format!("{:.4}", p.parlay.expected_value)).unwrap_or_default(),
            "Best parlays selected"
        );
        Ok(sized)
    }

    /// Fixture-disjoint portfolios matching `spec`, best total EV first.
    pub fn build_portfolios(&self, matches: &[Match], spec: &CountSpec) -> Result<Vec<Portfolio>, ParlayError> {
        let pool = OutcomePool::from_matches(matches)?;
        let available = pool.fixture_count();
        self.combiner.validate(spec, available)?;

        let pools: BTreeMap<_, _> = spec
            .entries()
            .map(|(size, _)| (size, self.enumerator.enumerate(&pool, size)))
            .collect();

        self.combiner.combine(spec, &pools, available, &self.sizer)
    }

    /// Load and validate a slate from `source`, then plan single-size parlays.
    pub fn parlays_from_source(&self, source: &dyn MatchSource, size: usize) -> Result<Vec<SizedParlay>> {
        let matches = load_validated(source)?;
        Ok(self.best_parlays(&matches, size)?)
    }

    /// Load and validate a slate from `source`, then search portfolios.
    pub fn portfolios_from_source(&self, source: &dyn MatchSource, spec: &CountSpec) -> Result<Vec<Portfolio>> {
        let matches = load_validated(source)?;
        Ok(self.build_portfolios(&matches, spec)?)
    }
}

fn load_validated(source: &dyn MatchSource) -> Result<Vec<Match>> {
    let name = source.name();
    let matches = source
        .load_matches()
        .with_context(|| format!("Failed to load matches from {name}"))?;
    validate_slate(&matches).with_context(|| format!("Invalid slate from {name}"))?;
    Ok(matches)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
