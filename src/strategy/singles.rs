//! Single-bet selection.
//!
//! Picks the most profitable outcome of every match as a standalone bet and
//! sizes it at full Kelly against the bankroll. Stakes are then taken at the
//! largest Kelly multiplier that keeps the slate under the risk ceiling.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use super::kelly::{kelly_fraction, normalize_stakes, to_cents, KellySizer, StakeCandidate};
use crate::engine::evaluator::expected_value;
use crate::engine::expander::expand;
use crate::types::{Match, OutcomeLabel, ParlayError};

/// Best outcome of one match, with its unscaled stake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleBet {
    pub fixture: String,
    pub label: OutcomeLabel,
    pub probability: f64,
    pub odds: f64,
    pub expected_value: f64,
    /// Full-Kelly stake in currency units.
    pub risk: f64,
}

impl SingleBet {
    pub fn candidate(&self) -> StakeCandidate {
        StakeCandidate {
            label: format!("{} {}", self.fixture, self.label),
            probability: self.probability,
            odds: Some(self.odds),
        }
    }
}

/// For every match, the outcome with the highest EV, kept only when that
/// EV is positive. Ties go to the earlier outcome (Win, then Draw).
pub fn pick_best_outcomes(matches: &[Match], bankroll: f64) -> Vec<SingleBet> {
    let mut bets = Vec::new();

    for (slot, m) in matches.iter().enumerate() {
        let mut best: Option<(f64, usize)> = None;
        let outcomes = expand(m, slot);
        for (i, o) in outcomes.iter().enumerate() {
            let ev = expected_value(o.probability, o.odds);
            if best.map_or(true, |(best_ev, _)| ev > best_ev) {
                best = Some((ev, i));
            }
        }

        let Some((ev, i)) = best else { continue };
        if ev <= 0.0 {
            debug!(fixture = %m.fixture, ev, "No positive single bet");
            continue;
        }

        let o = &outcomes[i];
        bets.push(SingleBet {
            fixture: o.fixture.clone(),
            label: o.label,
            probability: o.probability,
            odds: o.odds,
            expected_value: ev,
            risk: bankroll * kelly_fraction(o.probability, Some(o.odds), 1.0),
        });
    }

    bets
}

/// A single bet with its stake rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakedBet {
    #[serde(flatten)]
    pub bet: SingleBet,
    pub stake: Decimal,
}

/// Stakes for a slate of single bets under the configured risk ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakePlan {
    pub bankroll: f64,
    pub max_risk: f64,
    /// Kelly multiplier every stake was sized with.
    pub multiplier: f64,
    /// Sum of the stakes before rounding.
    pub total_risk: f64,
    pub bets: Vec<StakedBet>,
}

impl StakePlan {
    /// Rescale the full-Kelly risks so the stakes spend the whole risk
    /// ceiling, as done before placing a day's bets.
    pub fn fill_budget(mut self) -> Self {
        let risks: Vec<f64> = self.bets.iter().map(|b| b.bet.risk).collect();
        let stakes = normalize_stakes(&risks, self.max_risk);
        for (bet, stake) in self.bets.iter_mut().zip(stakes) {
            bet.stake = stake;
        }
        self.total_risk = self.bets.iter().filter_map(|b| b.stake.to_f64()).sum();
        self
    }
}

/// Pick the best single bet per match and stake them against the bankroll.
///
/// Every bet is staked at `bankroll × kelly(p, odds, m)`, where `m` is the
/// largest multiplier whose total stays within the risk ceiling.
pub fn stake_singles(matches: &[Match], sizer: &KellySizer) -> Result<StakePlan, ParlayError> {
    let bankroll = sizer.config().bankroll;
    let max_risk = sizer.max_risk();

    let bets = pick_best_outcomes(matches, bankroll);
    let candidates: Vec<StakeCandidate> = bets.iter().map(SingleBet::candidate).collect();
    let scaling = sizer.find_risk_multiplier(&candidates, max_risk)?;

    info!(
        matches = matches.len(),
        bets = bets.len(),
        multiplier = format!("{:.2}", scaling.multiplier),
        total_risk = format!("{:.2}", scaling.total_risk),
        max_risk = format!("{max_risk:.2}"),
        "Single bets staked"
    );

    Ok(StakePlan {
        bankroll,
        max_risk,
        multiplier: scaling.multiplier,
        total_risk: scaling.total_risk,
        bets: bets
            .into_iter()
            .zip(&candidates)
            .map(|(bet, candidate)| StakedBet {
                stake: to_cents(sizer.stake(candidate, scaling.multiplier)),
                bet,
            })
            .collect(),
    })
}
