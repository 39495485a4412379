//! Kelly criterion stake sizing.
//!
//! Computes fractional Kelly stakes for single bets and parlays, searches
//! for the largest uniform multiplier that keeps a slate of bets under a
//! risk ceiling, and normalises stakes to a fixed risk budget.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::ParlayError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Kelly sizing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier applied to parlay stakes.
    pub multiplier: f64,
    /// Bankroll the stake fractions are applied to.
    pub bankroll: f64,
    /// Decrement used by the risk-ceiling search.
    pub risk_step: f64,
    /// Risk ceiling as a fraction of bankroll.
    pub max_risk_pct: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            multiplier: 0.15,
            bankroll: 100.0,
            risk_step: 0.01,
            max_risk_pct: 0.90,
        }
    }
}

// ---------------------------------------------------------------------------
// Kelly fraction
// ---------------------------------------------------------------------------

/// Fractional Kelly stake: `multiplier × (p·b − (1 − p)) / b`.
///
/// Returns 0 when the odds are unknown or not positive. The result is
/// negative when the bet has no edge.
pub fn kelly_fraction(probability: f64, odds: Option<f64>, multiplier: f64) -> f64 {
    match odds {
        Some(b) if b > 0.0 => multiplier * (probability * b - (1.0 - probability)) / b,
        _ => 0.0,
    }
}

/// A bet competing for a share of the bankroll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeCandidate {
    pub label: String,
    pub probability: f64,
    pub odds: Option<f64>,
}

/// Outcome of the risk-ceiling search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskScaling {
    pub multiplier: f64,
    pub total_risk: f64,
}

// ---------------------------------------------------------------------------
// Sizer
// ---------------------------------------------------------------------------

pub struct KellySizer {
    config: KellyConfig,
}

impl KellySizer {
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    /// Access the Kelly configuration.
    pub fn config(&self) -> &KellyConfig {
        &self.config
    }

    /// Stake fraction at the configured multiplier.
    pub fn stake_fraction(&self, probability: f64, odds: Option<f64>) -> f64 {
        kelly_fraction(probability, odds, self.config.multiplier)
    }

    /// Risk ceiling in currency units.
    pub fn max_risk(&self) -> f64 {
        self.config.bankroll * self.config.max_risk_pct
    }

    /// Stake for one bet at `multiplier`; bets without an edge stake nothing.
    pub fn stake(&self, bet: &StakeCandidate, multiplier: f64) -> f64 {
        (self.config.bankroll * kelly_fraction(bet.probability, bet.odds, multiplier)).max(0.0)
    }

    /// Total amount staked across `bets` at `multiplier`.
    pub fn total_risk(&self, bets: &[StakeCandidate], multiplier: f64) -> f64 {
        bets.iter().map(|b| self.stake(b, multiplier)).sum()
    }

    /// Largest multiplier (stepping down from 1.0) whose total stake does not
    /// exceed `max_risk`.
    ///
    /// Total risk is non-decreasing in the multiplier, so the first value
    /// found walking down is the best one. If even the smallest positive
    /// step is too risky, the result is a zero multiplier.
    pub fn find_risk_multiplier(
        &self,
        bets: &[StakeCandidate],
        max_risk: f64,
    ) -> Result<RiskScaling, ParlayError> {
        let step = self.config.risk_step;
        if !(step > 0.0 && step <= 1.0) {
            return Err(ParlayError::InvalidConfig(format!(
                "risk_step must be in (0, 1], got {step}"
            )));
        }
        if !(max_risk >= 0.0) {
            return Err(ParlayError::InvalidConfig(format!(
                "max_risk must be non-negative, got {max_risk}"
            )));
        }

        let steps = (1.0 / step).ceil() as u64;
        for i in 0..steps {
            // Derived from the step count so the multiplier does not drift.
            let multiplier = 1.0 - i as f64 * step;
            if multiplier <= 0.0 {
                break;
            }
            let total_risk = self.total_risk(bets, multiplier);
            if total_risk <= max_risk {
                info!(
                    bets = bets.len(),
                    multiplier = format!("{multiplier:.2}"),
                    total_risk = format!("{total_risk:.2}"),
                    max_risk = format!("{max_risk:.2}"),
                    "Risk multiplier found"
                );
                return Ok(RiskScaling {
                    multiplier,
                    total_risk,
                });
            }
            debug!(multiplier, total_risk, max_risk, "Risk above ceiling");
        }

        info!(bets = bets.len(), max_risk, "No positive multiplier fits the risk ceiling");
        Ok(RiskScaling {
            multiplier: 0.0,
            total_risk: 0.0,
        })
    }
}

/// Scale raw risks so they add up to `max_risk`, rounded to cents.
///
/// Negative risks count as zero. A zero total yields all-zero stakes.
pub fn normalize_stakes(risks: &[f64], max_risk: f64) -> Vec<Decimal> {
    let total: f64 = risks.iter().map(|r| r.max(0.0)).sum();
    if total <= 0.0 {
        return vec![Decimal::ZERO; risks.len()];
    }
    let scale = max_risk / total;
    risks.iter().map(|r| to_cents(r.max(0.0) * scale)).collect()
}

/// Currency amount rounded to cents; non-finite amounts become zero.
pub fn to_cents(amount: f64) -> Decimal {
    Decimal::from_f64_retain(amount)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
