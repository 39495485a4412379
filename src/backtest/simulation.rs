//! Monte Carlo bankroll simulation.
//!
//! Plays a sequence of parlay bets with random outcomes, staking a
//! fractional Kelly amount each time, and reports profit, hit rate, Sharpe
//! ratio, max drawdown and the equity curve. Bets are either stratified
//! draws from a size profile or the observed top parlays replayed in
//! order. Results are averaged across deterministic seeds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::strata::SizeProfile;
use crate::strategy::kelly::kelly_fraction;
use crate::types::ParlayError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub starting_capital: f64,
    /// Fractional Kelly multiplier applied to every stake.
    pub kelly_multiplier: f64,
    /// Stakes never drop below this amount.
    pub min_stake: f64,
    /// Bets per run; samples are cycled when there are fewer.
    pub num_simulations: usize,
    /// Runs averaged, seeded `0..num_seeds`.
    pub num_seeds: u64,
    pub sampling: SamplingMode,
    /// Equal-width bins per probability and odds histogram.
    pub num_bins: usize,
    /// Normalised range above which the extreme value is trimmed.
    pub discrepancy_threshold: f64,
    /// Seed for drawing and shuffling stratified samples.
    pub sampling_seed: u64,
}

/// Where the simulated bets come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// `num_simulations` draws from the probability and odds strata.
    #[default]
    Stratified,
    /// The observed top parlays, cycled in matchday order.
    Replay,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            starting_capital: 100.0,
            kelly_multiplier: 0.15,
            min_stake: 0.01,
            num_simulations: 76,
            num_seeds: 100,
            sampling: SamplingMode::Stratified,
            num_bins: 50,
            discrepancy_threshold: 1.0,
            sampling_seed: 0,
        }
    }
}

/// One bet to simulate: the parlay's joint probability and combined odds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub probability: f64,
    pub odds: f64,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    pub average_profit: f64,
    pub hit_rate: f64,
    pub total_profit: f64,
    pub std_dev: f64,
    pub sharpe_ratio: f64,
    /// Deepest fall below starting capital, as a fraction of it; at least
    /// 1.0 for a run that went bankrupt.
    pub max_drawdown: f64,
    /// Balance before the first bet and after every settled bet.
    pub equity_curve: Vec<f64>,
    pub bets_placed: usize,
    /// Mean EV of the profile's top parlays; 0 when not run from a profile.
    pub average_ev: f64,
    /// Mean Kelly fraction of the profile's top parlays.
    pub average_kelly: f64,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct MonteCarlo {
    config: MonteCarloConfig,
}

impl MonteCarlo {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Stake for one bet: a Kelly fraction of starting capital, floored at
    /// `min_stake`.
    pub fn stake(&self, sample: &Sample) -> f64 {
        let fraction = kelly_fraction(sample.probability, Some(sample.odds), self.config.kelly_multiplier);
        (self.config.starting_capital * fraction).max(self.config.min_stake)
    }

    /// Play `num_simulations` bets drawn in order from `samples`.
    ///
    /// Stops early once the balance is wiped out.
    pub fn run_once<R: Rng>(&self, samples: &[Sample], rng: &mut R) -> SimulationReport {
        let start = self.config.starting_capital;
        let mut balance = start;
        let mut equity_curve = vec![start];
        let mut profits = Vec::new();
        let mut max_drawdown = 0.0_f64;

        for sample in samples.iter().cycle().take(self.config.num_simulations) {
            let stake = self.stake(sample);
            let profit = if rng.gen::<f64>() < sample.probability {
                stake * (sample.odds - 1.0)
            } else {
                -stake
            };
            profits.push(profit);
            balance += profit;

            if start > 0.0 && balance < start {
                max_drawdown = max_drawdown.max((start - balance) / start);
            }
            if balance <= 0.0 {
                debug!(bets = profits.len(), max_drawdown, "Bankroll wiped out");
                break;
            }
            equity_curve.push(balance);
        }

        let bets_placed = profits.len();
        let total_profit: f64 = profits.iter().sum();
        let (average_profit, hit_rate) = if bets_placed > 0 {
            let n = bets_placed as f64;
            let hits = profits.iter().filter(|p| **p > 0.0).count();
            (total_profit / n, hits as f64 / n)
        } else {
            (0.0, 0.0)
        };

        SimulationReport {
            average_profit,
            hit_rate,
            total_profit,
            std_dev: std_dev(&profits),
            sharpe_ratio: compute_sharpe(&profits),
            max_drawdown,
            equity_curve,
            bets_placed,
            ..SimulationReport::default()
        }
    }

    /// Average of `run_once` over seeds `0..num_seeds`.
    ///
    /// Equity curves of runs that stopped early are padded with their last
    /// balance so every curve has the same length before averaging.
    pub fn run_seeds(&self, samples: &[Sample]) -> Result<SimulationReport, ParlayError> {
        if self.config.num_seeds == 0 {
            return Err(ParlayError::InvalidConfig("num_seeds must be at least 1".into()));
        }

        let runs: Vec<SimulationReport> = (0..self.config.num_seeds)
            .map(|seed| self.run_once(samples, &mut StdRng::seed_from_u64(seed)))
            .collect();

        let n = runs.len() as f64;
        let mean = |f: fn(&SimulationReport) -> f64| runs.iter().map(f).sum::<f64>() / n;

        let len = runs.iter().map(|r| r.equity_curve.len()).max().unwrap_or(0);
        let mut equity_curve = vec![0.0; len];
        for run in &runs {
            let last = run.equity_curve.last().copied().unwrap_or(0.0);
            for (i, value) in equity_curve.iter_mut().enumerate() {
                *value += run.equity_curve.get(i).copied().unwrap_or(last) / n;
            }
        }

        let report = SimulationReport {
            average_profit: mean(|r| r.average_profit),
            hit_rate: mean(|r| r.hit_rate),
            total_profit: mean(|r| r.total_profit),
            std_dev: mean(|r| r.std_dev),
            sharpe_ratio: mean(|r| r.sharpe_ratio),
            max_drawdown: mean(|r| r.max_drawdown),
            equity_curve,
            bets_placed: runs.iter().map(|r| r.bets_placed).sum::<usize>() / runs.len(),
            ..SimulationReport::default()
        };

        info!(
            seeds = self.config.num_seeds,
            samples = samples.len(),
            total_profit = format!("{:.2}", report.total_profit),
            hit_rate = format!("{:.1}%", report.hit_rate * 100.0),
            sharpe = format!("{:.3}", report.sharpe_ratio),
            max_drawdown = format!("{:.1}%", report.max_drawdown * 100.0),
            "Monte Carlo complete"
        );

        Ok(report)
    }

    /// Simulate one parlay size from its profile, sampling bets per the
    /// configured mode, and attach the profile's average EV and Kelly.
    pub fn run_profile(&self, profile: &SizeProfile) -> Result<SimulationReport, ParlayError> {
        let samples = match self.config.sampling {
            SamplingMode::Stratified => {
                let mut rng = StdRng::seed_from_u64(self.config.sampling_seed);
                profile.stratified_samples(
                    self.config.num_bins,
                    self.config.discrepancy_threshold,
                    self.config.num_simulations,
                    &mut rng,
                )
            }
            SamplingMode::Replay => profile.replay_samples(),
        };

        let mut report = self.run_seeds(&samples)?;
        report.average_ev = profile.average_ev();
        report.average_kelly = profile.average_kelly();

        info!(
            size = profile.size,
            mode = ?self.config.sampling,
            samples = samples.len(),
            average_ev = format!("{:.4}", report.average_ev),
            average_kelly = format!("{:.4}", report.average_kelly),
            "Profile simulated"
        );
        Ok(report)
    }
}

/// Sample standard deviation; 0 for fewer than two values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Per-bet Sharpe ratio: mean profit over its standard deviation.
pub fn compute_sharpe(profits: &[f64]) -> f64 {
    let sd = std_dev(profits);
    if sd < 1e-10 {
        return 0.0;
    }
    let mean = profits.iter().sum::<f64>() / profits.len() as f64;
    mean / sd
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
