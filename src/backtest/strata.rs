//! Per-size parlay profiles and stratified resampling.
//!
//! A profile holds the top parlay of every matchday for one parlay size.
//! Its probabilities and odds are binned into equal-width strata, and new
//! samples are drawn uniformly inside each bin in proportion to how many
//! observed values fell there.

use rand::distributions::Uniform;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::simulation::Sample;
use crate::engine::enumerator::ParlayEnumerator;
use crate::engine::expander::OutcomePool;
use crate::types::{Match, ParlayError};

/// Padding added to the top edge when the value range is narrower than
/// the bin count.
const TOP_EDGE_PAD: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Outlier trim
// ---------------------------------------------------------------------------

/// Which side of a skewed distribution gets trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Drops the smallest value (near-zero longshot probabilities).
    Probability,
    /// Drops the largest value (huge accumulator odds).
    Odds,
}

/// Drop the extreme value on `metric`'s side when the normalised range
/// `(max - min) / mean` exceeds `threshold`. Every copy of that extreme
/// goes.
pub fn trim_outliers(values: &[f64], metric: Metric, threshold: f64) -> Vec<f64> {
    let Some((min, max)) = min_max(values) else {
        return Vec::new();
    };
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let spread = if mean != 0.0 { (max - min) / mean } else { 0.0 };
    if spread <= threshold {
        return values.to_vec();
    }

    let kept: Vec<f64> = match metric {
        Metric::Probability => values.iter().copied().filter(|v| *v > min).collect(),
        Metric::Odds => values.iter().copied().filter(|v| *v < max).collect(),
    };
    debug!(?metric, spread, dropped = values.len() - kept.len(), "Outliers trimmed");
    kept
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))))
}

// ---------------------------------------------------------------------------
// Strata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub low: f64,
    pub high: f64,
    /// Observed values inside `[low, high)`.
    pub count: usize,
}

/// Equal-width histogram over a set of observed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Strata {
    pub bins: Vec<Bin>,
}

impl Strata {
    /// Bin `values` into `num_bins` equal-width bins spanning min to max.
    ///
    /// When the range is narrower than `num_bins` the top edge is padded
    /// so the maximum lands inside the last bin. A value sitting exactly on
    /// the top edge is counted in the last bin.
    pub fn build(values: &[f64], num_bins: usize) -> Self {
        let Some((min, max)) = min_max(values) else {
            return Self::default();
        };
        if num_bins == 0 {
            return Self::default();
        }

        let top = if max - min < num_bins as f64 { max + TOP_EDGE_PAD } else { max };
        let width = top - min;
        let edges: Vec<f64> = (0..=num_bins)
            .map(|i| if i == num_bins { top } else { min + width * i as f64 / num_bins as f64 })
            .collect();

        let mut bins: Vec<Bin> = edges
            .windows(2)
            .map(|w| Bin { low: w[0], high: w[1], count: 0 })
            .collect();

        for v in values {
            if let Some(bin) = bins.iter_mut().find(|b| b.low <= *v && *v < b.high) {
                bin.count += 1;
            } else if *v == top {
                if let Some(last) = bins.last_mut() {
                    last.count += 1;
                }
            }
        }

        Self { bins }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Draw about `num_samples` values: each non-empty bin contributes
    /// `round(count / total × num_samples)` uniform draws from its range.
    /// Draws come out grouped by bin, lowest first.
    pub fn sample<R: Rng>(&self, num_samples: usize, rng: &mut R) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(num_samples);
        for bin in self.bins.iter().filter(|b| b.count > 0) {
            let n = (bin.count as f64 / total as f64 * num_samples as f64).round() as usize;
            if bin.low < bin.high {
                let dist = Uniform::new(bin.low, bin.high);
                out.extend((0..n).map(|_| rng.sample(dist)));
            } else {
                out.extend(std::iter::repeat(bin.low).take(n));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Size profile
// ---------------------------------------------------------------------------

/// Top parlay of one size from every matchday that has one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeProfile {
    pub size: usize,
    pub probabilities: Vec<f64>,
    pub odds: Vec<f64>,
    pub evs: Vec<f64>,
    /// Kelly fraction of each top parlay at the simulation multiplier.
    pub kellys: Vec<f64>,
}

impl SizeProfile {
    /// Matchdays with no qualifying parlay of `size` are skipped.
    pub fn collect(
        matchdays: &[Vec<Match>],
        size: usize,
        enumerator: &ParlayEnumerator,
        kelly_multiplier: f64,
    ) -> Result<Self, ParlayError> {
        let mut profile = Self {
            size,
            ..Self::default()
        };
        for matches in matchdays {
            let pool = OutcomePool::from_matches(matches)?;
            if let Some(best) = enumerator.enumerate(&pool, size).first() {
                profile.probabilities.push(best.probability);
                profile.odds.push(best.odds);
                profile.evs.push(best.expected_value);
                profile.kellys.push(best.kelly(kelly_multiplier));
            }
        }
        debug!(size, matchdays = matchdays.len(), parlays = profile.len(), "Size profile collected");
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    pub fn average_ev(&self) -> f64 {
        mean(&self.evs)
    }

    pub fn average_kelly(&self) -> f64 {
        mean(&self.kellys)
    }

    /// The observed top parlays in matchday order.
    pub fn replay_samples(&self) -> Vec<Sample> {
        self.probabilities
            .iter()
            .zip(&self.odds)
            .map(|(p, o)| Sample {
                probability: *p,
                odds: *o,
            })
            .collect()
    }

    /// Synthetic bets drawn from the probability and odds strata.
    ///
    /// Probabilities (ascending by bin) are paired with odds in descending
    /// bin order, so likely bets get short prices, then the pairs are
    /// shuffled.
    pub fn stratified_samples<R: Rng>(
        &self,
        num_bins: usize,
        threshold: f64,
        num_samples: usize,
        rng: &mut R,
    ) -> Vec<Sample> {
        let prob_strata = Strata::build(&trim_outliers(&self.probabilities, Metric::Probability, threshold), num_bins);
        let odds_strata = Strata::build(&trim_outliers(&self.odds, Metric::Odds, threshold), num_bins);

        let probabilities = prob_strata.sample(num_samples, rng);
        let mut odds = odds_strata.sample(num_samples, rng);
        odds.reverse();

        let mut samples: Vec<Sample> = probabilities
            .into_iter()
            .zip(odds)
            .map(|(probability, odds)| Sample { probability, odds })
            .collect();
        samples.shuffle(rng);

        debug!(size = self.size, requested = num_samples, drawn = samples.len(), "Stratified samples drawn");
        samples
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // -- Trim --

    #[test]
    fn test_trim_keeps_tight_data() {
        let values = [0.4, 0.5, 0.6];
        assert_eq!(trim_outliers(&values, Metric::Probability, 1.0), values.to_vec());
        assert_eq!(trim_outliers(&values, Metric::Odds, 1.0), values.to_vec());
    }

    #[test]
    fn test_trim_drops_smallest_probability() {
        // (0.5 - 0.01) / 0.18 > 1
        let kept = trim_outliers(&[0.2, 0.01, 0.5, 0.01], Metric::Probability, 1.0);
        assert_eq!(kept, vec![0.2, 0.5]);
    }

    #[test]
    fn test_trim_drops_largest_odds() {
        let kept = trim_outliers(&[2.0, 40.0, 3.0], Metric::Odds, 1.0);
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn test_trim_zero_mean_and_empty() {
        assert_eq!(trim_outliers(&[-1.0, 1.0], Metric::Odds, 1.0), vec![-1.0, 1.0]);
        assert!(trim_outliers(&[], Metric::Probability, 1.0).is_empty());
    }

    // -- Binning --

    #[test]
    fn test_narrow_range_pads_top_edge() {
        let strata = Strata::build(&[1.0, 2.0, 3.0], 4);
        assert_eq!(strata.bins.len(), 4);
        assert_eq!(strata.bins[0].low, 1.0);
        assert!((strata.bins[3].high - 3.001).abs() < 1e-12);
        let counts: Vec<usize> = strata.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 1]);
    }

    #[test]
    fn test_wide_range_counts_max_in_last_bin() {
        let strata = Strata::build(&[0.0, 50.0, 100.0], 2);
        assert_eq!(strata.bins[0], Bin { low: 0.0, high: 50.0, count: 1 });
        assert_eq!(strata.bins[1], Bin { low: 50.0, high: 100.0, count: 2 });
        assert_eq!(strata.total(), 3);
    }

    #[test]
    fn test_bins_are_contiguous() {
        let strata = Strata::build(&[0.05, 0.12, 0.3, 0.31, 0.44], 50);
        assert_eq!(strata.bins.len(), 50);
        assert!(strata.bins.windows(2).all(|w| w[0].high == w[1].low));
        assert_eq!(strata.total(), 5);
    }

    #[test]
    fn test_empty_values_or_zero_bins() {
        assert!(Strata::build(&[], 10).bins.is_empty());
        assert!(Strata::build(&[1.0, 2.0], 0).bins.is_empty());
    }

    // -- Sampling --

    #[test]
    fn test_sample_is_proportional_and_in_range() {
        let strata = Strata::build(&[0.0, 50.0, 100.0], 2);
        let drawn = strata.sample(9, &mut StdRng::seed_from_u64(7));
        assert_eq!(drawn.len(), 9);
        assert!(drawn[..3].iter().all(|v| (0.0..50.0).contains(v)));
        assert!(drawn[3..].iter().all(|v| (50.0..100.0).contains(v)));
    }

    #[test]
    fn test_sample_skips_empty_bins() {
        let strata = Strata::build(&[1.0, 3.0], 4);
        let drawn = strata.sample(10, &mut StdRng::seed_from_u64(1));
        assert_eq!(drawn.len(), 10);
        let first = strata.bins[0];
        let last = strata.bins[3];
        assert!(drawn[..5].iter().all(|v| *v >= first.low && *v < first.high));
        assert!(drawn[5..].iter().all(|v| *v >= last.low && *v < last.high));
    }

    #[test]
    fn test_sample_from_empty_strata() {
        let drawn = Strata::default().sample(10, &mut StdRng::seed_from_u64(0));
        assert!(drawn.is_empty());
    }

    // -- Profile --

    fn matchdays() -> Vec<Vec<Match>> {
        vec![
            vec![
                Match::new("A", [0.50, 0.30, 0.20], [2.20, 3.10, 4.00]),
                Match::new("B", [0.60, 0.25, 0.15], [1.80, 3.90, 6.50]),
            ],
            vec![Match::new("C", [0.4, 0.3, 0.3], [2.0, 3.0, 3.0])],
            vec![Match::new("D", [0.45, 0.30, 0.25], [2.10, 3.50, 4.20])],
        ]
    }

    #[test]
    fn test_profile_collects_top_parlays() {
        let profile = SizeProfile::collect(&matchdays(), 1, &ParlayEnumerator::default(), 0.15).unwrap();
        // C has no positive-EV outcome.
        assert_eq!(profile.len(), 2);
        assert_eq!(profile.evs.len(), 2);
        for i in 0..profile.len() {
            let (p, o) = (profile.probabilities[i], profile.odds[i]);
            assert!((profile.evs[i] - (p * o - 1.0)).abs() < 1e-9);
            assert!((profile.kellys[i] - 0.15 * (p * o - (1.0 - p)) / o).abs() < 1e-12);
        }
        let samples = profile.replay_samples();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.probability * s.odds > 1.0));
    }

    #[test]
    fn test_profile_averages() {
        let profile = SizeProfile {
            size: 2,
            probabilities: vec![0.3, 0.4],
            odds: vec![4.0, 3.0],
            evs: vec![0.2, 0.2, 0.5],
            kellys: vec![0.01, 0.03],
        };
        assert!((profile.average_ev() - 0.3).abs() < 1e-12);
        assert!((profile.average_kelly() - 0.02).abs() < 1e-12);
        assert_eq!(SizeProfile::default().average_ev(), 0.0);
    }

    #[test]
    fn test_stratified_samples_stay_in_observed_range() {
        let profile = SizeProfile {
            size: 1,
            probabilities: vec![0.40, 0.45, 0.50, 0.55, 0.60],
            odds: vec![2.6, 2.4, 2.2, 2.0, 1.9],
            ..SizeProfile::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let samples = profile.stratified_samples(50, 1.0, 20, &mut rng);
        assert_eq!(samples.len(), 20);
        for s in &samples {
            assert!(s.probability >= 0.40 && s.probability < 0.60 + TOP_EDGE_PAD);
            assert!(s.odds >= 1.9 && s.odds < 2.6 + TOP_EDGE_PAD);
        }

        let again = profile.stratified_samples(50, 1.0, 20, &mut StdRng::seed_from_u64(0));
        assert_eq!(samples, again);
    }
}
