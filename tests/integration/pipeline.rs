//! End-to-end tests: source → planner → portfolios, staking and simulation.

use std::path::PathBuf;

use parlay::backtest::simulation::{MonteCarlo, MonteCarloConfig, SamplingMode};
use parlay::backtest::strata::SizeProfile;
use parlay::config::AppConfig;
use parlay::data::file::{load_matchdays, FileMatchSource};
use parlay::data::MatchSource;
use parlay::engine::combiner::{CountSpec, Portfolio};
use parlay::strategy::kelly::KellySizer;
use parlay::strategy::singles::stake_singles;
use parlay::strategy::ParlayPlanner;
use parlay::types::{Match, OutcomeLabel, ParlayError};
use rust_decimal::Decimal;

use crate::mock_source::MockSource;

fn planner() -> ParlayPlanner {
    let mut config = AppConfig::default();
    config.search.show_progress = false;
    ParlayPlanner::from_config(&config)
}

fn matchday_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/matchdays")
}

#[test]
fn test_best_single_is_highest_ev_outcome() {
    let source = MockSource::new("mock");
    let parlays = planner().parlays_from_source(&source, 1).unwrap();

    // Positive singles: Ajax, AZ (win and loss), Feyenoord, NEC, Fortuna.
    assert_eq!(parlays.len(), 6);
    let best = &parlays[0].parlay;
    assert_eq!(best.legs[0].fixture, "Ajax - PSV");
    assert_eq!(best.legs[0].label, OutcomeLabel::Win);
    assert!((best.expected_value - 0.0575).abs() < 1e-9);
    assert_eq!(source.load_count(), 1);
}

#[test]
fn test_doubles_use_distinct_fixtures() {
    let source = MockSource::new("mock");
    let parlays = planner().parlays_from_source(&source, 2).unwrap();
    assert_eq!(parlays.len(), 10);
    for p in &parlays {
        assert_ne!(p.parlay.legs[0].fixture, p.parlay.legs[1].fixture);
        assert!(p.parlay.expected_value > 0.0);
        assert!(p.stake_fraction > 0.0);
    }
}

#[test]
fn test_portfolio_search_end_to_end() {
    let source = MockSource::new("mock");
    let spec: CountSpec = "1:2,2:1".parse().unwrap();
    let portfolios = planner().portfolios_from_source(&source, &spec).unwrap();

    assert!(!portfolios.is_empty());
    assert!(portfolios.len() <= 10);
    assert!(portfolios.windows(2).all(|w| w[0].total_ev >= w[1].total_ev));
    for p in &portfolios {
        assert!(p.is_disjoint());
        assert_eq!(p.members.len(), 3);
        assert_eq!(p.fixtures().len(), 4);
    }
}

#[test]
fn test_infeasible_portfolio_is_empty_not_error() {
    // Six positive singles exist but two share a fixture and one match has
    // no value at all, so no six-single portfolio is disjoint.
    let source = MockSource::new("mock");
    let spec: CountSpec = "1:6".parse().unwrap();
    let portfolios: Vec<Portfolio> = planner().portfolios_from_source(&source, &spec).unwrap();
    assert!(portfolios.is_empty());
}

#[test]
fn test_oversized_spec_rejected() {
    let source = MockSource::new("mock");
    let spec: CountSpec = "1:3,2:2".parse().unwrap();
    let err = planner().portfolios_from_source(&source, &spec).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ParlayError>(),
        Some(&ParlayError::SlateTooLarge { required: 7, available: 6 })
    );
}

#[test]
fn test_insufficient_parlays_reported() {
    let source = MockSource::with_matches(
        "no-value",
        vec![
            Match::new("X", [0.38, 0.27, 0.35], [2.60, 3.60, 2.75]),
            Match::new("Y", [0.40, 0.30, 0.30], [2.00, 3.00, 3.00]),
        ],
    );
    let spec: CountSpec = "1:1".parse().unwrap();
    let err = planner().portfolios_from_source(&source, &spec).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ParlayError>(),
        Some(&ParlayError::InsufficientParlays { size: 1, requested: 1, available: 0 })
    );
}

#[test]
fn test_source_failure_propagates() {
    let source = MockSource::new("mock");
    source.set_error("feed unavailable");
    let err = planner().parlays_from_source(&source, 1).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("Failed to load matches from mock"));
    assert!(chain.contains("feed unavailable"));

    source.clear_error();
    assert!(planner().parlays_from_source(&source, 1).is_ok());
    assert_eq!(source.load_count(), 2);
}

#[test]
fn test_single_stakes_respect_risk_ceiling() {
    let matches = MockSource::new("mock").load_matches().unwrap();
    let sizer = KellySizer::new(AppConfig::default().kelly);
    let plan = stake_singles(&matches, &sizer).unwrap();

    // One bet per match with value; AZ's win/loss tie goes to the win.
    assert_eq!(plan.bets.len(), 5);
    assert!(plan.bets.iter().all(|b| b.stake > Decimal::ZERO));

    // Full Kelly over the slate exceeds the ceiling, so the multiplier drops.
    assert!(plan.multiplier < 1.0);
    assert!(plan.total_risk <= plan.max_risk);
    let ceiling = Decimal::new(9000, 2);
    let total: Decimal = plan.bets.iter().map(|b| b.stake).sum();
    assert!(total <= ceiling + Decimal::new(3, 2));

    let filled = plan.fill_budget();
    let total: Decimal = filled.bets.iter().map(|b| b.stake).sum();
    assert!((total - ceiling).abs() <= Decimal::new(5, 2));
}

#[test]
fn test_sample_matchday_file_loads() {
    let source = FileMatchSource::new(matchday_dir().join("matchday01.json"));
    let matches = source.load_matches().unwrap();
    let expected: Vec<String> = MockSource::default_matches()
        .into_iter()
        .map(|m| m.fixture)
        .collect();
    let fixtures: Vec<String> = matches.iter().map(|m| m.fixture.clone()).collect();
    assert_eq!(fixtures, expected);
    assert!(matches[0].kickoff.is_some());
}

#[test]
fn test_simulation_over_sample_season() {
    let matchdays = load_matchdays(&matchday_dir()).unwrap();
    assert_eq!(matchdays.len(), 2);

    let profile = SizeProfile::collect(&matchdays, 1, planner().enumerator(), 0.15).unwrap();
    assert_eq!(profile.len(), 2);

    let simulator = MonteCarlo::new(MonteCarloConfig {
        num_simulations: 10,
        num_seeds: 5,
        sampling: SamplingMode::Replay,
        ..MonteCarloConfig::default()
    });
    let first = simulator.run_profile(&profile).unwrap();
    let second = simulator.run_profile(&profile).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.equity_curve.len(), 11);
    assert!((0.0..=1.0).contains(&first.hit_rate));
    assert!(first.max_drawdown >= 0.0);
    assert!(first.average_ev > 0.0);
    assert!(first.average_kelly > 0.0);
}

#[test]
fn test_stratified_simulation_over_sample_season() {
    let matchdays = load_matchdays(&matchday_dir()).unwrap();
    let simulator = MonteCarlo::new(MonteCarloConfig {
        num_seeds: 5,
        ..MonteCarloConfig::default()
    });

    for size in 1..=2 {
        let profile = SizeProfile::collect(&matchdays, size, planner().enumerator(), 0.15).unwrap();
        let report = simulator.run_profile(&profile).unwrap();
        assert_eq!(report, simulator.run_profile(&profile).unwrap());
        assert!(report.bets_placed > 0);
        assert!((report.average_ev - profile.average_ev()).abs() < 1e-12);
    }
}
