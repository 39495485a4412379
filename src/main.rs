//! PARLAY: expected-value search over football accumulator bets
//!
//! Entry point. Loads configuration, initialises structured logging and
//! dispatches the requested subcommand against one or more matchday files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use parlay::backtest::simulation::{MonteCarlo, SamplingMode, SimulationReport};
use parlay::backtest::strata::SizeProfile;
use parlay::config::AppConfig;
use parlay::data::file::{load_matchdays, FileMatchSource};
use parlay::data::MatchSource;
use parlay::engine::combiner::{CountSpec, Portfolio};
use parlay::engine::enumerator::SizedParlay;
use parlay::strategy::kelly::KellySizer;
use parlay::strategy::singles::{stake_singles, StakePlan};
use parlay::strategy::ParlayPlanner;

const DEFAULT_CONFIG: &str = "config.toml";
const DEFAULT_MATCHDAY_DIR: &str = "data/matchdays";

#[derive(Parser)]
#[command(name = "parlay")]
#[command(author, version, about = "Parlay EV search and Kelly staking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG, env = "PARLAY_CONFIG")]
    config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the best parlays of one size for a matchday
    Parlays {
        /// Matchday JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Number of legs per parlay
        #[arg(short, long, default_value = "2")]
        size: usize,
    },

    /// Search fixture-disjoint portfolios of parlays
    Portfolio {
        /// Matchday JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Parlays per size, e.g. "1:6,2:2"
        #[arg(long)]
        spec: CountSpec,
    },

    /// Size single bets on the best outcome of every match
    Stake {
        /// Matchday JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Override the configured bankroll
        #[arg(long)]
        bankroll: Option<f64>,

        /// Rescale stakes to spend the whole risk ceiling
        #[arg(long)]
        fill_budget: bool,
    },

    /// Monte Carlo simulation of betting top parlays, per parlay size
    Simulate {
        /// Directory of matchday JSON files
        #[arg(short, long, default_value = DEFAULT_MATCHDAY_DIR)]
        dir: PathBuf,

        /// Largest parlay size to simulate (sizes 1..=N)
        #[arg(long, default_value = "3")]
        max_size: usize,

        /// Override the configured number of seeds
        #[arg(long)]
        seeds: Option<u64>,

        /// Replay the observed top parlays instead of stratified draws
        #[arg(long)]
        replay: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = AppConfig::load_or_default(&cli.config)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Parlays { file, size } => {
            let planner = ParlayPlanner::from_config(&cfg);
            let source = FileMatchSource::new(file);
            let parlays = planner.parlays_from_source(&source, size)?;
            if cli.json {
                print_json(&parlays)?;
            } else {
                print_parlays(&parlays);
            }
        }
        Commands::Portfolio { file, spec } => {
            let planner = ParlayPlanner::from_config(&cfg);
            let source = FileMatchSource::new(file);
            let portfolios = planner.portfolios_from_source(&source, &spec)?;
            if cli.json {
                print_json(&portfolios)?;
            } else {
                print_portfolios(&spec, &portfolios);
            }
        }
        Commands::Stake {
            file,
            bankroll,
            fill_budget,
        } => {
            let mut kelly = cfg.kelly.clone();
            if let Some(b) = bankroll {
                kelly.bankroll = b;
            }
            let source = FileMatchSource::new(file);
            let matches = source.load_matches()?;
            let mut report = stake_singles(&matches, &KellySizer::new(kelly))?;
            if fill_budget {
                report = report.fill_budget();
            }
            if cli.json {
                print_json(&report)?;
            } else {
                print_stakes(&report);
            }
        }
        Commands::Simulate {
            dir,
            max_size,
            seeds,
            replay,
        } => {
            let mut sim_config = cfg.simulation.clone();
            if let Some(s) = seeds {
                sim_config.num_seeds = s;
            }
            if replay {
                sim_config.sampling = SamplingMode::Replay;
            }
            let planner = ParlayPlanner::from_config(&cfg);
            let matchdays = load_matchdays(&dir)?;
            let simulator = MonteCarlo::new(sim_config);

            let mut results = Vec::new();
            for size in 1..=max_size {
                let profile = SizeProfile::collect(
                    &matchdays,
                    size,
                    planner.enumerator(),
                    simulator.config().kelly_multiplier,
                )?;
                let report = simulator
                    .run_profile(&profile)
                    .with_context(|| format!("Simulation failed for parlay size {size}"))?;
                results.push(SizeResult { size, report });
            }
            if cli.json {
                print_json(&results)?;
            } else {
                print_simulation(&results);
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SizeResult {
    size: usize,
    #[serde(flatten)]
    report: SimulationReport,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn print_parlays(parlays: &[SizedParlay]) {
    if parlays.is_empty() {
        println!("No parlay with positive expected value.");
        return;
    }
    for (rank, p) in parlays.iter().enumerate() {
        println!(
            "#{:<3} EV {:>8.4}  p {:>7.4}  odds {:>8.2}  kelly {:>6.2}%",
            rank + 1,
            p.parlay.expected_value,
            p.parlay.probability,
            p.parlay.odds,
            p.stake_fraction * 100.0
        );
        for leg in &p.parlay.legs {
            println!("       {leg}");
        }
    }
}

fn print_portfolios(spec: &CountSpec, portfolios: &[Portfolio]) {
    if portfolios.is_empty() {
        println!("No disjoint portfolio satisfies {spec}.");
        return;
    }
    for (rank, portfolio) in portfolios.iter().enumerate() {
        println!("#{} total EV {:.4}", rank + 1, portfolio.total_ev);
        for m in &portfolio.members {
            let legs: Vec<String> = m.parlay.legs.iter().map(ToString::to_string).collect();
            println!(
                "    [{}] EV {:.4}  odds {:.2}  stake {:.2}%  {}",
                m.parlay.size(),
                m.parlay.expected_value,
                m.parlay.odds,
                m.stake_fraction * 100.0,
                legs.join(" + ")
            );
        }
    }
}

fn print_stakes(report: &StakePlan) {
    println!(
        "Bankroll {:.2}  risk ceiling {:.2}  multiplier {:.2}  total risk {:.2}",
        report.bankroll, report.max_risk, report.multiplier, report.total_risk
    );
    for b in &report.bets {
        println!(
            "  {:<32} {:<5} p {:.3}  odds {:>5.2}  EV {:>7.4}  stake {}",
            b.bet.fixture, b.bet.label, b.bet.probability, b.bet.odds, b.bet.expected_value, b.stake
        );
    }
}

fn print_simulation(results: &[SizeResult]) {
    println!(
        "{:>4} {:>8} {:>8} {:>10} {:>8} {:>10} {:>8} {:>8} {:>8}",
        "size", "avg ev", "kelly", "profit", "hit", "avg", "std", "sharpe", "max dd"
    );
    for r in results {
        println!(
            "{:>4} {:>8.4} {:>7.2}% {:>10.2} {:>7.1}% {:>10.3} {:>8.3} {:>8.3} {:>7.1}%",
            r.size,
            r.report.average_ev,
            r.report.average_kelly * 100.0,
            r.report.total_profit,
            r.report.hit_rate * 100.0,
            r.report.average_profit,
            r.report.std_dev,
            r.report.sharpe_ratio,
            r.report.max_drawdown * 100.0
        );
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parlay=info"));

    let json_logging = std::env::var("PARLAY_LOG_JSON").is_ok();

    // Logs go to stderr so JSON results on stdout stay parseable.
    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
