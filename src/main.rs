use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use f1_race_predictor::engine::NormalizationPolicy;
use f1_race_predictor::factors;
use f1_race_predictor::ingest;
use f1_race_predictor::models::{
    DriverMetrics, RaceContext, RunStatus, SafetyCarLevel, TrackProfile, TyreStress, VariationFactor,
    Weather,
};
use f1_race_predictor::orchestrator::Orchestrator;
use f1_race_predictor::utils;

#[derive(Parser)]
#[command(name = "f1-race-predictor")]
#[command(about = "Monte Carlo Formula 1 race outcome predictor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Monte Carlo race prediction
    Predict {
        /// CSV file with the driver lineup; falls back to a built-in demo grid
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Number of simulation runs
        #[arg(long, default_value_t = 5000)]
        runs: u32,

        /// RNG seed; a random one is drawn if omitted
        #[arg(long)]
        seed: Option<u32>,

        #[arg(long, value_enum, default_value_t = TrackProfile::Balanced)]
        track_profile: TrackProfile,

        #[arg(long, value_enum, default_value_t = Weather::Dry)]
        weather: Weather,

        #[arg(long, value_enum, default_value_t = TyreStress::Medium)]
        tyre_stress: TyreStress,

        #[arg(long, value_enum, default_value_t = SafetyCarLevel::Medium)]
        safety_car: SafetyCarLevel,

        /// Extra per-run noise, 0.0-1.0
        #[arg(long, default_value_t = 0.3)]
        randomness: f64,

        /// Metric normalization policy
        #[arg(long, value_enum, default_value_t = PolicyArg::Linear)]
        policy: PolicyArg,

        /// Fetch news-derived variation factors from this URL before simulating
        #[arg(long)]
        factors_url: Option<String>,
    },

    /// Parse a CSV lineup and print the ingested rows without simulating
    IngestPreview {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Re-export a CSV lineup, normalizing columns and applying ingest defaults
    Export {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    Linear,
    Zscore,
}

impl From<PolicyArg> for NormalizationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Linear => NormalizationPolicy::Linear,
            PolicyArg::Zscore => NormalizationPolicy::ZScoreSigmoid,
        }
    }
}

const DEMO_DRIVERS: [(&str, &str, &str); 20] = [
    ("VER", "Max Verstappen", "Red Bull Racing"),
    ("PER", "Sergio Perez", "Red Bull Racing"),
    ("LEC", "Charles Leclerc", "Ferrari"),
    ("SAI", "Carlos Sainz", "Ferrari"),
    ("HAM", "Lewis Hamilton", "Mercedes"),
    ("RUS", "George Russell", "Mercedes"),
    ("NOR", "Lando Norris", "McLaren"),
    ("PIA", "Oscar Piastri", "McLaren"),
    ("ALO", "Fernando Alonso", "Aston Martin"),
    ("STR", "Lance Stroll", "Aston Martin"),
    ("GAS", "Pierre Gasly", "Alpine"),
    ("OCO", "Esteban Ocon", "Alpine"),
    ("ALB", "Alexander Albon", "Williams"),
    ("SAR", "Logan Sargeant", "Williams"),
    ("TSU", "Yuki Tsunoda", "RB"),
    ("LAW", "Liam Lawson", "RB"),
    ("MAG", "Kevin Magnussen", "Haas F1 Team"),
    ("HUL", "Nico Hulkenberg", "Haas F1 Team"),
    ("BOT", "Valtteri Bottas", "Sauber"),
    ("ZHO", "Guanyu Zhou", "Sauber"),
];

/// A static, deterministic demo grid, used when `predict` is run without a
/// `--csv` lineup. Grid order doubles as a rough pace ranking.
fn demo_lineup() -> Vec<DriverMetrics> {
    DEMO_DRIVERS
        .iter()
        .enumerate()
        .map(|(index, (code, name, team))| {
            let rank = index as f64;
            DriverMetrics {
                id: code.to_lowercase(),
                code: code.to_string(),
                name: name.to_string(),
                team: team.to_string(),
                grid_position: (index + 1) as u32,
                qualy_gap_ms: rank * 55.0,
                long_run_pace_delta: -0.4 + rank * 0.035,
                straightline_index: 95.0 - rank * 0.4,
                cornering_index: 96.0 - rank * 0.35,
                speed_trap_kph: 345.0 - rank * 0.6,
                pit_stop_median: 2.2 + rank * 0.015,
                dnf_rate: 0.02 + rank * 0.003,
                wet_skill: (0.95 - rank * 0.015).max(0.5),
                consistency: (0.96 - rank * 0.012).max(0.5),
                tyre_management: (0.93 - rank * 0.01).max(0.5),
                aggression: 0.5 + (rank % 4.0) * 0.05,
                experience: (0.9 - rank * 0.02).max(0.3),
                standings_points: None,
            }
        })
        .collect()
}

fn fetch_factors(url: &str) -> Result<Vec<VariationFactor>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;
    let result = factors::fetch_factors(&client, url)?;
    println!(
        "{}",
        format!(
            "Loaded {} variation factor(s) from {}",
            result.factors.len(),
            result.source.as_deref().unwrap_or(url)
        )
        .dimmed()
    );
    Ok(result.factors)
}

fn run_predict(
    csv: Option<PathBuf>,
    runs: u32,
    seed: Option<u32>,
    track_profile: TrackProfile,
    weather: Weather,
    tyre_stress: TyreStress,
    safety_car: SafetyCarLevel,
    randomness: f64,
    policy: PolicyArg,
    factors_url: Option<String>,
) -> Result<()> {
    let lineup = match csv {
        Some(path) => ingest::ingest_csv_file(&path)
            .with_context(|| format!("failed to ingest {}", path.display()))?,
        None => demo_lineup(),
    };

    let variation_factors = match factors_url {
        Some(url) => fetch_factors(&url)?,
        None => Vec::new(),
    };

    let ctx = RaceContext {
        track_profile,
        weather,
        tyre_stress,
        safety_car,
        runs,
        randomness,
        seed,
    };

    let orchestrator = Orchestrator::new();
    let run_id = orchestrator
        .submit(lineup, ctx, variation_factors, policy.into(), seed)?;

    println!("{}", format!("Running simulation #{run_id}...").blue());
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
            .unwrap()
            .progress_chars("#>-"),
    );
    loop {
        for event in orchestrator.drain_progress() {
            pb.set_position(event.percent as u64);
        }
        match orchestrator.status(run_id) {
            Some(RunStatus::Running) => {
                std::thread::sleep(Duration::from_millis(25));
            }
            Some(_) => break,
            None => anyhow::bail!("run {run_id} disappeared from the orchestrator"),
        }
    }
    pb.finish_and_clear();

    let run = orchestrator
        .snapshot(run_id)
        .context("run vanished after completion")?;

    match run.status {
        RunStatus::Completed => {
            let summary = run.result.context("completed run missing its summary")?;
            println!("{}", utils::format_summary_table(&summary));
            if let Some(winner) = summary.predicted_winner() {
                println!(
                    "{}",
                    format!(
                        "Predicted winner: {} ({:.1}% win probability)",
                        winner.name,
                        winner.win_probability * 100.0
                    )
                    .bold()
                    .green()
                );
            }
        }
        other => {
            anyhow::bail!(
                "simulation did not complete: {:?} ({})",
                other,
                run.message.unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    println!("{}", "F1 Race Predictor".bright_green().bold());
    println!("{}", "------------------------".bright_green());

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            csv,
            runs,
            seed,
            track_profile,
            weather,
            tyre_stress,
            safety_car,
            randomness,
            policy,
            factors_url,
        } => run_predict(
            csv,
            runs,
            seed,
            track_profile,
            weather,
            tyre_stress,
            safety_car,
            randomness,
            policy,
            factors_url,
        ),
        Commands::IngestPreview { csv } => {
            let drivers = ingest::ingest_csv_file(&csv)
                .with_context(|| format!("failed to ingest {}", csv.display()))?;
            for d in &drivers {
                println!("{:<4} {:<20} {:<15} grid {}", d.code, d.name, d.team, d.grid_position);
            }
            println!("{}", format!("{} driver(s) parsed", drivers.len()).dimmed());
            Ok(())
        }
        Commands::Export { csv, out } => {
            let drivers = ingest::ingest_csv_file(&csv)
                .with_context(|| format!("failed to ingest {}", csv.display()))?;
            let exported = ingest::export_csv(&drivers)?;
            std::fs::write(&out, exported)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("{}", format!("Wrote {} driver(s) to {}", drivers.len(), out.display()).green());
            Ok(())
        }
    }
}
