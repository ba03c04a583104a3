use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use coachrs::config::AppConfig;
use coachrs::engine::{EngineInput, RecommendationEngine};
use coachrs::error::{CoachError, SnapshotError};
use coachrs::logging::{init_logging, LogConfig, LogLevel};
use coachrs::models::{DailyCheckin, Exercise, UserFitnessProfile, Workout};
use coachrs::{coverage, recovery};

/// CoachRS - Daily Workout Recommendation CLI
///
/// A Rust-based engine that recommends a daily workout from check-in data,
/// muscle-level recovery modeling, training-history coverage, and goals.
#[derive(Parser)]
#[command(name = "coachrs")]
#[command(author = "CoachRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Daily Workout Recommendation CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate today's workout recommendation from a snapshot file
    Recommend {
        /// JSON snapshot of check-in, workouts, catalog, and profile
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Emit the full recommendation as JSON
        #[arg(short, long)]
        json: bool,

        /// Override "now" (RFC 3339) for reproducible runs
        #[arg(short, long)]
        now: Option<String>,
    },

    /// Display muscle coverage for a snapshot
    Coverage {
        /// JSON snapshot of check-in, workouts, catalog, and profile
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Override "now" (RFC 3339) for reproducible runs
        #[arg(short, long)]
        now: Option<String>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,
    },
}

/// Everything the engine needs, supplied as one JSON document
#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    checkin: Option<DailyCheckin>,
    #[serde(default)]
    workouts: Vec<Workout>,
    catalog: Vec<Exercise>,
    #[serde(default)]
    profile: Option<UserFitnessProfile>,
    /// Sunday = 0; derived from `now` when absent
    #[serde(default)]
    day_of_week: Option<u8>,
}

fn load_snapshot(path: &PathBuf) -> Result<Snapshot> {
    if !path.exists() {
        return Err(CoachError::Snapshot(SnapshotError::FileNotFound {
            path: path.clone(),
        })
        .into());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// Structural checks done once at the boundary; the engine assumes them
fn validate_snapshot(snapshot: &Snapshot) -> Result<()> {
    if let Some(soreness) = snapshot.checkin.as_ref().and_then(|c| c.soreness.as_ref()) {
        for (muscle, level) in &soreness.0 {
            if *level > 5 {
                return Err(CoachError::Validation(format!(
                    "soreness for {} is {}, must be 0-5",
                    muscle, level
                ))
                .into());
            }
        }
    }

    for exercise in &snapshot.catalog {
        for target in &exercise.muscle_targets {
            if !(0.0..=1.0).contains(&target.weight) {
                return Err(CoachError::Validation(format!(
                    "muscle target weight {} on {} is outside [0, 1]",
                    target.weight, exercise.id
                ))
                .into());
            }
        }
    }

    if let Some(profile) = &snapshot.profile {
        for problem in &profile.problems {
            if !(1..=5).contains(&problem.priority) {
                return Err(CoachError::Validation(format!(
                    "problem '{}' priority {} is outside 1-5",
                    problem.name, problem.priority
                ))
                .into());
            }
        }
    }

    Ok(())
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now timestamp: {}", raw))?;
            Ok(parsed.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}

#[derive(Tabled)]
struct ExerciseRow {
    #[tabled(rename = "Exercise")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Sets x Reps")]
    volume: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Why")]
    reasoning: String,
}

#[derive(Tabled)]
struct CoverageRow {
    #[tabled(rename = "Muscle")]
    muscle: String,
    #[tabled(rename = "7d Stimulus")]
    stimulus_7d: String,
    #[tabled(rename = "30d Stimulus")]
    stimulus_30d: String,
    #[tabled(rename = "Undertrained")]
    undertrained: String,
    #[tabled(rename = "Priority")]
    priority: String,
}

/// Explicit `--config` paths must exist; the default location falls back to
/// defaults when absent
fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn run_recommend(
    config_path: Option<&PathBuf>,
    snapshot_path: &PathBuf,
    json: bool,
    now: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshot = load_snapshot(snapshot_path)?;
    let now = parse_now(now)?;
    let day_of_week = snapshot
        .day_of_week
        .unwrap_or_else(|| now.weekday().num_days_from_sunday() as u8);

    let engine = RecommendationEngine::with_settings(
        config.engine.problem_weight,
        config.engine.preference_weight,
        config.engine.default_session_minutes,
    );
    let output = engine.recommend(&EngineInput {
        checkin: snapshot.checkin.as_ref(),
        workouts: &snapshot.workouts,
        catalog: &snapshot.catalog,
        profile: snapshot.profile.as_ref(),
        day_of_week,
        now,
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Today's workout:".bold(),
        output.workout_type.to_string().to_uppercase().green().bold()
    );
    println!(
        "  Duration: {} min   Confidence: {:.0}%",
        output.estimated_duration,
        output.confidence * 100.0
    );
    println!();

    for line in &output.reasoning {
        println!("  {} {}", "-".dimmed(), line);
    }
    println!();

    if output.exercises.is_empty() {
        println!("{}", "No exercises today. Recover well.".cyan());
        return Ok(());
    }

    let rows: Vec<ExerciseRow> = output
        .exercises
        .iter()
        .map(|e| ExerciseRow {
            name: e.exercise_name.clone(),
            category: e.category.to_string(),
            volume: format!("{} x {}", e.suggested_sets, e.suggested_reps),
            score: format!("{:.2}", e.priority),
            reasoning: e.reasoning.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));

    Ok(())
}

fn run_coverage(snapshot_path: &PathBuf, now: Option<&str>) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let now = parse_now(now)?;

    // Coverage needs only the history reduction, not the full pipeline
    let catalog_index = recovery::index_catalog(&snapshot.catalog);
    let all_muscles = recovery::catalog_muscles(&snapshot.catalog);
    let last_stimulus = recovery::last_stimulus_per_muscle(&snapshot.workouts, &catalog_index);
    let muscle_coverage = coverage::analyze_coverage(
        &snapshot.workouts,
        &all_muscles,
        &catalog_index,
        &last_stimulus,
        now,
    );

    println!("{}", "Muscle coverage (highest priority first)".bold());
    let rows: Vec<CoverageRow> = muscle_coverage
        .iter()
        .take(10)
        .map(|c| CoverageRow {
            muscle: c.muscle_name.clone(),
            stimulus_7d: format!("{:.0}", c.stimulus_7d),
            stimulus_30d: format!("{:.0}", c.stimulus_30d),
            undertrained: if c.is_undertrained {
                "yes".red().to_string()
            } else {
                "no".to_string()
            },
            priority: format!("{:.2}", c.priority),
        })
        .collect();
    println!("{}", Table::new(rows));

    Ok(())
}

fn run_config(config_path: Option<&PathBuf>, list: bool) -> Result<()> {
    let config = load_config(config_path)?;

    if list {
        println!("{}", "Configuration".bold());
        println!("  data_dir: {}", config.settings.data_dir.display());
        println!("  engine.problem_weight: {}", config.engine.problem_weight);
        println!(
            "  engine.preference_weight: {}",
            config.engine.preference_weight
        );
        println!(
            "  engine.default_session_minutes: {}",
            config.engine.default_session_minutes
        );
        println!(
            "  default_user: {}",
            config.default_user_id.as_deref().unwrap_or("(none)")
        );
        println!("  users: {}", config.users.len());
    } else {
        println!(
            "Config file: {}",
            AppConfig::default_config_path().display()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    init_logging(&LogConfig {
        level: log_level,
        ..LogConfig::default()
    })?;

    match &cli.command {
        Commands::Recommend {
            snapshot,
            json,
            now,
        } => run_recommend(cli.config.as_ref(), snapshot, *json, now.as_deref()),
        Commands::Coverage { snapshot, now } => run_coverage(snapshot, now.as_deref()),
        Commands::Config { list } => run_config(cli.config.as_ref(), *list),
    }
}
