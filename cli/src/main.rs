mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_achievements, cmd_day, cmd_delete, cmd_export, cmd_import, cmd_log, cmd_notes,
    cmd_profile_set, cmd_profile_show, cmd_reset, cmd_streak, cmd_trend, cmd_water, cmd_weight,
};
use crate::config::Config;
use nutrilog_core::{Backend, Tracker};

#[derive(Parser)]
#[command(
    name = "nutrilog",
    version,
    about = "A local-first diet, water and weight log",
    long_about = None
)]
struct Cli {
    /// Storage backend: sqlite or json
    #[arg(long, global = true, default_value = "sqlite")]
    backend: Backend,

    /// Directory holding the data files (default: platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up or show your profile and daily targets
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Log a food entry
    Log {
        /// Food name
        name: String,
        /// Calories for the serving
        calories: i64,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Protein in grams
        #[arg(short, long, default_value = "0")]
        protein: f64,
        /// Carbs in grams
        #[arg(short, long, default_value = "0")]
        carbs: f64,
        /// Fat in grams
        #[arg(short, long, default_value = "0")]
        fat: f64,
        /// Serving size
        #[arg(long, default_value = "1")]
        serving: f64,
        /// Serving unit
        #[arg(long, default_value = "serving")]
        unit: String,
        /// Replace the entry with this ID instead of adding a new one
        #[arg(long)]
        id: Option<i64>,
        /// Date to log for (YYYY-MM-DD, today, yesterday; default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one day's entries, totals, water and weight (defaults to today)
    Day {
        /// Date to show (YYYY-MM-DD, today, yesterday)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the number of glasses of water drunk on a day
    Water {
        /// Glasses of water (replaces the stored count)
        glasses: i64,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record, show or clear body weight (lbs) for a day
    Weight {
        /// Weight in pounds; omit to show the stored value
        value: Option<f64>,
        /// Remove the stored weight for the day
        #[arg(long, conflicts_with = "value")]
        clear: bool,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set notes for a day; omit the text to clear them
    Notes {
        /// Note text
        text: Option<String>,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals for the last N days, newest first
    Trend {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check in for today and show the logging streak
    Streak {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show achievement progress
    Achievements {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all data as JSON, or food entries as CSV
    Export {
        /// Write food entries as CSV instead of the full JSON export
        #[arg(long)]
        csv: bool,
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Replace all data with a JSON export
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Erase all stored data
    Reset {
        /// Confirm erasing everything
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Save your profile and compute daily targets
    Set {
        /// Your name
        #[arg(long)]
        name: String,
        /// Age in years
        #[arg(long)]
        age: f64,
        /// Gender (stored only)
        #[arg(long, default_value = "unspecified")]
        gender: String,
        /// Height in centimetres
        #[arg(long)]
        height: f64,
        /// Weight in pounds
        #[arg(long)]
        weight: f64,
        /// Activity level: sedentary, light, moderate, active, very_active
        #[arg(long, default_value = "moderate")]
        activity: String,
        /// Goal: lose_weight, maintain, gain_muscle
        #[arg(long, default_value = "maintain")]
        goal: String,
        /// Daily water target in glasses (default: 8)
        #[arg(long)]
        water_target: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the saved profile and targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir.as_deref())?;
    tracing::debug!(
        "Using {} backend in {}",
        cli.backend,
        config.data_dir.display()
    );
    let tracker = Tracker::open(cli.backend, config.store_path(cli.backend));

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                name,
                age,
                gender,
                height,
                weight,
                activity,
                goal,
                water_target,
                json,
            } => cmd_profile_set(
                &tracker,
                &name,
                age,
                &gender,
                height,
                weight,
                &activity,
                &goal,
                water_target,
                json,
            ),
            ProfileCommands::Show { json } => cmd_profile_show(&tracker, json),
        },
        Commands::Log {
            name,
            calories,
            meal,
            protein,
            carbs,
            fat,
            serving,
            unit,
            id,
            date,
            json,
        } => cmd_log(
            &tracker,
            &name,
            calories,
            &meal,
            [protein, carbs, fat],
            serving,
            &unit,
            id,
            date,
            json,
        ),
        Commands::Delete { entry_id, json } => cmd_delete(&tracker, entry_id, json),
        Commands::Day { date, json } => cmd_day(&tracker, date, json),
        Commands::Water {
            glasses,
            date,
            json,
        } => cmd_water(&tracker, glasses, date, json),
        Commands::Weight {
            value,
            clear,
            date,
            json,
        } => cmd_weight(&tracker, value, clear, date, json),
        Commands::Notes { text, date, json } => cmd_notes(&tracker, text.as_deref(), date, json),
        Commands::Trend { days, json } => cmd_trend(&tracker, days, json),
        Commands::Streak { json } => cmd_streak(&tracker, json),
        Commands::Achievements { json } => cmd_achievements(&tracker, json),
        Commands::Export { csv, output } => cmd_export(&tracker, csv, output.as_deref()),
        Commands::Import { file, json } => cmd_import(&tracker, &file, json),
        Commands::Reset { yes } => cmd_reset(&tracker, yes),
    }
}
