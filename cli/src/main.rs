mod commands;
mod config;
mod usda;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    MAX_HISTORY_DAYS, ProfileArgs, Service, UpdateArgs, cmd_day, cmd_delete, cmd_food, cmd_history, cmd_log, cmd_profile_set,
    cmd_profile_show, cmd_search, cmd_summary, cmd_update,
};
use crate::config::Config;
use crate::usda::UsdaClient;
use nutrilog_core::db::Database;
use nutrilog_core::models::{ActivityLevel, DietaryPreference, MealType, WeightGoal};

#[derive(Parser)]
#[command(
    name = "nutrilog",
    version,
    about = "Track what you eat against USDA FoodData Central"
)]
struct Cli {
    /// Use this database file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Search FoodData Central for a food
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show full details for a food
    Food {
        /// FoodData Central id
        fdc_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food entry
    Log {
        /// FoodData Central id, or a name to search for
        food: String,
        /// Serving size in the food's reference unit (e.g. "150" or "150g")
        serving: String,
        /// Meal: breakfast, lunch, dinner, snacks, supplements
        #[arg(short, long, default_value = "lunch")]
        meal: MealType,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food log entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a food log entry (serving size, meal, date, or food)
    Update {
        /// Entry ID to update
        entry_id: String,
        /// New serving size
        #[arg(short, long)]
        serving: Option<String>,
        /// New meal: breakfast, lunch, dinner, snacks, supplements
        #[arg(long)]
        meal: Option<MealType>,
        /// New date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// Replacement food: FoodData Central id, or a name to search for
        #[arg(long)]
        food: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's calories against the daily goal
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show entries for a day grouped by meal (defaults to today)
    Day {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show calories for the last N days
    History {
        /// Number of days to show
        #[arg(
            short,
            long,
            default_value = "7",
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HISTORY_DAYS))
        )]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Set profile fields (all fields are required the first time)
    Set {
        #[arg(long)]
        name: Option<String>,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
        /// sedentary, light, moderate, active, veryActive
        #[arg(long)]
        activity: Option<ActivityLevel>,
        /// omnivore, vegetarian, vegan, pescatarian
        #[arg(long)]
        diet: Option<DietaryPreference>,
        /// maintain, lose, gain
        #[arg(long)]
        goal: Option<WeightGoal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,nutrilog_core=error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        db = %config.db_path.display(),
        "resolved paths"
    );

    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let svc = Service::new(db);
    let report = svc.initialize()?;
    tracing::debug!(
        profile = report.profile_loaded,
        entries = report.food_logs_loaded,
        recovered = report.recovered.len(),
        "state loaded"
    );
    for e in &report.recovered {
        eprintln!("Warning: {e}; starting without it");
    }

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                name,
                age,
                weight,
                height,
                activity,
                diet,
                goal,
                json,
            } => cmd_profile_set(
                &svc,
                ProfileArgs {
                    name,
                    age,
                    weight,
                    height,
                    activity,
                    diet,
                    goal,
                },
                json,
            ),
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
        },
        Commands::Search { query, json } => {
            let usda = UsdaClient::new(config.usda)?;
            cmd_search(&usda, &query, json)
        }
        Commands::Food { fdc_id, json } => {
            let usda = UsdaClient::new(config.usda)?;
            cmd_food(&usda, &fdc_id, json)
        }
        Commands::Log {
            food,
            serving,
            meal,
            date,
            json,
        } => {
            let usda = UsdaClient::new(config.usda)?;
            cmd_log(&svc, &usda, &food, &serving, meal, date, json)
        }
        Commands::Delete { entry_id, json } => cmd_delete(&svc, &entry_id, json),
        Commands::Update {
            entry_id,
            serving,
            meal,
            date,
            food,
            json,
        } => {
            let usda = UsdaClient::new(config.usda)?;
            cmd_update(
                &svc,
                &usda,
                &entry_id,
                UpdateArgs {
                    serving,
                    meal,
                    date,
                    food,
                },
                json,
            )
        }
        Commands::Summary { json } => cmd_summary(&svc, json),
        Commands::Day { date, json } => cmd_day(&svc, date, json),
        Commands::History { days, json } => cmd_history(&svc, days, json),
    }
}
