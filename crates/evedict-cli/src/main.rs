mod forecasts;
mod generate;

use clap::{Parser, Subcommand};
use evedict_core::NewsCategory;
use tracing_subscriber::EnvFilter;

use crate::forecasts::ForecastCommands;

#[derive(Debug, Parser)]
#[command(name = "evedict")]
#[command(about = "Forecast generation from news and prediction markets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate forecasts from the top headlines in a news category
    Generate {
        /// News category (business, entertainment, general, health, science, sports, technology)
        #[arg(long, default_value = "general")]
        category: NewsCategory,
        /// Run the pipeline but do not write forecasts to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate forecasts anchored to prediction-market events
    GeneratePoly {
        /// Run the pipeline but do not write forecasts to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Browse and approve stored forecasts
    Forecasts {
        #[command(subcommand)]
        command: ForecastCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("evedict: no command given; run with --help for usage");
        return Ok(());
    };

    let config = evedict_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = evedict_db::PoolConfig::from_app_config(&config);
    let pool = evedict_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Generate { category, dry_run } => {
            generate::run_generate(&pool, &config, category, dry_run).await?;
        }
        Commands::GeneratePoly { dry_run } => {
            generate::run_generate_poly(&pool, &config, dry_run).await?;
        }
        Commands::Forecasts { command } => forecasts::run(&pool, &config, command).await?,
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = evedict_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Ping => {
                evedict_db::ping(&pool).await?;
                println!("database ok");
            }
        },
    }

    Ok(())
}
