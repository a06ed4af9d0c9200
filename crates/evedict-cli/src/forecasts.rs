//! Read and approval commands for stored forecasts.

use clap::Subcommand;
use evedict_core::{AppConfig, ForecastCategory};
use evedict_db::ForecastFilter;
use evedict_forecast::{ForecastStore, PgForecastStore};
use uuid::Uuid;

/// Sub-commands available under `forecasts`.
#[derive(Debug, Subcommand)]
pub enum ForecastCommands {
    /// List stored forecasts, newest first
    List {
        /// Filter by category (Politics, Economy, Technology, Culture)
        #[arg(long)]
        category: Option<ForecastCategory>,
        /// Filter by approval state
        #[arg(long)]
        approved: Option<bool>,
        /// Maximum number of forecasts to show (1-100)
        #[arg(long, default_value = "20")]
        limit: i64,
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// Show one forecast with its related forecasts
    Show { id: Uuid },
    /// Mark a forecast as approved
    Approve { id: Uuid },
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: ForecastCommands,
) -> anyhow::Result<()> {
    match command {
        ForecastCommands::List {
            category,
            approved,
            limit,
            offset,
        } => {
            let filter = ForecastFilter {
                category,
                approved,
                limit: Some(limit),
                offset: Some(offset),
            };
            let rows = evedict_db::list_forecasts(pool, &filter).await?;
            if rows.is_empty() {
                println!("no forecasts found");
                return Ok(());
            }
            for row in rows {
                let state = if row.is_approved { "approved" } else { "pending" };
                println!(
                    "{}  {}  {:<10}  {:<8}  {}",
                    row.id,
                    row.captured_at.format("%Y-%m-%d %H:%M"),
                    row.category,
                    state,
                    row.headline
                );
            }
        }
        ForecastCommands::Show { id } => {
            let mut forecast = evedict_db::get_forecast(pool, id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("forecast {id} not found"))?;
            let store = PgForecastStore::new(pool.clone());
            forecast.related = store
                .related_forecasts(id, &forecast.tags, forecast.category, config.related_limit)
                .await?;
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }
        ForecastCommands::Approve { id } => {
            evedict_db::approve_forecast(pool, id)
                .await
                .map_err(|e| match e {
                    evedict_db::DbError::NotFound => anyhow::anyhow!("forecast {id} not found"),
                    other => other.into(),
                })?;
            println!("approved forecast {id}");
        }
    }
    Ok(())
}
