use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use wildfire::db::models::Period;
use wildfire::pipeline::RunOutcome;

mod config;

/// Wildfire: viral coefficient and trending-content scoring.
///
/// Turns raw share events into per-content viral coefficients, trending
/// scores, and reach estimates, recomputed on demand or on a cadence.
#[derive(Parser)]
#[command(name = "wildfire", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Record a single share event
    Record {
        /// Content identifier (e.g. a slug, id, or URL)
        content_id: String,

        /// Sharing channel (e.g. facebook, twitter, email)
        platform: String,

        /// Content type tag (default: post)
        #[arg(long, default_value = "post")]
        content_type: String,

        /// Acting user id, if known
        #[arg(long)]
        user: Option<String>,

        /// Clicks already observed on this share
        #[arg(long, default_value = "0")]
        clicks: u32,

        /// Event timestamp (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Import share events from a JSONL file (one event per line)
    Import {
        /// Path to the JSONL file
        file: PathBuf,
    },

    /// Recalculate coefficients and trending scores
    Recalc {
        /// Only recompute one period (1day, 7days, 30days); default: all
        #[arg(long)]
        period: Option<String>,

        /// Number of content items to score in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: u32,
    },

    /// Recalculate on a fixed cadence until interrupted
    Watch {
        /// Cadence between runs, e.g. 30s, 15m, 1h, 1d (default: 1h)
        #[arg(long, default_value = "1h")]
        every: String,

        /// Only recompute one period (1day, 7days, 30days); default: all
        #[arg(long)]
        period: Option<String>,

        /// Number of content items to score in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: u32,
    },

    /// Show top viral content by coefficient
    Top {
        /// Period bucket: 1day, 7days, or 30days
        #[arg(long, default_value = "7days")]
        period: String,

        /// Max items to show
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Items to skip (for paging)
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Show content currently trending
    Trending {
        /// Period bucket: 1day, 7days, or 30days
        #[arg(long, default_value = "7days")]
        period: String,

        /// Max items to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show content ranked by window-over-window growth
    Growth {
        /// Period bucket: 1day, 7days, or 30days
        #[arg(long, default_value = "7days")]
        period: String,

        /// Max items to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show per-platform performance rollups
    Platforms {
        /// Period bucket: 1day, 7days, or 30days
        #[arg(long, default_value = "7days")]
        period: String,
    },

    /// Inspect or change platform weights
    Weights {
        #[command(subcommand)]
        command: WeightsCommand,
    },

    /// Inspect or change engine settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate a full report (terminal + markdown file)
    Report {
        /// Period bucket: 1day, 7days, or 30days
        #[arg(long, default_value = "7days")]
        period: String,

        /// Where to write the markdown file
        #[arg(long, default_value = "output/wildfire-report.md")]
        output: String,
    },

    /// Show system status (DB stats, stored scores, last run)
    Status,
}

#[derive(Subcommand)]
enum WeightsCommand {
    /// Show the effective weight table
    List,

    /// Set a platform's weight
    Set {
        /// Platform name (stored lowercase)
        platform: String,

        /// Weight multiplier (must be positive, e.g. 0.8)
        weight: f64,
    },

    /// Remove a platform's custom weight
    Unset {
        /// Platform name
        platform: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective engine settings
    List,

    /// Set an engine setting (validated before writing)
    Set {
        /// Setting key, e.g. time_decay_factor
        key: String,

        /// New value
        value: String,
    },

    /// Remove a setting override, restoring the default
    Unset {
        /// Setting key
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wildfire=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Wildfire database...");
            let config = config::Config::load()?;
            let db = init_database(&config)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nWildfire is ready. Record a share with:");
            println!("  cargo run -- record <content-id> <platform>");
            println!("\nSet WILDFIRE_DB_PATH in .env to use a different database file.");
        }

        Commands::Record {
            content_id,
            platform,
            content_type,
            user,
            clicks,
            at,
        } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;

            let created_at = match at.as_deref() {
                Some(s) => Some(wildfire::db::models::parse_timestamp(s).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unrecognized timestamp '{s}'. Use RFC 3339, e.g. 2026-03-01T12:00:00Z"
                    )
                })?),
                None => None,
            };

            let event = wildfire::db::models::NewShareEvent {
                content_id,
                content_type,
                platform,
                user_id: user,
                click_count: clicks,
                created_at,
            };

            let id = wildfire::ingest::record(&db, event).await?;
            println!("Recorded share event #{id}");
            println!(
                "{}",
                "Scores update on the next `wildfire recalc` run.".dimmed()
            );
        }

        Commands::Import { file } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;

            println!("Importing share events from {}...", file.display());
            let summary = wildfire::ingest::import_jsonl(&db, &file).await?;

            println!("\n{}", "Import complete.".bold());
            println!("  Imported: {}", summary.imported);
            if summary.skipped > 0 {
                println!(
                    "  Skipped:  {} (malformed or invalid lines, see log)",
                    summary.skipped
                );
            }
        }

        Commands::Recalc {
            period,
            concurrency,
        } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period = parse_period_arg(period.as_deref())?;

            let params = wildfire::scoring::params::EngineParams::load(&db).await?;
            let weights =
                wildfire::scoring::weights::PlatformWeights::load(&db, params.min_platform_weight)
                    .await?;

            let cancel = cancel_flag();

            match wildfire::pipeline::recalc::run(
                &db,
                &params,
                &weights,
                period,
                concurrency as usize,
                &cancel,
                chrono::Utc::now(),
            )
            .await?
            {
                RunOutcome::Completed(summary) => {
                    println!("\n{}", "Recalculation complete.".bold());
                    println!("  Run id:    {}", summary.run_id);
                    println!("  Processed: {}", summary.items_processed);
                    if summary.items_failed > 0 {
                        println!("  Failed:    {} (skipped, see log)", summary.items_failed);
                    }
                }
                RunOutcome::Cancelled(summary) => {
                    println!("\nRecalculation cancelled at a batch boundary.");
                    println!(
                        "  {} items were fully scored and kept; re-run to finish the rest.",
                        summary.items_processed
                    );
                }
                RunOutcome::AlreadyRunning => {
                    anyhow::bail!(
                        "Another recalculation is already running. Re-trigger once it finishes."
                    );
                }
            }
        }

        Commands::Watch {
            every,
            period,
            concurrency,
        } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period = parse_period_arg(period.as_deref())?;
            let every = wildfire::pipeline::watch::parse_cadence(&every)?;

            let cancel = cancel_flag();
            wildfire::pipeline::watch::run(&db, every, period, concurrency as usize, &cancel)
                .await?;
        }

        Commands::Top {
            period,
            limit,
            offset,
        } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period: Period = period.parse()?;

            let params = wildfire::scoring::params::EngineParams::load(&db).await?;
            let rows =
                wildfire::reports::top_viral_content(&db, &params, period, limit, offset).await?;
            wildfire::output::terminal::display_top_viral(&rows, period.as_str());
        }

        Commands::Trending { period, limit } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period: Period = period.parse()?;

            let rows = wildfire::reports::trending_content(&db, period, limit).await?;
            wildfire::output::terminal::display_trending(&rows, period.as_str());
        }

        Commands::Growth { period, limit } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period: Period = period.parse()?;

            let rows = wildfire::reports::growth_leaders(&db, period, limit).await?;
            wildfire::output::terminal::display_growth_leaders(&rows, period.as_str());
        }

        Commands::Platforms { period } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period: Period = period.parse()?;

            let params = wildfire::scoring::params::EngineParams::load(&db).await?;
            let platforms = wildfire::reports::platform_performance(
                &db,
                &params,
                period,
                chrono::Utc::now(),
            )
            .await?;
            wildfire::output::terminal::display_platforms(&platforms, period.as_str());
        }

        Commands::Weights { command } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;

            match command {
                WeightsCommand::List => {
                    let params = wildfire::scoring::params::EngineParams::load(&db).await?;
                    let configured = db.get_platform_weights().await?;
                    let weights = wildfire::scoring::weights::PlatformWeights::from_rows(
                        &configured,
                        params.min_platform_weight,
                    );
                    wildfire::output::terminal::display_weights(&weights, &configured);
                }
                WeightsCommand::Set { platform, weight } => {
                    if !weight.is_finite() || weight <= 0.0 {
                        anyhow::bail!("Weight must be a positive number, got {weight}");
                    }
                    let platform = platform.trim().to_lowercase();
                    if platform.is_empty() {
                        anyhow::bail!("Platform name must not be empty");
                    }
                    db.set_platform_weight(&platform, weight).await?;
                    println!("Weight for {platform} set to {weight}");
                    println!("{}", "Takes effect on the next recalculation.".dimmed());
                }
                WeightsCommand::Unset { platform } => {
                    let platform = platform.trim().to_lowercase();
                    if db.delete_platform_weight(&platform).await? {
                        println!("Removed custom weight for {platform}.");
                        println!("{}", "Takes effect on the next recalculation.".dimmed());
                    } else {
                        println!("No custom weight configured for {platform}.");
                    }
                }
            }
        }

        Commands::Config { command } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;

            match command {
                ConfigCommand::List => {
                    let configured = db.get_settings().await?;
                    let params =
                        wildfire::scoring::params::EngineParams::from_settings(&configured);
                    wildfire::output::terminal::display_settings(&params, &configured);
                }
                ConfigCommand::Set { key, value } => {
                    wildfire::scoring::params::validate_setting(&key, &value)?;
                    db.set_setting(&key, &value).await?;
                    println!("Setting {key} = {value}");
                    println!("{}", "Takes effect on the next recalculation.".dimmed());
                }
                ConfigCommand::Unset { key } => {
                    if db.delete_setting(&key).await? {
                        println!("Removed override for {key}; the default applies again.");
                    } else {
                        println!("No override configured for {key}.");
                    }
                }
            }
        }

        Commands::Report { period, output } => {
            let config = config::Config::load()?;
            let db = open_database(&config)?;
            let period: Period = period.parse()?;

            let params = wildfire::scoring::params::EngineParams::load(&db).await?;

            let top = wildfire::reports::top_viral_content(&db, &params, period, 20, 0).await?;
            if top.is_empty() {
                println!("No content scored yet. Run `wildfire recalc` first.");
                return Ok(());
            }

            let trending = wildfire::reports::trending_content(&db, period, 20).await?;
            let growth = wildfire::reports::growth_leaders(&db, period, 10).await?;
            let platforms = wildfire::reports::platform_performance(
                &db,
                &params,
                period,
                chrono::Utc::now(),
            )
            .await?;
            let last_run = db.last_run().await?;

            // Display in terminal
            wildfire::output::terminal::display_top_viral(&top, period.as_str());
            wildfire::output::terminal::display_trending(&trending, period.as_str());
            wildfire::output::terminal::display_platforms(&platforms, period.as_str());

            // Also generate a markdown report file
            let report_path = wildfire::output::markdown::generate_report(
                period.as_str(),
                &top,
                &trending,
                &growth,
                &platforms,
                last_run.as_ref(),
                &output,
            )?;

            println!(
                "\n{}",
                format!("Markdown report saved to: {report_path}").bold()
            );
        }

        Commands::Status => {
            let config = config::Config::load()?;
            if !std::path::Path::new(&config.db_path).exists() {
                println!("Database: not initialized");
                println!("\nRun `wildfire init` to set up the database.");
                return Ok(());
            }
            let db = open_database(&config)?;
            wildfire::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Open the existing database, or fail with a pointer at `wildfire init`.
fn open_database(config: &config::Config) -> Result<Arc<dyn wildfire::db::Database>> {
    wildfire::db::open_sqlite(&config.db_path)
}

/// Initialize the database (create if needed).
fn init_database(config: &config::Config) -> Result<Arc<dyn wildfire::db::Database>> {
    wildfire::db::initialize_sqlite(&config.db_path)
}

/// Parse an optional period argument; None means all periods.
fn parse_period_arg(arg: Option<&str>) -> Result<Option<Period>> {
    match arg {
        Some(s) => Ok(Some(s.parse()?)),
        None => Ok(None),
    }
}

/// Shared cancellation flag, flipped by Ctrl-C.
///
/// Long recalculations poll it at batch boundaries, so interrupting never
/// leaves a half-written coefficient behind.
fn cancel_flag() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });
    cancel
}
