//! season-sync: incremental ESPN schedule acquisition.
//!
//! Single-binary Tokio application that:
//! 1. Plans the days or weeks that make up a league season
//! 2. Fetches every unit concurrently through a cached, retried HTTP client
//! 3. Groups games into weeks and merges with any earlier partial season
//! 4. Caches finished seasons and writes CSV or JSON output

mod config;
mod sink;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use common::{Error, Season, SyncConfig};
use season::{end_year, League, SeasonAssembler};
use sink::{read_snapshot, CsvSink, JsonSink, SeasonSink};

/// ESPN season schedule sync
#[derive(Parser)]
#[command(name = "season-sync", about = "Fetch and cache sports season schedules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble every season of a league and write them as CSV.
    Update {
        /// ncaambb, ncaawbb, ncaafb or nfl.
        league: League,

        /// CSV path (default: <output_dir>/<league>.csv).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Assemble one season and write a JSON snapshot.
    Season {
        league: League,
        year: i32,

        /// Snapshot from an earlier run to resume from.
        #[arg(long)]
        resume_from: Option<PathBuf>,

        /// Snapshot path (default: <output_dir>/<league>-<year>.json).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn report_trouble(seasons: &[Season]) {
    for season in seasons.iter().filter(|s| !s.trouble_params.is_empty()) {
        warn!(
            "Season {} still has {} trouble units:",
            season.year,
            season.trouble_params.len()
        );
        for unit in &season.trouble_params {
            warn!("  {}", unit);
        }
    }
}

async fn run_update(cfg: &SyncConfig, league: League, output: Option<PathBuf>) -> Result<(), Error> {
    let assembler = SeasonAssembler::from_config(league, cfg)?;
    let last = end_year(assembler.league().season_end, Utc::now().date_naive());
    let first = assembler.league().first_year;
    info!("Updating {} seasons {}..={}", league, first, last);

    let seasons = assembler.assemble_many(first..=last).await?;
    let path = output.unwrap_or_else(|| cfg.output_dir.join(format!("{}.csv", league)));
    CsvSink::new(&path).write_seasons(&seasons)?;

    let games: usize = seasons.iter().map(Season::game_count).sum();
    info!("Wrote {} games from {} seasons to {}", games, seasons.len(), path.display());
    report_trouble(&seasons);
    Ok(())
}

async fn run_season(
    cfg: &SyncConfig,
    league: League,
    year: i32,
    resume_from: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let assembler = SeasonAssembler::from_config(league, cfg)?;
    let season_so_far = match resume_from {
        Some(path) => {
            let season = read_snapshot(&path, year)?;
            info!(
                "Resuming {} {} from {} ({} games)",
                league,
                year,
                path.display(),
                season.game_count()
            );
            Some(season)
        }
        None => None,
    };

    let season = assembler.assemble(year, season_so_far).await?;
    let path = output.unwrap_or_else(|| cfg.output_dir.join(format!("{}-{}.json", league, year)));
    let seasons = [season];
    JsonSink::new(&path).write_seasons(&seasons)?;

    info!("Wrote {} {} snapshot to {}", league, year, path.display());
    report_trouble(&seasons);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "season_sync=info,season=info,espn_client=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    info!("Cache directory: {}", cfg.cache_dir.display());

    let result = match cli.command {
        Command::Update { league, output } => run_update(&cfg, league, output).await,
        Command::Season {
            league,
            year,
            resume_from,
            output,
        } => run_season(&cfg, league, year, resume_from, output).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
