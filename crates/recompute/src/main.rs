use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use storage::{
    Database,
    dto::{ranking::SubjectKind, standings::SeriesStandingsFilter},
    models::{Discipline, RankingParameters},
    repository::{snapshot::SnapshotRepository, standings_cache::StandingsCacheRepository},
    services::{
        club_standings::{assemble_club_standings, build_club_ledger},
        series_points::compute_series_standings,
        standings_cache::rebuild_club_standings,
        weighted_ranking::compute_ranking,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;

use error::{RecomputeError, Result};

#[derive(Parser)]
#[command(name = "recompute")]
#[command(about = "Series standings and weighted ranking recomputation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Individual standings of one series, grouped by class
    Series {
        series_id: i64,

        #[arg(long)]
        class_id: Option<i64>,

        #[arg(long)]
        search: Option<String>,
    },
    /// Club standings of one series, computed fresh
    Clubs {
        series_id: i64,

        /// Also replace the cached ledger with the fresh one
        #[arg(long)]
        rebuild: bool,
    },
    /// Weighted ranking for a discipline
    Ranking {
        #[arg(value_parser = parse_discipline)]
        discipline: Discipline,

        /// Rank clubs instead of riders
        #[arg(long)]
        clubs: bool,

        /// Rank as of this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// JSON file overriding the default ranking parameters
        #[arg(long, env = "RANKING_PARAMETERS")]
        parameters: Option<PathBuf>,
    },
}

fn parse_discipline(value: &str) -> std::result::Result<Discipline, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("recompute={},storage={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Connecting to database...");
    let db = Database::new(&cli.database_url).await?;

    match cli.command {
        Commands::Series {
            series_id,
            class_id,
            search,
        } => {
            let filter = SeriesStandingsFilter { class_id, search };
            handle_series(&db, series_id, &filter).await?;
        }
        Commands::Clubs { series_id, rebuild } => {
            handle_clubs(&db, series_id, rebuild).await?;
        }
        Commands::Ranking {
            discipline,
            clubs,
            as_of,
            parameters,
        } => {
            let kind = if clubs {
                SubjectKind::Club
            } else {
                SubjectKind::Rider
            };
            let params = match parameters {
                Some(path) => load_parameters(&path).await?,
                None => RankingParameters::default(),
            };
            handle_ranking(&db, discipline, kind, as_of, &params).await?;
        }
    }

    Ok(())
}

async fn handle_series(db: &Database, series_id: i64, filter: &SeriesStandingsFilter) -> Result<()> {
    let snapshot = SnapshotRepository::new(db.pool())
        .load_series_snapshot(series_id)
        .await?;

    let standings = compute_series_standings(&snapshot, series_id, filter)?;
    tracing::info!(
        "✓ Series {}: {} classes, {} rows",
        series_id,
        standings.len(),
        standings.iter().map(|c| c.rows.len()).sum::<usize>()
    );

    print_json(&standings)
}

async fn handle_clubs(db: &Database, series_id: i64, rebuild: bool) -> Result<()> {
    let snapshot = SnapshotRepository::new(db.pool())
        .load_series_snapshot(series_id)
        .await?;

    let ledger = build_club_ledger(&snapshot, series_id)?;

    if rebuild {
        tracing::info!("Running database migrations");
        db.run_migrations().await?;

        let cache = StandingsCacheRepository::new(db.pool());
        let run = rebuild_club_standings(&cache, series_id, &ledger).await?;
        tracing::info!(
            "✓ Cache rebuilt for series {} at {} (run {})",
            series_id,
            run.computed_at,
            run.run_id
        );
    }

    print_json(&assemble_club_standings(&ledger))
}

async fn handle_ranking(
    db: &Database,
    discipline: Discipline,
    kind: SubjectKind,
    as_of: Option<NaiveDate>,
    params: &RankingParameters,
) -> Result<()> {
    let snapshot = SnapshotRepository::new(db.pool())
        .load_discipline_snapshot(discipline, as_of)
        .await?;

    let ranking = compute_ranking(&snapshot, discipline, kind, params, as_of)?;
    tracing::info!(
        "✓ {} ranking: {} entries (reference date {:?})",
        discipline,
        ranking.records.len(),
        ranking.reference_date
    );

    print_json(&ranking)
}

async fn load_parameters(path: &Path) -> Result<RankingParameters> {
    tracing::info!("Loading ranking parameters from: {}", path.display());

    let raw = tokio::fs::read_to_string(path).await?;
    let params: RankingParameters = serde_json::from_str(&raw)?;
    params.validate().map_err(RecomputeError::InvalidParameters)?;

    Ok(params)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ranking_command() {
        let cli = Cli::try_parse_from([
            "recompute",
            "--database-url",
            "postgres://localhost/results",
            "ranking",
            "dh",
            "--clubs",
            "--as-of",
            "2025-06-15",
        ])
        .unwrap();

        match cli.command {
            Commands::Ranking {
                discipline,
                clubs,
                as_of,
                ..
            } => {
                assert_eq!(discipline, Discipline::Downhill);
                assert!(clubs);
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2025, 6, 15));
            }
            _ => panic!("expected ranking command"),
        }
    }

    #[test]
    fn test_unknown_discipline_rejected() {
        let result = Cli::try_parse_from([
            "recompute",
            "--database-url",
            "postgres://localhost/results",
            "ranking",
            "xc",
        ]);
        assert!(result.is_err());
    }
}
