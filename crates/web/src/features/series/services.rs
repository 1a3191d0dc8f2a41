use sqlx::PgPool;
use storage::{
    dto::standings::{CacheRun, ClassStandings, ClubStandingRow, SeriesStandingsFilter},
    error::Result,
    repository::{snapshot::SnapshotRepository, standings_cache::StandingsCacheRepository},
    services::{
        club_standings::build_club_ledger,
        series_points::compute_series_standings,
        standings_cache::{club_standings_cached, rebuild_club_standings},
    },
};

pub async fn get_series_standings(
    pool: &PgPool,
    series_id: i64,
    filter: &SeriesStandingsFilter,
) -> Result<Vec<ClassStandings>> {
    let snapshot = SnapshotRepository::new(pool)
        .load_series_snapshot(series_id)
        .await?;
    compute_series_standings(&snapshot, series_id, filter)
}

/// Club standings as shown publicly: cache first, small clubs without their rider list.
pub async fn get_club_standings(
    pool: &PgPool,
    series_id: i64,
    min_public_group_size: u32,
) -> Result<Vec<ClubStandingRow>> {
    let cache = StandingsCacheRepository::new(pool);
    let standings = club_standings_cached(&cache, series_id, || async {
        let snapshot = SnapshotRepository::new(pool)
            .load_series_snapshot(series_id)
            .await?;
        build_club_ledger(&snapshot, series_id)
    })
    .await?;

    Ok(suppress_small_groups(standings, min_public_group_size))
}

pub async fn rebuild_club_standings_cache(pool: &PgPool, series_id: i64) -> Result<CacheRun> {
    let snapshot = SnapshotRepository::new(pool)
        .load_series_snapshot(series_id)
        .await?;
    let ledger = build_club_ledger(&snapshot, series_id)?;

    rebuild_club_standings(&StandingsCacheRepository::new(pool), series_id, &ledger).await
}

fn suppress_small_groups(
    mut standings: Vec<ClubStandingRow>,
    min_group_size: u32,
) -> Vec<ClubStandingRow> {
    for row in standings.iter_mut().filter(|r| r.rider_count < min_group_size) {
        row.ranked_riders.clear();
    }
    standings
}
