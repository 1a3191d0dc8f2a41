use sqlx::PgPool;
use storage::{
    dto::ranking::{RankingFilter, RankingPage},
    error::Result,
    models::{Discipline, RankingParameters},
    repository::snapshot::SnapshotRepository,
    services::weighted_ranking::compute_ranking,
};

/// Computes the ranking and returns the requested page with its anchor dates.
pub async fn get_ranking(
    pool: &PgPool,
    discipline: Discipline,
    filter: &RankingFilter,
    params: &RankingParameters,
) -> Result<RankingPage> {
    let snapshot = SnapshotRepository::new(pool)
        .load_discipline_snapshot(discipline, filter.as_of)
        .await?;

    let ranking = compute_ranking(&snapshot, discipline, filter.kind, params, filter.as_of)?;

    Ok(RankingPage::from_snapshot(ranking, &filter.pagination()))
}
