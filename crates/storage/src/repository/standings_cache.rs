use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::standings::{CacheRun, ClubContribution};
use crate::error::{Result, StorageError};
use crate::services::standings_cache::StandingsCache;

// Postgres caps a statement at 65535 bind parameters; 12 per row.
const INSERT_BATCH_SIZE: usize = 1000;

#[derive(FromRow)]
struct ContributionRow {
    series_id: i64,
    event_id: i64,
    club_id: i64,
    club_name: String,
    rider_id: i64,
    rider_name: String,
    class_id: i64,
    class_name: String,
    original_points: Decimal,
    club_rank: i32,
    contribution: Decimal,
    is_scoring: bool,
}

impl From<ContributionRow> for ClubContribution {
    fn from(row: ContributionRow) -> Self {
        Self {
            series_id: row.series_id,
            event_id: row.event_id,
            club_id: row.club_id,
            club_name: row.club_name,
            rider_id: row.rider_id,
            rider_name: row.rider_name,
            class_id: row.class_id,
            class_name: row.class_name,
            // NUMERIC round-trips trailing zeros; strip them so cached output matches fresh output
            original_points: row.original_points.normalize(),
            club_rank: row.club_rank.max(0) as u32,
            contribution: row.contribution.normalize(),
            is_scoring: row.is_scoring,
        }
    }
}

#[derive(FromRow)]
struct RunRow {
    series_id: i64,
    run_id: Uuid,
    computed_at: NaiveDateTime,
    contribution_count: i64,
}

impl From<RunRow> for CacheRun {
    fn from(row: RunRow) -> Self {
        Self {
            series_id: row.series_id,
            run_id: row.run_id,
            computed_at: row.computed_at,
            contribution_count: row.contribution_count,
        }
    }
}

/// Postgres-backed club standings cache.
pub struct StandingsCacheRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StandingsCacheRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StandingsCache for StandingsCacheRepository<'_> {
    async fn try_load(&self, series_id: i64) -> Result<Option<Vec<ClubContribution>>> {
        let rows = sqlx::query_as::<_, ContributionRow>(
            r#"
            SELECT series_id, event_id, club_id, club_name, rider_id, rider_name,
                   class_id, class_name, original_points, club_rank, contribution, is_scoring
            FROM club_standings_cache
            WHERE series_id = $1
            ORDER BY event_id, club_id, class_id, club_rank
            "#,
        )
        .bind(series_id)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(rows.into_iter().map(ClubContribution::from).collect()))
    }

    async fn replace(&self, series_id: i64, ledger: &[ClubContribution]) -> Result<CacheRun> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM club_standings_cache WHERE series_id = $1")
            .bind(series_id)
            .execute(&mut *tx)
            .await?;

        for chunk in ledger.chunks(INSERT_BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO club_standings_cache (series_id, event_id, club_id, club_name, \
                 rider_id, rider_name, class_id, class_name, original_points, club_rank, \
                 contribution, is_scoring) ",
            );

            builder.push_values(chunk, |mut b, c| {
                b.push_bind(c.series_id)
                    .push_bind(c.event_id)
                    .push_bind(c.club_id)
                    .push_bind(&c.club_name)
                    .push_bind(c.rider_id)
                    .push_bind(&c.rider_name)
                    .push_bind(c.class_id)
                    .push_bind(&c.class_name)
                    .push_bind(c.original_points)
                    .push_bind(c.club_rank as i32)
                    .push_bind(c.contribution)
                    .push_bind(c.is_scoring);
            });

            builder.build().execute(&mut *tx).await.map_err(|e| {
                let err = StorageError::from(e);
                if err.is_unique_violation() {
                    StorageError::ConstraintViolation(format!(
                        "duplicate contribution in ledger for series {}",
                        series_id
                    ))
                } else {
                    err
                }
            })?;
        }

        let run = sqlx::query_as::<_, RunRow>(
            r#"
            INSERT INTO club_standings_cache_runs (series_id, run_id, contribution_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (series_id)
            DO UPDATE SET
                run_id = EXCLUDED.run_id,
                contribution_count = EXCLUDED.contribution_count,
                computed_at = CURRENT_TIMESTAMP
            RETURNING series_id, run_id, computed_at, contribution_count
            "#,
        )
        .bind(series_id)
        .bind(Uuid::new_v4())
        .bind(ledger.len() as i64)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(run.into())
    }
}
