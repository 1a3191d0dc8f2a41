use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::error::{Result, StorageError};
use crate::models::{
    Class, Club, Discipline, Event, RaceResult, RankingType, ResultSnapshot, ResultStatus, Rider,
    RiderClubSeason, Series, SeriesEventLink, SeriesResult,
};

#[derive(FromRow)]
struct ClassRow {
    id: i64,
    name: String,
    display_name: Option<String>,
    sort_order: i32,
    awards_points: Option<bool>,
    series_eligible: Option<bool>,
    ranking_type: Option<String>,
}

impl From<ClassRow> for Class {
    fn from(row: ClassRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            sort_order: row.sort_order,
            awards_points: row.awards_points,
            series_eligible: row.series_eligible,
            ranking_type: row.ranking_type.as_deref().and_then(RankingType::from_column),
        }
    }
}

#[derive(FromRow)]
struct ResultRow {
    id: i64,
    rider_id: i64,
    event_id: i64,
    class_id: i64,
    club_id: Option<i64>,
    finish_time: Option<String>,
    status: String,
    position: Option<i32>,
    points: Decimal,
    run_1_points: Option<Decimal>,
    run_2_points: Option<Decimal>,
}

impl From<ResultRow> for RaceResult {
    fn from(row: ResultRow) -> Self {
        let status = ResultStatus::from_column(&row.status).unwrap_or_else(|| {
            tracing::warn!(
                "Result {} has unknown status '{}', treating as DNS",
                row.id,
                row.status
            );
            ResultStatus::Dns
        });

        Self {
            id: row.id,
            rider_id: row.rider_id,
            event_id: row.event_id,
            class_id: row.class_id,
            club_id: row.club_id,
            finish_time: row.finish_time,
            status,
            position: row.position,
            points: row.points,
            run_1_points: row.run_1_points,
            run_2_points: row.run_2_points,
        }
    }
}

const EVENT_COLUMNS: &str = r#"
    id::bigint AS id, series_id::bigint AS series_id, date, name, discipline, event_level
"#;

/// Reads the rows an aggregation run needs from the result store.
pub struct SnapshotRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SnapshotRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_series(&self, series_id: i64) -> Result<Series> {
        StorageError::check_series_id(series_id)?;

        let series = sqlx::query_as::<_, Series>(
            r#"
            SELECT id::bigint AS id, name, year::int AS year,
                   count_best_results::int AS count_best_results
            FROM series
            WHERE id = $1
            "#,
        )
        .bind(series_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::SeriesNotFound(series_id))?;

        Ok(series)
    }

    /// Everything needed to compute individual and club standings for one series.
    pub async fn load_series_snapshot(&self, series_id: i64) -> Result<ResultSnapshot> {
        let series = self.find_series(series_id).await?;

        let series_events = sqlx::query_as::<_, SeriesEventLink>(
            r#"
            SELECT series_id::bigint AS series_id, event_id::bigint AS event_id,
                   template_id::bigint AS template_id, COALESCE(sort_order, 0)::int AS sort_order
            FROM series_events
            WHERE series_id = $1
            ORDER BY sort_order, event_id
            "#,
        )
        .bind(series_id)
        .fetch_all(self.pool)
        .await?;

        let events = if series_events.is_empty() {
            sqlx::query_as::<_, Event>(&format!(
                "SELECT {} FROM events WHERE series_id = $1 ORDER BY date, id",
                EVENT_COLUMNS
            ))
            .bind(series_id)
            .fetch_all(self.pool)
            .await?
        } else {
            let event_ids: Vec<i64> = series_events.iter().map(|l| l.event_id).collect();
            sqlx::query_as::<_, Event>(&format!(
                "SELECT {} FROM events WHERE id = ANY($1) ORDER BY date, id",
                EVENT_COLUMNS
            ))
            .bind(&event_ids)
            .fetch_all(self.pool)
            .await?
        };

        let series_results = sqlx::query_as::<_, SeriesResult>(
            r#"
            SELECT series_id::bigint AS series_id, rider_id::bigint AS rider_id,
                   event_id::bigint AS event_id, class_id::bigint AS class_id,
                   points::numeric AS points
            FROM series_results
            WHERE series_id = $1
            "#,
        )
        .bind(series_id)
        .fetch_all(self.pool)
        .await?;

        let mut snapshot = self.load_results_for_events(events).await?;
        snapshot.series = vec![series];
        snapshot.series_events = series_events;
        snapshot.series_results = series_results;

        tracing::debug!(
            "Loaded series {} snapshot: {} events, {} results",
            series_id,
            snapshot.events.len(),
            snapshot.results.len()
        );

        Ok(snapshot)
    }

    /// Events of the given ranking discipline (up to `as_of` when set) with their results.
    pub async fn load_discipline_snapshot(
        &self,
        discipline: Discipline,
        as_of: Option<NaiveDate>,
    ) -> Result<ResultSnapshot> {
        let aliases: Vec<String> = discipline
            .event_column_values()
            .into_iter()
            .map(String::from)
            .collect();

        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {} FROM events
            WHERE UPPER(discipline) = ANY($1)
              AND ($2::date IS NULL OR date <= $2)
            ORDER BY date, id
            "#,
            EVENT_COLUMNS
        ))
        .bind(&aliases)
        .bind(as_of)
        .fetch_all(self.pool)
        .await?;

        let snapshot = self.load_results_for_events(events).await?;

        tracing::debug!(
            "Loaded {} snapshot: {} events, {} results",
            discipline,
            snapshot.events.len(),
            snapshot.results.len()
        );

        Ok(snapshot)
    }

    async fn load_results_for_events(&self, events: Vec<Event>) -> Result<ResultSnapshot> {
        if events.is_empty() {
            return Ok(ResultSnapshot::default());
        }

        let event_ids: Vec<i64> = events.iter().map(|e| e.id).collect();

        let results: Vec<RaceResult> = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id::bigint AS id, rider_id::bigint AS rider_id, event_id::bigint AS event_id,
                   class_id::bigint AS class_id, club_id::bigint AS club_id,
                   finish_time::text AS finish_time, status,
                   position::int AS position,
                   COALESCE(points, 0)::numeric AS points,
                   run_1_points::numeric AS run_1_points,
                   run_2_points::numeric AS run_2_points
            FROM results
            WHERE event_id = ANY($1)
            ORDER BY event_id, class_id, id
            "#,
        )
        .bind(&event_ids)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(RaceResult::from)
        .collect();

        let class_ids: Vec<i64> = unique(results.iter().map(|r| r.class_id));
        let rider_ids: Vec<i64> = unique(results.iter().map(|r| r.rider_id));

        let classes: Vec<Class> = sqlx::query_as::<_, ClassRow>(
            r#"
            SELECT id::bigint AS id, name, display_name, COALESCE(sort_order, 0)::int AS sort_order,
                   awards_points, series_eligible, ranking_type
            FROM classes
            WHERE id = ANY($1)
            "#,
        )
        .bind(&class_ids)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Class::from)
        .collect();

        let riders = sqlx::query_as::<_, Rider>(
            r#"
            SELECT id::bigint AS id, COALESCE(firstname, '') AS firstname,
                   COALESCE(lastname, '') AS lastname, club_id::bigint AS club_id
            FROM riders
            WHERE id = ANY($1)
            "#,
        )
        .bind(&rider_ids)
        .fetch_all(self.pool)
        .await?;

        let memberships = sqlx::query_as::<_, RiderClubSeason>(
            r#"
            SELECT rider_id::bigint AS rider_id, club_id::bigint AS club_id,
                   season_year::int AS season_year
            FROM rider_club_seasons
            WHERE rider_id = ANY($1)
            ORDER BY rider_id, season_year
            "#,
        )
        .bind(&rider_ids)
        .fetch_all(self.pool)
        .await?;

        let club_ids: Vec<i64> = unique(
            results
                .iter()
                .filter_map(|r| r.club_id)
                .chain(riders.iter().filter_map(|r| r.club_id))
                .chain(memberships.iter().map(|m| m.club_id)),
        );

        let clubs = sqlx::query_as::<_, Club>(
            "SELECT id::bigint AS id, name FROM clubs WHERE id = ANY($1)",
        )
        .bind(&club_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(ResultSnapshot {
            series: Vec::new(),
            events,
            series_events: Vec::new(),
            classes,
            riders,
            clubs,
            memberships,
            results,
            series_results: Vec::new(),
        })
    }
}

fn unique(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}
