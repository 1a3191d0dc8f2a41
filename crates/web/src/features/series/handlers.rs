use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::dto::standings::{CacheRun, ClassStandings, ClubStandingRow, SeriesStandingsFilter};
use validator::Validate;

use crate::{error::WebError, state::AppState};

use super::services;

#[utoipa::path(
    get,
    path = "/api/series/{series_id}/standings",
    params(
        ("series_id" = i64, Path, description = "Series ID"),
        SeriesStandingsFilter
    ),
    responses(
        (status = 200, description = "Individual standings grouped by class", body = Vec<ClassStandings>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Series not found")
    ),
    tag = "series"
)]
pub async fn get_series_standings(
    State(state): State<AppState>,
    Path(series_id): Path<i64>,
    Query(filter): Query<SeriesStandingsFilter>,
) -> Result<Response, WebError> {
    filter.validate()?;

    let standings = services::get_series_standings(state.db.pool(), series_id, &filter).await?;

    Ok(Json(standings).into_response())
}

#[utoipa::path(
    get,
    path = "/api/series/{series_id}/club-standings",
    params(
        ("series_id" = i64, Path, description = "Series ID")
    ),
    responses(
        (status = 200, description = "Club standings, served from cache when available", body = Vec<ClubStandingRow>),
        (status = 404, description = "Series not found")
    ),
    tag = "series"
)]
pub async fn get_club_standings(
    State(state): State<AppState>,
    Path(series_id): Path<i64>,
) -> Result<Response, WebError> {
    let standings =
        services::get_club_standings(state.db.pool(), series_id, state.min_public_group_size)
            .await?;

    Ok(Json(standings).into_response())
}

#[utoipa::path(
    post,
    path = "/api/series/{series_id}/club-standings/rebuild",
    params(
        ("series_id" = i64, Path, description = "Series ID")
    ),
    responses(
        (status = 200, description = "Club standings cache rebuilt", body = CacheRun),
        (status = 401, description = "Missing or invalid API key"),
        (status = 404, description = "Series not found")
    ),
    security(("bearer_auth" = [])),
    tag = "series"
)]
pub async fn rebuild_club_standings(
    State(state): State<AppState>,
    Path(series_id): Path<i64>,
) -> Result<Response, WebError> {
    let run = services::rebuild_club_standings_cache(state.db.pool(), series_id).await?;

    Ok(Json(run).into_response())
}
