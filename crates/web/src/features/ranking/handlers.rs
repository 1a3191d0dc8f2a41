use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::{
    dto::ranking::{RankingFilter, RankingPage},
    models::Discipline,
};

use crate::{error::WebError, state::AppState};

use super::services;

#[utoipa::path(
    get,
    path = "/api/rankings/{discipline}",
    params(
        ("discipline" = String, Path, description = "GRAVITY, ENDURO or DH"),
        RankingFilter
    ),
    responses(
        (status = 200, description = "Weighted ranking retrieved successfully", body = RankingPage),
        (status = 400, description = "Unknown discipline or invalid query parameters")
    ),
    tag = "rankings"
)]
pub async fn get_ranking(
    State(state): State<AppState>,
    Path(discipline): Path<String>,
    Query(filter): Query<RankingFilter>,
) -> Result<Response, WebError> {
    let discipline: Discipline = discipline.parse().map_err(WebError::BadRequest)?;
    filter.validate().map_err(WebError::BadRequest)?;

    let response = services::get_ranking(
        state.db.pool(),
        discipline,
        &filter,
        &state.ranking_parameters,
    )
    .await?;

    Ok(Json(response).into_response())
}
