use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{get_club_standings, get_series_standings, rebuild_club_standings};
use crate::middleware::auth::{ApiKeys, require_api_key};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/:series_id/club-standings/rebuild",
            post(rebuild_club_standings),
        )
        .route_layer(middleware::from_fn_with_state(api_keys, require_api_key));

    Router::new()
        .route("/:series_id/standings", get(get_series_standings))
        .route("/:series_id/club-standings", get(get_club_standings))
        .merge(protected)
}
