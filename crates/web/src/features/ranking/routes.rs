use axum::{Router, routing::get};

use super::handlers::get_ranking;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:discipline", get(get_ranking))
}
