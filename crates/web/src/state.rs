use std::sync::Arc;

use storage::{Database, models::RankingParameters};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub ranking_parameters: Arc<RankingParameters>,
    pub min_public_group_size: u32,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            ranking_parameters: Arc::new(config.ranking_parameters.clone()),
            min_public_group_size: config.min_public_group_size,
        }
    }
}
