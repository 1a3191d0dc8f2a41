use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rider {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    /// Current club. May differ from the club the rider raced for in earlier seasons.
    pub club_id: Option<i64>,
}

impl Rider {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname.trim(), self.lastname.trim())
            .trim()
            .to_string()
    }
}

/// Which club a rider represented during one season.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RiderClubSeason {
    pub rider_id: i64,
    pub club_id: i64,
    pub season_year: i32,
}
