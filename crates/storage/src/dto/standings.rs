use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Query options for individual series standings
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
pub struct SeriesStandingsFilter {
    #[validate(range(min = 1, message = "class_id must be positive"))]
    pub class_id: Option<i64>,

    #[validate(length(max = 100, message = "search must be at most 100 characters"))]
    pub search: Option<String>,
}

impl SeriesStandingsFilter {
    pub fn matches_class(&self, class_id: i64) -> bool {
        self.class_id.is_none_or(|wanted| wanted == class_id)
    }

    /// Case-insensitive substring match on the rider's full name.
    pub fn matches_name(&self, full_name: &str) -> bool {
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => full_name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// One rider's series total within one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeriesStandingRow {
    pub series_id: i64,
    pub position: u32,
    pub rider_id: i64,
    pub rider_name: String,
    pub class_id: i64,
    pub total_points: Decimal,
    /// Every event the rider scored in, counted or not
    pub per_event_points: BTreeMap<i64, Decimal>,
    /// Events dropped by the series' best-results cap, ascending by id
    pub excluded_event_ids: Vec<i64>,
    /// Finishing positions; only present for time-ranked classes
    pub class_positions: BTreeMap<i64, i32>,
    pub wins: u32,
    pub podiums: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassStandings {
    pub class_id: i64,
    pub class_name: String,
    pub sort_order: i32,
    pub rows: Vec<SeriesStandingRow>,
}

/// A rider's share of one club's points in one event and class.
///
/// This is the unit the standings cache persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClubContribution {
    pub series_id: i64,
    pub event_id: i64,
    pub club_id: i64,
    pub club_name: String,
    pub rider_id: i64,
    pub rider_name: String,
    pub class_id: i64,
    pub class_name: String,
    pub original_points: Decimal,
    /// Rank among club-mates in the same class and event, starting at 1
    pub club_rank: u32,
    pub contribution: Decimal,
    pub is_scoring: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankedRider {
    pub rider_id: i64,
    pub name: String,
    pub class_id: i64,
    pub class_name: String,
    pub total_contribution: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClubStandingRow {
    pub position: u32,
    pub club_id: i64,
    pub club_name: String,
    pub total_points: Decimal,
    pub per_event_points: BTreeMap<i64, Decimal>,
    pub rider_count: u32,
    pub scoring_rider_count: u32,
    pub ranked_riders: Vec<RankedRider>,
}

/// Metadata of the last cache rebuild for a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CacheRun {
    pub series_id: i64,
    pub run_id: Uuid,
    pub computed_at: NaiveDateTime,
    pub contribution_count: i64,
}
