use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RankingType {
    Time,
    NonTime,
}

impl RankingType {
    /// Parses the `ranking_type` column. Anything unrecognised is treated as absent.
    pub fn from_column(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "time" => Some(Self::Time),
            "non-time" | "non_time" | "nontime" | "points" => Some(Self::NonTime),
            _ => None,
        }
    }
}

/// A competitive category within an event.
///
/// The policy flags are nullable on legacy rows; see `services::class_policy`
/// for how missing values are resolved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub sort_order: i32,
    pub awards_points: Option<bool>,
    pub series_eligible: Option<bool>,
    pub ranking_type: Option<RankingType>,
}

impl Class {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.name)
    }
}
