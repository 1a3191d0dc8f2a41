use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{PaginatedResponse, PaginationMeta, PaginationParams, default_page, default_page_size};
use crate::models::Discipline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    #[default]
    Rider,
    Club,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RankingFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub kind: SubjectKind,
    /// Compute the ranking as it stood on this date
    pub as_of: Option<NaiveDate>,
}

impl RankingFilter {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pagination().validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingSubject {
    pub kind: SubjectKind,
    pub id: i64,
    pub name: String,
}

/// How a single result turned into weighted ranking points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingBreakdownEntry {
    pub result_id: i64,
    pub event_id: i64,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub rider_id: i64,
    pub class_id: i64,
    pub class_name: String,
    pub base_points: Decimal,
    pub field_size: u32,
    pub field_size_multiplier: Decimal,
    pub event_level: String,
    pub event_level_multiplier: Decimal,
    pub time_decay_multiplier: Decimal,
    pub weighted_points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingRecord {
    pub subject: RankingSubject,
    pub discipline: Discipline,
    pub total_ranking_points: Decimal,
    pub ranking_position: u32,
    pub events_count: u32,
    /// Newest event first
    pub per_event_breakdown: Vec<RankingBreakdownEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingSnapshot {
    pub discipline: Discipline,
    pub kind: SubjectKind,
    /// Latest event date with results; `None` when nothing qualifies
    pub reference_date: Option<NaiveDate>,
    pub window_start: Option<NaiveDate>,
    pub records: Vec<RankingRecord>,
}

/// One page of a ranking together with the anchor its time decay was computed from
#[derive(Debug, Serialize, ToSchema)]
pub struct RankingPage {
    pub discipline: Discipline,
    pub kind: SubjectKind,
    pub reference_date: Option<NaiveDate>,
    pub window_start: Option<NaiveDate>,
    pub data: Vec<RankingRecord>,
    pub pagination: PaginationMeta,
}

impl RankingPage {
    pub fn from_snapshot(snapshot: RankingSnapshot, params: &PaginationParams) -> Self {
        let page = PaginatedResponse::from_items(snapshot.records, params);

        Self {
            discipline: snapshot.discipline,
            kind: snapshot.kind,
            reference_date: snapshot.reference_date,
            window_start: snapshot.window_start,
            data: page.data,
            pagination: page.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, position: u32) -> RankingRecord {
        RankingRecord {
            subject: RankingSubject {
                kind: SubjectKind::Rider,
                id,
                name: format!("Rider {}", id),
            },
            discipline: Discipline::Enduro,
            total_ranking_points: Decimal::from(100 - id),
            ranking_position: position,
            events_count: 1,
            per_event_breakdown: Vec::new(),
        }
    }

    #[test]
    fn test_page_keeps_ranking_anchor() {
        let snapshot = RankingSnapshot {
            discipline: Discipline::Enduro,
            kind: SubjectKind::Rider,
            reference_date: NaiveDate::from_ymd_opt(2025, 6, 15),
            window_start: NaiveDate::from_ymd_opt(2023, 6, 15),
            records: (1..=5).map(|id| record(id, id as u32)).collect(),
        };
        let params = PaginationParams {
            page: 2,
            page_size: 2,
        };

        let page = RankingPage::from_snapshot(snapshot, &params);

        assert_eq!(page.reference_date, NaiveDate::from_ymd_opt(2025, 6, 15));
        assert_eq!(page.window_start, NaiveDate::from_ymd_opt(2023, 6, 15));
        assert_eq!(
            page.data.iter().map(|r| r.ranking_position).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert_eq!(page.pagination.total_items, 5);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["reference_date"], "2025-06-15");
        assert_eq!(json["window_start"], "2023-06-15");
    }
}
