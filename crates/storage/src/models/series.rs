use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Series {
    pub id: i64,
    pub name: String,
    pub year: i32,
    /// Caps how many per-event point totals count toward a rider's series total.
    pub count_best_results: Option<i32>,
}

/// Series-specific point value for one rider in one event and class.
///
/// When present it overrides the raw result points for series standings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SeriesResult {
    pub series_id: i64,
    pub rider_id: i64,
    pub event_id: i64,
    pub class_id: i64,
    pub points: Decimal,
}
