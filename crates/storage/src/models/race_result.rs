use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Finished,
    Dnf,
    Dns,
    Dq,
}

impl ResultStatus {
    pub fn from_column(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "finished" | "fin" | "ok" => Some(Self::Finished),
            "dnf" => Some(Self::Dnf),
            "dns" => Some(Self::Dns),
            "dq" | "dsq" => Some(Self::Dq),
            _ => None,
        }
    }
}

/// One rider's result in one class of one event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RaceResult {
    pub id: i64,
    pub rider_id: i64,
    pub event_id: i64,
    pub class_id: i64,
    /// Club recorded on the result row itself, if any.
    pub club_id: Option<i64>,
    pub finish_time: Option<String>,
    pub status: ResultStatus,
    pub position: Option<i32>,
    pub points: Decimal,
    pub run_1_points: Option<Decimal>,
    pub run_2_points: Option<Decimal>,
}

impl RaceResult {
    pub fn is_finished(&self) -> bool {
        self.status == ResultStatus::Finished
    }

    /// Points are only meaningful for finishers.
    pub fn scoring_points(&self) -> Decimal {
        if self.is_finished() {
            self.points
        } else {
            Decimal::ZERO
        }
    }
}
