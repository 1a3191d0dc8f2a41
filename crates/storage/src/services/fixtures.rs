//! Row builders shared by the aggregation tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    Class, Club, Event, RaceResult, RankingType, ResultStatus, Rider, RiderClubSeason, Series,
    SeriesEventLink,
};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn pts(value: i64) -> Decimal {
    Decimal::from(value)
}

pub(crate) fn class(
    id: i64,
    name: &str,
    awards_points: Option<bool>,
    series_eligible: Option<bool>,
    ranking_type: Option<RankingType>,
) -> Class {
    Class {
        id,
        name: name.to_string(),
        display_name: None,
        sort_order: id as i32,
        awards_points,
        series_eligible,
        ranking_type,
    }
}

pub(crate) fn scoring_class(id: i64, name: &str) -> Class {
    class(id, name, Some(true), Some(true), Some(RankingType::Time))
}

pub(crate) fn rider(id: i64, firstname: &str, lastname: &str, club_id: Option<i64>) -> Rider {
    Rider {
        id,
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        club_id,
    }
}

pub(crate) fn club(id: i64, name: &str) -> Club {
    Club {
        id,
        name: name.to_string(),
    }
}

pub(crate) fn membership(rider_id: i64, club_id: i64, season_year: i32) -> RiderClubSeason {
    RiderClubSeason {
        rider_id,
        club_id,
        season_year,
    }
}

pub(crate) fn series(id: i64, count_best_results: Option<i32>) -> Series {
    Series {
        id,
        name: format!("Series {}", id),
        year: 2025,
        count_best_results,
    }
}

pub(crate) fn event(id: i64, series_id: Option<i64>, date: NaiveDate) -> Event {
    Event {
        id,
        series_id,
        date,
        name: format!("Event {}", id),
        discipline: Some("ENDURO".to_string()),
        event_level: Some("national".to_string()),
    }
}

pub(crate) fn link(series_id: i64, event_id: i64, sort_order: i32) -> SeriesEventLink {
    SeriesEventLink {
        series_id,
        event_id,
        template_id: None,
        sort_order,
    }
}

pub(crate) fn finished(
    id: i64,
    rider_id: i64,
    event_id: i64,
    class_id: i64,
    points: Decimal,
) -> RaceResult {
    RaceResult {
        id,
        rider_id,
        event_id,
        class_id,
        club_id: None,
        finish_time: None,
        status: ResultStatus::Finished,
        position: None,
        points,
        run_1_points: None,
        run_2_points: None,
    }
}
