use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use rust_decimal::Decimal;

use super::club_resolution::{self, ClubAttribution};
use crate::models::{Class, Event, RaceResult, Rider, ResultSnapshot, Series};

/// Id-keyed views over a snapshot, built once per aggregation run.
pub(crate) struct SnapshotIndex<'a> {
    series: HashMap<i64, &'a Series>,
    events: HashMap<i64, &'a Event>,
    classes: HashMap<i64, &'a Class>,
    riders: HashMap<i64, &'a Rider>,
    clubs: HashMap<i64, &'a str>,
    memberships: HashMap<(i64, i32), i64>,
    series_points: HashMap<(i64, i64, i64, i64), Decimal>,
}

impl<'a> SnapshotIndex<'a> {
    pub(crate) fn new(snapshot: &'a ResultSnapshot) -> Self {
        let mut memberships = HashMap::new();
        for membership in &snapshot.memberships {
            memberships
                .entry((membership.rider_id, membership.season_year))
                .or_insert(membership.club_id);
        }

        let mut series_points = HashMap::new();
        for row in &snapshot.series_results {
            series_points
                .entry((row.series_id, row.rider_id, row.event_id, row.class_id))
                .or_insert(row.points);
        }

        Self {
            series: snapshot.series.iter().map(|s| (s.id, s)).collect(),
            events: snapshot.events.iter().map(|e| (e.id, e)).collect(),
            classes: snapshot.classes.iter().map(|c| (c.id, c)).collect(),
            riders: snapshot.riders.iter().map(|r| (r.id, r)).collect(),
            clubs: snapshot
                .clubs
                .iter()
                .map(|c| (c.id, c.name.as_str()))
                .collect(),
            memberships,
            series_points,
        }
    }

    pub(crate) fn series(&self, id: i64) -> Option<&'a Series> {
        self.series.get(&id).copied()
    }

    pub(crate) fn event(&self, id: i64) -> Option<&'a Event> {
        self.events.get(&id).copied()
    }

    pub(crate) fn class(&self, id: i64) -> Option<&'a Class> {
        self.classes.get(&id).copied()
    }

    pub(crate) fn rider_name(&self, id: i64) -> String {
        self.riders
            .get(&id)
            .map(|r| r.full_name())
            .unwrap_or_else(|| format!("Rider {}", id))
    }

    pub(crate) fn club_name(&self, id: i64) -> String {
        self.clubs
            .get(&id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("Club {}", id))
    }

    /// Series-specific points for a result, when the series overrides them.
    pub(crate) fn series_points(&self, series_id: i64, result: &RaceResult) -> Option<Decimal> {
        self.series_points
            .get(&(series_id, result.rider_id, result.event_id, result.class_id))
            .copied()
    }

    pub(crate) fn resolve_club(&self, result: &RaceResult, event: &Event) -> Option<ClubAttribution> {
        let season = self
            .memberships
            .get(&(result.rider_id, event.date.year()))
            .copied();
        let current = self.riders.get(&result.rider_id).and_then(|r| r.club_id);

        club_resolution::resolve_club(result.club_id, season, current)
    }
}

/// Finished results in id order, keeping only the first row per (rider, event, class).
pub(crate) fn first_finished_rows(results: &[RaceResult]) -> Vec<&RaceResult> {
    let mut rows: Vec<&RaceResult> = results.iter().filter(|r| r.is_finished()).collect();
    rows.sort_by_key(|r| r.id);

    let mut seen = HashSet::new();
    rows.retain(|r| {
        let first = seen.insert((r.rider_id, r.event_id, r.class_id));
        if !first {
            tracing::debug!(
                "Result {} duplicates rider {} in event {} class {}; ignored",
                r.id,
                r.rider_id,
                r.event_id,
                r.class_id
            );
        }
        first
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultStatus;
    use crate::services::fixtures::*;

    #[test]
    fn test_first_finished_row_wins() {
        let mut dnf = finished(1, 100, 11, 5, pts(90));
        dnf.status = ResultStatus::Dnf;
        let results = vec![
            finished(4, 100, 11, 5, pts(80)),
            dnf,
            finished(3, 100, 11, 5, pts(100)),
            finished(2, 100, 11, 6, pts(70)),
        ];

        let ids: Vec<i64> = first_finished_rows(&results).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
