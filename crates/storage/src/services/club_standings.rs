use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::{Decimal, RoundingStrategy};

use super::class_policy;
use super::lookup::{SnapshotIndex, first_finished_rows};
use super::series_points::resolve_series_events;
use crate::dto::standings::{ClubContribution, ClubStandingRow, RankedRider};
use crate::error::{Result, StorageError};
use crate::models::{RaceResult, ResultSnapshot};

/// Share of a rider's points that counts for the club, by rank among club-mates
/// in the same class and event: 100% for the best, 50% (rounded to a whole point,
/// halves away from zero) for the second, nothing after that.
pub fn contribution_for_rank(rank: u32, points: Decimal) -> Decimal {
    match rank {
        1 => points,
        2 => (points * Decimal::new(5, 1))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        _ => Decimal::ZERO,
    }
}

/// Walks the series event by event and records every rider's contribution to their club.
pub fn build_club_ledger(snapshot: &ResultSnapshot, series_id: i64) -> Result<Vec<ClubContribution>> {
    StorageError::check_series_id(series_id)?;

    let index = SnapshotIndex::new(snapshot);
    index
        .series(series_id)
        .ok_or(StorageError::SeriesNotFound(series_id))?;

    let events = resolve_series_events(snapshot, series_id);
    if events.is_empty() {
        tracing::debug!("Series {} has no linked events", series_id);
        return Ok(Vec::new());
    }

    let rows = first_finished_rows(&snapshot.results);
    let mut ledger = Vec::new();
    let mut unattributed = 0usize;

    for event in events {
        let mut groups: BTreeMap<(i64, i64), Vec<&RaceResult>> = BTreeMap::new();

        for result in rows.iter().copied().filter(|r| r.event_id == event.id) {
            if result.points <= Decimal::ZERO {
                continue;
            }
            let Some(class) = index.class(result.class_id) else {
                continue;
            };
            if !class_policy::is_scoring(class) {
                continue;
            }
            let Some(attribution) = index.resolve_club(result, event) else {
                unattributed += 1;
                tracing::debug!(
                    "Rider {} has no club for event {}; left out of club standings",
                    result.rider_id,
                    event.id
                );
                continue;
            };

            groups
                .entry((attribution.club_id, class.id))
                .or_default()
                .push(result);
        }

        for ((club_id, class_id), mut members) in groups {
            members.sort_by(|a, b| b.points.cmp(&a.points).then(a.rider_id.cmp(&b.rider_id)));

            let club_name = index.club_name(club_id);
            let class_name = index
                .class(class_id)
                .map(|c| c.label().to_string())
                .unwrap_or_default();

            for (idx, result) in members.into_iter().enumerate() {
                let club_rank = idx as u32 + 1;
                let contribution = contribution_for_rank(club_rank, result.points);

                ledger.push(ClubContribution {
                    series_id,
                    event_id: event.id,
                    club_id,
                    club_name: club_name.clone(),
                    rider_id: result.rider_id,
                    rider_name: index.rider_name(result.rider_id),
                    class_id,
                    class_name: class_name.clone(),
                    original_points: result.points.normalize(),
                    club_rank,
                    contribution: contribution.normalize(),
                    is_scoring: contribution > Decimal::ZERO,
                });
            }
        }
    }

    if unattributed > 0 {
        tracing::info!(
            "Series {}: {} results without a club were skipped",
            series_id,
            unattributed
        );
    }

    Ok(ledger)
}

#[derive(Default)]
struct ClubTally {
    club_name: String,
    total: Decimal,
    per_event: BTreeMap<i64, Decimal>,
    riders: BTreeSet<i64>,
    scoring_riders: BTreeSet<i64>,
    /// (rider, class) -> (rider name, class name, total contribution)
    ranked: BTreeMap<(i64, i64), (String, String, Decimal)>,
}

/// Folds a contribution ledger into club standings.
///
/// Depends on nothing but the ledger, so a ledger read back from the cache
/// yields the same standings as a freshly computed one.
pub fn assemble_club_standings(ledger: &[ClubContribution]) -> Vec<ClubStandingRow> {
    let mut clubs: BTreeMap<i64, ClubTally> = BTreeMap::new();

    for entry in ledger {
        let tally = clubs.entry(entry.club_id).or_insert_with(|| ClubTally {
            club_name: entry.club_name.clone(),
            ..Default::default()
        });

        tally.total += entry.contribution;
        *tally.per_event.entry(entry.event_id).or_default() += entry.contribution;
        tally.riders.insert(entry.rider_id);
        if entry.is_scoring {
            tally.scoring_riders.insert(entry.rider_id);
        }

        let ranked = tally
            .ranked
            .entry((entry.rider_id, entry.class_id))
            .or_insert_with(|| (entry.rider_name.clone(), entry.class_name.clone(), Decimal::ZERO));
        ranked.2 += entry.contribution;
    }

    let mut rows: Vec<ClubStandingRow> = clubs
        .into_iter()
        .map(|(club_id, tally)| {
            let mut ranked_riders: Vec<RankedRider> = tally
                .ranked
                .into_iter()
                .map(|((rider_id, class_id), (name, class_name, total))| RankedRider {
                    rider_id,
                    name,
                    class_id,
                    class_name,
                    total_contribution: total.normalize(),
                })
                .collect();
            ranked_riders.sort_by(|a, b| {
                b.total_contribution
                    .cmp(&a.total_contribution)
                    .then(a.rider_id.cmp(&b.rider_id))
                    .then(a.class_id.cmp(&b.class_id))
            });

            ClubStandingRow {
                position: 0,
                club_id,
                club_name: tally.club_name,
                total_points: tally.total.normalize(),
                per_event_points: tally
                    .per_event
                    .into_iter()
                    .map(|(event_id, points)| (event_id, points.normalize()))
                    .collect(),
                rider_count: tally.riders.len() as u32,
                scoring_rider_count: tally.scoring_riders.len() as u32,
                ranked_riders,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(a.club_id.cmp(&b.club_id))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = idx as u32 + 1;
    }

    rows
}

/// Club standings for a series, computed from scratch.
pub fn compute_club_standings(snapshot: &ResultSnapshot, series_id: i64) -> Result<Vec<ClubStandingRow>> {
    let ledger = build_club_ledger(snapshot, series_id)?;
    let standings = assemble_club_standings(&ledger);

    tracing::info!(
        "Computed club standings for series {}: {} clubs from {} contributions",
        series_id,
        standings.len(),
        ledger.len()
    );

    Ok(standings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankingType;
    use crate::services::fixtures::*;

    fn club_snapshot() -> ResultSnapshot {
        ResultSnapshot {
            series: vec![series(1, None)],
            events: vec![event(11, Some(1), date(2025, 5, 1))],
            classes: vec![scoring_class(5, "Elite")],
            clubs: vec![club(1, "CK Uni"), club(2, "IK Hakarps")],
            riders: vec![
                rider(100, "Ann", "A", Some(1)),
                rider(101, "Bea", "B", Some(1)),
                rider(102, "Cia", "C", Some(1)),
            ],
            results: vec![
                finished(1, 100, 11, 5, pts(100)),
                finished(2, 101, 11, 5, pts(80)),
                finished(3, 102, 11, 5, pts(60)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_contribution_rule() {
        assert_eq!(contribution_for_rank(1, Decimal::new(755, 1)), Decimal::new(755, 1));
        assert_eq!(contribution_for_rank(2, pts(80)), pts(40));
        assert_eq!(contribution_for_rank(2, pts(75)), pts(38));
        assert_eq!(contribution_for_rank(2, pts(73)), pts(37));
        assert_eq!(contribution_for_rank(3, pts(60)), Decimal::ZERO);
    }

    #[test]
    fn test_three_club_mates_in_one_class() {
        let standings = compute_club_standings(&club_snapshot(), 1).unwrap();

        assert_eq!(standings.len(), 1);
        let row = &standings[0];
        assert_eq!(row.total_points, pts(140));
        assert_eq!(row.per_event_points.get(&11), Some(&pts(140)));
        assert_eq!(row.rider_count, 3);
        assert_eq!(row.scoring_rider_count, 2);

        let ranked: Vec<(i64, Decimal)> = row
            .ranked_riders
            .iter()
            .map(|r| (r.rider_id, r.total_contribution))
            .collect();
        assert_eq!(ranked, vec![(100, pts(100)), (101, pts(40)), (102, pts(0))]);
    }

    #[test]
    fn test_classes_are_ranked_separately() {
        let mut snapshot = club_snapshot();
        snapshot.classes.push(scoring_class(6, "Junior"));
        snapshot.results[2].class_id = 6;

        let standings = compute_club_standings(&snapshot, 1).unwrap();
        // 100 + 40 in Elite, 60 at full value as the best Junior.
        assert_eq!(standings[0].total_points, pts(200));
        assert_eq!(standings[0].scoring_rider_count, 3);
    }

    #[test]
    fn test_equal_points_break_on_rider_id() {
        let mut snapshot = club_snapshot();
        snapshot.results[0].points = pts(80);
        snapshot.results.swap(0, 1);

        let ledger = build_club_ledger(&snapshot, 1).unwrap();
        let first = ledger.iter().find(|c| c.club_rank == 1).unwrap();
        assert_eq!(first.rider_id, 100);
    }

    #[test]
    fn test_non_scoring_class_is_ignored() {
        let mut snapshot = club_snapshot();
        snapshot
            .classes
            .push(crate::services::fixtures::class(7, "Open", Some(false), Some(true), Some(RankingType::Time)));
        snapshot.results.push(finished(4, 100, 11, 7, pts(1000)));

        let standings = compute_club_standings(&snapshot, 1).unwrap();
        assert_eq!(standings[0].total_points, pts(140));
    }

    #[test]
    fn test_riders_without_club_are_skipped() {
        let mut snapshot = club_snapshot();
        snapshot.riders.push(rider(103, "No", "Club", None));
        snapshot.results.push(finished(4, 103, 11, 5, pts(500)));

        let ledger = build_club_ledger(&snapshot, 1).unwrap();
        assert!(ledger.iter().all(|c| c.rider_id != 103));
        assert_eq!(assemble_club_standings(&ledger)[0].total_points, pts(140));
    }

    #[test]
    fn test_explicit_result_club_beats_memberships() {
        let mut snapshot = club_snapshot();
        snapshot.clubs.push(club(3, "Current Club"));
        snapshot.riders[0].club_id = Some(3);
        snapshot.memberships.push(membership(100, 2, 2025));
        snapshot.results[0].club_id = Some(1);

        let ledger = build_club_ledger(&snapshot, 1).unwrap();
        let entry = ledger.iter().find(|c| c.rider_id == 100).unwrap();
        assert_eq!(entry.club_id, 1);
    }

    #[test]
    fn test_season_membership_used_for_past_years() {
        let mut snapshot = club_snapshot();
        snapshot.memberships.push(membership(102, 2, 2025));
        snapshot.memberships.push(membership(102, 1, 2024));

        let standings = compute_club_standings(&snapshot, 1).unwrap();
        let hakarps = standings.iter().find(|r| r.club_id == 2).unwrap();
        assert_eq!(hakarps.total_points, pts(60));

        let uni = standings.iter().find(|r| r.club_id == 1).unwrap();
        assert_eq!(uni.total_points, pts(140));
        assert_eq!(uni.position, 1);
        assert_eq!(hakarps.position, 2);
    }

    #[test]
    fn test_accumulates_across_events() {
        let mut snapshot = club_snapshot();
        snapshot.events.push(event(12, Some(1), date(2025, 6, 1)));
        snapshot.results.push(finished(4, 101, 12, 5, pts(90)));

        let standings = compute_club_standings(&snapshot, 1).unwrap();
        let row = &standings[0];
        assert_eq!(row.total_points, pts(230));
        assert_eq!(row.per_event_points.get(&12), Some(&pts(90)));
        assert_eq!(row.ranked_riders[0].rider_id, 101);
        assert_eq!(row.ranked_riders[0].total_contribution, pts(130));
    }

    #[test]
    fn test_duplicate_result_rows_count_once() {
        let snapshot = ResultSnapshot {
            results: vec![
                finished(1, 100, 11, 5, pts(100)),
                finished(2, 100, 11, 5, pts(80)),
            ],
            ..club_snapshot()
        };

        let ledger = build_club_ledger(&snapshot, 1).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].original_points, pts(100));
        assert_eq!(ledger[0].club_rank, 1);

        let standings = assemble_club_standings(&ledger);
        assert_eq!(standings[0].total_points, pts(100));

        let individual = crate::services::series_points::compute_series_standings(
            &snapshot,
            1,
            &Default::default(),
        )
        .unwrap();
        assert_eq!(individual[0].rows[0].total_points, standings[0].total_points);
    }

    #[test]
    fn test_missing_series() {
        assert!(matches!(
            compute_club_standings(&club_snapshot(), 9),
            Err(StorageError::SeriesNotFound(9))
        ));
    }
}
