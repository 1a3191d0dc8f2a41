use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;

use super::class_policy;
use super::lookup::{SnapshotIndex, first_finished_rows};
use crate::dto::standings::{ClassStandings, SeriesStandingRow, SeriesStandingsFilter};
use crate::error::{Result, StorageError};
use crate::models::{Event, ResultSnapshot};

/// Events that count for a series, in series order.
///
/// Explicit series links win. Only when a series has no links at all are events
/// pointing at it through their own `series_id` used.
pub fn resolve_series_events(snapshot: &ResultSnapshot, series_id: i64) -> Vec<&Event> {
    let events: HashMap<i64, &Event> = snapshot.events.iter().map(|e| (e.id, e)).collect();

    let mut links: Vec<_> = snapshot
        .series_events
        .iter()
        .filter(|link| link.series_id == series_id)
        .filter_map(|link| events.get(&link.event_id).map(|event| (link.sort_order, *event)))
        .collect();

    if !links.is_empty() {
        links.sort_by_key(|(sort_order, event)| (*sort_order, event.date, event.id));
        let mut seen = HashSet::new();
        return links
            .into_iter()
            .map(|(_, event)| event)
            .filter(|event| seen.insert(event.id))
            .collect();
    }

    let mut direct: Vec<&Event> = snapshot
        .events
        .iter()
        .filter(|event| event.series_id == Some(series_id))
        .collect();
    direct.sort_by_key(|event| (event.date, event.id));
    direct
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestResults {
    pub total: Decimal,
    /// Event ids left out by the cap, ascending
    pub excluded: Vec<i64>,
}

/// Applies the "count best N" rule to `(event_id, points)` entries given in series order.
///
/// Entries are ranked by points descending; on equal points the earlier event is kept.
/// A cap of zero or less means every entry counts.
pub fn apply_best_results(entries: &[(i64, Decimal)], count_best: Option<i32>) -> BestResults {
    let cap = count_best.filter(|n| *n > 0).map(|n| n as usize);

    match cap {
        Some(cap) if entries.len() > cap => {
            let mut ranked = entries.to_vec();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));

            let total = ranked[..cap].iter().map(|(_, points)| *points).sum();
            let mut excluded: Vec<i64> = ranked[cap..].iter().map(|(event_id, _)| *event_id).collect();
            excluded.sort_unstable();

            BestResults { total, excluded }
        }
        _ => BestResults {
            total: entries.iter().map(|(_, points)| *points).sum(),
            excluded: Vec::new(),
        },
    }
}

#[derive(Default)]
struct RiderClassTally {
    /// Keyed by position of the event in series order
    points: BTreeMap<usize, (i64, Decimal)>,
    class_positions: BTreeMap<i64, i32>,
}

/// Individual standings for one series, grouped by class.
pub fn compute_series_standings(
    snapshot: &ResultSnapshot,
    series_id: i64,
    filter: &SeriesStandingsFilter,
) -> Result<Vec<ClassStandings>> {
    StorageError::check_series_id(series_id)?;

    let index = SnapshotIndex::new(snapshot);
    let series = index
        .series(series_id)
        .ok_or(StorageError::SeriesNotFound(series_id))?;

    let events = resolve_series_events(snapshot, series_id);
    if events.is_empty() {
        tracing::debug!("Series {} has no linked events", series_id);
        return Ok(Vec::new());
    }

    let event_order: HashMap<i64, usize> = events
        .iter()
        .enumerate()
        .map(|(order, event)| (event.id, order))
        .collect();

    let mut tallies: BTreeMap<(i64, i64), RiderClassTally> = BTreeMap::new();

    for result in first_finished_rows(&snapshot.results) {
        let Some(&order) = event_order.get(&result.event_id) else {
            continue;
        };
        let Some(class) = index.class(result.class_id) else {
            tracing::debug!("Result {} references unknown class {}", result.id, result.class_id);
            continue;
        };
        if !class_policy::is_scoring(class) || !filter.matches_class(class.id) {
            continue;
        }

        let points = index
            .series_points(series_id, result)
            .unwrap_or(result.points);

        let tally = tallies.entry((result.rider_id, class.id)).or_default();
        tally.points.entry(order).or_insert((result.event_id, points));
        if let Some(position) = class_policy::class_position(class, result) {
            tally.class_positions.entry(result.event_id).or_insert(position);
        }
    }

    let mut by_class: BTreeMap<i64, Vec<SeriesStandingRow>> = BTreeMap::new();

    for ((rider_id, class_id), tally) in tallies {
        let entries: Vec<(i64, Decimal)> = tally
            .points
            .values()
            .filter(|(_, points)| *points > Decimal::ZERO)
            .copied()
            .collect();

        let best = apply_best_results(&entries, series.count_best_results);
        if best.total <= Decimal::ZERO {
            continue;
        }

        let wins = tally.class_positions.values().filter(|p| **p == 1).count() as u32;
        let podiums = tally.class_positions.values().filter(|p| **p <= 3).count() as u32;

        by_class.entry(class_id).or_default().push(SeriesStandingRow {
            series_id,
            position: 0,
            rider_id,
            rider_name: index.rider_name(rider_id),
            class_id,
            total_points: best.total.normalize(),
            per_event_points: entries
                .iter()
                .map(|(event_id, points)| (*event_id, points.normalize()))
                .collect(),
            excluded_event_ids: best.excluded,
            class_positions: tally.class_positions,
            wins,
            podiums,
        });
    }

    let mut standings: Vec<ClassStandings> = by_class
        .into_iter()
        .filter_map(|(class_id, mut rows)| {
            rows.sort_by(|a, b| {
                b.total_points
                    .cmp(&a.total_points)
                    .then(a.rider_id.cmp(&b.rider_id))
            });
            for (idx, row) in rows.iter_mut().enumerate() {
                row.position = idx as u32 + 1;
            }
            // Positions reflect the whole class even when a name search narrows the list.
            rows.retain(|row| filter.matches_name(&row.rider_name));
            if rows.is_empty() {
                return None;
            }

            let class = index.class(class_id)?;
            Some(ClassStandings {
                class_id,
                class_name: class.label().to_string(),
                sort_order: class.sort_order,
                rows,
            })
        })
        .collect();

    standings.sort_by_key(|s| (s.sort_order, s.class_id));

    tracing::info!(
        "Computed series {} standings: {} classes, {} rows",
        series_id,
        standings.len(),
        standings.iter().map(|s| s.rows.len()).sum::<usize>()
    );

    Ok(standings)
}
