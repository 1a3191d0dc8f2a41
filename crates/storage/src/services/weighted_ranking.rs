//! Rolling multi-factor ranking over the last two seasons of results.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::class_policy;
use super::lookup::{SnapshotIndex, first_finished_rows};
use crate::dto::ranking::{
    RankingBreakdownEntry, RankingRecord, RankingSnapshot, RankingSubject, SubjectKind,
};
use crate::error::{Result, StorageError};
use crate::models::{Discipline, Event, RaceResult, RankingParameters, ResultSnapshot};

/// Points a result brings into the ranking before any multiplier.
///
/// Two-run disciplines use the sum of both runs when both carry points.
pub fn base_points(result: &RaceResult, event_discipline: Option<Discipline>) -> Decimal {
    if event_discipline.is_some_and(|d| d.is_two_run()) {
        if let (Some(run_1), Some(run_2)) = (result.run_1_points, result.run_2_points) {
            if run_1 > Decimal::ZERO && run_2 > Decimal::ZERO {
                return run_1 + run_2;
            }
        }
    }
    result.scoring_points()
}

struct Candidate<'a> {
    result: &'a RaceResult,
    event: &'a Event,
    base_points: Decimal,
}

/// Computes the ranking for `discipline`, anchored at the latest event date with
/// qualifying results (on or before `as_of` when given).
pub fn compute_ranking(
    snapshot: &ResultSnapshot,
    discipline: Discipline,
    kind: SubjectKind,
    params: &RankingParameters,
    as_of: Option<NaiveDate>,
) -> Result<RankingSnapshot> {
    params.validate().map_err(StorageError::InvalidInput)?;

    let index = SnapshotIndex::new(snapshot);

    for event in &snapshot.events {
        if let (Some(column), None) = (event.discipline.as_deref(), event.discipline()) {
            tracing::warn!(
                "Event {} has discipline '{}', which no ranking counts; skipped",
                event.id,
                column
            );
        }
    }

    let rows = first_finished_rows(&snapshot.results);

    let mut field_sizes: HashMap<(i64, i64), u32> = HashMap::new();
    for result in &rows {
        *field_sizes.entry((result.event_id, result.class_id)).or_default() += 1;
    }

    let candidates: Vec<Candidate> = rows
        .iter()
        .copied()
        .filter_map(|result| {
            let event = index.event(result.event_id)?;
            let event_discipline = event.discipline()?;
            if !discipline.includes(event_discipline) {
                return None;
            }
            if as_of.is_some_and(|limit| event.date > limit) {
                return None;
            }
            let class = index.class(result.class_id)?;
            if !class_policy::is_scoring(class) {
                return None;
            }
            let points = base_points(result, Some(event_discipline));
            (points > Decimal::ZERO).then_some(Candidate {
                result,
                event,
                base_points: points,
            })
        })
        .collect();

    let Some(reference_date) = candidates.iter().map(|c| c.event.date).max() else {
        tracing::debug!("No {} results to rank", discipline);
        return Ok(RankingSnapshot {
            discipline,
            kind,
            reference_date: None,
            window_start: None,
            records: Vec::new(),
        });
    };

    let mut subjects: BTreeMap<i64, Vec<RankingBreakdownEntry>> = BTreeMap::new();

    for candidate in &candidates {
        let Some(time_decay_multiplier) =
            params.time_decay_multiplier(candidate.event.date, reference_date)
        else {
            continue;
        };

        let subject_id = match kind {
            SubjectKind::Rider => candidate.result.rider_id,
            SubjectKind::Club => match index.resolve_club(candidate.result, candidate.event) {
                Some(attribution) => attribution.club_id,
                None => {
                    tracing::debug!(
                        "Rider {} has no club in {}; left out of club ranking",
                        candidate.result.rider_id,
                        candidate.event.date.year()
                    );
                    continue;
                }
            },
        };

        let field_size = field_sizes
            .get(&(candidate.result.event_id, candidate.result.class_id))
            .copied()
            .unwrap_or(1);
        let field_size_multiplier = params.field_size_multiplier(field_size as usize);
        let (event_level, event_level_multiplier) =
            params.event_level_multiplier(candidate.event.event_level.as_deref());

        let weighted_points = candidate.base_points
            * field_size_multiplier
            * event_level_multiplier
            * time_decay_multiplier;

        subjects.entry(subject_id).or_default().push(RankingBreakdownEntry {
            result_id: candidate.result.id,
            event_id: candidate.event.id,
            event_name: candidate.event.name.clone(),
            event_date: candidate.event.date,
            rider_id: candidate.result.rider_id,
            class_id: candidate.result.class_id,
            class_name: index
                .class(candidate.result.class_id)
                .map(|c| c.label().to_string())
                .unwrap_or_default(),
            base_points: candidate.base_points.normalize(),
            field_size,
            field_size_multiplier,
            event_level,
            event_level_multiplier,
            time_decay_multiplier,
            weighted_points: weighted_points.normalize(),
        });
    }

    let mut records: Vec<RankingRecord> = subjects
        .into_iter()
        .map(|(subject_id, mut breakdown)| {
            breakdown.sort_by(|a, b| {
                b.event_date
                    .cmp(&a.event_date)
                    .then(a.event_id.cmp(&b.event_id))
                    .then(a.rider_id.cmp(&b.rider_id))
                    .then(a.result_id.cmp(&b.result_id))
            });

            let total: Decimal = breakdown.iter().map(|e| e.weighted_points).sum();
            let events_count = breakdown
                .iter()
                .map(|e| e.event_id)
                .collect::<BTreeSet<_>>()
                .len() as u32;
            let name = match kind {
                SubjectKind::Rider => index.rider_name(subject_id),
                SubjectKind::Club => index.club_name(subject_id),
            };

            RankingRecord {
                subject: RankingSubject {
                    kind,
                    id: subject_id,
                    name,
                },
                discipline,
                total_ranking_points: total.normalize(),
                ranking_position: 0,
                events_count,
                per_event_breakdown: breakdown,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.total_ranking_points
            .cmp(&a.total_ranking_points)
            .then(a.subject.id.cmp(&b.subject.id))
    });
    for (idx, record) in records.iter_mut().enumerate() {
        record.ranking_position = idx as u32 + 1;
    }

    tracing::info!(
        "Computed {} {:?} ranking anchored at {}: {} entries",
        discipline,
        kind,
        reference_date,
        records.len()
    );

    Ok(RankingSnapshot {
        discipline,
        kind,
        reference_date: Some(reference_date),
        window_start: Some(params.window_start(reference_date)),
        records,
    })
}
