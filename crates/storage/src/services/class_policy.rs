//! Eligibility and placing rules derived from class records.

use crate::models::{Class, RaceResult, RankingType};

/// Whether results in this class feed series and club totals.
///
/// Legacy rows without the flags are treated as eligible.
pub fn is_scoring(class: &Class) -> bool {
    class.awards_points.unwrap_or(true) && class.series_eligible.unwrap_or(true)
}

/// Whether finishing positions in this class are meaningful.
pub fn is_time_ranked(class: &Class) -> bool {
    match class.ranking_type {
        Some(RankingType::Time) => true,
        Some(RankingType::NonTime) => false,
        None => {
            let by_name = infer_non_competitive_from_name(&class.name);
            let by_display = class
                .display_name
                .as_deref()
                .is_some_and(infer_non_competitive_from_name);
            !(by_name || by_display)
        }
    }
}

/// Legacy fallback for classes imported before `ranking_type` existed.
///
/// "Motion" and "sport" classes are non-competitive. Remove once every class row
/// carries a ranking type.
pub fn infer_non_competitive_from_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("motion") || name.contains("sport")
}

/// Position to display and count toward wins/podiums, if any.
pub fn class_position(class: &Class, result: &RaceResult) -> Option<i32> {
    if !result.is_finished() || !is_time_ranked(class) {
        return None;
    }
    result.position.filter(|p| *p > 0)
}
