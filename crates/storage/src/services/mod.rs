pub mod class_policy;
pub mod club_resolution;
pub mod club_standings;
pub mod series_points;
pub mod standings_cache;
pub mod weighted_ranking;

mod lookup;

#[cfg(test)]
pub(crate) mod fixtures;
