use super::{Class, Club, Event, RaceResult, Rider, RiderClubSeason, Series, SeriesEventLink, SeriesResult};

/// Point-in-time copy of the result store rows an aggregation needs.
///
/// Aggregations only ever read from a snapshot, so running them twice over the
/// same snapshot yields the same output.
#[derive(Debug, Clone, Default)]
pub struct ResultSnapshot {
    pub series: Vec<Series>,
    pub events: Vec<Event>,
    pub series_events: Vec<SeriesEventLink>,
    pub classes: Vec<Class>,
    pub riders: Vec<Rider>,
    pub clubs: Vec<Club>,
    pub memberships: Vec<RiderClubSeason>,
    pub results: Vec<RaceResult>,
    pub series_results: Vec<SeriesResult>,
}

