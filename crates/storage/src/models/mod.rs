mod class;
mod club;
mod event;
mod race_result;
mod ranking_parameters;
mod rider;
mod series;
mod snapshot;

pub use class::{Class, RankingType};
pub use club::Club;
pub use event::{Discipline, Event, SeriesEventLink};
pub use race_result::{RaceResult, ResultStatus};
pub use ranking_parameters::{FieldSizeBreakpoint, RankingParameters};
pub use rider::{Rider, RiderClubSeason};
pub use series::{Series, SeriesResult};
pub use snapshot::ResultSnapshot;
