pub mod snapshot;
pub mod standings_cache;
