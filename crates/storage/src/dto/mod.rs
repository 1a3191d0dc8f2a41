pub mod common;
pub mod ranking;
pub mod standings;
