pub mod config;
pub mod diagnose;
pub mod lookup;
pub mod search;
