pub mod config;
pub mod core;
pub mod market;
pub mod ratelimit;
pub mod sentiment;
pub mod sources;
