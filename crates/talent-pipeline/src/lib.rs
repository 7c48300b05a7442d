pub mod config;
pub mod error;
pub mod pipeline;
pub mod seed;
pub mod telemetry;
