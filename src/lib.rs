pub mod api;
pub mod cli;
pub mod config;
pub mod detail;
pub mod error;
pub mod export;
pub mod filters;
pub mod normalize;
pub mod output;
pub mod pagination;
pub mod progress;
pub mod trend;
