pub mod apis;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod server;
pub mod storage;
pub mod types;

// Ports and their infrastructure adapters
pub mod app;
pub mod infra;
