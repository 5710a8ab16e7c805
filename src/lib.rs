pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod market_data;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod rate_limiter;
pub mod security;
pub mod service;
