//! mb-forecast: market board price history forecasting
//!
//! This library provides the core components for:
//! - Item catalog acquisition from the paginated item API
//! - Sale-history fetch from the market board history API
//! - Two interchangeable next-price forecasters (sequence and tabular)
//! - Persistence of fitted models and normalization state
//! - Training-data capture to Parquet
//! - A browser dashboard with per-world graphs, stats, and predictions
//! - Structured logging and Prometheus metrics

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod forecast;
pub mod market;
pub mod telemetry;
