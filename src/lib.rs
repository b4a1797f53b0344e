//! # FleetOps Notifications
//!
//! Aggregates support tickets, system logs, security alerts and user/partner
//! activity into a single deduplicated, role-filtered operations inbox.

pub mod aggregator;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod permissions;
pub mod query;
pub mod server;
pub mod telemetry;
pub mod visibility;
pub use migration;
