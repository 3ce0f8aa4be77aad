//! Data-access layer and JSON API for tracking email sender IP reputation.
//!
//! Measurements live in a single `ip_reputation` table. The crate aggregates
//! them per IP (delivery rates, status distributions, health classification)
//! and serves the results to the dashboard front-end.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbClient;

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod repository;
pub mod response;

#[derive(Clone, Debug)]
pub struct AppResources {
    pub db: DbClient,
    pub config: Arc<AppConfig>,
}
