//! Reputation endpoint (`/api/v1`).
//!
//! One route, dispatching on the `action` query parameter:
//! - `dashboard` (default) - grouped records, flat records and dashboard stats
//! - `timeline` - grouped records with derived chart fields
//! - `stats` - dashboard stats plus per-IP health and statistics
//! - `ip` - every record and the statistics for a single IP

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, rejection::QueryRejection},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::AppResources;
use crate::error::ApiError;
use crate::repository::reputation::IpReputationRepository;
use crate::response::{
    ApiResponse, DashboardPayload, IpDetailPayload, StatsPayload, TimelinePayload,
};

/// Tag for OpenAPI documentation.
pub const REPUTATION_TAG: &str = "IP Reputation";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApiParams {
    /// `dashboard`, `timeline`, `stats` or `ip`. Anything else falls back to `dashboard`.
    pub action: Option<String>,
    /// IP address, required for `action=ip`
    pub ip: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Dashboard,
    Timeline,
    Stats,
    Ip,
}

impl Action {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("timeline") => Action::Timeline,
            Some("stats") => Action::Stats,
            Some("ip") => Action::Ip,
            _ => Action::Dashboard,
        }
    }
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/v1",
    tag = REPUTATION_TAG,
    operation_id = "Reputation API",
    summary = "Query IP reputation data",
    description = "Read-only access to the `ip_reputation` measurements.\n\n\
                   The `action` parameter picks the view: `dashboard` (default), `timeline`, `stats` or `ip`. \
                   Unknown actions are answered like `dashboard`. `action=ip` requires the `ip` parameter.\n\n\
                   Every answer is wrapped in `{success, timestamp, data}` or `{success, timestamp, error}`.",
    params(ApiParams),
    responses(
        (status = 200, description = "Requested view", body = ApiResponse),
        (status = 400, description = "Missing or malformed parameter, or query failure", body = ApiResponse),
        (status = 404, description = "No records for the requested IP", body = ApiResponse),
        (status = 500, description = "Unexpected failure", body = ApiResponse),
    )
)]
pub async fn reputation_api(
    Extension(resources): Extension<AppResources>,
    params: Result<Query<ApiParams>, QueryRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::InvalidParameter(e.body_text()))?;
    let repo = IpReputationRepository::new(resources.db.clone());

    let response = match Action::parse(params.action.as_deref()) {
        Action::Dashboard => dashboard(&repo).await?,
        Action::Timeline => timeline(&repo).await?,
        Action::Stats => stats(&repo, &resources).await?,
        Action::Ip => {
            let ip = params
                .ip
                .as_deref()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .ok_or(ApiError::MissingParameter("ip"))?;
            ip_detail(&repo, ip).await?
        }
    };
    Ok(Json(response))
}

async fn dashboard(repo: &IpReputationRepository) -> Result<ApiResponse, ApiError> {
    let grouped = repo.timeline_data().await?;
    let stats = repo.dashboard_stats().await?;
    Ok(ApiResponse::success(DashboardPayload::new(&grouped, stats)))
}

async fn timeline(repo: &IpReputationRepository) -> Result<ApiResponse, ApiError> {
    let grouped = repo.timeline_data().await?;
    let unique_ips = repo.unique_ips().await?;
    Ok(ApiResponse::success(TimelinePayload::new(&grouped, unique_ips)))
}

async fn stats(
    repo: &IpReputationRepository,
    resources: &AppResources,
) -> Result<ApiResponse, ApiError> {
    let thresholds = &resources.config.thresholds;

    let stats = repo.dashboard_stats().await?;
    let problematic_ips = repo.problematic_ips(&thresholds.problematic).await?;
    let healthy_ips = repo.healthy_ips(&thresholds.healthy).await?;
    let ip_classification = repo
        .classify_ips(&thresholds.problematic, &thresholds.healthy)
        .await?;

    let mut ip_statistics = BTreeMap::new();
    for ip in repo.unique_ips().await? {
        let statistics = repo.ip_statistics(&ip).await?;
        ip_statistics.insert(ip, statistics);
    }

    Ok(ApiResponse::success(StatsPayload {
        stats,
        problematic_ips,
        healthy_ips,
        ip_classification,
        ip_statistics,
    }))
}

async fn ip_detail(repo: &IpReputationRepository, ip: &str) -> Result<ApiResponse, ApiError> {
    let rows = repo.find_by_ip(ip).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(ip.to_string()));
    }
    let statistics = repo.ip_statistics(ip).await?;
    Ok(ApiResponse::success(IpDetailPayload::new(
        ip.to_string(),
        &rows,
        statistics,
    )))
}
