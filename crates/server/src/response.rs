//! JSON shapes returned by `/api/v1`.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;
use utoipa::ToSchema;

use crate::entity::ip_reputation::{Model, format_datetime};
use crate::repository::reputation::{DashboardStats, IpHealth, IpStatistics};

/// Uniform envelope around every `/api/v1` answer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    /// UTC response time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ActionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn success(data: impl Into<ActionPayload>) -> Self {
        Self {
            success: true,
            timestamp: response_timestamp(),
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            timestamp: response_timestamp(),
            data: None,
            error: Some(message),
        }
    }
}

fn response_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(&format).unwrap_or_else(|_| now.to_string())
}

/// One stored measurement as sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecordDto {
    pub id: i32,
    pub ip: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub datetime: String,
    pub mails_send: i64,
    pub mails_delivered: i64,
    pub status: Option<String>,
    pub complain_rate: f64,
    pub traps_hit: i64,
    pub sample_helo: Option<String>,
    pub jmr_sender: Option<String>,
}

impl From<&Model> for RecordDto {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id,
            ip: m.ip.clone(),
            datetime: format_datetime(&m.datetime),
            mails_send: m.mails_send,
            mails_delivered: m.mails_delivered,
            status: m.status.clone(),
            complain_rate: m.complain_rate,
            traps_hit: m.traps_hit,
            sample_helo: m.sample_helo.clone(),
            jmr_sender: m.jmr_sender.clone(),
        }
    }
}

/// A record plus the values the charts derive from it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TimelinePoint {
    #[serde(flatten)]
    pub record: RecordDto,
    pub delivery_rate: f64,
    pub status_color: String,
    pub status_priority: u8,
    pub is_healthy: bool,
    pub has_issues: bool,
}

impl From<&Model> for TimelinePoint {
    fn from(m: &Model) -> Self {
        Self {
            record: RecordDto::from(m),
            delivery_rate: m.delivery_rate(),
            status_color: m.status_color().to_string(),
            status_priority: m.status_priority(),
            is_healthy: m.is_healthy(),
            has_issues: m.has_issues(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardPayload {
    /// Records per IP, oldest first
    pub data: BTreeMap<String, Vec<RecordDto>>,
    pub stats: DashboardStats,
    /// The same records as `data`, flattened in IP order
    pub raw_data: Vec<RecordDto>,
}

impl DashboardPayload {
    pub fn new(grouped: &BTreeMap<String, Vec<Model>>, stats: DashboardStats) -> Self {
        let data: BTreeMap<String, Vec<RecordDto>> = grouped
            .iter()
            .map(|(ip, rows)| (ip.clone(), rows.iter().map(RecordDto::from).collect()))
            .collect();
        let raw_data = data.values().flatten().cloned().collect();
        Self {
            data,
            stats,
            raw_data,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimelinePayload {
    pub timeline_data: BTreeMap<String, Vec<TimelinePoint>>,
    pub unique_ips: Vec<String>,
}

impl TimelinePayload {
    pub fn new(grouped: &BTreeMap<String, Vec<Model>>, unique_ips: Vec<String>) -> Self {
        Self {
            timeline_data: grouped
                .iter()
                .map(|(ip, rows)| (ip.clone(), rows.iter().map(TimelinePoint::from).collect()))
                .collect(),
            unique_ips,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsPayload {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub problematic_ips: Vec<String>,
    pub healthy_ips: Vec<String>,
    pub ip_classification: BTreeMap<String, IpHealth>,
    pub ip_statistics: BTreeMap<String, IpStatistics>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IpDetailPayload {
    pub ip: String,
    pub data: Vec<RecordDto>,
    pub total_records: usize,
    pub statistics: IpStatistics,
}

impl IpDetailPayload {
    pub fn new(ip: String, rows: &[Model], statistics: IpStatistics) -> Self {
        Self {
            ip,
            data: rows.iter().map(RecordDto::from).collect(),
            total_records: rows.len(),
            statistics,
        }
    }
}

/// Whatever the requested action produced.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ActionPayload {
    Dashboard(DashboardPayload),
    Timeline(TimelinePayload),
    Stats(StatsPayload),
    Ip(IpDetailPayload),
}

impl From<DashboardPayload> for ActionPayload {
    fn from(p: DashboardPayload) -> Self {
        ActionPayload::Dashboard(p)
    }
}

impl From<TimelinePayload> for ActionPayload {
    fn from(p: TimelinePayload) -> Self {
        ActionPayload::Timeline(p)
    }
}

impl From<StatsPayload> for ActionPayload {
    fn from(p: StatsPayload) -> Self {
        ActionPayload::Stats(p)
    }
}

impl From<IpDetailPayload> for ActionPayload {
    fn from(p: IpDetailPayload) -> Self {
        ActionPayload::Ip(p)
    }
}
