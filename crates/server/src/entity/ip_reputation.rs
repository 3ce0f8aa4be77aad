use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use time::PrimitiveDateTime;
use time::macros::format_description;

/// Coarse health classification assigned by the upstream reputation source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReputationStatus {
    Green,
    Yellow,
    Red,
}

impl ReputationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationStatus::Green => "GREEN",
            ReputationStatus::Yellow => "YELLOW",
            ReputationStatus::Red => "RED",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            ReputationStatus::Green => 1,
            ReputationStatus::Yellow => 2,
            ReputationStatus::Red => 3,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ReputationStatus::Green => "#27ae60",
            ReputationStatus::Yellow => "#f39c12",
            ReputationStatus::Red => "#e74c3c",
        }
    }
}

impl fmt::Display for ReputationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReputationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GREEN" => Ok(ReputationStatus::Green),
            "YELLOW" => Ok(ReputationStatus::Yellow),
            "RED" => Ok(ReputationStatus::Red),
            other => Err(format!("unknown reputation status {other:?}")),
        }
    }
}

/// Colour used for rows whose status is missing or not recognised.
pub const UNKNOWN_STATUS_COLOR: &str = "#95a5a6";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ip_reputation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ip: String,
    pub datetime: PrimitiveDateTime,
    pub mails_send: i64,
    pub mails_delivered: i64,
    pub status: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub complain_rate: f64,
    pub traps_hit: i64,
    pub sample_helo: Option<String>,
    pub jmr_sender: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Round to two decimals, the precision every rate is reported with.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Model {
    pub fn status_kind(&self) -> Option<ReputationStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Delivered / sent as a percentage with two decimals, 0 when nothing was sent.
    pub fn delivery_rate(&self) -> f64 {
        if self.mails_send == 0 {
            return 0.0;
        }
        round2(self.mails_delivered as f64 / self.mails_send as f64 * 100.0)
    }

    pub fn failure_rate(&self) -> f64 {
        100.0 - self.delivery_rate()
    }

    pub fn is_healthy(&self) -> bool {
        self.status_kind() == Some(ReputationStatus::Green)
            && self.delivery_rate() >= 95.0
            && self.complain_rate <= 0.1
    }

    pub fn has_issues(&self) -> bool {
        self.status_kind() == Some(ReputationStatus::Red)
            || self.delivery_rate() < 90.0
            || self.complain_rate > 0.5
            || self.traps_hit > 0
    }

    pub fn status_priority(&self) -> u8 {
        self.status_kind().map_or(0, |s| s.priority())
    }

    pub fn status_color(&self) -> &'static str {
        self.status_kind().map_or(UNKNOWN_STATUS_COLOR, |s| s.color())
    }

    /// `YYYY-MM-DD HH:MM:SS`, the format the dashboard front-end parses.
    pub fn formatted_datetime(&self) -> String {
        format_datetime(&self.datetime)
    }

    /// Advisory consistency check. Never enforced on read paths.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.ip.is_empty() {
            errors.push("IP address is required".to_string());
        } else if self.ip.parse::<IpAddr>().is_err() {
            errors.push("Invalid IP address format".to_string());
        }

        match self.status.as_deref() {
            None | Some("") => errors.push("Status is required".to_string()),
            Some(s) if s.parse::<ReputationStatus>().is_err() => {
                errors.push("Status must be GREEN, YELLOW, or RED".to_string())
            }
            Some(_) => {}
        }

        if self.mails_send < 0 {
            errors.push("Mails sent cannot be negative".to_string());
        }
        if self.mails_delivered < 0 {
            errors.push("Mails delivered cannot be negative".to_string());
        }
        if self.mails_delivered > self.mails_send {
            errors.push("Mails delivered cannot exceed mails sent".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

pub fn format_datetime(dt: &PrimitiveDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}
