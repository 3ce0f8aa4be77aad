//! Reputation queries: per-IP timelines, totals, distributions and health classification.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::sea_query::{
    Alias, Cond, ConditionalStatement, Expr, Func, Order, OrderedStatement, Query,
    SelectStatement, SimpleExpr,
};
use sea_orm::{DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Criteria, Repository};
use crate::db::DbClient;
use crate::entity::ip_reputation::{Column, Entity, Model, ReputationStatus, round2};
use crate::error::DatabaseError;

/// Key used in status distributions for rows without a status.
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Per-status row counts, keyed by the stored status string.
pub type StatusDistribution = BTreeMap<String, i64>;

/// An IP is problematic when any of its rows reaches one of these (inclusive) limits
/// or is RED.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ProblemThresholds {
    pub min_complaint_rate: f64,
    pub min_failure_rate: f64,
}

impl Default for ProblemThresholds {
    fn default() -> Self {
        Self {
            min_complaint_rate: 0.5,
            min_failure_rate: 10.0,
        }
    }
}

/// An IP is healthy when none of its rows exceeds these (exclusive) limits and
/// none is RED.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HealthThresholds {
    pub max_complaint_rate: f64,
    pub max_failure_rate: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_complaint_rate: 0.1,
            max_failure_rate: 5.0,
        }
    }
}

/// Tri-state classification of an IP.
///
/// `Watch` covers every IP that is neither problematic nor healthy, including
/// those sitting exactly on a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IpHealth {
    Problematic,
    Healthy,
    Watch,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LatestStatus {
    pub status: Option<String>,
    pub datetime: String,
    pub mails_send: i64,
    pub mails_delivered: i64,
    pub delivery_rate: f64,
}

impl From<&Model> for LatestStatus {
    fn from(m: &Model) -> Self {
        Self {
            status: m.status.clone(),
            datetime: m.formatted_datetime(),
            mails_send: m.mails_send,
            mails_delivered: m.mails_delivered,
            delivery_rate: m.delivery_rate(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct IpStatistics {
    pub total_sent: i64,
    pub total_delivered: i64,
    pub delivery_rate: f64,
    pub status_distribution: StatusDistribution,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_ips: usize,
    pub total_measurements: u64,
    pub total_emails_sent: i64,
    pub total_emails_delivered: i64,
    pub status_distribution: StatusDistribution,
    pub average_delivery_rate: f64,
    pub latest_status_by_ip: BTreeMap<String, LatestStatus>,
}

#[derive(Debug, FromQueryResult)]
struct IpRow {
    ip: String,
}

#[derive(Debug, FromQueryResult)]
struct StatusCountRow {
    status: Option<String>,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct TotalRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct AverageRow {
    avg_rate: Option<f64>,
}

/// SQL type a summed integer column is cast to so every backend decodes it as `i64`.
fn integer_type(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::MySql => "SIGNED",
        DatabaseBackend::Postgres => "BIGINT",
        DatabaseBackend::Sqlite => "INTEGER",
    }
}

/// SQL type an averaged expression is cast to so every backend decodes it as `f64`.
fn float_type(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::MySql => "DOUBLE",
        DatabaseBackend::Postgres => "DOUBLE PRECISION",
        DatabaseBackend::Sqlite => "REAL",
    }
}

fn scope_to_ip(query: &mut SelectStatement, ip: Option<&str>) {
    if let Some(ip) = ip {
        query.and_where(Expr::col(Column::Ip).eq(ip));
    }
}

/// `(mails_send - mails_delivered) * 100.0 / mails_send`, a float percentage.
/// Only meaningful when `mails_send > 0`.
fn failure_rate() -> SimpleExpr {
    Expr::expr(
        Expr::expr(Expr::col(Column::MailsSend).sub(Expr::col(Column::MailsDelivered)))
            .mul(100.0),
    )
    .div(Expr::col(Column::MailsSend))
}

fn sends_anything() -> SimpleExpr {
    Expr::col(Column::MailsSend).gt(0)
}

/// Rows that make an IP problematic (inclusive limits).
fn problem_condition(t: &ProblemThresholds) -> Cond {
    Cond::any()
        .add(Expr::col(Column::ComplainRate).gte(t.min_complaint_rate))
        .add(sends_anything().and(Expr::expr(failure_rate()).gte(t.min_failure_rate)))
        .add(Expr::col(Column::Status).eq(ReputationStatus::Red.as_str()))
}

/// Rows that disqualify an IP from being healthy (exclusive limits).
fn unhealthy_condition(t: &HealthThresholds) -> Cond {
    Cond::any()
        .add(Expr::col(Column::ComplainRate).gt(t.max_complaint_rate))
        .add(sends_anything().and(Expr::expr(failure_rate()).gt(t.max_failure_rate)))
        .add(Expr::col(Column::Status).eq(ReputationStatus::Red.as_str()))
}

/// Group records per IP, each group ascending by timestamp (ties by id).
pub fn group_by_ip<I>(records: I) -> BTreeMap<String, Vec<Model>>
where
    I: IntoIterator<Item = Model>,
{
    let mut grouped: BTreeMap<String, Vec<Model>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.ip.clone()).or_default().push(record);
    }
    for records in grouped.values_mut() {
        records.sort_by_key(|r| (r.datetime, r.id));
    }
    grouped
}

/// Combine the two IP sets into one class per IP. Problematic wins over healthy.
pub fn classify(
    ips: &[String],
    problematic: &BTreeSet<String>,
    healthy: &BTreeSet<String>,
) -> BTreeMap<String, IpHealth> {
    ips.iter()
        .map(|ip| {
            let class = if problematic.contains(ip) {
                IpHealth::Problematic
            } else if healthy.contains(ip) {
                IpHealth::Healthy
            } else {
                IpHealth::Watch
            };
            (ip.clone(), class)
        })
        .collect()
}

/// Data access for the `ip_reputation` table.
#[derive(Clone, Debug)]
pub struct IpReputationRepository {
    records: Repository<Entity>,
}

impl IpReputationRepository {
    pub fn new(db: DbClient) -> Self {
        Self {
            records: Repository::new(db),
        }
    }

    /// Generic finders over the same table.
    pub fn records(&self) -> &Repository<Entity> {
        &self.records
    }

    fn db(&self) -> &DbClient {
        self.records.db()
    }

    /// All rows for one IP, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_ip(&self, ip: &str) -> Result<Vec<Model>, DatabaseError> {
        self.records
            .find_by(
                &Criteria::new().eq(Column::Ip, ip),
                Some((Column::Datetime, Order::Asc)),
                None,
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn all_grouped_by_ip(&self) -> Result<BTreeMap<String, Vec<Model>>, DatabaseError> {
        let rows = Entity::find()
            .order_by_asc(Column::Ip)
            .order_by_asc(Column::Datetime)
            .order_by_asc(Column::Id)
            .all(self.db().connection())
            .await?;
        Ok(group_by_ip(rows))
    }

    /// The per-IP timeline shown on the dashboard.
    pub async fn timeline_data(&self) -> Result<BTreeMap<String, Vec<Model>>, DatabaseError> {
        self.all_grouped_by_ip().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn unique_ips(&self) -> Result<Vec<String>, DatabaseError> {
        let mut query = Query::select();
        query
            .distinct()
            .column(Column::Ip)
            .from(Entity)
            .order_by(Column::Ip, Order::Asc);
        let rows: Vec<IpRow> = self.db().fetch_all(&query).await?;
        Ok(rows.into_iter().map(|r| r.ip).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn status_distribution(
        &self,
        ip: Option<&str>,
    ) -> Result<StatusDistribution, DatabaseError> {
        let mut query = Query::select();
        query
            .column(Column::Status)
            .expr_as(Expr::col(Column::Id).count(), Alias::new("count"))
            .from(Entity)
            .group_by_col(Column::Status);
        scope_to_ip(&mut query, ip);

        let rows: Vec<StatusCountRow> = self.db().fetch_all(&query).await?;
        let mut distribution = StatusDistribution::new();
        for row in rows {
            let key = row.status.unwrap_or_else(|| UNKNOWN_STATUS.to_string());
            *distribution.entry(key).or_insert(0) += row.count;
        }
        Ok(distribution)
    }

    async fn sum_column(&self, column: Column, ip: Option<&str>) -> Result<i64, DatabaseError> {
        let zero: SimpleExpr = Expr::val(0i64).into();
        let mut query = Query::select();
        query
            .expr_as(
                Func::cast_as(
                    Func::coalesce([Expr::col(column).sum(), zero]),
                    Alias::new(integer_type(self.db().backend())),
                ),
                Alias::new("total"),
            )
            .from(Entity);
        scope_to_ip(&mut query, ip);

        let row: Option<TotalRow> = self.db().fetch_one(&query).await?;
        Ok(row.map_or(0, |r| r.total))
    }

    #[tracing::instrument(skip(self))]
    pub async fn total_emails_sent(&self, ip: Option<&str>) -> Result<i64, DatabaseError> {
        self.sum_column(Column::MailsSend, ip).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn total_emails_delivered(&self, ip: Option<&str>) -> Result<i64, DatabaseError> {
        self.sum_column(Column::MailsDelivered, ip).await
    }

    /// Mean per-row delivery rate over rows that sent anything, two decimals.
    #[tracing::instrument(skip(self))]
    pub async fn average_delivery_rate(&self, ip: Option<&str>) -> Result<f64, DatabaseError> {
        let mut query = Query::select();
        query
            .expr_as(
                Func::cast_as(
                    Func::avg(Expr::cust("mails_delivered * 100.0 / mails_send")),
                    Alias::new(float_type(self.db().backend())),
                ),
                Alias::new("avg_rate"),
            )
            .from(Entity)
            .and_where(Expr::col(Column::MailsSend).gt(0));
        scope_to_ip(&mut query, ip);

        let row: Option<AverageRow> = self.db().fetch_one(&query).await?;
        Ok(row.and_then(|r| r.avg_rate).map_or(0.0, round2))
    }

    /// The newest row of every IP, ordered by IP. When several rows share the
    /// newest timestamp only the first one returned by the store is kept.
    #[tracing::instrument(skip(self))]
    pub async fn latest_status_by_ip(&self) -> Result<Vec<Model>, DatabaseError> {
        let latest = Alias::new("latest");
        let newest = Query::select()
            .expr(Expr::col((latest.clone(), Column::Datetime)).max())
            .from_as(Entity, latest.clone())
            .and_where(Expr::col((latest.clone(), Column::Ip)).equals((Entity, Column::Ip)))
            .to_owned();

        let rows = Entity::find()
            .filter(Expr::col((Entity, Column::Datetime)).in_subquery(newest))
            .order_by_asc(Column::Ip)
            .order_by_asc(Column::Id)
            .all(self.db().connection())
            .await?;

        let mut latest_rows: Vec<Model> = Vec::with_capacity(rows.len());
        for row in rows {
            if latest_rows.last().is_some_and(|prev| prev.ip == row.ip) {
                continue;
            }
            latest_rows.push(row);
        }
        Ok(latest_rows)
    }

    #[tracing::instrument(skip(self))]
    pub async fn problematic_ips(
        &self,
        thresholds: &ProblemThresholds,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut query = Query::select();
        query
            .distinct()
            .column(Column::Ip)
            .from(Entity)
            .cond_where(problem_condition(thresholds))
            .order_by(Column::Ip, Order::Asc);
        let rows: Vec<IpRow> = self.db().fetch_all(&query).await?;
        Ok(rows.into_iter().map(|r| r.ip).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn healthy_ips(
        &self,
        thresholds: &HealthThresholds,
    ) -> Result<Vec<String>, DatabaseError> {
        let excluded = Query::select()
            .distinct()
            .column(Column::Ip)
            .from(Entity)
            .cond_where(unhealthy_condition(thresholds))
            .to_owned();

        let mut query = Query::select();
        query
            .distinct()
            .column(Column::Ip)
            .from(Entity)
            .and_where(Expr::col(Column::Ip).not_in_subquery(excluded))
            .order_by(Column::Ip, Order::Asc);
        let rows: Vec<IpRow> = self.db().fetch_all(&query).await?;
        Ok(rows.into_iter().map(|r| r.ip).collect())
    }

    /// Exactly one [`IpHealth`] per known IP.
    #[tracing::instrument(skip(self))]
    pub async fn classify_ips(
        &self,
        problem: &ProblemThresholds,
        health: &HealthThresholds,
    ) -> Result<BTreeMap<String, IpHealth>, DatabaseError> {
        let ips = self.unique_ips().await?;
        let problematic: BTreeSet<String> = self.problematic_ips(problem).await?.into_iter().collect();
        let healthy: BTreeSet<String> = self.healthy_ips(health).await?.into_iter().collect();
        Ok(classify(&ips, &problematic, &healthy))
    }

    #[tracing::instrument(skip(self))]
    pub async fn ip_statistics(&self, ip: &str) -> Result<IpStatistics, DatabaseError> {
        Ok(IpStatistics {
            total_sent: self.total_emails_sent(Some(ip)).await?,
            total_delivered: self.total_emails_delivered(Some(ip)).await?,
            delivery_rate: self.average_delivery_rate(Some(ip)).await?,
            status_distribution: self.status_distribution(Some(ip)).await?,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, DatabaseError> {
        let latest_status_by_ip = self
            .latest_status_by_ip()
            .await?
            .iter()
            .map(|m| (m.ip.clone(), LatestStatus::from(m)))
            .collect();

        Ok(DashboardStats {
            total_ips: self.unique_ips().await?.len(),
            total_measurements: self.records.count(&Criteria::new()).await?,
            total_emails_sent: self.total_emails_sent(None).await?,
            total_emails_delivered: self.total_emails_delivered(None).await?,
            status_distribution: self.status_distribution(None).await?,
            average_delivery_rate: self.average_delivery_rate(None).await?,
            latest_status_by_ip,
        })
    }
}
