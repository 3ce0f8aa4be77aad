//! Indexes for the dashboard queries.
//!
//! - `(ip, datetime)` for per-IP timelines and the latest-row lookup
//! - `status` for the status distribution

use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_ip_reputation::IpReputation;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ip_reputation_ip_datetime")
                    .table(IpReputation::Table)
                    .col(IpReputation::Ip)
                    .col(IpReputation::Datetime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ip_reputation_status")
                    .table(IpReputation::Table)
                    .col(IpReputation::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ip_reputation_ip_datetime")
                    .table(IpReputation::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_ip_reputation_status")
                    .table(IpReputation::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
