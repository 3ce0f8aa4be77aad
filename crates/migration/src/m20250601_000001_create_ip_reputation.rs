use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IpReputation::Table)
                    .if_not_exists()
                    .col(pk_auto(IpReputation::Id))
                    .col(string_len(IpReputation::Ip, 45))
                    .col(date_time(IpReputation::Datetime))
                    .col(big_integer(IpReputation::MailsSend).default(0).to_owned())
                    .col(
                        big_integer(IpReputation::MailsDelivered)
                            .default(0)
                            .to_owned(),
                    )
                    .col(string_len_null(IpReputation::Status, 10))
                    .col(double(IpReputation::ComplainRate).default(0.0).to_owned())
                    .col(big_integer(IpReputation::TrapsHit).default(0).to_owned())
                    .col(string_null(IpReputation::SampleHelo))
                    .col(string_null(IpReputation::JmrSender))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IpReputation::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum IpReputation {
    Table,
    Id,
    Ip,
    Datetime,
    MailsSend,
    MailsDelivered,
    Status,
    ComplainRate,
    TrapsHit,
    SampleHelo,
    JmrSender,
}
