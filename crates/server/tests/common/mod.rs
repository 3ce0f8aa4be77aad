//! Shared fixtures: an in-memory SQLite `ip_reputation` table and a known data set.

#![allow(dead_code)]

use ip_reputation_dashboard::db::DbClient;
use ip_reputation_dashboard::entity::ip_reputation;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DbBackend, Statement,
};
use time::PrimitiveDateTime;
use time::macros::datetime;

/// Create a test database with an empty `ip_reputation` table
pub async fn create_test_db() -> DbClient {
    let db = Database::connect("sqlite::memory:").await.expect("connect");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE ip_reputation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ip TEXT NOT NULL,
            datetime TEXT NOT NULL,
            mails_send INTEGER NOT NULL DEFAULT 0,
            mails_delivered INTEGER NOT NULL DEFAULT 0,
            status TEXT NULL,
            complain_rate REAL NOT NULL DEFAULT 0,
            traps_hit INTEGER NOT NULL DEFAULT 0,
            sample_helo TEXT NULL,
            jmr_sender TEXT NULL
        );"#,
    ))
    .await
    .expect("create table");

    DbClient::new(db)
}

pub async fn insert(
    db: &DbClient,
    ip: &str,
    at: PrimitiveDateTime,
    sent: i64,
    delivered: i64,
    status: Option<&str>,
    complain_rate: f64,
) -> ip_reputation::Model {
    ip_reputation::ActiveModel {
        ip: Set(ip.to_string()),
        datetime: Set(at),
        mails_send: Set(sent),
        mails_delivered: Set(delivered),
        status: Set(status.map(ToString::to_string)),
        complain_rate: Set(complain_rate),
        traps_hit: Set(0),
        sample_helo: Set(Some(format!("mta.{ip}.example.nl"))),
        jmr_sender: Set(None),
        ..Default::default()
    }
    .insert(db.connection())
    .await
    .expect("insert record")
}

pub const HEALTHY_IP: &str = "192.0.2.1";
pub const COMPLAINING_IP: &str = "192.0.2.2";
pub const WATCH_IP: &str = "198.51.100.7";
pub const RED_IP: &str = "203.0.113.9";

/// Seven rows over four IPs:
///
/// | id | ip           | when             | sent | delivered | status | complaints |
/// |----|--------------|------------------|------|-----------|--------|------------|
/// | 1  | 192.0.2.1    | 2025-01-01 10:00 | 100  | 97        | GREEN  | 0.05       |
/// | 2  | 192.0.2.1    | 2025-01-02 10:00 | 200  | 196       | GREEN  | 0.02       |
/// | 3  | 192.0.2.2    | 2025-01-01 10:00 | 50   | 40        | YELLOW | 0.6        |
/// | 4  | 192.0.2.2    | 2025-01-03 10:00 | 100  | 95        | GREEN  | 0.0        |
/// | 5  | 198.51.100.7 | 2025-01-01 12:00 | 100  | 93        | YELLOW | 0.2        |
/// | 6  | 198.51.100.7 | 2025-01-02 12:00 | 0    | 0         | -      | 0.0        |
/// | 7  | 203.0.113.9  | 2025-01-05 08:00 | 10   | 10        | RED    | 0.0        |
pub async fn seed(db: &DbClient) {
    insert(db, HEALTHY_IP, datetime!(2025-01-01 10:00), 100, 97, Some("GREEN"), 0.05).await;
    insert(db, HEALTHY_IP, datetime!(2025-01-02 10:00), 200, 196, Some("GREEN"), 0.02).await;
    insert(db, COMPLAINING_IP, datetime!(2025-01-01 10:00), 50, 40, Some("YELLOW"), 0.6).await;
    insert(db, COMPLAINING_IP, datetime!(2025-01-03 10:00), 100, 95, Some("GREEN"), 0.0).await;
    insert(db, WATCH_IP, datetime!(2025-01-01 12:00), 100, 93, Some("YELLOW"), 0.2).await;
    insert(db, WATCH_IP, datetime!(2025-01-02 12:00), 0, 0, None, 0.0).await;
    insert(db, RED_IP, datetime!(2025-01-05 08:00), 10, 10, Some("RED"), 0.0).await;
}

pub async fn seeded_db() -> DbClient {
    let db = create_test_db().await;
    seed(&db).await;
    db
}
