//! HTTP handler tests for API endpoints.
//!
//! Tests the actual HTTP responses from the full router.

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::{COMPLAINING_IP, HEALTHY_IP, RED_IP, WATCH_IP, create_test_db, seeded_db};
use ip_reputation_dashboard::{
    AppResources, api,
    config::{AppConfig, DatabaseConfig, ThresholdConfig},
    db::DbClient,
};
use serde_json::Value;
use std::sync::Arc;

fn test_config() -> AppConfig {
    AppConfig {
        database: DatabaseConfig::default(),
        listen_addr: "127.0.0.1:0".into(),
        thresholds: ThresholdConfig::default(),
    }
}

fn test_server(db: DbClient) -> TestServer {
    let resources = AppResources {
        db,
        config: Arc::new(test_config()),
    };
    TestServer::new(api::router(resources)).expect("test server")
}

async fn seeded_server() -> TestServer {
    test_server(seeded_db().await)
}

fn assert_envelope(json: &Value, success: bool) {
    assert_eq!(json["success"], success);
    let ts = json["timestamp"].as_str().expect("timestamp");
    assert_eq!(ts.len(), 19, "timestamp {ts:?}");
    assert_eq!(&ts[10..11], " ");
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = test_server(create_test_db().await);

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn test_dashboard_is_default_action() {
    let server = seeded_server().await;

    let response = server.get("/api/v1").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_envelope(&json, true);

    let data = &json["data"];
    assert_eq!(data["data"][HEALTHY_IP].as_array().unwrap().len(), 2);
    assert_eq!(data["raw_data"].as_array().unwrap().len(), 7);
    assert_eq!(data["raw_data"][0]["ip"], HEALTHY_IP);
    assert_eq!(data["raw_data"][0]["datetime"], "2025-01-01 10:00:00");
    assert_eq!(data["stats"]["total_ips"], 4);
    assert_eq!(data["stats"]["total_emails_sent"], 560);
    assert_eq!(data["stats"]["status_distribution"]["UNKNOWN"], 1);
    assert_eq!(
        data["stats"]["latest_status_by_ip"][COMPLAINING_IP]["datetime"],
        "2025-01-03 10:00:00"
    );
}

#[tokio::test]
async fn test_unknown_action_falls_back_to_dashboard() {
    let server = seeded_server().await;

    let json: Value = server
        .get("/api/v1")
        .add_query_param("action", "nonsense")
        .await
        .json();
    assert_envelope(&json, true);
    assert!(json["data"]["raw_data"].is_array());
    assert!(json["data"]["stats"].is_object());
}

#[tokio::test]
async fn test_trailing_slash_route() {
    let server = seeded_server().await;

    let response = server.get("/api/v1/").add_query_param("action", "timeline").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert!(json["data"]["timeline_data"].is_object());
}

#[tokio::test]
async fn test_timeline_action() {
    let server = seeded_server().await;

    let json: Value = server
        .get("/api/v1")
        .add_query_param("action", "timeline")
        .await
        .json();
    assert_envelope(&json, true);

    let data = &json["data"];
    assert_eq!(
        data["unique_ips"],
        serde_json::json!([HEALTHY_IP, COMPLAINING_IP, WATCH_IP, RED_IP])
    );
    let points = data["timeline_data"][COMPLAINING_IP].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["delivery_rate"], 80.0);
    assert_eq!(points[0]["status_color"], "#f39c12");
    assert_eq!(points[0]["status_priority"], 2);
    assert_eq!(points[0]["has_issues"], true);
    assert_eq!(points[0]["is_healthy"], false);

    let red = &data["timeline_data"][RED_IP][0];
    assert_eq!(red["status_color"], "#e74c3c");

    let unknown = &data["timeline_data"][WATCH_IP][1];
    assert_eq!(unknown["status"], Value::Null);
    assert_eq!(unknown["status_color"], "#95a5a6");
    assert_eq!(unknown["status_priority"], 0);
}

#[tokio::test]
async fn test_stats_action() {
    let server = seeded_server().await;

    let json: Value = server
        .get("/api/v1")
        .add_query_param("action", "stats")
        .await
        .json();
    assert_envelope(&json, true);

    let data = &json["data"];
    assert_eq!(data["total_measurements"], 7);
    assert_eq!(data["average_delivery_rate"], 93.83);
    assert_eq!(data["problematic_ips"], serde_json::json!([COMPLAINING_IP, RED_IP]));
    assert_eq!(data["healthy_ips"], serde_json::json!([HEALTHY_IP]));
    assert_eq!(data["ip_classification"][WATCH_IP], "watch");
    assert_eq!(data["ip_classification"][RED_IP], "problematic");
    assert_eq!(data["ip_classification"][HEALTHY_IP], "healthy");

    let per_ip = &data["ip_statistics"][HEALTHY_IP];
    assert_eq!(per_ip["total_sent"], 300);
    assert_eq!(per_ip["total_delivered"], 293);
    assert_eq!(per_ip["status_distribution"]["GREEN"], 2);
}

#[tokio::test]
async fn test_ip_action() {
    let server = seeded_server().await;

    let json: Value = server
        .get("/api/v1")
        .add_query_param("action", "ip")
        .add_query_param("ip", format!("  {HEALTHY_IP} "))
        .await
        .json();
    assert_envelope(&json, true);

    let data = &json["data"];
    assert_eq!(data["ip"], HEALTHY_IP);
    assert_eq!(data["total_records"], 2);
    assert_eq!(data["data"][0]["id"], 1);
    assert_eq!(data["data"][1]["id"], 2);
    assert_eq!(data["data"][0]["sample_helo"], "mta.192.0.2.1.example.nl");
    assert_eq!(data["statistics"]["total_sent"], 300);
    assert_eq!(data["statistics"]["delivery_rate"], 97.5);
}

#[tokio::test]
async fn test_ip_action_requires_ip() {
    let server = seeded_server().await;

    for query in ["/api/v1?action=ip", "/api/v1?action=ip&ip=", "/api/v1?action=ip&ip=%20%20"] {
        let response = server.get(query).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let json: Value = response.json();
        assert_envelope(&json, false);
        assert_eq!(json["error"], "IP parameter is required");
        assert!(json.get("data").is_none());
    }
}

#[tokio::test]
async fn test_malformed_query_string_uses_envelope() {
    let server = seeded_server().await;

    let response = server
        .get("/api/v1?action=ip&ip=192.0.2.1&ip=192.0.2.2")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.header("content-type"), "application/json");
    let json: Value = response.json();
    assert_envelope(&json, false);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid parameters: "), "{error}");
    assert!(error.contains("duplicate field"), "{error}");
}

#[tokio::test]
async fn test_ip_action_unknown_ip() {
    let server = seeded_server().await;

    let response = server
        .get("/api/v1")
        .add_query_param("action", "ip")
        .add_query_param("ip", "10.1.2.3")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_envelope(&json, false);
    assert_eq!(json["error"], "No data found for IP: 10.1.2.3");
}

#[tokio::test]
async fn test_database_failure_is_reported_in_envelope() {
    // no table created
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("connect");
    let server = test_server(DbClient::new(db));

    let response = server.get("/api/v1").add_query_param("action", "stats").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_envelope(&json, false);
    assert!(
        json["error"].as_str().unwrap().starts_with("API Error: Query failed"),
        "{}",
        json["error"]
    );
}

#[tokio::test]
async fn test_empty_table_dashboard() {
    let server = test_server(create_test_db().await);

    let json: Value = server.get("/api/v1").await.json();
    assert_envelope(&json, true);
    assert_eq!(json["data"]["raw_data"], serde_json::json!([]));
    assert_eq!(json["data"]["stats"]["total_ips"], 0);
    assert_eq!(json["data"]["stats"]["average_delivery_rate"], 0.0);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let server = seeded_server().await;

    let response = server
        .get("/healthz")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://dashboard.example.nl"),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

#[tokio::test]
async fn test_openapi_docs_served() {
    let server = test_server(create_test_db().await);

    let response = server.get("/api-docs").await;
    response.assert_status_ok();
    assert!(response.text().contains("IP Reputation Dashboard API"));
}
