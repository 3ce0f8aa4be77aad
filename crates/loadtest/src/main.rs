use goose::prelude::*;
use std::env;

fn target_ip() -> String {
    env::var("TARGET_IP").unwrap_or_else(|_| "192.0.2.1".to_string())
}

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn get_dashboard(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/v1?action=dashboard").await?;
    Ok(())
}

async fn get_timeline(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/v1?action=timeline").await?;
    Ok(())
}

async fn get_stats(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/v1?action=stats").await?;
    Ok(())
}

async fn get_ip_detail(user: &mut GooseUser) -> TransactionResult {
    let path = format!("/api/v1?action=ip&ip={}", target_ip());
    let _goose_metrics = user.get(&path).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    if env::var("TARGET_IP").is_err() {
        println!("No TARGET_IP environment variable set, defaulting to '192.0.2.1'");
    }
    println!("IP used for detail calls: {}", target_ip());

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("DashboardViews")
                .register_transaction(transaction!(get_dashboard))
                .register_transaction(transaction!(get_timeline))
                .register_transaction(transaction!(get_stats)),
        )
        .register_scenario(
            scenario!("IpDetail").register_transaction(transaction!(get_ip_detail)),
        )
        .execute()
        .await?;

    Ok(())
}
