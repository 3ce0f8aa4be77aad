//! OpenAPI/Utoipa configuration.

use crate::api::{health::MISC_TAG, reputation::REPUTATION_TAG};
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "IP Reputation Dashboard API",
        version = "1.0.0",
        description = "Read-only API over email sender IP reputation measurements."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = REPUTATION_TAG, description = "IP reputation data for the dashboard")
    )
)]
pub struct ApiDoc;
