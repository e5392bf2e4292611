//! Health check endpoints.
//!
//! Both endpoints are meant to be mounted outside
//! [`RequestContextLayer`](crate::middleware::RequestContextLayer) so load
//! balancers never need credentials.

use crate::config::Environment;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Identity of the running service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Deployment environment
    pub environment: Environment,
    /// Exposure groups responses are rendered with
    pub exposure: Vec<String>,
}

/// Service identity and exposure settings.
///
/// # Endpoint
///
/// ```text
/// GET /health/info
/// ```
///
/// # Response
///
/// ```json
/// {
///   "service": "articles",
///   "version": "1.2.0",
///   "environment": "production",
///   "exposure": ["info"]
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let config = state.config();
    Json(ServiceInfo {
        service: config.service_name.clone(),
        version: config.service_version.clone(),
        environment: config.environment,
        exposure: state.groups().iter().map(str::to_string).collect(),
    })
}
