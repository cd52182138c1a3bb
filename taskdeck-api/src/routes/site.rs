/// Public site pages and health check
///
/// # Endpoints
///
/// - `GET /` - Welcome page
/// - `GET /contact` - Contact info
/// - `GET /health` - Service health including database connectivity

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Welcome page handler
pub async fn index() -> &'static str {
    "Welcome to Task Manager"
}

/// Contact page handler
pub async fn contact() -> &'static str {
    "Please contact us by email address"
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Health check handler
///
/// Returns service health status including database connectivity.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_site_pages() {
        assert_eq!(index().await, "Welcome to Task Manager");
        assert_eq!(contact().await, "Please contact us by email address");
    }
}
