use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::domains::expiration::EXPIRATION_FEATURE;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    repository: RepositoryHealth,
    expiring_post_types: Vec<String>,
}

#[derive(Serialize)]
pub struct RepositoryHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Returns 200 OK if the content repository answers within 5 seconds,
/// 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let repository = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.server_deps.repository.health_check(),
    )
    .await
    {
        Ok(Ok(())) => RepositoryHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => RepositoryHealth {
            status: "error".to_string(),
            error: Some(format!("Query failed: {}", e)),
        },
        Err(_) => RepositoryHealth {
            status: "error".to_string(),
            error: Some("Query timeout (>5s)".to_string()),
        },
    };

    let is_healthy = repository.status == "ok";
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            repository,
            expiring_post_types: state
                .server_deps
                .post_types
                .types_supporting(EXPIRATION_FEATURE),
        }),
    )
}
