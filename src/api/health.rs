use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub open_scan_sessions: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let open_scan_sessions = state.sessions.lock().await.len();

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        open_scan_sessions,
    };

    tracing::debug!(open_scan_sessions, "Health check completed");

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::test_support::{send, test_app};

    #[tokio::test]
    async fn test_health_counts_sessions() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, axum::http::StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["open_scan_sessions"], 0);

        send(
            &app,
            "POST",
            "/api/scan/sessions",
            Some(json!({"camera_permission": "granted"})),
        )
        .await;

        let (_, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(body["open_scan_sessions"], 1);
    }
}
