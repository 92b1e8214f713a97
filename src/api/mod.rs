// API module - HTTP endpoints

pub mod booking;
pub mod health;
pub mod scan;
pub mod state;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::api::state::AppState;

/// Builds the application router with all endpoints
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(scan::router())
        .merge(booking::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use secrecy::Secret;
    use tower::ServiceExt;

    use super::app;
    use crate::api::state::AppState;
    use crate::config::Config;

    pub(crate) fn test_state() -> AppState {
        AppState::new(Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            http_timeout_secs: 5,
            scan_session_ttl_secs: 900,
            parcel_key: Secret::new("test-parcel-key".to_string()),
        })
        .unwrap()
    }

    pub(crate) fn test_app() -> Router {
        app(test_state())
    }

    pub(crate) async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }
}
