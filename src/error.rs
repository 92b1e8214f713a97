use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{
    booking_flow::BookingFlowError, parcel::ParcelError, scan_dispatcher::DispatchError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Scan session not found")]
    SessionNotFound,

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Booking flow error: {0}")]
    BookingFlow(#[from] BookingFlowError),

    #[error("Parcel error: {0}")]
    Parcel(#[from] ParcelError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_debug = format!("{:?}", self);

        let (status, error_message) = match self {
            AppError::SessionNotFound => {
                (StatusCode::NOT_FOUND, "Scan session not found".to_string())
            }
            AppError::Dispatch(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::BookingFlow(BookingFlowError::UnsupportedProtocol(protocol)) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported protocol: {}", protocol),
            ),
            AppError::BookingFlow(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            // Never echo why a sealed parcel failed to open
            AppError::Parcel(_) => (StatusCode::BAD_REQUEST, "Invalid parcel".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        tracing::warn!(status = %status, error = %error_debug, "Request failed");

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
