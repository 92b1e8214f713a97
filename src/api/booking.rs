use axum::{extract::State, routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::models::booking::BookingPortalEncryptionData;
use crate::models::check_in::TicketingCheckIn;
use crate::models::ticketing_service::TicketingService;
use crate::services::{booking_flow, parcel};

#[derive(Debug, Deserialize)]
pub struct StartBookingRequest {
    pub check_in: TicketingCheckIn,
    pub validation_service_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartBookingResponse {
    /// Sealed `BookingPortalEncryptionData`, base64
    pub parcel: String,
    pub standardized_name: String,
    pub access_token_service: TicketingService,
    pub validation_service: TicketingService,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct InspectBookingRequest {
    pub parcel: String,
}

#[derive(Debug, Serialize)]
pub struct InspectBookingResponse {
    pub standardized_name: String,
    pub validation_service_identity: String,
    pub key_fingerprint: String,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

/// Enters the booking flow for a check-in and hands back the sealed carrier
#[tracing::instrument(skip(state, request))]
async fn start_booking(
    State(state): State<AppState>,
    Json(request): Json<StartBookingRequest>,
) -> Result<Json<StartBookingResponse>> {
    let session = booking_flow::start_booking_flow(
        &state.ticketing,
        &request.check_in,
        request.validation_service_id.as_deref(),
    )
    .await?;

    let sealed = parcel::seal(&session.encryption_data, &state.parcel_key)?;

    Ok(Json(StartBookingResponse {
        parcel: STANDARD.encode(sealed),
        standardized_name: session.encryption_data.standardized_name(),
        expires_at: session.encryption_data.access_token_container().access_token.exp,
        access_token_service: session.access_token_service,
        validation_service: session.validation_service,
    }))
}

/// Opens a sealed carrier and summarises it without exposing key material
#[tracing::instrument(skip(state, request))]
async fn inspect_booking(
    State(state): State<AppState>,
    Json(request): Json<InspectBookingRequest>,
) -> Result<Json<InspectBookingResponse>> {
    let sealed = STANDARD
        .decode(request.parcel.trim())
        .map_err(|e| AppError::Validation(format!("Parcel is not valid base64: {}", e)))?;

    let data: BookingPortalEncryptionData = parcel::open(&sealed, &state.parcel_key)?;
    let container = data.access_token_container();

    Ok(Json(InspectBookingResponse {
        standardized_name: data.standardized_name(),
        validation_service_identity: data.validation_service_identity().id.clone(),
        key_fingerprint: data.key_pair().fingerprint(),
        expires_at: container.access_token.exp,
        expired: container.is_expired(Utc::now()),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/booking/start", post(start_booking))
        .route("/api/booking/inspect", post(inspect_booking))
}
