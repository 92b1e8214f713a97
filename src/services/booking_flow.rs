use serde::{Deserialize, Serialize};

use crate::models::booking::{BookingPortalEncryptionData, KeyPairError, WalletKeyPair};
use crate::models::check_in::{TicketingCheckIn, DCC_VALIDATION_PROTOCOL};
use crate::models::identity_document::{ACCESS_TOKEN_SERVICE_TYPE, VALIDATION_SERVICE_TYPE};
use crate::models::ticketing_service::TicketingService;
use crate::models::validation_identity::ValidationServiceIdentity;
use crate::services::ticketing_client::{TicketingClient, TicketingClientError};

#[derive(thiserror::Error, Debug)]
pub enum BookingFlowError {
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Identity document has no {0}")]
    MissingService(String),

    #[error("Ticketing client error: {0}")]
    Client(#[from] TicketingClientError),

    #[error("Key pair error: {0}")]
    KeyPair(#[from] KeyPairError),
}

/// Everything the consent screen needs once a booking flow is entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSession {
    pub encryption_data: BookingPortalEncryptionData,
    pub access_token_service: TicketingService,
    pub validation_service: TicketingService,
}

/// Enters the booking flow for a scanned check-in
///
/// 1. Fetches the booking portal's identity document
/// 2. Picks the access-token service and the validation service
///    (`validation_service_id` or the first advertised one)
/// 3. Generates a fresh key pair and requests an access token for it
/// 4. Fetches the validation service's identity document
#[tracing::instrument(skip(client, check_in), fields(subject = %check_in.subject))]
pub async fn start_booking_flow(
    client: &TicketingClient,
    check_in: &TicketingCheckIn,
    validation_service_id: Option<&str>,
) -> Result<BookingSession, BookingFlowError> {
    if check_in.protocol != DCC_VALIDATION_PROTOCOL {
        return Err(BookingFlowError::UnsupportedProtocol(
            check_in.protocol.clone(),
        ));
    }

    let document = client
        .fetch_identity_document(&check_in.service_identity)
        .await?;

    let access_token_service = document
        .first_service_of_type(ACCESS_TOKEN_SERVICE_TYPE)
        .map(TicketingService::from_remote)
        .ok_or_else(|| BookingFlowError::MissingService(ACCESS_TOKEN_SERVICE_TYPE.to_string()))?;

    let validation_service = document
        .services_of_type(VALIDATION_SERVICE_TYPE)
        .find(|service| validation_service_id.map_or(true, |id| service.id == id))
        .map(TicketingService::from_remote)
        .ok_or_else(|| BookingFlowError::MissingService(VALIDATION_SERVICE_TYPE.to_string()))?;

    let key_pair = WalletKeyPair::generate()?;
    tracing::debug!(key = %key_pair.fingerprint(), "Generated booking key pair");

    let access_token_container = client
        .request_access_token(
            &access_token_service.service_endpoint,
            &check_in.token,
            &validation_service.id,
            &key_pair,
        )
        .await?;

    let validation_document = client
        .fetch_identity_document(&validation_service.service_endpoint)
        .await?;
    let validation_identity = ValidationServiceIdentity::from_document(&validation_document);

    tracing::info!(
        validation_service = %validation_service.name,
        "Booking flow started"
    );

    Ok(BookingSession {
        encryption_data: BookingPortalEncryptionData::new(
            key_pair,
            access_token_container,
            validation_identity,
        ),
        access_token_service,
        validation_service,
    })
}
