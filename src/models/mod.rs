// Models module - wire DTOs and screen-to-screen carriers

pub mod access_token;
pub mod booking;
pub mod check_in;
pub mod identity_document;
pub mod ticketing_service;
pub mod validation_identity;

pub use access_token::AccessTokenContainer;
pub use booking::{BookingPortalEncryptionData, WalletKeyPair};
pub use check_in::{ClaimGreenCertificateModel, ModelFetchResult, TicketingCheckIn};
pub use identity_document::{TicketingIdentityDocumentResponse, TicketingServiceRemote};
pub use ticketing_service::TicketingService;
pub use validation_identity::ValidationServiceIdentity;
