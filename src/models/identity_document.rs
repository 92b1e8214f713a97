use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Service type advertised by the booking portal for issuing access tokens
pub const ACCESS_TOKEN_SERVICE_TYPE: &str = "AccessTokenService";
/// Service type of the validation service the wallet uploads to
pub const VALIDATION_SERVICE_TYPE: &str = "ValidationService";
pub const CANCELLATION_SERVICE_TYPE: &str = "CancellationService";
pub const STATUS_SERVICE_TYPE: &str = "StatusService";

/// Identity document served by a ticketing backend
///
/// Verification methods and services are sets: duplicated entries in the
/// JSON arrays collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketingIdentityDocumentResponse {
    pub id: String,
    #[serde(rename = "verificationMethod")]
    pub verification_methods: BTreeSet<TicketingVerificationMethodRemote>,
    #[serde(rename = "service")]
    pub services: BTreeSet<TicketingServiceRemote>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketingServiceRemote {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketingVerificationMethodRemote {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<TicketingPublicKeyJwkRemote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_methods: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketingPublicKeyJwkRemote {
    #[serde(default)]
    pub x5c: Vec<String>,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
}

impl TicketingIdentityDocumentResponse {
    /// Returns the services advertised with the given type, ordered by id
    pub fn services_of_type<'a>(
        &'a self,
        service_type: &'a str,
    ) -> impl Iterator<Item = &'a TicketingServiceRemote> + 'a {
        self.services
            .iter()
            .filter(move |service| service.service_type == service_type)
    }

    /// Finds the first service of the given type
    pub fn first_service_of_type(&self, service_type: &str) -> Option<&TicketingServiceRemote> {
        self.services
            .iter()
            .find(|service| service.service_type == service_type)
    }

    /// Finds the verification method with the given id
    pub fn verification_method(&self, id: &str) -> Option<&TicketingVerificationMethodRemote> {
        self.verification_methods
            .iter()
            .find(|method| method.id == id)
    }
}
