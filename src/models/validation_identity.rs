use serde::{Deserialize, Serialize};

use crate::models::identity_document::{
    TicketingIdentityDocumentResponse, TicketingPublicKeyJwkRemote,
    TicketingVerificationMethodRemote,
};
use crate::models::ticketing_service::TicketingService;

const ENCRYPTION_KEY_USE: &str = "enc";

/// Identity of the validation service a booking flow uploads to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationServiceIdentity {
    pub id: String,
    pub verification_methods: Vec<VerificationMethod>,
    pub services: Vec<TicketingService>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    pub public_key_jwk: Option<PublicKeyJwk>,
    pub verification_methods: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    pub x5c: Vec<String>,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
}

impl From<&TicketingPublicKeyJwkRemote> for PublicKeyJwk {
    fn from(remote: &TicketingPublicKeyJwkRemote) -> Self {
        Self {
            x5c: remote.x5c.clone(),
            kid: remote.kid.clone(),
            alg: remote.alg.clone(),
            key_use: remote.key_use.clone(),
        }
    }
}

impl From<&TicketingVerificationMethodRemote> for VerificationMethod {
    fn from(remote: &TicketingVerificationMethodRemote) -> Self {
        Self {
            id: remote.id.clone(),
            method_type: remote.method_type.clone(),
            controller: remote.controller.clone(),
            public_key_jwk: remote.public_key_jwk.as_ref().map(PublicKeyJwk::from),
            verification_methods: remote.verification_methods.clone(),
        }
    }
}

impl ValidationServiceIdentity {
    pub fn from_document(document: &TicketingIdentityDocumentResponse) -> Self {
        Self {
            id: document.id.clone(),
            verification_methods: document
                .verification_methods
                .iter()
                .map(VerificationMethod::from)
                .collect(),
            services: document
                .services
                .iter()
                .map(TicketingService::from_remote)
                .collect(),
        }
    }

    /// Keys the validation service publishes for encrypting uploads
    pub fn encryption_keys(&self) -> impl Iterator<Item = (&VerificationMethod, &PublicKeyJwk)> {
        self.verification_methods.iter().filter_map(|method| {
            method
                .public_key_jwk
                .as_ref()
                .filter(|jwk| jwk.key_use == ENCRYPTION_KEY_USE)
                .map(|jwk| (method, jwk))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_document_keeps_methods_and_services() {
        let document: TicketingIdentityDocumentResponse = serde_json::from_str(
            r#"{
                "id": "https://validation.example/identity",
                "verificationMethod": [
                    {
                        "id": "https://validation.example/identity/verificationMethod/JsonWebKey2020#ValidationServiceEncKey-1",
                        "type": "JsonWebKey2020",
                        "controller": "https://validation.example/identity",
                        "publicKeyJwk": {"x5c": ["MIIC"], "kid": "enc-1", "alg": "RS256", "use": "enc"}
                    },
                    {
                        "id": "https://validation.example/identity/verificationMethod/JsonWebKey2020#ValidationServiceSignKey-1",
                        "type": "JsonWebKey2020",
                        "controller": "https://validation.example/identity",
                        "publicKeyJwk": {"x5c": ["MIIB"], "kid": "sig-1", "alg": "ES256", "use": "sig"}
                    }
                ],
                "service": [
                    {
                        "id": "https://validation.example/identity/service/ValidationService#1",
                        "type": "ValidationService",
                        "serviceEndpoint": "https://validation.example/validate",
                        "name": "Validation"
                    }
                ]
            }"#,
        )
        .unwrap();

        let identity = ValidationServiceIdentity::from_document(&document);

        assert_eq!(identity.id, "https://validation.example/identity");
        assert_eq!(identity.verification_methods.len(), 2);
        assert_eq!(identity.services[0].service_endpoint, "https://validation.example/validate");

        let keys: Vec<_> = identity.encryption_keys().collect();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].1.kid, "enc-1");
    }
}
