use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::models::access_token::{AccessTokenContainer, AccessTokenError};
use crate::models::booking::WalletKeyPair;
use crate::models::identity_document::TicketingIdentityDocumentResponse;

/// Header carrying the nonce the validation upload is encrypted with
const NONCE_HEADER: &str = "x-nonce";
const PROTOCOL_VERSION_HEADER: &str = "X-Version";
const PROTOCOL_VERSION: &str = "1.0.0";

#[derive(thiserror::Error, Debug)]
pub enum TicketingClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Ticketing API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Access token response has no nonce")]
    MissingNonce,

    #[error("Access token error: {0}")]
    AccessToken(#[from] AccessTokenError),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenRequest<'a> {
    service: &'a str,
    pub_key: String,
}

/// HTTP client for booking portals and validation services
#[derive(Debug, Clone)]
pub struct TicketingClient {
    client: Client,
}

impl TicketingClient {
    pub fn new(timeout: Duration) -> Result<Self, TicketingClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetches the identity document published at `url`
    #[tracing::instrument(skip(self))]
    pub async fn fetch_identity_document(
        &self,
        url: &str,
    ) -> Result<TicketingIdentityDocumentResponse, TicketingClientError> {
        let url = Url::parse(url)?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                error = %error_text,
                "Identity document request failed"
            );
            return Err(TicketingClientError::ApiError(format!(
                "Status {}: {}",
                status, error_text
            )));
        }

        let document: TicketingIdentityDocumentResponse = response.json().await.map_err(|e| {
            TicketingClientError::InvalidResponse(format!(
                "Failed to parse identity document: {}",
                e
            ))
        })?;

        tracing::info!(
            document_id = %document.id,
            services = document.services.len(),
            verification_methods = document.verification_methods.len(),
            "Identity document fetched"
        );

        Ok(document)
    }

    /// Requests an access token for the given validation service
    ///
    /// The portal answers with the JWT as body and the upload nonce in the
    /// `x-nonce` header.
    #[tracing::instrument(skip(self, token, key_pair), fields(key = %key_pair.fingerprint()))]
    pub async fn request_access_token(
        &self,
        access_token_endpoint: &str,
        token: &str,
        validation_service_id: &str,
        key_pair: &WalletKeyPair,
    ) -> Result<AccessTokenContainer, TicketingClientError> {
        let url = Url::parse(access_token_endpoint)?;

        let request_body = AccessTokenRequest {
            service: validation_service_id,
            pub_key: key_pair.public_key_base64(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(PROTOCOL_VERSION_HEADER, PROTOCOL_VERSION)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                error = %error_text,
                "Access token request failed"
            );
            return Err(TicketingClientError::ApiError(format!(
                "Status {}: {}",
                status, error_text
            )));
        }

        let iv = response
            .headers()
            .get(NONCE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(TicketingClientError::MissingNonce)?;

        let jwt = response.text().await?;
        let container = AccessTokenContainer::from_jwt(jwt.trim(), &iv)?;

        tracing::info!(
            subject = %container.access_token.sub,
            expires_at = %container.access_token.exp,
            "Access token received"
        );

        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access_token::tests::{claims_json, encode_jwt};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> TicketingClient {
        TicketingClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_identity_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/identity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": format!("{}/identity", server.uri()),
                "verificationMethod": [],
                "service": [{
                    "id": "svc#1",
                    "type": "AccessTokenService",
                    "serviceEndpoint": format!("{}/token", server.uri()),
                    "name": "Token"
                }]
            })))
            .mount(&server)
            .await;

        let document = client()
            .fetch_identity_document(&format!("{}/identity", server.uri()))
            .await
            .unwrap();

        assert_eq!(document.services.len(), 1);
        assert!(document.verification_methods.is_empty());
    }

    #[tokio::test]
    async fn test_identity_document_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let result = client()
            .fetch_identity_document(&format!("{}/identity", server.uri()))
            .await;

        assert!(matches!(result, Err(TicketingClientError::ApiError(msg)) if msg.contains("down")));
    }

    #[tokio::test]
    async fn test_identity_document_missing_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "x"})))
            .mount(&server)
            .await;

        let result = client()
            .fetch_identity_document(&format!("{}/identity", server.uri()))
            .await;

        assert!(matches!(result, Err(TicketingClientError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let result = client().fetch_identity_document("not a url").await;
        assert!(matches!(result, Err(TicketingClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_request_access_token() {
        let server = MockServer::start().await;
        let key_pair = WalletKeyPair::generate().unwrap();
        let jwt = encode_jwt(&claims_json("WURST", Some("HANS")));

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("authorization", "Bearer initial-token"))
            .and(header("x-version", "1.0.0"))
            .and(body_partial_json(serde_json::json!({
                "service": "validation#1",
                "pubKey": key_pair.public_key_base64()
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-nonce", "bm9uY2U=")
                    .set_body_string(jwt.clone()),
            )
            .mount(&server)
            .await;

        let container = client()
            .request_access_token(
                &format!("{}/token", server.uri()),
                "initial-token",
                "validation#1",
                &key_pair,
            )
            .await
            .unwrap();

        assert_eq!(container.jwt_token, jwt);
        assert_eq!(container.iv, "bm9uY2U=");
        assert_eq!(container.standardized_name(), "WURST<<HANS");
    }

    #[tokio::test]
    async fn test_access_token_without_nonce() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(encode_jwt(&claims_json("WURST", None))),
            )
            .mount(&server)
            .await;

        let result = client()
            .request_access_token(
                &format!("{}/token", server.uri()),
                "t",
                "validation#1",
                &WalletKeyPair::generate().unwrap(),
            )
            .await;

        assert!(matches!(result, Err(TicketingClientError::MissingNonce)));
    }

    #[tokio::test]
    async fn test_access_token_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let result = client()
            .request_access_token(
                &format!("{}/token", server.uri()),
                "t",
                "validation#1",
                &WalletKeyPair::generate().unwrap(),
            )
            .await;

        assert!(matches!(result, Err(TicketingClientError::ApiError(_))));
    }
}
