use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum AccessTokenError {
    #[error("Invalid JWT format: {0}")]
    InvalidJwt(String),

    #[error("Failed to parse access token claims: {0}")]
    InvalidClaims(#[from] serde_json::Error),
}

/// Claims of the access token issued by a booking portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub iss: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
    pub sub: String,
    pub aud: String,
    /// Validation type (0 structure, 1 cryptographic, 2 full)
    #[serde(rename = "t")]
    pub validation_type: i32,
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "vc")]
    pub certificate_data: CertificateData,
}

/// Traveller and validation conditions embedded in the access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    #[serde(default)]
    pub lang: Option<String>,
    pub fnt: String,
    #[serde(default)]
    pub gnt: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub coa: Option<String>,
    #[serde(default)]
    pub cod: Option<String>,
    #[serde(default)]
    pub roa: Option<String>,
    #[serde(default)]
    pub rod: Option<String>,
    #[serde(rename = "type", default)]
    pub certificate_types: Vec<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub validation_clock: Option<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
}

impl CertificateData {
    /// Standardized (ICAO transliterated) name, `FAMILY<<GIVEN`
    pub fn standardized_name(&self) -> String {
        match self.gnt.as_deref() {
            Some(given) if !given.is_empty() => format!("{}<<{}", self.fnt, given),
            _ => self.fnt.clone(),
        }
    }
}

/// Access token as returned by the access-token service, with its decoded
/// claims and the nonce the validation upload must be encrypted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenContainer {
    pub access_token: AccessToken,
    pub jwt_token: String,
    pub iv: String,
}

impl AccessTokenContainer {
    /// Decodes the JWT payload without verifying its signature
    ///
    /// The signature is checked by the validation service the token is
    /// presented to, the wallet only reads the claims.
    pub fn from_jwt(jwt_token: &str, iv: &str) -> Result<Self, AccessTokenError> {
        let parts: Vec<&str> = jwt_token.split('.').collect();
        if parts.len() != 3 {
            return Err(AccessTokenError::InvalidJwt(
                "JWT token does not have 3 parts".to_string(),
            ));
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| AccessTokenError::InvalidJwt(format!("Failed to decode base64: {}", e)))?;

        let access_token: AccessToken = serde_json::from_slice(&payload_bytes)?;

        Ok(Self {
            access_token,
            jwt_token: jwt_token.to_string(),
            iv: iv.to_string(),
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.access_token.exp
    }

    pub fn standardized_name(&self) -> String {
        self.access_token.certificate_data.standardized_name()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn claims_json(fnt: &str, gnt: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "jti": "e3cbf1a6-4f3c-4b5d-9a8f-8d4f9f0c1a2b",
            "iss": "https://booking.example/token",
            "iat": 1_635_000_000,
            "exp": 1_635_003_600,
            "sub": "6b1e2c4a-0b8f-4c2e-8a37-ff0d2a8bb7f4",
            "aud": "https://validation.example/validate/6b1e2c4a",
            "t": 2,
            "v": "1.0",
            "vc": {
                "lang": "en-en",
                "fnt": fnt,
                "gnt": gnt,
                "dob": "1990-01-01",
                "coa": "AF",
                "cod": "SJ",
                "roa": "AF",
                "rod": "SJ",
                "type": ["r", "v", "t"],
                "category": ["Standard"],
                "validationClock": "2021-01-29T12:00:00+01:00",
                "validFrom": "2021-01-29T12:00:00+01:00",
                "validTo": "2021-01-30T12:00:00+01:00"
            }
        })
    }

    pub(crate) fn encode_jwt(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        format!("{}.{}.c2lnbmF0dXJl", header, payload)
    }

    #[test]
    fn test_from_jwt_decodes_claims() {
        let jwt = encode_jwt(&claims_json("WURST", Some("HANS")));
        let container = AccessTokenContainer::from_jwt(&jwt, "bm9uY2U=").unwrap();

        assert_eq!(container.jwt_token, jwt);
        assert_eq!(container.iv, "bm9uY2U=");
        assert_eq!(container.access_token.validation_type, 2);
        assert_eq!(
            container.access_token.exp,
            Utc.timestamp_opt(1_635_003_600, 0).unwrap()
        );
        assert_eq!(
            container.access_token.certificate_data.certificate_types,
            vec!["r", "v", "t"]
        );
    }

    #[test]
    fn test_standardized_name() {
        let jwt = encode_jwt(&claims_json("WURST", Some("HANS")));
        let container = AccessTokenContainer::from_jwt(&jwt, "").unwrap();
        assert_eq!(container.standardized_name(), "WURST<<HANS");

        let jwt = encode_jwt(&claims_json("WURST", None));
        let container = AccessTokenContainer::from_jwt(&jwt, "").unwrap();
        assert_eq!(container.standardized_name(), "WURST");

        let jwt = encode_jwt(&claims_json("WURST", Some("")));
        let container = AccessTokenContainer::from_jwt(&jwt, "").unwrap();
        assert_eq!(container.standardized_name(), "WURST");
    }

    #[test]
    fn test_expiry() {
        let jwt = encode_jwt(&claims_json("WURST", None));
        let container = AccessTokenContainer::from_jwt(&jwt, "").unwrap();

        assert!(!container.is_expired(Utc.timestamp_opt(1_635_000_100, 0).unwrap()));
        assert!(container.is_expired(Utc.timestamp_opt(1_635_003_600, 0).unwrap()));
    }

    #[test]
    fn test_malformed_jwt() {
        assert!(matches!(
            AccessTokenContainer::from_jwt("not-a-jwt", ""),
            Err(AccessTokenError::InvalidJwt(_))
        ));
        assert!(matches!(
            AccessTokenContainer::from_jwt("a.%%%.c", ""),
            Err(AccessTokenError::InvalidJwt(_))
        ));

        let not_claims = format!("a.{}.c", URL_SAFE_NO_PAD.encode(b"{\"foo\":1}"));
        assert!(matches!(
            AccessTokenContainer::from_jwt(&not_claims, ""),
            Err(AccessTokenError::InvalidClaims(_))
        ));
    }
}
