use serde::{Deserialize, Serialize};

/// Protocol name carried by DCC validation (ticketing) QR codes
pub const DCC_VALIDATION_PROTOCOL: &str = "DCCVALIDATION";

/// Booking-system check-in request decoded from a ticketing QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketingCheckIn {
    pub protocol: String,
    pub protocol_version: String,
    pub service_identity: String,
    pub privacy_url: String,
    pub token: String,
    pub consent: String,
    pub subject: String,
    pub service_provider: String,
}

/// Request to import a green certificate from its QR text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimGreenCertificateModel {
    pub qr_code: String,
}

/// Result bundle handed back by the model-fetch step
///
/// Either payload may be missing; when both are, the scan is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFetchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_green_certificate: Option<ClaimGreenCertificateModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_check_in: Option<TicketingCheckIn>,
}

impl ModelFetchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn claim(model: ClaimGreenCertificateModel) -> Self {
        Self {
            claim_green_certificate: Some(model),
            booking_check_in: None,
        }
    }

    pub fn check_in(check_in: TicketingCheckIn) -> Self {
        Self {
            claim_green_certificate: None,
            booking_check_in: Some(check_in),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.claim_green_certificate.is_none() && self.booking_check_in.is_none()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_check_in() -> TicketingCheckIn {
        TicketingCheckIn {
            protocol: DCC_VALIDATION_PROTOCOL.to_string(),
            protocol_version: "1.0.0".to_string(),
            service_identity: "https://booking.example/identity".to_string(),
            privacy_url: "https://booking.example/privacy".to_string(),
            token: "eyJ0eXAiOiJKV1QifQ.e30.c2ln".to_string(),
            consent: "Please confirm to start the DCC exchange flow".to_string(),
            subject: "6b1e2c4a-0b8f-4c2e-8a37-ff0d2a8bb7f4".to_string(),
            service_provider: "Booking Demo".to_string(),
        }
    }

    #[test]
    fn test_check_in_wire_format() {
        let json = r#"{
            "protocol": "DCCVALIDATION",
            "protocolVersion": "1.0.0",
            "serviceIdentity": "https://booking.example/identity",
            "privacyUrl": "https://booking.example/privacy",
            "token": "eyJ0eXAiOiJKV1QifQ.e30.c2ln",
            "consent": "Please confirm to start the DCC exchange flow",
            "subject": "6b1e2c4a-0b8f-4c2e-8a37-ff0d2a8bb7f4",
            "serviceProvider": "Booking Demo"
        }"#;

        let parsed: TicketingCheckIn = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, sample_check_in());
    }

    #[test]
    fn test_fetch_result_constructors() {
        assert!(ModelFetchResult::empty().is_empty());
        assert!(!ModelFetchResult::check_in(sample_check_in()).is_empty());

        let claim = ModelFetchResult::claim(ClaimGreenCertificateModel {
            qr_code: "HC1:NCF".to_string(),
        });
        assert!(claim.booking_check_in.is_none());

        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["claimGreenCertificate"]["qrCode"], "HC1:NCF");
        assert!(json.get("bookingCheckIn").is_none());
    }
}
