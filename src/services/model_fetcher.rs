use crate::models::check_in::{
    ClaimGreenCertificateModel, ModelFetchResult, TicketingCheckIn, DCC_VALIDATION_PROTOCOL,
};

/// Prefix of base45-encoded health certificates
pub const HEALTH_CERTIFICATE_PREFIX: &str = "HC1:";

/// Resolves scanned text into the model the next screen needs
pub trait ModelFetcher: Send + Sync {
    fn fetch(&self, qr_code_text: &str) -> ModelFetchResult;
}

/// Classifies scanned QR text without network access
///
/// `HC1:` codes become a claim request, DCC validation JSON a check-in.
/// Anything else yields an empty result.
#[derive(Debug, Clone, Default)]
pub struct QrModelFetcher;

impl ModelFetcher for QrModelFetcher {
    #[tracing::instrument(skip_all, fields(text_len = qr_code_text.len()))]
    fn fetch(&self, qr_code_text: &str) -> ModelFetchResult {
        if qr_code_text.starts_with(HEALTH_CERTIFICATE_PREFIX) {
            tracing::debug!("Scanned health certificate");
            return ModelFetchResult::claim(ClaimGreenCertificateModel {
                qr_code: qr_code_text.to_string(),
            });
        }

        match serde_json::from_str::<TicketingCheckIn>(qr_code_text) {
            Ok(check_in) if check_in.protocol == DCC_VALIDATION_PROTOCOL => {
                tracing::info!(
                    service_identity = %check_in.service_identity,
                    service_provider = %check_in.service_provider,
                    "Scanned ticketing check-in"
                );
                ModelFetchResult::check_in(check_in)
            }
            Ok(check_in) => {
                tracing::warn!(protocol = %check_in.protocol, "Unsupported ticketing protocol");
                ModelFetchResult::empty()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Scanned code is not a supported model");
                ModelFetchResult::empty()
            }
        }
    }
}
