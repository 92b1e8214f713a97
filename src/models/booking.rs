use base64::{engine::general_purpose::STANDARD, Engine};
use ring::error::{KeyRejected, Unspecified};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::models::access_token::AccessTokenContainer;
use crate::models::validation_identity::ValidationServiceIdentity;

const KEY_ALGORITHM: &str = "ECDSA_P256_SHA256";

/// DER prefix turning an uncompressed P-256 point into a SubjectPublicKeyInfo
const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a,
    0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

#[derive(thiserror::Error, Debug)]
pub enum KeyPairError {
    #[error("Key generation failed")]
    GenerationFailed,

    #[error("Key rejected: {0}")]
    Rejected(String),

    #[error("Unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid key encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Signing failed")]
    SigningFailed,
}

impl From<KeyRejected> for KeyPairError {
    fn from(e: KeyRejected) -> Self {
        KeyPairError::Rejected(e.to_string())
    }
}

/// Per-session ECDSA P-256 key pair
///
/// The private key is kept as base64 PKCS#8 inside a [`Secret`] so it never
/// shows up in `Debug` output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "KeyPairParcel", into = "KeyPairParcel")]
pub struct WalletKeyPair {
    pkcs8: Secret<String>,
    public_key: Vec<u8>,
}

#[derive(Clone, Serialize, Deserialize)]
struct KeyPairParcel {
    algorithm: String,
    pkcs8: String,
}

impl WalletKeyPair {
    pub fn generate() -> Result<Self, KeyPairError> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map_err(|_: Unspecified| KeyPairError::GenerationFailed)?;

        Self::from_pkcs8(pkcs8.as_ref())
    }

    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, KeyPairError> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)?;

        Ok(Self {
            pkcs8: Secret::new(STANDARD.encode(pkcs8)),
            public_key: key_pair.public_key().as_ref().to_vec(),
        })
    }

    /// Uncompressed SEC1 public point
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Public key as DER SubjectPublicKeyInfo
    pub fn public_key_der(&self) -> Vec<u8> {
        let mut der = Vec::with_capacity(P256_SPKI_PREFIX.len() + self.public_key.len());
        der.extend_from_slice(&P256_SPKI_PREFIX);
        der.extend_from_slice(&self.public_key);
        der
    }

    /// Base64 SubjectPublicKeyInfo, the form ticketing services expect
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key_der())
    }

    /// Short hex fingerprint of the public key, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = ring::digest::digest(&ring::digest::SHA256, &self.public_key);
        hex::encode(&digest.as_ref()[..8])
    }

    /// Signs `message` with ECDSA P-256 / SHA-256 (ASN.1 DER signature)
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyPairError> {
        let rng = SystemRandom::new();
        let pkcs8 = STANDARD.decode(self.pkcs8.expose_secret())?;
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &pkcs8, &rng)?;

        let signature = key_pair
            .sign(&rng, message)
            .map_err(|_| KeyPairError::SigningFailed)?;

        Ok(signature.as_ref().to_vec())
    }
}

impl PartialEq for WalletKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
            && self.pkcs8.expose_secret() == other.pkcs8.expose_secret()
    }
}

impl Eq for WalletKeyPair {}

impl From<WalletKeyPair> for KeyPairParcel {
    fn from(key_pair: WalletKeyPair) -> Self {
        Self {
            algorithm: KEY_ALGORITHM.to_string(),
            pkcs8: key_pair.pkcs8.expose_secret().clone(),
        }
    }
}

impl TryFrom<KeyPairParcel> for WalletKeyPair {
    type Error = KeyPairError;

    fn try_from(parcel: KeyPairParcel) -> Result<Self, Self::Error> {
        if parcel.algorithm != KEY_ALGORITHM {
            return Err(KeyPairError::UnsupportedAlgorithm(parcel.algorithm));
        }

        let pkcs8 = STANDARD.decode(&parcel.pkcs8)?;
        Self::from_pkcs8(&pkcs8)
    }
}

/// Key material and identity context of one booking flow
///
/// Immutable once built: there are no setters, so replacing any part means
/// constructing a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPortalEncryptionData {
    key_pair: WalletKeyPair,
    access_token_container: AccessTokenContainer,
    validation_service_identity: ValidationServiceIdentity,
}

impl BookingPortalEncryptionData {
    pub fn new(
        key_pair: WalletKeyPair,
        access_token_container: AccessTokenContainer,
        validation_service_identity: ValidationServiceIdentity,
    ) -> Self {
        Self {
            key_pair,
            access_token_container,
            validation_service_identity,
        }
    }

    pub fn key_pair(&self) -> &WalletKeyPair {
        &self.key_pair
    }

    pub fn access_token_container(&self) -> &AccessTokenContainer {
        &self.access_token_container
    }

    pub fn validation_service_identity(&self) -> &ValidationServiceIdentity {
        &self.validation_service_identity
    }

    pub fn standardized_name(&self) -> String {
        self.access_token_container.standardized_name()
    }
}
