use ring::aead::{
    Aad, BoundKey, Nonce, NonceSequence, OpeningKey, SealingKey, UnboundKey, AES_256_GCM,
};
use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{de::DeserializeOwned, Serialize};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Associated data binding sealed parcels to this codec version
const PARCEL_AAD: &[u8] = b"dgca-wallet-parcel-v1";

#[derive(thiserror::Error, Debug)]
pub enum ParcelError {
    #[error("Parcel encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Sealing failed: {0}")]
    SealFailed(String),

    #[error("Opening failed: {0}")]
    OpenFailed(String),

    #[error("Invalid key length (expected 32 bytes)")]
    InvalidKeyLength,

    #[error("Invalid sealed parcel format")]
    InvalidFormat,
}

impl From<Unspecified> for ParcelError {
    fn from(_: Unspecified) -> Self {
        ParcelError::SealFailed("Cryptographic operation failed".to_string())
    }
}

struct SingleNonce {
    nonce: [u8; NONCE_LEN],
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, Unspecified> {
        Nonce::try_assume_unique_for_key(&self.nonce)
    }
}

/// Encodes a carrier for crossing a screen or process boundary
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ParcelError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ParcelError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes and encrypts a carrier holding key material with AES-256-GCM
///
/// Format: [nonce (12 bytes)][ciphertext + auth tag]
#[tracing::instrument(skip_all)]
pub fn seal<T: Serialize>(value: &T, key: &[u8]) -> Result<Vec<u8>, ParcelError> {
    if key.len() != KEY_LEN {
        return Err(ParcelError::InvalidKeyLength);
    }

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| ParcelError::SealFailed("Failed to generate nonce".to_string()))?;

    let unbound_key = UnboundKey::new(&AES_256_GCM, key)?;
    let mut sealing_key = SealingKey::new(unbound_key, SingleNonce { nonce: nonce_bytes });

    let mut in_out = encode(value)?;
    sealing_key
        .seal_in_place_append_tag(Aad::from(PARCEL_AAD), &mut in_out)
        .map_err(|_| ParcelError::SealFailed("Sealing failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);

    tracing::debug!(sealed_len = sealed.len(), "Parcel sealed");

    Ok(sealed)
}

/// Decrypts and decodes a parcel produced by [`seal`]
#[tracing::instrument(skip_all)]
pub fn open<T: DeserializeOwned>(sealed: &[u8], key: &[u8]) -> Result<T, ParcelError> {
    if key.len() != KEY_LEN {
        return Err(ParcelError::InvalidKeyLength);
    }

    if sealed.len() < NONCE_LEN {
        return Err(ParcelError::InvalidFormat);
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&sealed[..NONCE_LEN]);

    let unbound_key = UnboundKey::new(&AES_256_GCM, key)?;
    let mut opening_key = OpeningKey::new(unbound_key, SingleNonce { nonce: nonce_bytes });

    let mut in_out = sealed[NONCE_LEN..].to_vec();
    let plaintext = opening_key
        .open_in_place(Aad::from(PARCEL_AAD), &mut in_out)
        .map_err(|_| ParcelError::OpenFailed("Authentication failed".to_string()))?;

    decode(plaintext)
}

/// Derives the 32-byte parcel key from a configured secret via SHA-256
pub fn derive_key(key_string: &str) -> [u8; KEY_LEN] {
    use ring::digest;

    let hash = digest::digest(&digest::SHA256, key_string.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(hash.as_ref());
    key
}
