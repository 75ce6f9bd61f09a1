//! Ed25519 keypair generation and encoding.
//!
//! Keys are stored as base64-encoded 32-byte values: `<prefix>.secret`
//! for the seed, `<prefix>.pub` for the verifying key. File handling
//! lives in the CLI; this module only generates and decodes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};

use crate::error::LinkError;

/// A freshly generated signing keypair, base64-encoded.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub secret_b64: String,
    pub public_b64: String,
}

/// Generate an Ed25519 keypair from the OS RNG.
pub fn generate_keypair() -> Keypair {
    let mut rng = rand::rngs::OsRng;
    let signing_key = SigningKey::generate(&mut rng);
    let verifying_key = signing_key.verifying_key();
    Keypair {
        secret_b64: BASE64.encode(signing_key.to_bytes()),
        public_b64: BASE64.encode(verifying_key.to_bytes()),
    }
}

/// Decode a base64-encoded 32-byte Ed25519 seed.
pub fn decode_signing_key(secret_b64: &str) -> Result<SigningKey, LinkError> {
    let bytes = BASE64
        .decode(secret_b64.trim())
        .map_err(|_| LinkError::InvalidToken)?;
    let seed: [u8; 32] = bytes.try_into().map_err(|_| LinkError::InvalidToken)?;
    Ok(SigningKey::from_bytes(&seed))
}

/// Decode a base64-encoded 32-byte Ed25519 verifying key.
pub fn decode_verifying_key(public_b64: &str) -> Result<VerifyingKey, LinkError> {
    let bytes = BASE64
        .decode(public_b64.trim())
        .map_err(|_| LinkError::InvalidToken)?;
    let key: [u8; 32] = bytes.try_into().map_err(|_| LinkError::InvalidToken)?;
    VerifyingKey::from_bytes(&key).map_err(|_| LinkError::InvalidToken)
}
