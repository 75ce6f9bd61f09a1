//! Signed capability tokens.
//!
//! A token is `base64url(payload_json) + "." + base64url(signature)`,
//! with a detached Ed25519 signature over the exact payload bytes. No
//! header section: the algorithm is fixed and versioning lives inside
//! the payload.
//!
//! Verification order: decode, check signature, check expiry. An
//! authentic-but-expired token is a distinct outcome so callers can
//! offer to renew it; anything else collapses into `InvalidToken`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use convene_core::Role;

use crate::email_hash::email_hash;
use crate::error::LinkError;
use crate::lifetime::{LinkConfig, LinkLifetime};

/// Payload version minted by this module.
const TOKEN_VERSION: u8 = 1;

/// What a token is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TokenScope {
    /// Bound to one convention, one role, one email.
    Convention {
        convention_id: String,
        role: Role,
        /// Literal address, needed verbatim by notification composition.
        email: String,
        /// One-way hash of `email`, for matching against a different set
        /// of admissible addresses at verification time.
        email_hash: String,
    },
    /// Bound to an authenticated account. Verification re-loads the
    /// user by id; no email hash applies.
    ConnectedUser { user_id: String },
}

/// The signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub version: u8,
    #[serde(flatten)]
    pub scope: TokenScope,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Front-end route the link lands on, e.g. `"signer-convention"`.
    pub target_route: String,
}

/// Mints and verifies capability tokens, and renders them as URLs.
pub struct CapabilityTokenIssuer {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    config: LinkConfig,
}

impl CapabilityTokenIssuer {
    pub fn new(signing_key: SigningKey, config: LinkConfig) -> Self {
        let verifying_key = signing_key.verifying_key();
        CapabilityTokenIssuer {
            signing_key,
            verifying_key,
            config,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Mint a convention-scoped token.
    pub fn issue_for_convention(
        &self,
        convention_id: &str,
        role: Role,
        email: &str,
        target_route: &str,
        lifetime: LinkLifetime,
        now: OffsetDateTime,
    ) -> String {
        let payload = TokenPayload {
            version: TOKEN_VERSION,
            scope: TokenScope::Convention {
                convention_id: convention_id.to_string(),
                role,
                email: email.to_string(),
                email_hash: email_hash(email),
            },
            issued_at: now,
            expires_at: lifetime.expiry(&self.config, now),
            target_route: target_route.to_string(),
        };
        self.encode(&payload)
    }

    /// Mint a connected-user-scoped token.
    pub fn issue_for_user(
        &self,
        user_id: &str,
        target_route: &str,
        lifetime: LinkLifetime,
        now: OffsetDateTime,
    ) -> String {
        let payload = TokenPayload {
            version: TOKEN_VERSION,
            scope: TokenScope::ConnectedUser {
                user_id: user_id.to_string(),
            },
            issued_at: now,
            expires_at: lifetime.expiry(&self.config, now),
            target_route: target_route.to_string(),
        };
        self.encode(&payload)
    }

    /// The full URL a token is delivered as.
    pub fn link_url(&self, target_route: &str, token: &str) -> String {
        format!("{}/{}?jwt={}", self.config.base_url, target_route, token)
    }

    /// Decode and verify a token at `now`.
    pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<TokenPayload, LinkError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(LinkError::InvalidToken)?;
        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| LinkError::InvalidToken)?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| LinkError::InvalidToken)?;
        let signature =
            Signature::from_slice(&signature_bytes).map_err(|_| LinkError::InvalidToken)?;
        self.verifying_key
            .verify(&payload_bytes, &signature)
            .map_err(|_| LinkError::InvalidToken)?;

        let payload: TokenPayload =
            serde_json::from_slice(&payload_bytes).map_err(|_| LinkError::InvalidToken)?;
        if payload.expires_at < now {
            return Err(LinkError::Expired {
                expired_at: payload.expires_at,
            });
        }
        Ok(payload)
    }

    fn encode(&self, payload: &TokenPayload) -> String {
        // Serialization of a struct with only string/enum/timestamp
        // fields cannot fail.
        let payload_bytes = serde_json::to_vec(payload).unwrap_or_default();
        let signature = self.signing_key.sign(&payload_bytes);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload_bytes),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }
}

impl TokenPayload {
    /// Whether this token's email hash matches any admissible address.
    /// Always false for connected-user tokens.
    pub fn email_matches_any(&self, admissible: &[&str]) -> bool {
        match &self.scope {
            TokenScope::Convention { email_hash, .. } => {
                crate::email_hash::matches_any(email_hash, admissible)
            }
            TokenScope::ConnectedUser { .. } => false,
        }
    }
}
