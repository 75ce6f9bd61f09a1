//! convene-links: capability tokens and short links.
//!
//! Conventions are signed and reviewed by people who mostly do not have
//! accounts. They act through magic links: signed, expiring, role- and
//! email-scoped tokens embedded in URLs sent over email or SMS. SMS
//! cannot carry a full signed token, so a short-link indirection maps an
//! opaque id to the long URL.
//!
//! - [`CapabilityTokenIssuer`] -- mint and verify Ed25519-signed tokens
//! - [`LinkLifetime`] / [`LinkConfig`] -- named durations resolved
//!   against configuration
//! - [`email_hash`] -- the one-way hash used to match a token against a
//!   set of admissible addresses without comparing raw strings
//! - [`ShortLinkIssuer`] -- persist and resolve short ids

pub mod email_hash;
pub mod error;
pub mod keys;
pub mod lifetime;
pub mod shortlink;
pub mod token;

pub use email_hash::email_hash;
pub use error::LinkError;
pub use keys::{decode_signing_key, decode_verifying_key, generate_keypair, Keypair};
pub use lifetime::{LinkConfig, LinkLifetime};
pub use shortlink::ShortLinkIssuer;
pub use token::{CapabilityTokenIssuer, TokenPayload, TokenScope};
