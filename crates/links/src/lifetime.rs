//! Named link lifetimes resolved against configuration.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// How long a minted link stays valid.
///
/// `Short` and `Long` resolve against the caller's configured durations;
/// `TwoDays` is fixed regardless of configuration (used for immediate
/// actions like renewing an expired link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkLifetime {
    Short,
    Long,
    TwoDays,
}

/// Link issuance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Base URL links are built under, without a trailing slash.
    pub base_url: String,
    /// Days a `Short` link lives.
    pub short_days: i64,
    /// Days a `Long` link lives.
    pub long_days: i64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            base_url: "https://immersion.example".to_string(),
            short_days: 7,
            long_days: 31,
        }
    }
}

impl LinkLifetime {
    /// The expiry instant for a link minted at `now`.
    pub fn expiry(self, config: &LinkConfig, now: OffsetDateTime) -> OffsetDateTime {
        let days = match self {
            LinkLifetime::Short => config.short_days,
            LinkLifetime::Long => config.long_days,
            LinkLifetime::TwoDays => 2,
        };
        now + Duration::days(days)
    }
}
