//! TOML configuration for link issuance and the server.
//!
//! ```toml
//! [links]
//! base_url = "https://immersion.example"
//! short_days = 7
//! long_days = 31
//!
//! [server]
//! port = 3400
//! ```

use std::path::Path;

use serde::Deserialize;

use convene_links::LinkConfig;

/// Top-level config file shape.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub links: LinksSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinksSection {
    pub base_url: String,
    pub short_days: i64,
    pub long_days: i64,
}

impl Default for LinksSection {
    fn default() -> Self {
        let defaults = LinkConfig::default();
        LinksSection {
            base_url: defaults.base_url,
            short_days: defaults.short_days,
            long_days: defaults.long_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection { port: 3400 }
    }
}

impl Config {
    /// Load from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        toml::from_str(&contents)
            .map_err(|e| format!("error parsing config '{}': {}", path.display(), e))
    }

    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            base_url: self.links.base_url.clone(),
            short_days: self.links.short_days,
            long_days: self.links.long_days,
        }
    }
}
