use std::env;

/// Environment variable holding the upstream bearer token.
pub const API_KEY_VAR: &str = "POE_API_KEY";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_BASE_URL: &str = "https://api.poe.com/v1";
const DEFAULT_MODEL: &str = "Claude-Sonnet-4.5";
const DEFAULT_PROFILE_PATH: &str = "profile.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub profile_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration through an injectable lookup so tests can
    /// substitute values without touching process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: lookup("FOLIO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            base_url: lookup("FOLIO_UPSTREAM_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("FOLIO_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: lookup(API_KEY_VAR).filter(|key| !key.is_empty()),
            profile_path: lookup("FOLIO_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string()),
        }
    }
}
