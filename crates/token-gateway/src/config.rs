//! Token Gateway configuration.
//!
//! Configuration is loaded from environment variables once at startup and
//! passed into every component. Missing signing credentials are fatal: the
//! process refuses to start rather than failing per request. The API secret
//! is held as a [`SecretString`] and redacted in Debug output.

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default LiveKit server URL (clients connect here over WebSocket).
pub const DEFAULT_SERVER_URL: &str = "wss://your-project.livekit.cloud";

/// Default device (room) list.
pub const DEFAULT_DEVICES: &str = "Drone-RTC-01";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default upstream room-list timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 5;

/// Maximum upstream room-list timeout in seconds.
pub const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

/// Default client token TTL in seconds (6 hours, LiveKit's default).
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 21_600;

/// Minimum client token TTL in seconds.
pub const MIN_TOKEN_TTL_SECONDS: u64 = 60;

/// Maximum client token TTL in seconds (24 hours).
pub const MAX_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Maximum shutdown drain period in seconds.
pub const MAX_DRAIN_SECONDS: u64 = 300;

/// Token Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// LiveKit API key (token issuer, `iss` claim).
    pub api_key: String,

    /// LiveKit API secret (HS256 signing key).
    pub api_secret: SecretString,

    /// LiveKit server URL returned to clients (e.g. "wss://x.livekit.cloud").
    pub server_url: String,

    /// Configured device/room names, order preserved.
    pub devices: Vec<String>,

    /// Server bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// Directory served under `/static`.
    pub static_dir: String,

    /// Directory holding the `index.html` and `test.html` pages.
    pub templates_dir: String,

    /// Bound on the upstream room-list query during admission checks.
    pub upstream_timeout: Duration,

    /// Lifetime of issued client tokens.
    pub token_ttl: Duration,

    /// Wait between the shutdown signal and server exit (default: none).
    pub drain_period: Duration,
}

/// Custom Debug implementation that redacts the API secret.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("devices", &self.devices)
            .field("bind_address", &self.bind_address)
            .field("static_dir", &self.static_dir)
            .field("templates_dir", &self.templates_dir)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("token_ttl", &self.token_ttl)
            .field("drain_period", &self.drain_period)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid upstream timeout configuration: {0}")]
    InvalidUpstreamTimeout(String),

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainPeriod(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = required_non_empty(vars, "LIVEKIT_API_KEY")?;
        let api_secret = SecretString::from(required_non_empty(vars, "LIVEKIT_API_SECRET")?);

        let server_url = vars
            .get("LIVEKIT_SERVER_URL")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let devices = vars
            .get("DEVICES")
            .map(String::as_str)
            .map(parse_devices)
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| parse_devices(DEFAULT_DEVICES));

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let static_dir = vars
            .get("STATIC_DIR")
            .cloned()
            .unwrap_or_else(|| "static".to_string());

        let templates_dir = vars
            .get("TEMPLATES_DIR")
            .cloned()
            .unwrap_or_else(|| "templates".to_string());

        let upstream_timeout_secs =
            if let Some(value_str) = vars.get("UPSTREAM_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidUpstreamTimeout(
                        "UPSTREAM_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                if value > MAX_UPSTREAM_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must not exceed {} seconds, got {}",
                        MAX_UPSTREAM_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_UPSTREAM_TIMEOUT_SECONDS
            };

        let token_ttl_secs = if let Some(value_str) = vars.get("TOKEN_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if !(MIN_TOKEN_TTL_SECONDS..=MAX_TOKEN_TTL_SECONDS).contains(&value) {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be between {} and {}, got {}",
                    MIN_TOKEN_TTL_SECONDS, MAX_TOKEN_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_TOKEN_TTL_SECONDS
        };

        let drain_secs = if let Some(value_str) = vars.get("GATEWAY_DRAIN_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainPeriod(format!(
                    "GATEWAY_DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_DRAIN_SECONDS {
                return Err(ConfigError::InvalidDrainPeriod(format!(
                    "GATEWAY_DRAIN_SECONDS must not exceed {} seconds, got {}",
                    MAX_DRAIN_SECONDS, value
                )));
            }

            value
        } else {
            0
        };

        Ok(Config {
            api_key,
            api_secret,
            server_url,
            devices,
            bind_address,
            static_dir,
            templates_dir,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            token_ttl: Duration::from_secs(token_ttl_secs),
            drain_period: Duration::from_secs(drain_secs),
        })
    }

    /// Room used when a token request omits `room`.
    pub fn default_room(&self) -> &str {
        self.devices
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_DEVICES)
    }

    /// HTTP base URL of the upstream room service API.
    pub fn upstream_http_url(&self) -> String {
        upstream_http_url(&self.server_url)
    }
}

/// Split a comma-separated device list, trimming whitespace.
///
/// Order and case are preserved. Blank entries are dropped: a blank device
/// would name an empty room, which the token endpoints reject.
pub fn parse_devices(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map the client-facing WebSocket URL to the HTTP API base URL.
pub fn upstream_http_url(server_url: &str) -> String {
    let mapped = if let Some(rest) = server_url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = server_url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        server_url.to_string()
    };

    mapped.trim_end_matches('/').to_string()
}

fn required_non_empty(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}
