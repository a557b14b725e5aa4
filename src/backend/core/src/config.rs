//! Configuration management.
//!
//! Sources are layered: an optional file, then `TESSERA__`-prefixed
//! environment variables (`TESSERA__AUTH__JWT_SECRET`, `TESSERA__SERVER__PORT`).

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::error::{ErrorCode, Result, TesseraError};
use crate::telemetry::{LoggingConfig, MetricsConfig};

const ENV_PREFIX: &str = "TESSERA";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential issuing and verification
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing credentials
    #[serde(default)]
    pub jwt_secret: String,

    /// Expected and emitted `iss` claim
    #[serde(default)]
    pub issuer: Option<String>,

    /// Credential lifetime, e.g. "1h" or "30m". Bounds ACL staleness.
    #[serde(default = "default_token_lifetime", with = "humantime_serde")]
    pub token_lifetime: Duration,

    /// Clock skew tolerated on `exp`
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    /// Paths served without a credential; a trailing `*` matches a prefix
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// JSON role administration seed backing credential issue
    #[serde(default)]
    pub directory_file: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: None,
            token_lifetime: default_token_lifetime(),
            leeway_secs: default_leeway_secs(),
            public_paths: default_public_paths(),
            directory_file: None,
        }
    }
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("token_lifetime", &self.token_lifetime)
            .field("leeway_secs", &self.leeway_secs)
            .field("public_paths", &self.public_paths)
            .field("directory_file", &self.directory_file)
            .finish()
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_token_lifetime() -> Duration { Duration::from_secs(60 * 60) }
fn default_leeway_secs() -> u64 { 30 }
fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/metrics".to_string()]
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment())
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with the environment layered on top.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(TesseraError::new(
                ErrorCode::InvalidConfiguration,
                "auth.jwt_secret must be set",
            ));
        }
        if self.auth.token_lifetime.is_zero() {
            return Err(TesseraError::new(
                ErrorCode::InvalidConfiguration,
                "auth.token_lifetime must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("auth.public_paths")
        .try_parsing(true)
}
