pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
pub(crate) use crate::config::interceptor::{InterceptorConfig, InterceptorMode};
pub(crate) use crate::config::signing::SigningConfig;
use config::{Config as ConfigCrate, ConfigError};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use token_engine::IdentityProviderConfig;

pub mod cache;
pub mod interceptor;
pub mod signing;

/// Configuration file looked up in the working directory, extension optional
const CONFIG_FILE: &str = "auth-server";

/// Main configuration structure for the auth server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// The port the server will listen to (default: 8180)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deadline for a single collaborator call in milliseconds (default: 5000)
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,

    /// Token signing configuration
    #[serde(default)]
    pub signing: SigningConfig,

    /// Inbound credential interceptor configuration
    #[serde(default)]
    pub interceptor: InterceptorConfig,

    /// Granted scope cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Repository configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// External identity providers accepted by `/token/external/{provider}`
    #[serde(default)]
    pub identity_providers: Vec<IdentityProviderConfig>,
}

/// Repository configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// JSON file with users, applications and grants loaded at startup
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    8180
}

fn default_collaborator_timeout_ms() -> u64 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            signing: SigningConfig::default(),
            interceptor: InterceptorConfig::default(),
            cache: CacheConfig::default(),
            store: StoreConfig::default(),
            identity_providers: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load the configuration from `auth-server.toml` (optional) and the
    /// process environment. Environment variables win over the file.
    pub fn new() -> Result<Self, String> {
        Self::from_sources(Some(CONFIG_FILE), None)
    }

    /// Load from an optional file and an explicit environment map.
    ///
    /// `env = None` reads the process environment. Variables use the `AUTH_`
    /// prefix and `__` between nested keys, e.g. `AUTH_SIGNING__ISSUER`.
    pub fn from_sources(
        file: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, String> {
        let mut builder = ConfigCrate::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("AUTH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}
