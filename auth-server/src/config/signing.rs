//! Token signing configuration

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use token_engine::{AuthError, JwtSigner, SigningKey, SigningProfile};

/// Token signing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SigningConfig {
    /// "symmetric" (HS256, default) or "key-pair" (RS256)
    #[serde(default = "default_profile")]
    pub profile: SigningProfile,

    /// Base64 encoded shared secret for the symmetric profile
    #[serde(default)]
    pub secret: String,

    /// PEM file with the RSA private key for the key-pair profile
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// PEM file with the RSA public key for the key-pair profile
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,

    /// Value of the `iss` claim (default: "auth-server")
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Value of the `aud` claim, checked on verification when set
    #[serde(default)]
    pub audience: Option<String>,

    /// Access token lifetime in seconds (default: 3600)
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: i64,

    /// Refresh token lifetime in seconds (default: 30 days)
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: i64,

    /// Clock skew tolerated when checking `exp` (default: 30)
    #[serde(default = "default_leeway")]
    pub leeway: u64,
}

/// Longest accepted access token lifetime, one day
pub const MAX_ACCESS_TOKEN_TTL: i64 = 24 * 3600;

/// Longest accepted refresh token lifetime, one year
pub const MAX_REFRESH_TOKEN_TTL: i64 = 365 * 24 * 3600;

fn default_profile() -> SigningProfile {
    SigningProfile::Symmetric
}

fn default_issuer() -> String {
    "auth-server".to_string()
}

fn default_access_token_ttl() -> i64 {
    3600
}

fn default_refresh_token_ttl() -> i64 {
    30 * 24 * 3600
}

fn default_leeway() -> u64 {
    30
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            secret: String::new(),
            private_key_path: None,
            public_key_path: None,
            issuer: default_issuer(),
            audience: None,
            access_token_ttl: default_access_token_ttl(),
            refresh_token_ttl: default_refresh_token_ttl(),
            leeway: default_leeway(),
        }
    }
}

impl SigningConfig {
    /// Build the signer for the configured profile. Missing key material is a
    /// configuration error.
    pub fn build_signer(&self) -> Result<JwtSigner, AuthError> {
        check_ttl("access_token_ttl", self.access_token_ttl, MAX_ACCESS_TOKEN_TTL)?;
        check_ttl("refresh_token_ttl", self.refresh_token_ttl, MAX_REFRESH_TOKEN_TTL)?;

        let audience = self.audience.as_deref();
        match self.profile {
            SigningProfile::Symmetric => {
                let secret = STANDARD.decode(self.secret.trim()).map_err(|e| {
                    AuthError::Configuration(format!("signing secret is not valid base64: {e}"))
                })?;
                info!("Signing tokens with the symmetric profile");
                JwtSigner::new(
                    SigningKey::Secret(&secret),
                    &self.issuer,
                    audience,
                    self.leeway,
                )
            }
            SigningProfile::KeyPair => {
                let private_pem = read_pem(self.private_key_path.as_deref(), "private")?;
                let public_pem = read_pem(self.public_key_path.as_deref(), "public")?;
                info!("Signing tokens with the key-pair profile");
                JwtSigner::new(
                    SigningKey::RsaPem {
                        private_pem: &private_pem,
                        public_pem: &public_pem,
                    },
                    &self.issuer,
                    audience,
                    self.leeway,
                )
            }
        }
    }
}

fn check_ttl(name: &str, ttl: i64, max: i64) -> Result<(), AuthError> {
    if ttl <= 0 || ttl > max {
        return Err(AuthError::Configuration(format!(
            "{name} must be between 1 and {max} seconds, got {ttl}"
        )));
    }
    Ok(())
}

fn read_pem(path: Option<&Path>, which: &str) -> Result<Vec<u8>, AuthError> {
    let path = path.ok_or_else(|| {
        AuthError::Configuration(format!("key-pair profile requires a {which} key path"))
    })?;
    std::fs::read(path).map_err(|e| {
        AuthError::Configuration(format!(
            "failed to read {which} key {}: {e}",
            path.display()
        ))
    })
}
