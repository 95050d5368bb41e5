//! Verification of identity assertions issued by external identity providers.
//!
//! Verifiers are built once at startup from configuration and injected into
//! whoever needs them. A provider with incomplete configuration is rejected
//! while building, never lazily on the first request.

use crate::error::AuthError;
use crate::model::IdentityClaims;
use crate::token::map_jwt_error;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Static configuration of one identity provider
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IdentityProviderConfig {
    /// Provider key used in routes, e.g. `google`
    pub name: String,

    /// Expected `iss` of the provider's id tokens
    #[serde(default)]
    pub issuer: String,

    /// Expected `aud` (our client id at the provider)
    #[serde(default)]
    pub audience: String,

    /// Shared secret for HS256 signed assertions
    #[serde(default)]
    pub secret: Option<String>,

    /// PEM encoded RSA public key for RS256 signed assertions
    #[serde(default)]
    pub public_key_pem: Option<String>,

    /// Clock skew tolerance in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_leeway() -> u64 {
    60
}

/// A provider-specific verifier of id tokens
pub trait IdentityVerifier: Send + Sync {
    fn provider(&self) -> &str;

    /// Whether the id token is authentic and current
    fn validate(&self, id_token: &str) -> bool;

    fn decode(&self, id_token: &str) -> Result<IdentityClaims, AuthError>;
}

#[derive(Debug, Deserialize)]
struct IdTokenPayload {
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

/// [`IdentityVerifier`] for JWT id tokens signed with a locally held key
pub struct JwtIdentityVerifier {
    provider: String,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(config: &IdentityProviderConfig) -> Result<Self, AuthError> {
        let provider = config.name.trim();
        if provider.is_empty() {
            return Err(AuthError::Configuration(
                "identity provider without a name".to_string(),
            ));
        }
        if config.audience.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "identity provider '{provider}' has no audience configured"
            )));
        }
        if config.issuer.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "identity provider '{provider}' has no issuer configured"
            )));
        }
        Url::parse(&config.issuer).map_err(|e| {
            AuthError::Configuration(format!(
                "identity provider '{provider}' has an invalid issuer URL: {e}"
            ))
        })?;

        let (algorithm, decoding_key) = match (&config.secret, &config.public_key_pem) {
            (Some(_), Some(_)) => {
                return Err(AuthError::Configuration(format!(
                    "identity provider '{provider}' has both a secret and a public key"
                )));
            }
            (Some(secret), None) if !secret.is_empty() => {
                (Algorithm::HS256, DecodingKey::from_secret(secret.as_bytes()))
            }
            (None, Some(pem)) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AuthError::Configuration(format!(
                        "identity provider '{provider}' has an invalid public key: {e}"
                    ))
                })?;
                (Algorithm::RS256, key)
            }
            _ => {
                return Err(AuthError::Configuration(format!(
                    "identity provider '{provider}' has no verification key"
                )));
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.leeway = config.leeway_secs;

        Ok(Self {
            provider: provider.to_string(),
            decoding_key,
            validation,
        })
    }
}

impl fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtIdentityVerifier")
            .field("provider", &self.provider)
            .finish()
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn validate(&self, id_token: &str) -> bool {
        match self.decode(id_token) {
            Ok(_) => true,
            Err(e) => {
                debug!("{} id token rejected: {}", self.provider, e);
                false
            }
        }
    }

    fn decode(&self, id_token: &str) -> Result<IdentityClaims, AuthError> {
        let payload = decode::<IdTokenPayload>(id_token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        if payload.email_verified == Some(false) {
            return Err(AuthError::Unauthenticated);
        }
        let email = payload
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AuthError::MalformedToken("id token carries no email".to_string()))?;

        Ok(IdentityClaims {
            email,
            given_name: payload.given_name,
            family_name: payload.family_name,
        })
    }
}

/// Immutable registry of identity verifiers keyed by provider name
#[derive(Clone, Default)]
pub struct IdentityVerifiers {
    verifiers: HashMap<String, Arc<dyn IdentityVerifier>>,
}

impl IdentityVerifiers {
    /// Build one verifier per configured provider, failing on the first bad one
    pub fn from_configs(configs: &[IdentityProviderConfig]) -> Result<Self, AuthError> {
        let mut verifiers: HashMap<String, Arc<dyn IdentityVerifier>> = HashMap::new();
        for config in configs {
            let verifier = JwtIdentityVerifier::new(config)?;
            let name = verifier.provider().to_string();
            if verifiers.insert(name.clone(), Arc::new(verifier)).is_some() {
                return Err(AuthError::Configuration(format!(
                    "identity provider '{name}' configured twice"
                )));
            }
            info!("Registered identity provider '{}'", name);
        }
        Ok(Self { verifiers })
    }

    pub fn get(&self, provider: &str) -> Option<&Arc<dyn IdentityVerifier>> {
        self.verifiers.get(provider)
    }

    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.verifiers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "google-test-secret-google-test-secret";

    fn google() -> IdentityProviderConfig {
        IdentityProviderConfig {
            name: "google".to_string(),
            issuer: "https://accounts.google.com".to_string(),
            audience: "our-client-id".to_string(),
            secret: Some(SECRET.to_string()),
            public_key_pem: None,
            leeway_secs: 0,
        }
    }

    fn id_token(payload: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn payload() -> serde_json::Value {
        json!({
            "iss": "https://accounts.google.com",
            "aud": "our-client-id",
            "exp": (Utc::now() + Duration::minutes(5)).timestamp(),
            "email": "ada@example.com",
            "email_verified": true,
            "given_name": "Ada",
            "family_name": "Lovelace",
        })
    }

    #[test]
    fn test_decode_valid_assertion() {
        let verifier = JwtIdentityVerifier::new(&google()).unwrap();
        let token = id_token(payload());
        assert!(verifier.validate(&token));
        let claims = verifier.decode(&token).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.given_name.as_deref(), Some("Ada"));
        assert_eq!(claims.family_name.as_deref(), Some("Lovelace"));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let verifier = JwtIdentityVerifier::new(&google()).unwrap();
        let mut payload = payload();
        payload["aud"] = json!("someone-else");
        assert!(!verifier.validate(&id_token(payload)));
    }

    #[test]
    fn test_unverified_email_rejected() {
        let verifier = JwtIdentityVerifier::new(&google()).unwrap();
        let mut payload = payload();
        payload["email_verified"] = json!(false);
        assert_eq!(
            verifier.decode(&id_token(payload)),
            Err(AuthError::Unauthenticated)
        );
    }

    #[test]
    fn test_missing_email_is_malformed() {
        let verifier = JwtIdentityVerifier::new(&google()).unwrap();
        let mut payload = payload();
        payload.as_object_mut().unwrap().remove("email");
        assert!(matches!(
            verifier.decode(&id_token(payload)),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_missing_audience_fails_at_construction() {
        let config = IdentityProviderConfig {
            audience: String::new(),
            ..google()
        };
        assert!(matches!(
            JwtIdentityVerifier::new(&config),
            Err(AuthError::Configuration(msg)) if msg.contains("audience")
        ));
    }

    #[test]
    fn test_missing_key_fails_at_construction() {
        let config = IdentityProviderConfig {
            secret: None,
            ..google()
        };
        assert!(matches!(
            JwtIdentityVerifier::new(&config),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_issuer_fails_at_construction() {
        let config = IdentityProviderConfig {
            issuer: "not a url".to_string(),
            ..google()
        };
        assert!(JwtIdentityVerifier::new(&config).is_err());
    }

    #[test]
    fn test_registry() {
        let apple = IdentityProviderConfig {
            name: "apple".to_string(),
            issuer: "https://appleid.apple.com".to_string(),
            ..google()
        };
        let registry = IdentityVerifiers::from_configs(&[google(), apple]).unwrap();
        assert_eq!(registry.providers(), vec!["apple", "google"]);
        assert!(registry.get("google").is_some());
        assert!(registry.get("github").is_none());
    }

    #[test]
    fn test_registry_rejects_duplicates_and_bad_entries() {
        assert!(IdentityVerifiers::from_configs(&[google(), google()]).is_err());
        let broken = IdentityProviderConfig {
            audience: String::new(),
            ..google()
        };
        assert!(IdentityVerifiers::from_configs(&[google(), broken]).is_err());
    }
}
