//! Token issuance and verification.

use crate::claims::TokenClaims;
use crate::error::AuthError;
use crate::guard::CallGuard;
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An encoded, signed token as handed to clients
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SignedToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedToken(<redacted>)")
    }
}

/// Deployment-selected signing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningProfile {
    /// Shared secret held in memory (HS256)
    Symmetric,
    /// RSA key pair loaded from PEM files (RS256)
    KeyPair,
}

/// Signs claims and verifies signed tokens.
///
/// Implementations may call out to a key service, so both operations are async.
#[async_trait]
pub trait TokenSigner: Send + Sync {
    fn profile(&self) -> SigningProfile;

    async fn sign(&self, claims: &TokenClaims) -> Result<SignedToken, AuthError>;

    /// Verify signature, issuer and audience. Expiry is enforced unless
    /// `allow_expired` is set.
    async fn verify(&self, token: &SignedToken, allow_expired: bool)
    -> Result<TokenClaims, AuthError>;
}

/// Key material for [`JwtSigner`]
pub enum SigningKey<'a> {
    Secret(&'a [u8]),
    RsaPem { private_pem: &'a [u8], public_pem: &'a [u8] },
}

/// JWT implementation of [`TokenSigner`]
#[derive(Clone)]
pub struct JwtSigner {
    profile: SigningProfile,
    algorithm: Algorithm,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtSigner {
    pub fn new(
        key: SigningKey<'_>,
        issuer: &str,
        audience: Option<&str>,
        leeway_secs: u64,
    ) -> Result<Self, AuthError> {
        if issuer.trim().is_empty() {
            return Err(AuthError::Configuration(
                "token issuer must not be empty".to_string(),
            ));
        }

        let (profile, algorithm, encoding_key, decoding_key) = match key {
            SigningKey::Secret(secret) => {
                if secret.is_empty() {
                    return Err(AuthError::Configuration(
                        "symmetric signing secret must not be empty".to_string(),
                    ));
                }
                if secret.len() < 32 {
                    warn!("Symmetric signing secret is shorter than 32 bytes");
                }
                (
                    SigningProfile::Symmetric,
                    Algorithm::HS256,
                    EncodingKey::from_secret(secret),
                    DecodingKey::from_secret(secret),
                )
            }
            SigningKey::RsaPem {
                private_pem,
                public_pem,
            } => {
                let encoding_key = EncodingKey::from_rsa_pem(private_pem).map_err(|e| {
                    AuthError::Configuration(format!("invalid RSA private key: {e}"))
                })?;
                let decoding_key = DecodingKey::from_rsa_pem(public_pem).map_err(|e| {
                    AuthError::Configuration(format!("invalid RSA public key: {e}"))
                })?;
                (
                    SigningProfile::KeyPair,
                    Algorithm::RS256,
                    encoding_key,
                    decoding_key,
                )
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.leeway = leeway_secs;
        match audience.filter(|aud| !aud.is_empty()) {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            profile,
            algorithm,
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }
}

impl fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSigner")
            .field("profile", &self.profile)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[async_trait]
impl TokenSigner for JwtSigner {
    fn profile(&self) -> SigningProfile {
        self.profile
    }

    async fn sign(&self, claims: &TokenClaims) -> Result<SignedToken, AuthError> {
        let header = Header::new(self.algorithm);
        encode(&header, claims, &self.encoding_key)
            .map(SignedToken)
            .map_err(|e| AuthError::Configuration(format!("failed to sign token: {e}")))
    }

    async fn verify(
        &self,
        token: &SignedToken,
        allow_expired: bool,
    ) -> Result<TokenClaims, AuthError> {
        let data = if allow_expired {
            let mut validation = (*self.validation).clone();
            validation.validate_exp = false;
            decode::<TokenClaims>(token.as_str(), &self.decoding_key, &validation)
        } else {
            decode::<TokenClaims>(token.as_str(), &self.decoding_key, &self.validation)
        }
        .map_err(map_jwt_error)?;

        data.claims.check_window()?;
        Ok(data.claims)
    }
}

pub(crate) fn map_jwt_error(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::ExpiredCredential("token has expired".into()),
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience | ErrorKind::ImmatureSignature => {
            AuthError::Unauthenticated
        }
        _ => AuthError::MalformedToken(error.to_string()),
    }
}

/// Issues and verifies tokens through the configured signer.
///
/// Holds no per-request state; share it behind an `Arc` or clone it.
#[derive(Clone)]
pub struct TokenService {
    signer: Arc<dyn TokenSigner>,
}

impl TokenService {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self { signer }
    }

    pub fn profile(&self) -> SigningProfile {
        self.signer.profile()
    }

    pub async fn issue(
        &self,
        claims: &TokenClaims,
        guard: &CallGuard,
    ) -> Result<SignedToken, AuthError> {
        let token = guard.run("token signing", self.signer.sign(claims)).await?;
        debug!(
            "Issued token {} for '{}' via client '{}'",
            claims.token_id(),
            claims.effective_subject(),
            claims.client_id()
        );
        Ok(token)
    }

    pub async fn verify(
        &self,
        token: &SignedToken,
        guard: &CallGuard,
    ) -> Result<TokenClaims, AuthError> {
        guard
            .run("token verification", self.signer.verify(token, false))
            .await
    }

    /// Alias of [`TokenService::verify`]
    pub async fn get_claims(
        &self,
        token: &SignedToken,
        guard: &CallGuard,
    ) -> Result<TokenClaims, AuthError> {
        self.verify(token, guard).await
    }

    /// Verify a token whose lifetime may already be over. Only the refresh
    /// exchange uses this; the signature is still checked.
    pub async fn verify_allow_expired(
        &self,
        token: &SignedToken,
        guard: &CallGuard,
    ) -> Result<TokenClaims, AuthError> {
        guard
            .run("token verification", self.signer.verify(token, true))
            .await
    }

    /// Yes/no verification. Every failure collapses into `false`.
    pub async fn is_valid_token(&self, token: &SignedToken, guard: &CallGuard) -> bool {
        match self.verify(token, guard).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Token rejected: {e}");
                false
            }
        }
    }
}
