//! Typed claims carried inside signed tokens.
//!
//! Claims are decoded once at the trust boundary into [`TokenClaims`]; nothing
//! downstream reads raw payload maps. The subject kind is expressed by the
//! [`ClientContext`] variant instead of by separate claims types.

use crate::error::AuthError;
use crate::model::{Application, ApplicationType, User};
use crate::scope::ScopeName;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Default lifetime of an access token when the builder is not given one
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
    Password,
    IdToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
            Self::Password => "password",
            Self::IdToken => "id_token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub client_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub status_must_be_approved: bool,
    #[serde(default)]
    pub scope: BTreeSet<ScopeName>,
}

impl UserContext {
    pub fn for_user(user: &User, client_id: impl Into<String>, scope: BTreeSet<ScopeName>) -> Self {
        Self {
            user_id: user.id,
            client_id: client_id.into(),
            roles: user.roles.clone(),
            status_must_be_approved: true,
            scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub application_id: Uuid,
    pub client_id: String,
    pub application_type: ApplicationType,
    #[serde(default)]
    pub scope: BTreeSet<ScopeName>,
}

impl ApplicationContext {
    pub fn for_application(application: &Application, scope: BTreeSet<ScopeName>) -> Self {
        Self {
            application_id: application.id,
            client_id: application.client_id.clone(),
            application_type: application.application_type,
            scope,
        }
    }
}

/// Who or what the token was issued to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientContext {
    User(UserContext),
    Application(ApplicationContext),
}

impl ClientContext {
    /// Id of the user or application behind the token
    pub fn entity_id(&self) -> Uuid {
        match self {
            Self::User(ctx) => ctx.user_id,
            Self::Application(ctx) => ctx.application_id,
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            Self::User(ctx) => &ctx.client_id,
            Self::Application(ctx) => &ctx.client_id,
        }
    }

    pub fn scopes(&self) -> &BTreeSet<ScopeName> {
        match self {
            Self::User(ctx) => &ctx.scope,
            Self::Application(ctx) => &ctx.scope,
        }
    }
}

/// Claims embedded in a signed token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(rename = "jti")]
    token_id: Uuid,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    expires_at: DateTime<Utc>,
    #[serde(rename = "iss")]
    issuer: String,
    #[serde(rename = "aud", default)]
    audience: Vec<String>,
    #[serde(rename = "grant_types", default)]
    authorized_grant_types: BTreeSet<GrantType>,
    context: ClientContext,
}

impl TokenClaims {
    pub fn builder(context: ClientContext) -> TokenClaimsBuilder {
        TokenClaimsBuilder::new(context)
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Explicit subject when present and non-empty, otherwise the context's entity id
    pub fn effective_subject(&self) -> String {
        match self.subject.as_deref() {
            Some(subject) if !subject.is_empty() => subject.to_string(),
            _ => self.context.entity_id().hyphenated().to_string(),
        }
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    pub fn authorized_grant_types(&self) -> &BTreeSet<GrantType> {
        &self.authorized_grant_types
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn client_id(&self) -> &str {
        self.context.client_id()
    }

    pub fn scopes(&self) -> &BTreeSet<ScopeName> {
        self.context.scopes()
    }

    /// Seconds left before expiry, never negative
    pub fn expires_in_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }

    /// Checks the `expires_at > issued_at` invariant on decoded claims
    pub(crate) fn check_window(&self) -> Result<(), AuthError> {
        if self.expires_at <= self.issued_at {
            return Err(AuthError::MalformedToken(
                "token expires before it was issued".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`TokenClaims`]
#[derive(Debug, Clone)]
pub struct TokenClaimsBuilder {
    context: ClientContext,
    subject: Option<String>,
    token_id: Option<Uuid>,
    issued_at: Option<DateTime<Utc>>,
    lifetime: Duration,
    issuer: String,
    audience: Vec<String>,
    grant_types: BTreeSet<GrantType>,
}

impl TokenClaimsBuilder {
    fn new(context: ClientContext) -> Self {
        Self {
            context,
            subject: None,
            token_id: None,
            issued_at: None,
            lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            issuer: String::new(),
            audience: Vec::new(),
            grant_types: BTreeSet::new(),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn token_id(mut self, token_id: Uuid) -> Self {
        self.token_id = Some(token_id);
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    pub fn grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_types.insert(grant_type);
        self
    }

    pub fn build(self) -> Result<TokenClaims, AuthError> {
        let issued_at = self.issued_at.unwrap_or_else(Utc::now);
        let expires_at = issued_at.checked_add_signed(self.lifetime).ok_or_else(|| {
            AuthError::MalformedToken(format!(
                "lifetime of {}s overflows the expiry timestamp",
                self.lifetime.num_seconds()
            ))
        })?;
        let claims = TokenClaims {
            subject: self.subject,
            token_id: self.token_id.unwrap_or_else(Uuid::new_v4),
            issued_at,
            expires_at,
            issuer: self.issuer,
            audience: self.audience,
            authorized_grant_types: self.grant_types,
            context: self.context,
        };
        claims.check_window()?;
        Ok(claims)
    }
}
