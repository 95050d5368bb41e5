//! Self-validating refresh exchange.
//!
//! A [`RefreshContext`] is assembled for a single refresh attempt from one
//! repository read plus the claims of the presented bearer token, validated,
//! and dropped. It never outlives the request that built it.
//!
//! The lifecycle is carried by the types: a `RefreshContext` is the
//! constructed state, [`ValidatedRefresh`] the validated state, and the
//! returned [`AuthError`] the rejection reason. There is no partial success.

use crate::claims::TokenClaims;
use crate::error::AuthError;
use crate::guard::CallGuard;
use crate::model::{RefreshToken, User};
use crate::repository::RefreshTokenStore;
use log::{debug, warn};
use uuid::Uuid;

pub const USER_NOT_APPROVED: &str = "user not approved";
pub const CLAIMS_MISMATCH: &str = "claims do not match stored token";

/// Parse the refresh cookie value. Anything that is not a UUID is rejected.
pub fn parse_refresh_cookie(value: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        debug!("Refresh cookie is not a UUID");
        AuthError::Unauthenticated
    })
}

#[derive(Debug, Clone)]
pub struct RefreshContext {
    refresh_token: RefreshToken,
    user: User,
    claims: TokenClaims,
}

impl RefreshContext {
    pub fn new(refresh_token: RefreshToken, user: User, claims: TokenClaims) -> Self {
        Self {
            refresh_token,
            user,
            claims,
        }
    }

    /// Build the context from the store. Token and user come from one read.
    pub async fn load(
        store: &dyn RefreshTokenStore,
        refresh_id: Uuid,
        claims: TokenClaims,
        guard: &CallGuard,
    ) -> Result<Self, AuthError> {
        let (refresh_token, user) = guard
            .run("refresh grant lookup", store.find_refresh_grant(refresh_id))
            .await?;
        Ok(Self::new(refresh_token, user, claims))
    }

    pub fn refresh_token(&self) -> &RefreshToken {
        &self.refresh_token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn has_approved_user(&self) -> bool {
        self.user.is_approved()
    }

    pub fn is_expired(&self) -> bool {
        self.refresh_token.is_expired()
    }

    pub fn user_matches(&self) -> bool {
        self.claims.effective_subject() == self.refresh_token.user_id.hyphenated().to_string()
    }

    pub fn jti_matches(&self) -> bool {
        self.claims.token_id() == self.refresh_token.jti
    }

    fn check(&self) -> Result<(), AuthError> {
        if !self.has_approved_user() {
            return Err(AuthError::Forbidden(USER_NOT_APPROVED.to_string()));
        }
        if self.is_expired() {
            return Err(AuthError::ExpiredCredential(format!(
                "refresh token {} expired",
                self.refresh_token.id
            )));
        }
        if !(self.user_matches() && self.jti_matches()) {
            return Err(AuthError::Forbidden(CLAIMS_MISMATCH.to_string()));
        }
        Ok(())
    }

    /// Run every check in order and stop at the first failure.
    ///
    /// Consumes the context; on success the validated parts are handed back so
    /// the caller can mint the replacement token.
    pub fn validate(self) -> Result<ValidatedRefresh, AuthError> {
        match self.check() {
            Ok(()) => {
                debug!(
                    "Refresh token {} validated for user {}",
                    self.refresh_token.id, self.user.id
                );
                Ok(ValidatedRefresh {
                    refresh_token: self.refresh_token,
                    user: self.user,
                    claims: self.claims,
                })
            }
            Err(e) => {
                warn!("Refresh token {} rejected: {}", self.refresh_token.id, e);
                Err(e)
            }
        }
    }
}

/// The parts of a refresh exchange that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRefresh {
    pub refresh_token: RefreshToken,
    pub user: User,
    pub claims: TokenClaims,
}
