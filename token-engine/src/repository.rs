//! Collaborator interfaces the engine consumes. Persistence lives elsewhere.

use crate::error::RepositoryError;
use crate::model::{Application, RefreshToken, User};
use crate::scope::ScopeName;
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

/// Refresh token records
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn find_refresh_token_by_id(&self, id: Uuid) -> Result<RefreshToken, RepositoryError>;

    /// Read a refresh token together with the user it belongs to.
    ///
    /// Implementations must return both records from one consistent view so the
    /// token cannot be rotated or revoked between the two reads.
    async fn find_refresh_grant(&self, id: Uuid) -> Result<(RefreshToken, User), RepositoryError>;

    /// Bind the refresh token to a newly issued access token id.
    ///
    /// The swap only happens while the stored jti is still `current_jti`,
    /// otherwise `RepositoryError::Conflict` is returned.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        current_jti: Uuid,
        new_jti: Uuid,
    ) -> Result<RefreshToken, RepositoryError>;

    /// Store a fresh refresh token for `user_id` bound to `jti`
    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        jti: Uuid,
        lifetime_secs: i64,
    ) -> Result<RefreshToken, RepositoryError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<User, RepositoryError>;

    async fn find_user_by_username(&self, username: &str) -> Result<User, RepositoryError>;

    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;
}

/// Source of the scopes a principal currently holds
#[async_trait]
pub trait GrantedScopeSource: Send + Sync {
    async fn find_granted_scopes_for_principal(
        &self,
        principal: &str,
    ) -> Result<HashSet<ScopeName>, RepositoryError>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find_application_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Application, RepositoryError>;
}
