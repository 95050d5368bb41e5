use super::StoreError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;
use token_engine::{
    Application, ApplicationStore, GrantedScopeSource, RefreshToken, RefreshTokenStore,
    RepositoryError, ScopeName, User, UserStore,
};
use uuid::Uuid;

/// Seed data loaded at startup
#[derive(Debug, Deserialize, Default)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub applications: Vec<SeedApplication>,
    /// Granted scopes keyed by principal (username or client id)
    #[serde(default)]
    pub grants: HashMap<String, Vec<ScopeName>>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    #[serde(flatten)]
    pub user: User,
    /// Argon2 PHC string of the password, users without one cannot use the
    /// password grant
    #[serde(default)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedApplication {
    #[serde(flatten)]
    pub application: Application,
    /// Argon2 PHC string of the client secret, public clients have none
    #[serde(default)]
    pub secret_hash: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredRefreshToken {
    id: Uuid,
    jti: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl StoredRefreshToken {
    fn record(&self, now: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            id: self.id,
            jti: self.jti,
            user_id: self.user_id,
            seconds_until_expiry: (self.expires_at - now).num_seconds(),
        }
    }
}

#[derive(Default)]
struct StoreData {
    users: HashMap<Uuid, SeedUser>,
    applications: HashMap<String, SeedApplication>,
    grants: HashMap<String, HashSet<ScopeName>>,
    refresh_tokens: HashMap<Uuid, StoredRefreshToken>,
}

impl StoreData {
    fn user(&self, id: Uuid) -> Result<&User, RepositoryError> {
        self.users
            .get(&id)
            .map(|stored| &stored.user)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    fn user_by_username(&self, username: &str) -> Option<&SeedUser> {
        self.users
            .values()
            .find(|stored| stored.user.username == username)
    }
}

/// In-process store of users, applications, grants and refresh tokens.
///
/// All records live behind one lock, so every read sees a single
/// consistent snapshot.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

/// Hash a secret into the Argon2 PHC string form seeds store, with a fresh
/// random salt per call
pub fn hash_secret(secret: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hashing(e.to_string()))
}

fn check_phc(owner: &str, hash: Option<&str>) -> Result<(), StoreError> {
    match hash {
        Some(hash) => PasswordHash::new(hash).map(|_| ()).map_err(|e| {
            StoreError::Invalid(format!("'{owner}' has a malformed secret hash: {e}"))
        }),
        None => Ok(()),
    }
}

/// Argon2 verification is CPU bound, so it runs off the async workers
async fn verify_secret(stored: String, presented: String) -> Result<bool, RepositoryError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(presented.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored secret hash is unreadable: {e}");
            false
        }
    })
    .await
    .map_err(|e| RepositoryError::Backend(format!("secret verification failed: {e}")))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Result<Self, StoreError> {
        let mut data = StoreData::default();

        for stored in seed.users {
            let user = &stored.user;
            check_phc(&user.username, stored.password_hash.as_deref())?;
            if data.user_by_username(&user.username).is_some() {
                return Err(StoreError::Invalid(format!(
                    "duplicate username '{}'",
                    user.username
                )));
            }
            if let Some(email) = &user.email {
                let taken = data.users.values().any(|other| {
                    other
                        .user
                        .email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(email))
                });
                if taken {
                    return Err(StoreError::Invalid(format!("duplicate email '{email}'")));
                }
            }
            if data.users.insert(user.id, stored).is_some() {
                return Err(StoreError::Invalid("duplicate user id".to_string()));
            }
        }

        for stored in seed.applications {
            let client_id = stored.application.client_id.clone();
            check_phc(&client_id, stored.secret_hash.as_deref())?;
            if data.applications.insert(client_id.clone(), stored).is_some() {
                return Err(StoreError::Invalid(format!(
                    "duplicate client id '{client_id}'"
                )));
            }
        }

        data.grants = seed
            .grants
            .into_iter()
            .map(|(principal, scopes)| (principal, scopes.into_iter().collect()))
            .collect();

        info!(
            "Store loaded with {} users, {} applications and {} grant entries",
            data.users.len(),
            data.applications.len(),
            data.grants.len()
        );
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    pub async fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: Seed = serde_json::from_str(&raw)?;
        Self::from_seed(seed)
    }

    /// The user owning `username` if `password` matches its stored hash
    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let candidate = {
            let data = self.data.read().await;
            data.user_by_username(username).and_then(|stored| {
                let hash = stored.password_hash.clone()?;
                Some((stored.user.clone(), hash))
            })
        };
        let user = match candidate {
            Some((user, hash)) => verify_secret(hash, password.to_string())
                .await?
                .then_some(user),
            None => None,
        };
        if user.is_none() {
            debug!("Password check failed for '{username}'");
        }
        Ok(user)
    }

    /// The application owning `client_id` if `secret` matches its stored hash
    pub async fn authenticate_client(
        &self,
        client_id: &str,
        secret: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        let candidate = {
            let data = self.data.read().await;
            data.applications.get(client_id).and_then(|stored| {
                let hash = stored.secret_hash.clone()?;
                Some((stored.application.clone(), hash))
            })
        };
        let application = match candidate {
            Some((application, hash)) => verify_secret(hash, secret.to_string())
                .await?
                .then_some(application),
            None => None,
        };
        if application.is_none() {
            debug!("Client secret check failed for '{client_id}'");
        }
        Ok(application)
    }

    #[cfg(test)]
    pub(crate) async fn replace_grants(&self, principal: &str, scopes: HashSet<ScopeName>) {
        self.data
            .write()
            .await
            .grants
            .insert(principal.to_string(), scopes);
    }

    pub async fn health_check(&self) -> Result<(), String> {
        self.data
            .try_read()
            .map(|_| ())
            .map_err(|_| "store is locked for writing".to_string())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn find_refresh_token_by_id(&self, id: Uuid) -> Result<RefreshToken, RepositoryError> {
        let data = self.data.read().await;
        data.refresh_tokens
            .get(&id)
            .map(|stored| stored.record(Utc::now()))
            .ok_or_else(|| RepositoryError::NotFound(format!("refresh token {id}")))
    }

    async fn find_refresh_grant(&self, id: Uuid) -> Result<(RefreshToken, User), RepositoryError> {
        let data = self.data.read().await;
        let stored = data
            .refresh_tokens
            .get(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("refresh token {id}")))?;
        let user = data.user(stored.user_id)?.clone();
        Ok((stored.record(Utc::now()), user))
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        current_jti: Uuid,
        new_jti: Uuid,
    ) -> Result<RefreshToken, RepositoryError> {
        let mut data = self.data.write().await;
        let stored = data
            .refresh_tokens
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("refresh token {id}")))?;
        if stored.jti != current_jti {
            return Err(RepositoryError::Conflict(format!(
                "refresh token {id} was already rotated"
            )));
        }
        stored.jti = new_jti;
        Ok(stored.record(Utc::now()))
    }

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        jti: Uuid,
        lifetime_secs: i64,
    ) -> Result<RefreshToken, RepositoryError> {
        let mut data = self.data.write().await;
        data.user(user_id)?;
        let now = Utc::now();
        let expires_at = Duration::try_seconds(lifetime_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                RepositoryError::Backend(format!(
                    "refresh token lifetime of {lifetime_secs}s is out of range"
                ))
            })?;

        let before = data.refresh_tokens.len();
        data.refresh_tokens.retain(|_, token| token.expires_at > now);
        let pruned = before - data.refresh_tokens.len();
        if pruned > 0 {
            debug!("Pruned {pruned} expired refresh tokens");
        }

        let stored = StoredRefreshToken {
            id: Uuid::new_v4(),
            jti,
            user_id,
            expires_at,
        };
        let record = stored.record(now);
        data.refresh_tokens.insert(stored.id, stored);
        Ok(record)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        self.data.read().await.user(id).cloned()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, RepositoryError> {
        let data = self.data.read().await;
        data.user_by_username(username)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| RepositoryError::NotFound(format!("user '{username}'")))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let data = self.data.read().await;
        data.users
            .values()
            .find(|stored| {
                stored
                    .user
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .map(|stored| stored.user.clone())
            .ok_or_else(|| RepositoryError::NotFound("user with that email".to_string()))
    }
}

#[async_trait]
impl GrantedScopeSource for MemoryStore {
    async fn find_granted_scopes_for_principal(
        &self,
        principal: &str,
    ) -> Result<HashSet<ScopeName>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.grants.get(principal).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn find_application_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Application, RepositoryError> {
        let data = self.data.read().await;
        data.applications
            .get(client_id)
            .map(|stored| stored.application.clone())
            .ok_or_else(|| RepositoryError::NotFound(format!("application '{client_id}'")))
    }
}
