use crate::config::{CacheConfig, CacheStore};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use token_engine::{GrantedScopeSource, RepositoryError, ScopeName};

pub mod memory;
pub mod null;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Interface shared by all cache implementations
#[async_trait]
#[allow(dead_code)]
pub trait CacheBackend: Send + Sync {
    /// Store a value with the default TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), CacheError>;

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn health_check(&self) -> Result<(), String>;
}

/// Cache selected at startup from configuration
#[derive(Clone)]
pub enum ScopeCache {
    /// In-memory cache implementation using Moka
    InMemory(memory::InMemoryCache),
    /// Caches nothing
    Null(null::NullCache),
}

#[async_trait]
impl CacheBackend for ScopeCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.set(key, value).await,
            Self::Null(cache) => cache.set(key, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Null(cache) => cache.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.delete(key).await,
            Self::Null(cache) => cache.delete(key).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(cache) => cache.health_check().await,
            Self::Null(cache) => cache.health_check().await,
        }
    }
}

pub fn create_cache(config: &CacheConfig) -> Result<ScopeCache, CacheError> {
    match config.store {
        CacheStore::InMemory => {
            let cache = memory::InMemoryCache::new(config.ttl as u64, config.memory.capacity)
                .map_err(CacheError::Config)?;
            Ok(ScopeCache::InMemory(cache))
        }
        CacheStore::None => Ok(ScopeCache::Null(null::NullCache::new())),
    }
}

/// [`GrantedScopeSource`] that consults the cache before the wrapped source.
///
/// Cache failures fall through to the wrapped source; they never fail a lookup.
pub struct CachedScopeSource {
    inner: Arc<dyn GrantedScopeSource>,
    cache: Arc<ScopeCache>,
}

impl CachedScopeSource {
    pub fn new(inner: Arc<dyn GrantedScopeSource>, cache: Arc<ScopeCache>) -> Self {
        Self { inner, cache }
    }

    fn cache_key(principal: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(principal.as_bytes());
        format!("grants:{:x}", hasher.finalize())
    }
}

#[async_trait]
impl GrantedScopeSource for CachedScopeSource {
    async fn find_granted_scopes_for_principal(
        &self,
        principal: &str,
    ) -> Result<HashSet<ScopeName>, RepositoryError> {
        let key = Self::cache_key(principal);
        match self.cache.get::<HashSet<ScopeName>>(&key).await {
            Ok(Some(scopes)) => {
                debug!("Granted scopes for '{principal}' served from cache");
                return Ok(scopes);
            }
            Ok(None) => {}
            Err(e) => warn!("Granted scope cache read failed: {e}"),
        }

        let scopes = self.inner.find_granted_scopes_for_principal(principal).await?;
        if let Err(e) = self.cache.set(&key, &scopes).await {
            warn!("Granted scope cache write failed: {e}");
        }
        Ok(scopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;
    use crate::cache::null::NullCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GrantedScopeSource for CountingSource {
        async fn find_granted_scopes_for_principal(
            &self,
            principal: &str,
        ) -> Result<HashSet<ScopeName>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if principal == "ghost" {
                return Err(RepositoryError::Backend("unreachable".into()));
            }
            Ok([ScopeName::parse("study1.WRITE").unwrap()].into_iter().collect())
        }
    }

    fn source() -> Arc<CountingSource> {
        Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_in_memory_cache_serves_repeat_lookups() {
        let inner = source();
        let cache = Arc::new(ScopeCache::InMemory(InMemoryCache::new(60, 1).unwrap()));
        let cached = CachedScopeSource::new(inner.clone(), cache.clone());

        let first = cached.find_granted_scopes_for_principal("alice").await.unwrap();
        let second = cached.find_granted_scopes_for_principal("alice").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cache
            .delete(&CachedScopeSource::cache_key("alice"))
            .await
            .unwrap();
        cached.find_granted_scopes_for_principal("alice").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_null_cache_always_delegates() {
        let inner = source();
        let cached = CachedScopeSource::new(inner.clone(), Arc::new(ScopeCache::Null(NullCache::new())));

        cached.find_granted_scopes_for_principal("alice").await.unwrap();
        cached.find_granted_scopes_for_principal("alice").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = source();
        let cache = Arc::new(ScopeCache::InMemory(InMemoryCache::new(60, 1).unwrap()));
        let cached = CachedScopeSource::new(inner.clone(), cache);

        assert!(cached.find_granted_scopes_for_principal("ghost").await.is_err());
        assert!(cached.find_granted_scopes_for_principal("ghost").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_create_cache_from_config() {
        let config = CacheConfig {
            store: CacheStore::InMemory,
            ..Default::default()
        };
        assert!(matches!(create_cache(&config).unwrap(), ScopeCache::InMemory(_)));
        assert!(matches!(
            create_cache(&CacheConfig::default()).unwrap(),
            ScopeCache::Null(_)
        ));
    }

    #[test]
    fn test_cache_key_hides_principal() {
        let key = CachedScopeSource::cache_key("alice");
        assert!(key.starts_with("grants:"));
        assert!(!key.contains("alice"));
        assert_eq!(key, CachedScopeSource::cache_key("alice"));
    }
}
