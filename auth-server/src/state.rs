use crate::cache::{create_cache, CachedScopeSource, ScopeCache};
use crate::config::ServerConfig;
use crate::errors::StartupError;
use crate::store::MemoryStore;
use log::{info, warn};
use std::sync::Arc;
use token_engine::{CallGuard, IdentityVerifiers, ScopeResolver, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<ScopeCache>,
    pub tokens: TokenService,
    pub resolver: ScopeResolver,
    pub identity: IdentityVerifiers,
}

impl AppState {
    /// Build the state from configuration, loading the seed file if one is set
    pub async fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let store = match &config.store.seed_path {
            Some(path) => {
                info!("Loading store seed from {}", path.display());
                MemoryStore::from_seed_file(path).await?
            }
            None => {
                warn!("No store seed configured, starting with an empty store");
                MemoryStore::new()
            }
        };
        Self::with_store(config, store)
    }

    /// Build the state around an already populated store
    pub fn with_store(config: ServerConfig, store: MemoryStore) -> Result<Self, StartupError> {
        let tokens = TokenService::new(Arc::new(config.signing.build_signer()?));
        let identity = IdentityVerifiers::from_configs(&config.identity_providers)?;
        let cache = Arc::new(create_cache(&config.cache)?);
        let store = Arc::new(store);
        let grants = CachedScopeSource::new(store.clone(), cache.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            cache,
            tokens,
            resolver: ScopeResolver::new(Arc::new(grants)),
            identity,
        })
    }

    /// Guard for the collaborator calls of one request
    pub fn call_guard(&self) -> CallGuard {
        CallGuard::with_timeout(self.config.collaborator_timeout())
    }
}
