use serde::Deserialize;

/// Specifies which cache store implementation to use
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStore {
    InMemory,
    #[serde(other)]
    #[default]
    None,
}

/// Configuration of the granted scope cache
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Cache TTL in seconds (default: 60)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Cache store type: "in-memory" or "none" (default)
    #[serde(default)]
    pub store: CacheStore,

    /// In-memory cache specific configuration
    #[serde(default)]
    pub memory: InMemoryConfig,
}

fn default_ttl() -> u32 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            store: CacheStore::None,
            memory: InMemoryConfig::default(),
        }
    }
}

/// In-memory cache configuration options
#[derive(Debug, Deserialize, Clone)]
pub struct InMemoryConfig {
    /// Maximum capacity in MiB (default: 16 MiB)
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    16
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
