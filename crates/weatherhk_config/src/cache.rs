use serde::Deserialize;

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Connection string for the redis backend (`REDIS_URL` overrides it).
    pub redis_url: Option<String>,
    /// Backend TTL applied on every save, in seconds.
    pub storage_ttl_secs: u64,
    /// Add `X-Cache: HIT|MISS` to responses.
    pub status_header: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: None,
            storage_ttl_secs: 60 * 60,
            status_header: false,
        }
    }
}

impl CacheConfig {
    pub fn backend(&self) -> CacheBackend {
        self.backend
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn storage_ttl_secs(&self) -> u64 {
        self.storage_ttl_secs
    }

    pub fn status_header(&self) -> bool {
        self.status_header
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &CacheConfig) {
        if self.storage_ttl_secs == 0 {
            self.storage_ttl_secs = defaults.storage_ttl_secs;
        }
    }
}
