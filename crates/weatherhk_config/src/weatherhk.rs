use std::collections::HashMap;

use serde::Deserialize;
use tracing::{info, warn};

use crate::feed::default_feeds;
use crate::validation::{ConfigReport, validate};
use crate::{CacheConfig, FeedConfig, ServerConfig};

const ENV_PREFIX: &str = "WEATHERHK";

// =======================================================
// WEATHERHK CONFIG (main config)
// =======================================================
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherhkConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub feed: HashMap<String, FeedConfig>,
}

impl Default for WeatherhkConfig {
    fn default() -> Self {
        let mut cfg = Self {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            feed: HashMap::new(),
        };
        cfg.apply_defaults();
        cfg
    }
}

impl WeatherhkConfig {
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn feeds(&self) -> &HashMap<String, FeedConfig> {
        &self.feed
    }

    pub fn feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feed.get(name)
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Loads `file_name` (INI, optional) plus `WEATHERHK__SECTION__KEY`
    /// environment variables, then the deployment variables `PORT`,
    /// `FORCE_HTTPS`, `APP_HOSTNAME` and `REDIS_URL`.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: WeatherhkConfig = built.try_deserialize()?;

        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    warn!(target: "weatherhk::config", file = file_name, "Invalid config:\n{}", report.format());
                    warn!(target: "weatherhk::config", "Using default config (in-memory)");
                    Self::defaults_with_env()
                } else {
                    if !report.warnings().is_empty() {
                        warn!(target: "weatherhk::config", file = file_name, "Config warnings:\n{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                warn!(target: "weatherhk::config", file = file_name, error = %e, "Error reading config");
                warn!(target: "weatherhk::config", "Using default config (in-memory)");
                Self::defaults_with_env()
            }
        }
    }

    fn defaults_with_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        cfg
    }

    /// Applies the deployment variables through `lookup`.
    ///
    /// An unparsable `PORT` is ignored; `FORCE_HTTPS` is on only for the
    /// exact value `TRUE`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            if port != 0 {
                self.server.port = port;
            }
        }
        if let Some(force) = lookup("FORCE_HTTPS") {
            self.server.force_https = force == "TRUE";
        }
        if let Some(hostname) = lookup("APP_HOSTNAME").filter(|h| !h.is_empty()) {
            self.server.hostname = hostname;
        }
        if let Some(url) = lookup("REDIS_URL").filter(|u| !u.is_empty()) {
            self.cache.redis_url = Some(url);
        }
    }

    fn apply_defaults(&mut self) {
        let def_server = ServerConfig::default();
        self.server.apply_defaults_from(&def_server);

        let def_cache = CacheConfig::default();
        self.cache.apply_defaults_from(&def_cache);

        if self.feed.is_empty() {
            self.feed = default_feeds();
        }
        let def_feed = FeedConfig::default();
        for feed in self.feed.values_mut() {
            feed.apply_defaults_from(&def_feed);
        }
    }

    pub fn log_summary(&self) {
        info!(
            target: "weatherhk::config",
            listen = %self.server.listen_addr(),
            hostname = %self.server.hostname,
            force_https = self.server.force_https,
            max_connections = self.server.max_connections,
            "[server]"
        );
        info!(
            target: "weatherhk::config",
            backend = ?self.cache.backend,
            redis_url_set = self.cache.redis_url().is_some(),
            storage_ttl_secs = self.cache.storage_ttl_secs,
            status_header = self.cache.status_header,
            "[cache]"
        );
        for (name, feed) in &self.feed {
            info!(
                target: "weatherhk::config",
                feed = %name,
                path = %feed.path,
                source = %feed.source,
                lifetime_secs = feed.lifetime_secs,
                "[feed]"
            );
        }
    }
}
