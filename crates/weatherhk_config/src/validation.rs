use std::collections::HashMap;

use crate::{CacheBackend, WeatherhkConfig};

/// Longest TTL or lifetime accepted, in seconds (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Validation output for a loaded configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

pub fn validate(cfg: &WeatherhkConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_server(cfg, &mut report);
    validate_cache(cfg, &mut report);
    validate_feeds(cfg, &mut report);

    report
}

fn validate_server(cfg: &WeatherhkConfig, report: &mut ConfigReport) {
    if cfg.server.force_https && cfg.server.hostname.trim().is_empty() {
        report.error("server.force_https is set but server.hostname is empty");
    }
    if cfg.server.max_connections == 0 {
        report.error("server.max_connections must be greater than 0");
    }
}

fn validate_cache(cfg: &WeatherhkConfig, report: &mut ConfigReport) {
    let cache = &cfg.cache;

    if cache.backend == CacheBackend::Redis && cache.redis_url().is_none() {
        report.warn("cache.backend is redis but no redis_url / REDIS_URL is set; caching disabled");
    }

    if cache.storage_ttl_secs > MAX_TTL_SECS {
        report.error(format!(
            "cache.storage_ttl_secs is {}; the maximum is {MAX_TTL_SECS}",
            cache.storage_ttl_secs
        ));
    } else if cache.storage_ttl_secs < 60 {
        report.warn(format!(
            "cache.storage_ttl_secs is {}; entries may be evicted while still fresh",
            cache.storage_ttl_secs
        ));
    }

    for (name, feed) in &cfg.feed {
        if feed.lifetime_secs > cache.storage_ttl_secs {
            report.warn(format!(
                "feed '{name}' lifetime_secs ({}) exceeds cache.storage_ttl_secs ({})",
                feed.lifetime_secs, cache.storage_ttl_secs
            ));
        }
    }
}

fn validate_feeds(cfg: &WeatherhkConfig, report: &mut ConfigReport) {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for (name, feed) in &cfg.feed {
        if !feed.path.starts_with('/') {
            report.error(format!("feed '{name}' path '{}' must start with '/'", feed.path));
        } else if feed.path == "/" {
            report.error(format!("feed '{name}' cannot be mounted at '/' (index page)"));
        }

        if let Some(other) = seen.insert(feed.path.as_str(), name.as_str()) {
            report.error(format!(
                "feeds '{other}' and '{name}' share the path '{}'",
                feed.path
            ));
        }

        if feed.source.trim().is_empty() {
            report.error(format!("feed '{name}' has an empty source"));
        } else if !feed.source.starts_with("http://") {
            report.error(format!(
                "feed '{name}' source '{}' must be a plain http:// url",
                feed.source
            ));
        }

        if feed.lifetime_secs > MAX_TTL_SECS {
            report.error(format!(
                "feed '{name}' lifetime_secs is {}; the maximum is {MAX_TTL_SECS}",
                feed.lifetime_secs
            ));
        } else if feed.lifetime_secs == 0 {
            report.warn(format!(
                "feed '{name}' lifetime_secs is 0; its responses are never served from cache"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::{CacheBackend, FeedConfig, WeatherhkConfig};

    fn feed(path: &str, source: &str) -> FeedConfig {
        FeedConfig {
            path: path.into(),
            source: source.into(),
            ..FeedConfig::default()
        }
    }

    #[test]
    fn missing_redis_url_only_warns() {
        let cfg = WeatherhkConfig::default();
        let report = validate(&cfg);
        assert!(report.is_ok());
        assert!(report.warnings().iter().any(|w| w.contains("redis_url")));
    }

    #[test]
    fn memory_backend_has_no_warnings() {
        let mut cfg = WeatherhkConfig::default();
        cfg.cache.backend = CacheBackend::Memory;
        assert!(validate(&cfg).warnings().is_empty());
    }

    #[test]
    fn bad_feed_paths_and_sources_are_errors() {
        let mut cfg = WeatherhkConfig::default();
        cfg.feed.clear();
        cfg.feed.insert("a".into(), feed("api/a", "http://example.com/a"));
        cfg.feed.insert("b".into(), feed("/", "http://example.com/b"));
        cfg.feed.insert("c".into(), feed("/c", "https://example.com/c"));
        cfg.feed.insert("d".into(), feed("/d", ""));

        let report = validate(&cfg);
        assert_eq!(report.errors().len(), 4, "{}", report.format());
    }

    #[test]
    fn duplicate_feed_paths_are_errors() {
        let mut cfg = WeatherhkConfig::default();
        cfg.feed.clear();
        cfg.feed.insert("a".into(), feed("/same", "http://example.com/a"));
        cfg.feed.insert("b".into(), feed("/same", "http://example.com/b"));

        let report = validate(&cfg);
        assert!(report.has_errors());
        assert!(report.format().contains("share the path"));
    }

    #[test]
    fn oversized_ttls_are_errors() {
        let mut cfg = WeatherhkConfig::default();
        cfg.cache.backend = CacheBackend::Memory;
        cfg.cache.storage_ttl_secs = u64::MAX;
        for feed in cfg.feed.values_mut() {
            feed.lifetime_secs = u64::MAX;
        }

        let report = validate(&cfg);
        assert_eq!(report.errors().len(), 1 + cfg.feed.len(), "{}", report.format());
    }

    #[test]
    fn lifetime_longer_than_storage_ttl_warns() {
        let mut cfg = WeatherhkConfig::default();
        cfg.cache.backend = CacheBackend::Memory;
        cfg.cache.storage_ttl_secs = 120;
        let report = validate(&cfg);
        assert!(report.is_ok());
        assert_eq!(report.warnings().len(), 2, "{}", report.format());
    }
}
