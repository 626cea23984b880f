use std::collections::HashMap;

use serde::Deserialize;

// =======================================================
// FEED CONFIG
// =======================================================
/// One upstream source relayed at `path`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub path: String,
    /// Upstream URL (plain `http://`).
    pub source: String,
    pub content_type: String,
    /// Seconds a relayed response stays fresh after publication.
    pub lifetime_secs: u64,
    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
    /// Free-form notice shown next to the link on the index page.
    pub notice: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            source: String::new(),
            content_type: "application/octet-stream".into(),
            lifetime_secs: 10 * 60,
            timeout_secs: 10,
            notice: None,
        }
    }
}

impl FeedConfig {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn lifetime_secs(&self) -> u64 {
        self.lifetime_secs
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &FeedConfig) {
        if self.content_type.is_empty() {
            self.content_type = defaults.content_type.clone();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = defaults.timeout_secs;
        }
    }
}

/// Feeds served when the config file declares none.
pub(crate) fn default_feeds() -> HashMap<String, FeedConfig> {
    let mut feeds = HashMap::new();
    feeds.insert(
        "current_weather".to_string(),
        FeedConfig {
            path: "/api/CurrentWeather.xml".into(),
            source: "http://rss.weather.gov.hk/rss/CurrentWeather.xml".into(),
            content_type: "application/rss+xml; charset=utf-8".into(),
            ..FeedConfig::default()
        },
    );
    feeds.insert(
        "region".to_string(),
        FeedConfig {
            path: "/api/region.json".into(),
            source: "http://www.hko.gov.hk/wxinfo/json/region_json.xml".into(),
            content_type: "application/json; charset=utf-8".into(),
            notice: Some(
                "This source is not publicly announced by HKO. That means it can break without previous notice."
                    .into(),
            ),
            ..FeedConfig::default()
        },
    );
    feeds
}
