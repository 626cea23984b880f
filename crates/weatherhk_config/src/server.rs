use serde::Deserialize;

// =======================================================
// SERVER CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public host name used for HTTPS redirects.
    pub hostname: String,
    /// Redirect requests whose `X-Forwarded-Proto` is not `https`.
    pub force_https: bool,
    /// Maximum number of concurrently served connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            hostname: "localhost".into(),
            force_https: false,
            max_connections: 1024,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn force_https(&self) -> bool {
        self.force_https
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &ServerConfig) {
        if self.host.is_empty() {
            self.host = defaults.host.clone();
        }
        if self.port == 0 {
            self.port = defaults.port;
        }
        if self.hostname.is_empty() {
            self.hostname = defaults.hostname.clone();
        }
        if self.max_connections == 0 {
            self.max_connections = defaults.max_connections;
        }
    }
}
