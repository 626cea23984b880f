mod cache;
mod feed;
mod server;
mod validation;
mod weatherhk;

pub use cache::{CacheBackend, CacheConfig};
pub use feed::FeedConfig;
pub use server::ServerConfig;
pub use validation::{ConfigReport, MAX_TTL_SECS, validate};
pub use weatherhk::WeatherhkConfig;
