//! Server side of weatherhk: the hyper accept loop, the middleware chain and
//! the routes it ends in.
//!
//! Requests flow outer to inner through
//! `RequestId -> Timing -> EnforceHttps -> CacheLayer -> Router`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use weatherhk_cache::{CacheLayer, CacheStore};
use weatherhk_config::WeatherhkConfig;
use weatherhk_http::Handler;

pub mod feed;
pub mod index;
pub mod middleware;
pub mod router;
pub mod server;

pub use feed::FeedHandler;
pub use index::IndexHandler;
pub use middleware::{EnforceHttps, RequestId, Timing};
pub use router::Router;
pub use server::{Server, handle_request};

/// Routes: `/` is the index page, every configured feed is mounted at its path.
pub fn build_router(cfg: &WeatherhkConfig) -> anyhow::Result<Router> {
    let mut router = Router::new().route("/", IndexHandler::new(cfg.feeds()));

    for (name, feed_cfg) in cfg.feeds() {
        let handler = FeedHandler::new(name.as_str(), feed_cfg)
            .with_context(|| format!("building feed '{name}'"))?;
        info!(
            target: "weatherhk::server",
            feed = %name,
            path = %feed_cfg.path(),
            source = %feed_cfg.source(),
            "Feed mounted"
        );
        router = router.route(feed_cfg.path(), handler);
    }

    Ok(router)
}

/// Assembles the complete handler chain around the router.
pub fn build_app(cfg: &WeatherhkConfig, store: CacheStore) -> anyhow::Result<Arc<dyn Handler>> {
    let router = build_router(cfg)?;

    let cache = CacheLayer::new(router, store)
        .with_storage_ttl(Duration::from_secs(cfg.cache().storage_ttl_secs()))
        .with_status_header(cfg.cache().status_header());
    let https = EnforceHttps::new(
        cache,
        cfg.server().force_https(),
        cfg.server().hostname(),
    );

    Ok(Arc::new(RequestId::new(Timing::new(https))))
}
