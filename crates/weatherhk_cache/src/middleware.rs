use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use http::{HeaderName, HeaderValue};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use weatherhk_http::{Handler, RequestInfo, ResponseSink};

use crate::{CacheKey, CacheStore, CachedRecord, CapturedResponse, FreshnessPolicy};

/// Optional hit/miss indicator. Never part of a stored record.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Serves fresh cached responses and records the inner handler's output
/// otherwise.
///
/// Storage errors are logged and treated as misses. Concurrent misses on
/// the same key all run the inner handler and all persist; the last save
/// to finish wins.
pub struct CacheLayer<H> {
    inner: H,
    store: CacheStore,
    storage_ttl: Duration,
    status_header: bool,
}

impl<H: Handler> CacheLayer<H> {
    pub fn new(inner: H, store: CacheStore) -> Self {
        Self {
            inner,
            store,
            storage_ttl: FreshnessPolicy::default_storage_ttl(),
            status_header: false,
        }
    }

    /// TTL given to the backend on every save. Keep it above any realistic
    /// `Expires` window so the backend never evicts a fresh entry.
    pub fn with_storage_ttl(mut self, ttl: Duration) -> Self {
        self.storage_ttl = ttl;
        self
    }

    /// Adds `X-Cache: HIT|MISS` to client responses.
    pub fn with_status_header(mut self, enabled: bool) -> Self {
        self.status_header = enabled;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CapturedResponse<'static>> {
        match self.store.load(key).await {
            Ok(record) => record.map(CapturedResponse::from_record),
            Err(e) => {
                error!(target: "weatherhk::cache", cache_key = %key, error = %e, "error loading cache");
                None
            }
        }
    }

    /// Saves `record` from a detached task. The task owns everything it
    /// touches, so it outlives the request that produced the record.
    pub fn persist(&self, key: CacheKey, record: CachedRecord) -> JoinHandle<()> {
        let store = self.store.clone();
        let ttl = self.storage_ttl;
        tokio::spawn(async move {
            match store.save(&key, &record, ttl).await {
                Ok(()) => {
                    debug!(target: "weatherhk::cache", cache_key = %key, "cache saved");
                }
                Err(e) => {
                    error!(target: "weatherhk::cache", cache_key = %key, error = %e, "error saving cache");
                }
            }
        })
    }

    fn mark(&self, sink: &mut dyn ResponseSink, value: &'static str) {
        if self.status_header {
            sink.headers_mut()
                .insert(X_CACHE, HeaderValue::from_static(value));
        }
    }
}

#[async_trait]
impl<H: Handler> Handler for CacheLayer<H> {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        let key = CacheKey::for_request(req);

        if let Some(cached) = self.lookup(&key).await {
            if cached.is_fresh(SystemTime::now()) {
                info!(target: "weatherhk::cache", cache_key = %key, "use cache");
                cached.replay(sink)?;
                self.mark(sink, "HIT");
                return Ok(());
            }
        }

        info!(target: "weatherhk::cache", cache_key = %key, "no valid cache, trigger inner handler");

        let mut captured = CapturedResponse::new(sink);
        if let Err(e) = self.inner.serve(req, &mut captured).await {
            error!(target: "weatherhk::cache", cache_key = %key, error = %e, "inner handler failed; response not cached");
            return Ok(());
        }
        let record = captured.into_record();

        if self.store.is_enabled() {
            self.persist(key, record);
        }
        self.mark(sink, "MISS");

        Ok(())
    }
}
