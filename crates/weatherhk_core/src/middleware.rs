use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use http::{HeaderName, HeaderValue};
use tracing::{debug, info};
use weatherhk_http::{Handler, RequestInfo, ResponseSink, responses};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

const REQUEST_ID_LEN: usize = 7;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Short hex id derived from the current time and a process-wide counter.
pub fn generate_request_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    nanos.hash(&mut hasher);
    REQUEST_SEQ.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);

    let mut id = format!("{:016x}", hasher.finish());
    id.truncate(REQUEST_ID_LEN);
    id
}

// =======================================================
// REQUEST ID
// =======================================================
/// Makes sure every request carries `X-Request-ID` and records it on the
/// current request span.
pub struct RequestId<H> {
    inner: H,
}

impl<H: Handler> RequestId<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: Handler> Handler for RequestId<H> {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        if let Some(id) = req.header(X_REQUEST_ID.as_str()).filter(|id| !id.is_empty()) {
            tracing::Span::current().record("request_id", id);
            return self.inner.serve(req, sink).await;
        }

        let id = generate_request_id();
        tracing::Span::current().record("request_id", id.as_str());

        let mut req = req.clone();
        req.headers.insert(X_REQUEST_ID, HeaderValue::from_str(&id)?);
        self.inner.serve(&req, sink).await
    }
}

// =======================================================
// TIMING
// =======================================================
/// Logs how long the wrapped handler took.
pub struct Timing<H> {
    inner: H,
}

impl<H: Handler> Timing<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: Handler> Handler for Timing<H> {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        let start = Instant::now();
        let result = self.inner.serve(req, sink).await;
        let spent = start.elapsed();

        info!(
            target: "weatherhk::server",
            request_id = req.header(X_REQUEST_ID.as_str()).unwrap_or("-"),
            request_time = ?spent,
            "Request served"
        );
        result
    }
}

// =======================================================
// HTTPS ENFORCEMENT
// =======================================================
/// Redirects plain-HTTP requests (as reported by the fronting proxy in
/// `X-Forwarded-Proto`) to `https://<hostname><path>`.
pub struct EnforceHttps<H> {
    inner: H,
    enabled: bool,
    hostname: String,
}

impl<H: Handler> EnforceHttps<H> {
    pub fn new(inner: H, enabled: bool, hostname: impl Into<String>) -> Self {
        Self {
            inner,
            enabled,
            hostname: hostname.into(),
        }
    }

    fn redirect_location(&self, req: &RequestInfo) -> String {
        format!("https://{}{}", self.hostname, req.path_and_query())
    }
}

#[async_trait]
impl<H: Handler> Handler for EnforceHttps<H> {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        if self.enabled && req.header(X_FORWARDED_PROTO.as_str()) != Some("https") {
            let location = self.redirect_location(req);
            debug!(target: "weatherhk::server", location = %location, "Redirecting to https");
            responses::send_redirect(sink, &location)?;
            return Ok(());
        }
        self.inner.serve(req, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::{EnforceHttps, RequestId, Timing, X_REQUEST_ID, generate_request_id};
    use async_trait::async_trait;
    use http::{HeaderValue, StatusCode, header};
    use std::sync::{Arc, Mutex};
    use weatherhk_http::{Handler, RequestInfo, ResponseSink, ResponseWriter};

    /// Records the request id it was called with.
    #[derive(Default)]
    struct Probe {
        seen: Arc<Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl Handler for Probe {
        async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
            self.seen
                .lock()
                .unwrap()
                .push(req.header(X_REQUEST_ID.as_str()).map(str::to_string));
            sink.write(b"inner")?;
            Ok(())
        }
    }

    #[test]
    fn generated_ids_are_short_hex() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_eq!(a.len(), 7);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn request_id_is_added_when_missing() {
        let probe = Probe::default();
        let seen = probe.seen.clone();
        let handler = RequestId::new(probe);

        let mut sink = ResponseWriter::new();
        handler
            .serve(&RequestInfo::get("/"), &mut sink)
            .await
            .expect("serve");

        let seen = seen.lock().unwrap();
        let id = seen[0].as_deref().expect("request id");
        assert_eq!(id.len(), 7);
    }

    #[tokio::test]
    async fn request_id_is_kept_when_present() {
        let probe = Probe::default();
        let seen = probe.seen.clone();
        let handler = Timing::new(RequestId::new(probe));

        let mut req = RequestInfo::get("/");
        req.headers
            .insert(X_REQUEST_ID, HeaderValue::from_static("abc1234"));
        let mut sink = ResponseWriter::new();
        handler.serve(&req, &mut sink).await.expect("serve");

        assert_eq!(seen.lock().unwrap()[0].as_deref(), Some("abc1234"));
        assert_eq!(sink.body(), b"inner");
    }

    #[tokio::test]
    async fn plain_http_is_redirected_when_enforced() {
        let handler = EnforceHttps::new(Probe::default(), true, "weather.example.com");

        let mut req = RequestInfo::get("/api/region.json");
        req.query = Some("lang=en".into());
        let mut sink = ResponseWriter::new();
        handler.serve(&req, &mut sink).await.expect("serve");

        assert_eq!(sink.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            sink.headers().get(header::LOCATION).unwrap(),
            "https://weather.example.com/api/region.json?lang=en"
        );
        assert!(sink.body().is_empty());
    }

    #[tokio::test]
    async fn forwarded_https_passes_through() {
        let handler = EnforceHttps::new(Probe::default(), true, "weather.example.com");

        let mut req = RequestInfo::get("/");
        req.headers
            .insert("x-forwarded-proto", HeaderValue::from_static("https"));
        let mut sink = ResponseWriter::new();
        handler.serve(&req, &mut sink).await.expect("serve");

        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.body(), b"inner");
    }

    #[tokio::test]
    async fn disabled_enforcement_passes_through() {
        let handler = EnforceHttps::new(Probe::default(), false, "weather.example.com");
        let mut sink = ResponseWriter::new();
        handler
            .serve(&RequestInfo::get("/"), &mut sink)
            .await
            .expect("serve");
        assert_eq!(sink.body(), b"inner");
    }
}
