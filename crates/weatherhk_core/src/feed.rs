use std::time::{Duration, SystemTime};

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, Request, StatusCode, Uri, header};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use weatherhk_cache::time::{format_http_time, parse_http_time};
use weatherhk_config::FeedConfig;
use weatherhk_http::{Handler, RequestInfo, ResponseSink, responses};

/// `max-age` advertised once a feed is already past its `Expires`.
pub const EXPIRED_MAX_AGE_SECS: u64 = 5 * 60;

/// Longest lifetime a feed may advertise.
pub const MAX_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

const USER_AGENT: &str = concat!("weatherhk/", env!("CARGO_PKG_VERSION"));

/// Seconds from `now` until `expires`, or [`EXPIRED_MAX_AGE_SECS`] when
/// `expires` is already behind us.
pub fn max_age(expires: SystemTime, now: SystemTime) -> u64 {
    match expires.duration_since(now) {
        Ok(left) => left.as_secs(),
        Err(_) => EXPIRED_MAX_AGE_SECS,
    }
}

#[derive(Debug)]
struct UpstreamResponse {
    last_modified: Option<SystemTime>,
    body: Bytes,
}

#[derive(Serialize)]
struct FeedError<'a> {
    status: u16,
    message: String,
    source: &'a str,
}

/// Relays one upstream document and stamps it with caching headers.
///
/// The body is passed through untouched. `Expires` is the upstream
/// publication time (its `Last-Modified` unless that lies in the future,
/// otherwise now) plus the feed lifetime, capped at [`MAX_LIFETIME`].
/// Upstream failures answer 502 without `Expires`, so the cache never
/// keeps them.
#[derive(Debug)]
pub struct FeedHandler {
    name: String,
    source: String,
    authority: String,
    host: String,
    port: u16,
    path_and_query: String,
    content_type: HeaderValue,
    lifetime: Duration,
    timeout: Duration,
}

impl FeedHandler {
    pub fn new(name: impl Into<String>, cfg: &FeedConfig) -> anyhow::Result<Self> {
        let name = name.into();
        let uri: Uri = cfg
            .source()
            .parse()
            .with_context(|| format!("feed '{name}': invalid source url {:?}", cfg.source()))?;

        if uri.scheme_str() != Some("http") {
            bail!("feed '{name}': only http:// sources are supported");
        }
        let authority = uri
            .authority()
            .ok_or_else(|| anyhow!("feed '{name}': source url has no host"))?;

        let content_type = HeaderValue::from_str(cfg.content_type())
            .with_context(|| format!("feed '{name}': invalid content_type"))?;

        Ok(Self {
            source: cfg.source().to_string(),
            authority: authority.as_str().to_string(),
            host: authority.host().to_string(),
            port: authority.port_u16().unwrap_or(80),
            path_and_query: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".into()),
            content_type,
            lifetime: Duration::from_secs(cfg.lifetime_secs()).min(MAX_LIFETIME),
            timeout: Duration::from_secs(cfg.timeout_secs()),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    async fn fetch(&self) -> anyhow::Result<UpstreamResponse> {
        match tokio::time::timeout(self.timeout, self.fetch_once()).await {
            Ok(result) => result,
            Err(_) => bail!("upstream timed out after {}s", self.timeout.as_secs()),
        }
    }

    async fn fetch_once(&self) -> anyhow::Result<UpstreamResponse> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("connecting to {}", self.authority))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .context("upstream handshake failed")?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(target: "weatherhk::feed", error = %e, "Upstream connection closed with error");
            }
        });

        let req = Request::builder()
            .method(Method::GET)
            .uri(self.path_and_query.as_str())
            .header(header::HOST, self.authority.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .body(Empty::<Bytes>::new())?;

        let res = sender
            .send_request(req)
            .await
            .context("upstream request failed")?;

        if !res.status().is_success() {
            bail!("upstream responded with {}", res.status());
        }

        let last_modified = res
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_http_time(v).ok());

        let body = res
            .into_body()
            .collect()
            .await
            .context("reading upstream body")?
            .to_bytes();

        Ok(UpstreamResponse {
            last_modified,
            body,
        })
    }

    fn write_feed(
        &self,
        sink: &mut dyn ResponseSink,
        upstream: UpstreamResponse,
        now: SystemTime,
    ) -> anyhow::Result<()> {
        let published = upstream
            .last_modified
            .filter(|t| *t <= now)
            .unwrap_or(now);
        let expires = published.checked_add(self.lifetime).unwrap_or(published);

        let headers = sink.headers_mut();
        headers.insert(header::CONTENT_TYPE, self.content_type.clone());
        headers.insert(
            header::LAST_MODIFIED,
            HeaderValue::from_str(&format_http_time(published))?,
        );
        headers.insert(
            header::EXPIRES,
            HeaderValue::from_str(&format_http_time(expires))?,
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_str(&format!("public, max-age={}", max_age(expires, now)))?,
        );

        sink.write_status(StatusCode::OK);
        sink.write(&upstream.body)?;
        Ok(())
    }
}

#[async_trait]
impl Handler for FeedHandler {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        match self.fetch().await {
            Ok(upstream) => {
                debug!(
                    target: "weatherhk::feed",
                    feed = %self.name,
                    bytes = upstream.body.len(),
                    "Upstream document fetched"
                );
                self.write_feed(sink, upstream, SystemTime::now())
            }
            Err(e) => {
                warn!(
                    target: "weatherhk::feed",
                    feed = %self.name,
                    source = %self.source,
                    request_id = req.header("x-request-id").unwrap_or("-"),
                    error = %e,
                    "Upstream fetch failed"
                );
                let body = FeedError {
                    status: StatusCode::BAD_GATEWAY.as_u16(),
                    message: format!("{e:#}"),
                    source: &self.source,
                };
                responses::send_json(sink, StatusCode::BAD_GATEWAY, &body)?;
                Ok(())
            }
        }
    }
}
