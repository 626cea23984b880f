use std::borrow::Cow;
use std::time::SystemTime;

use bytes::BytesMut;
use http::{HeaderMap, StatusCode};
use weatherhk_http::ResponseSink;

use crate::{CachedRecord, FreshnessPolicy};

const INITIAL_BODY_CAPACITY: usize = 4096;

/// Response decorator that records what a handler writes.
///
/// In live mode it wraps the real sink: headers are the sink's own header
/// map, and status and body writes are recorded and forwarded. A response
/// rebuilt with [`CapturedResponse::from_record`] has no sink and serves the
/// stored headers and body instead.
pub struct CapturedResponse<'a> {
    sink: Option<&'a mut dyn ResponseSink>,
    content: BytesMut,
    status: StatusCode,
    created_at: SystemTime,
    cached_headers: HeaderMap,
}

impl<'a> CapturedResponse<'a> {
    pub fn new(sink: &'a mut dyn ResponseSink) -> Self {
        Self {
            sink: Some(sink),
            content: BytesMut::with_capacity(INITIAL_BODY_CAPACITY),
            status: StatusCode::OK,
            created_at: SystemTime::now(),
            cached_headers: HeaderMap::new(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.sink.is_some()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn is_fresh(&self, now: SystemTime) -> bool {
        FreshnessPolicy::is_fresh(self.headers(), now)
    }

    /// Writes the recorded headers, status and body onto `sink`.
    pub fn replay(&self, sink: &mut dyn ResponseSink) -> std::io::Result<()> {
        let headers = self.headers();
        for name in headers.keys() {
            for value in headers.get_all(name) {
                sink.headers_mut().append(name.clone(), value.clone());
            }
        }
        sink.write_status(self.status);
        sink.write(&self.content)?;
        Ok(())
    }

    pub fn to_record(&self) -> CachedRecord {
        CachedRecord {
            status: self.status,
            headers: self.headers().clone(),
            body: bytes::Bytes::copy_from_slice(&self.content),
            created_at: self.created_at,
        }
    }

    /// Detaches the captured state from the live sink.
    pub fn into_record(self) -> CachedRecord {
        let headers = match self.sink {
            Some(sink) => sink.headers().clone(),
            None => self.cached_headers,
        };
        CachedRecord {
            status: self.status,
            headers,
            body: self.content.freeze(),
            created_at: self.created_at,
        }
    }
}

impl CapturedResponse<'static> {
    pub fn from_record(record: CachedRecord) -> Self {
        Self {
            sink: None,
            content: BytesMut::from(&record.body[..]),
            status: record.status,
            created_at: record.created_at,
            cached_headers: record.headers,
        }
    }
}

impl ResponseSink for CapturedResponse<'_> {
    fn headers(&self) -> &HeaderMap {
        match &self.sink {
            Some(sink) => sink.headers(),
            None => &self.cached_headers,
        }
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        match &mut self.sink {
            Some(sink) => sink.headers_mut(),
            None => &mut self.cached_headers,
        }
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
        if let Some(sink) = self.sink.as_mut() {
            sink.write_status(status);
        }
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.content.extend_from_slice(buf);
        match self.sink.as_mut() {
            Some(sink) => sink.write(buf),
            None => Ok(buf.len()),
        }
    }
}
