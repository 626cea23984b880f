use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;

use crate::ResponseSink;

/// In-memory sink backing one inbound request.
///
/// Everything written is kept until the handler chain returns, then turned
/// into a hyper response with [`ResponseWriter::into_response`].
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut res = Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

impl ResponseSink for ResponseWriter {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseWriter;
    use crate::ResponseSink;
    use http::{HeaderValue, StatusCode};

    #[test]
    fn defaults_to_200_with_empty_body() {
        let w = ResponseWriter::new();
        assert_eq!(w.status(), StatusCode::OK);
        assert!(w.body().is_empty());
    }

    #[test]
    fn into_response_keeps_status_headers_and_body() {
        let mut w = ResponseWriter::new();
        w.headers_mut()
            .append("x-custom", HeaderValue::from_static("a"));
        w.headers_mut()
            .append("x-custom", HeaderValue::from_static("b"));
        w.write_status(StatusCode::BAD_GATEWAY);
        w.write(b"Hello ").expect("write");
        w.write(b"content").expect("write");

        let res = w.into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let values: Vec<_> = res.headers().get_all("x-custom").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }
}
