//! Canned responses written straight into a [`ResponseSink`].

use http::{HeaderValue, StatusCode, header};
use serde::Serialize;

use crate::ResponseSink;

/// Generic helper: status, content type and a binary body.
pub fn send_response(
    sink: &mut dyn ResponseSink,
    status: StatusCode,
    content_type: &'static str,
    body: &[u8],
) -> std::io::Result<()> {
    sink.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    sink.write_status(status);
    sink.write(body)?;
    Ok(())
}

fn send_text_response(
    sink: &mut dyn ResponseSink,
    status: StatusCode,
    body: &str,
) -> std::io::Result<()> {
    send_response(sink, status, "text/plain; charset=utf-8", body.as_bytes())
}

/// Serializes `value` as the JSON body. A value that fails to serialize
/// yields an empty object rather than an error.
pub fn send_json<T: Serialize>(
    sink: &mut dyn ResponseSink,
    status: StatusCode,
    value: &T,
) -> std::io::Result<()> {
    let mut body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    body.push(b'\n');
    send_response(sink, status, "application/json; charset=utf-8", &body)
}

pub fn send_html(sink: &mut dyn ResponseSink, body: &str) -> std::io::Result<()> {
    send_response(sink, StatusCode::OK, "text/html; charset=utf-8", body.as_bytes())
}

pub fn send_404(sink: &mut dyn ResponseSink) -> std::io::Result<()> {
    send_text_response(sink, StatusCode::NOT_FOUND, "404 Not Found\n")
}

pub fn send_500(sink: &mut dyn ResponseSink) -> std::io::Result<()> {
    send_text_response(
        sink,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error\n",
    )
}

/// 301 to `location`. Falls back to a 500 when `location` is not a valid
/// header value.
pub fn send_redirect(sink: &mut dyn ResponseSink, location: &str) -> std::io::Result<()> {
    let Ok(value) = HeaderValue::from_str(location) else {
        return send_500(sink);
    };
    sink.headers_mut().insert(header::LOCATION, value);
    sink.write_status(StatusCode::MOVED_PERMANENTLY);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{send_404, send_json, send_redirect};
    use crate::{ResponseSink, ResponseWriter};
    use http::{StatusCode, header};

    #[test]
    fn send_404_sets_plain_text_body() {
        let mut w = ResponseWriter::new();
        send_404(&mut w).expect("send");
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.body(), b"404 Not Found\n");
        assert_eq!(
            w.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn send_json_appends_newline() {
        let mut w = ResponseWriter::new();
        send_json(&mut w, StatusCode::BAD_GATEWAY, &serde_json::json!({"status": 502}))
            .expect("send");
        assert_eq!(w.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(w.body(), b"{\"status\":502}\n");
    }

    #[test]
    fn send_redirect_sets_location() {
        let mut w = ResponseWriter::new();
        send_redirect(&mut w, "https://example.com/api").expect("send");
        assert_eq!(w.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            w.headers().get(header::LOCATION).unwrap(),
            "https://example.com/api"
        );
    }

    #[test]
    fn send_redirect_rejects_invalid_location() {
        let mut w = ResponseWriter::new();
        send_redirect(&mut w, "https://example.com/\n").expect("send");
        assert_eq!(w.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
