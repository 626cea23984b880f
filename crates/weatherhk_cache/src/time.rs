//! HTTP date codec with the fixed layout `Mon, 02 Jan 2006 15:04:05 GMT`.

use std::time::SystemTime;

use http::HeaderMap;

use crate::CacheError;

/// Length of an IMF-fixdate such as `Sun, 06 Nov 1994 08:49:37 GMT`.
const FIXDATE_LEN: usize = 29;

/// Renders `t` in UTC, always with the literal `GMT` suffix.
pub fn format_http_time(t: SystemTime) -> String {
    httpdate::fmt_http_date(t)
}

/// Parses an HTTP date in the fixed layout.
///
/// The last three characters are replaced by `GMT` first, so values carrying
/// another zone abbreviation (`HKT`, `UTC`) are read as if they were GMT.
pub fn parse_http_time(value: &str) -> Result<SystemTime, CacheError> {
    let malformed = || CacheError::MalformedTimestamp {
        value: value.to_string(),
    };

    if value.len() < 3 || !value.is_char_boundary(value.len() - 3) {
        return Err(malformed());
    }
    let normalized = format!("{}GMT", &value[..value.len() - 3]);

    // httpdate also accepts RFC 850 and asctime; only the fixdate layout is valid here.
    if normalized.len() != FIXDATE_LEN || normalized.as_bytes()[3] != b',' {
        return Err(malformed());
    }

    httpdate::parse_http_date(&normalized).map_err(|_| malformed())
}

/// Parses the first value of header `name` as an HTTP date.
pub fn parse_time_header(headers: &HeaderMap, name: &str) -> Result<SystemTime, CacheError> {
    let Some(value) = headers.get(name) else {
        return Err(CacheError::MissingHeader(name.to_string()));
    };
    if value.is_empty() {
        return Err(CacheError::MissingHeader(name.to_string()));
    }
    let value = value.to_str().map_err(|_| CacheError::MalformedTimestamp {
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })?;
    parse_http_time(value)
}
