use std::time::SystemTime;

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

use crate::CacheError;

/// One stored response: status, headers, body and creation time.
///
/// Header names keep their first-insertion order and every name keeps its
/// values in insertion order, so a decoded record replays the same header
/// block that was captured. Header values are stored as base64 of their raw
/// bytes, like the body, so obs-text survives the round trip.
#[derive(Debug, Clone)]
pub struct CachedRecord {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub created_at: SystemTime,
}

impl Default for CachedRecord {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            created_at: SystemTime::now(),
        }
    }
}

#[derive(Serialize)]
struct StoredRecordRef<'a> {
    status: u16,
    headers: Vec<(&'a str, Vec<String>)>,
    body: String,
    created_at: SystemTime,
}

#[derive(Deserialize)]
struct StoredRecord {
    status: u16,
    headers: Vec<(String, Vec<String>)>,
    body: String,
    created_at: SystemTime,
}

impl CachedRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        let headers = self
            .headers
            .keys()
            .map(|name| {
                let values = self
                    .headers
                    .get_all(name)
                    .iter()
                    .map(|v| STANDARD.encode(v.as_bytes()))
                    .collect();
                (name.as_str(), values)
            })
            .collect();

        let stored = StoredRecordRef {
            status: self.status.as_u16(),
            headers,
            body: STANDARD.encode(&self.body),
            created_at: self.created_at,
        };
        Ok(serde_json::to_vec(&stored)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        let stored: StoredRecord = serde_json::from_slice(bytes)?;

        let status = StatusCode::from_u16(stored.status)
            .map_err(|_| CacheError::CorruptRecord(format!("invalid status {}", stored.status)))?;

        let mut headers = HeaderMap::new();
        for (name, values) in stored.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| CacheError::CorruptRecord(format!("invalid header name {name:?}")))?;
            for value in values {
                let raw = STANDARD.decode(value.as_bytes()).map_err(|e| {
                    CacheError::CorruptRecord(format!("invalid encoding for header {name}: {e}"))
                })?;
                let value = HeaderValue::from_bytes(&raw).map_err(|_| {
                    CacheError::CorruptRecord(format!("invalid value for header {name}"))
                })?;
                headers.append(name.clone(), value);
            }
        }

        let body = STANDARD
            .decode(stored.body.as_bytes())
            .map_err(|e| CacheError::CorruptRecord(format!("invalid body encoding: {e}")))?;

        Ok(Self {
            status,
            headers,
            body: Bytes::from(body),
            created_at: stored.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CachedRecord;
    use crate::CacheError;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};

    fn sample() -> CachedRecord {
        let mut headers = HeaderMap::new();
        headers.append("content-type", HeaderValue::from_static("application/json"));
        headers.append("x-custom-header", HeaderValue::from_static("value 1"));
        headers.append("x-custom-header", HeaderValue::from_static("value 2"));
        headers.append("x-custom-header", HeaderValue::from_static("value 3"));
        headers.append(
            "x-latin1",
            HeaderValue::from_bytes(b"caf\xe9").expect("obs-text header value"),
        );
        CachedRecord {
            status: StatusCode::PARTIAL_CONTENT,
            headers,
            body: Bytes::from_static(b"\x00binary\xffbody"),
            ..CachedRecord::default()
        }
    }

    #[test]
    fn decode_restores_status_headers_and_body() {
        let record = sample();
        let decoded = CachedRecord::from_bytes(&record.to_bytes().expect("encode")).expect("decode");

        assert_eq!(decoded.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(decoded.body, record.body);
        assert_eq!(decoded.created_at, record.created_at);
        let values: Vec<_> = decoded.headers.get_all("x-custom-header").iter().collect();
        assert_eq!(values, vec!["value 1", "value 2", "value 3"]);
        assert_eq!(decoded.headers.len(), record.headers.len());
        assert_eq!(
            decoded.headers.get("x-latin1").expect("x-latin1").as_bytes(),
            b"caf\xe9"
        );
    }

    #[test]
    fn decode_rejects_bad_header_encoding() {
        let raw = br#"{"status":200,"headers":[["x-a",["%%%"]]],"body":"","created_at":{"secs_since_epoch":0,"nanos_since_epoch":0}}"#;
        let err = CachedRecord::from_bytes(raw).unwrap_err();
        assert!(matches!(err, CacheError::CorruptRecord(_)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = CachedRecord::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[test]
    fn decode_rejects_invalid_status() {
        let raw = br#"{"status":42,"headers":[],"body":"","created_at":{"secs_since_epoch":0,"nanos_since_epoch":0}}"#;
        let err = CachedRecord::from_bytes(raw).unwrap_err();
        assert!(matches!(err, CacheError::CorruptRecord(_)));
    }
}
