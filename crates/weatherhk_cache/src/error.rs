use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// Header absent or empty. Freshness treats this as "no signal".
    #[error("header field `{0}` does not exist")]
    MissingHeader(String),

    #[error("cannot parse time {value:?} as RFC 2616 date")]
    MalformedTimestamp { value: String },

    /// Backend not configured or not reachable at startup.
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("cache store operation failed: {0}")]
    StoreOperationFailed(#[from] redis::RedisError),

    #[error("cannot encode cached record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cached record is corrupt: {0}")]
    CorruptRecord(String),
}
