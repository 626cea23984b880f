//! HTTP response cache for handlers backed by slow upstream sources.
//!
//! [`CacheLayer`] wraps a [`Handler`](weatherhk_http::Handler): a fresh
//! record found in the [`CacheStore`] is replayed without running the inner
//! handler, otherwise the inner handler runs against a [`CapturedResponse`]
//! and the captured output is persisted in the background. Freshness only
//! looks at `X-Grace-Expires` and `Expires` (see [`FreshnessPolicy`]).
//!
//! Every caching failure degrades to an uncached pass-through; nothing in
//! this crate turns into an error response for the client.

mod error;
mod key;
mod middleware;
mod policy;
mod record;
mod response;
mod store;
pub mod time;

pub use error::CacheError;
pub use key::CacheKey;
pub use middleware::{CacheLayer, X_CACHE};
pub use policy::{FreshnessPolicy, X_GRACE_EXPIRES};
pub use record::CachedRecord;
pub use response::CapturedResponse;
pub use store::{CacheStore, MemoryStore, RedisStore};
