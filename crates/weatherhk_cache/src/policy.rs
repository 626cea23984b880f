use std::time::{Duration, SystemTime};

use http::{HeaderMap, HeaderName, header};
use tracing::{debug, warn};

use crate::CacheError;
use crate::time::parse_time_header;

/// Grace override: extends usability of a record without touching the
/// `Expires` value clients see.
pub const X_GRACE_EXPIRES: HeaderName = HeaderName::from_static("x-grace-expires");

pub struct FreshnessPolicy;

impl FreshnessPolicy {
    /// Whether a response with `headers` may still be served at `now`.
    ///
    /// `X-Grace-Expires` is consulted first; a malformed value is logged and
    /// ignored, and a grace value already in the past defers to `Expires`
    /// rather than forcing staleness. Then `Expires`; a malformed value there
    /// makes the record stale. No usable header means stale.
    pub fn is_fresh(headers: &HeaderMap, now: SystemTime) -> bool {
        match parse_time_header(headers, X_GRACE_EXPIRES.as_str()) {
            Ok(expires) if expires > now => {
                debug!(target: "weatherhk::cache", "cache graced");
                return true;
            }
            Ok(_) | Err(CacheError::MissingHeader(_)) => {}
            Err(e) => {
                warn!(target: "weatherhk::cache", error = %e, "error parsing X-Grace-Expires");
            }
        }

        match parse_time_header(headers, header::EXPIRES.as_str()) {
            Ok(expires) if expires > now => {
                debug!(target: "weatherhk::cache", "cache not expired");
                true
            }
            Ok(_) | Err(CacheError::MissingHeader(_)) => false,
            Err(e) => {
                warn!(target: "weatherhk::cache", error = %e, "error parsing Expires");
                false
            }
        }
    }

    /// Storage-level TTL applied on every save, independent of `Expires`.
    pub fn default_storage_ttl() -> Duration {
        Duration::from_secs(60 * 60)
    }
}
