use std::fmt;

use weatherhk_http::RequestInfo;

const KEY_PREFIX: &str = "page:/";

/// Store key of a cached page. Built from the request path only; method
/// and query string are ignored.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_path(path: &str) -> Self {
        Self(format!("{KEY_PREFIX}{path}"))
    }

    pub fn for_request(req: &RequestInfo) -> Self {
        Self::from_path(req.path())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::CacheKey;
    use http::Method;
    use weatherhk_http::RequestInfo;

    #[test]
    fn key_ignores_method_and_query() {
        let mut get = RequestInfo::get("/api/region.json");
        get.query = Some("lang=en".into());
        let head = RequestInfo::new(Method::HEAD, "/api/region.json");

        assert_eq!(CacheKey::for_request(&get), CacheKey::for_request(&head));
        assert_eq!(CacheKey::for_request(&get).as_str(), "page://api/region.json");
    }

    #[test]
    fn distinct_paths_give_distinct_keys() {
        assert_ne!(CacheKey::from_path("/a/b"), CacheKey::from_path("/a"));
        assert_ne!(CacheKey::from_path("/"), CacheKey::from_path(""));
    }
}
