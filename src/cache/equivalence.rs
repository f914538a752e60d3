//! Request equivalence for cache matching.

use url::Url;

use crate::config::CacheSettings;
use crate::http::{digest_body, FetchRequest};

/// Cache key: the URL without fragment or query.
pub fn cache_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.set_query(None);
    key.into()
}

/// URL compared for equivalence: fragment always dropped, query dropped when
/// `ignore_search` is set.
fn comparable_url(url: &Url, ignore_search: bool) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    if ignore_search {
        url.set_query(None);
    }
    url
}

fn sorted_headers(request: &FetchRequest) -> Vec<(&str, &[u8])> {
    let mut pairs: Vec<(&str, &[u8])> = request
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_bytes()))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// True if `a` and `b` would fetch the same resource.
///
/// Compares URLs, methods (unless `ignore_method`), headers as an unordered
/// multiset of name/value pairs, and body digests under the configured
/// algorithm. A streamed body cannot be hashed without consuming it, so a
/// request carrying one is never equivalent to anything.
pub fn fetch_equivalent(a: &FetchRequest, b: &FetchRequest, settings: &CacheSettings) -> bool {
    let ignore_search = settings.ignore_search;
    if comparable_url(&a.url, ignore_search) != comparable_url(&b.url, ignore_search) {
        return false;
    }
    if !settings.ignore_method && a.method != b.method {
        return false;
    }
    if a.headers.len() != b.headers.len() || sorted_headers(a) != sorted_headers(b) {
        return false;
    }

    let algorithm = settings.hash_algorithm;
    match (
        digest_body(algorithm, a.body.as_ref()),
        digest_body(algorithm, b.body.as_ref()),
    ) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}
