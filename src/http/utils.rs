//! URL and header helpers shared by the HTTP client.

use reqwest::header::HeaderMap;

use super::types::QueryParams;

/// Joins `base_url` and `endpoint` with exactly one slash and appends the
/// encoded query string when `params` is non-empty.
///
/// ```rust
/// use petple::http::{QueryParams, build_url};
///
/// assert_eq!(build_url("http://test.api.com/", "/endpoint", None), "http://test.api.com/endpoint");
///
/// let params = QueryParams::new().with("page", 2);
/// assert_eq!(
///     build_url("http://test.api.com", "endpoint", Some(&params)),
///     "http://test.api.com/endpoint?page=2"
/// );
/// ```
pub fn build_url(base_url: &str, endpoint: &str, params: Option<&QueryParams>) -> String {
    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );

    if let Some(params) = params.filter(|p| !p.is_empty()) {
        url.push('?');
        url.push_str(&params.encode());
    }

    url
}

/// Client defaults overwritten key by key with the per-call headers.
pub(crate) fn merge_headers(defaults: &HeaderMap, overrides: Option<&HeaderMap>) -> HeaderMap {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for name in overrides.keys() {
            merged.remove(name);
            for value in overrides.get_all(name) {
                merged.append(name.clone(), value.clone());
            }
        }
    }
    merged
}
