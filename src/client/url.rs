//! Upstream URL composition.
//!
//! `base_url + path`, then `?k=v&…` when a non-empty query map is given.
//! Path segments are taken as-is; callers substitute parameters themselves.

use std::collections::BTreeMap;

/// Query parameters, encoded in key order.
pub type QueryParams = BTreeMap<String, String>;

pub fn compose(base_url: &str, path: &str, query: Option<&QueryParams>) -> String {
    let mut url = String::with_capacity(base_url.len() + path.len());
    url.push_str(base_url);
    url.push_str(path);

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        url.push('?');
        url.push_str(&encoded);
    }
    url
}
