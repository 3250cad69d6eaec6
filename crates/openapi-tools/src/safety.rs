//! Redaction helpers for anything that ends up in logs or user-visible messages.
//!
//! Upstream URLs may carry credentials (userinfo, API keys in query strings); messages built
//! from them must go through these helpers first.

use url::Url;

/// Drop userinfo, query, and fragment from a URL.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Redact a location that may be a URL or a plain file path.
#[must_use]
pub fn redact_location(location: &str) -> String {
    match Url::parse(location) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => redact_url(&u),
        _ => location.to_string(),
    }
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
