//! Caller credential forwarding.
//!
//! Inbound `Authorization` / `Cookie` headers are re-emitted in the shape the upstream API
//! expects. Nothing here logs or stores header values.

use crate::config::CredentialConfig;
use crate::error::{OpenApiToolsError, Result};
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue};
use std::fmt;

/// Authentication material supplied by the caller of a tool.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CallerCredentials {
    /// Raw inbound `Authorization` header value (e.g. `Bearer abc`).
    pub authorization: Option<HeaderValue>,
    /// Raw inbound `Cookie` header values.
    pub cookies: Vec<HeaderValue>,
}

impl CallerCredentials {
    /// Extract credentials from inbound request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            authorization: headers.get(AUTHORIZATION).cloned(),
            cookies: headers.get_all(COOKIE).iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorization.is_none() && self.cookies.is_empty()
    }

    /// Rebuild the inbound header shape.
    #[must_use]
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = &self.authorization {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        for cookie in &self.cookies {
            headers.append(COOKIE, cookie.clone());
        }
        headers
    }
}

impl fmt::Debug for CallerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerCredentials")
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("cookies", &self.cookies.len())
            .finish()
    }
}

/// Maps caller credentials to outbound upstream headers.
#[derive(Debug, Clone)]
pub struct CredentialForwarder {
    header_name: HeaderName,
    prefix: Option<String>,
}

impl Default for CredentialForwarder {
    fn default() -> Self {
        Self {
            header_name: AUTHORIZATION,
            prefix: None,
        }
    }
}

impl CredentialForwarder {
    /// Build a forwarder from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured header name is not a valid HTTP header name.
    pub fn new(config: &CredentialConfig) -> Result<Self> {
        let header_name = HeaderName::from_bytes(config.header_name.trim().as_bytes())
            .map_err(|e| {
                OpenApiToolsError::Config(format!(
                    "Invalid auth header name '{}': {e}",
                    config.header_name
                ))
            })?;
        let prefix = config
            .prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Ok(Self {
            header_name,
            prefix,
        })
    }

    #[must_use]
    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    /// Compute outbound headers from inbound request headers.
    ///
    /// - `Authorization: <scheme> <value>` becomes `<header_name>: <prefix> <value>` when a
    ///   prefix is configured; otherwise the inbound value is passed through under
    ///   `<header_name>`.
    /// - `Cookie` is forwarded unchanged.
    /// - Missing headers are simply omitted.
    #[must_use]
    pub fn forward(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut outbound = HeaderMap::new();

        if let Some(auth) = inbound.get(AUTHORIZATION)
            && let Some(value) = self.outbound_authorization(auth)
        {
            outbound.insert(self.header_name.clone(), value);
        }

        for cookie in inbound.get_all(COOKIE) {
            outbound.append(COOKIE, cookie.clone());
        }

        outbound
    }

    /// Same as [`Self::forward`], starting from already extracted credentials.
    #[must_use]
    pub fn forward_credentials(&self, credentials: &CallerCredentials) -> HeaderMap {
        self.forward(&credentials.to_headers())
    }

    /// Credentials for a configured API token (stdio transport, document fetch).
    ///
    /// Forwarding the result yields `<header_name>: <prefix> <token>`, or the bare token when
    /// no prefix is configured.
    #[must_use]
    pub fn static_credentials(&self, token: &str) -> CallerCredentials {
        let token = token.trim();
        if token.is_empty() {
            return CallerCredentials::default();
        }
        // With a prefix configured only the part after the first space survives forwarding,
        // so a placeholder scheme is put in front of the token.
        let raw = match &self.prefix {
            Some(_) => format!("Token {token}"),
            None => token.to_string(),
        };
        CallerCredentials {
            authorization: HeaderValue::from_str(&raw).ok(),
            cookies: Vec::new(),
        }
    }

    fn outbound_authorization(&self, inbound: &HeaderValue) -> Option<HeaderValue> {
        let Some(prefix) = &self.prefix else {
            return Some(inbound.clone());
        };
        let Ok(raw) = inbound.to_str() else {
            return Some(inbound.clone());
        };
        match raw.split_once(' ') {
            Some((_scheme, value)) => {
                let mut header = HeaderValue::from_str(&format!("{prefix} {value}")).ok()?;
                header.set_sensitive(true);
                Some(header)
            }
            None => Some(inbound.clone()),
        }
    }
}
