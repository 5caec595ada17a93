use crate::diagnostics::DiagnosticLogger;
use crate::error::{DeliveryError, Result};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashSet;

pub mod apns;
pub mod email;
pub mod fcm;
pub mod jpush;
pub mod wns;

/// Raw outcome of one provider HTTP request.
///
/// `status_code` is `None` when the request never produced a response
/// (connection failure, TLS error, timeout).
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub url: String,
    pub status_code: Option<u16>,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self { url: url.into(), status_code: Some(status_code), ..Self::default() }
    }

    /// Response placeholder for a request that failed before reaching the provider.
    #[must_use]
    pub fn failed(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    /// Adds a header; values may carry UTF-8 text. A name or value that is not a
    /// legal header (such as one containing a line break) is dropped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes());
        let value = HeaderValue::from_bytes(value.as_bytes());
        if let (Ok(name), Ok(value)) = (name, value) {
            self.headers.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as a string, or `None` when absent or not valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.is_some_and(|code| (200..300).contains(&code))
    }
}

/// Translates one provider's raw response into per-endpoint delivery statuses.
///
/// Implementations must produce a result covering exactly `endpoints` and emit
/// one warning through `logger` for every endpoint that did not succeed.
pub trait ResponseParser {
    type Raw: ?Sized;
    type Response;

    /// # Errors
    /// Returns a `DeliveryError` if `raw` does not have the shape this provider guarantees.
    fn parse(&self, raw: &Self::Raw, endpoints: &[String], logger: &dyn DiagnosticLogger) -> Result<Self::Response>;
}

/// Sends a payload to one endpoint. Implemented outside this crate.
#[async_trait]
pub trait PushTransport: Send + Sync + std::fmt::Debug {
    async fn send(&self, endpoint: &str, payload: &serde_json::Value) -> HttpResponse;
}

/// Rejects endpoint lists that name the same endpoint twice.
pub(crate) fn ensure_unique(endpoints: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(endpoints.len());
    for endpoint in endpoints {
        if !seen.insert(endpoint.as_str()) {
            return Err(DeliveryError::DuplicateEndpoint(endpoint.clone()));
        }
    }
    Ok(())
}
