use thiserror::Error;

/// Raised when a provider response does not match the shape its parser expects.
///
/// Ordinary delivery failures are never reported through this type; they are
/// expressed as a `PushNotificationStatus` for the affected endpoint.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Expected {expected} endpoint(s) for this response, got {actual}")]
    EndpointCount { expected: usize, actual: usize },
    #[error("Endpoint listed more than once in a single send: {0}")]
    DuplicateEndpoint(String),
    #[error("Provider response has no result for endpoint {0}")]
    MissingEndpoint(String),
    #[error("Provider response references endpoint outside the send: {0}")]
    UnexpectedEndpoint(String),
    #[error("No recipient registered for send index {0}")]
    UnknownSendIndex(u32),
    #[error("Malformed provider response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
