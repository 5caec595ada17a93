use crate::adapters::push::{HttpResponse, ResponseParser, ensure_unique};
use crate::diagnostics::{DiagnosticLogger, LogContext};
use crate::domain::report::{DeliveryReport, StatusSource};
use crate::domain::status::PushNotificationStatus;
use crate::error::{DeliveryError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const DISPATCH_WARNING: &str = "Dispatching FCM notification failed for endpoint {endpoint}: {error}";

/// Message FCM returns with a 400 when the target token itself is malformed.
pub const INVALID_TOKEN_MESSAGE: &str = "The registration token is not a valid FCM registration token";

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok()?.error?.message
}

/// Statuses for the endpoints of one FCM sub-batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcmBatchResponse {
    report: DeliveryReport,
}

impl FcmBatchResponse {
    #[must_use]
    pub const fn report(&self) -> &DeliveryReport {
        &self.report
    }
}

impl StatusSource for FcmBatchResponse {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.report.lookup(endpoint)
    }
}

/// Parses the per-endpoint HTTP v1 responses of one sub-batch.
///
/// The raw input maps every endpoint of the batch to the response of its send.
#[derive(Debug, Default, Clone, Copy)]
pub struct FcmBatchParser;

impl FcmBatchParser {
    fn classify(response: &HttpResponse) -> (PushNotificationStatus, &'static str) {
        match response.status_code {
            None => (PushNotificationStatus::Error, "Request failed"),
            Some(200) => (PushNotificationStatus::Success, ""),
            Some(400) if error_message(&response.body).as_deref() == Some(INVALID_TOKEN_MESSAGE) => {
                (PushNotificationStatus::InvalidEndpoint, "Invalid registration token")
            }
            Some(400) => (PushNotificationStatus::Error, "Invalid argument"),
            Some(401) => (PushNotificationStatus::Error, "Error with authentication"),
            Some(403) => (PushNotificationStatus::Error, "Mismatched sender"),
            Some(404) => (PushNotificationStatus::InvalidEndpoint, "Unregistered or missing token"),
            Some(429) => (PushNotificationStatus::TemporaryError, "Exceeded quota error"),
            Some(500) => (PushNotificationStatus::TemporaryError, "Internal error"),
            Some(503) => (PushNotificationStatus::TemporaryError, "Timeout"),
            Some(_) => (PushNotificationStatus::Unknown, "Unknown error"),
        }
    }
}

impl ResponseParser for FcmBatchParser {
    type Raw = HashMap<String, HttpResponse>;
    type Response = FcmBatchResponse;

    fn parse(
        &self,
        raw: &HashMap<String, HttpResponse>,
        endpoints: &[String],
        logger: &dyn DiagnosticLogger,
    ) -> Result<FcmBatchResponse> {
        ensure_unique(endpoints)?;

        let expected: HashSet<&str> = endpoints.iter().map(String::as_str).collect();
        if let Some(stray) = raw.keys().find(|endpoint| !expected.contains(endpoint.as_str())) {
            return Err(DeliveryError::UnexpectedEndpoint(stray.clone()));
        }

        let mut report = DeliveryReport::new();
        for endpoint in endpoints {
            let response = raw.get(endpoint).ok_or_else(|| DeliveryError::MissingEndpoint(endpoint.clone()))?;
            let (status, description) = Self::classify(response);
            report.record(endpoint, status);

            if !status.is_success() {
                let error = error_message(&response.body).unwrap_or_else(|| description.to_owned());
                let context = LogContext::from([("endpoint", endpoint.clone()), ("error", error)]);
                logger.warning(DISPATCH_WARNING, &context);
            }
        }

        Ok(FcmBatchResponse { report })
    }
}

/// Cumulative statuses across every sub-batch of one FCM send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FcmResponse {
    report: DeliveryReport,
}

impl FcmResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one sub-batch; later batches win for shared endpoints.
    pub fn add_batch_response<P>(&mut self, batch: &P, endpoints: &[String]) -> &mut Self
    where
        P: StatusSource + ?Sized,
    {
        self.report.merge_batch(batch, endpoints);
        self
    }

    #[must_use]
    pub const fn report(&self) -> &DeliveryReport {
        &self.report
    }

    #[must_use]
    pub fn into_report(self) -> DeliveryReport {
        self.report
    }
}

impl StatusSource for FcmResponse {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.report.lookup(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingLogger;

    const FCM_URL: &str = "https://fcm.googleapis.com/v1/projects/demo/messages:send";

    fn error_body(message: &str) -> String {
        serde_json::json!({ "error": { "code": 400, "message": message, "status": "INVALID_ARGUMENT" } }).to_string()
    }

    fn raw(entries: Vec<(&str, HttpResponse)>) -> HashMap<String, HttpResponse> {
        entries.into_iter().map(|(endpoint, response)| (endpoint.to_string(), response)).collect()
    }

    fn list(endpoints: &[&str]) -> Vec<String> {
        endpoints.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_status_code_table() {
        let cases = [
            (Some(200), PushNotificationStatus::Success),
            (Some(400), PushNotificationStatus::Error),
            (Some(401), PushNotificationStatus::Error),
            (Some(403), PushNotificationStatus::Error),
            (Some(404), PushNotificationStatus::InvalidEndpoint),
            (Some(429), PushNotificationStatus::TemporaryError),
            (Some(500), PushNotificationStatus::TemporaryError),
            (Some(503), PushNotificationStatus::TemporaryError),
            (Some(502), PushNotificationStatus::Unknown),
            (None, PushNotificationStatus::Error),
        ];

        for (code, expected) in cases {
            let response = HttpResponse { status_code: code, ..HttpResponse::failed(FCM_URL) };
            assert_eq!(FcmBatchParser::classify(&response).0, expected, "{code:?}");
        }
    }

    #[test]
    fn test_invalid_token_message_marks_endpoint_invalid() {
        let logger = RecordingLogger::new();
        let raw = raw(vec![("token1", HttpResponse::new(FCM_URL, 400).with_body(error_body(INVALID_TOKEN_MESSAGE)))]);

        let response = FcmBatchParser.parse(&raw, &list(&["token1"]), &logger).unwrap();

        assert_eq!(response.get_status("token1"), PushNotificationStatus::InvalidEndpoint);
        assert_eq!(logger.records()[0].field("error"), Some(INVALID_TOKEN_MESSAGE));
    }

    #[test]
    fn test_logs_only_failures_with_provider_message() {
        let logger = RecordingLogger::new();
        let raw = raw(vec![
            ("token1", HttpResponse::new(FCM_URL, 200)),
            ("token2", HttpResponse::new(FCM_URL, 404).with_body(error_body("Requested entity was not found."))),
            ("token3", HttpResponse::new(FCM_URL, 503)),
        ]);

        let response = FcmBatchParser.parse(&raw, &list(&["token1", "token2", "token3"]), &logger).unwrap();

        assert_eq!(response.report().len(), 3);
        assert_eq!(response.get_status("token1"), PushNotificationStatus::Success);
        assert_eq!(response.get_status("token2"), PushNotificationStatus::InvalidEndpoint);
        assert_eq!(response.get_status("token3"), PushNotificationStatus::TemporaryError);

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message(), "Dispatching FCM notification failed for endpoint token2: Requested entity was not found.");
        assert_eq!(records[1].message(), "Dispatching FCM notification failed for endpoint token3: Timeout");
    }

    #[test]
    fn test_missing_and_stray_endpoints_are_rejected() {
        let logger = RecordingLogger::new();

        let partial = raw(vec![("token1", HttpResponse::new(FCM_URL, 200))]);
        let err = FcmBatchParser.parse(&partial, &list(&["token1", "token2"]), &logger).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingEndpoint(endpoint) if endpoint == "token2"));

        let stray = raw(vec![("token1", HttpResponse::new(FCM_URL, 200)), ("token9", HttpResponse::new(FCM_URL, 200))]);
        let err = FcmBatchParser.parse(&stray, &list(&["token1"]), &logger).unwrap_err();
        assert!(matches!(err, DeliveryError::UnexpectedEndpoint(endpoint) if endpoint == "token9"));
    }

    #[test]
    fn test_add_batch_response_with_no_endpoint_keeps_statuses() {
        let logger = RecordingLogger::new();
        let first = FcmBatchParser
            .parse(
                &raw(vec![("endpoint1", HttpResponse::new(FCM_URL, 400)), ("endpoint2", HttpResponse::new(FCM_URL, 200))]),
                &list(&["endpoint1", "endpoint2"]),
                &logger,
            )
            .unwrap();

        let mut cumulative = FcmResponse::new();
        cumulative.add_batch_response(&first, &list(&["endpoint1", "endpoint2"]));
        let before = cumulative.clone();

        cumulative.add_batch_response(&first, &[]);

        assert_eq!(cumulative, before);
    }

    #[test]
    fn test_add_batch_response_overwrites_batch_endpoints() {
        let mut statuses = HashMap::new();
        statuses.insert("endpoint1".to_string(), PushNotificationStatus::Error);
        statuses.insert("endpoint2".to_string(), PushNotificationStatus::Success);

        let mut cumulative = FcmResponse::new();
        cumulative.add_batch_response(&statuses, &list(&["endpoint1", "endpoint2"]));

        let mut batch = HashMap::new();
        batch.insert("endpoint2".to_string(), PushNotificationStatus::InvalidEndpoint);
        batch.insert("endpoint4".to_string(), PushNotificationStatus::Success);
        cumulative.add_batch_response(&batch, &list(&["endpoint2", "endpoint3", "endpoint4"]));

        let report = cumulative.report();
        assert_eq!(report.len(), 4);
        assert_eq!(report.get_status("endpoint1"), PushNotificationStatus::Error);
        assert_eq!(report.get_status("endpoint2"), PushNotificationStatus::InvalidEndpoint);
        assert_eq!(report.get_status("endpoint3"), PushNotificationStatus::Unknown);
        assert_eq!(report.get_status("endpoint4"), PushNotificationStatus::Success);
    }
}
