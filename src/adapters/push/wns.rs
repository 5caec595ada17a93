use crate::adapters::push::{HttpResponse, ResponseParser};
use crate::diagnostics::{DiagnosticLogger, LogContext};
use crate::domain::report::StatusSource;
use crate::domain::status::PushNotificationStatus;
use crate::error::{DeliveryError, Result};

pub const HEADER_NOTIFICATION_STATUS: &str = "X-WNS-Status";
pub const HEADER_DEVICE_CONNECTION_STATUS: &str = "X-WNS-DeviceConnectionStatus";
pub const HEADER_ERROR_DESCRIPTION: &str = "X-WNS-Error-Description";
pub const HEADER_DEBUG_TRACE: &str = "X-WNS-Debug-Trace";

const DELIVERY_WARNING: &str = "Push notification delivery status for endpoint {endpoint}: \
                                {nstatus}, device {dstatus}, description {error_description}, trace {error_trace}";

/// Delivery status of a single Windows channel URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WnsResponse {
    endpoint: String,
    status: PushNotificationStatus,
}

impl WnsResponse {
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub const fn status(&self) -> PushNotificationStatus {
        self.status
    }
}

impl StatusSource for WnsResponse {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        (endpoint == self.endpoint).then_some(self.status)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WnsParser;

impl WnsParser {
    fn classify(response: &HttpResponse) -> PushNotificationStatus {
        match response.status_code {
            None => PushNotificationStatus::Error,
            Some(200) => match response.header(HEADER_NOTIFICATION_STATUS) {
                Some("received") => PushNotificationStatus::Success,
                Some("channelthrottled") => PushNotificationStatus::TemporaryError,
                _ => PushNotificationStatus::ClientError,
            },
            Some(404 | 410) => PushNotificationStatus::InvalidEndpoint,
            Some(400 | 401 | 403 | 405 | 413) => PushNotificationStatus::Error,
            Some(406 | 500 | 503) => PushNotificationStatus::TemporaryError,
            Some(_) => PushNotificationStatus::Unknown,
        }
    }
}

impl ResponseParser for WnsParser {
    type Raw = HttpResponse;
    type Response = WnsResponse;

    fn parse(&self, raw: &HttpResponse, endpoints: &[String], logger: &dyn DiagnosticLogger) -> Result<WnsResponse> {
        let [endpoint] = endpoints else {
            return Err(DeliveryError::EndpointCount { expected: 1, actual: endpoints.len() });
        };

        let status = Self::classify(raw);

        if !status.is_success() {
            let header = |name: &str| raw.header(name).unwrap_or_default().to_owned();
            let context = LogContext::from([
                ("endpoint", endpoint.clone()),
                ("nstatus", header(HEADER_NOTIFICATION_STATUS)),
                ("dstatus", header(HEADER_DEVICE_CONNECTION_STATUS)),
                ("error_description", header(HEADER_ERROR_DESCRIPTION)),
                ("error_trace", header(HEADER_DEBUG_TRACE)),
            ]);
            logger.warning(DELIVERY_WARNING, &context);
        }

        Ok(WnsResponse { endpoint: endpoint.clone(), status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingLogger;

    const ENDPOINT: &str = "https://db5.notify.windows.com/?token=abc";

    fn endpoints() -> Vec<String> {
        vec![ENDPOINT.to_string()]
    }

    fn response(code: u16, nstatus: &str) -> HttpResponse {
        HttpResponse::new(ENDPOINT, code)
            .with_header(HEADER_NOTIFICATION_STATUS, nstatus)
            .with_header(HEADER_DEVICE_CONNECTION_STATUS, "connected")
            .with_header(HEADER_ERROR_DESCRIPTION, "Some error")
            .with_header(HEADER_DEBUG_TRACE, "trace-1")
    }

    fn parse(raw: &HttpResponse, logger: &RecordingLogger) -> PushNotificationStatus {
        WnsParser.parse(raw, &endpoints(), logger).unwrap().status()
    }

    #[test]
    fn test_received_is_success_without_logging() {
        let logger = RecordingLogger::new();
        assert_eq!(parse(&response(200, "received"), &logger), PushNotificationStatus::Success);
        assert!(logger.is_empty());
    }

    #[test]
    fn test_status_code_table() {
        let cases = [
            (200, "channelthrottled", PushNotificationStatus::TemporaryError),
            (200, "dropped", PushNotificationStatus::ClientError),
            (404, "dropped", PushNotificationStatus::InvalidEndpoint),
            (410, "dropped", PushNotificationStatus::InvalidEndpoint),
            (400, "dropped", PushNotificationStatus::Error),
            (401, "dropped", PushNotificationStatus::Error),
            (403, "dropped", PushNotificationStatus::Error),
            (405, "dropped", PushNotificationStatus::Error),
            (413, "dropped", PushNotificationStatus::Error),
            (406, "dropped", PushNotificationStatus::TemporaryError),
            (500, "dropped", PushNotificationStatus::TemporaryError),
            (503, "dropped", PushNotificationStatus::TemporaryError),
            (420, "dropped", PushNotificationStatus::Unknown),
        ];

        for (code, nstatus, expected) in cases {
            let logger = RecordingLogger::new();
            assert_eq!(parse(&response(code, nstatus), &logger), expected, "HTTP {code} / {nstatus}");

            let records = logger.records();
            assert_eq!(records.len(), 1, "HTTP {code} should log exactly once");
            let record = &records[0];
            assert_eq!(record.field("endpoint"), Some(ENDPOINT));
            assert_eq!(record.field("nstatus"), Some(nstatus));
            assert_eq!(record.field("dstatus"), Some("connected"));
            assert_eq!(record.field("error_description"), Some("Some error"));
            assert_eq!(record.field("error_trace"), Some("trace-1"));
        }
    }

    #[test]
    fn test_warning_message_renders_all_headers() {
        let logger = RecordingLogger::new();
        parse(&response(410, "dropped"), &logger);

        assert_eq!(
            logger.records()[0].message(),
            format!(
                "Push notification delivery status for endpoint {ENDPOINT}: dropped, device connected, description Some error, trace trace-1"
            )
        );
    }

    #[test]
    fn test_missing_status_code_is_error() {
        let logger = RecordingLogger::new();
        assert_eq!(parse(&HttpResponse::failed(ENDPOINT), &logger), PushNotificationStatus::Error);
        assert_eq!(logger.len(), 1);
        assert_eq!(logger.records()[0].field("nstatus"), Some(""));
    }

    #[test]
    fn test_get_status_only_answers_for_own_endpoint() {
        let logger = RecordingLogger::new();
        let response = WnsParser.parse(&response(200, "received"), &endpoints(), &logger).unwrap();

        assert_eq!(response.get_status(ENDPOINT), PushNotificationStatus::Success);
        assert_eq!(response.get_status("https://other.endpoint"), PushNotificationStatus::Unknown);
    }

    #[test]
    fn test_requires_exactly_one_endpoint() {
        let logger = RecordingLogger::new();
        let raw = response(200, "received");

        let err = WnsParser.parse(&raw, &[], &logger).unwrap_err();
        assert!(matches!(err, DeliveryError::EndpointCount { expected: 1, actual: 0 }));

        let two = vec!["a".to_string(), "b".to_string()];
        let err = WnsParser.parse(&raw, &two, &logger).unwrap_err();
        assert!(matches!(err, DeliveryError::EndpointCount { expected: 1, actual: 2 }));
    }
}
