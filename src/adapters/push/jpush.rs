use crate::adapters::push::{HttpResponse, ResponseParser, ensure_unique};
use crate::diagnostics::{DiagnosticLogger, LogContext};
use crate::domain::report::{DeliveryReport, StatusSource};
use crate::domain::status::PushNotificationStatus;
use crate::error::{DeliveryError, Result};
use serde::Deserialize;
use std::collections::HashMap;

pub const JPUSH_REPORT_URL: &str = "https://report.jpush.cn/v3/status/message";

const REPORT_WARNING: &str = "Getting JPush notification report for {endpoint} failed: {error}";
const DELIVERY_WARNING: &str = "Delivery of JPush notification {message_id} to {endpoint} failed: {error}";

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize)]
struct EndpointReport {
    status: i64,
}

/// Response of the JPush status API for one previously pushed message.
#[derive(Debug, Clone)]
pub struct JPushReportResult {
    pub message_id: u64,
    pub response: HttpResponse,
}

/// Delivery statuses JPush reports for the registration ids of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JPushReport {
    message_id: u64,
    report: DeliveryReport,
}

impl JPushReport {
    #[must_use]
    pub const fn message_id(&self) -> u64 {
        self.message_id
    }

    #[must_use]
    pub const fn report(&self) -> &DeliveryReport {
        &self.report
    }
}

impl StatusSource for JPushReport {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.report.lookup(endpoint)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JPushReportParser;

impl JPushReportParser {
    fn request_error(response: &HttpResponse) -> String {
        let provided = serde_json::from_str::<ErrorBody>(&response.body).ok().and_then(|body| body.error?.message);
        if let Some(message) = provided {
            return message;
        }

        match response.status_code {
            None => "Request failed",
            Some(400) => "Invalid request",
            Some(401) => "Error with authentication",
            Some(403) => "Error with configuration",
            Some(code) if code >= 500 => "Internal error",
            Some(_) => "Unknown error",
        }
        .to_owned()
    }

    fn classify(code: i64) -> (PushNotificationStatus, &'static str) {
        match code {
            0 => (PushNotificationStatus::Success, ""),
            1 => (PushNotificationStatus::Unknown, "Not delivered"),
            2 => (PushNotificationStatus::InvalidEndpoint, "Registration_id does not belong to the application"),
            3 => (
                PushNotificationStatus::InvalidEndpoint,
                "Registration_id belongs to the application, but it is not the target of the message",
            ),
            4 => (PushNotificationStatus::TemporaryError, "The system is abnormal"),
            _ => (PushNotificationStatus::Unknown, "Unknown error"),
        }
    }
}

impl ResponseParser for JPushReportParser {
    type Raw = JPushReportResult;
    type Response = JPushReport;

    fn parse(&self, raw: &JPushReportResult, endpoints: &[String], logger: &dyn DiagnosticLogger) -> Result<JPushReport> {
        ensure_unique(endpoints)?;
        let message_id = raw.message_id;

        if !raw.response.is_success() {
            let error = Self::request_error(&raw.response);
            for endpoint in endpoints {
                let context = LogContext::from([
                    ("endpoint", endpoint.clone()),
                    ("message_id", message_id.to_string()),
                    ("error", error.clone()),
                ]);
                logger.warning(REPORT_WARNING, &context);
            }
            let report = DeliveryReport::with_endpoints(endpoints, PushNotificationStatus::Unknown);
            return Ok(JPushReport { message_id, report });
        }

        let entries: HashMap<String, EndpointReport> = serde_json::from_str(&raw.response.body)?;
        if let Some(stray) = entries.keys().find(|endpoint| !endpoints.contains(*endpoint)) {
            return Err(DeliveryError::UnexpectedEndpoint(stray.clone()));
        }

        let mut report = DeliveryReport::new();
        for endpoint in endpoints {
            let (status, error) =
                entries.get(endpoint).map_or((PushNotificationStatus::Unknown, "No delivery report"), |entry| {
                    Self::classify(entry.status)
                });
            report.record(endpoint, status);

            if !status.is_success() {
                let context = LogContext::from([
                    ("endpoint", endpoint.clone()),
                    ("message_id", message_id.to_string()),
                    ("error", error.to_owned()),
                ]);
                logger.warning(DELIVERY_WARNING, &context);
            }
        }

        Ok(JPushReport { message_id, report })
    }
}
