use crate::adapters::push::{ResponseParser, ensure_unique};
use crate::diagnostics::{DiagnosticLogger, LogContext};
use crate::domain::report::{DeliveryReport, StatusSource};
use crate::domain::status::PushNotificationStatus;
use crate::error::{DeliveryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SEND_WARNING: &str = "Sending email notification to {endpoint} failed: {message}";

/// Mailer outcome for one recipient address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailResult {
    pub is_error: bool,
    #[serde(default)]
    pub error_message: String,
}

impl MailResult {
    #[must_use]
    pub const fn sent() -> Self {
        Self { is_error: false, error_message: String::new() }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { is_error: true, error_message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailResponse {
    report: DeliveryReport,
}

impl EmailResponse {
    #[must_use]
    pub const fn report(&self) -> &DeliveryReport {
        &self.report
    }
}

impl StatusSource for EmailResponse {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.report.lookup(endpoint)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmailParser;

impl ResponseParser for EmailParser {
    type Raw = HashMap<String, MailResult>;
    type Response = EmailResponse;

    fn parse(
        &self,
        raw: &HashMap<String, MailResult>,
        endpoints: &[String],
        logger: &dyn DiagnosticLogger,
    ) -> Result<EmailResponse> {
        ensure_unique(endpoints)?;
        if raw.len() > endpoints.len()
            && let Some(stray) = raw.keys().find(|endpoint| !endpoints.contains(*endpoint))
        {
            return Err(DeliveryError::UnexpectedEndpoint(stray.clone()));
        }

        let mut report = DeliveryReport::new();
        for endpoint in endpoints {
            let result = raw.get(endpoint).ok_or_else(|| DeliveryError::MissingEndpoint(endpoint.clone()))?;

            if result.is_error {
                report.record(endpoint, PushNotificationStatus::Error);
                let context =
                    LogContext::from([("endpoint", endpoint.clone()), ("message", result.error_message.clone())]);
                logger.warning(SEND_WARNING, &context);
            } else {
                report.record(endpoint, PushNotificationStatus::Success);
            }
        }

        Ok(EmailResponse { report })
    }
}
