use crate::adapters::push::{ResponseParser, ensure_unique};
use crate::config::ApnsConfig;
use crate::diagnostics::{DiagnosticLogger, LogContext};
use crate::domain::report::{DeliveryReport, StatusSource};
use crate::domain::status::PushNotificationStatus;
use crate::error::{DeliveryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const DISPATCH_WARNING: &str = "Dispatching push notification failed for endpoint {endpoint}: {error}";

/// Binary protocol status code for a rejected device token.
pub const STATUS_INVALID_TOKEN: u16 = 8;

/// Codes at or above this value come from the HTTP/2 API and may carry a JSON reason.
const HTTP_STATUS_FLOOR: u16 = 400;

const DEFAULT_REASONS: &[(&str, PushNotificationStatus)] = &[
    ("IdleTimeout", PushNotificationStatus::TemporaryError),
    ("ExpiredProviderToken", PushNotificationStatus::TemporaryError),
    ("TooManyRequests", PushNotificationStatus::TemporaryError),
    ("InternalServerError", PushNotificationStatus::TemporaryError),
    ("ServiceUnavailable", PushNotificationStatus::TemporaryError),
    ("Shutdown", PushNotificationStatus::TemporaryError),
    ("BadDeviceToken", PushNotificationStatus::InvalidEndpoint),
    ("DeviceTokenNotForTopic", PushNotificationStatus::InvalidEndpoint),
    ("Unregistered", PushNotificationStatus::InvalidEndpoint),
    ("TopicDisallowed", PushNotificationStatus::Error),
    ("BadCertificate", PushNotificationStatus::Error),
    ("BadCertificateEnvironment", PushNotificationStatus::Error),
    ("InvalidProviderToken", PushNotificationStatus::Error),
    ("MissingProviderToken", PushNotificationStatus::Error),
    ("BadCollapseId", PushNotificationStatus::Error),
    ("BadExpirationDate", PushNotificationStatus::Error),
    ("BadMessageId", PushNotificationStatus::Error),
    ("BadPriority", PushNotificationStatus::Error),
    ("BadTopic", PushNotificationStatus::Error),
    ("DuplicateHeaders", PushNotificationStatus::Error),
    ("Forbidden", PushNotificationStatus::Error),
    ("MissingDeviceToken", PushNotificationStatus::Error),
    ("MissingTopic", PushNotificationStatus::Error),
    ("PayloadEmpty", PushNotificationStatus::Error),
    ("PayloadTooLarge", PushNotificationStatus::Error),
    ("BadPath", PushNotificationStatus::Error),
    ("MethodNotAllowed", PushNotificationStatus::Error),
    ("TooManyProviderTokenUpdates", PushNotificationStatus::Error),
];

const DEFAULT_CODES: &[(u16, PushNotificationStatus)] = &[
    // binary protocol
    (1, PushNotificationStatus::TemporaryError),
    (2, PushNotificationStatus::InvalidEndpoint),
    (3, PushNotificationStatus::Error),
    (4, PushNotificationStatus::Error),
    (5, PushNotificationStatus::InvalidEndpoint),
    (6, PushNotificationStatus::Error),
    (7, PushNotificationStatus::Error),
    (STATUS_INVALID_TOKEN, PushNotificationStatus::InvalidEndpoint),
    // HTTP/2 API without a usable reason
    (400, PushNotificationStatus::Error),
    (403, PushNotificationStatus::Error),
    (405, PushNotificationStatus::Error),
    (410, PushNotificationStatus::InvalidEndpoint),
    (413, PushNotificationStatus::Error),
    (429, PushNotificationStatus::TemporaryError),
    (500, PushNotificationStatus::TemporaryError),
    (503, PushNotificationStatus::TemporaryError),
];

/// One error reported by APNS for a message of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApnsErrorRecord {
    pub command: u8,
    pub status_code: u16,
    pub identifier: u32,
    pub time: i64,
    pub status_message: String,
}

/// Everything the APNS client reports back after sending one batch.
///
/// `recipients` maps the positional send index of each message to the endpoint
/// it was addressed to; `errors` is keyed by the same index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApnsBatchResult {
    pub invalid_endpoints: Vec<String>,
    pub recipients: HashMap<u32, String>,
    pub errors: BTreeMap<u32, Vec<ApnsErrorRecord>>,
}

impl ApnsBatchResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one recipient per endpoint, using its 1-based position as send index.
    #[must_use]
    pub fn with_recipients<S: AsRef<str>>(mut self, endpoints: &[S]) -> Self {
        for (index, endpoint) in (1..).zip(endpoints) {
            self.recipients.insert(index, endpoint.as_ref().to_owned());
        }
        self
    }

    #[must_use]
    pub fn with_invalid_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.invalid_endpoints.push(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, index: u32, record: ApnsErrorRecord) -> Self {
        self.errors.entry(index).or_default().push(record);
        self
    }
}

#[derive(Deserialize)]
struct ReasonBody {
    reason: Option<String>,
}

/// Lookup tables translating APNS reasons and status codes into delivery statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApnsStatusTable {
    reasons: HashMap<String, PushNotificationStatus>,
    codes: HashMap<u16, PushNotificationStatus>,
}

impl Default for ApnsStatusTable {
    fn default() -> Self {
        Self {
            reasons: DEFAULT_REASONS.iter().map(|(reason, status)| ((*reason).to_owned(), *status)).collect(),
            codes: DEFAULT_CODES.iter().copied().collect(),
        }
    }
}

impl ApnsStatusTable {
    /// Default table with the overrides from `config` applied on top.
    #[must_use]
    pub fn from_config(config: &ApnsConfig) -> Self {
        config
            .reason_overrides
            .iter()
            .fold(Self::default(), |table, entry| table.with_reason(&entry.key, entry.status))
    }

    #[must_use]
    pub fn with_reason(mut self, reason: &str, status: PushNotificationStatus) -> Self {
        self.reasons.insert(reason.to_owned(), status);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: u16, status: PushNotificationStatus) -> Self {
        self.codes.insert(code, status);
        self
    }

    #[must_use]
    pub fn reason_status(&self, reason: &str) -> Option<PushNotificationStatus> {
        self.reasons.get(reason).copied()
    }

    #[must_use]
    pub fn code_status(&self, code: u16) -> Option<PushNotificationStatus> {
        self.codes.get(&code).copied()
    }
}

/// Delivery statuses for every endpoint of one APNS batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApnsResponse {
    report: DeliveryReport,
}

impl ApnsResponse {
    #[must_use]
    pub const fn report(&self) -> &DeliveryReport {
        &self.report
    }

    #[must_use]
    pub fn into_report(self) -> DeliveryReport {
        self.report
    }
}

impl StatusSource for ApnsResponse {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.report.lookup(endpoint)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApnsParser {
    table: ApnsStatusTable,
}

impl ApnsParser {
    #[must_use]
    pub const fn new(table: ApnsStatusTable) -> Self {
        Self { table }
    }

    /// Returns the status for one error record and the text to log for it.
    fn classify(&self, record: &ApnsErrorRecord) -> (PushNotificationStatus, String) {
        if record.status_code == STATUS_INVALID_TOKEN {
            return (PushNotificationStatus::InvalidEndpoint, record.status_message.clone());
        }

        if record.status_code >= HTTP_STATUS_FLOOR
            && let Ok(ReasonBody { reason: Some(reason) }) = serde_json::from_str::<ReasonBody>(&record.status_message)
        {
            let status = self.table.reason_status(&reason).unwrap_or_default();
            return (status, reason);
        }

        let status = self.table.code_status(record.status_code).unwrap_or_default();
        (status, record.status_message.clone())
    }
}

impl ResponseParser for ApnsParser {
    type Raw = ApnsBatchResult;
    type Response = ApnsResponse;

    fn parse(
        &self,
        raw: &ApnsBatchResult,
        endpoints: &[String],
        logger: &dyn DiagnosticLogger,
    ) -> Result<ApnsResponse> {
        ensure_unique(endpoints)?;

        let mut report = DeliveryReport::with_endpoints(endpoints, PushNotificationStatus::Success);

        for endpoint in &raw.invalid_endpoints {
            if !report.contains(endpoint) {
                return Err(DeliveryError::UnexpectedEndpoint(endpoint.clone()));
            }
            report.record(endpoint, PushNotificationStatus::InvalidEndpoint);
        }

        for (index, records) in &raw.errors {
            let recipient = raw.recipients.get(index).ok_or(DeliveryError::UnknownSendIndex(*index))?;
            if !report.contains(recipient) {
                return Err(DeliveryError::UnexpectedEndpoint(recipient.clone()));
            }

            for record in records {
                let (status, error) = self.classify(record);
                report.escalate(recipient, status);

                let context = LogContext::from([("endpoint", recipient.clone()), ("error", error)]);
                logger.warning(DISPATCH_WARNING, &context);
            }
        }

        Ok(ApnsResponse { report })
    }
}
