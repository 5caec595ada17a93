use crate::adapters::push::apns::ApnsResponse;
use crate::adapters::push::email::EmailResponse;
use crate::adapters::push::fcm::FcmResponse;
use crate::adapters::push::jpush::JPushReport;
use crate::adapters::push::wns::WnsResponse;
use crate::domain::report::{DeliveryReport, StatusCounts, StatusSource};
use crate::domain::status::PushNotificationStatus;

/// Parsed outcome of one send, whichever provider handled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResponse {
    Wns(WnsResponse),
    Apns(ApnsResponse),
    Fcm(FcmResponse),
    Email(EmailResponse),
    JPush(JPushReport),
}

impl NotificationResponse {
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::Wns(_) => "wns",
            Self::Apns(_) => "apns",
            Self::Fcm(_) => "fcm",
            Self::Email(_) => "email",
            Self::JPush(_) => "jpush",
        }
    }

    /// Every endpoint this response has an explicit status for.
    #[must_use]
    pub fn to_report(&self) -> DeliveryReport {
        match self {
            Self::Wns(response) => DeliveryReport::with_endpoints(&[response.endpoint()], response.status()),
            Self::Apns(response) => response.report().clone(),
            Self::Fcm(response) => response.report().clone(),
            Self::Email(response) => response.report().clone(),
            Self::JPush(response) => response.report().clone(),
        }
    }

    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        self.to_report().counts()
    }
}

impl StatusSource for NotificationResponse {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        match self {
            Self::Wns(response) => response.lookup(endpoint),
            Self::Apns(response) => response.lookup(endpoint),
            Self::Fcm(response) => response.lookup(endpoint),
            Self::Email(response) => response.lookup(endpoint),
            Self::JPush(response) => response.lookup(endpoint),
        }
    }
}

impl From<WnsResponse> for NotificationResponse {
    fn from(response: WnsResponse) -> Self {
        Self::Wns(response)
    }
}

impl From<ApnsResponse> for NotificationResponse {
    fn from(response: ApnsResponse) -> Self {
        Self::Apns(response)
    }
}

impl From<FcmResponse> for NotificationResponse {
    fn from(response: FcmResponse) -> Self {
        Self::Fcm(response)
    }
}

impl From<EmailResponse> for NotificationResponse {
    fn from(response: EmailResponse) -> Self {
        Self::Email(response)
    }
}

impl From<JPushReport> for NotificationResponse {
    fn from(response: JPushReport) -> Self {
        Self::JPush(response)
    }
}
