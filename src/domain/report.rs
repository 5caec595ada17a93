use crate::domain::status::PushNotificationStatus;
use serde::Serialize;
use std::collections::HashMap;

/// Anything that can answer "what happened to endpoint X?".
pub trait StatusSource {
    /// Returns the explicit status recorded for `endpoint`, if any.
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus>;

    /// Returns the status for `endpoint`, or `UNKNOWN` when none was recorded.
    fn get_status(&self, endpoint: &str) -> PushNotificationStatus {
        self.lookup(endpoint).unwrap_or_default()
    }
}

/// Per-endpoint delivery statuses for one send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeliveryReport {
    statuses: HashMap<String, PushNotificationStatus>,
}

impl DeliveryReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a report where every endpoint starts at `status`.
    #[must_use]
    pub fn with_endpoints<S: AsRef<str>>(endpoints: &[S], status: PushNotificationStatus) -> Self {
        Self { statuses: endpoints.iter().map(|endpoint| (endpoint.as_ref().to_owned(), status)).collect() }
    }

    #[must_use]
    pub fn contains(&self, endpoint: &str) -> bool {
        self.statuses.contains_key(endpoint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PushNotificationStatus)> {
        self.statuses.iter().map(|(endpoint, status)| (endpoint.as_str(), *status))
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.statuses.keys().map(String::as_str)
    }

    /// Unconditionally sets the status of `endpoint`.
    pub(crate) fn record(&mut self, endpoint: &str, status: PushNotificationStatus) {
        self.statuses.insert(endpoint.to_owned(), status);
    }

    /// Sets the status of `endpoint` to the worse of its current and `status`.
    pub(crate) fn escalate(&mut self, endpoint: &str, status: PushNotificationStatus) {
        self.statuses
            .entry(endpoint.to_owned())
            .and_modify(|current| *current = current.worst(status))
            .or_insert(status);
    }

    /// Folds one sub-batch into this cumulative report.
    ///
    /// Every endpoint of the batch takes the status reported by `partial`, or
    /// `UNKNOWN` when `partial` has nothing for it, replacing whatever an
    /// earlier batch recorded. Endpoints outside the batch are left untouched.
    pub fn merge_batch<P, S>(&mut self, partial: &P, batch_endpoints: &[S]) -> &mut Self
    where
        P: StatusSource + ?Sized,
        S: AsRef<str>,
    {
        for endpoint in batch_endpoints {
            let endpoint = endpoint.as_ref();
            let status = partial.lookup(endpoint).unwrap_or_default();
            self.record(endpoint, status);
        }
        self
    }

    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for status in self.statuses.values() {
            counts.add(*status);
        }
        counts
    }
}

impl StatusSource for DeliveryReport {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.statuses.get(endpoint).copied()
    }
}

impl StatusSource for HashMap<String, PushNotificationStatus> {
    fn lookup(&self, endpoint: &str) -> Option<PushNotificationStatus> {
        self.get(endpoint).copied()
    }
}

/// Tally of endpoints per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub success: usize,
    pub unknown: usize,
    pub temporary_error: usize,
    pub client_error: usize,
    pub error: usize,
    pub invalid_endpoint: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: PushNotificationStatus) {
        match status {
            PushNotificationStatus::Success => self.success += 1,
            PushNotificationStatus::Unknown => self.unknown += 1,
            PushNotificationStatus::TemporaryError => self.temporary_error += 1,
            PushNotificationStatus::ClientError => self.client_error += 1,
            PushNotificationStatus::Error => self.error += 1,
            PushNotificationStatus::InvalidEndpoint => self.invalid_endpoint += 1,
        }
    }

    #[must_use]
    pub const fn get(&self, status: PushNotificationStatus) -> usize {
        match status {
            PushNotificationStatus::Success => self.success,
            PushNotificationStatus::Unknown => self.unknown,
            PushNotificationStatus::TemporaryError => self.temporary_error,
            PushNotificationStatus::ClientError => self.client_error,
            PushNotificationStatus::Error => self.error,
            PushNotificationStatus::InvalidEndpoint => self.invalid_endpoint,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.success + self.unknown + self.temporary_error + self.client_error + self.error + self.invalid_endpoint
    }
}
