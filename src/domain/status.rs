use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified delivery outcome for one endpoint of one send attempt.
///
/// Variants are declared from best to worst, so the derived ordering doubles as
/// the precedence used when two observations for the same endpoint collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushNotificationStatus {
    Success,
    #[default]
    Unknown,
    TemporaryError,
    ClientError,
    Error,
    InvalidEndpoint,
}

impl PushNotificationStatus {
    pub const ALL: [Self; 6] = [
        Self::Success,
        Self::Unknown,
        Self::TemporaryError,
        Self::ClientError,
        Self::Error,
        Self::InvalidEndpoint,
    ];

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns whichever of the two statuses ranks worse.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unknown => "UNKNOWN",
            Self::TemporaryError => "TEMPORARY_ERROR",
            Self::ClientError => "CLIENT_ERROR",
            Self::Error => "ERROR",
            Self::InvalidEndpoint => "INVALID_ENDPOINT",
        }
    }
}

impl fmt::Display for PushNotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushNotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Unknown delivery status: {s}"))
    }
}
