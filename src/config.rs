use crate::domain::status::PushNotificationStatus;
use clap::{Args, Parser, ValueEnum};
use std::str::FromStr;

#[derive(Clone, Debug, Default, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub telemetry: TelemetryConfig,

    #[command(flatten)]
    pub dispatch: DispatchConfig,

    #[command(flatten)]
    pub apns: ApnsConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; metrics and traces are only exported when set
    #[arg(long, env = "PUSH_DELIVERY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Format of log lines written to stdout
    #[arg(long, env = "PUSH_DELIVERY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, Args)]
pub struct DispatchConfig {
    /// Maximum number of endpoints sent in one sub-batch
    #[arg(long, env = "PUSH_DELIVERY_BATCH_SIZE", default_value_t = 500)]
    pub batch_size: usize,

    /// Maximum number of concurrent sends within a sub-batch
    #[arg(long, env = "PUSH_DELIVERY_CONCURRENCY", default_value_t = 16)]
    pub concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { batch_size: 500, concurrency: 16 }
    }
}

#[derive(Clone, Debug, Default, Args)]
pub struct ApnsConfig {
    /// Comma-separated APNS reason overrides, e.g. `TooManyRequests=TEMPORARY_ERROR`
    #[arg(long, env = "PUSH_DELIVERY_APNS_REASON_OVERRIDES", value_delimiter = ',')]
    pub reason_overrides: Vec<StatusOverride>,
}

/// A `KEY=STATUS` pair that replaces one entry of a provider status table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusOverride {
    pub key: String,
    pub status: PushNotificationStatus,
}

impl FromStr for StatusOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, status) = s.split_once('=').ok_or_else(|| format!("expected KEY=STATUS, got `{s}`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in `{s}`"));
        }
        Ok(Self { key: key.to_owned(), status: status.trim().parse()? })
    }
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
