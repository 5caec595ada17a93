use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Placeholder values for a `{name}` style message template.
pub type LogContext = BTreeMap<&'static str, String>;

/// Sink for failure diagnostics emitted while parsing provider responses.
///
/// Parsers receive the logger explicitly on every call. Logging is best-effort:
/// implementations must not panic and parsers never inspect the outcome.
pub trait DiagnosticLogger: Send + Sync + std::fmt::Debug {
    fn warning(&self, template: &str, context: &LogContext);
}

/// Substitutes every `{key}` in `template` with its value from `context`.
///
/// Placeholders without a matching key are left as-is. Substituted values are
/// never scanned again, so a value containing `{key}` is written literally.
#[must_use]
pub fn render(template: &str, context: &LogContext) -> String {
    let mut message = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        message.push_str(&rest[..start]);
        let placeholder = &rest[start..];
        let resolved = placeholder
            .find('}')
            .and_then(|end| context.get(&placeholder[1..end]).map(|value| (end, value)));

        match resolved {
            Some((end, value)) => {
                message.push_str(value);
                rest = &placeholder[end + 1..];
            }
            None => {
                message.push('{');
                rest = &placeholder[1..];
            }
        }
    }

    message.push_str(rest);
    message
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticLogger for TracingDiagnostics {
    fn warning(&self, template: &str, context: &LogContext) {
        let endpoint = context.get("endpoint").map_or("", String::as_str);
        tracing::warn!(endpoint = %endpoint, context = ?context, "{}", render(template, context));
    }
}

/// A single captured `warning` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub template: String,
    pub context: LogContext,
}

impl LogRecord {
    #[must_use]
    pub fn message(&self) -> String {
        render(&self.template, &self.context)
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl DiagnosticLogger for RecordingLogger {
    fn warning(&self, template: &str, context: &LogContext) {
        let record = LogRecord { template: template.to_owned(), context: context.clone() };
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }
}
