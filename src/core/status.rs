use serde::Serialize;
use std::time::Duration;

use super::error::FlipperError;

/// How long a status line stays visible before it is cleared.
pub const STATUS_DISMISS_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl Severity {
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Success => "#28a745",
            Severity::Info => "#333333",
            Severity::Error => "#dc3545",
        }
    }
}

/// A transient, user-visible message. Every outcome shown to the user goes
/// through this type so frontends share one presentation contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
    #[serde(skip)]
    pub dismiss_after: Duration,
}

impl StatusMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
            dismiss_after: STATUS_DISMISS_AFTER,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    /// Mirrors the "Error <action>: <message>" line shown on storage failures.
    pub fn from_error(action: &str, err: &FlipperError) -> Self {
        tracing::error!("Error {}: {}", action, err);
        Self::error(format!("Error {}: {}", action, err))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
