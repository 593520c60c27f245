//! Error taxonomy for a report run.
//!
//! SDK adapters work with `anyhow::Result` and attach context as they go. At the
//! component boundaries those failures are classified into [`ReportError`] so the
//! runner can decide whether to skip an account or abort the whole run.

#![warn(clippy::all, rust_2018_idioms)]

/// Classified failure of a report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Bad flags or period expression. Raised before any network call.
    Config(String),
    /// Temporary credentials could not be obtained for one account.
    Auth { account_id: String, message: String },
    /// An upstream call failed or returned data that cannot be correlated.
    Api { account_id: String, message: String },
    /// The output artifact could not be written.
    Sink(String),
}

impl ReportError {
    pub fn config(message: impl Into<String>) -> Self {
        ReportError::Config(message.into())
    }

    pub fn auth(account_id: &str, message: impl Into<String>) -> Self {
        ReportError::Auth {
            account_id: account_id.to_string(),
            message: message.into(),
        }
    }

    pub fn api(account_id: &str, message: impl Into<String>) -> Self {
        ReportError::Api {
            account_id: account_id.to_string(),
            message: message.into(),
        }
    }

    pub fn sink(message: impl Into<String>) -> Self {
        ReportError::Sink(message.into())
    }

    /// Only auth failures let the run continue with the remaining accounts
    /// without marking the report as incomplete.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReportError::Auth { .. })
    }

    /// Process exit status for a run that ends with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReportError::Config(_) => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ReportError::Auth {
                account_id,
                message,
            } => write!(f, "Cannot access account {}: {}", account_id, message),
            ReportError::Api {
                account_id,
                message,
            } => write!(f, "Health API error for account {}: {}", account_id, message),
            ReportError::Sink(msg) => write!(f, "Unable to write report: {}", msg),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::Sink(value.to_string())
    }
}
