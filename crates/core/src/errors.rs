use thiserror::Error;

use crate::models::transaction::TransactionId;

/// Unified error type for the entire finance-sync-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote gateway ──────────────────────────────────────────────
    /// No connectivity, DNS failure, timeout or any other transport-level failure.
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// 4xx: bad input, auth failure, unknown resource. Never retried.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx: eligible for offline fallback and later replay.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The response violated the expected contract (e.g. empty body where content was expected).
    #[error("Unexpected response: {0}")]
    ProtocolMismatch(String),

    // ── Local storage ───────────────────────────────────────────────
    #[error("Transaction {0} not found in local storage")]
    StorageNotFound(TransactionId),

    #[error("Transaction {0} already exists in local storage")]
    StorageDuplicate(TransactionId),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    // ── Configuration / input ───────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl CoreError {
    /// Classify a non-2xx HTTP status into the gateway error taxonomy.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            400..=499 => CoreError::Rejected { status, message },
            500..=599 => CoreError::ServerError { status, message },
            _ => CoreError::ProtocolMismatch(format!("unexpected status {status}: {message}")),
        }
    }

    /// `true` for failures that move a write into the pending log instead of
    /// failing it outright: the server could not be reached, or it failed on its side.
    #[must_use]
    pub fn is_offline_recoverable(&self) -> bool {
        matches!(self, CoreError::Unreachable(_) | CoreError::ServerError { .. })
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters so tokens passed in URLs never end up in messages.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };

        if e.is_decode() {
            return CoreError::ProtocolMismatch(sanitized);
        }
        match e.status() {
            Some(status) => CoreError::from_status(status.as_u16(), sanitized),
            None => CoreError::Unreachable(sanitized),
        }
    }
}
