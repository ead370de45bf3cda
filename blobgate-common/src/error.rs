/// Error kinds surfaced by storage operations.
///
/// Every backend failure is classified into one of these variants so callers
/// can branch on the cause instead of parsing message strings. Only
/// `Transient` failures are eligible for retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not connected to a storage account")]
    NotConnected,

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },
}

impl StoreError {
    /// Classify a backend HTTP status into an error kind.
    pub fn from_status(status: u16, what: &str, message: String) -> Self {
        match status {
            404 => StoreError::NotFound(what.to_string()),
            401 | 403 => StoreError::AccessDenied(message),
            408 | 429 | 500 | 502 | 503 | 504 => StoreError::Transient(message),
            _ => StoreError::Backend { status, message },
        }
    }

    /// Whether a retry could plausibly succeed. Transport-level reqwest
    /// failures (connection reset, timeout) count as transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::Http(_))
    }
}
