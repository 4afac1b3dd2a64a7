use std::fmt;
use std::time::Duration;

// Required form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Message => write!(f, "message"),
        }
    }
}

/// Why a call to `SubmissionController::submit` did not deliver the lead.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("required field is empty: {0}")]
    Validation(Field),
    #[error("too many attempts, retry in {remaining:?}")]
    Throttled { remaining: Duration },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("a submission is already in flight")]
    Busy,
}

/// Webhook delivery failure. Not classified further: every variant is
/// treated the same way by the controller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("webhook responded with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed stored data: {0}")]
    Corrupt(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("webhook url is not configured")]
    MissingWebhookUrl,
    #[error("invalid webhook url {url}: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}
