use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Field;

// Payload posted to the lead webhook
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub client_context: String,
}

/// Form draft owned by the caller. Values are kept exactly as typed and only
/// trimmed when a request is built from them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl LeadForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    // Name and message are required, email is optional
    pub fn validate(&self) -> Result<(), Field> {
        if self.name.trim().is_empty() {
            return Err(Field::Name);
        }
        if self.message.trim().is_empty() {
            return Err(Field::Message);
        }
        Ok(())
    }

    pub fn to_request(&self, timestamp: DateTime<Utc>, client_context: &str) -> SubmissionRequest {
        SubmissionRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
            timestamp,
            client_context: client_context.to_string(),
        }
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.email.clear();
        self.message.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.message.is_empty()
    }
}
