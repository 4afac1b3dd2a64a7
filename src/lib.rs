//! leadform - contact form submission with client-side rate limiting.
//!
//! A lead goes through `SubmissionController::submit`: the `RateLimiter`
//! decides whether it may be sent, the form is validated, and the lead is
//! posted as JSON to a webhook. Throttling state and the display language
//! persist in a `KeyValueStore` scoped to one client profile.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod i18n;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod storage;
pub mod webhook;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{SubmissionController, SubmissionState};
pub use error::{ConfigError, Field, StorageError, SubmitError, TransportError};
pub use i18n::{Language, LocaleStore, MessageKey};
pub use models::{LeadForm, SubmissionRequest};
pub use rate_limit::{Decision, DenyReason, RateLimitConfig, RateLimitRecord, RateLimiter};
pub use state::AppContext;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use webhook::{ReqwestWebhook, WebhookClient};
