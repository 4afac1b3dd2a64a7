//! Client-side submission throttling.
//!
//! A sliding window of successful submissions plus a fixed cooldown once the
//! window is full. All state lives in a single JSON record in the profile's
//! key-value store, so limits survive restarts.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::{KeyValueStore, RATE_LIMIT_KEY};

/// Limits applied by the `RateLimiter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Successful submissions allowed within `window`.
    pub max_attempts: usize,
    pub window: Duration,
    /// How long submissions are refused once the limit is hit.
    pub cooldown: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(5 * 60),
        }
    }
}

impl RateLimitConfig {
    // Clamped to i64::MAX for absurdly long durations
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn cooldown_ms(&self) -> i64 {
        i64::try_from(self.cooldown.as_millis()).unwrap_or(i64::MAX)
    }
}

// Persisted throttling state (timestamps in ms since epoch)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    #[serde(default)]
    pub attempts: Vec<i64>,
    #[serde(default)]
    pub blocked_until: Option<i64>,
}

impl RateLimitRecord {
    /// Block end time, if the block is still running at `now`.
    pub fn active_block(&self, now: i64) -> Option<i64> {
        self.blocked_until.filter(|until| now < *until)
    }

    /// Drop attempts that fell out of the window, or that claim to be from
    /// the future.
    pub fn prune(&mut self, now: i64, window_ms: i64) {
        self.attempts
            .retain(|t| *t <= now && now.saturating_sub(*t) < window_ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// An earlier block is still running.
    Cooldown,
    /// This check found the window full and started a new block.
    LimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { remaining: Duration, reason: DenyReason },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, RateLimitConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Load the persisted record. Missing, unreadable or malformed data all
    /// read as the empty default.
    pub fn load(&self) -> RateLimitRecord {
        let raw = match self.store.get(RATE_LIMIT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RateLimitRecord::default(),
            Err(e) => {
                warn!("Rate limit storage unreadable, starting fresh: {}", e);
                return RateLimitRecord::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Malformed rate limit record, starting fresh: {}", e);
                RateLimitRecord::default()
            }
        }
    }

    fn save(&self, record: &RateLimitRecord) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode rate limit record: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(RATE_LIMIT_KEY, &json) {
            warn!("Failed to persist rate limit record: {}", e);
        }
    }

    fn evaluate(&self, record: &mut RateLimitRecord, now: i64) -> Decision {
        if let Some(until) = record.active_block(now) {
            return Decision::Denied {
                remaining: Duration::from_millis(until.saturating_sub(now) as u64),
                reason: DenyReason::Cooldown,
            };
        }

        record.prune(now, self.config.window_ms());

        if record.attempts.len() >= self.config.max_attempts {
            return Decision::Denied {
                remaining: self.config.cooldown,
                reason: DenyReason::LimitReached,
            };
        }

        Decision::Allowed
    }

    /// Decide whether a submission may go out at `now`.
    ///
    /// A full window starts a cooldown, which is persisted immediately. The
    /// pruned attempt list is otherwise left unsaved until `record_attempt`.
    pub fn check_allowed(&self, now: i64) -> Decision {
        let mut record = self.load();
        let decision = self.evaluate(&mut record, now);

        if let Decision::Denied {
            reason: DenyReason::LimitReached,
            ..
        } = decision
        {
            record.blocked_until = Some(now.saturating_add(self.config.cooldown_ms()));
            self.save(&record);
            info!(
                "Submission limit of {} reached, blocked for {:?}",
                self.config.max_attempts, self.config.cooldown
            );
        }

        debug!("Rate limit decision at {}: {:?}", now, decision);
        decision
    }

    /// Same answer as `check_allowed`, without writing anything.
    pub fn peek(&self, now: i64) -> Decision {
        let mut record = self.load();
        self.evaluate(&mut record, now)
    }

    // Only called after a confirmed successful send
    pub fn record_attempt(&self, now: i64) {
        let mut record = self.load();
        record.prune(now, self.config.window_ms());
        record.attempts.push(now);
        record.blocked_until = None;
        self.save(&record);
    }
}
