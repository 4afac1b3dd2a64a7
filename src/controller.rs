//! Submission lifecycle for the contact form.
//!
//! ```text
//! Idle ──submit──► Submitting ──2xx──────► Success   ─┐
//!   │                   └──error/non-2xx─► Failed    ─┼─ display timeout ─► Idle
//!   └──rate limited───────────────────────► Throttled ─┘
//! ```
//!
//! Observers follow the state through a `watch` channel. Terminal states
//! schedule a dismiss task; every transition aborts the pending one first.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::SubmitError;
use crate::i18n::{LocaleStore, MessageKey};
use crate::metrics::{
    SUBMISSIONS_FAILED, SUBMISSIONS_SENT, SUBMISSIONS_THROTTLED, SUBMISSIONS_TOTAL, WEBHOOK_LATENCY,
};
use crate::models::LeadForm;
use crate::rate_limit::{Decision, DenyReason, RateLimiter};
use crate::state::AppContext;
use crate::webhook::{WebhookClient, client_context};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success { message: String },
    Throttled { message: String, remaining: Duration },
    Failed { message: String },
}

impl SubmissionState {
    /// States that show a message and clear themselves after a while.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Success { .. }
                | SubmissionState::Throttled { .. }
                | SubmissionState::Failed { .. }
        )
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionState::Success { message }
            | SubmissionState::Throttled { message, .. }
            | SubmissionState::Failed { message } => Some(message),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }
}

// Current state plus a counter bumped on every transition
struct StateCell {
    tx: watch::Sender<SubmissionState>,
    epoch: AtomicU64,
}

impl StateCell {
    fn new() -> Self {
        Self {
            tx: watch::Sender::new(SubmissionState::Idle),
            epoch: AtomicU64::new(0),
        }
    }

    fn set(&self, next: SubmissionState) -> u64 {
        let mut epoch = 0;
        self.tx.send_modify(|state| {
            *state = next;
            epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        });
        epoch
    }

    // Back to Idle, unless something newer happened since `epoch`
    fn dismiss(&self, epoch: u64) -> bool {
        self.tx.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) == epoch && state.is_terminal() {
                *state = SubmissionState::Idle;
                true
            } else {
                false
            }
        })
    }
}

#[derive(Default)]
struct DismissTimer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DismissTimer {
    fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    fn schedule(&self, cell: Arc<StateCell>, epoch: u64, after: Duration) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if cell.dismiss(epoch) {
                debug!("Feedback message dismissed");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = pending.replace(handle) {
            old.abort();
        }
    }
}

impl Drop for DismissTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// Holds the submit control disabled; released even if the submit future is dropped
struct InFlight<'a> {
    busy: &'a AtomicBool,
    cell: &'a StateCell,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cell.tx.send_if_modified(|state| {
            if *state == SubmissionState::Submitting {
                *state = SubmissionState::Idle;
                true
            } else {
                false
            }
        });
        self.busy.store(false, Ordering::Release);
    }
}

/// Validates, rate-limits and delivers contact form submissions.
///
/// This is the only component that talks to the webhook or mutates the
/// persisted rate limit record.
pub struct SubmissionController {
    limiter: RateLimiter,
    locale: Arc<LocaleStore>,
    clock: Arc<dyn Clock>,
    webhook: Arc<dyn WebhookClient>,
    display_timeout: Duration,
    client_context: String,
    cell: Arc<StateCell>,
    busy: AtomicBool,
    timer: DismissTimer,
}

impl SubmissionController {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            limiter: RateLimiter::with_config(ctx.store.clone(), ctx.rate_limit),
            locale: ctx.locale.clone(),
            clock: ctx.clock.clone(),
            webhook: ctx.webhook.clone(),
            display_timeout: ctx.display_timeout,
            client_context: client_context(),
            cell: Arc::new(StateCell::new()),
            busy: AtomicBool::new(false),
            timer: DismissTimer::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.cell.tx.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        self.cell.tx.borrow().clone()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn is_submit_enabled(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Caption for the submit button in the current language.
    pub fn submit_label(&self) -> &'static str {
        if self.is_submit_enabled() {
            self.locale.text(MessageKey::Submit)
        } else {
            self.locale.text(MessageKey::Submitting)
        }
    }

    fn transition(&self, next: SubmissionState) {
        self.timer.cancel();
        let terminal = next.is_terminal();
        let epoch = self.cell.set(next);
        if terminal {
            self.timer
                .schedule(self.cell.clone(), epoch, self.display_timeout);
        }
    }

    /// Run one submission: rate limit, validate, deliver.
    ///
    /// Validation failures leave the visible state untouched. On success the
    /// attempt counts against the quota and `form` is cleared; failed sends
    /// are not counted.
    pub async fn submit(&self, form: &mut LeadForm) -> Result<(), SubmitError> {
        SUBMISSIONS_TOTAL.inc();

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Submit ignored, another submission is in flight");
            return Err(SubmitError::Busy);
        }
        let _in_flight = InFlight {
            busy: &self.busy,
            cell: &self.cell,
        };

        let now = self.clock.now_ms();
        if let Decision::Denied { remaining, reason } = self.limiter.check_allowed(now) {
            SUBMISSIONS_THROTTLED.inc();
            let message = match reason {
                DenyReason::Cooldown => self.locale.wait_message(remaining),
                DenyReason::LimitReached => self.locale.limit_message(remaining),
            };
            info!("Submission throttled for another {:?}", remaining);
            self.transition(SubmissionState::Throttled { message, remaining });
            return Err(SubmitError::Throttled { remaining });
        }

        if let Err(field) = form.validate() {
            debug!("Submission rejected, {} is empty", field);
            return Err(SubmitError::Validation(field));
        }

        self.transition(SubmissionState::Submitting);

        let timestamp = DateTime::from_timestamp_millis(now).unwrap_or_else(Utc::now);
        let request = form.to_request(timestamp, &self.client_context);

        let started = Instant::now();
        let result = self.webhook.deliver(&request).await;
        WEBHOOK_LATENCY.observe(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                self.limiter.record_attempt(self.clock.now_ms());
                SUBMISSIONS_SENT.inc();
                form.reset();
                info!("Lead delivered");
                self.transition(SubmissionState::Success {
                    message: self.locale.text(MessageKey::Success).to_string(),
                });
                Ok(())
            }
            Err(e) => {
                SUBMISSIONS_FAILED.inc();
                warn!("Lead delivery failed: {}", e);
                self.transition(SubmissionState::Failed {
                    message: self.locale.text(MessageKey::SendError).to_string(),
                });
                Err(e.into())
            }
        }
    }
}
