use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::i18n::LocaleStore;
use crate::rate_limit::RateLimitConfig;
use crate::storage::KeyValueStore;
use crate::webhook::WebhookClient;

// How long Success/Failed/Throttled messages stay up
pub const DEFAULT_DISPLAY_TIMEOUT: Duration = Duration::from_millis(5000);

// Everything the submission controller depends on, handed over at construction
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub locale: Arc<LocaleStore>,
    pub webhook: Arc<dyn WebhookClient>,
    pub rate_limit: RateLimitConfig,
    pub display_timeout: Duration,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        webhook: Arc<dyn WebhookClient>,
    ) -> Self {
        let locale = Arc::new(LocaleStore::load(store.clone()));
        Self {
            store,
            clock,
            locale,
            webhook,
            rate_limit: RateLimitConfig::default(),
            display_timeout: DEFAULT_DISPLAY_TIMEOUT,
        }
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self.locale = Arc::new(
            LocaleStore::load(self.store.clone()).with_cooldown(config.cooldown),
        );
        self
    }

    pub fn with_display_timeout(mut self, timeout: Duration) -> Self {
        self.display_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::TransportError;
    use crate::i18n::Language;
    use crate::models::SubmissionRequest;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    struct NoopWebhook;

    #[async_trait]
    impl WebhookClient for NoopWebhook {
        async fn deliver(&self, _request: &SubmissionRequest) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn test_rate_limit_cooldown_reaches_locale() {
        let store = Arc::new(MemoryStore::new());
        store.set(crate::storage::LANGUAGE_KEY, "ru").unwrap();

        let ctx = AppContext::new(store, Arc::new(ManualClock::new(0)), Arc::new(NoopWebhook))
            .with_rate_limit(RateLimitConfig {
                max_attempts: 2,
                window: Duration::from_secs(60),
                cooldown: Duration::from_secs(600),
            });

        assert_eq!(ctx.locale.language(), Language::Ru);
        assert_eq!(
            ctx.locale.lookup("rateLimitMinutes").as_deref(),
            Some("Слишком много попыток. Подождите 10 мин.")
        );
    }
}
