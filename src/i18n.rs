//! Bilingual display strings and the persisted language choice.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::rate_limit::RateLimitConfig;
use crate::storage::{KeyValueStore, LANGUAGE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Ru,
            Language::Ru => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    Title,
    Subtitle,
    Success,
    Error,
    NameLabel,
    NamePlaceholder,
    MessageLabel,
    MessagePlaceholder,
    Submit,
    Submitting,
    Reset,
    Info,
    RateLimitWait,
    RateLimitMinutes,
    SendError,
}

impl MessageKey {
    pub const ALL: [MessageKey; 15] = [
        MessageKey::Title,
        MessageKey::Subtitle,
        MessageKey::Success,
        MessageKey::Error,
        MessageKey::NameLabel,
        MessageKey::NamePlaceholder,
        MessageKey::MessageLabel,
        MessageKey::MessagePlaceholder,
        MessageKey::Submit,
        MessageKey::Submitting,
        MessageKey::Reset,
        MessageKey::Info,
        MessageKey::RateLimitWait,
        MessageKey::RateLimitMinutes,
        MessageKey::SendError,
    ];

    /// Attribute-style key, as used by page templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::Title => "title",
            MessageKey::Subtitle => "subtitle",
            MessageKey::Success => "success",
            MessageKey::Error => "error",
            MessageKey::NameLabel => "nameLabel",
            MessageKey::NamePlaceholder => "namePlaceholder",
            MessageKey::MessageLabel => "messageLabel",
            MessageKey::MessagePlaceholder => "messagePlaceholder",
            MessageKey::Submit => "submit",
            MessageKey::Submitting => "submitting",
            MessageKey::Reset => "reset",
            MessageKey::Info => "info",
            MessageKey::RateLimitWait => "rateLimitWait",
            MessageKey::RateLimitMinutes => "rateLimitMinutes",
            MessageKey::SendError => "sendError",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

pub fn translate(lang: Language, key: MessageKey) -> &'static str {
    use MessageKey::*;

    match lang {
        Language::En => match key {
            Title => "Contact me",
            Subtitle => "I'll respond within 24 hours",
            Success => "✓ Thank you! Your message has been sent. I'll contact you soon.",
            Error => "✗ Error sending. Please try again.",
            NameLabel => "Name *",
            NamePlaceholder => "Enter your name",
            MessageLabel => "Your message *",
            MessagePlaceholder => "Tell me about your project or question...",
            Submit => "Send",
            Submitting => "Sending...",
            Reset => "Clear",
            Info => "📌 Data from this form is automatically synced with management system. All data is protected.",
            RateLimitWait => "Too many attempts. Please wait",
            RateLimitMinutes => "Too many attempts. Please wait {minutes} min.",
            SendError => "Error sending data. Please try again later.",
        },
        Language::Ru => match key {
            Title => "Свяжитесь со мной",
            Subtitle => "Я отвечу вам в течение 24 часов",
            Success => "✓ Спасибо! Ваше сообщение отправлено. Я скоро свяжусь с вами.",
            Error => "✗ Ошибка при отправке. Пожалуйста, попробуйте еще раз.",
            NameLabel => "Имя *",
            NamePlaceholder => "Введите ваше имя",
            MessageLabel => "Ваше сообщение *",
            MessagePlaceholder => "Расскажите о вашем проекте или вопросе...",
            Submit => "Отправить",
            Submitting => "Отправляем...",
            Reset => "Очистить",
            Info => "📌 Данные из этой формы автоматически синхронизируются с системой управления. Все данные защищены.",
            RateLimitWait => "Слишком много попыток. Подождите",
            RateLimitMinutes => "Слишком много попыток. Подождите {minutes} мин.",
            SendError => "Ошибка при отправке данных. Попробуйте позже.",
        },
    }
}

/// Render a remaining duration as `M:SS`, rounding up to whole seconds.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_millis().div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Whole minutes, rounded up.
pub fn ceil_minutes(remaining: Duration) -> u128 {
    remaining.as_millis().div_ceil(60_000)
}

/// Current display language, persisted in the profile store.
pub struct LocaleStore {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Language>,
    // Fills the rateLimitMinutes template
    cooldown: Duration,
}

impl LocaleStore {
    /// Restore the saved language, falling back to English.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let lang = match store.get(LANGUAGE_KEY) {
            Ok(Some(code)) => code.parse::<Language>().unwrap_or_else(|e| {
                warn!("Ignoring saved language: {}", e);
                Language::default()
            }),
            Ok(None) => Language::default(),
            Err(e) => {
                warn!("Language preference unreadable: {}", e);
                Language::default()
            }
        };

        Self {
            store,
            current: RwLock::new(lang),
            cooldown: RateLimitConfig::default().cooldown,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn language(&self) -> Language {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_language(&self, lang: Language) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = lang;
        if let Err(e) = self.store.set(LANGUAGE_KEY, lang.code()) {
            warn!("Failed to persist language preference: {}", e);
        }
        debug!("Display language set to {}", lang);
    }

    pub fn toggle(&self) -> Language {
        let next = self.language().toggled();
        self.set_language(next);
        next
    }

    /// Caption for the language toggle: names the language it switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self.language() {
            Language::En => "RU",
            Language::Ru => "EN",
        }
    }

    pub fn text(&self, key: MessageKey) -> &'static str {
        translate(self.language(), key)
    }

    /// Look up a string key. `None` means the caller keeps its existing text.
    /// Templated entries come back filled in.
    pub fn lookup(&self, key: &str) -> Option<String> {
        match MessageKey::from_key(key)? {
            MessageKey::RateLimitMinutes => Some(self.limit_message(self.cooldown)),
            other => Some(self.text(other).to_string()),
        }
    }

    // Message shown while an earlier block runs
    pub fn wait_message(&self, remaining: Duration) -> String {
        format!("{} {}", self.text(MessageKey::RateLimitWait), format_countdown(remaining))
    }

    // Message shown when this attempt started the block
    pub fn limit_message(&self, cooldown: Duration) -> String {
        self.text(MessageKey::RateLimitMinutes)
            .replace("{minutes}", &ceil_minutes(cooldown).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_countdown_rounds_up() {
        assert_eq!(format_countdown(Duration::from_millis(295_000)), "4:55");
        assert_eq!(format_countdown(Duration::from_millis(294_001)), "4:55");
        assert_eq!(format_countdown(Duration::from_millis(300_000)), "5:00");
        assert_eq!(format_countdown(Duration::from_millis(1)), "0:01");
        assert_eq!(format_countdown(Duration::ZERO), "0:00");
    }

    #[test]
    fn test_defaults_to_english() {
        let locale = LocaleStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(locale.language(), Language::En);
        assert_eq!(locale.toggle_label(), "RU");
    }

    #[test]
    fn test_unknown_saved_language_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_KEY, "de").unwrap();
        assert_eq!(LocaleStore::load(store).language(), Language::En);
    }

    #[test]
    fn test_toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let locale = LocaleStore::load(store.clone());

        assert_eq!(locale.toggle(), Language::Ru);
        assert_eq!(store.get(LANGUAGE_KEY).unwrap().as_deref(), Some("ru"));
        assert_eq!(locale.toggle_label(), "EN");

        let reloaded = LocaleStore::load(store);
        assert_eq!(reloaded.language(), Language::Ru);
        assert_eq!(reloaded.text(MessageKey::Submit), "Отправить");
    }

    #[test]
    fn test_lookup_unknown_key_is_none() {
        let locale = LocaleStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(locale.lookup("submitting").as_deref(), Some("Sending..."));
        assert_eq!(locale.lookup("footer"), None);
    }

    #[test]
    fn test_lookup_fills_cooldown_template() {
        let locale = LocaleStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(
            locale.lookup("rateLimitMinutes").as_deref(),
            Some("Too many attempts. Please wait 5 min.")
        );

        let locale = LocaleStore::load(Arc::new(MemoryStore::new()))
            .with_cooldown(Duration::from_secs(90));
        locale.set_language(Language::Ru);
        let text = locale.lookup("rateLimitMinutes").unwrap();
        assert_eq!(text, "Слишком много попыток. Подождите 2 мин.");
        assert!(!text.contains("{minutes}"));
    }

    #[test]
    fn test_every_key_translated_in_both_languages() {
        for key in MessageKey::ALL {
            assert_eq!(MessageKey::from_key(key.as_str()), Some(key));
            assert!(!translate(Language::En, key).is_empty());
            assert_ne!(translate(Language::En, key), translate(Language::Ru, key));
        }
    }

    #[test]
    fn test_throttle_messages() {
        let locale = LocaleStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(
            locale.wait_message(Duration::from_millis(295_000)),
            "Too many attempts. Please wait 4:55"
        );
        assert_eq!(
            locale.limit_message(Duration::from_secs(300)),
            "Too many attempts. Please wait 5 min."
        );

        locale.set_language(Language::Ru);
        assert_eq!(
            locale.limit_message(Duration::from_secs(300)),
            "Слишком много попыток. Подождите 5 мин."
        );
    }

    #[test]
    fn test_parse_language() {
        assert_eq!(" RU ".parse::<Language>(), Ok(Language::Ru));
        assert_eq!("fr".parse::<Language>(), Err(UnknownLanguage("fr".to_string())));
    }
}
