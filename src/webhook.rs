use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, error};

use crate::error::{ConfigError, TransportError};
use crate::models::SubmissionRequest;

// Shipped in page templates before the real endpoint is filled in
pub const PLACEHOLDER_WEBHOOK_URL: &str = "https://your-n8n-instance.com/webhook/your-webhook-name";

/// Client context sent with every lead.
pub fn client_context() -> String {
    format!(
        "leadform/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Delivers a lead to the remote endpoint.
///
/// Any 2xx response is success. Everything else, including transport
/// errors, is a `TransportError`; no retries happen here.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn deliver(&self, request: &SubmissionRequest) -> Result<(), TransportError>;
}

pub struct ReqwestWebhook {
    client: reqwest::Client,
    url: Url,
}

impl ReqwestWebhook {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let url = parse_webhook_url(url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(client_context())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub fn parse_webhook_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::MissingWebhookUrl);
    }
    if raw == PLACEHOLDER_WEBHOOK_URL {
        return Err(ConfigError::InvalidWebhookUrl {
            url: raw.to_string(),
            reason: "placeholder url, set the real webhook address".to_string(),
        });
    }

    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidWebhookUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidWebhookUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

#[async_trait]
impl WebhookClient for ReqwestWebhook {
    async fn deliver(&self, request: &SubmissionRequest) -> Result<(), TransportError> {
        let result = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await;

        match result {
            Ok(res) if res.status().is_success() => {
                debug!("Webhook accepted lead with status {}", res.status());
                Ok(())
            }
            Ok(res) => {
                error!("Webhook {} rejected lead: status {}", self.url, res.status());
                Err(TransportError::Status(res.status().as_u16()))
            }
            Err(e) => {
                error!("Webhook {} unreachable: {}", self.url, e);
                Err(e.into())
            }
        }
    }
}
