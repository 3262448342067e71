use std::time::Duration;

use async_trait::async_trait;
use formpost::{DisabledNotifier, Notifier, NotifyError};
use reqwest::{Client, Url};
use serde_json::Value;

/// Posts payloads to a Slack-compatible incoming webhook.
///
/// One attempt per payload, bounded by the client timeout.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn post(&self, payload: &Value) -> Result<u16, NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                reason: e.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}

/// The notifier chosen at startup.
#[derive(Clone, Debug)]
pub enum ServerNotifier {
    Webhook(WebhookNotifier),
    Disabled(DisabledNotifier),
}

impl ServerNotifier {
    /// A webhook notifier for `url`, or a disabled one when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_url(url: Option<Url>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(match url {
            Some(url) => Self::Webhook(WebhookNotifier::new(url, timeout)?),
            None => Self::Disabled(DisabledNotifier),
        })
    }
}

#[async_trait]
impl Notifier for ServerNotifier {
    async fn post(&self, payload: &Value) -> Result<u16, NotifyError> {
        match self {
            Self::Webhook(notifier) => notifier.post(payload).await,
            Self::Disabled(notifier) => notifier.post(payload).await,
        }
    }
}
