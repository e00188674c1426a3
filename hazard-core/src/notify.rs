use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::config::{AppConfig, SmsConfig};
use crate::error::DeliveryError;

/// One outbound delivery channel (SMS, webhook, ...).
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, title: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Fans one alert out to every configured channel. Delivery is best effort:
/// a failing channel is logged and skipped, it never reaches the caller and
/// never blocks the remaining channels.
pub struct Notifier {
    channels: Vec<Box<dyn DeliveryChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn DeliveryChannel>>) -> Self {
        Self { channels }
    }

    /// Assemble channels from the notification settings. An unconfigured
    /// channel is skipped with a warning, not an error.
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let mut channels: Vec<Box<dyn DeliveryChannel>> = Vec::new();

        match config.sms_settings() {
            Some(sms) => channels.push(Box::new(SmsChannel::new(client.clone(), sms))),
            None => warn!("Twilio not configured, SMS alerts disabled"),
        }
        match &config.notify.webhook_url {
            Some(url) => channels.push(Box::new(WebhookChannel::new(client, url.clone()))),
            None => warn!("no webhook URL configured, webhook alerts disabled"),
        }

        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub async fn notify(&self, title: &str, body: &str) {
        info!(%title, "dispatching alert");
        for channel in &self.channels {
            if let Err(err) = channel.deliver(title, body).await {
                warn!(channel = channel.name(), error = %err, "notification delivery failed");
            }
        }
    }
}

/// SMS delivery through the Twilio REST API.
pub struct SmsChannel {
    client: Client,
    config: SmsConfig,
}

impl SmsChannel {
    pub fn new(client: Client, config: SmsConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl DeliveryChannel for SmsChannel {
    fn name(&self) -> &'static str {
        "sms"
    }

    async fn deliver(&self, title: &str, body: &str) -> Result<(), DeliveryError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let message = format!("{title}\n{body}");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.from_number.as_str()),
                ("To", self.config.to_number.as_str()),
                ("Body", message.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                channel: "sms",
                status,
            });
        }
        Ok(())
    }
}

/// JSON POST of `{title, body}` to a configured endpoint.
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl DeliveryChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, title: &str, body: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                channel: "webhook",
                status,
            });
        }
        Ok(())
    }
}
