//! # Slack Webhook / Slack Webhook
//!
//! Posts notifications to an incoming webhook.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::core::remote::{Notification, NotificationSink};
use crate::error::{Result, SyncError};

const SERVICE: &str = "Slack";

pub struct SlackWebhook {
    client: Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::remote(SERVICE, None, e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSink for SlackWebhook {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let payload = json!({
            "channel": notification.channel,
            "username": notification.author,
            "icon_emoji": notification.icon,
            "text": notification.text,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::remote(SERVICE, None, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::remote(SERVICE, Some(status.as_u16()), body));
        }
        Ok(())
    }
}
