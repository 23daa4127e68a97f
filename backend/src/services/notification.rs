//! Supplier notification channels
//!
//! Supports:
//! - Structured log delivery (development, tests)
//! - JSON webhook delivery

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{NotificationConfig, NotificationMode};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to reach notification endpoint: {0}")]
    Transport(String),

    #[error("Notification endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Notification channel misconfigured: {0}")]
    Misconfigured(String),
}

/// A message for one supplier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Outbound channel to suppliers
#[async_trait]
pub trait SupplierNotifier: Send + Sync {
    async fn notify(&self, message: &SupplierMessage) -> Result<(), NotifyError>;
}

/// Writes each message as a tracing event
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl SupplierNotifier for LogNotifier {
    async fn notify(&self, message: &SupplierMessage) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            body = %message.body,
            "Supplier notification"
        );
        Ok(())
    }
}

/// POSTs `{recipient, subject, body}` to a webhook
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SupplierNotifier for WebhookNotifier {
    async fn notify(&self, message: &SupplierMessage) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected { status, body })
        }
    }
}

/// Build the notifier selected by configuration
pub fn notifier_from_config(
    config: &NotificationConfig,
) -> Result<std::sync::Arc<dyn SupplierNotifier>, NotifyError> {
    match config.mode {
        NotificationMode::Log => Ok(std::sync::Arc::new(LogNotifier)),
        NotificationMode::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| NotifyError::Misconfigured("webhook_url is not set".to_string()))?;
            Ok(std::sync::Arc::new(WebhookNotifier::new(url)))
        }
    }
}
