use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    config::NotifierConfig,
    error::{RecoverError, Result},
    notify::message::PersonalizedMessage,
};

/// Seam to the external delivery subsystem. Sends are best-effort side
/// calls: the dispatcher never deduplicates, so two sends with identical
/// inputs are two deliveries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn send(&self, message: PersonalizedMessage) -> Result<()>;
}

/// Production dispatcher: POSTs the personalized message as JSON to the
/// configured delivery endpoint.
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDispatcher {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecoverError::Notification(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl MessageDispatcher for HttpDispatcher {
    async fn send(&self, message: PersonalizedMessage) -> Result<()> {
        let recipient = message.recipient.email.clone();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| RecoverError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RecoverError::Notification(format!(
                "delivery endpoint returned {}",
                response.status()
            )));
        }

        debug!("Delivered password reset message to {}", recipient);
        Ok(())
    }
}

/// Stand-in used when notifications are disabled in config. Sends succeed
/// without reaching any delivery subsystem.
pub struct NullDispatcher;

#[async_trait]
impl MessageDispatcher for NullDispatcher {
    async fn send(&self, message: PersonalizedMessage) -> Result<()> {
        debug!(
            "Notifications disabled, skipping send to {}",
            message.recipient.email
        );
        Ok(())
    }
}
