use crate::error::{Error, Result};
use crate::report::ChatMessage;
use reqwest::Client;

pub trait ChatDispatcher {
    async fn dispatch(&self, webhook: &str, message: &ChatMessage) -> Result<()>;
}

impl ChatDispatcher for Client {
    async fn dispatch(&self, webhook: &str, message: &ChatMessage) -> Result<()> {
        let response = self.post(webhook).json(&message.payload()).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "chat webhook rejected the message");
            return Err(Error::Dispatch { status, body });
        }
        tracing::info!(status, "posted message to chat");
        Ok(())
    }
}
