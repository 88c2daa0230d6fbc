use crate::model::WebhookKind;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEnvelope {
    pub status: &'static str,
    pub data: Value,
    pub posted_to_chat: bool,
    pub webhook_used: WebhookKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_error: Option<String>,
}

impl ReportEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            status: "success",
            data,
            posted_to_chat: false,
            webhook_used: WebhookKind::None,
            dispatch_error: None,
        }
    }

    pub fn posted(mut self, webhook: WebhookKind) -> Self {
        self.posted_to_chat = true;
        self.webhook_used = webhook;
        self
    }

    /// The report is still returned when the chat post fails.
    pub fn dispatch_failed(mut self, error: impl ToString) -> Self {
        self.posted_to_chat = false;
        self.webhook_used = WebhookKind::None;
        self.dispatch_error = Some(error.to_string());
        self
    }
}
