//! Report delivery to a chat through the bot API

use crate::client::build_client;
use crate::errors::HttpError;
use crate::types::ApiReply;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;
use volley_config::{HttpConfig, NotifyConfig};
use volley_core::{HarnessError, HarnessResult, Report, ReportSink};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Posts the rendered report as a chat message
#[derive(Debug, Clone)]
pub struct ChatNotifier {
    client: Client,
    url: String,
    chat_id: i64,
}

impl ChatNotifier {
    pub fn new(notify: &NotifyConfig, http: &HttpConfig) -> Result<Self, HttpError> {
        Ok(Self {
            client: build_client(http)?,
            url: notify.send_message_url(),
            chat_id: notify.chat_id,
        })
    }

    async fn send(&self, text: &str) -> Result<(), HttpError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SendMessage {
                chat_id: self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        let reply: ApiReply = serde_json::from_slice(&body)?;
        if !reply.ok {
            return Err(HttpError::ConfigError(
                reply
                    .description
                    .unwrap_or_else(|| "bot API rejected the message".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportSink for ChatNotifier {
    fn name(&self) -> &str {
        "chat"
    }

    async fn deliver(&self, report: &Report) -> HarnessResult<()> {
        self.send(&report.render_text())
            .await
            .map_err(|e| HarnessError::Sink(format!("chat notification failed: {}", e)))?;
        info!("Report sent to chat {}", self.chat_id);
        Ok(())
    }

    async fn deliver_error(&self, failure: &HarnessError) -> HarnessResult<()> {
        self.send(&format!("volley run failed: {}", failure))
            .await
            .map_err(|e| HarnessError::Sink(format!("chat notification failed: {}", e)))
    }
}
