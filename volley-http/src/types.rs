//! Wire formats exchanged with the system under test

use serde::{Deserialize, Serialize};
use volley_core::Task;

/// Bot update posted to the target's webhook endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookUpdate {
    pub update_id: i64,
    pub message: UpdateMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl WebhookUpdate {
    /// The request identifier doubles as update id and chat id, so the reply
    /// the target sends to that chat can be correlated.
    pub fn for_task(task: &Task, text: &str) -> Self {
        let id = task.request_id;
        Self {
            update_id: id,
            message: UpdateMessage {
                chat: Chat { id },
                from: Some(User {
                    id,
                    username: Some(format!("volley_{}", id)),
                }),
                text: text.to_string(),
            },
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.message.chat.id
    }
}

/// Outbound message the target sends back through the bot API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackMessage {
    pub chat_id: i64,
    #[serde(default)]
    pub text: Option<String>,
}

/// Bot API reply envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiReply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            description: None,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            ok: false,
            description: Some(description.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use volley_core::TaskFactory;

    #[test]
    fn test_update_wire_format() {
        let task = TaskFactory::new(0, 0).task(9);
        let update = WebhookUpdate::for_task(&task, "/start");

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            json!({
                "update_id": 10,
                "message": {
                    "chat": { "id": 10 },
                    "from": { "id": 10, "username": "volley_10" },
                    "text": "/start"
                }
            })
        );
    }

    #[test]
    fn test_callback_text_is_optional() {
        let message: CallbackMessage = serde_json::from_str(r#"{"chat_id": 3}"#).unwrap();
        assert_eq!(message.chat_id, 3);
        assert_eq!(message.text, None);

        let message: CallbackMessage =
            serde_json::from_str(r#"{"chat_id": 4, "text": "hi", "parse_mode": "HTML"}"#).unwrap();
        assert_eq!(message.text.as_deref(), Some("hi"));
    }
}
