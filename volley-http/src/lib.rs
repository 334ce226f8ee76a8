//! HTTP side of the volley load harness
//!
//! [`WebhookOperation`] posts one bot update per task to the system under
//! test. When latency tracking is enabled the same request identifier is
//! registered in a correlation table, and [`CallbackListener`] pairs the
//! outbound message the system sends back with it. [`ChatNotifier`] posts the
//! finished report to a chat.

pub mod client;
pub mod errors;
pub mod listener;
pub mod notify;
pub mod types;

// Re-export main types for convenience
pub use client::{build_client, WebhookOperation};
pub use errors::HttpError;
pub use listener::CallbackListener;
pub use notify::ChatNotifier;
pub use types::{ApiReply, CallbackMessage, Chat, UpdateMessage, User, WebhookUpdate};
