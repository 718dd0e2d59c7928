use async_trait::async_trait;
use sluice_types::{AccountId, ChatId, MessageId, Result};

/// Reference to an image held by the transport (e.g. a file id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef(pub String);

/// An inline action attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Callback { label: String, data: String },
    Url { label: String, url: String },
}

impl Action {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Callback {
            label: label.into(),
            data: data.into(),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Url {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Inbound account activity delivered by the transport. The transport
/// serializes delivery per account; events for different accounts may
/// interleave arbitrarily.
#[derive(Debug, Clone)]
pub struct Event {
    pub account: AccountId,
    pub display_name: String,
    pub username: Option<String>,
    pub timestamp: i64,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    Text(String),
    Button(String),
    Photo(PhotoRef),
}

/// Outbound messaging capability. The engine depends only on this surface,
/// never on a concrete transport protocol.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat: ChatId, text: &str) -> Result<MessageId>;

    async fn send_with_actions(
        &self,
        chat: ChatId,
        text: &str,
        actions: &[Action],
    ) -> Result<MessageId>;

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PhotoRef,
        caption: &str,
        actions: &[Action],
    ) -> Result<MessageId>;

    /// Replace the text (or caption) of a previously sent message and drop
    /// its inline actions.
    async fn edit_message(&self, chat: ChatId, message: MessageId, text: &str) -> Result<()>;

    async fn is_channel_member(&self, channel: ChatId, account: AccountId) -> Result<bool>;
}
