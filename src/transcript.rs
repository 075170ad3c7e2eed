//! Ordered chat transcript shown to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single message in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pending: bool,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            timestamp: Utc::now(),
            pending: false,
        }
    }

    /// Assistant entry still awaiting its reply.
    pub fn is_placeholder(&self) -> bool {
        self.pending
    }
}

/// Handle to the assistant placeholder appended for an in-flight exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderId(usize);

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::new(Role::User, content));
    }

    /// Append an empty assistant message to be filled once the reply arrives.
    pub fn push_placeholder(&mut self) -> PlaceholderId {
        self.push(ChatMessage {
            pending: true,
            ..ChatMessage::new(Role::Assistant, String::new())
        });
        PlaceholderId(self.messages.len() - 1)
    }

    /// Replace the placeholder's content with the reply. Returns false when the
    /// handle no longer points at a placeholder (e.g. transcript was cleared).
    pub fn fill(&mut self, id: PlaceholderId, content: impl Into<String>) -> bool {
        match self.messages.get_mut(id.0) {
            Some(message) if message.is_placeholder() => {
                message.content = content.into();
                message.timestamp = Utc::now();
                message.pending = false;
                true
            }
            _ => false,
        }
    }

    /// Drop the placeholder after a failed exchange.
    pub fn discard(&mut self, id: PlaceholderId) -> bool {
        match self.messages.get(id.0) {
            Some(message) if message.is_placeholder() => {
                self.messages.remove(id.0);
                true
            }
            _ => false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
