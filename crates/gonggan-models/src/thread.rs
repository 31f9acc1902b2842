use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts")]
use ts_rs::TS;

use crate::Message;

/// Ordered conversation inside a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub last_message_at: DateTime<Utc>,
    /// Conversation order; ids are unique within the thread.
    #[serde(default)]
    pub messages: Vec<Arc<Message>>,
}

impl Thread {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            title: title.into(),
            last_message_at: crate::now(),
            messages: Vec::new(),
        }
    }

    pub fn position(&self, message_id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }

    pub fn message(&self, message_id: &str) -> Option<&Arc<Message>> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Whether any message is still marked as streaming.
    pub fn has_streaming(&self) -> bool {
        self.messages.iter().any(|m| m.is_streaming)
    }
}
