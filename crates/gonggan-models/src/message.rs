//! Conversation messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts")]
use ts_rs::TS;

use crate::ImageData;

pub const QUOTED_CONTEXT_LABEL: &str = "[인용된 컨텍스트]:";
pub const QUESTION_LABEL: &str = "[사용자 질문]:";

/// Flatten a quoted context and the user's question into the plain-text
/// form backends and older archives understand.
pub fn compose_quoted_text(context: &str, question: &str) -> String {
    format!("{QUOTED_CONTEXT_LABEL}\n\"{context}\"\n\n{QUESTION_LABEL}\n{question}")
}

/// Who produced a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "UPPERCASE")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentKind {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MessageContent {
    Text(String),
    Image(ImageData),
}

impl MessageContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            MessageContent::Text(_) => ContentKind::Text,
            MessageContent::Image(_) => ContentKind::Image,
        }
    }
}

/// Single message in a thread
///
/// `is_streaming` is only ever set on AI text messages while a response is
/// being merged into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: MessageContent,
    /// Text the user quoted into this turn, kept apart from the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_context: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_streaming: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            sender: Sender::User,
            content: MessageContent::Text(text.into()),
            quoted_context: None,
            timestamp: crate::now(),
            is_streaming: false,
        }
    }

    pub fn ai_text(text: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            sender: Sender::Ai,
            content: MessageContent::Text(text.into()),
            quoted_context: None,
            timestamp: crate::now(),
            is_streaming: false,
        }
    }

    pub fn ai_image(image: ImageData) -> Self {
        Self {
            id: crate::new_id(),
            sender: Sender::Ai,
            content: MessageContent::Image(image),
            quoted_context: None,
            timestamp: crate::now(),
            is_streaming: false,
        }
    }

    /// Empty AI text message that a response stream will fill in.
    pub fn streaming_placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender: Sender::Ai,
            content: MessageContent::Text(String::new()),
            quoted_context: None,
            timestamp: crate::now(),
            is_streaming: true,
        }
    }

    pub fn with_quoted_context(mut self, context: impl Into<String>) -> Self {
        self.quoted_context = Some(context.into());
        self
    }

    pub fn content_kind(&self) -> ContentKind {
        self.content.kind()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Image(_) => None,
        }
    }

    /// Text with any quoted context folded back in.
    pub fn full_text(&self) -> Option<String> {
        let text = self.text()?;
        Some(match &self.quoted_context {
            Some(context) => compose_quoted_text(context, text),
            None => text.to_string(),
        })
    }

    pub fn is_ai_text(&self) -> bool {
        self.sender == Sender::Ai && self.content_kind() == ContentKind::Text
    }
}
