//! Prompt assembly shared by text backends.
//!
//! Parts are emitted in a fixed order: project files, per-turn attachments,
//! instructions, recent history, then the user query.

use gonggan_models::{ContentKind, FileKind, Sender, compose_quoted_text};

use crate::generation::TextRequest;

/// Number of trailing history messages sent with a request.
pub const HISTORY_LIMIT: usize = 10;

pub const SYSTEM_INSTRUCTION: &str = "You are Gonggan Agent. Speak Korean. Answer naturally without using Markdown headers (###) or code blocks (```) unless specifically asked for code. Keep responses clean and conversational.";

/// A prompt part borrowing from the request it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart<'a> {
    Text(String),
    Inline { mime_type: &'a str, data: &'a [u8] },
}

impl PromptPart<'_> {
    fn text(text: impl Into<String>) -> Self {
        PromptPart::Text(text.into())
    }
}

pub fn build_prompt_parts(request: &TextRequest) -> Vec<PromptPart<'_>> {
    let mut parts = Vec::new();

    if !request.context_files.is_empty() {
        parts.push(PromptPart::text("--- BEGIN PROJECT CONTEXT FILES ---"));
        for file in &request.context_files {
            match (&file.data, &file.mime_type) {
                (Some(data), Some(mime_type)) if file.kind != FileKind::Link => {
                    parts.push(PromptPart::Inline { mime_type, data });
                    parts.push(PromptPart::text(format!("[File: {}]", file.name)));
                }
                _ if file.kind == FileKind::Link => {
                    let target = file.url.as_deref().unwrap_or(&file.name);
                    parts.push(PromptPart::text(format!("[Link: {target}]")));
                }
                _ => {}
            }
        }
        parts.push(PromptPart::text("--- END PROJECT CONTEXT FILES ---"));
    }

    if !request.attachments.is_empty() {
        parts.push(PromptPart::text("--- BEGIN CURRENT MESSAGE ATTACHMENTS ---"));
        for file in &request.attachments {
            if let (Some(data), Some(mime_type)) = (&file.data, &file.mime_type) {
                parts.push(PromptPart::Inline { mime_type, data });
                parts.push(PromptPart::text(format!("[Attached File: {}]", file.name)));
            }
        }
        parts.push(PromptPart::text("--- END ATTACHMENTS ---"));
    }

    if !request.instructions.is_empty() {
        parts.push(PromptPart::text(format!(
            "[PROJECT INSTRUCTIONS]: {}",
            request.instructions
        )));
    }

    if !request.history.is_empty() {
        parts.push(PromptPart::text("--- PREVIOUS CONVERSATION HISTORY ---"));
        let skip = request.history.len().saturating_sub(HISTORY_LIMIT);
        for message in request.history.iter().skip(skip) {
            let role = match message.sender {
                Sender::User => "User",
                Sender::Ai => "AI",
            };
            match message.content_kind() {
                ContentKind::Text => {
                    let text = message.full_text().unwrap_or_default();
                    parts.push(PromptPart::text(format!("{role}: {text}")));
                }
                ContentKind::Image => {
                    parts.push(PromptPart::text(format!("{role}: [Generated an Image]")));
                }
            }
        }
        parts.push(PromptPart::text("--- END HISTORY ---"));
    }

    let query = match &request.quoted_context {
        Some(context) => compose_quoted_text(context, &request.prompt),
        None => request.prompt.clone(),
    };
    parts.push(PromptPart::text(format!("User Query: {query}")));

    parts
}
