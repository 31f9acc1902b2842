use std::sync::Arc;

use futures::StreamExt;
use gonggan_ai::{FragmentStream, ImageGenerator, ImageRequest, TextGenerator, TextRequest};
use gonggan_models::{Message, MessageContent, Sender, SpaceFile, new_id, now};
use tracing::{debug, info, warn};

use super::merge::StreamMerge;
use super::tickets::{StreamTicket, StreamTickets};
use crate::config::GongganConfig;
use crate::error::{Result, StoreError, ValidationError};
use crate::store::SpaceStore;

pub const STREAM_ERROR_TEXT: &str = "오류가 발생했습니다. 잠시 후 다시 시도해주세요.";
pub const SEND_ERROR_TEXT: &str = "오류가 발생했습니다.";
pub const REGENERATE_ERROR_TEXT: &str = "재생성 중 오류가 발생했습니다.";
pub const IMAGE_UNAVAILABLE_TEXT: &str = "죄송합니다. 이미지를 생성하지 못했습니다.";
pub const IMAGE_THREAD_TITLE: &str = "이미지 생성";

const THREAD_TITLE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    #[default]
    Text,
    /// Answer the turn with a single generated image.
    Image,
}

/// One user turn.
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub space_id: String,
    /// Target thread; a new one is created when absent.
    pub thread_id: Option<String>,
    pub text: String,
    pub quoted_context: Option<String>,
    /// Files sent with this turn only.
    pub attachments: Vec<SpaceFile>,
    pub mode: ChatMode,
    /// Overrides the configured text model.
    pub model: Option<String>,
}

impl SendRequest {
    pub fn new(space_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_quoted_context(mut self, context: impl Into<String>) -> Self {
        self.quoted_context = Some(context.into());
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<SpaceFile>) -> Self {
        self.attachments = attachments;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Completed,
    /// The reply carries a fixed error text.
    Failed,
    /// A newer run took over the message; this run's writes were dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub thread_id: String,
    pub user_message_id: String,
    pub reply_message_id: String,
    pub status: ReplyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePath {
    pub space_id: String,
    pub thread_id: String,
    pub message_id: String,
}

impl MessagePath {
    pub fn new(
        space_id: impl Into<String>,
        thread_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            space_id: space_id.into(),
            thread_id: thread_id.into(),
            message_id: message_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub text_model: String,
    pub image_model: String,
    pub history_limit: usize,
}

impl From<&GongganConfig> for ChatSettings {
    fn from(config: &GongganConfig) -> Self {
        Self {
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            history_limit: config.history_limit,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from(&GongganConfig::default())
    }
}

/// Title for a thread opened by its first message.
pub fn thread_title(text: &str, mode: ChatMode) -> String {
    if mode == ChatMode::Image {
        return IMAGE_THREAD_TITLE.to_string();
    }
    if text.chars().count() > THREAD_TITLE_CHARS {
        let head: String = text.chars().take(THREAD_TITLE_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Text shown for the user's message, listing per-turn attachments.
pub fn display_text(text: &str, attachments: &[SpaceFile]) -> String {
    if attachments.is_empty() {
        return text.to_string();
    }
    let names: Vec<&str> = attachments.iter().map(|f| f.name.as_str()).collect();
    let line = format!("[첨부 파일: {}]", names.join(", "));
    if text.is_empty() {
        line
    } else {
        format!("{text}\n{line}")
    }
}

/// Drives chat turns: user message, streamed reply, regeneration.
pub struct ChatCoordinator {
    store: Arc<SpaceStore>,
    text_generator: Arc<dyn TextGenerator>,
    image_generator: Arc<dyn ImageGenerator>,
    tickets: StreamTickets,
    settings: ChatSettings,
}

impl ChatCoordinator {
    pub fn new(
        store: Arc<SpaceStore>,
        text_generator: Arc<dyn TextGenerator>,
        image_generator: Arc<dyn ImageGenerator>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            text_generator,
            image_generator,
            tickets: StreamTickets::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Whether any reply is still being streamed.
    pub fn has_active_streams(&self) -> bool {
        self.tickets.active() > 0
    }

    /// Post a user turn and produce the AI reply.
    pub async fn send_message(&self, request: SendRequest) -> Result<SendOutcome> {
        if request.text.trim().is_empty() && request.attachments.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let space = self.store.space(&request.space_id)?;
        let thread_id = match &request.thread_id {
            Some(thread_id) => {
                if space.thread(thread_id).is_none() {
                    return Err(StoreError::ThreadNotFound(thread_id.clone()).into());
                }
                thread_id.clone()
            }
            None => self
                .store
                .create_thread(&space.id, &thread_title(&request.text, request.mode))?,
        };
        let history = self
            .store
            .snapshot()
            .thread(&space.id, &thread_id)
            .map(|t| self.recent(&t.messages))
            .unwrap_or_default();

        let mut user_message = Message::user(display_text(&request.text, &request.attachments));
        if let Some(context) = &request.quoted_context {
            user_message = user_message.with_quoted_context(context.clone());
        }
        let user_message_id = self
            .store
            .append_message(&space.id, &thread_id, user_message)?;
        info!(
            space_id = %space.id,
            thread_id = %thread_id,
            mode = ?request.mode,
            attachments = request.attachments.len(),
            "User message posted"
        );

        let (reply_message_id, status) = match request.mode {
            ChatMode::Image => self.reply_with_image(&space.id, &thread_id, &request).await?,
            ChatMode::Text => {
                let reply_id = new_id();
                let path = MessagePath::new(&space.id, &thread_id, &reply_id);
                let ticket = self.tickets.issue(&reply_id);
                let text_request = TextRequest {
                    prompt: request.text.clone(),
                    quoted_context: request.quoted_context.clone(),
                    context_files: space.files.clone(),
                    instructions: space.instructions.clone(),
                    web_search_enabled: space.web_search_enabled,
                    history,
                    attachments: request.attachments,
                    model: request
                        .model
                        .unwrap_or_else(|| self.settings.text_model.clone()),
                };

                let result = match self.store.append_message(
                    &space.id,
                    &thread_id,
                    Message::streaming_placeholder(&reply_id),
                ) {
                    Ok(_) => {
                        let stream = self.text_generator.stream_text(text_request);
                        self.merge_stream(&path, stream, &ticket, STREAM_ERROR_TEXT)
                            .await
                    }
                    Err(e) => Err(e.into()),
                };
                self.tickets.release(&ticket);
                (reply_id, result?)
            }
        };

        Ok(SendOutcome {
            thread_id,
            user_message_id,
            reply_message_id,
            status,
        })
    }

    async fn reply_with_image(
        &self,
        space_id: &str,
        thread_id: &str,
        request: &SendRequest,
    ) -> Result<(String, ReplyStatus)> {
        let image_request = ImageRequest {
            model: self.settings.image_model.clone(),
            ..ImageRequest::new(request.text.clone())
        };
        let (reply, status) = match self.image_generator.generate_image(image_request).await {
            Ok(Some(image)) => (Message::ai_image(image), ReplyStatus::Completed),
            Ok(None) => (
                Message::ai_text(IMAGE_UNAVAILABLE_TEXT),
                ReplyStatus::Failed,
            ),
            Err(e) => {
                warn!(space_id, thread_id, error = %e, "Image reply failed");
                (Message::ai_text(SEND_ERROR_TEXT), ReplyStatus::Failed)
            }
        };
        let reply_id = self.store.append_message(space_id, thread_id, reply)?;
        Ok((reply_id, status))
    }

    /// Re-run an AI reply in place, reusing its message id.
    ///
    /// The paired user message is the prompt; everything before it is history.
    pub async fn regenerate(
        &self,
        space_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> Result<ReplyStatus> {
        let space = self.store.space(space_id)?;
        let thread = space
            .thread(thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        let index = thread
            .position(message_id)
            .ok_or_else(|| StoreError::MessageNotFound(message_id.to_string()))?;
        if index == 0 {
            return Err(ValidationError::NothingToRegenerate.into());
        }
        if thread.messages[index].sender != Sender::Ai {
            return Err(ValidationError::NotAnAiReply(message_id.to_string()).into());
        }

        let prompt_message = &thread.messages[index - 1];
        let text_request = TextRequest {
            prompt: prompt_message.text().unwrap_or_default().to_string(),
            quoted_context: prompt_message.quoted_context.clone(),
            context_files: space.files.clone(),
            instructions: space.instructions.clone(),
            web_search_enabled: space.web_search_enabled,
            history: self.recent(&thread.messages[..index - 1]),
            attachments: Vec::new(),
            model: self.settings.text_model.clone(),
        };

        let path = MessagePath::new(space_id, thread_id, message_id);
        let ticket = self.tickets.issue(message_id);
        info!(space_id, thread_id, message_id, "Regenerating reply");

        let result = match self.write_if_current(&path, &ticket, |m| {
            m.content = MessageContent::Text(String::new());
            m.is_streaming = true;
        }) {
            Ok(true) => {
                let stream = self.text_generator.stream_text(text_request);
                self.merge_stream(&path, stream, &ticket, REGENERATE_ERROR_TEXT)
                    .await
            }
            Ok(false) => Ok(ReplyStatus::Superseded),
            Err(e) => Err(e),
        };
        self.tickets.release(&ticket);
        result
    }

    /// Fold a fragment stream into the target message.
    ///
    /// Each fragment with text replaces the message text with the running
    /// total. After
    /// the last fragment, qualifying citations are appended as a sources
    /// block, then the message is settled. A stream error writes
    /// `error_text` and settles the message. Writes stop as soon as the
    /// ticket is superseded.
    pub async fn merge_stream(
        &self,
        target: &MessagePath,
        mut stream: FragmentStream,
        ticket: &StreamTicket,
        error_text: &str,
    ) -> Result<ReplyStatus> {
        let mut merge = StreamMerge::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    let text = merge.push(&fragment).to_string();
                    // Citations alone are held until the stream ends.
                    if fragment.text.is_empty() {
                        continue;
                    }
                    if !self.write_if_current(target, ticket, |m| {
                        m.content = MessageContent::Text(text);
                    })? {
                        debug!(message_id = %target.message_id, "Stream superseded");
                        return Ok(ReplyStatus::Superseded);
                    }
                }
                Err(e) => {
                    warn!(
                        space_id = %target.space_id,
                        thread_id = %target.thread_id,
                        message_id = %target.message_id,
                        fragments = merge.fragments(),
                        error = %e,
                        "Reply stream failed"
                    );
                    let written = self.settle_if_current(target, ticket, |m| {
                        m.content = MessageContent::Text(error_text.to_string());
                    })?;
                    return Ok(if written {
                        ReplyStatus::Failed
                    } else {
                        ReplyStatus::Superseded
                    });
                }
            }
        }

        if let Some(text) = merge.finish()
            && !self.write_if_current(target, ticket, |m| {
                m.content = MessageContent::Text(text);
            })?
        {
            return Ok(ReplyStatus::Superseded);
        }

        if !self.settle_if_current(target, ticket, |_| {})? {
            return Ok(ReplyStatus::Superseded);
        }
        debug!(
            message_id = %target.message_id,
            fragments = merge.fragments(),
            chars = merge.text().chars().count(),
            "Reply settled"
        );
        Ok(ReplyStatus::Completed)
    }

    /// Update the target message while `ticket` is current. The ticket check
    /// and the write happen under the store's write lock.
    fn write_if_current<F>(&self, target: &MessagePath, ticket: &StreamTicket, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Message),
    {
        Ok(self.store.apply(|current| {
            if !self.tickets.is_current(ticket) {
                return Ok(None);
            }
            current
                .update_message(&target.space_id, &target.thread_id, &target.message_id, f)
                .map(Some)
        })?)
    }

    /// Final write: clear the streaming flag and stamp message and thread.
    fn settle_if_current<F>(&self, target: &MessagePath, ticket: &StreamTicket, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Message),
    {
        let at = now();
        Ok(self.store.apply(|current| {
            if !self.tickets.is_current(ticket) {
                return Ok(None);
            }
            current
                .update_message(&target.space_id, &target.thread_id, &target.message_id, |m| {
                    f(m);
                    m.is_streaming = false;
                    m.timestamp = at;
                })?
                .update_thread(&target.space_id, &target.thread_id, |t| {
                    t.last_message_at = at;
                })
                .map(Some)
        })?)
    }

    fn recent(&self, messages: &[Arc<Message>]) -> Vec<Arc<Message>> {
        let skip = messages.len().saturating_sub(self.settings.history_limit);
        messages[skip..].to_vec()
    }
}
