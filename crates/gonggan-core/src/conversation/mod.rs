//! Chat turns: posting messages, streaming replies, regeneration.

mod coordinator;
mod merge;
mod tickets;

pub use coordinator::{
    ChatCoordinator, ChatMode, ChatSettings, IMAGE_THREAD_TITLE, IMAGE_UNAVAILABLE_TEXT,
    MessagePath, REGENERATE_ERROR_TEXT, ReplyStatus, SEND_ERROR_TEXT, STREAM_ERROR_TEXT,
    SendOutcome, SendRequest, display_text, thread_title,
};
pub use merge::{StreamMerge, format_sources, merge_fragments};
pub use tickets::{StreamTicket, StreamTickets};
