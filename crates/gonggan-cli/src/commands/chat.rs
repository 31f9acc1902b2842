use std::path::Path;

use anyhow::{Context, Result};
use gonggan_core::conversation::ReplyStatus;
use gonggan_core::{ChatMode, GongganConfig, GongganCore, SendRequest};
use gonggan_models::{MessageContent, SpaceFile};
use serde_json::json;

use crate::cli::{ChatArgs, RegenerateArgs};
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::setup::{open_archive, prepare_core, save_space};

pub async fn run(config: &GongganConfig, args: ChatArgs, format: OutputFormat) -> Result<()> {
    let core = prepare_core(config, &args.generator)?;
    let space_id = open_archive(&core, &args.archive).await?;

    let attachments = args
        .attachments
        .iter()
        .map(|path| load_attachment(path))
        .collect::<Result<Vec<_>>>()?;

    let mut request = SendRequest::new(&space_id, args.message).with_attachments(attachments);
    request.thread_id = args.thread;
    request.quoted_context = args.quote;
    request.model = args.generator.model;
    if args.image {
        request = request.with_mode(ChatMode::Image);
    }

    let outcome = core.chat.send_message(request).await?;
    let reply = reply_preview(&core, &space_id, &outcome.thread_id, &outcome.reply_message_id);
    let path = save_space(&core, &space_id, &args.output).await?;

    if format.is_json() {
        return print_json(&json!({
            "thread_id": outcome.thread_id,
            "reply_id": outcome.reply_message_id,
            "status": status_label(outcome.status),
            "reply": reply,
            "path": path,
        }));
    }

    println!("{reply}");
    println!();
    println!("Thread:  {}", outcome.thread_id);
    println!("Status:  {}", status_label(outcome.status));
    println!("Saved:   {}", path.display());
    Ok(())
}

pub async fn regenerate(
    config: &GongganConfig,
    args: RegenerateArgs,
    format: OutputFormat,
) -> Result<()> {
    let core = prepare_core(config, &args.generator)?;
    let space_id = open_archive(&core, &args.archive).await?;

    let status = core
        .chat
        .regenerate(&space_id, &args.thread, &args.message)
        .await?;
    let reply = reply_preview(&core, &space_id, &args.thread, &args.message);
    let path = save_space(&core, &space_id, &args.output).await?;

    if format.is_json() {
        return print_json(&json!({
            "status": status_label(status),
            "reply": reply,
            "path": path,
        }));
    }

    println!("{reply}");
    println!();
    println!("Status:  {}", status_label(status));
    println!("Saved:   {}", path.display());
    Ok(())
}

fn load_attachment(path: &Path) -> Result<SpaceFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SpaceFile::upload(name, None, bytes))
}

fn reply_preview(core: &GongganCore, space_id: &str, thread_id: &str, message_id: &str) -> String {
    let snapshot = core.store.snapshot();
    match snapshot.message(space_id, thread_id, message_id).map(|m| &m.content) {
        Some(MessageContent::Text(text)) => text.clone(),
        Some(MessageContent::Image(image)) => {
            format!("[image {}, {} bytes]", image.mime_type, image.bytes.len())
        }
        None => String::new(),
    }
}

fn status_label(status: ReplyStatus) -> &'static str {
    match status {
        ReplyStatus::Completed => "completed",
        ReplyStatus::Failed => "failed",
        ReplyStatus::Superseded => "superseded",
    }
}
