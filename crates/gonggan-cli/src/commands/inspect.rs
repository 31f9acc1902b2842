use anyhow::{Result, anyhow};
use comfy_table::{Cell, Table};
use gonggan_models::{MessageContent, Sender, Space};
use gonggan_storage::import_space_from_path;
use serde::Serialize;

use crate::cli::InspectArgs;
use crate::commands::utils::{format_timestamp, preview_text};
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::output::table::{print_table, table_with_header};

#[derive(Serialize)]
struct SpaceSummary<'a> {
    title: &'a str,
    description: &'a str,
    last_active: String,
    web_search_enabled: bool,
    threads: Vec<ThreadSummary<'a>>,
    files: Vec<&'a str>,
    images: Vec<ImageSummary<'a>>,
    notes: usize,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ThreadSummary<'a> {
    id: &'a str,
    title: &'a str,
    messages: usize,
}

#[derive(Serialize)]
struct ImageSummary<'a> {
    id: &'a str,
    prompt: &'a str,
    status: &'static str,
}

pub async fn run(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let imported = import_space_from_path(&args.archive).await?;
    let space = &imported.space;
    let warnings: Vec<String> = imported.warnings.iter().map(ToString::to_string).collect();

    if let Some(thread_id) = &args.thread
        && space.thread(thread_id).is_none()
    {
        return Err(anyhow!("Thread not found: {}", thread_id));
    }

    if format.is_json() {
        return print_json(&summarize(space, warnings));
    }

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Title"), Cell::new(&space.title)]);
    table.add_row(vec![
        Cell::new("Description"),
        Cell::new(preview_text(&space.description, 48)),
    ]);
    table.add_row(vec![
        Cell::new("Last active"),
        Cell::new(format_timestamp(space.last_active)),
    ]);
    table.add_row(vec![
        Cell::new("Web search"),
        Cell::new(if space.web_search_enabled { "on" } else { "off" }),
    ]);
    table.add_row(vec![Cell::new("Notes"), Cell::new(space.notes.len())]);
    print_table(table)?;

    let threads = space
        .threads
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                preview_text(&t.title, 36),
                t.messages.len().to_string(),
                format_timestamp(t.last_message_at),
            ]
        })
        .collect();
    if let Some(table) = table_with_header(vec!["Thread", "Title", "Messages", "Last"], threads) {
        print_table(table)?;
    }

    let files = space
        .files
        .iter()
        .map(|f| {
            vec![
                f.name.clone(),
                f.kind.as_str().to_string(),
                f.size.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    if let Some(table) = table_with_header(vec!["File", "Kind", "Size"], files) {
        print_table(table)?;
    }

    let images = space
        .generated_images
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                preview_text(&i.prompt, 36),
                i.status.as_str().to_string(),
            ]
        })
        .collect();
    if let Some(table) = table_with_header(vec!["Image", "Prompt", "Status"], images) {
        print_table(table)?;
    }

    if let Some(thread) = args.thread.as_deref().and_then(|id| space.thread(id)) {
        let messages = thread
            .messages
            .iter()
            .map(|m| {
                let preview = match &m.content {
                    MessageContent::Text(text) => preview_text(text, 48),
                    MessageContent::Image(image) => format!("[{}]", image.mime_type),
                };
                vec![m.id.clone(), sender_label(m.sender).to_string(), preview]
            })
            .collect();
        if let Some(table) = table_with_header(vec!["Message", "Sender", "Content"], messages) {
            print_table(table)?;
        }
    }

    for warning in warnings {
        println!("Warning: {warning}");
    }
    Ok(())
}

fn summarize(space: &Space, warnings: Vec<String>) -> SpaceSummary<'_> {
    SpaceSummary {
        title: &space.title,
        description: &space.description,
        last_active: space.last_active.to_rfc3339(),
        web_search_enabled: space.web_search_enabled,
        threads: space
            .threads
            .iter()
            .map(|t| ThreadSummary {
                id: &t.id,
                title: &t.title,
                messages: t.messages.len(),
            })
            .collect(),
        files: space.files.iter().map(|f| f.name.as_str()).collect(),
        images: space
            .generated_images
            .iter()
            .map(|i| ImageSummary {
                id: &i.id,
                prompt: &i.prompt,
                status: i.status.as_str(),
            })
            .collect(),
        notes: space.notes.len(),
        warnings,
    }
}

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Ai => "ai",
    }
}
