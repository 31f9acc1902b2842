use std::path::PathBuf;

use anyhow::Result;
use gonggan_core::{GongganConfig, GongganCore};
use serde_json::json;

use crate::cli::{NoteCommands, OutputDirArgs};
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::setup::{offline_core, open_archive, save_space};

pub async fn run(config: &GongganConfig, command: NoteCommands, format: OutputFormat) -> Result<()> {
    let core = offline_core(config);
    match command {
        NoteCommands::Add {
            archive,
            content,
            output,
        } => {
            let space_id = open_archive(&core, &archive).await?;
            let note_id = core.store.add_note(&space_id, &content)?;
            finish(&core, &space_id, &output, "Note added", &note_id, format).await
        }
        NoteCommands::Delete {
            archive,
            id,
            output,
        } => {
            let space_id = open_archive(&core, &archive).await?;
            core.store.delete_note(&space_id, &id)?;
            finish(&core, &space_id, &output, "Note deleted", &id, format).await
        }
        NoteCommands::ToFile {
            archive,
            id,
            output,
        } => {
            let space_id = open_archive(&core, &archive).await?;
            let file_id = core.store.note_to_file(&space_id, &id)?;
            finish(&core, &space_id, &output, "Note copied to file", &file_id, format).await
        }
    }
}

async fn finish(
    core: &GongganCore,
    space_id: &str,
    output: &OutputDirArgs,
    action: &str,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    let path: PathBuf = save_space(core, space_id, output).await?;

    if format.is_json() {
        return print_json(&json!({ "id": id, "path": path }));
    }

    println!("{action}: {id}");
    println!("Saved: {}", path.display());
    Ok(())
}
