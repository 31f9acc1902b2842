use std::io::{Cursor, Write};

use gonggan_models::{ImageStatus, MessageContent, PNG_MIME, Space};
use serde::Serialize;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::naming::{EntryNames, note_file_name};
use super::records::{
    FileRecord, GalleryRecord, MessageRecord, MetadataRecord, NoteRecord, ThreadRecord,
};
use super::{
    FILES_DIR, FILES_MANIFEST_ENTRY, FORMAT_VERSION, GALLERY_ENTRY, IMAGES_DIR, METADATA_ENTRY,
    NOTES_DIR, NOTES_ENTRY, THREADS_ENTRY,
};
use crate::error::Result;

/// Serialize a space into `.gonggan` bytes.
///
/// The output depends only on the space: entries are written in a fixed order
/// with a fixed modification time.
pub fn write_archive(space: &Space) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    write_json(&mut zip, options, METADATA_ENTRY, &metadata_record(space))?;

    let threads: Vec<ThreadRecord> = space
        .threads
        .iter()
        .map(|thread| ThreadRecord {
            id: thread.id.clone(),
            title: thread.title.clone(),
            last_message_at: thread.last_message_at,
            messages: thread.messages.iter().map(|m| message_record(m)).collect(),
        })
        .collect();
    write_json(&mut zip, options, THREADS_ENTRY, &threads)?;

    let mut entries = EntryNames::default();
    let mut manifest = Vec::with_capacity(space.files.len());
    for file in &space.files {
        let mut entry_name = None;
        let has_content = match (&file.data, file.has_payload()) {
            (Some(data), true) => {
                let entry = entries.claim_file(&file.name);
                write_bytes(&mut zip, options, &format!("{FILES_DIR}/{entry}"), data)?;
                if entry != file.name {
                    entry_name = Some(entry);
                }
                true
            }
            _ => false,
        };
        manifest.push(FileRecord {
            id: Some(file.id.clone()),
            name: file.name.clone(),
            kind: file.kind,
            size: file.size.clone(),
            added_at: file.added_at,
            mime_type: file.mime_type.clone(),
            url: file.url.clone(),
            has_content,
            entry_name,
        });
    }
    write_json(&mut zip, options, FILES_MANIFEST_ENTRY, &manifest)?;

    let mut gallery = Vec::with_capacity(space.generated_images.len());
    for image in &space.generated_images {
        let mut mime_type = None;
        let file_name = match (&image.image, image.status) {
            (Some(data), ImageStatus::Completed) => {
                let file_name = format!("img_{}.png", image.id);
                write_bytes(
                    &mut zip,
                    options,
                    &format!("{IMAGES_DIR}/{file_name}"),
                    &data.bytes,
                )?;
                if data.mime_type != PNG_MIME {
                    mime_type = Some(data.mime_type.clone());
                }
                Some(file_name)
            }
            _ => None,
        };
        gallery.push(GalleryRecord {
            id: image.id.clone(),
            prompt: image.prompt.clone(),
            aspect_ratio: image.aspect_ratio.clone(),
            quality: image.quality.clone(),
            created_at: image.created_at,
            status: image.status,
            file_name,
            mime_type,
        });
    }
    write_json(&mut zip, options, GALLERY_ENTRY, &gallery)?;

    let notes: Vec<NoteRecord> = space
        .notes
        .iter()
        .map(|note| NoteRecord {
            id: note.id.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
        })
        .collect();
    write_json(&mut zip, options, NOTES_ENTRY, &notes)?;

    let mut note_names = EntryNames::default();
    for note in &space.notes {
        let name = note_names.claim_note(&note_file_name(note));
        write_bytes(
            &mut zip,
            options,
            &format!("{NOTES_DIR}/{name}"),
            note.content.as_bytes(),
        )?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        space_id = %space.id,
        threads = space.threads.len(),
        files = space.files.len(),
        images = space.generated_images.len(),
        notes = space.notes.len(),
        size = bytes.len(),
        "Wrote space archive"
    );
    Ok(bytes)
}

fn metadata_record(space: &Space) -> MetadataRecord {
    MetadataRecord {
        id: Some(space.id.clone()),
        title: space.title.clone(),
        description: space.description.clone(),
        last_active: Some(space.last_active),
        is_private: space.is_private,
        instructions: space.instructions.clone(),
        web_search_enabled: space.web_search_enabled,
        version: Some(FORMAT_VERSION.to_string()),
    }
}

fn message_record(message: &gonggan_models::Message) -> MessageRecord {
    let content = match &message.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Image(image) => image.to_data_url(),
    };
    MessageRecord {
        id: message.id.clone(),
        sender: message.sender,
        content_type: message.content_kind(),
        content,
        timestamp: message.timestamp,
        is_streaming: message.is_streaming,
        quoted_context: message.quoted_context.clone(),
    }
}

fn write_json<W, T>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    name: &str,
    value: &T,
) -> Result<()>
where
    W: Write + std::io::Seek,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_vec_pretty(value)?;
    write_bytes(zip, options, name, &json)
}

fn write_bytes<W>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    name: &str,
    bytes: &[u8],
) -> Result<()>
where
    W: Write + std::io::Seek,
{
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(())
}
