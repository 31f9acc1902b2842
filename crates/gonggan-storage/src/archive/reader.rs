use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::sync::{Arc, LazyLock};

use gonggan_models::{
    ContentKind, FileKind, GeneratedImage, ImageData, Message, MessageContent, Note, Space,
    SpaceFile, Thread, new_id, now,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use super::records::{
    FileRecord, GalleryRecord, MessageRecord, MetadataRecord, NoteRecord, ThreadRecord,
};
use super::{
    FILES_DIR, FILES_MANIFEST_ENTRY, FORMAT_VERSION, GALLERY_ENTRY, IMAGES_DIR,
    LEGACY_MESSAGES_ENTRY, LEGACY_THREAD_ID, LEGACY_THREAD_TITLE, METADATA_ENTRY, NOTES_ENTRY,
    THREADS_ENTRY,
};
use crate::error::{ArchiveError, Result};

static QUOTED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^\[인용된 컨텍스트\]:\n"(.*?)"\n\n\[사용자 질문\]:\n(.*)$"#)
        .expect("valid quoted context regex")
});

/// Non-fatal problem found while importing; the affected entity is kept
/// without its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    MissingFilePayload { file_id: String, entry: String },
    MissingGalleryImage { image_id: String, entry: String },
    UnreadableMessageImage { message_id: String },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::MissingFilePayload { file_id, entry } => {
                write!(f, "file {file_id}: entry {entry} is missing")
            }
            ImportWarning::MissingGalleryImage { image_id, entry } => {
                write!(f, "image {image_id}: entry {entry} is missing")
            }
            ImportWarning::UnreadableMessageImage { message_id } => {
                write!(f, "message {message_id}: image content is not a data URL")
            }
        }
    }
}

/// A reconstructed space plus whatever was degraded on the way in.
#[derive(Debug, Clone)]
pub struct ImportedSpace {
    pub space: Space,
    pub warnings: Vec<ImportWarning>,
}

/// Parse `.gonggan` bytes into a fresh space.
///
/// The space gets a new id; every nested id, title and timestamp is kept.
pub fn read_archive(bytes: &[u8]) -> Result<ImportedSpace> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let mut warnings = Vec::new();

    let metadata: MetadataRecord =
        read_json(&mut zip, METADATA_ENTRY)?.ok_or(ArchiveError::MissingMetadata)?;
    check_version(metadata.version.as_deref());

    let threads = match read_json::<_, Vec<ThreadRecord>>(&mut zip, THREADS_ENTRY)? {
        Some(records) => records
            .into_iter()
            .map(|record| thread_from_record(record, &mut warnings))
            .collect(),
        None => match read_json::<_, Vec<MessageRecord>>(&mut zip, LEGACY_MESSAGES_ENTRY)? {
            Some(records) => vec![legacy_thread(records, &mut warnings)],
            None => Vec::new(),
        },
    };

    let manifest: Vec<FileRecord> =
        read_json(&mut zip, FILES_MANIFEST_ENTRY)?.unwrap_or_default();
    let mut files = Vec::with_capacity(manifest.len());
    for record in manifest {
        files.push(Arc::new(file_from_record(&mut zip, record, &mut warnings)?));
    }

    let gallery: Vec<GalleryRecord> = read_json(&mut zip, GALLERY_ENTRY)?.unwrap_or_default();
    let mut generated_images = Vec::with_capacity(gallery.len());
    for record in gallery {
        generated_images.push(Arc::new(image_from_record(
            &mut zip,
            record,
            &mut warnings,
        )?));
    }

    let notes: Vec<NoteRecord> = read_json(&mut zip, NOTES_ENTRY)?.unwrap_or_default();
    let notes = notes
        .into_iter()
        .map(|record| {
            Arc::new(Note {
                id: record.id,
                content: record.content,
                created_at: record.created_at,
            })
        })
        .collect();

    let space = Space {
        id: new_id(),
        title: metadata.title,
        description: metadata.description,
        last_active: metadata.last_active.unwrap_or_else(now),
        is_private: metadata.is_private,
        instructions: metadata.instructions,
        web_search_enabled: metadata.web_search_enabled,
        files,
        threads,
        generated_images,
        notes,
    };

    for warning in &warnings {
        warn!(space_id = %space.id, %warning, "Degraded archive entry");
    }
    debug!(
        space_id = %space.id,
        threads = space.threads.len(),
        files = space.files.len(),
        images = space.generated_images.len(),
        notes = space.notes.len(),
        "Read space archive"
    );

    Ok(ImportedSpace { space, warnings })
}

fn check_version(version: Option<&str>) {
    let Some(version) = version else {
        return;
    };
    match (parse_version(version), parse_version(FORMAT_VERSION)) {
        (Some(found), Some(current)) if found > current => {
            warn!(version, "Archive was written by a newer format; reading best-effort");
        }
        (None, _) => warn!(version, "Unrecognized archive format version"),
        _ => {}
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.').unwrap_or((version, "0"));
    Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
}

fn read_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    match zip.by_name(name) {
        Ok(mut entry) => {
            // The declared size is untrusted; let the buffer grow with the data.
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_json<R, T>(zip: &mut ZipArchive<R>, name: &str) -> Result<Option<T>>
where
    R: Read + Seek,
    T: DeserializeOwned,
{
    let Some(bytes) = read_entry(zip, name)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ArchiveError::MalformedEntry {
            entry: name.to_string(),
            source,
        })
}

fn thread_from_record(record: ThreadRecord, warnings: &mut Vec<ImportWarning>) -> Arc<Thread> {
    Arc::new(Thread {
        id: record.id,
        title: record.title,
        last_message_at: record.last_message_at,
        messages: record
            .messages
            .into_iter()
            .map(|m| message_from_record(m, warnings))
            .collect(),
    })
}

fn legacy_thread(records: Vec<MessageRecord>, warnings: &mut Vec<ImportWarning>) -> Arc<Thread> {
    let last_message_at = records
        .last()
        .map(|m| m.timestamp)
        .unwrap_or_else(now);
    debug!(messages = records.len(), "Migrating legacy message list");
    Arc::new(Thread {
        id: LEGACY_THREAD_ID.to_string(),
        title: LEGACY_THREAD_TITLE.to_string(),
        last_message_at,
        messages: records
            .into_iter()
            .map(|m| message_from_record(m, warnings))
            .collect(),
    })
}

fn message_from_record(record: MessageRecord, warnings: &mut Vec<ImportWarning>) -> Arc<Message> {
    let (content, quoted_context) = match record.content_type {
        ContentKind::Image => match ImageData::from_data_url(&record.content) {
            Ok(image) => (MessageContent::Image(image), record.quoted_context),
            Err(_) => {
                warnings.push(ImportWarning::UnreadableMessageImage {
                    message_id: record.id.clone(),
                });
                (MessageContent::Text(record.content), record.quoted_context)
            }
        },
        ContentKind::Text => match record.quoted_context {
            Some(context) => (MessageContent::Text(record.content), Some(context)),
            None => {
                let (context, text) = split_quoted_text(record.content);
                (MessageContent::Text(text), context)
            }
        },
    };

    Arc::new(Message {
        id: record.id,
        sender: record.sender,
        content,
        quoted_context,
        timestamp: record.timestamp,
        is_streaming: false,
    })
}

/// Split text written in the older inline quote layout into its parts.
fn split_quoted_text(text: String) -> (Option<String>, String) {
    match QUOTED_TEXT.captures(&text) {
        Some(caps) => (Some(caps[1].to_string()), caps[2].to_string()),
        None => (None, text),
    }
}

fn file_from_record<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    record: FileRecord,
    warnings: &mut Vec<ImportWarning>,
) -> Result<SpaceFile> {
    let id = record.id.clone().unwrap_or_else(new_id);
    let mut data = None;
    if record.has_content && record.kind != FileKind::Link {
        let entry = format!("{FILES_DIR}/{}", record.entry());
        data = read_entry(zip, &entry)?;
        if data.is_none() {
            warnings.push(ImportWarning::MissingFilePayload {
                file_id: id.clone(),
                entry,
            });
        }
    }

    Ok(SpaceFile {
        id,
        name: record.name,
        kind: record.kind,
        size: record.size,
        added_at: record.added_at,
        mime_type: record.mime_type,
        data,
        url: record.url,
    })
}

fn image_from_record<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    record: GalleryRecord,
    warnings: &mut Vec<ImportWarning>,
) -> Result<GeneratedImage> {
    let mut image = None;
    if let Some(file_name) = &record.file_name {
        let entry = format!("{IMAGES_DIR}/{file_name}");
        match read_entry(zip, &entry)? {
            Some(bytes) => {
                image = Some(match record.mime_type.as_deref() {
                    Some(mime_type) => ImageData::new(mime_type, bytes),
                    None => ImageData::png(bytes),
                })
            }
            None => warnings.push(ImportWarning::MissingGalleryImage {
                image_id: record.id.clone(),
                entry,
            }),
        }
    }

    Ok(GeneratedImage {
        id: record.id,
        image,
        prompt: record.prompt,
        aspect_ratio: record.aspect_ratio,
        quality: record.quality,
        created_at: record.created_at,
        status: record.status,
    })
}
