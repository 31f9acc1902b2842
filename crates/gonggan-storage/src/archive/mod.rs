//! `.gonggan` container writer and reader.

mod naming;
mod reader;
mod records;
mod writer;

pub(crate) use naming::numbered_name;
pub use naming::{export_file_name, note_file_name, note_slug, sanitize_title};
pub use reader::{ImportWarning, ImportedSpace, read_archive};
pub use records::{
    FileRecord, GalleryRecord, MessageRecord, MetadataRecord, NoteRecord, ThreadRecord,
};
pub use writer::write_archive;

/// Format version written into `metadata.json`.
pub const FORMAT_VERSION: &str = "2.3";

/// File extension of exported archives, without the dot.
pub const ARCHIVE_EXTENSION: &str = "gonggan";

pub(crate) const METADATA_ENTRY: &str = "metadata.json";
pub(crate) const THREADS_ENTRY: &str = "threads.json";
pub(crate) const LEGACY_MESSAGES_ENTRY: &str = "messages.json";
pub(crate) const FILES_MANIFEST_ENTRY: &str = "files_manifest.json";
pub(crate) const GALLERY_ENTRY: &str = "gallery.json";
pub(crate) const NOTES_ENTRY: &str = "notes.json";
pub(crate) const FILES_DIR: &str = "files";
pub(crate) const IMAGES_DIR: &str = "images";
pub(crate) const NOTES_DIR: &str = "notes";

pub(crate) const LEGACY_THREAD_ID: &str = "legacy-thread";
pub(crate) const LEGACY_THREAD_TITLE: &str = "이전 대화";

#[cfg(test)]
mod tests;
