//! Gonggan Storage - portable space archives
//!
//! A space is persisted as one `.gonggan` file: a zip container holding JSON
//! records for the space, its threads, files, gallery and notes, plus the raw
//! bytes of every file and generated image.
//!
//! # Entries
//!
//! - `metadata.json` - scalar space attributes and the format version
//! - `threads.json` - threads with their ordered messages
//! - `files_manifest.json` + `files/<name>` - context files
//! - `gallery.json` + `images/<file>` - generated images
//! - `notes.json` + `notes/<slug>_<id>.txt` - notes (the text files are cosmetic)
//!
//! Archives from before threads existed carry a single `messages.json`; the
//! reader migrates them into one thread.

pub mod archive;
pub mod error;
mod io;
pub mod time_utils;

pub use archive::{
    ARCHIVE_EXTENSION, FORMAT_VERSION, ImportWarning, ImportedSpace, read_archive, write_archive,
};
pub use error::{ArchiveError, Result};
pub use io::{export_space_to_dir, import_space_from_path};
