//! File-level export and import.
//!
//! Zip work is synchronous, so it runs on the blocking pool.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use gonggan_models::Space;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::archive::{
    ARCHIVE_EXTENSION, ImportedSpace, export_file_name, numbered_name, read_archive,
    write_archive,
};
use crate::error::{ArchiveError, Result};

/// Write `space` into `dir` and return the path of the new archive.
///
/// Existing files are never replaced: a name already present in `dir` gets a
/// ` (n)` suffix.
pub async fn export_space_to_dir(space: &Space, dir: &Path) -> Result<PathBuf> {
    let snapshot = space.clone();
    let bytes = tokio::task::spawn_blocking(move || write_archive(&snapshot)).await??;

    tokio::fs::create_dir_all(dir).await?;
    let name = export_file_name(&space.title, &Local::now());
    let (path, mut file) = create_unique(dir, &name).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;

    info!(space_id = %space.id, path = %path.display(), size = bytes.len(), "Exported space");
    Ok(path)
}

async fn create_unique(dir: &Path, name: &str) -> Result<(PathBuf, File)> {
    let mut n = 0;
    loop {
        let candidate = if n == 0 {
            name.to_string()
        } else {
            numbered_name(name, n)
        };
        let path = dir.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Export name taken");
                n += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read a `.gonggan` file. Other extensions are rejected before any IO.
pub async fn import_space_from_path(path: &Path) -> Result<ImportedSpace> {
    let is_archive = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
    if !is_archive {
        return Err(ArchiveError::InvalidExtension(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    let imported = tokio::task::spawn_blocking(move || read_archive(&bytes)).await??;

    info!(
        space_id = %imported.space.id,
        path = %path.display(),
        warnings = imported.warnings.len(),
        "Imported space"
    );
    Ok(imported)
}
