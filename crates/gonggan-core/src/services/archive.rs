use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gonggan_storage::{ImportWarning, export_space_to_dir, import_space_from_path};
use tracing::{info, warn};

use crate::GongganCore;

/// What an import added to the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub space_id: String,
    pub title: String,
    pub warnings: Vec<ImportWarning>,
}

/// Export a space into the configured export directory.
pub async fn export_space(core: &GongganCore, space_id: &str) -> Result<PathBuf> {
    let dir = core.config.export_dir()?;
    export_space_into(core, space_id, &dir).await
}

pub async fn export_space_into(core: &GongganCore, space_id: &str, dir: &Path) -> Result<PathBuf> {
    let space = core.store.space(space_id)?;
    let path = export_space_to_dir(&space, dir)
        .await
        .with_context(|| format!("Failed to export space {space_id}"))?;
    Ok(path)
}

/// Import an archive as a new space at the front of the list.
///
/// Nothing is added when the archive cannot be read.
pub async fn import_space(core: &GongganCore, path: &Path) -> Result<ImportReport> {
    let imported = import_space_from_path(path)
        .await
        .with_context(|| format!("Failed to import {}", path.display()))?;

    for warning in &imported.warnings {
        warn!(path = %path.display(), %warning, "Import warning");
    }

    let space = imported.space;
    let report = ImportReport {
        space_id: space.id.clone(),
        title: space.title.clone(),
        warnings: imported.warnings,
    };
    core.store.insert_space(space);
    info!(space_id = %report.space_id, title = %report.title, "Space added from archive");
    Ok(report)
}
