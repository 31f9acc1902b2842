use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use colored::Colorize;
use gonggan_core::services::archive::{export_space, export_space_into, import_space};
use gonggan_core::{GongganConfig, GongganCore};

use crate::cli::{GeneratorArgs, OutputDirArgs};

/// Build the core for a command that may call the generators.
pub fn prepare_core(config: &GongganConfig, generator: &GeneratorArgs) -> Result<GongganCore> {
    if generator.mock {
        return Ok(GongganCore::with_mocks(config.clone()));
    }
    if config.gemini.api_key.is_none() {
        bail!("Gemini API key not found");
    }
    Ok(GongganCore::with_gemini(config.clone()))
}

/// Core for commands that never call a generator.
pub fn offline_core(config: &GongganConfig) -> GongganCore {
    GongganCore::with_mocks(config.clone())
}

/// Import an archive into the core and return the new space id.
pub async fn open_archive(core: &GongganCore, path: &Path) -> Result<String> {
    let report = import_space(core, path).await?;
    for warning in &report.warnings {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
    Ok(report.space_id)
}

pub async fn save_space(
    core: &GongganCore,
    space_id: &str,
    output: &OutputDirArgs,
) -> Result<PathBuf> {
    match &output.out {
        Some(dir) => export_space_into(core, space_id, dir).await,
        None => export_space(core, space_id).await,
    }
}
