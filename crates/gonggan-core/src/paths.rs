use anyhow::Result;
use std::path::PathBuf;

const GONGGAN_DIR: &str = ".gonggan";
const CONFIG_FILE: &str = "config.toml";
const LOGS_DIR: &str = "logs";
const EXPORTS_DIR: &str = "exports";

/// Environment variable to override the Gonggan directory.
pub const GONGGAN_DIR_ENV: &str = "GONGGAN_DIR";

/// Resolve the Gonggan data directory.
/// Priority: GONGGAN_DIR env var > ~/.gonggan/
pub fn resolve_gonggan_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(GONGGAN_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(GONGGAN_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Gonggan directory exists and return its path.
pub fn ensure_gonggan_dir() -> Result<PathBuf> {
    let dir = resolve_gonggan_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the config file path: ~/.gonggan/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(resolve_gonggan_dir()?.join(CONFIG_FILE))
}

/// Get the logs directory: ~/.gonggan/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = resolve_gonggan_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default export directory: ~/.gonggan/exports/
pub fn default_exports_dir() -> Result<PathBuf> {
    Ok(resolve_gonggan_dir()?.join(EXPORTS_DIR))
}
