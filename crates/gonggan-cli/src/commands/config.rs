use anyhow::{Context, Result};
use gonggan_core::{GongganConfig, paths};
use serde_json::json;

use crate::cli::ConfigCommands;
use crate::output::OutputFormat;
use crate::output::json::print_json;

pub fn run(config: &GongganConfig, command: ConfigCommands, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommands::Show => show(config, format),
        ConfigCommands::Init => init(format),
    }
}

fn show(config: &GongganConfig, format: OutputFormat) -> Result<()> {
    let mut visible = config.clone();
    visible.gemini.api_key = visible.gemini.api_key.as_deref().map(mask_key);
    let path = paths::config_path()?;

    if format.is_json() {
        return print_json(&json!({ "path": path, "config": visible }));
    }

    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(&visible).context("Failed to render config")?
    );
    Ok(())
}

fn init(format: OutputFormat) -> Result<()> {
    let path = paths::config_path()?;
    let created = !path.exists();
    if created {
        GongganConfig::default().save_to_path(&path)?;
    }

    if format.is_json() {
        return print_json(&json!({ "path": path, "created": created }));
    }

    if created {
        println!("Config written: {}", path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}
