use anyhow::Result;
use gonggan_core::GongganConfig;
use serde_json::json;

use crate::cli::RepackArgs;
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::setup::{offline_core, open_archive, save_space};

pub async fn run(config: &GongganConfig, args: RepackArgs, format: OutputFormat) -> Result<()> {
    let core = offline_core(config);
    let space_id = open_archive(&core, &args.archive).await?;
    let path = save_space(&core, &space_id, &args.output).await?;

    if format.is_json() {
        return print_json(&json!({ "path": path }));
    }

    println!("Archive written: {}", path.display());
    Ok(())
}
