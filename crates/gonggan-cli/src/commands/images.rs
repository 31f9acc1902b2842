use anyhow::{Result, anyhow};
use comfy_table::{Cell, Table};
use gonggan_core::{GongganConfig, ImageBatchRequest};
use serde_json::json;

use crate::cli::ImagesArgs;
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::output::table::print_table;
use crate::setup::{open_archive, prepare_core, save_space};

pub async fn run(config: &GongganConfig, args: ImagesArgs, format: OutputFormat) -> Result<()> {
    let core = prepare_core(config, &args.generator)?;
    let space_id = open_archive(&core, &args.archive).await?;

    let mut references = Vec::with_capacity(args.references.len());
    for image_id in &args.references {
        let image = core
            .studio
            .reference_from_gallery(&space_id, image_id)?
            .ok_or_else(|| anyhow!("Image {} has no picture to reference", image_id))?;
        references.push(image);
    }

    let mut request = ImageBatchRequest::new(args.prompt, args.count)
        .with_aspect_ratio(args.ratio)
        .with_quality(args.quality)
        .with_references(references);
    request.model = args.generator.model;

    let items = core.studio.generate_batch(&space_id, request).await?;
    let path = save_space(&core, &space_id, &args.output).await?;

    if format.is_json() {
        let images: Vec<_> = items
            .iter()
            .map(|i| json!({ "id": i.image_id, "status": i.status.as_str() }))
            .collect();
        return print_json(&json!({ "images": images, "path": path }));
    }

    let mut table = Table::new();
    table.set_header(vec!["Image", "Status"]);
    for item in &items {
        table.add_row(vec![Cell::new(&item.image_id), Cell::new(item.status.as_str())]);
    }
    print_table(table)?;
    println!("Saved: {}", path.display());
    Ok(())
}
