//! This example shows how to render a map to an image file without creating a window.
//!
//! Run this example with paths to `.geojson` and `.tif` files to plot. The layers are stacked in
//! the order they are given, and the result is written to `output_map.png`.
//!
//! ```shell
//! cargo run --example render_to_file -- ./data/dem.tif ./data/rivers.geojson
//! ```

use std::path::Path;

use anyhow::{anyhow, Result};
use geoview::layer::LayerKind;
use geoview::loader::LayerLoader;
use geoview::source::SourceConfig;
use geoview::{MapBuilder, MapEvent};

const OUTPUT: &str = "output_map.png";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        return Err(anyhow!(
            "This example must be run with at least one argument - path to a .geojson or .tif file"
        ));
    }

    let mut map = MapBuilder::default()
        .with_size(1024, 768)
        .with_messenger(|event: MapEvent| {
            if let MapEvent::StatusMessage(message) = event {
                println!("{message}");
            }
        })
        .build();

    // Files are read on the blocking pool, then registered on this thread in the given order.
    let loader = LayerLoader::current(SourceConfig::default())
        .ok_or_else(|| anyhow!("tokio runtime is not available"))?;
    let handles = paths
        .iter()
        .map(|path| {
            let kind = LayerKind::from_path(Path::new(path))
                .ok_or_else(|| anyhow!("unknown file type: {path}"))?;
            Ok(loader.load(path, kind))
        })
        .collect::<Result<Vec<_>>>()?;

    for handle in handles {
        let name = handle.name().to_string();
        match handle.wait().await {
            Ok(layer) => {
                map.add_loaded_layer(layer)?;
            }
            Err(err) => log::warn!("Layer '{name}' skipped: {err}"),
        }
    }

    map.zoom_to_full_extent();
    log::info!("Layers:\n{}", map.layers().layer_tree());

    map.render()
        .ok_or_else(|| anyhow!("nothing to render: no layer has an extent"))?;
    map.save_image(OUTPUT)?;

    Ok(())
}
