//! Environment-map viewer entry point

use engine::prelude::*;
use tracing::{error, info, warn};

/// Environment variable naming a JSON asset configuration
const CONFIG_ENV: &str = "VIEWER_CONFIG";

fn asset_config() -> AssetConfig {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return AssetConfig::default();
    };
    match AssetConfig::load_from_file(&path) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path, error = %err, "Falling back to default asset configuration");
            AssetConfig::default()
        }
    }
}

fn main() {
    engine::init_logging();
    info!("Starting environment map viewer");

    let builder = EngineBuilder::new()
        .title("Environment Map Viewer")
        .window_size(1280, 720)
        .asset_config(asset_config());

    #[cfg(feature = "panel")]
    let builder = builder.overlay(panel::DebugPanel::default());

    if let Err(err) = builder.build().run() {
        error!(error = %err, "Event loop terminated with an error");
        std::process::exit(1);
    }
}
