//! Configuration types for the viewer

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors that can occur while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing asset files: {0:?}")]
    MissingAssets(Vec<PathBuf>),
}

/// Where the loaded model is placed in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPlacement {
    pub position: Vec3,
    /// Uniform scale
    pub scale: f32,
    /// Initial rotation around Y, in radians
    pub rotation_y: f32,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -4.0, 0.0),
            scale: 10.0,
            rotation_y: PI * 0.5,
        }
    }
}

/// Configuration for asset paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory for all assets
    pub asset_root: PathBuf,
    /// glTF model, relative to `asset_root`
    pub model: PathBuf,
    /// Cubemap faces ordered +x, -x, +y, -y, +z, -z, relative to `asset_root`
    pub environment_faces: [PathBuf; 6],
    pub placement: ModelPlacement,
}

impl Default for AssetConfig {
    /// Default configuration that matches the bundled asset layout
    fn default() -> Self {
        Self::with_environment(PathBuf::from("static"), 1)
    }
}

impl AssetConfig {
    /// Default model with environment map set `index`
    pub fn with_environment(asset_root: PathBuf, index: u32) -> Self {
        let face =
            |name: &str| PathBuf::from(format!("textures/environmentMaps/{index}/{name}.jpg"));
        Self {
            asset_root,
            model: PathBuf::from("models/FlightHelmet/glTF/FlightHelmet.gltf"),
            environment_faces: [
                face("px"),
                face("nx"),
                face("py"),
                face("ny"),
                face("pz"),
                face("nz"),
            ],
            placement: ModelPlacement::default(),
        }
    }

    /// Full path to the model file
    pub fn model_path(&self) -> PathBuf {
        self.asset_root.join(&self.model)
    }

    /// Full paths to the cubemap faces in face order
    pub fn environment_paths(&self) -> [PathBuf; 6] {
        self.environment_faces
            .clone()
            .map(|face| self.asset_root.join(face))
    }

    /// Check that every referenced asset file exists
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<PathBuf> = std::iter::once(self.model_path())
            .chain(self.environment_paths())
            .filter(|path| !path.exists())
            .collect();

        if missing.is_empty() {
            debug!(asset_root = ?self.asset_root, "Asset config validated");
            Ok(())
        } else {
            Err(ConfigError::MissingAssets(missing))
        }
    }

    /// Load a configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        info!(path = ?path, "Loaded asset config");
        Ok(config)
    }

    /// Save this configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = ?path, "Saved asset config");
        Ok(())
    }
}
