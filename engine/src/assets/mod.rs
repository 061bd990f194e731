//! Background asset loading
//!
//! Loads run on their own thread and report back through a [`LoadHandle`]
//! that the event loop polls. The continuation (attaching the subtree,
//! uploading textures) always runs on the thread that owns the scene.

pub mod cubemap;
pub mod gltf_loader;

pub use cubemap::{load_cubemap, CubemapImage};
pub use gltf_loader::load_gltf;

use crate::core::entity::Subtree;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, error, info};

/// Errors that can occur while loading assets
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load glTF file {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("Failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Missing position data in mesh {0}")]
    MissingPositions(String),

    #[error("glTF file {0:?} contains no scene")]
    EmptyDocument(PathBuf),

    #[error("Cubemap face {path:?} is {width}x{height}; expected {expected}x{expected}")]
    FaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("Loader thread for {0} stopped without a result")]
    Disconnected(String),
}

/// Receiving end of a background load
///
/// [`LoadHandle::poll`] yields the result exactly once; afterwards it
/// returns `None` forever.
pub struct LoadHandle<T> {
    name: String,
    receiver: Receiver<Result<T, AssetError>>,
    finished: bool,
}

impl<T> LoadHandle<T> {
    /// Human-readable name of the asset being loaded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the result has already been taken
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Take the result if the load has completed
    pub fn poll(&mut self) -> Option<Result<T, AssetError>> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.finished = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Err(AssetError::Disconnected(self.name.clone())))
            }
        }
    }

    /// Block until the load completes
    pub fn wait(mut self) -> Result<T, AssetError> {
        if self.finished {
            return Err(AssetError::Disconnected(self.name));
        }
        self.finished = true;
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(AssetError::Disconnected(self.name.clone())))
    }
}

/// Spawns load jobs on background threads
#[derive(Debug, Default, Clone, Copy)]
pub struct AssetLoader;

impl AssetLoader {
    pub fn new() -> Self {
        Self
    }

    /// Run `job` on a new thread and return a handle for its result
    pub fn spawn<T, F>(&self, name: impl Into<String>, job: F) -> LoadHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AssetError> + Send + 'static,
    {
        let name = name.into();
        let (sender, receiver) = mpsc::channel();
        let thread_name = name.clone();

        let spawned = thread::Builder::new()
            .name(format!("load {thread_name}"))
            .spawn(move || {
                let result = job();
                match &result {
                    Ok(_) => info!(asset = %thread_name, "Asset loaded"),
                    Err(e) => error!(asset = %thread_name, error = %e, "Asset failed to load"),
                }
                // The handle may have been dropped; nothing to report to then
                let _ = sender.send(result);
            });

        if let Err(e) = spawned {
            error!(asset = %name, error = %e, "Failed to spawn loader thread");
        } else {
            debug!(asset = %name, "Started background load");
        }

        LoadHandle {
            name,
            receiver,
            finished: false,
        }
    }

    /// Load a glTF model into a detached subtree
    pub fn load_model(&self, path: PathBuf) -> LoadHandle<Subtree> {
        let name = path.display().to_string();
        self.spawn(name, move || load_gltf(&path))
    }

    /// Load six cubemap faces ordered +x, -x, +y, -y, +z, -z
    pub fn load_environment(&self, faces: [PathBuf; 6]) -> LoadHandle<CubemapImage> {
        let name = faces[0]
            .parent()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "environment map".to_string());
        self.spawn(name, move || load_cubemap(&faces))
    }
}
