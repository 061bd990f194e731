//! Environment-map scene viewer engine
//!
//! This crate provides the scene graph, the material synchronizer, the
//! render loop and the debug parameter bindings of the viewer, together with
//! the wgpu renderer and the asset loaders they drive.

pub mod app;
pub mod assets;
pub mod config;
pub mod context;
pub mod core;
pub mod graphics;
pub mod input;
pub mod params;
pub mod render_loop;
pub mod shaders;
pub mod viewport;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        update_hierarchy_system, Entity, GlobalTransform, Name, Parent, SceneNode, Subtree,
        Transform, World,
    };

    // Camera, controls and light types
    pub use crate::core::camera::Camera;
    pub use crate::core::controls::OrbitControls;
    pub use crate::core::light::DirectionalLight;

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

    // Graphics types
    pub use crate::graphics::{
        synchronize_materials, Material, MaterialRef, Mesh, MeshId, RenderContext, Renderer,
        RendererSettings, StandardMaterial, SyncReport, ToneMapping, Vertex,
    };

    // Config types
    pub use crate::config::{AssetConfig, ModelPlacement};

    // Scene and parameter types
    pub use crate::context::{AssetStatus, EditOutcome, SceneContext};
    pub use crate::params::{Axis, Binding, ControlId, ControlSpec, DebugParameters, ParameterEdit};

    // Loop types
    pub use crate::render_loop::{FrameError, FrameRenderer, RenderLoop};
    pub use crate::viewport::Viewport;

    // App types
    pub use crate::app::{EngineApp, EngineBuilder, EngineConfig, Overlay};

    // Input types
    pub use crate::input::InputState;

    pub use wgpu;
    pub use winit;
}

const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn";

/// Initialize logging for the engine
///
/// Reads `RUST_LOG`, falling back to a filter that keeps wgpu quiet.
pub fn init_logging() {
    init_logging_with(None);
}

/// Initialize logging with an explicit filter that takes precedence over `RUST_LOG`.
///
/// Later calls are ignored once a subscriber is installed.
pub fn init_logging_with(filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
