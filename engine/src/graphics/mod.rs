//! Graphics module
//!
//! GPU context, materials, meshes, pipelines and the renderer, plus the
//! CPU-side renderer settings and material synchronization.

pub mod context;
pub mod environment;
pub mod material;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod settings;
pub mod sync;
pub mod tone_mapping;
pub mod uniform;

// Re-export commonly used types
pub use context::{RenderContext, RenderContextError};
pub use environment::EnvironmentMap;
pub use material::{
    BasicMaterial, Material, MaterialHandle, MaterialLibrary, MaterialRef, MaterialUniform,
    StandardMaterial,
};
pub use mesh::{Mesh, Vertex};
pub use renderer::{MeshId, Renderer};
pub use settings::{RendererSettings, ShadowMapKind, ShadowMapSettings};
pub use sync::{synchronize_materials, SyncReport};
pub use tone_mapping::{ToneMapping, ToneMappingError};
pub use uniform::{FrameUniform, ObjectUniform, ShadowUniform, UniformBuffer};
