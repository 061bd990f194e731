//! Shader management and compilation
//!
//! WGSL has no include mechanism, so the shared frame struct and tone
//! mapping functions are prepended to the passes that need them.

/// Frame uniform declaration and output transforms
pub const COMMON_SHADER: &str = include_str!("common.wgsl");

/// Lit mesh pass
pub const LIT_SHADER: &str = include_str!("lit.wgsl");

/// Environment background pass
pub const SKYBOX_SHADER: &str = include_str!("skybox.wgsl");

/// Depth-only shadow pass
pub const SHADOW_SHADER: &str = include_str!("shadow.wgsl");

/// Lit shader with the common declarations prepended
pub fn lit_source() -> String {
    format!("{COMMON_SHADER}\n{LIT_SHADER}")
}

/// Skybox shader with the common declarations prepended
pub fn skybox_source() -> String {
    format!("{COMMON_SHADER}\n{SKYBOX_SHADER}")
}
