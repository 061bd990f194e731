//! GPU uniform buffer types
//!
//! Provides uniform buffer structures that match the WGSL shader definitions.
//! These structures are used to pass data from the CPU to the GPU.

use crate::graphics::settings::{RendererSettings, ShadowMapKind};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame data shared by every pipeline
///
/// This struct matches the `FrameUniform` struct in the WGSL shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    /// Combined view-projection matrix
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of `view_proj`, used to rebuild view rays for the skybox
    pub inv_view_proj: [[f32; 4]; 4],
    /// View-projection of the shadow camera
    pub light_view_proj: [[f32; 4]; 4],
    /// Camera position (w unused)
    pub camera_position: [f32; 4],
    /// Direction the light travels in (w unused)
    pub light_direction: [f32; 4],
    /// Light color times intensity; w is the shadow filter (0 off, 1 basic, 2 PCF)
    pub light_color: [f32; 4],
    /// x: tone mapping code, y: exposure, z: shadow texel size, w: 1 to encode sRGB in the shader
    pub output: [f32; 4],
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0; 4],
            light_direction: [0.0, -1.0, 0.0, 0.0],
            light_color: [0.0; 4],
            output: [0.0, 1.0, 0.0, 0.0],
        }
    }
}

/// Light contribution to a frame
#[derive(Debug, Clone, Copy)]
pub struct FrameLight {
    pub direction: Vec3,
    pub radiance: Vec3,
    pub view_proj: Mat4,
    pub shadow_map_size: u32,
    pub casts_shadow: bool,
}

impl FrameUniform {
    /// Assemble the uniform from camera, light and output settings
    pub fn new(
        view_proj: Mat4,
        camera_position: Vec3,
        light: Option<&FrameLight>,
        settings: &RendererSettings,
        encode_srgb: bool,
    ) -> Self {
        let mut uniform = Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            output: [
                settings.tone_mapping.code() as f32,
                settings.exposure,
                0.0,
                if encode_srgb { 1.0 } else { 0.0 },
            ],
            ..Default::default()
        };

        if let Some(light) = light {
            let filter = match (settings.shadows.enabled && light.casts_shadow, settings.shadows.kind) {
                (false, _) => 0.0,
                (true, ShadowMapKind::Basic) => 1.0,
                (true, ShadowMapKind::PcfSoft) => 2.0,
            };
            let radiance = light.radiance * settings.light_scale();
            uniform.light_view_proj = light.view_proj.to_cols_array_2d();
            uniform.light_direction = light.direction.extend(0.0).to_array();
            uniform.light_color = radiance.extend(filter).to_array();
            uniform.output[2] = 1.0 / light.shadow_map_size.max(1) as f32;
        }
        uniform
    }
}

/// Per-object data
///
/// This struct matches the `ObjectUniform` struct in the WGSL shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    /// Model matrix for world transformation
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix for normals
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    /// Create a new object uniform
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// Light-space transform for the depth-only shadow pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ShadowUniform {
    pub light_view_proj: [[f32; 4]; 4],
}

impl ShadowUniform {
    pub fn new(light_view_proj: Mat4) -> Self {
        Self {
            light_view_proj: light_view_proj.to_cols_array_2d(),
        }
    }
}

impl Default for ShadowUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// Helper trait for creating GPU buffers from uniform types
pub trait UniformBuffer: Pod {
    /// Create a GPU buffer containing this uniform data
    fn create_buffer(&self, device: &wgpu::Device, label: Option<&str>) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;

        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label,
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Update an existing buffer with new data
    fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

impl UniformBuffer for FrameUniform {}
impl UniformBuffer for ObjectUniform {}
impl UniformBuffer for ShadowUniform {}
impl UniformBuffer for crate::graphics::material::MaterialUniform {}
