//! Cubemap texture used for the background and for environment lighting

use crate::assets::CubemapImage;
use tracing::info;
use wgpu::util::DeviceExt;

/// GPU cubemap with its sampler
pub struct EnvironmentMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: u32,
    pub mip_levels: u32,
}

impl EnvironmentMap {
    /// Upload six decoded faces with a full mip chain
    ///
    /// Rough surfaces read the blurrier levels for their reflections.
    pub fn from_cubemap(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cubemap: &CubemapImage,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Environment Cubemap"),
                size: wgpu::Extent3d {
                    width: cubemap.size,
                    height: cubemap.size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: cubemap.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                // Faces are authored in sRGB
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &cubemap.layer_major_bytes(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Environment Cubemap View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mip_levels = cubemap.mip_level_count();
        info!(size = cubemap.size, mip_levels, "Uploaded environment cubemap");
        Self {
            texture,
            view,
            sampler,
            size: cubemap.size,
            mip_levels,
        }
    }

    /// Neutral grey environment shown until the real one has loaded
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_cubemap(device, queue, &CubemapImage::solid([128, 128, 128, 255]))
    }
}
