//! WebGPU render context management
//!
//! Owns the instance, adapter, device and queue, and creates the window
//! surface the renderer presents to.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use winit::window::Window;

/// Errors raised while setting up the GPU
#[derive(Debug, Error)]
pub enum RenderContextError {
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("No suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("Failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Main rendering context for the engine
pub struct RenderContext {
    /// WebGPU instance
    pub instance: wgpu::Instance,
    /// WebGPU device for creating GPU resources
    pub device: Arc<wgpu::Device>,
    /// Command queue for submitting GPU work
    pub queue: Arc<wgpu::Queue>,
    adapter: wgpu::Adapter,
    /// Adapter information for debugging
    pub adapter_info: wgpu::AdapterInfo,
}

impl RenderContext {
    /// Create a context able to present to `window` and the surface for it
    pub async fn new(
        window: Arc<Window>,
    ) -> Result<(Self, wgpu::Surface<'static>), RenderContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let adapter_info = adapter.get_info();
        info!(
            gpu_name = %adapter_info.name,
            backend = ?adapter_info.backend,
            "GPU adapter selected"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: Some("Render Device"),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let context = Self {
            instance,
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
            adapter_info,
        };
        Ok((context, surface))
    }

    /// Surface configuration for a drawable size.
    ///
    /// With `srgb_output` an sRGB format is preferred so the hardware encodes
    /// the output; otherwise a linear format is preferred.
    pub fn surface_configuration(
        &self,
        surface: &wgpu::Surface,
        width: u32,
        height: u32,
        srgb_output: bool,
    ) -> Result<wgpu::SurfaceConfiguration, RenderContextError> {
        let caps = surface.get_capabilities(&self.adapter);
        let first = *caps
            .formats
            .first()
            .ok_or(RenderContextError::UnsupportedSurface)?;
        let format = caps
            .formats
            .iter()
            .find(|format| format.is_srgb() == srgb_output)
            .copied()
            .unwrap_or(first);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    /// Highest sample count up to `requested` that both the color and depth
    /// formats support
    pub fn sample_count(
        &self,
        color: wgpu::TextureFormat,
        depth: wgpu::TextureFormat,
        requested: u32,
    ) -> u32 {
        let color_flags = self.adapter.get_texture_format_features(color).flags;
        let depth_flags = self.adapter.get_texture_format_features(depth).flags;
        let samples = pick_sample_count(requested, |count| {
            color_flags.sample_count_supported(count) && depth_flags.sample_count_supported(count)
        });
        if samples != requested.max(1) {
            info!(requested, samples, "Multisampling reduced to what the adapter supports");
        }
        samples
    }

    /// Create a command encoder for recording GPU commands
    pub fn create_command_encoder(&self, label: Option<&str>) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
    }

    /// Submit command buffers to the GPU queue
    pub fn submit<I: IntoIterator<Item = wgpu::CommandBuffer>>(&self, command_buffers: I) {
        self.queue.submit(command_buffers);
    }
}

/// Largest of 8, 4 or 2 samples not above `requested` that `supported` accepts, else 1
pub fn pick_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    [8, 4, 2]
        .into_iter()
        .filter(|&count| count <= requested)
        .find(|&count| supported(count))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_sample_count() {
        assert_eq!(pick_sample_count(4, |_| true), 4);
        assert_eq!(pick_sample_count(1, |_| true), 1);
        assert_eq!(pick_sample_count(0, |_| true), 1);
        // Counts between levels round down
        assert_eq!(pick_sample_count(6, |_| true), 4);
        assert_eq!(pick_sample_count(8, |count| count <= 2), 2);
        assert_eq!(pick_sample_count(4, |_| false), 1);
    }
}
