//! Debug panel overlay
//!
//! Owns the imgui context, the winit platform glue and the imgui wgpu
//! renderer. The panel window starts collapsed and, once expanded, lists the
//! controls currently bound by the scene.

use crate::controls;
use engine::app::Overlay;
use engine::context::SceneContext;
use engine::graphics::RenderContext;
use engine::params::ParameterEdit;
use engine::viewport::Viewport;
use imgui::Condition;
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use tracing::{debug, error, info};
use winit::event::{Event, WindowEvent};
use winit::window::Window;

struct ImguiHost {
    context: imgui::Context,
    platform: WinitPlatform,
    renderer: Renderer,
}

/// ImGui panel exposing the scene parameters
pub struct DebugPanel {
    title: String,
    host: Option<ImguiHost>,
    frame_open: bool,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self::new("Debug")
    }
}

impl DebugPanel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            host: None,
            frame_open: false,
        }
    }

    /// Whether the GPU side has been set up
    pub fn is_attached(&self) -> bool {
        self.host.is_some()
    }
}

impl Overlay for DebugPanel {
    fn attach(&mut self, window: &Window, context: &RenderContext, format: wgpu::TextureFormat) {
        info!("Initializing debug panel with ImGui");

        let mut imgui_context = imgui::Context::create();
        imgui_context.set_ini_filename(None);

        let style = imgui_context.style_mut();
        style.window_rounding = 0.0;
        style.scrollbar_rounding = 0.0;

        let mut platform = WinitPlatform::new(&mut imgui_context);
        platform.attach_window(imgui_context.io_mut(), window, HiDpiMode::Default);

        let renderer_config = RendererConfig {
            texture_format: format,
            ..Default::default()
        };
        let renderer = Renderer::new(
            &mut imgui_context,
            &context.device,
            &context.queue,
            renderer_config,
        );

        self.host = Some(ImguiHost {
            context: imgui_context,
            platform,
            renderer,
        });
    }

    fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let Some(host) = &mut self.host else {
            return false;
        };

        let wrapped: Event<()> = Event::WindowEvent {
            window_id: window.id(),
            event: event.clone(),
        };
        host.platform
            .handle_event(host.context.io_mut(), window, &wrapped);

        let io = host.context.io();
        match event {
            WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::CursorMoved { .. } => io.want_capture_mouse,
            _ => false,
        }
    }

    fn prepare(
        &mut self,
        window: &Window,
        scene: &SceneContext,
        viewport: &Viewport,
    ) -> Vec<ParameterEdit> {
        let Some(host) = &mut self.host else {
            return Vec::new();
        };

        // A frame that never reached the GPU (lost surface) is discarded
        if self.frame_open {
            let _ = host.context.render();
            self.frame_open = false;
        }

        if let Err(err) = host.platform.prepare_frame(host.context.io_mut(), window) {
            error!(error = ?err, "ImGui prepare_frame failed");
            return Vec::new();
        }

        // The drawable surface may be smaller than the window when the pixel
        // ratio is clamped
        let (logical_width, logical_height) = viewport.logical_size();
        let scale = viewport.pixel_ratio() as f32;
        let io = host.context.io_mut();
        io.display_size = [logical_width as f32, logical_height as f32];
        io.display_framebuffer_scale = [scale, scale];

        let ui = host.context.new_frame();
        let mut edits = Vec::new();
        ui.window(&self.title)
            .collapsed(true, Condition::FirstUseEver)
            .position([10.0, 10.0], Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                ui.text(controls::status_line(scene));
                ui.separator();
                edits = controls::draw_bindings(ui, scene);
            });
        host.platform.prepare_render(ui, window);
        self.frame_open = true;

        if !edits.is_empty() {
            debug!(count = edits.len(), "Debug panel produced edits");
        }
        edits
    }

    fn draw(
        &mut self,
        context: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let Some(host) = &mut self.host else {
            return;
        };
        if !self.frame_open {
            return;
        }
        self.frame_open = false;

        let draw_data = host.context.render();
        if draw_data.total_vtx_count == 0 {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ImGui Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(err) =
            host.renderer
                .render(draw_data, &context.queue, &context.device, &mut pass)
        {
            error!(error = ?err, "ImGui render failed");
        }
    }
}
