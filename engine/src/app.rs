//! Application management for the viewer
//!
//! [`EngineApp`] is the winit application handler. It creates the window and
//! the GPU context on the first resume, requests the model and environment
//! loads, and on every redraw feeds pointer input to the orbit controls,
//! applies debug panel edits and ticks the render loop.

use crate::assets::{AssetLoader, CubemapImage, LoadHandle};
use crate::config::AssetConfig;
use crate::context::{AssetStatus, SceneContext, CAMERA_START};
use crate::core::controls::OrbitControls;
use crate::core::entity::{Subtree, World};
use crate::graphics::{RenderContext, RenderContextError, Renderer, RendererSettings};
use crate::input::InputState;
use crate::params::{DebugParameters, ParameterEdit};
use crate::render_loop::{FrameError, FrameRenderer, RenderLoop};
use crate::viewport::Viewport;
use glam::Vec3;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    error::{EventLoopError, OsError},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

/// Errors that stop the application from starting
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to create window: {0}")]
    Window(#[from] OsError),

    #[error(transparent)]
    Render(#[from] RenderContextError),
}

/// Configuration for engine initialization
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window title
    pub window_title: String,
    /// Window size (None = use primary monitor size)
    pub window_size: Option<(u32, u32)>,
    /// Asset configuration
    pub asset_config: AssetConfig,
    /// Custom logging filter (None = default)
    pub log_filter: Option<String>,
    /// Initial renderer settings
    pub renderer: RendererSettings,
    /// Initial debug parameters
    pub params: DebugParameters,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_title: "Environment Map Viewer".to_string(),
            window_size: None,
            asset_config: AssetConfig::default(),
            log_filter: None,
            renderer: RendererSettings::default(),
            params: DebugParameters::default(),
        }
    }
}

/// A UI layer drawn on top of the scene that can edit its parameters
pub trait Overlay {
    /// Set up GPU resources once the window and device exist
    fn attach(&mut self, window: &Window, context: &RenderContext, format: wgpu::TextureFormat);

    /// Offer a window event; returns true when the overlay captured it
    fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool;

    /// Build this frame's UI and return the edits made through it
    fn prepare(
        &mut self,
        window: &Window,
        scene: &SceneContext,
        viewport: &Viewport,
    ) -> Vec<ParameterEdit>;

    /// Record the UI draw commands on top of the rendered frame
    fn draw(
        &mut self,
        context: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    );
}

/// Renderer wrapper drawing an overlay into the same frame
struct OverlayFrame<'a> {
    renderer: &'a mut Renderer,
    overlay: &'a mut Box<dyn Overlay>,
}

impl FrameRenderer for OverlayFrame<'_> {
    fn render_frame(
        &mut self,
        world: &mut World,
        settings: &RendererSettings,
    ) -> Result<(), FrameError> {
        let overlay = &mut *self.overlay;
        self.renderer
            .render_frame_with(world, settings, |context, encoder, view| {
                overlay.draw(context, encoder, view)
            })
    }
}

/// Main engine application struct that implements ApplicationHandler
pub struct EngineApp {
    config: EngineConfig,
    scene: SceneContext,
    controls: OrbitControls,
    render_loop: RenderLoop,
    input: InputState,
    viewport: Viewport,
    loader: AssetLoader,
    pending_model: Option<LoadHandle<Subtree>>,
    pending_environment: Option<LoadHandle<CubemapImage>>,
    overlay: Option<Box<dyn Overlay>>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
}

impl EngineApp {
    /// Create a new engine app with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new engine app with custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        crate::init_logging_with(config.log_filter.as_deref());
        info!(title = %config.window_title, "Creating EngineApp");

        let scene = SceneContext::new(config.params, config.renderer);
        Self {
            config,
            scene,
            controls: OrbitControls::new(CAMERA_START, Vec3::ZERO),
            render_loop: RenderLoop::new(),
            input: InputState::new(),
            viewport: Viewport::default(),
            loader: AssetLoader::new(),
            pending_model: None,
            pending_environment: None,
            overlay: None,
            window: None,
            renderer: None,
        }
    }

    /// Install the overlay drawn over the scene
    pub fn set_overlay(&mut self, overlay: Box<dyn Overlay>) {
        self.overlay = Some(overlay);
    }

    /// Check if the engine is initialized
    pub fn is_initialized(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    /// Create the event loop and run until the window closes
    pub fn run(mut self) -> Result<(), EventLoopError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)
    }

    /// Create the window, GPU context and renderer, then request the assets
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        info!("Initializing EngineApp");

        let (width, height) = self.config.window_size.unwrap_or_else(|| {
            event_loop
                .primary_monitor()
                .map(|monitor| {
                    let size = monitor.size();
                    info!(
                        width = size.width,
                        height = size.height,
                        "Using primary monitor resolution"
                    );
                    (size.width, size.height)
                })
                .unwrap_or_else(|| {
                    info!("No primary monitor found, using default size 1280x720");
                    (1280, 720)
                })
        });

        let window_attributes = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let size = window.inner_size();
        self.viewport
            .resize_physical(size.width, size.height, window.scale_factor());
        let (drawable_width, drawable_height) = self.viewport.drawable_size();

        let (context, surface) = pollster::block_on(RenderContext::new(window.clone()))?;
        let context = Arc::new(context);
        let renderer = Renderer::new(
            context.clone(),
            surface,
            drawable_width,
            drawable_height,
            self.scene.settings(),
        )?;

        if let Some(overlay) = &mut self.overlay {
            overlay.attach(&window, &context, renderer.surface_format());
        }
        self.scene.fit_camera(&self.viewport.current());

        self.request_assets();
        window.request_redraw();

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn request_assets(&mut self) {
        let assets = &self.config.asset_config;
        if let Err(err) = assets.validate() {
            warn!(error = %err, "Asset configuration is incomplete");
        }

        self.pending_model = Some(self.loader.load_model(assets.model_path()));
        self.pending_environment = Some(self.loader.load_environment(assets.environment_paths()));
    }

    fn poll_assets(&mut self) {
        if let Some(result) = self.pending_model.as_mut().and_then(LoadHandle::poll) {
            self.pending_model = None;
            match result {
                Ok(subtree) => self.on_model_loaded(subtree),
                Err(err) => {
                    error!(error = %err, "Model failed to load");
                    self.scene.model_status = AssetStatus::Failed(err.to_string());
                }
            }
        }

        if let Some(result) = self.pending_environment.as_mut().and_then(LoadHandle::poll) {
            self.pending_environment = None;
            match result {
                Ok(cubemap) => self.on_environment_loaded(&cubemap),
                Err(err) => {
                    error!(error = %err, "Environment map failed to load");
                    self.scene.environment_status = AssetStatus::Failed(err.to_string());
                }
            }
        }
    }

    fn on_model_loaded(&mut self, subtree: Subtree) {
        if let Some(renderer) = &mut self.renderer {
            for (id, mesh) in &subtree.meshes {
                renderer.upload_mesh(id, mesh);
            }
        }
        let placement = self.config.asset_config.placement;
        self.scene.attach_model(subtree, &placement);
    }

    fn on_environment_loaded(&mut self, cubemap: &CubemapImage) {
        if let Some(renderer) = &mut self.renderer {
            renderer.set_environment(cubemap);
        }
        self.scene.environment_status = AssetStatus::Loaded;
        let report = self.scene.synchronize();
        info!(
            face_size = cubemap.size,
            updated_materials = report.updated_materials,
            "Environment map loaded"
        );
    }

    fn handle_resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        let Some(outcome) = self.viewport.resize_physical(width, height, scale_factor) else {
            return;
        };
        self.scene.fit_camera(&outcome);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(outcome.drawable_width, outcome.drawable_height);
        }
    }

    fn apply_edits(&mut self, edits: Vec<ParameterEdit>) {
        for edit in edits {
            match self.scene.apply_edit(edit) {
                Ok(outcome) => debug!(edit = ?edit, outcome = ?outcome, "Applied panel edit"),
                Err(err) => warn!(edit = ?edit, error = %err, "Panel edit rejected"),
            }
        }
    }

    /// Render a frame
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let (_, drawable_height) = self.viewport.drawable_size();
        self.controls
            .handle_input(&self.input, drawable_height as f32);
        self.input.clear_frame_data();

        let edits = match &mut self.overlay {
            Some(overlay) => overlay.prepare(&window, &self.scene, &self.viewport),
            None => Vec::new(),
        };
        self.apply_edits(edits);

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let result = match &mut self.overlay {
            Some(overlay) => {
                let mut frame = OverlayFrame {
                    renderer: &mut *renderer,
                    overlay,
                };
                self.render_loop
                    .tick(&mut self.controls, &mut frame, &mut self.scene)
            }
            None => self
                .render_loop
                .tick(&mut self.controls, &mut *renderer, &mut self.scene),
        };

        match result {
            Ok(()) => {}
            Err(FrameError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                info!("Surface lost or outdated, reconfiguring");
                renderer.reconfigure();
            }
            Err(FrameError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(err) => {
                error!(error = %err, "Render error");
            }
        }
    }
}

impl ApplicationHandler for EngineApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.is_initialized() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            error!(error = %err, "Failed to initialize viewer");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        let captured = self
            .overlay
            .as_mut()
            .is_some_and(|overlay| overlay.handle_event(&window, &event));

        match event {
            WindowEvent::CloseRequested => {
                info!("Main window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.handle_resize(
                    physical_size.width,
                    physical_size.height,
                    window.scale_factor(),
                );
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                info!(scale_factor, "Scale factor changed");
                let size = window.inner_size();
                self.handle_resize(size.width, size.height, scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .set_mouse_position(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),
            WindowEvent::MouseInput { button, state, .. } => {
                // Releases always get through so a drag never sticks
                if !captured || !state.is_pressed() {
                    self.input.handle_mouse_button(button, state);
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !captured => {
                self.input.handle_scroll(delta);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.poll_assets();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Builder pattern for EngineApp configuration
pub struct EngineBuilder {
    config: EngineConfig,
    overlay: Option<Box<dyn Overlay>>,
}

impl EngineBuilder {
    /// Create a new engine builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            overlay: None,
        }
    }

    /// Set the window title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.window_title = title.into();
        self
    }

    /// Set the window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.window_size = Some((width, height));
        self
    }

    /// Set the asset configuration
    pub fn asset_config(mut self, config: AssetConfig) -> Self {
        self.config.asset_config = config;
        self
    }

    /// Set the initial renderer settings
    pub fn renderer_settings(mut self, settings: RendererSettings) -> Self {
        self.config.renderer = settings;
        self
    }

    /// Set the initial debug parameters
    pub fn params(mut self, params: DebugParameters) -> Self {
        self.config.params = params;
        self
    }

    /// Set a custom log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = Some(filter.into());
        self
    }

    /// Draw `overlay` over the scene and apply its edits
    pub fn overlay(mut self, overlay: impl Overlay + 'static) -> Self {
        self.overlay = Some(Box::new(overlay));
        self
    }

    /// Build the EngineApp
    pub fn build(self) -> EngineApp {
        let mut app = EngineApp::with_config(self.config);
        if let Some(overlay) = self.overlay {
            app.set_overlay(overlay);
        }
        app
    }
}

impl Default for EngineApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
