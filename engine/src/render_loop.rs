//! Per-frame driver: controls, transforms, one frame submission

use crate::context::SceneContext;
use crate::core::controls::OrbitControls;
use crate::core::entity::{update_hierarchy_system, Transform, World};
use crate::graphics::settings::RendererSettings;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Errors raised while submitting a frame
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("Scene has no camera to render from")]
    MissingCamera,
}

/// Something that can draw the scene once
pub trait FrameRenderer {
    /// Draw and present one frame of `world`.
    ///
    /// Takes the world mutably so material dirty flags can be cleared once
    /// the GPU copy is current.
    fn render_frame(
        &mut self,
        world: &mut World,
        settings: &RendererSettings,
    ) -> Result<(), FrameError>;
}

/// State of the render loop; it starts running and never stops on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Running,
}

/// Drives one frame per tick; the caller schedules the next tick
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
    last_tick: Option<Instant>,
    last_frame_time: Duration,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
            last_tick: None,
            last_frame_time: Duration::ZERO,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames submitted so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Time between the two most recent ticks
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    /// Run one iteration.
    ///
    /// Advances the orbit controls and writes the camera transform, propagates
    /// transforms, then submits exactly one frame.
    pub fn tick<R: FrameRenderer + ?Sized>(
        &mut self,
        controls: &mut OrbitControls,
        renderer: &mut R,
        scene: &mut SceneContext,
    ) -> Result<(), FrameError> {
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.last_frame_time = now - last;
        }

        let camera = scene.camera();
        let moved = controls.update();
        let (world, settings) = scene.render_parts();
        if let Ok(transform) = world.query_one_mut::<&mut Transform>(camera) {
            *transform = controls.camera_transform();
        }

        update_hierarchy_system(world);

        self.frames += 1;
        trace!(frame = self.frames, camera_moved = moved, "Submitting frame");
        renderer.render_frame(world, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CAMERA_START;
    use glam::Vec3;

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
    }

    impl FrameRenderer for CountingRenderer {
        fn render_frame(
            &mut self,
            _: &mut World,
            _: &RendererSettings,
        ) -> Result<(), FrameError> {
            self.frames += 1;
            Ok(())
        }
    }

    #[test]
    fn test_loop_starts_running() {
        assert_eq!(RenderLoop::new().state(), LoopState::Running);
    }

    #[test]
    fn test_each_tick_submits_one_frame() {
        let mut scene = SceneContext::default();
        let mut controls = OrbitControls::new(CAMERA_START, Vec3::ZERO);
        let mut renderer = CountingRenderer::default();
        let mut render_loop = RenderLoop::new();

        for expected in 1..=3 {
            render_loop
                .tick(&mut controls, &mut renderer, &mut scene)
                .unwrap();
            assert_eq!(renderer.frames, expected);
        }
        assert_eq!(render_loop.frame_count(), 3);
    }
}
