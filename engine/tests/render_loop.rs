//! Integration tests for the render loop and viewport resizing

use engine::context::{SceneContext, CAMERA_START};
use engine::core::camera::Camera;
use engine::core::controls::OrbitControls;
use engine::core::entity::{GlobalTransform, World};
use engine::graphics::RendererSettings;
use engine::render_loop::{FrameError, FrameRenderer, LoopState, RenderLoop};
use engine::viewport::Viewport;
use glam::Vec3;

/// Records what each submitted frame saw
#[derive(Default)]
struct RecordingRenderer {
    frames: usize,
    camera_positions: Vec<Vec3>,
}

impl FrameRenderer for RecordingRenderer {
    fn render_frame(
        &mut self,
        world: &mut World,
        _settings: &RendererSettings,
    ) -> Result<(), FrameError> {
        self.frames += 1;
        let mut query = world.query::<(&Camera, &GlobalTransform)>();
        let (_, (_, transform)) = query.iter().next().ok_or(FrameError::MissingCamera)?;
        self.camera_positions.push(transform.position());
        Ok(())
    }
}

#[test]
fn test_tick_submits_exactly_one_frame() {
    let mut scene = SceneContext::default();
    let mut controls = OrbitControls::new(CAMERA_START, Vec3::ZERO);
    let mut renderer = RecordingRenderer::default();
    let mut render_loop = RenderLoop::new();

    for tick in 1..=10 {
        render_loop
            .tick(&mut controls, &mut renderer, &mut scene)
            .unwrap();
        assert_eq!(renderer.frames, tick);
    }
    assert_eq!(render_loop.frame_count(), 10);
    assert_eq!(render_loop.state(), LoopState::Running);
}

#[test]
fn test_damping_keeps_moving_the_camera_after_input_stops() {
    let mut scene = SceneContext::default();
    let mut controls = OrbitControls::new(CAMERA_START, Vec3::ZERO);
    let mut renderer = RecordingRenderer::default();
    let mut render_loop = RenderLoop::new();

    controls.rotate_by_pixels(200.0, 0.0, 720.0);
    for _ in 0..5 {
        render_loop
            .tick(&mut controls, &mut renderer, &mut scene)
            .unwrap();
    }

    let positions = &renderer.camera_positions;
    assert!((positions[0] - CAMERA_START).length() > 1e-4);
    assert!(positions.windows(2).all(|pair| pair[0] != pair[1]));
}

#[test]
fn test_zero_size_resize_leaves_aspect_unchanged() {
    let mut viewport = Viewport::new(1280.0, 720.0, 1.0);
    let aspect = viewport.aspect_ratio();

    assert_eq!(viewport.resize(0.0, 720.0, 1.0), None);
    assert_eq!(viewport.resize(1280.0, 0.0, 1.0), None);
    assert_eq!(viewport.aspect_ratio(), aspect);
    assert_eq!(viewport.drawable_size(), (1280, 720));
}

#[test]
fn test_pixel_ratio_is_capped_at_two() {
    let mut viewport = Viewport::default();

    let ratios: Vec<f64> = [1.0, 2.0, 3.0]
        .into_iter()
        .map(|host| viewport.resize(800.0, 600.0, host).unwrap().pixel_ratio)
        .collect();

    assert_eq!(ratios, vec![1.0, 2.0, 2.0]);
    assert_eq!(viewport.drawable_size(), (1600, 1200));
}

#[test]
fn test_resize_drives_camera_aspect() {
    let mut scene = SceneContext::default();
    let mut viewport = Viewport::new(1280.0, 720.0, 1.0);
    scene.fit_camera(&viewport.current());

    let outcome = viewport.resize(600.0, 800.0, 3.0).unwrap();
    scene.fit_camera(&outcome);
    // A minimized window keeps the last projection
    assert_eq!(viewport.resize(0.0, 0.0, 1.0), None);

    let camera = scene
        .world()
        .get::<Camera>(scene.camera())
        .map(|camera| *camera)
        .unwrap();
    assert!((camera.aspect_ratio - 0.75).abs() < 1e-6);
    assert_eq!(viewport.drawable_size(), (1200, 1600));
}
