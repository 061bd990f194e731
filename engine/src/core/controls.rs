//! Orbit camera controls with inertial damping
//!
//! Pointer drags rotate the camera around a target point and scroll input
//! dollies it in and out. With damping enabled, input accumulates into a
//! pending delta that is bled off a fraction at a time on every
//! [`OrbitControls::update`], which has to run once per frame.

use crate::core::entity::Transform;
use crate::input::InputState;
use glam::Vec3;
use std::f32::consts::PI;
use winit::event::MouseButton;

const MIN_POLAR: f32 = 1e-4;
const MAX_POLAR: f32 = PI - 1e-4;
const SETTLE_EPSILON: f32 = 1e-6;

/// Orbit controls around a fixed target
#[derive(Debug, Clone, Copy)]
pub struct OrbitControls {
    /// Point the camera orbits and looks at
    pub target: Vec3,
    /// Distance from the target
    pub radius: f32,
    /// Azimuth around the Y axis in radians
    pub theta: f32,
    /// Polar angle from +Y in radians
    pub phi: f32,
    /// Whether rotation input decays over several frames
    pub enable_damping: bool,
    /// Fraction of the pending delta applied each frame
    pub damping_factor: f32,
    /// Rotation speed multiplier
    pub rotate_speed: f32,
    /// Zoom speed multiplier
    pub zoom_speed: f32,
    /// Closest allowed distance
    pub min_distance: f32,
    /// Farthest allowed distance
    pub max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
}

impl OrbitControls {
    /// Create controls for a camera at `position` looking at `target`
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.length().max(MIN_POLAR);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        Self {
            target,
            radius,
            theta,
            phi: phi.clamp(MIN_POLAR, MAX_POLAR),
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
        }
    }

    /// Queue a rotation from a pointer drag, in pixels, on a viewport `viewport_height` tall
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let per_pixel = 2.0 * PI * self.rotate_speed / viewport_height;
        self.pending_theta -= dx * per_pixel;
        self.pending_phi -= dy * per_pixel;
    }

    /// Queue a dolly from scroll input; positive lines move closer
    pub fn zoom_by_lines(&mut self, lines: f32) {
        let step = 0.95_f32.powf(self.zoom_speed * lines.abs());
        if lines > 0.0 {
            self.pending_scale *= step;
        } else if lines < 0.0 {
            self.pending_scale /= step;
        }
    }

    /// Feed pointer input collected for this frame
    pub fn handle_input(&mut self, input: &InputState, viewport_height: f32) {
        if input.is_mouse_button_pressed(MouseButton::Left) {
            let (dx, dy) = input.mouse_delta;
            self.rotate_by_pixels(dx, dy, viewport_height);
        }
        if input.scroll_delta != 0.0 {
            self.zoom_by_lines(input.scroll_delta);
        }
    }

    /// Advance the controls by one frame.
    ///
    /// Returns true when the camera moved.
    pub fn update(&mut self) -> bool {
        let (theta_step, phi_step) = if self.enable_damping {
            (
                self.pending_theta * self.damping_factor,
                self.pending_phi * self.damping_factor,
            )
        } else {
            (self.pending_theta, self.pending_phi)
        };

        let old = (self.theta, self.phi, self.radius);
        self.theta += theta_step;
        self.phi = (self.phi + phi_step).clamp(MIN_POLAR, MAX_POLAR);
        self.radius =
            (self.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.pending_scale = 1.0;

        if self.enable_damping {
            self.pending_theta *= 1.0 - self.damping_factor;
            self.pending_phi *= 1.0 - self.damping_factor;
            if self.pending_theta.abs() < SETTLE_EPSILON {
                self.pending_theta = 0.0;
            }
            if self.pending_phi.abs() < SETTLE_EPSILON {
                self.pending_phi = 0.0;
            }
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }

        old != (self.theta, self.phi, self.radius)
    }

    /// Current camera position
    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    /// Camera transform looking at the target
    pub fn camera_transform(&self) -> Transform {
        Transform::from_position(self.position()).looking_at(self.target, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reproduces_position() {
        let position = Vec3::new(4.0, 1.0, -4.0);
        let controls = OrbitControls::new(position, Vec3::ZERO);
        assert!((controls.position() - position).length() < 1e-4);
    }

    #[test]
    fn test_update_without_input_is_stationary() {
        let mut controls = OrbitControls::new(Vec3::new(4.0, 1.0, -4.0), Vec3::ZERO);
        assert!(!controls.update());
    }

    #[test]
    fn test_damping_spreads_rotation_over_frames() {
        let mut controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        controls.rotate_by_pixels(100.0, 0.0, 600.0);
        let start = controls.theta;

        assert!(controls.update());
        let after_one = controls.theta;
        for _ in 0..10 {
            controls.update();
        }
        let after_many = controls.theta;

        assert!((after_one - start).abs() > 0.0);
        assert!((after_many - start).abs() > (after_one - start).abs());
    }

    #[test]
    fn test_without_damping_applies_rotation_at_once() {
        let mut controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        controls.enable_damping = false;
        controls.rotate_by_pixels(-150.0, 0.0, 300.0);
        controls.update();
        assert!((controls.theta - PI).abs() < 1e-5);
        assert!(!controls.update());
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        controls.enable_damping = false;
        controls.rotate_by_pixels(0.0, 10_000.0, 100.0);
        controls.update();
        assert!(controls.phi >= MIN_POLAR);
        assert!(controls.position().is_finite());
    }

    #[test]
    fn test_zoom_moves_closer() {
        let mut controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        controls.zoom_by_lines(1.0);
        assert!(controls.update());
        assert!(controls.radius < 5.0);
    }

    #[test]
    fn test_camera_transform_faces_target() {
        let controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let transform = controls.camera_transform();
        let forward = transform.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-4);
    }
}
