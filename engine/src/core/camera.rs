//! Viewer camera
//!
//! A single perspective camera looks at the scene. Its node transform is
//! driven by the orbit controls and its aspect ratio by window resizes.

use crate::core::entity::GlobalTransform;
use crate::viewport::ResizeOutcome;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Vertical field of view of the viewer, in degrees
pub const FOV_Y_DEGREES: f32 = 75.0;
/// Near clipping plane of the viewer
pub const NEAR: f32 = 0.1;
/// Far clipping plane of the viewer
pub const FAR: f32 = 100.0;

/// Perspective camera component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width divided by height of the drawable surface
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

impl Camera {
    /// Viewer camera for a surface of the given aspect ratio
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            fov_y: FOV_Y_DEGREES.to_radians(),
            aspect_ratio,
            near: NEAR,
            far: FAR,
        }
    }

    /// Follow a window resize.
    ///
    /// Degenerate ratios are ignored so the projection stays invertible.
    /// Returns whether the ratio changed.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) -> bool {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return false;
        }
        let changed = self.aspect_ratio != aspect_ratio;
        self.aspect_ratio = aspect_ratio;
        changed
    }

    /// Apply the aspect ratio of a resize
    pub fn fit(&mut self, outcome: &ResizeOutcome) -> bool {
        self.set_aspect_ratio(outcome.aspect_ratio)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    /// Projection times the inverse of the camera's world transform
    pub fn view_projection(&self, transform: &GlobalTransform) -> Mat4 {
        self.projection() * transform.matrix.inverse()
    }

    pub fn eye_position(transform: &GlobalTransform) -> Vec3 {
        transform.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Transform;
    use glam::Vec4Swizzles;

    fn transform_at(eye: Vec3) -> GlobalTransform {
        let local = Transform::from_position(eye).looking_at(Vec3::ZERO, Vec3::Y);
        GlobalTransform::from_matrix(local.to_matrix())
    }

    #[test]
    fn test_viewer_defaults() {
        let camera = Camera::new(1.5);
        assert!((camera.fov_y - 75.0_f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 100.0);
        assert_eq!(camera.aspect_ratio, 1.5);
    }

    #[test]
    fn test_degenerate_aspect_is_ignored() {
        let mut camera = Camera::new(1.5);
        assert!(!camera.set_aspect_ratio(0.0));
        assert!(!camera.set_aspect_ratio(f32::NAN));
        assert!(!camera.set_aspect_ratio(f32::INFINITY));
        assert!(!camera.set_aspect_ratio(1.5));
        assert_eq!(camera.aspect_ratio, 1.5);
        assert!(camera.set_aspect_ratio(0.5));
        assert!(camera.projection().is_finite());
    }

    #[test]
    fn test_wider_surface_shows_more_horizontally() {
        let transform = transform_at(Vec3::new(0.0, 0.0, 4.0));
        let point = Vec3::new(1.0, 0.0, 0.0).extend(1.0);

        let narrow = Camera::new(1.0).view_projection(&transform) * point;
        let wide = Camera::new(2.0).view_projection(&transform) * point;

        let narrow_x = narrow.x / narrow.w;
        let wide_x = wide.x / wide.w;
        assert!((narrow_x - 2.0 * wide_x).abs() < 1e-5);
    }

    #[test]
    fn test_target_lands_in_the_middle_of_the_frame() {
        let eye = Vec3::new(4.0, 5.0, 4.0);
        let clip = Camera::default().view_projection(&transform_at(eye)) * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        assert!((Camera::eye_position(&transform_at(eye)) - eye).length() < 1e-5);
    }

    #[test]
    fn test_beyond_far_plane_is_clipped() {
        let transform = transform_at(Vec3::new(0.0, 0.0, 1.0));
        let far_point = Vec3::new(0.0, 0.0, -150.0).extend(1.0);
        let clip = Camera::default().view_projection(&transform) * far_point;
        assert!(clip.z / clip.w > 1.0);
    }
}
