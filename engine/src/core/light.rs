//! Directional light component and its shadow frustum

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Shadow parameters of a light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightShadow {
    /// Whether the light renders a shadow map
    pub cast: bool,
    /// Near plane of the shadow camera
    pub near: f32,
    /// Far plane of the shadow camera
    pub far: f32,
    /// Half width and height of the orthographic shadow frustum
    pub half_extent: f32,
    /// Shadow map resolution in texels per side
    pub map_size: u32,
}

impl Default for LightShadow {
    fn default() -> Self {
        Self {
            cast: true,
            near: 0.1,
            far: 15.0,
            half_extent: 5.0,
            map_size: 1024,
        }
    }
}

impl LightShadow {
    /// Square orthographic frustum along the light direction
    pub fn projection(&self) -> Mat4 {
        let extent = self.half_extent;
        Mat4::orthographic_rh(-extent, extent, -extent, extent, self.near, self.far)
    }
}

/// Light shining from its node position towards `target`
///
/// The position is taken from the node's transform, so moving the light
/// means editing its `Transform`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Linear RGB color
    pub color: Vec3,
    /// Illuminance scale
    pub intensity: f32,
    /// Point the light is aimed at
    pub target: Vec3,
    /// Shadow settings
    pub shadow: LightShadow,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            target: Vec3::ZERO,
            shadow: LightShadow::default(),
        }
    }
}

impl DirectionalLight {
    /// White light with the given intensity
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity,
            ..Default::default()
        }
    }

    /// Normalized direction the light travels in, from `position` to the target
    pub fn direction(&self, position: Vec3) -> Vec3 {
        let direction = self.target - position;
        if direction.length_squared() <= f32::EPSILON {
            Vec3::NEG_Y
        } else {
            direction.normalize()
        }
    }

    /// View-projection matrix of the shadow camera for a light at `position`
    pub fn shadow_view_projection(&self, position: Vec3) -> Mat4 {
        let direction = self.direction(position);
        let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(position, position + direction, up);
        self.shadow.projection() * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    #[test]
    fn test_default_shadow_settings() {
        let light = DirectionalLight::new(5.0);
        assert_eq!(light.intensity, 5.0);
        assert!(light.shadow.cast);
        assert_eq!(light.shadow.far, 15.0);
        assert_eq!(light.shadow.map_size, 1024);
    }

    #[test]
    fn test_direction_points_at_target() {
        let light = DirectionalLight::default();
        let dir = light.direction(Vec3::new(0.0, 3.0, 0.0));
        assert!((dir - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_target_projects_inside_shadow_frustum() {
        let light = DirectionalLight::default();
        let position = Vec3::new(0.25, 3.0, -2.25);
        let clip = light.shadow_view_projection(position) * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_shadow_frustum_bounds() {
        let shadow = LightShadow::default();
        let projection = shadow.projection();
        // Orthographic: no perspective divide
        assert_eq!(projection.w_axis.w, 1.0);

        let edge = projection * Vec3::new(5.0, -5.0, -15.0).extend(1.0);
        assert!((edge.x - 1.0).abs() < 1e-5);
        assert!((edge.y + 1.0).abs() < 1e-5);
        assert!((edge.z - 1.0).abs() < 1e-5);

        let near = projection * Vec3::new(0.0, 0.0, -0.1).extend(1.0);
        assert!(near.z.abs() < 1e-5);
    }

    #[test]
    fn test_straight_down_light_has_valid_matrix() {
        let light = DirectionalLight::default();
        let matrix = light.shadow_view_projection(Vec3::new(0.0, 5.0, 0.0));
        assert!(matrix.is_finite());
    }
}
