//! Tunable viewer parameters and the controls that edit them

use crate::graphics::tone_mapping::ToneMapping;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Values edited from the debug panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugParameters {
    /// Scale applied to the environment map on every standard material
    pub environment_intensity: f32,
    /// Directional light intensity
    pub light_intensity: f32,
    /// Directional light position
    pub light_position: Vec3,
    /// Tone mapping operator
    pub tone_mapping: ToneMapping,
    /// Rotation of the loaded model around Y, in radians
    pub model_rotation_y: f32,
}

impl Default for DebugParameters {
    fn default() -> Self {
        Self {
            environment_intensity: 2.0,
            light_intensity: 5.0,
            light_position: Vec3::new(0.25, 3.0, -2.25),
            tone_mapping: ToneMapping::AcesFilmic,
            model_rotation_y: PI * 0.5,
        }
    }
}

/// Coordinate of the light position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Identifies a panel control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    LightIntensity,
    LightPosition(Axis),
    EnvironmentIntensity,
    ToneMapping,
    ModelRotation,
}

/// A range-constrained numeric control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub id: ControlId,
    /// Label shown in the panel
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    /// Widget granularity
    pub step: f32,
}

impl ControlSpec {
    pub const LIGHT_INTENSITY: ControlSpec =
        ControlSpec::new(ControlId::LightIntensity, "lightIntensity", 0.0, 10.0);
    pub const LIGHT_X: ControlSpec =
        ControlSpec::new(ControlId::LightPosition(Axis::X), "lightX", -5.0, 5.0);
    pub const LIGHT_Y: ControlSpec =
        ControlSpec::new(ControlId::LightPosition(Axis::Y), "lightY", -5.0, 5.0);
    pub const LIGHT_Z: ControlSpec =
        ControlSpec::new(ControlId::LightPosition(Axis::Z), "lightZ", -5.0, 5.0);
    pub const ENVIRONMENT_INTENSITY: ControlSpec =
        ControlSpec::new(ControlId::EnvironmentIntensity, "envMapIntensity", 0.0, 10.0);
    pub const MODEL_ROTATION: ControlSpec =
        ControlSpec::new(ControlId::ModelRotation, "modelRotation", -PI, PI);

    /// Control for one coordinate of the light position
    pub fn light_position(axis: Axis) -> ControlSpec {
        match axis {
            Axis::X => Self::LIGHT_X,
            Axis::Y => Self::LIGHT_Y,
            Axis::Z => Self::LIGHT_Z,
        }
    }

    const fn new(id: ControlId, name: &'static str, min: f32, max: f32) -> Self {
        Self {
            id,
            name,
            min,
            max,
            step: 0.001,
        }
    }

    /// Clamp `value` into the control range
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Snap `value` to the nearest step from `min`, then clamp
    pub fn snap(&self, value: f32) -> f32 {
        if self.step <= 0.0 {
            return self.clamp(value);
        }
        let min = f64::from(self.min);
        let step = f64::from(self.step);
        let steps = ((f64::from(value) - min) / step).round();
        self.clamp((min + steps * step) as f32)
    }

    /// Build the edit this control emits for `value`
    pub fn edit(&self, value: f32) -> ParameterEdit {
        match self.id {
            ControlId::LightIntensity => ParameterEdit::LightIntensity(value),
            ControlId::LightPosition(axis) => ParameterEdit::LightPosition { axis, value },
            ControlId::EnvironmentIntensity => ParameterEdit::EnvironmentIntensity(value),
            ControlId::ToneMapping => ParameterEdit::ToneMapping(value.round() as i32),
            ControlId::ModelRotation => ParameterEdit::ModelRotation(value),
        }
    }
}

/// A control currently offered by the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    /// Slider over a numeric range
    Range(ControlSpec),
    /// Choice between the tone mapping operators
    ToneMapping { name: &'static str },
}

impl Binding {
    pub fn id(&self) -> ControlId {
        match self {
            Binding::Range(spec) => spec.id,
            Binding::ToneMapping { .. } => ControlId::ToneMapping,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Binding::Range(spec) => spec.name,
            Binding::ToneMapping { name } => name,
        }
    }
}

/// Controls available before anything has loaded, in panel order
pub const STATIC_BINDINGS: [Binding; 6] = [
    Binding::Range(ControlSpec::LIGHT_INTENSITY),
    Binding::Range(ControlSpec::LIGHT_X),
    Binding::Range(ControlSpec::LIGHT_Y),
    Binding::Range(ControlSpec::LIGHT_Z),
    Binding::Range(ControlSpec::ENVIRONMENT_INTENSITY),
    Binding::ToneMapping {
        name: "toneMapping",
    },
];

/// A change requested through the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterEdit {
    LightIntensity(f32),
    LightPosition { axis: Axis, value: f32 },
    EnvironmentIntensity(f32),
    /// Raw operator code as reported by the widget
    ToneMapping(i32),
    ModelRotation(f32),
}

impl ParameterEdit {
    pub fn control(&self) -> ControlId {
        match self {
            ParameterEdit::LightIntensity(_) => ControlId::LightIntensity,
            ParameterEdit::LightPosition { axis, .. } => ControlId::LightPosition(*axis),
            ParameterEdit::EnvironmentIntensity(_) => ControlId::EnvironmentIntensity,
            ParameterEdit::ToneMapping(_) => ControlId::ToneMapping,
            ParameterEdit::ModelRotation(_) => ControlId::ModelRotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = DebugParameters::default();
        assert_eq!(params.environment_intensity, 2.0);
        assert_eq!(params.light_intensity, 5.0);
        assert_eq!(params.light_position, Vec3::new(0.25, 3.0, -2.25));
        assert_eq!(params.tone_mapping, ToneMapping::AcesFilmic);
    }

    #[test]
    fn test_clamp_keeps_in_range_values_exact() {
        assert_eq!(ControlSpec::LIGHT_INTENSITY.clamp(8.5), 8.5);
        assert_eq!(ControlSpec::LIGHT_INTENSITY.clamp(12.0), 10.0);
        assert_eq!(ControlSpec::LIGHT_X.clamp(-7.0), -5.0);
    }

    #[test]
    fn test_snap_rounds_to_step() {
        let snapped = ControlSpec::ENVIRONMENT_INTENSITY.snap(2.00049);
        assert!((snapped - 2.0).abs() < 1e-6);
        assert_eq!(ControlSpec::ENVIRONMENT_INTENSITY.snap(8.5), 8.5);
        assert_eq!(ControlSpec::MODEL_ROTATION.snap(100.0), PI);
    }

    #[test]
    fn test_control_builds_matching_edit() {
        assert_eq!(
            ControlSpec::LIGHT_Y.edit(1.5),
            ParameterEdit::LightPosition {
                axis: Axis::Y,
                value: 1.5
            }
        );
        assert_eq!(
            ControlSpec::ENVIRONMENT_INTENSITY.edit(3.0).control(),
            ControlId::EnvironmentIntensity
        );
    }

    #[test]
    fn test_static_bindings_exclude_model_rotation() {
        assert!(STATIC_BINDINGS
            .iter()
            .all(|binding| binding.id() != ControlId::ModelRotation));
        assert_eq!(STATIC_BINDINGS[5].name(), "toneMapping");
    }

    #[test]
    fn test_parameters_deserialize_with_defaults() {
        let params: DebugParameters =
            serde_json::from_str(r#"{ "environment_intensity": 4.0 }"#).unwrap();
        assert_eq!(params.environment_intensity, 4.0);
        assert_eq!(params.light_intensity, 5.0);
    }
}
