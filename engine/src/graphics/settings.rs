//! Renderer-wide output settings

use super::tone_mapping::ToneMapping;
use serde::{Deserialize, Serialize};

/// Shadow map filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShadowMapKind {
    /// Single comparison tap
    Basic,
    /// Percentage-closer filtering over a 3x3 kernel
    #[default]
    PcfSoft,
}

/// Shadow map configuration shared by all shadow-casting lights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowMapSettings {
    pub enabled: bool,
    pub kind: ShadowMapKind,
}

impl Default for ShadowMapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: ShadowMapKind::PcfSoft,
        }
    }
}

/// Settings read by the renderer every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RendererSettings {
    /// Operator applied before output
    pub tone_mapping: ToneMapping,
    /// Exposure multiplier applied before tone mapping
    pub exposure: f32,
    /// Use unscaled light intensities
    pub physically_correct_lights: bool,
    /// Encode the output in sRGB
    pub srgb_output: bool,
    pub shadows: ShadowMapSettings,
    /// Multisample count of the scene pass; 1 disables antialiasing
    pub msaa_samples: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.0,
            physically_correct_lights: true,
            srgb_output: true,
            shadows: ShadowMapSettings::default(),
            msaa_samples: 4,
        }
    }
}

impl RendererSettings {
    /// Factor applied to light intensities in the shader
    ///
    /// Legacy lighting folds π into light intensities; physically-correct
    /// lighting uses them as given.
    pub fn light_scale(&self) -> f32 {
        if self.physically_correct_lights {
            1.0
        } else {
            std::f32::consts::PI
        }
    }
}
