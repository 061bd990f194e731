//! Materials and the shared material library
//!
//! Nodes never own a material directly. They carry a [`MaterialRef`] whose
//! handle points into the [`MaterialLibrary`] stored on the world, so a glTF
//! file that reuses one material across many primitives ends up with a
//! single shared instance.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Physically-based lit material with environment and shadow inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardMaterial {
    /// Base color (linear RGBA)
    pub base_color: [f32; 4],
    /// Metalness factor in [0, 1]
    pub metallic: f32,
    /// Perceptual roughness in [0, 1]
    pub roughness: f32,
    /// Scale applied to the environment map contribution
    pub env_map_intensity: f32,
    /// Whether nodes using this material render into the shadow map
    pub cast_shadow: bool,
    /// Whether nodes using this material sample the shadow map
    pub receive_shadow: bool,
    /// Set when derived GPU state has to be regenerated
    #[serde(skip)]
    pub needs_update: bool,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            env_map_intensity: 1.0,
            cast_shadow: false,
            receive_shadow: false,
            needs_update: true,
        }
    }
}

impl StandardMaterial {
    /// Create a standard material from metallic-roughness factors
    pub fn new(base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metallic,
            roughness,
            ..Default::default()
        }
    }
}

/// Unlit color material; ignores lights, shadows and the environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicMaterial {
    /// Flat output color (linear RGBA)
    pub color: [f32; 4],
    #[serde(skip)]
    pub needs_update: bool,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            needs_update: true,
        }
    }
}

/// Material variants understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Lit, shadowed, environment-mapped
    Standard(StandardMaterial),
    /// Flat color
    Basic(BasicMaterial),
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard(StandardMaterial::default())
    }
}

impl Material {
    /// Create a standard material from RGB values (alpha = 1.0)
    pub fn standard_rgb(r: f32, g: f32, b: f32) -> Self {
        Material::Standard(StandardMaterial::new([r, g, b, 1.0], 0.0, 0.5))
    }

    /// Create an unlit material from RGB values (alpha = 1.0)
    pub fn basic_rgb(r: f32, g: f32, b: f32) -> Self {
        Material::Basic(BasicMaterial {
            color: [r, g, b, 1.0],
            needs_update: true,
        })
    }

    /// Whether this material exposes the environment-intensity uniform and shadow flags
    pub fn supports_environment_uniform(&self) -> bool {
        matches!(self, Material::Standard(_))
    }

    /// Borrow the lit parameters if this is a standard material
    pub fn as_standard(&self) -> Option<&StandardMaterial> {
        match self {
            Material::Standard(standard) => Some(standard),
            Material::Basic(_) => None,
        }
    }

    /// Mutably borrow the lit parameters if this is a standard material
    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Material::Standard(standard) => Some(standard),
            Material::Basic(_) => None,
        }
    }

    /// Dirty flag shared by all variants
    pub fn needs_update(&self) -> bool {
        match self {
            Material::Standard(standard) => standard.needs_update,
            Material::Basic(basic) => basic.needs_update,
        }
    }

    /// Flag the material so the renderer regenerates its uniform
    pub fn mark_dirty(&mut self) {
        match self {
            Material::Standard(standard) => standard.needs_update = true,
            Material::Basic(basic) => basic.needs_update = true,
        }
    }

    /// Clear the dirty flag once the renderer has consumed the change
    pub fn clear_dirty(&mut self) {
        match self {
            Material::Standard(standard) => standard.needs_update = false,
            Material::Basic(basic) => basic.needs_update = false,
        }
    }

    /// Whether a node using this material is drawn into the shadow map
    pub fn casts_shadow(&self) -> bool {
        self.as_standard().is_some_and(|standard| standard.cast_shadow)
    }
}

/// Stable index of a material inside a [`MaterialLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(u32);

impl MaterialHandle {
    /// Raw slot index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Component attaching a shared material to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialRef(pub MaterialHandle);

/// Slot storage for materials shared between nodes
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    slots: Vec<Option<Material>>,
    free: Vec<u32>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a material and return its handle
    pub fn insert(&mut self, material: Material) -> MaterialHandle {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(material);
            return MaterialHandle(index);
        }
        self.slots.push(Some(material));
        MaterialHandle((self.slots.len() - 1) as u32)
    }

    /// Look up a material
    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Look up a material mutably
    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Number of live materials
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether the library holds no materials
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live materials with their handles
    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|m| (MaterialHandle(index as u32), m)))
    }

    /// Iterate mutably over live materials with their handles
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (MaterialHandle, &mut Material)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|m| (MaterialHandle(index as u32), m)))
    }

    /// Drop every material whose handle is not in `referenced`.
    ///
    /// Returns the number of materials released.
    pub fn collect_unreferenced(&mut self, referenced: &HashSet<MaterialHandle>) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let handle = MaterialHandle(index as u32);
            if slot.is_some() && !referenced.contains(&handle) {
                *slot = None;
                self.free.push(index as u32);
                released += 1;
            }
        }
        if released > 0 {
            debug!(released, "Released unreferenced materials");
        }
        released
    }
}

/// Material data for GPU uniform buffer
///
/// Matches `MaterialUniform` in `lit.wgsl`; 48 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniform {
    /// Base color (RGBA)
    pub color: [f32; 4],
    /// Metallic factor
    pub metallic: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Environment intensity
    pub env_map_intensity: f32,
    /// 1.0 when the material is lit
    pub lit: f32,
    /// 1.0 when the shadow map is sampled
    pub receive_shadow: f32,
    pub _padding: [f32; 3],
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        match material {
            Material::Standard(standard) => Self {
                color: standard.base_color,
                metallic: standard.metallic,
                roughness: standard.roughness,
                env_map_intensity: standard.env_map_intensity,
                lit: 1.0,
                receive_shadow: if standard.receive_shadow { 1.0 } else { 0.0 },
                _padding: [0.0; 3],
            },
            Material::Basic(basic) => Self {
                color: basic.color,
                metallic: 0.0,
                roughness: 1.0,
                env_map_intensity: 0.0,
                lit: 0.0,
                receive_shadow: 0.0,
                _padding: [0.0; 3],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_default_is_standard() {
        let mat = Material::default();
        assert!(mat.supports_environment_uniform());
        assert!(mat.needs_update());
    }

    #[test]
    fn test_basic_material_has_no_environment_uniform() {
        let mut mat = Material::basic_rgb(1.0, 0.0, 0.0);
        assert!(!mat.supports_environment_uniform());
        assert!(mat.as_standard_mut().is_none());
        assert!(!mat.casts_shadow());
    }

    #[test]
    fn test_dirty_flag_roundtrip() {
        let mut mat = Material::standard_rgb(0.2, 0.3, 0.4);
        mat.clear_dirty();
        assert!(!mat.needs_update());
        mat.mark_dirty();
        assert!(mat.needs_update());
    }

    #[test]
    fn test_library_reuses_freed_slots() {
        let mut library = MaterialLibrary::new();
        let a = library.insert(Material::standard_rgb(1.0, 0.0, 0.0));
        let b = library.insert(Material::standard_rgb(0.0, 1.0, 0.0));
        assert_eq!(library.len(), 2);

        let referenced: HashSet<_> = [b].into_iter().collect();
        assert_eq!(library.collect_unreferenced(&referenced), 1);
        assert!(library.get(a).is_none());
        assert!(library.get(b).is_some());

        let c = library.insert(Material::basic_rgb(0.0, 0.0, 1.0));
        assert_eq!(c, a);
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_material_uniform_conversion() {
        let mut standard = StandardMaterial::new([0.1, 0.2, 0.3, 0.4], 0.5, 0.6);
        standard.env_map_intensity = 2.0;
        standard.receive_shadow = true;
        let uniform = MaterialUniform::from(&Material::Standard(standard));
        assert_eq!(uniform.color, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(uniform.env_map_intensity, 2.0);
        assert_eq!(uniform.lit, 1.0);
        assert_eq!(uniform.receive_shadow, 1.0);

        let basic = MaterialUniform::from(&Material::basic_rgb(1.0, 1.0, 1.0));
        assert_eq!(basic.lit, 0.0);
    }

    #[test]
    fn test_material_uniform_size() {
        use std::mem;
        assert_eq!(mem::size_of::<MaterialUniform>(), 48);
    }
}
