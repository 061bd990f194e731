//! Scene context: the world plus the debug parameters that drive it
//!
//! A single context is created at startup and handed to the render loop and
//! the debug panel. Edits from the panel go through [`SceneContext::apply_edit`],
//! which decides whether the change needs the material synchronizer or only
//! touches the light or model directly.

use crate::config::ModelPlacement;
use crate::core::camera::Camera;
use crate::core::entity::{validate_hierarchy_system, Entity, Name, Subtree, Transform, World};
use crate::core::light::DirectionalLight;
use crate::graphics::settings::RendererSettings;
use crate::graphics::sync::{synchronize_materials, SyncReport};
use crate::graphics::tone_mapping::{ToneMapping, ToneMappingError};
use crate::params::{
    Binding, ControlId, ControlSpec, DebugParameters, ParameterEdit, STATIC_BINDINGS,
};
use crate::viewport::ResizeOutcome;
use glam::Vec3;
use tracing::{debug, error, info, warn};

/// Initial camera position, looking at the origin
pub const CAMERA_START: Vec3 = Vec3::new(4.0, 1.0, -4.0);

/// What happened to an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Applied directly to the scene
    Applied,
    /// Applied and followed by a material synchronization
    Synchronized(SyncReport),
    /// The control is not bound yet
    Unbound,
    /// The value was not a finite number
    Ignored,
}

/// Progress of a background asset load
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssetStatus {
    #[default]
    Pending,
    Loaded,
    Failed(String),
}

/// Owner of the world and of every tunable parameter
pub struct SceneContext {
    world: World,
    params: DebugParameters,
    settings: RendererSettings,
    light: Entity,
    camera: Entity,
    model: Option<Entity>,
    /// Status of the model load
    pub model_status: AssetStatus,
    /// Status of the environment map load
    pub environment_status: AssetStatus,
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new(DebugParameters::default(), RendererSettings::default())
    }
}

impl SceneContext {
    /// Build the scene: root, shadow-casting directional light and camera
    pub fn new(params: DebugParameters, mut settings: RendererSettings) -> Self {
        settings.tone_mapping = params.tone_mapping;

        let mut world = World::new();
        let root = world.root();
        let light = world.attach_node(
            root,
            (
                Name::new("Directional Light"),
                Transform::from_position(params.light_position),
                DirectionalLight::new(params.light_intensity),
            ),
        );
        let camera = world.attach_node(
            root,
            (
                Name::new("Camera"),
                Transform::from_position(CAMERA_START).looking_at(Vec3::ZERO, Vec3::Y),
                Camera::default(),
            ),
        );

        Self {
            world,
            params,
            settings,
            light,
            camera,
            model: None,
            model_status: AssetStatus::Pending,
            environment_status: AssetStatus::Pending,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn params(&self) -> &DebugParameters {
        &self.params
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn light(&self) -> Entity {
        self.light
    }

    pub fn camera(&self) -> Entity {
        self.camera
    }

    /// Match the camera to the drawable surface after a resize
    pub fn fit_camera(&mut self, outcome: &ResizeOutcome) {
        if let Ok(camera) = self.world.query_one_mut::<&mut Camera>(self.camera) {
            if camera.fit(outcome) {
                debug!(aspect_ratio = outcome.aspect_ratio, "Camera aspect updated");
            }
        }
    }

    /// Root of the loaded model, once attached
    pub fn model(&self) -> Option<Entity> {
        self.model
    }

    /// Borrow the world together with the renderer settings
    pub fn render_parts(&mut self) -> (&mut World, &RendererSettings) {
        (&mut self.world, &self.settings)
    }

    /// Attach a loaded model under the root and bind the model controls.
    ///
    /// The placement's rotation becomes the initial `model_rotation_y`.
    pub fn attach_model(&mut self, mut subtree: Subtree, placement: &ModelPlacement) -> Entity {
        self.params.model_rotation_y = placement.rotation_y;
        let mut transform = subtree.root.transform;
        transform.position = placement.position;
        transform.scale = Vec3::splat(placement.scale);
        transform.set_rotation_y(self.params.model_rotation_y);
        subtree.root.transform = transform;

        let node_count = subtree.node_count();
        let root = self.world.root();
        let model = self.world.attach(root, subtree);
        self.model = Some(model);
        self.model_status = AssetStatus::Loaded;

        // Model files may declare materials that no primitive uses
        let released = self.world.collect_unreferenced_materials();
        let issues = validate_hierarchy_system(&self.world);
        if issues > 0 {
            warn!(issues, "Model attached with an inconsistent hierarchy");
        }

        let report = self.synchronize();
        info!(
            nodes = node_count,
            materials = report.updated_materials,
            released,
            "Model attached"
        );
        model
    }

    /// Run the material synchronizer with the current parameters
    pub fn synchronize(&mut self) -> SyncReport {
        synchronize_materials(&mut self.world, &self.params)
    }

    /// Controls currently bound, in panel order
    pub fn bindings(&self) -> Vec<Binding> {
        let mut bindings = STATIC_BINDINGS.to_vec();
        if self.model.is_some() {
            bindings.push(Binding::Range(ControlSpec::MODEL_ROTATION));
        }
        bindings
    }

    /// Current value of a control
    pub fn value(&self, id: ControlId) -> f32 {
        match id {
            ControlId::LightIntensity => self.light_intensity(),
            ControlId::LightPosition(axis) => self.light_position()[axis.index()],
            ControlId::EnvironmentIntensity => self.params.environment_intensity,
            ControlId::ToneMapping => self.settings.tone_mapping.code() as f32,
            ControlId::ModelRotation => self.params.model_rotation_y,
        }
    }

    /// Intensity as stored on the light
    pub fn light_intensity(&self) -> f32 {
        self.world
            .get::<DirectionalLight>(self.light)
            .map(|light| light.intensity)
            .unwrap_or(self.params.light_intensity)
    }

    /// Position as stored on the light node
    pub fn light_position(&self) -> Vec3 {
        self.world
            .get::<Transform>(self.light)
            .map(|transform| transform.position)
            .unwrap_or(self.params.light_position)
    }

    /// Apply one edit from the panel.
    ///
    /// Environment intensity and tone mapping edits rerun the synchronizer;
    /// light edits mutate the light node directly. Unknown tone mapping codes
    /// are rejected and leave the settings unchanged.
    pub fn apply_edit(&mut self, edit: ParameterEdit) -> Result<EditOutcome, ToneMappingError> {
        if let Some(value) = edit_value(&edit) {
            if !value.is_finite() {
                warn!(edit = ?edit, "Ignoring non-finite parameter value");
                return Ok(EditOutcome::Ignored);
            }
        }

        let outcome = match edit {
            ParameterEdit::LightIntensity(value) => {
                let value = ControlSpec::LIGHT_INTENSITY.clamp(value);
                self.params.light_intensity = value;
                if let Ok(light) = self.world.query_one_mut::<&mut DirectionalLight>(self.light) {
                    light.intensity = value;
                }
                EditOutcome::Applied
            }
            ParameterEdit::LightPosition { axis, value } => {
                let value = ControlSpec::light_position(axis).clamp(value);
                self.params.light_position[axis.index()] = value;
                let position = self.params.light_position;
                if let Ok(transform) = self.world.query_one_mut::<&mut Transform>(self.light) {
                    transform.position = position;
                }
                EditOutcome::Applied
            }
            ParameterEdit::EnvironmentIntensity(value) => {
                self.params.environment_intensity = ControlSpec::ENVIRONMENT_INTENSITY.clamp(value);
                EditOutcome::Synchronized(self.synchronize())
            }
            ParameterEdit::ToneMapping(code) => {
                let mapping = ToneMapping::try_from(code).inspect_err(|err| {
                    error!(code, error = %err, "Rejected tone mapping change");
                })?;
                self.params.tone_mapping = mapping;
                self.settings.tone_mapping = mapping;
                info!(tone_mapping = %mapping, "Tone mapping changed");
                EditOutcome::Synchronized(self.synchronize())
            }
            ParameterEdit::ModelRotation(value) => match self.model {
                Some(model) => {
                    let value = ControlSpec::MODEL_ROTATION.clamp(value);
                    self.params.model_rotation_y = value;
                    if let Ok(transform) = self.world.query_one_mut::<&mut Transform>(model) {
                        transform.set_rotation_y(value);
                    }
                    EditOutcome::Applied
                }
                None => {
                    debug!("Model rotation edited before the model loaded");
                    EditOutcome::Unbound
                }
            },
        };
        Ok(outcome)
    }
}

fn edit_value(edit: &ParameterEdit) -> Option<f32> {
    match *edit {
        ParameterEdit::LightIntensity(value)
        | ParameterEdit::LightPosition { value, .. }
        | ParameterEdit::EnvironmentIntensity(value)
        | ParameterEdit::ModelRotation(value) => Some(value),
        ParameterEdit::ToneMapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::SceneNode;
    use crate::graphics::material::Material;
    use crate::params::Axis;

    fn model_subtree() -> Subtree {
        Subtree {
            root: SceneNode::new("model").with_child(SceneNode {
                material: Some(0),
                ..SceneNode::new("mesh")
            }),
            materials: vec![Material::standard_rgb(1.0, 1.0, 1.0)],
            meshes: Vec::new(),
        }
    }

    #[test]
    fn test_new_scene_has_light_and_camera() {
        let scene = SceneContext::default();
        assert_eq!(scene.world().node_count(), 3);
        assert_eq!(scene.light_intensity(), 5.0);
        assert_eq!(scene.light_position(), Vec3::new(0.25, 3.0, -2.25));
        assert!(scene.model().is_none());
    }

    #[test]
    fn test_light_edits_skip_synchronization() {
        let mut scene = SceneContext::default();
        let outcome = scene.apply_edit(ParameterEdit::LightIntensity(8.5)).unwrap();
        assert_eq!(outcome, EditOutcome::Applied);
        assert_eq!(scene.light_intensity(), 8.5);

        scene
            .apply_edit(ParameterEdit::LightPosition {
                axis: Axis::Z,
                value: 1.25,
            })
            .unwrap();
        assert_eq!(scene.light_position(), Vec3::new(0.25, 3.0, 1.25));
        assert_eq!(scene.value(ControlId::LightPosition(Axis::Z)), 1.25);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut scene = SceneContext::default();
        scene.apply_edit(ParameterEdit::LightIntensity(50.0)).unwrap();
        assert_eq!(scene.light_intensity(), 10.0);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut scene = SceneContext::default();
        let outcome = scene
            .apply_edit(ParameterEdit::EnvironmentIntensity(f32::NAN))
            .unwrap();
        assert_eq!(outcome, EditOutcome::Ignored);
        assert_eq!(scene.params().environment_intensity, 2.0);
    }

    #[test]
    fn test_unknown_tone_mapping_is_rejected() {
        let mut scene = SceneContext::default();
        let result = scene.apply_edit(ParameterEdit::ToneMapping(9));
        assert_eq!(result, Err(ToneMappingError::Unrecognized(9)));
        assert_eq!(scene.settings().tone_mapping, ToneMapping::AcesFilmic);
    }

    #[test]
    fn test_tone_mapping_change_synchronizes() {
        let mut scene = SceneContext::default();
        scene.attach_model(model_subtree(), &ModelPlacement::default());

        let outcome = scene.apply_edit(ParameterEdit::ToneMapping(2)).unwrap();
        assert!(matches!(
            outcome,
            EditOutcome::Synchronized(report) if report.updated_materials == 1
        ));
        assert_eq!(scene.settings().tone_mapping, ToneMapping::Reinhard);
    }

    #[test]
    fn test_model_rotation_bound_after_attach() {
        let mut scene = SceneContext::default();
        assert!(scene
            .bindings()
            .iter()
            .all(|binding| binding.id() != ControlId::ModelRotation));
        assert_eq!(
            scene.apply_edit(ParameterEdit::ModelRotation(1.0)).unwrap(),
            EditOutcome::Unbound
        );

        let model = scene.attach_model(model_subtree(), &ModelPlacement::default());
        assert_eq!(scene.model_status, AssetStatus::Loaded);
        assert_eq!(
            scene.bindings().last().map(Binding::id),
            Some(ControlId::ModelRotation)
        );

        scene.apply_edit(ParameterEdit::ModelRotation(1.0)).unwrap();
        let rotation = scene.world().get::<Transform>(model).unwrap().rotation_y();
        assert!((rotation - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_attach_model_applies_placement() {
        let mut scene = SceneContext::default();
        let model = scene.attach_model(model_subtree(), &ModelPlacement::default());
        let transform = *scene.world().get::<Transform>(model).unwrap();
        assert_eq!(transform.position, Vec3::new(0.0, -4.0, 0.0));
        assert_eq!(transform.scale, Vec3::splat(10.0));
        assert!((transform.rotation_y() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_attach_model_releases_unused_materials() {
        let mut subtree = model_subtree();
        subtree.materials.push(Material::standard_rgb(0.0, 0.0, 0.0));
        subtree.materials.push(Material::basic_rgb(0.0, 0.0, 0.0));

        let mut scene = SceneContext::default();
        scene.attach_model(subtree, &ModelPlacement::default());
        assert_eq!(scene.world().materials().len(), 1);
        assert_eq!(validate_hierarchy_system(scene.world()), 0);
    }
}
