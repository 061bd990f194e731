//! Integration tests for the debug parameter bindings

use engine::context::{EditOutcome, SceneContext};
use engine::core::entity::{SceneNode, Subtree, Transform};
use engine::graphics::{ToneMapping, ToneMappingError};
use engine::params::{Axis, ControlId, ControlSpec, ParameterEdit};
use glam::Vec3;

fn model() -> Subtree {
    Subtree::from_root(SceneNode::new("helmet"))
}

#[test]
fn test_light_intensity_reads_back_exactly() {
    let mut scene = SceneContext::default();
    assert_eq!(scene.light_intensity(), 5.0);

    let outcome = scene.apply_edit(ParameterEdit::LightIntensity(8.5)).unwrap();

    assert_eq!(outcome, EditOutcome::Applied);
    assert_eq!(scene.light_intensity(), 8.5);
    assert_eq!(scene.value(ControlId::LightIntensity), 8.5);
}

#[test]
fn test_light_position_edit_moves_the_light_node() {
    let mut scene = SceneContext::default();
    scene
        .apply_edit(ParameterEdit::LightPosition {
            axis: Axis::Y,
            value: 4.0,
        })
        .unwrap();

    let light = scene.light();
    let position = scene.world().get::<Transform>(light).unwrap().position;
    assert_eq!(position, Vec3::new(0.25, 4.0, -2.25));
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let mut scene = SceneContext::default();
    scene.apply_edit(ParameterEdit::LightIntensity(42.0)).unwrap();
    scene
        .apply_edit(ParameterEdit::LightPosition {
            axis: Axis::Z,
            value: -9.0,
        })
        .unwrap();

    assert_eq!(scene.light_intensity(), ControlSpec::LIGHT_INTENSITY.max);
    assert_eq!(scene.light_position().z, -5.0);
}

#[test]
fn test_unknown_tone_mapping_codes_are_rejected() {
    let mut scene = SceneContext::default();

    for code in [-1, 5, 99] {
        let result = scene.apply_edit(ParameterEdit::ToneMapping(code));
        assert_eq!(result, Err(ToneMappingError::Unrecognized(code)));
    }
    assert_eq!(scene.settings().tone_mapping, ToneMapping::AcesFilmic);
}

#[test]
fn test_tone_mapping_edit_updates_settings() {
    let mut scene = SceneContext::default();
    let outcome = scene
        .apply_edit(ParameterEdit::ToneMapping(ToneMapping::Reinhard.code()))
        .unwrap();

    assert!(matches!(outcome, EditOutcome::Synchronized(_)));
    assert_eq!(scene.settings().tone_mapping, ToneMapping::Reinhard);
}

#[test]
fn test_model_rotation_is_bound_only_after_load() {
    let mut scene = SceneContext::default();
    let has_rotation = |scene: &SceneContext| {
        scene
            .bindings()
            .iter()
            .any(|binding| binding.id() == ControlId::ModelRotation)
    };

    assert!(!has_rotation(&scene));
    assert_eq!(
        scene.apply_edit(ParameterEdit::ModelRotation(1.0)),
        Ok(EditOutcome::Unbound)
    );

    let model_root = scene.attach_model(model(), &Default::default());
    assert!(has_rotation(&scene));

    scene.apply_edit(ParameterEdit::ModelRotation(1.0)).unwrap();
    let rotation = scene.world().get::<Transform>(model_root).unwrap().rotation_y();
    assert!((rotation - 1.0).abs() < 1e-5);
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
