//! Widgets for the parameter bindings
//!
//! Each binding becomes a slider or a combo box. Widget values are snapped to
//! the control step before they turn into [`ParameterEdit`]s; the ranges
//! themselves are enforced again when the scene applies the edit.

use engine::context::{AssetStatus, SceneContext};
use engine::graphics::ToneMapping;
use engine::params::{Binding, ControlSpec, ParameterEdit};

/// Edit for a slider that reported a change, if the snapped value differs
pub fn range_edit(spec: &ControlSpec, current: f32, widget_value: f32) -> Option<ParameterEdit> {
    let snapped = spec.snap(widget_value);
    (snapped != current).then(|| spec.edit(snapped))
}

/// Labels of the tone mapping combo, in code order
pub fn tone_mapping_labels() -> [&'static str; 5] {
    ToneMapping::ALL.map(ToneMapping::label)
}

/// Combo index for a tone mapping code; unknown codes select the first entry
pub fn tone_mapping_index(code: i32) -> usize {
    ToneMapping::ALL
        .iter()
        .position(|mapping| mapping.code() == code)
        .unwrap_or(0)
}

/// Edit for a combo selection
pub fn tone_mapping_edit(index: usize) -> Option<ParameterEdit> {
    ToneMapping::ALL
        .get(index)
        .map(|mapping| ParameterEdit::ToneMapping(mapping.code()))
}

/// One-line summary of the asset loads
pub fn status_line(scene: &SceneContext) -> String {
    format!(
        "model: {}  environment: {}",
        describe(&scene.model_status),
        describe(&scene.environment_status)
    )
}

fn describe(status: &AssetStatus) -> String {
    match status {
        AssetStatus::Pending => "loading".to_string(),
        AssetStatus::Loaded => "ready".to_string(),
        AssetStatus::Failed(reason) => format!("failed ({reason})"),
    }
}

/// Draw every bound control and collect the edits made this frame
pub fn draw_bindings(ui: &imgui::Ui, scene: &SceneContext) -> Vec<ParameterEdit> {
    let mut edits = Vec::new();

    for binding in scene.bindings() {
        let current = scene.value(binding.id());
        match binding {
            Binding::Range(spec) => {
                let mut value = current;
                let changed = ui
                    .slider_config(spec.name, spec.min, spec.max)
                    .display_format("%.3f")
                    .build(&mut value);
                if changed {
                    edits.extend(range_edit(&spec, current, value));
                }
            }
            Binding::ToneMapping { name } => {
                let labels = tone_mapping_labels();
                let mut index = tone_mapping_index(current as i32);
                if ui.combo_simple_string(name, &mut index, &labels) {
                    edits.extend(tone_mapping_edit(index));
                }
            }
        }
    }

    edits
}
