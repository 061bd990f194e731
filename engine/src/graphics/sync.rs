//! Material synchronizer
//!
//! Pushes the environment intensity and shadow flags from the debug
//! parameters onto every standard material reachable from the scene root.
//! It runs after a subtree is attached and after edits to the environment
//! intensity or tone mapping; never on a per-frame schedule.

use crate::core::entity::World;
use crate::graphics::material::{MaterialHandle, MaterialRef};
use crate::params::DebugParameters;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Summary of one synchronization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Nodes visited by the traversal, root included
    pub visited_nodes: usize,
    /// Nodes whose material accepted the update
    pub updated_nodes: usize,
    /// Distinct materials written
    pub updated_materials: usize,
}

/// Apply `params` to every standard material in the scene graph.
///
/// Nodes without a material or with a material that has no environment
/// uniform are skipped. Running twice with the same parameters leaves the
/// materials in the same state as running once.
pub fn synchronize_materials(world: &mut World, params: &DebugParameters) -> SyncReport {
    let mut report = SyncReport::default();
    let mut handles: Vec<MaterialHandle> = Vec::new();

    for entity in world.traverse() {
        report.visited_nodes += 1;
        if let Ok(material) = world.get::<MaterialRef>(entity) {
            handles.push(material.0);
        }
    }

    let mut written: HashSet<MaterialHandle> = HashSet::new();
    let library = world.materials_mut();
    for handle in handles {
        let Some(standard) = library.get_mut(handle).and_then(|m| m.as_standard_mut()) else {
            trace!(handle = ?handle, "Skipping material without environment uniform");
            continue;
        };
        standard.cast_shadow = true;
        standard.receive_shadow = true;
        standard.env_map_intensity = params.environment_intensity;
        standard.needs_update = true;

        report.updated_nodes += 1;
        written.insert(handle);
    }
    report.updated_materials = written.len();

    debug!(
        visited = report.visited_nodes,
        nodes = report.updated_nodes,
        materials = report.updated_materials,
        env_intensity = params.environment_intensity,
        "Synchronized materials"
    );
    report
}
