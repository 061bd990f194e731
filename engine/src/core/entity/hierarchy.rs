//! Hierarchy system for updating global transforms based on parent relationships

use super::components::{GlobalTransform, Parent, Transform};
use super::world::World;
use glam::Mat4;
use std::collections::HashMap;
use tracing::{error, trace};

/// Update the hierarchy system, calculating global transforms from local transforms.
///
/// Walks the tree depth-first from the root, so every parent's world matrix
/// is known before its children are visited. Nodes not reachable from the
/// root keep their previous global transform.
pub fn update_hierarchy_system(world: &mut World) {
    let order: Vec<_> = world.traverse().collect();
    let mut world_matrices: HashMap<hecs::Entity, Mat4> = HashMap::with_capacity(order.len());

    for entity in &order {
        let local = world
            .get::<Transform>(*entity)
            .map(|transform| transform.to_matrix())
            .unwrap_or(Mat4::IDENTITY);

        let parent_matrix = match world.get::<Parent>(*entity) {
            Ok(parent) => match world_matrices.get(&parent.0) {
                Some(matrix) => *matrix,
                None => {
                    error!(
                        entity = ?entity,
                        parent = ?parent.0,
                        "Parent visited after child during hierarchy update"
                    );
                    Mat4::IDENTITY
                }
            },
            Err(_) => Mat4::IDENTITY,
        };

        world_matrices.insert(*entity, parent_matrix * local);
    }

    let inner = world.inner_mut();
    for (entity, matrix) in &world_matrices {
        match inner.query_one_mut::<&mut GlobalTransform>(*entity) {
            Ok(global) => global.matrix = *matrix,
            Err(_) => {
                let _ = inner.insert_one(*entity, GlobalTransform::from_matrix(*matrix));
            }
        }
    }

    trace!(processed_count = order.len(), "Hierarchy update completed");
}

/// Helper function to validate hierarchy consistency
///
/// Returns the number of issues found; each issue is logged.
pub fn validate_hierarchy_system(world: &World) -> usize {
    let mut issues = 0;

    for (entity, parent) in world.query::<&Parent>().iter() {
        if !world.contains(parent.0) {
            error!(entity = ?entity, parent = ?parent.0, "Entity refers to a missing parent");
            issues += 1;
            continue;
        }
        let listed = world.children(parent.0).contains(&entity);
        if !listed {
            error!(
                entity = ?entity,
                parent = ?parent.0,
                "Entity is missing from its parent's child list"
            );
            issues += 1;
        }
    }

    if issues > 0 {
        error!("Found {} hierarchy validation issues", issues);
    } else {
        trace!("Hierarchy validation passed");
    }
    issues
}
