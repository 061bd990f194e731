//! Integration tests for subtree attachment and traversal

use engine::core::entity::{
    update_hierarchy_system, GlobalTransform, Name, SceneNode, Subtree, Transform, World,
};
use engine::graphics::material::{Material, MaterialRef};
use glam::Vec3;
use std::collections::HashSet;

fn branching_tree(depth: usize, width: usize, prefix: &str) -> SceneNode {
    let mut node = SceneNode::new(prefix);
    if depth > 0 {
        for index in 0..width {
            let child = branching_tree(depth - 1, width, &format!("{prefix}.{index}"));
            node = node.with_child(child);
        }
    }
    node
}

#[test]
fn test_attach_makes_every_node_reachable_once() {
    let mut world = World::new();
    let root = world.root();
    let subtree = Subtree::from_root(branching_tree(3, 3, "n"));
    let expected = subtree.node_count();

    let attached = world.attach(root, subtree);

    let visited: Vec<_> = world.traverse_from(attached).collect();
    let unique: HashSet<_> = visited.iter().copied().collect();
    assert_eq!(visited.len(), expected);
    assert_eq!(unique.len(), expected);
    assert_eq!(world.node_count(), expected + 1);
}

#[test]
fn test_traversal_visits_parents_before_children() {
    let mut world = World::new();
    let root = world.root();
    world.attach(root, Subtree::from_root(branching_tree(2, 2, "n")));

    let order: Vec<String> = world
        .traverse()
        .filter_map(|entity| world.get::<Name>(entity).ok().map(|name| name.0.clone()))
        .collect();

    assert_eq!(
        order,
        vec!["Scene", "n", "n.0", "n.0.0", "n.0.1", "n.1", "n.1.0", "n.1.1"]
    );
}

#[test]
fn test_traversal_is_restartable() {
    let mut world = World::new();
    let root = world.root();
    world.attach(root, Subtree::from_root(branching_tree(2, 3, "n")));

    let first: Vec<_> = world.traverse().collect();
    let second: Vec<_> = world.traverse().collect();
    assert_eq!(first, second);
}

#[test]
fn test_attached_nodes_share_materials_by_index() {
    let mut world = World::new();
    let root = world.root();
    let subtree = Subtree {
        root: SceneNode::new("model")
            .with_child(SceneNode {
                material: Some(0),
                ..SceneNode::new("left")
            })
            .with_child(SceneNode {
                material: Some(0),
                ..SceneNode::new("right")
            }),
        materials: vec![Material::standard_rgb(0.8, 0.8, 0.8)],
        meshes: Vec::new(),
    };

    let model = world.attach(root, subtree);
    let handles: HashSet<_> = world
        .children(model)
        .into_iter()
        .map(|child| world.get::<MaterialRef>(child).unwrap().0)
        .collect();

    assert_eq!(handles.len(), 1);
    assert_eq!(world.materials().len(), 1);
}

#[test]
fn test_attached_subtree_receives_world_transforms() {
    let mut world = World::new();
    let root = world.root();
    let tree = SceneNode::new("model")
        .with_transform(
            Transform::from_position(Vec3::new(0.0, -4.0, 0.0)).with_scale(Vec3::splat(10.0)),
        )
        .with_child(SceneNode::new("part").with_transform(Transform::from_position(Vec3::X)));

    let model = world.attach(root, Subtree::from_root(tree));
    update_hierarchy_system(&mut world);

    let part = world.children(model)[0];
    let position = world.get::<GlobalTransform>(part).unwrap().position();
    assert!((position - Vec3::new(10.0, -4.0, 0.0)).length() < 1e-4);
}

#[test]
#[should_panic(expected = "not part of the scene graph")]
fn test_attach_to_missing_parent_panics() {
    let mut world = World::new();
    let stray = world.spawn((Name::new("stray"),));
    world.inner_mut().despawn(stray).unwrap();
    world.attach(stray, Subtree::from_root(SceneNode::new("model")));
}
