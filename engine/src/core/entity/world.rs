//! World wrapper providing the scene graph operations

use super::components::{Children, GlobalTransform, Name, Parent, SceneRoot, Transform};
use super::subtree::{SceneNode, Subtree};
use crate::graphics::material::{MaterialHandle, MaterialLibrary, MaterialRef};
use hecs::Entity;
use std::collections::HashSet;
use tracing::debug;

/// Wrapper around hecs::World holding the scene tree and its shared materials
pub struct World {
    inner: hecs::World,
    root: Entity,
    materials: MaterialLibrary,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new world containing only the root node
    pub fn new() -> Self {
        let mut inner = hecs::World::new();
        let root = inner.spawn((
            SceneRoot,
            Name::new("Scene"),
            Transform::default(),
            GlobalTransform::default(),
            Children::default(),
        ));
        Self {
            inner,
            root,
            materials: MaterialLibrary::new(),
        }
    }

    /// The root node every renderable node descends from
    pub fn root(&self) -> Entity {
        self.root
    }

    /// Shared materials
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Shared materials, mutably
    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    /// Spawn a new detached entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Get a reference to a component on an entity
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Query a single entity for a mutable component reference
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.inner.query_one_mut::<Q>(entity)
    }

    /// Insert a component into an entity
    pub fn insert_one(
        &mut self,
        entity: Entity,
        component: impl hecs::Component,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(entity, component)
    }

    /// Query entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query()
    }

    /// Query entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut()
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Insert a single node under `parent`.
    ///
    /// Transform and GlobalTransform are added when the bundle lacks them.
    ///
    /// # Panics
    /// Panics when `parent` is not part of this world.
    pub fn attach_node(&mut self, parent: Entity, components: impl hecs::DynamicBundle) -> Entity {
        assert!(
            self.contains(parent),
            "attach target {parent:?} is not part of the scene graph"
        );

        let entity = self.inner.spawn(components);
        if self.get::<Transform>(entity).is_err() {
            let _ = self.insert_one(entity, Transform::default());
        }
        if self.get::<GlobalTransform>(entity).is_err() {
            let _ = self.insert_one(entity, GlobalTransform::default());
        }
        self.link(parent, entity);
        debug!(entity = ?entity, parent = ?parent, "Attached node");
        entity
    }

    /// Instantiate a loaded subtree under `parent` and return the entity of its root.
    ///
    /// Subtree materials are registered in the material library once each;
    /// nodes sharing a material index end up sharing the same handle.
    ///
    /// # Panics
    /// Panics when `parent` is not part of this world.
    pub fn attach(&mut self, parent: Entity, subtree: Subtree) -> Entity {
        assert!(
            self.contains(parent),
            "attach target {parent:?} is not part of the scene graph"
        );

        let Subtree {
            root, materials, ..
        } = subtree;
        let handles: Vec<MaterialHandle> = materials
            .into_iter()
            .map(|material| self.materials.insert(material))
            .collect();

        let node_count = root.node_count();
        let entity = self.instantiate(parent, root, &handles);
        debug!(
            entity = ?entity,
            parent = ?parent,
            nodes = node_count,
            materials = handles.len(),
            "Attached subtree"
        );
        entity
    }

    fn instantiate(&mut self, parent: Entity, node: SceneNode, handles: &[MaterialHandle]) -> Entity {
        let SceneNode {
            name,
            transform,
            mesh,
            material,
            children,
        } = node;

        let mut builder = hecs::EntityBuilder::new();
        builder.add(transform);
        builder.add(GlobalTransform::default());
        builder.add(Children::default());
        if let Some(name) = name {
            builder.add(Name(name));
        }
        if let Some(mesh) = mesh {
            builder.add(mesh);
        }
        if let Some(handle) = material.and_then(|index| handles.get(index).copied()) {
            builder.add(MaterialRef(handle));
        }

        let entity = self.inner.spawn(builder.build());
        self.link(parent, entity);

        for child in children {
            self.instantiate(entity, child, handles);
        }
        entity
    }

    fn link(&mut self, parent: Entity, child: Entity) {
        let _ = self.inner.insert_one(child, Parent(parent));
        match self.inner.query_one_mut::<&mut Children>(parent) {
            Ok(children) => children.0.push(child),
            Err(_) => {
                let _ = self.inner.insert_one(parent, Children(vec![child]));
            }
        }
    }

    /// Depth-first walk over every node reachable from the root
    pub fn traverse(&self) -> Traverse<'_> {
        self.traverse_from(self.root)
    }

    /// Depth-first walk over `start` and its descendants
    pub fn traverse_from(&self, start: Entity) -> Traverse<'_> {
        let stack = if self.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Traverse {
            world: &self.inner,
            stack,
        }
    }

    /// Children of a node in insertion order
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.inner
            .get::<&Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    /// Release materials no reachable node refers to any more
    pub fn collect_unreferenced_materials(&mut self) -> usize {
        let referenced: HashSet<MaterialHandle> = self
            .traverse()
            .filter_map(|entity| self.inner.get::<&MaterialRef>(entity).ok().map(|m| m.0))
            .collect();
        self.materials.collect_unreferenced(&referenced)
    }

    /// Number of nodes reachable from the root, root included
    pub fn node_count(&self) -> usize {
        self.traverse().count()
    }

    /// Get access to the inner hecs::World for advanced operations
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }

    /// Get mutable access to the inner hecs::World for advanced operations
    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.inner
    }
}

/// Lazy depth-first iterator over the scene tree; parents come before their children
pub struct Traverse<'w> {
    world: &'w hecs::World,
    stack: Vec<Entity>,
}

impl Iterator for Traverse<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let entity = self.stack.pop()?;
            if !self.world.contains(entity) {
                continue;
            }
            if let Ok(children) = self.world.get::<&Children>(entity) {
                // Reversed so the first child is visited first
                self.stack.extend(children.iter().rev().copied());
            }
            return Some(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::material::Material;
    use glam::Vec3;

    #[test]
    fn test_new_world_has_root_only() {
        let world = World::new();
        assert!(world.contains(world.root()));
        assert_eq!(world.traverse().collect::<Vec<_>>(), vec![world.root()]);
    }

    #[test]
    fn test_attach_node_adds_transform_components() {
        let mut world = World::new();
        let root = world.root();
        let entity = world.attach_node(root, (Name::new("light"),));

        assert!(world.get::<Transform>(entity).is_ok());
        assert!(world.get::<GlobalTransform>(entity).is_ok());
        assert_eq!(world.get::<Parent>(entity).unwrap().0, root);
        assert_eq!(world.children(root), vec![entity]);
    }

    #[test]
    fn test_attach_node_keeps_existing_transform() {
        let mut world = World::new();
        let root = world.root();
        let entity = world.attach_node(root, (Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),));
        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    #[should_panic(expected = "is not part of the scene graph")]
    fn test_attach_to_missing_parent_panics() {
        let mut world = World::new();
        let root = world.root();
        let orphan = world.attach_node(root, ());
        world.inner_mut().despawn(orphan).unwrap();
        world.attach(orphan, Subtree::from_root(SceneNode::new("lost")));
    }

    #[test]
    fn test_traverse_visits_parent_before_children() {
        let mut world = World::new();
        let root = world.root();
        let tree = SceneNode::new("a")
            .with_child(SceneNode::new("a1").with_child(SceneNode::new("a1x")))
            .with_child(SceneNode::new("a2"));
        let a = world.attach(root, Subtree::from_root(tree));

        let order: Vec<String> = world
            .traverse_from(a)
            .map(|entity| world.get::<Name>(entity).unwrap().0.clone())
            .collect();
        assert_eq!(order, vec!["a", "a1", "a1x", "a2"]);
    }

    #[test]
    fn test_traverse_is_restartable() {
        let mut world = World::new();
        let root = world.root();
        world.attach(root, Subtree::from_root(SceneNode::new("a").with_child(SceneNode::new("b"))));

        let first: Vec<_> = world.traverse().collect();
        let second: Vec<_> = world.traverse().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_attach_shares_materials_by_index() {
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
            materials: vec![Material::standard_rgb(1.0, 1.0, 1.0)],
            meshes: Vec::new(),
        };
        let model = world.attach(root, subtree);

        let refs: Vec<MaterialRef> = world
            .traverse_from(model)
            .filter_map(|entity| world.get::<MaterialRef>(entity).ok().map(|r| *r))
            .collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], refs[1]);
        assert_eq!(world.materials().len(), 1);
    }

    #[test]
    fn test_unreferenced_materials_are_collected() {
        let mut world = World::new();
        let root = world.root();
        let model = world.attach(
            root,
            Subtree {
                root: SceneNode {
                    material: Some(0),
                    ..SceneNode::new("mesh")
                },
                materials: vec![Material::default(), Material::default()],
                meshes: Vec::new(),
            },
        );
        assert_eq!(world.materials().len(), 2);
        assert_eq!(world.collect_unreferenced_materials(), 1);

        world.inner_mut().remove_one::<MaterialRef>(model).unwrap();
        assert_eq!(world.collect_unreferenced_materials(), 1);
        assert!(world.materials().is_empty());
    }
}
