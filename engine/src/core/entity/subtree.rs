//! Detached node trees produced by loaders and attached to the world in one step

use super::components::Transform;
use crate::graphics::material::Material;
use crate::graphics::mesh::Mesh;
use crate::graphics::renderer::MeshId;

/// A node of a detached subtree
///
/// `material` indexes into the owning [`Subtree::materials`], so several
/// nodes can point at the same material before it is registered.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    /// Display name, usually from the source file
    pub name: Option<String>,
    /// Local transform relative to the parent node
    pub transform: Transform,
    /// Geometry drawn at this node
    pub mesh: Option<MeshId>,
    /// Index into the subtree material list
    pub material: Option<usize>,
    /// Child nodes in source order
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create an empty transform node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach geometry and a material slot
    pub fn with_mesh(mut self, mesh: MeshId, material: Option<usize>) -> Self {
        self.mesh = Some(mesh);
        self.material = material;
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this tree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

/// A loaded hierarchy together with the resources its nodes refer to
#[derive(Debug, Clone, Default)]
pub struct Subtree {
    /// Root of the node tree
    pub root: SceneNode,
    /// Materials referenced by index from the nodes
    pub materials: Vec<Material>,
    /// Geometry to upload before the nodes are drawn
    pub meshes: Vec<(MeshId, Mesh)>,
}

impl Subtree {
    /// Wrap a bare node tree without materials or meshes
    pub fn from_root(root: SceneNode) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    /// Number of nodes that will be created by attaching this subtree
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}
