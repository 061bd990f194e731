//! glTF 2.0 model loading into a detached [`Subtree`]
//!
//! Node hierarchy and transforms are kept as authored. Each mesh primitive
//! becomes its own child node so it can carry its own material. Materials
//! are read from the metallic-roughness factors; textures are not sampled.

use super::AssetError;
use crate::core::entity::{SceneNode, Subtree, Transform};
use crate::graphics::material::{Material, StandardMaterial};
use crate::graphics::mesh::{Mesh, Vertex};
use crate::graphics::renderer::MeshId;
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Load a `.gltf` or `.glb` file
pub fn load_gltf(path: &Path) -> Result<Subtree, AssetError> {
    let gltf_error = |source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    };
    let gltf = gltf::Gltf::open(path).map_err(gltf_error)?;
    let buffers =
        gltf::import_buffers(&gltf.document, path.parent(), gltf.blob).map_err(gltf_error)?;
    let document = gltf.document;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::EmptyDocument(path.to_path_buf()))?;

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    let mut builder = SubtreeBuilder {
        prefix: stem.clone(),
        buffers: &buffers,
        materials: Vec::new(),
        material_slots: HashMap::new(),
        meshes: Vec::new(),
        primitives: HashMap::new(),
    };

    let mut root = SceneNode::new(stem);
    for node in scene.nodes() {
        root.children.push(builder.node(&node)?);
    }

    info!(
        path = ?path,
        nodes = root.node_count(),
        meshes = builder.meshes.len(),
        materials = builder.materials.len(),
        "Loaded glTF model"
    );

    Ok(Subtree {
        root,
        materials: builder.materials,
        meshes: builder.meshes,
    })
}

struct SubtreeBuilder<'a> {
    prefix: String,
    buffers: &'a [gltf::buffer::Data],
    materials: Vec<Material>,
    /// glTF material index (None for the default material) to subtree slot
    material_slots: HashMap<Option<usize>, usize>,
    meshes: Vec<(MeshId, Mesh)>,
    /// glTF mesh index to its primitives
    primitives: HashMap<usize, Vec<(MeshId, usize)>>,
}

impl SubtreeBuilder<'_> {
    fn node(&mut self, node: &gltf::Node) -> Result<SceneNode, AssetError> {
        let (translation, rotation, scale) = node.transform().decomposed();
        let mut scene_node = SceneNode {
            name: node.name().map(str::to_string),
            transform: Transform {
                position: Vec3::from(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from(scale),
            },
            ..Default::default()
        };

        if let Some(mesh) = node.mesh() {
            for (id, material) in self.mesh_primitives(&mesh)? {
                let mut primitive = SceneNode::default().with_mesh(id.clone(), Some(material));
                primitive.name = Some(id.0);
                scene_node.children.push(primitive);
            }
        }

        for child in node.children() {
            scene_node.children.push(self.node(&child)?);
        }
        Ok(scene_node)
    }

    fn mesh_primitives(&mut self, mesh: &gltf::Mesh) -> Result<Vec<(MeshId, usize)>, AssetError> {
        if let Some(cached) = self.primitives.get(&mesh.index()) {
            return Ok(cached.clone());
        }

        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(
                    mesh = mesh.index(),
                    mode = ?primitive.mode(),
                    "Skipping non-triangle primitive"
                );
                continue;
            }
            let id = MeshId(format!(
                "{}#{}/{}",
                self.prefix,
                mesh.index(),
                primitive.index()
            ));
            let geometry = read_primitive(&primitive, self.buffers, &id)?;
            let material = self.material_slot(&primitive.material());
            self.meshes.push((id.clone(), geometry));
            primitives.push((id, material));
        }

        self.primitives.insert(mesh.index(), primitives.clone());
        Ok(primitives)
    }

    fn material_slot(&mut self, material: &gltf::Material) -> usize {
        if let Some(slot) = self.material_slots.get(&material.index()) {
            return *slot;
        }
        let pbr = material.pbr_metallic_roughness();
        let standard = StandardMaterial::new(
            pbr.base_color_factor(),
            pbr.metallic_factor(),
            pbr.roughness_factor(),
        );
        self.materials.push(Material::Standard(standard));
        let slot = self.materials.len() - 1;
        self.material_slots.insert(material.index(), slot);
        slot
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    id: &MeshId,
) -> Result<Mesh, AssetError> {
    let reader = primitive.reader(|buffer| {
        buffers
            .get(buffer.index())
            .map(|data| data.0.as_slice())
    });

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetError::MissingPositions(id.0.clone()))?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().collect());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let normal = normals
                .as_ref()
                .and_then(|normals| normals.get(i).copied())
                .unwrap_or([0.0; 3]);
            let uv = uvs
                .as_ref()
                .and_then(|uvs| uvs.get(i).copied())
                .unwrap_or([0.0; 2]);
            Vertex::new(*position, normal, uv)
        })
        .collect();

    let mut mesh = Mesh::new(vertices, indices);
    if normals.is_none() {
        mesh.compute_normals();
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Two nodes sharing one mesh whose single triangle uses material 0
    fn write_triangle_gltf(dir: &Path) -> std::path::PathBuf {
        let mut bytes: Vec<u8> = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        std::fs::write(dir.join("triangle.bin"), &bytes).unwrap();

        let json = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [ { "nodes": [0] } ],
            "nodes": [
                { "name": "body", "children": [1], "mesh": 0, "translation": [1.0, 2.0, 3.0] },
                { "name": "copy", "mesh": 0 }
            ],
            "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] } ],
            "materials": [ { "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.5, 0.5, 1.0], "metallicFactor": 0.25, "roughnessFactor": 0.75 } } ],
            "buffers": [ { "uri": "triangle.bin", "byteLength": 44 } ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ]
        }"#;
        let path = dir.join("triangle.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_load_triangle_model() {
        let dir = tempdir().unwrap();
        let subtree = load_gltf(&write_triangle_gltf(dir.path())).unwrap();

        // root, body, body primitive, copy, copy primitive
        assert_eq!(subtree.node_count(), 5);
        assert_eq!(subtree.materials.len(), 1);
        assert_eq!(subtree.meshes.len(), 1);

        let body = &subtree.root.children[0];
        assert_eq!(body.name.as_deref(), Some("body"));
        assert_eq!(body.transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.children[0].material, Some(0));

        let (_, mesh) = &subtree.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);

        let material = subtree.materials[0].as_standard().unwrap();
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.roughness, 0.75);
    }

    #[test]
    fn test_shared_mesh_is_read_once() {
        let dir = tempdir().unwrap();
        let subtree = load_gltf(&write_triangle_gltf(dir.path())).unwrap();
        let body = &subtree.root.children[0];
        let copy = &body.children[1];
        assert_eq!(copy.children[0].mesh, body.children[0].mesh);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_gltf(&dir.path().join("nothing.gltf")),
            Err(AssetError::Gltf { .. })
        ));
    }
}
