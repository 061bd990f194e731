//! Main renderer implementation
//!
//! The Renderer owns the window surface and every GPU resource derived from
//! the scene: uploaded meshes, one uniform buffer per material and per drawn
//! node, the shadow map and the environment cubemap. A frame is a shadow
//! pass from the directional light followed by the skybox and the lit meshes.

use crate::assets::CubemapImage;
use crate::core::camera::Camera;
use crate::core::entity::{Entity, GlobalTransform, World};
use crate::core::light::DirectionalLight;
use crate::graphics::{
    context::{RenderContext, RenderContextError},
    environment::EnvironmentMap,
    material::{Material, MaterialHandle, MaterialLibrary, MaterialRef, MaterialUniform},
    mesh::Mesh,
    pipeline::{
        BindGroupLayouts, DepthTexture, MultisampleTarget, Pipelines, ShadowMap, DEPTH_FORMAT,
    },
    settings::RendererSettings,
    uniform::{FrameLight, FrameUniform, ObjectUniform, ShadowUniform, UniformBuffer},
};
use crate::render_loop::{FrameError, FrameRenderer};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, trace};
use wgpu::util::DeviceExt;

/// Component to associate an entity with uploaded geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MeshId(pub String);

/// GPU resources for a mesh
struct MeshGpuData {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

/// A uniform buffer with the bind group that exposes it
struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new<U: UniformBuffer>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        data: &U,
        label: &str,
    ) -> Self {
        let buffer = data.create_buffer(device, Some(label));
        let bind_group = BindGroupLayouts::uniform_bind_group(device, layout, &buffer, label);
        Self { buffer, bind_group }
    }
}

struct DrawItem {
    entity: Entity,
    mesh: MeshId,
    material: Option<MaterialHandle>,
    casts_shadow: bool,
}

/// Main renderer that manages all rendering operations
pub struct Renderer {
    context: Arc<RenderContext>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    pipelines: Pipelines,
    sample_count: u32,
    msaa_target: Option<MultisampleTarget>,
    depth_texture: DepthTexture,
    shadow_map: ShadowMap,
    environment: EnvironmentMap,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_uniform: UniformSlot,
    meshes: HashMap<MeshId, MeshGpuData>,
    materials: HashMap<MaterialHandle, UniformSlot>,
    fallback_material: UniformSlot,
    objects: HashMap<Entity, UniformSlot>,
}

impl Renderer {
    /// Create a renderer presenting to `surface` at the given drawable size
    pub fn new(
        context: Arc<RenderContext>,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        settings: &RendererSettings,
    ) -> Result<Self, RenderContextError> {
        info!(width, height, "Initializing renderer");
        let device = &context.device;

        let surface_config =
            context.surface_configuration(&surface, width, height, settings.srgb_output)?;
        surface.configure(device, &surface_config);

        let (width, height) = (surface_config.width, surface_config.height);
        let sample_count =
            context.sample_count(surface_config.format, DEPTH_FORMAT, settings.msaa_samples);
        let pipelines = Pipelines::new(device, surface_config.format, sample_count);
        let msaa_target =
            MultisampleTarget::new(device, surface_config.format, width, height, sample_count);
        let depth_texture = DepthTexture::new(device, width, height, sample_count);
        let shadow_map = ShadowMap::new(device, 1024);
        let environment = EnvironmentMap::placeholder(device, &context.queue);

        let frame_buffer = FrameUniform::default().create_buffer(device, Some("Frame Uniform"));
        let frame_bind_group = pipelines.layouts.frame_bind_group(
            device,
            &frame_buffer,
            &environment.view,
            &environment.sampler,
            &shadow_map,
        );
        let shadow_uniform = UniformSlot::new(
            device,
            &pipelines.layouts.shadow,
            &ShadowUniform::default(),
            "Shadow Uniform",
        );
        let fallback_material = UniformSlot::new(
            device,
            &pipelines.layouts.material,
            &MaterialUniform::from(&Material::default()),
            "Fallback Material",
        );

        Ok(Self {
            context,
            surface,
            surface_config,
            pipelines,
            sample_count,
            msaa_target,
            depth_texture,
            shadow_map,
            environment,
            frame_buffer,
            frame_bind_group,
            shadow_uniform,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            fallback_material,
            objects: HashMap::new(),
        })
    }

    /// Shared GPU context
    pub fn context(&self) -> &Arc<RenderContext> {
        &self.context
    }

    /// Format of the presented surface
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Samples per pixel of the scene pass
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Current drawable size
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Resize the drawable surface; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
        let device = &self.context.device;
        self.msaa_target = MultisampleTarget::new(
            device,
            self.surface_config.format,
            width,
            height,
            self.sample_count,
        );
        self.depth_texture = DepthTexture::new(device, width, height, self.sample_count);
        debug!(width, height, "Renderer resized");
    }

    /// Reconfigure the surface after it was lost or outdated
    pub fn reconfigure(&mut self) {
        self.surface
            .configure(&self.context.device, &self.surface_config);
    }

    /// Upload a mesh to the GPU under `id`, replacing any previous upload
    pub fn upload_mesh(&mut self, id: &MeshId, mesh: &Mesh) {
        let device = &self.context.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", id.0)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", id.0)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.meshes.insert(
            id.clone(),
            MeshGpuData {
                vertex_buffer,
                index_buffer,
                num_indices: mesh.indices.len() as u32,
            },
        );
        debug!(
            mesh = %id.0,
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "Uploaded mesh to GPU"
        );
    }

    /// Whether geometry has been uploaded for `id`
    pub fn has_mesh(&self, id: &MeshId) -> bool {
        self.meshes.contains_key(id)
    }

    /// Replace the environment cubemap used for the background and lighting
    pub fn set_environment(&mut self, cubemap: &CubemapImage) {
        self.environment =
            EnvironmentMap::from_cubemap(&self.context.device, &self.context.queue, cubemap);
        self.rebuild_frame_bind_group();
    }

    fn rebuild_frame_bind_group(&mut self) {
        self.frame_bind_group = self.pipelines.layouts.frame_bind_group(
            &self.context.device,
            &self.frame_buffer,
            &self.environment.view,
            &self.environment.sampler,
            &self.shadow_map,
        );
    }

    /// Upload dirty materials and clear their `needs_update` flag.
    ///
    /// Returns the number of material uniforms written.
    pub fn sync_materials(&mut self, library: &mut MaterialLibrary) -> usize {
        let mut written = 0;
        let mut live = HashSet::new();

        for (handle, material) in library.iter_mut() {
            live.insert(handle);
            let uniform = MaterialUniform::from(&*material);
            match self.materials.get(&handle) {
                Some(slot) if material.needs_update() => {
                    uniform.update_buffer(&self.context.queue, &slot.buffer);
                    written += 1;
                }
                Some(_) => {}
                None => {
                    let slot = UniformSlot::new(
                        &self.context.device,
                        &self.pipelines.layouts.material,
                        &uniform,
                        "Material Uniform",
                    );
                    self.materials.insert(handle, slot);
                    written += 1;
                }
            }
            material.clear_dirty();
        }

        self.materials.retain(|handle, _| live.contains(handle));
        if written > 0 {
            debug!(written, "Material uniforms uploaded");
        }
        written
    }

    fn frame_light(&mut self, world: &World) -> Option<FrameLight> {
        let mut query = world.query::<(&DirectionalLight, &GlobalTransform)>();
        let (_, (light, transform)) = query.iter().next()?;

        if light.shadow.map_size.max(1) != self.shadow_map.size {
            self.shadow_map = ShadowMap::new(&self.context.device, light.shadow.map_size);
            self.rebuild_frame_bind_group();
            info!(size = self.shadow_map.size, "Shadow map resized");
        }

        let position = transform.position();
        Some(FrameLight {
            direction: light.direction(position),
            radiance: light.color * light.intensity,
            view_proj: light.shadow_view_projection(position),
            shadow_map_size: self.shadow_map.size,
            casts_shadow: light.shadow.cast,
        })
    }

    fn collect_draws(&mut self, world: &World) -> Vec<DrawItem> {
        let mut draws = Vec::new();
        for entity in world.traverse() {
            let Ok(mesh) = world.get::<MeshId>(entity) else {
                continue;
            };
            if !self.meshes.contains_key(&*mesh) {
                trace!(mesh = %mesh.0, "Mesh not uploaded yet");
                continue;
            }
            let model = world
                .get::<GlobalTransform>(entity)
                .map(|transform| transform.matrix)
                .unwrap_or(Mat4::IDENTITY);
            let material = world.get::<MaterialRef>(entity).ok().map(|m| m.0);
            let casts_shadow = material
                .and_then(|handle| world.materials().get(handle))
                .is_some_and(Material::casts_shadow);

            let uniform = ObjectUniform::new(model);
            match self.objects.get(&entity) {
                Some(slot) => uniform.update_buffer(&self.context.queue, &slot.buffer),
                None => {
                    let slot = UniformSlot::new(
                        &self.context.device,
                        &self.pipelines.layouts.object,
                        &uniform,
                        "Object Uniform",
                    );
                    self.objects.insert(entity, slot);
                }
            }

            draws.push(DrawItem {
                entity,
                mesh: (*mesh).clone(),
                material,
                casts_shadow,
            });
        }

        let drawn: HashSet<Entity> = draws.iter().map(|draw| draw.entity).collect();
        self.objects.retain(|entity, _| drawn.contains(entity));
        draws
    }

    /// Render one frame, letting `overlay` record extra commands into the
    /// same target before it is presented
    pub fn render_frame_with<F>(
        &mut self,
        world: &mut World,
        settings: &RendererSettings,
        overlay: F,
    ) -> Result<(), FrameError>
    where
        F: FnOnce(&RenderContext, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.sync_materials(world.materials_mut());
        let world: &World = world;

        let (camera, camera_transform) = {
            let mut query = world.query::<(&Camera, &GlobalTransform)>();
            let (_, (camera, transform)) = query.iter().next().ok_or(FrameError::MissingCamera)?;
            (*camera, *transform)
        };
        let light = self.frame_light(world);
        let draws = self.collect_draws(world);

        let encode_srgb = settings.srgb_output && !self.surface_config.format.is_srgb();
        let frame_uniform = FrameUniform::new(
            camera.view_projection(&camera_transform),
            Camera::eye_position(&camera_transform),
            light.as_ref(),
            settings,
            encode_srgb,
        );
        frame_uniform.update_buffer(&self.context.queue, &self.frame_buffer);

        let shadow_pass = light
            .as_ref()
            .filter(|light| settings.shadows.enabled && light.casts_shadow);
        if let Some(light) = shadow_pass {
            ShadowUniform::new(light.view_proj)
                .update_buffer(&self.context.queue, &self.shadow_uniform.buffer);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_command_encoder(Some("Frame Encoder"));

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if shadow_pass.is_some() {
                pass.set_pipeline(&self.pipelines.shadow);
                pass.set_bind_group(0, &self.shadow_uniform.bind_group, &[]);
                for draw in draws.iter().filter(|draw| draw.casts_shadow) {
                    let mesh = &self.meshes[&draw.mesh];
                    pass.set_bind_group(1, &self.objects[&draw.entity].bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
                }
            }
        }

        // Multisampled scenes resolve into the surface; only the resolve is kept
        let scene_attachment = match &self.msaa_target {
            Some(target) => wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: Some(&view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Discard,
                },
            },
            None => wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            },
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(scene_attachment)],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_pipeline(&self.pipelines.skybox);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.draw(0..3, 0..1);

            pass.set_pipeline(&self.pipelines.lit);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for draw in &draws {
                let mesh = &self.meshes[&draw.mesh];
                let material = draw
                    .material
                    .and_then(|handle| self.materials.get(&handle))
                    .unwrap_or(&self.fallback_material);
                pass.set_bind_group(1, &self.objects[&draw.entity].bind_group, &[]);
                pass.set_bind_group(2, &material.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }
        }

        overlay(&self.context, &mut encoder, &view);

        self.context.submit(std::iter::once(encoder.finish()));
        output.present();
        trace!(draws = draws.len(), "Frame presented");
        Ok(())
    }
}

impl FrameRenderer for Renderer {
    fn render_frame(
        &mut self,
        world: &mut World,
        settings: &RendererSettings,
    ) -> Result<(), FrameError> {
        self.render_frame_with(world, settings, |_, _, _| {})
    }
}
