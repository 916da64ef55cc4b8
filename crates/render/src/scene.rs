//! Scene renderer: GPU-side scene state and the frame walk.
//!
//! [`SceneRenderer::setup`] takes a populated [`World`] and turns it into
//! GPU state in one sweep: geometry is merged and uploaded, constant
//! buffers are sized to the population, descriptor tables are allocated
//! from one exact-fit pool and written, pipelines are built, and draws are
//! grouped by shading model. The sweep ends by flushing the dirty flags
//! every population call seeded, so the first frame needs no special path.
//!
//! After setup each frame is two calls: [`SceneRenderer::update`] advances
//! animation and rewrites only flagged constant slots, and
//! [`SceneRenderer::draw`] records the fixed pass walk into a
//! [`FrameContext`] and submits it.

use std::path::PathBuf;
use std::sync::Arc;

use ember_resources::{
    GeometryRange, MergedGeometry, MeshData, ObjectConstants, PassConstants, ShadingModel,
    SkinnedConstants, merge_geometry,
};
use ember_rhi::buffer::{Buffer, BufferUsage};
use ember_rhi::command::CommandBuffer;
use ember_rhi::device::Device;
use ember_rhi::vertex::ParticleVertex;
use ember_rhi::{RhiResult, vk};
use ember_scene::{MaterialHandle, MeshRenderer, ObjectId, SkinnedInstanceId, World};
use tracing::{debug, info};

use crate::binding::{SamplerSet, SceneDescriptors, SceneLayouts, SceneShape};
use crate::error::{RenderError, RenderResult};
use crate::frame::FrameContext;
use crate::frame_resources::{FrameResourcePlan, FrameResources, MAIN_PASS, SHADOW_PASS};
use crate::graph::RenderGraph;
use crate::pipelines::{
    OBJECT_SET, PASS_SET, PipelineLayouts, SKINNED_SET, ScenePipelines, ShaderCatalog,
};
use crate::shadow::{BoundingSphere, ShadowVolume};

/// Sky sphere dimensions. The radius only has to beat the far geometry;
/// the vertex shader pins the sphere to the far plane.
const SKY_SPHERE_RADIUS: f32 = 100.0;
const SKY_SPHERE_SLICES: u32 = 32;
const SKY_SPHERE_STACKS: u32 = 16;

/// Renderer construction parameters.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Directory holding the compiled SPIR-V modules.
    pub shader_dir: PathBuf,
    /// Allocate the combined-image-sampler table an external post or UI
    /// pass uses to sample the scene color target.
    pub output_sampling: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            shader_dir: PathBuf::from("shaders"),
            output_sampling: true,
        }
    }
}

/// One recorded draw of a static mesh.
#[derive(Clone, Copy, Debug)]
struct StaticDraw {
    object: ObjectId,
    material: MaterialHandle,
    range: GeometryRange,
}

/// One recorded draw of a skinned mesh.
#[derive(Clone, Copy, Debug)]
struct SkinnedDraw {
    object: ObjectId,
    material: MaterialHandle,
    instance: SkinnedInstanceId,
    range: GeometryRange,
}

/// One particle layer's slice of the shared vertex buffer, rebuilt every
/// update.
#[derive(Clone, Copy, Debug)]
struct ParticleDraw {
    object: ObjectId,
    material: MaterialHandle,
    first_vertex: u32,
    vertex_count: u32,
    additive: bool,
}

/// Everything `setup` built for the current scene.
struct SceneState {
    shape: SceneShape,
    static_vertices: Option<Buffer>,
    skinned_vertices: Option<Buffer>,
    indices: Option<Buffer>,
    particle_vertices: Option<Buffer>,
    frame: FrameResources,
    descriptors: SceneDescriptors,
    pipelines: ScenePipelines,
    static_draws: [Vec<StaticDraw>; 3],
    skinned_draws: [Vec<SkinnedDraw>; 3],
    particle_draws: Vec<ParticleDraw>,
    skybox_range: Option<GeometryRange>,
    bounds: BoundingSphere,
}

/// Owns the render graph and the GPU state of one uploaded scene.
pub struct SceneRenderer {
    device: Arc<Device>,
    config: RendererConfig,
    graph: RenderGraph,
    layouts: SceneLayouts,
    pipeline_layouts: PipelineLayouts,
    samplers: SamplerSet,
    shaders: ShaderCatalog,
    state: Option<SceneState>,
}

impl SceneRenderer {
    /// Creates the render graph and the scene-independent objects.
    ///
    /// Shaders are loaded here so a missing file fails construction, not
    /// the first upload.
    ///
    /// # Errors
    ///
    /// Returns an error if target, layout, sampler or shader creation
    /// fails.
    pub fn new(device: Arc<Device>, config: RendererConfig) -> RenderResult<Self> {
        let graph = RenderGraph::new(device.clone(), config.width, config.height)?;
        let layouts = SceneLayouts::new(&device)?;
        let pipeline_layouts = PipelineLayouts::new(&device, &layouts)?;
        let samplers = SamplerSet::new(&device)?;
        let shaders = ShaderCatalog::load(&device, &config.shader_dir)?;

        Ok(Self {
            device,
            config,
            graph,
            layouts,
            pipeline_layouts,
            samplers,
            shaders,
            state: None,
        })
    }

    /// Uploads the world to the GPU and prepares every pass.
    ///
    /// Population must be complete before this call; afterwards only
    /// transforms, material parameters, animation and lights may change.
    /// Calling it again replaces the previous scene after the device goes
    /// idle.
    ///
    /// # Errors
    ///
    /// Returns an error if any allocation or pipeline build fails. The
    /// previous scene, if any, stays active on failure.
    pub fn setup(&mut self, world: &mut World) -> RenderResult<()> {
        if self.state.is_some() {
            self.device.wait_idle()?;
        }

        let has_skybox = world.skybox().is_some();
        let mut static_meshes = world.static_meshes().to_vec();

        // Shadow bounds come from placed geometry, before the sky sphere
        // is appended.
        let bounds = Self::compute_bounds(world);

        let skybox_mesh = has_skybox.then(|| {
            static_meshes.push(MeshData::sphere(
                SKY_SPHERE_RADIUS,
                SKY_SPHERE_SLICES,
                SKY_SPHERE_STACKS,
            ));
            static_meshes.len() - 1
        });

        let merged = merge_geometry(&static_meshes, world.skinned_meshes());
        let static_vertices = Self::upload(
            &self.device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&merged.static_vertices),
        )?;
        let skinned_vertices = Self::upload(
            &self.device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&merged.skinned_vertices),
        )?;
        let indices = Self::upload(
            &self.device,
            BufferUsage::Index,
            bytemuck::cast_slice(&merged.indices),
        )?;

        let particle_capacity: usize = world
            .particle_systems()
            .iter()
            .map(|s| s.max_vertices())
            .sum();
        let particle_vertices = if particle_capacity > 0 {
            Some(Buffer::new(
                self.device.clone(),
                BufferUsage::Vertex,
                (particle_capacity * std::mem::size_of::<ParticleVertex>()) as vk::DeviceSize,
            )?)
        } else {
            None
        };

        let plan = FrameResourcePlan::for_scene(
            world.object_count(),
            world.material_count(),
            world.skinned_count(),
        );
        let frame = FrameResources::new(&self.device, plan)?;

        let shape = SceneShape {
            objects: world.object_count(),
            materials: world.material_count(),
            skinned: world.skinned_count(),
            has_skybox,
            has_post: self.config.output_sampling,
        };
        let descriptors = SceneDescriptors::new(&self.device, &self.layouts, shape)?;

        if let Some(buffer) = frame.objects() {
            descriptors.write_object_tables(&self.device, buffer);
        }
        if let Some(buffer) = frame.materials() {
            descriptors.write_material_tables(&self.device, buffer, world.materials(), &self.samplers);
        }
        descriptors.write_pass_tables(&self.device, frame.pass());
        descriptors.write_shadow_table(
            &self.device,
            self.samplers.shadow_comparison(),
            self.graph.shadow_map_view(),
        );
        descriptors.write_gbuffer_table(&self.device, self.graph.gbuffer_views());
        if let Some(buffer) = frame.skinned() {
            descriptors.write_skinned_tables(&self.device, buffer);
        }
        if let Some(view) = world.skybox() {
            descriptors.write_skybox_table(&self.device, self.samplers.linear_repeat(), view);
        }
        descriptors.write_post_table(
            &self.device,
            self.samplers.linear_border(),
            self.graph.scene_color_view(),
        );

        let pipelines =
            ScenePipelines::new(&self.device, &self.shaders, &self.pipeline_layouts, &self.graph)?;

        let (static_draws, skinned_draws) = Self::group_draws(world, &merged);

        let mut state = SceneState {
            shape,
            static_vertices,
            skinned_vertices,
            indices,
            particle_vertices,
            frame,
            descriptors,
            pipelines,
            static_draws,
            skinned_draws,
            particle_draws: Vec::new(),
            skybox_range: skybox_mesh.map(|i| merged.static_ranges[i]),
            bounds,
        };

        // Population left every object and material flagged, so the seed
        // write is the ordinary dirty flush.
        Self::write_pass_constants(&state, world)?;
        Self::write_dirty_scene_data(&state, world)?;
        Self::write_skinned_poses(&state, world)?;
        Self::write_particles(&mut state, world)?;

        info!(
            objects = shape.objects,
            materials = shape.materials,
            skinned = shape.skinned,
            static_vertices = merged.static_vertices.len(),
            indices = merged.indices.len(),
            "scene uploaded"
        );
        self.state = Some(state);
        Ok(())
    }

    /// Advances animation and rewrites the constant slots that changed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SetupRequired`] before the first `setup`, or
    /// a device error if a buffer write fails.
    pub fn update(&mut self, world: &mut World, dt: f32) -> RenderResult<()> {
        let state = self.state.as_mut().ok_or(RenderError::SetupRequired)?;

        world.advance_animations(dt);
        world.advance_particles(dt);

        Self::write_pass_constants(state, world)?;
        Self::write_dirty_scene_data(state, world)?;
        Self::write_skinned_poses(state, world)?;
        Self::write_particles(state, world)?;
        Ok(())
    }

    /// Records the full pass walk and submits it, blocking until the GPU
    /// finishes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SetupRequired`] before the first `setup`, or
    /// a device error from recording or submission.
    pub fn draw(&self, ctx: &mut FrameContext) -> RenderResult<()> {
        let state = self.state.as_ref().ok_or(RenderError::SetupRequired)?;

        ctx.begin()?;
        self.record_shadow_pass(ctx.command_buffer(), state);
        self.record_deferred_pass(ctx.command_buffer(), state);
        self.record_forward_pass(ctx.command_buffer(), state);
        ctx.submit_and_wait()?;
        Ok(())
    }

    /// Resizes the window-sized targets and repoints the affected tables.
    ///
    /// The caller must not have a frame in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if target recreation fails.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.device.wait_idle()?;
        self.graph.resize(width, height)?;

        if let Some(state) = self.state.as_ref() {
            state
                .descriptors
                .write_gbuffer_table(&self.device, self.graph.gbuffer_views());
            state.descriptors.write_post_table(
                &self.device,
                self.samplers.linear_border(),
                self.graph.scene_color_view(),
            );
        }
        Ok(())
    }

    /// Returns the render graph, for external passes that sample or
    /// extend the output.
    #[inline]
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    /// Returns the post-input table, when output sampling was configured
    /// and a scene is uploaded.
    pub fn post_input_set(&self) -> Option<vk::DescriptorSet> {
        self.state.as_ref().and_then(|s| s.descriptors.post_set())
    }

    /// Returns whether a scene is currently uploaded.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    // ===== Per-frame writes =====

    fn write_pass_constants(state: &SceneState, world: &World) -> RenderResult<()> {
        let volume = ShadowVolume::compute(state.bounds, world.lights.primary_direction());
        let lights = world.lights.packed();

        let main = PassConstants {
            view: world.camera.view_matrix(),
            proj: world.camera.projection_matrix(),
            shadow_transform: volume.transform,
            eye_pos: world.camera.eye_position(),
            ambient_light: world.lights.ambient,
            lights,
        };
        state
            .frame
            .pass()
            .write(MAIN_PASS, std::slice::from_ref(&main))?;

        let shadow = PassConstants {
            view: volume.view,
            proj: volume.proj,
            shadow_transform: volume.transform,
            eye_pos: volume.eye.extend(1.0),
            ambient_light: world.lights.ambient,
            lights,
        };
        state
            .frame
            .pass()
            .write(SHADOW_PASS, std::slice::from_ref(&shadow))?;
        Ok(())
    }

    fn write_dirty_scene_data(state: &SceneState, world: &mut World) -> RenderResult<()> {
        let dirty_objects = world.take_dirty_objects();
        if !dirty_objects.is_empty()
            && let Some(buffer) = state.frame.objects()
        {
            for id in &dirty_objects {
                let constants = ObjectConstants::new(world.world_matrix(*id));
                buffer.write(id.index(), std::slice::from_ref(&constants))?;
            }
            debug!(count = dirty_objects.len(), "rewrote dirty object slots");
        }

        let dirty_materials = world.take_dirty_materials();
        if !dirty_materials.is_empty()
            && let Some(buffer) = state.frame.materials()
        {
            for handle in &dirty_materials {
                let constants = world.material(*handle).constants();
                buffer.write(handle.index(), std::slice::from_ref(&constants))?;
            }
            debug!(count = dirty_materials.len(), "rewrote dirty material slots");
        }
        Ok(())
    }

    fn write_skinned_poses(state: &SceneState, world: &World) -> RenderResult<()> {
        let Some(buffer) = state.frame.skinned() else {
            return Ok(());
        };

        // 64 KiB per element; keep one scratch block off the stack.
        let mut constants = Box::new(SkinnedConstants::default());
        for (index, instance) in world.skinned_instances().iter().enumerate() {
            *constants = SkinnedConstants::default();
            constants.set_bones(instance.pose());
            buffer.write(index, std::slice::from_ref(constants.as_ref()))?;
        }
        Ok(())
    }

    fn write_particles(state: &mut SceneState, world: &World) -> RenderResult<()> {
        state.particle_draws.clear();
        let Some(buffer) = state.particle_vertices.as_ref() else {
            return Ok(());
        };

        let stride = std::mem::size_of::<ParticleVertex>();
        let mut cursor = 0usize;
        for system in world.particle_systems() {
            // The sub layer draws before the primary layer.
            let layers = [(system.sub(), false), (Some(system.primary()), true)];
            for (emitter, additive) in layers {
                let Some(emitter) = emitter else { continue };
                let vertices = emitter.vertices();
                if vertices.is_empty() {
                    continue;
                }

                buffer.write_data(
                    (cursor * stride) as vk::DeviceSize,
                    bytemuck::cast_slice(vertices),
                )?;
                state.particle_draws.push(ParticleDraw {
                    object: system.object(),
                    material: system.material(),
                    first_vertex: cursor as u32,
                    vertex_count: vertices.len() as u32,
                    additive,
                });
                cursor += vertices.len();
            }
        }
        Ok(())
    }

    // ===== Recording =====

    fn record_shadow_pass(&self, cmd: &CommandBuffer, state: &SceneState) {
        self.graph.begin_shadow(cmd);
        cmd.set_viewport(&self.graph.shadow_viewport());
        cmd.set_scissor(&self.graph.shadow_scissor());

        let layout = self.pipeline_layouts.scene();
        cmd.bind_descriptor_sets(layout, PASS_SET, &[state.descriptors.pass_set(SHADOW_PASS)]);

        if Self::has_draws(&state.static_draws)
            && let (Some(vertices), Some(indices)) =
                (state.static_vertices.as_ref(), state.indices.as_ref())
        {
            cmd.bind_pipeline(state.pipelines.shadow_static());
            cmd.bind_vertex_buffers(0, &[vertices.handle()], &[0]);
            cmd.bind_index_buffer(indices.handle(), 0, vk::IndexType::UINT32);
            for draw in state.static_draws.iter().flatten() {
                cmd.bind_descriptor_sets(
                    layout,
                    OBJECT_SET,
                    &[state.descriptors.object_set(draw.object.index())],
                );
                Self::draw_range(cmd, draw.range);
            }
        }

        if Self::has_draws(&state.skinned_draws)
            && let (Some(vertices), Some(indices)) =
                (state.skinned_vertices.as_ref(), state.indices.as_ref())
        {
            cmd.bind_pipeline(state.pipelines.shadow_skinned());
            cmd.bind_vertex_buffers(0, &[vertices.handle()], &[0]);
            cmd.bind_index_buffer(indices.handle(), 0, vk::IndexType::UINT32);
            for draw in state.skinned_draws.iter().flatten() {
                cmd.bind_descriptor_sets(
                    layout,
                    OBJECT_SET,
                    &[state.descriptors.object_set(draw.object.index())],
                );
                cmd.bind_descriptor_sets(
                    layout,
                    SKINNED_SET,
                    &[state.descriptors.skinned_set(draw.instance.index())],
                );
                Self::draw_range(cmd, draw.range);
            }
        }

        cmd.end_render_pass();
    }

    fn record_deferred_pass(&self, cmd: &CommandBuffer, state: &SceneState) {
        self.graph.begin_deferred(cmd);
        cmd.set_viewport(&self.graph.main_viewport());
        cmd.set_scissor(&self.graph.main_scissor());

        let layout = self.pipeline_layouts.scene();
        if Self::has_draws(&state.static_draws)
            && let (Some(vertices), Some(indices)) =
                (state.static_vertices.as_ref(), state.indices.as_ref())
        {
            cmd.bind_descriptor_sets(
                layout,
                PASS_SET,
                &[
                    state.descriptors.pass_set(MAIN_PASS),
                    state.descriptors.shadow_set(),
                ],
            );
            cmd.bind_vertex_buffers(0, &[vertices.handle()], &[0]);
            cmd.bind_index_buffer(indices.handle(), 0, vk::IndexType::UINT32);

            for model in ShadingModel::ALL {
                let draws = &state.static_draws[model as usize];
                if draws.is_empty() {
                    continue;
                }
                cmd.bind_pipeline(state.pipelines.gbuffer(model));
                for draw in draws {
                    cmd.bind_descriptor_sets(
                        layout,
                        OBJECT_SET,
                        &[
                            state.descriptors.object_set(draw.object.index()),
                            state.descriptors.material_set(draw.material.index()),
                        ],
                    );
                    Self::draw_range(cmd, draw.range);
                }
            }
        }

        cmd.next_subpass();

        // Fullscreen resolve; the strip comes out of the vertex shader.
        cmd.bind_pipeline(state.pipelines.lighting());
        cmd.bind_descriptor_sets(
            self.pipeline_layouts.lighting(),
            0,
            &[
                state.descriptors.gbuffer_set(),
                state.descriptors.pass_set(MAIN_PASS),
                state.descriptors.shadow_set(),
            ],
        );
        cmd.draw(4, 1, 0, 0);

        cmd.end_render_pass();
    }

    fn record_forward_pass(&self, cmd: &CommandBuffer, state: &SceneState) {
        self.graph.begin_forward(cmd);
        cmd.set_viewport(&self.graph.main_viewport());
        cmd.set_scissor(&self.graph.main_scissor());

        let layout = self.pipeline_layouts.scene();

        if Self::has_draws(&state.skinned_draws)
            && let (Some(vertices), Some(indices)) =
                (state.skinned_vertices.as_ref(), state.indices.as_ref())
        {
            cmd.bind_descriptor_sets(
                layout,
                PASS_SET,
                &[
                    state.descriptors.pass_set(MAIN_PASS),
                    state.descriptors.shadow_set(),
                ],
            );
            cmd.bind_vertex_buffers(0, &[vertices.handle()], &[0]);
            cmd.bind_index_buffer(indices.handle(), 0, vk::IndexType::UINT32);

            for model in ShadingModel::ALL {
                let draws = &state.skinned_draws[model as usize];
                if draws.is_empty() {
                    continue;
                }
                cmd.bind_pipeline(state.pipelines.forward_skinned(model));
                for draw in draws {
                    cmd.bind_descriptor_sets(
                        layout,
                        OBJECT_SET,
                        &[
                            state.descriptors.object_set(draw.object.index()),
                            state.descriptors.material_set(draw.material.index()),
                        ],
                    );
                    cmd.bind_descriptor_sets(
                        layout,
                        SKINNED_SET,
                        &[state.descriptors.skinned_set(draw.instance.index())],
                    );
                    Self::draw_range(cmd, draw.range);
                }
            }
        }

        if let (Some(range), Some(set), Some(vertices), Some(indices)) = (
            state.skybox_range,
            state.descriptors.skybox_set(),
            state.static_vertices.as_ref(),
            state.indices.as_ref(),
        ) {
            cmd.bind_pipeline(state.pipelines.skybox());
            cmd.bind_descriptor_sets(
                self.pipeline_layouts.skybox(),
                0,
                &[set, state.descriptors.pass_set(MAIN_PASS)],
            );
            cmd.bind_vertex_buffers(0, &[vertices.handle()], &[0]);
            cmd.bind_index_buffer(indices.handle(), 0, vk::IndexType::UINT32);
            Self::draw_range(cmd, range);
        }

        if !state.particle_draws.is_empty()
            && let Some(vertices) = state.particle_vertices.as_ref()
        {
            // The skybox bound an incompatible layout, so the shared
            // tables need rebinding.
            cmd.bind_descriptor_sets(
                layout,
                PASS_SET,
                &[
                    state.descriptors.pass_set(MAIN_PASS),
                    state.descriptors.shadow_set(),
                ],
            );
            cmd.bind_vertex_buffers(0, &[vertices.handle()], &[0]);
            for draw in &state.particle_draws {
                let pipeline = if draw.additive {
                    state.pipelines.particle_additive()
                } else {
                    state.pipelines.particle_alpha()
                };
                cmd.bind_pipeline(pipeline);
                cmd.bind_descriptor_sets(
                    layout,
                    OBJECT_SET,
                    &[
                        state.descriptors.object_set(draw.object.index()),
                        state.descriptors.material_set(draw.material.index()),
                    ],
                );
                cmd.draw(draw.vertex_count, 1, draw.first_vertex, 0);
            }
        }

        cmd.end_render_pass();
    }

    // ===== Helpers =====

    fn draw_range(cmd: &CommandBuffer, range: GeometryRange) {
        cmd.draw_indexed(range.index_count, 1, range.start_index, range.base_vertex, 0);
    }

    fn has_draws<T>(groups: &[Vec<T>; 3]) -> bool {
        groups.iter().any(|g| !g.is_empty())
    }

    /// Groups every renderer by its material's shading model.
    ///
    /// Done once at setup; draw order within a group follows spawn order.
    fn group_draws(
        world: &World,
        merged: &MergedGeometry,
    ) -> ([Vec<StaticDraw>; 3], [Vec<SkinnedDraw>; 3]) {
        let mut static_draws: [Vec<StaticDraw>; 3] = Default::default();
        let mut skinned_draws: [Vec<SkinnedDraw>; 3] = Default::default();

        for (id, object) in world.objects() {
            match object.renderer() {
                Some(MeshRenderer::Static { mesh, material }) => {
                    let model = world.material(*material).shading_model();
                    static_draws[model as usize].push(StaticDraw {
                        object: id,
                        material: *material,
                        range: merged.static_ranges[mesh.index()],
                    });
                }
                Some(MeshRenderer::Skinned {
                    mesh,
                    material,
                    instance,
                }) => {
                    let model = world.material(*material).shading_model();
                    skinned_draws[model as usize].push(SkinnedDraw {
                        object: id,
                        material: *material,
                        instance: *instance,
                        range: merged.skinned_ranges[mesh.index()],
                    });
                }
                None => {}
            }
        }

        (static_draws, skinned_draws)
    }

    fn upload(device: &Arc<Device>, usage: BufferUsage, bytes: &[u8]) -> RhiResult<Option<Buffer>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        Buffer::new_with_data(device.clone(), usage, bytes).map(Some)
    }

    /// Fits the shadow bounds around every placed mesh at setup time.
    fn compute_bounds(world: &World) -> BoundingSphere {
        let mut points = Vec::new();
        for (id, object) in world.objects() {
            let Some(renderer) = object.renderer() else {
                continue;
            };
            let matrix = world.world_matrix(id);
            match renderer {
                MeshRenderer::Static { mesh, .. } => {
                    let data = &world.static_meshes()[mesh.index()];
                    points.extend(
                        data.vertices
                            .iter()
                            .map(|v| matrix.transform_point3(v.position)),
                    );
                }
                MeshRenderer::Skinned { mesh, .. } => {
                    let data = &world.skinned_meshes()[mesh.index()];
                    points.extend(
                        data.vertices
                            .iter()
                            .map(|v| matrix.transform_point3(v.position)),
                    );
                }
            }
        }
        BoundingSphere::from_points(points.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_resources::Material;
    use ember_rhi::vertex::Vertex;
    use ember_scene::{SkinnedAnimation, Transform};
    use glam::{Mat4, Vec2, Vec3};

    struct FixedPose(Vec<Mat4>);

    impl SkinnedAnimation for FixedPose {
        fn advance(&mut self, _dt: f32) {}

        fn pose(&self) -> &[Mat4] {
            &self.0
        }
    }

    fn quad(edge: f32) -> MeshData {
        let half = edge * 0.5;
        let corners = [
            Vec3::new(-half, 0.0, -half),
            Vec3::new(half, 0.0, -half),
            Vec3::new(half, 0.0, half),
            Vec3::new(-half, 0.0, half),
        ];
        MeshData::new(
            corners
                .iter()
                .map(|&p| Vertex::new(p, Vec2::ZERO, Vec3::Y, Vec3::X))
                .collect(),
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    fn material(name: &str, model: ShadingModel) -> Material {
        Material::new(name, model, vk::ImageView::null())
    }

    fn populated_world() -> World {
        let mut world = World::new();
        let unlit = world.add_material(material("sky", ShadingModel::Unlit)).unwrap();
        let diffuse = world.add_material(material("stone", ShadingModel::Diffuse)).unwrap();
        let mapped = world
            .add_material(material("brick", ShadingModel::NormalMapped))
            .unwrap();

        let mesh = world.add_mesh(quad(1.0));
        let other = world.add_mesh(quad(2.0));
        let skinned_mesh = world.add_skinned_mesh(Default::default());

        let a = world.spawn("a", Transform::default(), None).unwrap();
        let b = world.spawn("b", Transform::default(), None).unwrap();
        let c = world.spawn("c", Transform::default(), None).unwrap();
        world.attach_static_mesh(a, mesh, diffuse);
        world.attach_static_mesh(b, other, mapped);
        world.attach_static_mesh(c, mesh, unlit);

        let d = world.spawn("d", Transform::default(), None).unwrap();
        world
            .attach_skinned_mesh(
                d,
                skinned_mesh,
                diffuse,
                Box::new(FixedPose(vec![Mat4::IDENTITY])),
            )
            .unwrap();

        // An object without a renderer draws nothing
        world.spawn("rig", Transform::default(), None).unwrap();
        world
    }

    #[test]
    fn test_grouping_covers_each_renderer_once() {
        let world = populated_world();
        let merged = merge_geometry(world.static_meshes(), world.skinned_meshes());

        let (static_draws, skinned_draws) = SceneRenderer::group_draws(&world, &merged);

        let static_total: usize = static_draws.iter().map(Vec::len).sum();
        let skinned_total: usize = skinned_draws.iter().map(Vec::len).sum();
        assert_eq!(static_total, 3);
        assert_eq!(skinned_total, 1);

        let mut seen = std::collections::HashSet::new();
        for draw in static_draws.iter().flatten() {
            assert!(seen.insert(draw.object));
        }
        for draw in skinned_draws.iter().flatten() {
            assert!(seen.insert(draw.object));
        }
    }

    #[test]
    fn test_grouping_matches_material_model() {
        let world = populated_world();
        let merged = merge_geometry(world.static_meshes(), world.skinned_meshes());

        let (static_draws, skinned_draws) = SceneRenderer::group_draws(&world, &merged);

        for model in ShadingModel::ALL {
            for draw in &static_draws[model as usize] {
                assert_eq!(world.material(draw.material).shading_model(), model);
            }
            for draw in &skinned_draws[model as usize] {
                assert_eq!(world.material(draw.material).shading_model(), model);
            }
        }
    }

    #[test]
    fn test_grouped_ranges_follow_mesh_handles() {
        let world = populated_world();
        let merged = merge_geometry(world.static_meshes(), world.skinned_meshes());

        let (static_draws, _) = SceneRenderer::group_draws(&world, &merged);

        // Object "b" draws the second registered mesh
        let b = world.object_id("b").unwrap();
        let draw = static_draws
            .iter()
            .flatten()
            .find(|d| d.object == b)
            .unwrap();
        assert_eq!(draw.range, merged.static_ranges[1]);
    }

    #[test]
    fn test_bounds_cover_placed_geometry() {
        let mut world = populated_world();
        let far = world
            .spawn("far", Transform::from_position(Vec3::new(50.0, 0.0, 0.0)), None)
            .unwrap();
        let mesh = world.add_mesh(quad(1.0));
        let handle = world.material_handle("stone").unwrap();
        world.attach_static_mesh(far, mesh, handle);

        let bounds = SceneRenderer::compute_bounds(&world);

        // The displaced quad stretches the sphere; the origin cluster stays
        // inside it.
        assert!(bounds.center.distance(Vec3::new(50.0, 0.0, 0.0)) < bounds.radius + 0.71);
        assert!(bounds.center.length() < bounds.radius + 1e-3);
        assert!(bounds.radius > 20.0);
    }

    #[test]
    fn test_has_draws() {
        let empty: [Vec<u32>; 3] = Default::default();
        assert!(!SceneRenderer::has_draws(&empty));

        let mut groups = empty;
        groups[2].push(1);
        assert!(SceneRenderer::has_draws(&groups));
    }

    #[test]
    fn test_config_default() {
        let config = RendererConfig::default();
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert!(config.output_sampling);
        assert_eq!(config.shader_dir, PathBuf::from("shaders"));
    }
}
