//! Descriptor demand, set layouts and table writes.
//!
//! Descriptor capacity is computed up front from the scene's population; a
//! single pool is created with exactly that demand and every table is
//! allocated from it at scene upload. Nothing is allocated per frame and the
//! pool never needs `FREE_DESCRIPTOR_SET`.
//!
//! # Set layouts
//!
//! | Table | Binding | Descriptor |
//! |-------------------|---------|------------------------------|
//! | object | 0 | uniform buffer |
//! | material | 0 | uniform buffer |
//! | | 1 | sampler |
//! | | 2 | sampled image (diffuse) |
//! | | 3 | sampled image (secondary) |
//! | pass | 0 | uniform buffer |
//! | shadow sampling | 0 | comparison sampler |
//! | | 1 | sampled image (shadow map) |
//! | skinned | 0 | uniform buffer |
//! | G-buffer input | 0..3 | input attachment |
//! | skybox | 1 | sampler |
//! | | 2 | sampled image (cube) |
//! | post input | 0 | combined image sampler |
//!
//! The skybox table starts at binding 1 so the fragment shader can share
//! register assignments with the material table.

use std::sync::Arc;

use ember_resources::{
    Material, MaterialConstants, ObjectConstants, PassConstants, SamplerKind, SkinnedConstants,
};
use ember_rhi::constant::ConstantBuffer;
use ember_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, image_info,
    update_descriptor_sets,
};
use ember_rhi::device::Device;
use ember_rhi::sampler::Sampler;
use ember_rhi::{RhiResult, vk};
use tracing::debug;

use crate::frame_resources::PASS_BUFFER_COUNT;

/// Scene population the descriptor demand is derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneShape {
    /// Game object count.
    pub objects: usize,
    /// Material count.
    pub materials: usize,
    /// Skinned instance count.
    pub skinned: usize,
    /// Whether a sky sphere is drawn.
    pub has_skybox: bool,
    /// Whether the scene color target is exposed for sampling.
    pub has_post: bool,
}

impl SceneShape {
    /// Computes the exact descriptor demand for this population.
    pub fn demand(&self) -> BindingCounts {
        let o = self.objects as u32;
        let m = self.materials as u32;
        let s = self.skinned as u32;
        let sky = u32::from(self.has_skybox);
        let post = u32::from(self.has_post);

        BindingCounts {
            uniform_buffers: o + m + PASS_BUFFER_COUNT as u32 + s,
            samplers: m + 1 + sky,
            sampled_images: 2 * m + 1 + sky,
            combined_image_samplers: post,
            input_attachments: 4,
            sets: o + m + PASS_BUFFER_COUNT as u32 + s + 2 + sky + post,
        }
    }
}

/// Descriptor counts by type, plus the set total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindingCounts {
    pub uniform_buffers: u32,
    pub samplers: u32,
    pub sampled_images: u32,
    pub combined_image_samplers: u32,
    pub input_attachments: u32,
    pub sets: u32,
}

impl BindingCounts {
    /// Returns the pool sizes for this demand, omitting zero counts.
    pub fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        let entries = [
            (vk::DescriptorType::UNIFORM_BUFFER, self.uniform_buffers),
            (vk::DescriptorType::SAMPLER, self.samplers),
            (vk::DescriptorType::SAMPLED_IMAGE, self.sampled_images),
            (
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                self.combined_image_samplers,
            ),
            (
                vk::DescriptorType::INPUT_ATTACHMENT,
                self.input_attachments,
            ),
        ];

        entries
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(ty, descriptor_count)| vk::DescriptorPoolSize {
                ty,
                descriptor_count,
            })
            .collect()
    }
}

/// The immutable samplers shared by every scene.
pub struct SamplerSet {
    linear_repeat: Sampler,
    linear_border: Sampler,
    shadow: Sampler,
}

impl SamplerSet {
    /// Creates the three samplers the passes bind.
    ///
    /// # Errors
    ///
    /// Returns an error if sampler creation fails.
    pub fn new(device: &Arc<Device>) -> RhiResult<Self> {
        Ok(Self {
            linear_repeat: Sampler::linear_repeat(device.clone())?,
            linear_border: Sampler::linear_border(device.clone())?,
            shadow: Sampler::shadow_comparison(device.clone())?,
        })
    }

    /// Resolves a material's sampler choice to a handle.
    pub fn for_kind(&self, kind: SamplerKind) -> vk::Sampler {
        match kind {
            SamplerKind::LinearRepeat => self.linear_repeat.handle(),
            SamplerKind::LinearBorder => self.linear_border.handle(),
        }
    }

    #[inline]
    pub fn linear_repeat(&self) -> vk::Sampler {
        self.linear_repeat.handle()
    }

    #[inline]
    pub fn linear_border(&self) -> vk::Sampler {
        self.linear_border.handle()
    }

    /// Returns the comparison sampler for shadow-map tests.
    #[inline]
    pub fn shadow_comparison(&self) -> vk::Sampler {
        self.shadow.handle()
    }
}

/// The descriptor set layouts shared by every scene.
pub struct SceneLayouts {
    object: DescriptorSetLayout,
    material: DescriptorSetLayout,
    pass: DescriptorSetLayout,
    shadow_sampling: DescriptorSetLayout,
    skinned: DescriptorSetLayout,
    gbuffer_input: DescriptorSetLayout,
    skybox: DescriptorSetLayout,
    post: DescriptorSetLayout,
}

impl SceneLayouts {
    /// Creates all set layouts.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(device: &Arc<Device>) -> RhiResult<Self> {
        let vertex = vk::ShaderStageFlags::VERTEX;
        let fragment = vk::ShaderStageFlags::FRAGMENT;
        let all_graphics =
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::GEOMETRY | fragment;

        let object = DescriptorSetLayout::new(
            device.clone(),
            &[DescriptorBindingBuilder::uniform_buffer(0, vertex)],
        )?;

        let material = DescriptorSetLayout::new(
            device.clone(),
            &[
                DescriptorBindingBuilder::uniform_buffer(0, vertex | fragment),
                DescriptorBindingBuilder::sampler(1, fragment),
                DescriptorBindingBuilder::sampled_image(2, fragment),
                DescriptorBindingBuilder::sampled_image(3, fragment),
            ],
        )?;

        let pass = DescriptorSetLayout::new(
            device.clone(),
            &[DescriptorBindingBuilder::uniform_buffer(0, all_graphics)],
        )?;

        let shadow_sampling = DescriptorSetLayout::new(
            device.clone(),
            &[
                DescriptorBindingBuilder::sampler(0, fragment),
                DescriptorBindingBuilder::sampled_image(1, fragment),
            ],
        )?;

        let skinned = DescriptorSetLayout::new(
            device.clone(),
            &[DescriptorBindingBuilder::uniform_buffer(0, vertex)],
        )?;

        let gbuffer_input = DescriptorSetLayout::new(
            device.clone(),
            &[
                DescriptorBindingBuilder::input_attachment(0, fragment),
                DescriptorBindingBuilder::input_attachment(1, fragment),
                DescriptorBindingBuilder::input_attachment(2, fragment),
                DescriptorBindingBuilder::input_attachment(3, fragment),
            ],
        )?;

        let skybox = DescriptorSetLayout::new(
            device.clone(),
            &[
                DescriptorBindingBuilder::sampler(1, fragment),
                DescriptorBindingBuilder::sampled_image(2, fragment),
            ],
        )?;

        let post = DescriptorSetLayout::new(
            device.clone(),
            &[DescriptorBindingBuilder::combined_image_sampler(0, fragment)],
        )?;

        Ok(Self {
            object,
            material,
            pass,
            shadow_sampling,
            skinned,
            gbuffer_input,
            skybox,
            post,
        })
    }

    #[inline]
    pub fn object(&self) -> &DescriptorSetLayout {
        &self.object
    }

    #[inline]
    pub fn material(&self) -> &DescriptorSetLayout {
        &self.material
    }

    #[inline]
    pub fn pass(&self) -> &DescriptorSetLayout {
        &self.pass
    }

    #[inline]
    pub fn shadow_sampling(&self) -> &DescriptorSetLayout {
        &self.shadow_sampling
    }

    #[inline]
    pub fn skinned(&self) -> &DescriptorSetLayout {
        &self.skinned
    }

    #[inline]
    pub fn gbuffer_input(&self) -> &DescriptorSetLayout {
        &self.gbuffer_input
    }

    #[inline]
    pub fn skybox(&self) -> &DescriptorSetLayout {
        &self.skybox
    }

    #[inline]
    pub fn post(&self) -> &DescriptorSetLayout {
        &self.post
    }
}

/// The descriptor tables for one uploaded scene.
///
/// All sets come from a single pool sized to the scene's exact demand. Sets
/// are written once at upload; per-frame updates go through the underlying
/// buffers, never through descriptor writes.
pub struct SceneDescriptors {
    pool: DescriptorPool,
    object_sets: Vec<vk::DescriptorSet>,
    material_sets: Vec<vk::DescriptorSet>,
    pass_sets: Vec<vk::DescriptorSet>,
    shadow_set: vk::DescriptorSet,
    gbuffer_set: vk::DescriptorSet,
    skinned_sets: Vec<vk::DescriptorSet>,
    skybox_set: Option<vk::DescriptorSet>,
    post_set: Option<vk::DescriptorSet>,
}

impl SceneDescriptors {
    /// Creates the pool and allocates every table for `shape`.
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation or set allocation fails. The pool
    /// is sized from the same shape, so allocation can only fail on device
    /// loss or heap exhaustion.
    pub fn new(device: &Arc<Device>, layouts: &SceneLayouts, shape: SceneShape) -> RhiResult<Self> {
        let demand = shape.demand();
        let pool = DescriptorPool::new(device.clone(), demand.sets, &demand.pool_sizes())?;

        let mut request = Vec::with_capacity(demand.sets as usize);
        request.extend(std::iter::repeat_n(layouts.object.handle(), shape.objects));
        request.extend(std::iter::repeat_n(layouts.material.handle(), shape.materials));
        request.extend(std::iter::repeat_n(layouts.pass.handle(), PASS_BUFFER_COUNT));
        request.push(layouts.shadow_sampling.handle());
        request.push(layouts.gbuffer_input.handle());
        request.extend(std::iter::repeat_n(layouts.skinned.handle(), shape.skinned));
        if shape.has_skybox {
            request.push(layouts.skybox.handle());
        }
        if shape.has_post {
            request.push(layouts.post.handle());
        }

        let mut sets = pool.allocate(&request)?;
        debug!(
            sets = sets.len(),
            uniform_buffers = demand.uniform_buffers,
            "allocated scene descriptor tables"
        );

        // Split the flat allocation back into the per-table groups, in the
        // same order they were requested.
        let object_sets: Vec<_> = sets.drain(..shape.objects).collect();
        let material_sets: Vec<_> = sets.drain(..shape.materials).collect();
        let pass_sets: Vec<_> = sets.drain(..PASS_BUFFER_COUNT).collect();
        let shadow_set = sets.remove(0);
        let gbuffer_set = sets.remove(0);
        let skinned_sets: Vec<_> = sets.drain(..shape.skinned).collect();
        let skybox_set = shape.has_skybox.then(|| sets.remove(0));
        let post_set = shape.has_post.then(|| sets.remove(0));

        Ok(Self {
            pool,
            object_sets,
            material_sets,
            pass_sets,
            shadow_set,
            gbuffer_set,
            skinned_sets,
            skybox_set,
            post_set,
        })
    }

    /// Points every object table at its element in the object array.
    pub fn write_object_tables(&self, device: &Device, buffer: &ConstantBuffer<ObjectConstants>) {
        let infos: Vec<_> = (0..self.object_sets.len())
            .map(|i| buffer.descriptor_info(i))
            .collect();
        let writes: Vec<_> = self
            .object_sets
            .iter()
            .zip(&infos)
            .map(|(set, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(info))
            })
            .collect();
        update_descriptor_sets(device, &writes);
    }

    /// Points every material table at its constants, sampler and textures.
    pub fn write_material_tables(
        &self,
        device: &Device,
        buffer: &ConstantBuffer<MaterialConstants>,
        materials: &[Material],
        samplers: &SamplerSet,
    ) {
        let buffer_infos: Vec<_> = (0..self.material_sets.len())
            .map(|i| buffer.descriptor_info(i))
            .collect();
        let sampler_infos: Vec<_> = materials
            .iter()
            .map(|m| {
                image_info(
                    samplers.for_kind(m.sampler()),
                    vk::ImageView::null(),
                    vk::ImageLayout::UNDEFINED,
                )
            })
            .collect();
        let diffuse_infos: Vec<_> = materials
            .iter()
            .map(|m| {
                image_info(
                    vk::Sampler::null(),
                    m.diffuse_view(),
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                )
            })
            .collect();
        let secondary_infos: Vec<_> = materials
            .iter()
            .map(|m| {
                image_info(
                    vk::Sampler::null(),
                    m.secondary_view(),
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                )
            })
            .collect();

        let mut writes = Vec::with_capacity(self.material_sets.len() * 4);
        for (i, set) in self.material_sets.iter().copied().enumerate() {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(&buffer_infos[i])),
            );
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(1)
                    .descriptor_type(vk::DescriptorType::SAMPLER)
                    .image_info(std::slice::from_ref(&sampler_infos[i])),
            );
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(2)
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .image_info(std::slice::from_ref(&diffuse_infos[i])),
            );
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(3)
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .image_info(std::slice::from_ref(&secondary_infos[i])),
            );
        }
        update_descriptor_sets(device, &writes);
    }

    /// Points each pass table at its element in the pass array.
    pub fn write_pass_tables(&self, device: &Device, buffer: &ConstantBuffer<PassConstants>) {
        let infos: Vec<_> = (0..PASS_BUFFER_COUNT)
            .map(|i| buffer.descriptor_info(i))
            .collect();
        let writes: Vec<_> = self
            .pass_sets
            .iter()
            .zip(&infos)
            .map(|(set, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(info))
            })
            .collect();
        update_descriptor_sets(device, &writes);
    }

    /// Points the shadow-sampling table at the comparison sampler and the
    /// shadow map.
    pub fn write_shadow_table(
        &self,
        device: &Device,
        sampler: vk::Sampler,
        shadow_view: vk::ImageView,
    ) {
        let sampler_info = image_info(sampler, vk::ImageView::null(), vk::ImageLayout::UNDEFINED);
        let map_info = image_info(
            vk::Sampler::null(),
            shadow_view,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(self.shadow_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .image_info(std::slice::from_ref(&sampler_info)),
            vk::WriteDescriptorSet::default()
                .dst_set(self.shadow_set)
                .dst_binding(1)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .image_info(std::slice::from_ref(&map_info)),
        ];
        update_descriptor_sets(device, &writes);
    }

    /// Points the G-buffer input table at the four geometry targets.
    pub fn write_gbuffer_table(&self, device: &Device, views: [vk::ImageView; 4]) {
        let infos: Vec<_> = views
            .iter()
            .map(|view| {
                image_info(
                    vk::Sampler::null(),
                    *view,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                )
            })
            .collect();
        let writes: Vec<_> = infos
            .iter()
            .enumerate()
            .map(|(i, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(self.gbuffer_set)
                    .dst_binding(i as u32)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .image_info(std::slice::from_ref(info))
            })
            .collect();
        update_descriptor_sets(device, &writes);
    }

    /// Points every skinned table at its element in the skinned array.
    pub fn write_skinned_tables(&self, device: &Device, buffer: &ConstantBuffer<SkinnedConstants>) {
        let infos: Vec<_> = (0..self.skinned_sets.len())
            .map(|i| buffer.descriptor_info(i))
            .collect();
        let writes: Vec<_> = self
            .skinned_sets
            .iter()
            .zip(&infos)
            .map(|(set, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(info))
            })
            .collect();
        update_descriptor_sets(device, &writes);
    }

    /// Points the skybox table at the cube map, when one was allocated.
    pub fn write_skybox_table(&self, device: &Device, sampler: vk::Sampler, view: vk::ImageView) {
        let Some(set) = self.skybox_set else {
            return;
        };
        let sampler_info = image_info(sampler, vk::ImageView::null(), vk::ImageLayout::UNDEFINED);
        let cube_info = image_info(
            vk::Sampler::null(),
            view,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(1)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .image_info(std::slice::from_ref(&sampler_info)),
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(2)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .image_info(std::slice::from_ref(&cube_info)),
        ];
        update_descriptor_sets(device, &writes);
    }

    /// Points the post-input table at the scene color target, when one was
    /// allocated.
    pub fn write_post_table(&self, device: &Device, sampler: vk::Sampler, view: vk::ImageView) {
        let Some(set) = self.post_set else {
            return;
        };
        let info = image_info(sampler, view, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(std::slice::from_ref(&info));
        update_descriptor_sets(device, std::slice::from_ref(&write));
    }

    #[inline]
    pub fn object_set(&self, index: usize) -> vk::DescriptorSet {
        self.object_sets[index]
    }

    #[inline]
    pub fn material_set(&self, index: usize) -> vk::DescriptorSet {
        self.material_sets[index]
    }

    /// Returns the pass table for a pass-constant element.
    #[inline]
    pub fn pass_set(&self, pass: usize) -> vk::DescriptorSet {
        self.pass_sets[pass]
    }

    #[inline]
    pub fn shadow_set(&self) -> vk::DescriptorSet {
        self.shadow_set
    }

    #[inline]
    pub fn gbuffer_set(&self) -> vk::DescriptorSet {
        self.gbuffer_set
    }

    #[inline]
    pub fn skinned_set(&self, index: usize) -> vk::DescriptorSet {
        self.skinned_sets[index]
    }

    #[inline]
    pub fn skybox_set(&self) -> Option<vk::DescriptorSet> {
        self.skybox_set
    }

    #[inline]
    pub fn post_set(&self) -> Option<vk::DescriptorSet> {
        self.post_set
    }

    /// Returns the pool every table was allocated from.
    #[inline]
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_empty_scene() {
        let shape = SceneShape::default();
        let demand = shape.demand();

        assert_eq!(demand.uniform_buffers, 2);
        assert_eq!(demand.samplers, 1);
        assert_eq!(demand.sampled_images, 1);
        assert_eq!(demand.combined_image_samplers, 0);
        assert_eq!(demand.input_attachments, 4);
        assert_eq!(demand.sets, 4);
    }

    #[test]
    fn test_demand_full_scene() {
        let shape = SceneShape {
            objects: 3,
            materials: 2,
            skinned: 1,
            has_skybox: true,
            has_post: true,
        };
        let demand = shape.demand();

        assert_eq!(demand.uniform_buffers, 3 + 2 + 2 + 1);
        assert_eq!(demand.samplers, 2 + 1 + 1);
        assert_eq!(demand.sampled_images, 2 * 2 + 1 + 1);
        assert_eq!(demand.combined_image_samplers, 1);
        assert_eq!(demand.input_attachments, 4);
        assert_eq!(demand.sets, 3 + 2 + 2 + 1 + 2 + 1 + 1);
    }

    #[test]
    fn test_demand_without_optional_targets() {
        let shape = SceneShape {
            objects: 10,
            materials: 4,
            skinned: 2,
            has_skybox: true,
            has_post: false,
        };
        let demand = shape.demand();

        assert_eq!(demand.uniform_buffers, 18);
        assert_eq!(demand.samplers, 6);
        assert_eq!(demand.sampled_images, 10);
        assert_eq!(demand.combined_image_samplers, 0);
        assert_eq!(demand.sets, 21);
    }

    #[test]
    fn test_pool_sizes_skip_zero_counts() {
        let sizes = SceneShape::default().demand().pool_sizes();

        assert_eq!(sizes.len(), 4);
        assert!(
            !sizes
                .iter()
                .any(|s| s.ty == vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        );
    }

    #[test]
    fn test_pool_sizes_match_demand() {
        let demand = SceneShape {
            objects: 5,
            materials: 3,
            skinned: 0,
            has_skybox: false,
            has_post: true,
        }
        .demand();
        let sizes = demand.pool_sizes();

        let count_of = |ty: vk::DescriptorType| {
            sizes
                .iter()
                .find(|s| s.ty == ty)
                .map(|s| s.descriptor_count)
        };
        assert_eq!(count_of(vk::DescriptorType::UNIFORM_BUFFER), Some(10));
        assert_eq!(count_of(vk::DescriptorType::SAMPLER), Some(4));
        assert_eq!(count_of(vk::DescriptorType::SAMPLED_IMAGE), Some(7));
        assert_eq!(
            count_of(vk::DescriptorType::COMBINED_IMAGE_SAMPLER),
            Some(1)
        );
        assert_eq!(count_of(vk::DescriptorType::INPUT_ATTACHMENT), Some(4));
    }
}
