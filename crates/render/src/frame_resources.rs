//! Per-scene constant buffer arrays.
//!
//! One [`FrameResources`] set backs all uniform data for an uploaded scene:
//! a two-element pass array (main and shadow pass), one object-constant slot
//! per game object, one material-constant slot per material, and one
//! skinned-constant slot per skinned instance.
//!
//! Element counts are fixed by a [`FrameResourcePlan`] when the scene is
//! uploaded and never grow afterwards. All buffers are host-visible and
//! persistently mapped; dirty-driven updates write individual elements in
//! place. Creation is all or nothing, so a failed allocation leaves no
//! partial set behind.

use std::sync::Arc;

use ember_resources::{MaterialConstants, ObjectConstants, PassConstants, SkinnedConstants};
use ember_rhi::constant::ConstantBuffer;
use ember_rhi::device::Device;
use ember_rhi::{MemoryLocation, RhiResult, vk};
use tracing::debug;

/// Number of pass-constant elements.
pub const PASS_BUFFER_COUNT: usize = 2;
/// Pass-constant element for the camera passes.
pub const MAIN_PASS: usize = 0;
/// Pass-constant element for the shadow pass.
pub const SHADOW_PASS: usize = 1;

/// Element counts for one scene's constant buffers.
///
/// Derived from the scene contents alone so sizing stays a pure function of
/// what was populated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameResourcePlan {
    /// Pass-constant elements, always [`PASS_BUFFER_COUNT`].
    pub passes: usize,
    /// One element per game object.
    pub objects: usize,
    /// One element per material.
    pub materials: usize,
    /// One element per skinned instance.
    pub skinned: usize,
}

impl FrameResourcePlan {
    /// Computes the plan for a scene with the given population counts.
    pub fn for_scene(objects: usize, materials: usize, skinned: usize) -> Self {
        Self {
            passes: PASS_BUFFER_COUNT,
            objects,
            materials,
            skinned,
        }
    }
}

/// The constant buffers for one uploaded scene.
pub struct FrameResources {
    plan: FrameResourcePlan,
    pass: ConstantBuffer<PassConstants>,
    objects: Option<ConstantBuffer<ObjectConstants>>,
    materials: Option<ConstantBuffer<MaterialConstants>>,
    skinned: Option<ConstantBuffer<SkinnedConstants>>,
}

impl FrameResources {
    /// Creates every buffer the plan calls for.
    ///
    /// Zero-count arrays are skipped entirely; their accessors return
    /// `None`. If any allocation fails the already-created buffers are
    /// dropped and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation or allocation fails.
    pub fn new(device: &Arc<Device>, plan: FrameResourcePlan) -> RhiResult<Self> {
        let usage = vk::BufferUsageFlags::UNIFORM_BUFFER;
        let location = MemoryLocation::CpuToGpu;

        let pass = ConstantBuffer::new(
            device.clone(),
            "pass_constants",
            plan.passes,
            usage,
            location,
            true,
        )?;

        let objects = if plan.objects > 0 {
            Some(ConstantBuffer::new(
                device.clone(),
                "object_constants",
                plan.objects,
                usage,
                location,
                true,
            )?)
        } else {
            None
        };

        let materials = if plan.materials > 0 {
            Some(ConstantBuffer::new(
                device.clone(),
                "material_constants",
                plan.materials,
                usage,
                location,
                true,
            )?)
        } else {
            None
        };

        let skinned = if plan.skinned > 0 {
            Some(ConstantBuffer::new(
                device.clone(),
                "skinned_constants",
                plan.skinned,
                usage,
                location,
                true,
            )?)
        } else {
            None
        };

        debug!(
            objects = plan.objects,
            materials = plan.materials,
            skinned = plan.skinned,
            "created frame resources"
        );

        Ok(Self {
            plan,
            pass,
            objects,
            materials,
            skinned,
        })
    }

    /// Returns the plan the buffers were sized with.
    #[inline]
    pub fn plan(&self) -> FrameResourcePlan {
        self.plan
    }

    /// Returns the pass-constant array.
    #[inline]
    pub fn pass(&self) -> &ConstantBuffer<PassConstants> {
        &self.pass
    }

    /// Returns the object-constant array, when the scene has objects.
    #[inline]
    pub fn objects(&self) -> Option<&ConstantBuffer<ObjectConstants>> {
        self.objects.as_ref()
    }

    /// Returns the material-constant array, when the scene has materials.
    #[inline]
    pub fn materials(&self) -> Option<&ConstantBuffer<MaterialConstants>> {
        self.materials.as_ref()
    }

    /// Returns the skinned-constant array, when the scene has skinned
    /// instances.
    #[inline]
    pub fn skinned(&self) -> Option<&ConstantBuffer<SkinnedConstants>> {
        self.skinned.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_counts_follow_scene() {
        let plan = FrameResourcePlan::for_scene(24, 7, 3);
        assert_eq!(plan.passes, 2);
        assert_eq!(plan.objects, 24);
        assert_eq!(plan.materials, 7);
        assert_eq!(plan.skinned, 3);
    }

    #[test]
    fn test_plan_empty_scene() {
        let plan = FrameResourcePlan::for_scene(0, 0, 0);
        assert_eq!(plan, FrameResourcePlan {
            passes: PASS_BUFFER_COUNT,
            objects: 0,
            materials: 0,
            skinned: 0,
        });
    }

    #[test]
    fn test_pass_slots_are_distinct() {
        assert_ne!(MAIN_PASS, SHADOW_PASS);
        assert!(MAIN_PASS < PASS_BUFFER_COUNT);
        assert!(SHADOW_PASS < PASS_BUFFER_COUNT);
    }
}
