//! Scene world and object graph.
//!
//! The [`World`] owns everything a scene renders: game objects in an arena
//! keyed by name, mesh data awaiting upload, materials, lights, skinned
//! instances and particle systems.
//!
//! Arena indices are stable for the world's lifetime and double as
//! constant-array slots: an object's [`ObjectId`] is its slot in the object
//! constant array, a [`MaterialHandle`] its slot in the material constant
//! array. Objects and materials carry a dirty flag; updates rewrite only
//! flagged slots, and changing an object's transform flags its whole
//! subtree.
//!
//! # Example
//!
//! ```
//! use ember_scene::{Transform, World};
//! use glam::Vec3;
//!
//! let mut world = World::new();
//! let root = world
//!     .spawn("root", Transform::default(), None)
//!     .unwrap();
//! let child = world
//!     .spawn("wheel", Transform::from_position(Vec3::X), Some(root))
//!     .unwrap();
//!
//! assert_eq!(world.object_id("wheel").unwrap(), child);
//! ```

use std::collections::HashMap;

use ember_resources::constants::MAX_BONES;
use ember_resources::material::Material;
use ember_resources::mesh::{MeshData, SkinnedMeshData};
use ember_rhi::vk;
use glam::Mat4;
use tracing::{debug, warn};

use crate::camera::Camera;
use crate::error::{SceneError, SceneResult};
use crate::light::LightRig;
use crate::particles::ParticleSystem;
use crate::skinned::{SkinnedAnimation, SkinnedInstanceId, SkinnedModelInstance};
use crate::transform::Transform;

/// Identifies a game object and its object-constant slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// Returns the slot index in the object constant array.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifies a registered static mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) usize);

impl MeshHandle {
    /// Returns the registration index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifies a registered skinned mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SkinnedMeshHandle(pub(crate) usize);

impl SkinnedMeshHandle {
    /// Returns the registration index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifies a material and its material-constant slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub(crate) usize);

impl MaterialHandle {
    /// Returns the slot index in the material constant array.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What an object draws.
#[derive(Clone, Copy, Debug)]
pub enum MeshRenderer {
    /// Non-animated geometry from the static vertex stream.
    Static {
        mesh: MeshHandle,
        material: MaterialHandle,
    },
    /// Animated geometry from the skinned vertex stream.
    Skinned {
        mesh: SkinnedMeshHandle,
        material: MaterialHandle,
        instance: SkinnedInstanceId,
    },
}

impl MeshRenderer {
    /// Returns the material either variant draws with.
    pub fn material(&self) -> MaterialHandle {
        match self {
            MeshRenderer::Static { material, .. } | MeshRenderer::Skinned { material, .. } => {
                *material
            }
        }
    }
}

/// One node of the scene graph.
#[derive(Debug)]
pub struct GameObject {
    name: String,
    transform: Transform,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    renderer: Option<MeshRenderer>,
    dirty: bool,
}

impl GameObject {
    /// Returns the unique name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the local transform.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Returns the parent, if any.
    #[inline]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Returns the attached renderer, if any.
    #[inline]
    pub fn renderer(&self) -> Option<&MeshRenderer> {
        self.renderer.as_ref()
    }

    /// Returns whether the object's constants need rewriting.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Everything one scene renders.
#[derive(Debug, Default)]
pub struct World {
    objects: Vec<GameObject>,
    object_names: HashMap<String, ObjectId>,
    static_meshes: Vec<MeshData>,
    skinned_meshes: Vec<SkinnedMeshData>,
    materials: Vec<Material>,
    material_names: HashMap<String, MaterialHandle>,
    material_dirty: Vec<bool>,
    skinned: Vec<SkinnedModelInstance>,
    particles: Vec<ParticleSystem>,
    skybox: Option<vk::ImageView>,
    /// Viewpoint of the main pass.
    pub camera: Camera,
    /// Lights and the ambient term.
    pub lights: LightRig,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Meshes =====

    /// Registers a static mesh for upload.
    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshHandle {
        let handle = MeshHandle(self.static_meshes.len());
        self.static_meshes.push(mesh);
        handle
    }

    /// Registers a skinned mesh for upload.
    pub fn add_skinned_mesh(&mut self, mesh: SkinnedMeshData) -> SkinnedMeshHandle {
        let handle = SkinnedMeshHandle(self.skinned_meshes.len());
        self.skinned_meshes.push(mesh);
        handle
    }

    /// Returns the registered static meshes in handle order.
    #[inline]
    pub fn static_meshes(&self) -> &[MeshData] {
        &self.static_meshes
    }

    /// Returns the registered skinned meshes in handle order.
    #[inline]
    pub fn skinned_meshes(&self) -> &[SkinnedMeshData] {
        &self.skinned_meshes
    }

    // ===== Materials =====

    /// Registers a material under its name.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateMaterial`] if the name is taken; the
    /// world is unchanged.
    pub fn add_material(&mut self, material: Material) -> SceneResult<MaterialHandle> {
        if self.material_names.contains_key(material.name()) {
            warn!(name = material.name(), "material name already in use");
            return Err(SceneError::DuplicateMaterial(material.name().to_owned()));
        }

        let handle = MaterialHandle(self.materials.len());
        self.material_names.insert(material.name().to_owned(), handle);
        self.materials.push(material);
        self.material_dirty.push(true);
        Ok(handle)
    }

    /// Looks a material up by name.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownMaterial`] if no material has this name.
    pub fn material_handle(&self, name: &str) -> SceneResult<MaterialHandle> {
        self.material_names.get(name).copied().ok_or_else(|| {
            warn!(name, "material lookup failed");
            SceneError::UnknownMaterial(name.to_owned())
        })
    }

    /// Returns a material.
    #[inline]
    pub fn material(&self, handle: MaterialHandle) -> &Material {
        &self.materials[handle.0]
    }

    /// Returns a material mutably and flags its constants for rewrite.
    pub fn material_mut(&mut self, handle: MaterialHandle) -> &mut Material {
        self.material_dirty[handle.0] = true;
        &mut self.materials[handle.0]
    }

    /// Returns all materials in slot order.
    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Returns the number of materials.
    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Drains the set of materials whose constants need rewriting.
    pub fn take_dirty_materials(&mut self) -> Vec<MaterialHandle> {
        let mut dirty = Vec::new();
        for (i, flag) in self.material_dirty.iter_mut().enumerate() {
            if *flag {
                *flag = false;
                dirty.push(MaterialHandle(i));
            }
        }
        dirty
    }

    // ===== Objects =====

    /// Spawns a game object.
    ///
    /// The object starts dirty so its constants are written on the next
    /// update.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateObject`] if the name is taken or
    /// [`SceneError::InvalidParent`] if the parent handle is out of range;
    /// the world is unchanged in both cases.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        parent: Option<ObjectId>,
    ) -> SceneResult<ObjectId> {
        let name = name.into();
        if self.object_names.contains_key(&name) {
            warn!(%name, "object name already in use");
            return Err(SceneError::DuplicateObject(name));
        }
        if let Some(parent) = parent
            && parent.0 >= self.objects.len()
        {
            warn!(%name, parent = parent.0, "parent handle out of range");
            return Err(SceneError::InvalidParent);
        }

        let id = ObjectId(self.objects.len());
        self.objects.push(GameObject {
            name: name.clone(),
            transform,
            parent,
            children: Vec::new(),
            renderer: None,
            dirty: true,
        });
        if let Some(parent) = parent {
            self.objects[parent.0].children.push(id);
        }
        self.object_names.insert(name, id);

        debug!(name = %self.objects[id.0].name, index = id.0, "spawned object");
        Ok(id)
    }

    /// Looks an object up by name.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownObject`] if no object has this name.
    pub fn object_id(&self, name: &str) -> SceneResult<ObjectId> {
        self.object_names.get(name).copied().ok_or_else(|| {
            warn!(name, "object lookup failed");
            SceneError::UnknownObject(name.to_owned())
        })
    }

    /// Returns an object.
    #[inline]
    pub fn object(&self, id: ObjectId) -> &GameObject {
        &self.objects[id.0]
    }

    /// Iterates all objects in slot order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    /// Returns the number of objects.
    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Replaces an object's local transform and flags its subtree dirty.
    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) {
        self.objects[id.0].transform = transform;
        self.mark_subtree_dirty(id);
    }

    /// Returns the object's world matrix, composed along the parent chain.
    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let object = &self.objects[id.0];
        let local = object.transform.local_matrix();
        match object.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// Attaches static geometry to an object.
    pub fn attach_static_mesh(
        &mut self,
        object: ObjectId,
        mesh: MeshHandle,
        material: MaterialHandle,
    ) {
        self.objects[object.0].renderer = Some(MeshRenderer::Static { mesh, material });
        self.objects[object.0].dirty = true;
    }

    /// Attaches skinned geometry plus its animation to an object.
    ///
    /// The returned id is the instance's slot in the skinned constant array.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EmptyPose`] or [`SceneError::TooManyBones`]
    /// when the animation's pose cannot fill a bone palette; the world is
    /// unchanged.
    pub fn attach_skinned_mesh(
        &mut self,
        object: ObjectId,
        mesh: SkinnedMeshHandle,
        material: MaterialHandle,
        animation: Box<dyn SkinnedAnimation>,
    ) -> SceneResult<SkinnedInstanceId> {
        let bones = animation.pose().len();
        if bones == 0 {
            warn!(object = object.0, "skinned animation provides no bones");
            return Err(SceneError::EmptyPose);
        }
        if bones > MAX_BONES {
            warn!(object = object.0, bones, "bone pose exceeds palette capacity");
            return Err(SceneError::TooManyBones {
                bones,
                capacity: MAX_BONES,
            });
        }

        let instance = SkinnedInstanceId(self.skinned.len());
        self.skinned.push(SkinnedModelInstance::new(object, animation));
        self.objects[object.0].renderer = Some(MeshRenderer::Skinned {
            mesh,
            material,
            instance,
        });
        self.objects[object.0].dirty = true;
        Ok(instance)
    }

    /// Drains the set of objects whose constants need rewriting.
    pub fn take_dirty_objects(&mut self) -> Vec<ObjectId> {
        let mut dirty = Vec::new();
        for (i, object) in self.objects.iter_mut().enumerate() {
            if object.dirty {
                object.dirty = false;
                dirty.push(ObjectId(i));
            }
        }
        dirty
    }

    fn mark_subtree_dirty(&mut self, id: ObjectId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let object = &mut self.objects[id.0];
            object.dirty = true;
            stack.extend(object.children.iter().copied());
        }
    }

    // ===== Skinned instances =====

    /// Returns the skinned instances in slot order.
    #[inline]
    pub fn skinned_instances(&self) -> &[SkinnedModelInstance] {
        &self.skinned
    }

    /// Returns the number of skinned instances.
    #[inline]
    pub fn skinned_count(&self) -> usize {
        self.skinned.len()
    }

    /// Advances every skinned animation by `dt` seconds.
    pub fn advance_animations(&mut self, dt: f32) {
        for instance in &mut self.skinned {
            instance.advance(dt);
        }
    }

    // ===== Particles =====

    /// Adds a particle system.
    pub fn add_particles(&mut self, system: ParticleSystem) {
        self.particles.push(system);
    }

    /// Returns all particle systems.
    #[inline]
    pub fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particles
    }

    /// Steps every particle system by `dt` seconds.
    pub fn advance_particles(&mut self, dt: f32) {
        for system in &mut self.particles {
            system.advance(dt);
        }
    }

    // ===== Skybox =====

    /// Sets the cube-map image the sky sphere samples.
    pub fn set_skybox(&mut self, view: vk::ImageView) {
        self.skybox = Some(view);
    }

    /// Returns the skybox cube-map view, when one is set.
    #[inline]
    pub fn skybox(&self) -> Option<vk::ImageView> {
        self.skybox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_resources::material::ShadingModel;
    use ember_rhi::vk;
    use glam::Vec3;

    struct FixedPose(Vec<Mat4>);

    impl SkinnedAnimation for FixedPose {
        fn advance(&mut self, _dt: f32) {}

        fn pose(&self) -> &[Mat4] {
            &self.0
        }
    }

    fn test_material(name: &str) -> Material {
        Material::new(name, ShadingModel::Diffuse, vk::ImageView::null())
    }

    #[test]
    fn test_spawn_rejects_duplicate_name() {
        let mut world = World::new();
        world.spawn("crate", Transform::default(), None).unwrap();

        let result = world.spawn("crate", Transform::default(), None);
        assert!(matches!(result, Err(SceneError::DuplicateObject(_))));
        assert_eq!(world.object_count(), 1);
    }

    #[test]
    fn test_spawn_rejects_foreign_parent() {
        let mut world = World::new();
        let result = world.spawn("orphan", Transform::default(), Some(ObjectId(5)));

        assert!(matches!(result, Err(SceneError::InvalidParent)));
        assert_eq!(world.object_count(), 0);
    }

    #[test]
    fn test_object_lookup() {
        let mut world = World::new();
        let id = world.spawn("hero", Transform::default(), None).unwrap();

        assert_eq!(world.object_id("hero").unwrap(), id);
        assert!(matches!(
            world.object_id("villain"),
            Err(SceneError::UnknownObject(_))
        ));
    }

    #[test]
    fn test_ids_are_slot_indices() {
        let mut world = World::new();
        let a = world.spawn("a", Transform::default(), None).unwrap();
        let b = world.spawn("b", Transform::default(), None).unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn test_spawn_seeds_dirty() {
        let mut world = World::new();
        world.spawn("a", Transform::default(), None).unwrap();
        world.spawn("b", Transform::default(), None).unwrap();

        let dirty = world.take_dirty_objects();
        assert_eq!(dirty.len(), 2);

        // Drained flags stay clear until something changes
        assert!(world.take_dirty_objects().is_empty());
    }

    #[test]
    fn test_transform_change_dirties_subtree() {
        let mut world = World::new();
        let root = world.spawn("root", Transform::default(), None).unwrap();
        let child = world
            .spawn("child", Transform::default(), Some(root))
            .unwrap();
        let grandchild = world
            .spawn("grandchild", Transform::default(), Some(child))
            .unwrap();
        let lone = world.spawn("lone", Transform::default(), None).unwrap();
        world.take_dirty_objects();

        world.set_transform(child, Transform::from_position(Vec3::Y));

        let dirty = world.take_dirty_objects();
        assert!(dirty.contains(&child));
        assert!(dirty.contains(&grandchild));
        assert!(!dirty.contains(&root));
        assert!(!dirty.contains(&lone));
    }

    #[test]
    fn test_world_matrix_composes_parent_chain() {
        let mut world = World::new();
        let grandparent = world
            .spawn("gp", Transform::from_position(Vec3::new(100.0, 0.0, 0.0)), None)
            .unwrap();
        let parent = world
            .spawn(
                "p",
                Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
                Some(grandparent),
            )
            .unwrap();
        let child = world
            .spawn(
                "c",
                Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
                Some(parent),
            )
            .unwrap();

        let world_pos = world.world_matrix(child).transform_point3(Vec3::ZERO);
        assert!((world_pos - Vec3::new(111.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_world_matrix_applies_parent_scale() {
        let mut world = World::new();
        let parent = world
            .spawn("p", Transform::new().with_scale(Vec3::splat(2.0)), None)
            .unwrap();
        let child = world
            .spawn(
                "c",
                Transform::from_position(Vec3::new(5.0, 0.0, 0.0)),
                Some(parent),
            )
            .unwrap();

        let world_pos = world.world_matrix(child).transform_point3(Vec3::ZERO);
        assert!((world_pos - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_material_registry() {
        let mut world = World::new();
        let handle = world.add_material(test_material("brick")).unwrap();

        assert_eq!(world.material_handle("brick").unwrap(), handle);
        assert!(matches!(
            world.add_material(test_material("brick")),
            Err(SceneError::DuplicateMaterial(_))
        ));
        assert_eq!(world.material_count(), 1);
        assert!(matches!(
            world.material_handle("marble"),
            Err(SceneError::UnknownMaterial(_))
        ));
    }

    #[test]
    fn test_material_dirty_tracking() {
        let mut world = World::new();
        let brick = world.add_material(test_material("brick")).unwrap();
        let tile = world.add_material(test_material("tile")).unwrap();

        // Registration seeds both
        assert_eq!(world.take_dirty_materials().len(), 2);

        world.material_mut(brick).roughness = 0.9;
        let dirty = world.take_dirty_materials();
        assert_eq!(dirty, vec![brick]);
        assert_ne!(dirty, vec![tile]);
    }

    #[test]
    fn test_attach_skinned_validates_pose() {
        let mut world = World::new();
        let object = world.spawn("npc", Transform::default(), None).unwrap();
        let mesh = world.add_skinned_mesh(Default::default());
        let material = world.add_material(test_material("skin")).unwrap();

        let empty = world.attach_skinned_mesh(object, mesh, material, Box::new(FixedPose(vec![])));
        assert!(matches!(empty, Err(SceneError::EmptyPose)));

        let oversized = world.attach_skinned_mesh(
            object,
            mesh,
            material,
            Box::new(FixedPose(vec![Mat4::IDENTITY; MAX_BONES + 1])),
        );
        assert!(matches!(oversized, Err(SceneError::TooManyBones { .. })));
        assert_eq!(world.skinned_count(), 0);
        assert!(world.object(object).renderer().is_none());
    }

    #[test]
    fn test_attach_skinned_assigns_slots() {
        let mut world = World::new();
        let material = world.add_material(test_material("skin")).unwrap();
        let mesh = world.add_skinned_mesh(Default::default());

        let a = world.spawn("a", Transform::default(), None).unwrap();
        let b = world.spawn("b", Transform::default(), None).unwrap();
        let first = world
            .attach_skinned_mesh(a, mesh, material, Box::new(FixedPose(vec![Mat4::IDENTITY])))
            .unwrap();
        let second = world
            .attach_skinned_mesh(b, mesh, material, Box::new(FixedPose(vec![Mat4::IDENTITY])))
            .unwrap();

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(world.skinned_count(), 2);
    }

    #[test]
    fn test_renderer_material_accessor() {
        let mut world = World::new();
        let object = world.spawn("prop", Transform::default(), None).unwrap();
        let mesh = world.add_mesh(MeshData::default());
        let material = world.add_material(test_material("wood")).unwrap();
        world.attach_static_mesh(object, mesh, material);

        let renderer = world.object(object).renderer().copied();
        assert!(matches!(renderer, Some(MeshRenderer::Static { .. })));
        assert_eq!(renderer.map(|r| r.material()), Some(material));
    }
}
