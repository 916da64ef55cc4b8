//! Skinned model instances.
//!
//! A skinned instance ties a game object to an animation source. Each frame
//! the animation advances and its bone pose is copied into the instance's
//! slot of the skinned constant array.

use glam::Mat4;

use crate::graph::ObjectId;

/// Source of a bone pose.
///
/// Implementations own whatever clip data and playback state they need;
/// the renderer only asks for the current object-space bone transforms.
pub trait SkinnedAnimation {
    /// Advances playback by `dt` seconds.
    fn advance(&mut self, dt: f32);

    /// Returns the current object-space bone transforms.
    ///
    /// The slice length must stay constant over the instance's lifetime and
    /// within the palette capacity.
    fn pose(&self) -> &[Mat4];
}

/// Identifies a skinned instance and its constant-array slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SkinnedInstanceId(pub(crate) usize);

impl SkinnedInstanceId {
    /// Returns the slot index in the skinned constant array.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One animated model in the scene.
pub struct SkinnedModelInstance {
    object: ObjectId,
    animation: Box<dyn SkinnedAnimation>,
}

impl SkinnedModelInstance {
    pub(crate) fn new(object: ObjectId, animation: Box<dyn SkinnedAnimation>) -> Self {
        Self { object, animation }
    }

    /// Returns the game object this instance animates.
    #[inline]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Advances the animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.animation.advance(dt);
    }

    /// Returns the current bone pose.
    #[inline]
    pub fn pose(&self) -> &[Mat4] {
        self.animation.pose()
    }
}

impl std::fmt::Debug for SkinnedModelInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinnedModelInstance")
            .field("object", &self.object)
            .field("bones", &self.animation.pose().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    struct Swing {
        time: f32,
        pose: Vec<Mat4>,
    }

    impl SkinnedAnimation for Swing {
        fn advance(&mut self, dt: f32) {
            self.time += dt;
            self.pose[0] = Mat4::from_rotation_z(self.time);
        }

        fn pose(&self) -> &[Mat4] {
            &self.pose
        }
    }

    #[test]
    fn test_advance_updates_pose() {
        let mut instance = SkinnedModelInstance::new(
            ObjectId(0),
            Box::new(Swing {
                time: 0.0,
                pose: vec![Mat4::IDENTITY; 3],
            }),
        );

        let before = instance.pose()[0];
        instance.advance(0.5);
        let after = instance.pose()[0];

        assert_ne!(before, after);
        assert_eq!(instance.pose().len(), 3);
        assert_eq!(instance.pose()[1], Mat4::IDENTITY);
    }

    #[test]
    fn test_object_binding() {
        let instance = SkinnedModelInstance::new(
            ObjectId(7),
            Box::new(Swing {
                time: 0.0,
                pose: vec![Mat4::IDENTITY],
            }),
        );

        assert_eq!(instance.object(), ObjectId(7));
    }
}
