//! Vertex data structures and input descriptions.
//!
//! This module defines the vertex formats used in the renderer.
//!
//! # Vertex Types
//!
//! - [`Vertex`] - Static mesh vertex with position, UV, normal, and tangent
//! - [`SkinnedVertex`] - Skinned mesh vertex extending [`Vertex`] with bone data
//! - [`ParticleVertex`] - Point sprite vertex expanded to a quad by a geometry shader

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

/// Standard vertex format for static meshes.
///
/// Each vertex contains:
/// - `position` (Vec3): 3D position in object space
/// - `tex_coord` (Vec2): Texture coordinates (UV)
/// - `normal` (Vec3): Surface normal vector (should be normalized)
/// - `tangent` (Vec3): Tangent vector for normal mapping
///
/// # Memory Layout
///
/// The struct uses `#[repr(C)]` to ensure predictable memory layout:
/// - Offset 0: position (12 bytes)
/// - Offset 12: tex_coord (8 bytes)
/// - Offset 20: normal (12 bytes)
/// - Offset 32: tangent (12 bytes)
/// - Total size: 44 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec3)
/// - location 1: tex_coord (vec2)
/// - location 2: normal (vec3)
/// - location 3: tangent (vec3)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Vertex {
    /// 3D position in object space.
    pub position: Vec3,
    /// Texture coordinates (UV).
    pub tex_coord: Vec2,
    /// Surface normal vector (should be normalized).
    pub normal: Vec3,
    /// Tangent vector for normal mapping.
    pub tangent: Vec3,
}

impl Vertex {
    /// Creates a new vertex with the specified attributes.
    #[inline]
    pub const fn new(position: Vec3, tex_coord: Vec2, normal: Vec3, tangent: Vec3) -> Self {
        Self {
            position,
            tex_coord,
            normal,
            tangent,
        }
    }

    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description.
    ///
    /// Returns a binding description for binding 0 with per-vertex input rate.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // TexCoord at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32_SFLOAT,
                offset: 12,
            },
            // Normal at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 20,
            },
            // Tangent at location 3
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 32,
            },
        ]
    }
}

/// Vertex format for skinned meshes.
///
/// Extends the static layout with bone influences. Only three weights are
/// stored; the fourth is reconstructed in the vertex shader as
/// `1 - (w0 + w1 + w2)`.
///
/// # Memory Layout
///
/// - Offset 0: position (12 bytes)
/// - Offset 12: tex_coord (8 bytes)
/// - Offset 20: normal (12 bytes)
/// - Offset 32: tangent (12 bytes)
/// - Offset 44: bone_weights (12 bytes)
/// - Offset 56: bone_indices (16 bytes)
/// - Total size: 72 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec3)
/// - location 1: tex_coord (vec2)
/// - location 2: normal (vec3)
/// - location 3: tangent (vec3)
/// - location 4: bone_weights (vec3)
/// - location 5: bone_indices (uvec4)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct SkinnedVertex {
    /// 3D position in object space.
    pub position: Vec3,
    /// Texture coordinates (UV).
    pub tex_coord: Vec2,
    /// Surface normal vector (should be normalized).
    pub normal: Vec3,
    /// Tangent vector for normal mapping.
    pub tangent: Vec3,
    /// Weights of the first three bone influences.
    pub bone_weights: Vec3,
    /// Indices into the bone transform array.
    pub bone_indices: [u32; 4],
}

impl SkinnedVertex {
    /// Creates a new skinned vertex with the specified attributes.
    #[inline]
    pub const fn new(
        position: Vec3,
        tex_coord: Vec2,
        normal: Vec3,
        tangent: Vec3,
        bone_weights: Vec3,
        bone_indices: [u32; 4],
    ) -> Self {
        Self {
            position,
            tex_coord,
            normal,
            tangent,
            bone_weights,
            bone_indices,
        }
    }

    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 6] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // TexCoord at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32_SFLOAT,
                offset: 12,
            },
            // Normal at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 20,
            },
            // Tangent at location 3
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 32,
            },
            // Bone weights at location 4
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 4,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 44,
            },
            // Bone indices at location 5
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 5,
                format: vk::Format::R32G32B32A32_UINT,
                offset: 56,
            },
        ]
    }
}

/// Vertex format for particle point sprites.
///
/// Particles are drawn as a point list; a geometry shader expands each point
/// into a camera-facing quad of the given size, sampling the atlas
/// sub-rectangle stored in `tex_rect`.
///
/// # Memory Layout
///
/// - Offset 0: position (12 bytes)
/// - Offset 12: size (4 bytes)
/// - Offset 16: color (16 bytes)
/// - Offset 32: tex_rect (16 bytes)
/// - Total size: 48 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec3)
/// - location 1: size (float)
/// - location 2: color (vec4)
/// - location 3: tex_rect (vec4)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ParticleVertex {
    /// 3D position in world space.
    pub position: Vec3,
    /// Edge length of the expanded quad in world units.
    pub size: f32,
    /// Tint color with opacity in the alpha channel.
    pub color: Vec4,
    /// Atlas sub-rectangle as (u0, v0, u1, v1).
    pub tex_rect: Vec4,
}

impl ParticleVertex {
    /// Creates a new particle vertex.
    #[inline]
    pub const fn new(position: Vec3, size: f32, color: Vec4, tex_rect: Vec4) -> Self {
        Self {
            position,
            size,
            color,
            tex_rect,
        }
    }

    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // Size at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32_SFLOAT,
                offset: 12,
            },
            // Color at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 16,
            },
            // Atlas rectangle at location 3
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_vertex_size() {
        // Vertex: Vec3 (12) + Vec2 (8) + Vec3 (12) + Vec3 (12) = 44 bytes
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
        assert_eq!(Vertex::size(), 44);
    }

    #[test]
    fn test_vertex_binding_description() {
        let binding = Vertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 44);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_vertex_attribute_descriptions() {
        let attrs = Vertex::attribute_descriptions();
        assert_eq!(attrs.len(), 4);

        // Position attribute (location 0)
        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[0].offset, 0);

        // TexCoord attribute (location 1)
        assert_eq!(attrs[1].location, 1);
        assert_eq!(attrs[1].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[1].offset, 12);

        // Normal attribute (location 2)
        assert_eq!(attrs[2].location, 2);
        assert_eq!(attrs[2].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[2].offset, 20);

        // Tangent attribute (location 3)
        assert_eq!(attrs[3].location, 3);
        assert_eq!(attrs[3].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[3].offset, 32);
    }

    #[test]
    fn test_vertex_offsets() {
        // Verify field offsets match the attribute descriptions
        assert_eq!(offset_of!(Vertex, position), 0);
        assert_eq!(offset_of!(Vertex, tex_coord), 12);
        assert_eq!(offset_of!(Vertex, normal), 20);
        assert_eq!(offset_of!(Vertex, tangent), 32);
    }

    #[test]
    fn test_skinned_vertex_size() {
        // SkinnedVertex: Vertex (44) + Vec3 (12) + [u32; 4] (16) = 72 bytes
        assert_eq!(std::mem::size_of::<SkinnedVertex>(), 72);
        assert_eq!(SkinnedVertex::size(), 72);
    }

    #[test]
    fn test_skinned_vertex_offsets() {
        assert_eq!(offset_of!(SkinnedVertex, position), 0);
        assert_eq!(offset_of!(SkinnedVertex, tex_coord), 12);
        assert_eq!(offset_of!(SkinnedVertex, normal), 20);
        assert_eq!(offset_of!(SkinnedVertex, tangent), 32);
        assert_eq!(offset_of!(SkinnedVertex, bone_weights), 44);
        assert_eq!(offset_of!(SkinnedVertex, bone_indices), 56);
    }

    #[test]
    fn test_skinned_vertex_attribute_descriptions() {
        let attrs = SkinnedVertex::attribute_descriptions();
        assert_eq!(attrs.len(), 6);

        // First four attributes match the static layout
        let static_attrs = Vertex::attribute_descriptions();
        for (skinned, fixed) in attrs.iter().zip(static_attrs.iter()) {
            assert_eq!(skinned.location, fixed.location);
            assert_eq!(skinned.format, fixed.format);
            assert_eq!(skinned.offset, fixed.offset);
        }

        // Bone weights attribute (location 4)
        assert_eq!(attrs[4].location, 4);
        assert_eq!(attrs[4].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[4].offset, 44);

        // Bone indices attribute (location 5)
        assert_eq!(attrs[5].location, 5);
        assert_eq!(attrs[5].format, vk::Format::R32G32B32A32_UINT);
        assert_eq!(attrs[5].offset, 56);
    }

    #[test]
    fn test_particle_vertex_size() {
        // ParticleVertex: Vec3 (12) + f32 (4) + Vec4 (16) + Vec4 (16) = 48 bytes
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 48);
        assert_eq!(ParticleVertex::size(), 48);
    }

    #[test]
    fn test_particle_vertex_offsets() {
        assert_eq!(offset_of!(ParticleVertex, position), 0);
        assert_eq!(offset_of!(ParticleVertex, size), 12);
        assert_eq!(offset_of!(ParticleVertex, color), 16);
        assert_eq!(offset_of!(ParticleVertex, tex_rect), 32);
    }

    #[test]
    fn test_particle_vertex_attribute_descriptions() {
        let attrs = ParticleVertex::attribute_descriptions();
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[1].format, vk::Format::R32_SFLOAT);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].format, vk::Format::R32G32B32A32_SFLOAT);
        assert_eq!(attrs[2].offset, 16);
        assert_eq!(attrs[3].format, vk::Format::R32G32B32A32_SFLOAT);
        assert_eq!(attrs[3].offset, 32);
    }

    #[test]
    fn test_vertex_pod_cast() {
        let vertex = Vertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec2::new(0.5, 0.5),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        );

        // bytemuck cast to bytes and back
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 44);

        let vertex_back: &Vertex = bytemuck::from_bytes(bytes);
        assert_eq!(vertex_back.position, vertex.position);
        assert_eq!(vertex_back.tex_coord, vertex.tex_coord);
        assert_eq!(vertex_back.normal, vertex.normal);
        assert_eq!(vertex_back.tangent, vertex.tangent);
    }
}
