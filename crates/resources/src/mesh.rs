//! Mesh data and geometry merging.
//!
//! Meshes are CPU-side vertex and index arrays. Before upload the scene
//! merges every mesh into shared buffers: one vertex buffer for static
//! geometry, one for skinned geometry, and a single index buffer holding
//! both streams back to back. Each mesh keeps a [`GeometryRange`] recording
//! where it landed, and draws replay that range with
//! `vkCmdDrawIndexed(index_count, 1, start_index, base_vertex, 0)`.

use ember_rhi::vertex::{SkinnedVertex, Vertex};
use glam::{Vec2, Vec3};

/// Vertex and index arrays of one static mesh.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates a mesh from raw arrays.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Generates a UV sphere centered at the origin.
    ///
    /// Rows run pole to pole, columns wrap around the equator. The seam
    /// column is duplicated so texture coordinates stay continuous.
    ///
    /// # Arguments
    ///
    /// * `radius` - Sphere radius
    /// * `slices` - Longitude divisions, at least 3
    /// * `stacks` - Latitude divisions, at least 2
    pub fn sphere(radius: f32, slices: u32, stacks: u32) -> Self {
        debug_assert!(slices >= 3 && stacks >= 2, "degenerate sphere tessellation");

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        let mut indices = Vec::with_capacity((6 * stacks * slices) as usize);

        for i in 0..=stacks {
            let phi = std::f32::consts::PI * i as f32 / stacks as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            for j in 0..=slices {
                let theta = std::f32::consts::TAU * j as f32 / slices as f32;
                let (sin_theta, cos_theta) = theta.sin_cos();

                let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
                vertices.push(Vertex::new(
                    normal * radius,
                    Vec2::new(j as f32 / slices as f32, i as f32 / stacks as f32),
                    normal,
                    Vec3::new(-sin_theta, 0.0, cos_theta),
                ));
            }
        }

        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;

                indices.extend_from_slice(&[a, b, c, b, d, c]);
            }
        }

        Self { vertices, indices }
    }
}

/// Vertex and index arrays of one skinned mesh.
#[derive(Clone, Debug, Default)]
pub struct SkinnedMeshData {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
}

impl SkinnedMeshData {
    /// Creates a mesh from raw arrays.
    pub fn new(vertices: Vec<SkinnedVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }
}

/// Location of one mesh inside the merged buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryRange {
    /// Value added to each index, i.e. the mesh's first vertex in its
    /// vertex buffer.
    pub base_vertex: i32,
    /// First index in the shared index buffer.
    pub start_index: u32,
    /// Number of indices to draw.
    pub index_count: u32,
}

/// All scene geometry merged into upload-ready arrays.
///
/// `static_ranges[i]` corresponds to `static_meshes[i]` passed to
/// [`merge_geometry`], and likewise for the skinned side. Index values are
/// stored unbiased; `base_vertex` is applied at draw time.
#[derive(Clone, Debug, Default)]
pub struct MergedGeometry {
    pub static_vertices: Vec<Vertex>,
    pub skinned_vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    pub static_ranges: Vec<GeometryRange>,
    pub skinned_ranges: Vec<GeometryRange>,
}

/// Merges meshes into shared arrays, static stream first.
///
/// `base_vertex` restarts for the skinned stream because skinned vertices
/// live in their own buffer, while `start_index` keeps running through the
/// single index buffer.
pub fn merge_geometry(
    static_meshes: &[MeshData],
    skinned_meshes: &[SkinnedMeshData],
) -> MergedGeometry {
    let mut merged = MergedGeometry::default();

    for mesh in static_meshes {
        merged.static_ranges.push(GeometryRange {
            base_vertex: merged.static_vertices.len() as i32,
            start_index: merged.indices.len() as u32,
            index_count: mesh.indices.len() as u32,
        });
        merged.static_vertices.extend_from_slice(&mesh.vertices);
        merged.indices.extend_from_slice(&mesh.indices);
    }

    for mesh in skinned_meshes {
        merged.skinned_ranges.push(GeometryRange {
            base_vertex: merged.skinned_vertices.len() as i32,
            start_index: merged.indices.len() as u32,
            index_count: mesh.indices.len() as u32,
        });
        merged.skinned_vertices.extend_from_slice(&mesh.vertices);
        merged.indices.extend_from_slice(&mesh.indices);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_mesh(vertex_count: usize, indices: Vec<u32>) -> MeshData {
        let vertices = (0..vertex_count)
            .map(|i| {
                Vertex::new(
                    Vec3::splat(i as f32),
                    Vec2::ZERO,
                    Vec3::Y,
                    Vec3::X,
                )
            })
            .collect();
        MeshData::new(vertices, indices)
    }

    fn skinned_mesh(vertex_count: usize, indices: Vec<u32>) -> SkinnedMeshData {
        let vertices = (0..vertex_count)
            .map(|i| SkinnedVertex {
                position: Vec3::splat(i as f32 + 100.0),
                tex_coord: Vec2::ZERO,
                normal: Vec3::Y,
                tangent: Vec3::X,
                bone_weights: Vec3::new(1.0, 0.0, 0.0),
                bone_indices: [0; 4],
            })
            .collect();
        SkinnedMeshData::new(vertices, indices)
    }

    #[test]
    fn test_sphere_counts() {
        let sphere = MeshData::sphere(1.0, 16, 8);

        assert_eq!(sphere.vertices.len(), (8 + 1) * (16 + 1));
        assert_eq!(sphere.indices.len(), 6 * 8 * 16);
    }

    #[test]
    fn test_sphere_radius_and_normals() {
        let sphere = MeshData::sphere(100.0, 12, 6);

        for vertex in &sphere.vertices {
            assert!((vertex.position.length() - 100.0).abs() < 1e-2);
            assert!((vertex.normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_indices_in_bounds() {
        let sphere = MeshData::sphere(1.0, 8, 4);
        let count = sphere.vertices.len() as u32;

        assert!(sphere.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn test_merge_empty() {
        let merged = merge_geometry(&[], &[]);

        assert!(merged.static_vertices.is_empty());
        assert!(merged.skinned_vertices.is_empty());
        assert!(merged.indices.is_empty());
        assert!(merged.static_ranges.is_empty());
        assert!(merged.skinned_ranges.is_empty());
    }

    #[test]
    fn test_merge_range_layout() {
        let merged = merge_geometry(
            &[static_mesh(4, vec![0, 1, 2, 2, 1, 3]), static_mesh(3, vec![0, 1, 2])],
            &[skinned_mesh(5, vec![0, 1, 2, 3, 4, 0])],
        );

        assert_eq!(
            merged.static_ranges[0],
            GeometryRange { base_vertex: 0, start_index: 0, index_count: 6 }
        );
        assert_eq!(
            merged.static_ranges[1],
            GeometryRange { base_vertex: 4, start_index: 6, index_count: 3 }
        );
        // Skinned vertices live in their own buffer, so base_vertex restarts
        // while start_index keeps running.
        assert_eq!(
            merged.skinned_ranges[0],
            GeometryRange { base_vertex: 0, start_index: 9, index_count: 6 }
        );

        assert_eq!(merged.static_vertices.len(), 7);
        assert_eq!(merged.skinned_vertices.len(), 5);
        assert_eq!(merged.indices.len(), 15);
    }

    #[test]
    fn test_merge_reconstructs_each_mesh() {
        let meshes = [static_mesh(4, vec![0, 2, 1, 1, 2, 3]), static_mesh(6, vec![5, 4, 3, 2, 1, 0])];
        let merged = merge_geometry(&meshes, &[]);

        for (mesh, range) in meshes.iter().zip(&merged.static_ranges) {
            let start = range.start_index as usize;
            let slice = &merged.indices[start..start + range.index_count as usize];

            for (&merged_index, &original_index) in slice.iter().zip(&mesh.indices) {
                assert_eq!(merged_index, original_index);
                let vertex =
                    merged.static_vertices[(range.base_vertex + merged_index as i32) as usize];
                assert_eq!(vertex.position, mesh.vertices[original_index as usize].position);
            }
        }
    }

    #[test]
    fn test_merge_skinned_reconstruction() {
        let meshes = [skinned_mesh(3, vec![2, 1, 0]), skinned_mesh(4, vec![0, 1, 2, 3])];
        let merged = merge_geometry(&[static_mesh(2, vec![0, 1])], &meshes);

        for (mesh, range) in meshes.iter().zip(&merged.skinned_ranges) {
            let start = range.start_index as usize;
            let slice = &merged.indices[start..start + range.index_count as usize];

            for (&merged_index, &original_index) in slice.iter().zip(&mesh.indices) {
                let vertex =
                    merged.skinned_vertices[(range.base_vertex + merged_index as i32) as usize];
                assert_eq!(vertex.position, mesh.vertices[original_index as usize].position);
            }
        }
    }
}
