/// Mesh geometry uploaded to a graphics device

use glam::{Vec2, Vec3};
use slotmap::new_key_type;
use crate::error::{Error, Result};

new_key_type! {
    /// Handle to a mesh owned by a graphics device
    pub struct MeshHandle;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position, normal, uv }
    }
}

/// Index range drawn by one `draw_submesh` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMeshDesc {
    pub first_index: u32,
    pub index_count: u32,
}

/// Indexed triangle list split into submeshes
#[derive(Debug, Clone, Default)]
pub struct MeshDesc {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMeshDesc>,
}

impl MeshDesc {
    /// Single submesh covering every index
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            submeshes: vec![SubMeshDesc { first_index: 0, index_count }],
        }
    }

    /// Two triangles covering clip space at z = 0, uv (0,0) at the bottom left
    pub fn fullscreen_quad() -> Self {
        let normal = Vec3::Z;
        let vertices = vec![
            Vertex::new(Vec3::new(-1.0, -1.0, 0.0), normal, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(1.0, -1.0, 0.0), normal, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(1.0, 1.0, 0.0), normal, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(-1.0, 1.0, 0.0), normal, Vec2::new(0.0, 1.0)),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Horizontal plane at y = 0 facing +Y
    pub fn plane(half_extent: f32) -> Self {
        let h = half_extent;
        let normal = Vec3::Y;
        let vertices = vec![
            Vertex::new(Vec3::new(-h, 0.0, h), normal, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(h, 0.0, h), normal, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(h, 0.0, -h), normal, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(-h, 0.0, -h), normal, Vec2::new(0.0, 1.0)),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Axis-aligned cube centered at the origin, one quad per face
    pub fn cube(half_extent: f32) -> Self {
        let faces = [
            (Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, tangent, bitangent) in faces {
            let base = vertices.len() as u32;
            // counter-clockwise seen from outside
            let center = normal * half_extent;
            let t = tangent * half_extent;
            let b = bitangent * half_extent;
            vertices.push(Vertex::new(center - t - b, normal, Vec2::new(0.0, 0.0)));
            vertices.push(Vertex::new(center - t + b, normal, Vec2::new(0.0, 1.0)));
            vertices.push(Vertex::new(center + t + b, normal, Vec2::new(1.0, 1.0)));
            vertices.push(Vertex::new(center + t - b, normal, Vec2::new(1.0, 0.0)));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// Check index and submesh ranges
    pub fn validate(&self) -> Result<()> {
        if self.submeshes.is_empty() {
            return Err(Error::InvalidResource("Mesh has no submeshes".to_string()));
        }
        let vertex_count = self.vertices.len() as u32;
        if let Some(index) = self.indices.iter().find(|&&index| index >= vertex_count) {
            return Err(Error::InvalidResource(format!(
                "Mesh index {} out of range ({} vertices)",
                index, vertex_count
            )));
        }
        for (i, submesh) in self.submeshes.iter().enumerate() {
            let end = submesh.first_index as usize + submesh.index_count as usize;
            if end > self.indices.len() || submesh.index_count % 3 != 0 {
                return Err(Error::InvalidResource(format!(
                    "Submesh {} range {}..{} is not a valid triangle list",
                    i, submesh.first_index, end
                )));
            }
        }
        Ok(())
    }
}
