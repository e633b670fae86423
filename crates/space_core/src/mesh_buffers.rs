//! Reusable vertex/index scratch buffers shared by the procedural builders.
//!
//! A builder owns one `MeshBuffers` and overwrites it on every build. The
//! vectors are cleared, never shrunk, so rebuilding a backdrop with the same
//! or a smaller count does not allocate.

use bevy::asset::RenderAssetUsages;
use bevy::math::Vec3;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::Mesh;

/// Axis-aligned bounds grown incrementally while vertices are emitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl MeshBounds {
    /// Inverted bounds that contain nothing; the first `expand` sets them.
    pub const EMPTY: MeshBounds = MeshBounds {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a sphere-enclosing cube around `center`.
    pub fn expand(&mut self, center: Vec3, radius: f32) {
        self.min = self.min.min(center - Vec3::splat(radius));
        self.max = self.max.max(center + Vec3::splat(radius));
    }

    /// Grow to include a single point.
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.max - self.min) * 0.5
        }
    }
}

impl Default for MeshBounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Parallel vertex arrays plus a triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshBuffers {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub uv0: Vec<[f32; 2]>,
    pub uv1: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub bounds: MeshBounds,
}

impl MeshBuffers {
    /// Drop contents, keep allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.uv0.clear();
        self.uv1.clear();
        self.indices.clear();
        self.bounds = MeshBounds::EMPTY;
    }

    /// Make room for at least `vertices` vertices and `indices` indices in total.
    pub fn reserve(&mut self, vertices: usize, indices: usize) {
        self.positions.reserve(vertices.saturating_sub(self.positions.len()));
        self.colors.reserve(vertices.saturating_sub(self.colors.len()));
        self.uv0.reserve(vertices.saturating_sub(self.uv0.len()));
        self.uv1.reserve(vertices.saturating_sub(self.uv1.len()));
        self.indices.reserve(indices.saturating_sub(self.indices.len()));
    }

    /// Vertex capacity currently allocated (minimum over the parallel arrays).
    pub fn vertex_capacity(&self) -> usize {
        self.positions
            .capacity()
            .min(self.colors.capacity())
            .min(self.uv0.capacity())
            .min(self.uv1.capacity())
    }

    pub fn index_capacity(&self) -> usize {
        self.indices.capacity()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append one vertex. The caller is responsible for the matching indices.
    pub(crate) fn push_vertex(
        &mut self,
        position: Vec3,
        color: [f32; 4],
        uv0: [f32; 2],
        uv1: [f32; 2],
    ) {
        self.positions.push(position.to_array());
        self.colors.push(color);
        self.uv0.push(uv0);
        self.uv1.push(uv1);
    }

    /// Copy the buffers into a Bevy triangle-list mesh.
    pub fn to_mesh(&self) -> Mesh {
        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, self.colors.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, self.uv0.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_1, self.uv1.clone())
            .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}
