//! Seeded billboard-quad batch generation (starfield backdrops).
//!
//! `ProceduralQuadBuilder::build()` scatters `count` quads over a sphere of
//! `radius` and writes them into one reusable set of vertex buffers:
//!
//! - 4 vertices and 6 indices per quad (two CCW triangles seen from outside)
//! - per-vertex color sampled from a gradient
//! - UV0: the quad's cell in a texture atlas of star variants
//! - UV1: the billboard corner (-1..1), for soft falloff in the shader
//!
//! ## Determinism
//!
//! The RNG is seeded once per build and every quad draws, in this order:
//!
//! 1. position (point inside the unit sphere)
//! 2. color sample
//! 3. size sample
//! 4. roll angle in [-180°, 180°]
//! 5. atlas variant
//!
//! so the same spec always produces the same bytes on the same platform.

use bevy::math::{Quat, Vec3};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::SQRT_2;

use crate::error::{require_non_negative, SgtError, SgtResult};
use crate::gradient::ColorGradient;
use crate::mesh_buffers::MeshBuffers;
use crate::rng::{bias_ease, SeededRandom};

/// Largest quad count whose vertices can be addressed by `u32` indices.
pub const MAX_QUADS: usize = u32::MAX as usize / 4;

/// Output of a quad build.
pub type QuadBatch = MeshBuffers;

/// Grid of equally sized star variants in the backdrop texture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub columns: u32,
    pub rows: u32,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self { columns: 1, rows: 1 }
    }
}

impl AtlasLayout {
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// UV rectangle `(min, max)` of a cell, row-major from the top-left.
    pub fn cell_rect(&self, index: usize) -> ([f32; 2], [f32; 2]) {
        let columns = self.columns.max(1) as usize;
        let rows = self.rows.max(1) as usize;
        let column = index % columns;
        let row = (index / columns).min(rows - 1);
        let width = 1.0 / columns as f32;
        let height = 1.0 / rows as f32;
        let min = [column as f32 * width, row as f32 * height];
        ([min[0], min[1]], [min[0] + width, min[1] + height])
    }
}

/// Parameters for one quad batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadBatchSpec {
    pub seed: u64,
    /// Number of quads
    pub count: usize,
    /// Distance of every quad centre from the origin
    pub radius: f32,
    /// 0.0 = spherical distribution, 1.0 = flattened onto the horizon ring
    pub squash: f32,
    /// Smallest quad half-size
    pub size_min: f32,
    /// Largest quad half-size
    pub size_max: f32,
    /// Exponent on the size draw; 1.0 is linear, larger favours `size_min`
    pub size_bias: f32,
    pub color_gradient: ColorGradient,
    pub atlas: AtlasLayout,
}

impl Default for QuadBatchSpec {
    fn default() -> Self {
        Self {
            seed: 0,
            count: 1000,
            radius: 1.0,
            squash: 0.0,
            size_min: 0.01,
            size_max: 0.05,
            size_bias: 1.0,
            color_gradient: ColorGradient::default(),
            atlas: AtlasLayout::default(),
        }
    }
}

impl QuadBatchSpec {
    /// Dense, mostly small stars on a large sphere.
    pub fn starfield(seed: u64) -> Self {
        Self {
            seed,
            count: 4000,
            radius: 500.0,
            squash: 0.0,
            size_min: 0.4,
            size_max: 3.0,
            size_bias: 6.0,
            color_gradient: ColorGradient::starlight(),
            atlas: AtlasLayout::default(),
        }
    }

    /// Stars concentrated around the horizon, like a galactic band.
    pub fn galactic_band(seed: u64) -> Self {
        Self {
            squash: 0.85,
            count: 6000,
            ..Self::starfield(seed)
        }
    }

    /// Check the parameters without building anything.
    pub fn validate(&self) -> SgtResult<()> {
        require_non_negative("radius", self.radius)?;
        require_non_negative("size_min", self.size_min)?;
        require_non_negative("size_max", self.size_max)?;
        if self.size_min > self.size_max {
            return Err(SgtError::InvertedSizeRange {
                min: self.size_min,
                max: self.size_max,
            });
        }
        if !(0.0..=1.0).contains(&self.squash) {
            return Err(SgtError::InvalidParameter {
                name: "squash",
                value: self.squash,
            });
        }
        if !self.size_bias.is_finite() || self.size_bias <= 0.0 {
            return Err(SgtError::InvalidParameter {
                name: "size_bias",
                value: self.size_bias,
            });
        }
        if self.atlas.cell_count() == 0 {
            return Err(SgtError::InvalidParameter {
                name: "atlas",
                value: 0.0,
            });
        }
        if self.count > MAX_QUADS {
            return Err(SgtError::TooManyQuads {
                requested: self.count,
                max: MAX_QUADS,
            });
        }
        Ok(())
    }
}

/// Right and up axes of a billboard facing away from the origin along
/// `forward`, rolled by `roll` radians. `right × up == forward`.
pub fn billboard_axes(forward: Vec3, roll: f32) -> (Vec3, Vec3) {
    let reference = if forward.y.abs() > 0.999 { Vec3::X } else { Vec3::Y };
    let right = reference.cross(forward).normalize();
    let up = forward.cross(right);
    let rotation = Quat::from_axis_angle(forward, roll);
    (rotation * right, rotation * up)
}

/// Builds quad batches into buffers it owns and reuses.
#[derive(Default)]
pub struct ProceduralQuadBuilder {
    buffers: MeshBuffers,
}

impl ProceduralQuadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the scratch buffers so a batch of `quads` quads does not allocate.
    ///
    /// Counts above `MAX_QUADS` are rejected and nothing is reserved.
    pub fn reserve(&mut self, quads: usize) -> SgtResult<()> {
        if quads > MAX_QUADS {
            return Err(SgtError::TooManyQuads {
                requested: quads,
                max: MAX_QUADS,
            });
        }
        self.buffers.reserve(quads.saturating_mul(4), quads.saturating_mul(6));
        Ok(())
    }

    /// Number of quads the buffers can hold without reallocating.
    pub fn quad_capacity(&self) -> usize {
        (self.buffers.vertex_capacity() / 4).min(self.buffers.index_capacity() / 6)
    }

    /// Result of the last successful build.
    pub fn batch(&self) -> &QuadBatch {
        &self.buffers
    }

    /// Generate the batch described by `spec`, replacing the previous contents.
    ///
    /// On error nothing is written and the previous batch is kept.
    pub fn build(&mut self, spec: &QuadBatchSpec) -> SgtResult<&QuadBatch> {
        spec.validate()?;

        self.buffers.clear();
        self.reserve(spec.count)?;

        let mut rng = SeededRandom::new(spec.seed);
        let variants = spec.atlas.cell_count();

        for _ in 0..spec.count {
            let mut point = rng.inside_unit_sphere();
            point.y *= 1.0 - spec.squash;
            let direction = point.try_normalize().unwrap_or(Vec3::X);
            let center = direction * spec.radius;

            let color = spec.color_gradient.sample(rng.value01());
            let half_size = spec.size_min
                + (spec.size_max - spec.size_min) * bias_ease(rng.value01(), spec.size_bias);
            let roll = rng.range(-180.0, 180.0).to_radians();
            let variant = rng.index(variants);

            self.push_quad(
                center,
                direction,
                half_size,
                roll,
                spec.atlas.cell_rect(variant),
                color,
            );
        }

        debug!(
            "Built {} quads (seed {}, {} vertices)",
            spec.count,
            spec.seed,
            self.buffers.vertex_count()
        );

        Ok(&self.buffers)
    }

    fn push_quad(
        &mut self,
        center: Vec3,
        forward: Vec3,
        half_size: f32,
        roll: f32,
        (uv_min, uv_max): ([f32; 2], [f32; 2]),
        color: [f32; 4],
    ) {
        let base = self.buffers.vertex_count() as u32;
        let (right, up) = billboard_axes(forward, roll);
        let right = right * half_size;
        let up = up * half_size;

        let corners = [
            (center - right - up, [uv_min[0], uv_min[1]], [-1.0, -1.0]),
            (center + right - up, [uv_max[0], uv_min[1]], [1.0, -1.0]),
            (center + right + up, [uv_max[0], uv_max[1]], [1.0, 1.0]),
            (center - right + up, [uv_min[0], uv_max[1]], [-1.0, 1.0]),
        ];
        for (position, uv0, uv1) in corners {
            self.buffers.push_vertex(position, color, uv0, uv1);
            self.buffers.bounds.include(position);
        }
        self.buffers.bounds.expand(center, half_size * SQRT_2);

        // CCW seen from outside: 0-1-2, 0-2-3
        self.buffers
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(count: usize) -> QuadBatchSpec {
        QuadBatchSpec {
            seed: 1234,
            count,
            radius: 100.0,
            squash: 0.0,
            size_min: 0.5,
            size_max: 2.0,
            size_bias: 2.0,
            color_gradient: ColorGradient::starlight(),
            atlas: AtlasLayout { columns: 2, rows: 2 },
        }
    }

    fn quad_vertices(batch: &QuadBatch, quad: usize) -> [Vec3; 4] {
        let v = |i: usize| Vec3::from_array(batch.positions[quad * 4 + i]);
        [v(0), v(1), v(2), v(3)]
    }

    #[test]
    fn test_counts_match_quad_count() {
        let mut builder = ProceduralQuadBuilder::new();
        for n in [0, 1, 2, 1000] {
            let batch = builder.build(&spec(n)).unwrap();
            assert_eq!(batch.positions.len(), 4 * n);
            assert_eq!(batch.colors.len(), 4 * n);
            assert_eq!(batch.uv0.len(), 4 * n);
            assert_eq!(batch.uv1.len(), 4 * n);
            assert_eq!(batch.indices.len(), 6 * n);
        }
    }

    #[test]
    fn test_zero_count_is_empty_not_error() {
        let mut builder = ProceduralQuadBuilder::new();
        let batch = builder.build(&spec(0)).unwrap();
        assert!(batch.is_empty());
        assert!(batch.bounds.is_empty());
    }

    #[test]
    fn test_same_seed_same_bytes() {
        let mut a = ProceduralQuadBuilder::new();
        let mut b = ProceduralQuadBuilder::new();
        let first = a.build(&spec(500)).unwrap();
        let second = b.build(&spec(500)).unwrap();
        assert_eq!(
            bytemuck::cast_slice::<[f32; 3], u8>(&first.positions),
            bytemuck::cast_slice::<[f32; 3], u8>(&second.positions)
        );
        assert_eq!(
            bytemuck::cast_slice::<[f32; 4], u8>(&first.colors),
            bytemuck::cast_slice::<[f32; 4], u8>(&second.colors)
        );
        assert_eq!(first.uv0, second.uv0);
        assert_eq!(first.uv1, second.uv1);
        assert_eq!(first.indices, second.indices);
    }

    #[test]
    fn test_different_seed_differs() {
        let mut builder = ProceduralQuadBuilder::new();
        let first = builder.build(&spec(10)).unwrap().positions.clone();
        let mut other = spec(10);
        other.seed = 99;
        let second = builder.build(&other).unwrap();
        assert_ne!(first, second.positions);
    }

    #[test]
    fn test_rebuild_overwrites_previous_contents() {
        let mut builder = ProceduralQuadBuilder::new();
        builder.build(&spec(100)).unwrap();
        let batch = builder.build(&spec(3)).unwrap();
        assert_eq!(batch.positions.len(), 12);
        assert_eq!(*batch.indices.last().unwrap(), 11);
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let mut builder = ProceduralQuadBuilder::new();
        builder.build(&spec(1000)).unwrap();
        let capacity = builder.quad_capacity();
        assert!(capacity >= 1000);
        builder.build(&spec(10)).unwrap();
        assert!(builder.quad_capacity() >= capacity);
        builder.reserve(5).unwrap();
        assert!(builder.quad_capacity() >= capacity);
    }

    #[test]
    fn test_reserve_grows_capacity() {
        let mut builder = ProceduralQuadBuilder::new();
        builder.reserve(64).unwrap();
        assert!(builder.quad_capacity() >= 64);
    }

    #[test]
    fn test_reserve_rejects_unaddressable_counts() {
        let mut builder = ProceduralQuadBuilder::new();
        for quads in [MAX_QUADS + 1, usize::MAX] {
            assert!(matches!(
                builder.reserve(quads),
                Err(SgtError::TooManyQuads { .. })
            ));
        }
        assert_eq!(builder.quad_capacity(), 0);
    }

    #[test]
    fn test_bounds_contain_every_vertex() {
        let mut builder = ProceduralQuadBuilder::new();
        let batch = builder.build(&spec(1000)).unwrap();
        for position in &batch.positions {
            assert!(batch.bounds.contains(Vec3::from_array(*position)));
        }
        // Quads sit on a sphere of radius 100
        assert!(batch.bounds.half_extents().max_element() <= 100.0 + 2.0 * SQRT_2 + 1e-3);
    }

    #[test]
    fn test_quads_are_coplanar_and_centred_on_sphere() {
        let mut builder = ProceduralQuadBuilder::new();
        let batch = builder.build(&spec(200)).unwrap();
        for quad in 0..200 {
            let [v0, v1, v2, v3] = quad_vertices(batch, quad);
            let normal = (v1 - v0).cross(v2 - v0).normalize();
            assert!(normal.dot(v3 - v0).abs() < 1e-3, "quad {} not planar", quad);
            let center = (v0 + v1 + v2 + v3) / 4.0;
            assert!((center.length() - 100.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_winding_is_ccw_from_outside() {
        let mut builder = ProceduralQuadBuilder::new();
        let batch = builder.build(&spec(200)).unwrap();
        for tri in batch.indices.chunks(3) {
            let a = Vec3::from_array(batch.positions[tri[0] as usize]);
            let b = Vec3::from_array(batch.positions[tri[1] as usize]);
            let c = Vec3::from_array(batch.positions[tri[2] as usize]);
            let normal = (b - a).cross(c - a);
            let outward = (a + b + c) / 3.0;
            assert!(normal.dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_full_squash_flattens_onto_horizon() {
        let mut s = spec(300);
        s.squash = 1.0;
        let mut builder = ProceduralQuadBuilder::new();
        let batch = builder.build(&s).unwrap();
        for quad in 0..300 {
            let [v0, v1, v2, v3] = quad_vertices(batch, quad);
            let center = (v0 + v1 + v2 + v3) / 4.0;
            assert!(center.y.abs() < 1e-3);
        }
    }

    #[test]
    fn test_higher_bias_never_grows_quads() {
        let half_sizes = |bias: f32| {
            let mut s = spec(300);
            s.size_bias = bias;
            let mut builder = ProceduralQuadBuilder::new();
            let batch = builder.build(&s).unwrap();
            (0..300)
                .map(|quad| {
                    let [v0, v1, _, _] = quad_vertices(batch, quad);
                    v0.distance(v1) / 2.0
                })
                .collect::<Vec<f32>>()
        };
        let linear = half_sizes(1.0);
        let biased = half_sizes(4.0);
        for (l, b) in linear.iter().zip(&biased) {
            assert!(*b <= *l + 1e-4);
            assert!(*b >= 0.5 - 1e-4);
        }
    }

    #[test]
    fn test_uvs_stay_inside_atlas_cells() {
        let mut builder = ProceduralQuadBuilder::new();
        let batch = builder.build(&spec(100)).unwrap();
        for quad in batch.uv0.chunks(4) {
            let width = quad[1][0] - quad[0][0];
            let height = quad[3][1] - quad[0][1];
            assert!((width - 0.5).abs() < 1e-6);
            assert!((height - 0.5).abs() < 1e-6);
        }
        assert_eq!(batch.uv1[0], [-1.0, -1.0]);
        assert_eq!(batch.uv1[2], [1.0, 1.0]);
    }

    #[test]
    fn test_invalid_specs_are_rejected() {
        let mut builder = ProceduralQuadBuilder::new();

        let mut inverted = spec(10);
        inverted.size_min = 3.0;
        assert!(matches!(
            builder.build(&inverted),
            Err(SgtError::InvertedSizeRange { .. })
        ));

        let mut squash = spec(10);
        squash.squash = 1.5;
        assert!(matches!(
            builder.build(&squash),
            Err(SgtError::InvalidParameter { name: "squash", .. })
        ));

        let mut bias = spec(10);
        bias.size_bias = 0.0;
        assert!(builder.build(&bias).is_err());

        let mut radius = spec(10);
        radius.radius = -1.0;
        assert!(builder.build(&radius).is_err());

        let mut atlas = spec(10);
        atlas.atlas.columns = 0;
        assert!(builder.build(&atlas).is_err());

        let mut huge = spec(10);
        huge.count = MAX_QUADS + 1;
        assert!(matches!(
            builder.build(&huge),
            Err(SgtError::TooManyQuads { .. })
        ));
    }

    #[test]
    fn test_failed_build_keeps_previous_batch() {
        let mut builder = ProceduralQuadBuilder::new();
        builder.build(&spec(5)).unwrap();
        let mut bad = spec(10);
        bad.size_min = 10.0;
        assert!(builder.build(&bad).is_err());
        assert_eq!(builder.batch().positions.len(), 20);
    }

    #[test]
    fn test_billboard_axes_are_orthonormal() {
        for forward in [Vec3::X, Vec3::Y, Vec3::NEG_Y, Vec3::new(1.0, 2.0, 3.0).normalize()] {
            let (right, up) = billboard_axes(forward, 0.7);
            assert!(right.dot(up).abs() < 1e-5);
            assert!(right.dot(forward).abs() < 1e-5);
            assert!((right.cross(up) - forward).length() < 1e-5);
        }
    }

    #[test]
    fn test_atlas_cell_rect() {
        let atlas = AtlasLayout { columns: 4, rows: 2 };
        assert_eq!(atlas.cell_count(), 8);
        assert_eq!(atlas.cell_rect(0), ([0.0, 0.0], [0.25, 0.5]));
        assert_eq!(atlas.cell_rect(5), ([0.25, 0.5], [0.5, 1.0]));
    }
}
