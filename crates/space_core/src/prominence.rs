//! Seeded ring meshes for stellar prominences.
//!
//! A prominence is a stack of flat annuli ("planes") around a star, each with
//! its own random orientation. The shader fades them by UV, so the builder
//! only has to lay out the rings:
//!
//! - UV0.x: angle around the ring (0..1), UV0.y: 0 on the inner edge, 1 on the outer
//! - UV1.x: plane index / plane count, so each plane can get its own noise offset

use bevy::math::{Quat, Vec3};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::error::{require_non_negative, SgtError, SgtResult};
use crate::mesh_buffers::MeshBuffers;
use crate::rng::SeededRandom;

/// Output of a ring build.
pub type RingBatch = MeshBuffers;

/// Parameters for one prominence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingBatchSpec {
    pub seed: u64,
    /// Number of randomly oriented rings
    pub plane_count: usize,
    /// Segments per ring (at least 3)
    pub plane_detail: usize,
    /// Inner radius of every ring
    pub radius_min: f32,
    /// Outer radius of every ring
    pub radius_max: f32,
    /// Linear RGBA vertex color
    pub color: [f32; 4],
}

impl Default for RingBatchSpec {
    fn default() -> Self {
        Self {
            seed: 0,
            plane_count: 8,
            plane_detail: 32,
            radius_min: 1.0,
            radius_max: 2.0,
            color: [1.0, 0.6, 0.3, 1.0],
        }
    }
}

impl RingBatchSpec {
    pub fn vertices_per_plane(&self) -> usize {
        (self.plane_detail + 1) * 2
    }

    pub fn indices_per_plane(&self) -> usize {
        self.plane_detail * 6
    }

    pub fn validate(&self) -> SgtResult<()> {
        require_non_negative("radius_min", self.radius_min)?;
        require_non_negative("radius_max", self.radius_max)?;
        if self.radius_min > self.radius_max {
            return Err(SgtError::InvertedSizeRange {
                min: self.radius_min,
                max: self.radius_max,
            });
        }
        if self.plane_detail < 3 {
            return Err(SgtError::InvalidParameter {
                name: "plane_detail",
                value: self.plane_detail as f32,
            });
        }
        let vertices = self
            .plane_count
            .checked_mul(self.vertices_per_plane())
            .unwrap_or(usize::MAX);
        if vertices > u32::MAX as usize {
            return Err(SgtError::TooManyQuads {
                requested: self.plane_count.saturating_mul(self.plane_detail),
                max: u32::MAX as usize / self.vertices_per_plane(),
            });
        }
        Ok(())
    }
}

/// Builds prominence rings into buffers it owns and reuses.
#[derive(Default)]
pub struct ProminenceBuilder {
    buffers: MeshBuffers,
}

impl ProminenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(&self) -> &RingBatch {
        &self.buffers
    }

    pub fn build(&mut self, spec: &RingBatchSpec) -> SgtResult<&RingBatch> {
        spec.validate()?;

        self.buffers.clear();
        self.buffers.reserve(
            spec.plane_count * spec.vertices_per_plane(),
            spec.plane_count * spec.indices_per_plane(),
        );

        let mut rng = SeededRandom::new(spec.seed);
        for plane in 0..spec.plane_count {
            let rotation = rng.rotation();
            let plane_u = plane as f32 / spec.plane_count as f32;
            self.push_ring(spec, rotation, plane_u);
        }

        debug!(
            "Built prominence with {} planes ({} vertices)",
            spec.plane_count,
            self.buffers.vertex_count()
        );

        Ok(&self.buffers)
    }

    fn push_ring(&mut self, spec: &RingBatchSpec, rotation: Quat, plane_u: f32) {
        let base = self.buffers.vertex_count() as u32;
        let detail = spec.plane_detail;

        for segment in 0..=detail {
            let u = segment as f32 / detail as f32;
            let angle = u * TAU;
            let direction = rotation * Vec3::new(angle.sin(), 0.0, angle.cos());
            let inner = direction * spec.radius_min;
            let outer = direction * spec.radius_max;

            self.buffers
                .push_vertex(inner, spec.color, [u, 0.0], [plane_u, 0.0]);
            self.buffers
                .push_vertex(outer, spec.color, [u, 1.0], [plane_u, 0.0]);
            self.buffers.bounds.include(inner);
            self.buffers.bounds.include(outer);
        }

        for segment in 0..detail as u32 {
            let inner_a = base + segment * 2;
            let outer_a = inner_a + 1;
            let inner_b = inner_a + 2;
            let outer_b = inner_a + 3;
            self.buffers.indices.extend_from_slice(&[
                inner_a, outer_a, outer_b, inner_a, outer_b, inner_b,
            ]);
        }
    }
}
