//! Core of the space graphics toolkit.
//!
//! This crate provides:
//! - Gravity wells and per-frame aggregation into fixed-size shader arrays
//! - Seeded billboard quad batches for starfield backdrops
//! - Seeded ring meshes for stellar prominences
//! - A floating origin for scenes beyond f32 precision
//! - JSON scene files
//! - Bevy plugins tying these together

use bevy::prelude::*;

pub mod error;
pub mod floating_origin;
pub mod gradient;
pub mod mesh_buffers;
pub mod procedural_mesh;
pub mod prominence;
pub mod quad_builder;
pub mod rng;
pub mod scene_config;
pub mod spacetime;
pub mod tween;
pub mod wells;

pub use error::{SgtError, SgtResult};
pub use floating_origin::{
    rebase_floating_origin, FloatingObject, FloatingOrigin, FloatingOriginCamera,
    FloatingOriginConfig, FloatingOriginPlugin, UniversalPosition,
};
pub use gradient::{ColorGradient, ColorKey};
pub use mesh_buffers::{MeshBounds, MeshBuffers};
pub use procedural_mesh::{
    build_backdrop_meshes, build_prominence_meshes, Backdrop, ProceduralMeshBuilders,
    ProceduralMeshPlugin, Prominence,
};
pub use prominence::{ProminenceBuilder, RingBatch, RingBatchSpec};
pub use quad_builder::{
    billboard_axes, AtlasLayout, ProceduralQuadBuilder, QuadBatch, QuadBatchSpec, MAX_QUADS,
};
pub use rng::{bias_ease, SeededRandom};
pub use scene_config::{load_scene_config, save_scene_config, SpaceSceneConfig, WellDescriptor};
pub use spacetime::{
    aggregate, update_spacetime_wells, AggregationResult, CategoryBlock, GpuSpacetimeWells,
    SpacetimePlugin, SpacetimeSet, SpacetimeSettings, SpacetimeWells, WellAggregator,
    WellCapacities, WellFilter, MAX_WELLS_PER_CATEGORY,
};
pub use tween::PingPongTween;
pub use wells::{Well, WellCategory, WellDistribution, WellId, WellRegistry};

/// Adds the procedural mesh, spacetime and floating-origin plugins.
pub struct SpaceCorePlugin;

impl Plugin for SpaceCorePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ProceduralMeshPlugin,
            SpacetimePlugin,
            FloatingOriginPlugin,
        ));
    }
}
