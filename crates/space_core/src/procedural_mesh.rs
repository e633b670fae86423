//! Bevy glue for the procedural builders.
//!
//! Put a `Backdrop` or `Prominence` on an entity and the plugin builds its mesh
//! and inserts a `Mesh3d`. Editing the component rebuilds the mesh. Materials
//! are left to the caller.

use bevy::prelude::*;

use crate::error::SgtResult;
use crate::mesh_buffers::MeshBuffers;
use crate::prominence::{ProminenceBuilder, RingBatchSpec};
use crate::quad_builder::{ProceduralQuadBuilder, QuadBatchSpec};

/// A seeded billboard quad batch (starfield, nebula sprites, ...).
#[derive(Component, Clone, Debug, Default)]
pub struct Backdrop {
    pub spec: QuadBatchSpec,
}

impl Backdrop {
    pub fn new(spec: QuadBatchSpec) -> Self {
        Self { spec }
    }
}

/// A stack of randomly oriented rings around a star.
#[derive(Component, Clone, Debug, Default)]
pub struct Prominence {
    pub spec: RingBatchSpec,
}

impl Prominence {
    pub fn new(spec: RingBatchSpec) -> Self {
        Self { spec }
    }
}

/// Builders shared by every procedural entity, so their scratch buffers are
/// reused across rebuilds.
#[derive(Resource, Default)]
pub struct ProceduralMeshBuilders {
    pub quads: ProceduralQuadBuilder,
    pub prominences: ProminenceBuilder,
}

pub struct ProceduralMeshPlugin;

impl Plugin for ProceduralMeshPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProceduralMeshBuilders>()
            .add_systems(Update, (build_backdrop_meshes, build_prominence_meshes));
    }
}

fn insert_mesh(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    entity: Entity,
    name: &str,
    built: SgtResult<&MeshBuffers>,
) {
    match built {
        Ok(buffers) => {
            debug!(
                "{} {:?}: {} vertices, {} indices",
                name,
                entity,
                buffers.vertex_count(),
                buffers.indices.len()
            );
            commands
                .entity(entity)
                .insert(Mesh3d(meshes.add(buffers.to_mesh())));
        }
        Err(e) => warn!("{} {:?} not built: {}", name, entity, e),
    }
}

/// Build or rebuild meshes for new and edited backdrops.
pub fn build_backdrop_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut builders: ResMut<ProceduralMeshBuilders>,
    query: Query<(Entity, &Backdrop), Changed<Backdrop>>,
) {
    for (entity, backdrop) in &query {
        let built = builders.quads.build(&backdrop.spec);
        insert_mesh(&mut commands, &mut meshes, entity, "Backdrop", built);
    }
}

/// Build or rebuild meshes for new and edited prominences.
pub fn build_prominence_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut builders: ResMut<ProceduralMeshBuilders>,
    query: Query<(Entity, &Prominence), Changed<Prominence>>,
) {
    for (entity, prominence) in &query {
        let built = builders.prominences.build(&prominence.spec);
        insert_mesh(&mut commands, &mut meshes, entity, "Prominence", built);
    }
}
