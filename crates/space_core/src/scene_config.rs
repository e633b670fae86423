//! JSON scene files.
//!
//! A scene file describes the backdrop, prominences, wells, and the spacetime
//! and floating-origin settings. Every field is optional; missing fields take
//! their defaults.
//!
//! ```json
//! {
//!   "backdrop": { "seed": 7, "count": 2000, "radius": 500.0 },
//!   "prominences": [ { "seed": 1, "plane_count": 6 } ],
//!   "wells": [
//!     { "name": "Sun", "position": [0, 0, 0], "radius": 20,
//!       "distribution": { "kind": "Gaussian" } }
//!   ],
//!   "spacetime": { "capacities": { "gaussian": 4 } }
//! }
//! ```

use bevy::math::{Quat, Vec3};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::SgtResult;
use crate::floating_origin::{FloatingOrigin, FloatingOriginConfig};
use crate::procedural_mesh::{Backdrop, Prominence};
use crate::prominence::RingBatchSpec;
use crate::quad_builder::QuadBatchSpec;
use crate::spacetime::SpacetimeSettings;
use crate::wells::{Well, WellDistribution, WellId, WellRegistry};

/// Serializable form of a `Well`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellDescriptor {
    pub name: String,
    pub tag: String,
    pub layer: u32,
    pub enabled: bool,
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`
    pub rotation: [f32; 4],
    pub radius: f32,
    pub strength: f32,
    pub opacity: f32,
    pub distribution: WellDistribution,
}

impl Default for WellDescriptor {
    fn default() -> Self {
        Well::default().into()
    }
}

impl From<&WellDescriptor> for Well {
    fn from(descriptor: &WellDescriptor) -> Self {
        Well {
            name: descriptor.name.clone(),
            tag: descriptor.tag.clone(),
            layer: descriptor.layer,
            enabled: descriptor.enabled,
            position: Vec3::from_array(descriptor.position),
            rotation: Quat::from_array(descriptor.rotation).normalize(),
            radius: descriptor.radius,
            strength: descriptor.strength,
            opacity: descriptor.opacity,
            distribution: descriptor.distribution,
        }
    }
}

impl From<Well> for WellDescriptor {
    fn from(well: Well) -> Self {
        Self {
            name: well.name,
            tag: well.tag,
            layer: well.layer,
            enabled: well.enabled,
            position: well.position.to_array(),
            rotation: well.rotation.to_array(),
            radius: well.radius,
            strength: well.strength,
            opacity: well.opacity,
            distribution: well.distribution,
        }
    }
}

/// Everything a scene file can describe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceSceneConfig {
    pub backdrop: Option<QuadBatchSpec>,
    pub prominences: Vec<RingBatchSpec>,
    pub wells: Vec<WellDescriptor>,
    pub spacetime: SpacetimeSettings,
    pub floating_origin: FloatingOriginConfig,
}

impl SpaceSceneConfig {
    pub fn from_json_str(json: &str) -> SgtResult<Self> {
        let config: SpaceSceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would corrupt coordinates. Mesh specs are checked
    /// when they are built.
    pub fn validate(&self) -> SgtResult<()> {
        self.floating_origin.validate()
    }

    /// Insert the settings resources, register the wells and spawn the
    /// procedural entities. Returns the ids of the registered wells.
    pub fn apply(&self, world: &mut World) -> Vec<WellId> {
        world.insert_resource(self.spacetime.clone());
        world.insert_resource(FloatingOrigin::from(self.floating_origin));

        world.init_resource::<WellRegistry>();
        let ids = {
            let mut registry = world.resource_mut::<WellRegistry>();
            self.wells
                .iter()
                .map(|descriptor| registry.register(Well::from(descriptor)))
                .collect::<Vec<_>>()
        };

        if let Some(spec) = &self.backdrop {
            world.spawn((Backdrop::new(spec.clone()), Transform::default()));
        }
        for spec in &self.prominences {
            world.spawn((Prominence::new(spec.clone()), Transform::default()));
        }

        info!(
            "Scene applied: {} wells, backdrop: {}, {} prominences",
            ids.len(),
            self.backdrop.is_some(),
            self.prominences.len()
        );
        ids
    }
}

/// Load a scene from a JSON file.
pub fn load_scene_config<P: AsRef<Path>>(path: P) -> SgtResult<SpaceSceneConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: SpaceSceneConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Save a scene as pretty-printed JSON.
pub fn save_scene_config<P: AsRef<Path>>(config: &SpaceSceneConfig, path: P) -> SgtResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, config)?;
    Ok(())
}
