//! Floating origin for scenes larger than f32 precision allows.
//!
//! Positions are stored as a cell index plus an f64 offset inside that cell.
//! The render world stays near zero: when the camera drifts farther than
//! `threshold` from the local origin, the origin moves by a whole number of
//! cells and every tracked transform (and every well) is shifted back by the
//! same amount.
//!
//! ```text
//!   universal = cell * cell_size + local
//!   render    = (cell - origin) * cell_size + local
//! ```

use bevy::math::{DVec3, I64Vec3, Vec3};
use bevy::prelude::*;
use bevy::transform::TransformSystems;
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, SgtError, SgtResult};
use crate::spacetime::SpacetimeSet;
use crate::wells::WellRegistry;

/// High-precision position: a cell index and an offset within the cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniversalPosition {
    pub cell: I64Vec3,
    pub local: DVec3,
}

impl UniversalPosition {
    pub fn new(cell: I64Vec3, local: DVec3) -> Self {
        Self { cell, local }
    }

    /// Same position with `local` folded into `[0, cell_size)` on each axis.
    /// A non-positive `cell_size` leaves the position unchanged.
    pub fn normalized(self, cell_size: f64) -> Self {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return self;
        }
        let carry = (self.local / cell_size).floor();
        Self {
            cell: self.cell + carry.as_i64vec3(),
            local: self.local - carry * cell_size,
        }
    }

    /// Distance to another position, computed in f64.
    pub fn distance(&self, other: &UniversalPosition, cell_size: f64) -> f64 {
        let cells = (self.cell - other.cell).as_dvec3() * cell_size;
        (cells + self.local - other.local).length()
    }
}

/// Where the render-space origin currently sits in universal space.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct FloatingOrigin {
    /// Size of one cell in world units
    pub cell_size: f64,
    /// Camera distance from the render origin that triggers a rebase
    pub threshold: f32,
    /// Cell the render origin sits on
    pub origin: I64Vec3,
}

impl Default for FloatingOrigin {
    fn default() -> Self {
        Self {
            cell_size: 1000.0,
            threshold: 2000.0,
            origin: I64Vec3::ZERO,
        }
    }
}

/// Serializable subset of `FloatingOrigin`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingOriginConfig {
    pub cell_size: f64,
    pub threshold: f32,
}

impl Default for FloatingOriginConfig {
    fn default() -> Self {
        let origin = FloatingOrigin::default();
        Self {
            cell_size: origin.cell_size,
            threshold: origin.threshold,
        }
    }
}

impl FloatingOriginConfig {
    pub fn validate(&self) -> SgtResult<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(SgtError::InvalidParameter {
                name: "cell_size",
                value: self.cell_size as f32,
            });
        }
        require_non_negative("threshold", self.threshold)
    }
}

impl From<FloatingOriginConfig> for FloatingOrigin {
    fn from(config: FloatingOriginConfig) -> Self {
        Self {
            cell_size: config.cell_size,
            threshold: config.threshold,
            origin: I64Vec3::ZERO,
        }
    }
}

impl FloatingOrigin {
    pub fn new(cell_size: f64, threshold: f32) -> Self {
        Self {
            cell_size,
            threshold,
            origin: I64Vec3::ZERO,
        }
    }

    /// Whole-cell shift to apply when the camera has drifted past `threshold`.
    ///
    /// Returns `None` while the camera is close enough, or when the nearest
    /// cell boundary is still the current origin.
    pub fn rebase_shift(&self, camera: Vec3) -> Option<Vec3> {
        if !(camera.length() > self.threshold) || !(self.cell_size > 0.0) {
            return None;
        }
        let cells = (camera.as_dvec3() / self.cell_size).round();
        if cells == DVec3::ZERO {
            return None;
        }
        Some((cells * self.cell_size).as_vec3())
    }

    /// Move the origin by `shift`, which should come from `rebase_shift`.
    pub fn apply_shift(&mut self, shift: Vec3) {
        if !(self.cell_size > 0.0) {
            return;
        }
        let cells = (shift.as_dvec3() / self.cell_size).round();
        self.origin += cells.as_i64vec3();
    }

    /// Render-space position of a universal position.
    pub fn to_local(&self, position: &UniversalPosition) -> Vec3 {
        let cells = (position.cell - self.origin).as_dvec3() * self.cell_size;
        (cells + position.local).as_vec3()
    }

    /// Universal position of a render-space point.
    pub fn to_universal(&self, local: Vec3) -> UniversalPosition {
        UniversalPosition::new(self.origin, local.as_dvec3()).normalized(self.cell_size)
    }
}

/// The camera whose distance from the origin drives rebasing.
#[derive(Component, Default)]
pub struct FloatingOriginCamera;

/// Entities moved along with the camera on rebase.
#[derive(Component, Default)]
pub struct FloatingObject;

pub struct FloatingOriginPlugin;

impl Plugin for FloatingOriginPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FloatingOrigin>().add_systems(
            PostUpdate,
            rebase_floating_origin
                .before(SpacetimeSet::Aggregate)
                .before(TransformSystems::Propagate),
        );
    }
}

/// Shift the camera, floating objects and wells back toward zero.
pub fn rebase_floating_origin(
    mut origin: ResMut<FloatingOrigin>,
    registry: Option<ResMut<WellRegistry>>,
    mut cameras: Query<&mut Transform, With<FloatingOriginCamera>>,
    mut objects: Query<&mut Transform, (With<FloatingObject>, Without<FloatingOriginCamera>)>,
) {
    let Ok(mut camera) = cameras.single_mut() else {
        return;
    };
    let Some(shift) = origin.rebase_shift(camera.translation) else {
        return;
    };

    origin.apply_shift(shift);
    camera.translation -= shift;
    for mut transform in &mut objects {
        transform.translation -= shift;
    }
    if let Some(mut registry) = registry {
        registry.translate_all(-shift);
    }

    info!(
        "Floating origin rebased by {:?}, origin cell now {:?}",
        shift, origin.origin
    );
}
