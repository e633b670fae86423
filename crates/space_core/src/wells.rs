//! Gravity wells and the registry that owns them.
//!
//! Wells deform the spacetime grid. The registry is an explicit resource:
//! scene code registers and unregisters wells, the aggregator only borrows
//! them. Iteration follows registration order, which decides which wells are
//! kept when a category overflows.

use bevy::math::{Quat, Vec3};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable identity of a registered well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WellId(pub u64);

/// The four well shapes the spacetime shader understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellCategory {
    Gaussian,
    Ripple,
    Twist,
    Pinch,
}

impl WellCategory {
    pub const ALL: [WellCategory; 4] = [
        WellCategory::Gaussian,
        WellCategory::Ripple,
        WellCategory::Twist,
        WellCategory::Pinch,
    ];

    pub fn index(self) -> usize {
        match self {
            WellCategory::Gaussian => 0,
            WellCategory::Ripple => 1,
            WellCategory::Twist => 2,
            WellCategory::Pinch => 3,
        }
    }
}

/// Distribution of a well, with the parameters only that shape uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WellDistribution {
    Gaussian,
    Ripple {
        frequency: f32,
        offset: f32,
    },
    Twist {
        frequency: f32,
        hole_size: f32,
        hole_power: f32,
        offset: f32,
    },
    Pinch,
}

impl WellDistribution {
    pub fn category(&self) -> WellCategory {
        match self {
            WellDistribution::Gaussian => WellCategory::Gaussian,
            WellDistribution::Ripple { .. } => WellCategory::Ripple,
            WellDistribution::Twist { .. } => WellCategory::Twist,
            WellDistribution::Pinch => WellCategory::Pinch,
        }
    }

    /// Shape parameters packed for the shader. Gaussian and Pinch have none.
    pub fn params(&self) -> Vec4 {
        match *self {
            WellDistribution::Ripple { frequency, offset } => {
                Vec4::new(frequency, offset, 0.0, 0.0)
            }
            WellDistribution::Twist {
                frequency,
                hole_size,
                hole_power,
                offset,
            } => Vec4::new(frequency, hole_size, hole_power, offset),
            WellDistribution::Gaussian | WellDistribution::Pinch => Vec4::ZERO,
        }
    }
}

/// One gravity well.
#[derive(Clone, Debug, PartialEq)]
pub struct Well {
    pub name: String,
    pub tag: String,
    pub layer: u32,
    /// Disabled wells are never aggregated.
    pub enabled: bool,
    pub position: Vec3,
    /// Orientation, used by twist wells.
    pub rotation: Quat,
    /// Wells with a radius of zero or less are ignored.
    pub radius: f32,
    pub strength: f32,
    pub opacity: f32,
    pub distribution: WellDistribution,
}

impl Default for Well {
    fn default() -> Self {
        Self {
            name: String::new(),
            tag: String::new(),
            layer: 0,
            enabled: true,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            radius: 1.0,
            strength: 1.0,
            opacity: 1.0,
            distribution: WellDistribution::Gaussian,
        }
    }
}

impl Well {
    pub fn new(name: impl Into<String>, distribution: WellDistribution) -> Self {
        Self {
            name: name.into(),
            distribution,
            ..Default::default()
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn category(&self) -> WellCategory {
        self.distribution.category()
    }

    /// World-to-well matrix, used by twist wells.
    pub fn world_to_local(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }
}

/// Registration-ordered set of wells.
#[derive(Resource, Default, Debug)]
pub struct WellRegistry {
    wells: Vec<(WellId, Well)>,
    next_id: u64,
}

impl WellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, well: Well) -> WellId {
        let id = WellId(self.next_id);
        self.next_id += 1;
        self.wells.push((id, well));
        id
    }

    /// Remove a well, keeping the order of the others. Returns the removed well.
    pub fn unregister(&mut self, id: WellId) -> Option<Well> {
        let index = self.wells.iter().position(|(well_id, _)| *well_id == id)?;
        Some(self.wells.remove(index).1)
    }

    pub fn get(&self, id: WellId) -> Option<&Well> {
        self.wells
            .iter()
            .find(|(well_id, _)| *well_id == id)
            .map(|(_, well)| well)
    }

    pub fn get_mut(&mut self, id: WellId) -> Option<&mut Well> {
        self.wells
            .iter_mut()
            .find(|(well_id, _)| *well_id == id)
            .map(|(_, well)| well)
    }

    /// Wells in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (WellId, &Well)> {
        self.wells.iter().map(|(id, well)| (*id, well))
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn clear(&mut self) {
        self.wells.clear();
    }

    /// Move every well by `delta` (floating-origin rebasing).
    pub fn translate_all(&mut self, delta: Vec3) {
        for (_, well) in &mut self.wells {
            well.position += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut registry = WellRegistry::new();
        let a = registry.register(Well::default());
        let b = registry.register(Well::default());
        assert_ne!(a, b);
        let ids: Vec<WellId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_unregister_preserves_order() {
        let mut registry = WellRegistry::new();
        let a = registry.register(Well::new("a", WellDistribution::Gaussian));
        let b = registry.register(Well::new("b", WellDistribution::Pinch));
        let c = registry.register(Well::new("c", WellDistribution::Gaussian));
        assert_eq!(registry.unregister(b).unwrap().name, "b");
        assert!(registry.unregister(b).is_none());
        let ids: Vec<WellId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);

        // Ids are never reused
        let d = registry.register(Well::default());
        assert_ne!(d, b);
    }

    #[test]
    fn test_get_mut_and_translate() {
        let mut registry = WellRegistry::new();
        let id = registry.register(Well::default().at(Vec3::new(1.0, 2.0, 3.0)));
        registry.get_mut(id).unwrap().strength = 5.0;
        registry.translate_all(Vec3::new(-1.0, 0.0, 0.0));
        let well = registry.get(id).unwrap();
        assert_eq!(well.strength, 5.0);
        assert_eq!(well.position, Vec3::new(0.0, 2.0, 3.0));
    }

    #[test]
    fn test_distribution_params() {
        let ripple = WellDistribution::Ripple {
            frequency: 2.0,
            offset: 0.5,
        };
        assert_eq!(ripple.category(), WellCategory::Ripple);
        assert_eq!(ripple.params(), Vec4::new(2.0, 0.5, 0.0, 0.0));
        assert_eq!(WellDistribution::Pinch.params(), Vec4::ZERO);
        for (i, category) in WellCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_world_to_local_moves_well_to_origin() {
        let well = Well::default().at(Vec3::new(3.0, 0.0, 0.0));
        let local = well.world_to_local().transform_point3(Vec3::new(3.0, 0.0, 0.0));
        assert!(local.length() < 1e-6);
    }

    #[test]
    fn test_distribution_serde_tag() {
        let json = r#"{"kind":"Twist","frequency":1.0,"hole_size":0.2,"hole_power":3.0,"offset":0.0}"#;
        let twist: WellDistribution = serde_json::from_str(json).unwrap();
        assert_eq!(twist.category(), WellCategory::Twist);
    }
}
