//! Spacetime well aggregation.
//!
//! Every frame the spacetime grid shader needs the wells that deform it, packed
//! into fixed-length uniform arrays, one set per well category. This module
//! turns the open-ended `WellRegistry` into those arrays.
//!
//! ## Acceptance policy
//!
//! Wells are visited in registry order. A well is accepted when it is enabled,
//! has a positive radius, passes every enabled filter, and its category still
//! has room. The first wells seen are the ones kept; there is no ranking by
//! distance or strength. Categories never affect each other.
//!
//! ## Output layout
//!
//! ```text
//! per category (length = capacity, slots past `count` are zero):
//!   position_radius   [x, y, z, radius]
//!   strength_opacity  [strength, opacity, 0, 0]
//!   params            Ripple: [frequency, offset, 0, 0]
//!                     Twist:  [frequency, hole_size, hole_power, offset]
//!   matrices          Twist only: world -> well
//! ```
//!
//! `GpuSpacetimeWells` repacks the result into one `Pod` block with
//! `MAX_WELLS_PER_CATEGORY` slots per array, ready for byte upload.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{SgtError, SgtResult};
use crate::wells::{Well, WellCategory, WellId, WellRegistry};

/// Length of every well array in the spacetime shader.
/// This must match MAX_WELLS in the spacetime shader.
pub const MAX_WELLS_PER_CATEGORY: usize = 16;

/// How many wells of each category are packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellCapacities {
    pub gaussian: usize,
    pub ripple: usize,
    pub twist: usize,
    pub pinch: usize,
}

impl Default for WellCapacities {
    fn default() -> Self {
        Self::uniform(MAX_WELLS_PER_CATEGORY)
    }
}

impl WellCapacities {
    pub fn uniform(capacity: usize) -> Self {
        Self {
            gaussian: capacity,
            ripple: capacity,
            twist: capacity,
            pinch: capacity,
        }
    }

    pub fn get(&self, category: WellCategory) -> usize {
        match category {
            WellCategory::Gaussian => self.gaussian,
            WellCategory::Ripple => self.ripple,
            WellCategory::Twist => self.twist,
            WellCategory::Pinch => self.pinch,
        }
    }

    /// Check every capacity fits the shader arrays. Aggregation itself
    /// accepts any capacity; only the GPU upload is bounded.
    pub fn validate(&self) -> SgtResult<()> {
        for category in WellCategory::ALL {
            let capacity = self.get(category);
            if capacity > MAX_WELLS_PER_CATEGORY {
                return Err(SgtError::CapacityExceedsLimit {
                    category,
                    capacity,
                    limit: MAX_WELLS_PER_CATEGORY,
                });
            }
        }
        Ok(())
    }
}

/// Optional predicates a well must pass. All enabled predicates must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellFilter {
    /// Only wells on exactly this layer
    pub require_same_layer_as: Option<u32>,
    /// Only wells with exactly this tag
    pub require_same_tag_as: Option<String>,
    /// Only wells whose name contains this (case-sensitive)
    pub require_name_contains: Option<String>,
}

impl WellFilter {
    pub fn accepts(&self, well: &Well) -> bool {
        if let Some(layer) = self.require_same_layer_as {
            if well.layer != layer {
                return false;
            }
        }
        if let Some(tag) = &self.require_same_tag_as {
            if well.tag != *tag {
                return false;
            }
        }
        if let Some(fragment) = &self.require_name_contains {
            if !well.name.contains(fragment.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Packed arrays for one category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryBlock {
    pub category: Option<WellCategory>,
    /// Number of valid slots
    pub count: usize,
    /// Eligible wells dropped because the block was full
    pub overflowed: usize,
    pub position_radius: Vec<Vec4>,
    pub strength_opacity: Vec<Vec4>,
    /// Ripple and Twist only
    pub params: Vec<Vec4>,
    /// Twist only
    pub matrices: Vec<Mat4>,
}

impl CategoryBlock {
    fn has_params(category: WellCategory) -> bool {
        matches!(category, WellCategory::Ripple | WellCategory::Twist)
    }

    /// Resize to `capacity` and zero every slot.
    fn reset(&mut self, category: WellCategory, capacity: usize) {
        self.category = Some(category);
        self.count = 0;
        self.overflowed = 0;

        self.position_radius.clear();
        self.position_radius.resize(capacity, Vec4::ZERO);
        self.strength_opacity.clear();
        self.strength_opacity.resize(capacity, Vec4::ZERO);

        self.params.clear();
        if Self::has_params(category) {
            self.params.resize(capacity, Vec4::ZERO);
        }
        self.matrices.clear();
        if category == WellCategory::Twist {
            self.matrices.resize(capacity, Mat4::ZERO);
        }
    }

    pub fn capacity(&self) -> usize {
        self.position_radius.len()
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity()
    }

    fn push(&mut self, well: &Well) {
        let slot = self.count;
        self.position_radius[slot] = well.position.extend(well.radius);
        self.strength_opacity[slot] = Vec4::new(well.strength, well.opacity, 0.0, 0.0);
        if let Some(params) = self.params.get_mut(slot) {
            *params = well.distribution.params();
        }
        if let Some(matrix) = self.matrices.get_mut(slot) {
            *matrix = well.world_to_local();
        }
        self.count += 1;
    }
}

/// Wells packed for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregationResult {
    /// Indexed by `WellCategory::index()`
    pub blocks: [CategoryBlock; 4],
    /// Accepted wells in acceptance order
    pub accepted: Vec<WellId>,
}

impl AggregationResult {
    pub fn block(&self, category: WellCategory) -> &CategoryBlock {
        &self.blocks[category.index()]
    }

    pub fn count(&self, category: WellCategory) -> usize {
        self.block(category).count
    }

    pub fn total_count(&self) -> usize {
        self.blocks.iter().map(|block| block.count).sum()
    }

    pub fn total_overflowed(&self) -> usize {
        self.blocks.iter().map(|block| block.overflowed).sum()
    }

    /// Repack into the fixed-size GPU layout. Wells past
    /// `MAX_WELLS_PER_CATEGORY` in a category are left out.
    pub fn to_gpu(&self) -> GpuSpacetimeWells {
        let mut gpu = GpuSpacetimeWells::default();
        for category in WellCategory::ALL {
            gpu.counts[category.index()] =
                self.count(category).min(MAX_WELLS_PER_CATEGORY) as u32;
        }

        copy_vec4s(
            &mut gpu.gaussian_position_radius,
            &self.block(WellCategory::Gaussian).position_radius,
        );
        copy_vec4s(
            &mut gpu.gaussian_strength_opacity,
            &self.block(WellCategory::Gaussian).strength_opacity,
        );

        let ripple = self.block(WellCategory::Ripple);
        copy_vec4s(&mut gpu.ripple_position_radius, &ripple.position_radius);
        copy_vec4s(&mut gpu.ripple_strength_opacity, &ripple.strength_opacity);
        copy_vec4s(&mut gpu.ripple_params, &ripple.params);

        let twist = self.block(WellCategory::Twist);
        copy_vec4s(&mut gpu.twist_position_radius, &twist.position_radius);
        copy_vec4s(&mut gpu.twist_strength_opacity, &twist.strength_opacity);
        copy_vec4s(&mut gpu.twist_params, &twist.params);
        for (slot, matrix) in gpu.twist_matrices.iter_mut().zip(&twist.matrices) {
            *slot = matrix.to_cols_array();
        }

        let pinch = self.block(WellCategory::Pinch);
        copy_vec4s(&mut gpu.pinch_position_radius, &pinch.position_radius);
        copy_vec4s(&mut gpu.pinch_strength_opacity, &pinch.strength_opacity);

        gpu
    }
}

fn copy_vec4s(dst: &mut [[f32; 4]; MAX_WELLS_PER_CATEGORY], src: &[Vec4]) {
    for (slot, value) in dst.iter_mut().zip(src) {
        *slot = value.to_array();
    }
}

/// GPU-side well data.
/// Must match the WellData struct in the spacetime shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSpacetimeWells {
    /// Valid slots per category: gaussian, ripple, twist, pinch
    pub counts: [u32; 4],
    pub gaussian_position_radius: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub gaussian_strength_opacity: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub ripple_position_radius: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub ripple_strength_opacity: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub ripple_params: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub twist_position_radius: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub twist_strength_opacity: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub twist_params: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    /// Column-major world -> well matrices
    pub twist_matrices: [[f32; 16]; MAX_WELLS_PER_CATEGORY],
    pub pinch_position_radius: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
    pub pinch_strength_opacity: [[f32; 4]; MAX_WELLS_PER_CATEGORY],
}

impl Default for GpuSpacetimeWells {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl GpuSpacetimeWells {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Packs wells into reusable category blocks.
#[derive(Default)]
pub struct WellAggregator {
    result: AggregationResult,
}

impl WellAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result of the last aggregation.
    pub fn result(&self) -> &AggregationResult {
        &self.result
    }

    /// Aggregate `wells` (visited in iteration order) into the internal buffers.
    pub fn aggregate<'a, I>(
        &mut self,
        wells: I,
        capacities: &WellCapacities,
        filter: &WellFilter,
    ) -> &AggregationResult
    where
        I: IntoIterator<Item = (WellId, &'a Well)>,
    {
        for category in WellCategory::ALL {
            self.result.blocks[category.index()].reset(category, capacities.get(category));
        }
        self.result.accepted.clear();

        for (id, well) in wells {
            if !well.enabled {
                continue;
            }
            // NaN radii fail this test too
            if !(well.radius > 0.0) {
                continue;
            }
            if !filter.accepts(well) {
                continue;
            }
            let block = &mut self.result.blocks[well.category().index()];
            if block.is_full() {
                // Capacity 0 excludes the category, nothing overflowed
                if block.capacity() > 0 {
                    block.overflowed += 1;
                }
                continue;
            }
            block.push(well);
            self.result.accepted.push(id);
        }

        &self.result
    }

    /// Aggregate a registry that may not exist; a missing registry is empty.
    pub fn aggregate_registry(
        &mut self,
        registry: Option<&WellRegistry>,
        capacities: &WellCapacities,
        filter: &WellFilter,
    ) -> &AggregationResult {
        match registry {
            Some(registry) => self.aggregate(registry.iter(), capacities, filter),
            None => self.aggregate(std::iter::empty(), capacities, filter),
        }
    }
}

/// One-shot aggregation into a fresh result.
pub fn aggregate<'a, I>(
    wells: I,
    capacities: &WellCapacities,
    filter: &WellFilter,
) -> AggregationResult
where
    I: IntoIterator<Item = (WellId, &'a Well)>,
{
    let mut aggregator = WellAggregator::new();
    aggregator.aggregate(wells, capacities, filter);
    aggregator.result
}

// =============================================================================
// Bevy integration
// =============================================================================

/// Plugin that aggregates the `WellRegistry` into `SpacetimeWells` every frame.
pub struct SpacetimePlugin;

impl Plugin for SpacetimePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WellRegistry>()
            .init_resource::<SpacetimeSettings>()
            .init_resource::<SpacetimeWells>()
            .add_systems(PostUpdate, update_spacetime_wells.in_set(SpacetimeSet::Aggregate));
    }
}

/// Ordering label for the aggregation system.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpacetimeSet {
    Aggregate,
}

/// Capacities and filters used by the aggregation system.
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacetimeSettings {
    pub capacities: WellCapacities,
    pub filter: WellFilter,
}

/// Latest aggregation, ready for upload.
#[derive(Resource, Default)]
pub struct SpacetimeWells {
    aggregator: WellAggregator,
    pub gpu: GpuSpacetimeWells,
}

impl SpacetimeWells {
    pub fn result(&self) -> &AggregationResult {
        self.aggregator.result()
    }
}

/// System that re-packs the wells every frame.
///
/// Capacities larger than the shader arrays leave the previous frame in place.
pub fn update_spacetime_wells(
    registry: Option<Res<WellRegistry>>,
    settings: Res<SpacetimeSettings>,
    mut wells: ResMut<SpacetimeWells>,
) {
    if let Err(e) = settings.capacities.validate() {
        warn_once!("Spacetime wells not updated: {}", e);
        return;
    }

    let wells = wells.as_mut();
    let result = wells.aggregator.aggregate_registry(
        registry.as_deref(),
        &settings.capacities,
        &settings.filter,
    );

    if result.total_overflowed() > 0 {
        warn_once!(
            "Too many spacetime wells ({} dropped), extras ignored",
            result.total_overflowed()
        );
    }

    wells.gpu = result.to_gpu();
}
