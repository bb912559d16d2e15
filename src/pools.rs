//! Organic matter pools
//!
//! Each site owns a fixed set of twelve named pools, indexed by [`PoolId`]
//! rather than held behind shared references, so the set is easy to iterate,
//! serialize, and hand to a per-site worker.

use crate::parameters::{EcoregionParameters, InitialPool};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Number of distinct pools per site.
pub const POOL_COUNT: usize = 12;

/// Identity of one organic matter reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolId {
    SurfaceStructural,
    SurfaceMetabolic,
    SoilStructural,
    SoilMetabolic,
    /// Standing and down dead wood
    SurfaceDeadWood,
    /// Dead coarse roots
    SoilDeadWood,
    Som1Surface,
    Som1Soil,
    /// Slow soil organic matter
    Som2,
    /// Passive soil organic matter
    Som3,
    /// Cumulative export to streams (leaching)
    Stream,
    /// Cumulative loss/gain bookkeeping (respiration, fire efflux)
    SourceSink,
}

impl PoolId {
    /// All pools, in storage order.
    pub const ALL: [PoolId; POOL_COUNT] = [
        PoolId::SurfaceStructural,
        PoolId::SurfaceMetabolic,
        PoolId::SoilStructural,
        PoolId::SoilMetabolic,
        PoolId::SurfaceDeadWood,
        PoolId::SoilDeadWood,
        PoolId::Som1Surface,
        PoolId::Som1Soil,
        PoolId::Som2,
        PoolId::Som3,
        PoolId::Stream,
        PoolId::SourceSink,
    ];

    /// The organic pools counted as ecosystem carbon; excludes the stream
    /// export and source/sink bookkeeping pools.
    pub const ORGANIC: [PoolId; 10] = [
        PoolId::SurfaceStructural,
        PoolId::SurfaceMetabolic,
        PoolId::SoilStructural,
        PoolId::SoilMetabolic,
        PoolId::SurfaceDeadWood,
        PoolId::SoilDeadWood,
        PoolId::Som1Surface,
        PoolId::Som1Soil,
        PoolId::Som2,
        PoolId::Som3,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Soil-layer pools are subject to the anaerobic decomposition modifier.
    pub fn is_soil_layer(self) -> bool {
        matches!(
            self,
            PoolId::SoilStructural
                | PoolId::SoilMetabolic
                | PoolId::SoilDeadWood
                | PoolId::Som1Soil
                | PoolId::Som2
                | PoolId::Som3
        )
    }
}

/// Annual base decay rate for each pool (yr⁻¹) before the ecoregion
/// multiplier is applied. CENTURY DEC1..DEC5; dead wood rates follow the
/// forest variant.
pub fn base_decay_rate(id: PoolId) -> FloatValue {
    match id {
        PoolId::SurfaceStructural => 3.9,
        PoolId::SurfaceMetabolic => 14.8,
        PoolId::SoilStructural => 4.9,
        PoolId::SoilMetabolic => 18.5,
        PoolId::SurfaceDeadWood => 0.4,
        PoolId::SoilDeadWood => 0.3,
        PoolId::Som1Surface => 6.0,
        PoolId::Som1Soil => 7.3,
        PoolId::Som2 => 0.2,
        PoolId::Som3 => 0.0045,
        // Accumulator pools never decay
        PoolId::Stream | PoolId::SourceSink => 0.0,
    }
}

/// Per-layer decay multiplier from the ecoregion parameters.
fn decay_multiplier(id: PoolId, ecoregion: &EcoregionParameters) -> FloatValue {
    match id {
        PoolId::SurfaceStructural | PoolId::SurfaceMetabolic => ecoregion.decay_rate_surf,
        PoolId::SoilStructural | PoolId::SoilMetabolic => ecoregion.decay_rate_soil,
        PoolId::SurfaceDeadWood | PoolId::SoilDeadWood => ecoregion.decay_rate_wood,
        PoolId::Som1Surface | PoolId::Som1Soil => ecoregion.decay_rate_som1,
        PoolId::Som2 => ecoregion.decay_rate_som2,
        PoolId::Som3 => ecoregion.decay_rate_som3,
        PoolId::Stream | PoolId::SourceSink => 0.0,
    }
}

/// One named organic matter reservoir.
///
/// Carbon and nitrogen are clamped non-negative after every monthly update;
/// the overdraft of a clamped transfer is discarded, matching the original
/// CENTURY behaviour.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pool {
    /// unit: g C m⁻²
    pub carbon: FloatValue,
    /// unit: g N m⁻²
    pub nitrogen: FloatValue,
    /// unit: fraction of dry mass
    pub fraction_lignin: FloatValue,
    /// Effective annual decay rate (base rate × ecoregion multiplier)
    pub decay_value: FloatValue,
    /// Net N mineralized from this pool since the start of the year;
    /// negative while immobilization dominates
    pub net_mineralization: FloatValue,
}

impl Pool {
    pub fn from_initial(init: InitialPool, id: PoolId, ecoregion: &EcoregionParameters) -> Self {
        Self {
            carbon: init.carbon,
            nitrogen: init.nitrogen,
            fraction_lignin: init.fraction_lignin,
            decay_value: base_decay_rate(id) * decay_multiplier(id, ecoregion),
            net_mineralization: 0.0,
        }
    }

    /// Re-derive the effective decay rate, e.g. after a dynamic-change
    /// snapshot swap replaced the ecoregion multipliers.
    pub fn apply_decay_multiplier(&mut self, id: PoolId, ecoregion: &EcoregionParameters) {
        self.decay_value = base_decay_rate(id) * decay_multiplier(id, ecoregion);
    }

    /// C:N mass ratio, or `None` for an empty pool.
    pub fn cn_ratio(&self) -> Option<FloatValue> {
        if self.nitrogen > 0.0 {
            Some(self.carbon / self.nitrogen)
        } else {
            None
        }
    }

    /// Fold new material into the pool, updating lignin fraction and decay
    /// rate as mass-weighted running averages.
    pub fn blend_residue(
        &mut self,
        carbon: FloatValue,
        nitrogen: FloatValue,
        fraction_lignin: FloatValue,
        decay_value: FloatValue,
    ) {
        let total = self.carbon + carbon;
        if total > 0.0 {
            self.fraction_lignin =
                (self.fraction_lignin * self.carbon + fraction_lignin * carbon) / total;
            self.decay_value = (self.decay_value * self.carbon + decay_value * carbon) / total;
        }
        self.carbon = total;
        self.nitrogen += nitrogen;
    }
}
