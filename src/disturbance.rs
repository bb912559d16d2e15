//! Disturbance Hooks
//!
//! Fires and harvests happen outside the biogeochemical core; their effect
//! on the soil is applied through [`DisturbanceHook`] at the start of the
//! disturbance year, before any monthly processing. The built-in
//! [`FireReductionTable`] burns off severity-dependent fractions of the
//! dead wood, litter, and surface organic layers, routing the carbon and
//! nitrogen to the source/sink pool and the annual fire efflux accumulators.

use crate::pools::PoolId;
use crate::site::SiteState;
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Applies an externally-signalled disturbance to a site's soil layers.
pub trait DisturbanceHook: Sync {
    /// Reduce the dead organic layers for a disturbance of the given
    /// severity. Severity semantics belong to the implementor; out-of-range
    /// severities must be a no-op, not an error.
    fn reduce_layers(&self, severity: u8, state: &mut SiteState);
}

/// Layer loss fractions for one fire severity class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireReductions {
    /// Fraction of surface dead wood consumed, [0, 1]
    pub wood: FloatValue,
    /// Fraction of the surface litter pools consumed, [0, 1]
    pub litter: FloatValue,
    /// Fraction of surface SOM1 consumed, [0, 1]
    pub som: FloatValue,
}

/// Severity-indexed fire reductions. Row `i` serves severity `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireReductionTable {
    rows: Vec<FireReductions>,
}

impl Default for FireReductionTable {
    fn default() -> Self {
        Self {
            rows: vec![
                FireReductions {
                    wood: 0.2,
                    litter: 0.5,
                    som: 0.1,
                },
                FireReductions {
                    wood: 0.4,
                    litter: 0.75,
                    som: 0.25,
                },
                FireReductions {
                    wood: 0.6,
                    litter: 1.0,
                    som: 0.5,
                },
            ],
        }
    }
}

impl FireReductionTable {
    pub fn new(rows: Vec<FireReductions>) -> Self {
        Self { rows }
    }

    fn row(&self, severity: u8) -> Option<&FireReductions> {
        if severity == 0 {
            return None;
        }
        self.rows.get(severity as usize - 1)
    }

    /// Burn `fraction` of a pool's carbon and nitrogen into the source/sink
    /// pool and the annual fire efflux totals.
    fn burn(state: &mut SiteState, id: PoolId, fraction: FloatValue) {
        let pool = state.pool(id);
        let c_loss = pool.carbon * fraction;
        let n_loss = pool.nitrogen * fraction;
        let c_moved = state.move_carbon(id, PoolId::SourceSink, c_loss);
        let n_moved = state.move_nitrogen(id, PoolId::SourceSink, n_loss);
        state.annual.fire_c_efflux += c_moved;
        state.annual.fire_n_efflux += n_moved;
    }
}

impl DisturbanceHook for FireReductionTable {
    fn reduce_layers(&self, severity: u8, state: &mut SiteState) {
        let Some(reductions) = self.row(severity) else {
            return;
        };
        let reductions = *reductions;

        Self::burn(state, PoolId::SurfaceDeadWood, reductions.wood);
        Self::burn(state, PoolId::SurfaceStructural, reductions.litter);
        Self::burn(state, PoolId::SurfaceMetabolic, reductions.litter);
        Self::burn(state, PoolId::Som1Surface, reductions.som);
    }
}

/// Hook that ignores every disturbance signal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NullDisturbance;

impl DisturbanceHook for NullDisturbance {
    fn reduce_layers(&self, _severity: u8, _state: &mut SiteState) {}
}
