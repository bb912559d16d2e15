//! Initial pool values
//!
//! Direct-parameter initialization of the organic matter pools at site
//! creation, used when no spin-up simulation supplies the starting state.

use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Starting carbon, nitrogen, and lignin content for one pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitialPool {
    /// unit: g C m⁻²
    pub carbon: FloatValue,
    /// unit: g N m⁻²
    pub nitrogen: FloatValue,
    /// unit: fraction of dry mass
    pub fraction_lignin: FloatValue,
}

impl InitialPool {
    pub const fn new(carbon: FloatValue, nitrogen: FloatValue, fraction_lignin: FloatValue) -> Self {
        Self {
            carbon,
            nitrogen,
            fraction_lignin,
        }
    }
}

/// Starting state for every organic matter pool plus the mineral N scalar.
///
/// Defaults approximate a mid-successional temperate forest soil.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialPools {
    pub surface_structural: InitialPool,
    pub surface_metabolic: InitialPool,
    pub soil_structural: InitialPool,
    pub soil_metabolic: InitialPool,
    pub surface_dead_wood: InitialPool,
    pub soil_dead_wood: InitialPool,
    pub som1_surface: InitialPool,
    pub som1_soil: InitialPool,
    pub som2: InitialPool,
    pub som3: InitialPool,

    /// Starting plant-available mineral nitrogen
    /// unit: g N m⁻²
    pub mineral_n: FloatValue,
}

impl Default for InitialPools {
    fn default() -> Self {
        Self {
            surface_structural: InitialPool::new(120.0, 1.0, 0.25),
            surface_metabolic: InitialPool::new(50.0, 2.0, 0.0),
            soil_structural: InitialPool::new(100.0, 0.9, 0.25),
            soil_metabolic: InitialPool::new(40.0, 1.8, 0.0),
            surface_dead_wood: InitialPool::new(300.0, 1.2, 0.25),
            soil_dead_wood: InitialPool::new(150.0, 0.8, 0.25),
            som1_surface: InitialPool::new(50.0, 3.5, 0.0),
            som1_soil: InitialPool::new(100.0, 7.0, 0.0),
            som2: InitialPool::new(2500.0, 125.0, 0.0),
            som3: InitialPool::new(1300.0, 130.0, 0.0),
            mineral_n: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_non_negative() {
        let init = InitialPools::default();
        for pool in [
            init.surface_structural,
            init.surface_metabolic,
            init.soil_structural,
            init.soil_metabolic,
            init.surface_dead_wood,
            init.soil_dead_wood,
            init.som1_surface,
            init.som1_soil,
            init.som2,
            init.som3,
        ] {
            assert!(pool.carbon >= 0.0);
            assert!(pool.nitrogen >= 0.0);
            assert!((0.0..=1.0).contains(&pool.fraction_lignin));
        }
        assert!(init.mineral_n >= 0.0);
    }

    #[test]
    fn test_passive_pool_is_n_rich() {
        let init = InitialPools::default();
        let som2_cn = init.som2.carbon / init.som2.nitrogen;
        let som3_cn = init.som3.carbon / init.som3.nitrogen;
        assert!(
            som3_cn < som2_cn,
            "The passive pool should have a narrower C:N ratio than the slow pool"
        );
    }
}
