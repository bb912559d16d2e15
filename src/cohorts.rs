//! Cohort records and collaborator traits
//!
//! The core reads and writes cohort biomass but never owns the cohort
//! lifecycle: establishment, ageing, and removal belong to an external
//! cohort-management collaborator connected through [`CohortGrowth`] and
//! [`ReproductionPolicy`]. Growth implementations receive the decomposition
//! engine (for mortality-driven residue transfers) and the nitrogen
//! allocator (for uptake) along with the per-cohort limitation multipliers.

use crate::errors::CenturyResult;
use crate::nitrogen::NitrogenAllocator;
use crate::scenario::ScenarioContext;
use crate::site::SiteState;
use crate::soil::DecompositionEngine;
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Fine root mass carried per unit leaf mass when aggregating cohort
/// totals for reporting.
pub const FINE_ROOT_RATIO: FloatValue = 0.5;

/// Coarse root mass carried per unit wood mass when aggregating cohort
/// totals for reporting.
pub const COARSE_ROOT_RATIO: FloatValue = 0.25;

/// One species/age cohort. Biomass is grams dry mass per square metre;
/// multiply by [`CARBON_FRACTION`](crate::CARBON_FRACTION) for carbon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    /// Index into the scenario's species table
    pub species: usize,
    /// unit: years
    pub age: u16,
    /// Live wood (stem + branch) dry mass, g m⁻²
    pub wood_biomass: FloatValue,
    /// Live leaf dry mass, g m⁻²
    pub leaf_biomass: FloatValue,
}

impl Cohort {
    pub fn new(species: usize, age: u16, wood_biomass: FloatValue, leaf_biomass: FloatValue) -> Self {
        Self {
            species,
            age,
            wood_biomass,
            leaf_biomass,
        }
    }

    /// Total live dry mass, g m⁻².
    pub fn total_biomass(&self) -> FloatValue {
        self.wood_biomass + self.leaf_biomass
    }
}

/// Total live dry mass over a site's cohorts, g m⁻². Consumed by the water
/// balance (canopy interception) and the soil temperature model.
pub fn compute_living_biomass(cohorts: &[Cohort]) -> FloatValue {
    cohorts.iter().map(Cohort::total_biomass).sum()
}

/// Monthly cohort growth, supplied by the external cohort-management
/// collaborator.
pub trait CohortGrowth {
    /// Grow every cohort for one month.
    ///
    /// `n_limits` holds one growth-limitation multiplier per cohort, in
    /// cohort order. Implementations are expected to call
    /// [`NitrogenAllocator::uptake`] with their realized tissue increments
    /// and [`DecompositionEngine::partition_residue`] for any
    /// mortality-driven litter or root death, and to record AGNPP/BGNPP and
    /// litterfall on the site's monthly accumulators.
    #[allow(clippy::too_many_arguments)]
    fn grow(
        &self,
        context: &ScenarioContext,
        ecoregion: usize,
        decomposition: &DecompositionEngine,
        allocator: &NitrogenAllocator,
        reproduction: &dyn ReproductionPolicy,
        state: &mut SiteState,
        cohorts: &mut Vec<Cohort>,
        n_limits: &[FloatValue],
        is_final_month_of_timestep: bool,
        is_last_month_of_year: bool,
    ) -> CenturyResult<()>;
}

/// Reproduction decisions, implemented by the external cohort-management
/// collaborator and invoked from growth implementations in the final month
/// of a succession timestep.
pub trait ReproductionPolicy {
    /// Whether light at the forest floor permits `species` to establish.
    fn sufficient_light(&self, species: usize, site: &SiteState) -> bool;

    /// Establish a new cohort of `species` on the site.
    fn establish(&self, species: usize, cohorts: &mut Vec<Cohort>);

    /// Whether a reproductively mature cohort of `species` is present.
    fn mature_present(&self, species: usize, cohorts: &[Cohort]) -> bool;
}

/// Growth collaborator that does nothing; useful for soil-only runs and
/// tests of the biogeochemical core.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NullGrowth;

impl CohortGrowth for NullGrowth {
    fn grow(
        &self,
        _context: &ScenarioContext,
        _ecoregion: usize,
        _decomposition: &DecompositionEngine,
        _allocator: &NitrogenAllocator,
        _reproduction: &dyn ReproductionPolicy,
        _state: &mut SiteState,
        _cohorts: &mut Vec<Cohort>,
        _n_limits: &[FloatValue],
        _is_final_month_of_timestep: bool,
        _is_last_month_of_year: bool,
    ) -> CenturyResult<()> {
        Ok(())
    }
}

/// Reproduction policy that never establishes anything.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NullReproduction;

impl ReproductionPolicy for NullReproduction {
    fn sufficient_light(&self, _species: usize, _site: &SiteState) -> bool {
        false
    }

    fn establish(&self, _species: usize, _cohorts: &mut Vec<Cohort>) {}

    fn mature_present(&self, _species: usize, _cohorts: &[Cohort]) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_living_biomass_sums_all_cohorts() {
        let cohorts = vec![
            Cohort::new(0, 10, 5_000.0, 400.0),
            Cohort::new(1, 35, 12_000.0, 700.0),
        ];
        let total = compute_living_biomass(&cohorts);
        assert!((total - 18_100.0).abs() < 1e-9);
    }

    #[test]
    fn test_living_biomass_of_empty_site_is_zero() {
        assert_eq!(compute_living_biomass(&[]), 0.0);
    }
}
