//! Nitrogen Supply, Demand, and Allocation
//!
//! Mineral N is a single per-site scalar. Inputs are atmospheric deposition
//! and symbiotic fixation; outputs are plant uptake, volatilization, and
//! leaching (handled by the water balance). Growth limitation maps the
//! mineral N level through a per-tolerance-class saturating response, and
//! uptake scales every cohort's demand by a common factor when supply falls
//! short.

use crate::climate::MonthClimate;
use crate::cohorts::Cohort;
use crate::errors::{CenturyError, CenturyResult};
use crate::parameters::{EcoregionParameters, NitrogenParameters};
use crate::scenario::ScenarioContext;
use crate::site::SiteState;
use crate::{FloatValue, CARBON_FRACTION};
use serde::{Deserialize, Serialize};

/// One month's realized tissue increments for a single cohort, g C m⁻².
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TissueGrowth {
    pub leaf: FloatValue,
    pub wood: FloatValue,
    pub fine_root: FloatValue,
    pub coarse_root: FloatValue,
}

impl TissueGrowth {
    /// Nitrogen demanded by these increments at the species' tissue C:N
    /// ratios, g N m⁻².
    pub fn n_demand(&self, species: &crate::parameters::SpeciesParameters) -> FloatValue {
        self.leaf / species.leaf_cn
            + self.wood / species.wood_cn
            + self.fine_root / species.fine_root_cn
            + self.coarse_root / species.coarse_root_cn
    }
}

/// Nitrogen budget operations for one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NitrogenAllocator {
    parameters: NitrogenParameters,
}

impl NitrogenAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: NitrogenParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &NitrogenParameters {
        &self.parameters
    }

    /// Growth-limitation multiplier in [0, 1] for a species of the given
    /// nitrogen tolerance class at the current mineral N level.
    ///
    /// Class [`N_FIXER_CLASS`](crate::parameters::N_FIXER_CLASS) and above
    /// never limits. Below the class's saturation level the response is
    /// Michaelis-Menten in mineral N.
    pub fn growth_reduction_available_n(
        &self,
        n_tolerance: u8,
        mineral_n: FloatValue,
    ) -> FloatValue {
        if n_tolerance >= crate::parameters::N_FIXER_CLASS {
            return 1.0;
        }
        let class = (n_tolerance.max(1) as usize - 1).min(self.parameters.saturation.len() - 1);
        let n = mineral_n.max(0.0);
        if n >= self.parameters.saturation[class] {
            1.0
        } else {
            n / (n + self.parameters.half_saturation[class])
        }
    }

    /// One limitation multiplier per cohort, in cohort order.
    pub fn calculate_n_limits(
        &self,
        context: &ScenarioContext,
        site: &SiteState,
        cohorts: &[Cohort],
    ) -> CenturyResult<Vec<FloatValue>> {
        cohorts
            .iter()
            .map(|cohort| {
                let species = context.species(cohort.species)?;
                Ok(self.growth_reduction_available_n(species.n_tolerance, site.mineral_n))
            })
            .collect()
    }

    /// Satisfy the nitrogen demand of one month's realized growth.
    ///
    /// Resorbed N is consumed before mineral N. When total supply falls
    /// short of total demand every cohort's consumption is scaled by the
    /// same factor, which is returned so growth implementations can scale
    /// their biomass increments to match. N-fixing species add fixed N to
    /// the mineral pool in proportion to site occupancy and place no demand
    /// on it.
    pub fn uptake(
        &self,
        context: &ScenarioContext,
        ecoregion: usize,
        site: &mut SiteState,
        cohorts: &[Cohort],
        growth: &[TissueGrowth],
    ) -> CenturyResult<FloatValue> {
        if cohorts.len() != growth.len() {
            return Err(CenturyError::configuration(
                "uptake",
                format!(
                    "{} cohorts but {} growth records",
                    cohorts.len(),
                    growth.len()
                ),
            ));
        }

        let b_max = context.b_max(ecoregion)?;
        let mut demand = 0.0;
        for (cohort, increments) in cohorts.iter().zip(growth) {
            let species = context.species(cohort.species)?;
            if species.is_n_fixer() {
                let occupancy = (cohort.total_biomass() / b_max).min(1.0);
                site.mineral_n += self.parameters.fixation_rate * occupancy;
            } else {
                demand += increments.n_demand(species);
            }
        }

        if demand <= 0.0 {
            return Ok(1.0);
        }

        let supply = site.resorbed_n + site.mineral_n;
        let scale = (supply / demand).min(1.0);
        let consumed = demand * scale;

        let from_resorbed = consumed.min(site.resorbed_n);
        site.resorbed_n -= from_resorbed;
        site.mineral_n = (site.mineral_n - (consumed - from_resorbed)).max(0.0);
        site.monthly.n_uptake += consumed;

        Ok(scale)
    }

    /// Bank nitrogen resorbed from senescing leaves for reuse by next
    /// season's growth. `leaf_fall` is leaf dry mass shed, g m⁻².
    pub fn resorb_leaf_n(
        &self,
        species: &crate::parameters::SpeciesParameters,
        leaf_fall: FloatValue,
        site: &mut SiteState,
    ) {
        if leaf_fall <= 0.0 {
            return;
        }
        let leaf_n = leaf_fall * CARBON_FRACTION / species.leaf_cn;
        site.resorbed_n += leaf_n * self.parameters.resorption_fraction;
    }

    /// Monthly gaseous loss, a fixed fraction of mineral N.
    pub fn volatilize(&self, ecoregion: &EcoregionParameters, site: &mut SiteState) {
        let lost = site.mineral_n * ecoregion.denitrification_fraction;
        site.mineral_n -= lost;
        site.monthly.n_volatilized += lost;
    }

    /// Monthly atmospheric deposition: a wet component scaling with
    /// precipitation plus one twelfth of the annual dry component, plus any
    /// deposition carried on the climate record itself.
    pub fn deposit(
        &self,
        ecoregion: &EcoregionParameters,
        weather: &MonthClimate,
        site: &mut SiteState,
    ) {
        let deposited = ecoregion.atmos_n_slope * weather.precipitation
            + ecoregion.atmos_n_intercept / 12.0
            + weather.n_deposition;
        site.mineral_n += deposited;
        site.monthly.n_deposition += deposited;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{InitialPools, SpeciesParameters};
    use crate::scenario::ScenarioContext;
    use approx::assert_relative_eq;

    fn context() -> ScenarioContext {
        ScenarioContext::new(
            vec![EcoregionParameters::default()],
            vec![
                SpeciesParameters::default(),
                SpeciesParameters {
                    name: "fixer".to_string(),
                    n_tolerance: 4,
                    ..SpeciesParameters::default()
                },
            ],
        )
        .unwrap()
    }

    fn site() -> SiteState {
        SiteState::new(&InitialPools::default(), &EcoregionParameters::default())
    }

    mod growth_reduction {
        use super::*;

        #[test]
        fn test_bounded_between_zero_and_one() {
            let allocator = NitrogenAllocator::new();
            for tolerance in 1..=4u8 {
                for n in [0.0, 0.1, 1.0, 5.0, 50.0] {
                    let limit = allocator.growth_reduction_available_n(tolerance, n);
                    assert!((0.0..=1.0).contains(&limit), "limit {} out of range", limit);
                }
            }
        }

        #[test]
        fn test_fixer_class_never_limited() {
            let allocator = NitrogenAllocator::new();
            assert_relative_eq!(allocator.growth_reduction_available_n(4, 0.0), 1.0);
        }

        #[test]
        fn test_saturation_reaches_one() {
            let allocator = NitrogenAllocator::new();
            let saturation = allocator.parameters.saturation[0];
            assert_relative_eq!(
                allocator.growth_reduction_available_n(1, saturation),
                1.0
            );
        }

        #[test]
        fn test_monotonic_in_mineral_n() {
            let allocator = NitrogenAllocator::new();
            let mut last = 0.0;
            for n in [0.0, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0] {
                let limit = allocator.growth_reduction_available_n(2, n);
                assert!(limit >= last);
                last = limit;
            }
        }

        #[test]
        fn test_tolerant_class_less_limited() {
            let allocator = NitrogenAllocator::new();
            let strict = allocator.growth_reduction_available_n(1, 2.0);
            let tolerant = allocator.growth_reduction_available_n(3, 2.0);
            assert!(tolerant > strict);
        }
    }

    mod uptake {
        use super::*;

        #[test]
        fn test_full_supply_returns_unit_scale() {
            let context = context();
            let mut site = site();
            site.mineral_n = 100.0;
            let cohorts = vec![Cohort::new(0, 10, 1000.0, 200.0)];
            let growth = vec![TissueGrowth {
                leaf: 50.0,
                wood: 100.0,
                fine_root: 25.0,
                coarse_root: 25.0,
            }];

            let scale = NitrogenAllocator::new()
                .uptake(&context, 0, &mut site, &cohorts, &growth)
                .unwrap();

            assert_relative_eq!(scale, 1.0);
            assert!(site.monthly.n_uptake > 0.0);
        }

        #[test]
        fn test_shortfall_scales_demand_and_empties_supply() {
            let context = context();
            let mut site = site();
            site.mineral_n = 0.1;
            site.resorbed_n = 0.0;
            let cohorts = vec![Cohort::new(0, 10, 1000.0, 200.0)];
            let growth = vec![TissueGrowth {
                leaf: 500.0,
                wood: 1000.0,
                fine_root: 250.0,
                coarse_root: 250.0,
            }];

            let scale = NitrogenAllocator::new()
                .uptake(&context, 0, &mut site, &cohorts, &growth)
                .unwrap();

            assert!(scale < 1.0);
            assert!(site.mineral_n >= 0.0);
            assert!(site.mineral_n < 1e-9, "supply should be exhausted");
        }

        #[test]
        fn test_resorbed_n_consumed_first() {
            let context = context();
            let mut site = site();
            site.mineral_n = 50.0;
            site.resorbed_n = 1.0;
            let cohorts = vec![Cohort::new(0, 10, 100.0, 20.0)];
            let growth = vec![TissueGrowth {
                leaf: 10.0,
                ..TissueGrowth::default()
            }];
            let demand = 10.0 / SpeciesParameters::default().leaf_cn;

            NitrogenAllocator::new()
                .uptake(&context, 0, &mut site, &cohorts, &growth)
                .unwrap();

            assert_relative_eq!(site.resorbed_n, 1.0 - demand, epsilon = 1e-9);
            assert_relative_eq!(site.mineral_n, 50.0, epsilon = 1e-9);
        }

        #[test]
        fn test_fixer_adds_mineral_n_without_demand() {
            let context = context();
            let mut site = site();
            site.mineral_n = 0.0;
            let cohorts = vec![Cohort::new(1, 10, 1000.0, 200.0)];
            let growth = vec![TissueGrowth {
                leaf: 100.0,
                ..TissueGrowth::default()
            }];

            let scale = NitrogenAllocator::new()
                .uptake(&context, 0, &mut site, &cohorts, &growth)
                .unwrap();

            assert_relative_eq!(scale, 1.0);
            assert!(site.mineral_n > 0.0, "fixation should add mineral N");
        }

        #[test]
        fn test_length_mismatch_is_configuration_error() {
            let context = context();
            let mut site = site();
            let cohorts = vec![Cohort::new(0, 10, 100.0, 20.0)];

            let result = NitrogenAllocator::new().uptake(&context, 0, &mut site, &cohorts, &[]);
            assert!(matches!(result, Err(CenturyError::Configuration { .. })));
        }
    }

    mod fluxes {
        use super::*;

        #[test]
        fn test_volatilize_removes_fixed_fraction() {
            let ecoregion = EcoregionParameters::default();
            let mut site = site();
            site.mineral_n = 10.0;

            NitrogenAllocator::new().volatilize(&ecoregion, &mut site);

            assert_relative_eq!(
                site.mineral_n,
                10.0 * (1.0 - ecoregion.denitrification_fraction),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                site.monthly.n_volatilized,
                10.0 * ecoregion.denitrification_fraction,
                epsilon = 1e-12
            );
        }

        #[test]
        fn test_deposit_scales_with_precipitation() {
            let ecoregion = EcoregionParameters::default();
            let mut dry = site();
            let mut wet = site();
            let climate = crate::climate::AnnualClimate::uniform(8.0, 15.0, 8.0, 22.0, 6.0);

            let allocator = NitrogenAllocator::new();
            allocator.deposit(&ecoregion, &climate.month(0), &mut wet);

            let drought = crate::climate::AnnualClimate::uniform(1.0, 15.0, 8.0, 22.0, 6.0);
            allocator.deposit(&ecoregion, &drought.month(0), &mut dry);

            assert!(wet.monthly.n_deposition > dry.monthly.n_deposition);
            assert!(dry.monthly.n_deposition > 0.0, "dry deposition persists");
        }

        #[test]
        fn test_resorption_banks_fraction_of_leaf_n() {
            let species = SpeciesParameters::default();
            let mut site = site();
            let allocator = NitrogenAllocator::new();

            allocator.resorb_leaf_n(&species, 100.0, &mut site);

            let leaf_n = 100.0 * CARBON_FRACTION / species.leaf_cn;
            assert_relative_eq!(
                site.resorbed_n,
                leaf_n * allocator.parameters.resorption_fraction,
                epsilon = 1e-12
            );
        }
    }
}
