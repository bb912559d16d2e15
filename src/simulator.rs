//! Annual Integration Loop
//!
//! [`AnnualIntegrationLoop`] wires the water balance, decomposition
//! cascade, nitrogen budget, and the external growth/reproduction/
//! disturbance collaborators into the per-site yearly cycle: apply any
//! pending disturbance, fetch the year's climate, then run the twelve
//! monthly steps in the configured month order.
//!
//! Sites are independent, so [`AnnualIntegrationLoop::run_landscape`]
//! advances them in parallel with one rayon task per site and folds the
//! results into per-ecoregion summaries afterwards.

use crate::climate::{AnnualClimate, ClimatePhase, ClimateProvider};
use crate::cohorts::{
    compute_living_biomass, Cohort, CohortGrowth, ReproductionPolicy, COARSE_ROOT_RATIO,
    FINE_ROOT_RATIO,
};
use crate::disturbance::DisturbanceHook;
use crate::errors::{CenturyError, CenturyResult};
use crate::nitrogen::NitrogenAllocator;
use crate::pools::PoolId;
use crate::scenario::ScenarioContext;
use crate::site::{ActiveSite, CohortTotals};
use crate::soil::{DecompositionEngine, SoilWaterBalance};
use crate::{FloatValue, CARBON_FRACTION};
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Order in which the twelve months of a simulation year are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthOrder {
    /// Hydrological-year order: July through December, then January through
    /// June. Snowpack built in late months carries into the following
    /// spring within the same simulated year.
    #[default]
    Normal,
    /// Calendar order, January through December. Used when calibrating
    /// against monthly field observations.
    Calibrate,
}

impl MonthOrder {
    /// Zero-based month indices in processing order.
    pub fn sequence(&self) -> [usize; 12] {
        match self {
            MonthOrder::Normal => [6, 7, 8, 9, 10, 11, 0, 1, 2, 3, 4, 5],
            MonthOrder::Calibrate => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }
}

/// Per-ecoregion aggregates over one simulated year of a landscape run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EcoregionSummary {
    pub ecoregion: usize,
    pub site_count: usize,
    /// Mean live cohort dry mass per site, g m⁻²
    pub mean_live_biomass: FloatValue,
    /// Summed organic soil carbon, g C m⁻²
    pub total_soil_carbon: FloatValue,
    /// Summed organic soil nitrogen, g N m⁻²
    pub total_soil_nitrogen: FloatValue,
    /// Summed annual net ecosystem exchange, g C m⁻²
    pub nee: FloatValue,
    /// Summed annual stream nitrogen export, g N m⁻²
    pub stream_n: FloatValue,
}

/// The yearly simulation driver for a set of sites.
pub struct AnnualIntegrationLoop<C, G, R, D> {
    climate: C,
    growth: G,
    reproduction: R,
    disturbance: D,
    water: SoilWaterBalance,
    decomposition: DecompositionEngine,
    nitrogen: NitrogenAllocator,
    month_order: MonthOrder,
    phase: ClimatePhase,
}

impl<C, G, R, D> AnnualIntegrationLoop<C, G, R, D>
where
    C: ClimateProvider,
    G: CohortGrowth,
    R: ReproductionPolicy,
    D: DisturbanceHook,
{
    pub fn new(climate: C, growth: G, reproduction: R, disturbance: D) -> Self {
        Self {
            climate,
            growth,
            reproduction,
            disturbance,
            water: SoilWaterBalance::default(),
            decomposition: DecompositionEngine::new(),
            nitrogen: NitrogenAllocator::new(),
            month_order: MonthOrder::default(),
            phase: ClimatePhase::Future,
        }
    }

    pub fn with_water(mut self, water: SoilWaterBalance) -> Self {
        self.water = water;
        self
    }

    pub fn with_decomposition(mut self, decomposition: DecompositionEngine) -> Self {
        self.decomposition = decomposition;
        self
    }

    pub fn with_nitrogen(mut self, nitrogen: NitrogenAllocator) -> Self {
        self.nitrogen = nitrogen;
        self
    }

    pub fn with_month_order(mut self, month_order: MonthOrder) -> Self {
        self.month_order = month_order;
        self
    }

    pub fn with_phase(mut self, phase: ClimatePhase) -> Self {
        self.phase = phase;
        self
    }

    /// Fetch this year's climate, falling back to the site's last good
    /// record on a data gap.
    fn climate_for(&self, site: &mut ActiveSite, year: i32) -> CenturyResult<AnnualClimate> {
        match self.climate.monthly_weather(site.ecoregion, year, self.phase) {
            Some(record) => {
                site.last_climate = Some(record.clone());
                Ok(record.clone())
            }
            None => match &site.last_climate {
                Some(stale) => {
                    warn!(
                        "No climate for ecoregion {} year {}; reusing the previous record",
                        site.ecoregion, year
                    );
                    Ok(stale.clone())
                }
                None => Err(CenturyError::configuration(
                    "climate",
                    format!(
                        "no climate record for ecoregion {} in year {} and none preceding it",
                        site.ecoregion, year
                    ),
                )),
            },
        }
    }

    /// Advance one site through one simulation year.
    ///
    /// `is_final_year_of_timestep` marks the last year of a succession
    /// timestep; its final month triggers reproduction in growth
    /// implementations.
    pub fn run_site_year(
        &self,
        context: &ScenarioContext,
        site: &mut ActiveSite,
        year: i32,
        is_final_year_of_timestep: bool,
    ) -> CenturyResult<()> {
        let ecoregion = context.ecoregion(site.ecoregion)?;
        site.state.reset_annual_values();

        // Disturbance signalled for this year lands before any monthly work
        if let Some(severity) = site.pending_severity.take() {
            self.disturbance.reduce_layers(severity, &mut site.state);
        }

        let climate = self.climate_for(site, year)?;
        let sequence = self.month_order.sequence();

        for (step, month) in sequence.into_iter().enumerate() {
            let is_last_step = step == sequence.len() - 1;
            let weather = climate.month(month);

            site.state.reset_monthly_values();
            self.nitrogen.deposit(ecoregion, &weather, &mut site.state);

            let live_biomass = compute_living_biomass(&site.cohorts);
            let budget = self
                .water
                .run(&weather, live_biomass, ecoregion, &mut site.state);

            let n_limits = self
                .nitrogen
                .calculate_n_limits(context, &site.state, &site.cohorts)?;

            let sink_before = site.state.pool(PoolId::SourceSink).carbon;
            self.growth.grow(
                context,
                site.ecoregion,
                &self.decomposition,
                &self.nitrogen,
                &self.reproduction,
                &mut site.state,
                &mut site.cohorts,
                &n_limits,
                is_final_year_of_timestep && is_last_step,
                is_last_step,
            )?;

            self.decomposition.decompose_wood(&mut site.state);
            self.decomposition.decompose_litter(&mut site.state);
            self.decomposition.decompose_soil(ecoregion, &mut site.state);

            self.nitrogen.volatilize(ecoregion, &mut site.state);
            self.water.leach(&budget, ecoregion, &mut site.state);

            // NEE: heterotrophic release minus production, positive = source
            let respired = site.state.pool(PoolId::SourceSink).carbon - sink_before;
            site.state.monthly.nee =
                respired - site.state.monthly.agnpp - site.state.monthly.bgnpp;

            let monthly = site.state.monthly;
            site.state.annual.absorb(&monthly);
        }

        let totals = aggregate_cohorts(context, &site.cohorts)?;
        site.state.update_cohort_totals(totals);
        Ok(())
    }

    /// Advance one site through a run of consecutive years ending a
    /// succession timestep.
    pub fn run_site(
        &self,
        context: &ScenarioContext,
        site: &mut ActiveSite,
        start_year: i32,
        years: u32,
    ) -> CenturyResult<()> {
        for offset in 0..years {
            let year = start_year + offset as i32;
            self.run_site_year(context, site, year, offset + 1 == years)?;
        }
        Ok(())
    }
}

impl<C, G, R, D> AnnualIntegrationLoop<C, G, R, D>
where
    C: ClimateProvider + Sync,
    G: CohortGrowth + Sync,
    R: ReproductionPolicy + Sync,
    D: DisturbanceHook + Sync,
{
    /// Advance every site through one simulation year, one rayon task per
    /// site, and aggregate the results per ecoregion.
    pub fn run_landscape(
        &self,
        context: &ScenarioContext,
        sites: &mut [ActiveSite],
        year: i32,
        is_final_year_of_timestep: bool,
    ) -> CenturyResult<Vec<EcoregionSummary>> {
        sites
            .par_iter_mut()
            .try_for_each(|site| self.run_site_year(context, site, year, is_final_year_of_timestep))?;

        let mut summaries: Vec<EcoregionSummary> = (0..context.ecoregion_count())
            .map(|ecoregion| EcoregionSummary {
                ecoregion,
                ..EcoregionSummary::default()
            })
            .collect();

        for site in sites.iter() {
            let summary = &mut summaries[site.ecoregion];
            summary.site_count += 1;
            summary.mean_live_biomass += compute_living_biomass(&site.cohorts);
            summary.total_soil_carbon += site.state.total_soil_carbon();
            summary.total_soil_nitrogen += site.state.total_soil_nitrogen();
            summary.nee += site.state.annual.nee;
            summary.stream_n += site.state.annual.stream_n;
        }
        for summary in &mut summaries {
            if summary.site_count > 0 {
                summary.mean_live_biomass /= summary.site_count as FloatValue;
            }
        }
        Ok(summaries)
    }
}

/// Aggregate live cohort biomass into reporting totals, deriving root
/// compartments from the leaf and wood masses.
fn aggregate_cohorts(
    context: &ScenarioContext,
    cohorts: &[Cohort],
) -> CenturyResult<CohortTotals> {
    let mut totals = CohortTotals::default();
    for cohort in cohorts {
        let species = context.species(cohort.species)?;

        let leaf_c = cohort.leaf_biomass * CARBON_FRACTION;
        let wood_c = cohort.wood_biomass * CARBON_FRACTION;
        let fine_root_c = leaf_c * FINE_ROOT_RATIO;
        let coarse_root_c = wood_c * COARSE_ROOT_RATIO;

        totals.leaf_c += leaf_c;
        totals.leaf_n += leaf_c / species.leaf_cn;
        totals.wood_c += wood_c;
        totals.wood_n += wood_c / species.wood_cn;
        totals.fine_root_c += fine_root_c;
        totals.fine_root_n += fine_root_c / species.fine_root_cn;
        totals.coarse_root_c += coarse_root_c;
        totals.coarse_root_n += coarse_root_c / species.coarse_root_cn;
    }
    Ok(totals)
}
