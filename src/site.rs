//! Per-site mutable state
//!
//! [`SiteState`] carries everything one site mutates during a simulated
//! month: the twelve organic matter pools, the mineral nitrogen scalar, the
//! water-balance scalars, and the monthly/annual flux accumulators. Sites
//! are independent of each other, so a landscape can be advanced with one
//! worker per site and no locking.

use crate::climate::AnnualClimate;
use crate::cohorts::Cohort;
use crate::parameters::{EcoregionParameters, InitialPools};
use crate::pools::{Pool, PoolId, POOL_COUNT};
use crate::FloatValue;
use log::debug;
use serde::{Deserialize, Serialize};

/// Fluxes accumulated within a single month and folded into the annual
/// totals when the month completes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MonthlyFluxes {
    /// Above-ground net primary productivity, g C m⁻²
    pub agnpp: FloatValue,
    /// Below-ground net primary productivity, g C m⁻²
    pub bgnpp: FloatValue,
    /// Litterfall carbon, g C m⁻²
    pub litterfall: FloatValue,
    /// Net ecosystem exchange, g C m⁻² (positive = source)
    pub nee: FloatValue,
    /// Nitrogen leached to streams, g N m⁻²
    pub stream_n: FloatValue,
    /// Dissolved organic carbon leached to streams, g C m⁻²
    pub stream_c: FloatValue,
    /// Nitrogen taken up by cohort growth, g N m⁻²
    pub n_uptake: FloatValue,
    /// Atmospheric nitrogen deposition received, g N m⁻²
    pub n_deposition: FloatValue,
    /// Nitrogen volatilized, g N m⁻²
    pub n_volatilized: FloatValue,
    /// Actual evapotranspiration, cm
    pub actual_et: FloatValue,
}

/// Annual flux totals, zeroed by [`SiteState::reset_annual_values`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnnualFluxes {
    pub agnpp: FloatValue,
    pub bgnpp: FloatValue,
    pub litterfall: FloatValue,
    pub nee: FloatValue,
    pub stream_n: FloatValue,
    pub stream_c: FloatValue,
    pub n_uptake: FloatValue,
    pub n_deposition: FloatValue,
    pub n_volatilized: FloatValue,
    pub actual_et: FloatValue,
    /// Carbon released by fire at year start, g C m⁻²
    pub fire_c_efflux: FloatValue,
    /// Nitrogen released by fire at year start, g N m⁻²
    pub fire_n_efflux: FloatValue,
}

impl AnnualFluxes {
    /// Fold one completed month into the annual totals.
    pub fn absorb(&mut self, month: &MonthlyFluxes) {
        self.agnpp += month.agnpp;
        self.bgnpp += month.bgnpp;
        self.litterfall += month.litterfall;
        self.nee += month.nee;
        self.stream_n += month.stream_n;
        self.stream_c += month.stream_c;
        self.n_uptake += month.n_uptake;
        self.n_deposition += month.n_deposition;
        self.n_volatilized += month.n_volatilized;
        self.actual_et += month.actual_et;
    }
}

/// Cohort-aggregated carbon and nitrogen, refreshed at year end for
/// reporting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CohortTotals {
    pub leaf_c: FloatValue,
    pub leaf_n: FloatValue,
    pub fine_root_c: FloatValue,
    pub fine_root_n: FloatValue,
    pub wood_c: FloatValue,
    pub wood_n: FloatValue,
    pub coarse_root_c: FloatValue,
    pub coarse_root_n: FloatValue,
}

/// Mutable state for one active site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteState {
    pools: [Pool; POOL_COUNT],

    /// Plant-available mineral nitrogen (single scalar, not depth-resolved),
    /// g N m⁻²
    pub mineral_n: FloatValue,
    /// Nitrogen resorbed from senescing leaves, available ahead of mineral N,
    /// g N m⁻²
    pub resorbed_n: FloatValue,

    /// Water stored in the soil profile, cm
    pub soil_water_content: FloatValue,
    /// Liquid water equivalent of the snowpack, cm
    pub snowpack: FloatValue,
    /// Saturated flow above field capacity this month, cm
    pub water_movement: FloatValue,
    /// Plant-available water this month, cm
    pub available_water: FloatValue,
    /// °C
    pub soil_temperature: FloatValue,
    /// Combined moisture × temperature decomposition multiplier, [0, 1]
    pub decay_factor: FloatValue,
    /// Anaerobic decomposition multiplier for soil-layer pools, [min, 1]
    pub anaerobic_effect: FloatValue,

    pub monthly: MonthlyFluxes,
    pub annual: AnnualFluxes,
    pub cohort_totals: CohortTotals,

    /// Number of transfers clamped against an overdrawn pool. Diagnostic
    /// only; clamps are never fatal.
    pub clamp_events: u64,
}

impl SiteState {
    /// Initialize a site from direct parameter values.
    pub fn new(init: &InitialPools, ecoregion: &EcoregionParameters) -> Self {
        let initial = [
            (PoolId::SurfaceStructural, init.surface_structural),
            (PoolId::SurfaceMetabolic, init.surface_metabolic),
            (PoolId::SoilStructural, init.soil_structural),
            (PoolId::SoilMetabolic, init.soil_metabolic),
            (PoolId::SurfaceDeadWood, init.surface_dead_wood),
            (PoolId::SoilDeadWood, init.soil_dead_wood),
            (PoolId::Som1Surface, init.som1_surface),
            (PoolId::Som1Soil, init.som1_soil),
            (PoolId::Som2, init.som2),
            (PoolId::Som3, init.som3),
        ];

        let mut pools = [Pool::default(); POOL_COUNT];
        for (id, values) in initial {
            pools[id.index()] = Pool::from_initial(values, id, ecoregion);
        }

        Self {
            pools,
            mineral_n: init.mineral_n,
            resorbed_n: 0.0,
            soil_water_content: ecoregion.wilting_floor(),
            snowpack: 0.0,
            water_movement: 0.0,
            available_water: 0.0,
            soil_temperature: 0.0,
            decay_factor: 0.0,
            anaerobic_effect: 1.0,
            monthly: MonthlyFluxes::default(),
            annual: AnnualFluxes::default(),
            cohort_totals: CohortTotals::default(),
            clamp_events: 0,
        }
    }

    pub fn pool(&self, id: PoolId) -> &Pool {
        &self.pools[id.index()]
    }

    pub fn pool_mut(&mut self, id: PoolId) -> &mut Pool {
        &mut self.pools[id.index()]
    }

    /// Move carbon between pools, clamped to what the source holds.
    /// Returns the amount actually moved.
    pub fn move_carbon(&mut self, from: PoolId, to: PoolId, amount: FloatValue) -> FloatValue {
        let available = self.pools[from.index()].carbon;
        let moved = amount.clamp(0.0, available);
        if amount > available {
            self.clamp_events += 1;
            debug!(
                "carbon transfer {:?} -> {:?} clamped from {} to {}",
                from, to, amount, moved
            );
        }
        self.pools[from.index()].carbon -= moved;
        self.pools[to.index()].carbon += moved;
        moved
    }

    /// Move nitrogen between pools, clamped to what the source holds.
    /// Returns the amount actually moved.
    pub fn move_nitrogen(&mut self, from: PoolId, to: PoolId, amount: FloatValue) -> FloatValue {
        let available = self.pools[from.index()].nitrogen;
        let moved = amount.clamp(0.0, available);
        if amount > available {
            self.clamp_events += 1;
            debug!(
                "nitrogen transfer {:?} -> {:?} clamped from {} to {}",
                from, to, amount, moved
            );
        }
        self.pools[from.index()].nitrogen -= moved;
        self.pools[to.index()].nitrogen += moved;
        moved
    }

    /// Remove up to `amount` of mineral N; returns the amount removed.
    pub fn take_mineral_n(&mut self, amount: FloatValue) -> FloatValue {
        let taken = amount.clamp(0.0, self.mineral_n);
        if amount > self.mineral_n {
            self.clamp_events += 1;
        }
        self.mineral_n -= taken;
        taken
    }

    /// Total organic carbon across the ecosystem pools (stream and
    /// source/sink bookkeeping excluded), g C m⁻².
    pub fn total_soil_carbon(&self) -> FloatValue {
        PoolId::ORGANIC
            .iter()
            .map(|id| self.pools[id.index()].carbon)
            .sum()
    }

    /// Total organic plus mineral nitrogen, g N m⁻².
    pub fn total_soil_nitrogen(&self) -> FloatValue {
        let organic: FloatValue = PoolId::ORGANIC
            .iter()
            .map(|id| self.pools[id.index()].nitrogen)
            .sum();
        organic + self.mineral_n
    }

    /// Litter dry mass (surface structural + metabolic), g m⁻². Used by the
    /// water balance for interception and by the soil temperature model.
    pub fn litter_biomass(&self) -> FloatValue {
        (self.pool(PoolId::SurfaceStructural).carbon + self.pool(PoolId::SurfaceMetabolic).carbon)
            / crate::CARBON_FRACTION
    }

    /// Zero the monthly accumulators at the top of a month.
    pub fn reset_monthly_values(&mut self) {
        self.monthly = MonthlyFluxes::default();
    }

    /// Zero the annual accumulators and per-pool mineralization counters at
    /// the start of a simulated year.
    pub fn reset_annual_values(&mut self) {
        self.annual = AnnualFluxes::default();
        self.monthly = MonthlyFluxes::default();
        for pool in self.pools.iter_mut() {
            pool.net_mineralization = 0.0;
        }
    }

    /// Re-derive pool decay rates after the scenario swapped in new
    /// ecoregion multipliers (a "dynamic change" event).
    pub fn apply_decay_multipliers(&mut self, ecoregion: &EcoregionParameters) {
        for id in PoolId::ALL {
            self.pools[id.index()].apply_decay_multiplier(id, ecoregion);
        }
    }

    /// Refresh the cohort-aggregated C/N summary for year-end reporting.
    pub fn update_cohort_totals(&mut self, totals: CohortTotals) {
        self.cohort_totals = totals;
    }
}

/// One active landscape cell: its ecoregion assignment, biogeochemical
/// state, cohorts, and the climate record most recently fetched for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSite {
    /// Index into the scenario's ecoregion table
    pub ecoregion: usize,
    pub state: SiteState,
    pub cohorts: Vec<Cohort>,
    /// Last successfully retrieved climate record; reused on a data gap
    pub last_climate: Option<AnnualClimate>,
    /// Fire/harvest severity to apply at the next year start, if any
    pub pending_severity: Option<u8>,
}

impl ActiveSite {
    pub fn new(ecoregion: usize, state: SiteState) -> Self {
        Self {
            ecoregion,
            state,
            cohorts: Vec::new(),
            last_climate: None,
            pending_severity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_state() -> SiteState {
        SiteState::new(&InitialPools::default(), &EcoregionParameters::default())
    }

    #[test]
    fn test_new_site_starts_at_wilting_floor() {
        let ecoregion = EcoregionParameters::default();
        let state = SiteState::new(&InitialPools::default(), &ecoregion);
        assert!((state.soil_water_content - ecoregion.wilting_floor()).abs() < 1e-12);
        assert!(state.snowpack == 0.0);
    }

    #[test]
    fn test_move_carbon_clamps_overdraft() {
        let mut state = default_state();
        let available = state.pool(PoolId::Som1Surface).carbon;

        let moved = state.move_carbon(PoolId::Som1Surface, PoolId::Som2, available + 50.0);

        assert!((moved - available).abs() < 1e-12);
        assert_eq!(state.pool(PoolId::Som1Surface).carbon, 0.0);
        assert_eq!(state.clamp_events, 1);
    }

    #[test]
    fn test_move_carbon_ignores_negative_request() {
        let mut state = default_state();
        let before = state.pool(PoolId::Som2).carbon;
        let moved = state.move_carbon(PoolId::Som2, PoolId::Som3, -5.0);
        assert_eq!(moved, 0.0);
        assert_eq!(state.pool(PoolId::Som2).carbon, before);
    }

    #[test]
    fn test_take_mineral_n_never_goes_negative() {
        let mut state = default_state();
        let taken = state.take_mineral_n(state.mineral_n + 10.0);
        assert!(taken > 0.0);
        assert_eq!(state.mineral_n, 0.0);
    }

    #[test]
    fn test_reset_annual_values_clears_mineralization() {
        let mut state = default_state();
        state.pool_mut(PoolId::Som1Soil).net_mineralization = 3.0;
        state.annual.nee = -12.0;

        state.reset_annual_values();

        assert_eq!(state.pool(PoolId::Som1Soil).net_mineralization, 0.0);
        assert_eq!(state.annual.nee, 0.0);
    }

    #[test]
    fn test_total_soil_carbon_excludes_bookkeeping_pools() {
        let mut state = default_state();
        let before = state.total_soil_carbon();
        state.pool_mut(PoolId::SourceSink).carbon += 500.0;
        state.pool_mut(PoolId::Stream).carbon += 100.0;
        assert!((state.total_soil_carbon() - before).abs() < 1e-12);
    }

    #[test]
    fn test_state_serialization_roundtrip() {
        let mut state = default_state();
        state.mineral_n = 3.5;
        state.snowpack = 2.0;
        state.pool_mut(PoolId::Som2).carbon += 42.0;

        let json = serde_json::to_string(&state).unwrap();
        let restored: SiteState = serde_json::from_str(&json).unwrap();

        assert!((state.mineral_n - restored.mineral_n).abs() < 1e-10);
        assert!((state.snowpack - restored.snowpack).abs() < 1e-10);
        assert!(
            (state.pool(PoolId::Som2).carbon - restored.pool(PoolId::Som2).carbon).abs() < 1e-10
        );
        assert!((state.total_soil_carbon() - restored.total_soil_carbon()).abs() < 1e-10);
    }
}
