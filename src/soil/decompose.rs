//! Organic Matter Decomposition
//!
//! First-order decay of the litter, wood, and soil organic matter pools
//! following the CENTURY cascade (LITDEC/SOMDEC/WOODEC), and partitioning of
//! new dead residue into the structural and metabolic pools (PARTIT).
//!
//! # Algorithm
//!
//! For each pool, the monthly carbon flow is
//!
//! ```text
//! flow = C × decayFactor × decayValue × exp(-ligninEffect × fractionLignin)
//!          × anaerobicEffect (soil layers) × MONTH_ADJUST
//! ```
//!
//! A respiration share of every flow is routed to the source/sink pool with
//! its nitrogen mineralized; the remainder moves down the cascade. Nitrogen
//! accompanies carbon at the source pool's C:N ratio and is rebalanced
//! against the destination's target ratio: excess nitrogen is mineralized,
//! deficits are immobilized from mineral N while it lasts.
//!
//! Total carbon plus nitrogen removed from a pool in one month never exceeds
//! its pre-decay content; overdrawn transfers are clamped and counted on the
//! site state.

use crate::errors::{CenturyError, CenturyResult};
use crate::parameters::{DecompositionParameters, EcoregionParameters};
use crate::pools::PoolId;
use crate::site::SiteState;
use crate::{FloatValue, CARBON_FRACTION};
use serde::{Deserialize, Serialize};

/// Annual decay constants are applied at monthly resolution.
pub const MONTH_ADJUST: FloatValue = 1.0 / 12.0;

/// Destination layer for new dead residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidueLayer {
    /// Leaf litter and dead standing material
    Surface,
    /// Dead fine roots
    Soil,
}

/// The CENTURY decomposition cascade for one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecompositionEngine {
    parameters: DecompositionParameters,
}

impl DecompositionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: DecompositionParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &DecompositionParameters {
        &self.parameters
    }

    /// Monthly first-order carbon flow out of `id`, clamped to the pool.
    fn carbon_flow(&self, site: &SiteState, id: PoolId) -> FloatValue {
        let pool = site.pool(id);
        let anaerobic = if id.is_soil_layer() {
            site.anaerobic_effect
        } else {
            1.0
        };
        let flow = pool.carbon
            * site.decay_factor
            * pool.decay_value
            * (-self.parameters.lignin_decay_effect * pool.fraction_lignin).exp()
            * anaerobic
            * MONTH_ADJUST;
        flow.min(pool.carbon).max(0.0)
    }

    /// Respire `c_loss` from `from` to the source/sink pool, mineralizing
    /// the accompanying nitrogen.
    fn respire(&self, site: &mut SiteState, from: PoolId, c_loss: FloatValue) {
        // N follows C at the pre-flow ratio
        let cn_before = site.pool(from).cn_ratio();
        let moved = site.move_carbon(from, PoolId::SourceSink, c_loss);
        if moved <= 0.0 {
            return;
        }
        if let Some(cn) = cn_before {
            let n_flow = moved / cn;
            let pool = site.pool_mut(from);
            let mineralized = n_flow.min(pool.nitrogen);
            pool.nitrogen -= mineralized;
            pool.net_mineralization += mineralized;
            site.mineral_n += mineralized;
        }
    }

    /// Move `c_flow` of carbon from `from` to `to`, carrying nitrogen at the
    /// source C:N ratio and rebalancing against `target_cn`.
    fn transfer(
        &self,
        site: &mut SiteState,
        from: PoolId,
        to: PoolId,
        c_flow: FloatValue,
        target_cn: FloatValue,
    ) {
        let cn_before = site.pool(from).cn_ratio();
        let moved = site.move_carbon(from, to, c_flow);
        if moved <= 0.0 {
            return;
        }

        let n_proportional = match cn_before {
            Some(cn) => moved / cn,
            None => 0.0,
        };
        let n_moved = site.move_nitrogen(from, to, n_proportional);

        let n_required = moved / target_cn;
        if n_moved > n_required {
            // N-rich flow: mineralize the excess out of the destination
            let excess = n_moved - n_required;
            let pool = site.pool_mut(to);
            let released = excess.min(pool.nitrogen);
            pool.nitrogen -= released;
            site.mineral_n += released;
            site.pool_mut(from).net_mineralization += released;
        } else {
            // N-poor flow: immobilize mineral N into the destination
            let immobilized = site.take_mineral_n(n_required - n_moved);
            site.pool_mut(to).nitrogen += immobilized;
            site.pool_mut(from).net_mineralization -= immobilized;
        }
    }

    /// Decompose the four litter pools (surface and soil, structural and
    /// metabolic).
    pub fn decompose_litter(&self, site: &mut SiteState) {
        self.decompose_structural(
            site,
            PoolId::SurfaceStructural,
            PoolId::Som1Surface,
            self.parameters.structural_surface_respiration,
        );
        self.decompose_structural(
            site,
            PoolId::SoilStructural,
            PoolId::Som1Soil,
            self.parameters.structural_soil_respiration,
        );
        self.decompose_metabolic(site, PoolId::SurfaceMetabolic, PoolId::Som1Surface);
        self.decompose_metabolic(site, PoolId::SoilMetabolic, PoolId::Som1Soil);
    }

    /// Structural litter splits into a lignin share bound for SOM2 and a
    /// cellulose share bound for SOM1 of the same layer.
    fn decompose_structural(
        &self,
        site: &mut SiteState,
        source: PoolId,
        som1: PoolId,
        respiration_fraction: FloatValue,
    ) {
        let flow = self.carbon_flow(site, source);
        if flow <= 0.0 {
            return;
        }

        let lignin_share = flow * site.pool(source).fraction_lignin.clamp(0.0, 1.0);
        let cellulose_share = flow - lignin_share;

        let lignin_respired = lignin_share * self.parameters.lignin_respiration;
        let cellulose_respired = cellulose_share * respiration_fraction;

        self.respire(site, source, lignin_respired + cellulose_respired);
        self.transfer(
            site,
            source,
            PoolId::Som2,
            lignin_share - lignin_respired,
            self.parameters.cn_ratio_som2,
        );
        self.transfer(
            site,
            source,
            som1,
            cellulose_share - cellulose_respired,
            self.parameters.cn_ratio_som1,
        );
    }

    fn decompose_metabolic(&self, site: &mut SiteState, source: PoolId, som1: PoolId) {
        let flow = self.carbon_flow(site, source);
        if flow <= 0.0 {
            return;
        }
        let respired = flow * self.parameters.metabolic_respiration;
        self.respire(site, source, respired);
        self.transfer(site, source, som1, flow - respired, self.parameters.cn_ratio_som1);
    }

    /// Decompose dead wood and dead coarse roots.
    pub fn decompose_wood(&self, site: &mut SiteState) {
        let flow = self.carbon_flow(site, PoolId::SurfaceDeadWood);
        if flow > 0.0 {
            let respired = flow * self.parameters.wood_respiration;
            self.respire(site, PoolId::SurfaceDeadWood, respired);
            self.transfer(
                site,
                PoolId::SurfaceDeadWood,
                PoolId::Som1Surface,
                flow - respired,
                self.parameters.cn_ratio_som1,
            );
        }

        let flow = self.carbon_flow(site, PoolId::SoilDeadWood);
        if flow > 0.0 {
            let respired = flow * self.parameters.coarse_root_respiration;
            self.respire(site, PoolId::SoilDeadWood, respired);
            self.transfer(
                site,
                PoolId::SoilDeadWood,
                PoolId::Som1Soil,
                flow - respired,
                self.parameters.cn_ratio_som1,
            );
        }
    }

    /// Decompose the four soil organic matter pools.
    pub fn decompose_soil(&self, ecoregion: &EcoregionParameters, site: &mut SiteState) {
        self.decompose_som1_surface(site);
        self.decompose_som1_soil(ecoregion, site);
        self.decompose_som2(ecoregion, site);
        self.decompose_som3(site);
    }

    fn decompose_som1_surface(&self, site: &mut SiteState) {
        let flow = self.carbon_flow(site, PoolId::Som1Surface);
        if flow <= 0.0 {
            return;
        }
        let respired = flow * self.parameters.som1_surface_respiration;
        self.respire(site, PoolId::Som1Surface, respired);
        self.transfer(
            site,
            PoolId::Som1Surface,
            PoolId::Som2,
            flow - respired,
            self.parameters.cn_ratio_som2,
        );
    }

    /// SOM1-soil splits between respiration, dissolved organic leaching,
    /// and texture-dependent routing to SOM2 and SOM3.
    fn decompose_som1_soil(&self, ecoregion: &EcoregionParameters, site: &mut SiteState) {
        let flow = self.carbon_flow(site, PoolId::Som1Soil);
        if flow <= 0.0 {
            return;
        }

        let respired = flow * self.parameters.som1_soil_respiration(ecoregion.percent_sand);
        self.respire(site, PoolId::Som1Soil, respired);
        let mut remaining = flow - respired;

        // Dissolved organic losses ride the saturated flow
        if site.water_movement > 0.0 {
            let intensity = (site.water_movement / self.parameters.om_leach_water).min(1.0);
            let leach_fraction = self.parameters.om_leach_fraction(ecoregion.percent_sand);
            let leached = (flow * leach_fraction * intensity).min(remaining);
            if leached > 0.0 {
                let n_leached = match site.pool(PoolId::Som1Soil).cn_ratio() {
                    Some(cn) => leached / cn,
                    None => 0.0,
                };
                site.move_carbon(PoolId::Som1Soil, PoolId::Stream, leached);
                site.move_nitrogen(PoolId::Som1Soil, PoolId::Stream, n_leached);
                site.monthly.stream_c += leached;
                remaining -= leached;
            }
        }

        let to_som3 =
            (flow * self.parameters.som1_to_som3_fraction(ecoregion.percent_clay)).min(remaining);
        self.transfer(
            site,
            PoolId::Som1Soil,
            PoolId::Som3,
            to_som3,
            self.parameters.cn_ratio_som3,
        );
        self.transfer(
            site,
            PoolId::Som1Soil,
            PoolId::Som2,
            remaining - to_som3,
            self.parameters.cn_ratio_som2,
        );
    }

    fn decompose_som2(&self, ecoregion: &EcoregionParameters, site: &mut SiteState) {
        let flow = self.carbon_flow(site, PoolId::Som2);
        if flow <= 0.0 {
            return;
        }
        let respired = flow * self.parameters.som2_respiration;
        self.respire(site, PoolId::Som2, respired);
        let remaining = flow - respired;

        let to_som3 =
            (flow * self.parameters.som2_to_som3_fraction(ecoregion.percent_clay)).min(remaining);
        self.transfer(
            site,
            PoolId::Som2,
            PoolId::Som3,
            to_som3,
            self.parameters.cn_ratio_som3,
        );
        self.transfer(
            site,
            PoolId::Som2,
            PoolId::Som1Soil,
            remaining - to_som3,
            self.parameters.cn_ratio_som1,
        );
    }

    fn decompose_som3(&self, site: &mut SiteState) {
        let flow = self.carbon_flow(site, PoolId::Som3);
        if flow <= 0.0 {
            return;
        }
        let respired = flow * self.parameters.som3_respiration;
        self.respire(site, PoolId::Som3, respired);
        self.transfer(
            site,
            PoolId::Som3,
            PoolId::Som1Soil,
            flow - respired,
            self.parameters.cn_ratio_som1,
        );
    }

    /// Add new dead residue, splitting it between the metabolic and
    /// structural pools of `layer`.
    ///
    /// `input_mass` is dry mass (g m⁻²); carbon content is taken as
    /// [`CARBON_FRACTION`]. The metabolic fraction declines with the
    /// residue's lignin:N ratio down to a floor; all lignin ends up in the
    /// structural pool, whose lignin fraction and decay rate are updated as
    /// mass-weighted running averages.
    ///
    /// A zero input is a no-op. A negative input indicates a defect in the
    /// caller and is a hard error.
    pub fn partition_residue(
        &self,
        input_mass: FloatValue,
        decay_value: FloatValue,
        cn_ratio: FloatValue,
        lignin_fraction: FloatValue,
        layer: ResidueLayer,
        site: &mut SiteState,
    ) -> CenturyResult<()> {
        if input_mass < 0.0 {
            return Err(CenturyError::NegativeInput {
                operation: "partition_residue".to_string(),
                value: input_mass,
            });
        }
        if input_mass == 0.0 {
            return Ok(());
        }
        if cn_ratio <= 0.0 {
            return Err(CenturyError::configuration(
                "residue",
                format!("C:N ratio must be positive, got {}", cn_ratio),
            ));
        }

        let input_c = input_mass * CARBON_FRACTION;
        let mut input_n = input_c / cn_ratio;

        // Fresh soil residue scavenges some mineral N directly, limited by
        // what is on hand and by a C:N floor on the enriched residue.
        let absorption_fraction = match layer {
            ResidueLayer::Surface => 0.0,
            ResidueLayer::Soil => self.parameters.direct_absorption_fraction,
        };
        if absorption_fraction > 0.0 {
            let room = (input_c / self.parameters.direct_absorption_cn_floor - input_n).max(0.0);
            let requested = (site.mineral_n * absorption_fraction).min(room);
            input_n += site.take_mineral_n(requested);
        }

        // Lignin:N ratio drives the metabolic/structural split
        let lignin_mass = input_mass * lignin_fraction.clamp(0.0, 1.0);
        let lignin_n_ratio = if input_n > 0.0 {
            lignin_mass / input_n
        } else {
            FloatValue::INFINITY
        };
        let metabolic_fraction = (self.parameters.metabolic_intercept
            - self.parameters.metabolic_slope * lignin_n_ratio)
            .max(self.parameters.metabolic_floor);

        let metabolic_c = input_c * metabolic_fraction;
        let structural_c = input_c - metabolic_c;
        let metabolic_n = input_n * metabolic_fraction;
        let structural_n = input_n - metabolic_n;

        let (structural_id, metabolic_id) = match layer {
            ResidueLayer::Surface => (PoolId::SurfaceStructural, PoolId::SurfaceMetabolic),
            ResidueLayer::Soil => (PoolId::SoilStructural, PoolId::SoilMetabolic),
        };

        // All lignin is structural; express it as a fraction of the
        // structural dry mass
        let structural_mass = structural_c / CARBON_FRACTION;
        let structural_lignin = if structural_mass > 0.0 {
            (lignin_mass / structural_mass).min(1.0)
        } else {
            0.0
        };

        site.pool_mut(structural_id).blend_residue(
            structural_c,
            structural_n,
            structural_lignin,
            decay_value,
        );
        let metabolic_decay = site.pool(metabolic_id).decay_value;
        site.pool_mut(metabolic_id)
            .blend_residue(metabolic_c, metabolic_n, 0.0, metabolic_decay);

        Ok(())
    }

    /// Add dead wood (surface) or dead coarse roots (soil) to the
    /// corresponding wood pool.
    pub fn add_wood_residue(
        &self,
        input_mass: FloatValue,
        decay_value: FloatValue,
        cn_ratio: FloatValue,
        lignin_fraction: FloatValue,
        layer: ResidueLayer,
        site: &mut SiteState,
    ) -> CenturyResult<()> {
        if input_mass < 0.0 {
            return Err(CenturyError::NegativeInput {
                operation: "add_wood_residue".to_string(),
                value: input_mass,
            });
        }
        if input_mass == 0.0 {
            return Ok(());
        }
        if cn_ratio <= 0.0 {
            return Err(CenturyError::configuration(
                "wood residue",
                format!("C:N ratio must be positive, got {}", cn_ratio),
            ));
        }

        let input_c = input_mass * CARBON_FRACTION;
        let input_n = input_c / cn_ratio;
        let id = match layer {
            ResidueLayer::Surface => PoolId::SurfaceDeadWood,
            ResidueLayer::Soil => PoolId::SoilDeadWood,
        };
        site.pool_mut(id)
            .blend_residue(input_c, input_n, lignin_fraction, decay_value);
        Ok(())
    }
}
