//! Decomposition Parameters
//!
//! Transfer efficiencies, respiration fractions, and residue-partitioning
//! coefficients for the CENTURY decomposition cascade. Defaults follow the
//! standard CENTURY parameterisation (PS1CO2, RSPLIG, PMCO2, P1CO2, P2CO2,
//! P3CO2, SPL, DAMR, OMLECH in the original model).

use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters governing first-order decay routing and residue partitioning.
///
/// # Carbon Flows
///
/// ```text
///   surface structural --> SOM1-surface   (lignin share --> SOM2)
///   soil structural    --> SOM1-soil      (lignin share --> SOM2)
///   metabolic          --> SOM1 of its layer
///   dead wood          --> SOM1-surface
///   coarse roots       --> SOM1-soil
///   SOM1-surface       --> SOM2
///   SOM1-soil          --> SOM2 + SOM3 (clay-dependent split)
///   SOM2               --> SOM1-soil + SOM3
///   SOM3               --> SOM1-soil
/// ```
///
/// Each flow loses a respiration fraction to the atmosphere, tracked through
/// the source/sink pool so net ecosystem exchange closes by mass balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionParameters {
    /// Exponential effect of lignin on structural decay rates
    /// unit: dimensionless
    /// default: 3.0 (CENTURY PLIGST)
    pub lignin_decay_effect: FloatValue,

    /// Respiration fraction for surface structural material entering SOM1
    /// default: 0.45
    pub structural_surface_respiration: FloatValue,

    /// Respiration fraction for soil structural material entering SOM1
    /// default: 0.55
    pub structural_soil_respiration: FloatValue,

    /// Respiration fraction for the lignin share of structural decay
    /// routed to SOM2
    /// default: 0.3 (CENTURY RSPLIG)
    pub lignin_respiration: FloatValue,

    /// Respiration fraction for metabolic material entering SOM1
    /// default: 0.55
    pub metabolic_respiration: FloatValue,

    /// Respiration fraction for dead wood entering SOM1-surface
    /// default: 0.45
    pub wood_respiration: FloatValue,

    /// Respiration fraction for coarse roots entering SOM1-soil
    /// default: 0.55
    pub coarse_root_respiration: FloatValue,

    /// Respiration fraction for SOM1-surface entering SOM2
    /// default: 0.6
    pub som1_surface_respiration: FloatValue,

    /// Intercept of the sand-dependent SOM1-soil respiration fraction
    /// default: 0.17
    pub som1_soil_respiration_intercept: FloatValue,

    /// Slope against sand fraction of the SOM1-soil respiration fraction
    /// default: 0.68
    pub som1_soil_respiration_slope: FloatValue,

    /// Respiration fraction for SOM2 decay
    /// default: 0.55
    pub som2_respiration: FloatValue,

    /// Respiration fraction for SOM3 decay
    /// default: 0.55
    pub som3_respiration: FloatValue,

    /// Intercept and slope (against clay fraction) of the SOM1-soil share
    /// routed to SOM3
    /// defaults: 0.003, 0.032
    pub som1_to_som3_intercept: FloatValue,
    pub som1_to_som3_slope: FloatValue,

    /// Intercept and slope (against clay fraction) of the SOM2 share routed
    /// to SOM3
    /// defaults: 0.003, 0.009
    pub som2_to_som3_intercept: FloatValue,
    pub som2_to_som3_slope: FloatValue,

    /// Target C:N ratio of material entering the SOM1 pools; flows richer
    /// than this mineralize the excess, poorer flows immobilize mineral N
    /// default: 14.0
    pub cn_ratio_som1: FloatValue,

    /// Target C:N ratio of material entering SOM2
    /// default: 20.0
    pub cn_ratio_som2: FloatValue,

    /// Target C:N ratio of material entering SOM3
    /// default: 10.0
    pub cn_ratio_som3: FloatValue,

    /// Intercept of the metabolic fraction against the residue lignin:N ratio
    /// default: 0.85 (CENTURY SPL(1))
    pub metabolic_intercept: FloatValue,

    /// Slope of the metabolic fraction against the residue lignin:N ratio
    /// default: 0.018 (CENTURY SPL(2))
    pub metabolic_slope: FloatValue,

    /// Floor on the metabolic fraction of new residue
    /// default: 0.2
    pub metabolic_floor: FloatValue,

    /// Fraction of mineral N directly absorbed by new soil residue
    /// default: 0.02 (CENTURY DAMR); surface residue absorbs nothing
    pub direct_absorption_fraction: FloatValue,

    /// C:N floor limiting direct absorption: absorbed N never drives the
    /// residue C:N below this value
    /// default: 20.0
    pub direct_absorption_cn_floor: FloatValue,

    /// Intercept and slope (against sand fraction) of the dissolved organic
    /// leaching fraction from SOM1-soil
    /// defaults: 0.03, 0.12 (CENTURY OMLECH(1), OMLECH(2))
    pub om_leach_intercept: FloatValue,
    pub om_leach_slope: FloatValue,

    /// Monthly water movement that saturates organic leaching
    /// unit: cm
    /// default: 1.9 (CENTURY OMLECH(3))
    pub om_leach_water: FloatValue,
}

impl Default for DecompositionParameters {
    fn default() -> Self {
        Self {
            lignin_decay_effect: 3.0,

            // Respiration fractions per pathway
            structural_surface_respiration: 0.45,
            structural_soil_respiration: 0.55,
            lignin_respiration: 0.3,
            metabolic_respiration: 0.55,
            wood_respiration: 0.45,
            coarse_root_respiration: 0.55,
            som1_surface_respiration: 0.6,
            som1_soil_respiration_intercept: 0.17,
            som1_soil_respiration_slope: 0.68,
            som2_respiration: 0.55,
            som3_respiration: 0.55,

            // Texture-dependent routing to the passive pool
            som1_to_som3_intercept: 0.003,
            som1_to_som3_slope: 0.032,
            som2_to_som3_intercept: 0.003,
            som2_to_som3_slope: 0.009,

            // Destination C:N targets
            cn_ratio_som1: 14.0,
            cn_ratio_som2: 20.0,
            cn_ratio_som3: 10.0,

            // Residue partitioning
            metabolic_intercept: 0.85,
            metabolic_slope: 0.018,
            metabolic_floor: 0.2,
            direct_absorption_fraction: 0.02,
            direct_absorption_cn_floor: 20.0,

            // Dissolved organic leaching
            om_leach_intercept: 0.03,
            om_leach_slope: 0.12,
            om_leach_water: 1.9,
        }
    }
}

impl DecompositionParameters {
    /// Sand-dependent respiration fraction for SOM1-soil decay.
    pub fn som1_soil_respiration(&self, sand_fraction: FloatValue) -> FloatValue {
        self.som1_soil_respiration_intercept + self.som1_soil_respiration_slope * sand_fraction
    }

    /// Clay-dependent share of SOM1-soil decay routed to the passive pool.
    pub fn som1_to_som3_fraction(&self, clay_fraction: FloatValue) -> FloatValue {
        self.som1_to_som3_intercept + self.som1_to_som3_slope * clay_fraction
    }

    /// Clay-dependent share of SOM2 decay routed to the passive pool.
    pub fn som2_to_som3_fraction(&self, clay_fraction: FloatValue) -> FloatValue {
        self.som2_to_som3_intercept + self.som2_to_som3_slope * clay_fraction
    }

    /// Sand-dependent dissolved organic leaching fraction.
    pub fn om_leach_fraction(&self, sand_fraction: FloatValue) -> FloatValue {
        self.om_leach_intercept + self.om_leach_slope * sand_fraction
    }
}
