//! Species Parameters
//!
//! Read-only per-species tissue chemistry consumed by the nitrogen allocator
//! and by residue partitioning when cohort tissue dies. Cohort lifecycle
//! itself (establishment, ageing, death) belongs to the external
//! cohort-management collaborator.

use crate::errors::{CenturyError, CenturyResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Nitrogen tolerance class at which a species stops being limited by
/// mineral N. Classes at or above this value are also treated as N fixers.
pub const N_FIXER_CLASS: u8 = 4;

/// Tissue chemistry and nitrogen behaviour for one species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesParameters {
    /// Species code, used in error messages
    pub name: String,

    /// Nitrogen tolerance class.
    /// Classes 1-3 are increasingly tolerant of low mineral N; class 4 and
    /// above is unlimited and fixes its own nitrogen.
    /// default: 2
    pub n_tolerance: u8,

    /// Leaf carbon to nitrogen mass ratio
    /// default: 25.0
    pub leaf_cn: FloatValue,

    /// Fine root carbon to nitrogen mass ratio
    /// default: 48.0
    pub fine_root_cn: FloatValue,

    /// Live wood carbon to nitrogen mass ratio
    /// default: 250.0
    pub wood_cn: FloatValue,

    /// Coarse root carbon to nitrogen mass ratio
    /// default: 167.0
    pub coarse_root_cn: FloatValue,

    /// Dead leaf (litterfall) carbon to nitrogen mass ratio
    /// default: 55.0
    pub litter_cn: FloatValue,

    /// Leaf lignin content
    /// unit: fraction of dry mass
    /// default: 0.2
    pub leaf_lignin: FloatValue,

    /// Fine root lignin content
    /// unit: fraction of dry mass
    /// default: 0.25
    pub root_lignin: FloatValue,

    /// Wood lignin content
    /// unit: fraction of dry mass
    /// default: 0.25
    pub wood_lignin: FloatValue,

    /// Coarse root lignin content
    /// unit: fraction of dry mass
    /// default: 0.25
    pub coarse_root_lignin: FloatValue,

    /// Leaf longevity
    /// unit: years
    /// default: 1.0 (deciduous)
    pub leaf_longevity: FloatValue,

    /// Maximum attainable live biomass in each ecoregion, indexed by
    /// ecoregion. B_MAX for an ecoregion is the maximum of this value over
    /// all species.
    /// unit: g m⁻²
    pub max_biomass: Vec<FloatValue>,
}

impl Default for SpeciesParameters {
    fn default() -> Self {
        Self {
            name: "species".to_string(),
            n_tolerance: 2,

            // Tissue C:N ratios
            leaf_cn: 25.0,
            fine_root_cn: 48.0,
            wood_cn: 250.0,
            coarse_root_cn: 167.0,
            litter_cn: 55.0,

            // Tissue lignin fractions
            leaf_lignin: 0.2,
            root_lignin: 0.25,
            wood_lignin: 0.25,
            coarse_root_lignin: 0.25,

            leaf_longevity: 1.0,
            max_biomass: vec![30_000.0],
        }
    }
}

impl SpeciesParameters {
    /// Whether this species fixes atmospheric nitrogen and bypasses
    /// mineral-N limitation.
    pub fn is_n_fixer(&self) -> bool {
        self.n_tolerance >= N_FIXER_CLASS
    }

    pub fn validate(&self, n_ecoregions: usize) -> CenturyResult<()> {
        if self.n_tolerance == 0 {
            return Err(CenturyError::configuration(
                &self.name,
                "nitrogen tolerance class must be at least 1",
            ));
        }
        let ratios = [
            ("leaf C:N", self.leaf_cn),
            ("fine root C:N", self.fine_root_cn),
            ("wood C:N", self.wood_cn),
            ("coarse root C:N", self.coarse_root_cn),
            ("litter C:N", self.litter_cn),
        ];
        for (label, value) in ratios {
            if value <= 0.0 {
                return Err(CenturyError::configuration(
                    &self.name,
                    format!("{} ratio must be positive, got {}", label, value),
                ));
            }
        }
        if self.max_biomass.len() != n_ecoregions {
            return Err(CenturyError::configuration(
                &self.name,
                format!(
                    "maximum biomass defined for {} ecoregions, scenario has {}",
                    self.max_biomass.len(),
                    n_ecoregions
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_validate() {
        let params = SpeciesParameters::default();
        assert!(params.validate(1).is_ok());
    }

    #[test]
    fn test_fixer_classification() {
        let mut params = SpeciesParameters::default();
        assert!(!params.is_n_fixer());
        params.n_tolerance = 4;
        assert!(params.is_n_fixer());
    }

    #[test]
    fn test_missing_ecoregion_biomass_rejected() {
        let params = SpeciesParameters::default();
        assert!(
            params.validate(3).is_err(),
            "A species without a biomass maximum for every ecoregion is a configuration error"
        );
    }
}
