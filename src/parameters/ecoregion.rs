//! Ecoregion Parameters
//!
//! Static physical and soil constants for one ecoregion. Every active site
//! maps to exactly one ecoregion; these values are shared read-only across
//! all of its sites during the monthly loop.

use crate::errors::{CenturyError, CenturyResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Physical/soil constants and decay-rate multipliers for one ecoregion.
///
/// The identity fields (`name`, `active`) are fixed for the life of a
/// scenario. The physical fields may differ between scenarios and may be
/// replaced wholesale by a scheduled "dynamic change" event, which is applied
/// as a snapshot swap of the owning [`ScenarioContext`](crate::scenario::ScenarioContext)
/// rather than by in-place mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcoregionParameters {
    /// Ecoregion name, used in error messages and reporting
    pub name: String,

    /// Whether any active sites map to this ecoregion
    pub active: bool,

    /// Soil clay content
    /// unit: fraction [0, 1]
    /// default: 0.2
    pub percent_clay: FloatValue,

    /// Soil sand content
    /// unit: fraction [0, 1]
    /// default: 0.45
    pub percent_sand: FloatValue,

    /// Rooting-zone soil depth
    /// unit: cm
    /// default: 100.0
    pub soil_depth: FloatValue,

    /// Volumetric water content at field capacity
    /// unit: cm water per cm soil
    /// default: 0.3
    pub field_capacity: FloatValue,

    /// Volumetric water content at wilting point
    /// unit: cm water per cm soil
    /// default: 0.15
    pub wilting_point: FloatValue,

    /// Fraction of saturated water movement lost as storm flow
    /// unit: dimensionless
    /// default: 0.3
    pub storm_flow_fraction: FloatValue,

    /// Fraction of remaining soil water lost monthly as base flow
    /// unit: dimensionless
    /// default: 0.2
    pub base_flow_fraction: FloatValue,

    /// Fraction of excess water that drains freely (1.0 = well drained).
    /// Low values promote anaerobic conditions.
    /// unit: dimensionless
    /// default: 1.0
    pub drain: FloatValue,

    /// Slope of atmospheric N deposition against monthly precipitation
    /// unit: g N m⁻² cm⁻¹
    /// default: 0.005
    pub atmos_n_slope: FloatValue,

    /// Annual intercept of atmospheric N deposition, applied as 1/12 monthly
    /// unit: g N m⁻² yr⁻¹
    /// default: 0.05
    pub atmos_n_intercept: FloatValue,

    /// Latitude of the ecoregion centroid
    /// unit: degrees
    /// default: 45.0
    pub latitude: FloatValue,

    /// Decay-rate multiplier for surface litter pools
    /// unit: dimensionless
    /// default: 1.0
    pub decay_rate_surf: FloatValue,

    /// Decay-rate multiplier for soil litter pools
    /// unit: dimensionless
    /// default: 1.0
    pub decay_rate_soil: FloatValue,

    /// Decay-rate multiplier for the fast (SOM1) pools
    /// unit: dimensionless
    /// default: 1.0
    pub decay_rate_som1: FloatValue,

    /// Decay-rate multiplier for the slow (SOM2) pool
    /// unit: dimensionless
    /// default: 1.0
    pub decay_rate_som2: FloatValue,

    /// Decay-rate multiplier for the passive (SOM3) pool
    /// unit: dimensionless
    /// default: 1.0
    pub decay_rate_som3: FloatValue,

    /// Decay-rate multiplier for dead wood and coarse roots
    /// unit: dimensionless
    /// default: 1.0
    pub decay_rate_wood: FloatValue,

    /// Fraction of mineral N volatilized (denitrified) each month
    /// unit: dimensionless
    /// default: 0.001
    pub denitrification_fraction: FloatValue,

    /// Floor on the anaerobic decomposition multiplier
    /// unit: dimensionless
    /// default: 0.3 (CENTURY ANEREF(3))
    pub min_anaerobic_effect: FloatValue,
}

impl Default for EcoregionParameters {
    fn default() -> Self {
        Self {
            name: "ecoregion".to_string(),
            active: true,

            // Soil texture and hydrology
            percent_clay: 0.2,
            percent_sand: 0.45,
            soil_depth: 100.0,
            field_capacity: 0.3,
            wilting_point: 0.15,
            storm_flow_fraction: 0.3,
            base_flow_fraction: 0.2,
            drain: 1.0,

            // Nitrogen deposition
            atmos_n_slope: 0.005,
            atmos_n_intercept: 0.05,

            latitude: 45.0,

            // Layer decay multipliers
            decay_rate_surf: 1.0,
            decay_rate_soil: 1.0,
            decay_rate_som1: 1.0,
            decay_rate_som2: 1.0,
            decay_rate_som3: 1.0,
            decay_rate_wood: 1.0,

            denitrification_fraction: 0.001,
            min_anaerobic_effect: 0.3,
        }
    }
}

impl EcoregionParameters {
    /// Maximum water the soil profile holds, i.e. the field-capacity ceiling (cm).
    pub fn water_limit(&self) -> FloatValue {
        self.soil_depth * self.field_capacity
    }

    /// Water held below the wilting point, unavailable to plants (cm).
    pub fn wilting_floor(&self) -> FloatValue {
        self.soil_depth * self.wilting_point
    }

    /// Check for out-of-range values.
    ///
    /// Called once at scenario load; a failure here aborts the scenario.
    pub fn validate(&self) -> CenturyResult<()> {
        if self.soil_depth <= 0.0 {
            return Err(CenturyError::configuration(
                &self.name,
                format!("soil depth must be positive, got {}", self.soil_depth),
            ));
        }
        if self.field_capacity <= self.wilting_point {
            return Err(CenturyError::configuration(
                &self.name,
                format!(
                    "field capacity ({}) must exceed wilting point ({})",
                    self.field_capacity, self.wilting_point
                ),
            ));
        }
        let fractions = [
            ("percent clay", self.percent_clay),
            ("percent sand", self.percent_sand),
            ("storm flow fraction", self.storm_flow_fraction),
            ("base flow fraction", self.base_flow_fraction),
            ("drain", self.drain),
            ("denitrification fraction", self.denitrification_fraction),
            ("minimum anaerobic effect", self.min_anaerobic_effect),
        ];
        for (label, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(CenturyError::configuration(
                    &self.name,
                    format!("{} must be within [0, 1], got {}", label, value),
                ));
            }
        }
        let multipliers = [
            ("surface decay multiplier", self.decay_rate_surf),
            ("soil decay multiplier", self.decay_rate_soil),
            ("SOM1 decay multiplier", self.decay_rate_som1),
            ("SOM2 decay multiplier", self.decay_rate_som2),
            ("SOM3 decay multiplier", self.decay_rate_som3),
            ("wood decay multiplier", self.decay_rate_wood),
        ];
        for (label, value) in multipliers {
            if value < 0.0 {
                return Err(CenturyError::configuration(
                    &self.name,
                    format!("{} must be non-negative, got {}", label, value),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_validate() {
        let params = EcoregionParameters::default();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_water_limit_above_wilting_floor() {
        let params = EcoregionParameters::default();
        assert!(
            params.water_limit() > params.wilting_floor(),
            "Field-capacity ceiling should exceed the wilting floor"
        );
    }

    #[test]
    fn test_inverted_moisture_constants_rejected() {
        let params = EcoregionParameters {
            field_capacity: 0.1,
            wilting_point: 0.2,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_out_of_range_fraction_rejected() {
        let params = EcoregionParameters {
            storm_flow_fraction: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_decay_multiplier_rejected() {
        let params = EcoregionParameters {
            decay_rate_soil: -0.1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let params = EcoregionParameters {
            percent_clay: 0.35,
            decay_rate_soil: 0.8,
            ..Default::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let restored: EcoregionParameters = serde_json::from_str(&json).unwrap();

        assert_eq!(params.name, restored.name);
        assert!((params.percent_clay - restored.percent_clay).abs() < 1e-10);
        assert!((params.decay_rate_soil - restored.decay_rate_soil).abs() < 1e-10);
        assert!((params.field_capacity - restored.field_capacity).abs() < 1e-10);
    }
}
