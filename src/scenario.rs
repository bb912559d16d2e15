//! Scenario Context
//!
//! [`ScenarioContext`] is the validated, immutable bundle of ecoregion and
//! species parameter tables shared by every site in a landscape run. It is
//! built once at scenario load; scheduled parameter updates produce a fresh
//! context via [`ScenarioContext::with_dynamic_change`] which the driver
//! swaps in between years, so worker threads only ever read a consistent
//! snapshot.

use crate::errors::{CenturyError, CenturyResult};
use crate::parameters::{EcoregionParameters, SpeciesParameters};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable parameter tables for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioContext {
    ecoregions: Vec<EcoregionParameters>,
    species: Vec<SpeciesParameters>,
    /// Per-ecoregion maximum aboveground biomass, the largest `max_biomass`
    /// over all species, g m⁻²
    b_max: Vec<FloatValue>,
}

impl ScenarioContext {
    /// Validate the parameter tables and derive the per-ecoregion biomass
    /// ceilings.
    pub fn new(
        ecoregions: Vec<EcoregionParameters>,
        species: Vec<SpeciesParameters>,
    ) -> CenturyResult<Self> {
        if ecoregions.is_empty() {
            return Err(CenturyError::configuration(
                "scenario",
                "at least one ecoregion is required",
            ));
        }
        if species.is_empty() {
            return Err(CenturyError::configuration(
                "scenario",
                "at least one species is required",
            ));
        }
        for ecoregion in &ecoregions {
            ecoregion.validate()?;
        }
        for sp in &species {
            sp.validate(ecoregions.len())?;
        }

        let b_max = (0..ecoregions.len())
            .map(|eco| {
                species
                    .iter()
                    .map(|sp| sp.max_biomass[eco])
                    .fold(0.0, FloatValue::max)
            })
            .collect();

        Ok(Self {
            ecoregions,
            species,
            b_max,
        })
    }

    pub fn ecoregion_count(&self) -> usize {
        self.ecoregions.len()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn ecoregion(&self, index: usize) -> CenturyResult<&EcoregionParameters> {
        let ecoregion = self.ecoregions.get(index).ok_or_else(|| {
            CenturyError::configuration(
                "ecoregion",
                format!("index {} out of range ({})", index, self.ecoregions.len()),
            )
        })?;
        if !ecoregion.active {
            return Err(CenturyError::configuration(
                "ecoregion",
                format!("ecoregion '{}' is inactive", ecoregion.name),
            ));
        }
        Ok(ecoregion)
    }

    pub fn species(&self, index: usize) -> CenturyResult<&SpeciesParameters> {
        self.species.get(index).ok_or_else(|| {
            CenturyError::configuration(
                "species",
                format!("index {} out of range ({})", index, self.species.len()),
            )
        })
    }

    /// Maximum aboveground biomass for an ecoregion, g m⁻².
    pub fn b_max(&self, ecoregion: usize) -> CenturyResult<FloatValue> {
        let value = *self.b_max.get(ecoregion).ok_or_else(|| {
            CenturyError::configuration(
                "ecoregion",
                format!("index {} out of range ({})", ecoregion, self.b_max.len()),
            )
        })?;
        if value <= 0.0 {
            return Err(CenturyError::configuration(
                "ecoregion",
                format!("ecoregion {} has no positive species max biomass", ecoregion),
            ));
        }
        Ok(value)
    }

    /// Build a new context with `change` applied. The returned snapshot is
    /// intended to replace the live `Arc<ScenarioContext>` between simulated
    /// years; sites must re-derive their pool decay values afterwards.
    pub fn with_dynamic_change(&self, change: &DynamicChange) -> CenturyResult<Arc<Self>> {
        let mut next = self.clone();
        let ecoregion = next.ecoregions.get_mut(change.ecoregion).ok_or_else(|| {
            CenturyError::configuration(
                "dynamic change",
                format!(
                    "ecoregion index {} out of range ({})",
                    change.ecoregion,
                    self.ecoregions.len()
                ),
            )
        })?;

        if let Some(value) = change.decay_rate_surf {
            ecoregion.decay_rate_surf = value;
        }
        if let Some(value) = change.decay_rate_soil {
            ecoregion.decay_rate_soil = value;
        }
        if let Some(value) = change.decay_rate_som1 {
            ecoregion.decay_rate_som1 = value;
        }
        if let Some(value) = change.decay_rate_som2 {
            ecoregion.decay_rate_som2 = value;
        }
        if let Some(value) = change.decay_rate_som3 {
            ecoregion.decay_rate_som3 = value;
        }
        if let Some(value) = change.decay_rate_wood {
            ecoregion.decay_rate_wood = value;
        }
        ecoregion.validate()?;

        Ok(Arc::new(next))
    }
}

/// A scheduled mid-run update to one ecoregion's decay-rate multipliers.
/// Fields left `None` keep their current values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicChange {
    /// Simulation year the change takes effect
    pub year: i32,
    /// Index of the ecoregion to update
    pub ecoregion: usize,
    pub decay_rate_surf: Option<FloatValue>,
    pub decay_rate_soil: Option<FloatValue>,
    pub decay_rate_som1: Option<FloatValue>,
    pub decay_rate_som2: Option<FloatValue>,
    pub decay_rate_som3: Option<FloatValue>,
    pub decay_rate_wood: Option<FloatValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn context() -> ScenarioContext {
        ScenarioContext::new(
            vec![EcoregionParameters::default()],
            vec![SpeciesParameters::default()],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_tables_rejected() {
        assert!(ScenarioContext::new(vec![], vec![SpeciesParameters::default()]).is_err());
        assert!(ScenarioContext::new(vec![EcoregionParameters::default()], vec![]).is_err());
    }

    #[test]
    fn test_b_max_is_species_maximum() {
        let context = ScenarioContext::new(
            vec![EcoregionParameters::default()],
            vec![
                SpeciesParameters {
                    max_biomass: vec![20_000.0],
                    ..SpeciesParameters::default()
                },
                SpeciesParameters {
                    max_biomass: vec![35_000.0],
                    ..SpeciesParameters::default()
                },
            ],
        )
        .unwrap();

        assert_relative_eq!(context.b_max(0).unwrap(), 35_000.0);
    }

    #[test]
    fn test_out_of_range_indices_rejected() {
        let context = context();
        assert!(context.ecoregion(1).is_err());
        assert!(context.species(1).is_err());
        assert!(context.b_max(1).is_err());
    }

    #[test]
    fn test_inactive_ecoregion_rejected() {
        let context = ScenarioContext::new(
            vec![EcoregionParameters {
                active: false,
                ..EcoregionParameters::default()
            }],
            vec![SpeciesParameters::default()],
        )
        .unwrap();

        assert!(context.ecoregion(0).is_err());
    }

    #[test]
    fn test_dynamic_change_leaves_original_untouched() {
        let context = context();
        let change = DynamicChange {
            year: 50,
            ecoregion: 0,
            decay_rate_som2: Some(0.5),
            ..DynamicChange::default()
        };

        let updated = context.with_dynamic_change(&change).unwrap();

        assert_relative_eq!(updated.ecoregion(0).unwrap().decay_rate_som2, 0.5);
        assert_relative_eq!(context.ecoregion(0).unwrap().decay_rate_som2, 1.0);
        // Untouched multipliers carry over
        assert_relative_eq!(
            updated.ecoregion(0).unwrap().decay_rate_surf,
            context.ecoregion(0).unwrap().decay_rate_surf
        );
    }

    #[test]
    fn test_dynamic_change_targets_soil_litter_multiplier() {
        let context = context();
        let change = DynamicChange {
            year: 25,
            ecoregion: 0,
            decay_rate_soil: Some(0.4),
            ..DynamicChange::default()
        };

        let updated = context.with_dynamic_change(&change).unwrap();

        assert_relative_eq!(updated.ecoregion(0).unwrap().decay_rate_soil, 0.4);
        assert_relative_eq!(updated.ecoregion(0).unwrap().decay_rate_surf, 1.0);
    }

    #[test]
    fn test_dynamic_change_bad_ecoregion_rejected() {
        let change = DynamicChange {
            ecoregion: 7,
            ..DynamicChange::default()
        };
        assert!(context().with_dynamic_change(&change).is_err());
    }
}
