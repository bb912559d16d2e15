//! Climate inputs
//!
//! Monthly weather is supplied per (ecoregion, year, phase) by a
//! [`ClimateProvider`]. Providers must be idempotent: repeated queries for
//! the same key return the same record. A missing record is a soft failure;
//! the integration loop reuses the previous year's record and logs a warning.

use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which climate record stream a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimatePhase {
    SpinUp,
    Future,
}

/// Twelve months of weather for one ecoregion and year.
///
/// Months are indexed 0 (January) through 11 (December) regardless of the
/// order in which the integration loop visits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualClimate {
    /// Precipitation, cm per month
    pub precipitation: [FloatValue; 12],
    /// Mean temperature, °C
    pub mean_temp: [FloatValue; 12],
    /// Mean daily minimum temperature, °C
    pub min_temp: [FloatValue; 12],
    /// Mean daily maximum temperature, °C
    pub max_temp: [FloatValue; 12],
    /// Potential evapotranspiration, cm per month
    pub pet: [FloatValue; 12],
    /// Wet+dry nitrogen deposition, g N m⁻² per month
    pub n_deposition: [FloatValue; 12],
}

impl AnnualClimate {
    /// Extract one month's weather. `month` is 0-based (0 = January).
    pub fn month(&self, month: usize) -> MonthClimate {
        MonthClimate {
            precipitation: self.precipitation[month],
            mean_temp: self.mean_temp[month],
            min_temp: self.min_temp[month],
            max_temp: self.max_temp[month],
            pet: self.pet[month],
            n_deposition: self.n_deposition[month],
        }
    }

    /// A flat record with every month identical, handy for tests and spin-up.
    pub fn uniform(
        precipitation: FloatValue,
        mean_temp: FloatValue,
        min_temp: FloatValue,
        max_temp: FloatValue,
        pet: FloatValue,
    ) -> Self {
        Self {
            precipitation: [precipitation; 12],
            mean_temp: [mean_temp; 12],
            min_temp: [min_temp; 12],
            max_temp: [max_temp; 12],
            pet: [pet; 12],
            n_deposition: [0.0; 12],
        }
    }
}

/// One month's weather, as consumed by the water balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthClimate {
    pub precipitation: FloatValue,
    pub mean_temp: FloatValue,
    pub min_temp: FloatValue,
    pub max_temp: FloatValue,
    pub pet: FloatValue,
    pub n_deposition: FloatValue,
}

/// Source of monthly weather records.
pub trait ClimateProvider {
    /// Weather for one ecoregion and simulation year, or `None` when the
    /// provider has no record for that key.
    fn monthly_weather(
        &self,
        ecoregion: usize,
        year: i32,
        phase: ClimatePhase,
    ) -> Option<&AnnualClimate>;
}

/// In-memory climate records keyed by (ecoregion, year, phase).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimateTable {
    records: HashMap<(usize, i32, ClimatePhase), AnnualClimate>,
}

impl ClimateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        ecoregion: usize,
        year: i32,
        phase: ClimatePhase,
        record: AnnualClimate,
    ) {
        self.records.insert((ecoregion, year, phase), record);
    }
}

impl ClimateProvider for ClimateTable {
    fn monthly_weather(
        &self,
        ecoregion: usize,
        year: i32,
        phase: ClimatePhase,
    ) -> Option<&AnnualClimate> {
        self.records.get(&(ecoregion, year, phase))
    }
}
