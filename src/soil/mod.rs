//! Soil processes
//!
//! This module contains the two monthly soil components:
//!
//! - [`SoilWaterBalance`]: snow, runoff, evapotranspiration, and the derived
//!   decomposition modifiers (decay factor, soil temperature, anaerobic
//!   effect), plus mineral nitrogen leaching
//! - [`DecompositionEngine`]: first-order decay of the litter, wood, and
//!   soil organic matter pools with the associated nitrogen mineralization
//!   and immobilization, and partitioning of new dead residue

mod decompose;
mod water;

pub use decompose::{DecompositionEngine, ResidueLayer, MONTH_ADJUST};
pub use water::{SoilWaterBalance, WaterBudget, WaterType};
