//! Simulation parameters
//!
//! This module contains parameter structures for all simulation components.
//! Each parameter struct provides defaults matching the CENTURY model's
//! standard configuration; site- and scenario-specific values are supplied
//! by the caller at scenario load.

mod decomposition;
mod ecoregion;
mod initial_pools;
mod nitrogen;
mod species;

pub use decomposition::DecompositionParameters;
pub use ecoregion::EcoregionParameters;
pub use initial_pools::{InitialPool, InitialPools};
pub use nitrogen::NitrogenParameters;
pub use species::{SpeciesParameters, N_FIXER_CLASS};
