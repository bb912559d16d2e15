//! CENTURY-style forest ecosystem biogeochemistry
//!
//! This crate simulates carbon, nitrogen, and water dynamics for a landscape
//! of discrete forest sites at monthly resolution, following the CENTURY soil
//! organic matter model coupled to an external cohort growth model.
//!
//! # Module Organisation
//!
//! The simulation core is organised by domain:
//! - `soil`: monthly soil water balance and organic matter decomposition
//! - `nitrogen`: mineral nitrogen availability, limitation, and allocation
//! - `pools` / `site`: the fixed set of organic matter pools and per-site state
//! - `cohorts`: cohort records and the traits connecting the core to the
//!   external cohort-management collaborator
//! - `simulator`: the per-site annual integration loop and the parallel
//!   landscape driver
//! - `climate` / `scenario`: read-only inputs shared across sites
//!
//! # Parameters
//!
//! Each component has an associated parameters struct in the `parameters`
//! module with defaults taken from the CENTURY model's standard configuration.
//!
//! # Units
//!
//! Biomass is grams dry mass per square metre, carbon and nitrogen are grams
//! per square metre, water fluxes are centimetres per month, and temperatures
//! are degrees Celsius. Carbon content of dry biomass is always
//! [`CARBON_FRACTION`].

pub mod climate;
pub mod cohorts;
pub mod disturbance;
pub mod errors;
pub mod nitrogen;
pub mod parameters;
pub mod pools;
pub mod scenario;
pub mod simulator;
pub mod site;
pub mod soil;

/// Floating point type used throughout the simulation.
pub type FloatValue = f64;

/// Carbon content of dry biomass (g C per g dry mass).
///
/// Every conversion between cohort biomass and pool carbon goes through this
/// constant; it must not be duplicated elsewhere.
pub const CARBON_FRACTION: FloatValue = 0.47;
