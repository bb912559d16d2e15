//! Nitrogen Parameters
//!
//! Coefficients of the nitrogen-limitation response curves and the
//! symbiotic fixation rate.

use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for nitrogen limitation and allocation.
///
/// Growth limitation for tolerance classes 1-3 follows a piecewise
/// saturating response to mineral N: below `saturation[class]` the limit is
/// `n / (n + half_saturation[class])`, above it growth is unlimited.
/// Class 4 and above is never limited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NitrogenParameters {
    /// Half-saturation mineral N for tolerance classes 1-3, least tolerant
    /// first
    /// unit: g N m⁻²
    /// default: [5.0, 2.5, 1.0]
    pub half_saturation: [FloatValue; 3],

    /// Mineral N above which each tolerance class is unlimited
    /// unit: g N m⁻²
    /// default: [20.0, 12.0, 6.0]
    pub saturation: [FloatValue; 3],

    /// Monthly symbiotic fixation by an N-fixing cohort occupying the whole
    /// site (scaled down by its share of B_MAX)
    /// unit: g N m⁻² month⁻¹
    /// default: 1.2
    pub fixation_rate: FloatValue,

    /// Fraction of nitrogen in senescing leaves translocated to the
    /// resorbed-N store before litterfall
    /// unit: dimensionless
    /// default: 0.5
    pub resorption_fraction: FloatValue,
}

impl Default for NitrogenParameters {
    fn default() -> Self {
        Self {
            half_saturation: [5.0, 2.5, 1.0],
            saturation: [20.0, 12.0, 6.0],
            fixation_rate: 1.2,
            resorption_fraction: 0.5,
        }
    }
}
