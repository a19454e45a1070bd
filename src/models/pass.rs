use crate::coordinates::CompassPoint;
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

/// One completed pass above the minimum elevation.
///
/// Always satisfies `rise < culmination < set`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassEvent {
    pub rise: Epoch,
    pub culmination: Epoch,
    pub set: Epoch,
    pub max_elevation_deg: f64,
    /// Azimuth at culmination (degrees)
    pub culmination_azimuth_deg: f64,
    pub direction: CompassPoint,
    pub duration_seconds: f64,
}
