use hifitime::Epoch;
use std::fmt;

/// Where the scanner is relative to the minimum elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanState {
    BelowThreshold,
    InPass {
        rise: Epoch,
        culmination: Epoch,
        max_elevation_deg: f64,
        culmination_azimuth_deg: f64,
    },
}

impl ScanState {
    pub fn in_pass(&self) -> bool {
        matches!(self, ScanState::InPass { .. })
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanState::BelowThreshold => write!(f, "Below Threshold"),
            ScanState::InPass { rise, .. } => write!(f, "In Pass (rose {rise})"),
        }
    }
}
