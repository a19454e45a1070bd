//! Orbital element sets and where they come from.

pub mod source;
pub mod tle;

pub use source::{CelestrakSource, ElementSource, StaticSource};
pub use tle::{parse_catalog, parse_tle};

use crate::constants::{MINUTES_PER_DAY, WGS72_MU, WGS72_RE};
use crate::physics::OrbitalMechanics;
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

/// Mean elements of one object at a reference epoch, as published in a
/// two-line element set.
///
/// Angles stay in degrees as published; the propagator converts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElementSet {
    pub catalog_number: u32,
    pub name: Option<String>,
    pub classification: char,
    pub international_designator: String,
    pub epoch: Epoch,
    /// First derivative of mean motion divided by two (rev/day²)
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six (rev/day³)
    pub mean_motion_ddot: f64,
    /// Drag term (1/earth radii)
    pub bstar: f64,
    pub element_set_number: u32,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Mean motion (rev/day)
    pub mean_motion: f64,
    pub revolution_number: u32,
}

impl OrbitalElementSet {
    /// Nominal orbital period (minutes) from the published mean motion.
    pub fn period_minutes(&self) -> f64 {
        MINUTES_PER_DAY / self.mean_motion
    }

    /// Two-body semi-major axis (km) implied by the mean motion.
    pub fn semi_major_axis_km(&self) -> f64 {
        OrbitalMechanics::semi_major_axis_from_mean_motion(self.mean_motion, WGS72_MU)
    }

    /// Perigee and apogee heights (km) above the equatorial radius.
    pub fn apsis_altitudes_km(&self) -> (f64, f64) {
        let a = self.semi_major_axis_km();
        (
            a * (1.0 - self.eccentricity) - WGS72_RE,
            a * (1.0 + self.eccentricity) - WGS72_RE,
        )
    }

    /// Name when known, catalog number otherwise.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{:05}", self.catalog_number),
        }
    }
}
