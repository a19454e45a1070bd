//! Coordinate records and frame conversions.
//!
//! Longitudes are normalized to (-180, 180] everywhere in the engine.
//! Azimuths run clockwise from true north in [0, 360).

pub mod coordinate_transformation;
pub mod observer;

pub use coordinate_transformation::{
    ecef_to_geodetic, eci_to_ecef, look_angles, to_geodetic, to_horizon, Target,
};
pub use observer::{resolve_observer, FixedLocation, IpLocator, LocationProvider, LocationStatus, ObserverLocation};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Latitude and longitude in degrees, altitude in km above the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Observer-relative look angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonCoordinate {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    /// `None` for directions at infinity (catalog stars, nebulae).
    pub range_km: Option<f64>,
}

impl HorizonCoordinate {
    pub fn compass(&self) -> CompassPoint {
        CompassPoint::from_azimuth(self.azimuth_deg)
    }
}

/// Right ascension in hours [0, 24) and declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoordinate {
    pub right_ascension_hours: f64,
    pub declination_deg: f64,
    pub distance_km: Option<f64>,
}

impl EquatorialCoordinate {
    pub fn new(right_ascension_hours: f64, declination_deg: f64) -> Self {
        Self {
            right_ascension_hours: right_ascension_hours.rem_euclid(24.0),
            declination_deg,
            distance_km: None,
        }
    }
}

/// Any coordinate the engine hands out, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Coordinate {
    Geodetic(GeodeticPosition),
    Horizon(HorizonCoordinate),
    Equatorial(EquatorialCoordinate),
}

impl From<GeodeticPosition> for Coordinate {
    fn from(value: GeodeticPosition) -> Self {
        Coordinate::Geodetic(value)
    }
}

impl From<HorizonCoordinate> for Coordinate {
    fn from(value: HorizonCoordinate) -> Self {
        Coordinate::Horizon(value)
    }
}

impl From<EquatorialCoordinate> for Coordinate {
    fn from(value: EquatorialCoordinate) -> Self {
        Coordinate::Equatorial(value)
    }
}

/// Eight-point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    const ALL: [CompassPoint; 8] = [
        CompassPoint::N,
        CompassPoint::NE,
        CompassPoint::E,
        CompassPoint::SE,
        CompassPoint::S,
        CompassPoint::SW,
        CompassPoint::W,
        CompassPoint::NW,
    ];

    pub fn from_azimuth(azimuth_deg: f64) -> Self {
        let sector = (azimuth_deg.rem_euclid(360.0) / 45.0).round() as usize % 8;
        Self::ALL[sector]
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        };
        write!(f, "{label}")
    }
}
