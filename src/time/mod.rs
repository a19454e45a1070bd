//! Julian dates, sidereal time and angle wrapping.
//!
//! Every instant in the engine is a [`hifitime::Epoch`]; the helpers here
//! reduce it to the UTC-based Julian date that SGP4 and the ephemeris
//! series are defined against.

pub mod clock;

pub use clock::SimulationClock;

use crate::constants::*;
use hifitime::{Duration, Epoch};

/// Julian date (UTC) of an instant.
pub fn julian_date(epoch: Epoch) -> f64 {
    epoch.to_unix_seconds() / SECONDS_PER_DAY + JD_UNIX_EPOCH
}

/// Julian centuries elapsed since J2000.0.
pub fn julian_centuries(epoch: Epoch) -> f64 {
    (julian_date(epoch) - JD_J2000) / DAYS_PER_CENTURY
}

/// Inverse of [`julian_date`].
pub fn epoch_from_julian_date(jd: f64) -> Epoch {
    Epoch::from_unix_seconds((jd - JD_UNIX_EPOCH) * SECONDS_PER_DAY)
}

/// Greenwich mean sidereal time (IAU 1982) in radians, [0, 2π).
pub fn gmst_from_julian_date(jd: f64) -> f64 {
    let t = (jd - JD_J2000) / DAYS_PER_CENTURY;
    let seconds = -6.2e-6 * t * t * t
        + 0.093104 * t * t
        + (876_600.0 * 3600.0 + 8_640_184.812866) * t
        + 67_310.54841;
    // 240 seconds of time per degree
    (seconds.to_radians() / 240.0).rem_euclid(TWO_PI)
}

/// Greenwich mean sidereal time in radians, [0, 2π).
pub fn gmst(epoch: Epoch) -> f64 {
    gmst_from_julian_date(julian_date(epoch))
}

/// Local sidereal time in hours, [0, 24).
pub fn local_sidereal_time(epoch: Epoch, longitude_deg: f64) -> f64 {
    let gmst_hours = gmst(epoch).to_degrees() / 15.0;
    (gmst_hours + longitude_deg / 15.0).rem_euclid(24.0)
}

/// Wraps an angle in degrees to [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wraps an angle in degrees to (-180, 180].
///
/// Used for longitudes and hour angles alike.
pub fn wrap_180(angle: f64) -> f64 {
    let wrapped = normalize_degrees(angle);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed minutes from `from` to `to`.
pub fn minutes_between(from: Epoch, to: Epoch) -> f64 {
    (to - from).to_seconds() / 60.0
}

pub fn minutes(value: f64) -> Duration {
    Duration::from_seconds(value * 60.0)
}
