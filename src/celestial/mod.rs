//! Positions of objects that are not propagated from element sets: fixed
//! catalog directions and solar system bodies.

pub mod catalog;
pub mod ephemeris;
pub mod sky;

pub use catalog::{CatalogKind, CatalogObject, CATALOG};
pub use ephemeris::{body_horizon, equatorial, moon_phase, topocentric, Body, MoonPhase};
pub use sky::{next_rise_set, sky_snapshot, RiseSet, SkyObjectPosition};

use crate::coordinates::{EquatorialCoordinate, HorizonCoordinate, ObserverLocation};
use crate::time;
use hifitime::Epoch;

/// Altitude and azimuth of an equatorial position from the local hour angle.
///
/// The hour angle is wrapped to (-180, 180] so its sign alone decides
/// which side of the meridian the azimuth falls on.
pub fn horizon_position(
    equatorial: &EquatorialCoordinate,
    epoch: Epoch,
    observer: &ObserverLocation,
) -> HorizonCoordinate {
    let lst_hours = time::local_sidereal_time(epoch, observer.longitude_deg);
    let hour_angle = time::wrap_180((lst_hours - equatorial.right_ascension_hours) * 15.0).to_radians();
    let (sin_dec, cos_dec) = equatorial.declination_deg.to_radians().sin_cos();
    let (sin_lat, cos_lat) = observer.latitude_deg.to_radians().sin_cos();

    let sin_alt = (sin_dec * sin_lat + cos_dec * cos_lat * hour_angle.cos()).clamp(-1.0, 1.0);
    let altitude = sin_alt.asin();

    let denominator = altitude.cos() * cos_lat;
    let azimuth_deg = if denominator.abs() < 1e-12 {
        0.0
    } else {
        let cos_az = ((sin_dec - sin_alt * sin_lat) / denominator).clamp(-1.0, 1.0);
        let azimuth = cos_az.acos().to_degrees();
        if hour_angle.sin() > 0.0 {
            time::normalize_degrees(360.0 - azimuth)
        } else {
            azimuth
        }
    };

    HorizonCoordinate {
        azimuth_deg,
        elevation_deg: altitude.to_degrees(),
        range_km: equatorial.distance_km,
    }
}
