//! Low-precision solar system ephemeris.
//!
//! Planets use the JPL approximate mean Keplerian elements (Standish,
//! valid 1800-2050, arcminute level). The Sun is the reflection of the
//! Earth-Moon barycenter. The Moon uses the truncated series from the
//! Astronomical Almanac (about 0.3 degrees).

use super::horizon_position;
use crate::constants::*;
use crate::coordinates::{EquatorialCoordinate, HorizonCoordinate, ObserverLocation};
use crate::physics::OrbitalMechanics;
use crate::time;
use hifitime::Epoch;
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Body {
    pub const ALL: [Body; 9] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
        }
    }

    pub fn from_name(name: &str) -> Option<Body> {
        Body::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mean elements at J2000 and their rates per Julian century:
/// a (AU), e, I, L, long. perihelion, long. ascending node (degrees).
struct MeanElements([(f64, f64); 6]);

const EARTH_MOON_BARYCENTER: MeanElements = MeanElements([
    (1.00000261, 0.00000562),
    (0.01671123, -0.00004392),
    (-0.00001531, -0.01294668),
    (100.46457166, 35999.37244981),
    (102.93768193, 0.32327364),
    (0.0, 0.0),
]);

fn mean_elements(body: Body) -> Option<MeanElements> {
    let elements = match body {
        Body::Mercury => [
            (0.38709927, 0.00000037),
            (0.20563593, 0.00001906),
            (7.00497902, -0.00594749),
            (252.25032350, 149472.67411175),
            (77.45779628, 0.16047689),
            (48.33076593, -0.12534081),
        ],
        Body::Venus => [
            (0.72333566, 0.00000390),
            (0.00677672, -0.00004107),
            (3.39467605, -0.00078890),
            (181.97909950, 58517.81538729),
            (131.60246718, 0.00268329),
            (76.67984255, -0.27769418),
        ],
        Body::Mars => [
            (1.52371034, 0.00001847),
            (0.09339410, 0.00007882),
            (1.84969142, -0.00813131),
            (-4.55343205, 19140.30268499),
            (-23.94362959, 0.44441088),
            (49.55953891, -0.29257343),
        ],
        Body::Jupiter => [
            (5.20288700, -0.00011607),
            (0.04838624, -0.00013253),
            (1.30439695, -0.00183714),
            (34.39644051, 3034.74612775),
            (14.72847983, 0.21252668),
            (100.47390909, 0.20469106),
        ],
        Body::Saturn => [
            (9.53667594, -0.00125060),
            (0.05386179, -0.00050991),
            (2.48599187, 0.00193609),
            (49.95424423, 1222.49362201),
            (92.59887831, -0.41897216),
            (113.66242448, -0.28867794),
        ],
        Body::Uranus => [
            (19.18916464, -0.00196176),
            (0.04725744, -0.00004397),
            (0.77263783, -0.00242939),
            (313.23810451, 428.48202785),
            (170.95427630, 0.40805281),
            (74.01692503, 0.04240589),
        ],
        Body::Neptune => [
            (30.06992276, 0.00026291),
            (0.00859048, 0.00005105),
            (1.77004347, 0.00035372),
            (-55.12002969, 218.45945325),
            (44.96476227, -0.32241464),
            (131.78422574, -0.00508664),
        ],
        Body::Sun | Body::Moon => return None,
    };
    Some(MeanElements(elements))
}

/// Heliocentric ecliptic position (AU) at `t` centuries past J2000.
fn heliocentric(elements: &MeanElements, t: f64) -> na::Vector3<f64> {
    let [a, e, i, l, varpi, node] = elements.0.map(|(value, rate)| value + rate * t);
    let mean_anomaly = (l - varpi).to_radians();
    let arg_perihelion = (varpi - node).to_radians();
    OrbitalMechanics::keplerian_to_position(
        a,
        e,
        i.to_radians(),
        node.to_radians(),
        arg_perihelion,
        mean_anomaly,
    )
}

/// Geocentric ecliptic longitude, latitude (degrees) and distance (km) of the Moon.
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let sin = |deg: f64| deg.to_radians().sin();
    let cos = |deg: f64| deg.to_radians().cos();

    let longitude = 218.32 + 481_267.881 * t
        + 6.29 * sin(135.0 + 477_198.87 * t)
        - 1.27 * sin(259.3 - 413_335.36 * t)
        + 0.66 * sin(235.7 + 890_534.22 * t)
        + 0.21 * sin(269.9 + 954_397.74 * t)
        - 0.19 * sin(357.5 + 35_999.05 * t)
        - 0.11 * sin(186.5 + 966_404.03 * t);
    let latitude = 5.13 * sin(93.3 + 483_202.02 * t)
        + 0.28 * sin(228.2 + 960_400.89 * t)
        - 0.28 * sin(318.3 + 6_003.15 * t)
        - 0.17 * sin(217.6 - 407_332.21 * t);
    let parallax = 0.9508
        + 0.0518 * cos(135.0 + 477_198.87 * t)
        + 0.0095 * cos(259.3 - 413_335.36 * t)
        + 0.0078 * cos(235.7 + 890_534.22 * t)
        + 0.0028 * cos(269.9 + 954_397.74 * t);

    (
        time::normalize_degrees(longitude),
        latitude,
        WGS84_A / parallax.to_radians().sin(),
    )
}

fn ecliptic_to_equatorial(v: &na::Vector3<f64>) -> na::Vector3<f64> {
    na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), OBLIQUITY_J2000_DEG.to_radians()) * v
}

/// Geocentric ecliptic position (km).
fn geocentric_ecliptic(body: Body, t: f64) -> na::Vector3<f64> {
    let earth = heliocentric(&EARTH_MOON_BARYCENTER, t);
    match body {
        Body::Sun => -earth * AU_KM,
        Body::Moon => {
            let (lon, lat, distance) = moon_ecliptic(t);
            let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
            let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
            na::Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat) * distance
        }
        planet => match mean_elements(planet) {
            Some(elements) => (heliocentric(&elements, t) - earth) * AU_KM,
            None => na::Vector3::zeros(),
        },
    }
}

/// Geocentric equatorial position (km, mean equator and equinox of J2000).
pub fn geocentric_position(body: Body, epoch: Epoch) -> na::Vector3<f64> {
    ecliptic_to_equatorial(&geocentric_ecliptic(body, time::julian_centuries(epoch)))
}

fn to_equatorial(v: &na::Vector3<f64>) -> EquatorialCoordinate {
    let distance = v.magnitude();
    EquatorialCoordinate {
        right_ascension_hours: time::normalize_degrees(v.y.atan2(v.x).to_degrees()) / 15.0,
        declination_deg: (v.z / distance).clamp(-1.0, 1.0).asin().to_degrees(),
        distance_km: Some(distance),
    }
}

/// Geocentric right ascension, declination and distance.
pub fn equatorial(body: Body, epoch: Epoch) -> EquatorialCoordinate {
    to_equatorial(&geocentric_position(body, epoch))
}

/// Equatorial coordinates as seen from the observer, parallax removed.
pub fn topocentric(body: Body, epoch: Epoch, observer: &ObserverLocation) -> EquatorialCoordinate {
    let observer_inertial =
        na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), time::gmst(epoch)) * observer.to_ecef();
    to_equatorial(&(geocentric_position(body, epoch) - observer_inertial))
}

/// Horizon coordinates of a body for an observer.
pub fn body_horizon(body: Body, epoch: Epoch, observer: &ObserverLocation) -> HorizonCoordinate {
    horizon_position(&topocentric(body, epoch, observer), epoch, observer)
}

/// Lunar phase at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPhase {
    /// Moon minus Sun ecliptic longitude: 0 new, 90 first quarter, 180 full.
    pub phase_angle_deg: f64,
    pub illuminated_fraction: f64,
}

impl MoonPhase {
    pub fn name(&self) -> &'static str {
        let cycle = self.phase_angle_deg / 360.0;
        match cycle {
            c if !(0.03..=0.97).contains(&c) => "New Moon",
            c if c < 0.22 => "Waxing Crescent",
            c if c < 0.28 => "First Quarter",
            c if c < 0.47 => "Waxing Gibbous",
            c if c < 0.53 => "Full Moon",
            c if c < 0.72 => "Waning Gibbous",
            c if c < 0.78 => "Last Quarter",
            _ => "Waning Crescent",
        }
    }
}

pub fn moon_phase(epoch: Epoch) -> MoonPhase {
    let t = time::julian_centuries(epoch);
    let sun = geocentric_ecliptic(Body::Sun, t);
    let moon = geocentric_ecliptic(Body::Moon, t);

    let longitude = |v: &na::Vector3<f64>| v.y.atan2(v.x).to_degrees();
    let phase_angle_deg = time::normalize_degrees(longitude(&moon) - longitude(&sun));
    let elongation = sun.angle(&moon);

    MoonPhase {
        phase_angle_deg,
        illuminated_fraction: (1.0 - elongation.cos()) / 2.0,
    }
}
