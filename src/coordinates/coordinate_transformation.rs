use super::{EquatorialCoordinate, GeodeticPosition, HorizonCoordinate, ObserverLocation};
use crate::constants::*;
use crate::error::Result;
use crate::models::StateVector;
use crate::propagation::Propagator;
use crate::time;
use hifitime::Epoch;
use nalgebra as na;

/// What a look angle is computed for.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A propagated object at finite range.
    State(&'a StateVector),
    /// A direction at infinity; no parallax and no range.
    Direction(EquatorialCoordinate),
}

/// Rotate an inertial vector into the Earth-fixed frame by the sidereal angle.
pub fn eci_to_ecef(position: &na::Vector3<f64>, gmst: f64) -> na::Vector3<f64> {
    na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), -gmst) * position
}

/// Convert Earth-fixed Cartesian (km) to geodetic coordinates (WGS84)
pub fn ecef_to_geodetic(pos: &na::Vector3<f64>) -> GeodeticPosition {
    let (x, y, z) = (pos.x, pos.y, pos.z);

    let a = WGS84_A;
    let f = WGS84_F;
    let b = a * (1.0 - f);
    let e2 = 2.0 * f - f * f;

    let p = (x * x + y * y).sqrt();

    // On the polar axis longitude is undefined
    if p < 1e-10 {
        return GeodeticPosition {
            latitude_deg: if z < 0.0 { -90.0 } else { 90.0 },
            longitude_deg: 0.0,
            altitude_km: z.abs() - b,
        };
    }

    let mut latitude = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let sin_lat = latitude.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = p / latitude.cos() - n;

        let prev_lat = latitude;
        latitude = (z / p).atan2(1.0 - e2 * n / (n + h));

        if (latitude - prev_lat).abs() < 1e-12 {
            break;
        }
    }

    let sin_lat = latitude.sin();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    GeodeticPosition {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: time::wrap_180(y.atan2(x).to_degrees()),
        altitude_km: p / latitude.cos() - n,
    }
}

/// Earth-fixed position (km) of a point given in geodetic coordinates.
pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, height_km: f64) -> na::Vector3<f64> {
    let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    na::Vector3::new(
        (n + height_km) * cos_lat * cos_lon,
        (n + height_km) * cos_lat * sin_lon,
        (n * (1.0 - e2) + height_km) * sin_lat,
    )
}

/// Sub-satellite point of a propagated state.
pub fn to_geodetic(state: &StateVector) -> GeodeticPosition {
    let gmst = time::gmst(state.epoch);
    ecef_to_geodetic(&eci_to_ecef(&state.position, gmst))
}

/// Rotation taking Earth-fixed vectors into the observer's East-North-Up frame.
pub fn enu_rotation(observer: &ObserverLocation) -> na::Matrix3<f64> {
    let (sin_lat, cos_lat) = observer.latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = observer.longitude_deg.to_radians().sin_cos();

    na::Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}

/// Azimuth and elevation of a local East-North-Up vector.
///
/// Azimuth is pinned to 0 when the vector is within 1e-9 of the local
/// vertical.
pub(crate) fn enu_to_horizon(enu: &na::Vector3<f64>) -> (f64, f64) {
    let range = enu.magnitude();
    if range == 0.0 {
        return (0.0, 90.0);
    }
    let horizontal = enu.x.hypot(enu.y);
    let azimuth = if horizontal < 1e-9 * range {
        0.0
    } else {
        time::normalize_degrees(enu.x.atan2(enu.y).to_degrees())
    };
    let elevation = (enu.z / range).clamp(-1.0, 1.0).asin().to_degrees();
    (azimuth, elevation)
}

/// Look angles from an observer to a target at an instant.
pub fn to_horizon(target: Target<'_>, epoch: Epoch, observer: &ObserverLocation) -> HorizonCoordinate {
    let gmst = time::gmst(epoch);
    let rotation = enu_rotation(observer);

    match target {
        Target::State(state) => {
            let topocentric = eci_to_ecef(&state.position, gmst) - observer.to_ecef();
            let enu = rotation * topocentric;
            let (azimuth_deg, elevation_deg) = enu_to_horizon(&enu);
            HorizonCoordinate {
                azimuth_deg,
                elevation_deg,
                range_km: Some(enu.magnitude()),
            }
        }
        Target::Direction(equatorial) => {
            let ra = (equatorial.right_ascension_hours * 15.0).to_radians();
            let (sin_dec, cos_dec) = equatorial.declination_deg.to_radians().sin_cos();
            let unit = na::Vector3::new(cos_dec * ra.cos(), cos_dec * ra.sin(), sin_dec);
            let enu = rotation * eci_to_ecef(&unit, gmst);
            let (azimuth_deg, elevation_deg) = enu_to_horizon(&enu);
            HorizonCoordinate {
                azimuth_deg,
                elevation_deg,
                range_km: None,
            }
        }
    }
}

/// Propagate and convert to look angles in one step.
pub fn look_angles(
    propagator: &Propagator,
    epoch: Epoch,
    observer: &ObserverLocation,
) -> Result<HorizonCoordinate> {
    let state = propagator.propagate(epoch)?;
    Ok(to_horizon(Target::State(&state), epoch, observer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::parse_tle;
    use approx::assert_abs_diff_eq;
    use rand::Rng;
    use test_case::test_case;

    const VANGUARD_1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD_2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    fn vanguard() -> Propagator {
        Propagator::new(&parse_tle(VANGUARD_1, VANGUARD_2).unwrap()).unwrap()
    }

    #[test_case(0.0, 0.000322, 149.955736, 782.537; "at epoch")]
    #[test_case(360.0, -23.705347, -81.144676, 2456.906; "six hours")]
    fn vanguard_ground_point(tsince: f64, lat: f64, lon: f64, alt: f64) {
        let sgp4 = vanguard();
        let state = sgp4.propagate(sgp4.epoch() + time::minutes(tsince)).unwrap();
        let geodetic = to_geodetic(&state);
        assert_abs_diff_eq!(geodetic.latitude_deg, lat, epsilon = 1e-3);
        assert_abs_diff_eq!(geodetic.longitude_deg, lon, epsilon = 1e-3);
        assert_abs_diff_eq!(geodetic.altitude_km, alt, epsilon = 1e-2);
    }

    #[test_case(45.0, -120.0, 0.5; "northern west")]
    #[test_case(-33.9, 151.2, 0.0; "southern east")]
    #[test_case(0.0, 180.0, 10.0; "antimeridian")]
    #[test_case(89.9, 10.0, 2.0; "near pole")]
    fn geodetic_round_trip(lat: f64, lon: f64, h: f64) {
        let geodetic = ecef_to_geodetic(&geodetic_to_ecef(lat, lon, h));
        assert_abs_diff_eq!(geodetic.latitude_deg, lat, epsilon = 1e-9);
        assert_abs_diff_eq!(geodetic.longitude_deg, lon, epsilon = 1e-9);
        assert_abs_diff_eq!(geodetic.altitude_km, h, epsilon = 1e-4);
    }

    #[test]
    fn pole_has_no_nan() {
        let geodetic = ecef_to_geodetic(&na::Vector3::new(0.0, 0.0, -7000.0));
        assert_abs_diff_eq!(geodetic.latitude_deg, -90.0);
        assert_abs_diff_eq!(geodetic.longitude_deg, 0.0);
        assert!(geodetic.altitude_km > 600.0);
    }

    #[test]
    fn overhead_object_has_finite_azimuth() {
        let observer = ObserverLocation::new(10.0, 20.0, 0.0).unwrap();
        let epoch = Epoch::from_unix_seconds(1_700_000_000.0);
        // Place a satellite 500 km straight above the observer
        let (sin_lat, cos_lat) = 10.0_f64.to_radians().sin_cos();
        let (sin_lon, cos_lon) = 20.0_f64.to_radians().sin_cos();
        let up = na::Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
        let ecef = observer.to_ecef() + up * 500.0;
        let eci = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), time::gmst(epoch)) * ecef;
        let state = StateVector::new(epoch, eci, na::Vector3::zeros());

        let horizon = to_horizon(Target::State(&state), epoch, &observer);
        assert!(horizon.azimuth_deg.is_finite());
        assert!(horizon.elevation_deg > 89.9);
        assert_abs_diff_eq!(horizon.range_km.unwrap(), 500.0, epsilon = 1e-6);
    }

    #[test]
    fn to_horizon_is_idempotent() {
        let sgp4 = vanguard();
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let observer = ObserverLocation::new(
                rng.gen_range(-90.0..=90.0),
                rng.gen_range(-180.0..180.0),
                rng.gen_range(0.0..3.0),
            )
            .unwrap();
            let epoch = sgp4.epoch() + time::minutes(rng.gen_range(-600.0..600.0));
            let state = sgp4.propagate(epoch).unwrap();
            let first = to_horizon(Target::State(&state), epoch, &observer);
            let second = to_horizon(Target::State(&state), epoch, &observer);
            assert_eq!(first, second);
            assert!((0.0..360.0).contains(&first.azimuth_deg));
            assert!((-90.0..=90.0).contains(&first.elevation_deg));
        }
    }

    #[test]
    fn direction_at_observer_zenith() {
        let observer = ObserverLocation::new(40.0, -75.0, 0.0).unwrap();
        let epoch = Epoch::from_unix_seconds(1_700_000_000.0);
        let lst = time::local_sidereal_time(epoch, observer.longitude_deg);
        let zenith = EquatorialCoordinate::new(lst, observer.latitude_deg);
        let horizon = to_horizon(Target::Direction(zenith), epoch, &observer);
        assert_abs_diff_eq!(horizon.elevation_deg, 90.0, epsilon = 1e-6);
        assert_eq!(horizon.azimuth_deg, 0.0);
        assert_eq!(horizon.range_km, None);
    }

    #[test]
    fn look_angles_match_manual_path() {
        let sgp4 = vanguard();
        let observer = ObserverLocation::new(0.0, 150.0, 0.0).unwrap();
        let epoch = sgp4.epoch();
        let horizon = look_angles(&sgp4, epoch, &observer).unwrap();
        // The satellite sits almost directly above this observer at epoch
        assert!(horizon.elevation_deg > 80.0);
        assert_abs_diff_eq!(horizon.range_km.unwrap(), 782.5, epsilon = 5.0);
    }
}
