use crate::constants::{PI, TWO_PI};
use nalgebra as na;

pub struct OrbitalMechanics;

#[allow(non_snake_case)]
impl OrbitalMechanics {
    /// Semi-major axis (km) of an orbit with mean motion `n` (rev/day).
    pub fn semi_major_axis_from_mean_motion(n: f64, mu: f64) -> f64 {
        let n_rad_s = n * TWO_PI / 86_400.0;
        (mu / (n_rad_s * n_rad_s)).cbrt()
    }

    /// Solves Kepler's equation M = E - e sin E by Newton-Raphson.
    pub fn mean_to_eccentric_anomaly(M: f64, e: f64, tolerance: f64, max_iterations: i32) -> f64 {
        let M = M.rem_euclid(TWO_PI);
        if e < 1e-11 {
            return M;
        }

        // Initial guess
        let mut E = if M < PI { M + e / 2.0 } else { M - e / 2.0 };

        for _ in 0..max_iterations {
            let delta = (E - e * E.sin() - M) / (1.0 - e * E.cos());
            E -= delta;
            if delta.abs() <= tolerance {
                break;
            }
        }

        E.rem_euclid(TWO_PI)
    }

    /// Position from classical elements, with angles in radians and the
    /// result in the units of `a`.
    ///
    /// The reference plane is whatever plane the angles are measured in
    /// (ecliptic for planetary elements).
    pub fn keplerian_to_position(
        a: f64,
        e: f64,
        i: f64,
        omega_cap: f64,
        omega: f64,
        M: f64,
    ) -> na::Vector3<f64> {
        let E = Self::mean_to_eccentric_anomaly(M, e, 1e-12, 30);

        // Position in orbital plane
        let r_orbital = na::Vector3::new(a * (E.cos() - e), a * (1.0 - e * e).sqrt() * E.sin(), 0.0);

        let rot_omega = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), omega);
        let rot_i = na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), i);
        let rot_omega_cap = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), omega_cap);

        rot_omega_cap * rot_i * rot_omega * r_orbital
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WGS72_MU;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test_case(0.0, 0.0, 0.0; "circular start")]
    #[test_case(1.0, 0.0, 1.0; "circular")]
    #[test_case(PI, 0.5, PI; "apoapsis")]
    #[test_case(0.5, 0.1, 0.5524800; "moderate eccentricity")]
    fn kepler_equation(M: f64, e: f64, expected: f64) {
        let E = OrbitalMechanics::mean_to_eccentric_anomaly(M, e, 1e-12, 50);
        assert_abs_diff_eq!(E, expected, epsilon = 1e-6);
        assert_abs_diff_eq!(E - e * E.sin(), M, epsilon = 1e-10);
    }

    #[test]
    fn highly_eccentric_converges() {
        let E = OrbitalMechanics::mean_to_eccentric_anomaly(0.2, 0.95, 1e-12, 50);
        assert_abs_diff_eq!(E - 0.95 * E.sin(), 0.2, epsilon = 1e-10);
    }

    #[test]
    fn periapsis_lies_on_x_axis_for_zero_angles() {
        let r = OrbitalMechanics::keplerian_to_position(2.0, 0.5, 0.0, 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(r, na::Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn inclination_tilts_out_of_plane() {
        // Quarter orbit past the node of a polar circular orbit sits on +z
        let r = OrbitalMechanics::keplerian_to_position(1.0, 0.0, PI / 2.0, 0.0, 0.0, PI / 2.0);
        assert_abs_diff_eq!(r, na::Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn iss_semi_major_axis() {
        let a = OrbitalMechanics::semi_major_axis_from_mean_motion(15.50066264, WGS72_MU);
        assert_abs_diff_eq!(a, 6794.67, epsilon = 0.01);
        // Kepler's third law recovers the period from the axis
        let period = TWO_PI * (a.powi(3) / WGS72_MU).sqrt();
        assert_abs_diff_eq!(period / 60.0, 1440.0 / 15.50066264, epsilon = 1e-6);
    }
}
