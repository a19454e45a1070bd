// WGS-72 gravity model used by SGP4
pub const WGS72_MU: f64 = 398600.8; // Earth gravitational parameter (km³/s²)
pub const WGS72_RE: f64 = 6378.135; // Equatorial radius (km)
pub const WGS72_J2: f64 = 0.001082616;
pub const WGS72_J3: f64 = -0.00000253881;
pub const WGS72_J4: f64 = -0.00000165597;

// WGS-84 reference ellipsoid for geodetic conversions
pub const WGS84_A: f64 = 6378.137; // Semi-major axis [km]
pub const WGS84_F: f64 = 1.0 / 298.257223563; // Flattening

pub const AU_KM: f64 = 149_597_870.7;
pub const OBLIQUITY_J2000_DEG: f64 = 23.43928;

// Time
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const MINUTES_PER_DAY: f64 = 1_440.0;
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;
pub const JD_J2000: f64 = 2_451_545.0;
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Orbits at or above this period need the deep-space (SDP4) branch.
pub const DEEP_SPACE_PERIOD_MINUTES: f64 = 225.0;

// Math
pub const PI: f64 = std::f64::consts::PI;
pub const TWO_PI: f64 = 2.0 * PI;
