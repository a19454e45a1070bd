use super::catalog::{CatalogKind, CATALOG};
use super::ephemeris::{body_horizon, topocentric, Body};
use super::horizon_position;
use crate::coordinates::{EquatorialCoordinate, HorizonCoordinate, ObserverLocation};
use crate::error::Result;
use crate::visibility::bisect_crossing;
use hifitime::{Duration, Epoch};
use log::debug;
use serde::{Deserialize, Serialize};

/// Solar system bodies count as up once their center clears this altitude.
pub const BODY_VISIBLE_ALTITUDE_DEG: f64 = -0.83;

/// Catalog centers are rough, so large patterns count as up a little
/// below the horizon.
pub const CATALOG_VISIBLE_ALTITUDE_DEG: f64 = -5.0;

const RISE_SET_STEP_MINUTES: f64 = 10.0;
const RISE_SET_TOLERANCE_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyObjectKind {
    Body,
    Constellation,
    DeepSky,
}

/// One entry of a "what is above me" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyObjectPosition {
    pub id: String,
    pub name: String,
    pub kind: SkyObjectKind,
    pub equatorial: EquatorialCoordinate,
    pub horizon: HorizonCoordinate,
    pub visible: bool,
}

impl SkyObjectPosition {
    /// Plain-language height above the horizon.
    pub fn altitude_description(&self) -> &'static str {
        match self.horizon.elevation_deg {
            alt if alt > 70.0 => "near zenith",
            alt if alt > 45.0 => "high in the sky",
            alt if alt > 20.0 => "mid-sky",
            alt if alt > 10.0 => "low in the sky",
            alt if alt > 0.0 => "very close to the horizon",
            _ => "below the horizon",
        }
    }
}

/// Horizon positions of every body and catalog object at one instant.
pub fn sky_snapshot(epoch: Epoch, observer: &ObserverLocation) -> Vec<SkyObjectPosition> {
    let bodies = Body::ALL.into_iter().map(|body| {
        let equatorial = topocentric(body, epoch, observer);
        let horizon = horizon_position(&equatorial, epoch, observer);
        SkyObjectPosition {
            id: body.name().to_ascii_lowercase(),
            name: body.name().to_string(),
            kind: SkyObjectKind::Body,
            equatorial,
            horizon,
            visible: horizon.elevation_deg > BODY_VISIBLE_ALTITUDE_DEG,
        }
    });

    let fixed = CATALOG.iter().map(|object| {
        let equatorial = object.equatorial();
        let horizon = horizon_position(&equatorial, epoch, observer);
        SkyObjectPosition {
            id: object.id.to_string(),
            name: object.name.to_string(),
            kind: match object.kind {
                CatalogKind::Constellation => SkyObjectKind::Constellation,
                CatalogKind::DeepSky => SkyObjectKind::DeepSky,
            },
            equatorial,
            horizon,
            visible: horizon.elevation_deg > CATALOG_VISIBLE_ALTITUDE_DEG,
        }
    });

    bodies.chain(fixed).collect()
}

/// Next rise and set of a body within a search window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiseSet {
    pub rise: Option<Epoch>,
    pub set: Option<Epoch>,
}

/// First upward and downward crossings of the visibility altitude after
/// `start`. Either is `None` when it does not happen within `window`
/// (polar day or night, or a slow Moon).
pub fn next_rise_set(body: Body, observer: &ObserverLocation, start: Epoch, window: Duration) -> Result<RiseSet> {
    let is_up = |at: Epoch| -> Result<bool> {
        Ok(body_horizon(body, at, observer).elevation_deg > BODY_VISIBLE_ALTITUDE_DEG)
    };

    let step = Duration::from_seconds(RISE_SET_STEP_MINUTES * 60.0);
    let end = start + window;
    let mut result = RiseSet { rise: None, set: None };

    let mut previous_time = start;
    let mut previous_up = is_up(start)?;
    while previous_time < end && (result.rise.is_none() || result.set.is_none()) {
        let time = (previous_time + step).min(end);
        let up = is_up(time)?;
        if up != previous_up {
            let crossing = bisect_crossing(&is_up, previous_time, time, up, RISE_SET_TOLERANCE_SECONDS)?;
            if up && result.rise.is_none() {
                result.rise = Some(crossing);
            } else if !up && result.set.is_none() {
                result.set = Some(crossing);
            }
        }
        previous_time = time;
        previous_up = up;
    }

    debug!("{body} rise {:?} set {:?}", result.rise, result.set);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn observer() -> ObserverLocation {
        ObserverLocation::new(28.6139, 77.2090, 0.0).unwrap()
    }

    #[test]
    fn snapshot_covers_bodies_and_catalog() {
        let epoch = Epoch::from_gregorian_utc_hms(2024, 6, 21, 12, 0, 0);
        let sky = sky_snapshot(epoch, &observer());
        assert_eq!(sky.len(), Body::ALL.len() + CATALOG.len());
        for entry in &sky {
            assert!((0.0..360.0).contains(&entry.horizon.azimuth_deg), "{}", entry.id);
            assert!((-90.0..=90.0).contains(&entry.horizon.elevation_deg));
            match entry.kind {
                SkyObjectKind::Body => assert!(entry.horizon.range_km.is_some()),
                _ => assert!(entry.horizon.range_km.is_none()),
            }
        }
    }

    #[test]
    fn sun_is_up_at_local_noon_in_june() {
        // 12:00 IST is 06:30 UTC
        let epoch = Epoch::from_gregorian_utc_hms(2024, 6, 21, 6, 30, 0);
        let sky = sky_snapshot(epoch, &observer());
        let sun = sky.iter().find(|e| e.id == "sun").unwrap();
        assert!(sun.visible);
        // Declination +23.4 from latitude 28.6: close to the zenith
        assert!(sun.horizon.elevation_deg > 80.0, "{}", sun.horizon.elevation_deg);
    }

    #[test]
    fn sun_rises_and_sets_once_a_day() {
        let start = Epoch::from_gregorian_utc_hms(2024, 6, 21, 18, 30, 0); // local midnight
        let times = next_rise_set(Body::Sun, &observer(), start, Duration::from_days(1.0)).unwrap();
        let rise = times.rise.unwrap();
        let set = times.set.unwrap();
        assert!(rise < set);
        let day_length_hours = (set - rise).to_seconds() / 3600.0;
        // Solstice day length at 28.6 N, without refraction
        assert_abs_diff_eq!(day_length_hours, 13.9, epsilon = 0.3);
    }

    #[test]
    fn polar_night_has_no_sunrise() {
        let arctic = ObserverLocation::new(80.0, 0.0, 0.0).unwrap();
        let start = Epoch::from_gregorian_utc_hms(2024, 12, 21, 0, 0, 0);
        let times = next_rise_set(Body::Sun, &arctic, start, Duration::from_days(1.0)).unwrap();
        assert_eq!(times, RiseSet { rise: None, set: None });
    }
}
