use super::scan_states::ScanState;
use crate::coordinates::{look_angles, CompassPoint, HorizonCoordinate, ObserverLocation};
use crate::error::{Error, Result};
use crate::models::PassEvent;
use crate::propagation::Propagator;
use hifitime::{Duration, Epoch};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// A pass starts once elevation rises strictly above this.
    pub min_elevation_deg: f64,
    /// Step while below the threshold.
    pub coarse_step_seconds: f64,
    /// Step while inside a pass.
    pub fine_step_seconds: f64,
    pub window_hours: f64,
    /// Bisect rise and set between the samples either side of the threshold.
    pub refine_crossings: bool,
    pub crossing_tolerance_seconds: f64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_elevation_deg: 10.0,
            coarse_step_seconds: 60.0,
            fine_step_seconds: 10.0,
            window_hours: 24.0,
            refine_crossings: true,
            crossing_tolerance_seconds: 1.0,
        }
    }
}

impl ScanSettings {
    /// Steps and window must be positive and finite or a scan cannot end.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("coarse step", self.coarse_step_seconds),
            ("fine step", self.fine_step_seconds),
            ("scan window", self.window_hours),
        ];
        for (what, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{what} must be positive, got {value}")));
            }
        }
        if self.refine_crossings && !(self.crossing_tolerance_seconds.is_finite() && self.crossing_tolerance_seconds > 0.0) {
            return Err(Error::Config(format!(
                "crossing tolerance must be positive, got {}",
                self.crossing_tolerance_seconds
            )));
        }
        if self.min_elevation_deg.is_nan() {
            return Err(Error::Config("minimum elevation is not a number".into()));
        }
        Ok(())
    }
}

/// Walks a time window and turns elevation samples into passes.
pub struct PassScanner {
    settings: ScanSettings,
    current_state: ScanState,
}

impl PassScanner {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            current_state: ScanState::BelowThreshold,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn get_current_state(&self) -> ScanState {
        self.current_state
    }

    fn transition_to(&mut self, new_state: ScanState, time: Epoch) {
        if self.current_state.in_pass() != new_state.in_pass() {
            debug!("scan state transition at {time}: {} -> {new_state}", self.current_state);
        }
        self.current_state = new_state;
    }

    /// Scans `[start, start + window)` with `look` giving the target's
    /// horizon coordinates at each instant.
    ///
    /// A failing `look` aborts the scan. A pass still in progress when the
    /// window closes is dropped. Settings that would never reach the end of
    /// the window are rejected with `Error::Config`.
    pub fn scan<F>(&mut self, start: Epoch, look: F) -> Result<Vec<PassEvent>>
    where
        F: Fn(Epoch) -> Result<HorizonCoordinate>,
    {
        self.settings.validate()?;
        let threshold = self.settings.min_elevation_deg;
        let coarse = Duration::from_seconds(self.settings.coarse_step_seconds);
        let fine = Duration::from_seconds(self.settings.fine_step_seconds);
        let end = start + Duration::from_seconds(self.settings.window_hours * 3600.0);

        let sample = |at: Epoch| -> Result<HorizonCoordinate> {
            look(at).map_err(|e| Error::ScanAborted {
                at,
                source: Box::new(e),
            })
        };
        let is_above = |at: Epoch| -> Result<bool> { Ok(sample(at)?.elevation_deg > threshold) };

        self.current_state = ScanState::BelowThreshold;
        let mut passes = Vec::new();
        let mut previous: Option<Epoch> = None;
        let mut time = start;

        while time < end {
            let horizon = sample(time)?;
            let above = horizon.elevation_deg > threshold;

            match self.current_state {
                ScanState::BelowThreshold => {
                    if above {
                        let rise = match previous {
                            Some(before) if self.settings.refine_crossings => bisect_crossing(
                                &is_above,
                                before,
                                time,
                                true,
                                self.settings.crossing_tolerance_seconds,
                            )?,
                            _ => time,
                        };
                        self.transition_to(
                            ScanState::InPass {
                                rise,
                                culmination: time,
                                max_elevation_deg: horizon.elevation_deg,
                                culmination_azimuth_deg: horizon.azimuth_deg,
                            },
                            time,
                        );
                    }
                }
                ScanState::InPass {
                    rise,
                    culmination,
                    max_elevation_deg,
                    culmination_azimuth_deg,
                } => {
                    if above {
                        if horizon.elevation_deg > max_elevation_deg {
                            self.current_state = ScanState::InPass {
                                rise,
                                culmination: time,
                                max_elevation_deg: horizon.elevation_deg,
                                culmination_azimuth_deg: horizon.azimuth_deg,
                            };
                        }
                    } else {
                        let set = match previous {
                            Some(before) if self.settings.refine_crossings => bisect_crossing(
                                &is_above,
                                before,
                                time,
                                false,
                                self.settings.crossing_tolerance_seconds,
                            )?,
                            _ => time,
                        };
                        if rise < culmination && culmination < set {
                            passes.push(PassEvent {
                                rise,
                                culmination,
                                set,
                                max_elevation_deg,
                                culmination_azimuth_deg,
                                direction: CompassPoint::from_azimuth(culmination_azimuth_deg),
                                duration_seconds: (set - rise).to_seconds(),
                            });
                        } else {
                            debug!("dropping degenerate pass rising at {rise}");
                        }
                        self.transition_to(ScanState::BelowThreshold, time);
                    }
                }
            }

            previous = Some(time);
            time += if self.current_state.in_pass() { fine } else { coarse };
        }

        if let ScanState::InPass { rise, .. } = self.current_state {
            debug!("discarding pass that rose at {rise} and had not set by {end}");
        }
        Ok(passes)
    }
}

/// Narrows `[from, to]` around the instant `state_at` switches to `target`.
///
/// `state_at(from)` must differ from `target` and `state_at(to)` must equal
/// it. Returns the earliest probed instant in the target state, so the
/// result lies in `(from, to]` within `tolerance_seconds` of the crossing.
pub fn bisect_crossing<F>(state_at: F, from: Epoch, to: Epoch, target: bool, tolerance_seconds: f64) -> Result<Epoch>
where
    F: Fn(Epoch) -> Result<bool>,
{
    let tolerance = Duration::from_seconds(tolerance_seconds.max(1e-3));
    let (mut lo, mut hi) = (from, to);
    while hi - lo > tolerance {
        let mid = lo + (hi - lo) * 0.5;
        if state_at(mid)? == target {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(hi)
}

/// Upcoming passes of a propagated object over an observer.
pub fn find_passes(
    propagator: &Propagator,
    observer: &ObserverLocation,
    start: Epoch,
    settings: &ScanSettings,
) -> Result<Vec<PassEvent>> {
    let passes = PassScanner::new(settings.clone()).scan(start, |at| look_angles(propagator, at, observer))?;
    debug!(
        "{} pass(es) of {} above {:.1} deg",
        passes.len(),
        propagator.elements().label(),
        settings.min_elevation_deg
    );
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::parse_tle;
    use crate::time;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    const ISS_1: &str = "1 25544U 98067A   23248.54842295  .00018164  00000-0  32729-3 0  9994";
    const ISS_2: &str = "2 25544  51.6416 357.6536 0005404 227.8174 205.8236 15.50066264424353";

    fn iss() -> Propagator {
        Propagator::new(&parse_tle(ISS_1, ISS_2).unwrap()).unwrap()
    }

    fn equator() -> ObserverLocation {
        ObserverLocation::new(0.0, 0.0, 0.0).unwrap()
    }

    fn coarse_settings(min_elevation_deg: f64, window_hours: f64) -> ScanSettings {
        ScanSettings {
            min_elevation_deg,
            window_hours,
            refine_crossings: false,
            ..ScanSettings::default()
        }
    }

    fn minutes_from(epoch: Epoch, at: Epoch) -> f64 {
        time::minutes_between(epoch, at)
    }

    #[test]
    fn iss_passes_over_a_day() {
        let sgp4 = iss();
        let passes = find_passes(&sgp4, &equator(), sgp4.epoch(), &coarse_settings(0.0, 24.0)).unwrap();
        let expected = [
            (25.00, 29.17, 17.16, 34.17),
            (624.17, 628.50, 9.80, 632.83),
            (719.83, 725.00, 25.65, 730.17),
            (1321.17, 1324.17, 5.86, 1327.83),
            (1415.83, 1420.67, 39.29, 1426.17),
        ];
        assert_eq!(passes.len(), expected.len());
        for (pass, (rise, culmination, max_el, set)) in passes.iter().zip(expected) {
            assert_abs_diff_eq!(minutes_from(sgp4.epoch(), pass.rise), rise, epsilon = 0.01);
            assert_abs_diff_eq!(minutes_from(sgp4.epoch(), pass.culmination), culmination, epsilon = 0.01);
            assert_abs_diff_eq!(minutes_from(sgp4.epoch(), pass.set), set, epsilon = 0.01);
            assert_abs_diff_eq!(pass.max_elevation_deg, max_el, epsilon = 0.05);
            assert_abs_diff_eq!(pass.duration_seconds, (set - rise) * 60.0, epsilon = 1.0);
        }
    }

    #[test]
    fn threshold_filters_low_passes() {
        let sgp4 = iss();
        let passes = find_passes(&sgp4, &equator(), sgp4.epoch(), &coarse_settings(10.0, 24.0)).unwrap();
        let maxima: Vec<f64> = passes.iter().map(|p| p.max_elevation_deg).collect();
        assert_eq!(maxima.len(), 3);
        for (max, expected) in maxima.iter().zip([17.16, 25.65, 39.29]) {
            assert_abs_diff_eq!(*max, expected, epsilon = 0.05);
        }
    }

    #[test]
    fn refinement_tightens_crossings() {
        let sgp4 = iss();
        let coarse = find_passes(&sgp4, &equator(), sgp4.epoch(), &coarse_settings(0.0, 24.0)).unwrap();
        let refined = find_passes(
            &sgp4,
            &equator(),
            sgp4.epoch(),
            &ScanSettings {
                min_elevation_deg: 0.0,
                ..ScanSettings::default()
            },
        )
        .unwrap();
        assert_eq!(coarse.len(), refined.len());
        for (c, r) in coarse.iter().zip(&refined) {
            // The coarse rise is the first sample above; the true crossing is
            // within one coarse step before it
            assert!(r.rise <= c.rise && c.rise - r.rise <= Duration::from_seconds(60.0));
            assert!(r.set <= c.set && c.set - r.set <= Duration::from_seconds(10.0));
            for at in [r.rise, r.set] {
                let elevation = look_angles(&sgp4, at, &equator()).unwrap().elevation_deg;
                assert!(elevation.abs() < 0.25, "elevation {elevation} at crossing");
            }
        }
    }

    #[test_case(0.0, 24.0; "loose threshold")]
    #[test_case(10.0, 24.0; "default threshold")]
    #[test_case(0.0, 48.0; "two days")]
    fn emitted_passes_are_ordered(min_elevation: f64, hours: f64) {
        let sgp4 = iss();
        let settings = ScanSettings {
            min_elevation_deg: min_elevation,
            window_hours: hours,
            ..ScanSettings::default()
        };
        for pass in find_passes(&sgp4, &equator(), sgp4.epoch(), &settings).unwrap() {
            assert!(pass.rise < pass.culmination && pass.culmination < pass.set);
            assert!(pass.max_elevation_deg >= min_elevation);
        }
    }

    #[test]
    fn one_orbit_has_one_pass() {
        let sgp4 = iss();
        let hours = sgp4.period_minutes() / 60.0;
        let passes = find_passes(&sgp4, &equator(), sgp4.epoch(), &coarse_settings(0.0, hours)).unwrap();
        assert_eq!(passes.len(), 1);
    }

    #[test_case(27.0, 4.0; "above the whole window")]
    #[test_case(20.0, 10.0; "rises but never sets")]
    fn open_pass_is_suppressed(start_minutes: f64, window_minutes: f64) {
        let sgp4 = iss();
        let start = sgp4.epoch() + time::minutes(start_minutes);
        let passes = find_passes(&sgp4, &equator(), start, &coarse_settings(0.0, window_minutes / 60.0)).unwrap();
        assert!(passes.is_empty());
    }

    #[test]
    fn constantly_high_target_emits_nothing() {
        let mut scanner = PassScanner::new(ScanSettings {
            min_elevation_deg: 0.0,
            ..ScanSettings::default()
        });
        let passes = scanner
            .scan(Epoch::from_unix_seconds(0.0), |_| {
                Ok(HorizonCoordinate {
                    azimuth_deg: 0.0,
                    elevation_deg: 45.0,
                    range_km: None,
                })
            })
            .unwrap();
        assert!(passes.is_empty());
        assert!(scanner.get_current_state().in_pass());
    }

    #[test]
    fn synthetic_arc_culminates_in_the_middle() {
        // Elevation peaks at 30 deg one hour in, above 0 for +-20 minutes
        let start = Epoch::from_unix_seconds(0.0);
        let look = |at: Epoch| -> Result<HorizonCoordinate> {
            let minutes = time::minutes_between(start, at);
            Ok(HorizonCoordinate {
                azimuth_deg: 180.0,
                elevation_deg: 30.0 - 0.075 * (minutes - 60.0).powi(2),
                range_km: Some(1000.0),
            })
        };
        let passes = PassScanner::new(ScanSettings {
            min_elevation_deg: 0.0,
            window_hours: 2.0,
            ..ScanSettings::default()
        })
        .scan(start, look)
        .unwrap();
        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_abs_diff_eq!(time::minutes_between(start, pass.rise), 40.0, epsilon = 1.0 / 60.0);
        assert_abs_diff_eq!(time::minutes_between(start, pass.set), 80.0, epsilon = 1.0 / 60.0);
        assert_abs_diff_eq!(time::minutes_between(start, pass.culmination), 60.0, epsilon = 10.0 / 60.0);
        assert_eq!(pass.direction, CompassPoint::S);
    }

    fn below_horizon(_: Epoch) -> Result<HorizonCoordinate> {
        Ok(HorizonCoordinate {
            azimuth_deg: 90.0,
            elevation_deg: -10.0,
            range_km: Some(5000.0),
        })
    }

    #[test_case(ScanSettings { coarse_step_seconds: 0.0, ..ScanSettings::default() }; "zero coarse step")]
    #[test_case(ScanSettings { fine_step_seconds: -10.0, ..ScanSettings::default() }; "negative fine step")]
    #[test_case(ScanSettings { coarse_step_seconds: f64::NAN, ..ScanSettings::default() }; "nan coarse step")]
    #[test_case(ScanSettings { window_hours: f64::INFINITY, ..ScanSettings::default() }; "infinite window")]
    #[test_case(ScanSettings { window_hours: -1.0, ..ScanSettings::default() }; "negative window")]
    #[test_case(ScanSettings { crossing_tolerance_seconds: 0.0, ..ScanSettings::default() }; "zero tolerance")]
    fn unending_settings_are_rejected(settings: ScanSettings) {
        let mut scanner = PassScanner::new(ScanSettings {
            window_hours: if settings.window_hours == 24.0 { 1.0 } else { settings.window_hours },
            ..settings
        });
        let result = scanner.scan(Epoch::from_unix_seconds(0.0), below_horizon);
        assert!(matches!(result, Err(Error::Config(_))), "{result:?}");
    }

    #[test]
    fn default_settings_are_valid() {
        assert!(ScanSettings::default().validate().is_ok());
        let coarse_only = ScanSettings {
            refine_crossings: false,
            crossing_tolerance_seconds: 0.0,
            ..ScanSettings::default()
        };
        assert!(coarse_only.validate().is_ok());
    }

    #[test]
    fn propagation_failure_aborts_scan() {
        let mut elements = parse_tle(ISS_1, ISS_2).unwrap();
        elements.bstar = 0.5;
        let sgp4 = Propagator::new(&elements).unwrap();
        let result = find_passes(&sgp4, &equator(), sgp4.epoch(), &coarse_settings(0.0, 48.0));
        match result {
            Err(Error::ScanAborted { source, .. }) => {
                assert!(matches!(*source, Error::PropagationDiverged { .. }))
            }
            other => panic!("expected aborted scan, got {other:?}"),
        }
    }
}
