use super::coordinate_transformation::geodetic_to_ecef;
use crate::error::{Error, Result};
use crate::time;
use log::{debug, warn};
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// A ground observer on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    pub latitude_deg: f64,
    /// Normalized to (-180, 180]
    pub longitude_deg: f64,
    pub height_km: f64,
}

impl ObserverLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_km: f64) -> Result<Self> {
        if !(latitude_deg.is_finite() && longitude_deg.is_finite() && height_km.is_finite()) {
            return Err(Error::LocationUnavailable("non-finite coordinate".into()));
        }
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(Error::LocationUnavailable(format!(
                "latitude {latitude_deg} outside [-90, 90]"
            )));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg: time::wrap_180(longitude_deg),
            height_km,
        })
    }

    /// The located position, or `fallback` when locating failed.
    pub fn default_or(located: Result<ObserverLocation>, fallback: ObserverLocation) -> Self {
        match located {
            Ok(location) => location,
            Err(e) => {
                warn!("{e}; using fallback observer {fallback}");
                fallback
            }
        }
    }

    /// Earth-fixed position (km).
    pub fn to_ecef(&self) -> na::Vector3<f64> {
        geodetic_to_ecef(self.latitude_deg, self.longitude_deg, self.height_km)
    }
}

impl std::fmt::Display for ObserverLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}, {:.3} km)",
            self.latitude_deg, self.longitude_deg, self.height_km
        )
    }
}

/// Anything that can tell where the observer is. May block; callers bound
/// it with [`resolve_observer`].
pub trait LocationProvider {
    fn locate(&self) -> Result<ObserverLocation>;
}

/// A location known up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub ObserverLocation);

impl LocationProvider for FixedLocation {
    fn locate(&self) -> Result<ObserverLocation> {
        Ok(self.0)
    }
}

/// Best-effort location from an IP geolocation service returning
/// `{"latitude": .., "longitude": ..}`.
pub struct IpLocator {
    url: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct IpLookup {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl IpLocator {
    pub const DEFAULT_URL: &'static str = "https://ipapi.co/json/";

    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            client: reqwest::blocking::Client::builder().timeout(timeout).build()?,
        })
    }
}

impl LocationProvider for IpLocator {
    fn locate(&self) -> Result<ObserverLocation> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| Error::LocationUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::LocationUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .map_err(|e| Error::LocationUnavailable(e.to_string()))?;
        observer_from_lookup(&body)
    }
}

fn observer_from_lookup(body: &str) -> Result<ObserverLocation> {
    let lookup: IpLookup =
        serde_json::from_str(body).map_err(|e| Error::LocationUnavailable(e.to_string()))?;
    match (lookup.latitude, lookup.longitude) {
        (Some(lat), Some(lon)) => ObserverLocation::new(lat, lon, 0.0),
        _ => Err(Error::LocationUnavailable(
            "response carried no coordinates".into(),
        )),
    }
}

/// How the observer for a session was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationStatus {
    Provided,
    Fallback { reason: String },
}

/// Ask `provider` for the observer, waiting at most `timeout`.
///
/// Failure and timeout both resolve to `fallback`; the status records which
/// one was used.
pub fn resolve_observer<P>(
    provider: P,
    timeout: Duration,
    fallback: ObserverLocation,
) -> (ObserverLocation, LocationStatus)
where
    P: LocationProvider + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may have given up already
        let _ = tx.send(provider.locate());
    });

    let located = match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(Error::LocationUnavailable(format!(
            "no answer within {:.1} s",
            timeout.as_secs_f64()
        ))),
    };

    match located {
        Ok(location) => {
            debug!("observer located at {location}");
            (location, LocationStatus::Provided)
        }
        Err(e) => {
            let reason = e.to_string();
            (
                ObserverLocation::default_or(Err(e), fallback),
                LocationStatus::Fallback { reason },
            )
        }
    }
}
