//! Engine configuration, loaded from JSON with a default for every field.

use crate::coordinates::ObserverLocation;
use crate::error::{Error, Result};
use crate::visibility::ScanSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub observer: ObserverConfig,
    pub scan: ScanSettings,
    pub tracker: TrackerConfig,
    pub source: SourceConfig,
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.observer.fallback()?;
        if !is_positive(self.observer.location_timeout_seconds) {
            return Err(Error::Config(format!(
                "location timeout must be positive, got {}",
                self.observer.location_timeout_seconds
            )));
        }
        self.scan.validate()?;
        if self.scan.fine_step_seconds > self.scan.coarse_step_seconds {
            return Err(Error::Config(
                "fine scan step must not exceed the coarse step".into(),
            ));
        }
        if self.tracker.tick_interval_ms == 0 {
            return Err(Error::Config("tracker tick interval must be non-zero".into()));
        }
        if !is_positive(self.source.timeout_seconds) {
            return Err(Error::Config(format!(
                "source timeout must be positive, got {}",
                self.source.timeout_seconds
            )));
        }
        Ok(())
    }
}

fn is_positive(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Used when the location provider fails or times out.
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
    pub fallback_height_km: f64,
    pub location_timeout_seconds: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        // New Delhi
        Self {
            fallback_latitude: 28.6139,
            fallback_longitude: 77.2090,
            fallback_height_km: 0.0,
            location_timeout_seconds: 5.0,
        }
    }
}

impl ObserverConfig {
    pub fn fallback(&self) -> Result<ObserverLocation> {
        ObserverLocation::new(
            self.fallback_latitude,
            self.fallback_longitude,
            self.fallback_height_km,
        )
        .map_err(|e| Error::Config(format!("fallback observer: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub tick_interval_ms: u64,
    /// Default length of a projected ground track.
    pub path_minutes: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            path_minutes: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_seconds: f64,
    pub cache_hours: i64,
    /// Defaults to the user cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://celestrak.org/NORAD/elements/gp.php".into(),
            timeout_seconds: 10.0,
            cache_hours: 6,
            cache_dir: None,
        }
    }
}
