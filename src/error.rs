use hifitime::Epoch;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine.
///
/// "No visible passes" is never an error: scanners return an empty list.
#[derive(Debug, Error)]
pub enum Error {
    /// Element text could not be parsed, or describes an impossible orbit.
    #[error("invalid orbital elements: {reason}")]
    InvalidElements { reason: String },

    /// SGP4 left its valid regime (eccentricity out of range, decay, ...).
    #[error("propagation diverged at {minutes_since_epoch:.3} min from epoch: {reason}")]
    PropagationDiverged {
        reason: String,
        minutes_since_epoch: f64,
    },

    /// Orbit period is long enough to require deep-space perturbations.
    #[error("deep-space orbit (period {period_minutes:.1} min) is not supported")]
    DeepSpaceUnsupported { period_minutes: f64 },

    /// No element set could be obtained from the source or its cache.
    #[error("elements unavailable for {catalog}: {reason}")]
    ElementsUnavailable { catalog: String, reason: String },

    /// Raised by location providers. Callers resolve it to a fallback.
    #[error("observer location unavailable: {0}")]
    LocationUnavailable(String),

    /// A pass scan hit a propagation failure.
    #[error("pass scan aborted at {at}: {source}")]
    ScanAborted {
        at: Epoch,
        #[source]
        source: Box<Error>,
    },

    #[error("unknown tracked object: {0}")]
    UnknownObject(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("clock error: {0}")]
    Clock(#[from] hifitime::HifitimeError),
}

impl Error {
    pub(crate) fn invalid_elements(reason: impl Into<String>) -> Self {
        Error::InvalidElements {
            reason: reason.into(),
        }
    }

    pub(crate) fn diverged(reason: impl Into<String>, minutes_since_epoch: f64) -> Self {
        Error::PropagationDiverged {
            reason: reason.into(),
            minutes_since_epoch,
        }
    }
}
