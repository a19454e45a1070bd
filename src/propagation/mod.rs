//! Orbit propagation.

pub mod sgp4;

pub use sgp4::Propagator;

use crate::elements::OrbitalElementSet;
use crate::error::Result;
use crate::models::StateVector;
use hifitime::Epoch;

/// One-shot propagation of an element set to an instant.
///
/// Callers that evaluate the same object repeatedly should keep a
/// [`Propagator`] instead, which initializes the model once.
pub fn propagate(elements: &OrbitalElementSet, epoch: Epoch) -> Result<StateVector> {
    Propagator::new(elements)?.propagate(epoch)
}
