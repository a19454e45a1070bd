use hifitime::Epoch;
use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Inertial (TEME) position and velocity at one instant.
///
/// Produced fresh by every propagation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub epoch: Epoch,
    /// Position (km)
    pub position: na::Vector3<f64>,
    /// Velocity (km/s)
    pub velocity: na::Vector3<f64>,
}

impl StateVector {
    pub fn new(epoch: Epoch, position: na::Vector3<f64>, velocity: na::Vector3<f64>) -> Self {
        Self {
            epoch,
            position,
            velocity,
        }
    }

    /// Inertial speed (km/s).
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }
}
