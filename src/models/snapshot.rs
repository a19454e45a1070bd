use crate::coordinates::GeodeticPosition;
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

/// Position of one tracked object at the snapshot instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObjectSnapshot {
    pub id: String,
    pub group: String,
    pub position: GeodeticPosition,
    /// Inertial speed (km/s)
    pub speed_km_s: f64,
}

/// An object that could not be propagated for this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFailure {
    pub id: String,
    pub reason: String,
}

/// Every tracked object evaluated against the same instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub epoch: Epoch,
    pub objects: Vec<TrackedObjectSnapshot>,
    pub failures: Vec<TrackingFailure>,
}

impl Snapshot {
    pub fn empty(epoch: Epoch) -> Self {
        Self {
            epoch,
            objects: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&TrackedObjectSnapshot> {
        self.objects.iter().find(|o| o.id == id)
    }
}
