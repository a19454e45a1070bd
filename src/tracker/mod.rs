//! Multi-object tracking: one instant, every object.

pub mod scheduler;

pub use scheduler::{Animator, LiveTracker, Ticker};

use crate::coordinates::{to_geodetic, GeodeticPosition};
use crate::elements::OrbitalElementSet;
use crate::error::{Error, Result};
use crate::models::{Snapshot, TrackedObjectSnapshot, TrackingFailure};
use crate::propagation::Propagator;
use crate::time;
use hifitime::Epoch;
use log::{debug, warn};

/// An object under tracking, with its propagator initialized once.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub id: String,
    pub group: String,
    propagator: Propagator,
}

impl TrackedObject {
    pub fn new(id: impl Into<String>, group: impl Into<String>, elements: &OrbitalElementSet) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            group: group.into(),
            propagator: Propagator::new(elements)?,
        })
    }

    /// Identified by the element set's label.
    pub fn from_elements(group: impl Into<String>, elements: &OrbitalElementSet) -> Result<Self> {
        Self::new(elements.label(), group, elements)
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    fn snapshot(&self, epoch: Epoch) -> Result<TrackedObjectSnapshot> {
        let state = self.propagator.propagate(epoch)?;
        Ok(TrackedObjectSnapshot {
            id: self.id.clone(),
            group: self.group.clone(),
            position: to_geodetic(&state),
            speed_km_s: state.speed(),
        })
    }
}

/// A fixed set of objects evaluated together.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    objects: Vec<TrackedObject>,
}

impl Tracker {
    pub fn new(objects: Vec<TrackedObject>) -> Self {
        Self { objects }
    }

    /// Builds a tracker from raw element sets. Sets the propagator rejects are
    /// skipped with a warning.
    pub fn from_element_sets(group: &str, sets: &[OrbitalElementSet]) -> Self {
        let objects = sets
            .iter()
            .filter_map(|elements| match TrackedObject::from_elements(group, elements) {
                Ok(object) => Some(object),
                Err(e) => {
                    warn!("not tracking {}: {e}", elements.label());
                    None
                }
            })
            .collect();
        Self::new(objects)
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Positions of every object at `epoch`.
    ///
    /// An object that fails to propagate is reported in `failures` and does
    /// not affect the others.
    pub fn snapshot(&self, epoch: Epoch) -> Snapshot {
        let mut snapshot = Snapshot::empty(epoch);
        for object in &self.objects {
            match object.snapshot(epoch) {
                Ok(entry) => snapshot.objects.push(entry),
                Err(e) => {
                    debug!("{} failed at {epoch}: {e}", object.id);
                    snapshot.failures.push(TrackingFailure {
                        id: object.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        snapshot
    }

    /// Ground track of one object from `start`, one point per minute,
    /// including both ends.
    pub fn project_path(&self, id: &str, start: Epoch, duration_minutes: u32) -> Result<Vec<GeodeticPosition>> {
        let object = self.get(id).ok_or_else(|| Error::UnknownObject(id.to_string()))?;
        (0..=duration_minutes)
            .map(|minute| {
                let epoch = start + time::minutes(f64::from(minute));
                Ok(to_geodetic(&object.propagator.propagate(epoch)?))
            })
            .collect()
    }
}
