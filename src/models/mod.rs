pub mod pass;
pub mod snapshot;
pub mod state;

pub use pass::PassEvent;
pub use snapshot::{Snapshot, TrackedObjectSnapshot, TrackingFailure};
pub use state::StateVector;
