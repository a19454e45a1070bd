//! Orbit propagation and observer visibility.
//!
//! Element sets are propagated with near-Earth SGP4, converted to ground
//! points and observer look angles, and scanned for passes. Solar system
//! bodies and a small fixed-star catalog share the same horizon model.

pub mod celestial;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod elements;
pub mod error;
pub mod models;
pub mod physics;
pub mod propagation;
pub mod time;
pub mod tracker;
pub mod visibility;

pub use error::{Error, Result};
