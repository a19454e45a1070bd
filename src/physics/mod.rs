pub mod orbital;

pub use orbital::OrbitalMechanics;
