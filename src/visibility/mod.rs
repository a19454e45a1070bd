//! Pass prediction over a time window.

pub mod scan_states;
pub mod scanner;

pub use scan_states::ScanState;
pub use scanner::{bisect_crossing, find_passes, PassScanner, ScanSettings};
