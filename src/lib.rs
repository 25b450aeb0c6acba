pub mod analysis;
pub mod config;
pub mod data;
pub mod loader;
pub mod output;
pub mod scan;
pub mod source;

pub use analysis::{detect_sweeps, extract_swings};
pub use data::{Bar, Direction, SwingKind, SwingPoint, SwingSet, SweepSignal};
