pub mod sweeps;
pub mod swings;

pub use sweeps::detect_sweeps;
pub use swings::extract_swings;
