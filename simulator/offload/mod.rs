// Offload Simulator Module
//
// Discrete-event population of battery-powered nodes and mains-powered
// depots, each running the energy-aware strategy over a simulated
// broadcast face and offload face.

pub mod config;
pub mod runner;
pub mod stats;
pub mod substrate;

// Re-export commonly used types
pub use config::OffloadSimConfig;
pub use runner::OffloadSimRunner;
#[allow(unused_imports)]
pub use stats::SimulationResult;
