pub mod energy;
pub mod engine;
pub mod types;

pub use energy::EnergyCalculator;
pub use engine::{EnergyVad, VadEngine};
pub use types::{VadConfig, VadState};
