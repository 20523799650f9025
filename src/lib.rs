//! Single-neuron simulation: Hodgkin-Huxley, FitzHugh-Nagumo and Izhikevich
//! models driven by an external current and advanced by fixed or adaptive
//! step integrators.

pub mod config;
pub mod core;
pub mod error;
pub mod neuro;

pub use config::{RunOutput, SimulationConfig};
pub use error::{Result, SimError};
