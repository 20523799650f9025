//! Numerical integration, independent of any neuron model.

pub mod adaptive;
pub mod config;
pub mod integrator;
pub mod methods;
pub mod system;

pub use config::{IntegrationConfig, IntegrationMethod, NonConvergencePolicy};
pub use integrator::{Integrator, Step};
pub use system::{FnSystem, OdeSystem};
