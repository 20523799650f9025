//! Error types for neurodyn

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected before any integration begins
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Adaptive stepping ran out of subdivisions without meeting tolerance
    #[error(
        "no convergence at t={t} ms: error {error:e} still above tolerance after {subdivisions} subdivisions (dt={dt:e}), state={state:?}"
    )]
    NonConvergence {
        t: f64,
        dt: f64,
        subdivisions: u32,
        error: f64,
        state: Vec<f64>,
    },

    /// A committed state contains NaN or infinity
    #[error("numeric divergence at t={t} ms, state={state:?}")]
    NumericDivergence { t: f64, state: Vec<f64> },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Shorthand used by the validation helpers.
pub(crate) fn invalid(msg: impl Into<String>) -> SimError {
    SimError::InvalidConfiguration(msg.into())
}
