use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::methods::BaseMethod;
use crate::error::{Result, invalid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationMethod {
    Euler,
    Rk4,
    AdaptiveEuler,
    AdaptiveRk4,
}

impl IntegrationMethod {
    pub const ALL: [IntegrationMethod; 4] = [
        IntegrationMethod::Euler,
        IntegrationMethod::Rk4,
        IntegrationMethod::AdaptiveEuler,
        IntegrationMethod::AdaptiveRk4,
    ];

    pub fn base(self) -> BaseMethod {
        match self {
            IntegrationMethod::Euler | IntegrationMethod::AdaptiveEuler => BaseMethod::Euler,
            IntegrationMethod::Rk4 | IntegrationMethod::AdaptiveRk4 => BaseMethod::Rk4,
        }
    }

    pub fn is_adaptive(self) -> bool {
        matches!(
            self,
            IntegrationMethod::AdaptiveEuler | IntegrationMethod::AdaptiveRk4
        )
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegrationMethod::Euler => "euler",
            IntegrationMethod::Rk4 => "rk4",
            IntegrationMethod::AdaptiveEuler => "adaptive-euler",
            IntegrationMethod::AdaptiveRk4 => "adaptive-rk4",
        };
        f.write_str(name)
    }
}

/// What the driver does when an adaptive step runs out of subdivisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NonConvergencePolicy {
    /// Stop the run with `SimError::NonConvergence`.
    #[default]
    Abort,
    /// Commit the estimate from the smallest step tried and keep going.
    AcceptBest,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub method: IntegrationMethod,
    /// Fixed step, or the macro step an adaptive method starts each interval from (ms)
    pub dt: f64,
    /// Max-norm local error bound (adaptive only)
    pub tolerance: f64,
    /// Halvings allowed per macro step (adaptive only). Zero keeps the
    /// requested step and only checks its error.
    pub max_subdivisions: u32,
    pub on_non_convergence: NonConvergencePolicy,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::Rk4,
            dt: 0.01,
            tolerance: 1e-3,
            max_subdivisions: 20,
            on_non_convergence: NonConvergencePolicy::Abort,
        }
    }
}

impl IntegrationConfig {
    /// Halving more often than this leaves dt below f64 resolution of t.
    pub const SUBDIVISION_LIMIT: u32 = 52;

    pub fn fixed(method: IntegrationMethod, dt: f64) -> Self {
        Self {
            method,
            dt,
            ..Self::default()
        }
    }

    pub fn adaptive(method: IntegrationMethod, dt: f64, tolerance: f64) -> Self {
        Self {
            method,
            dt,
            tolerance,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(invalid(format!("dt must be positive, got {}", self.dt)));
        }

        if self.method.is_adaptive() {
            if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
                return Err(invalid(format!(
                    "tolerance must be positive, got {}",
                    self.tolerance
                )));
            }
            if self.max_subdivisions > Self::SUBDIVISION_LIMIT {
                return Err(invalid(format!(
                    "max_subdivisions must be in 0..={}, got {}",
                    Self::SUBDIVISION_LIMIT,
                    self.max_subdivisions
                )));
            }
        }

        Ok(())
    }
}
