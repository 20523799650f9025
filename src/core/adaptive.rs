//! Step-doubling error control.
//!
//! For each macro interval the base method is run once with `dt` and twice
//! with `dt/2`. The max-norm distance between the two estimates is the local
//! error; while it exceeds the tolerance `dt` is halved, at most
//! `max_subdivisions` times. The half-step estimate is the one committed.
//!
//! ```text
//! Evaluating ──error <= tol──▶ Converged
//!     │  ▲
//!     │  └──────────── Shrinking
//!     └─error > tol──▶ (subdivisions < max)
//!     └─error > tol──▶ Failed (subdivisions == max)
//! ```

use tracing::trace;

use crate::core::methods::{BaseMethod, Workspace};
use crate::core::system::{OdeSystem, max_abs_diff};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Evaluating,
    Shrinking,
    Converged,
    Failed,
}

/// Result of one macro interval. `dt` is the final, possibly shrunk, step.
#[derive(Clone, Debug, PartialEq)]
pub struct Trial {
    pub dt: f64,
    pub y: Vec<f64>,
    pub error: f64,
    pub subdivisions: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AdaptiveOutcome {
    Converged(Trial),
    /// Tolerance never met; carries the estimate from the smallest step tried.
    Failed(Trial),
}

#[derive(Clone, Debug)]
pub struct AdaptiveStepper {
    method: BaseMethod,
    tolerance: f64,
    max_subdivisions: u32,
    full: Vec<f64>,
    mid: Vec<f64>,
    half: Vec<f64>,
}

impl AdaptiveStepper {
    pub fn new(method: BaseMethod, tolerance: f64, max_subdivisions: u32, dimension: usize) -> Self {
        Self {
            method,
            tolerance,
            max_subdivisions,
            full: vec![0.0; dimension],
            mid: vec![0.0; dimension],
            half: vec![0.0; dimension],
        }
    }

    pub fn step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &[f64],
        dt_macro: f64,
        ws: &mut Workspace,
    ) -> AdaptiveOutcome {
        let mut dt = dt_macro;
        let mut subdivisions = 0;
        let mut error = f64::NAN;
        let mut phase = Phase::Evaluating;

        loop {
            match phase {
                Phase::Evaluating => {
                    let h = dt / 2.0;
                    self.method.step(system, t, y, dt, &mut self.full, ws);
                    self.method.step(system, t, y, h, &mut self.mid, ws);
                    self.method.step(system, t + h, &self.mid, h, &mut self.half, ws);

                    error = max_abs_diff(&self.half, &self.full);

                    // NaN fails this comparison and is treated as too large.
                    phase = if error <= self.tolerance {
                        Phase::Converged
                    } else if subdivisions >= self.max_subdivisions {
                        Phase::Failed
                    } else {
                        Phase::Shrinking
                    };
                }
                Phase::Shrinking => {
                    trace!(t, dt, error, tolerance = self.tolerance, "rejecting step");
                    dt /= 2.0;
                    subdivisions += 1;
                    phase = Phase::Evaluating;
                }
                Phase::Converged => {
                    return AdaptiveOutcome::Converged(self.trial(dt, error, subdivisions));
                }
                Phase::Failed => {
                    return AdaptiveOutcome::Failed(self.trial(dt, error, subdivisions));
                }
            }
        }
    }

    fn trial(&self, dt: f64, error: f64, subdivisions: u32) -> Trial {
        Trial {
            dt,
            y: self.half.clone(),
            error,
            subdivisions,
        }
    }
}
