use tracing::{debug, warn};

use crate::core::adaptive::{AdaptiveOutcome, AdaptiveStepper};
use crate::core::config::{IntegrationConfig, NonConvergencePolicy};
use crate::core::methods::Workspace;
use crate::core::system::OdeSystem;
use crate::error::{Result, SimError};

/// A committed step: the new time and state plus bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub t: f64,
    pub y: Vec<f64>,
    /// Halvings performed before the step was accepted
    pub subdivisions: u32,
    /// True when an adaptive step failed and its best estimate was kept anyway
    pub accepted_best: bool,
}

/// Binds an [`IntegrationConfig`] to a state dimension.
///
/// Holds only scratch buffers; the state being integrated belongs to the caller.
#[derive(Clone, Debug)]
pub struct Integrator {
    config: IntegrationConfig,
    workspace: Workspace,
    adaptive: Option<AdaptiveStepper>,
    out: Vec<f64>,
}

impl Integrator {
    pub fn new(config: IntegrationConfig, dimension: usize) -> Result<Self> {
        config.validate()?;
        if dimension == 0 {
            return Err(SimError::InvalidConfiguration(
                "state dimension must be at least 1".into(),
            ));
        }

        let adaptive = config.method.is_adaptive().then(|| {
            AdaptiveStepper::new(
                config.method.base(),
                config.tolerance,
                config.max_subdivisions,
                dimension,
            )
        });

        Ok(Self {
            config,
            workspace: Workspace::new(dimension),
            adaptive,
            out: vec![0.0; dimension],
        })
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.out.len()
    }

    /// Advances `y` from `t` over one macro step of `dt`.
    ///
    /// Fixed methods always land on `t + dt`. Adaptive methods land on
    /// `t + dt / 2^k` where `k` is the number of halvings needed.
    pub fn advance<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &[f64],
        dt: f64,
    ) -> Result<Step> {
        debug_assert_eq!(y.len(), self.dimension());
        debug_assert_eq!(system.dimension(), self.dimension());

        let Some(stepper) = self.adaptive.as_mut() else {
            self.config
                .method
                .base()
                .step(system, t, y, dt, &mut self.out, &mut self.workspace);
            return Ok(Step {
                t: t + dt,
                y: self.out.clone(),
                subdivisions: 0,
                accepted_best: false,
            });
        };

        let outcome = stepper.step(system, t, y, dt, &mut self.workspace);
        let trial = match &outcome {
            AdaptiveOutcome::Converged(trial) | AdaptiveOutcome::Failed(trial) => trial,
        };
        // A step below the float spacing at `t` cannot move time forward.
        if t + trial.dt <= t {
            return Err(SimError::NonConvergence {
                t,
                dt: trial.dt,
                subdivisions: trial.subdivisions,
                error: trial.error,
                state: y.to_vec(),
            });
        }

        match outcome {
            AdaptiveOutcome::Converged(trial) => {
                if trial.subdivisions > 0 {
                    debug!(
                        t,
                        dt = trial.dt,
                        subdivisions = trial.subdivisions,
                        "step accepted after shrinking"
                    );
                }
                Ok(Step {
                    t: t + trial.dt,
                    y: trial.y,
                    subdivisions: trial.subdivisions,
                    accepted_best: false,
                })
            }
            AdaptiveOutcome::Failed(trial) => match self.config.on_non_convergence {
                NonConvergencePolicy::Abort => Err(SimError::NonConvergence {
                    t,
                    dt: trial.dt,
                    subdivisions: trial.subdivisions,
                    error: trial.error,
                    state: y.to_vec(),
                }),
                NonConvergencePolicy::AcceptBest => {
                    warn!(
                        t,
                        dt = trial.dt,
                        error = trial.error,
                        tolerance = self.config.tolerance,
                        "tolerance not met, keeping best estimate"
                    );
                    Ok(Step {
                        t: t + trial.dt,
                        y: trial.y,
                        subdivisions: trial.subdivisions,
                        accepted_best: true,
                    })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IntegrationMethod;
    use crate::core::system::FnSystem;

    #[test]
    fn rejects_invalid_config_up_front() {
        let cfg = IntegrationConfig::fixed(IntegrationMethod::Rk4, -1.0);
        assert!(matches!(
            Integrator::new(cfg, 1),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(Integrator::new(IntegrationConfig::default(), 0).is_err());
    }

    #[test]
    fn fixed_step_lands_on_t_plus_dt() {
        let system = FnSystem::new(1, |_t: f64, _y: &[f64], dy: &mut [f64]| dy[0] = 2.0);
        let mut integrator =
            Integrator::new(IntegrationConfig::fixed(IntegrationMethod::Euler, 0.5), 1).unwrap();
        let step = integrator.advance(&system, 1.0, &[0.0], 0.5).unwrap();
        assert_eq!(step.t, 1.5);
        assert_eq!(step.y, vec![1.0]);
        assert_eq!(step.subdivisions, 0);
    }

    #[test]
    fn non_convergence_reports_time_and_state() {
        let system = FnSystem::new(1, |_t: f64, y: &[f64], dy: &mut [f64]| dy[0] = -y[0]);
        let mut cfg = IntegrationConfig::adaptive(IntegrationMethod::AdaptiveEuler, 1.0, 1e-30);
        cfg.max_subdivisions = 5;
        let mut integrator = Integrator::new(cfg, 1).unwrap();

        match integrator.advance(&system, 3.0, &[1.0], 1.0) {
            Err(SimError::NonConvergence {
                t,
                subdivisions,
                state,
                ..
            }) => {
                assert_eq!(t, 3.0);
                assert_eq!(subdivisions, 5);
                assert_eq!(state, vec![1.0]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_subdivisions_checks_error_without_shrinking() {
        let system = FnSystem::new(1, |_t: f64, y: &[f64], dy: &mut [f64]| dy[0] = -y[0]);
        let mut cfg = IntegrationConfig::adaptive(IntegrationMethod::AdaptiveRk4, 0.01, 1e-6);
        cfg.max_subdivisions = 0;
        let mut integrator = Integrator::new(cfg, 1).unwrap();
        let step = integrator.advance(&system, 0.0, &[1.0], 0.01).unwrap();
        assert_eq!(step.t, 0.01);
        assert_eq!(step.subdivisions, 0);

        cfg.tolerance = 1e-300;
        let mut strict = Integrator::new(cfg, 1).unwrap();
        assert!(matches!(
            strict.advance(&system, 0.0, &[1.0], 0.01),
            Err(SimError::NonConvergence { subdivisions: 0, .. })
        ));
    }

    #[test]
    fn step_below_time_resolution_is_non_convergence() {
        let system = FnSystem::new(1, |_t: f64, y: &[f64], dy: &mut [f64]| dy[0] = -y[0]);
        let mut cfg = IntegrationConfig::adaptive(IntegrationMethod::AdaptiveEuler, 0.1, 1e-300);
        cfg.max_subdivisions = IntegrationConfig::SUBDIVISION_LIMIT;
        cfg.on_non_convergence = NonConvergencePolicy::AcceptBest;
        let mut integrator = Integrator::new(cfg, 1).unwrap();

        match integrator.advance(&system, 1e6, &[1.0], 0.1) {
            Err(SimError::NonConvergence { t, dt, state, .. }) => {
                assert_eq!(t, 1e6);
                assert_eq!(1e6 + dt, 1e6);
                assert_eq!(state, vec![1.0]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn accept_best_policy_keeps_smallest_step_estimate() {
        let system = FnSystem::new(1, |_t: f64, y: &[f64], dy: &mut [f64]| dy[0] = -y[0]);
        let mut cfg = IntegrationConfig::adaptive(IntegrationMethod::AdaptiveEuler, 1.0, 1e-30);
        cfg.max_subdivisions = 2;
        cfg.on_non_convergence = NonConvergencePolicy::AcceptBest;
        let mut integrator = Integrator::new(cfg, 1).unwrap();

        let step = integrator.advance(&system, 0.0, &[1.0], 1.0).unwrap();
        assert!(step.accepted_best);
        assert_eq!(step.t, 0.25);
        assert_eq!(step.subdivisions, 2);
    }
}
