use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::{IntegrationConfig, Integrator, OdeSystem};
use crate::error::{Result, SimError, invalid};
use crate::neuro::neuron::{NeuronModel, NeuronState};
use crate::neuro::recording::{RecordingSink, TimeSeries};
use crate::neuro::stimuli::Stimulus;

/// Cooperative stop flag, checked between macro steps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A neuron model with its input plugged in.
struct Driven<'a> {
    model: &'a dyn NeuronModel,
    stimulus: &'a dyn Stimulus,
}

impl OdeSystem for Driven<'_> {
    fn dimension(&self) -> usize {
        self.model.dimension()
    }

    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]) {
        self.model.derivative(t, y, self.stimulus.sample(t), dy);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Committed integration steps
    pub steps: u64,
    /// Steps replaced by a discrete reset
    pub resets: u64,
    /// Rejected trials across all steps
    pub subdivisions: u64,
    /// Steps committed despite missing the tolerance
    pub accepted_best: u64,
    pub cancelled: bool,
    pub t_final: f64,
}

/// Drives one neuron over `[t_start, t_end]`.
pub struct Simulation<'a> {
    model: &'a dyn NeuronModel,
    stimulus: &'a dyn Stimulus,
    integrator: Integrator,
    t_start: f64,
    t_end: f64,
}

impl<'a> Simulation<'a> {
    pub fn new(
        model: &'a dyn NeuronModel,
        stimulus: &'a dyn Stimulus,
        config: IntegrationConfig,
        t_start: f64,
        t_end: f64,
    ) -> Result<Self> {
        if !(t_start.is_finite() && t_end.is_finite()) {
            return Err(invalid("time bounds must be finite"));
        }
        if t_end <= t_start {
            return Err(invalid(format!(
                "empty time grid: t_end={t_end} must exceed t_start={t_start}"
            )));
        }

        let horizon = t_start.abs().max(t_end.abs());
        if horizon + config.dt <= horizon {
            return Err(invalid(format!(
                "dt={} is below the time resolution at t={horizon}",
                config.dt
            )));
        }

        let integrator = Integrator::new(config, model.dimension())?;

        Ok(Self {
            model,
            stimulus,
            integrator,
            t_start,
            t_end,
        })
    }

    /// Integrates `state` in place, recording the initial state and every commit.
    pub fn run(
        &mut self,
        state: &mut NeuronState,
        sink: &mut dyn RecordingSink,
        cancel: Option<&CancelToken>,
    ) -> Result<RunStats> {
        if state.dimension() != self.model.dimension() {
            return Err(invalid(format!(
                "{} expects {} state variables, got {}",
                self.model.name(),
                self.model.dimension(),
                state.dimension()
            )));
        }
        if !state.is_finite() {
            return Err(invalid(format!(
                "initial state is not finite: {:?}",
                state.as_slice()
            )));
        }

        let dt_macro = self.integrator.config().dt;
        let eps = dt_macro * 1e-9;
        let system = Driven {
            model: self.model,
            stimulus: self.stimulus,
        };

        info!(
            model = self.model.name(),
            method = %self.integrator.config().method,
            dt = dt_macro,
            t_start = self.t_start,
            t_end = self.t_end,
            "starting run"
        );

        let mut stats = RunStats::default();
        let mut t = self.t_start;
        sink.accept(t, state);

        while self.t_end - t > eps {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                info!(t, "run cancelled");
                stats.cancelled = true;
                break;
            }

            let dt = dt_macro.min(self.t_end - t);

            let t_next = match self.model.discrete_event(state.as_slice()) {
                Some(jump) => {
                    debug!(t, "discrete reset");
                    state.commit(&jump);
                    stats.resets += 1;
                    t + dt
                }
                None => {
                    let step = self.integrator.advance(&system, t, state.as_slice(), dt)?;
                    state.commit(&step.y);
                    stats.steps += 1;
                    stats.subdivisions += u64::from(step.subdivisions);
                    stats.accepted_best += u64::from(step.accepted_best);
                    step.t
                }
            };

            self.model.clip(state.as_mut_slice());

            if !state.is_finite() {
                return Err(SimError::NumericDivergence {
                    t: t_next,
                    state: state.as_slice().to_vec(),
                });
            }

            t = t_next;
            sink.accept(t, state);
        }

        stats.t_final = t;
        info!(
            steps = stats.steps,
            resets = stats.resets,
            subdivisions = stats.subdivisions,
            t_final = t,
            "run finished"
        );
        Ok(stats)
    }
}

/// One independent neuron for [`run_parallel`].
pub struct Job {
    pub label: String,
    pub model: Box<dyn NeuronModel>,
    pub integration: IntegrationConfig,
}

pub struct JobOutput {
    pub label: String,
    pub result: Result<(TimeSeries, RunStats)>,
}

/// Runs each job on its own task. The stimulus is the only shared value.
pub fn run_parallel(
    jobs: Vec<Job>,
    stimulus: &dyn Stimulus,
    t_start: f64,
    t_end: f64,
    cancel: Option<&CancelToken>,
) -> Vec<JobOutput> {
    jobs.into_par_iter()
        .map(|job| {
            let result = run_job(&job, stimulus, t_start, t_end, cancel);
            JobOutput {
                label: job.label,
                result,
            }
        })
        .collect()
}

fn run_job(
    job: &Job,
    stimulus: &dyn Stimulus,
    t_start: f64,
    t_end: f64,
    cancel: Option<&CancelToken>,
) -> Result<(TimeSeries, RunStats)> {
    let model = job.model.as_ref();
    let mut simulation = Simulation::new(model, stimulus, job.integration, t_start, t_end)?;
    let mut state = model.initial_state();
    let mut series = TimeSeries::new(model.variables());
    let stats = simulation.run(&mut state, &mut series, cancel)?;
    Ok((series, stats))
}
