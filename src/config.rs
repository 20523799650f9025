use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::IntegrationConfig;
use crate::error::{Result, invalid};
use crate::neuro::{
    CancelToken, NeuronConfig, RunStats, Simulation, SpikeTrain, StimulusSpec, TimeSeries,
};

/// Everything needed for one single-neuron run. Missing fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub neuron: NeuronConfig,
    pub integration: IntegrationConfig,
    pub stimulus: StimulusSpec,
    /// ms
    pub t_start: f64,
    /// ms
    pub duration: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            neuron: NeuronConfig::default(),
            integration: IntegrationConfig::default(),
            stimulus: StimulusSpec::default(),
            t_start: 0.0,
            duration: 100.0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunOutput {
    pub model: &'static str,
    pub series: TimeSeries,
    pub stats: RunStats,
    pub spikes: SpikeTrain,
    /// Hz over the recorded span
    pub firing_rate: f64,
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    pub fn t_end(&self) -> f64 {
        self.t_start + self.duration
    }

    /// Checks everything that can be checked without running.
    pub fn validate(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(invalid(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        if !self.t_start.is_finite() {
            return Err(invalid("t_start must be finite"));
        }
        self.integration.validate()?;
        self.neuron.build()?;
        self.stimulus.build(self.t_start, self.t_end())?;
        Ok(())
    }

    pub fn run(&self, cancel: Option<&CancelToken>) -> Result<RunOutput> {
        let model = self.neuron.build()?;
        let stimulus = self.stimulus.build(self.t_start, self.t_end())?;

        let mut simulation = Simulation::new(
            model.as_ref(),
            &stimulus,
            self.integration,
            self.t_start,
            self.t_end(),
        )?;
        let mut state = model.initial_state();
        let mut series = TimeSeries::new(model.variables());
        let stats = simulation.run(&mut state, &mut series, cancel)?;

        let spikes = SpikeTrain::detect(&series, model.spike_threshold());
        let firing_rate = spikes.rate_hz(series.span());

        Ok(RunOutput {
            model: model.name(),
            series,
            stats,
            spikes,
            firing_rate,
        })
    }
}
