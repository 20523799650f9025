use anyhow::{Context, ensure};
use neurodyn::SimulationConfig;
use neurodyn::neuro::{NeuronConfig, StimulusSpec};

use crate::cli::SimArgs;

pub mod compare;
pub mod run;

/// Config file (or defaults) with command-line overrides applied, validated.
pub fn resolve(args: &SimArgs) -> anyhow::Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if let Some(kind) = args.model {
        config.neuron = NeuronConfig::from(kind);
    }
    if let Some(method) = args.method {
        config.integration.method = method;
    }
    if let Some(dt) = args.dt {
        config.integration.dt = dt;
    }
    if let Some(tolerance) = args.tolerance {
        config.integration.tolerance = tolerance;
    }
    if let Some(max_subdivisions) = args.max_subdivisions {
        config.integration.max_subdivisions = max_subdivisions;
    }
    if let Some(policy) = args.on_non_convergence {
        config.integration.on_non_convergence = policy;
    }
    if let Some(duration) = args.duration {
        ensure!(duration > 0.0, "--duration must be positive, got {duration}");
        config.duration = duration;
    }
    if let Some(amplitude) = args.current {
        config.stimulus = StimulusSpec::Constant { amplitude };
    }

    config.validate().context("invalid simulation config")?;
    Ok(config)
}
