use anyhow::{Context, bail, ensure};
use neurodyn::core::IntegrationMethod;
use neurodyn::core::system::max_abs_diff;
use neurodyn::neuro::{Job, SpikeTrain, run_parallel};
use tracing::info;

use crate::cli::SimArgs;
use crate::commands::resolve;

/// Higher is more accurate at the same step size.
fn accuracy_rank(method: IntegrationMethod) -> u8 {
    match method {
        IntegrationMethod::Euler => 0,
        IntegrationMethod::AdaptiveEuler => 1,
        IntegrationMethod::Rk4 => 2,
        IntegrationMethod::AdaptiveRk4 => 3,
    }
}

pub fn run(args: &SimArgs, methods: &[IntegrationMethod]) -> anyhow::Result<()> {
    ensure!(!methods.is_empty(), "no integration methods given");

    let config = resolve(args)?;
    let stimulus = config.stimulus.build(config.t_start, config.t_end())?;

    let mut jobs = Vec::with_capacity(methods.len());
    for &method in methods {
        let mut integration = config.integration;
        integration.method = method;
        jobs.push(Job {
            label: method.to_string(),
            model: config.neuron.build()?,
            integration,
        });
    }

    info!(jobs = jobs.len(), "comparing methods");
    let outputs = run_parallel(jobs, &stimulus, config.t_start, config.t_end(), None);

    let reference = methods
        .iter()
        .zip(&outputs)
        .filter(|(_, output)| output.result.is_ok())
        .max_by_key(|(method, _)| accuracy_rank(**method))
        .and_then(|(_, output)| output.result.as_ref().ok())
        .and_then(|(series, _)| series.last())
        .map(|sample| sample.state.clone());

    let Some(reference) = reference else {
        bail!("every method failed");
    };

    let threshold = config.neuron.build()?.spike_threshold();
    println!(
        "{:<16}{:>10}{:>10}{:>8}{:>14}",
        "method", "steps", "subdiv", "spikes", "final dev"
    );
    for output in &outputs {
        match &output.result {
            Ok((series, stats)) => {
                let last = series.last().context("empty recording")?;
                let deviation = max_abs_diff(last.state.as_slice(), reference.as_slice());
                let spikes = SpikeTrain::detect(series, threshold).count();
                println!(
                    "{:<16}{:>10}{:>10}{:>8}{:>14.3e}",
                    output.label, stats.steps, stats.subdivisions, spikes, deviation
                );
            }
            Err(err) => println!("{:<16}failed: {err}", output.label),
        }
    }

    Ok(())
}
