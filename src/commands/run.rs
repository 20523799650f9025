use anyhow::Context;

use crate::cli::SimArgs;
use crate::commands::resolve;

pub fn run(args: &SimArgs, json: bool) -> anyhow::Result<()> {
    let config = resolve(args)?;
    let output = config.run(None).context("simulation failed")?;

    if json {
        let text = serde_json::to_string_pretty(&output)?;
        println!("{text}");
        return Ok(());
    }

    let stats = &output.stats;
    println!("model       {}", output.model);
    println!("method      {}", config.integration.method);
    println!(
        "time        {:.3} .. {:.3} ms",
        config.t_start, stats.t_final
    );
    println!("samples     {}", output.series.len());
    println!("steps       {} ({} resets)", stats.steps, stats.resets);
    if config.integration.method.is_adaptive() {
        println!(
            "subdivided  {} ({} over tolerance)",
            stats.subdivisions, stats.accepted_best
        );
    }
    println!(
        "spikes      {} ({:.2} Hz)",
        output.spikes.count(),
        output.firing_rate
    );

    if let Some(last) = output.series.last() {
        let values = output
            .series
            .variables()
            .iter()
            .zip(last.state.as_slice())
            .map(|(name, value)| format!("{name}={value:.4}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("final       {values}");
    }

    Ok(())
}
