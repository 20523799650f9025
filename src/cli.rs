use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use neurodyn::core::{IntegrationMethod, NonConvergencePolicy};
use neurodyn::neuro::NeuronKind;

#[derive(Parser, Debug)]
#[command(
    name = "neurodyn",
    version,
    about = "Single-neuron dynamics simulator",
    long_about = None
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate one neuron and print a summary
    Run {
        #[command(flatten)]
        sim: SimArgs,

        /// Print the full recorded run as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Run the same neuron under several integration methods in parallel
    Compare {
        #[command(flatten)]
        sim: SimArgs,

        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            default_value = "euler,rk4,adaptive-euler,adaptive-rk4"
        )]
        methods: Vec<IntegrationMethod>,
    },
}

/// Overrides applied on top of the config file (or the defaults).
#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// JSON simulation config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replaces the configured neuron with the model's default parameters
    #[arg(short, long, value_enum)]
    pub model: Option<NeuronKind>,

    #[arg(long, value_enum)]
    pub method: Option<IntegrationMethod>,

    /// Step size (ms)
    #[arg(long)]
    pub dt: Option<f64>,

    #[arg(long)]
    pub tolerance: Option<f64>,

    #[arg(long)]
    pub max_subdivisions: Option<u32>,

    #[arg(long, value_enum)]
    pub on_non_convergence: Option<NonConvergencePolicy>,

    /// Simulated time (ms)
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Constant input current, replacing the configured stimulus
    #[arg(short = 'i', long)]
    pub current: Option<f64>,
}
