//! Neuron models, their inputs and the simulation driver.

pub mod channels;
pub mod fitzhugh_nagumo;
pub mod hodgkin_huxley;
pub mod izhikevich;
pub mod neuron;
pub mod rates;
pub mod recording;
pub mod simulation;
pub mod stimuli;

pub use neuron::{NeuronConfig, NeuronKind, NeuronModel, NeuronState};
pub use recording::{Histogram, RecordingSink, SpikeTrain, TimeSeries};
pub use simulation::{CancelToken, Job, JobOutput, RunStats, Simulation, run_parallel};
pub use stimuli::{Stimulus, StimulusSpec, Waveform};
