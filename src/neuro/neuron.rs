use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::neuro::{
    fitzhugh_nagumo::{FitzHughNagumo, FitzHughNagumoParams},
    hodgkin_huxley::{HodgkinHuxley, HodgkinHuxleyParams},
    izhikevich::{Izhikevich, IzhikevichParams},
};

/// Membrane potential followed by the model's auxiliary variables.
///
/// The length is fixed when the state is created; commits copy into the
/// existing buffer and never resize it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NeuronState {
    values: Vec<f64>,
}

impl NeuronState {
    pub fn new(values: Vec<f64>) -> Self {
        debug_assert!(!values.is_empty(), "state needs at least a membrane potential");
        Self { values }
    }

    pub fn v(&self) -> f64 {
        self.values[0]
    }

    pub fn aux(&self) -> &[f64] {
        &self.values[1..]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|x| x.is_finite())
    }

    /// Overwrites every component. Panics if the dimension differs.
    pub(crate) fn commit(&mut self, values: &[f64]) {
        self.values.copy_from_slice(values);
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

/// Capability shared by every neuron model.
///
/// `derivative` must not have side effects: integrators call it at trial
/// and intermediate states that are later thrown away.
pub trait NeuronModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Variable names, membrane potential first.
    fn variables(&self) -> &[&'static str];

    fn dimension(&self) -> usize {
        self.variables().len()
    }

    fn initial_state(&self) -> NeuronState;

    fn derivative(&self, t: f64, state: &[f64], i_ext: f64, d_state: &mut [f64]);

    /// Instantaneous jump taken instead of integrating this step.
    fn discrete_event(&self, _state: &[f64]) -> Option<Vec<f64>> {
        None
    }

    /// Bounds applied to every committed state.
    fn clip(&self, _state: &mut [f64]) {}

    /// Membrane potential counted as a spike when crossed upwards.
    fn spike_threshold(&self) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum NeuronKind {
    #[serde(rename = "hodgkin-huxley")]
    #[value(name = "hodgkin-huxley", alias = "hh")]
    HodgkinHuxley,
    #[serde(rename = "fitzhugh-nagumo")]
    #[value(name = "fitzhugh-nagumo", alias = "fhn")]
    FitzHughNagumo,
    #[serde(rename = "izhikevich")]
    #[value(name = "izhikevich", alias = "izh")]
    Izhikevich,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NeuronConfig {
    #[serde(rename = "hodgkin-huxley")]
    HodgkinHuxley(HodgkinHuxleyParams),
    #[serde(rename = "fitzhugh-nagumo")]
    FitzHughNagumo(FitzHughNagumoParams),
    #[serde(rename = "izhikevich")]
    Izhikevich(IzhikevichParams),
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self::HodgkinHuxley(HodgkinHuxleyParams::default())
    }
}

impl From<NeuronKind> for NeuronConfig {
    fn from(kind: NeuronKind) -> Self {
        match kind {
            NeuronKind::HodgkinHuxley => Self::HodgkinHuxley(Default::default()),
            NeuronKind::FitzHughNagumo => Self::FitzHughNagumo(Default::default()),
            NeuronKind::Izhikevich => Self::Izhikevich(Default::default()),
        }
    }
}

impl NeuronConfig {
    pub fn kind(&self) -> NeuronKind {
        match self {
            Self::HodgkinHuxley(_) => NeuronKind::HodgkinHuxley,
            Self::FitzHughNagumo(_) => NeuronKind::FitzHughNagumo,
            Self::Izhikevich(_) => NeuronKind::Izhikevich,
        }
    }

    /// Validates the parameters and builds the model.
    pub fn build(&self) -> Result<Box<dyn NeuronModel>> {
        Ok(match self {
            Self::HodgkinHuxley(params) => Box::new(HodgkinHuxley::new(*params)?),
            Self::FitzHughNagumo(params) => Box::new(FitzHughNagumo::new(*params)?),
            Self::Izhikevich(params) => Box::new(Izhikevich::new(*params)?),
        })
    }
}

/// Rejects NaN and infinite model parameters.
pub(crate) fn ensure_finite(model: &str, params: &[(&str, f64)]) -> Result<()> {
    for (name, value) in params {
        if !value.is_finite() {
            return Err(crate::error::invalid(format!(
                "{model}: parameter {name} must be finite, got {value}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_by_kind() {
        for kind in [
            NeuronKind::HodgkinHuxley,
            NeuronKind::FitzHughNagumo,
            NeuronKind::Izhikevich,
        ] {
            let config = NeuronConfig::from(kind);
            assert_eq!(config.kind(), kind);
            let model = config.build().unwrap();
            let state = model.initial_state();
            assert_eq!(state.dimension(), model.dimension());
            assert!(state.is_finite());
        }
    }

    #[test]
    fn config_parses_tagged_json() {
        let config: NeuronConfig =
            serde_json::from_str(r#"{"kind": "izhikevich", "d": 2.0}"#).unwrap();
        match config {
            NeuronConfig::Izhikevich(params) => {
                assert_eq!(params.d, 2.0);
                assert_eq!(params.a, 0.02);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    #[should_panic]
    fn commit_refuses_resize() {
        let mut state = NeuronState::new(vec![0.0, 0.0]);
        state.commit(&[1.0, 2.0, 3.0]);
    }
}
