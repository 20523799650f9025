//! FitzHugh-Nagumo neuron
//!
//! ```text
//! dv/dt = v − v³/3 − w + I
//! dw/dt = (v + a − b·w) / τ
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};
use crate::neuro::neuron::{NeuronModel, NeuronState, ensure_finite};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitzHughNagumoParams {
    /// Excitation threshold offset
    pub a: f64,
    /// Recovery coupling
    pub b: f64,
    /// Recovery time scale
    pub tau: f64,
    pub v_init: f64,
    pub w_init: f64,
}

impl Default for FitzHughNagumoParams {
    fn default() -> Self {
        Self {
            a: 0.7,
            b: 0.8,
            tau: 12.5,
            v_init: 0.0,
            w_init: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FitzHughNagumo {
    params: FitzHughNagumoParams,
}

impl FitzHughNagumo {
    pub fn new(params: FitzHughNagumoParams) -> Result<Self> {
        ensure_finite(
            "fitzhugh-nagumo",
            &[
                ("a", params.a),
                ("b", params.b),
                ("tau", params.tau),
                ("v_init", params.v_init),
                ("w_init", params.w_init),
            ],
        )?;
        if params.tau <= 0.0 {
            return Err(invalid(format!(
                "fitzhugh-nagumo: tau must be positive, got {}",
                params.tau
            )));
        }
        Ok(Self { params })
    }
}

impl NeuronModel for FitzHughNagumo {
    fn name(&self) -> &'static str {
        "FitzHughNagumo"
    }

    fn variables(&self) -> &[&'static str] {
        &["v", "w"]
    }

    fn initial_state(&self) -> NeuronState {
        NeuronState::new(vec![self.params.v_init, self.params.w_init])
    }

    fn derivative(&self, _t: f64, state: &[f64], i_ext: f64, d_state: &mut [f64]) {
        let (v, w) = (state[0], state[1]);
        let FitzHughNagumoParams { a, b, tau, .. } = self.params;

        d_state[0] = v - v.powi(3) / 3.0 - w + i_ext;
        d_state[1] = (v + a - b * w) / tau;
    }

    fn spike_threshold(&self) -> f64 {
        1.0
    }
}
