//! Izhikevich neuron
//!
//! ```text
//! dv/dt = 0.04v² + 5v + 140 − u + I
//! du/dt = a(bv − u)
//! if v >= v_peak: v = c, u = u + d
//! ```
//!
//! The reset is a discrete jump: a step that starts at or above the peak
//! performs the reset and nothing else. Committed states are clipped to the
//! peak, so the overshoot of the continuous dynamics is never recorded.

use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};
use crate::neuro::neuron::{NeuronModel, NeuronState, ensure_finite};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IzhikevichParams {
    /// Time scale of recovery
    pub a: f64,
    /// Sensitivity of u to v
    pub b: f64,
    /// After-spike reset value for v (mV)
    pub c: f64,
    /// After-spike increment of u
    pub d: f64,
    /// Spike peak / reset threshold (mV)
    pub v_peak: f64,
}

impl Default for IzhikevichParams {
    fn default() -> Self {
        // Regular spiking
        Self {
            a: 0.02,
            b: 0.2,
            c: -65.0,
            d: 8.0,
            v_peak: 30.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Izhikevich {
    params: IzhikevichParams,
}

impl Izhikevich {
    pub fn new(params: IzhikevichParams) -> Result<Self> {
        ensure_finite(
            "izhikevich",
            &[
                ("a", params.a),
                ("b", params.b),
                ("c", params.c),
                ("d", params.d),
                ("v_peak", params.v_peak),
            ],
        )?;
        if params.c >= params.v_peak {
            return Err(invalid(format!(
                "izhikevich: reset potential c={} must be below v_peak={}",
                params.c, params.v_peak
            )));
        }
        Ok(Self { params })
    }
}

impl NeuronModel for Izhikevich {
    fn name(&self) -> &'static str {
        "Izhikevich"
    }

    fn variables(&self) -> &[&'static str] {
        &["v", "u"]
    }

    fn initial_state(&self) -> NeuronState {
        let IzhikevichParams { b, c, .. } = self.params;
        NeuronState::new(vec![c, b * c])
    }

    fn derivative(&self, _t: f64, state: &[f64], i_ext: f64, d_state: &mut [f64]) {
        let (v, u) = (state[0], state[1]);
        let IzhikevichParams { a, b, .. } = self.params;

        d_state[0] = 0.04 * v * v + 5.0 * v + 140.0 - u + i_ext;
        d_state[1] = a * (b * v - u);
    }

    fn discrete_event(&self, state: &[f64]) -> Option<Vec<f64>> {
        (state[0] >= self.params.v_peak).then(|| vec![self.params.c, state[1] + self.params.d])
    }

    fn clip(&self, state: &mut [f64]) {
        if state[0] > self.params.v_peak {
            state[0] = self.params.v_peak;
        }
    }

    fn spike_threshold(&self) -> f64 {
        self.params.v_peak
    }
}
