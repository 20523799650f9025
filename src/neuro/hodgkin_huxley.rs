//! Hodgkin-Huxley neuron
//!
//! ```text
//! C_m·dV/dt = I_ext − I_Na − I_K − I_L [− I_Ca]
//! I_Na = g_Na·m³h·(V − E_Na)
//! I_K  = g_K·n⁴·(V − E_K)
//! I_L  = g_L·(V − E_L)
//! I_Ca = g_Ca·c²·(V − E_Ca)      only when calcium is configured
//! ```
//!
//! State layout: `[V, m, h, n]`, or `[V, m, h, n, c]` with calcium.

use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};
use crate::neuro::channels::IonChannel;
use crate::neuro::neuron::{NeuronModel, NeuronState, ensure_finite};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HodgkinHuxleyParams {
    /// Membrane capacitance (µF/cm²)
    pub c_m: f64,
    /// Maximum conductances (mS/cm²)
    pub g_na: f64,
    pub g_k: f64,
    pub g_l: f64,
    /// Reversal potentials (mV)
    pub e_na: f64,
    pub e_k: f64,
    pub e_l: f64,
    /// Initial membrane potential (mV); gates start at steady state for it
    pub v_init: f64,
    pub calcium: Option<CalciumParams>,
}

impl Default for HodgkinHuxleyParams {
    fn default() -> Self {
        Self {
            c_m: 1.0,
            g_na: 120.0,
            g_k: 36.0,
            g_l: 0.3,
            e_na: 50.0,
            e_k: -77.0,
            e_l: -54.387,
            v_init: -65.0,
            calcium: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalciumParams {
    pub g_ca: f64,
    pub e_ca: f64,
}

impl Default for CalciumParams {
    fn default() -> Self {
        Self {
            g_ca: 0.3,
            e_ca: 120.0,
        }
    }
}

/// Per-channel currents at one state (µA/cm²).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Currents {
    pub sodium: f64,
    pub potassium: f64,
    pub leak: f64,
    pub calcium: f64,
}

impl Currents {
    pub fn total(&self) -> f64 {
        self.sodium + self.potassium + self.leak + self.calcium
    }
}

#[derive(Clone, Debug)]
pub struct HodgkinHuxley {
    params: HodgkinHuxleyParams,
    sodium: IonChannel,
    potassium: IonChannel,
    calcium: Option<IonChannel>,
    variables: Vec<&'static str>,
}

impl HodgkinHuxley {
    const NA: std::ops::Range<usize> = 1..3;
    const K: std::ops::Range<usize> = 3..4;
    const CA: std::ops::Range<usize> = 4..5;

    pub fn new(params: HodgkinHuxleyParams) -> Result<Self> {
        let mut checked = vec![
            ("c_m", params.c_m),
            ("g_na", params.g_na),
            ("g_k", params.g_k),
            ("g_l", params.g_l),
            ("e_na", params.e_na),
            ("e_k", params.e_k),
            ("e_l", params.e_l),
            ("v_init", params.v_init),
        ];
        if let Some(ca) = params.calcium {
            checked.push(("g_ca", ca.g_ca));
            checked.push(("e_ca", ca.e_ca));
        }
        ensure_finite("hodgkin-huxley", &checked)?;

        if params.c_m <= 0.0 {
            return Err(invalid(format!(
                "hodgkin-huxley: c_m must be positive, got {}",
                params.c_m
            )));
        }
        if checked.iter().any(|(name, value)| name.starts_with("g_") && *value < 0.0) {
            return Err(invalid("hodgkin-huxley: conductances must be non-negative"));
        }

        let mut variables = vec!["V", "m", "h", "n"];
        let calcium = params.calcium.map(|ca| {
            variables.push("c");
            IonChannel::calcium(ca.g_ca, ca.e_ca)
        });

        Ok(Self {
            params,
            sodium: IonChannel::sodium(params.g_na, params.e_na),
            potassium: IonChannel::potassium(params.g_k, params.e_k),
            calcium,
            variables,
        })
    }

    pub fn params(&self) -> &HodgkinHuxleyParams {
        &self.params
    }

    pub fn currents(&self, state: &[f64]) -> Currents {
        let v = state[0];
        Currents {
            sodium: self.sodium.current(v, &state[Self::NA]),
            potassium: self.potassium.current(v, &state[Self::K]),
            leak: self.params.g_l * (v - self.params.e_l),
            calcium: self
                .calcium
                .map_or(0.0, |ca| ca.current(v, &state[Self::CA])),
        }
    }

    /// State with V clamped at `v` and every gate at α/(α+β).
    pub fn resting_state(&self, v: f64) -> NeuronState {
        let mut values = vec![0.0; self.variables.len()];
        values[0] = v;
        self.sodium.steady_state(v, &mut values[Self::NA]);
        self.potassium.steady_state(v, &mut values[Self::K]);
        if let Some(ca) = &self.calcium {
            ca.steady_state(v, &mut values[Self::CA]);
        }
        NeuronState::new(values)
    }
}

impl NeuronModel for HodgkinHuxley {
    fn name(&self) -> &'static str {
        "HodgkinHuxley"
    }

    fn variables(&self) -> &[&'static str] {
        &self.variables
    }

    fn initial_state(&self) -> NeuronState {
        self.resting_state(self.params.v_init)
    }

    fn derivative(&self, _t: f64, state: &[f64], i_ext: f64, d_state: &mut [f64]) {
        let v = state[0];
        let currents = self.currents(state);

        d_state[0] = (i_ext - currents.total()) / self.params.c_m;
        self.sodium
            .gate_derivatives(v, &state[Self::NA], &mut d_state[Self::NA]);
        self.potassium
            .gate_derivatives(v, &state[Self::K], &mut d_state[Self::K]);
        if let Some(ca) = &self.calcium {
            ca.gate_derivatives(v, &state[Self::CA], &mut d_state[Self::CA]);
        }
    }

    fn spike_threshold(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuro::rates;

    #[test]
    fn defaults_match_literature() {
        let p = HodgkinHuxleyParams::default();
        assert_eq!((p.g_na, p.g_k, p.g_l), (120.0, 36.0, 0.3));
        assert_eq!((p.e_na, p.e_k, p.e_l), (50.0, -77.0, -54.387));
    }

    #[test]
    fn initial_gates_are_steady_state() {
        let hh = HodgkinHuxley::new(HodgkinHuxleyParams::default()).unwrap();
        let state = hh.initial_state();
        assert_eq!(state.v(), -65.0);
        let m = rates::alpha_m(-65.0) / (rates::alpha_m(-65.0) + rates::beta_m(-65.0));
        assert!((state.aux()[0] - m).abs() < 1e-15);
        assert!(state.aux().iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn gate_derivatives_vanish_at_rest() {
        let hh = HodgkinHuxley::new(HodgkinHuxleyParams::default()).unwrap();
        let state = hh.initial_state();
        let mut d = vec![0.0; hh.dimension()];
        hh.derivative(0.0, state.as_slice(), 0.0, &mut d);
        assert!(d[1..].iter().all(|x| x.abs() < 1e-12), "{d:?}");
        // E_L is tuned so the resting membrane is nearly balanced.
        assert!(d[0].abs() < 0.05, "dV/dt at rest = {}", d[0]);
    }

    #[test]
    fn injected_current_depolarizes() {
        let hh = HodgkinHuxley::new(HodgkinHuxleyParams::default()).unwrap();
        let state = hh.initial_state();
        let mut rest = vec![0.0; 4];
        let mut driven = vec![0.0; 4];
        hh.derivative(0.0, state.as_slice(), 0.0, &mut rest);
        hh.derivative(0.0, state.as_slice(), 10.0, &mut driven);
        assert!((driven[0] - rest[0] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn calcium_adds_a_gate() {
        let params = HodgkinHuxleyParams {
            calcium: Some(CalciumParams::default()),
            ..Default::default()
        };
        let hh = HodgkinHuxley::new(params).unwrap();
        assert_eq!(hh.variables(), ["V", "m", "h", "n", "c"]);
        let state = hh.initial_state();
        assert_eq!(state.dimension(), 5);
        let currents = hh.currents(state.as_slice());
        assert!(currents.calcium < 0.0, "inward at rest: {currents:?}");
    }

    #[test]
    fn rejects_bad_parameters() {
        let zero_cap = HodgkinHuxleyParams {
            c_m: 0.0,
            ..Default::default()
        };
        assert!(HodgkinHuxley::new(zero_cap).is_err());

        let nan = HodgkinHuxleyParams {
            g_na: f64::NAN,
            ..Default::default()
        };
        assert!(HodgkinHuxley::new(nan).is_err());

        let negative = HodgkinHuxleyParams {
            g_k: -1.0,
            ..Default::default()
        };
        assert!(HodgkinHuxley::new(negative).is_err());
    }
}
