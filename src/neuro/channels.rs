use serde::{Deserialize, Serialize};

use crate::neuro::rates::{GATE_C, GATE_H, GATE_M, GATE_N, GateKinetics};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    /// m³h
    Sodium,
    /// n⁴
    Potassium,
    /// c², single gate
    Calcium,
}

impl ChannelKind {
    pub fn gate_names(self) -> &'static [&'static str] {
        match self {
            ChannelKind::Sodium => &["m", "h"],
            ChannelKind::Potassium => &["n"],
            ChannelKind::Calcium => &["c"],
        }
    }

    fn kinetics(self) -> &'static [GateKinetics] {
        match self {
            ChannelKind::Sodium => &[GATE_M, GATE_H],
            ChannelKind::Potassium => &[GATE_N],
            ChannelKind::Calcium => &[GATE_C],
        }
    }
}

/// Voltage-gated conductance.
///
/// Only parameters live here. Gate values are a slice of the owning neuron's
/// state vector, so evaluating a channel never changes anything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IonChannel {
    pub kind: ChannelKind,
    /// Maximum conductance (mS/cm²)
    pub g_max: f64,
    /// Reversal potential (mV)
    pub e_rev: f64,
}

impl IonChannel {
    pub fn sodium(g_max: f64, e_rev: f64) -> Self {
        Self {
            kind: ChannelKind::Sodium,
            g_max,
            e_rev,
        }
    }

    pub fn potassium(g_max: f64, e_rev: f64) -> Self {
        Self {
            kind: ChannelKind::Potassium,
            g_max,
            e_rev,
        }
    }

    pub fn calcium(g_max: f64, e_rev: f64) -> Self {
        Self {
            kind: ChannelKind::Calcium,
            g_max,
            e_rev,
        }
    }

    pub fn gate_count(&self) -> usize {
        self.kind.gate_names().len()
    }

    /// Fraction of open channels given the gate values.
    pub fn open_fraction(&self, gates: &[f64]) -> f64 {
        match self.kind {
            ChannelKind::Sodium => gates[0].powi(3) * gates[1],
            ChannelKind::Potassium => gates[0].powi(4),
            ChannelKind::Calcium => gates[0].powi(2),
        }
    }

    /// I = g_max · f(gates) · (V − E_rev)
    pub fn current(&self, v: f64, gates: &[f64]) -> f64 {
        debug_assert_eq!(gates.len(), self.gate_count());
        self.g_max * self.open_fraction(gates) * (v - self.e_rev)
    }

    /// dx/dt = α_x(V)(1 − x) − β_x(V)x for each gate, written into `out`.
    pub fn gate_derivatives(&self, v: f64, gates: &[f64], out: &mut [f64]) {
        debug_assert_eq!(gates.len(), self.gate_count());
        for ((kinetics, &x), dx) in self.kind.kinetics().iter().zip(gates).zip(out.iter_mut()) {
            *dx = kinetics.derivative(v, x);
        }
    }

    /// Gate values at which every derivative vanishes for a clamped `v`.
    pub fn steady_state(&self, v: f64, out: &mut [f64]) {
        for (kinetics, x) in self.kind.kinetics().iter().zip(out.iter_mut()) {
            *x = kinetics.steady_state(v);
        }
    }
}
