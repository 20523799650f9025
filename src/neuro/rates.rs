//! Voltage-dependent rate constants for Hodgkin-Huxley style gates.
//!
//! Every rate is one of three shapes, with `x = V + B`:
//!
//! ```text
//! LinExp:  A·x / (1 − exp(−x/C))     removable singularity at x = 0, limit A·C
//! Exp:     A·exp(−x/C)
//! Sigmoid: A / (1 + exp(−x/C))
//! ```
//!
//! Constants follow the 1952 Hodgkin-Huxley fits, shifted so rest sits
//! at −65 mV.

/// Below this |V + B| the LinExp form returns its analytic limit.
pub const SINGULARITY_EPS: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateForm {
    LinExp { a: f64, b: f64, c: f64 },
    Exp { a: f64, b: f64, c: f64 },
    Sigmoid { a: f64, b: f64, c: f64 },
}

impl RateForm {
    pub fn eval(self, v: f64) -> f64 {
        match self {
            RateForm::LinExp { a, b, c } => linear_exp(a, b, c, v),
            RateForm::Exp { a, b, c } => a * (-(v + b) / c).exp(),
            RateForm::Sigmoid { a, b, c } => a / (1.0 + (-(v + b) / c).exp()),
        }
    }
}

/// `A·(V+B) / (1 − exp(−(V+B)/C))` with the 0/0 point replaced by `A·C`.
pub fn linear_exp(a: f64, b: f64, c: f64, v: f64) -> f64 {
    let x = v + b;
    if x.abs() < SINGULARITY_EPS {
        return a * c;
    }
    // 1 − exp(−x/C) == −expm1(−x/C), without cancellation near zero
    a * x / -(-x / c).exp_m1()
}

/// Forward and backward rates for one gating variable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateKinetics {
    pub alpha: RateForm,
    pub beta: RateForm,
}

impl GateKinetics {
    pub fn rates(&self, v: f64) -> (f64, f64) {
        (self.alpha.eval(v), self.beta.eval(v))
    }

    /// dx/dt = α(1 − x) − βx
    pub fn derivative(&self, v: f64, x: f64) -> f64 {
        let (alpha, beta) = self.rates(v);
        alpha * (1.0 - x) - beta * x
    }

    pub fn steady_state(&self, v: f64) -> f64 {
        let (alpha, beta) = self.rates(v);
        steady_state(alpha, beta)
    }

    pub fn time_constant(&self, v: f64) -> f64 {
        let (alpha, beta) = self.rates(v);
        time_constant(alpha, beta)
    }
}

pub fn steady_state(alpha: f64, beta: f64) -> f64 {
    alpha / (alpha + beta)
}

pub fn time_constant(alpha: f64, beta: f64) -> f64 {
    1.0 / (alpha + beta)
}

// Sodium activation (m)
pub const ALPHA_M: RateForm = RateForm::LinExp { a: 0.1, b: 40.0, c: 10.0 };
pub const BETA_M: RateForm = RateForm::Exp { a: 4.0, b: 65.0, c: 18.0 };

// Sodium inactivation (h)
pub const ALPHA_H: RateForm = RateForm::Exp { a: 0.07, b: 65.0, c: 20.0 };
pub const BETA_H: RateForm = RateForm::Sigmoid { a: 1.0, b: 35.0, c: 10.0 };

// Potassium activation (n)
pub const ALPHA_N: RateForm = RateForm::LinExp { a: 0.01, b: 55.0, c: 10.0 };
pub const BETA_N: RateForm = RateForm::Exp { a: 0.125, b: 65.0, c: 80.0 };

// Calcium activation (c), single-gate simplification
pub const ALPHA_C: RateForm = RateForm::LinExp { a: 0.01, b: 50.0, c: 10.0 };
pub const BETA_C: RateForm = RateForm::Exp { a: 0.01, b: 65.0, c: 18.0 };

pub const GATE_M: GateKinetics = GateKinetics { alpha: ALPHA_M, beta: BETA_M };
pub const GATE_H: GateKinetics = GateKinetics { alpha: ALPHA_H, beta: BETA_H };
pub const GATE_N: GateKinetics = GateKinetics { alpha: ALPHA_N, beta: BETA_N };
pub const GATE_C: GateKinetics = GateKinetics { alpha: ALPHA_C, beta: BETA_C };

pub fn alpha_m(v: f64) -> f64 {
    ALPHA_M.eval(v)
}

pub fn beta_m(v: f64) -> f64 {
    BETA_M.eval(v)
}

pub fn alpha_h(v: f64) -> f64 {
    ALPHA_H.eval(v)
}

pub fn beta_h(v: f64) -> f64 {
    BETA_H.eval(v)
}

pub fn alpha_n(v: f64) -> f64 {
    ALPHA_N.eval(v)
}

pub fn beta_n(v: f64) -> f64 {
    BETA_N.eval(v)
}

pub fn alpha_c(v: f64) -> f64 {
    ALPHA_C.eval(v)
}

pub fn beta_c(v: f64) -> f64 {
    BETA_C.eval(v)
}
