//! Fixed-step base methods.
//!
//! ```text
//! Euler: y' = y + dt·f(t, y)
//! RK4:   k1 = f(t, y)
//!        k2 = f(t + dt/2, y + dt/2·k1)
//!        k3 = f(t + dt/2, y + dt/2·k2)
//!        k4 = f(t + dt,   y + dt·k3)
//!        y' = y + dt/6·(k1 + 2k2 + 2k3 + k4)
//! ```

use crate::core::system::OdeSystem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseMethod {
    Euler,
    Rk4,
}

/// Stage buffers reused across steps so a run allocates once.
#[derive(Clone, Debug)]
pub struct Workspace {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl Workspace {
    pub fn new(dimension: usize) -> Self {
        Self {
            k1: vec![0.0; dimension],
            k2: vec![0.0; dimension],
            k3: vec![0.0; dimension],
            k4: vec![0.0; dimension],
            tmp: vec![0.0; dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.k1.len()
    }
}

impl BaseMethod {
    /// Writes the estimate for `y(t + dt)` into `out`. `y` is left untouched.
    pub fn step<S: OdeSystem + ?Sized>(
        self,
        system: &S,
        t: f64,
        y: &[f64],
        dt: f64,
        out: &mut [f64],
        ws: &mut Workspace,
    ) {
        debug_assert_eq!(y.len(), out.len());
        debug_assert_eq!(y.len(), ws.dimension());

        match self {
            BaseMethod::Euler => euler(system, t, y, dt, out, ws),
            BaseMethod::Rk4 => rk4(system, t, y, dt, out, ws),
        }
    }
}

fn euler<S: OdeSystem + ?Sized>(
    system: &S,
    t: f64,
    y: &[f64],
    dt: f64,
    out: &mut [f64],
    ws: &mut Workspace,
) {
    system.derivative(t, y, &mut ws.k1);
    for ((o, yi), k) in out.iter_mut().zip(y).zip(&ws.k1) {
        *o = yi + dt * k;
    }
}

fn rk4<S: OdeSystem + ?Sized>(
    system: &S,
    t: f64,
    y: &[f64],
    dt: f64,
    out: &mut [f64],
    ws: &mut Workspace,
) {
    let half = dt / 2.0;

    system.derivative(t, y, &mut ws.k1);

    offset(&mut ws.tmp, y, half, &ws.k1);
    system.derivative(t + half, &ws.tmp, &mut ws.k2);

    offset(&mut ws.tmp, y, half, &ws.k2);
    system.derivative(t + half, &ws.tmp, &mut ws.k3);

    offset(&mut ws.tmp, y, dt, &ws.k3);
    system.derivative(t + dt, &ws.tmp, &mut ws.k4);

    for i in 0..out.len() {
        out[i] = y[i] + dt / 6.0 * (ws.k1[i] + 2.0 * ws.k2[i] + 2.0 * ws.k3[i] + ws.k4[i]);
    }
}

/// dst = y + h·k
fn offset(dst: &mut [f64], y: &[f64], h: f64, k: &[f64]) {
    for ((d, yi), ki) in dst.iter_mut().zip(y).zip(k) {
        *d = yi + h * ki;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::system::FnSystem;

    fn integrate(method: BaseMethod, dt: f64, steps: usize) -> f64 {
        let decay = FnSystem::new(1, |_t: f64, y: &[f64], dy: &mut [f64]| dy[0] = -y[0]);
        let mut ws = Workspace::new(1);
        let mut y = vec![1.0];
        let mut next = vec![0.0];
        let mut t = 0.0;
        for _ in 0..steps {
            method.step(&decay, t, &y, dt, &mut next, &mut ws);
            y.copy_from_slice(&next);
            t += dt;
        }
        y[0]
    }

    #[test]
    fn euler_single_step_matches_formula() {
        let system = FnSystem::new(2, |t: f64, y: &[f64], dy: &mut [f64]| {
            dy[0] = y[1];
            dy[1] = t;
        });
        let mut ws = Workspace::new(2);
        let mut out = [0.0; 2];
        BaseMethod::Euler.step(&system, 2.0, &[1.0, 3.0], 0.5, &mut out, &mut ws);
        assert_eq!(out, [2.5, 4.0]);
    }

    #[test]
    fn rk4_is_exact_for_cubic_in_time() {
        // dy/dt = 3t² → y = t³; RK4 integrates polynomials up to degree 3 exactly.
        let system = FnSystem::new(1, |t: f64, _y: &[f64], dy: &mut [f64]| dy[0] = 3.0 * t * t);
        let mut ws = Workspace::new(1);
        let mut out = [0.0];
        BaseMethod::Rk4.step(&system, 1.0, &[1.0], 1.0, &mut out, &mut ws);
        assert!((out[0] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn rk4_converges_on_exponential_decay() {
        let y = integrate(BaseMethod::Rk4, 0.01, 100);
        assert!((y - (-1.0_f64).exp()).abs() < 1e-4);
    }

    #[test]
    fn euler_error_exceeds_rk4_error() {
        let exact = (-1.0_f64).exp();
        let euler = (integrate(BaseMethod::Euler, 0.01, 100) - exact).abs();
        let rk4 = (integrate(BaseMethod::Rk4, 0.01, 100) - exact).abs();
        assert!(euler > rk4, "euler={euler:e} rk4={rk4:e}");
    }

    #[test]
    fn step_does_not_touch_input() {
        let system = FnSystem::new(1, |_t: f64, y: &[f64], dy: &mut [f64]| dy[0] = y[0]);
        let mut ws = Workspace::new(1);
        let y = [1.0];
        let mut out = [0.0];
        BaseMethod::Rk4.step(&system, 0.0, &y, 0.1, &mut out, &mut ws);
        assert_eq!(y, [1.0]);
        assert!(out[0] > 1.0);
    }
}
