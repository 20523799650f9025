/// Right-hand side of an ODE system `dy/dt = f(t, y)`.
///
/// This is the only thing the integrators know about. Implementations must be
/// pure: multi-stage and trial evaluations call `derivative` at states that
/// are never committed.
pub trait OdeSystem {
    fn dimension(&self) -> usize;

    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]);
}

impl<S: OdeSystem + ?Sized> OdeSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]) {
        (**self).derivative(t, y, dy)
    }
}

/// Wraps a closure as an [`OdeSystem`] of fixed dimension.
pub struct FnSystem<F> {
    dimension: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<F> OdeSystem for FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]) {
        (self.f)(t, y, dy)
    }
}

/// Largest absolute componentwise difference.
///
/// Returns NaN if any component is NaN, so callers comparing against a
/// tolerance treat it as a failure.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0.0_f64, |acc, (x, y)| {
        let d = (x - y).abs();
        if d.is_nan() || acc.is_nan() {
            f64::NAN
        } else {
            acc.max(d)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_abs_diff_is_max_norm() {
        assert_eq!(max_abs_diff(&[1.0, -2.0, 3.0], &[1.5, 2.0, 3.0]), 4.0);
        assert_eq!(max_abs_diff(&[], &[]), 0.0);
    }

    #[test]
    fn max_abs_diff_propagates_nan() {
        assert!(max_abs_diff(&[f64::NAN, 0.0], &[0.0, 100.0]).is_nan());
        assert!(max_abs_diff(&[0.0, f64::INFINITY], &[0.0, f64::INFINITY]).is_nan());
    }
}
