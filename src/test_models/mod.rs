//! Reference systems used by the tests, doc examples and benchmarks.

pub mod exponential_decay;
pub mod harmonic_oscillator;
pub mod robertson;

/// Reference trajectory: `(t, y(t))` pairs.
#[derive(Debug, Clone)]
pub struct OdeSolution<T> {
    pub solution_points: Vec<(T, Vec<T>)>,
}

impl<T> Default for OdeSolution<T> {
    fn default() -> Self {
        Self {
            solution_points: Vec::new(),
        }
    }
}

impl<T> OdeSolution<T> {
    pub fn push(&mut self, t: T, y: Vec<T>) {
        self.solution_points.push((t, y));
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        jacobian::{finite_difference_jacobian, DenseJacobianMut, Layout},
        OdeSystem,
    };

    use super::{
        exponential_decay::exponential_decay, harmonic_oscillator::harmonic_oscillator,
        robertson::robertson,
    };

    /// The analytic Jacobian of `sys` agrees with forward differences of its rhs.
    fn check_jacobian<S: OdeSystem<f64>>(sys: &mut S, t: f64, y: &[f64], rtol: f64) {
        let n = sys.ny();
        let mut analytic = vec![0.0; n * n];
        assert!(sys
            .dense_jac_cmaj(t, y, None, &mut analytic, n, None)
            .is_success());
        let mut fd = vec![0.0; n * n];
        let mut view = DenseJacobianMut::new(&mut fd, n, n, Layout::ColMajor);
        assert!(finite_difference_jacobian(sys, t, y, &mut view).is_success());
        let scale = analytic.iter().fold(1.0_f64, |m, &x| m.max(x.abs()));
        for (a, f) in analytic.iter().zip(fd.iter()) {
            assert!(
                (a - f).abs() <= rtol * scale,
                "analytic {} vs finite difference {}",
                a,
                f
            );
        }
    }

    #[test]
    fn test_exponential_decay_jacobian() {
        check_jacobian(&mut exponential_decay::<f64>(), 0.0, &[1.0, 2.0], 1e-6);
    }

    #[test]
    fn test_robertson_jacobian() {
        // second derivative of k3 y2^2 dominates the forward difference error
        check_jacobian(&mut robertson::<f64>(), 0.0, &[0.9, 1e-5, 0.1], 1e-3);
    }

    #[test]
    fn test_harmonic_oscillator_jacobian() {
        check_jacobian(&mut harmonic_oscillator::<f64>(4.0, 0.0), 0.0, &[0.3, -0.2], 1e-6);
    }
}
