use nalgebra::DMatrix;
use num_traits::Zero;
use serde::Serialize;

use crate::{code::GeneratedCode, system::dense::DenseAdapter, OdeSystem, Scalar};

use super::IntegrationInfo;

/// States at the output points of an integration.
#[derive(Debug, Clone, Serialize)]
pub struct OdeResult<T: Scalar> {
    pub xout: Vec<T>,
    /// One state vector per entry of `xout`.
    pub yout: Vec<Vec<T>>,
    pub info: IntegrationInfo,
}

impl<T: Scalar> OdeResult<T> {
    pub fn new(xout: Vec<T>, yout: Vec<Vec<T>>, info: IntegrationInfo) -> Self {
        Self { xout, yout, info }
    }

    pub fn len(&self) -> usize {
        self.xout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xout.is_empty()
    }

    /// The final output point and state.
    pub fn last(&self) -> Option<(T, &[T])> {
        let x = *self.xout.last()?;
        let y = self.yout.last()?;
        Some((x, y.as_slice()))
    }

    /// Ratio of the largest to the smallest singular value of the Jacobian
    /// at every output point. NaN where the Jacobian cannot be evaluated or
    /// decomposed, infinity where it is singular.
    pub fn stiffness<S: OdeSystem<T> + ?Sized>(&self, sys: &mut S) -> Vec<T> {
        let n = sys.ny();
        let mut jac = vec![T::zero(); n * n];
        self.xout
            .iter()
            .zip(self.yout.iter())
            .map(|(&x, y)| {
                if !sys.dense_jac_cmaj(x, y, None, &mut jac, n, None).is_success()
                    || jac.iter().any(|v| !v.is_finite())
                {
                    return T::NAN;
                }
                let matrix = DMatrix::from_column_slice(n, n, &jac);
                let Some(svd) = matrix.try_svd(false, false, T::EPSILON, 1000) else {
                    return T::NAN;
                };
                let sv = svd.singular_values;
                let max = sv.max();
                let min = sv.min();
                if min == T::zero() {
                    T::INFINITY
                } else {
                    max / min
                }
            })
            .collect()
    }

    /// Drift `|I(y) - invar0|` of every invariant at every output point.
    pub fn invariant_violations<G: GeneratedCode<T>>(
        &self,
        adapter: &DenseAdapter<T, G>,
    ) -> Vec<Vec<T>> {
        self.xout
            .iter()
            .zip(self.yout.iter())
            .map(|(&x, y)| adapter.invariant_violations(x, y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::OdeResult;
    use crate::{
        code::closure::Closure,
        integrator::{explicit::Rk4, IntegrationInfo, Integrator},
        test_models::harmonic_oscillator::harmonic_oscillator,
        AdapterBuilder,
    };

    #[test]
    fn test_stiffness_of_diagonal_system() {
        let code = Closure::<f64, _, _>::new(
            |params, _t, y, f| {
                for i in 0..2 {
                    f[i] = -params.p[i] * y[i];
                }
            },
            |params, _t, _y, jac| {
                for i in 0..2 {
                    jac.set(i, i, -params.p[i]);
                }
            },
            2,
            2,
        );
        let mut sys = AdapterBuilder::new()
            .p([2.0, 500.0])
            .build_dense(code)
            .unwrap();
        let result = OdeResult::new(
            vec![0.0, 1.0],
            vec![vec![1.0, 1.0], vec![0.5, 0.5]],
            IntegrationInfo::default(),
        );
        let stiffness = result.stiffness(&mut sys);
        assert_eq!(stiffness.len(), 2);
        for s in stiffness {
            assert!((s - 250.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invariant_violations_along_output() {
        let mut sys = harmonic_oscillator::<f64>(1.0, 0.0);
        let xout: Vec<f64> = (0..=20).map(|i| i as f64 * 0.1).collect();
        let result = Rk4::default()
            .integrate_predefined(&mut sys, &[1.0, 0.0], &xout)
            .unwrap();
        assert_eq!(result.len(), 21);
        let violations = result.invariant_violations(&sys);
        assert_eq!(violations.len(), 21);
        assert_eq!(violations[0], vec![0.0]);
        // RK4 drifts slightly in energy but stays close at h = 0.1
        for v in violations.iter() {
            assert_eq!(v.len(), 1);
            assert!(v[0] < 1e-5);
        }
        assert!(violations[20][0] > 0.0);
    }

    #[test]
    fn test_empty_result() {
        let result = OdeResult::<f64>::new(Vec::new(), Vec::new(), IntegrationInfo::default());
        assert!(result.is_empty());
        assert!(result.last().is_none());
    }
}
