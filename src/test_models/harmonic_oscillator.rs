use crate::{
    code::{GeneratedCode, ParamView},
    jacobian::DenseJacobianMut,
    system::dense::DenseAdapter,
    AdapterBuilder, Scalar, Status,
};

// x' = v, v' = -k x (p = [k])
// root: x = 0, invariant: energy (k x^2 + v^2) / 2
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicOscillator;

impl<T: Scalar> GeneratedCode<T> for HarmonicOscillator {
    fn ny(&self) -> usize {
        2
    }
    fn np(&self) -> usize {
        1
    }
    fn nroots(&self) -> usize {
        1
    }
    fn ninvariants(&self) -> usize {
        1
    }
    fn rhs(&self, params: &ParamView<'_, T>, _t: T, y: &[T], f: &mut [T]) -> Status {
        f[0] = y[1];
        f[1] = -params.p[0] * y[0];
        Status::Success
    }
    fn jac(
        &self,
        params: &ParamView<'_, T>,
        _t: T,
        _y: &[T],
        _fy: Option<&[T]>,
        jac: &mut DenseJacobianMut<'_, T>,
        _dfdt: Option<&mut [T]>,
    ) -> Status {
        jac.set(0, 1, T::from(1.0));
        jac.set(1, 0, -params.p[0]);
        Status::Success
    }
    fn roots(&self, _params: &ParamView<'_, T>, _t: T, y: &[T], out: &mut [T]) -> Status {
        out[0] = y[0];
        Status::Success
    }
    fn invariants(&self, params: &ParamView<'_, T>, _t: T, y: &[T], out: &mut [T]) {
        out[0] = (params.p[0] * y[0] * y[0] + y[1] * y[1]) / T::from(2.0);
    }
}

/// Oscillator with stiffness `k` started at `x = 1, v = 0`, with the energy at
/// that state as invariant baseline.
pub fn harmonic_oscillator<T: Scalar>(
    k: f64,
    max_invariant_violation: f64,
) -> DenseAdapter<T, HarmonicOscillator> {
    AdapterBuilder::new()
        .p([k])
        .max_invariant_violation(max_invariant_violation)
        .invariant_baseline_from(0.0, [1.0, 0.0])
        .build_dense(HarmonicOscillator)
        .unwrap()
}
