use crate::{
    code::{GeneratedCode, ParamView},
    jacobian::DenseJacobianMut,
    system::{dense::DenseAdapter, iterative::IterativeAdapter},
    AdapterBuilder, Scalar, Status,
};

use super::OdeSolution;

// exponential decay problem
// dy/dt = -ay (p = [a]), two uncoupled states
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialDecay;

impl<T: Scalar> GeneratedCode<T> for ExponentialDecay {
    fn ny(&self) -> usize {
        2
    }
    fn np(&self) -> usize {
        1
    }
    fn rhs(&self, params: &ParamView<'_, T>, _t: T, y: &[T], f: &mut [T]) -> Status {
        for i in 0..2 {
            f[i] = -params.p[0] * y[i];
        }
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
        jac.set(0, 0, -params.p[0]);
        jac.set(1, 1, -params.p[0]);
        Status::Success
    }
}

pub fn exponential_decay<T: Scalar>() -> DenseAdapter<T, ExponentialDecay> {
    AdapterBuilder::new()
        .p([0.1])
        .build_dense(ExponentialDecay)
        .unwrap()
}

pub fn exponential_decay_iterative<T: Scalar>() -> IterativeAdapter<T, ExponentialDecay> {
    AdapterBuilder::new()
        .p([0.1])
        .build_iterative(ExponentialDecay)
        .unwrap()
}

/// Exact solution for `y(0) = [1, 1]` and `p = [a]` at ten points in `[0, 1)`.
pub fn exponential_decay_solution<T: Scalar>(a: T) -> OdeSolution<T> {
    let mut soln = OdeSolution::default();
    for i in 0..10 {
        let t = T::from(i as f64 / 10.0);
        let y = (-a * t).exp();
        soln.push(t, vec![y, y]);
    }
    soln
}
