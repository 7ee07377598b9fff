use crate::{
    code::{GeneratedCode, ParamView},
    jacobian::DenseJacobianMut,
    system::{dense::DenseAdapter, iterative::IterativeAdapter},
    AdapterBuilder, Scalar, Status,
};

/// Robertson's stiff chemical kinetics, `p = [k1, k2, k3]`:
///
/// ```text
/// dy1/dt = -k1 y1 + k2 y2 y3
/// dy2/dt =  k1 y1 - k2 y2 y3 - k3 y2^2
/// dy3/dt =  k3 y2^2
/// ```
///
/// Total mass `y1 + y2 + y3` is conserved and exposed as an invariant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Robertson;

impl<T: Scalar> GeneratedCode<T> for Robertson {
    fn ny(&self) -> usize {
        3
    }
    fn np(&self) -> usize {
        3
    }
    fn ninvariants(&self) -> usize {
        1
    }
    // 2 k3
    fn cse(&self, p: &[T]) -> Vec<T> {
        vec![T::from(2.0) * p[2]]
    }
    fn rhs(&self, params: &ParamView<'_, T>, _t: T, y: &[T], f: &mut [T]) -> Status {
        let p = params.p;
        let r1 = p[0] * y[0];
        let r2 = p[1] * y[1] * y[2];
        let r3 = p[2] * y[1] * y[1];
        f[0] = -r1 + r2;
        f[1] = r1 - r2 - r3;
        f[2] = r3;
        Status::Success
    }
    fn jac(
        &self,
        params: &ParamView<'_, T>,
        _t: T,
        y: &[T],
        _fy: Option<&[T]>,
        jac: &mut DenseJacobianMut<'_, T>,
        _dfdt: Option<&mut [T]>,
    ) -> Status {
        let p = params.p;
        let two_k3 = params.p_cse[0];
        jac.set(0, 0, -p[0]);
        jac.set(0, 1, p[1] * y[2]);
        jac.set(0, 2, p[1] * y[1]);
        jac.set(1, 0, p[0]);
        jac.set(1, 1, -p[1] * y[2] - two_k3 * y[1]);
        jac.set(1, 2, -p[1] * y[1]);
        jac.set(2, 1, two_k3 * y[1]);
        Status::Success
    }
    fn invariants(&self, _params: &ParamView<'_, T>, _t: T, y: &[T], out: &mut [T]) {
        out[0] = y[0] + y[1] + y[2];
    }
}

fn builder() -> AdapterBuilder {
    AdapterBuilder::new()
        .p([0.04, 1.0e4, 3.0e7])
        .rtol(1e-4)
        .atol([1e-8, 1e-14, 1e-6])
}

pub fn robertson<T: Scalar>() -> DenseAdapter<T, Robertson> {
    builder()
        .build_dense(Robertson)
        .unwrap()
}

pub fn robertson_iterative<T: Scalar>() -> IterativeAdapter<T, Robertson> {
    builder()
        .build_iterative(Robertson)
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::robertson;
    use crate::{AdapterBuilder, OdeSystem, Status};

    #[test]
    fn test_mass_conservation_check() {
        let sys = robertson::<f64>();
        assert_eq!(sys.p_cse(), &[6.0e7]);
        assert_eq!(sys.invariants(0.0, &[0.5, 0.25, 0.25]), vec![1.0]);

        let mut sys = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .max_invariant_violation(1e-6)
            .invariant_baseline_from(0.0, [1.0, 0.0, 0.0])
            .build_dense::<f64, _>(super::Robertson)
            .unwrap();
        let mut f = [0.0; 3];
        assert_eq!(sys.rhs(0.0, &[0.5, 0.25, 0.25], &mut f), Status::Success);
        assert_eq!(
            sys.rhs(0.0, &[0.5, 0.25, 0.5], &mut f),
            Status::UnrecoverableError
        );
    }
}
