use num_traits::Zero;

use crate::{jacobian::DenseJacobianMut, Scalar, Status};

use super::{GeneratedCode, ParamView};

type VecFn<T> = Box<dyn Fn(&ParamView<'_, T>, T, &[T], &mut [T]) + Send + Sync>;
type HintFn<T> = Box<dyn Fn(&ParamView<'_, T>, T, &[T]) -> T + Send + Sync>;
type CseFn<T> = Box<dyn Fn(&[T]) -> Vec<T> + Send + Sync>;

/// [GeneratedCode] assembled from closures.
///
/// `func` computes dy/dt and `jacobian` writes df/dy for `ny` states and `np`
/// parameters. Everything else is optional and attached with the `with_*`
/// methods, which take `Send + Sync` closures so the result can be moved
/// across threads whenever `func` and `jacobian` can.
///
/// # Example
///
/// ```
/// use odesys::{code::closure::Closure, AdapterBuilder, OdeSystem, Status};
///
/// // dy/dt = -k y
/// let code = Closure::<f64, _, _>::new(
///     |params, _t, y, f| f[0] = -params.p[0] * y[0],
///     |params, _t, _y, jac| jac.set(0, 0, -params.p[0]),
///     1,
///     1,
/// );
/// let mut sys = AdapterBuilder::new().p([0.5]).build_dense(code).unwrap();
/// let mut f = [0.0];
/// assert_eq!(sys.rhs(0.0, &[2.0], &mut f), Status::Success);
/// assert_eq!(f[0], -1.0);
/// ```
pub struct Closure<T, F, J>
where
    T: Scalar,
    F: Fn(&ParamView<'_, T>, T, &[T], &mut [T]),
    J: Fn(&ParamView<'_, T>, T, &[T], &mut DenseJacobianMut<'_, T>),
{
    func: F,
    jacobian: J,
    ny: usize,
    np: usize,
    nroots: usize,
    roots: Option<VecFn<T>>,
    ninvariants: usize,
    invariants: Option<VecFn<T>>,
    dfdt: Option<VecFn<T>>,
    cse: Option<CseFn<T>>,
    dx0: Option<HintFn<T>>,
    dx_max: Option<HintFn<T>>,
}

impl<T, F, J> Closure<T, F, J>
where
    T: Scalar,
    F: Fn(&ParamView<'_, T>, T, &[T], &mut [T]),
    J: Fn(&ParamView<'_, T>, T, &[T], &mut DenseJacobianMut<'_, T>),
{
    pub fn new(func: F, jacobian: J, ny: usize, np: usize) -> Self {
        Self {
            func,
            jacobian,
            ny,
            np,
            nroots: 0,
            roots: None,
            ninvariants: 0,
            invariants: None,
            dfdt: None,
            cse: None,
            dx0: None,
            dx_max: None,
        }
    }

    pub fn with_roots<R>(mut self, nroots: usize, roots: R) -> Self
    where
        R: Fn(&ParamView<'_, T>, T, &[T], &mut [T]) + Send + Sync + 'static,
    {
        self.nroots = nroots;
        self.roots = Some(Box::new(roots));
        self
    }

    pub fn with_invariants<I>(mut self, ninvariants: usize, invariants: I) -> Self
    where
        I: Fn(&ParamView<'_, T>, T, &[T], &mut [T]) + Send + Sync + 'static,
    {
        self.ninvariants = ninvariants;
        self.invariants = Some(Box::new(invariants));
        self
    }

    /// Explicit time derivative of the right-hand side. Without it the system
    /// is treated as autonomous and df/dt is zero.
    pub fn with_dfdt<D>(mut self, dfdt: D) -> Self
    where
        D: Fn(&ParamView<'_, T>, T, &[T], &mut [T]) + Send + Sync + 'static,
    {
        self.dfdt = Some(Box::new(dfdt));
        self
    }

    pub fn with_cse<C>(mut self, cse: C) -> Self
    where
        C: Fn(&[T]) -> Vec<T> + Send + Sync + 'static,
    {
        self.cse = Some(Box::new(cse));
        self
    }

    pub fn with_dx0<H>(mut self, dx0: H) -> Self
    where
        H: Fn(&ParamView<'_, T>, T, &[T]) -> T + Send + Sync + 'static,
    {
        self.dx0 = Some(Box::new(dx0));
        self
    }

    pub fn with_dx_max<H>(mut self, dx_max: H) -> Self
    where
        H: Fn(&ParamView<'_, T>, T, &[T]) -> T + Send + Sync + 'static,
    {
        self.dx_max = Some(Box::new(dx_max));
        self
    }
}

impl<T, F, J> GeneratedCode<T> for Closure<T, F, J>
where
    T: Scalar,
    F: Fn(&ParamView<'_, T>, T, &[T], &mut [T]),
    J: Fn(&ParamView<'_, T>, T, &[T], &mut DenseJacobianMut<'_, T>),
{
    fn ny(&self) -> usize {
        self.ny
    }
    fn np(&self) -> usize {
        self.np
    }
    fn nroots(&self) -> usize {
        self.nroots
    }
    fn ninvariants(&self) -> usize {
        self.ninvariants
    }
    fn cse(&self, p: &[T]) -> Vec<T> {
        match self.cse.as_ref() {
            Some(cse) => cse(p),
            None => Vec::new(),
        }
    }
    fn rhs(&self, params: &ParamView<'_, T>, t: T, y: &[T], f: &mut [T]) -> Status {
        (self.func)(params, t, y, f);
        Status::Success
    }
    fn jac(
        &self,
        params: &ParamView<'_, T>,
        t: T,
        y: &[T],
        _fy: Option<&[T]>,
        jac: &mut DenseJacobianMut<'_, T>,
        dfdt: Option<&mut [T]>,
    ) -> Status {
        (self.jacobian)(params, t, y, jac);
        if let Some(dfdt) = dfdt {
            match self.dfdt.as_ref() {
                Some(d) => d(params, t, y, dfdt),
                None => dfdt.iter_mut().for_each(|v| *v = T::zero()),
            }
        }
        Status::Success
    }
    fn roots(&self, params: &ParamView<'_, T>, t: T, y: &[T], out: &mut [T]) -> Status {
        if let Some(roots) = self.roots.as_ref() {
            roots(params, t, y, out);
        }
        Status::Success
    }
    fn invariants(&self, params: &ParamView<'_, T>, t: T, y: &[T], out: &mut [T]) {
        if let Some(invariants) = self.invariants.as_ref() {
            invariants(params, t, y, out);
        }
    }
    fn dx0(&self, params: &ParamView<'_, T>, t: T, y: &[T]) -> Option<T> {
        self.dx0.as_ref().map(|h| h(params, t, y))
    }
    fn dx_max(&self, params: &ParamView<'_, T>, t: T, y: &[T]) -> Option<T> {
        self.dx_max.as_ref().map(|h| h(params, t, y))
    }
}

#[cfg(test)]
mod tests {
    use super::Closure;
    use crate::{
        code::{GeneratedCode, ParamView},
        jacobian::{DenseJacobianMut, Layout},
        AdapterBuilder, DenseSystem, OdeSystem, Status,
    };

    fn assert_send_sync<S: Send + Sync>(_: &S) {}

    #[test]
    fn test_closure_defaults() {
        let code = Closure::<f64, _, _>::new(
            |params, _t, y, f| f[0] = params.p[0] * y[0],
            |params, _t, _y, jac| jac.set(0, 0, params.p[0]),
            1,
            1,
        );
        assert_eq!(code.ny(), 1);
        assert_eq!(code.nroots(), 0);
        assert_eq!(code.ninvariants(), 0);
        assert!(code.cse(&[1.0]).is_empty());

        let p = [3.0];
        let params = ParamView::new(&p, &[], &[]);
        assert_eq!(code.dx0(&params, 0.0, &[1.0]), None);

        let mut data = [0.0];
        let mut dfdt = [7.0];
        let mut jac = DenseJacobianMut::new(&mut data, 1, 1, Layout::ColMajor);
        let status = code.jac(&params, 0.0, &[1.0], None, &mut jac, Some(&mut dfdt[..]));
        assert_eq!(status, Status::Success);
        assert_eq!(data[0], 3.0);
        assert_eq!(dfdt[0], 0.0);
    }

    #[test]
    fn test_closure_extras() {
        let code = Closure::<f64, _, _>::new(
            |_params, t, y, f| f[0] = t * y[0],
            |_params, t, _y, jac| jac.set(0, 0, t),
            1,
            1,
        )
        .with_dfdt(|_params, _t, y, dfdt| dfdt[0] = y[0])
        .with_roots(2, |_params, t, y, out| {
            out[0] = y[0] - 1.0;
            out[1] = t - 2.0;
        })
        .with_cse(|p| vec![p[0] * p[0]])
        .with_dx0(|_params, _t, _y| 1e-3);

        let p = [4.0];
        let p_cse = code.cse(&p);
        assert_eq!(p_cse, vec![16.0]);
        let params = ParamView::new(&p, &p_cse, &[]);
        let mut out = [0.0; 2];
        assert_eq!(code.roots(&params, 1.0, &[3.0], &mut out), Status::Success);
        assert_eq!(out, [2.0, -1.0]);
        assert_eq!(code.dx0(&params, 0.0, &[1.0]), Some(1e-3));

        let mut data = [0.0];
        let mut dfdt = [0.0];
        let mut jac = DenseJacobianMut::new(&mut data, 1, 1, Layout::RowMajor);
        code.jac(&params, 2.0, &[5.0], None, &mut jac, Some(&mut dfdt[..]));
        assert_eq!(data[0], 2.0);
        assert_eq!(dfdt[0], 5.0);
    }

    #[test]
    fn test_adapter_with_extras_is_send() {
        let code = Closure::<f64, _, _>::new(
            |params, _t, y, f| f[0] = -params.p[0] * y[0],
            |params, _t, _y, jac| jac.set(0, 0, -params.p[0]),
            1,
            1,
        )
        .with_roots(1, |_params, _t, y, out| out[0] = y[0] - 0.5)
        .with_dx_max(|_params, _t, _y| 0.1);
        let mut sys = AdapterBuilder::new().p([2.0]).build_dense(code).unwrap();
        assert_send_sync(&sys);
        let f = std::thread::spawn(move || {
            let mut f = [0.0];
            let mut out = [0.0];
            assert_eq!(sys.rhs(0.0, &[1.0], &mut f), Status::Success);
            assert_eq!(sys.roots(0.0, &[1.0], &mut out), Status::Success);
            assert_eq!(out, [0.5]);
            f
        })
        .join()
        .unwrap();
        assert_eq!(f, [-2.0]);
    }
}
