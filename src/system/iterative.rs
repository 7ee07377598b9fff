use log::{error, trace};
use nalgebra::{DMatrix, DVector, Dyn, LU};
use num_traits::{One, Zero};

use crate::{
    code::{GeneratedCode, ParamView},
    config_error,
    error::{ConfigError, OdeSysError},
    jacobian::Layout,
    Scalar, Status,
};

use super::{
    builder::AdapterOptions, check_lengths, evaluate_dense_jacobian, hint, IterativeSystem,
    OdeSystem, Statistics,
};

/// Adapter for solvers using iterative linear solves.
///
/// Carries no bounds, invariants or root functions. The preconditioner is a
/// dense LU of `I - gamma J`, which suits the small to medium systems these
/// adapters are built for.
#[derive(Debug)]
pub struct IterativeAdapter<T: Scalar, G: GeneratedCode<T>> {
    code: G,
    p: Vec<T>,
    p_cse: Vec<T>,
    atol: Vec<T>,
    rtol: T,
    special_settings: Vec<T>,
    statistics: Statistics,
    /// Column-major Jacobian from the last preconditioner setup.
    jac: Vec<T>,
    jac_current: bool,
    jv_buf: Vec<T>,
    prec: Option<LU<T, Dyn, Dyn>>,
}

impl<T: Scalar, G: GeneratedCode<T>> IterativeAdapter<T, G> {
    pub fn new(code: G, options: &AdapterOptions) -> Result<Self, OdeSysError> {
        let ny = code.ny();
        if ny == 0 {
            return Err(config_error!(NoStates));
        }
        let rtol = options.rtol()?;
        let atol = options.atol(ny)?;
        let p = options.p(code.np())?;
        let p_cse = code.cse(&p);
        Ok(Self {
            p,
            p_cse,
            atol,
            rtol,
            special_settings: options
                .special_settings
                .iter()
                .map(|&x| T::from(x))
                .collect(),
            statistics: Statistics::new(),
            jac: vec![T::zero(); ny * ny],
            jac_current: false,
            jv_buf: vec![T::zero(); ny * ny],
            prec: None,
            code,
        })
    }

    pub fn code(&self) -> &G {
        &self.code
    }
    pub fn p(&self) -> &[T] {
        &self.p
    }
    pub fn p_cse(&self) -> &[T] {
        &self.p_cse
    }
    pub fn atol(&self) -> &[T] {
        &self.atol
    }
    pub fn rtol(&self) -> T {
        self.rtol
    }
    pub fn special_settings(&self) -> &[T] {
        &self.special_settings
    }

    #[allow(clippy::too_many_arguments)]
    fn dense_jac(
        &mut self,
        layout: Layout,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut [T],
        ldim: usize,
        dfdt: Option<&mut [T]>,
    ) -> Status {
        self.statistics.increment_jac();
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        evaluate_dense_jacobian(&self.code, &params, layout, t, y, fy, jac, ldim, dfdt)
    }
}

impl<T: Scalar, G: GeneratedCode<T>> OdeSystem<T> for IterativeAdapter<T, G> {
    fn ny(&self) -> usize {
        self.code.ny()
    }

    fn dx0(&mut self, t: T, y: &[T]) -> T {
        if !check_lengths("dx0", self.code.ny(), &[y.len()]).is_success() {
            return T::from(1e-6);
        }
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        if let Some(h) = self.code.dx0(&params, t, y) {
            return h;
        }
        let atol = self.atol.clone();
        let rtol = self.rtol;
        hint::initial_step(self, t, y, &atol, rtol, T::INFINITY)
    }

    fn rhs(&mut self, t: T, y: &[T], f: &mut [T]) -> Status {
        self.statistics.increment_rhs();
        let status = check_lengths("rhs", self.code.ny(), &[y.len(), f.len()]);
        if !status.is_success() {
            return status;
        }
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        self.code.rhs(&params, t, y, f)
    }

    fn dense_jac_cmaj(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut [T],
        ldim: usize,
        dfdt: Option<&mut [T]>,
    ) -> Status {
        self.dense_jac(Layout::ColMajor, t, y, fy, jac, ldim, dfdt)
    }

    fn dense_jac_rmaj(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut [T],
        ldim: usize,
        dfdt: Option<&mut [T]>,
    ) -> Status {
        self.dense_jac(Layout::RowMajor, t, y, fy, jac, ldim, dfdt)
    }

    fn statistics(&self) -> Statistics {
        self.statistics
    }
}

impl<T: Scalar, G: GeneratedCode<T>> IterativeSystem<T> for IterativeAdapter<T, G> {
    fn jac_times_vec(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        v: &[T],
        out: &mut [T],
    ) -> Status {
        self.statistics.increment_jac_times_vec();
        let n = self.code.ny();
        let status = check_lengths("jac_times_vec", n, &[v.len(), out.len()]);
        if !status.is_success() {
            return status;
        }
        let mut jac = std::mem::take(&mut self.jv_buf);
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        let status =
            evaluate_dense_jacobian(&self.code, &params, Layout::ColMajor, t, y, fy, &mut jac, n, None);
        if status.is_success() {
            for (i, out_i) in out.iter_mut().take(n).enumerate() {
                *out_i = (0..n).fold(T::zero(), |acc, j| acc + jac[j * n + i] * v[j]);
            }
        }
        self.jv_buf = jac;
        status
    }

    fn prec_setup(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac_ok: bool,
        jac_recomputed: &mut bool,
        gamma: T,
    ) -> Status {
        self.statistics.increment_prec_setup();
        let n = self.code.ny();
        *jac_recomputed = false;
        if !jac_ok || !self.jac_current {
            self.statistics.increment_jac();
            let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
            let status = evaluate_dense_jacobian(
                &self.code,
                &params,
                Layout::ColMajor,
                t,
                y,
                fy,
                &mut self.jac,
                n,
                None,
            );
            if !status.is_success() {
                self.jac_current = false;
                self.prec = None;
                return status;
            }
            self.jac_current = true;
            *jac_recomputed = true;
        }
        trace!("preconditioner setup at t = {} with gamma = {}", t, gamma);
        let jac = &self.jac;
        let m = DMatrix::from_fn(n, n, |i, j| {
            let identity = if i == j { T::one() } else { T::zero() };
            identity - gamma * jac[j * n + i]
        });
        let lu = m.lu();
        if !lu.is_invertible() {
            error!("preconditioner I - gamma J is singular at t = {}", t);
            self.prec = None;
            return Status::RecoverableError;
        }
        self.prec = Some(lu);
        Status::Success
    }

    fn prec_solve_left(
        &mut self,
        _t: T,
        _y: &[T],
        _fy: Option<&[T]>,
        r: &[T],
        z: &mut [T],
        _gamma: T,
        _delta: T,
    ) -> Status {
        self.statistics.increment_prec_solve();
        let n = self.code.ny();
        let status = check_lengths("prec_solve_left", n, &[r.len(), z.len()]);
        if !status.is_success() {
            return status;
        }
        let Some(lu) = self.prec.as_ref() else {
            error!("prec_solve_left called before a successful prec_setup");
            return Status::UnrecoverableError;
        };
        let mut b = DVector::from_column_slice(&r[..n]);
        if !lu.solve_mut(&mut b) {
            return Status::RecoverableError;
        }
        z[..n].copy_from_slice(b.as_slice());
        Status::Success
    }
}
