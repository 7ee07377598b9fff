use log::{error, warn};
use num_traits::{abs, Zero};

use crate::{
    code::{GeneratedCode, ParamView},
    config_error,
    error::{ConfigError, OdeSysError},
    jacobian::Layout,
    Scalar, Status,
};

use super::{
    builder::AdapterOptions, check_lengths, evaluate_dense_jacobian, hint, DenseSystem,
    OdeSystem, Statistics,
};

/// Adapter for solvers that factorise a dense Jacobian.
///
/// Owns the parameters, tolerances, bounds and invariant baseline of one
/// integration run, and enforces bounds and invariants on every right-hand
/// side evaluation when configured to.
#[derive(Debug)]
pub struct DenseAdapter<T: Scalar, G: GeneratedCode<T>> {
    code: G,
    p: Vec<T>,
    p_cse: Vec<T>,
    atol: Vec<T>,
    rtol: T,
    upper_bounds: Vec<T>,
    lower_bounds: Vec<T>,
    invar0: Vec<T>,
    dx_max_factor: T,
    error_outside_bounds: bool,
    max_invariant_violation: T,
    special_settings: Vec<T>,
    nrev: usize,
    statistics: Statistics,
    invariant_buf: Vec<T>,
    f_buf: Vec<T>,
}

impl<T: Scalar, G: GeneratedCode<T>> DenseAdapter<T, G> {
    pub fn new(code: G, options: &AdapterOptions) -> Result<Self, OdeSysError> {
        Self::with_invariant_state(code, options, None)
    }

    /// As [Self::new], computing the invariant baseline at `(t0, y0)` when given.
    pub fn with_invariant_state(
        code: G,
        options: &AdapterOptions,
        invariant_state: Option<(T, &[T])>,
    ) -> Result<Self, OdeSysError> {
        let ny = code.ny();
        if ny == 0 {
            return Err(config_error!(NoStates));
        }
        let rtol = options.rtol()?;
        let atol = options.atol(ny)?;
        let (lower_bounds, upper_bounds) = options.bounds(ny)?;
        let max_invariant_violation = options.max_invariant_violation()?;
        let to_t = |v: &[f64]| v.iter().map(|&x| T::from(x)).collect::<Vec<T>>();
        let p = options.p(code.np())?;
        let p_cse = code.cse(&p);
        let ninvariants = code.ninvariants();
        let mut ret = Self {
            p,
            p_cse,
            atol,
            rtol,
            upper_bounds,
            lower_bounds,
            invar0: to_t(&options.invar0),
            dx_max_factor: T::from(options.dx_max_factor),
            error_outside_bounds: options.error_outside_bounds,
            max_invariant_violation,
            special_settings: to_t(&options.special_settings),
            nrev: 0,
            statistics: Statistics::new(),
            invariant_buf: vec![T::zero(); ninvariants],
            f_buf: vec![T::zero(); ny],
            code,
        };
        if let Some((t0, y0)) = invariant_state {
            ret.set_invariant_baseline(t0, y0)?;
        }
        if !ret.invar0.is_empty() && ret.invar0.len() != ninvariants {
            return Err(config_error!(InvariantBaselineLengthMismatch {
                expected: ninvariants,
                got: ret.invar0.len()
            }));
        }
        if ret.invariant_checking_enabled() && ret.invar0.is_empty() {
            return Err(config_error!(MissingInvariantBaseline));
        }
        Ok(ret)
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
    pub fn upper_bounds(&self) -> &[T] {
        &self.upper_bounds
    }
    pub fn lower_bounds(&self) -> &[T] {
        &self.lower_bounds
    }
    pub fn invar0(&self) -> &[T] {
        &self.invar0
    }
    pub fn dx_max_factor(&self) -> T {
        self.dx_max_factor
    }
    pub fn error_outside_bounds(&self) -> bool {
        self.error_outside_bounds
    }
    pub fn max_invariant_violation(&self) -> T {
        self.max_invariant_violation
    }
    pub fn special_settings(&self) -> &[T] {
        &self.special_settings
    }

    /// Number of root function evaluations so far.
    pub fn nrev(&self) -> usize {
        self.nrev
    }

    pub fn ninvariants(&self) -> usize {
        self.code.ninvariants()
    }

    pub fn invariant_checking_enabled(&self) -> bool {
        self.max_invariant_violation > T::zero() && self.code.ninvariants() > 0
    }

    /// Evaluate the invariants at `(t, y)`. Empty if `y` is too short.
    pub fn invariants(&self, t: T, y: &[T]) -> Vec<T> {
        if !check_lengths("invariants", self.code.ny(), &[y.len()]).is_success() {
            return Vec::new();
        }
        let mut out = vec![T::zero(); self.code.ninvariants()];
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        self.code.invariants(&params, t, y, &mut out);
        out
    }

    /// Absolute drift `|I(t, y) - invar0|` of every invariant. Empty without a baseline.
    pub fn invariant_violations(&self, t: T, y: &[T]) -> Vec<T> {
        if self.invar0.is_empty() {
            return Vec::new();
        }
        self.invariants(t, y)
            .into_iter()
            .zip(self.invar0.iter())
            .map(|(i, &i0)| abs(i - i0))
            .collect()
    }

    /// Replace the invariant baseline with the invariants at `(t, y)`.
    pub fn set_invariant_baseline(&mut self, t: T, y: &[T]) -> Result<(), OdeSysError> {
        let ny = self.code.ny();
        if y.len() != ny {
            return Err(config_error!(InitialStateLengthMismatch {
                expected: ny,
                got: y.len()
            }));
        }
        self.invar0 = self.invariants(t, y);
        Ok(())
    }

    fn first_out_of_bounds(&self, y: &[T]) -> Option<usize> {
        (0..self.code.ny()).find(|&i| {
            self.lower_bounds.get(i).is_some_and(|&lower| y[i] < lower)
                || self.upper_bounds.get(i).is_some_and(|&upper| y[i] > upper)
        })
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

    /// Base of [DenseSystem::dx_max] when the generated code has no hint.
    fn bounds_step_limit(&mut self, t: T, y: &[T]) -> T {
        if self.lower_bounds.is_empty() && self.upper_bounds.is_empty() {
            return T::INFINITY;
        }
        let mut f = std::mem::take(&mut self.f_buf);
        let limit = if self.rhs(t, y, &mut f).is_success() {
            hint::bounds_step_limit(&y[..f.len()], &f, &self.lower_bounds, &self.upper_bounds)
        } else {
            T::INFINITY
        };
        self.f_buf = f;
        limit
    }
}

impl<T: Scalar, G: GeneratedCode<T>> OdeSystem<T> for DenseAdapter<T, G> {
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
        let hmax = self.dx_max(t, y);
        let atol = self.atol.clone();
        let rtol = self.rtol;
        hint::initial_step(self, t, y, &atol, rtol, hmax)
    }

    fn rhs(&mut self, t: T, y: &[T], f: &mut [T]) -> Status {
        self.statistics.increment_rhs();
        let status = check_lengths("rhs", self.code.ny(), &[y.len(), f.len()]);
        if !status.is_success() {
            return status;
        }
        if self.error_outside_bounds {
            if let Some(i) = self.first_out_of_bounds(y) {
                warn!("state {} = {} outside bounds at t = {}", i, y[i], t);
                return Status::UnrecoverableError;
            }
        }
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        let status = self.code.rhs(&params, t, y, f);
        if !status.is_success() {
            return status;
        }
        if self.invariant_checking_enabled() {
            self.code.invariants(&params, t, y, &mut self.invariant_buf);
            for (i, (&inv, &inv0)) in self.invariant_buf.iter().zip(self.invar0.iter()).enumerate() {
                let drift = abs(inv - inv0);
                // a NaN drift is a violation as well
                if !(drift <= self.max_invariant_violation) {
                    warn!(
                        "invariant {} drifted by {} (max {}) at t = {}",
                        i, drift, self.max_invariant_violation, t
                    );
                    return Status::UnrecoverableError;
                }
            }
        }
        Status::Success
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
        Statistics {
            nrev: self.nrev,
            ..self.statistics
        }
    }
}

impl<T: Scalar, G: GeneratedCode<T>> DenseSystem<T> for DenseAdapter<T, G> {
    fn nroots(&self) -> usize {
        self.code.nroots()
    }

    fn dx_max(&mut self, t: T, y: &[T]) -> T {
        if y.len() < self.code.ny() {
            error!("dx_max: state of length {} is shorter than {}", y.len(), self.code.ny());
            return T::INFINITY;
        }
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        let base = match self.code.dx_max(&params, t, y) {
            Some(h) => h,
            None => self.bounds_step_limit(t, y),
        };
        hint::scale_dx_max(base, self.dx_max_factor)
    }

    fn roots(&mut self, t: T, y: &[T], out: &mut [T]) -> Status {
        self.nrev += 1;
        let status = check_lengths("roots", self.code.ny(), &[y.len()])
            .and(check_lengths("roots", self.code.nroots(), &[out.len()]));
        if !status.is_success() {
            return status;
        }
        let params = ParamView::new(&self.p, &self.p_cse, &self.special_settings);
        self.code.roots(&params, t, y, out)
    }
}
