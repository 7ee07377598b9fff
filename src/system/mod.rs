use log::error;
use serde::{Deserialize, Serialize};

use crate::{
    code::{GeneratedCode, ParamView},
    jacobian::{DenseJacobianMut, Layout},
    Scalar, Status,
};

pub mod builder;
pub mod dense;
pub mod hint;
pub mod iterative;

/// Evaluation contract shared by both adapters and consumed by a solver.
///
/// All evaluation methods report failures through [Status] and never panic
/// on malformed input buffers. `y` and `f` must hold at least [Self::ny]
/// entries, a Jacobian buffer at least `(ny - 1) * ldim + ny`.
pub trait OdeSystem<T: Scalar> {
    /// Number of states.
    fn ny(&self) -> usize;

    /// Initial step size hint.
    fn dx0(&mut self, t: T, y: &[T]) -> T;

    /// Evaluate dy/dt at `(t, y)` into `f`.
    fn rhs(&mut self, t: T, y: &[T], f: &mut [T]) -> Status;

    /// Evaluate the dense Jacobian df/dy in column-major order, so entry
    /// `(i, j)` is written to `jac[j * ldim + i]`. `fy` may carry the
    /// derivative at `(t, y)`; `dfdt`, if given, receives df/dt.
    fn dense_jac_cmaj(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut [T],
        ldim: usize,
        dfdt: Option<&mut [T]>,
    ) -> Status;

    /// As [Self::dense_jac_cmaj], but entry `(i, j)` goes to `jac[i * ldim + j]`.
    fn dense_jac_rmaj(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut [T],
        ldim: usize,
        dfdt: Option<&mut [T]>,
    ) -> Status;

    fn statistics(&self) -> Statistics;
}

/// Dense-mode contract: adds root functions and a maximum step hint.
pub trait DenseSystem<T: Scalar>: OdeSystem<T> {
    /// Number of root functions.
    fn nroots(&self) -> usize;

    /// Maximum step size hint.
    fn dx_max(&mut self, t: T, y: &[T]) -> T;

    /// Evaluate the root functions into `out`.
    fn roots(&mut self, t: T, y: &[T], out: &mut [T]) -> Status;
}

/// Iterative-mode contract: the matrix-free entry points of a Krylov solver.
pub trait IterativeSystem<T: Scalar>: OdeSystem<T> {
    /// `out = J v` with `J` the Jacobian at `(t, y)`.
    fn jac_times_vec(&mut self, t: T, y: &[T], fy: Option<&[T]>, v: &[T], out: &mut [T])
        -> Status;

    /// Prepare the preconditioner `I - gamma J`.
    ///
    /// When `jac_ok` is set the previously evaluated Jacobian may be reused;
    /// `jac_recomputed` reports whether it was evaluated anew.
    fn prec_setup(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac_ok: bool,
        jac_recomputed: &mut bool,
        gamma: T,
    ) -> Status;

    /// Solve `(I - gamma J) z = r` with the preconditioner from [Self::prec_setup].
    #[allow(clippy::too_many_arguments)]
    fn prec_solve_left(
        &mut self,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        r: &[T],
        z: &mut [T],
        gamma: T,
        delta: T,
    ) -> Status;
}

/// Evaluation counters of an adapter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Right-hand side evaluations.
    pub nfev: usize,
    /// Dense Jacobian evaluations.
    pub njev: usize,
    /// Root function evaluations.
    pub nrev: usize,
    /// Jacobian-vector products.
    pub njvev: usize,
    pub nprec_setup: usize,
    pub nprec_solve: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_rhs(&mut self) {
        self.nfev += 1;
    }

    pub fn increment_jac(&mut self) {
        self.njev += 1;
    }

    pub fn increment_jac_times_vec(&mut self) {
        self.njvev += 1;
    }

    pub fn increment_prec_setup(&mut self) {
        self.nprec_setup += 1;
    }

    pub fn increment_prec_solve(&mut self) {
        self.nprec_solve += 1;
    }
}

/// Checks that every slice in `lens` holds at least `n` entries.
pub(crate) fn check_lengths(what: &str, n: usize, lens: &[usize]) -> Status {
    match lens.iter().find(|&&len| len < n) {
        Some(len) => {
            error!("{}: buffer of length {} is shorter than {}", what, len, n);
            Status::UnrecoverableError
        }
        None => Status::Success,
    }
}

/// Zero the `ny x ny` block of `jac` and let `code` fill it in `layout` order.
#[allow(clippy::too_many_arguments)]
pub(crate) fn evaluate_dense_jacobian<T, G>(
    code: &G,
    params: &ParamView<'_, T>,
    layout: Layout,
    t: T,
    y: &[T],
    fy: Option<&[T]>,
    jac: &mut [T],
    ldim: usize,
    dfdt: Option<&mut [T]>,
) -> Status
where
    T: Scalar,
    G: GeneratedCode<T> + ?Sized,
{
    let ny = code.ny();
    let mut lens = vec![y.len()];
    lens.extend(fy.map(|fy| fy.len()));
    lens.extend(dfdt.as_ref().map(|dfdt| dfdt.len()));
    let status = check_lengths("dense jacobian", ny, &lens);
    if !status.is_success() {
        return status;
    }
    let len = jac.len();
    let Some(mut view) = DenseJacobianMut::try_new(jac, ny, ldim, layout) else {
        error!(
            "dense jacobian: buffer of length {} with leading dimension {} cannot hold {}x{} entries",
            len, ldim, ny, ny
        );
        return Status::UnrecoverableError;
    };
    view.fill_zero();
    code.jac(params, t, y, fy, &mut view, dfdt)
}
