//! The contract between an adapter and the code that does the arithmetic.
//!
//! A code generator (or a person) provides the derivative, Jacobian, roots
//! and invariants of a concrete ODE system by implementing [GeneratedCode].
//! The adapters in [crate::system] wrap such an implementation, own its
//! parameters and tolerances, and expose it to an external solver.

use crate::{jacobian::DenseJacobianMut, Scalar, Status};

pub mod closure;

/// Borrowed parameter data handed to every generated evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ParamView<'a, T: Scalar> {
    /// Parameters, fixed for the lifetime of the adapter.
    pub p: &'a [T],
    /// Derived parameters produced by [GeneratedCode::cse] from `p`.
    pub p_cse: &'a [T],
    /// Opaque settings, interpreted only by the generated code.
    pub special_settings: &'a [T],
}

impl<'a, T: Scalar> ParamView<'a, T> {
    pub fn new(p: &'a [T], p_cse: &'a [T], special_settings: &'a [T]) -> Self {
        Self {
            p,
            p_cse,
            special_settings,
        }
    }
}

pub trait GeneratedCode<T: Scalar> {
    /// Number of states.
    fn ny(&self) -> usize;

    /// Number of parameters indexed by the evaluations.
    fn np(&self) -> usize;

    /// Number of root functions.
    fn nroots(&self) -> usize {
        0
    }

    /// Number of invariants (conserved quantities).
    fn ninvariants(&self) -> usize {
        0
    }

    /// Common subexpressions of the parameters, evaluated once per adapter.
    fn cse(&self, _p: &[T]) -> Vec<T> {
        Vec::new()
    }

    /// Fill `f` with dy/dt at `(t, y)`.
    fn rhs(&self, params: &ParamView<'_, T>, t: T, y: &[T], f: &mut [T]) -> Status;

    /// Write df/dy into `jac` and, if requested, df/dt into `dfdt`.
    ///
    /// `fy` is the derivative at `(t, y)` when the caller has it at hand.
    /// The view starts out zeroed, so only non-zero entries need writing.
    fn jac(
        &self,
        params: &ParamView<'_, T>,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut DenseJacobianMut<'_, T>,
        dfdt: Option<&mut [T]>,
    ) -> Status;

    fn roots(&self, _params: &ParamView<'_, T>, _t: T, _y: &[T], _out: &mut [T]) -> Status {
        Status::Success
    }

    fn invariants(&self, _params: &ParamView<'_, T>, _t: T, _y: &[T], _out: &mut [T]) {}

    /// Problem specific initial step, `None` to let the adapter estimate one.
    fn dx0(&self, _params: &ParamView<'_, T>, _t: T, _y: &[T]) -> Option<T> {
        None
    }

    /// Problem specific maximum step, `None` to let the adapter estimate one.
    fn dx_max(&self, _params: &ParamView<'_, T>, _t: T, _y: &[T]) -> Option<T> {
        None
    }
}

impl<T: Scalar, G: GeneratedCode<T> + ?Sized> GeneratedCode<T> for Box<G> {
    fn ny(&self) -> usize {
        G::ny(self)
    }
    fn np(&self) -> usize {
        G::np(self)
    }
    fn nroots(&self) -> usize {
        G::nroots(self)
    }
    fn ninvariants(&self) -> usize {
        G::ninvariants(self)
    }
    fn cse(&self, p: &[T]) -> Vec<T> {
        G::cse(self, p)
    }
    fn rhs(&self, params: &ParamView<'_, T>, t: T, y: &[T], f: &mut [T]) -> Status {
        G::rhs(self, params, t, y, f)
    }
    fn jac(
        &self,
        params: &ParamView<'_, T>,
        t: T,
        y: &[T],
        fy: Option<&[T]>,
        jac: &mut DenseJacobianMut<'_, T>,
        dfdt: Option<&mut [T]>,
    ) -> Status {
        G::jac(self, params, t, y, fy, jac, dfdt)
    }
    fn roots(&self, params: &ParamView<'_, T>, t: T, y: &[T], out: &mut [T]) -> Status {
        G::roots(self, params, t, y, out)
    }
    fn invariants(&self, params: &ParamView<'_, T>, t: T, y: &[T], out: &mut [T]) {
        G::invariants(self, params, t, y, out)
    }
    fn dx0(&self, params: &ParamView<'_, T>, t: T, y: &[T]) -> Option<T> {
        G::dx0(self, params, t, y)
    }
    fn dx_max(&self, params: &ParamView<'_, T>, t: T, y: &[T]) -> Option<T> {
        G::dx_max(self, params, t, y)
    }
}
