use log::debug;
use nalgebra::DMatrix;
use num_traits::{One, Zero};

use crate::{
    matrix::{jacobian_matrix, DefaultSolver, DenseMatrix},
    LinearSolver, OdeSystem, Scalar, Status,
};

/// Modified Newton iteration for the implicit stage equation
/// `y - c - gamma f(t, y) = 0`, with the iteration matrix `gamma J - I`
/// factorised once per step.
pub struct Newton<T: Scalar, M: DefaultSolver<T> = DMatrix<T>> {
    linear_solver: M::LS,
    tol: T,
    max_iter: usize,
    f: Vec<T>,
    delta: Vec<T>,
}

impl<T: Scalar, M: DefaultSolver<T>> Default for Newton<T, M> {
    fn default() -> Self {
        Self::new(T::from(1e-12), 20)
    }
}

impl<T: Scalar, M: DefaultSolver<T>> Newton<T, M> {
    /// Converged once the 2-norm of an update is at most `tol`.
    pub fn new(tol: T, max_iter: usize) -> Self {
        Self {
            linear_solver: M::default_solver(),
            tol,
            max_iter,
            f: Vec::new(),
            delta: Vec::new(),
        }
    }

    /// Factorise `gamma J(t, y) - I`.
    pub fn setup<S: OdeSystem<T> + ?Sized>(&mut self, sys: &mut S, t: T, y: &[T], gamma: T) -> Status {
        let n = sys.ny();
        let mut matrix = M::zeros(n, n);
        try_status!(jacobian_matrix(sys, t, y, &mut matrix));
        matrix.scale_add_identity(gamma, -T::one());
        match self.linear_solver.set_matrix(&matrix) {
            Ok(()) => Status::Success,
            Err(err) => {
                debug!("newton: {}", err);
                Status::RecoverableError
            }
        }
    }

    /// Iterate from the initial guess in `y` until converged. A failing
    /// linear solve, a growing update or too many iterations is recoverable.
    pub fn solve<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        t: T,
        c: &[T],
        gamma: T,
        y: &mut [T],
    ) -> Status {
        let n = y.len();
        self.f.resize(n, T::zero());
        self.delta.resize(n, T::zero());
        let mut previous_norm = T::INFINITY;
        for _ in 0..self.max_iter {
            try_status!(sys.rhs(t, y, &mut self.f));
            for i in 0..n {
                self.delta[i] = y[i] - c[i] - gamma * self.f[i];
            }
            if let Err(err) = self.linear_solver.solve_in_place(&mut self.delta) {
                debug!("newton: {}", err);
                return Status::RecoverableError;
            }
            let mut norm = T::zero();
            for i in 0..n {
                y[i] += self.delta[i];
                norm += self.delta[i] * self.delta[i];
            }
            if !norm.is_finite() {
                return Status::RecoverableError;
            }
            let norm = norm.sqrt();
            if norm <= self.tol {
                return Status::Success;
            }
            // diverging
            if norm >= previous_norm {
                debug!("newton: diverging at t = {}", t);
                return Status::RecoverableError;
            }
            previous_norm = norm;
        }
        debug!("newton: no convergence after {} iterations at t = {}", self.max_iter, t);
        Status::RecoverableError
    }
}
