use faer::{linalg::solvers::FullPivLu, solvers::SpSolver, Col, Mat};

use crate::{
    error::{LinearSolverError, OdeSysError},
    linear_solver_error, LinearSolver,
};

/// A [LinearSolver] that uses the full pivoting LU decomposition in the [`faer`](https://github.com/sarah-ek/faer-rs) library to solve the linear system.
///
/// faer does not report singular factors, so a solve producing non-finite
/// entries is treated as failed.
#[derive(Default)]
pub struct LU {
    lu: Option<FullPivLu<f64>>,
    nrows: usize,
}

impl LinearSolver<f64> for LU {
    type M = Mat<f64>;

    fn set_matrix(&mut self, matrix: &Mat<f64>) -> Result<(), OdeSysError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(linear_solver_error!(NotSquare {
                nrows: matrix.nrows(),
                ncols: matrix.ncols()
            }));
        }
        self.nrows = matrix.nrows();
        self.lu = Some(matrix.full_piv_lu());
        Ok(())
    }

    fn clear(&mut self) {
        self.lu = None;
    }

    fn solve_in_place(&self, b: &mut [f64]) -> Result<(), OdeSysError> {
        let Some(lu) = self.lu.as_ref() else {
            return Err(linear_solver_error!(LuNotInitialized));
        };
        if self.nrows != b.len() {
            return Err(linear_solver_error!(
                Other,
                format!("right-hand side has length {}, matrix has {} rows", b.len(), self.nrows)
            ));
        }
        let mut x = Col::from_fn(b.len(), |i| b[i]);
        lu.solve_in_place(&mut x);
        if (0..x.nrows()).any(|i| !x.read(i).is_finite()) {
            return Err(linear_solver_error!(LuSolveFailed));
        }
        for (i, bi) in b.iter_mut().enumerate() {
            *bi = x.read(i);
        }
        Ok(())
    }
}
