use nalgebra::{DMatrix, DVectorViewMut, Dyn};

use crate::{
    error::{LinearSolverError, OdeSysError},
    linear_solver_error, LinearSolver, Scalar,
};

/// A [LinearSolver] that uses the LU decomposition in the [`nalgebra` library](https://nalgebra.org/) to solve the linear system.
#[derive(Clone)]
pub struct LU<T: Scalar> {
    lu: Option<nalgebra::LU<T, Dyn, Dyn>>,
    nrows: usize,
}

impl<T: Scalar> Default for LU<T> {
    fn default() -> Self {
        Self { lu: None, nrows: 0 }
    }
}

impl<T: Scalar> LinearSolver<T> for LU<T> {
    type M = DMatrix<T>;

    fn set_matrix(&mut self, matrix: &DMatrix<T>) -> Result<(), OdeSysError> {
        if !matrix.is_square() {
            return Err(linear_solver_error!(NotSquare {
                nrows: matrix.nrows(),
                ncols: matrix.ncols()
            }));
        }
        self.nrows = matrix.nrows();
        self.lu = Some(matrix.clone().lu());
        Ok(())
    }

    fn clear(&mut self) {
        self.lu = None;
    }

    fn solve_in_place(&self, b: &mut [T]) -> Result<(), OdeSysError> {
        let Some(lu) = self.lu.as_ref() else {
            return Err(linear_solver_error!(LuNotInitialized));
        };
        let n = b.len();
        if self.nrows != n {
            return Err(linear_solver_error!(
                Other,
                format!("right-hand side has length {}, matrix has {} rows", n, self.nrows)
            ));
        }
        let mut b = DVectorViewMut::from_slice(b, n);
        match lu.solve_mut(&mut b) {
            true => Ok(()),
            false => Err(linear_solver_error!(LuSolveFailed)),
        }
    }
}
