use crate::{error::OdeSysError, matrix::DenseMatrix, Scalar};

#[cfg(feature = "nalgebra")]
pub mod nalgebra_lu;

#[cfg(feature = "faer")]
pub mod faer_lu;

#[cfg(feature = "faer")]
pub use faer_lu::LU as FaerLU;
#[cfg(feature = "nalgebra")]
pub use nalgebra_lu::LU as NalgebraLU;

/// A direct solver for the linear problem `Ax = b` with a dense `A`.
pub trait LinearSolver<T: Scalar>: Default {
    type M: DenseMatrix<T>;

    /// Factorise `matrix`, any previous factorisation is discarded.
    fn set_matrix(&mut self, matrix: &Self::M) -> Result<(), OdeSysError>;

    /// Drop the current factorisation.
    fn clear(&mut self);

    /// Solve the problem `Ax = b` and return the solution `x`.
    fn solve(&self, b: &[T]) -> Result<Vec<T>, OdeSysError> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve in place, errors if [Self::set_matrix] has not succeeded before.
    fn solve_in_place(&self, b: &mut [T]) -> Result<(), OdeSysError>;
}
