use std::fmt::Debug;

use num_traits::{One, Zero};

use crate::{linear_solver::LinearSolver, IndexType, OdeSystem, Scalar, Status};

#[cfg(feature = "nalgebra")]
mod dense_nalgebra_serial;

#[cfg(feature = "faer")]
mod dense_faer_serial;

/// A dense matrix that a Jacobian can be evaluated into and factorised.
pub trait DenseMatrix<T: Scalar>: Sized + Clone + Debug {
    fn zeros(nrows: IndexType, ncols: IndexType) -> Self;
    fn nrows(&self) -> IndexType;
    fn ncols(&self) -> IndexType;
    fn get(&self, i: IndexType, j: IndexType) -> T;
    fn set(&mut self, i: IndexType, j: IndexType, value: T);

    /// The column-major storage and its leading dimension, when the entries
    /// can be written in place.
    fn col_major_mut(&mut self) -> Option<(&mut [T], IndexType)> {
        None
    }

    /// Perform a matrix-vector multiplication `y = alpha * self * x + beta * y`.
    fn gemv(&self, alpha: T, x: &[T], beta: T, y: &mut [T]) {
        for (i, yi) in y.iter_mut().enumerate().take(self.nrows()) {
            let ax = (0..self.ncols()).fold(T::zero(), |acc, j| acc + self.get(i, j) * x[j]);
            *yi = alpha * ax + beta * *yi;
        }
    }

    /// `self = alpha * self + beta * I`.
    fn scale_add_identity(&mut self, alpha: T, beta: T) {
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                let mut value = alpha * self.get(i, j);
                if i == j {
                    value += beta;
                }
                self.set(i, j, value);
            }
        }
    }

    fn from_col_major(nrows: IndexType, ncols: IndexType, data: &[T]) -> Self {
        let mut m = Self::zeros(nrows, ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                m.set(i, j, data[j * nrows + i]);
            }
        }
        m
    }

    fn identity(n: IndexType) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, T::one());
        }
        m
    }
}

/// The linear solver used for a matrix type unless another one is chosen.
pub trait DefaultSolver<T: Scalar>: DenseMatrix<T> {
    type LS: LinearSolver<T, M = Self>;
    fn default_solver() -> Self::LS {
        Self::LS::default()
    }
}

/// Evaluate the Jacobian of `sys` at `(t, y)` into `matrix`, which must be
/// `ny x ny`. Matrices with column-major storage are filled in place.
pub fn jacobian_matrix<T, M, S>(sys: &mut S, t: T, y: &[T], matrix: &mut M) -> Status
where
    T: Scalar,
    M: DenseMatrix<T>,
    S: OdeSystem<T> + ?Sized,
{
    let n = sys.ny();
    if matrix.nrows() != n || matrix.ncols() != n {
        log::error!(
            "jacobian matrix is {}x{}, system has {} states",
            matrix.nrows(),
            matrix.ncols(),
            n
        );
        return Status::UnrecoverableError;
    }
    if let Some((data, ldim)) = matrix.col_major_mut() {
        return sys.dense_jac_cmaj(t, y, None, data, ldim, None);
    }
    let mut data = vec![T::zero(); n * n];
    let status = sys.dense_jac_cmaj(t, y, None, &mut data, n, None);
    if status.is_success() {
        for j in 0..n {
            for i in 0..n {
                matrix.set(i, j, data[j * n + i]);
            }
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::{jacobian_matrix, DenseMatrix};
    use crate::{test_models::robertson::robertson, Status};

    fn check_jacobian_matrix<M: DenseMatrix<f64>>() {
        let mut sys = robertson::<f64>();
        let y = [0.5, 1e-4, 0.5];
        let mut m = M::zeros(3, 3);
        assert_eq!(jacobian_matrix(&mut sys, 0.0, &y, &mut m), Status::Success);
        assert_eq!(m.get(0, 0), -0.04);
        assert_eq!(m.get(1, 0), 0.04);
        assert_eq!(m.get(0, 1), 1.0e4 * 0.5);
        assert_eq!(m.get(2, 1), 6.0e7 * 1e-4);
        assert_eq!(m.get(2, 0), 0.0);

        let mut wrong = M::zeros(2, 3);
        assert_eq!(
            jacobian_matrix(&mut sys, 0.0, &y, &mut wrong),
            Status::UnrecoverableError
        );
    }

    fn check_dense_ops<M: DenseMatrix<f64>>() {
        let mut m = M::from_col_major(2, 2, &[1.0, 3.0, 2.0, 4.0]);
        assert_eq!(m.get(0, 1), 2.0);
        let mut y = [1.0, 1.0];
        m.gemv(2.0, &[1.0, 1.0], 1.0, &mut y);
        assert_eq!(y, [7.0, 15.0]);
        m.scale_add_identity(2.0, -1.0);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 0), 6.0);
        assert_eq!(m.get(1, 1), 7.0);
        let id = M::identity(3);
        assert_eq!(id.get(2, 2), 1.0);
        assert_eq!(id.get(1, 2), 0.0);
    }

    #[cfg(feature = "nalgebra")]
    #[test]
    fn test_nalgebra_matrix() {
        check_jacobian_matrix::<nalgebra::DMatrix<f64>>();
        check_dense_ops::<nalgebra::DMatrix<f64>>();
    }

    #[cfg(feature = "faer")]
    #[test]
    fn test_faer_matrix() {
        check_jacobian_matrix::<faer::Mat<f64>>();
        check_dense_ops::<faer::Mat<f64>>();
    }
}
