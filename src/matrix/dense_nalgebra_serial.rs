use nalgebra::{DMatrix, DVectorView, DVectorViewMut};

use crate::{linear_solver::NalgebraLU, IndexType, Scalar};

use super::{DefaultSolver, DenseMatrix};

impl<T: Scalar> DefaultSolver<T> for DMatrix<T> {
    type LS = NalgebraLU<T>;
}

impl<T: Scalar> DenseMatrix<T> for DMatrix<T> {
    fn zeros(nrows: IndexType, ncols: IndexType) -> Self {
        DMatrix::zeros(nrows, ncols)
    }
    fn nrows(&self) -> IndexType {
        self.nrows()
    }
    fn ncols(&self) -> IndexType {
        self.ncols()
    }
    fn get(&self, i: IndexType, j: IndexType) -> T {
        self[(i, j)]
    }
    fn set(&mut self, i: IndexType, j: IndexType, value: T) {
        self[(i, j)] = value;
    }
    fn col_major_mut(&mut self) -> Option<(&mut [T], IndexType)> {
        let ldim = self.nrows();
        Some((self.as_mut_slice(), ldim))
    }
    fn gemv(&self, alpha: T, x: &[T], beta: T, y: &mut [T]) {
        let x = DVectorView::from_slice(&x[..self.ncols()], self.ncols());
        let mut y = DVectorViewMut::from_slice(&mut y[..self.nrows()], self.nrows());
        y.gemv(alpha, self, &x, beta);
    }
    fn scale_add_identity(&mut self, alpha: T, beta: T) {
        *self *= alpha;
        for i in 0..self.nrows().min(self.ncols()) {
            self[(i, i)] += beta;
        }
    }
    fn from_col_major(nrows: IndexType, ncols: IndexType, data: &[T]) -> Self {
        DMatrix::from_column_slice(nrows, ncols, data)
    }
    fn identity(n: IndexType) -> Self {
        DMatrix::identity(n, n)
    }
}
