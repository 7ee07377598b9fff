use faer::Mat;

use crate::{linear_solver::FaerLU, IndexType};

use super::{DefaultSolver, DenseMatrix};

impl DefaultSolver<f64> for Mat<f64> {
    type LS = FaerLU;
}

impl DenseMatrix<f64> for Mat<f64> {
    fn zeros(nrows: IndexType, ncols: IndexType) -> Self {
        Mat::zeros(nrows, ncols)
    }
    fn nrows(&self) -> IndexType {
        self.nrows()
    }
    fn ncols(&self) -> IndexType {
        self.ncols()
    }
    fn get(&self, i: IndexType, j: IndexType) -> f64 {
        self.read(i, j)
    }
    fn set(&mut self, i: IndexType, j: IndexType, value: f64) {
        self.write(i, j, value);
    }
    fn from_col_major(nrows: IndexType, ncols: IndexType, data: &[f64]) -> Self {
        Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i])
    }
    fn identity(n: IndexType) -> Self {
        Mat::identity(n, n)
    }
}
