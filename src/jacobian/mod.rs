use num_traits::{abs, One, Zero};
use serde::{Deserialize, Serialize};

use crate::{OdeSystem, Scalar, Status};

/// Storage order of a dense Jacobian buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// Entry `(i, j)` lives at `j * ldim + i`.
    ColMajor,
    /// Entry `(i, j)` lives at `i * ldim + j`.
    RowMajor,
}

impl Layout {
    #[inline]
    pub fn index(self, row: usize, col: usize, ldim: usize) -> usize {
        match self {
            Layout::ColMajor => col * ldim + row,
            Layout::RowMajor => row * ldim + col,
        }
    }

    /// Minimum buffer length holding an `n x n` block with leading dimension `ldim`.
    pub fn required_len(n: usize, ldim: usize) -> usize {
        if n == 0 {
            0
        } else {
            (n - 1) * ldim + n
        }
    }
}

/// Mutable view of a square dense Jacobian stored in a caller-provided buffer.
///
/// Generated code writes entries with [Self::set] and never sees the layout,
/// which keeps the column-major and row-major evaluations exact transposes of
/// each other. Entries outside the `n x n` block (padding implied by a leading
/// dimension larger than `n`) are never touched.
pub struct DenseJacobianMut<'a, T: Scalar> {
    data: &'a mut [T],
    n: usize,
    ldim: usize,
    layout: Layout,
}

impl<'a, T: Scalar> DenseJacobianMut<'a, T> {
    /// Returns `None` if `ldim < n` or the buffer is too short.
    pub fn try_new(data: &'a mut [T], n: usize, ldim: usize, layout: Layout) -> Option<Self> {
        if ldim < n || data.len() < Layout::required_len(n, ldim) {
            return None;
        }
        Some(Self {
            data,
            n,
            ldim,
            layout,
        })
    }

    /// Panics if the buffer cannot hold an `n x n` block with leading dimension `ldim`.
    pub fn new(data: &'a mut [T], n: usize, ldim: usize, layout: Layout) -> Self {
        let len = data.len();
        Self::try_new(data, n, ldim, layout).unwrap_or_else(|| {
            panic!(
                "buffer of length {} cannot hold a {}x{} block with leading dimension {}",
                len, n, n, ldim
            )
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn ldim(&self) -> usize {
        self.ldim
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.n && col < self.n);
        self.data[self.layout.index(row, col, self.ldim)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        debug_assert!(row < self.n && col < self.n);
        self.data[self.layout.index(row, col, self.ldim)] = value;
    }

    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: T) {
        let idx = self.layout.index(row, col, self.ldim);
        self.data[idx] += value;
    }

    /// Zero the `n x n` block.
    pub fn fill_zero(&mut self) {
        for i in 0..self.n {
            for j in 0..self.n {
                self.set(i, j, T::zero());
            }
        }
    }

    /// Copy the block into a new column-major vector with leading dimension `n`.
    pub fn to_col_major(&self) -> Vec<T> {
        let mut out = vec![T::zero(); self.n * self.n];
        for j in 0..self.n {
            for i in 0..self.n {
                out[j * self.n + i] = self.get(i, j);
            }
        }
        out
    }
}

/// Approximate the Jacobian of `sys` at `(t, y)` with forward differences of
/// the right-hand side, writing into `jac`.
///
/// Each column is obtained by perturbing one state, so this costs `ny + 1`
/// evaluations of the right-hand side.
pub fn finite_difference_jacobian<T, S>(
    sys: &mut S,
    t: T,
    y: &[T],
    jac: &mut DenseJacobianMut<'_, T>,
) -> Status
where
    T: Scalar,
    S: OdeSystem<T> + ?Sized,
{
    let n = sys.ny();
    let mut f0 = vec![T::zero(); n];
    let mut f1 = vec![T::zero(); n];
    let status = sys.rhs(t, y, &mut f0);
    if !status.is_success() {
        return status;
    }
    let sqrt_eps = T::EPSILON.sqrt();
    let mut yp = y.to_vec();
    for j in 0..n {
        let h = sqrt_eps * abs(y[j]).max(T::one());
        yp[j] = y[j] + h;
        let status = sys.rhs(t, &yp, &mut f1);
        if !status.is_success() {
            return status;
        }
        for i in 0..n {
            jac.set(i, j, (f1[i] - f0[i]) / h);
        }
        yp[j] = y[j];
    }
    Status::Success
}

#[cfg(test)]
mod tests {
    use super::{DenseJacobianMut, Layout};

    #[test]
    fn test_layout_index() {
        assert_eq!(Layout::ColMajor.index(1, 2, 4), 9);
        assert_eq!(Layout::RowMajor.index(1, 2, 4), 6);
        assert_eq!(Layout::required_len(3, 5), 13);
        assert_eq!(Layout::required_len(0, 5), 0);
    }

    #[test]
    fn test_padding_untouched() {
        let mut data = vec![-1.0; 6];
        let mut jac = DenseJacobianMut::new(&mut data, 2, 3, Layout::ColMajor);
        jac.fill_zero();
        jac.set(0, 1, 5.0);
        jac.add(0, 1, 1.0);
        assert_eq!(jac.get(0, 1), 6.0);
        assert_eq!(jac.to_col_major(), vec![0.0, 0.0, 6.0, 0.0]);
        assert_eq!(data, vec![0.0, 0.0, -1.0, 6.0, 0.0, -1.0]);
    }

    #[test]
    fn test_try_new_rejects_small_buffers() {
        let mut data = vec![0.0; 4];
        assert!(DenseJacobianMut::try_new(&mut data, 2, 1, Layout::RowMajor).is_none());
        assert!(DenseJacobianMut::try_new(&mut data, 3, 3, Layout::RowMajor).is_none());
        assert!(DenseJacobianMut::try_new(&mut data, 2, 2, Layout::RowMajor).is_some());
    }
}
