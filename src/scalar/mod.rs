use std::fmt::{Debug, Display};

/// Floating point type the adapters are generic over.
///
/// The nalgebra bounds give access to `sqrt`, `powf`, `max`, LU and SVD; use
/// [`num_traits::abs`] for absolute values, since both `Signed` and
/// `ComplexField` provide an `abs` method.
pub trait Scalar:
    nalgebra::RealField + Copy + From<f64> + Display + Debug + Send + Sync + 'static
{
    const EPSILON: Self;
    const INFINITY: Self;
    const NAN: Self;
    fn is_nan(self) -> bool;
    fn as_f64(self) -> f64;
}

pub type IndexType = usize;

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const INFINITY: Self = f64::INFINITY;
    const NAN: Self = f64::NAN;
    fn is_nan(self) -> bool {
        self.is_nan()
    }
    fn as_f64(self) -> f64 {
        self
    }
}
