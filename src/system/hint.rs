//! Step size heuristics used when the generated code offers no hint of its own.

use num_traits::{abs, One, Zero};

use crate::{OdeSystem, Scalar};

/// Order assumed by [initial_step] when scaling the second-derivative estimate.
const ORDER: f64 = 2.0;

/// Step returned when no estimate can be made.
const FALLBACK_STEP: f64 = 1e-6;

/// Estimate an initial step from the weighted norms of `y`, `f(t, y)` and a
/// finite-difference estimate of the second derivative along an explicit
/// Euler trial step. The result is always positive and never exceeds a
/// positive `hmax`; a zero, negative or NaN `hmax` places no cap.
///
/// `atol` holds one entry per state. Costs two right-hand side evaluations;
/// a failing evaluation falls back to the best estimate available so far.
pub fn initial_step<T, S>(sys: &mut S, t: T, y: &[T], atol: &[T], rtol: T, hmax: T) -> T
where
    T: Scalar,
    S: OdeSystem<T> + ?Sized,
{
    let n = sys.ny();
    let hmax = if hmax > T::zero() { hmax } else { T::INFINITY };
    let fallback = T::from(FALLBACK_STEP).min(hmax);
    let mut f0 = vec![T::zero(); n];
    if !sys.rhs(t, y, &mut f0).is_success() {
        return fallback;
    }

    let scale = |i: usize| atol[i] + rtol * abs(y[i]);
    let mut dnf = T::zero();
    let mut dny = T::zero();
    for i in 0..n {
        let sk = scale(i);
        dnf += (f0[i] / sk).powi(2);
        dny += (y[i] / sk).powi(2);
    }
    let tiny = T::from(1e-10);
    let mut h = if dnf <= tiny || dny <= tiny {
        T::from(FALLBACK_STEP)
    } else {
        T::from(0.01) * (dny / dnf).sqrt()
    };
    h = h.min(hmax);

    let y1: Vec<T> = y.iter().zip(f0.iter()).map(|(&yi, &fi)| yi + h * fi).collect();
    let mut f1 = vec![T::zero(); n];
    if !sys.rhs(t + h, &y1, &mut f1).is_success() {
        return sanitize(h, fallback);
    }
    let mut der2 = T::zero();
    for i in 0..n {
        der2 += ((f1[i] - f0[i]) / scale(i)).powi(2);
    }
    der2 = der2.sqrt() / h;

    let der12 = der2.max(dnf.sqrt());
    let h1 = if der12 <= T::from(1e-15) {
        T::from(FALLBACK_STEP).max(h * T::from(1e-3))
    } else {
        (T::from(0.01) / der12).powf(T::one() / T::from(ORDER))
    };
    sanitize((T::from(100.0) * h).min(h1).min(hmax), fallback)
}

fn sanitize<T: Scalar>(h: T, fallback: T) -> T {
    if h.is_finite() && h > T::zero() {
        h
    } else {
        fallback
    }
}

/// Largest step keeping an explicit Euler step from `y` along `f` inside the
/// bounds. Either bound slice may be empty, meaning unbounded on that side.
///
/// Returns infinity when no bound constrains the motion.
pub fn bounds_step_limit<T: Scalar>(y: &[T], f: &[T], lower: &[T], upper: &[T]) -> T {
    let mut limit = T::INFINITY;
    for (i, (&yi, &fi)) in y.iter().zip(f.iter()).enumerate() {
        let bound = if fi > T::zero() {
            upper.get(i)
        } else if fi < T::zero() {
            lower.get(i)
        } else {
            None
        };
        if let Some(&b) = bound {
            limit = limit.min(abs((b - yi) / fi));
        }
    }
    limit
}

/// Apply the user factor to a maximum step: zero leaves it unchanged,
/// otherwise it is scaled by the magnitude of the factor.
pub fn scale_dx_max<T: Scalar>(dx_max: T, factor: T) -> T {
    if factor == T::zero() {
        dx_max
    } else {
        dx_max * abs(factor)
    }
}
