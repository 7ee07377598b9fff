use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    code::GeneratedCode,
    config_error,
    error::{ConfigError, OdeSysError},
    Scalar,
};

use super::{dense::DenseAdapter, iterative::IterativeAdapter};

/// Construction data of an adapter.
///
/// Every field has a default, so a partial document deserializes into a
/// complete set of options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    pub p: Vec<f64>,
    pub rtol: f64,
    /// One entry per state, or a single entry used for all states.
    pub atol: Vec<f64>,
    pub dx_max_factor: f64,
    pub error_outside_bounds: bool,
    pub max_invariant_violation: f64,
    pub special_settings: Vec<f64>,
    /// Empty for no upper bounds.
    pub upper_bounds: Vec<f64>,
    /// Empty for no lower bounds.
    pub lower_bounds: Vec<f64>,
    pub invar0: Vec<f64>,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            p: vec![],
            rtol: 1e-6,
            atol: vec![1e-6],
            dx_max_factor: 1.0,
            error_outside_bounds: false,
            max_invariant_violation: 0.0,
            special_settings: vec![],
            upper_bounds: vec![],
            lower_bounds: vec![],
            invar0: vec![],
        }
    }
}

impl AdapterOptions {
    pub(crate) fn rtol<T: Scalar>(&self) -> Result<T, OdeSysError> {
        if self.rtol.is_finite() && self.rtol > 0.0 {
            Ok(T::from(self.rtol))
        } else {
            Err(config_error!(InvalidRtol, self.rtol))
        }
    }

    pub(crate) fn p<T: Scalar>(&self, np: usize) -> Result<Vec<T>, OdeSysError> {
        if self.p.len() != np {
            return Err(config_error!(ParameterLengthMismatch {
                expected: np,
                got: self.p.len()
            }));
        }
        Ok(self.p.iter().map(|&x| T::from(x)).collect())
    }

    pub(crate) fn atol<T: Scalar>(&self, ny: usize) -> Result<Vec<T>, OdeSysError> {
        let invalid = self
            .atol
            .iter()
            .position(|&x| !(x.is_finite() && x > 0.0));
        if let Some(index) = invalid {
            return Err(config_error!(InvalidAtol {
                index,
                value: self.atol[index]
            }));
        }
        match self.atol.len() {
            1 => Ok(vec![T::from(self.atol[0]); ny]),
            n if n == ny => Ok(self.atol.iter().map(|&x| T::from(x)).collect()),
            got => Err(config_error!(AtolLengthMismatch { expected: ny, got })),
        }
    }

    /// Returns `(lower, upper)`, each empty or of length `ny`.
    pub(crate) fn bounds<T: Scalar>(&self, ny: usize) -> Result<(Vec<T>, Vec<T>), OdeSysError> {
        for (which, bounds) in [("lower", &self.lower_bounds), ("upper", &self.upper_bounds)] {
            if !bounds.is_empty() && bounds.len() != ny {
                return Err(config_error!(BoundsLengthMismatch {
                    which,
                    expected: ny,
                    got: bounds.len()
                }));
            }
            if let Some(index) = bounds.iter().position(|x| x.is_nan()) {
                return Err(config_error!(NanBound { which, index }));
            }
        }
        if !self.lower_bounds.is_empty() && !self.upper_bounds.is_empty() {
            let inverted = self
                .lower_bounds
                .iter()
                .zip(self.upper_bounds.iter())
                .position(|(lower, upper)| lower > upper);
            if let Some(index) = inverted {
                return Err(config_error!(InvertedBounds {
                    index,
                    lower: self.lower_bounds[index],
                    upper: self.upper_bounds[index]
                }));
            }
        }
        let convert = |v: &[f64]| v.iter().map(|&x| T::from(x)).collect::<Vec<T>>();
        Ok((convert(&self.lower_bounds), convert(&self.upper_bounds)))
    }

    pub(crate) fn max_invariant_violation<T: Scalar>(&self) -> Result<T, OdeSysError> {
        if self.max_invariant_violation >= 0.0 {
            Ok(T::from(self.max_invariant_violation))
        } else {
            Err(config_error!(
                InvalidMaxInvariantViolation,
                self.max_invariant_violation
            ))
        }
    }
}

/// Builder for adapters. Use methods to set the construction data and then
/// call one of the build methods when done.
///
/// # Example
///
/// ```rust
/// use odesys::{code::closure::Closure, AdapterBuilder, DenseSystem, OdeSystem, Status};
///
/// // dy/dt = -k y, kept inside [0, 1]
/// let code = Closure::<f64, _, _>::new(
///     |params, _t, y, f| f[0] = -params.p[0] * y[0],
///     |params, _t, _y, jac| jac.set(0, 0, -params.p[0]),
///     1,
///     1,
/// );
/// let mut sys = AdapterBuilder::new()
///     .p([2.0])
///     .rtol(1e-8)
///     .lower_bounds([0.0])
///     .upper_bounds([1.0])
///     .error_outside_bounds(true)
///     .build_dense(code)
///     .unwrap();
///
/// let mut f = [0.0];
/// assert_eq!(sys.rhs(0.0, &[0.5], &mut f), Status::Success);
/// assert_eq!(sys.rhs(0.0, &[1.5], &mut f), Status::UnrecoverableError);
/// // time to reach the lower bound along f = -1
/// assert_eq!(sys.dx_max(0.0, &[0.5]), 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AdapterBuilder {
    options: AdapterOptions,
    invariant_state: Option<(f64, Vec<f64>)>,
}

impl AdapterBuilder {
    /// Create a new builder with default options:
    /// - rtol = 1e-6
    /// - atol = [1e-6]
    /// - dx_max_factor = 1.0
    /// - no bounds, error_outside_bounds = false
    /// - max_invariant_violation = 0.0 (invariant checking off)
    /// - p = [], special_settings = []
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: AdapterOptions) -> Self {
        Self {
            options,
            invariant_state: None,
        }
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Set the parameters.
    pub fn p<V, T>(mut self, p: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.options.p = p.into_iter().map(|x| f64::from(x)).collect();
        self
    }

    /// Set the relative tolerance.
    pub fn rtol(mut self, rtol: f64) -> Self {
        self.options.rtol = rtol;
        self
    }

    /// Set the absolute tolerance.
    pub fn atol<V, T>(mut self, atol: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.options.atol = atol.into_iter().map(|x| f64::from(x)).collect();
        self
    }

    /// Set the factor applied to the maximum step hint. Zero leaves the hint unscaled.
    pub fn dx_max_factor(mut self, dx_max_factor: f64) -> Self {
        self.options.dx_max_factor = dx_max_factor;
        self
    }

    pub fn error_outside_bounds(mut self, error_outside_bounds: bool) -> Self {
        self.options.error_outside_bounds = error_outside_bounds;
        self
    }

    pub fn upper_bounds<V, T>(mut self, upper_bounds: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.options.upper_bounds = upper_bounds.into_iter().map(|x| f64::from(x)).collect();
        self
    }

    pub fn lower_bounds<V, T>(mut self, lower_bounds: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.options.lower_bounds = lower_bounds.into_iter().map(|x| f64::from(x)).collect();
        self
    }

    /// Set the maximum drift of any invariant from its baseline. A positive
    /// value turns invariant checking on for systems that declare invariants.
    pub fn max_invariant_violation(mut self, max_invariant_violation: f64) -> Self {
        self.options.max_invariant_violation = max_invariant_violation;
        self
    }

    /// Set the invariant baseline explicitly.
    pub fn invar0<V, T>(mut self, invar0: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.options.invar0 = invar0.into_iter().map(|x| f64::from(x)).collect();
        self
    }

    /// Compute the invariant baseline from the initial state at build time.
    /// Takes precedence over [Self::invar0].
    pub fn invariant_baseline_from<V, T>(mut self, t0: f64, y0: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.invariant_state = Some((t0, y0.into_iter().map(|x| f64::from(x)).collect()));
        self
    }

    pub fn special_settings<V, T>(mut self, special_settings: V) -> Self
    where
        V: IntoIterator<Item = T>,
        f64: From<T>,
    {
        self.options.special_settings = special_settings.into_iter().map(|x| f64::from(x)).collect();
        self
    }

    /// Build a dense-mode adapter around `code`.
    pub fn build_dense<T, G>(self, code: G) -> Result<DenseAdapter<T, G>, OdeSysError>
    where
        T: Scalar,
        G: GeneratedCode<T>,
    {
        debug!(
            "building dense adapter: ny = {}, nroots = {}, np = {}",
            code.ny(),
            code.nroots(),
            self.options.p.len()
        );
        let invariant_state = self
            .invariant_state
            .as_ref()
            .map(|(t0, y0)| (T::from(*t0), y0.iter().map(|&y| T::from(y)).collect::<Vec<T>>()));
        DenseAdapter::with_invariant_state(
            code,
            &self.options,
            invariant_state.as_ref().map(|(t0, y0)| (*t0, y0.as_slice())),
        )
    }

    /// Build an iterative-mode adapter around `code`. Bounds, invariant and
    /// `dx_max_factor` settings do not apply to this adapter and are ignored.
    pub fn build_iterative<T, G>(self, code: G) -> Result<IterativeAdapter<T, G>, OdeSysError>
    where
        T: Scalar,
        G: GeneratedCode<T>,
    {
        debug!(
            "building iterative adapter: ny = {}, np = {}",
            code.ny(),
            self.options.p.len()
        );
        IterativeAdapter::new(code, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::{AdapterBuilder, AdapterOptions};
    use crate::{
        error::{ConfigError, OdeSysError},
        test_models::exponential_decay::ExponentialDecay,
        test_models::harmonic_oscillator::HarmonicOscillator,
        test_models::robertson::Robertson,
    };

    fn config_error(err: OdeSysError) -> ConfigError {
        match err {
            OdeSysError::ConfigError(err) => err,
            err => panic!("expected a configuration error, got {}", err),
        }
    }

    #[test]
    fn test_defaults() {
        let options = AdapterOptions::default();
        assert_eq!(options.rtol, 1e-6);
        assert_eq!(options.atol, vec![1e-6]);
        assert_eq!(options.dx_max_factor, 1.0);
        assert!(!options.error_outside_bounds);
        assert_eq!(options.max_invariant_violation, 0.0);
        assert_eq!(AdapterBuilder::new().options(), &options);
    }

    #[test]
    fn test_options_partial_deserialize() {
        let options: AdapterOptions =
            serde_json::from_str(r#"{"p": [1.0, 2.0], "error_outside_bounds": true}"#).unwrap();
        assert_eq!(options.p, vec![1.0, 2.0]);
        assert!(options.error_outside_bounds);
        assert_eq!(options.rtol, 1e-6);
    }

    #[test]
    fn test_atol_broadcast_and_mismatch() {
        let sys = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .atol([1e-8])
            .build_dense::<f64, _>(Robertson)
            .unwrap();
        assert_eq!(sys.atol(), &[1e-8, 1e-8, 1e-8]);

        let err = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .atol([1e-8, 1e-8])
            .build_dense::<f64, _>(Robertson)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::AtolLengthMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn test_parameter_length() {
        let err = AdapterBuilder::new()
            .build_dense::<f64, _>(Robertson)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::ParameterLengthMismatch {
                expected: 3,
                got: 0
            }
        );

        let err = AdapterBuilder::new()
            .p([0.1, 0.2])
            .build_iterative::<f64, _>(ExponentialDecay)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::ParameterLengthMismatch {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn test_atol_entries_positive() {
        for atol in [0.0, -1e-8, f64::NAN, f64::INFINITY] {
            let err = AdapterBuilder::new()
                .p([0.04, 1.0e4, 3.0e7])
                .atol([1e-8, atol, 1e-8])
                .build_dense::<f64, _>(Robertson)
                .unwrap_err();
            assert!(matches!(
                config_error(err),
                ConfigError::InvalidAtol { index: 1, .. }
            ));
        }
    }

    #[test]
    fn test_bounds_validation() {
        let err = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .upper_bounds([1.0, 1.0])
            .build_dense::<f64, _>(Robertson)
            .unwrap_err();
        assert!(matches!(
            config_error(err),
            ConfigError::BoundsLengthMismatch { which: "upper", .. }
        ));

        let err = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .lower_bounds([0.0, 2.0, 0.0])
            .upper_bounds([1.0, 1.0, 1.0])
            .build_dense::<f64, _>(Robertson)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::InvertedBounds {
                index: 1,
                lower: 2.0,
                upper: 1.0
            }
        );

        let err = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .lower_bounds([f64::NAN, 0.0, 0.0])
            .build_dense::<f64, _>(Robertson)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::NanBound {
                which: "lower",
                index: 0
            }
        );
    }

    #[test]
    fn test_scalar_validation() {
        let err = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .rtol(0.0)
            .build_iterative::<f64, _>(Robertson)
            .unwrap_err();
        assert_eq!(config_error(err), ConfigError::InvalidRtol(0.0));

        let err = AdapterBuilder::new()
            .p([0.04, 1.0e4, 3.0e7])
            .max_invariant_violation(-1.0)
            .build_dense::<f64, _>(Robertson)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::InvalidMaxInvariantViolation(-1.0)
        );
    }

    #[test]
    fn test_invariant_baseline() {
        let err = AdapterBuilder::new()
            .p([1.0])
            .max_invariant_violation(1e-3)
            .build_dense::<f64, _>(HarmonicOscillator)
            .unwrap_err();
        assert_eq!(config_error(err), ConfigError::MissingInvariantBaseline);

        let err = AdapterBuilder::new()
            .p([1.0])
            .invar0([1.0, 2.0])
            .build_dense::<f64, _>(HarmonicOscillator)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::InvariantBaselineLengthMismatch {
                expected: 1,
                got: 2
            }
        );

        let sys = AdapterBuilder::new()
            .p([4.0])
            .max_invariant_violation(1e-3)
            .invariant_baseline_from(0.0, [1.0, 0.0])
            .build_dense::<f64, _>(HarmonicOscillator)
            .unwrap();
        // energy = (k x^2 + v^2) / 2
        assert_eq!(sys.invar0(), &[2.0]);
        assert!(sys.invariant_checking_enabled());

        let err = AdapterBuilder::new()
            .p([4.0])
            .invariant_baseline_from(0.0, [1.0])
            .build_dense::<f64, _>(HarmonicOscillator)
            .unwrap_err();
        assert_eq!(
            config_error(err),
            ConfigError::InitialStateLengthMismatch {
                expected: 2,
                got: 1
            }
        );
    }
}
