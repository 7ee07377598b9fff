use thiserror::Error;

/// Custom error type for odesys
///
/// Evaluation calls report failures through [crate::Status]; this type covers
/// everything else: building an adapter, driving it with one of the bundled
/// integrators, and the linear solves those integrators perform.
#[derive(thiserror::Error, Debug)]
pub enum OdeSysError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Integrator error: {0}")]
    IntegratorError(#[from] IntegratorError),
    #[error("Linear solver error: {0}")]
    LinearSolverError(#[from] LinearSolverError),
    #[error("Other error: {0}")]
    Other(String),
}

/// Possible errors when validating the construction data of an adapter
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("System must have at least one state")]
    NoStates,
    #[error("Expected {expected} parameters, got {got}")]
    ParameterLengthMismatch { expected: usize, got: usize },
    #[error("atol must have length 1 or {expected}, got {got}")]
    AtolLengthMismatch { expected: usize, got: usize },
    #[error("atol entries must be positive and finite, got {value} at index {index}")]
    InvalidAtol { index: usize, value: f64 },
    #[error("{which} bounds must have length 0 or {expected}, got {got}")]
    BoundsLengthMismatch {
        which: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{which} bound for state {index} is NaN")]
    NanBound { which: &'static str, index: usize },
    #[error("Lower bound {lower} exceeds upper bound {upper} for state {index}")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },
    #[error("Invariant baseline must have length {expected}, got {got}")]
    InvariantBaselineLengthMismatch { expected: usize, got: usize },
    #[error("Invariant checking is enabled but no invariant baseline was given")]
    MissingInvariantBaseline,
    #[error("Initial state must have length {expected}, got {got}")]
    InitialStateLengthMismatch { expected: usize, got: usize },
    #[error("rtol must be positive and finite, got {0}")]
    InvalidRtol(f64),
    #[error("max_invariant_violation must be non-negative, got {0}")]
    InvalidMaxInvariantViolation(f64),
    #[error("Other error: {0}")]
    Other(String),
}

/// Possible errors when integrating a system with one of the bundled integrators
#[derive(Error, Debug, PartialEq)]
pub enum IntegratorError {
    #[error("Unrecoverable failure in {what} at time = {time}")]
    Unrecoverable { what: &'static str, time: f64 },
    #[error("Recoverable failure in {what} persisted after {retries} step halvings at time = {time}")]
    RetriesExhausted {
        what: &'static str,
        time: f64,
        retries: usize,
    },
    #[error("Output times must contain at least one point and be strictly monotonic")]
    InvalidOutputTimes,
    #[error("Step size must be positive and finite, got {0}")]
    InvalidStepSize(f64),
    #[error("Integrating requires {required} steps, more than the limit of {max}")]
    TooManySteps { required: f64, max: usize },
    #[error("Initial state must have length {expected}, got {got}")]
    InitialStateLengthMismatch { expected: usize, got: usize },
    #[error("Other error: {0}")]
    Other(String),
}

/// Possible errors that can occur when solving a linear problem
#[derive(Error, Debug, PartialEq)]
pub enum LinearSolverError {
    #[error("LU not initialized")]
    LuNotInitialized,
    #[error("LU solve failed")]
    LuSolveFailed,
    #[error("Matrix must be square, got {nrows}x{ncols}")]
    NotSquare { nrows: usize, ncols: usize },
    #[error("Other error: {0}")]
    Other(String),
}

#[macro_export]
macro_rules! config_error {
    ($variant:ident) => {
        OdeSysError::from(ConfigError::$variant)
    };
    ($variant:ident { $($field:tt)* }) => {
        OdeSysError::from(ConfigError::$variant { $($field)* })
    };
    ($variant:ident, $($arg:tt)*) => {
        OdeSysError::from(ConfigError::$variant($($arg)*))
    };
}

#[macro_export]
macro_rules! integrator_error {
    ($variant:ident) => {
        OdeSysError::from(IntegratorError::$variant)
    };
    ($variant:ident { $($field:tt)* }) => {
        OdeSysError::from(IntegratorError::$variant { $($field)* })
    };
    ($variant:ident, $($arg:tt)*) => {
        OdeSysError::from(IntegratorError::$variant($($arg)*))
    };
}

#[macro_export]
macro_rules! linear_solver_error {
    ($variant:ident) => {
        OdeSysError::from(LinearSolverError::$variant)
    };
    ($variant:ident { $($field:tt)* }) => {
        OdeSysError::from(LinearSolverError::$variant { $($field)* })
    };
    ($variant:ident, $($arg:tt)*) => {
        OdeSysError::from(LinearSolverError::$variant($($arg)*))
    };
}

#[macro_export]
macro_rules! other_error {
    ($msg:expr) => {
        OdeSysError::Other($msg.to_string())
    };
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, IntegratorError, OdeSysError};

    #[test]
    fn test_macros() {
        let err = config_error!(AtolLengthMismatch { expected: 3, got: 2 });
        assert_eq!(
            err.to_string(),
            "Configuration error: atol must have length 1 or 3, got 2"
        );
        let err = integrator_error!(InvalidOutputTimes);
        assert!(matches!(
            err,
            OdeSysError::IntegratorError(IntegratorError::InvalidOutputTimes)
        ));
        let err = other_error!("boom");
        assert_eq!(err.to_string(), "Other error: boom");
    }
}
