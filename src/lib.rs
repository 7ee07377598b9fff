//! Adapters between generated ODE code and external solvers.
//!
//! A concrete system implements [code::GeneratedCode]: its right-hand side,
//! dense Jacobian and optionally root functions, invariants and step hints.
//! An [AdapterBuilder] wraps it in one of two adapters:
//!
//! * [DenseAdapter] for direct solvers: dense Jacobians in column-major and
//!   row-major layout, root functions, step size hints, bounds and invariant
//!   checks on every right-hand side evaluation.
//! * [IterativeAdapter] for Krylov solvers: Jacobian-vector products and a
//!   dense LU preconditioner.
//!
//! Every evaluation reports a [Status] instead of panicking, so a solver can
//! retry with a shorter step after a recoverable failure and abort on an
//! unrecoverable one. The integrators in [integrator] exercise the adapters.
//!
//! ```
//! use odesys::{
//!     code::closure::Closure, integrator::explicit::Rk4, AdapterBuilder, Integrator,
//! };
//!
//! // dy/dt = -k y
//! let code = Closure::<f64, _, _>::new(
//!     |params, _t, y, f| f[0] = -params.p[0] * y[0],
//!     |params, _t, _y, jac| jac.set(0, 0, -params.p[0]),
//!     1,
//!     1,
//! );
//! let mut sys = AdapterBuilder::new().p([0.5]).build_dense(code).unwrap();
//! let xout: Vec<f64> = (0..=20).map(|i| i as f64 * 0.1).collect();
//! let result = Rk4::default()
//!     .integrate_predefined(&mut sys, &[1.0], &xout)
//!     .unwrap();
//! let (t, y) = result.last().unwrap();
//! assert!((y[0] - (-0.5 * t).exp()).abs() < 1e-6);
//! ```

pub mod code;
pub mod error;
pub mod integrator;
pub mod jacobian;
pub mod linear_solver;
pub mod matrix;
pub mod scalar;
pub mod status;
pub mod system;
pub mod test_models;

pub use error::OdeSysError;
pub use integrator::{
    explicit::{EulerForward, Midpoint, Rk4},
    implicit::{Bdf2Fvc, EulerBackward, Trapezoidal},
    Integrator, OdeResult,
};
#[cfg(feature = "faer")]
pub use linear_solver::FaerLU;
pub use linear_solver::LinearSolver;
#[cfg(feature = "nalgebra")]
pub use linear_solver::NalgebraLU;
pub use matrix::{DefaultSolver, DenseMatrix};
pub use scalar::{IndexType, Scalar};
pub use status::Status;
pub use system::{
    builder::{AdapterBuilder, AdapterOptions},
    dense::DenseAdapter,
    iterative::IterativeAdapter,
    DenseSystem, IterativeSystem, OdeSystem, Statistics,
};
