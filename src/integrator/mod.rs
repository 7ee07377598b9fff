//! Fixed-step integrators driving an [OdeSystem] through its evaluation contract.
//!
//! These exist to demonstrate and exercise the adapters: they honour the
//! status codes (a recoverable failure halves the failing step, an
//! unrecoverable one aborts) but use no error control and are not meant for
//! production use.

use log::debug;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{
    error::{IntegratorError, OdeSysError},
    integrator_error, OdeSystem, Scalar, Statistics, Status,
};

/// Return early from a function yielding [Status] unless `$status` is a success.
macro_rules! try_status {
    ($status:expr) => {
        let status = $status;
        if !status.is_success() {
            return status;
        }
    };
}

pub mod explicit;
pub mod implicit;
pub mod newton;
pub mod result;

pub use result::OdeResult;

/// Maximum number of times a step is halved after recoverable failures.
pub const MAX_STEP_HALVINGS: usize = 10;

/// Maximum number of steps [Integrator::integrate_adaptive] will take.
pub const MAX_STEPS: usize = 10_000_000;

/// Counters of one integration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationInfo {
    /// Accepted steps, including the sub-steps of halved steps.
    pub nsteps: usize,
    /// Steps that were halved after a recoverable failure.
    pub nretries: usize,
    /// Evaluation counters of the system when the integration finished.
    pub statistics: Statistics,
}

pub trait Integrator<T: Scalar> {
    fn name(&self) -> &'static str;

    /// Take one step of size `h` from `(t, y)`, writing the new state to `ynew`.
    ///
    /// Consecutive calls continue from the end of the previous successful
    /// step; [Self::reset] must be called before starting elsewhere.
    fn step<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        t: T,
        h: T,
        y: &[T],
        ynew: &mut [T],
    ) -> Status;

    /// Forget any step history.
    fn reset(&mut self) {}

    /// Integrate from `y0` at `xout[0]`, reporting the state at every point of `xout`.
    fn integrate_predefined<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        y0: &[T],
        xout: &[T],
    ) -> Result<OdeResult<T>, OdeSysError>
    where
        Self: Sized,
    {
        check_initial_state(sys, y0)?;
        check_output_times(xout)?;
        self.reset();
        let mut info = IntegrationInfo::default();
        let mut yout = Vec::with_capacity(xout.len());
        yout.push(y0.to_vec());
        for window in xout.windows(2) {
            let (x_old, x) = (window[0], window[1]);
            let mut ynew = vec![T::zero(); y0.len()];
            advance(self, sys, x_old, x - x_old, &yout[yout.len() - 1], &mut ynew, 0, &mut info)?;
            yout.push(ynew);
        }
        info.statistics = sys.statistics();
        Ok(OdeResult::new(xout.to_vec(), yout, info))
    }

    /// Integrate from `y0` at `x0` to `xend` with a constant step, `dx0` when
    /// given and the system's initial step hint otherwise. The last step is
    /// shortened to end exactly at `xend`.
    fn integrate_adaptive<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        y0: &[T],
        x0: T,
        xend: T,
        dx0: Option<T>,
    ) -> Result<OdeResult<T>, OdeSysError>
    where
        Self: Sized,
    {
        check_initial_state(sys, y0)?;
        if !(x0.is_finite() && xend.is_finite() && xend >= x0) {
            return Err(integrator_error!(InvalidOutputTimes));
        }
        let h = match dx0 {
            Some(h) => h,
            None => sys.dx0(x0, y0),
        };
        if !(h.is_finite() && h > T::zero()) {
            return Err(integrator_error!(InvalidStepSize, h.as_f64()));
        }
        let required = ((xend - x0) / h).as_f64().ceil();
        if !(required <= MAX_STEPS as f64) {
            return Err(integrator_error!(TooManySteps {
                required,
                max: MAX_STEPS
            }));
        }
        let nsteps = required as usize;
        debug!(
            "{}: integrating from {} to {} in {} steps of {}",
            self.name(),
            x0,
            xend,
            nsteps,
            h
        );
        self.reset();
        let mut info = IntegrationInfo::default();
        let mut xout = Vec::with_capacity(nsteps + 1);
        let mut yout = Vec::with_capacity(nsteps + 1);
        xout.push(x0);
        yout.push(y0.to_vec());
        for i in 1..=nsteps {
            let x_old = xout[i - 1];
            let x = if i == nsteps {
                xend
            } else {
                x0 + h * T::from(i as f64)
            };
            let mut ynew = vec![T::zero(); y0.len()];
            advance(self, sys, x_old, x - x_old, &yout[i - 1], &mut ynew, 0, &mut info)?;
            xout.push(x);
            yout.push(ynew);
        }
        info.statistics = sys.statistics();
        Ok(OdeResult::new(xout, yout, info))
    }
}

/// Step from `t` to `t + h`, halving the step on recoverable failures.
#[allow(clippy::too_many_arguments)]
fn advance<T, I, S>(
    integrator: &mut I,
    sys: &mut S,
    t: T,
    h: T,
    y: &[T],
    ynew: &mut [T],
    depth: usize,
    info: &mut IntegrationInfo,
) -> Result<(), OdeSysError>
where
    T: Scalar,
    I: Integrator<T>,
    S: OdeSystem<T> + ?Sized,
{
    match integrator.step(sys, t, h, y, ynew) {
        Status::Success => {
            info.nsteps += 1;
            Ok(())
        }
        Status::UnrecoverableError => Err(integrator_error!(Unrecoverable {
            what: integrator.name(),
            time: t.as_f64()
        })),
        Status::RecoverableError => {
            if depth >= MAX_STEP_HALVINGS {
                return Err(integrator_error!(RetriesExhausted {
                    what: integrator.name(),
                    time: t.as_f64(),
                    retries: depth
                }));
            }
            info.nretries += 1;
            debug!(
                "{}: recoverable failure at t = {} with h = {}, halving the step",
                integrator.name(),
                t,
                h
            );
            let half = h / T::from(2.0);
            let mut ymid = vec![T::zero(); y.len()];
            advance(integrator, sys, t, half, y, &mut ymid, depth + 1, info)?;
            advance(integrator, sys, t + half, h - half, &ymid, ynew, depth + 1, info)
        }
    }
}

fn check_initial_state<T, S>(sys: &S, y0: &[T]) -> Result<(), OdeSysError>
where
    T: Scalar,
    S: OdeSystem<T> + ?Sized,
{
    if y0.len() != sys.ny() {
        return Err(integrator_error!(InitialStateLengthMismatch {
            expected: sys.ny(),
            got: y0.len()
        }));
    }
    Ok(())
}

/// At least one point, all finite and strictly monotonic in one direction.
fn check_output_times<T: Scalar>(xout: &[T]) -> Result<(), OdeSysError> {
    if xout.is_empty() || xout.iter().any(|x| !x.is_finite()) {
        return Err(integrator_error!(InvalidOutputTimes));
    }
    let increasing = xout.windows(2).all(|w| w[1] > w[0]);
    let decreasing = xout.windows(2).all(|w| w[1] < w[0]);
    if !(increasing || decreasing) {
        return Err(integrator_error!(InvalidOutputTimes));
    }
    Ok(())
}
