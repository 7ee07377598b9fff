use nalgebra::DMatrix;
use num_traits::{One, Zero};

use crate::{matrix::DefaultSolver, OdeSystem, Scalar, Status};

use super::{newton::Newton, Integrator};

/// Backward Euler, solving each step with a modified Newton iteration.
pub struct EulerBackward<T: Scalar, M: DefaultSolver<T> = DMatrix<T>> {
    newton: Newton<T, M>,
    f: Vec<T>,
}

impl<T: Scalar, M: DefaultSolver<T>> Default for EulerBackward<T, M> {
    fn default() -> Self {
        Self {
            newton: Newton::default(),
            f: Vec::new(),
        }
    }
}

impl<T: Scalar, M: DefaultSolver<T>> Integrator<T> for EulerBackward<T, M> {
    fn name(&self) -> &'static str {
        "EulerBackward"
    }

    fn step<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        t: T,
        h: T,
        y: &[T],
        ynew: &mut [T],
    ) -> Status {
        let n = y.len();
        self.f.resize(n, T::zero());
        try_status!(self.newton.setup(sys, t, y, h));
        // explicit Euler guess with the derivative at the new time
        try_status!(sys.rhs(t + h, y, &mut self.f));
        for i in 0..n {
            ynew[i] = y[i] + h * self.f[i];
        }
        self.newton.solve(sys, t + h, y, h, ynew)
    }
}

/// Trapezoidal rule (Crank-Nicolson).
pub struct Trapezoidal<T: Scalar, M: DefaultSolver<T> = DMatrix<T>> {
    newton: Newton<T, M>,
    f: Vec<T>,
    c: Vec<T>,
}

impl<T: Scalar, M: DefaultSolver<T>> Default for Trapezoidal<T, M> {
    fn default() -> Self {
        Self {
            newton: Newton::default(),
            f: Vec::new(),
            c: Vec::new(),
        }
    }
}

impl<T: Scalar, M: DefaultSolver<T>> Integrator<T> for Trapezoidal<T, M> {
    fn name(&self) -> &'static str {
        "Trapezoidal"
    }

    fn step<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        t: T,
        h: T,
        y: &[T],
        ynew: &mut [T],
    ) -> Status {
        let n = y.len();
        let gamma = h / T::from(2.0);
        self.f.resize(n, T::zero());
        self.c.resize(n, T::zero());
        try_status!(self.newton.setup(sys, t, y, gamma));
        try_status!(sys.rhs(t, y, &mut self.f));
        // y_{n+1} = c + h/2 f(t + h, y_{n+1}),  c = y_n + h/2 f(t, y_n)
        for i in 0..n {
            self.c[i] = y[i] + gamma * self.f[i];
            ynew[i] = y[i] + h * self.f[i];
        }
        self.newton.solve(sys, t + h, &self.c, gamma, ynew)
    }
}

/// Variable step BDF2 in fixed-leading-coefficient form. The first step after
/// a reset is taken with the trapezoidal rule.
///
/// With `rho = h_n / h_{n-1}` the step reads
/// `y_{n+1} + alpha1 y_n + alpha2 y_{n-1} = beta0 h_n f(t_{n+1}, y_{n+1})` where
/// `beta0 = (rho + 1) / (2 rho + 1)`, `alpha1 = -(rho + 1)^2 / (2 rho + 1)`
/// and `alpha2 = rho^2 / (2 rho + 1)`.
pub struct Bdf2Fvc<T: Scalar, M: DefaultSolver<T> = DMatrix<T>> {
    newton: Newton<T, M>,
    first_step: Trapezoidal<T, M>,
    /// `(y_{n-1}, h_{n-1})` of the previous step.
    history: Option<(Vec<T>, T)>,
    f: Vec<T>,
    c: Vec<T>,
}

impl<T: Scalar, M: DefaultSolver<T>> Default for Bdf2Fvc<T, M> {
    fn default() -> Self {
        Self {
            newton: Newton::default(),
            first_step: Trapezoidal::default(),
            history: None,
            f: Vec::new(),
            c: Vec::new(),
        }
    }
}

impl<T: Scalar, M: DefaultSolver<T>> Integrator<T> for Bdf2Fvc<T, M> {
    fn name(&self) -> &'static str {
        "Bdf2Fvc"
    }

    fn reset(&mut self) {
        self.history = None;
    }

    fn step<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        t: T,
        h: T,
        y: &[T],
        ynew: &mut [T],
    ) -> Status {
        let Some((y_prev, h_prev)) = self.history.as_ref() else {
            try_status!(self.first_step.step(sys, t, h, y, ynew));
            self.history = Some((y.to_vec(), h));
            return Status::Success;
        };
        let n = y.len();
        let one = T::one();
        let two = T::from(2.0);
        let rho = h / *h_prev;
        let denom = two * rho + one;
        let beta0 = (rho + one) / denom;
        let alpha1 = -(rho + one) * (rho + one) / denom;
        let alpha2 = rho * rho / denom;
        let gamma = beta0 * h;

        self.f.resize(n, T::zero());
        self.c.resize(n, T::zero());
        for i in 0..n {
            self.c[i] = -alpha1 * y[i] - alpha2 * y_prev[i];
        }
        try_status!(self.newton.setup(sys, t, y, gamma));
        try_status!(sys.rhs(t + h, y, &mut self.f));
        for i in 0..n {
            ynew[i] = self.c[i] + gamma * self.f[i];
        }
        try_status!(self.newton.solve(sys, t + h, &self.c, gamma, ynew));
        self.history = Some((y.to_vec(), h));
        Status::Success
    }
}
