use num_traits::Zero;

use crate::{OdeSystem, Scalar, Status};

use super::Integrator;

/// Classic fourth order Runge-Kutta.
#[derive(Debug, Clone)]
pub struct Rk4<T: Scalar> {
    k: [Vec<T>; 4],
    tmp: Vec<T>,
}

impl<T: Scalar> Default for Rk4<T> {
    fn default() -> Self {
        Self {
            k: Default::default(),
            tmp: Vec::new(),
        }
    }
}

impl<T: Scalar> Integrator<T> for Rk4<T> {
    fn name(&self) -> &'static str {
        "Rk4"
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
        let half = h / T::from(2.0);
        self.tmp.resize(n, T::zero());
        for k in self.k.iter_mut() {
            k.resize(n, T::zero());
        }
        let [k1, k2, k3, k4] = &mut self.k;
        let tmp = &mut self.tmp;

        try_status!(sys.rhs(t, y, k1));
        for i in 0..n {
            tmp[i] = y[i] + half * k1[i];
        }
        try_status!(sys.rhs(t + half, tmp, k2));
        for i in 0..n {
            tmp[i] = y[i] + half * k2[i];
        }
        try_status!(sys.rhs(t + half, tmp, k3));
        for i in 0..n {
            tmp[i] = y[i] + h * k3[i];
        }
        try_status!(sys.rhs(t + h, tmp, k4));
        let sixth = h / T::from(6.0);
        let two = T::from(2.0);
        for i in 0..n {
            ynew[i] = y[i] + sixth * (k1[i] + two * k2[i] + two * k3[i] + k4[i]);
        }
        Status::Success
    }
}

#[derive(Debug, Clone)]
pub struct EulerForward<T: Scalar> {
    f: Vec<T>,
}

impl<T: Scalar> Default for EulerForward<T> {
    fn default() -> Self {
        Self { f: Vec::new() }
    }
}

impl<T: Scalar> Integrator<T> for EulerForward<T> {
    fn name(&self) -> &'static str {
        "EulerForward"
    }

    fn step<S: OdeSystem<T> + ?Sized>(
        &mut self,
        sys: &mut S,
        t: T,
        h: T,
        y: &[T],
        ynew: &mut [T],
    ) -> Status {
        self.f.resize(y.len(), T::zero());
        try_status!(sys.rhs(t, y, &mut self.f));
        for i in 0..y.len() {
            ynew[i] = y[i] + h * self.f[i];
        }
        Status::Success
    }
}

/// Explicit midpoint rule.
#[derive(Debug, Clone)]
pub struct Midpoint<T: Scalar> {
    f: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> Default for Midpoint<T> {
    fn default() -> Self {
        Self {
            f: Vec::new(),
            tmp: Vec::new(),
        }
    }
}

impl<T: Scalar> Integrator<T> for Midpoint<T> {
    fn name(&self) -> &'static str {
        "Midpoint"
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
        let half = h / T::from(2.0);
        self.f.resize(n, T::zero());
        self.tmp.resize(n, T::zero());
        try_status!(sys.rhs(t, y, &mut self.f));
        for i in 0..n {
            self.tmp[i] = y[i] + half * self.f[i];
        }
        try_status!(sys.rhs(t + half, &self.tmp, &mut self.f));
        for i in 0..n {
            ynew[i] = y[i] + h * self.f[i];
        }
        Status::Success
    }
}
