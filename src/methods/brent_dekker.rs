//! Brent-Dekker root-finding method.
//!
//! The [Brent-Dekker
//! method](https://en.wikipedia.org/wiki/Brent%27s_method) keeps the
//! guaranteed bracket of bisection while trying inverse quadratic or secant
//! interpolation first, falling back to a bisection step whenever the
//! interpolated step is not clearly profitable. Superlinear on well-behaved
//! functions, never worse than bisection.
//!
//! The step function is kept as one cohesive block mirroring the classical
//! formulation; every quantity that survives between evaluations (a, b, c,
//! their values, and the last two step widths d and e) is an explicit field
//! because control returns to the caller between every pair of evaluations.
//!
//! # References
//!
//! \[1\] Brent, R.P. (1973). Algorithms for Minimization without
//! Derivatives. ISBN 0-13-022335-2

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value};

const INFO: &str = "\
The Brent-Dekker method is a root finding technique that combines the
bisection method's guaranteed bracket with inverse quadratic and secant
interpolation steps for superlinear convergence.

Hyper-parameters:
name    required        type    default         Description
x_0     REQUIRED        real    0               One end of the search region.
x_1     REQUIRED        real    1               Other end of the search region.
eps     optional        real    2.2e-16         Relative machine precision.
t       optional        real    1e-6            Absolute tolerance on the root.

Results:
name    type    Description
root    real    Estimated location of the root.

References:
Brent, R.P. (1973). Algorithms for Minimization without Derivatives.
        ISBN 0-13-022335-2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Initial2,
    Running,
    Done,
    Failed,
}

/// Brent-Dekker root-finder.
///
/// See [module](self) documentation for more details.
pub struct BrentDekker {
    state: State,

    // hyper-parameters
    x_0: f64,
    x_1: f64,
    eps: f64,
    t: f64,

    // b is the current best estimate, a the previous one, c the far end of
    // the bracket; d and e are the last and second-to-last step widths
    a: f64,
    b: f64,
    c: f64,
    f_a: f64,
    f_b: f64,
    f_c: f64,
    d: f64,
    e: f64,

    root: f64,
}

impl BrentDekker {
    /// Creates the method for one-dimensional input.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions != 1 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            state: State::Initial,
            x_0: 0.0,
            x_1: 1.0,
            eps: f64::EPSILON,
            t: 1e-6,
            a: 0.0,
            b: 0.0,
            c: 0.0,
            f_a: 0.0,
            f_b: 0.0,
            f_c: 0.0,
            d: 0.0,
            e: 0.0,
            root: 0.0,
        })
    }

    /// One Brent-Dekker update of the bracket after `f_b` has been refreshed
    /// from the latest evaluation. Either advances `b` (the caller evaluates
    /// f(b) next) or detects convergence and goes terminal.
    fn step(&mut self) {
        // Refresh the far bracket point whenever b and c ended up on the
        // same side of the root.
        if (self.f_b > 0.0 && self.f_c > 0.0) || (self.f_b <= 0.0 && self.f_c <= 0.0) {
            self.c = self.a;
            self.f_c = self.f_a;
            self.d = self.b - self.a;
            self.e = self.d;
        }

        // Keep the smaller value in b: |f(c)| >= |f(b)|.
        if self.f_c.abs() < self.f_b.abs() {
            self.a = self.b;
            self.b = self.c;
            self.c = self.a;
            self.f_a = self.f_b;
            self.f_b = self.f_c;
            self.f_c = self.f_a;
        }

        let tol = 2.0 * self.eps * self.b.abs() + self.t;
        let m = 0.5 * (self.c - self.b);

        if m.abs() <= tol || self.f_b == 0.0 {
            self.root = self.b;
            self.state = State::Done;
            debug!("bracket half-width {} within tolerance {}", m.abs(), tol);
            return;
        }

        if self.e.abs() < tol || self.f_a.abs() <= self.f_b.abs() {
            // Interpolation made too little progress; force bisection.
            self.d = m;
            self.e = m;
        } else {
            let mut p;
            let mut q;
            let mut s = self.f_b / self.f_a;

            if self.a == self.c {
                // Secant (linear) interpolation.
                p = 2.0 * m * s;
                q = 1.0 - s;
            } else {
                // Inverse quadratic interpolation.
                q = self.f_a / self.f_c;
                let r = self.f_b / self.f_c;
                p = s * (2.0 * m * q * (q - r) - (self.b - self.a) * (r - 1.0));
                q = (q - 1.0) * (r - 1.0) * (s - 1.0);
            }

            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }

            s = self.e;
            self.e = self.d;

            // Accept the interpolated step only when it stays well inside
            // the bracket and keeps shrinking faster than every other step.
            if 2.0 * p < 3.0 * m * q - (tol * q).abs() && p < (0.5 * s * q).abs() {
                self.d = p / q;
            } else {
                self.d = m;
                self.e = m;
            }
        }

        self.a = self.b;
        self.f_a = self.f_b;

        // Advance by at least one tolerance unit.
        self.b += if self.d.abs() > tol {
            self.d
        } else if m > 0.0 {
            tol
        } else {
            -tol
        };
    }
}

impl Method for BrentDekker {
    fn name(&self) -> &'static str {
        "brent-dekker"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "x_0" => self.x_0 = value.expect_real(id)?,
            "x_1" => self.x_1 = value.expect_real(id)?,
            "eps" => self.eps = value.expect_real(id)?,
            "t" => self.t = value.expect_real(id)?,
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Real(self.x_0)),
            "x_1" => Ok(Value::Real(self.x_1)),
            "eps" => Ok(Value::Real(self.eps)),
            "t" => Ok(Value::Real(self.t)),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => x[0] = self.x_0,
            State::Initial2 => x[0] = self.b,
            // After bootstrapping, only f(b) is needed per iteration.
            State::Running | State::Done => x[0] = self.b,
            State::Failed => return Err(Error::Failed),
        }
        Ok(())
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.a = x[0];
                self.f_a = fx;
                self.b = self.x_1;
                self.state = State::Initial2;
                Ok(())
            }
            State::Initial2 => {
                self.b = x[0];
                self.f_b = fx;

                if self.f_a * self.f_b > 0.0 {
                    self.state = State::Failed;
                    return Err(Error::InvalidBracket);
                }

                self.c = self.a;
                self.f_c = self.f_a;
                self.d = self.b - self.a;
                self.e = self.d;

                self.state = State::Running;
                self.step();
                Ok(())
            }
            State::Running => {
                self.f_b = fx;
                self.step();
                Ok(())
            }
            State::Done => Err(Error::OutOfSequence),
            State::Failed => Err(Error::Failed),
        }
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Initial | State::Initial2 | State::Running => Ok(Status::InProgress),
            State::Done => Ok(Status::Done),
            State::Failed => Err(Error::Failed),
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        match id {
            "root" if self.state == State::Done => Ok(Value::Real(self.root)),
            "root" => Err(Error::NotFinished),
            _ => Err(Error::UnknownResult(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::DVector;

    use crate::driver::Driver;
    use crate::testing::{cubic, drive};

    fn driver_on_bracket(x_0: f64, x_1: f64) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("brent-dekker", 1).unwrap();
        driver.hparam_set("x_0", x_0).unwrap();
        driver.hparam_set("x_1", x_1).unwrap();
        driver.hparam_set("t", 1e-9).unwrap();
        driver
    }

    #[test]
    fn converges_on_cubic() {
        let mut driver = driver_on_bracket(2.0, 3.0);
        drive(&mut driver, 1, 100, |x| cubic(x[0])).unwrap();

        let root = driver.result("root").unwrap().real().unwrap();
        assert!(cubic(root).abs() < 1e-6);
        assert!(root > 2.0 && root < 3.0);
    }

    #[test]
    fn beats_bisection_on_evaluations() {
        let mut brent = driver_on_bracket(2.0, 3.0);
        let brent_evals = drive(&mut brent, 1, 100, |x| cubic(x[0])).unwrap();

        let mut bisection = Driver::with_builtins();
        bisection.select("bisection", 1).unwrap();
        bisection.hparam_set("lower", 2.0).unwrap();
        bisection.hparam_set("upper", 3.0).unwrap();
        bisection.hparam_set("x_tol", 1e-9).unwrap();
        bisection.hparam_set("f_tol", 1e-9).unwrap();
        let bisection_evals = drive(&mut bisection, 1, 100, |x| cubic(x[0])).unwrap();

        assert!(brent_evals < bisection_evals);
    }

    #[test]
    fn same_sign_bracket_fails_sticky() {
        let mut driver = driver_on_bracket(3.0, 4.0);
        let mut x = DVector::zeros(1);

        driver.next(&mut x).unwrap();
        driver.set_value(&x, cubic(x[0])).unwrap();
        driver.next(&mut x).unwrap();
        assert!(matches!(
            driver.set_value(&x, cubic(x[0])),
            Err(Error::InvalidBracket)
        ));
        assert!(matches!(driver.next(&mut x), Err(Error::Failed)));
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = driver_on_bracket(0.0, 1.0);

        for id in ["x_0", "x_1", "eps", "t"] {
            driver.hparam_set(id, 0.5).unwrap();
            assert_eq!(driver.hparam_get(id).unwrap(), Value::Real(0.5));
        }

        assert!(matches!(
            driver.hparam_get("f_tol"),
            Err(Error::UnknownHparam(_))
        ));
    }
}
