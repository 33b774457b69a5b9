//! Brent's local minimum search.
//!
//! Brent's derivative-free minimizer of a univariate function over an
//! interval, combining golden-section steps with parabolic interpolation
//! through the three best points seen so far. The parabolic step is taken
//! only when it falls inside the interval and keeps shrinking faster than
//! the step before last; otherwise the method falls back to golden section.
//!
//! The per-call step is kept as one cohesive block mirroring the classical
//! formulation; every quantity that survives between evaluations (the
//! interval \[a, b\], the three retained points x, w, v with their values,
//! the last two step widths, and the pending probe u) is an explicit field
//! because control returns to the caller between evaluations.
//!
//! # References
//!
//! \[1\] Brent, R.P. (1973). Algorithms for Minimization without
//! Derivatives. ISBN 0-13-022335-2

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value};

const INFO: &str = "\
Brent's local minimum search combines golden-section steps with parabolic
interpolation to find a local minimum of a univariate function inside an
interval, without derivatives.

Hyper-parameters:
name    required        type    default         Description
x_0     REQUIRED        real    0               One end of the search interval.
x_1     REQUIRED        real    1               Other end of the search interval.
eps     optional        real    1.49e-8         Relative tolerance (sqrt of machine epsilon).
t       optional        real    1e-6            Absolute tolerance on the minimum location.

Results:
name            type    Description
minimum x       real    Location of the local minimum.
minimum f       real    Objective value at the minimum.

References:
Brent, R.P. (1973). Algorithms for Minimization without Derivatives.
        ISBN 0-13-022335-2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Running,
    Done,
}

/// Brent's local minimum search.
///
/// See [module](self) documentation for more details.
pub struct BrentLocalmin {
    state: State,

    // hyper-parameters
    x_0: f64,
    x_1: f64,
    eps: f64,
    t: f64,

    // interval and the three best points: x is the best, w the second best,
    // v the previous w
    a: f64,
    b: f64,
    x: f64,
    w: f64,
    v: f64,
    fx: f64,
    fw: f64,
    fv: f64,

    // last and second-to-last step widths
    d: f64,
    e: f64,

    // pending probe returned by `next`
    u: f64,
}

impl BrentLocalmin {
    /// Creates the method for one-dimensional input.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions != 1 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            state: State::Initial,
            x_0: 0.0,
            x_1: 1.0,
            eps: f64::EPSILON.sqrt(),
            t: 1e-6,
            a: 0.0,
            b: 0.0,
            x: 0.0,
            w: 0.0,
            v: 0.0,
            fx: 0.0,
            fw: 0.0,
            fv: 0.0,
            d: 0.0,
            e: 0.0,
            u: 0.0,
        })
    }

    fn golden() -> f64 {
        (3.0 - 5f64.sqrt()) / 2.0
    }

    /// Chooses the next probe u from the current interval and retained
    /// points, by parabolic interpolation when trustworthy and golden
    /// section otherwise. Runs after every accepted evaluation.
    fn compute_probe(&mut self) {
        let m = 0.5 * (self.a + self.b);
        let tol = self.eps * self.x.abs() + self.t;
        let t2 = 2.0 * tol;

        let mut p = 0.0;
        let mut q = 0.0;
        let mut r = 0.0;

        if self.e.abs() > tol {
            // Fit a parabola through (v, fv), (w, fw), (x, fx).
            r = (self.x - self.w) * (self.fx - self.fv);
            q = (self.x - self.v) * (self.fx - self.fw);
            p = (self.x - self.v) * q - (self.x - self.w) * r;
            q = 2.0 * (q - r);

            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }

            r = self.e;
            self.e = self.d;
        }

        if p.abs() < (0.5 * q * r).abs() && p > q * (self.a - self.x) && p < q * (self.b - self.x)
        {
            // Parabolic interpolation step.
            self.d = p / q;
            let u = self.x + self.d;

            // The probe must not land too close to either interval end.
            if u - self.a < t2 || self.b - u < t2 {
                self.d = if self.x < m { tol } else { -tol };
            }
        } else {
            // Golden section step into the larger half.
            self.e = if self.x < m { self.b } else { self.a } - self.x;
            self.d = Self::golden() * self.e;
        }

        // The probe must not land too close to x itself.
        self.u = self.x
            + if self.d.abs() >= tol {
                self.d
            } else if self.d > 0.0 {
                tol
            } else {
                -tol
            };
    }
}

impl Method for BrentLocalmin {
    fn name(&self) -> &'static str {
        "brents-localmin"
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
            State::Initial => {
                self.a = self.x_0.min(self.x_1);
                self.b = self.x_0.max(self.x_1);
                self.u = self.a + Self::golden() * (self.b - self.a);
                x[0] = self.u;
            }
            State::Running => x[0] = self.u,
            State::Done => return Err(Error::OutOfSequence),
        }
        Ok(())
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.x = x[0];
                self.w = x[0];
                self.v = x[0];
                self.fx = fx;
                self.fw = fx;
                self.fv = fx;
                self.d = 0.0;
                self.e = 0.0;

                self.compute_probe();
                self.state = State::Running;
                Ok(())
            }
            State::Running => {
                let u = x[0];
                let fu = fx;

                // Update the interval and the three retained points.
                if fu <= self.fx {
                    if u < self.x {
                        self.b = self.x;
                    } else {
                        self.a = self.x;
                    }
                    self.v = self.w;
                    self.fv = self.fw;
                    self.w = self.x;
                    self.fw = self.fx;
                    self.x = u;
                    self.fx = fu;
                    debug!("new best f({}) = {}", u, fu);
                } else {
                    if u < self.x {
                        self.a = u;
                    } else {
                        self.b = u;
                    }
                    if fu <= self.fw || self.w == self.x {
                        self.v = self.w;
                        self.fv = self.fw;
                        self.w = u;
                        self.fw = fu;
                    } else {
                        self.v = u;
                        self.fv = fu;
                    }
                }

                self.compute_probe();
                Ok(())
            }
            State::Done => Err(Error::OutOfSequence),
        }
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Initial => Ok(Status::InProgress),
            State::Done => Ok(Status::Done),
            State::Running => {
                let m = 0.5 * (self.a + self.b);
                let tol = self.eps * self.x.abs() + self.t;

                if (self.x - m).abs() <= 2.0 * tol - 0.5 * (self.b - self.a) {
                    self.state = State::Done;
                    Ok(Status::Done)
                } else {
                    Ok(Status::InProgress)
                }
            }
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        if self.state != State::Done {
            return match id {
                "minimum x" | "minimum f" => Err(Error::NotFinished),
                _ => Err(Error::UnknownResult(id.to_string())),
            };
        }

        match id {
            "minimum x" => Ok(Value::Real(self.x)),
            "minimum f" => Ok(Value::Real(self.fx)),
            _ => Err(Error::UnknownResult(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    use crate::driver::Driver;
    use crate::testing::drive;

    fn driver_on_interval(x_0: f64, x_1: f64) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("brents-localmin", 1).unwrap();
        driver.hparam_set("x_0", x_0).unwrap();
        driver.hparam_set("x_1", x_1).unwrap();
        driver
    }

    #[test]
    fn finds_parabola_minimum() {
        let mut driver = driver_on_interval(-4.0, 2.0);
        drive(&mut driver, 1, 200, |x| (x[0] + 1.0).powi(2) - 3.0).unwrap();

        let min_x = driver.result("minimum x").unwrap().real().unwrap();
        let min_f = driver.result("minimum f").unwrap().real().unwrap();
        assert_abs_diff_eq!(min_x, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(min_f, -3.0, epsilon = 1e-6);
    }

    #[test]
    fn finds_nonpolynomial_minimum() {
        // f(x) = x - ln x has its minimum at x = 1.
        let mut driver = driver_on_interval(0.1, 4.0);
        drive(&mut driver, 1, 200, |x| x[0] - x[0].ln()).unwrap();

        let min_x = driver.result("minimum x").unwrap().real().unwrap();
        assert_abs_diff_eq!(min_x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn probes_stay_inside_the_interval() {
        let mut driver = driver_on_interval(-4.0, 2.0);
        let mut evals = Vec::new();
        drive(&mut driver, 1, 200, |x| {
            evals.push(x[0]);
            (x[0] + 1.0).powi(2)
        })
        .unwrap();

        assert!(evals.iter().all(|&x| (-4.0..=2.0).contains(&x)));
    }

    #[test]
    fn result_gated_until_done() {
        let driver = driver_on_interval(-4.0, 2.0);
        assert!(matches!(
            driver.result("minimum x"),
            Err(Error::NotFinished)
        ));
        assert!(matches!(
            driver.result("root"),
            Err(Error::UnknownResult(_))
        ));
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = driver_on_interval(0.0, 1.0);

        for id in ["x_0", "x_1", "eps", "t"] {
            driver.hparam_set(id, 0.75).unwrap();
            assert_eq!(driver.hparam_get(id).unwrap(), Value::Real(0.75));
        }
    }
}
