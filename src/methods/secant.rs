//! Secant root-finding method.
//!
//! The [secant method](https://en.wikipedia.org/wiki/Secant_method) draws a
//! line through the two most recent points on the function and takes its
//! x-axis crossing as the next trial. Superlinear on smooth functions, with
//! no derivative required.
//!
//! # References
//!
//! \[1\] Fausett, L.V. (2002). Numerical Methods: Algorithms and
//! Applications. ISBN 0-13-031400-5

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value};

const INFO: &str = "\
The secant method is a root finding method that uses two points on the
function to construct a line, then extends that line to the x-axis to
find a new point to construct a line through.

Hyper-parameters:
name    required        type    default Description
x_0     REQUIRED        real    0       x value for the first point.
x_1     REQUIRED        real    1       x value for the second point.
f_tol   optional        real    1e-6    Method stops when |f(x)| < f_tol.

Results:
name    type    Description
root    real    The value of x where |f(x)| < f_tol.

References:
Fausett, L.V. (2002). Numerical Methods: Algorithms and Applications.
        ISBN 0-13-031400-5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Running,
    Done,
    Failed,
}

/// Secant root-finder.
///
/// See [module](self) documentation for more details.
pub struct Secant {
    state: State,

    // most recent accepted point and the upcoming trial
    x_prev: f64,
    fx_prev: f64,
    x_next: f64,

    // hyper-parameters
    x_0: f64,
    x_1: f64,
    f_tol: f64,

    root: f64,
}

impl Secant {
    /// Creates the method for one-dimensional input.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions != 1 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            state: State::Initial,
            x_prev: 0.0,
            fx_prev: 0.0,
            x_next: 0.0,
            x_0: 0.0,
            x_1: 1.0,
            f_tol: 1e-6,
            root: 0.0,
        })
    }
}

impl Method for Secant {
    fn name(&self) -> &'static str {
        "secant"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "x_0" => self.x_0 = value.expect_real(id)?,
            "x_1" => self.x_1 = value.expect_real(id)?,
            "f_tol" => self.f_tol = value.expect_real(id)?,
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Real(self.x_0)),
            "x_1" => Ok(Value::Real(self.x_1)),
            "f_tol" => Ok(Value::Real(self.f_tol)),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => x[0] = self.x_0,
            State::Running | State::Done => x[0] = self.x_next,
            State::Failed => return Err(Error::Failed),
        }
        Ok(())
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.x_prev = x[0];
                self.fx_prev = fx;
                self.x_next = self.x_1;
                self.state = State::Running;
                Ok(())
            }
            State::Running => {
                let delta_x = x[0] - self.x_prev;
                let delta_fx = fx - self.fx_prev;

                // A flat secant line has no x-axis crossing to step to.
                if delta_fx.abs() < f64::EPSILON {
                    self.state = State::Failed;
                    return Err(Error::VanishingDerivative);
                }

                self.x_next = self.x_prev - self.fx_prev * delta_x / delta_fx;
                debug!("secant step to {}", self.x_next);

                self.x_prev = x[0];
                self.fx_prev = fx;
                Ok(())
            }
            State::Done => Err(Error::OutOfSequence),
            State::Failed => Err(Error::Failed),
        }
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Initial => Ok(Status::InProgress),
            State::Done => Ok(Status::Done),
            State::Failed => Err(Error::Failed),
            State::Running => {
                if self.fx_prev.abs() < self.f_tol {
                    self.root = self.x_prev;
                    self.state = State::Done;
                    Ok(Status::Done)
                } else {
                    Ok(Status::InProgress)
                }
            }
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

    fn driver_from(x_0: f64, x_1: f64) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("secant", 1).unwrap();
        driver.hparam_set("x_0", x_0).unwrap();
        driver.hparam_set("x_1", x_1).unwrap();
        driver
    }

    #[test]
    fn converges_on_cubic() {
        let mut driver = driver_from(2.0, 3.0);
        drive(&mut driver, 1, 100, |x| cubic(x[0])).unwrap();

        let root = driver.result("root").unwrap().real().unwrap();
        assert!(cubic(root).abs() < 1e-6);
    }

    #[test]
    fn flat_secant_line_fails_sticky() {
        let mut driver = driver_from(-1.0, 1.0);
        let mut x = DVector::zeros(1);

        // A constant function never crosses the axis.
        driver.next(&mut x).unwrap();
        driver.set_value(&x, 4.0).unwrap();
        driver.next(&mut x).unwrap();
        assert!(matches!(
            driver.set_value(&x, 4.0),
            Err(Error::VanishingDerivative)
        ));

        assert!(matches!(driver.next(&mut x), Err(Error::Failed)));
        assert!(matches!(driver.is_done(), Err(Error::Failed)));
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = driver_from(0.0, 1.0);

        for id in ["x_0", "x_1", "f_tol"] {
            driver.hparam_set(id, 1.5).unwrap();
            assert_eq!(driver.hparam_get(id).unwrap(), Value::Real(1.5));
        }

        assert!(matches!(
            driver.hparam_set("lower", 0.0),
            Err(Error::UnknownHparam(_))
        ));
    }
}
