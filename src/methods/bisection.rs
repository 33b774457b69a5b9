//! Bisection root-finding method.
//!
//! [Bisection](https://en.wikipedia.org/wiki/Bisection_method) repeatedly
//! halves a bracket known to contain a root because the objective has
//! opposite signs at its endpoints. Robust and slow; every step shrinks the
//! bracket by exactly one half.

use log::{debug, info};
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value};

const INFO: &str = "\
The bisection method is a root finding technique that works by repeatedly
dividing a search region in half until it converges on the root.

Hyper-parameters:
name    required        type    default Description
lower   REQUIRED        real    -1e6    Lower bound of the region.
upper   REQUIRED        real    1e6     Upper bound of the region.
f_tol   optional        real    1e-6    Terminates when |f(b)-f(a)| < f_tol.
x_tol   optional        real    1e-6    Terminates when |b-a| < x_tol.

Results:
name    type    Description
root    real    Estimated location of the root.

References:
https://en.wikipedia.org/wiki/Bisection_method";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Initial2,
    Running,
    Done,
    Failed,
}

/// Bisection root-finder.
///
/// See [module](self) documentation for more details.
pub struct Bisection {
    state: State,

    // hyper-parameters
    lower: f64,
    upper: f64,
    x_tol: f64,
    f_tol: f64,

    // current bracket and the values at its ends, ordered so f(a) < 0 < f(b)
    a: f64,
    b: f64,
    f_a: f64,
    f_b: f64,

    root: f64,
}

impl Bisection {
    /// Creates the method for one-dimensional input.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions != 1 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            state: State::Initial,
            lower: -1e6,
            upper: 1e6,
            x_tol: 1e-6,
            f_tol: 1e-6,
            a: 0.0,
            b: 0.0,
            f_a: 0.0,
            f_b: 0.0,
            root: 0.0,
        })
    }
}

impl Method for Bisection {
    fn name(&self) -> &'static str {
        "bisection"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "lower" => self.lower = value.expect_real(id)?,
            "upper" => self.upper = value.expect_real(id)?,
            "x_tol" => self.x_tol = value.expect_real(id)?,
            "f_tol" => self.f_tol = value.expect_real(id)?,
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "lower" => Ok(Value::Real(self.lower)),
            "upper" => Ok(Value::Real(self.upper)),
            "x_tol" => Ok(Value::Real(self.x_tol)),
            "f_tol" => Ok(Value::Real(self.f_tol)),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.a = self.lower;
                self.b = self.upper;
                x[0] = self.a;
            }
            State::Initial2 => x[0] = self.b,
            State::Running | State::Done => x[0] = 0.5 * self.a + 0.5 * self.b,
            State::Failed => return Err(Error::Failed),
        }
        Ok(())
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.f_a = fx;
                self.state = State::Initial2;
                Ok(())
            }
            State::Initial2 => {
                self.f_b = fx;

                // Order the bracket so f(a) < f(b).
                if self.f_b < self.f_a {
                    std::mem::swap(&mut self.a, &mut self.b);
                    std::mem::swap(&mut self.f_a, &mut self.f_b);
                }

                // The endpoints must straddle zero; violating this is
                // unrecoverable for the instance.
                if self.f_a > 0.0 || self.f_b < 0.0 {
                    self.state = State::Failed;
                    return Err(Error::InvalidBracket);
                }

                self.state = State::Running;
                Ok(())
            }
            State::Running => {
                if fx < 0.0 {
                    self.a = x[0];
                    self.f_a = fx;
                } else if fx > 0.0 {
                    self.b = x[0];
                    self.f_b = fx;
                } else if fx == 0.0 {
                    self.a = x[0];
                    self.b = x[0];
                    self.f_a = 0.0;
                    self.f_b = 0.0;
                    self.root = x[0];
                    self.state = State::Done;
                    debug!("exact zero found at {}", x[0]);
                } else {
                    return Err(Error::IncomparableValue(fx));
                }
                Ok(())
            }
            State::Done => Err(Error::OutOfSequence),
            State::Failed => Err(Error::Failed),
        }
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Initial | State::Initial2 => Ok(Status::InProgress),
            State::Done => Ok(Status::Done),
            State::Failed => Err(Error::Failed),
            State::Running => {
                if (self.b - self.a).abs() < self.x_tol {
                    info!("bracket width within termination threshold");
                } else if (self.f_b - self.f_a).abs() < self.f_tol {
                    info!("objective difference across bracket within termination threshold");
                } else {
                    return Ok(Status::InProgress);
                }

                self.root = 0.5 * (self.a + self.b);
                self.state = State::Done;
                Ok(Status::Done)
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

    fn driver_on_bracket(lower: f64, upper: f64) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();
        driver.hparam_set("lower", lower).unwrap();
        driver.hparam_set("upper", upper).unwrap();
        driver.hparam_set("x_tol", 1e-5).unwrap();
        driver.hparam_set("f_tol", 1e-5).unwrap();
        driver
    }

    #[test]
    fn converges_on_cubic() {
        let mut driver = driver_on_bracket(2.0, 3.0);
        drive(&mut driver, 1, 100, |x| cubic(x[0])).unwrap();

        let root = driver.result("root").unwrap().real().unwrap();
        assert!(cubic(root).abs() < 1e-4);

        let a = driver.hparam_get("lower").unwrap().real().unwrap();
        let b = driver.hparam_get("upper").unwrap().real().unwrap();
        assert!(root > a && root < b);
    }

    #[test]
    fn accepts_reversed_bounds() {
        // f(2) < 0 < f(3), supplied in the awkward order.
        let mut driver = driver_on_bracket(3.0, 2.0);
        drive(&mut driver, 1, 100, |x| cubic(x[0])).unwrap();

        let root = driver.result("root").unwrap().real().unwrap();
        assert!(cubic(root).abs() < 1e-4);
    }

    #[test]
    fn same_sign_bracket_fails_sticky() {
        // f is positive on the whole of [3, 4].
        let mut driver = driver_on_bracket(3.0, 4.0);
        let mut x = DVector::zeros(1);

        driver.next(&mut x).unwrap();
        driver.set_value(&x, cubic(x[0])).unwrap();
        driver.next(&mut x).unwrap();
        assert!(matches!(
            driver.set_value(&x, cubic(x[0])),
            Err(Error::InvalidBracket)
        ));

        // The instance stays poisoned from here on.
        assert!(matches!(driver.next(&mut x), Err(Error::Failed)));
        assert!(matches!(driver.set_value(&x, 0.0), Err(Error::Failed)));
        assert!(matches!(driver.is_done(), Err(Error::Failed)));
    }

    #[test]
    fn exact_zero_ends_the_search() {
        let mut driver = driver_on_bracket(-1.0, 1.0);
        let mut x = DVector::zeros(1);

        // Bootstrap f(a), f(b) for f(x) = x, then hit zero at the midpoint.
        driver.next(&mut x).unwrap();
        driver.set_value(&x, x[0]).unwrap();
        driver.next(&mut x).unwrap();
        driver.set_value(&x, x[0]).unwrap();
        driver.next(&mut x).unwrap();
        assert_eq!(x[0], 0.0);
        driver.set_value(&x, 0.0).unwrap();

        assert_eq!(driver.is_done().unwrap(), Status::Done);
        assert_eq!(driver.result("root").unwrap(), Value::Real(0.0));
    }

    #[test]
    fn done_is_idempotent() {
        let mut driver = driver_on_bracket(2.0, 3.0);
        drive(&mut driver, 1, 100, |x| cubic(x[0])).unwrap();

        assert_eq!(driver.is_done().unwrap(), Status::Done);
        assert_eq!(driver.is_done().unwrap(), Status::Done);
        assert_eq!(
            driver.result("root").unwrap(),
            driver.result("root").unwrap()
        );
    }

    #[test]
    fn result_gated_until_done() {
        let driver = driver_on_bracket(2.0, 3.0);
        assert!(matches!(driver.result("root"), Err(Error::NotFinished)));
        assert!(matches!(
            driver.result("area"),
            Err(Error::UnknownResult(_))
        ));
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = driver_on_bracket(2.0, 3.0);

        for id in ["lower", "upper", "x_tol", "f_tol"] {
            driver.hparam_set(id, 0.25).unwrap();
            assert_eq!(driver.hparam_get(id).unwrap(), Value::Real(0.25));
        }

        assert!(matches!(
            driver.hparam_set("n", 4i64),
            Err(Error::UnknownHparam(_))
        ));
        assert!(matches!(
            driver.hparam_get("n"),
            Err(Error::UnknownHparam(_))
        ));
    }
}
