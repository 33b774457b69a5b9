//! Newton-Raphson root-finding method.
//!
//! [Newton-Raphson](https://en.wikipedia.org/wiki/Newton%27s_method) follows
//! the tangent line at the current point to its x-axis crossing,
//! x' = x - f(x)/f'(x). Quadratic near a simple root, but it needs the
//! derivative with every report -- values must arrive through
//! [`Method::value_with_gradient`]; a plain value report fails.

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value};

const INFO: &str = "\
The Newton-Raphson method follows the tangent of the function at the
current point to its x-axis crossing, x' = x - f(x)/f'(x). The caller must
report values together with the derivative (value_with_gradient); a report
without one fails.

Hyper-parameters:
name    required        type    default Description
x_0     optional        real    0       Starting point of the iteration.
f_tol   optional        real    1e-6    Method stops when |f(x)| < f_tol.

Results:
name    type    Description
root    real    The value of x where |f(x)| < f_tol.

References:
https://en.wikipedia.org/wiki/Newton%27s_method";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Running,
    Done,
    Failed,
}

/// Newton-Raphson root-finder.
///
/// See [module](self) documentation for more details.
pub struct NewtonRaphson {
    state: State,

    last_x: f64,
    last_fx: f64,
    next_x: f64,

    // hyper-parameters
    f_tol: f64,

    root: f64,
}

impl NewtonRaphson {
    /// Creates the method for one-dimensional input.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions != 1 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            state: State::Initial,
            last_x: 0.0,
            last_fx: 0.0,
            next_x: 0.0,
            f_tol: 1e-6,
            root: 0.0,
        })
    }
}

impl Method for NewtonRaphson {
    fn name(&self) -> &'static str {
        "newton-raphson"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "x_0" => self.next_x = value.expect_real(id)?,
            "f_tol" => self.f_tol = value.expect_real(id)?,
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Real(self.next_x)),
            "f_tol" => Ok(Value::Real(self.f_tol)),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        if self.state == State::Failed {
            return Err(Error::Failed);
        }
        x[0] = self.next_x;
        Ok(())
    }

    fn value(&mut self, _x: &DVector<f64>, _fx: f64) -> Result<(), Error> {
        // The update is x - f(x)/f'(x); without the derivative there is
        // nothing this method can do with a bare value.
        if self.state == State::Failed {
            return Err(Error::Failed);
        }
        Err(Error::Unsupported)
    }

    fn value_with_gradient(
        &mut self,
        x: &DVector<f64>,
        fx: f64,
        gradient: &DVector<f64>,
    ) -> Result<(), Error> {
        match self.state {
            State::Initial | State::Running => {
                let derivative = gradient[0];

                if derivative.abs() < f64::EPSILON {
                    self.state = State::Failed;
                    return Err(Error::VanishingDerivative);
                }

                self.last_x = x[0];
                self.last_fx = fx;
                self.next_x = x[0] - fx / derivative;
                debug!("newton step from {} to {}", x[0], self.next_x);

                self.state = State::Running;
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
                if self.last_fx.abs() < self.f_tol {
                    self.root = self.last_x;
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
