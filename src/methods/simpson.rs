//! Simpson's rule quadrature.
//!
//! Integrates the objective over \[lower, upper\] by fitting parabolas
//! through consecutive sample triples:
//! area = h/3 (f_0 + f_n + 2 sum of even interior + 4 sum of odd interior).
//! The subinterval count must be even. Fourth-order accurate where the
//! trapezoidal rule is second-order.
//!
//! # References
//!
//! \[1\] Fausett, L.V. (2002). Numerical Methods: Algorithms and
//! Applications. ISBN 0-13-031400-5

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value};

const INFO: &str = "\
Simpson's method is an integration method that samples the interval being
integrated at regular subintervals and fits parabolas through consecutive
sample triples to estimate the area under the curve. The number of
subintervals must be even.

Hyper-parameters:
name            required        type    default Description
lower           REQUIRED        real    0       Lower end of the interval being integrated.
upper           REQUIRED        real    1       Upper end of the interval being integrated.
n               REQUIRED        int     10      Number of subintervals to use (even).
subintervals    alias of n

Results:
name    type    Description
area    real    Estimated area under the function.

References:
Fausett, L.V. (2002). Numerical Methods: Algorithms and Applications.
        ISBN 0-13-031400-5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Running,
    Done,
}

/// Simpson's rule.
///
/// See [module](self) documentation for more details.
pub struct Simpson {
    state: State,

    first_fx: f64,
    // even-indexed interior samples (weight 2) and odd-indexed ones
    // (weight 4), accumulated in one pass
    sum1: f64,
    sum2: f64,
    curr_subinterval: i64,

    // hyper-parameters
    x_0: f64,
    x_1: f64,
    n: i64,

    area: f64,
}

impl Simpson {
    /// Creates the method for one-dimensional input.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions != 1 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            state: State::Initial,
            first_fx: 0.0,
            sum1: 0.0,
            sum2: 0.0,
            curr_subinterval: 0,
            x_0: 0.0,
            x_1: 1.0,
            n: 10,
            area: 0.0,
        })
    }

    fn set_subintervals(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        let n = value.expect_int(id)?;
        if n < 2 || n % 2 != 0 {
            return Err(Error::HparamType {
                id: id.to_string(),
                expected: "a positive even subinterval count",
            });
        }
        self.n = n;
        Ok(())
    }
}

impl Method for Simpson {
    fn name(&self) -> &'static str {
        "simpson"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "lower" => self.x_0 = value.expect_real(id)?,
            "upper" => self.x_1 = value.expect_real(id)?,
            "n" | "subintervals" => self.set_subintervals(id, value)?,
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "lower" => Ok(Value::Real(self.x_0)),
            "upper" => Ok(Value::Real(self.x_1)),
            "n" | "subintervals" => Ok(Value::Int(self.n)),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => x[0] = self.x_0,
            State::Running => {
                x[0] = self.x_0
                    + self.curr_subinterval as f64 * (self.x_1 - self.x_0) / self.n as f64;
            }
            State::Done => return Err(Error::OutOfSequence),
        }
        Ok(())
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                debug!("recording first f({}) = {}", x[0], fx);
                self.first_fx = fx;
                self.sum1 = 0.0;
                self.sum2 = 0.0;
                self.curr_subinterval = 1;
                self.state = State::Running;
                Ok(())
            }
            State::Running => {
                if self.curr_subinterval >= self.n {
                    debug!("recording final f({}) = {} and computing area", x[0], fx);
                    let h = (self.x_1 - self.x_0) / self.n as f64;
                    self.area =
                        (h / 3.0) * (self.first_fx + fx + 2.0 * self.sum1 + 4.0 * self.sum2);
                    self.state = State::Done;
                } else {
                    // Even and odd interior samples carry different weights;
                    // a single pass sorts them into the two sums.
                    if self.curr_subinterval % 2 == 0 {
                        self.sum1 += fx;
                    } else {
                        self.sum2 += fx;
                    }
                    self.curr_subinterval += 1;
                }
                Ok(())
            }
            State::Done => Err(Error::OutOfSequence),
        }
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Done => Ok(Status::Done),
            _ => Ok(Status::InProgress),
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        match id {
            "area" if self.state == State::Done => Ok(Value::Real(self.area)),
            "area" => Err(Error::NotFinished),
            _ => Err(Error::UnknownResult(id.to_string())),
        }
    }
}
