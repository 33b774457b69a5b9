//! Forward-difference gradient estimation.
//!
//! Estimates the gradient of the objective at a fixed point x0 by taking one
//! small step along each axis: partial_j = (f(x0 + h_j e_j) - f(x0)) / h_j.
//! One evaluation at x0 plus one per dimension, reported in axis order.
//!
//! # References
//!
//! \[1\] Anton, H. (1992). Calculus with analytic geometry, 4th ed.
//! ISBN 0-471-50901-9

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value, VectorOps};

const INFO: &str = "\
The gradient estimation method uses small steps in each dimension to
estimate the gradient of a function at a specified point.

Hyper-parameters:
name            required        type    default Description
x0              REQUIRED        vector  zeros   Point where the gradient is estimated.
step            optional        real    1e-3    Step size to use.
step_vec        optional        vector  none    Step sizes to use per dimension.

Results:
name            type    Description
gradient        vector  Estimated gradient at x0.

References:
Anton, H. (1992). Calculus with analytic geometry, 4th ed.
        ISBN 0-471-50901-9";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Running,
    Done,
}

/// Forward-difference gradient estimator.
///
/// See [module](self) documentation for more details.
pub struct GradientEstimate {
    dim: usize,
    state: State,

    // hyper-parameters
    x0: DVector<f64>,
    step: f64,
    steps: DVector<f64>,
    has_steps_vec: bool,

    fx0: f64,
    curr: usize,

    gradient: DVector<f64>,
}

impl GradientEstimate {
    /// Creates the method for the given dimensionality.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        if dimensions == 0 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        let step = 1e-3;

        Ok(Self {
            dim: dimensions,
            state: State::Initial,
            x0: DVector::zeros(dimensions),
            step,
            steps: DVector::from_element(dimensions, step),
            has_steps_vec: false,
            fx0: 0.0,
            curr: 0,
            gradient: DVector::zeros(dimensions),
        })
    }
}

impl Method for GradientEstimate {
    fn name(&self) -> &'static str {
        "gradient estimate"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "x0" => self.x0.try_copy_from(value.expect_vector(id)?)?,
            "step" => {
                self.step = value.expect_real(id)?;
                if !self.has_steps_vec {
                    self.steps.fill(self.step);
                }
            }
            "step_vec" => {
                self.steps.try_copy_from(value.expect_vector(id)?)?;
                self.has_steps_vec = true;
            }
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x0" => Ok(Value::Vector(self.x0.clone())),
            "step" => Ok(Value::Real(self.step)),
            "step_vec" => Ok(Value::Vector(self.steps.clone())),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn seed(&mut self, x: &DVector<f64>) -> Result<(), Error> {
        if self.state != State::Initial {
            return Err(Error::OutOfSequence);
        }
        self.x0.try_copy_from(x)
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => x.try_copy_from(&self.x0),
            State::Running => {
                x.try_copy_from(&self.x0)?;
                x[self.curr] += self.steps[self.curr];
                Ok(())
            }
            State::Done => Err(Error::OutOfSequence),
        }
    }

    fn value(&mut self, _x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.fx0 = fx;
                self.curr = 0;
                self.state = State::Running;
                Ok(())
            }
            State::Running => {
                // Partial derivative along the current axis.
                self.gradient[self.curr] = (fx - self.fx0) / self.steps[self.curr];
                debug!(
                    "estimated partial {} = {}",
                    self.curr, self.gradient[self.curr]
                );

                self.curr += 1;
                if self.curr >= self.dim {
                    self.state = State::Done;
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
            "gradient" if self.state == State::Done => Ok(Value::Vector(self.gradient.clone())),
            "gradient" => Err(Error::NotFinished),
            _ => Err(Error::UnknownResult(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::driver::Driver;
    use crate::testing::drive;

    fn estimate_at(x0: DVector<f64>) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("gradient estimate", x0.len()).unwrap();
        driver.hparam_set("x0", x0).unwrap();
        driver
    }

    #[test]
    fn matches_analytic_partials() {
        // f(x, y) = x^2 + 3xy, so df/dx = 2x + 3y and df/dy = 3x.
        let mut driver = estimate_at(dvector![2.0, -1.0]);
        driver.hparam_set("step", 1e-6).unwrap();

        let evals = drive(&mut driver, 2, 10, |x| {
            x[0] * x[0] + 3.0 * x[0] * x[1]
        })
        .unwrap();
        assert_eq!(evals, 3);

        let gradient = driver.result("gradient").unwrap();
        let gradient = gradient.vector().unwrap().clone();
        assert_abs_diff_eq!(gradient[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(gradient[1], 6.0, epsilon = 1e-4);
    }

    #[test]
    fn per_dimension_steps_are_used() {
        let mut driver = estimate_at(dvector![0.0, 0.0]);
        driver
            .hparam_set("step_vec", dvector![1e-3, 1e-5])
            .unwrap();

        let mut probes = Vec::new();
        drive(&mut driver, 2, 10, |x| {
            probes.push(x.clone());
            x[0] + x[1]
        })
        .unwrap();

        assert_eq!(probes.len(), 3);
        assert_abs_diff_eq!(probes[1][0], 1e-3);
        assert_abs_diff_eq!(probes[2][1], 1e-5);
    }

    #[test]
    fn result_gated_until_done() {
        let driver = estimate_at(dvector![0.0]);
        assert!(matches!(
            driver.result("gradient"),
            Err(Error::NotFinished)
        ));
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = estimate_at(dvector![1.0, 2.0]);

        driver.hparam_set("step", 1e-4).unwrap();
        assert_eq!(driver.hparam_get("step").unwrap(), Value::Real(1e-4));

        driver.hparam_set("x0", dvector![3.0, 4.0]).unwrap();
        assert_eq!(
            driver.hparam_get("x0").unwrap(),
            Value::Vector(dvector![3.0, 4.0])
        );

        driver.hparam_set("step_vec", dvector![1e-2, 1e-3]).unwrap();
        assert_eq!(
            driver.hparam_get("step_vec").unwrap(),
            Value::Vector(dvector![1e-2, 1e-3])
        );

        assert!(matches!(
            driver.hparam_set("h", 0.1),
            Err(Error::UnknownHparam(_))
        ));
    }
}
