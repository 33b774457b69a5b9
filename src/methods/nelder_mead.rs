//! Nelder-Mead (simplex) minimization method.
//!
//! [Nelder-Mead](https://en.wikipedia.org/wiki/Nelder%E2%80%93Mead_method)
//! keeps a [simplex](https://en.wikipedia.org/wiki/Simplex) of *n + 1*
//! (point, value) samples and repeatedly reflects, expands, contracts, or
//! shrinks it based on how the newest sample compares against the best,
//! second-worst, and worst vertices. Derivative-free and popular for low
//! dimensionalities.
//!
//! Because the caller performs every evaluation, each simplex transformation
//! is spread over states: the reflection sample is classified when it is
//! reported, which decides whether the next proposed point is an expansion,
//! a contraction, or the first of the two shrink evaluations.
//!
//! # References
//!
//! \[1\] [Nelder-Mead algorithm](http://www.scholarpedia.org/article/Nelder-Mead_algorithm)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Status, Value, VectorOps};

const INFO: &str = "\
Nelder-Mead is a derivative-free minimization method that maintains a
simplex of n+1 samples and transforms it by reflection, expansion,
contraction, and shrinking until it collapses around a minimum.

Hyper-parameters:
name            required        type    default Description
alpha           optional        real    1       Reflection coefficient (> 0).
beta            optional        real    0.5     Contraction coefficient (0 < beta < 1).
gamma           optional        real    2       Expansion coefficient (> 1).
delta           optional        real    0.5     Shrink coefficient (0 < delta < 1).
dist_threshold  optional        real    1e-8    Terminates when best and worst vertices are this close.
max_iterations  optional        int     1000    Cap on the number of value reports.

Results:
name            type    Description
minimum x       vector  Best vertex of the final simplex.
minimum f       real    Objective value at the best vertex.

References:
http://www.scholarpedia.org/article/Nelder-Mead_algorithm";

/// Options of the [`NelderMead`] method.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct NelderMeadOptions {
    /// Coefficient for the reflection step. Default: `1`.
    alpha: f64,
    /// Coefficient for both contraction steps. Default: `0.5`.
    beta: f64,
    /// Coefficient for the expansion step. Default: `2`.
    gamma: f64,
    /// Coefficient for shrinking the simplex toward the best vertex.
    /// Default: `0.5`.
    delta: f64,
    /// Terminal best-to-worst vertex distance. Default: `1e-8`.
    dist_threshold: f64,
    /// Cap on the number of value reports. Default: `1000`.
    max_iterations: usize,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.5,
            gamma: 2.0,
            delta: 0.5,
            dist_threshold: 1e-8,
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Reflect,
    Expand,
    ContractOut,
    ContractIn,
    Shrink,
    Shrink2,
    Done,
}

#[derive(Debug, Clone)]
struct Sample {
    x: DVector<f64>,
    fx: f64,
}

/// Nelder-Mead method.
///
/// See [module](self) documentation for more details.
pub struct NelderMead {
    dim: usize,
    state: State,
    options: NelderMeadOptions,

    iterations: usize,
    // sorted ascending by value, except between the two shrink reports
    simplex: Vec<Sample>,
    seed: DVector<f64>,

    // pending samples referenced across calls
    x_r: Sample,
    s_shrink: DVector<f64>,
}

impl NelderMead {
    /// Creates the method with default options.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        Self::with_options(dimensions, NelderMeadOptions::default())
    }

    /// Creates the method with the given options.
    pub fn with_options(dimensions: usize, options: NelderMeadOptions) -> Result<Self, Error> {
        if dimensions == 0 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        Ok(Self {
            dim: dimensions,
            state: State::Initial,
            options,
            iterations: 0,
            simplex: Vec::with_capacity(dimensions + 1),
            seed: DVector::zeros(dimensions),
            x_r: Sample {
                x: DVector::zeros(dimensions),
                fx: 0.0,
            },
            s_shrink: DVector::zeros(dimensions),
        })
    }

    fn sort_simplex(&mut self) {
        self.simplex.sort_by(|a, b| {
            a.fx.partial_cmp(&b.fx)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn replace_worst(&mut self, sample: Sample) {
        let last = self.simplex.len() - 1;
        self.simplex[last] = sample;
        self.sort_simplex();
    }

    /// Centroid of all vertices but the worst.
    fn centroid(&self) -> DVector<f64> {
        let mut sum = DVector::zeros(self.dim);
        for sample in &self.simplex[..self.dim] {
            sum += &sample.x;
        }
        sum / self.dim as f64
    }

    fn best(&self) -> &Sample {
        &self.simplex[0]
    }

    fn second_worst(&self) -> &Sample {
        &self.simplex[self.simplex.len() - 2]
    }

    fn worst(&self) -> &Sample {
        &self.simplex[self.simplex.len() - 1]
    }
}

impl Method for NelderMead {
    fn name(&self) -> &'static str {
        "nelder-mead"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "alpha" => self.options.alpha = value.expect_real(id)?,
            "beta" => self.options.beta = value.expect_real(id)?,
            "gamma" => self.options.gamma = value.expect_real(id)?,
            "delta" => self.options.delta = value.expect_real(id)?,
            "dist_threshold" => self.options.dist_threshold = value.expect_real(id)?,
            "max_iterations" => {
                self.options.max_iterations = value.expect_int(id)?.max(0) as usize
            }
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "alpha" => Ok(Value::Real(self.options.alpha)),
            "beta" => Ok(Value::Real(self.options.beta)),
            "gamma" => Ok(Value::Real(self.options.gamma)),
            "delta" => Ok(Value::Real(self.options.delta)),
            "dist_threshold" => Ok(Value::Real(self.options.dist_threshold)),
            "max_iterations" => Ok(Value::Int(self.options.max_iterations as i64)),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn seed(&mut self, x: &DVector<f64>) -> Result<(), Error> {
        if self.state != State::Initial || !self.simplex.is_empty() {
            return Err(Error::OutOfSequence);
        }
        self.seed.try_copy_from(x)?;
        Ok(())
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                // Bootstrap vertex k is the seed offset along axis k - 1.
                let k = self.simplex.len();
                x.copy_from(&self.seed);
                if k > 0 {
                    x[k - 1] += 1.0;
                }
            }
            State::Reflect => {
                let centroid = self.centroid();
                let candidate = &centroid + (&centroid - &self.worst().x) * self.options.alpha;
                x.copy_from(&candidate);
            }
            State::Expand => {
                let centroid = self.centroid();
                let candidate = &centroid + (&self.x_r.x - &centroid) * self.options.gamma;
                x.copy_from(&candidate);
            }
            State::ContractOut => {
                let centroid = self.centroid();
                let candidate = &centroid + (&self.x_r.x - &centroid) * self.options.beta;
                x.copy_from(&candidate);
            }
            State::ContractIn => {
                let centroid = self.centroid();
                let candidate = &centroid + (&self.worst().x - &centroid) * self.options.beta;
                x.copy_from(&candidate);
            }
            State::Shrink => {
                // Both replacement vertices move toward the best vertex; the
                // second one is parked until the first is evaluated.
                let best = &self.simplex[0].x;
                let delta = self.options.delta;
                self.s_shrink = best + (&self.second_worst().x - best) * delta;
                let candidate = best + (&self.worst().x - best) * delta;
                x.copy_from(&candidate);
            }
            State::Shrink2 => x.copy_from(&self.s_shrink),
            State::Done => return Err(Error::OutOfSequence),
        }
        Ok(())
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        if self.state == State::Done {
            return Err(Error::OutOfSequence);
        }

        self.iterations += 1;

        let sample = Sample { x: x.clone(), fx };

        match self.state {
            State::Initial => {
                self.simplex.push(sample);
                if self.simplex.len() == self.dim + 1 {
                    self.sort_simplex();
                    self.state = State::Reflect;
                    debug!("simplex bootstrapped with {} vertices", self.dim + 1);
                }
                Ok(())
            }
            State::Reflect => {
                let l = self.best().fx;
                let s = self.second_worst().fx;
                let h = self.worst().fx;
                self.x_r = sample;

                if l <= self.x_r.fx && self.x_r.fx < s {
                    // Neither best nor worst in the new simplex; take it.
                    debug!("reflection accepted");
                    let accepted = self.x_r.clone();
                    self.replace_worst(accepted);
                } else if self.x_r.fx < l {
                    self.state = State::Expand;
                } else if self.x_r.fx < h {
                    // Between second-worst and worst.
                    self.state = State::ContractOut;
                } else {
                    self.state = State::ContractIn;
                }
                Ok(())
            }
            State::Expand => {
                debug!("expansion {}", if sample.fx < self.x_r.fx { "accepted" } else { "rejected" });
                if sample.fx < self.x_r.fx {
                    self.replace_worst(sample);
                } else {
                    let reflected = self.x_r.clone();
                    self.replace_worst(reflected);
                }
                self.state = State::Reflect;
                Ok(())
            }
            State::ContractOut => {
                if sample.fx < self.x_r.fx {
                    debug!("outer contraction accepted");
                    self.replace_worst(sample);
                    self.state = State::Reflect;
                } else {
                    self.state = State::Shrink;
                }
                Ok(())
            }
            State::ContractIn => {
                if sample.fx < self.worst().fx {
                    debug!("inner contraction accepted");
                    self.replace_worst(sample);
                    self.state = State::Reflect;
                } else {
                    self.state = State::Shrink;
                }
                Ok(())
            }
            State::Shrink => {
                let last = self.simplex.len() - 1;
                self.simplex[last] = sample;
                self.state = State::Shrink2;
                Ok(())
            }
            State::Shrink2 => {
                let second = self.simplex.len() - 2;
                self.simplex[second] = sample;
                self.sort_simplex();
                self.state = State::Reflect;
                debug!("simplex shrunk toward best vertex");
                Ok(())
            }
            State::Done => unreachable!(),
        }
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Initial => Ok(Status::InProgress),
            State::Done => Ok(Status::Done),
            State::Shrink | State::Shrink2 => {
                // Mid-shrink the simplex is inconsistent; finish it first.
                Ok(Status::InProgress)
            }
            _ => {
                if self.iterations > self.options.max_iterations {
                    debug!(
                        "iteration count {} exceeded limit {}",
                        self.iterations, self.options.max_iterations
                    );
                    self.state = State::Done;
                    return Ok(Status::Done);
                }

                let dist = self.best().x.distance(&self.worst().x)?;
                if dist < self.options.dist_threshold {
                    debug!("simplex size {} under threshold", dist);
                    self.state = State::Done;
                    return Ok(Status::Done);
                }

                Ok(Status::InProgress)
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
            "minimum x" => Ok(Value::Vector(self.best().x.clone())),
            "minimum f" => Ok(Value::Real(self.best().fx)),
            _ => Err(Error::UnknownResult(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::dvector;

    use crate::driver::Driver;
    use crate::testing::{drive, rosenbrock, sphere};

    fn driver_with(dim: usize, dist_threshold: f64, max_iterations: i64) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("nelder-mead", dim).unwrap();
        driver.hparam_set("dist_threshold", dist_threshold).unwrap();
        driver.hparam_set("max_iterations", max_iterations).unwrap();
        driver
    }

    #[test]
    fn converges_on_rosenbrock() {
        let mut driver = driver_with(2, 1e-7, 5000);
        driver.seed(&dvector![0.0, 0.0]).unwrap();
        drive(&mut driver, 2, 6000, |x| rosenbrock(x[0], x[1])).unwrap();

        let min_x = driver.result("minimum x").unwrap();
        let min_x = min_x.vector().unwrap();
        assert!(min_x.distance(&dvector![1.0, 1.0]).unwrap() < 1e-3);

        let min_f = driver.result("minimum f").unwrap().real().unwrap();
        assert!(min_f < 1e-6);
    }

    #[test]
    fn converges_on_sphere() {
        let mut driver = driver_with(3, 1e-9, 5000);
        driver.seed(&dvector![2.0, -3.0, 1.0]).unwrap();
        drive(&mut driver, 3, 6000, |x| sphere(x)).unwrap();

        let min_f = driver.result("minimum f").unwrap().real().unwrap();
        assert!(min_f < 1e-8);
    }

    #[test]
    fn iteration_cap_terminates() {
        let mut driver = driver_with(2, 0.0, 12);
        let evals = drive(&mut driver, 2, 100, |x| rosenbrock(x[0], x[1])).unwrap();

        // Cap counts value reports; an in-flight shrink finishes first.
        assert!(evals <= 16);
        assert!(driver.result("minimum f").is_ok());
    }

    #[test]
    fn seed_after_start_fails() {
        let mut driver = driver_with(2, 1e-7, 100);
        let mut x = dvector![0.0, 0.0];
        driver.next(&mut x).unwrap();
        driver.set_value(&x, 1.0).unwrap();

        assert!(matches!(
            driver.seed(&dvector![1.0, 1.0]),
            Err(Error::OutOfSequence)
        ));
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = driver_with(2, 1e-7, 100);

        for id in ["alpha", "beta", "gamma", "delta", "dist_threshold"] {
            driver.hparam_set(id, 0.625).unwrap();
            assert_eq!(driver.hparam_get(id).unwrap(), Value::Real(0.625));
        }

        driver.hparam_set("max_iterations", 42i64).unwrap();
        assert_eq!(
            driver.hparam_get("max_iterations").unwrap(),
            Value::Int(42)
        );

        assert!(matches!(
            driver.hparam_set("sigma", 1.0),
            Err(Error::UnknownHparam(_))
        ));
    }
}
