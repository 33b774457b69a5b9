//! Differential evolution global minimization method.
//!
//! [Differential
//! evolution](https://en.wikipedia.org/wiki/Differential_evolution) maintains
//! a population of NP candidate vectors and proposes trials formed by adding
//! the scaled difference of two random population members to a third (scheme
//! DE1), optionally biased toward the best member seen so far (scheme DE2).
//! A trial replaces its population slot only when it is strictly better than
//! that slot's previous-generation value, so the population never gets
//! worse. Crossover is not implemented.
//!
//! # References
//!
//! \[1\] Storn, R., Price, K. Differential Evolution -- A Simple and
//! Efficient Heuristic for global Optimization over Continuous Spaces.
//! Journal of Global Optimization 11, 341-359 (1997).
//! <https://doi.org/10.1023/A:1008202821328>

use getset::{CopyGetters, Setters};
use log::{debug, info, warn};
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};

use crate::core::{Error, Method, Status, Value, VectorOps};

const INFO: &str = "\
Differential evolution is a minimization method that uses a population of
randomized guesses that are systematically updated with better guesses
until a minimum value is found.

Note: crossover is not currently implemented.

Hyper-parameters:
name            required        type    default Description
lower           optional        vector  none    Lower bounds on the search region.
upper           optional        vector  none    Upper bounds on the search region.
start           optional        vector  none    Center of the initial population.
NP              optional        int     10*dims Population size (at least 3).
F               optional        real    0.5     Scaling of the random difference vector.
lambda          optional        real    0.1     Scaling of the best-vector bias (0 selects scheme DE1).
iterations      optional        int     1000    Number of generations to run.
f_tol           optional        real    none    Stops once the running minimum drops below this.

Results:
name            type    Description
minimum x       vector  Best candidate observed.
minimum f       real    Objective value at the best candidate.

References:
Storn, R., Price, K. Differential Evolution - A Simple and Efficient
        Heuristic for global Optimization over Continuous Spaces.
        Journal of Global Optimization 11, 341-359 (1997).
        https://doi.org/10.1023/A:1008202821328";

/// Options of the [`DifferentialEvolution`] method.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct DifferentialEvolutionOptions {
    /// Number of generations to run. Default: `1000`.
    iterations: i64,
    /// Population size; `None` selects ten per dimension. Default: `None`.
    np: Option<usize>,
    /// Scaling applied to the difference of two random members. Default:
    /// `0.5`.
    f: f64,
    /// Scaling applied to the best-member bias; zero selects scheme DE1.
    /// Default: `0.1`.
    lambda: f64,
    /// Optional tolerance target on the running minimum. Default: `None`.
    f_tol: Option<f64>,
}

impl Default for DifferentialEvolutionOptions {
    fn default() -> Self {
        Self {
            iterations: 1000,
            np: None,
            f: 0.5,
            lambda: 0.1,
            f_tol: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Running,
    Done,
}

/// Differential evolution method.
///
/// See [module](self) documentation for more details.
pub struct DifferentialEvolution {
    dim: usize,
    state: State,
    options: DifferentialEvolutionOptions,
    iterations_left: i64,
    np: usize,

    start: Option<DVector<f64>>,
    lower: Option<DVector<f64>>,
    upper: Option<DVector<f64>>,

    // current and previous generations
    x: Vec<DVector<f64>>,
    fx: Vec<f64>,
    x_prev: Vec<DVector<f64>>,
    fx_prev: Vec<f64>,

    best: usize,
    current: usize,
    trial: DVector<f64>,

    min_x: DVector<f64>,
    min_fx: f64,
    has_min: bool,

    rng: StdRng,
}

impl DifferentialEvolution {
    /// Creates the method with default options and an entropy-seeded RNG.
    pub fn new(dimensions: usize) -> Result<Self, Error> {
        Self::with_options(
            dimensions,
            DifferentialEvolutionOptions::default(),
            StdRng::from_entropy(),
        )
    }

    /// Creates the method with the given options and RNG. Tests use a seeded
    /// RNG for reproducible runs.
    pub fn with_options(
        dimensions: usize,
        options: DifferentialEvolutionOptions,
        rng: StdRng,
    ) -> Result<Self, Error> {
        if dimensions == 0 {
            return Err(Error::InvalidDimensionality(dimensions));
        }

        let np = options.np.unwrap_or(dimensions * 10);
        let iterations_left = options.iterations;

        Ok(Self {
            dim: dimensions,
            state: State::Initial,
            options,
            iterations_left,
            np,
            start: None,
            lower: None,
            upper: None,
            x: Vec::new(),
            fx: Vec::new(),
            x_prev: Vec::new(),
            fx_prev: Vec::new(),
            best: 0,
            current: 0,
            trial: DVector::zeros(dimensions),
            min_x: DVector::zeros(dimensions),
            min_fx: f64::INFINITY,
            has_min: false,
            rng,
        })
    }

    /// Checks hyper-parameters and sizes the generations. Runs while the
    /// first generation is being filled.
    fn validate_hparams(&mut self) {
        if let (Some(lower), Some(upper)) = (self.lower.as_mut(), self.upper.as_mut()) {
            for j in 0..lower.len() {
                if upper[j] < lower[j] {
                    warn!(
                        "bounds for dimension {} are out of order ({}, {}), swapping them",
                        j, lower[j], upper[j]
                    );
                    std::mem::swap(&mut lower[j], &mut upper[j]);
                }
            }
        }

        if self.np < 3 {
            warn!("population size must be at least 3, was {}", self.np);
            self.np = 3;
        }

        if self.x.len() != self.np {
            self.x = vec![DVector::zeros(self.dim); self.np];
            self.x_prev = vec![DVector::zeros(self.dim); self.np];
            self.fx = vec![0.0; self.np];
            self.fx_prev = vec![0.0; self.np];
        }
    }

    /// Draws a member of the initial population: normally distributed around
    /// the start point when one is given, uniform within the bounds
    /// otherwise.
    fn fill_first_gen(&mut self) {
        if let Some(start) = &self.start {
            let spread = Normal::new(0.0, 0.5).expect("valid spread");
            for j in 0..self.dim {
                self.trial[j] = start[j] + spread.sample(&mut self.rng);
            }
        } else {
            for j in 0..self.dim {
                let (lower, upper) = match (&self.lower, &self.upper) {
                    (Some(l), Some(u)) => (l[j], u[j]),
                    (Some(l), None) => (l[j], l[j] + 1.0),
                    (None, Some(u)) => (u[j] - 1.0, u[j]),
                    (None, None) => (-1.0, 1.0),
                };
                self.trial[j] = Uniform::new_inclusive(lower, upper).sample(&mut self.rng);
            }
        }

        self.clamp_trial();
    }

    /// Clamps the trial vector into the configured bounds, slot by slot.
    fn clamp_trial(&mut self) {
        if let Some(lower) = &self.lower {
            for j in 0..self.dim {
                if self.trial[j] < lower[j] {
                    self.trial[j] = lower[j];
                }
            }
        }
        if let Some(upper) = &self.upper {
            for j in 0..self.dim {
                if self.trial[j] > upper[j] {
                    self.trial[j] = upper[j];
                }
            }
        }
    }

    fn set_bound_vector(
        slot: &mut Option<DVector<f64>>,
        dim: usize,
        id: &str,
        value: &Value,
    ) -> Result<(), Error> {
        let vector = value.expect_vector(id)?;
        if vector.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: vector.len(),
            });
        }
        *slot = Some(vector.clone());
        Ok(())
    }
}

impl Method for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential evolution"
    }

    fn info(&self) -> Option<&'static str> {
        Some(INFO)
    }

    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        match id {
            "iterations" => {
                self.options.iterations = value.expect_int(id)?;
                self.iterations_left = self.options.iterations;
            }
            "NP" => {
                let np = value.expect_int(id)?.max(0) as usize;
                self.options.np = Some(np);
                self.np = np;
            }
            "F" => self.options.f = value.expect_real(id)?,
            "lambda" => self.options.lambda = value.expect_real(id)?,
            "f_tol" => self.options.f_tol = Some(value.expect_real(id)?),
            "start" => Self::set_bound_vector(&mut self.start, self.dim, id, value)?,
            "lower" => Self::set_bound_vector(&mut self.lower, self.dim, id, value)?,
            "upper" => Self::set_bound_vector(&mut self.upper, self.dim, id, value)?,
            _ => return Err(Error::UnknownHparam(id.to_string())),
        }
        Ok(())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "iterations" => Ok(Value::Int(self.iterations_left)),
            "NP" => Ok(Value::Int(self.np as i64)),
            "F" => Ok(Value::Real(self.options.f)),
            "lambda" => Ok(Value::Real(self.options.lambda)),
            "f_tol" => self
                .options
                .f_tol
                .map(Value::Real)
                .ok_or_else(|| Error::UnknownHparam(id.to_string())),
            "start" => self
                .start
                .as_ref()
                .map(Value::from)
                .ok_or_else(|| Error::UnknownHparam(id.to_string())),
            "lower" => self
                .lower
                .as_ref()
                .map(Value::from)
                .ok_or_else(|| Error::UnknownHparam(id.to_string())),
            "upper" => self
                .upper
                .as_ref()
                .map(Value::from)
                .ok_or_else(|| Error::UnknownHparam(id.to_string())),
            _ => Err(Error::UnknownHparam(id.to_string())),
        }
    }

    fn seed(&mut self, x: &DVector<f64>) -> Result<(), Error> {
        if self.state != State::Initial || self.current != 0 {
            return Err(Error::OutOfSequence);
        }
        self.start = Some(x.clone());
        Ok(())
    }

    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        match self.state {
            State::Initial => {
                self.validate_hparams();
                self.fill_first_gen();
                x.try_copy_from(&self.trial)
            }
            State::Running => {
                // Three distinct population members drive the trial.
                let r1 = self.rng.gen_range(0..self.np);
                let mut r2 = self.rng.gen_range(0..self.np);
                while r2 == r1 {
                    r2 = self.rng.gen_range(0..self.np);
                }
                let mut r3 = self.rng.gen_range(0..self.np);
                while r3 == r1 || r3 == r2 {
                    r3 = self.rng.gen_range(0..self.np);
                }

                let curr = self.current;
                let diff = &self.x_prev[r2] - &self.x_prev[r3];

                if self.options.lambda != 0.0 {
                    // Scheme DE2: bias toward the best member.
                    let bias = &self.x_prev[self.best] - &self.x_prev[curr];
                    self.trial = &self.x_prev[curr]
                        + bias * self.options.lambda
                        + diff * self.options.f;
                } else {
                    // Scheme DE1.
                    self.trial = &self.x_prev[r1] + diff * self.options.f;
                }

                self.clamp_trial();
                x.try_copy_from(&self.trial)
            }
            State::Done => Err(Error::OutOfSequence),
        }
    }

    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        if self.state == State::Done || self.x.is_empty() {
            return Err(Error::OutOfSequence);
        }

        let curr = self.current;

        // Greedy per-slot replacement; the first generation is taken as-is.
        if self.state == State::Initial || fx < self.fx_prev[curr] {
            self.x[curr].copy_from(x);
            self.fx[curr] = fx;
        } else {
            let (slot, prev) = (&mut self.x[curr], &self.x_prev[curr]);
            slot.copy_from(prev);
            self.fx[curr] = self.fx_prev[curr];
        }

        // Record the running minimum the moment it is observed. A new global
        // minimum is always an accepted trial, so its slot keeps dominating
        // both generations from here on.
        if !self.has_min || fx < self.min_fx {
            self.best = curr;
            self.min_x.copy_from(x);
            self.min_fx = fx;
            self.has_min = true;
            info!("new best value {} at slot {}", fx, curr);
        }

        self.current += 1;

        if self.current >= self.np {
            if self.state == State::Initial {
                debug!("finished initial generation of size {}", self.np);
                self.state = State::Running;
            }

            std::mem::swap(&mut self.x, &mut self.x_prev);
            std::mem::swap(&mut self.fx, &mut self.fx_prev);
            self.current = 0;
            self.iterations_left -= 1;
            debug!("generation complete, {} left", self.iterations_left);
        }

        Ok(())
    }

    fn done(&mut self) -> Result<Status, Error> {
        match self.state {
            State::Initial => Ok(Status::InProgress),
            State::Done => Ok(Status::Done),
            State::Running => {
                let target_hit = match self.options.f_tol {
                    Some(f_tol) => self.has_min && self.min_fx < f_tol,
                    None => false,
                };

                if self.iterations_left <= 0 || target_hit {
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
            "minimum x" => Ok(Value::Vector(self.min_x.clone())),
            "minimum f" => Ok(Value::Real(self.min_fx)),
            _ => Err(Error::UnknownResult(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::dvector;

    use crate::driver::Driver;
    use crate::testing::{ackley, drive};

    fn seeded(dim: usize, options: DifferentialEvolutionOptions) -> DifferentialEvolution {
        DifferentialEvolution::with_options(dim, options, StdRng::seed_from_u64(7)).unwrap()
    }

    fn ackley_driver(iterations: i64, np: i64) -> Driver {
        let mut driver = Driver::with_builtins();
        driver.select("differential evolution", 2).unwrap();
        driver.hparam_set("iterations", iterations).unwrap();
        driver.hparam_set("NP", np).unwrap();
        driver.hparam_set("lower", dvector![-5.0, -5.0]).unwrap();
        driver.hparam_set("upper", dvector![5.0, 5.0]).unwrap();
        driver
    }

    #[test]
    fn minimizes_ackley_within_bounds() {
        let mut driver = ackley_driver(200, 20);

        let mut out_of_bounds = 0usize;
        drive(&mut driver, 2, 200 * 20 + 20, |x| {
            if !(-5.0..=5.0).contains(&x[0]) || !(-5.0..=5.0).contains(&x[1]) {
                out_of_bounds += 1;
            }
            ackley(x[0], x[1])
        })
        .unwrap();

        assert_eq!(out_of_bounds, 0);

        let min_f = driver.result("minimum f").unwrap().real().unwrap();
        assert!(min_f < 0.1, "minimum {} not near 0", min_f);

        let min_x = driver.result("minimum x").unwrap();
        let min_x = min_x.vector().unwrap().clone();
        assert!(min_x.norm() < 0.5);
    }

    #[test]
    fn population_best_dominates_both_generations() {
        let options = DifferentialEvolutionOptions::default();
        let mut method = seeded(2, options);
        method
            .hparam_set("iterations", &Value::Int(5))
            .unwrap();
        method.hparam_set("NP", &Value::Int(8)).unwrap();
        method
            .hparam_set("lower", &Value::Vector(dvector![-5.0, -5.0]))
            .unwrap();
        method
            .hparam_set("upper", &Value::Vector(dvector![5.0, 5.0]))
            .unwrap();

        let mut x = DVector::zeros(2);
        let mut reports = 0;

        while !method.done().unwrap().is_done() {
            method.next(&mut x).unwrap();
            method.value(&x, ackley(x[0], x[1])).unwrap();
            reports += 1;

            // At every generation boundary past the bootstrap, the best
            // slot's value must dominate both generations.
            if reports % 8 == 0 && reports >= 16 {
                let best = method.fx_prev[method.best];
                assert!(method.fx_prev.iter().all(|&fx| best <= fx));
                assert!(method.fx.iter().all(|&fx| best <= fx));
            }
        }
    }

    #[test]
    fn tolerance_target_stops_early() {
        let mut driver = ackley_driver(1_000_000, 10);
        driver.hparam_set("f_tol", 0.5).unwrap();

        let evals = drive(&mut driver, 2, 200_000, |x| ackley(x[0], x[1])).unwrap();
        assert!(evals < 200_000);

        let min_f = driver.result("minimum f").unwrap().real().unwrap();
        assert!(min_f < 0.5);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let mut driver = ackley_driver(2, 8);
        driver.hparam_set("lower", dvector![5.0, -5.0]).unwrap();
        driver.hparam_set("upper", dvector![-5.0, 5.0]).unwrap();

        drive(&mut driver, 2, 100, |x| {
            assert!((-5.0..=5.0).contains(&x[0]));
            ackley(x[0], x[1])
        })
        .unwrap();
    }

    #[test]
    fn tiny_population_is_clamped() {
        let mut driver = ackley_driver(1, 1);
        drive(&mut driver, 2, 100, |x| ackley(x[0], x[1])).unwrap();

        assert_eq!(driver.hparam_get("NP").unwrap(), Value::Int(3));
    }

    #[test]
    fn seed_centers_the_initial_population() {
        let mut driver = ackley_driver(1, 8);
        driver.seed(&dvector![2.0, 2.0]).unwrap();

        drive(&mut driver, 2, 100, |x| {
            assert!((x[0] - 2.0).abs() < 4.0, "population member far from seed");
            ackley(x[0], x[1])
        })
        .unwrap();
    }

    #[test]
    fn hparam_roundtrip() {
        let mut driver = ackley_driver(10, 8);

        driver.hparam_set("F", 0.7).unwrap();
        assert_eq!(driver.hparam_get("F").unwrap(), Value::Real(0.7));
        driver.hparam_set("lambda", 0.0).unwrap();
        assert_eq!(driver.hparam_get("lambda").unwrap(), Value::Real(0.0));
        driver.hparam_set("iterations", 10i64).unwrap();
        assert_eq!(driver.hparam_get("iterations").unwrap(), Value::Int(10));

        let lower = driver.hparam_get("lower").unwrap();
        assert_eq!(lower.vector().unwrap(), &dvector![-5.0, -5.0]);

        assert!(matches!(
            driver.hparam_set("CR", 0.9),
            Err(Error::UnknownHparam(_))
        ));
        assert!(matches!(
            driver.hparam_set("lower", dvector![1.0]),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
