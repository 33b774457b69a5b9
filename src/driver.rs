//! High-level API for running ask-tell methods.
//!
//! The [`Driver`] holds one active method instance, forwards protocol calls
//! to it, and maintains a method-independent best-point tracker. The caller
//! owns the evaluation loop:
//!
//! ```rust
//! use asktell::{nalgebra::DVector, Driver};
//!
//! let mut driver = Driver::with_builtins();
//! driver.select("bisection", 1)?;
//! driver.hparam_set("lower", 2.0)?;
//! driver.hparam_set("upper", 3.0)?;
//!
//! let mut x = DVector::zeros(1);
//! while !driver.is_done()?.is_done() {
//!     driver.next(&mut x)?;
//!     let fx = 3.0 * x[0].powi(3) - 5.0 * x[0].powi(2) - 6.0 * x[0] + 5.0;
//!     driver.set_value(&x, fx)?;
//! }
//!
//! let root = driver.result("root")?.real().unwrap();
//! assert!((3.0 * root.powi(3) - 5.0 * root.powi(2) - 6.0 * root + 5.0).abs() < 1e-5);
//! # Ok::<(), asktell::Error>(())
//! ```
//!
//! Selecting a method fixes the dimensionality; every vector subsequently
//! crossing the driver boundary is validated against it. Vectors are borrowed
//! for the duration of a call only -- the driver copies what it needs to
//! retain (the best point), and so must the caller.

use log::debug;
use nalgebra::DVector;

use crate::core::{Error, Method, Registry, Status, Value};

/// Driver for the ask-tell evaluation loop.
///
/// See [module](self) documentation for usage.
pub struct Driver {
    registry: Registry,
    method: Option<Box<dyn Method>>,
    dim: usize,
    best_x: DVector<f64>,
    best_fx: f64,
    has_best: bool,
}

impl Driver {
    /// Creates a driver over the given method registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            method: None,
            dim: 0,
            best_x: DVector::zeros(0),
            best_fx: f64::INFINITY,
            has_best: false,
        }
    }

    /// Creates a driver over the built-in method registry.
    pub fn with_builtins() -> Self {
        Self::new(Registry::with_builtins())
    }

    /// Returns the registry backing this driver.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Selects the method to use by name, fixing the input dimensionality.
    ///
    /// Fails on an unknown name or when the method rejects the
    /// dimensionality. Any previously active instance is torn down first,
    /// together with the best-point tracker.
    pub fn select(&mut self, name: &str, dimensions: usize) -> Result<(), Error> {
        // Tear down the active instance before constructing the new one.
        self.method = None;

        let method = self.registry.build(name, dimensions)?;
        debug!("selected method '{}' with {} dimension(s)", name, dimensions);

        self.method = Some(method);
        self.dim = dimensions;
        self.best_x = DVector::zeros(dimensions);
        self.best_fx = f64::INFINITY;
        self.has_best = false;

        Ok(())
    }

    /// Name of the active method, if one is selected.
    pub fn method_name(&self) -> Option<&'static str> {
        self.method.as_deref().map(|method| method.name())
    }

    /// Dimensionality fixed at method selection.
    pub fn dimensions(&self) -> usize {
        self.dim
    }

    /// Description of the active method, its hyper-parameters, and results.
    pub fn info(&self) -> Result<&'static str, Error> {
        self.active()?.info().ok_or(Error::Unsupported)
    }

    /// Sets a hyper-parameter on the active method.
    pub fn hparam_set(&mut self, id: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        self.active_mut()?.hparam_set(id, &value)
    }

    /// Reads a hyper-parameter back from the active method.
    pub fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        self.active()?.hparam_get(id)
    }

    /// Supplies an initial point to the active method.
    pub fn seed(&mut self, x: &DVector<f64>) -> Result<(), Error> {
        self.check_dim(x)?;
        self.active_mut()?.seed(x)
    }

    /// Writes the next point to evaluate into `x`.
    pub fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error> {
        self.check_dim(x)?;
        self.active_mut()?.next(x)
    }

    /// Reports the objective value for the most recently proposed point.
    ///
    /// On success the best-point tracker is updated, independent of whether
    /// the active method tracks its own best. On failure the instance is left
    /// in its pre-call state and nothing is retried.
    pub fn set_value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error> {
        self.check_dim(x)?;
        self.active_mut()?.value(x, fx)?;
        self.track_best(x, fx);
        Ok(())
    }

    /// Reports the objective value together with its gradient.
    ///
    /// Methods that do not use derivatives fall back to plain
    /// [`set_value`](Driver::set_value) semantics.
    pub fn set_value_with_gradient(
        &mut self,
        x: &DVector<f64>,
        fx: f64,
        gradient: &DVector<f64>,
    ) -> Result<(), Error> {
        self.check_dim(x)?;
        self.check_dim(gradient)?;
        self.active_mut()?.value_with_gradient(x, fx, gradient)?;
        self.track_best(x, fx);
        Ok(())
    }

    /// Queries whether the active method has finished.
    pub fn is_done(&mut self) -> Result<Status, Error> {
        self.active_mut()?.done()
    }

    /// The best point reported so far and its objective value, if any value
    /// has been reported.
    pub fn best(&self) -> Option<(&DVector<f64>, f64)> {
        self.has_best.then(|| (&self.best_x, self.best_fx))
    }

    /// Reads a named result from the active method once it is done.
    pub fn result(&self, id: &str) -> Result<Value, Error> {
        self.active()?.result(id)
    }

    fn active(&self) -> Result<&dyn Method, Error> {
        self.method.as_deref().ok_or(Error::NoMethod)
    }

    fn active_mut(&mut self) -> Result<&mut (dyn Method + 'static), Error> {
        self.method.as_deref_mut().ok_or(Error::NoMethod)
    }

    fn check_dim(&self, x: &DVector<f64>) -> Result<(), Error> {
        if x.len() == self.dim {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: x.len(),
            })
        }
    }

    fn track_best(&mut self, x: &DVector<f64>, fx: f64) {
        if !self.has_best || fx < self.best_fx {
            self.best_x.copy_from(x);
            self.best_fx = fx;
            self.has_best = true;
            debug!("new best value {} reported", fx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::dvector;

    use crate::testing::cubic;

    #[test]
    fn unknown_method_fails() {
        let mut driver = Driver::with_builtins();
        assert!(matches!(
            driver.select("homotopy", 1),
            Err(Error::UnknownMethod(_))
        ));
    }

    #[test]
    fn calls_without_selection_fail() {
        let mut driver = Driver::with_builtins();
        let mut x = DVector::zeros(0);

        assert!(matches!(driver.next(&mut x), Err(Error::NoMethod)));
        assert!(matches!(driver.is_done(), Err(Error::NoMethod)));
        assert!(matches!(driver.result("root"), Err(Error::NoMethod)));
    }

    #[test]
    fn unsupported_operations_are_reported_not_fatal() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();

        // Bisection takes no seed, but the driver keeps working afterwards.
        assert!(matches!(
            driver.seed(&dvector![2.5]),
            Err(Error::Unsupported)
        ));
        assert_eq!(driver.is_done().unwrap(), Status::InProgress);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();

        let mut wide = DVector::zeros(3);
        assert!(matches!(
            driver.next(&mut wide),
            Err(Error::DimensionMismatch { expected: 1, actual: 3 })
        ));
    }

    #[test]
    fn best_tracks_minimum_across_reports() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();
        driver.hparam_set("lower", 2.0).unwrap();
        driver.hparam_set("upper", 3.0).unwrap();

        let mut x = DVector::zeros(1);
        let mut lowest = f64::INFINITY;

        for _ in 0..8 {
            driver.next(&mut x).unwrap();
            let fx = cubic(x[0]);
            driver.set_value(&x, fx).unwrap();
            lowest = lowest.min(fx);
        }

        let (_, best_fx) = driver.best().expect("values were reported");
        assert_eq!(best_fx, lowest);
    }

    #[test]
    fn best_is_empty_before_any_report() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();
        assert!(driver.best().is_none());
    }

    #[test]
    fn reselection_replaces_the_instance() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();
        driver.hparam_set("lower", 2.0).unwrap();

        driver.select("secant", 1).unwrap();
        assert_eq!(driver.method_name(), Some("secant"));

        // Bisection's bounds did not survive into the fresh instance.
        assert!(matches!(
            driver.hparam_get("lower"),
            Err(Error::UnknownHparam(_))
        ));
        assert!(driver.best().is_none());
    }

    #[test]
    fn hparam_roundtrip_through_driver() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();

        driver.hparam_set("x_tol", 1e-9).unwrap();
        assert_eq!(driver.hparam_get("x_tol").unwrap(), Value::Real(1e-9));
    }

    #[test]
    fn info_is_available_for_builtins() {
        let mut driver = Driver::with_builtins();
        driver.select("bisection", 1).unwrap();
        assert!(driver.info().unwrap().contains("bisection"));
    }
}
