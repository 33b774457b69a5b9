//! Objective functions and loop drivers useful for benchmarking, debugging
//! and smoke testing.
//!
//! The functions here are classic test problems; the drivers run the full
//! ask-tell loop against a closure standing in for the caller's objective
//! function.
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)

#![allow(unused)]

use nalgebra::DVector;
use thiserror::Error;

use crate::core::Error as CoreError;
use crate::driver::Driver;

/// The cubic 3x^3 - 5x^2 - 6x + 5.
///
/// It has three real roots; the one inside \[2, 3\] is bracketed by
/// f(2) = -3 and f(3) = 23.
pub fn cubic(x: f64) -> f64 {
    3.0 * x.powi(3) - 5.0 * x.powi(2) - 6.0 * x + 5.0
}

/// Derivative of [`cubic`].
pub fn cubic_derivative(x: f64) -> f64 {
    9.0 * x.powi(2) - 10.0 * x - 6.0
}

/// [Rosenbrock function](https://en.wikipedia.org/wiki/Rosenbrock_function)
/// with a = 1, b = 100. The minimum sits at (1, 1) inside a long, narrow,
/// parabolic valley.
pub fn rosenbrock(x: f64, y: f64) -> f64 {
    (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2)
}

/// [Ackley function](https://en.wikipedia.org/wiki/Ackley_function) in two
/// dimensions. Many local minima; the global minimum is 0 at the origin.
pub fn ackley(x: f64, y: f64) -> f64 {
    -20.0 * (-0.2 * (0.5 * (x * x + y * y)).sqrt()).exp()
        - (0.5 * ((2.0 * std::f64::consts::PI * x).cos() + (2.0 * std::f64::consts::PI * y).cos()))
            .exp()
        + std::f64::consts::E
        + 20.0
}

/// Sum of squares; the global minimum is 0 at the origin.
pub fn sphere(x: &DVector<f64>) -> f64 {
    x.iter().map(|xi| xi * xi).sum()
}

/// Error of the testing loop drivers.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Error reported by the driver or the method.
    #[error("{0}")]
    Inner(#[from] CoreError),
    /// The method did not finish within the evaluation budget.
    #[error("method did not finish within the evaluation budget")]
    Termination,
}

/// Runs the ask-tell loop against `f` until the method reports done,
/// returning the number of evaluations spent.
pub fn drive<F>(
    driver: &mut Driver,
    dim: usize,
    max_evals: usize,
    mut f: F,
) -> Result<usize, DriveError>
where
    F: FnMut(&DVector<f64>) -> f64,
{
    let mut x = DVector::zeros(dim);
    let mut evals = 0;

    while !driver.is_done()?.is_done() {
        if evals == max_evals {
            return Err(DriveError::Termination);
        }

        driver.next(&mut x)?;
        let fx = f(&x);
        driver.set_value(&x, fx)?;
        evals += 1;
    }

    Ok(evals)
}

/// Runs the ask-tell loop reporting values together with gradients,
/// returning the number of evaluations spent.
pub fn drive_with_gradient<F, G>(
    driver: &mut Driver,
    dim: usize,
    max_evals: usize,
    mut f: F,
    mut gradient: G,
) -> Result<usize, DriveError>
where
    F: FnMut(&DVector<f64>) -> f64,
    G: FnMut(&DVector<f64>) -> DVector<f64>,
{
    let mut x = DVector::zeros(dim);
    let mut evals = 0;

    while !driver.is_done()?.is_done() {
        if evals == max_evals {
            return Err(DriveError::Termination);
        }

        driver.next(&mut x)?;
        let fx = f(&x);
        let g = gradient(&x);
        driver.set_value_with_gradient(&x, fx, &g)?;
        evals += 1;
    }

    Ok(evals)
}

/// Integrates `f` over \[lower, upper\] with `n` subintervals using the
/// named quadrature method.
pub fn integrate<F>(
    method: &str,
    lower: f64,
    upper: f64,
    n: i64,
    mut f: F,
) -> Result<f64, DriveError>
where
    F: FnMut(f64) -> f64,
{
    let mut driver = Driver::with_builtins();
    driver.select(method, 1)?;
    driver.hparam_set("lower", lower)?;
    driver.hparam_set("upper", upper)?;
    driver.hparam_set("n", n)?;

    drive(&mut driver, 1, n as usize + 2, |x| f(x[0]))?;

    let area = driver.result("area")?;
    Ok(area.real().expect("area is a real value"))
}
