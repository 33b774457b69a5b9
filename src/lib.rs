#![warn(missing_docs)]

//! # asktell
//!
//! An ask-tell driver and toolbox of iterative numerical methods --
//! root-finders, local and global minimizers, gradient estimators, and
//! quadrature rules -- where the caller, not the algorithm, owns the
//! evaluation loop.
//!
//! Most numerical libraries call the objective function themselves. Here the
//! control flow is inverted: a method proposes the next point to evaluate,
//! suspends, and resumes when the caller reports the value back. That makes
//! the objective function a plain value exchange -- it can live in another
//! process, require hardware in the loop, or be priced per call -- and it
//! makes every algorithm an explicit state machine, because "what to try
//! next" and "everything needed to resume" must be carried between calls.
//!
//! ## Protocol
//!
//! All methods speak the same four-step protocol through the [`Driver`]:
//!
//! 1. [`next`](Driver::next) -- ask for the next point to try,
//! 2. evaluate the objective function yourself,
//! 3. [`set_value`](Driver::set_value) -- tell the method what you measured,
//! 4. [`is_done`](Driver::is_done) -- check for convergence; once terminal,
//!    read named [`result`](Driver::result)s.
//!
//! Methods are selected by name from a [`Registry`] and configured through
//! string-keyed hyper-parameters, so algorithms as different as bisection
//! and differential evolution are swappable at runtime.
//!
//! ## Methods
//!
//! * Root-finding: [bisection](methods::bisection),
//!   [secant](methods::secant), [Newton-Raphson](methods::newton_raphson),
//!   [Brent-Dekker](methods::brent_dekker)
//! * Local minimization: [Brent's local minimum
//!   search](methods::brent_localmin), [Nelder-Mead](methods::nelder_mead)
//! * Global minimization: [differential
//!   evolution](methods::differential_evolution)
//! * Derivatives: [gradient estimation](methods::gradient_estimate)
//! * Quadrature: [trapezoidal rule](methods::trapezoidal), [Simpson's
//!   rule](methods::simpson)
//!
//! ## Example
//!
//! Finding a root of 3x³ − 5x² − 6x + 5 inside \[2, 3\]:
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
//! Switching to the superlinear Brent-Dekker method is a different `select`
//! call and hyper-parameter set; the loop does not change.
//!
//! ## Diagnostics
//!
//! The crate logs state transitions and step decisions through the
//! [`log`](https://docs.rs/log) facade. Diagnostics never influence control
//! flow or returned values; install and configure any logger implementation
//! to see them.
//!
//! ## License
//!
//! Licensed under MIT.

mod core;
pub mod driver;
pub mod methods;

pub use core::*;
pub use driver::Driver;

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
