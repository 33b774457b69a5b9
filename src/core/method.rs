use nalgebra::DVector;

use super::{error::Error, value::Value};

/// Completion state reported by [`Method::done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The method wants more evaluations.
    InProgress,
    /// The method has converged or exhausted its budget; results are
    /// readable.
    Done,
}

impl Status {
    /// Returns true for [`Status::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }
}

/// Interface every iterative method satisfies.
///
/// A method never calls the objective function. It proposes the next point to
/// evaluate ([`next`](Method::next)), suspends, and resumes when the caller
/// reports the objective value for that point ([`value`](Method::value)).
/// Everything the algorithm needs to continue is carried in explicit state,
/// so each `value` report advances the state machine by exactly one discrete
/// step.
///
/// The canonical loop, with the caller owning the evaluation:
///
/// ```text
/// while method.done()? == InProgress {
///     method.next(&mut x)?;
///     let fx = objective(&x);     // caller's code, outside the method
///     method.value(&x, fx)?;
/// }
/// let answer = method.result("...")?;
/// ```
///
/// `next` is *repeatable*: it derives the pending candidate from persistent
/// state and commits nothing, so calling it again without an intervening
/// `value` re-derives the candidate (stochastic methods re-draw it). The
/// vector returned by the most recent `next` call is the one `value` must
/// report on.
///
/// Only `name`, `next`, `value`, and `done` are required. The optional
/// operations have defaults that report the operation as unavailable, which
/// the [`Driver`](crate::Driver) surfaces as a distinct failure rather than a
/// crash.
pub trait Method {
    /// Name under which the method is selected.
    fn name(&self) -> &'static str;

    /// Human-readable description of the method, its hyper-parameters, and
    /// its results.
    fn info(&self) -> Option<&'static str> {
        None
    }

    /// Sets the hyper-parameter `id`. Fails on an undeclared id or a payload
    /// of the wrong type.
    fn hparam_set(&mut self, id: &str, value: &Value) -> Result<(), Error> {
        let _ = value;
        Err(Error::UnknownHparam(id.to_string()))
    }

    /// Reads the hyper-parameter `id` back. Fails on an undeclared id.
    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        Err(Error::UnknownHparam(id.to_string()))
    }

    /// Supplies an initial point. Legal only before the first
    /// [`next`](Method::next) on methods that support seeding.
    fn seed(&mut self, x: &DVector<f64>) -> Result<(), Error> {
        let _ = x;
        Err(Error::Unsupported)
    }

    /// Writes the next point to evaluate into `x`.
    fn next(&mut self, x: &mut DVector<f64>) -> Result<(), Error>;

    /// Reports the objective value `fx` at `x`, the vector most recently
    /// returned by [`next`](Method::next) (or an accepted seed). Advances the
    /// state machine by exactly one step; on failure the instance is left in
    /// its pre-call state unless the failure is a poisoning numerical hazard.
    fn value(&mut self, x: &DVector<f64>, fx: f64) -> Result<(), Error>;

    /// Reports the objective value together with its gradient at `x`.
    ///
    /// Derivative-based methods override this; everything else ignores the
    /// gradient and falls back to [`value`](Method::value).
    fn value_with_gradient(
        &mut self,
        x: &DVector<f64>,
        fx: f64,
        gradient: &DVector<f64>,
    ) -> Result<(), Error> {
        let _ = gradient;
        self.value(x, fx)
    }

    /// Queries whether the method has finished.
    ///
    /// A method may lazily record its final answer the first time the
    /// convergence threshold is observed, but the transition is idempotent:
    /// repeated calls without an intervening [`value`](Method::value) return
    /// the same outcome.
    fn done(&mut self) -> Result<Status, Error>;

    /// Reads the named result once [`done`](Method::done) signals
    /// [`Status::Done`]. Methods without extra results fail every lookup.
    fn result(&self, id: &str) -> Result<Value, Error> {
        Err(Error::UnknownResult(id.to_string()))
    }
}
