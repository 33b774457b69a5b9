use thiserror::Error;

/// Error returned from the [`Driver`](crate::Driver) and from method
/// implementations.
///
/// The variants fall into four classes: configuration errors (unknown method
/// name, unsupported dimensionality, unknown hyper-parameter or result id),
/// sequencing violations (calling an operation the method's current state
/// does not admit), numerical hazards detected while stepping, and dimension
/// mismatches of vectors crossing the call boundary.
///
/// Numerical hazards poison the instance: once a method reports
/// [`InvalidBracket`](Error::InvalidBracket) or
/// [`VanishingDerivative`](Error::VanishingDerivative), every subsequent call
/// on that instance fails with [`Failed`](Error::Failed) instead of
/// continuing from inconsistent state.
#[derive(Debug, Error)]
pub enum Error {
    /// No method with the given name exists in the registry.
    #[error("no method named '{0}'")]
    UnknownMethod(String),
    /// The method does not support the requested input dimensionality.
    #[error("method does not support {0}-dimensional input")]
    InvalidDimensionality(usize),
    /// The method does not declare a hyper-parameter with the given id.
    #[error("no hyper-parameter named '{0}'")]
    UnknownHparam(String),
    /// A hyper-parameter was given a value of the wrong type or shape.
    #[error("'{id}' expects {expected}")]
    HparamType {
        /// Id of the offending hyper-parameter.
        id: String,
        /// Human-readable description of the expected payload.
        expected: &'static str,
    },
    /// The method does not produce a result with the given id.
    #[error("no result named '{0}'")]
    UnknownResult(String),
    /// A result was requested before the method reported completion.
    #[error("result is not available until the method reports done")]
    NotFinished,
    /// The active method does not implement the requested optional operation.
    #[error("operation is not supported by the active method")]
    Unsupported,
    /// No method has been selected on the driver.
    #[error("no method has been selected")]
    NoMethod,
    /// The call is not valid in the method's current state.
    #[error("call is not valid in the method's current state")]
    OutOfSequence,
    /// Objective values at the bracket endpoints have the same sign.
    #[error("objective values at the bracket endpoints must have opposite signs")]
    InvalidBracket,
    /// A derivative or finite-difference denominator is too close to zero to
    /// divide by.
    #[error("derivative or difference denominator is too close to zero")]
    VanishingDerivative,
    /// A vector's length does not match the dimensionality fixed at method
    /// selection.
    #[error("vector has length {actual}, expected {expected}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length of the offending vector.
        actual: usize,
    },
    /// A reported objective value (NaN) cannot be ordered against zero.
    #[error("objective value {0} is not comparable to zero")]
    IncomparableValue(f64),
    /// The instance failed irrecoverably earlier and must be selected anew.
    #[error("method failed irrecoverably and must be selected anew")]
    Failed,
}
