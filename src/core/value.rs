use nalgebra::DVector;

use super::error::Error;

/// Payload of a hyper-parameter or a named result.
///
/// Hyper-parameters and results are exchanged as key/value pairs keyed by
/// short strings (e.g. `"lower"`, `"f_tol"`, `"NP"`, `"root"`,
/// `"minimum x"`). The key is untyped; the carrier is not. Each method
/// documents which keys it declares and which payload kind every key expects,
/// and fails on anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A double-precision scalar.
    Real(f64),
    /// An integral count (population size, iteration budget, subintervals).
    Int(i64),
    /// A vector of the method's dimensionality.
    Vector(DVector<f64>),
}

impl Value {
    /// Returns the scalar payload, if this value carries one.
    pub fn real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer payload, if this value carries one.
    pub fn int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the vector payload, if this value carries one.
    pub fn vector(&self) -> Option<&DVector<f64>> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Extracts the scalar payload or fails with a typed error naming `id`.
    pub fn expect_real(&self, id: &str) -> Result<f64, Error> {
        self.real().ok_or_else(|| Error::HparamType {
            id: id.to_string(),
            expected: "a real number",
        })
    }

    /// Extracts the integer payload or fails with a typed error naming `id`.
    pub fn expect_int(&self, id: &str) -> Result<i64, Error> {
        self.int().ok_or_else(|| Error::HparamType {
            id: id.to_string(),
            expected: "an integer",
        })
    }

    /// Extracts the vector payload or fails with a typed error naming `id`.
    pub fn expect_vector(&self, id: &str) -> Result<&DVector<f64>, Error> {
        self.vector().ok_or_else(|| Error::HparamType {
            id: id.to_string(),
            expected: "a vector",
        })
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<DVector<f64>> for Value {
    fn from(v: DVector<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<&DVector<f64>> for Value {
    fn from(v: &DVector<f64>) -> Self {
        Value::Vector(v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::dvector;

    #[test]
    fn accessors_match_carrier() {
        assert_eq!(Value::from(0.5).real(), Some(0.5));
        assert_eq!(Value::from(0.5).int(), None);
        assert_eq!(Value::from(20i64).int(), Some(20));
        assert_eq!(Value::from(dvector![1.0, 2.0]).vector(), Some(&dvector![1.0, 2.0]));
    }

    #[test]
    fn expect_fails_with_typed_error() {
        let err = Value::from(1i64).expect_real("f_tol").unwrap_err();
        assert!(matches!(err, Error::HparamType { .. }));
    }
}
