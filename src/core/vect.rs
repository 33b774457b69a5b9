//! Checked vector operations used across the ask-tell boundary.
//!
//! Vectors are plain [`DVector<f64>`] values with owned storage. nalgebra's
//! own arithmetic panics on shape disagreement, which is the right behavior
//! inside an algorithm where lengths are invariants, but vectors arriving
//! from the caller are untrusted. This module provides the checked
//! counterparts that turn a length mismatch into an explicit [`Error`].

use nalgebra::DVector;

use super::error::Error;

/// Checked elementwise operations over dynamically sized vectors.
pub trait VectorOps {
    /// Copies `src` into `self`, failing if the lengths differ.
    fn try_copy_from(&mut self, src: &DVector<f64>) -> Result<(), Error>;

    /// Returns the elementwise sum, failing if the lengths differ.
    fn try_add(&self, rhs: &DVector<f64>) -> Result<DVector<f64>, Error>;

    /// Returns the elementwise difference, failing if the lengths differ.
    fn try_sub(&self, rhs: &DVector<f64>) -> Result<DVector<f64>, Error>;

    /// Returns the vector scaled by `factor`.
    fn scaled(&self, factor: f64) -> DVector<f64>;

    /// Zeroes every element in place.
    fn reset(&mut self);

    /// The Euclidean norm.
    fn l2norm(&self) -> f64;

    /// The Euclidean distance to `other`, failing if the lengths differ.
    fn distance(&self, other: &DVector<f64>) -> Result<f64, Error>;
}

fn check_len(expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

impl VectorOps for DVector<f64> {
    fn try_copy_from(&mut self, src: &DVector<f64>) -> Result<(), Error> {
        check_len(self.len(), src.len())?;
        self.copy_from(src);
        Ok(())
    }

    fn try_add(&self, rhs: &DVector<f64>) -> Result<DVector<f64>, Error> {
        check_len(self.len(), rhs.len())?;
        Ok(self + rhs)
    }

    fn try_sub(&self, rhs: &DVector<f64>) -> Result<DVector<f64>, Error> {
        check_len(self.len(), rhs.len())?;
        Ok(self - rhs)
    }

    fn scaled(&self, factor: f64) -> DVector<f64> {
        self * factor
    }

    fn reset(&mut self) {
        self.fill(0.0);
    }

    fn l2norm(&self) -> f64 {
        self.norm()
    }

    fn distance(&self, other: &DVector<f64>) -> Result<f64, Error> {
        let diff = self.try_sub(other)?;
        Ok(diff.l2norm())
    }
}
