//! Comparison and formatting

use super::types::DenseMatrix;
use crate::error::{StrataError, StrataResult};
use crate::scalar::Scalar;
use std::fmt;

impl<T: Scalar> DenseMatrix<T> {
    /// Largest element-wise distance between `self` and `other`
    ///
    /// # Errors
    ///
    /// [`StrataError::DimensionMismatch`] when the shapes differ.
    pub fn max_abs_diff(&self, other: &DenseMatrix<T>) -> StrataResult<f64> {
        if self.shape() != other.shape() {
            return Err(StrataError::dimension_mismatch(
                "compare",
                self.shape(),
                other.shape(),
            ));
        }
        let mut worst = 0.0f64;
        for r in 0..self.nrows {
            for c in 0..self.ncols {
                let a = self.data[self.offset(r, c)];
                let b = other.data[other.offset(r, c)];
                worst = worst.max((a - b).magnitude());
            }
        }
        Ok(worst)
    }

    /// Whether both matrices have the same shape and agree within `tol`
    pub fn approx_eq(&self, other: &DenseMatrix<T>, tol: f64) -> bool {
        self.max_abs_diff(other).map_or(false, |d| d <= tol)
    }
}

/// Logical equality: same shape and same element at every position,
/// independent of storage order
impl<T: Scalar> PartialEq for DenseMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        if self.order == other.order {
            return self.data == other.data;
        }
        (0..self.nrows).all(|r| {
            (0..self.ncols).all(|c| self.data[self.offset(r, c)] == other.data[other.offset(r, c)])
        })
    }
}

impl<T: Scalar> fmt::Debug for DenseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DenseMatrix {}x{} ({:?})",
            self.nrows, self.ncols, self.order
        )?;
        for row in self.rows() {
            writeln!(f, "  {:?}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        let a = DenseMatrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
        let b = DenseMatrix::from_vec(1, 2, vec![1.0, 2.0 + 1e-12]).unwrap();
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&b, 0.0));
        let c = DenseMatrix::from_vec(2, 1, vec![1.0, 2.0]).unwrap();
        assert!(!a.approx_eq(&c, 1.0));
    }

    #[test]
    fn test_debug_lists_rows() {
        let a = DenseMatrix::from_vec(2, 1, vec![1, 2]).unwrap();
        let s = format!("{:?}", a);
        assert!(s.contains("2x1"));
        assert!(s.contains("[2]"));
    }
}
