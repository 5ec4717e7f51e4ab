//! Write proxy bound to one position of a structured matrix

use crate::adaptor::StructuredMatrix;
use crate::structure::{CellClass, Structure};
use std::fmt;
use strata_core::{MatrixStorage, MatrixStorageMut, Scalar, StrataError, StrataResult};

/// Handle to position `(row, col)` of a [`StructuredMatrix`]
///
/// Holds no data of its own. Every write checks the position against the
/// structure before touching storage; mirrored positions are stored as a
/// pair or not at all. Dropping the proxy does nothing.
///
/// # Examples
///
/// ```
/// use strata_adapt::{StructuredMatrix, Upper};
/// use strata_core::StrataError;
///
/// let mut u = StructuredMatrix::<f64, Upper>::zeros(4).unwrap();
/// let mut p = u.at_mut(0, 2).unwrap();
/// p.set(3.0).unwrap();
/// p.add_assign(1.5).unwrap();
/// assert_eq!(p.get(), 4.5);
///
/// let err = u.at_mut(3, 1).unwrap().set(9.0).unwrap_err();
/// assert!(matches!(err, StrataError::StructuralViolation { .. }));
/// ```
pub struct ElementProxy<'m, T, S, M> {
    matrix: &'m mut StructuredMatrix<T, S, M>,
    row: usize,
    col: usize,
}

impl<'m, T, S, M> ElementProxy<'m, T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorageMut<T>,
{
    pub(crate) fn new(matrix: &'m mut StructuredMatrix<T, S, M>, row: usize, col: usize) -> Self {
        Self { matrix, row, col }
    }

    /// `(row, col)` this proxy is bound to
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Whether writes to this position are rejected
    pub fn is_restricted(&self) -> bool {
        S::KIND.classify(self.row, self.col) == CellClass::Restricted
    }

    /// Current value
    pub fn get(&self) -> T {
        self.matrix.read(self.row, self.col)
    }

    /// Store `value`
    ///
    /// # Errors
    ///
    /// - [`StrataError::StructuralViolation`] for a restricted position
    /// - [`StrataError::InvalidValue`] for a non-real Hermitian diagonal value
    ///
    /// On error nothing is stored.
    pub fn set(&mut self, value: T) -> StrataResult<()> {
        let (row, col) = (self.row, self.col);
        let kind = S::KIND;
        if let Err(err) = kind.check_write(row, col, value) {
            tracing::trace!(structure = %kind, row, col, "rejected structured write");
            return Err(err);
        }

        let storage = &mut self.matrix.storage;
        if kind.classify(row, col) != CellClass::Mirrored {
            return storage.set(row, col, value);
        }

        let previous = storage.at(row, col);
        storage.set(row, col, value)?;
        if let Err(err) = storage.set(col, row, kind.mirror(value)) {
            // restore the first store so the pair stays consistent
            if let Err(restore) = storage.set(row, col, previous) {
                tracing::warn!(structure = %kind, row, col, error = %restore, "failed to restore mirrored write");
            }
            return Err(err);
        }
        Ok(())
    }

    /// `self = self + rhs`
    pub fn add_assign(&mut self, rhs: T) -> StrataResult<()> {
        let value = self.get() + rhs;
        self.set(value)
    }

    /// `self = self - rhs`
    pub fn sub_assign(&mut self, rhs: T) -> StrataResult<()> {
        let value = self.get() - rhs;
        self.set(value)
    }

    /// `self = self * rhs`
    pub fn mul_assign(&mut self, rhs: T) -> StrataResult<()> {
        let value = self.get() * rhs;
        self.set(value)
    }

    /// `self = self / rhs`
    ///
    /// Integer division by zero is reported as [`StrataError::InvalidValue`].
    pub fn div_assign(&mut self, rhs: T) -> StrataResult<()> {
        if T::KIND.is_integer() && rhs == T::zero() {
            return Err(StrataError::invalid_value(
                self.row,
                self.col,
                "integer division by zero",
            ));
        }
        let value = self.get() / rhs;
        self.set(value)
    }

    /// Store zero
    pub fn reset(&mut self) -> StrataResult<()> {
        self.set(T::zero())
    }
}

impl<T, S, M> fmt::Debug for ElementProxy<'_, T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorageMut<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementProxy")
            .field("structure", &S::KIND)
            .field("row", &self.row)
            .field("col", &self.col)
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::adaptor::StructuredMatrix;
    use crate::structure::{Diagonal, Hermitian, StrictlyLower, Symmetric, UniUpper};
    use std::cell::Cell;
    use std::rc::Rc;
    use strata_core::{
        Complex, DenseMatrix, MatrixStorage, MatrixStorageMut, StorageId, StrataError, StrataResult,
    };

    /// Dense storage that refuses writes once its shared budget runs out
    #[derive(Debug)]
    struct Budgeted {
        inner: DenseMatrix<f64>,
        budget: Rc<Cell<usize>>,
        attempts: usize,
    }

    impl MatrixStorage<f64> for Budgeted {
        fn nrows(&self) -> usize {
            self.inner.nrows()
        }

        fn ncols(&self) -> usize {
            self.inner.ncols()
        }

        fn at(&self, row: usize, col: usize) -> f64 {
            self.inner[(row, col)]
        }

        fn storage_id(&self) -> StorageId {
            StorageId::of(&self.inner)
        }
    }

    impl MatrixStorageMut<f64> for Budgeted {
        fn set(&mut self, row: usize, col: usize, value: f64) -> StrataResult<()> {
            self.attempts += 1;
            if self.budget.get() == 0 {
                return Err(StrataError::InvalidStorage {
                    reason: format!("write {} refused", self.attempts),
                });
            }
            self.budget.set(self.budget.get() - 1);
            self.inner[(row, col)] = value;
            Ok(())
        }

        fn allocate(nrows: usize, ncols: usize) -> StrataResult<Self> {
            Ok(Self {
                inner: DenseMatrix::zeros(nrows, ncols),
                budget: Rc::new(Cell::new(usize::MAX)),
                attempts: 0,
            })
        }
    }

    #[test]
    fn test_mirrored_write() {
        let mut s = StructuredMatrix::<f64, Symmetric>::zeros(6).unwrap();
        s.at_mut(2, 5).unwrap().set(7.0).unwrap();
        assert_eq!(s.read(2, 5), 7.0);
        assert_eq!(s.read(5, 2), 7.0);

        s.at_mut(5, 2).unwrap().mul_assign(2.0).unwrap();
        assert_eq!(s.read(2, 5), 14.0);
    }

    #[test]
    fn test_failed_mirror_reports_first_error() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let storage = Budgeted {
            inner: DenseMatrix::zeros(2, 2),
            budget: Rc::clone(&budget),
            attempts: 0,
        };
        let mut s = StructuredMatrix::<f64, Symmetric, Budgeted>::try_new(storage).unwrap();
        let before = s.storage().attempts;

        // the first store lands, the mirror store and the restore are refused
        budget.set(1);
        let err = s.at_mut(0, 1).unwrap().set(3.0).unwrap_err();
        match err {
            StrataError::InvalidStorage { reason } => {
                assert_eq!(reason, format!("write {} refused", before + 2));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(s.storage().attempts, before + 3);
    }

    #[test]
    fn test_hermitian_rules() {
        let mut h = StructuredMatrix::<Complex<f64>, Hermitian>::zeros(3).unwrap();
        h.at_mut(0, 1).unwrap().set(Complex::new(1.0, 2.0)).unwrap();
        assert_eq!(h.read(1, 0), Complex::new(1.0, -2.0));

        let err = h.at_mut(1, 1).unwrap().set(Complex::new(1.0, 0.1)).unwrap_err();
        assert!(matches!(err, StrataError::InvalidValue { row: 1, col: 1, .. }));
        assert_eq!(h.read(1, 1), Complex::new(0.0, 0.0));
        h.at_mut(1, 1).unwrap().set(Complex::new(4.0, 0.0)).unwrap();
    }

    #[test]
    fn test_compound_ops_obey_structure() {
        let mut u = StructuredMatrix::<i32, UniUpper>::zeros(3).unwrap();
        assert!(u.at_mut(1, 1).unwrap().is_restricted());
        assert!(u.at_mut(1, 1).unwrap().add_assign(1).is_err());
        assert!(u.at_mut(1, 1).unwrap().reset().is_err());
        assert_eq!(u.read(1, 1), 1);

        let mut p = u.at_mut(0, 2).unwrap();
        p.set(9).unwrap();
        p.sub_assign(3).unwrap();
        p.div_assign(2).unwrap();
        assert_eq!(p.get(), 3);
        assert!(matches!(p.div_assign(0), Err(StrataError::InvalidValue { .. })));
        p.reset().unwrap();
        assert_eq!(u.read(0, 2), 0);
    }

    #[test]
    fn test_strict_and_diagonal() {
        let mut l = StructuredMatrix::<f64, StrictlyLower>::zeros(2).unwrap();
        assert!(l.write(0, 0, 1.0).is_err());
        l.write(1, 0, 2.0).unwrap();
        assert_eq!(l.at_mut(1, 0).unwrap().position(), (1, 0));

        let mut d = StructuredMatrix::<f64, Diagonal>::zeros(2).unwrap();
        d.write(1, 1, 5.0).unwrap();
        assert!(d.write(0, 1, 5.0).is_err());
        assert!(matches!(d.at_mut(2, 0), Err(StrataError::OutOfBounds { .. })));
    }
}
