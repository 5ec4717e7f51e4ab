//! Structured matrix adaptor
//!
//! [`StructuredMatrix`] owns a square storage matrix and a type-level
//! [`Structure`] tag. Reads of restricted positions return the implied value,
//! and every write goes through an [`ElementProxy`], so the structure holds
//! after every mutation that returns `Ok`.

use crate::proxy::ElementProxy;
use crate::structure::{CellClass, Structure, StructureKind};
use std::marker::PhantomData;
use strata_core::{
    check_bounds, DenseMatrix, Density, MatrixStorage, MatrixStorageMut, Scalar, StorageId,
    StrataError, StrataResult,
};

/// Square matrix that keeps a structural invariant on every write
///
/// # Examples
///
/// ```
/// use strata_adapt::{Symmetric, StructuredMatrix};
///
/// let mut s = StructuredMatrix::<f64, Symmetric>::zeros(6).unwrap();
/// s.write(2, 5, 7.0).unwrap();
/// assert_eq!(s.read(2, 5), 7.0);
/// assert_eq!(s.read(5, 2), 7.0);
/// ```
#[derive(Debug, Clone)]
pub struct StructuredMatrix<T, S, M = DenseMatrix<T>> {
    pub(crate) storage: M,
    pub(crate) tolerance: f64,
    _marker: PhantomData<(T, S)>,
}

/// Symmetric adaptor over dense storage
pub type SymmetricMatrix<T> = StructuredMatrix<T, crate::Symmetric>;
/// Hermitian adaptor over dense storage
pub type HermitianMatrix<T> = StructuredMatrix<T, crate::Hermitian>;
/// Upper-triangular adaptor over dense storage
pub type UpperMatrix<T> = StructuredMatrix<T, crate::Upper>;
/// Lower-triangular adaptor over dense storage
pub type LowerMatrix<T> = StructuredMatrix<T, crate::Lower>;
/// Diagonal adaptor over dense storage
pub type DiagonalMatrix<T> = StructuredMatrix<T, crate::Diagonal>;

impl<T, S, M> StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorageMut<T>,
{
    /// Wrap existing storage, validating the structure exactly
    ///
    /// # Errors
    ///
    /// - [`StrataError::DimensionMismatch`] when the storage is not square
    /// - [`StrataError::StructuralViolation`] when a restricted position does
    ///   not hold its implied value
    /// - [`StrataError::InvalidValue`] when mirrored positions disagree or a
    ///   Hermitian diagonal entry is not real
    pub fn try_new(storage: M) -> StrataResult<Self> {
        Self::try_new_with_tolerance(storage, 0.0)
    }

    /// Wrap existing storage, accepting deviations up to `tolerance`
    ///
    /// Accepted storage is normalized: restricted positions are reset to
    /// their implied values and the lower half of a mirrored structure is
    /// rebuilt from the upper half.
    pub fn try_new_with_tolerance(storage: M, tolerance: f64) -> StrataResult<Self> {
        if storage.nrows() != storage.ncols() {
            return Err(StrataError::dimension_mismatch(
                "structured matrix",
                storage.shape(),
                (storage.ncols(), storage.ncols()),
            ));
        }
        check_structure(S::KIND, &storage, tolerance)?;

        let mut matrix = Self {
            storage,
            tolerance,
            _marker: PhantomData,
        };
        if tolerance > 0.0 {
            matrix.normalize()?;
        }
        Ok(matrix)
    }

    /// Empty adaptor of size `n`
    ///
    /// Uni-triangular structures start with a unit diagonal.
    pub fn zeros(n: usize) -> StrataResult<Self> {
        let mut storage = M::allocate(n, n)?;
        if S::KIND.has_unit_diagonal() {
            for i in 0..n {
                storage.set(i, i, T::one())?;
            }
        }
        Ok(Self {
            storage,
            tolerance: 0.0,
            _marker: PhantomData,
        })
    }

    /// Build an adaptor from a function over the writable positions
    ///
    /// `f` is called for every writable position and for the upper half of
    /// mirrored positions; the rest follows from the structure.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> T) -> StrataResult<Self> {
        let mut matrix = Self::zeros(n)?;
        for row in 0..n {
            for col in 0..n {
                match S::KIND.classify(row, col) {
                    CellClass::Writable => matrix.write(row, col, f(row, col))?,
                    CellClass::Mirrored if row < col => matrix.write(row, col, f(row, col))?,
                    _ => {}
                }
            }
        }
        Ok(matrix)
    }

    /// Tolerance used when validating bulk sources
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Proxy for position `(row, col)`
    pub fn at_mut(&mut self, row: usize, col: usize) -> StrataResult<ElementProxy<'_, T, S, M>> {
        check_bounds(row, col, self.storage.shape())?;
        Ok(ElementProxy::new(self, row, col))
    }

    /// Write `value` at `(row, col)` through a proxy
    pub fn write(&mut self, row: usize, col: usize, value: T) -> StrataResult<()> {
        self.at_mut(row, col)?.set(value)
    }

    /// Check that `source` could be committed without breaking the structure
    pub fn validate_source<Src>(&self, source: &Src) -> StrataResult<()>
    where
        Src: MatrixStorage<T> + ?Sized,
    {
        if source.shape() != self.storage.shape() {
            return Err(StrataError::dimension_mismatch(
                "structured commit",
                self.storage.shape(),
                source.shape(),
            ));
        }
        check_structure(S::KIND, source, self.tolerance)
    }

    /// Replace the contents with `source`, all or nothing
    ///
    /// The whole source is validated first; nothing is written when
    /// validation fails. Accepted values are written through proxies.
    pub fn commit_from<Src>(&mut self, source: &Src) -> StrataResult<()>
    where
        Src: MatrixStorage<T> + ?Sized,
    {
        self.validate_source(source)?;
        let n = self.size();
        for row in 0..n {
            for col in 0..n {
                match S::KIND.classify(row, col) {
                    CellClass::Writable => {
                        let value = source.at(row, col);
                        let value = if S::KIND == StructureKind::Hermitian {
                            real_part(value)
                        } else {
                            value
                        };
                        self.write(row, col, value)?;
                    }
                    CellClass::Mirrored if row < col => {
                        self.write(row, col, source.at(row, col))?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn normalize(&mut self) -> StrataResult<()> {
        let n = self.size();
        for row in 0..n {
            for col in 0..n {
                match S::KIND.classify(row, col) {
                    CellClass::Restricted => {
                        if let Some(implied) = S::KIND.implied(row, col) {
                            self.storage.set(row, col, implied)?;
                        }
                    }
                    CellClass::Writable if S::KIND == StructureKind::Hermitian => {
                        let value = real_part(self.storage.at(row, col));
                        self.storage.set(row, col, value)?;
                    }
                    CellClass::Mirrored if row > col => {
                        let value = S::KIND.mirror(self.storage.at(col, row));
                        self.storage.set(row, col, value)?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl<T, S, M> StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorage<T>,
{
    /// Runtime structure tag
    pub fn kind(&self) -> StructureKind {
        S::KIND
    }

    /// Side length
    pub fn size(&self) -> usize {
        self.storage.nrows()
    }

    /// Validation tolerance
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Underlying storage
    pub fn storage(&self) -> &M {
        &self.storage
    }

    /// Unwrap the storage
    pub fn into_inner(self) -> M {
        self.storage
    }

    /// Element at `(row, col)`
    ///
    /// Restricted positions report their implied value.
    ///
    /// # Panics
    ///
    /// Panics when the position is out of bounds.
    pub fn read(&self, row: usize, col: usize) -> T {
        let n = self.size();
        assert!(
            row < n && col < n,
            "index ({row}, {col}) out of bounds for {n}x{n} matrix"
        );
        S::KIND
            .implied(row, col)
            .unwrap_or_else(|| self.storage.at(row, col))
    }

    /// Checked element read
    pub fn try_read(&self, row: usize, col: usize) -> StrataResult<T> {
        check_bounds(row, col, self.storage.shape())?;
        Ok(self.read(row, col))
    }

    /// Whether `(row, col)` accepts writes
    pub fn is_writable(&self, row: usize, col: usize) -> bool {
        S::KIND.classify(row, col) != CellClass::Restricted
    }

    /// Dense copy of the logical contents
    pub fn to_dense(&self) -> DenseMatrix<T> {
        let n = self.size();
        DenseMatrix::from_fn(n, n, |row, col| self.read(row, col))
    }

    /// All elements in row-major order as `(row, col, value)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let n = self.size();
        (0..n * n).map(move |i| (i / n, i % n, self.read(i / n, i % n)))
    }

    /// Nonzero elements in row-major order
    pub fn iter_nonzeros(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.iter().filter(|&(_, _, v)| v != T::zero())
    }

    /// Rows of the logical contents
    pub fn rows(&self) -> impl Iterator<Item = Vec<T>> + '_ {
        let n = self.size();
        (0..n).map(move |row| (0..n).map(|col| self.read(row, col)).collect())
    }

    /// Columns of the logical contents
    pub fn columns(&self) -> impl Iterator<Item = Vec<T>> + '_ {
        let n = self.size();
        (0..n).map(move |col| (0..n).map(|row| self.read(row, col)).collect())
    }
}

/// Check that `source` satisfies `kind` within `tolerance`
///
/// Positions are visited in row-major order and the first failure is
/// returned.
pub fn check_structure<T, Src>(kind: StructureKind, source: &Src, tolerance: f64) -> StrataResult<()>
where
    T: Scalar,
    Src: MatrixStorage<T> + ?Sized,
{
    let (nrows, ncols) = source.shape();
    if nrows != ncols {
        return Err(StrataError::dimension_mismatch(
            "structure check",
            (nrows, ncols),
            (ncols, ncols),
        ));
    }

    let close = |a: T, b: T| (a - b).magnitude() <= tolerance;

    for row in 0..nrows {
        for col in 0..ncols {
            let value = source.at(row, col);
            match kind.classify(row, col) {
                CellClass::Restricted => {
                    let implied = kind.implied(row, col).unwrap_or_else(T::zero);
                    if !close(value, implied) {
                        tracing::debug!(structure = %kind, row, col, "restricted position holds a non-implied value");
                        return Err(StrataError::StructuralViolation {
                            structure: kind.name(),
                            row,
                            col,
                        });
                    }
                }
                CellClass::Writable if kind == StructureKind::Hermitian => {
                    if !close(value, value.conj()) {
                        return Err(StrataError::invalid_value(
                            row,
                            col,
                            "hermitian diagonal must be real",
                        ));
                    }
                }
                CellClass::Mirrored if row < col => {
                    let other = source.at(col, row);
                    if !close(other, kind.mirror(value)) {
                        return Err(StrataError::invalid_value(
                            row,
                            col,
                            format!("{kind} structure requires a matching value at ({col}, {row})"),
                        ));
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// `(v + conj v) / 2`, the real part of `v` in `T`
fn real_part<T: Scalar>(value: T) -> T {
    if value.is_real() {
        return value;
    }
    let two = T::one() + T::one();
    (value + value.conj()) / two
}

impl<T, S, M> MatrixStorage<T> for StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorage<T>,
{
    fn nrows(&self) -> usize {
        self.storage.nrows()
    }

    fn ncols(&self) -> usize {
        self.storage.ncols()
    }

    fn at(&self, row: usize, col: usize) -> T {
        self.read(row, col)
    }

    fn storage_id(&self) -> StorageId {
        self.storage.storage_id()
    }

    fn density(&self) -> Density {
        self.storage.density()
    }
}

impl<T, S, M> MatrixStorageMut<T> for StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorageMut<T>,
{
    fn set(&mut self, row: usize, col: usize, value: T) -> StrataResult<()> {
        self.write(row, col, value)
    }

    fn allocate(nrows: usize, ncols: usize) -> StrataResult<Self> {
        if nrows != ncols {
            return Err(StrataError::dimension_mismatch(
                "structured allocate",
                (nrows, ncols),
                (ncols, ncols),
            ));
        }
        Self::zeros(nrows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Hermitian, Symmetric, UniLower, Upper};
    use strata_core::Complex;

    #[test]
    fn test_try_new_validates() {
        let ok = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![0.0, 3.0]]).unwrap();
        assert!(UpperMatrix::try_new(ok).is_ok());

        let bad = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![4.0, 3.0]]).unwrap();
        assert!(matches!(
            UpperMatrix::try_new(bad.clone()),
            Err(StrataError::StructuralViolation { row: 1, col: 0, .. })
        ));
        assert!(matches!(
            SymmetricMatrix::try_new(bad),
            Err(StrataError::InvalidValue { row: 0, col: 1, .. })
        ));

        let rect = DenseMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            SymmetricMatrix::try_new(rect),
            Err(StrataError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_tolerance_normalizes() {
        let almost = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0 + 1e-12, 3.0]]).unwrap();
        assert!(SymmetricMatrix::try_new(almost.clone()).is_err());
        let s = SymmetricMatrix::try_new_with_tolerance(almost, 1e-9).unwrap();
        assert_eq!(s.storage()[(1, 0)], 2.0);
    }

    #[test]
    fn test_uni_diagonal() {
        let l = StructuredMatrix::<f64, UniLower>::zeros(3).unwrap();
        assert_eq!(l.read(1, 1), 1.0);
        assert_eq!(l.storage()[(2, 2)], 1.0);
        assert_eq!(l.to_dense(), DenseMatrix::identity(3));
    }

    #[test]
    fn test_restricted_read_out_of_bounds() {
        let u = StructuredMatrix::<f64, Upper>::zeros(3).unwrap();
        assert!(matches!(u.try_read(5, 0), Err(StrataError::OutOfBounds { .. })));
        assert!(matches!(u.try_read(0, 3), Err(StrataError::OutOfBounds { .. })));
        assert_eq!(u.try_read(2, 0).unwrap(), 0.0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_restricted_read_panics_out_of_bounds() {
        let l = StructuredMatrix::<f64, UniLower>::zeros(3).unwrap();
        // (7, 7) would classify as the implied unit diagonal
        l.read(7, 7);
    }

    #[test]
    fn test_hermitian_commit() {
        let mut h = StructuredMatrix::<Complex<f64>, Hermitian>::zeros(2).unwrap();
        let src = DenseMatrix::from_rows(&[
            vec![Complex::new(2.0, 0.0), Complex::new(1.0, 1.0)],
            vec![Complex::new(1.0, -1.0), Complex::new(5.0, 0.0)],
        ])
        .unwrap();
        h.commit_from(&src).unwrap();
        assert_eq!(h.to_dense(), src);

        let bad = DenseMatrix::from_rows(&[
            vec![Complex::new(2.0, 0.5), Complex::new(0.0, 0.0)],
            vec![Complex::new(0.0, 0.0), Complex::new(5.0, 0.0)],
        ])
        .unwrap();
        assert!(matches!(h.commit_from(&bad), Err(StrataError::InvalidValue { .. })));
        assert_eq!(h.to_dense(), src);
    }

    #[test]
    fn test_from_fn_and_iteration() {
        let s = StructuredMatrix::<i32, Symmetric>::from_fn(3, |r, c| (r * 3 + c) as i32).unwrap();
        assert_eq!(s.read(2, 0), 2);
        assert_eq!(s.rows().nth(1).unwrap(), vec![1, 4, 5]);
        assert_eq!(s.columns().next().unwrap(), vec![0, 1, 2]);
        assert_eq!(s.iter_nonzeros().count(), 8);

        let u = StructuredMatrix::<i32, Upper>::from_fn(2, |_, _| 1).unwrap();
        assert_eq!(u.nonzeros(), vec![(0, 0, 1), (0, 1, 1), (1, 1, 1)]);
    }

    #[test]
    fn test_storage_contract() {
        let mut s = SymmetricMatrix::<f64>::zeros(3).unwrap();
        let id = s.storage().storage_id();
        assert_eq!(MatrixStorage::storage_id(&s), id);
        MatrixStorageMut::set(&mut s, 0, 2, 4.0).unwrap();
        assert_eq!(s.at(2, 0), 4.0);
        assert!(<SymmetricMatrix<f64> as MatrixStorageMut<f64>>::allocate(2, 3).is_err());
        assert_eq!(s.allocate_like().unwrap().size(), 3);
    }
}
