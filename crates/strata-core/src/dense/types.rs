//! Dense matrix type definition and basic accessors

use crate::error::{StrataError, StrataResult};
use crate::layout::{StorageId, StorageOrder};
use crate::promote::CastInto;
use crate::scalar::Scalar;
use crate::storage::{check_bounds, MatrixStorage, MatrixStorageMut};

/// Dense two-dimensional matrix with an explicit storage order
///
/// Vectors are matrices with one column (`n x 1`) or one row (`1 x n`).
///
/// # Type Parameters
///
/// * `T` - The element type, any [`Scalar`]
///
/// # Examples
///
/// ```
/// use strata_core::DenseMatrix;
///
/// let m = DenseMatrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m[(1, 0)], 4.0);
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(serialize = "T: serde::Serialize")))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "T: serde::Deserialize<'de>"))
)]
pub struct DenseMatrix<T> {
    pub(crate) data: Vec<T>,
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) order: StorageOrder,
}

impl<T: Scalar> DenseMatrix<T> {
    /// Number of rows
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Memory order of the buffer
    #[inline]
    pub fn order(&self) -> StorageOrder {
        self.order
    }

    /// Total number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the matrix has no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the matrix is square
    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Whether the matrix has exactly one column or one row
    pub fn is_vector(&self) -> bool {
        self.nrows == 1 || self.ncols == 1
    }

    /// Underlying buffer in storage order
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable underlying buffer in storage order
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the matrix, returning its buffer in storage order
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline(always)]
    pub(crate) fn offset(&self, row: usize, col: usize) -> usize {
        self.order.offset(row, col, self.nrows, self.ncols)
    }

    /// Bounds-checked read
    pub fn get(&self, row: usize, col: usize) -> StrataResult<T> {
        check_bounds(row, col, self.shape())?;
        Ok(self.data[self.offset(row, col)])
    }

    /// Bounds-checked write
    pub fn set(&mut self, row: usize, col: usize, value: T) -> StrataResult<()> {
        check_bounds(row, col, self.shape())?;
        let offset = self.offset(row, col);
        self.data[offset] = value;
        Ok(())
    }

    /// Number of contiguous runs (rows for row-major, columns for column-major)
    #[inline]
    pub fn run_count(&self) -> usize {
        self.order.run_count(self.nrows, self.ncols)
    }

    /// Contiguous run `major` of the buffer
    ///
    /// # Panics
    ///
    /// Panics when `major >= self.run_count()`.
    #[inline]
    pub fn run(&self, major: usize) -> &[T] {
        let len = self.order.run_len(self.nrows, self.ncols);
        &self.data[major * len..(major + 1) * len]
    }

    /// Mutable contiguous run `major` of the buffer
    ///
    /// # Panics
    ///
    /// Panics when `major >= self.run_count()`.
    #[inline]
    pub fn run_mut(&mut self, major: usize) -> &mut [T] {
        let len = self.order.run_len(self.nrows, self.ncols);
        &mut self.data[major * len..(major + 1) * len]
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Copy of this matrix laid out in `order`
    pub fn to_order(&self, order: StorageOrder) -> Self {
        if order == self.order {
            return self.clone();
        }
        Self::from_fn_with_order(self.nrows, self.ncols, order, |r, c| {
            self.data[self.offset(r, c)]
        })
    }

    /// Transpose without moving data
    ///
    /// A row-major `m x n` buffer read as column-major is the `n x m`
    /// transpose, so this only swaps the extents and flips the order.
    pub fn into_transpose(self) -> Self {
        Self {
            data: self.data,
            nrows: self.ncols,
            ncols: self.nrows,
            order: self.order.transposed(),
        }
    }

    /// Apply `f` to every element, keeping shape and order
    pub fn map<U: Scalar>(&self, f: impl Fn(T) -> U) -> DenseMatrix<U> {
        DenseMatrix {
            data: self.data.iter().map(|&x| f(x)).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
            order: self.order,
        }
    }

    /// Convert every element into `U`
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::DenseMatrix;
    ///
    /// let m = DenseMatrix::from_vec(1, 2, vec![1i32, 2]).unwrap();
    /// let f: DenseMatrix<f64> = m.cast();
    /// assert_eq!(f[(0, 1)], 2.0);
    /// ```
    pub fn cast<U: Scalar>(&self) -> DenseMatrix<U>
    where
        T: CastInto<U>,
    {
        self.map(|x| x.cast_into())
    }

    /// Overwrite `self` with the elements of `other`, whatever its order
    pub fn copy_from(&mut self, other: &DenseMatrix<T>) -> StrataResult<()> {
        if self.shape() != other.shape() {
            return Err(StrataError::dimension_mismatch(
                "copy",
                self.shape(),
                other.shape(),
            ));
        }
        if self.order == other.order {
            self.data.copy_from_slice(&other.data);
        } else {
            for r in 0..self.nrows {
                for c in 0..self.ncols {
                    let offset = self.offset(r, c);
                    self.data[offset] = other.data[other.offset(r, c)];
                }
            }
        }
        Ok(())
    }
}

impl<T: Scalar> MatrixStorage<T> for DenseMatrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> T {
        self.data[self.offset(row, col)]
    }

    #[inline]
    fn storage_id(&self) -> StorageId {
        StorageId::of(self)
    }
}

impl<T: Scalar> MatrixStorageMut<T> for DenseMatrix<T> {
    fn set(&mut self, row: usize, col: usize, value: T) -> StrataResult<()> {
        DenseMatrix::set(self, row, col, value)
    }

    fn allocate(nrows: usize, ncols: usize) -> StrataResult<Self> {
        Self::try_zeros(nrows, ncols, StorageOrder::RowMajor)
    }

    fn allocate_like(&self) -> StrataResult<Self> {
        Self::try_zeros(self.nrows, self.ncols, self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_access_follows_order() {
        let m = DenseMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(m.run_count(), 2);
        assert_eq!(m.run(1), &[4, 5, 6]);

        let c = m.to_order(StorageOrder::ColumnMajor);
        assert_eq!(c.run_count(), 3);
        assert_eq!(c.run(0), &[1, 4]);
        assert_eq!(c, m);
    }

    #[test]
    fn test_into_transpose_is_free() {
        let m = DenseMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let t = m.clone().into_transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.order(), StorageOrder::ColumnMajor);
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(m[(r, c)], t[(c, r)]);
            }
        }
    }

    #[test]
    fn test_copy_from_mixed_orders() {
        let src = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut dst = DenseMatrix::zeros_with_order(2, 2, StorageOrder::ColumnMajor);
        dst.copy_from(&src).unwrap();
        assert_eq!(dst, src);

        let mut wrong = DenseMatrix::<f64>::zeros(3, 2);
        assert!(wrong.copy_from(&src).is_err());
    }

    #[test]
    fn test_storage_trait_reads() {
        let m = DenseMatrix::from_vec(2, 2, vec![0.0, 2.0, 0.0, 4.0]).unwrap();
        assert_eq!(MatrixStorage::extent(&m, 0), 2);
        assert_eq!(m.nonzeros(), vec![(0, 1, 2.0), (1, 1, 4.0)]);
        assert!(MatrixStorage::get(&m, 0, 2).is_err());
    }
}
