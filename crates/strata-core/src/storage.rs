//! Storage-access contract
//!
//! The evaluation engine and the structural adaptors never touch a container's
//! internals. They consume storage through these traits:
//!
//! - [`MatrixStorage`]: extents, element reads, a storage identity for alias
//!   analysis and nonzero iteration ordered by (row, col)
//! - [`MatrixStorageMut`]: element writes and allocation of same-shaped
//!   temporaries
//!
//! Both [`DenseMatrix`](crate::DenseMatrix) and the CSR matrix of
//! `strata-sparse` implement the contract, and so does every structural
//! adaptor.

use crate::error::{StrataError, StrataResult};
use crate::layout::StorageId;
use crate::scalar::Scalar;

/// How a storage lays out its elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Density {
    /// Every element is stored
    Dense,
    /// Only nonzero entries are stored
    Sparse,
}

/// Read side of the storage contract
pub trait MatrixStorage<T: Scalar> {
    /// Number of rows
    fn nrows(&self) -> usize;

    /// Number of columns
    fn ncols(&self) -> usize;

    /// Element at `(row, col)`
    ///
    /// # Panics
    ///
    /// May panic when the position is out of bounds. Use
    /// [`get`](MatrixStorage::get) for a checked read.
    fn at(&self, row: usize, col: usize) -> T;

    /// Identity of the underlying storage
    fn storage_id(&self) -> StorageId;

    /// `(nrows, ncols)`
    #[inline]
    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Extent along dimension `dim` (0 = rows, 1 = columns, 1 beyond)
    #[inline]
    fn extent(&self, dim: usize) -> usize {
        match dim {
            0 => self.nrows(),
            1 => self.ncols(),
            _ => 1,
        }
    }

    /// Bounds-checked element read
    fn get(&self, row: usize, col: usize) -> StrataResult<T> {
        check_bounds(row, col, self.shape())?;
        Ok(self.at(row, col))
    }

    /// Storage density
    fn density(&self) -> Density {
        Density::Dense
    }

    /// Visit every nonzero entry in row-major index order
    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, T)) {
        for row in 0..self.nrows() {
            for col in 0..self.ncols() {
                let value = self.at(row, col);
                if value != T::zero() {
                    f(row, col, value);
                }
            }
        }
    }

    /// Collect the nonzero entries in row-major index order
    fn nonzeros(&self) -> Vec<(usize, usize, T)> {
        let mut out = Vec::new();
        self.for_each_nonzero(&mut |row, col, value| out.push((row, col, value)));
        out
    }
}

/// Write side of the storage contract
pub trait MatrixStorageMut<T: Scalar>: MatrixStorage<T> {
    /// Store `value` at `(row, col)`
    fn set(&mut self, row: usize, col: usize, value: T) -> StrataResult<()>;

    /// Allocate a zero-filled storage of the given shape
    fn allocate(nrows: usize, ncols: usize) -> StrataResult<Self>
    where
        Self: Sized;

    /// Allocate a zero-filled storage shaped like `self`
    fn allocate_like(&self) -> StrataResult<Self>
    where
        Self: Sized,
    {
        Self::allocate(self.nrows(), self.ncols())
    }
}

/// Fail with [`StrataError::OutOfBounds`] unless `(row, col)` lies inside `shape`
#[inline]
pub fn check_bounds(row: usize, col: usize, shape: (usize, usize)) -> StrataResult<()> {
    if row >= shape.0 || col >= shape.1 {
        return Err(StrataError::out_of_bounds(row, col, shape));
    }
    Ok(())
}

impl<T: Scalar, M: MatrixStorage<T> + ?Sized> MatrixStorage<T> for &M {
    #[inline]
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> T {
        (**self).at(row, col)
    }

    #[inline]
    fn storage_id(&self) -> StorageId {
        (**self).storage_id()
    }

    fn density(&self) -> Density {
        (**self).density()
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, T)) {
        (**self).for_each_nonzero(f)
    }
}

impl<T: Scalar, M: MatrixStorage<T> + ?Sized> MatrixStorage<T> for Box<M> {
    #[inline]
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> T {
        (**self).at(row, col)
    }

    #[inline]
    fn storage_id(&self) -> StorageId {
        (**self).storage_id()
    }

    fn density(&self) -> Density {
        (**self).density()
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, T)) {
        (**self).for_each_nonzero(f)
    }
}
