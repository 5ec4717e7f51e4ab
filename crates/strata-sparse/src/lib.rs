//! # strata-sparse
//!
//! Compressed sparse row storage for strata.
//!
//! - [`CsrMatrix`]: validated CSR with sorted, duplicate-free rows, checked
//!   reads and writes, and nonzero iteration ordered by (row, col)
//! - [`SparseStorage`]: row-wise access used by the sparse kernels
//! - [`merge`]: union and intersection merges over sorted rows
//!
//! [`CsrMatrix`] implements the `strata-core` storage contract, so it can be
//! read by the evaluation engine and used as an assignment target.
//!
//! # Examples
//!
//! ```
//! use strata_core::DenseMatrix;
//! use strata_sparse::CsrMatrix;
//!
//! let dense = DenseMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 2.0]]).unwrap();
//! let csr = CsrMatrix::from_dense(&dense, 0.0);
//! assert_eq!(csr.nnz(), 2);
//! assert_eq!(csr.to_dense(), dense);
//! ```

pub mod csr;
pub mod error;
pub mod merge;

pub use csr::CsrMatrix;
pub use error::CsrError;
pub use merge::UnionValue;

use strata_core::{MatrixStorage, Scalar};

/// Row-wise access to compressed sparse storage
///
/// Column indices of every row are strictly increasing.
pub trait SparseStorage<T: Scalar>: MatrixStorage<T> {
    /// Number of stored entries
    fn nnz(&self) -> usize;

    /// Column indices and values of row `row`
    ///
    /// # Panics
    ///
    /// May panic when `row >= self.nrows()`.
    fn row_entries(&self, row: usize) -> (&[usize], &[T]);
}

impl<T: Scalar, S: SparseStorage<T> + ?Sized> SparseStorage<T> for &S {
    fn nnz(&self) -> usize {
        (**self).nnz()
    }

    fn row_entries(&self, row: usize) -> (&[usize], &[T]) {
        (**self).row_entries(row)
    }
}
