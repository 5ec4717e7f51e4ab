//! CSR (Compressed Sparse Row) format
//!
//! # Format
//!
//! For an m×n sparse matrix with nnz non-zeros:
//! - `row_ptr`: `Vec<usize>` of length m+1 - row_ptr\[i\] points to start of row i
//! - `col_indices`: `Vec<usize>` of length nnz - strictly increasing within each row
//! - `values`: `Vec<T>` of length nnz - the non-zero values
//! - `shape`: (m, n) - dimensions of the matrix
//!
//! Sorted, duplicate-free rows make nonzero iteration ordered by (row, col),
//! which the merge kernels and the sparse assignment path rely on.
//!
//! # Examples
//!
//! ```
//! use strata_sparse::CsrMatrix;
//!
//! // [1.0  0   2.0  0  ]
//! // [0    3.0 0    0  ]
//! // [4.0  0   0    5.0]
//! let row_ptr = vec![0, 2, 3, 5];
//! let col_indices = vec![0, 2, 1, 0, 3];
//! let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//!
//! let csr = CsrMatrix::new(row_ptr, col_indices, values, (3, 4)).unwrap();
//! assert_eq!(csr.nnz(), 5);
//! assert_eq!(csr.get(2, 3).unwrap(), 5.0);
//! assert_eq!(csr.get(1, 0).unwrap(), 0.0);
//! ```

use crate::error::CsrError;
use crate::SparseStorage;
use strata_core::{
    check_bounds, CastInto, DenseMatrix, Density, MatrixStorage, MatrixStorageMut, Scalar,
    StorageId, StrataResult,
};

/// CSR (Compressed Sparse Row) matrix
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "CsrParts<T>",
        bound(deserialize = "T: Scalar + serde::Deserialize<'de>")
    )
)]
pub struct CsrMatrix<T> {
    /// Row pointers: row_ptr[i] = start index of row i in col_indices/values
    row_ptr: Vec<usize>,

    /// Column index of each non-zero
    col_indices: Vec<usize>,

    /// Values of non-zero elements
    values: Vec<T>,

    /// Shape: (nrows, ncols)
    shape: (usize, usize),
}

/// Unvalidated serialized form; deserialization goes through [`CsrMatrix::new`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct CsrParts<T> {
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<T>,
    shape: (usize, usize),
}

#[cfg(feature = "serde")]
impl<T: Scalar> TryFrom<CsrParts<T>> for CsrMatrix<T> {
    type Error = CsrError;

    fn try_from(parts: CsrParts<T>) -> Result<Self, CsrError> {
        CsrMatrix::new(parts.row_ptr, parts.col_indices, parts.values, parts.shape)
    }
}

impl<T: Scalar> CsrMatrix<T> {
    /// Create a new CSR matrix from raw arrays
    ///
    /// # Arguments
    ///
    /// * `row_ptr` - Row pointers (length nrows+1)
    /// * `col_indices` - Column indices for each non-zero, strictly increasing per row
    /// * `values` - Values for each non-zero
    /// * `shape` - (nrows, ncols)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - row_ptr length is incorrect or it does not end at nnz
    /// - col_indices and values have different lengths
    /// - row_ptr is not monotonically increasing
    /// - any column index is out of bounds
    /// - columns within a row are unsorted or repeated
    pub fn new(
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Result<Self, CsrError> {
        let (nrows, ncols) = shape;

        if row_ptr.len() != nrows + 1 {
            return Err(CsrError::InvalidRowPtr {
                len: row_ptr.len(),
                nrows,
                expected: nrows + 1,
            });
        }

        if col_indices.len() != values.len() {
            return Err(CsrError::LengthMismatch {
                col_indices: col_indices.len(),
                values: values.len(),
            });
        }

        for i in 0..nrows {
            if row_ptr[i] > row_ptr[i + 1] {
                return Err(CsrError::RowPtrNotSorted {
                    idx: i,
                    curr: row_ptr[i],
                    next: row_ptr[i + 1],
                });
            }
        }

        let nnz = col_indices.len();
        if row_ptr[0] != 0 || row_ptr[nrows] != nnz {
            return Err(CsrError::RowPtrEnd {
                last: row_ptr[nrows],
                nnz,
            });
        }

        for row in 0..nrows {
            let cols = &col_indices[row_ptr[row]..row_ptr[row + 1]];
            for (position, &col_idx) in cols.iter().enumerate() {
                if col_idx >= ncols {
                    return Err(CsrError::ColIndexOutOfBounds { col_idx, ncols });
                }
                if position > 0 && cols[position - 1] >= col_idx {
                    return Err(CsrError::ColumnsNotSorted { row, position });
                }
            }
        }

        Ok(Self {
            row_ptr,
            col_indices,
            values,
            shape,
        })
    }

    /// Build from raw arrays the caller already knows are valid
    pub(crate) fn from_parts_unchecked(
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), shape.0 + 1);
        debug_assert_eq!(col_indices.len(), values.len());
        Self {
            row_ptr,
            col_indices,
            values,
            shape,
        }
    }

    /// Create an empty CSR matrix with given shape
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            row_ptr: vec![0; shape.0 + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
            shape,
        }
    }

    /// Sparse identity matrix
    pub fn identity(n: usize) -> Self {
        Self {
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: vec![T::one(); n],
            shape: (n, n),
        }
    }

    /// Build from `(row, col, value)` triplets in any order
    ///
    /// Duplicate positions are summed; entries that sum to zero are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_sparse::CsrMatrix;
    ///
    /// let csr = CsrMatrix::from_triplets((2, 2), &[(1, 1, 2.0), (0, 1, 1.0), (1, 1, 3.0)]).unwrap();
    /// assert_eq!(csr.nnz(), 2);
    /// assert_eq!(csr.get(1, 1).unwrap(), 5.0);
    /// ```
    pub fn from_triplets(
        shape: (usize, usize),
        triplets: &[(usize, usize, T)],
    ) -> Result<Self, CsrError> {
        let (nrows, ncols) = shape;
        for &(row, col, _) in triplets {
            if row >= nrows || col >= ncols {
                return Err(CsrError::EntryOutOfBounds {
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
        }

        let mut sorted = triplets.to_vec();
        sorted.sort_by_key(|&(r, c, _)| (r, c));

        let mut merged: Vec<(usize, usize, T)> = Vec::with_capacity(sorted.len());
        for (row, col, value) in sorted {
            if let Some(last) = merged.last_mut() {
                if (last.0, last.1) == (row, col) {
                    last.2 = last.2 + value;
                    continue;
                }
            }
            merged.push((row, col, value));
        }
        merged.retain(|&(_, _, v)| v != T::zero());

        let mut row_ptr = vec![0; nrows + 1];
        for &(row, _, _) in &merged {
            row_ptr[row + 1] += 1;
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }
        let col_indices = merged.iter().map(|&(_, c, _)| c).collect();
        let values = merged.iter().map(|&(_, _, v)| v).collect();

        Ok(Self::from_parts_unchecked(
            row_ptr,
            col_indices,
            values,
            shape,
        ))
    }

    /// Compress any storage, keeping its nonzero entries
    pub fn from_storage<M: MatrixStorage<T> + ?Sized>(storage: &M) -> Self {
        let (nrows, ncols) = storage.shape();
        let mut row_ptr = vec![0; nrows + 1];
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        storage.for_each_nonzero(&mut |row, col, value| {
            row_ptr[row + 1] += 1;
            col_indices.push(col);
            values.push(value);
        });
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }
        Self::from_parts_unchecked(row_ptr, col_indices, values, (nrows, ncols))
    }

    /// Create CSR from a dense matrix
    ///
    /// Only stores elements whose magnitude exceeds `tolerance`.
    pub fn from_dense(dense: &DenseMatrix<T>, tolerance: f64) -> Self {
        let (nrows, ncols) = dense.shape();
        let mut row_ptr = Vec::with_capacity(nrows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for row in 0..nrows {
            for col in 0..ncols {
                let value = dense.at(row, col);
                if value.magnitude() > tolerance {
                    col_indices.push(col);
                    values.push(value);
                }
            }
            row_ptr.push(col_indices.len());
        }
        Self::from_parts_unchecked(row_ptr, col_indices, values, (nrows, ncols))
    }

    /// Convert to a row-major dense matrix
    pub fn to_dense(&self) -> DenseMatrix<T> {
        let mut dense = DenseMatrix::zeros(self.nrows(), self.ncols());
        for (row, col, value) in self.iter_nonzeros() {
            dense[(row, col)] = value;
        }
        dense
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Shape of the matrix (nrows, ncols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Get row pointers
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Get column indices
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Get values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Fraction of positions that are stored (nnz / total_elements)
    pub fn fill_ratio(&self) -> f64 {
        let total = self.nrows() * self.ncols();
        if total == 0 {
            return 0.0;
        }
        self.nnz() as f64 / total as f64
    }

    /// Get a row as (col_indices, values) slices
    pub fn row(&self, i: usize) -> Option<(&[usize], &[T])> {
        if i >= self.nrows() {
            return None;
        }

        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];

        Some((&self.col_indices[start..end], &self.values[start..end]))
    }

    fn locate(&self, row: usize, col: usize) -> Result<usize, usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_indices[start..end]
            .binary_search(&col)
            .map(|k| start + k)
            .map_err(|k| start + k)
    }

    /// Bounds-checked read; positions not stored read as zero
    pub fn get(&self, row: usize, col: usize) -> StrataResult<T> {
        check_bounds(row, col, self.shape)?;
        Ok(self.at_unchecked(row, col))
    }

    #[inline]
    fn at_unchecked(&self, row: usize, col: usize) -> T {
        match self.locate(row, col) {
            Ok(idx) => self.values[idx],
            Err(_) => T::zero(),
        }
    }

    /// Store `value` at `(row, col)`
    ///
    /// Inserting keeps the row sorted; writing zero removes the entry.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> StrataResult<()> {
        check_bounds(row, col, self.shape)?;
        match (self.locate(row, col), value == T::zero()) {
            (Ok(idx), false) => self.values[idx] = value,
            (Ok(idx), true) => {
                self.col_indices.remove(idx);
                self.values.remove(idx);
                self.row_ptr[row + 1..].iter_mut().for_each(|p| *p -= 1);
            }
            (Err(_), true) => {}
            (Err(idx), false) => {
                self.col_indices.insert(idx, col);
                self.values.insert(idx, value);
                self.row_ptr[row + 1..].iter_mut().for_each(|p| *p += 1);
            }
        }
        Ok(())
    }

    /// Iterate over stored `(row, col, value)` in row-major order
    pub fn iter_nonzeros(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows()).flat_map(move |row| {
            let start = self.row_ptr[row];
            let end = self.row_ptr[row + 1];
            (start..end).map(move |k| (row, self.col_indices[k], self.values[k]))
        })
    }

    /// Transposed copy
    ///
    /// Scattering rows in increasing order keeps every output row sorted.
    pub fn transpose(&self) -> Self {
        let (m, n) = self.shape;
        let nnz = self.nnz();

        let mut row_ptr = vec![0; n + 1];
        for &col in &self.col_indices {
            row_ptr[col + 1] += 1;
        }
        for i in 0..n {
            row_ptr[i + 1] += row_ptr[i];
        }

        let mut col_indices = vec![0; nnz];
        let mut values = vec![T::zero(); nnz];
        let mut next = row_ptr[..n].to_vec();
        for row in 0..m {
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                let col = self.col_indices[k];
                let pos = next[col];
                col_indices[pos] = row;
                values[pos] = self.values[k];
                next[col] += 1;
            }
        }

        Self::from_parts_unchecked(row_ptr, col_indices, values, (n, m))
    }

    /// Apply `f` to every stored value, keeping the sparsity pattern
    pub fn map<U: Scalar>(&self, f: impl Fn(T) -> U) -> CsrMatrix<U> {
        CsrMatrix {
            row_ptr: self.row_ptr.clone(),
            col_indices: self.col_indices.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
            shape: self.shape,
        }
    }

    /// Convert every stored value into `U`
    pub fn cast<U: Scalar>(&self) -> CsrMatrix<U>
    where
        T: CastInto<U>,
    {
        self.map(|v| v.cast_into())
    }

    /// Drop stored entries whose magnitude is at most `tolerance`
    pub fn prune(&mut self, tolerance: f64) {
        let mut row_ptr = Vec::with_capacity(self.row_ptr.len());
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for row in 0..self.nrows() {
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                if self.values[k].magnitude() > tolerance {
                    col_indices.push(self.col_indices[k]);
                    values.push(self.values[k]);
                }
            }
            row_ptr.push(col_indices.len());
        }
        self.row_ptr = row_ptr;
        self.col_indices = col_indices;
        self.values = values;
    }
}

impl<T: Scalar> MatrixStorage<T> for CsrMatrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.shape.0
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.shape.1
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> T {
        self.at_unchecked(row, col)
    }

    #[inline]
    fn storage_id(&self) -> StorageId {
        StorageId::of(self)
    }

    fn density(&self) -> Density {
        Density::Sparse
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, T)) {
        for (row, col, value) in self.iter_nonzeros() {
            f(row, col, value);
        }
    }
}

impl<T: Scalar> MatrixStorageMut<T> for CsrMatrix<T> {
    fn set(&mut self, row: usize, col: usize, value: T) -> StrataResult<()> {
        CsrMatrix::set(self, row, col, value)
    }

    fn allocate(nrows: usize, ncols: usize) -> StrataResult<Self> {
        Ok(Self::zeros((nrows, ncols)))
    }
}

impl<T: Scalar> SparseStorage<T> for CsrMatrix<T> {
    #[inline]
    fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn row_entries(&self, row: usize) -> (&[usize], &[T]) {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        (&self.col_indices[start..end], &self.values[start..end])
    }
}
