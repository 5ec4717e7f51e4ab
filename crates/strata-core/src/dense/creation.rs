//! Dense matrix creation

use super::types::DenseMatrix;
use crate::error::{StrataError, StrataResult};
use crate::layout::StorageOrder;
use crate::scalar::Scalar;
use scirs2_core::ndarray_ext::Array2;

impl<T: Scalar> DenseMatrix<T> {
    /// Zero matrix in row-major order
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::DenseMatrix;
    ///
    /// let m = DenseMatrix::<f32>::zeros(3, 2);
    /// assert_eq!(m.shape(), (3, 2));
    /// assert_eq!(m[(2, 1)], 0.0);
    /// ```
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::zeros_with_order(nrows, ncols, StorageOrder::RowMajor)
    }

    /// Zero matrix in the given order
    pub fn zeros_with_order(nrows: usize, ncols: usize, order: StorageOrder) -> Self {
        Self::from_elem(nrows, ncols, order, T::zero())
    }

    /// Zero matrix whose allocation failure is reported instead of aborting
    ///
    /// # Errors
    ///
    /// [`StrataError::Allocation`] when the element count overflows or the
    /// buffer cannot be reserved.
    pub fn try_zeros(nrows: usize, ncols: usize, order: StorageOrder) -> StrataResult<Self> {
        let len = nrows
            .checked_mul(ncols)
            .ok_or(StrataError::Allocation {
                elements: usize::MAX,
            })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| StrataError::Allocation { elements: len })?;
        data.resize(len, T::zero());
        Ok(Self {
            data,
            nrows,
            ncols,
            order,
        })
    }

    /// Matrix with every element equal to `value`
    ///
    /// # Panics
    ///
    /// Panics when `nrows * ncols` overflows `usize`. Use
    /// [`try_zeros`](Self::try_zeros) to have that reported as an error.
    pub fn from_elem(nrows: usize, ncols: usize, order: StorageOrder, value: T) -> Self {
        Self {
            data: vec![value; element_count(nrows, ncols)],
            nrows,
            ncols,
            order,
        }
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |r, c| if r == c { T::one() } else { T::zero() })
    }

    /// Build a matrix from row-major data
    ///
    /// # Errors
    ///
    /// [`StrataError::InvalidStorage`] when `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> StrataResult<Self> {
        Self::from_vec_with_order(nrows, ncols, data, StorageOrder::RowMajor)
    }

    /// Build a matrix from data already laid out in `order`
    pub fn from_vec_with_order(
        nrows: usize,
        ncols: usize,
        data: Vec<T>,
        order: StorageOrder,
    ) -> StrataResult<Self> {
        let expected = nrows.checked_mul(ncols).ok_or_else(|| {
            StrataError::invalid_storage(format!(
                "{}x{} matrix element count overflows usize",
                nrows, ncols
            ))
        })?;
        if data.len() != expected {
            return Err(StrataError::invalid_storage(format!(
                "{}x{} matrix requires {} elements, got {}",
                nrows,
                ncols,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            data,
            nrows,
            ncols,
            order,
        })
    }

    /// Build a row-major matrix from a generator
    pub fn from_fn(nrows: usize, ncols: usize, f: impl FnMut(usize, usize) -> T) -> Self {
        Self::from_fn_with_order(nrows, ncols, StorageOrder::RowMajor, f)
    }

    /// Build a matrix in `order` from a generator
    pub fn from_fn_with_order(
        nrows: usize,
        ncols: usize,
        order: StorageOrder,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let runs = order.run_count(nrows, ncols);
        let len = order.run_len(nrows, ncols);
        let mut data = Vec::with_capacity(element_count(nrows, ncols));
        for major in 0..runs {
            for minor in 0..len {
                let (r, c) = order.position(major, minor);
                data.push(f(r, c));
            }
        }
        Self {
            data,
            nrows,
            ncols,
            order,
        }
    }

    /// Build a row-major matrix from a slice of equally long rows
    ///
    /// # Errors
    ///
    /// [`StrataError::InvalidStorage`] when the rows have different lengths.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> StrataResult<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(StrataError::invalid_storage(format!(
                    "row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    ncols
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(nrows, ncols, data)
    }

    /// `n x 1` column vector
    pub fn column_vector(values: Vec<T>) -> Self {
        let n = values.len();
        Self {
            data: values,
            nrows: n,
            ncols: 1,
            order: StorageOrder::RowMajor,
        }
    }

    /// `1 x n` row vector
    pub fn row_vector(values: Vec<T>) -> Self {
        let n = values.len();
        Self {
            data: values,
            nrows: 1,
            ncols: n,
            order: StorageOrder::RowMajor,
        }
    }

    /// Copy a two-dimensional array into a row-major matrix
    ///
    /// # Examples
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::array;
    /// use strata_core::DenseMatrix;
    ///
    /// let a = array![[1.0, 2.0], [3.0, 4.0]];
    /// let m = DenseMatrix::from_array2(&a);
    /// assert_eq!(m[(1, 0)], 3.0);
    /// ```
    pub fn from_array2(array: &Array2<T>) -> Self {
        let (nrows, ncols) = array.dim();
        Self::from_fn(nrows, ncols, |r, c| array[[r, c]])
    }

    /// Copy into a two-dimensional array
    pub fn to_array2(&self) -> Array2<T> {
        Array2::from_shape_fn((self.nrows, self.ncols), |(r, c)| {
            self.data[self.offset(r, c)]
        })
    }
}

fn element_count(nrows: usize, ncols: usize) -> usize {
    match nrows.checked_mul(ncols) {
        Some(len) => len,
        None => panic!("{nrows}x{ncols} matrix element count overflows usize"),
    }
}
