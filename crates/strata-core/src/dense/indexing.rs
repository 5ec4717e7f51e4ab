//! Indexing and iteration

use super::types::DenseMatrix;
use crate::error::StrataResult;
use crate::scalar::Scalar;
use crate::storage::check_bounds;
use std::ops::{Index, IndexMut};

impl<T: Scalar> Index<(usize, usize)> for DenseMatrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.nrows && col < self.ncols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &self.data[self.offset(row, col)]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for DenseMatrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.nrows && col < self.ncols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        let offset = self.offset(row, col);
        &mut self.data[offset]
    }
}

impl<T: Scalar> DenseMatrix<T> {
    /// Copy of row `row`
    pub fn row(&self, row: usize) -> StrataResult<Vec<T>> {
        check_bounds(row, 0, (self.nrows, self.ncols.max(1)))?;
        Ok((0..self.ncols)
            .map(|c| self.data[self.offset(row, c)])
            .collect())
    }

    /// Copy of column `col`
    pub fn column(&self, col: usize) -> StrataResult<Vec<T>> {
        check_bounds(0, col, (self.nrows.max(1), self.ncols))?;
        Ok((0..self.nrows)
            .map(|r| self.data[self.offset(r, col)])
            .collect())
    }

    /// Iterate over rows, each copied into a `Vec`
    pub fn rows(&self) -> impl Iterator<Item = Vec<T>> + '_ {
        (0..self.nrows).map(move |r| {
            (0..self.ncols)
                .map(|c| self.data[self.offset(r, c)])
                .collect()
        })
    }

    /// Iterate over columns, each copied into a `Vec`
    pub fn columns(&self) -> impl Iterator<Item = Vec<T>> + '_ {
        (0..self.ncols).map(move |c| {
            (0..self.nrows)
                .map(|r| self.data[self.offset(r, c)])
                .collect()
        })
    }

    /// Iterate over `(row, col, value)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows)
            .flat_map(move |r| (0..self.ncols).map(move |c| (r, c, self.data[self.offset(r, c)])))
    }

    /// Iterate over nonzero `(row, col, value)` in row-major order
    pub fn iter_nonzeros(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.iter().filter(|&(_, _, v)| v != T::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StorageOrder;

    #[test]
    fn test_rows_and_columns() {
        let m = DenseMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rows: Vec<_> = m.rows().collect();
        assert_eq!(rows, vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let cols: Vec<_> = m.columns().collect();
        assert_eq!(cols[2], vec![3, 6]);
        assert_eq!(m.column(1).unwrap(), vec![2, 5]);
        assert!(m.row(2).is_err());
    }

    #[test]
    fn test_iteration_is_row_major_in_any_order() {
        let m = DenseMatrix::from_vec(2, 2, vec![0, 7, 8, 0])
            .unwrap()
            .to_order(StorageOrder::ColumnMajor);
        let nz: Vec<_> = m.iter_nonzeros().collect();
        assert_eq!(nz, vec![(0, 1, 7), (1, 0, 8)]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_panics_out_of_bounds() {
        let m = DenseMatrix::<f64>::zeros(2, 2);
        let _ = m[(0, 2)];
    }

    #[test]
    fn test_index_mut() {
        let mut m = DenseMatrix::<i64>::zeros(2, 2);
        m[(1, 0)] = 5;
        assert_eq!(m.get(1, 0).unwrap(), 5);
    }
}
