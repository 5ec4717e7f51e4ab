//! Sorted merges over CSR rows
//!
//! Rows of a [`CsrMatrix`] are sorted and duplicate-free, so two rows can be
//! combined in a single linear pass. Element-wise sums and differences take
//! the union of both patterns; element-wise products take the intersection.

use crate::csr::CsrMatrix;
use crate::error::CsrError;
use crate::SparseStorage;
use std::cmp::Ordering;
use strata_core::Scalar;

/// A position present in at least one of two merged rows
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum UnionValue<L, R> {
    Left(L),
    Right(R),
    Both(L, R),
}

/// Walk two sorted rows together, reporting every column present in either
///
/// # Examples
///
/// ```
/// use strata_sparse::merge::{merge_sorted, UnionValue::*};
///
/// let mut seen = Vec::new();
/// merge_sorted(&[0, 2], &[1, 2], &[1, 2], &[4, 3], |col, v| seen.push((col, v)));
/// assert_eq!(seen, vec![(0, Left(1)), (1, Right(4)), (2, Both(2, 3))]);
/// ```
pub fn merge_sorted<L: Copy, R: Copy>(
    a_cols: &[usize],
    a_vals: &[L],
    b_cols: &[usize],
    b_vals: &[R],
    mut emit: impl FnMut(usize, UnionValue<L, R>),
) {
    use self::UnionValue::*;

    let (mut i, mut k) = (0, 0);
    while i < a_cols.len() || k < b_cols.len() {
        let a_pos = a_cols.get(i).copied();
        let b_pos = b_cols.get(k).copied();
        match (a_pos, b_pos) {
            (Some(a), None) => {
                emit(a, Left(a_vals[i]));
                i += 1;
            }
            (None, Some(b)) => {
                emit(b, Right(b_vals[k]));
                k += 1;
            }
            (Some(a), Some(b)) => match a.cmp(&b) {
                Ordering::Less => {
                    emit(a, Left(a_vals[i]));
                    i += 1;
                }
                Ordering::Greater => {
                    emit(b, Right(b_vals[k]));
                    k += 1;
                }
                Ordering::Equal => {
                    emit(a, Both(a_vals[i], b_vals[k]));
                    i += 1;
                    k += 1;
                }
            },
            (None, None) => break,
        }
    }
}

fn check_shapes<T: Scalar, A, B>(a: &A, b: &B) -> Result<(), CsrError>
where
    A: SparseStorage<T> + ?Sized,
    B: SparseStorage<T> + ?Sized,
{
    if a.shape() != b.shape() {
        return Err(CsrError::ShapeMismatch {
            lhs: a.shape(),
            rhs: b.shape(),
        });
    }
    Ok(())
}

/// Combine two sparse matrices over the union of their patterns
///
/// Results equal to zero are not stored.
pub fn union_with<T, A, B>(
    a: &A,
    b: &B,
    f: impl Fn(UnionValue<T, T>) -> T,
) -> Result<CsrMatrix<T>, CsrError>
where
    T: Scalar,
    A: SparseStorage<T> + ?Sized,
    B: SparseStorage<T> + ?Sized,
{
    check_shapes::<T, A, B>(a, b)?;
    let (nrows, ncols) = a.shape();
    let mut row_ptr = Vec::with_capacity(nrows + 1);
    let mut col_indices = Vec::with_capacity(a.nnz().max(b.nnz()));
    let mut values = Vec::with_capacity(a.nnz().max(b.nnz()));
    row_ptr.push(0);
    for row in 0..nrows {
        let (a_cols, a_vals) = a.row_entries(row);
        let (b_cols, b_vals) = b.row_entries(row);
        merge_sorted(a_cols, a_vals, b_cols, b_vals, |col, v| {
            let value = f(v);
            if value != T::zero() {
                col_indices.push(col);
                values.push(value);
            }
        });
        row_ptr.push(col_indices.len());
    }
    Ok(CsrMatrix::from_parts_unchecked(
        row_ptr,
        col_indices,
        values,
        (nrows, ncols),
    ))
}

/// Combine two sparse matrices over the intersection of their patterns
pub fn intersect_with<T, A, B>(
    a: &A,
    b: &B,
    f: impl Fn(T, T) -> T,
) -> Result<CsrMatrix<T>, CsrError>
where
    T: Scalar,
    A: SparseStorage<T> + ?Sized,
    B: SparseStorage<T> + ?Sized,
{
    union_with(a, b, |v| match v {
        UnionValue::Both(x, y) => f(x, y),
        _ => T::zero(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{DenseMatrix, MatrixStorage};

    fn csr(rows: &[Vec<f64>]) -> CsrMatrix<f64> {
        CsrMatrix::from_dense(&DenseMatrix::from_rows(rows).unwrap(), 0.0)
    }

    #[test]
    fn test_union_sum() {
        let a = csr(&[vec![1.0, 0.0, 2.0], vec![0.0, 0.0, 0.0]]);
        let b = csr(&[vec![0.0, 3.0, -2.0], vec![0.0, 4.0, 0.0]]);
        let sum = union_with(&a, &b, |v| match v {
            UnionValue::Left(x) | UnionValue::Right(x) => x,
            UnionValue::Both(x, y) => x + y,
        })
        .unwrap();
        // (0, 2) cancels and is not stored
        assert_eq!(sum.nnz(), 3);
        assert_eq!(sum.get(0, 1).unwrap(), 3.0);
        assert_eq!(sum.get(0, 2).unwrap(), 0.0);
        assert_eq!(sum.nonzeros()[2], (1, 1, 4.0));
    }

    #[test]
    fn test_intersection_product() {
        let a = csr(&[vec![1.0, 5.0], vec![0.0, 2.0]]);
        let b = csr(&[vec![0.0, 3.0], vec![7.0, 2.0]]);
        let prod = intersect_with(&a, &b, |x, y| x * y).unwrap();
        assert_eq!(prod.nnz(), 2);
        assert_eq!(prod.get(0, 1).unwrap(), 15.0);
        assert_eq!(prod.get(1, 1).unwrap(), 4.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = CsrMatrix::<f64>::zeros((2, 2));
        let b = CsrMatrix::<f64>::zeros((2, 3));
        assert!(matches!(
            union_with(&a, &b, |_| 0.0),
            Err(CsrError::ShapeMismatch { .. })
        ));
    }
}
