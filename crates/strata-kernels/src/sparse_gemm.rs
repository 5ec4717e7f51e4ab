//! Products with sparse operands
//!
//! - [`spmm`]: sparse × dense, one dense accumulator row per output row
//! - [`dense_spmm`]: dense × sparse, scattering sparse rows into the
//!   accumulator
//! - [`spgemm_sorted_merge`]: sparse × sparse, each output row built by
//!   merging scaled sorted rows of the right operand, so the result needs
//!   no sorting pass

use crate::error::{KernelError, KernelResult};
use crate::gemm::{GemmOperand, GemmOutput};
use strata_core::Scalar;
use strata_sparse::merge::{merge_sorted, UnionValue};
use strata_sparse::{CsrMatrix, SparseStorage};

fn check_output<T: Scalar>(out: &GemmOutput<'_, T>, m: usize, n: usize) -> KernelResult<()> {
    if (out.nrows, out.ncols) != (m, n) {
        return Err(KernelError::DimensionMismatch {
            operation: "sparse product output",
            lhs: (out.nrows, out.ncols),
            rhs: (m, n),
        });
    }
    Ok(())
}

/// Sparse × dense product `C = A · op(B)`
///
/// # Examples
///
/// ```
/// use strata_core::DenseMatrix;
/// use strata_kernels::gemm::{GemmOperand, GemmOutput};
/// use strata_kernels::sparse_gemm::spmm;
/// use strata_sparse::CsrMatrix;
///
/// let a = CsrMatrix::from_triplets((2, 2), &[(0, 1, 2.0), (1, 0, 3.0)]).unwrap();
/// let b = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let mut c = DenseMatrix::zeros(2, 2);
/// spmm(&a, &GemmOperand::from_dense(&b), &mut GemmOutput::from_dense(&mut c)).unwrap();
/// assert_eq!(c.as_slice(), &[6.0, 8.0, 3.0, 6.0]);
/// ```
pub fn spmm<T, S>(a: &S, b: &GemmOperand<'_, T>, out: &mut GemmOutput<'_, T>) -> KernelResult<()>
where
    T: Scalar,
    S: SparseStorage<T> + ?Sized,
{
    let (m, k) = a.shape();
    if k != b.rows() {
        return Err(KernelError::DimensionMismatch {
            operation: "spmm",
            lhs: (m, k),
            rhs: (b.rows(), b.cols()),
        });
    }
    let n = b.cols();
    check_output(out, m, n)?;

    let mut acc = vec![T::zero(); n];
    for i in 0..m {
        acc.iter_mut().for_each(|x| *x = T::zero());
        let (cols, vals) = a.row_entries(i);
        for (&p, &a_ip) in cols.iter().zip(vals) {
            for (j, slot) in acc.iter_mut().enumerate() {
                *slot = *slot + a_ip * b.at(p, j);
            }
        }
        for (j, &v) in acc.iter().enumerate() {
            out.put(i, j, v);
        }
    }
    Ok(())
}

/// Dense × sparse product `C = op(A) · B`
pub fn dense_spmm<T, S>(
    a: &GemmOperand<'_, T>,
    b: &S,
    out: &mut GemmOutput<'_, T>,
) -> KernelResult<()>
where
    T: Scalar,
    S: SparseStorage<T> + ?Sized,
{
    let (k, n) = b.shape();
    if a.cols() != k {
        return Err(KernelError::DimensionMismatch {
            operation: "dense_spmm",
            lhs: (a.rows(), a.cols()),
            rhs: (k, n),
        });
    }
    let m = a.rows();
    check_output(out, m, n)?;

    let mut acc = vec![T::zero(); n];
    for i in 0..m {
        acc.iter_mut().for_each(|x| *x = T::zero());
        for p in 0..k {
            let a_ip = a.at(i, p);
            let (cols, vals) = b.row_entries(p);
            for (&j, &b_pj) in cols.iter().zip(vals) {
                acc[j] = acc[j] + a_ip * b_pj;
            }
        }
        for (j, &v) in acc.iter().enumerate() {
            out.put(i, j, v);
        }
    }
    Ok(())
}

/// Sparse × sparse product `C = A · B` by sorted row merges
///
/// Output row `i` is the sum over stored `a_ip` of `a_ip · B[p, :]`; each
/// term is merged into the running row, which stays sorted. Cancelled
/// entries are not stored.
pub fn spgemm_sorted_merge<T, A, B>(a: &A, b: &B) -> KernelResult<CsrMatrix<T>>
where
    T: Scalar,
    A: SparseStorage<T> + ?Sized,
    B: SparseStorage<T> + ?Sized,
{
    let (m, k) = a.shape();
    let (k2, n) = b.shape();
    if k != k2 {
        return Err(KernelError::DimensionMismatch {
            operation: "spgemm",
            lhs: (m, k),
            rhs: (k2, n),
        });
    }

    let mut triplets = Vec::new();
    let mut row_cols: Vec<usize> = Vec::new();
    let mut row_vals: Vec<T> = Vec::new();
    let mut next_cols: Vec<usize> = Vec::new();
    let mut next_vals: Vec<T> = Vec::new();

    for i in 0..m {
        row_cols.clear();
        row_vals.clear();
        let (a_cols, a_vals) = a.row_entries(i);
        for (&p, &a_ip) in a_cols.iter().zip(a_vals) {
            let (b_cols, b_vals) = b.row_entries(p);
            next_cols.clear();
            next_vals.clear();
            merge_sorted(&row_cols, &row_vals, b_cols, b_vals, |j, v| {
                let value = match v {
                    UnionValue::Left(x) => x,
                    UnionValue::Right(y) => a_ip * y,
                    UnionValue::Both(x, y) => x + a_ip * y,
                };
                next_cols.push(j);
                next_vals.push(value);
            });
            std::mem::swap(&mut row_cols, &mut next_cols);
            std::mem::swap(&mut row_vals, &mut next_vals);
        }
        triplets.extend(
            row_cols
                .iter()
                .zip(&row_vals)
                .filter(|&(_, &v)| v != T::zero())
                .map(|(&j, &v)| (i, j, v)),
        );
    }

    CsrMatrix::from_triplets((m, n), &triplets).map_err(|e| KernelError::External {
        kernel: "spgemm_sorted_merge".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{DenseMatrix, StorageOrder};

    fn dense_ref(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
            (0..a.ncols()).map(|p| a[(i, p)] * b[(p, j)]).sum()
        })
    }

    fn sparse_sample() -> DenseMatrix<f64> {
        DenseMatrix::from_rows(&[
            vec![1.0, 0.0, 0.0, 2.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, -3.0, 4.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_spmm_matches_dense() {
        let ad = sparse_sample();
        let a = CsrMatrix::from_dense(&ad, 0.0);
        let b = DenseMatrix::from_fn(4, 2, |i, j| (i + 2 * j) as f64);
        let mut c = DenseMatrix::zeros_with_order(3, 2, StorageOrder::ColumnMajor);
        spmm(&a, &GemmOperand::from_dense(&b), &mut GemmOutput::from_dense(&mut c)).unwrap();
        assert_eq!(c, dense_ref(&ad, &b));
    }

    #[test]
    fn test_dense_spmm_matches_dense() {
        let bd = sparse_sample();
        let b = CsrMatrix::from_dense(&bd, 0.0);
        let a = DenseMatrix::from_fn(2, 3, |i, j| (i * 3 + j) as f64 - 2.0);
        let mut c = DenseMatrix::zeros(2, 4);
        dense_spmm(&GemmOperand::from_dense(&a), &b, &mut GemmOutput::from_dense(&mut c)).unwrap();
        assert_eq!(c, dense_ref(&a, &bd));
    }

    #[test]
    fn test_dense_spmm_keeps_nan_from_stored_infinity() {
        let b = CsrMatrix::from_triplets((1, 1), &[(0, 0, f64::INFINITY)]).unwrap();
        let a = DenseMatrix::from_vec(1, 1, vec![0.0]).unwrap();
        let mut c = DenseMatrix::zeros(1, 1);
        dense_spmm(&GemmOperand::from_dense(&a), &b, &mut GemmOutput::from_dense(&mut c)).unwrap();
        assert!(c[(0, 0)].is_nan());
    }

    #[test]
    fn test_spgemm_matches_dense() {
        let ad = sparse_sample();
        let bd = DenseMatrix::from_rows(&[
            vec![0.0, 1.0, 0.0],
            vec![2.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, -0.5, 1.0],
        ])
        .unwrap();
        let a = CsrMatrix::from_dense(&ad, 0.0);
        let b = CsrMatrix::from_dense(&bd, 0.0);
        let c = spgemm_sorted_merge(&a, &b).unwrap();
        assert_eq!(c.to_dense(), dense_ref(&ad, &bd));
        // row 0: 1*[0,1,0] + 2*[0,-0.5,1] cancels column 1
        assert_eq!(c.row(0).unwrap().0, &[2]);
    }

    #[test]
    fn test_sparse_shape_errors() {
        let a = CsrMatrix::<f64>::zeros((2, 3));
        let b = CsrMatrix::<f64>::zeros((2, 3));
        assert!(spgemm_sorted_merge(&a, &b).is_err());

        let d = DenseMatrix::<f64>::zeros(2, 2);
        let mut c = DenseMatrix::zeros(2, 2);
        assert!(spmm(&a, &GemmOperand::from_dense(&d), &mut GemmOutput::from_dense(&mut c)).is_err());
    }
}
