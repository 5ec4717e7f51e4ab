//! Dense matrix-matrix products
//!
//! Every kernel computes `C = op(A) · op(B)` where `op` is the identity or a
//! transpose selected by [`GemmOperand::trans`]. Operands are read through
//! their storage order, so a transposed read never materializes a copy.
//!
//! | kernel | strategy |
//! |--------|----------|
//! | [`gemm_naive`] | triple loop, one dot product per output element |
//! | [`gemm_blocked`] | square tiles accumulated locally, each output written once |
//! | [`gemm_parallel`] | output rows partitioned across the rayon pool (`parallel` feature) |
//!
//! # Examples
//!
//! ```
//! use strata_core::DenseMatrix;
//! use strata_kernels::gemm::{gemm_blocked, GemmOperand, GemmOutput};
//!
//! let a = DenseMatrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let b = DenseMatrix::from_vec(3, 1, vec![1.0, 0.0, -1.0]).unwrap();
//! let mut c = DenseMatrix::zeros(2, 1);
//!
//! gemm_blocked(
//!     &GemmOperand::from_dense(&a),
//!     &GemmOperand::from_dense(&b),
//!     &mut GemmOutput::from_dense(&mut c),
//!     2,
//! )
//! .unwrap();
//! assert_eq!(c.as_slice(), &[-2.0, -2.0]);
//! ```

use crate::error::{KernelError, KernelResult};
use strata_core::{DenseMatrix, Scalar, StorageOrder};

/// Read-only dense operand of a product
#[derive(Debug, Clone, Copy)]
pub struct GemmOperand<'a, T> {
    /// Elements in `order`
    pub data: &'a [T],
    /// Stored row count (before `trans`)
    pub nrows: usize,
    /// Stored column count (before `trans`)
    pub ncols: usize,
    /// Memory order of `data`
    pub order: StorageOrder,
    /// Read the operand transposed
    pub trans: bool,
}

impl<'a, T: Scalar> GemmOperand<'a, T> {
    /// Wrap a buffer, checking its length
    pub fn new(
        data: &'a [T],
        nrows: usize,
        ncols: usize,
        order: StorageOrder,
    ) -> KernelResult<Self> {
        if data.len() != nrows * ncols {
            return Err(KernelError::BufferLength {
                operation: "gemm operand",
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            nrows,
            ncols,
            order,
            trans: false,
        })
    }

    /// Borrow a dense matrix
    pub fn from_dense(m: &'a DenseMatrix<T>) -> Self {
        Self {
            data: m.as_slice(),
            nrows: m.nrows(),
            ncols: m.ncols(),
            order: m.order(),
            trans: false,
        }
    }

    /// Same operand read transposed
    pub fn transposed(mut self) -> Self {
        self.trans = !self.trans;
        self
    }

    /// Rows of `op(self)`
    #[inline]
    pub fn rows(&self) -> usize {
        if self.trans {
            self.ncols
        } else {
            self.nrows
        }
    }

    /// Columns of `op(self)`
    #[inline]
    pub fn cols(&self) -> usize {
        if self.trans {
            self.nrows
        } else {
            self.ncols
        }
    }

    /// Element `(i, j)` of `op(self)`
    #[inline(always)]
    pub fn at(&self, i: usize, j: usize) -> T {
        let (r, c) = if self.trans { (j, i) } else { (i, j) };
        self.data[self.order.offset(r, c, self.nrows, self.ncols)]
    }
}

/// Writable dense result of a product
#[derive(Debug)]
pub struct GemmOutput<'a, T> {
    /// Elements in `order`
    pub data: &'a mut [T],
    /// Row count
    pub nrows: usize,
    /// Column count
    pub ncols: usize,
    /// Memory order of `data`
    pub order: StorageOrder,
}

impl<'a, T: Scalar> GemmOutput<'a, T> {
    /// Wrap a mutable buffer, checking its length
    pub fn new(
        data: &'a mut [T],
        nrows: usize,
        ncols: usize,
        order: StorageOrder,
    ) -> KernelResult<Self> {
        if data.len() != nrows * ncols {
            return Err(KernelError::BufferLength {
                operation: "gemm output",
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            nrows,
            ncols,
            order,
        })
    }

    /// Borrow a dense matrix as the product destination
    pub fn from_dense(m: &'a mut DenseMatrix<T>) -> Self {
        let (nrows, ncols, order) = (m.nrows(), m.ncols(), m.order());
        Self {
            data: m.as_mut_slice(),
            nrows,
            ncols,
            order,
        }
    }

    /// Store `value` at `(i, j)`
    #[inline(always)]
    pub fn put(&mut self, i: usize, j: usize, value: T) {
        let offset = self.order.offset(i, j, self.nrows, self.ncols);
        self.data[offset] = value;
    }

    /// Reborrow with a shorter lifetime
    pub fn reborrow(&mut self) -> GemmOutput<'_, T> {
        GemmOutput {
            data: &mut *self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            order: self.order,
        }
    }
}

/// Check `op(A) · op(B)` fits into `out`, returning `(m, n, k)`
pub fn check_gemm_shapes<T: Scalar>(
    a: &GemmOperand<'_, T>,
    b: &GemmOperand<'_, T>,
    out: &GemmOutput<'_, T>,
) -> KernelResult<(usize, usize, usize)> {
    if a.cols() != b.rows() {
        return Err(KernelError::DimensionMismatch {
            operation: "gemm",
            lhs: (a.rows(), a.cols()),
            rhs: (b.rows(), b.cols()),
        });
    }
    if (out.nrows, out.ncols) != (a.rows(), b.cols()) {
        return Err(KernelError::DimensionMismatch {
            operation: "gemm output",
            lhs: (out.nrows, out.ncols),
            rhs: (a.rows(), b.cols()),
        });
    }
    Ok((a.rows(), b.cols(), a.cols()))
}

/// Naive triple-loop product
pub fn gemm_naive<T: Scalar>(
    a: &GemmOperand<'_, T>,
    b: &GemmOperand<'_, T>,
    out: &mut GemmOutput<'_, T>,
) -> KernelResult<()> {
    let (m, n, k) = check_gemm_shapes(a, b, out)?;
    for i in 0..m {
        for j in 0..n {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc + a.at(i, p) * b.at(p, j);
            }
            out.put(i, j, acc);
        }
    }
    Ok(())
}

/// Blocked (tiled) product
///
/// Each `block_size x block_size` output tile is accumulated in a local
/// buffer across all inner tiles, then stored once.
///
/// # Errors
///
/// [`KernelError::InvalidTileSize`] when `block_size` is zero, or a
/// dimension mismatch.
pub fn gemm_blocked<T: Scalar>(
    a: &GemmOperand<'_, T>,
    b: &GemmOperand<'_, T>,
    out: &mut GemmOutput<'_, T>,
    block_size: usize,
) -> KernelResult<()> {
    if block_size == 0 {
        return Err(KernelError::InvalidTileSize {
            operation: "gemm_blocked",
            tile_size: block_size,
        });
    }
    let (m, n, k) = check_gemm_shapes(a, b, out)?;
    let mut tile = vec![T::zero(); block_size * block_size];

    for ii in (0..m).step_by(block_size) {
        let i_end = (ii + block_size).min(m);
        for jj in (0..n).step_by(block_size) {
            let j_end = (jj + block_size).min(n);
            let width = j_end - jj;
            tile.iter_mut().for_each(|x| *x = T::zero());

            for kk in (0..k).step_by(block_size) {
                let k_end = (kk + block_size).min(k);
                for i in ii..i_end {
                    let row = &mut tile[(i - ii) * width..(i - ii + 1) * width];
                    for p in kk..k_end {
                        let a_ip = a.at(i, p);
                        for (j, slot) in (jj..j_end).zip(row.iter_mut()) {
                            *slot = *slot + a_ip * b.at(p, j);
                        }
                    }
                }
            }

            for i in ii..i_end {
                for j in jj..j_end {
                    out.put(i, j, tile[(i - ii) * width + (j - jj)]);
                }
            }
        }
    }
    Ok(())
}

/// Row-partitioned parallel product
///
/// Output rows are computed independently on the rayon pool into a
/// row-major buffer, which is then stored into `out`.
#[cfg(feature = "parallel")]
pub fn gemm_parallel<T: Scalar>(
    a: &GemmOperand<'_, T>,
    b: &GemmOperand<'_, T>,
    out: &mut GemmOutput<'_, T>,
) -> KernelResult<()> {
    use scirs2_core::parallel_ops::*;

    let (m, n, k) = check_gemm_shapes(a, b, out)?;
    if n == 0 || m == 0 {
        return Ok(());
    }

    let compute_row = |i: usize, row: &mut [T]| {
        row.iter_mut().for_each(|x| *x = T::zero());
        for p in 0..k {
            let a_ip = a.at(i, p);
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = *slot + a_ip * b.at(p, j);
            }
        }
    };

    if out.order == StorageOrder::RowMajor {
        out.data
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| compute_row(i, row));
    } else {
        let mut staged = vec![T::zero(); m * n];
        staged
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| compute_row(i, row));
        for i in 0..m {
            for j in 0..n {
                out.put(i, j, staged[i * n + j]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
            (0..a.ncols()).map(|p| a[(i, p)] * b[(p, j)]).sum()
        })
    }

    fn sample(m: usize, n: usize, seed: usize) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(m, n, |i, j| ((i * 31 + j * 17 + seed) % 11) as f64 - 5.0)
    }

    #[test]
    fn test_naive_matches_reference() {
        let a = sample(4, 5, 1);
        let b = sample(5, 3, 2);
        let mut c = DenseMatrix::zeros(4, 3);
        gemm_naive(
            &GemmOperand::from_dense(&a),
            &GemmOperand::from_dense(&b),
            &mut GemmOutput::from_dense(&mut c),
        )
        .unwrap();
        assert_eq!(c, reference(&a, &b));
    }

    #[test]
    fn test_blocked_ragged_tiles() {
        let a = sample(7, 9, 3);
        let b = sample(9, 5, 4);
        let expected = reference(&a, &b);
        for bs in [1, 2, 3, 4, 8, 64] {
            let mut c = DenseMatrix::zeros_with_order(7, 5, StorageOrder::ColumnMajor);
            gemm_blocked(
                &GemmOperand::from_dense(&a),
                &GemmOperand::from_dense(&b),
                &mut GemmOutput::from_dense(&mut c),
                bs,
            )
            .unwrap();
            assert_eq!(c, expected, "block size {}", bs);
        }
    }

    #[test]
    fn test_zero_times_infinity_is_nan_on_every_kernel() {
        let a = DenseMatrix::from_vec(1, 1, vec![0.0]).unwrap();
        let b = DenseMatrix::from_vec(1, 1, vec![f64::INFINITY]).unwrap();

        let mut naive = DenseMatrix::zeros(1, 1);
        gemm_naive(
            &GemmOperand::from_dense(&a),
            &GemmOperand::from_dense(&b),
            &mut GemmOutput::from_dense(&mut naive),
        )
        .unwrap();
        let mut blocked = DenseMatrix::zeros(1, 1);
        gemm_blocked(
            &GemmOperand::from_dense(&a),
            &GemmOperand::from_dense(&b),
            &mut GemmOutput::from_dense(&mut blocked),
            4,
        )
        .unwrap();

        assert!(naive[(0, 0)].is_nan());
        assert!(blocked[(0, 0)].is_nan());
    }

    #[test]
    fn test_transposed_operands() {
        let a = sample(5, 4, 5);
        let b = sample(3, 5, 6);
        // A^T (4x5) * B^T (5x3)
        let expected = reference(&a.clone().into_transpose(), &b.clone().into_transpose());
        let mut c = DenseMatrix::zeros(4, 3);
        gemm_naive(
            &GemmOperand::from_dense(&a).transposed(),
            &GemmOperand::from_dense(&b).transposed(),
            &mut GemmOutput::from_dense(&mut c),
        )
        .unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_shape_errors() {
        let a = sample(2, 3, 0);
        let b = sample(2, 3, 0);
        let mut c = DenseMatrix::zeros(2, 3);
        let err = gemm_naive(
            &GemmOperand::from_dense(&a),
            &GemmOperand::from_dense(&b),
            &mut GemmOutput::from_dense(&mut c),
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::DimensionMismatch { .. }));

        let err = gemm_blocked(
            &GemmOperand::from_dense(&a),
            &GemmOperand::from_dense(&b).transposed(),
            &mut GemmOutput::from_dense(&mut c),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::InvalidTileSize { .. }));
    }

    #[test]
    fn test_operand_length_checked() {
        let data = [1.0, 2.0, 3.0];
        assert!(GemmOperand::new(&data, 2, 2, StorageOrder::RowMajor).is_err());
        assert!(GemmOperand::new(&data, 3, 1, StorageOrder::RowMajor).is_ok());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_naive() {
        let a = sample(13, 6, 7);
        let b = sample(6, 9, 8);
        let expected = reference(&a, &b);
        for order in [StorageOrder::RowMajor, StorageOrder::ColumnMajor] {
            let mut c = DenseMatrix::zeros_with_order(13, 9, order);
            gemm_parallel(
                &GemmOperand::from_dense(&a),
                &GemmOperand::from_dense(&b),
                &mut GemmOutput::from_dense(&mut c),
            )
            .unwrap();
            assert_eq!(c, expected);
        }
    }
}
