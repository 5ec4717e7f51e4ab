//! External product kernel contract
//!
//! An optimized third-party routine (a BLAS binding, an accelerator
//! dispatcher, ...) plugs into the evaluator by implementing
//! [`ExternalGemm`]. The evaluator only calls it for products whose
//! `m * n * k` reaches the configured `external_threshold`; smaller
//! products stay on the built-in kernels.
//!
//! # Examples
//!
//! ```
//! use strata_core::DenseMatrix;
//! use strata_kernels::external::{ExternalGemm, GemmCall, ReferenceGemm};
//! use strata_kernels::gemm::{GemmOperand, GemmOutput};
//!
//! let a = DenseMatrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
//! let b = DenseMatrix::from_vec(2, 1, vec![3.0, 4.0]).unwrap();
//! let mut c = DenseMatrix::zeros(1, 1);
//!
//! let call = GemmCall::new(
//!     GemmOperand::from_dense(&a),
//!     GemmOperand::from_dense(&b),
//!     GemmOutput::from_dense(&mut c),
//! )
//! .unwrap();
//! ReferenceGemm.gemm(call).unwrap();
//! assert_eq!(c[(0, 0)], 11.0);
//! ```

use crate::error::KernelResult;
use crate::gemm::{check_gemm_shapes, gemm_blocked, GemmOperand, GemmOutput};
use strata_core::config::DEFAULT_BLOCK_SIZE;
use strata_core::Scalar;

/// One product request: `out = op(a) · op(b)`
///
/// Shapes are checked on construction; `m`, `n` and `k` describe the
/// product after transposition flags are applied.
#[derive(Debug)]
pub struct GemmCall<'a, T> {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub a: GemmOperand<'a, T>,
    pub b: GemmOperand<'a, T>,
    pub out: GemmOutput<'a, T>,
}

impl<'a, T: Scalar> GemmCall<'a, T> {
    /// Build a call, checking operand and output extents
    pub fn new(
        a: GemmOperand<'a, T>,
        b: GemmOperand<'a, T>,
        out: GemmOutput<'a, T>,
    ) -> KernelResult<Self> {
        let (m, n, k) = check_gemm_shapes(&a, &b, &out)?;
        Ok(Self { m, n, k, a, b, out })
    }

    /// Multiply-add count of the call
    pub fn work(&self) -> usize {
        self.m.saturating_mul(self.n).saturating_mul(self.k)
    }
}

/// Externally provided product kernel
pub trait ExternalGemm<T: Scalar>: Send + Sync {
    /// Name reported in plans, logs and errors
    fn name(&self) -> &str;

    /// Compute `call.out = op(call.a) · op(call.b)`
    ///
    /// # Errors
    ///
    /// Implementations report failures as
    /// [`KernelError::External`](crate::KernelError::External).
    fn gemm(&self, call: GemmCall<'_, T>) -> KernelResult<()>;
}

/// In-crate implementation of [`ExternalGemm`] backed by the blocked kernel
///
/// Useful as a stand-in when wiring the external path without a third-party
/// library.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceGemm;

impl<T: Scalar> ExternalGemm<T> for ReferenceGemm {
    fn name(&self) -> &str {
        "reference"
    }

    fn gemm(&self, mut call: GemmCall<'_, T>) -> KernelResult<()> {
        gemm_blocked(&call.a, &call.b, &mut call.out, DEFAULT_BLOCK_SIZE)
    }
}
