//! # strata-kernels
//!
//! Numeric kernels run by the strata evaluation engine.
//!
//! ## Overview
//!
//! - **Dense products** ([`gemm`]): naive triple loop, blocked/tiled, and a
//!   row-partitioned parallel kernel behind the `parallel` feature. All take
//!   per-operand transposition flags and storage orders.
//! - **Element-wise runs** ([`elementwise`]): slice kernels applied to one
//!   contiguous row or column at a time.
//! - **Sparse products** ([`sparse_gemm`]): sparse × dense and dense × sparse
//!   with a dense accumulator row, sparse × sparse by sorted row merges.
//! - **External kernels** ([`external`]): the [`ExternalGemm`] contract for
//!   plugging in an optimized product routine.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_core::DenseMatrix;
//! use strata_kernels::{gemm_naive, GemmOperand, GemmOutput};
//!
//! let a = DenseMatrix::<f64>::identity(3);
//! let b = DenseMatrix::from_fn(3, 2, |i, j| (i + j) as f64);
//! let mut c = DenseMatrix::zeros(3, 2);
//! gemm_naive(
//!     &GemmOperand::from_dense(&a),
//!     &GemmOperand::from_dense(&b),
//!     &mut GemmOutput::from_dense(&mut c),
//! )
//! .unwrap();
//! assert_eq!(c, b);
//! ```

pub mod elementwise;
pub mod error;
pub mod external;
pub mod gemm;
pub mod sparse_gemm;

pub use error::{KernelError, KernelResult};
pub use external::{ExternalGemm, GemmCall, ReferenceGemm};
#[cfg(feature = "parallel")]
pub use gemm::gemm_parallel;
pub use gemm::{check_gemm_shapes, gemm_blocked, gemm_naive, GemmOperand, GemmOutput};
pub use sparse_gemm::{dense_spmm, spgemm_sorted_merge, spmm};
