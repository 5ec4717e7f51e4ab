//! # strata - lazy matrix expressions for dense and sparse storage
//!
//! This is the **meta crate** that re-exports every strata component.
//!
//! ## Quick Start
//!
//! ```
//! use strata::prelude::*;
//!
//! let a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?;
//! let b = DenseMatrix::<f64>::identity(2);
//! let mut c = DenseMatrix::<f64>::zeros(2, 2);
//!
//! // nothing is computed until the assignment
//! c.assign(a.lazy() * &b + &a)?;
//! assert_eq!(c.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Storage ([`core`], [`sparse`])
//!
//! Dense matrices in row- or column-major order, validated CSR matrices,
//! element types with a fixed promotion table.
//!
//! ```
//! use strata::core::{DenseMatrix, StorageOrder};
//! use strata::sparse::CsrMatrix;
//!
//! let d = DenseMatrix::from_fn_with_order(3, 3, StorageOrder::ColumnMajor, |i, j| (i == j) as i32 as f64);
//! let s = CsrMatrix::from_dense(&d, 0.0);
//! assert_eq!(s.nnz(), 3);
//! ```
//!
//! ### Structural adaptors ([`adapt`])
//!
//! Symmetric, Hermitian and triangular views over any storage. Writes go
//! through proxies that mirror or reject them.
//!
//! ```
//! use strata::adapt::{StructuredMatrix, Symmetric};
//!
//! let mut s = StructuredMatrix::<f64, Symmetric>::zeros(6)?;
//! s.write(2, 5, 7.0)?;
//! assert_eq!(s.read(5, 2), 7.0);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ### Expressions and evaluation ([`exec`])
//!
//! Operators build expression trees; an [`Evaluator`](exec::Evaluator)
//! plans and runs them with the configured kernels ([`kernels`]).
//!
//! ```
//! use strata::prelude::*;
//!
//! let mut a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?;
//! a.update(|a| a.clone() * a)?;
//! assert_eq!(a.as_slice(), &[7.0, 10.0, 15.0, 22.0]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Features
//!
//! - `tracing`: [`tracing_support::init_tracing`] installs a subscriber
//! - `parallel`: row-partitioned parallel product kernel
//! - `serde`: serialization of configuration, tags and storage
//! - `full`: all of the above

#![deny(warnings)]

pub use strata_adapt as adapt;
pub use strata_core as core;
pub use strata_exec as exec;
pub use strata_kernels as kernels;
pub use strata_sparse as sparse;

pub mod tracing_support;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use strata::prelude::*;
    //!
    //! let m = DenseMatrix::<f64>::zeros(3, 3);
    //! assert_eq!(m.shape(), (3, 3));
    //! ```

    // Storage
    pub use crate::core::{
        DenseMatrix, EvalConfig, KernelPreference, MatrixStorage, MatrixStorageMut, Scalar,
        StorageOrder, StrataError, StrataResult, C32, C64,
    };
    pub use crate::sparse::CsrMatrix;

    // Adaptors
    pub use crate::adapt::{
        Diagonal, Hermitian, HermitianMatrix, Lower, LowerMatrix, StrictlyLower,
        StrictlyUpper, StructureKind, StructuredMatrix, Symmetric, SymmetricMatrix, UniLower,
        UniUpper, Upper, UpperMatrix,
    };

    // Expressions
    pub use crate::exec::{evaluate, lazy, Assign, EvalPlan, Evaluator, Expr, Lazy};

    // External kernels
    pub use crate::kernels::{ExternalGemm, GemmCall};
}
