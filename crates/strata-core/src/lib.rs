//! # strata-core
//!
//! Core matrix types, element promotion and the storage-access contract for
//! strata.
//!
//! This crate provides the building blocks every other strata crate consumes:
//!
//! - **Element types** ([`Scalar`], [`ElementKind`]) and the fixed promotion
//!   table ([`Promote`], [`CastInto`])
//! - **Dense storage** ([`DenseMatrix`]) in row-major or column-major
//!   [`StorageOrder`]
//! - **Storage contract** ([`MatrixStorage`], [`MatrixStorageMut`]) through
//!   which the evaluation engine and structural adaptors read and write
//! - **Storage identity** ([`StorageId`]) used by alias analysis
//! - **Errors** ([`StrataError`]) and **evaluation knobs** ([`EvalConfig`])
//!
//! ## SciRS2 Integration
//!
//! Numeric traits, complex numbers and array interop come from `scirs2-core`
//! (`scirs2_core::numeric`, `scirs2_core::ndarray_ext`).
//!
//! ## Quick Start
//!
//! ```
//! use strata_core::{DenseMatrix, MatrixStorage, StorageOrder};
//!
//! let a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = a.to_order(StorageOrder::ColumnMajor);
//!
//! // Equality is logical, independent of memory order
//! assert_eq!(a, b);
//! assert_eq!(b.extent(1), 2);
//! assert_eq!(b.nonzeros().len(), 4);
//! ```
//!
//! ## Promotion
//!
//! ```
//! use strata_core::{Promoted, Scalar, ElementKind};
//!
//! assert_eq!(<Promoted<f32, f64> as Scalar>::KIND, ElementKind::F64);
//! assert_eq!(<Promoted<i64, f32> as Scalar>::KIND, ElementKind::F64);
//! ```

pub mod config;
pub mod dense;
pub mod error;
pub mod layout;
pub mod promote;
pub mod scalar;
pub mod storage;

pub use config::{EvalConfig, KernelPreference};
pub use dense::DenseMatrix;
pub use error::{StrataError, StrataResult};
pub use layout::{StorageId, StorageOrder};
pub use promote::{CastInto, Promote, Promoted};
pub use scalar::{ElementKind, Scalar};
pub use storage::{check_bounds, Density, MatrixStorage, MatrixStorageMut};

/// Complex number type re-exported from `scirs2_core`
pub use scirs2_core::numeric::Complex;

/// Complex with 32-bit float components
pub type C32 = Complex<f32>;

/// Complex with 64-bit float components
pub type C64 = Complex<f64>;
