//! Dense matrix implementation
//!
//! [`DenseMatrix`] is a contiguous buffer with a row-major or column-major
//! [`StorageOrder`](crate::StorageOrder). The type is split across sub-modules
//! by concern: definition and accessors, creation, indexing and iteration,
//! and comparison.

pub mod types;

mod comparison;
mod creation;
mod indexing;

pub use types::DenseMatrix;
