//! Error taxonomy shared by every strata crate
//!
//! All failures are detected eagerly and returned at the call site that
//! triggered them. Nothing is retried, defaulted or downgraded.
//!
//! # Examples
//!
//! ```
//! use strata_core::{DenseMatrix, StrataError};
//!
//! let m = DenseMatrix::<f64>::zeros(2, 2);
//! let err = m.get(2, 0).unwrap_err();
//! assert!(matches!(err, StrataError::OutOfBounds { row: 2, col: 0, .. }));
//! ```

use crate::scalar::ElementKind;
use thiserror::Error;

/// Top-level error type for matrix construction, evaluation and structured writes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrataError {
    /// Operand shapes are incompatible for the requested operation
    #[error("{operation}: dimension mismatch between {lhs:?} and {rhs:?}")]
    DimensionMismatch {
        operation: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// No element-type promotion is defined for the operand combination
    #[error("no element promotion defined for {lhs} and {rhs}")]
    TypeDeductionFailure { lhs: ElementKind, rhs: ElementKind },

    /// A write targets a position the structure forbids
    #[error("{structure} matrix forbids writing position ({row}, {col})")]
    StructuralViolation {
        structure: &'static str,
        row: usize,
        col: usize,
    },

    /// A write violates a value-level structural constraint
    #[error("invalid value at ({row}, {col}): {reason}")]
    InvalidValue {
        row: usize,
        col: usize,
        reason: String,
    },

    /// Row or column outside the declared extents
    #[error("index ({row}, {col}) out of bounds for {nrows}x{ncols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },

    /// A required temporary could not be allocated
    #[error("failed to allocate a temporary of {elements} elements")]
    Allocation { elements: usize },

    /// Storage handed to a constructor breaks its own format rules
    #[error("invalid storage: {reason}")]
    InvalidStorage { reason: String },

    /// An expression cannot be evaluated in the current context
    #[error("invalid expression: {reason}")]
    InvalidExpression { reason: String },

    /// An external numeric kernel reported a failure
    #[error("kernel '{kernel}' failed: {message}")]
    Kernel { kernel: String, message: String },

    /// Evaluation configuration is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout strata
pub type StrataResult<T> = Result<T, StrataError>;

impl StrataError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(
        operation: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    ) -> Self {
        StrataError::DimensionMismatch {
            operation,
            lhs,
            rhs,
        }
    }

    /// Create an out-of-bounds error for a matrix of the given shape
    pub fn out_of_bounds(row: usize, col: usize, shape: (usize, usize)) -> Self {
        StrataError::OutOfBounds {
            row,
            col,
            nrows: shape.0,
            ncols: shape.1,
        }
    }

    /// Create an invalid-value error
    pub fn invalid_value(row: usize, col: usize, reason: impl Into<String>) -> Self {
        StrataError::InvalidValue {
            row,
            col,
            reason: reason.into(),
        }
    }

    /// Create an invalid-storage error
    pub fn invalid_storage(reason: impl Into<String>) -> Self {
        StrataError::InvalidStorage {
            reason: reason.into(),
        }
    }

    /// Create an invalid-expression error
    pub fn invalid_expression(reason: impl Into<String>) -> Self {
        StrataError::InvalidExpression {
            reason: reason.into(),
        }
    }

    /// Whether this error was raised by a structural adaptor
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            StrataError::StructuralViolation { .. } | StrataError::InvalidValue { .. }
        )
    }
}
