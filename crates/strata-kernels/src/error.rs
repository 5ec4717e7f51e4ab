//! Error types for kernel operations

use std::fmt;
use strata_core::StrataError;

/// Error type for kernel operations
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Operand extents are incompatible
    DimensionMismatch {
        operation: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// A buffer does not hold the number of elements its extents require
    BufferLength {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid tile/block size
    InvalidTileSize { operation: &'static str, tile_size: usize },

    /// An external kernel reported a failure
    External { kernel: String, message: String },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::DimensionMismatch {
                operation,
                lhs,
                rhs,
            } => write!(
                f,
                "{}: dimension mismatch between {:?} and {:?}",
                operation, lhs, rhs
            ),
            KernelError::BufferLength {
                operation,
                expected,
                actual,
            } => write!(
                f,
                "{}: buffer holds {} elements, expected {}",
                operation, actual, expected
            ),
            KernelError::InvalidTileSize {
                operation,
                tile_size,
            } => write!(f, "{}: invalid tile size {}", operation, tile_size),
            KernelError::External { kernel, message } => {
                write!(f, "external kernel '{}': {}", kernel, message)
            }
        }
    }
}

impl std::error::Error for KernelError {}

impl From<KernelError> for StrataError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::DimensionMismatch {
                operation,
                lhs,
                rhs,
            } => StrataError::dimension_mismatch(operation, lhs, rhs),
            KernelError::External { kernel, message } => StrataError::Kernel { kernel, message },
            other => StrataError::Kernel {
                kernel: "builtin".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result alias for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;
