//! Errors raised while building or mutating sparse storage

use strata_core::StrataError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsrError {
    #[error("Invalid row pointers: length {len} for {nrows} rows (expected {expected})")]
    InvalidRowPtr {
        len: usize,
        nrows: usize,
        expected: usize,
    },

    #[error("Row pointer not sorted at index {idx}: {curr} > {next}")]
    RowPtrNotSorted {
        idx: usize,
        curr: usize,
        next: usize,
    },

    #[error("Row pointer ends at {last}, but there are {nnz} non-zeros")]
    RowPtrEnd { last: usize, nnz: usize },

    #[error("Length mismatch: {col_indices} col_indices but {values} values")]
    LengthMismatch { col_indices: usize, values: usize },

    #[error("Column index out of bounds: {col_idx} >= {ncols}")]
    ColIndexOutOfBounds { col_idx: usize, ncols: usize },

    #[error("Columns of row {row} not strictly increasing at position {position}")]
    ColumnsNotSorted { row: usize, position: usize },

    #[error("Entry ({row}, {col}) out of bounds for {nrows}x{ncols} matrix")]
    EntryOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },

    #[error("Shape mismatch: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
}

impl From<CsrError> for StrataError {
    fn from(err: CsrError) -> Self {
        match err {
            CsrError::EntryOutOfBounds {
                row,
                col,
                nrows,
                ncols,
            } => StrataError::OutOfBounds {
                row,
                col,
                nrows,
                ncols,
            },
            CsrError::ShapeMismatch { lhs, rhs } => {
                StrataError::dimension_mismatch("sparse merge", lhs, rhs)
            }
            other => StrataError::invalid_storage(other.to_string()),
        }
    }
}
