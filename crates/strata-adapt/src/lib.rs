//! # strata-adapt
//!
//! Structural adaptors for square matrices.
//!
//! A [`StructuredMatrix`] wraps a storage matrix together with a type-level
//! structure tag ([`Symmetric`], [`Hermitian`], [`Upper`], [`Lower`],
//! [`UniUpper`], [`UniLower`], [`StrictlyUpper`], [`StrictlyLower`],
//! [`Diagonal`]). The structure is enforced on every write:
//!
//! - restricted positions (below the diagonal of an upper-triangular matrix,
//!   the unit diagonal of a uni-triangular one, ...) reject writes with
//!   [`StrataError::StructuralViolation`](strata_core::StrataError) and
//!   always read as their implied value
//! - symmetric and Hermitian off-diagonal writes store both `(r, c)` and
//!   `(c, r)` as one step
//! - Hermitian diagonal entries must be real
//!
//! Writes go through an [`ElementProxy`] obtained from
//! [`StructuredMatrix::at_mut`]. Bulk replacement with
//! [`StructuredMatrix::commit_from`] validates the whole source first and
//! writes nothing when it would break the structure.
//!
//! ```
//! use strata_adapt::{StructuredMatrix, Upper};
//! use strata_core::StrataError;
//!
//! let mut u = StructuredMatrix::<f64, Upper>::zeros(4).unwrap();
//! u.write(1, 3, 2.0).unwrap();
//!
//! let before = u.to_dense();
//! let err = u.write(3, 1, 9.0).unwrap_err();
//! assert!(matches!(err, StrataError::StructuralViolation { .. }));
//! assert_eq!(u.to_dense(), before);
//! ```

pub mod adaptor;
pub mod proxy;
pub mod structure;

pub use adaptor::{
    check_structure, DiagonalMatrix, HermitianMatrix, LowerMatrix, StructuredMatrix,
    SymmetricMatrix, UpperMatrix,
};
pub use proxy::ElementProxy;
pub use structure::{
    CellClass, Diagonal, Hermitian, Lower, StrictlyLower, StrictlyUpper, Structure,
    StructureKind, Symmetric, UniLower, UniUpper, Upper,
};
