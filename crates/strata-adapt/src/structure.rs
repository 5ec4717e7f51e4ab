//! Structure tags and per-position rules
//!
//! A structure decides, for every `(row, col)` of a square matrix, whether
//! the position can be written freely, is written together with its mirror
//! `(col, row)`, or holds a fixed implied value.
//!
//! | structure | writable | mirrored | fixed |
//! |-----------|----------|----------|-------|
//! | Symmetric | diagonal | off-diagonal, same value | - |
//! | Hermitian | diagonal (real only) | off-diagonal, conjugate | - |
//! | Upper | `row <= col` | - | 0 below |
//! | Lower | `row >= col` | - | 0 above |
//! | UniUpper | `row < col` | - | 1 on, 0 below the diagonal |
//! | UniLower | `row > col` | - | 1 on, 0 above the diagonal |
//! | StrictlyUpper | `row < col` | - | 0 on and below |
//! | StrictlyLower | `row > col` | - | 0 on and above |
//! | Diagonal | `row == col` | - | 0 off the diagonal |

use std::fmt;
use strata_core::{Scalar, StrataError, StrataResult};

/// Runtime tag of a matrix structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StructureKind {
    Symmetric,
    Hermitian,
    Upper,
    Lower,
    UniUpper,
    UniLower,
    StrictlyUpper,
    StrictlyLower,
    Diagonal,
}

/// How a structure treats one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    /// Stored and written directly
    Writable,
    /// Written together with the transposed position
    Mirrored,
    /// Fixed by the structure; writes are rejected
    Restricted,
}

impl StructureKind {
    /// Every structure tag
    pub const ALL: [StructureKind; 9] = [
        StructureKind::Symmetric,
        StructureKind::Hermitian,
        StructureKind::Upper,
        StructureKind::Lower,
        StructureKind::UniUpper,
        StructureKind::UniLower,
        StructureKind::StrictlyUpper,
        StructureKind::StrictlyLower,
        StructureKind::Diagonal,
    ];

    /// Lower-case name used in errors and logs
    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Symmetric => "symmetric",
            StructureKind::Hermitian => "hermitian",
            StructureKind::Upper => "upper",
            StructureKind::Lower => "lower",
            StructureKind::UniUpper => "uniupper",
            StructureKind::UniLower => "unilower",
            StructureKind::StrictlyUpper => "strictly upper",
            StructureKind::StrictlyLower => "strictly lower",
            StructureKind::Diagonal => "diagonal",
        }
    }

    /// Whether off-diagonal writes are mirrored
    pub fn is_mirrored(self) -> bool {
        matches!(self, StructureKind::Symmetric | StructureKind::Hermitian)
    }

    /// Whether the diagonal is fixed to one
    pub fn has_unit_diagonal(self) -> bool {
        matches!(self, StructureKind::UniUpper | StructureKind::UniLower)
    }

    /// Classify position `(row, col)`
    pub fn classify(self, row: usize, col: usize) -> CellClass {
        use std::cmp::Ordering::*;
        use CellClass::*;

        let ord = row.cmp(&col);
        match (self, ord) {
            (StructureKind::Symmetric | StructureKind::Hermitian, Equal) => Writable,
            (StructureKind::Symmetric | StructureKind::Hermitian, _) => Mirrored,
            (StructureKind::Upper, Less | Equal) => Writable,
            (StructureKind::Lower, Greater | Equal) => Writable,
            (StructureKind::UniUpper | StructureKind::StrictlyUpper, Less) => Writable,
            (StructureKind::UniLower | StructureKind::StrictlyLower, Greater) => Writable,
            (StructureKind::Diagonal, Equal) => Writable,
            _ => Restricted,
        }
    }

    /// Value a restricted position always holds
    ///
    /// `None` for positions that are not restricted.
    pub fn implied<T: Scalar>(self, row: usize, col: usize) -> Option<T> {
        if self.classify(row, col) != CellClass::Restricted {
            return None;
        }
        if row == col && self.has_unit_diagonal() {
            Some(T::one())
        } else {
            Some(T::zero())
        }
    }

    /// Value stored at `(col, row)` when `value` is written at `(row, col)`
    #[inline]
    pub fn mirror<T: Scalar>(self, value: T) -> T {
        match self {
            StructureKind::Hermitian => value.conj(),
            _ => value,
        }
    }

    /// Check a single write against the structure
    ///
    /// # Errors
    ///
    /// - [`StrataError::StructuralViolation`] for a restricted position
    /// - [`StrataError::InvalidValue`] for a Hermitian diagonal value with a
    ///   nonzero imaginary part
    pub fn check_write<T: Scalar>(self, row: usize, col: usize, value: T) -> StrataResult<()> {
        match self.classify(row, col) {
            CellClass::Restricted => Err(StrataError::StructuralViolation {
                structure: self.name(),
                row,
                col,
            }),
            CellClass::Writable if self == StructureKind::Hermitian && !value.is_real() => {
                Err(StrataError::invalid_value(
                    row,
                    col,
                    "hermitian diagonal must be real",
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-level structure tag carried by an adaptor
pub trait Structure: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag of this structure
    const KIND: StructureKind;
}

macro_rules! structure_markers {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct $name;

            impl Structure for $name {
                const KIND: StructureKind = StructureKind::$name;
            }
        )*
    };
}

structure_markers! {
    /// `A(r, c) == A(c, r)`
    Symmetric,
    /// `A(r, c) == conj(A(c, r))` with a real diagonal
    Hermitian,
    /// Zero below the diagonal
    Upper,
    /// Zero above the diagonal
    Lower,
    /// Unit diagonal, zero below it
    UniUpper,
    /// Unit diagonal, zero above it
    UniLower,
    /// Zero on and below the diagonal
    StrictlyUpper,
    /// Zero on and above the diagonal
    StrictlyLower,
    /// Zero off the diagonal
    Diagonal,
}
