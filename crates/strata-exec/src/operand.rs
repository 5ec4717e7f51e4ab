//! Operand capture and element-type deduction
//!
//! [`Operand`] says how a value enters an expression: named matrices are
//! borrowed, transient values (owned matrices, other expressions) are moved
//! in. [`Lift`] moves an expression to the element type chosen by
//! [`Promote`](strata_core::Promote); lifting to the same type is free, and
//! widening copies borrowed leaves into converted owned ones.
//!
//! | operand | capture |
//! |---------|---------|
//! | `&DenseMatrix<T>`, `&CsrMatrix<T>`, `&StructuredMatrix<T, S, M>` | by reference |
//! | `DenseMatrix<T>`, `CsrMatrix<T>`, `Expr<'a, T>` | by value |

use crate::expr::Expr;
use crate::node::{Capture, Leaf};
use strata_adapt::{Structure, StructuredMatrix};
use strata_core::{DenseMatrix, MatrixStorage, Scalar, C32, C64};
use strata_sparse::CsrMatrix;

/// A value that can appear inside an expression
pub trait Operand<'a>: Sized {
    /// Element type of the operand
    type Elem: Scalar;

    /// How the operand is held by the expression
    const CAPTURE: Capture;

    /// Capture the operand as an expression
    fn into_expr(self) -> Expr<'a, Self::Elem>;
}

impl<'a, T: Scalar> Operand<'a> for &'a DenseMatrix<T> {
    type Elem = T;
    const CAPTURE: Capture = Capture::ByReference;

    fn into_expr(self) -> Expr<'a, T> {
        Expr::leaf(Leaf::Dense(self))
    }
}

impl<'a, T: Scalar> Operand<'a> for DenseMatrix<T> {
    type Elem = T;
    const CAPTURE: Capture = Capture::ByValue;

    fn into_expr(self) -> Expr<'a, T> {
        Expr::leaf(Leaf::OwnedDense(self))
    }
}

impl<'a, T: Scalar> Operand<'a> for &'a CsrMatrix<T> {
    type Elem = T;
    const CAPTURE: Capture = Capture::ByReference;

    fn into_expr(self) -> Expr<'a, T> {
        Expr::leaf(Leaf::Sparse(self))
    }
}

impl<'a, T: Scalar> Operand<'a> for CsrMatrix<T> {
    type Elem = T;
    const CAPTURE: Capture = Capture::ByValue;

    fn into_expr(self) -> Expr<'a, T> {
        Expr::leaf(Leaf::OwnedSparse(self))
    }
}

impl<'a, T, S, M> Operand<'a> for &'a StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorage<T> + 'a,
{
    type Elem = T;
    const CAPTURE: Capture = Capture::ByReference;

    fn into_expr(self) -> Expr<'a, T> {
        Expr::leaf(Leaf::Storage(self))
    }
}

impl<'a, T: Scalar> Operand<'a> for Expr<'a, T> {
    type Elem = T;
    const CAPTURE: Capture = Capture::ByValue;

    fn into_expr(self) -> Expr<'a, T> {
        self
    }
}

/// Capture mode of an operand type
pub fn capture_of<'a, O: Operand<'a>>() -> Capture {
    O::CAPTURE
}

/// Start an expression from any operand
pub fn lazy<'a, O: Operand<'a>>(operand: O) -> Expr<'a, O::Elem> {
    operand.into_expr()
}

/// Borrow a named matrix as an expression
///
/// Operators on two matrices from other crates cannot be provided here, so
/// expressions start from `.lazy()` (or from another expression).
pub trait Lazy<T: Scalar> {
    /// Borrow `self` as an expression leaf
    fn lazy(&self) -> Expr<'_, T>;
}

impl<T: Scalar> Lazy<T> for DenseMatrix<T> {
    fn lazy(&self) -> Expr<'_, T> {
        Expr::leaf(Leaf::Dense(self))
    }
}

impl<T: Scalar> Lazy<T> for CsrMatrix<T> {
    fn lazy(&self) -> Expr<'_, T> {
        Expr::leaf(Leaf::Sparse(self))
    }
}

impl<T, S, M> Lazy<T> for StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorage<T>,
{
    fn lazy(&self) -> Expr<'_, T> {
        Expr::leaf(Leaf::Storage(self))
    }
}

/// Move an expression to element type `U`
pub trait Lift<'a, U: Scalar> {
    fn lift(self) -> Expr<'a, U>;
}

macro_rules! lift_identity {
    ($($ty:ty),*) => {
        $(
            impl<'a> Lift<'a, $ty> for Expr<'a, $ty> {
                #[inline]
                fn lift(self) -> Expr<'a, $ty> {
                    self
                }
            }
        )*
    };
}

macro_rules! lift_widen {
    ($($from:ty => $to:ty),* $(,)?) => {
        $(
            impl<'a> Lift<'a, $to> for Expr<'a, $from> {
                fn lift(self) -> Expr<'a, $to> {
                    self.convert()
                }
            }
        )*
    };
}

lift_identity!(i32, i64, f32, f64, C32, C64);

lift_widen!(
    i32 => i64,
    i32 => f32,
    i32 => f64,
    i64 => f64,
    f32 => f64,
    f32 => C32,
    f32 => C64,
    f64 => C64,
    C32 => C64,
);
