//! Operator overloads building expression nodes
//!
//! | operator | node |
//! |----------|------|
//! | `a + b`, `a - b` | element-wise add / subtract |
//! | `a * b` | matrix product |
//! | `a * s`, `s * a` (scalar `s`) | scale |
//! | `-a` | negate |
//!
//! The element type of a binary expression is deduced with
//! [`Promote`](strata_core::Promote). An expression on the left accepts any
//! [`Operand`] on the right; a matrix on the left accepts an expression on
//! the right.

use crate::expr::Expr;
use crate::node::BinaryOp;
use crate::operand::{Lift, Operand};
use std::ops::{Add, Mul, Neg, Sub};
use strata_adapt::{Structure, StructuredMatrix};
use strata_core::{CastInto, DenseMatrix, MatrixStorage, Promote, Promoted, Scalar, C32, C64};
use strata_sparse::CsrMatrix;

/// Capture both operands and lift them to the promoted element type
fn lifted<'a, L, R, U>(lhs: L, rhs: R) -> (Expr<'a, U>, Expr<'a, U>)
where
    L: Operand<'a>,
    R: Operand<'a>,
    U: Scalar,
    Expr<'a, L::Elem>: Lift<'a, U>,
    Expr<'a, R::Elem>: Lift<'a, U>,
{
    (lhs.into_expr().lift(), rhs.into_expr().lift())
}

impl<'a, A: Scalar> Expr<'a, A> {
    /// Element-wise (Hadamard) product
    pub fn hadamard<R>(self, rhs: R) -> Expr<'a, Promoted<A, R::Elem>>
    where
        R: Operand<'a>,
        A: Promote<R::Elem>,
        Expr<'a, A>: Lift<'a, Promoted<A, R::Elem>>,
        Expr<'a, R::Elem>: Lift<'a, Promoted<A, R::Elem>>,
    {
        let (l, r) = lifted(self, rhs);
        Expr::binary(BinaryOp::Hadamard, l, r)
    }
}

macro_rules! expr_lhs_ops {
    ($($trait:ident :: $method:ident => $build:expr;)*) => {
        $(
            impl<'a, A, R> $trait<R> for Expr<'a, A>
            where
                A: Scalar + Promote<R::Elem>,
                R: Operand<'a>,
                Expr<'a, A>: Lift<'a, Promoted<A, R::Elem>>,
                Expr<'a, R::Elem>: Lift<'a, Promoted<A, R::Elem>>,
            {
                type Output = Expr<'a, Promoted<A, R::Elem>>;

                fn $method(self, rhs: R) -> Self::Output {
                    let (l, r) = lifted(self, rhs);
                    $build(l, r)
                }
            }
        )*
    };
}

expr_lhs_ops! {
    Add::add => |l, r| Expr::binary(BinaryOp::Add, l, r);
    Sub::sub => |l, r| Expr::binary(BinaryOp::Sub, l, r);
    Mul::mul => Expr::product;
}

macro_rules! matrix_lhs_ops {
    ($([$($gen:tt)*] $lhs:ty;)*) => {
        $(
            impl<'a, A, B, $($gen)*> Add<Expr<'a, B>> for $lhs
            where
                A: Scalar + Promote<B>,
                B: Scalar,
                Expr<'a, A>: Lift<'a, Promoted<A, B>>,
                Expr<'a, B>: Lift<'a, Promoted<A, B>>,
            {
                type Output = Expr<'a, Promoted<A, B>>;

                fn add(self, rhs: Expr<'a, B>) -> Self::Output {
                    let (l, r) = lifted(self, rhs);
                    Expr::binary(BinaryOp::Add, l, r)
                }
            }

            impl<'a, A, B, $($gen)*> Sub<Expr<'a, B>> for $lhs
            where
                A: Scalar + Promote<B>,
                B: Scalar,
                Expr<'a, A>: Lift<'a, Promoted<A, B>>,
                Expr<'a, B>: Lift<'a, Promoted<A, B>>,
            {
                type Output = Expr<'a, Promoted<A, B>>;

                fn sub(self, rhs: Expr<'a, B>) -> Self::Output {
                    let (l, r) = lifted(self, rhs);
                    Expr::binary(BinaryOp::Sub, l, r)
                }
            }

            impl<'a, A, B, $($gen)*> Mul<Expr<'a, B>> for $lhs
            where
                A: Scalar + Promote<B>,
                B: Scalar,
                Expr<'a, A>: Lift<'a, Promoted<A, B>>,
                Expr<'a, B>: Lift<'a, Promoted<A, B>>,
            {
                type Output = Expr<'a, Promoted<A, B>>;

                fn mul(self, rhs: Expr<'a, B>) -> Self::Output {
                    let (l, r) = lifted(self, rhs);
                    Expr::product(l, r)
                }
            }
        )*
    };
}

matrix_lhs_ops! {
    [] &'a DenseMatrix<A>;
    [] DenseMatrix<A>;
    [] &'a CsrMatrix<A>;
    [] CsrMatrix<A>;
    [S: Structure, M: MatrixStorage<A> + 'a] &'a StructuredMatrix<A, S, M>;
}

impl<'a, A: Scalar> Neg for Expr<'a, A> {
    type Output = Expr<'a, A>;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

macro_rules! scalar_ops {
    ($($s:ty),*) => {
        $(
            impl<'a, A> Mul<$s> for Expr<'a, A>
            where
                A: Scalar + Promote<$s>,
                Expr<'a, A>: Lift<'a, Promoted<A, $s>>,
                $s: CastInto<Promoted<A, $s>>,
            {
                type Output = Expr<'a, Promoted<A, $s>>;

                fn mul(self, factor: $s) -> Self::Output {
                    self.lift().scale(factor.cast_into())
                }
            }

            impl<'a, A> Mul<Expr<'a, A>> for $s
            where
                A: Scalar,
                $s: Promote<A> + CastInto<Promoted<$s, A>>,
                Expr<'a, A>: Lift<'a, Promoted<$s, A>>,
            {
                type Output = Expr<'a, Promoted<$s, A>>;

                fn mul(self, expr: Expr<'a, A>) -> Self::Output {
                    expr.lift().scale(self.cast_into())
                }
            }
        )*
    };
}

scalar_ops!(i32, i64, f32, f64, C32, C64);

#[cfg(test)]
mod tests {
    use crate::node::NodeKind;
    use crate::Lazy;
    use strata_core::{DenseMatrix, StrataError, C64};
    use strata_sparse::CsrMatrix;

    #[test]
    fn test_operators_build_nodes() {
        let a = DenseMatrix::<f64>::zeros(2, 3);
        let b = DenseMatrix::<f64>::zeros(3, 2);
        assert_eq!((a.lazy() + &a).kind(), Some(NodeKind::Add));
        assert_eq!((a.lazy() - a.clone()).kind(), Some(NodeKind::Sub));
        assert_eq!((a.lazy() * &b).shape().unwrap(), (2, 2));
        assert_eq!((-a.lazy()).kind(), Some(NodeKind::Negate));
        assert_eq!((2.0f64 * a.lazy()).kind(), Some(NodeKind::Scale));
        assert_eq!((&b * a.lazy()).shape().unwrap(), (3, 3));
        assert_eq!(a.lazy().hadamard(&a).kind(), Some(NodeKind::Hadamard));
    }

    #[test]
    fn test_mixed_types_promote() {
        let a = DenseMatrix::from_vec(1, 2, vec![1.0f32, 2.0]).unwrap();
        let b = DenseMatrix::from_vec(1, 2, vec![10.0f64, 20.0]).unwrap();
        let sum = a.lazy() + &b;
        assert_eq!(sum.at(0, 1).unwrap(), 22.0f64);

        let i = DenseMatrix::from_vec(1, 2, vec![1i64, 2]).unwrap();
        let f = DenseMatrix::from_vec(1, 2, vec![0.5f32, 0.5]).unwrap();
        let mixed = i.lazy() + &f;
        assert_eq!(mixed.at(0, 0).unwrap(), 1.5f64);

        let z = (a.lazy() * C64::new(0.0, 1.0)).at(0, 0).unwrap();
        assert_eq!(z, C64::new(0.0, 1.0));
    }

    #[test]
    fn test_construction_mismatch_is_carried() {
        let a = DenseMatrix::<f64>::zeros(2, 3);
        let s = CsrMatrix::<f64>::zeros((2, 2));
        let e = &s * a.lazy() + &s;
        assert!(matches!(
            e.shape(),
            Err(StrataError::DimensionMismatch { operation: "add", .. })
        ));
        let p = a.lazy() * &a;
        assert!(matches!(
            p.error(),
            Some(StrataError::DimensionMismatch { operation: "product", .. })
        ));
    }
}
