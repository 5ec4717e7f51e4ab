//! Lazy expressions
//!
//! An [`Expr`] is an unevaluated expression tree. Building one never touches
//! element data; the tree is consumed by an [`Evaluator`](crate::Evaluator)
//! when it is assigned to a target.
//!
//! Construction errors (mismatched extents, an element type that cannot be
//! deduced at runtime) poison the expression: the error travels with it
//! through further operators and is reported at assignment, before any
//! element of the target is written.

use crate::node::{BinaryOp, Leaf, Node, NodeKind, UnaryOp};
use strata_core::{CastInto, DenseMatrix, Scalar, StorageOrder, StrataError, StrataResult};

/// Unevaluated matrix expression over elements of type `T`
///
/// The lifetime `'a` bounds every matrix the expression borrows.
///
/// # Examples
///
/// ```
/// use strata_core::DenseMatrix;
/// use strata_exec::{Lazy, Assign};
///
/// let a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let b = DenseMatrix::<f64>::identity(2);
///
/// let expr = a.lazy() * &b + &a;
/// assert_eq!(expr.shape().unwrap(), (2, 2));
///
/// let mut c = DenseMatrix::<f64>::zeros(2, 2);
/// c.assign(expr).unwrap();
/// assert_eq!(c[(1, 0)], 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct Expr<'a, T: Scalar> {
    node: Result<Node<'a, T>, StrataError>,
}

impl<'a, T: Scalar> Expr<'a, T> {
    /// Wrap a validated node
    pub fn from_node(node: Node<'a, T>) -> Self {
        Self { node: Ok(node) }
    }

    /// Expression that reports `error` when evaluated
    pub fn poisoned(error: StrataError) -> Self {
        Self { node: Err(error) }
    }

    /// Expression over a single leaf
    pub fn leaf(leaf: Leaf<'a, T>) -> Self {
        Self::from_node(Node::Leaf(leaf))
    }

    /// Placeholder for the assignment target inside an update
    pub(crate) fn target(nrows: usize, ncols: usize) -> Self {
        Self::leaf(Leaf::Target { nrows, ncols })
    }

    /// `(nrows, ncols)` of the result, or the construction error
    pub fn shape(&self) -> StrataResult<(usize, usize)> {
        self.node.as_ref().map(Node::shape).map_err(Clone::clone)
    }

    /// Whether the expression was built without error
    pub fn is_valid(&self) -> bool {
        self.node.is_ok()
    }

    /// Construction error carried by the expression
    pub fn error(&self) -> Option<&StrataError> {
        self.node.as_ref().err()
    }

    /// Root node
    pub fn node(&self) -> StrataResult<&Node<'a, T>> {
        self.node.as_ref().map_err(Clone::clone)
    }

    /// Tag of the root node
    pub fn kind(&self) -> Option<NodeKind> {
        self.node.as_ref().ok().map(Node::kind)
    }

    /// Consume into the root node
    pub fn into_node(self) -> StrataResult<Node<'a, T>> {
        self.node
    }

    fn map(self, f: impl FnOnce(Node<'a, T>) -> StrataResult<Node<'a, T>>) -> Self {
        Self {
            node: self.node.and_then(f),
        }
    }

    /// Element-wise combination; the first construction error wins
    pub(crate) fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        match (lhs.node, rhs.node) {
            (Ok(l), Ok(r)) => Self {
                node: Node::binary(op, l, r),
            },
            (Err(e), _) | (_, Err(e)) => Self::poisoned(e),
        }
    }

    /// Matrix product; the first construction error wins
    pub(crate) fn product(lhs: Self, rhs: Self) -> Self {
        match (lhs.node, rhs.node) {
            (Ok(l), Ok(r)) => Self {
                node: Node::product(l, r),
            },
            (Err(e), _) | (_, Err(e)) => Self::poisoned(e),
        }
    }

    /// Transposed view
    ///
    /// A double transpose collapses back to the operand.
    pub fn transpose(self) -> Self {
        self.map(|node| {
            Ok(match node {
                Node::Transpose(inner) => *inner,
                other => Node::Transpose(Box::new(other)),
            })
        })
    }

    /// Short for [`transpose`](Expr::transpose)
    pub fn t(self) -> Self {
        self.transpose()
    }

    /// Element-wise complex conjugate
    pub fn conj(self) -> Self {
        self.map(|node| {
            Ok(Node::Unary {
                op: UnaryOp::Conjugate,
                operand: Box::new(node),
            })
        })
    }

    /// Conjugate transpose
    pub fn ctranspose(self) -> Self {
        self.transpose().conj()
    }

    /// Multiply every element by `factor`
    pub fn scale(self, factor: T) -> Self {
        self.map(|node| {
            Ok(Node::Scale {
                factor,
                operand: Box::new(node),
            })
        })
    }

    /// Element-wise negation
    pub fn negate(self) -> Self {
        self.map(|node| {
            Ok(Node::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(node),
            })
        })
    }

    /// Element `(row, col)` without materializing the expression
    ///
    /// # Errors
    ///
    /// - the construction error of a poisoned expression
    /// - [`StrataError::OutOfBounds`] outside the result extents
    /// - [`StrataError::InvalidExpression`] when the element depends on a
    ///   product, whose elements exist only after evaluation
    pub fn at(&self, row: usize, col: usize) -> StrataResult<T> {
        let node = self.node()?;
        strata_core::check_bounds(row, col, node.shape())?;
        node.at(row, col).ok_or_else(|| {
            StrataError::invalid_expression("element depends on an unevaluated product")
        })
    }

    /// Submatrix of `nrows x ncols` elements starting at `(row, col)`
    pub fn block(&self, row: usize, col: usize, nrows: usize, ncols: usize) -> StrataResult<DenseMatrix<T>> {
        let shape = self.shape()?;
        let row_end = row.checked_add(nrows).filter(|&end| end <= shape.0);
        let col_end = col.checked_add(ncols).filter(|&end| end <= shape.1);
        if row_end.is_none() || col_end.is_none() {
            return Err(StrataError::out_of_bounds(
                row.saturating_add(nrows),
                col.saturating_add(ncols),
                shape,
            ));
        }
        let mut out = DenseMatrix::try_zeros(nrows, ncols, StorageOrder::RowMajor)?;
        for r in 0..nrows {
            for c in 0..ncols {
                out[(r, c)] = self.at(row + r, col + c)?;
            }
        }
        Ok(out)
    }

    /// Same expression over elements of type `U`
    ///
    /// Borrowed operands are copied into owned, converted leaves.
    pub fn convert<U: Scalar>(self) -> Expr<'a, U>
    where
        T: CastInto<U>,
    {
        Expr {
            node: self.node.and_then(Node::convert),
        }
    }
}

impl<'a, T: Scalar> From<Node<'a, T>> for Expr<'a, T> {
    fn from(node: Node<'a, T>) -> Self {
        Self::from_node(node)
    }
}
