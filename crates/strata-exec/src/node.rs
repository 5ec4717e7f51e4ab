//! Expression tree nodes
//!
//! [`Node`] is the closed set of operations an expression can hold. Leaves
//! either borrow a named matrix or own a transient one; interior nodes own
//! their children. Shapes are validated when a node is built, so every
//! well-formed tree is dimensionally consistent.

use std::fmt;
use strata_core::{CastInto, DenseMatrix, MatrixStorage, Scalar, StorageId, StrataError, StrataResult};
use strata_sparse::CsrMatrix;

/// How an operand is held inside an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capture {
    /// Borrowed from a named matrix that outlives the expression
    ByReference,
    /// Moved into the expression
    ByValue,
}

/// Element-wise binary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Hadamard,
}

impl BinaryOp {
    /// Operation name used in errors
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Hadamard => "hadamard",
        }
    }

    #[inline]
    pub(crate) fn apply<T: Scalar>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Hadamard => a * b,
        }
    }
}

/// Element-wise unary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Conjugate,
}

impl UnaryOp {
    #[inline]
    pub(crate) fn apply<T: Scalar>(self, value: T) -> T {
        match self {
            UnaryOp::Negate => value.negate(),
            UnaryOp::Conjugate => value.conj(),
        }
    }
}

/// Tag of a node, for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Leaf,
    Add,
    Sub,
    Hadamard,
    Scale,
    Negate,
    Conjugate,
    Transpose,
    Product,
}

/// Operand at the bottom of an expression tree
#[derive(Clone)]
pub enum Leaf<'a, T: Scalar> {
    /// Borrowed dense matrix
    Dense(&'a DenseMatrix<T>),
    /// Borrowed CSR matrix
    Sparse(&'a CsrMatrix<T>),
    /// Any other borrowed storage, read element by element
    Storage(&'a dyn MatrixStorage<T>),
    /// Dense matrix moved into the expression
    OwnedDense(DenseMatrix<T>),
    /// CSR matrix moved into the expression
    OwnedSparse(CsrMatrix<T>),
    /// Current contents of the assignment target, bound at evaluation
    Target { nrows: usize, ncols: usize },
}

impl<'a, T: Scalar> Leaf<'a, T> {
    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Leaf::Dense(m) => m.shape(),
            Leaf::Sparse(m) => m.shape(),
            Leaf::Storage(s) => s.shape(),
            Leaf::OwnedDense(m) => m.shape(),
            Leaf::OwnedSparse(m) => m.shape(),
            Leaf::Target { nrows, ncols } => (*nrows, *ncols),
        }
    }

    /// How the operand is held
    pub fn capture(&self) -> Capture {
        match self {
            Leaf::Dense(_) | Leaf::Sparse(_) | Leaf::Storage(_) | Leaf::Target { .. } => {
                Capture::ByReference
            }
            Leaf::OwnedDense(_) | Leaf::OwnedSparse(_) => Capture::ByValue,
        }
    }

    /// Storage identity of a borrowed operand
    ///
    /// Owned operands cannot alias anything and report `None`. The target
    /// placeholder is identified by the evaluator, not here.
    pub fn storage_id(&self) -> Option<StorageId> {
        match self {
            Leaf::Dense(m) => Some(m.storage_id()),
            Leaf::Sparse(m) => Some(m.storage_id()),
            Leaf::Storage(s) => Some(s.storage_id()),
            _ => None,
        }
    }

    /// Element at `(row, col)`; `None` for the unbound target placeholder
    fn at(&self, row: usize, col: usize) -> Option<T> {
        match self {
            Leaf::Dense(m) => Some(m.at(row, col)),
            Leaf::Sparse(m) => Some(m.at(row, col)),
            Leaf::Storage(s) => Some(s.at(row, col)),
            Leaf::OwnedDense(m) => Some(m.at(row, col)),
            Leaf::OwnedSparse(m) => Some(m.at(row, col)),
            Leaf::Target { .. } => None,
        }
    }

    fn convert<U: Scalar>(self) -> StrataResult<Leaf<'a, U>>
    where
        T: CastInto<U>,
    {
        Ok(match self {
            Leaf::Dense(m) => Leaf::OwnedDense(m.cast()),
            Leaf::OwnedDense(m) => Leaf::OwnedDense(m.cast()),
            Leaf::Sparse(m) => Leaf::OwnedSparse(m.cast()),
            Leaf::OwnedSparse(m) => Leaf::OwnedSparse(m.cast()),
            Leaf::Storage(s) => Leaf::OwnedDense(DenseMatrix::from_fn(s.nrows(), s.ncols(), |r, c| {
                s.at(r, c).cast_into()
            })),
            Leaf::Target { .. } => {
                return Err(StrataError::invalid_expression(
                    "the assignment target cannot change element type inside its own update",
                ))
            }
        })
    }
}

impl<T: Scalar> fmt::Debug for Leaf<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, (nrows, ncols)) = match self {
            Leaf::Dense(_) => ("Dense", self.shape()),
            Leaf::Sparse(_) => ("Sparse", self.shape()),
            Leaf::Storage(_) => ("Storage", self.shape()),
            Leaf::OwnedDense(_) => ("OwnedDense", self.shape()),
            Leaf::OwnedSparse(_) => ("OwnedSparse", self.shape()),
            Leaf::Target { .. } => ("Target", self.shape()),
        };
        write!(f, "{name}({nrows}x{ncols})")
    }
}

/// Expression tree
#[derive(Debug, Clone)]
pub enum Node<'a, T: Scalar> {
    Leaf(Leaf<'a, T>),
    Binary {
        op: BinaryOp,
        lhs: Box<Node<'a, T>>,
        rhs: Box<Node<'a, T>>,
    },
    Scale {
        factor: T,
        operand: Box<Node<'a, T>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node<'a, T>>,
    },
    Transpose(Box<Node<'a, T>>),
    Product {
        lhs: Box<Node<'a, T>>,
        rhs: Box<Node<'a, T>>,
    },
}

impl<'a, T: Scalar> Node<'a, T> {
    /// Element-wise node, checking that both sides have equal extents
    pub fn binary(op: BinaryOp, lhs: Node<'a, T>, rhs: Node<'a, T>) -> StrataResult<Self> {
        let (l, r) = (lhs.shape(), rhs.shape());
        if l != r {
            return Err(StrataError::dimension_mismatch(op.name(), l, r));
        }
        Ok(Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Matrix product node, checking the inner dimension
    pub fn product(lhs: Node<'a, T>, rhs: Node<'a, T>) -> StrataResult<Self> {
        let (l, r) = (lhs.shape(), rhs.shape());
        if l.1 != r.0 {
            return Err(StrataError::dimension_mismatch("product", l, r));
        }
        Ok(Node::Product {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// `(nrows, ncols)` of the node's value
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Node::Leaf(leaf) => leaf.shape(),
            Node::Binary { lhs, .. } => lhs.shape(),
            Node::Scale { operand, .. } | Node::Unary { operand, .. } => operand.shape(),
            Node::Transpose(inner) => {
                let (r, c) = inner.shape();
                (c, r)
            }
            Node::Product { lhs, rhs } => (lhs.shape().0, rhs.shape().1),
        }
    }

    /// Tag of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Binary { op: BinaryOp::Add, .. } => NodeKind::Add,
            Node::Binary { op: BinaryOp::Sub, .. } => NodeKind::Sub,
            Node::Binary { op: BinaryOp::Hadamard, .. } => NodeKind::Hadamard,
            Node::Scale { .. } => NodeKind::Scale,
            Node::Unary { op: UnaryOp::Negate, .. } => NodeKind::Negate,
            Node::Unary { op: UnaryOp::Conjugate, .. } => NodeKind::Conjugate,
            Node::Transpose(_) => NodeKind::Transpose,
            Node::Product { .. } => NodeKind::Product,
        }
    }

    /// Visit every leaf, left to right
    pub fn for_each_leaf<'n>(&'n self, f: &mut impl FnMut(&'n Leaf<'a, T>)) {
        match self {
            Node::Leaf(leaf) => f(leaf),
            Node::Binary { lhs, rhs, .. } | Node::Product { lhs, rhs } => {
                lhs.for_each_leaf(f);
                rhs.for_each_leaf(f);
            }
            Node::Scale { operand, .. } | Node::Unary { operand, .. } | Node::Transpose(operand) => {
                operand.for_each_leaf(f)
            }
        }
    }

    /// Whether any node of the tree has kind `kind`
    pub fn contains(&self, kind: NodeKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            Node::Leaf(_) => false,
            Node::Binary { lhs, rhs, .. } | Node::Product { lhs, rhs } => {
                lhs.contains(kind) || rhs.contains(kind)
            }
            Node::Scale { operand, .. } | Node::Unary { operand, .. } | Node::Transpose(operand) => {
                operand.contains(kind)
            }
        }
    }

    /// Element `(row, col)` read straight through the tree
    ///
    /// Products are opaque here and yield `None`, as does the unbound target
    /// placeholder.
    pub(crate) fn at(&self, row: usize, col: usize) -> Option<T> {
        match self {
            Node::Leaf(leaf) => leaf.at(row, col),
            Node::Binary { op, lhs, rhs } => Some(op.apply(lhs.at(row, col)?, rhs.at(row, col)?)),
            Node::Scale { factor, operand } => Some(*factor * operand.at(row, col)?),
            Node::Unary { op, operand } => Some(op.apply(operand.at(row, col)?)),
            Node::Transpose(inner) => inner.at(col, row),
            Node::Product { .. } => None,
        }
    }

    pub(crate) fn convert<U: Scalar>(self) -> StrataResult<Node<'a, U>>
    where
        T: CastInto<U>,
    {
        Ok(match self {
            Node::Leaf(leaf) => Node::Leaf(leaf.convert()?),
            Node::Binary { op, lhs, rhs } => Node::Binary {
                op,
                lhs: Box::new(lhs.convert()?),
                rhs: Box::new(rhs.convert()?),
            },
            Node::Scale { factor, operand } => Node::Scale {
                factor: factor.cast_into(),
                operand: Box::new(operand.convert()?),
            },
            Node::Unary { op, operand } => Node::Unary {
                op,
                operand: Box::new(operand.convert()?),
            },
            Node::Transpose(inner) => Node::Transpose(Box::new(inner.convert()?)),
            Node::Product { lhs, rhs } => Node::Product {
                lhs: Box::new(lhs.convert()?),
                rhs: Box::new(rhs.convert()?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_and_checks() {
        let a = DenseMatrix::<f64>::zeros(2, 3);
        let b = DenseMatrix::<f64>::zeros(3, 4);
        let prod = Node::product(Node::Leaf(Leaf::Dense(&a)), Node::Leaf(Leaf::Dense(&b))).unwrap();
        assert_eq!(prod.shape(), (2, 4));
        assert_eq!(Node::Transpose(Box::new(prod)).shape(), (4, 2));

        let err = Node::binary(BinaryOp::Add, Node::Leaf(Leaf::Dense(&a)), Node::Leaf(Leaf::Dense(&b)))
            .unwrap_err();
        assert!(matches!(err, StrataError::DimensionMismatch { operation: "add", .. }));
    }

    #[test]
    fn test_leaf_capture_and_ids() {
        let a = DenseMatrix::<f64>::zeros(2, 2);
        let borrowed = Leaf::Dense(&a);
        assert_eq!(borrowed.capture(), Capture::ByReference);
        assert_eq!(borrowed.storage_id(), Some(a.storage_id()));

        let owned: Leaf<'_, f64> = Leaf::OwnedDense(a.clone());
        assert_eq!(owned.capture(), Capture::ByValue);
        assert_eq!(owned.storage_id(), None);
    }

    #[test]
    fn test_convert_materializes_leaves() {
        let a = DenseMatrix::from_vec(1, 2, vec![1.0f32, 2.0]).unwrap();
        let node = Node::Scale {
            factor: 2.0f32,
            operand: Box::new(Node::Leaf(Leaf::Dense(&a))),
        };
        let wide: Node<'_, f64> = node.convert().unwrap();
        assert_eq!(wide.at(0, 1), Some(4.0));

        let target: Node<'_, f32> = Node::Leaf(Leaf::Target { nrows: 1, ncols: 1 });
        assert!(target.convert::<f64>().is_err());
    }
}
