//! Prepared expression trees
//!
//! Preparation turns a [`Node`](crate::node::Node) into a tree the kernels
//! can read directly: nested products are materialized, owned leaves are
//! borrowed and the target placeholder is bound to the target's current
//! contents. A prepared tree never fails to read.

use crate::node::{BinaryOp, UnaryOp};
use crate::target::scatter;
use smallvec::SmallVec;
use std::borrow::Cow;
use strata_core::{DenseMatrix, MatrixStorage, Scalar, StorageOrder, StrataError, StrataResult};
use strata_kernels::elementwise::{
    add_assign_run, conj_run, copy_run, mul_assign_run, negate_run, scale_run, sub_assign_run,
};
use strata_kernels::gemm::GemmOperand;
use strata_sparse::merge::{intersect_with, union_with, UnionValue};
use strata_sparse::CsrMatrix;

/// Read access to the target while an expression over it is evaluated
#[derive(Clone, Copy)]
pub(crate) enum TargetView<'n, T: Scalar> {
    /// No target is bound
    Detached,
    Dense(&'n DenseMatrix<T>),
    Sparse(&'n CsrMatrix<T>),
    Storage(&'n dyn MatrixStorage<T>),
}

pub(crate) fn unbound_target() -> StrataError {
    StrataError::invalid_expression("target placeholder used outside of an update")
}

/// Dense copy of any storage in `order`
pub(crate) fn copy_storage<T, S>(source: &S, order: StorageOrder) -> StrataResult<DenseMatrix<T>>
where
    T: Scalar,
    S: MatrixStorage<T> + ?Sized,
{
    let (nrows, ncols) = source.shape();
    let mut out = DenseMatrix::try_zeros(nrows, ncols, order)?;
    for row in 0..nrows {
        for col in 0..ncols {
            out[(row, col)] = source.at(row, col);
        }
    }
    Ok(out)
}

/// Element-wise tree ready for evaluation
pub(crate) enum Prepared<'n, T: Scalar> {
    Dense(&'n DenseMatrix<T>),
    Sparse(&'n CsrMatrix<T>),
    Storage(&'n dyn MatrixStorage<T>),
    OwnedDense(DenseMatrix<T>),
    OwnedSparse(CsrMatrix<T>),
    Binary(BinaryOp, Box<Prepared<'n, T>>, Box<Prepared<'n, T>>),
    Scale(T, Box<Prepared<'n, T>>),
    Unary(UnaryOp, Box<Prepared<'n, T>>),
    Transpose(Box<Prepared<'n, T>>),
}

impl<'n, T: Scalar> Prepared<'n, T> {
    /// Bind the target placeholder
    pub(crate) fn from_view(view: TargetView<'n, T>) -> StrataResult<Self> {
        match view {
            TargetView::Dense(m) => Ok(Prepared::Dense(m)),
            TargetView::Sparse(m) => Ok(Prepared::Sparse(m)),
            TargetView::Storage(s) => Ok(Prepared::Storage(s)),
            TargetView::Detached => Err(unbound_target()),
        }
    }

    /// Element at `(row, col)`
    pub(crate) fn at(&self, row: usize, col: usize) -> T {
        match self {
            Prepared::Dense(m) => m.at(row, col),
            Prepared::Sparse(m) => m.at(row, col),
            Prepared::Storage(s) => s.at(row, col),
            Prepared::OwnedDense(m) => m.at(row, col),
            Prepared::OwnedSparse(m) => m.at(row, col),
            Prepared::Binary(op, lhs, rhs) => op.apply(lhs.at(row, col), rhs.at(row, col)),
            Prepared::Scale(factor, operand) => *factor * operand.at(row, col),
            Prepared::Unary(op, operand) => op.apply(operand.at(row, col)),
            Prepared::Transpose(inner) => inner.at(col, row),
        }
    }

    fn dense_leaf(&self) -> Option<&DenseMatrix<T>> {
        match self {
            Prepared::Dense(m) => Some(m),
            Prepared::OwnedDense(m) => Some(m),
            _ => None,
        }
    }

    /// Scratch buffers needed by [`eval_run`](Self::eval_run)
    fn scratch_depth(&self) -> usize {
        match self {
            Prepared::Binary(_, lhs, rhs) => lhs.scratch_depth().max(1 + rhs.scratch_depth()),
            Prepared::Scale(_, operand) | Prepared::Unary(_, operand) => operand.scratch_depth(),
            _ => 0,
        }
    }

    /// Evaluate run `major` of an `order`-laid-out result into `out`
    ///
    /// Dense leaves sharing `order` are copied slice-wise; anything else
    /// falls back to logical indexing for that subtree.
    fn eval_run(&self, order: StorageOrder, major: usize, out: &mut [T], scratch: &mut [Vec<T>]) {
        if let Some(m) = self.dense_leaf() {
            if m.order() == order {
                copy_run(out, m.run(major));
                return;
            }
        }
        match self {
            Prepared::Binary(op, lhs, rhs) => {
                lhs.eval_run(order, major, out, scratch);
                if let Some((buf, rest)) = scratch.split_first_mut() {
                    buf.resize(out.len(), T::zero());
                    rhs.eval_run(order, major, buf, rest);
                    match op {
                        BinaryOp::Add => add_assign_run(out, buf),
                        BinaryOp::Sub => sub_assign_run(out, buf),
                        BinaryOp::Hadamard => mul_assign_run(out, buf),
                    }
                }
            }
            Prepared::Scale(factor, operand) => {
                operand.eval_run(order, major, out, scratch);
                scale_run(out, *factor);
            }
            Prepared::Unary(op, operand) => {
                operand.eval_run(order, major, out, scratch);
                match op {
                    UnaryOp::Negate => negate_run(out),
                    UnaryOp::Conjugate => conj_run(out),
                }
            }
            _ => {
                for (minor, slot) in out.iter_mut().enumerate() {
                    let (row, col) = order.position(major, minor);
                    *slot = self.at(row, col);
                }
            }
        }
    }

    /// Fill `out` one contiguous run at a time
    pub(crate) fn write_runs(&self, out: &mut DenseMatrix<T>) {
        let order = out.order();
        let len = order.run_len(out.nrows(), out.ncols());
        let mut scratch: SmallVec<[Vec<T>; 4]> =
            (0..self.scratch_depth()).map(|_| vec![T::zero(); len]).collect();
        for major in 0..out.run_count() {
            self.eval_run(order, major, out.run_mut(major), &mut scratch);
        }
    }

    /// Fill `out` one logical index at a time
    pub(crate) fn write_elements(&self, out: &mut DenseMatrix<T>) {
        for row in 0..out.nrows() {
            for col in 0..out.ncols() {
                out[(row, col)] = self.at(row, col);
            }
        }
    }

    /// Evaluate as CSR by merging sorted rows
    pub(crate) fn to_sparse(&self) -> StrataResult<Cow<'_, CsrMatrix<T>>> {
        Ok(match self {
            Prepared::Sparse(m) => Cow::Borrowed(*m),
            Prepared::OwnedSparse(m) => Cow::Borrowed(m),
            Prepared::Dense(m) => Cow::Owned(CsrMatrix::from_dense(m, 0.0)),
            Prepared::OwnedDense(m) => Cow::Owned(CsrMatrix::from_dense(m, 0.0)),
            Prepared::Storage(s) => Cow::Owned(CsrMatrix::from_storage(*s)),
            Prepared::Binary(op, lhs, rhs) => {
                let a = lhs.to_sparse()?;
                let b = rhs.to_sparse()?;
                let merged = match op {
                    BinaryOp::Add => union_with(&*a, &*b, |v| match v {
                        UnionValue::Left(x) | UnionValue::Right(x) => x,
                        UnionValue::Both(x, y) => x + y,
                    })?,
                    BinaryOp::Sub => union_with(&*a, &*b, |v| match v {
                        UnionValue::Left(x) => x,
                        UnionValue::Right(y) => y.negate(),
                        UnionValue::Both(x, y) => x - y,
                    })?,
                    BinaryOp::Hadamard => intersect_with(&*a, &*b, |x, y| x * y)?,
                };
                Cow::Owned(merged)
            }
            Prepared::Scale(factor, operand) => {
                let factor = *factor;
                let mut scaled = operand.to_sparse()?.map(|v| factor * v);
                scaled.prune(0.0);
                Cow::Owned(scaled)
            }
            Prepared::Unary(op, operand) => {
                let op = *op;
                Cow::Owned(operand.to_sparse()?.map(|v| op.apply(v)))
            }
            Prepared::Transpose(inner) => Cow::Owned(inner.to_sparse()?.transpose()),
        })
    }

    /// Evaluate as CSR and scatter into `out`
    pub(crate) fn write_sparse(&self, out: &mut DenseMatrix<T>) -> StrataResult<()> {
        let merged = self.to_sparse()?;
        scatter(&merged, out);
        Ok(())
    }
}

/// One operand of a product, as the kernels consume it
pub(crate) enum ProductSide<'n, T: Scalar> {
    /// Dense buffer with a transposition flag
    Dense(Cow<'n, DenseMatrix<T>>, bool),
    Sparse(Cow<'n, CsrMatrix<T>>),
}

/// Kernel view of a dense product side
pub(crate) fn gemm_operand<'m, T: Scalar>(matrix: &'m DenseMatrix<T>, trans: bool) -> GemmOperand<'m, T> {
    let operand = GemmOperand::from_dense(matrix);
    if trans {
        operand.transposed()
    } else {
        operand
    }
}
