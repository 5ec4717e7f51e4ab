//! Assignment targets
//!
//! An [`AssignTarget`] is anything an expression can be assigned to. Dense
//! matrices can be written in place; CSR matrices and structured adaptors
//! receive a fully computed [`Staged`] result, so a failed evaluation never
//! leaves them half written.

use crate::engine::Evaluator;
use crate::expr::Expr;
use crate::operand::{Lift, Operand};
use strata_adapt::{Structure, StructureKind, StructuredMatrix};
use strata_core::{DenseMatrix, MatrixStorage, MatrixStorageMut, Scalar, StorageOrder, StrataResult};
use strata_sparse::CsrMatrix;

/// Storage shape of an assignment target, as seen by the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// Plain dense buffer in the given order
    Dense(StorageOrder),
    /// CSR storage, rebuilt on assignment
    Sparse,
    /// Structural adaptor, written through proxies
    Structured(StructureKind),
}

/// Fully evaluated result waiting to be committed
#[derive(Debug, Clone)]
pub enum Staged<T: Scalar> {
    Dense(DenseMatrix<T>),
    Sparse(CsrMatrix<T>),
}

impl<T: Scalar> Staged<T> {
    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Staged::Dense(m) => m.shape(),
            Staged::Sparse(m) => m.shape(),
        }
    }

    /// Dense form of the result
    pub fn into_dense(self) -> DenseMatrix<T> {
        match self {
            Staged::Dense(m) => m,
            Staged::Sparse(m) => m.to_dense(),
        }
    }

    /// CSR form of the result, dropping exact zeros
    pub fn into_sparse(self) -> CsrMatrix<T> {
        match self {
            Staged::Dense(m) => CsrMatrix::from_dense(&m, 0.0),
            Staged::Sparse(m) => m,
        }
    }
}

/// Write `source`'s nonzeros into a zeroed `out`
pub(crate) fn scatter<T: Scalar>(source: &CsrMatrix<T>, out: &mut DenseMatrix<T>) {
    out.fill(T::zero());
    for (row, col, value) in source.iter_nonzeros() {
        out[(row, col)] = value;
    }
}

/// A matrix that can receive the value of an expression
pub trait AssignTarget<T: Scalar>: MatrixStorage<T> {
    /// Storage shape used for planning
    fn form(&self) -> TargetForm;

    /// Dense buffer, when the target is one
    fn as_dense(&self) -> Option<&DenseMatrix<T>> {
        None
    }

    /// CSR storage, when the target is one
    fn as_sparse(&self) -> Option<&CsrMatrix<T>> {
        None
    }

    /// Mutable dense buffer for in-place evaluation
    fn dense_mut(&mut self) -> Option<&mut DenseMatrix<T>> {
        None
    }

    /// Replace the contents with a fully evaluated result
    ///
    /// The result has the target's shape.
    fn commit(&mut self, staged: Staged<T>) -> StrataResult<()>;
}

impl<T: Scalar> AssignTarget<T> for DenseMatrix<T> {
    fn form(&self) -> TargetForm {
        TargetForm::Dense(self.order())
    }

    fn as_dense(&self) -> Option<&DenseMatrix<T>> {
        Some(self)
    }

    fn dense_mut(&mut self) -> Option<&mut DenseMatrix<T>> {
        Some(self)
    }

    fn commit(&mut self, staged: Staged<T>) -> StrataResult<()> {
        match staged {
            Staged::Dense(m) if m.order() == self.order() && m.shape() == self.shape() => {
                *self = m;
                Ok(())
            }
            Staged::Dense(m) => self.copy_from(&m),
            Staged::Sparse(m) => {
                scatter(&m, self);
                Ok(())
            }
        }
    }
}

impl<T: Scalar> AssignTarget<T> for CsrMatrix<T> {
    fn form(&self) -> TargetForm {
        TargetForm::Sparse
    }

    fn as_sparse(&self) -> Option<&CsrMatrix<T>> {
        Some(self)
    }

    fn commit(&mut self, staged: Staged<T>) -> StrataResult<()> {
        *self = staged.into_sparse();
        Ok(())
    }
}

impl<T, S, M> AssignTarget<T> for StructuredMatrix<T, S, M>
where
    T: Scalar,
    S: Structure,
    M: MatrixStorageMut<T>,
{
    fn form(&self) -> TargetForm {
        TargetForm::Structured(S::KIND)
    }

    fn commit(&mut self, staged: Staged<T>) -> StrataResult<()> {
        match staged {
            Staged::Dense(m) => self.commit_from(&m),
            Staged::Sparse(m) => self.commit_from(&m),
        }
    }
}

/// Assignment methods on every target, using a default [`Evaluator`]
pub trait Assign<T: Scalar>: AssignTarget<T> + Sized {
    /// `self = expr`
    fn assign<'e, E>(&mut self, expr: E) -> StrataResult<()>
    where
        E: Operand<'e>,
        Expr<'e, E::Elem>: Lift<'e, T>,
    {
        Evaluator::<T>::default().assign(self, expr)
    }

    /// `self = build(self)`, reading the current contents safely
    fn update<'e, F>(&mut self, build: F) -> StrataResult<()>
    where
        F: FnOnce(Expr<'e, T>) -> Expr<'e, T>,
    {
        Evaluator::<T>::default().update(self, build)
    }
}

impl<T: Scalar, M: AssignTarget<T>> Assign<T> for M {}
