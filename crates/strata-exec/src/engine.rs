//! Expression evaluator
//!
//! [`Evaluator`] turns an expression tree into values in a target. Every
//! evaluation follows the same steps:
//!
//! 1. lift the expression to the target's element type
//! 2. check the result shape against the target
//! 3. build an [`EvalPlan`] (kernels, temporaries, alias analysis)
//! 4. either write straight into a dense target, or stage the full result
//!    and hand it to [`AssignTarget::commit`]
//!
//! Every error is raised before the target is touched, so a failed
//! assignment leaves the target exactly as it was.

use crate::expr::Expr;
use crate::node::{Leaf, Node};
use crate::operand::{Lift, Operand};
use crate::plan::{ElementwiseKernel, EvalPlan, LeafClass, Planner, ProductKernel, ProductPlan, Strategy};
use crate::prepared::{copy_storage, gemm_operand, unbound_target, Prepared, ProductSide, TargetView};
use crate::target::{scatter, AssignTarget, Staged, TargetForm};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use strata_core::{
    DenseMatrix, EvalConfig, MatrixStorage, Scalar, StorageOrder, StrataError, StrataResult,
};
use strata_kernels::{
    dense_spmm, gemm_blocked, gemm_naive, spgemm_sorted_merge, spmm, ExternalGemm, GemmCall,
    GemmOperand, GemmOutput,
};
use strata_sparse::CsrMatrix;

/// Evaluation context: configuration plus an optional external kernel
///
/// # Examples
///
/// ```
/// use strata_core::{DenseMatrix, EvalConfig};
/// use strata_exec::{Evaluator, Lazy};
///
/// let a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let mut c = DenseMatrix::<f64>::zeros(2, 2);
///
/// let eval = Evaluator::new(EvalConfig::default()).unwrap();
/// eval.assign(&mut c, a.lazy() * &a).unwrap();
/// assert_eq!(c.as_slice(), &[7.0, 10.0, 15.0, 22.0]);
/// ```
#[derive(Clone)]
pub struct Evaluator<T: Scalar> {
    config: EvalConfig,
    external: Option<Arc<dyn ExternalGemm<T>>>,
}

impl<T: Scalar> Default for Evaluator<T> {
    fn default() -> Self {
        Self {
            config: EvalConfig::default(),
            external: None,
        }
    }
}

impl<T: Scalar> fmt::Debug for Evaluator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("external", &self.external_kernel())
            .finish()
    }
}

/// Read context for one evaluation
struct Pass<'n, T: Scalar> {
    view: TargetView<'n, T>,
    placeholder: LeafClass,
}

impl<'n, T: Scalar> Pass<'n, T> {
    fn detached() -> Self {
        Self {
            view: TargetView::Detached,
            placeholder: LeafClass::Generic,
        }
    }

    fn over<M: AssignTarget<T>>(target: &'n M) -> Self {
        let view = if let Some(m) = target.as_dense() {
            TargetView::Dense(m)
        } else if let Some(m) = target.as_sparse() {
            TargetView::Sparse(m)
        } else {
            TargetView::Storage(target)
        };
        Self {
            view,
            placeholder: LeafClass::of_form(target.form()),
        }
    }
}

impl<T: Scalar> Evaluator<T> {
    /// Evaluator with a validated configuration
    ///
    /// # Errors
    ///
    /// [`StrataError::InvalidConfig`] when `config` fails validation.
    pub fn new(config: EvalConfig) -> StrataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            external: None,
        })
    }

    /// Evaluator configured from `STRATA_*` environment variables
    pub fn from_env() -> StrataResult<Self> {
        Self::new(EvalConfig::from_env()?)
    }

    /// Register an external product kernel
    ///
    /// Dense products whose `m * n * k` reaches
    /// [`EvalConfig::external_threshold`] are routed to it.
    pub fn with_external(mut self, kernel: Arc<dyn ExternalGemm<T>>) -> Self {
        self.external = Some(kernel);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Name of the registered external kernel
    pub fn external_kernel(&self) -> Option<&str> {
        self.external.as_deref().map(|k| k.name())
    }

    fn planner(&self, placeholder: LeafClass) -> Planner<'_> {
        Planner {
            config: &self.config,
            external: self.external.is_some(),
            placeholder,
        }
    }

    /// Plan an assignment of `expr` to `target` without running it
    ///
    /// # Errors
    ///
    /// The expression's deferred construction error, or
    /// [`StrataError::DimensionMismatch`] when its shape differs from the
    /// target's.
    pub fn plan<M: AssignTarget<T>>(&self, target: &M, expr: &Expr<'_, T>) -> StrataResult<EvalPlan> {
        let node = expr.node()?;
        check_shape(target.shape(), node.shape())?;
        let form = target.form();
        Ok(self
            .planner(LeafClass::of_form(form))
            .plan(node, Some(target.storage_id()), form))
    }

    /// `target = expr`
    ///
    /// The expression is lifted to the target's element type first.
    ///
    /// # Errors
    ///
    /// Construction errors carried by the expression, a shape mismatch with
    /// the target, allocation failures, kernel failures and structural
    /// violations. The target is unchanged whenever an error is returned.
    pub fn assign<'e, M, E>(&self, target: &mut M, expr: E) -> StrataResult<()>
    where
        M: AssignTarget<T>,
        E: Operand<'e>,
        Expr<'e, E::Elem>: Lift<'e, T>,
    {
        self.assign_expr(target, expr.into_expr().lift())
    }

    /// `target = build(target)`
    ///
    /// `build` receives a placeholder for the target's current contents.
    /// The placeholder always counts as aliasing the target, so the result
    /// is staged before anything is written.
    ///
    /// ```
    /// use strata_core::DenseMatrix;
    /// use strata_exec::{Evaluator, Lazy};
    ///
    /// let mut a = DenseMatrix::from_vec(2, 2, vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
    /// let b = DenseMatrix::from_vec(2, 2, vec![0.0f64, 1.0, 1.0, 0.0]).unwrap();
    /// Evaluator::<f64>::default().update(&mut a, |a| a * &b).unwrap();
    /// assert_eq!(a.as_slice(), &[2.0, 1.0, 4.0, 3.0]);
    /// ```
    pub fn update<'e, M, F>(&self, target: &mut M, build: F) -> StrataResult<()>
    where
        M: AssignTarget<T>,
        F: FnOnce(Expr<'e, T>) -> Expr<'e, T>,
    {
        let (nrows, ncols) = target.shape();
        self.assign_expr(target, build(Expr::target(nrows, ncols)))
    }

    /// Evaluate into a new row-major dense matrix
    pub fn evaluate<'e, E>(&self, expr: E) -> StrataResult<DenseMatrix<T>>
    where
        E: Operand<'e>,
        Expr<'e, E::Elem>: Lift<'e, T>,
    {
        let node = expr.into_expr().lift().into_node()?;
        let plan = self.planner(LeafClass::Generic).plan(
            &node,
            None,
            TargetForm::Dense(StorageOrder::RowMajor),
        );
        tracing::debug!(%plan, "evaluating detached expression");
        Ok(self.stage(&node, &plan, &Pass::detached())?.into_dense())
    }

    /// Evaluate into a new CSR matrix
    pub fn evaluate_sparse<'e, E>(&self, expr: E) -> StrataResult<CsrMatrix<T>>
    where
        E: Operand<'e>,
        Expr<'e, E::Elem>: Lift<'e, T>,
    {
        let node = expr.into_expr().lift().into_node()?;
        let plan = self
            .planner(LeafClass::Generic)
            .plan(&node, None, TargetForm::Sparse);
        tracing::debug!(%plan, "evaluating detached sparse expression");
        Ok(self.stage(&node, &plan, &Pass::detached())?.into_sparse())
    }

    fn assign_expr<M: AssignTarget<T>>(&self, target: &mut M, expr: Expr<'_, T>) -> StrataResult<()> {
        let node = expr.into_node()?;
        check_shape(target.shape(), node.shape())?;
        let form = target.form();
        let plan = self
            .planner(LeafClass::of_form(form))
            .plan(&node, Some(target.storage_id()), form);
        tracing::debug!(
            rows = plan.shape.0,
            cols = plan.shape.1,
            kernel = plan.kernel_name(),
            temporary = ?plan.temporary,
            materialized = plan.materialized,
            "evaluating assignment"
        );
        self.execute(target, &node, &plan)
    }

    fn execute<M: AssignTarget<T>>(&self, target: &mut M, node: &Node<'_, T>, plan: &EvalPlan) -> StrataResult<()> {
        if plan.temporary.is_none() {
            if let Some(out) = target.dense_mut() {
                return self.write_dense(node, plan, out, &Pass::detached());
            }
        }
        let staged = self.stage(node, plan, &Pass::over(&*target))?;
        tracing::trace!(reason = ?plan.temporary, "committing staged result");
        target.commit(staged)
    }

    /// Evaluate `node` into a fresh buffer
    fn stage<'n>(&self, node: &'n Node<'_, T>, plan: &EvalPlan, pass: &Pass<'n, T>) -> StrataResult<Staged<T>> {
        match plan.strategy {
            Strategy::Elementwise(ElementwiseKernel::SparseMerge) => {
                let prepared = self.prepare(node, pass, plan.order)?;
                let merged = prepared.to_sparse()?.into_owned();
                Ok(Staged::Sparse(merged))
            }
            Strategy::Product(ProductPlan {
                kernel: ProductKernel::SparseSparse,
                ..
            }) => {
                let (lhs, rhs) = product_operands(node)?;
                let a = self.prepare_side(lhs, pass, plan.order)?;
                let b = self.prepare_side(rhs, pass, plan.order)?;
                if let (ProductSide::Sparse(a), ProductSide::Sparse(b)) = (&a, &b) {
                    return Ok(Staged::Sparse(spgemm_sorted_merge(&**a, &**b)?));
                }
                let (m, n) = plan.shape;
                let mut out = DenseMatrix::try_zeros(m, n, plan.order)?;
                self.run_product(ProductKernel::SparseSparse, &a, &b, &mut out)?;
                Ok(Staged::Dense(out))
            }
            _ => {
                let (m, n) = plan.shape;
                let mut out = DenseMatrix::try_zeros(m, n, plan.order)?;
                self.write_dense(node, plan, &mut out, pass)?;
                Ok(Staged::Dense(out))
            }
        }
    }

    /// Evaluate a nested subexpression on its own
    fn materialize<'n>(&self, node: &'n Node<'_, T>, pass: &Pass<'n, T>, order: StorageOrder) -> StrataResult<Staged<T>> {
        let plan = self
            .planner(pass.placeholder)
            .plan(node, None, TargetForm::Dense(order));
        tracing::trace!(%plan, "materializing subexpression");
        self.stage(node, &plan, pass)
    }

    fn write_dense<'n>(
        &self,
        node: &'n Node<'_, T>,
        plan: &EvalPlan,
        out: &mut DenseMatrix<T>,
        pass: &Pass<'n, T>,
    ) -> StrataResult<()> {
        match plan.strategy {
            Strategy::Product(product) => {
                let (lhs, rhs) = product_operands(node)?;
                let a = self.prepare_side(lhs, pass, out.order())?;
                let b = self.prepare_side(rhs, pass, out.order())?;
                self.run_product(product.kernel, &a, &b, out)
            }
            Strategy::Elementwise(kernel) => {
                let prepared = self.prepare(node, pass, out.order())?;
                match kernel {
                    ElementwiseKernel::ContiguousRuns => prepared.write_runs(out),
                    ElementwiseKernel::PerElement => prepared.write_elements(out),
                    ElementwiseKernel::SparseMerge => prepared.write_sparse(out)?,
                }
                Ok(())
            }
        }
    }

    fn prepare<'n>(&self, node: &'n Node<'_, T>, pass: &Pass<'n, T>, order: StorageOrder) -> StrataResult<Prepared<'n, T>> {
        Ok(match node {
            Node::Leaf(leaf) => match leaf {
                Leaf::Dense(m) => Prepared::Dense(*m),
                Leaf::Sparse(m) => Prepared::Sparse(*m),
                Leaf::Storage(s) => Prepared::Storage(*s),
                Leaf::OwnedDense(m) => Prepared::Dense(m),
                Leaf::OwnedSparse(m) => Prepared::Sparse(m),
                Leaf::Target { .. } => Prepared::from_view(pass.view)?,
            },
            Node::Product { .. } => match self.materialize(node, pass, order)? {
                Staged::Dense(m) => Prepared::OwnedDense(m),
                Staged::Sparse(m) => Prepared::OwnedSparse(m),
            },
            Node::Binary { op, lhs, rhs } => Prepared::Binary(
                *op,
                Box::new(self.prepare(lhs, pass, order)?),
                Box::new(self.prepare(rhs, pass, order)?),
            ),
            Node::Scale { factor, operand } => {
                Prepared::Scale(*factor, Box::new(self.prepare(operand, pass, order)?))
            }
            Node::Unary { op, operand } => {
                Prepared::Unary(*op, Box::new(self.prepare(operand, pass, order)?))
            }
            Node::Transpose(inner) => Prepared::Transpose(Box::new(self.prepare(inner, pass, order)?)),
        })
    }

    /// Bring one product operand into a form a kernel accepts
    fn prepare_side<'n>(&self, node: &'n Node<'_, T>, pass: &Pass<'n, T>, order: StorageOrder) -> StrataResult<ProductSide<'n, T>> {
        match node {
            Node::Leaf(leaf) => Ok(match leaf {
                Leaf::Dense(m) => ProductSide::Dense(Cow::Borrowed(*m), false),
                Leaf::OwnedDense(m) => ProductSide::Dense(Cow::Borrowed(m), false),
                Leaf::Sparse(m) => ProductSide::Sparse(Cow::Borrowed(*m)),
                Leaf::OwnedSparse(m) => ProductSide::Sparse(Cow::Borrowed(m)),
                Leaf::Storage(s) => ProductSide::Dense(Cow::Owned(copy_storage(*s, order)?), false),
                Leaf::Target { .. } => match pass.view {
                    TargetView::Dense(m) => ProductSide::Dense(Cow::Borrowed(m), false),
                    TargetView::Sparse(m) => ProductSide::Sparse(Cow::Borrowed(m)),
                    TargetView::Storage(s) => ProductSide::Dense(Cow::Owned(copy_storage(s, order)?), false),
                    TargetView::Detached => return Err(unbound_target()),
                },
            }),
            Node::Transpose(inner) if matches!(**inner, Node::Leaf(_)) => {
                Ok(match self.prepare_side(inner, pass, order)? {
                    ProductSide::Dense(m, trans) => ProductSide::Dense(m, !trans),
                    ProductSide::Sparse(m) => ProductSide::Sparse(Cow::Owned(m.transpose())),
                })
            }
            other => Ok(match self.materialize(other, pass, order)? {
                Staged::Dense(m) => ProductSide::Dense(Cow::Owned(m), false),
                Staged::Sparse(m) => ProductSide::Sparse(Cow::Owned(m)),
            }),
        }
    }

    fn run_product(
        &self,
        kernel: ProductKernel,
        a: &ProductSide<'_, T>,
        b: &ProductSide<'_, T>,
        out: &mut DenseMatrix<T>,
    ) -> StrataResult<()> {
        match (a, b) {
            (ProductSide::Sparse(a), ProductSide::Sparse(b)) => {
                let product = spgemm_sorted_merge(&**a, &**b)?;
                scatter(&product, out);
            }
            (ProductSide::Sparse(a), ProductSide::Dense(b, trans)) => {
                spmm(&**a, &gemm_operand(b, *trans), &mut GemmOutput::from_dense(out))?;
            }
            (ProductSide::Dense(a, trans), ProductSide::Sparse(b)) => {
                dense_spmm(&gemm_operand(a, *trans), &**b, &mut GemmOutput::from_dense(out))?;
            }
            (ProductSide::Dense(a, ta), ProductSide::Dense(b, tb)) => {
                self.run_dense(kernel, gemm_operand(a, *ta), gemm_operand(b, *tb), GemmOutput::from_dense(out))?;
            }
        }
        Ok(())
    }

    fn run_dense(
        &self,
        kernel: ProductKernel,
        a: GemmOperand<'_, T>,
        b: GemmOperand<'_, T>,
        mut out: GemmOutput<'_, T>,
    ) -> StrataResult<()> {
        match kernel {
            ProductKernel::Naive => gemm_naive(&a, &b, &mut out)?,
            ProductKernel::Parallel => self.run_parallel(&a, &b, &mut out)?,
            ProductKernel::External => {
                let Some(external) = self.external.as_deref() else {
                    return Err(StrataError::Kernel {
                        kernel: "external".to_string(),
                        message: "no external kernel registered".to_string(),
                    });
                };
                let call = GemmCall::new(a, b, out)?;
                tracing::debug!(kernel = external.name(), work = call.work(), "dispatching to external kernel");
                external.gemm(call)?;
            }
            ProductKernel::Blocked { block_size } => gemm_blocked(&a, &b, &mut out, block_size)?,
            // sparse kernels never see two dense sides
            _ => gemm_blocked(&a, &b, &mut out, self.config.block_size)?,
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn run_parallel(
        &self,
        a: &GemmOperand<'_, T>,
        b: &GemmOperand<'_, T>,
        out: &mut GemmOutput<'_, T>,
    ) -> StrataResult<()> {
        strata_kernels::gemm_parallel(a, b, out)?;
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn run_parallel(
        &self,
        a: &GemmOperand<'_, T>,
        b: &GemmOperand<'_, T>,
        out: &mut GemmOutput<'_, T>,
    ) -> StrataResult<()> {
        gemm_blocked(a, b, out, self.config.block_size)?;
        Ok(())
    }
}

fn check_shape(target: (usize, usize), result: (usize, usize)) -> StrataResult<()> {
    if target != result {
        return Err(StrataError::dimension_mismatch("assign", target, result));
    }
    Ok(())
}

fn product_operands<'n, 'a, T: Scalar>(node: &'n Node<'a, T>) -> StrataResult<(&'n Node<'a, T>, &'n Node<'a, T>)> {
    match node {
        Node::Product { lhs, rhs } => Ok((lhs, rhs)),
        _ => Err(StrataError::invalid_expression("product plan for a non-product node")),
    }
}

/// `target = expr` with a default [`Evaluator`]
pub fn assign<'e, T, M, E>(target: &mut M, expr: E) -> StrataResult<()>
where
    T: Scalar,
    M: AssignTarget<T>,
    E: Operand<'e>,
    Expr<'e, E::Elem>: Lift<'e, T>,
{
    Evaluator::<T>::default().assign(target, expr)
}

/// Evaluate into a new dense matrix with a default [`Evaluator`]
pub fn evaluate<'e, E>(expr: E) -> StrataResult<DenseMatrix<E::Elem>>
where
    E: Operand<'e>,
    Expr<'e, E::Elem>: Lift<'e, E::Elem>,
{
    Evaluator::<E::Elem>::default().evaluate(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::TemporaryReason;
    use crate::Lazy;
    use strata_core::KernelPreference;

    fn sample() -> DenseMatrix<f64> {
        DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn test_assign_sum() {
        let a = sample();
        let b = sample();
        let mut c = DenseMatrix::<f64>::zeros(2, 2);
        Evaluator::<f64>::default().assign(&mut c, a.lazy() + &b).unwrap();
        assert_eq!(c.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_shape_mismatch_leaves_target() {
        let a = DenseMatrix::<f64>::zeros(2, 3);
        let mut c = DenseMatrix::from_elem(2, 2, StorageOrder::RowMajor, 5.0);
        let err = Evaluator::<f64>::default().assign(&mut c, a.lazy()).unwrap_err();
        assert!(matches!(err, StrataError::DimensionMismatch { operation: "assign", .. }));
        assert!(c.as_slice().iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_update_reads_old_value() {
        let mut a = sample();
        Evaluator::<f64>::default().update(&mut a, |a| a.clone() * a).unwrap();
        assert_eq!(a.as_slice(), &[7.0, 10.0, 15.0, 22.0]);
    }

    #[test]
    fn test_update_plan_uses_temporary() {
        let a = sample();
        let eval = Evaluator::<f64>::default();
        let expr = Expr::<f64>::target(2, 2) * &a;
        let plan = eval.plan(&a, &expr).unwrap();
        assert_eq!(plan.temporary, Some(TemporaryReason::AliasedProduct));
    }

    #[test]
    fn test_kernel_preference() {
        let a = sample();
        let config = EvalConfig::default().with_kernel(KernelPreference::Blocked).with_block_size(1);
        let eval = Evaluator::<f64>::new(config).unwrap();
        let c = eval.evaluate(a.lazy() * &a).unwrap();
        assert_eq!(c.as_slice(), &[7.0, 10.0, 15.0, 22.0]);
    }

    #[test]
    fn test_invalid_config() {
        let config = EvalConfig::default().with_block_size(0);
        assert!(matches!(
            Evaluator::<f64>::new(config),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_detached_placeholder_is_rejected() {
        let eval = Evaluator::<f64>::default();
        let err = eval.evaluate(Expr::<f64>::target(2, 2)).unwrap_err();
        assert!(matches!(err, StrataError::InvalidExpression { .. }));
    }

    #[test]
    fn test_evaluate_sparse() {
        let a = CsrMatrix::from_triplets((2, 2), &[(0, 1, 2.0), (1, 0, 3.0)]).unwrap();
        let eval = Evaluator::<f64>::default();
        let c = eval.evaluate_sparse(a.lazy() * &a).unwrap();
        assert_eq!(c.iter_nonzeros().collect::<Vec<_>>(), vec![(0, 0, 6.0), (1, 1, 6.0)]);
    }
}
