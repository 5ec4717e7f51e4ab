//! Evaluation plans
//!
//! A plan records every decision the evaluator takes before touching data:
//! the kernel, whether the result goes through a temporary and why, the
//! order of the buffer the result is computed in, and how many intermediate
//! results are materialized on the way. Plans are pure values; building one
//! reads shapes, orders and storage identities only.
//!
//! Product kernel selection with [`KernelPreference::Auto`]:
//!
//! 1. both operands sparse: sorted-merge sparse product; one sparse operand:
//!    dense-accumulator product
//! 2. an external kernel is registered and `m * n * k >= external_threshold`
//! 3. the parallel kernel is enabled, the target is a plain dense buffer and
//!    `m * n * k >= parallel_threshold`
//! 4. `max(m, n, k) > block_size`: blocked kernel
//! 5. otherwise the naive triple loop

use crate::alias;
use crate::node::{Leaf, Node, NodeKind};
use crate::target::TargetForm;
use std::fmt;
use strata_core::{EvalConfig, KernelPreference, Scalar, StorageId, StorageOrder};

/// Kernel for element-wise roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementwiseKernel {
    /// Slice kernels over contiguous rows or columns
    ContiguousRuns,
    /// One logical index at a time
    PerElement,
    /// Merge of sorted sparse rows
    SparseMerge,
}

/// Kernel for product roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductKernel {
    Naive,
    Blocked { block_size: usize },
    Parallel,
    External,
    /// Sparse × dense with a dense accumulator row
    SparseDense,
    /// Dense × sparse scattering sparse rows
    DenseSparse,
    /// Sparse × sparse by sorted row merges
    SparseSparse,
}

impl ProductKernel {
    /// Short kernel name
    pub fn name(self) -> &'static str {
        match self {
            ProductKernel::Naive => "naive",
            ProductKernel::Blocked { .. } => "blocked",
            ProductKernel::Parallel => "parallel",
            ProductKernel::External => "external",
            ProductKernel::SparseDense => "sparse-dense",
            ProductKernel::DenseSparse => "dense-sparse",
            ProductKernel::SparseSparse => "sparse-sparse",
        }
    }
}

/// Product of `op(lhs) · op(rhs)` with `op(lhs)` of `m x k`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductPlan {
    pub kernel: ProductKernel,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    /// Left operand read through a transposition flag
    pub trans_lhs: bool,
    /// Right operand read through a transposition flag
    pub trans_rhs: bool,
}

impl ProductPlan {
    /// Multiply-add count
    pub fn work(&self) -> usize {
        self.m.saturating_mul(self.n).saturating_mul(self.k)
    }
}

/// How the root of the expression is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Elementwise(ElementwiseKernel),
    Product(ProductPlan),
}

/// Why a result is computed into a temporary before reaching the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporaryReason {
    /// A product reads the storage it would write
    AliasedProduct,
    /// A transposed read of the target would see partially written data
    AliasedTransposedRead,
    /// An operand shares the target's storage
    AliasedOperand,
    /// Structured targets are validated before anything is committed
    StructuredTarget,
    /// CSR storage is rebuilt and swapped in
    SparseRebuild,
    /// An external kernel may fail after writing part of its output
    ExternalKernel,
}

impl fmt::Display for TemporaryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TemporaryReason::AliasedProduct => "aliased product",
            TemporaryReason::AliasedTransposedRead => "aliased transposed read",
            TemporaryReason::AliasedOperand => "aliased operand",
            TemporaryReason::StructuredTarget => "structured target",
            TemporaryReason::SparseRebuild => "sparse rebuild",
            TemporaryReason::ExternalKernel => "external kernel",
        };
        f.write_str(text)
    }
}

/// Every decision taken before evaluation starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvalPlan {
    /// Shape of the result
    pub shape: (usize, usize),
    /// Root kernel
    pub strategy: Strategy,
    /// Why the result is staged, if it is
    pub temporary: Option<TemporaryReason>,
    /// Order of the dense buffer the result is computed in
    pub order: StorageOrder,
    /// Intermediate results materialized before the root kernel runs
    pub materialized: usize,
}

impl EvalPlan {
    /// Whether the result is computed into a temporary
    pub fn uses_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    /// Product details, when the root is a product
    pub fn product(&self) -> Option<&ProductPlan> {
        match &self.strategy {
            Strategy::Product(p) => Some(p),
            Strategy::Elementwise(_) => None,
        }
    }

    /// Short name of the root kernel
    pub fn kernel_name(&self) -> &'static str {
        match self.strategy {
            Strategy::Elementwise(ElementwiseKernel::ContiguousRuns) => "contiguous-runs",
            Strategy::Elementwise(ElementwiseKernel::PerElement) => "per-element",
            Strategy::Elementwise(ElementwiseKernel::SparseMerge) => "sparse-merge",
            Strategy::Product(p) => p.kernel.name(),
        }
    }
}

impl fmt::Display for EvalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.kernel_name(), self.shape.0, self.shape.1)?;
        if let Some(p) = self.product() {
            if p.trans_lhs || p.trans_rhs {
                write!(f, " trans=({}, {})", p.trans_lhs, p.trans_rhs)?;
            }
        }
        if let Some(reason) = self.temporary {
            write!(f, " via temporary ({reason})")?;
        }
        if self.materialized > 0 {
            write!(f, " materialized={}", self.materialized)?;
        }
        Ok(())
    }
}

/// What a leaf looks like to the kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeafClass {
    Dense(StorageOrder),
    Sparse,
    Generic,
}

impl LeafClass {
    /// Class of the target placeholder for a target of `form`
    pub(crate) fn of_form(form: TargetForm) -> Self {
        match form {
            TargetForm::Dense(order) => LeafClass::Dense(order),
            TargetForm::Sparse => LeafClass::Sparse,
            TargetForm::Structured(_) => LeafClass::Generic,
        }
    }
}

/// How one side of a product reaches the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SideInfo {
    pub sparse: bool,
    pub trans: bool,
    pub staged: bool,
}

/// Plan builder for one evaluation
pub(crate) struct Planner<'c> {
    pub config: &'c EvalConfig,
    pub external: bool,
    pub placeholder: LeafClass,
}

impl<'c> Planner<'c> {
    pub(crate) fn leaf_class<T: Scalar>(&self, leaf: &Leaf<'_, T>) -> LeafClass {
        match leaf {
            Leaf::Dense(m) => LeafClass::Dense(m.order()),
            Leaf::OwnedDense(m) => LeafClass::Dense(m.order()),
            Leaf::Sparse(_) | Leaf::OwnedSparse(_) => LeafClass::Sparse,
            Leaf::Storage(_) => LeafClass::Generic,
            Leaf::Target { .. } => self.placeholder,
        }
    }

    pub(crate) fn side_info<T: Scalar>(&self, node: &Node<'_, T>) -> SideInfo {
        match node {
            Node::Leaf(leaf) => match self.leaf_class(leaf) {
                LeafClass::Dense(_) => SideInfo { sparse: false, trans: false, staged: false },
                LeafClass::Sparse => SideInfo { sparse: true, trans: false, staged: false },
                LeafClass::Generic => SideInfo { sparse: false, trans: false, staged: true },
            },
            Node::Transpose(inner) if matches!(**inner, Node::Leaf(_)) => {
                let side = self.side_info(inner);
                if side.sparse {
                    // transposed CSR copy
                    SideInfo { sparse: true, trans: false, staged: true }
                } else {
                    SideInfo { trans: !side.trans, ..side }
                }
            }
            other => SideInfo {
                sparse: self.all_sparse(other),
                trans: false,
                staged: true,
            },
        }
    }

    /// Whether evaluating `node` on its own naturally yields CSR storage
    pub(crate) fn all_sparse<T: Scalar>(&self, node: &Node<'_, T>) -> bool {
        match node {
            Node::Leaf(leaf) => self.leaf_class(leaf) == LeafClass::Sparse,
            Node::Product { lhs, rhs } => self.side_info(lhs).sparse && self.side_info(rhs).sparse,
            Node::Binary { lhs, rhs, .. } => self.all_sparse(lhs) && self.all_sparse(rhs),
            Node::Scale { operand, .. } | Node::Unary { operand, .. } | Node::Transpose(operand) => {
                self.all_sparse(operand)
            }
        }
    }

    /// Whether an element-wise tree can run over contiguous runs in `order`
    fn runs_ok<T: Scalar>(&self, node: &Node<'_, T>, order: StorageOrder) -> bool {
        match node {
            Node::Leaf(leaf) => self.leaf_class(leaf) == LeafClass::Dense(order),
            // materialized in `order`
            Node::Product { .. } => !self.all_sparse(node),
            Node::Binary { lhs, rhs, .. } => self.runs_ok(lhs, order) && self.runs_ok(rhs, order),
            Node::Scale { operand, .. } | Node::Unary { operand, .. } => self.runs_ok(operand, order),
            Node::Transpose(_) => false,
        }
    }

    /// Intermediate buffers created when `node` is evaluated as a root
    fn staging_count<T: Scalar>(&self, node: &Node<'_, T>) -> usize {
        match node {
            Node::Leaf(_) => 0,
            Node::Product { lhs, rhs } => self.side_staging(lhs) + self.side_staging(rhs),
            Node::Binary { lhs, rhs, .. } => self.nested_staging(lhs) + self.nested_staging(rhs),
            Node::Scale { operand, .. } | Node::Unary { operand, .. } | Node::Transpose(operand) => {
                self.nested_staging(operand)
            }
        }
    }

    fn nested_staging<T: Scalar>(&self, node: &Node<'_, T>) -> usize {
        match node {
            Node::Product { .. } => 1 + self.staging_count(node),
            _ => self.staging_count(node),
        }
    }

    fn side_staging<T: Scalar>(&self, node: &Node<'_, T>) -> usize {
        if !self.side_info(node).staged {
            return 0;
        }
        match node {
            Node::Leaf(_) => 1,
            Node::Transpose(inner) if matches!(**inner, Node::Leaf(_)) => 1,
            other => 1 + self.staging_count(other),
        }
    }

    fn parallel_available(&self) -> bool {
        cfg!(feature = "parallel") && self.config.parallel
    }

    fn auto_kernel(&self, work: usize, largest: usize, parallel: bool) -> ProductKernel {
        if self.external && work >= self.config.external_threshold {
            ProductKernel::External
        } else if parallel && work >= self.config.parallel_threshold {
            ProductKernel::Parallel
        } else if largest > self.config.block_size {
            ProductKernel::Blocked {
                block_size: self.config.block_size,
            }
        } else {
            ProductKernel::Naive
        }
    }

    /// Kernel for a dense × dense product of `m x k` by `k x n` written into
    /// a target of `form`
    ///
    /// The parallel kernel is only chosen for plain dense targets.
    pub(crate) fn dense_kernel(&self, m: usize, n: usize, k: usize, form: TargetForm) -> ProductKernel {
        let work = m.saturating_mul(n).saturating_mul(k);
        let largest = m.max(n).max(k);
        let parallel = self.parallel_available() && matches!(form, TargetForm::Dense(_));
        match self.config.kernel {
            KernelPreference::Auto => self.auto_kernel(work, largest, parallel),
            KernelPreference::Naive => ProductKernel::Naive,
            KernelPreference::Blocked => ProductKernel::Blocked {
                block_size: self.config.block_size,
            },
            KernelPreference::Parallel if parallel => ProductKernel::Parallel,
            KernelPreference::External if self.external => ProductKernel::External,
            preference => {
                tracing::debug!(?preference, "preferred kernel unavailable, selecting automatically");
                self.auto_kernel(work, largest, parallel)
            }
        }
    }

    /// Plan the evaluation of `node` into a target of `form`
    ///
    /// `target` is the storage identity of the destination; `None` for a
    /// freshly allocated result.
    pub(crate) fn plan<T: Scalar>(
        &self,
        node: &Node<'_, T>,
        target: Option<StorageId>,
        form: TargetForm,
    ) -> EvalPlan {
        let shape = node.shape();
        let order = match form {
            TargetForm::Dense(order) => order,
            _ => StorageOrder::RowMajor,
        };

        let strategy = match node {
            Node::Product { lhs, rhs } => {
                let a = self.side_info(lhs);
                let b = self.side_info(rhs);
                let (m, k) = lhs.shape();
                let n = rhs.shape().1;
                let kernel = match (a.sparse, b.sparse) {
                    (true, true) => ProductKernel::SparseSparse,
                    (true, false) => ProductKernel::SparseDense,
                    (false, true) => ProductKernel::DenseSparse,
                    (false, false) => self.dense_kernel(m, n, k, form),
                };
                Strategy::Product(ProductPlan {
                    kernel,
                    m,
                    n,
                    k,
                    trans_lhs: a.trans,
                    trans_rhs: b.trans,
                })
            }
            _ if self.all_sparse(node) => Strategy::Elementwise(ElementwiseKernel::SparseMerge),
            _ if self.runs_ok(node, order) => Strategy::Elementwise(ElementwiseKernel::ContiguousRuns),
            _ => Strategy::Elementwise(ElementwiseKernel::PerElement),
        };

        let temporary = if alias::overlaps_target(node, target) {
            Some(match strategy {
                Strategy::Product(_) => TemporaryReason::AliasedProduct,
                _ if node.contains(NodeKind::Transpose) => TemporaryReason::AliasedTransposedRead,
                _ => TemporaryReason::AliasedOperand,
            })
        } else {
            match form {
                TargetForm::Structured(_) => Some(TemporaryReason::StructuredTarget),
                TargetForm::Sparse if target.is_some() => Some(TemporaryReason::SparseRebuild),
                _ => match strategy {
                    Strategy::Product(ProductPlan {
                        kernel: ProductKernel::External,
                        ..
                    }) if target.is_some() => Some(TemporaryReason::ExternalKernel),
                    _ => None,
                },
            }
        };

        EvalPlan {
            shape,
            strategy,
            temporary,
            order,
            materialized: self.staging_count(node),
        }
    }
}
