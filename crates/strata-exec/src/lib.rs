//! # strata-exec
//!
//! Lazy matrix expressions and the engine that assigns them.
//!
//! ## Overview
//!
//! Arithmetic on matrices builds an [`Expr`] tree instead of computing
//! anything. Evaluation happens once, when the expression is assigned to a
//! target:
//!
//! - **Expressions** ([`expr`], [`ops`]): sums, differences, Hadamard and
//!   matrix products, scaling, negation, transposition and conjugation.
//!   Shape errors are recorded when a node is built and reported on
//!   assignment.
//! - **Operands** ([`operand`]): named matrices are captured by reference,
//!   transient values by value. Mixed element types are promoted through
//!   [`Lift`].
//! - **Planning** ([`plan`]): kernel selection, alias analysis and the
//!   decision to stage the result in a temporary.
//! - **Targets** ([`target`]): dense and CSR matrices and structural
//!   adaptors all accept assignments through [`Assign`].
//!
//! ## Entry points
//!
//! Operators cannot be implemented between two matrices of another crate,
//! so an expression starts from [`Lazy::lazy`], [`lazy`] or another
//! expression. Once started, any operand may follow.
//!
//! ```rust
//! use strata_core::DenseMatrix;
//! use strata_exec::{Assign, Lazy};
//!
//! let a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = DenseMatrix::<f64>::identity(2);
//! let mut c = DenseMatrix::<f64>::zeros(2, 2);
//!
//! c.assign(a.lazy() * &b + &a).unwrap();
//! assert_eq!(c.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
//!
//! // reads the old contents of `c` before writing
//! c.update(|c| c.t() * 0.5f64).unwrap();
//! assert_eq!(c.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
//! ```

pub mod alias;
pub mod engine;
pub mod expr;
pub mod node;
pub mod operand;
pub mod ops;
pub mod plan;
mod prepared;
pub mod target;

pub use engine::{assign, evaluate, Evaluator};
pub use expr::Expr;
pub use node::{BinaryOp, Capture, Leaf, Node, NodeKind, UnaryOp};
pub use operand::{capture_of, lazy, Lazy, Lift, Operand};
pub use plan::{ElementwiseKernel, EvalPlan, ProductKernel, ProductPlan, Strategy, TemporaryReason};
pub use target::{Assign, AssignTarget, Staged, TargetForm};
