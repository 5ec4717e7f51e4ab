//! Alias analysis
//!
//! Before evaluation the evaluator compares the storage identity of every
//! borrowed operand with the target's. Owned operands cannot overlap
//! anything. The target placeholder used by
//! [`Evaluator::update`](crate::Evaluator::update) always overlaps.
//!
//! Rust's borrow rules already forbid `&mut target` next to `&target`, so a
//! plain assignment can only alias through storage shared behind two
//! different handles; the check is kept explicit either way.

use crate::node::{Leaf, Node};
use smallvec::SmallVec;
use strata_core::{Scalar, StorageId};

/// Storage identities of the borrowed operands of `node`
pub fn borrowed_ids<T: Scalar>(node: &Node<'_, T>) -> SmallVec<[StorageId; 8]> {
    let mut ids = SmallVec::new();
    node.for_each_leaf(&mut |leaf| {
        if let Some(id) = leaf.storage_id() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    });
    ids
}

/// Whether `node` reads the target placeholder
pub fn reads_target<T: Scalar>(node: &Node<'_, T>) -> bool {
    let mut found = false;
    node.for_each_leaf(&mut |leaf| {
        if matches!(leaf, Leaf::Target { .. }) {
            found = true;
        }
    });
    found
}

/// Whether evaluating `node` reads storage that `target` writes
pub fn overlaps_target<T: Scalar>(node: &Node<'_, T>, target: Option<StorageId>) -> bool {
    if reads_target(node) {
        return true;
    }
    match target {
        Some(id) => borrowed_ids(node).iter().any(|leaf| leaf.overlaps(id)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lazy;
    use strata_core::{DenseMatrix, MatrixStorage};

    #[test]
    fn test_ids_are_deduplicated() {
        let a = DenseMatrix::<f64>::zeros(2, 2);
        let b = DenseMatrix::<f64>::zeros(2, 2);
        let e = (a.lazy() + &b) * &a;
        let ids = borrowed_ids(e.node().unwrap());
        assert_eq!(ids.len(), 2);
        assert!(overlaps_target(e.node().unwrap(), Some(a.storage_id())));

        let c = DenseMatrix::<f64>::zeros(2, 2);
        assert!(!overlaps_target(e.node().unwrap(), Some(c.storage_id())));
        assert!(!overlaps_target(e.node().unwrap(), None));
    }

    #[test]
    fn test_owned_operands_never_alias() {
        let a = DenseMatrix::<f64>::zeros(2, 2);
        let e = crate::lazy(a.clone()) + a.clone();
        assert!(borrowed_ids(e.node().unwrap()).is_empty());
    }
}
