//! Property-based tests for structural invariants
//!
//! Random write sequences are applied to adaptors; accepted or not, every
//! write must leave the structure intact, and rejected writes must leave the
//! matrix unchanged.

use proptest::prelude::*;
use strata_adapt::*;
use strata_core::{Complex, DenseMatrix, MatrixStorage, StrataError};
use strata_sparse::CsrMatrix;

const N: usize = 6;

fn write_strategy() -> impl Strategy<Value = Vec<(usize, usize, i32)>> {
    prop::collection::vec((0..N, 0..N, -9i32..10), 0..40)
}

fn assert_structure<S: Structure, M: strata_core::MatrixStorageMut<f64>>(
    m: &StructuredMatrix<f64, S, M>,
) -> Result<(), TestCaseError> {
    prop_assert!(check_structure(S::KIND, m.storage(), 0.0).is_ok());
    Ok(())
}

/// Apply writes, checking that a rejected write changes nothing
fn apply<S: Structure>(
    m: &mut StructuredMatrix<f64, S>,
    writes: &[(usize, usize, i32)],
) -> Result<(), TestCaseError> {
    for &(r, c, v) in writes {
        let before = m.to_dense();
        match m.write(r, c, v as f64) {
            Ok(()) => prop_assert_eq!(m.read(r, c), v as f64),
            Err(_) => prop_assert_eq!(&m.to_dense(), &before),
        }
    }
    Ok(())
}

proptest! {
    /// Property: symmetric adaptors stay symmetric under any write sequence
    #[test]
    fn prop_symmetric_stays_symmetric(writes in write_strategy()) {
        let mut s = StructuredMatrix::<f64, Symmetric>::zeros(N).unwrap();
        apply(&mut s, &writes)?;
        for r in 0..N {
            for c in 0..N {
                prop_assert_eq!(s.read(r, c), s.read(c, r));
            }
        }
        assert_structure(&s)?;
    }

    /// Property: upper adaptors keep zeros below the diagonal
    #[test]
    fn prop_upper_keeps_lower_zero(writes in write_strategy()) {
        let mut u = StructuredMatrix::<f64, Upper>::zeros(N).unwrap();
        apply(&mut u, &writes)?;
        for r in 0..N {
            for c in 0..r {
                prop_assert_eq!(u.read(r, c), 0.0);
                prop_assert_eq!(u.storage()[(r, c)], 0.0);
            }
        }
    }

    /// Property: every structure survives random writes
    #[test]
    fn prop_all_structures_hold(writes in write_strategy()) {
        let mut a = StructuredMatrix::<f64, Lower>::zeros(N).unwrap();
        apply(&mut a, &writes)?;
        assert_structure(&a)?;

        let mut b = StructuredMatrix::<f64, UniUpper>::zeros(N).unwrap();
        apply(&mut b, &writes)?;
        assert_structure(&b)?;

        let mut c = StructuredMatrix::<f64, StrictlyUpper>::zeros(N).unwrap();
        apply(&mut c, &writes)?;
        assert_structure(&c)?;

        let mut d = StructuredMatrix::<f64, Diagonal>::zeros(N).unwrap();
        apply(&mut d, &writes)?;
        assert_structure(&d)?;
    }

    /// Property: an adaptor over CSR storage behaves like one over dense storage
    #[test]
    fn prop_sparse_backed_matches_dense(writes in write_strategy()) {
        let mut dense = StructuredMatrix::<f64, Symmetric>::zeros(N).unwrap();
        let mut sparse = StructuredMatrix::<f64, Symmetric, CsrMatrix<f64>>::zeros(N).unwrap();
        for &(r, c, v) in &writes {
            let a = dense.write(r, c, v as f64).is_ok();
            let b = sparse.write(r, c, v as f64).is_ok();
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(dense.to_dense(), sparse.to_dense());
        prop_assert_eq!(dense.nonzeros(), sparse.nonzeros());
    }
}

#[test]
fn test_symmetric_write_mirrors() {
    let mut s = StructuredMatrix::<f64, Symmetric>::zeros(6).unwrap();
    s.write(2, 5, 7.0).unwrap();
    assert_eq!(s.read(2, 5), 7.0);
    assert_eq!(s.read(5, 2), 7.0);
}

#[test]
fn test_upper_rejects_lower_write_without_change() {
    let mut u = StructuredMatrix::<f64, Upper>::from_fn(4, |r, c| (r * 4 + c + 1) as f64).unwrap();
    let snapshot = u.to_dense();
    let err = u.write(3, 1, 9.0).unwrap_err();
    assert!(matches!(
        err,
        StrataError::StructuralViolation { structure: "upper", row: 3, col: 1 }
    ));
    assert_eq!(u.to_dense(), snapshot);
    assert_eq!(u.storage(), &snapshot);
}

#[test]
fn test_hermitian_complex_diagonal_rejected() {
    let mut h = StructuredMatrix::<Complex<f32>, Hermitian>::zeros(2).unwrap();
    let err = h.write(0, 0, Complex::new(1.0, 1.0)).unwrap_err();
    assert!(matches!(err, StrataError::InvalidValue { .. }));
    h.write(1, 0, Complex::new(0.0, 3.0)).unwrap();
    assert_eq!(h.read(0, 1), Complex::new(0.0, -3.0));
}

#[test]
fn test_try_new_over_storage() {
    let lower = DenseMatrix::from_rows(&[
        vec![1.0, 0.0, 0.0],
        vec![2.0, 1.0, 0.0],
        vec![3.0, 4.0, 1.0],
    ])
    .unwrap();
    let l = StructuredMatrix::<f64, UniLower>::try_new(lower.clone()).unwrap();
    assert_eq!(l.to_dense(), lower);
    assert!(matches!(
        StructuredMatrix::<f64, StrictlyLower>::try_new(lower.clone()),
        Err(StrataError::StructuralViolation { row: 0, col: 0, .. })
    ));

    let csr = CsrMatrix::from_dense(&lower, 0.0);
    assert!(StructuredMatrix::<f64, Lower, CsrMatrix<f64>>::try_new(csr).is_ok());
}

#[test]
fn test_commit_is_all_or_nothing() {
    let mut s = StructuredMatrix::<f64, Symmetric>::zeros(3).unwrap();
    s.write(0, 1, 5.0).unwrap();
    let before = s.to_dense();

    let not_symmetric = DenseMatrix::from_fn(3, 3, |r, c| (r * 3 + c) as f64);
    assert!(s.commit_from(&not_symmetric).is_err());
    assert_eq!(s.to_dense(), before);

    let symmetric = DenseMatrix::from_fn(3, 3, |r, c| (r + c) as f64);
    s.commit_from(&symmetric).unwrap();
    assert_eq!(s.to_dense(), symmetric);
}
