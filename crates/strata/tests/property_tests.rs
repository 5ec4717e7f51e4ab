//! Property-based tests through the facade
//!
//! Random write sequences go through the prelude re-exports, followed by
//! expression updates checked against plain dense arithmetic.

use proptest::prelude::*;
use strata::prelude::*;

const N: usize = 5;

fn write_strategy() -> impl Strategy<Value = Vec<(usize, usize, i32)>> {
    prop::collection::vec((0..N, 0..N, -9i32..10), 0..30)
}

fn vector_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((-3i32..4).prop_map(f64::from), N)
}

proptest! {
    /// Property: a rank-1 update of a symmetric matrix matches the dense
    /// result and stays symmetric
    #[test]
    fn prop_symmetric_rank_update_matches_dense(
        writes in write_strategy(),
        values in vector_strategy(),
    ) {
        let mut s = SymmetricMatrix::<f64>::zeros(N).unwrap();
        for &(r, c, v) in &writes {
            s.write(r, c, f64::from(v)).unwrap();
        }
        let u = DenseMatrix::from_vec(N, 1, values).unwrap();
        let before = s.to_dense();

        s.update(|s| s + u.lazy() * u.lazy().t()).unwrap();

        for r in 0..N {
            for c in 0..N {
                prop_assert_eq!(s.read(r, c), before[(r, c)] + u[(r, 0)] * u[(c, 0)]);
                prop_assert_eq!(s.read(r, c), s.read(c, r));
            }
        }
    }

    /// Property: rejected writes and rejected assignments leave an upper
    /// matrix unchanged
    #[test]
    fn prop_upper_rejections_leave_matrix_unchanged(writes in write_strategy()) {
        let mut u = UpperMatrix::<f64>::zeros(N).unwrap();
        for &(r, c, v) in &writes {
            let before = u.to_dense();
            match u.write(r, c, f64::from(v)) {
                Ok(()) => prop_assert!(r <= c),
                Err(err) => {
                    prop_assert!(
                        matches!(err, StrataError::StructuralViolation { .. }),
                        "unexpected error {:?}",
                        err
                    );
                    prop_assert_eq!(&u.to_dense(), &before);
                }
            }
        }

        // uᵀ is lower triangular; assigning it succeeds only when it is diagonal
        let before = u.to_dense();
        let transposed = evaluate(u.lazy().t()).unwrap();
        let diagonal = (0..N).all(|r| (0..r).all(|c| transposed[(r, c)] == 0.0));
        match u.assign(&transposed) {
            Ok(()) => prop_assert!(diagonal),
            Err(_) => {
                prop_assert!(!diagonal);
                prop_assert_eq!(&u.to_dense(), &before);
            }
        }
    }
}
