//! Integration tests for strata-core
//!
//! These tests exercise the dense matrix through the storage contract the
//! other strata crates consume.

use proptest::prelude::*;
use strata_core::{
    CastInto, Complex, DenseMatrix, ElementKind, EvalConfig, MatrixStorage, MatrixStorageMut,
    Promoted, Scalar, StorageId, StorageOrder, StrataError,
};

fn storage_sum<T: Scalar, M: MatrixStorage<T>>(m: &M) -> T {
    let mut acc = T::zero();
    m.for_each_nonzero(&mut |_, _, v| acc = acc + v);
    acc
}

#[test]
fn test_dense_through_storage_contract() {
    let m = DenseMatrix::from_vec(2, 3, vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0]).unwrap();

    // Read through a reference and a box
    let by_ref: &dyn MatrixStorage<f64> = &m;
    assert_eq!(by_ref.shape(), (2, 3));
    assert_eq!(storage_sum(&by_ref), 6.0);

    let boxed: Box<dyn MatrixStorage<f64>> = Box::new(m.clone());
    assert_eq!(boxed.at(1, 1), 3.0);
    assert_eq!(boxed.extent(2), 1);
    assert_eq!(
        boxed.get(3, 0).unwrap_err(),
        StrataError::out_of_bounds(3, 0, (2, 3))
    );
}

#[test]
fn test_allocate_like_keeps_order() {
    let m = DenseMatrix::<f32>::zeros_with_order(3, 2, StorageOrder::ColumnMajor);
    let tmp = m.allocate_like().unwrap();
    assert_eq!(tmp.shape(), (3, 2));
    assert_eq!(tmp.order(), StorageOrder::ColumnMajor);
    assert_ne!(tmp.storage_id(), m.storage_id());
}

#[test]
fn test_storage_id_tracks_object() {
    let a = DenseMatrix::<i32>::zeros(2, 2);
    let r1 = &a;
    let r2 = &a;
    assert_eq!(StorageId::of(r1), r2.storage_id());
}

#[test]
fn test_complex_cast() {
    let m = DenseMatrix::from_vec(1, 2, vec![1.5f32, -2.0]).unwrap();
    let z: DenseMatrix<Complex<f64>> = m.cast();
    assert_eq!(z[(0, 1)], Complex::new(-2.0, 0.0));
    assert_eq!(<Complex<f64> as Scalar>::KIND, ElementKind::C64);
}

#[test]
fn test_promoted_cast_matches_runtime_kind() {
    fn promoted_kind<A, B>() -> ElementKind
    where
        A: strata_core::Promote<B>,
        B: Scalar,
    {
        <Promoted<A, B> as Scalar>::KIND
    }
    assert_eq!(promoted_kind::<i32, f32>(), ElementKind::F32);
    assert_eq!(promoted_kind::<Complex<f32>, f64>(), ElementKind::C64);
    let v: Promoted<i32, i64> = 7i32.cast_into();
    assert_eq!(v, 7i64);
}

#[test]
fn test_config_default_is_valid() {
    assert!(EvalConfig::default().validate().is_ok());
}

proptest! {
    /// Property: changing storage order never changes logical contents
    #[test]
    fn prop_order_conversion_preserves_elements(
        nrows in 1usize..6,
        ncols in 1usize..6,
        seed in prop::collection::vec(-50i64..50, 36)
    ) {
        let m = DenseMatrix::from_fn(nrows, ncols, |r, c| seed[r * 6 + c]);
        let col = m.to_order(StorageOrder::ColumnMajor);
        prop_assert_eq!(&col, &m);
        for r in 0..nrows {
            for c in 0..ncols {
                prop_assert_eq!(col.get(r, c).unwrap(), m[(r, c)]);
            }
        }
    }

    /// Property: a free transpose applied twice is the identity
    #[test]
    fn prop_double_transpose_identity(
        nrows in 1usize..6,
        ncols in 1usize..6,
    ) {
        let m = DenseMatrix::from_fn(nrows, ncols, |r, c| (r * 7 + c) as f64);
        let back = m.clone().into_transpose().into_transpose();
        prop_assert_eq!(back, m);
    }
}
