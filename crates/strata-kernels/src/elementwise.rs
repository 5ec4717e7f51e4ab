//! Element-wise kernels over contiguous runs
//!
//! A run is one row of a row-major buffer or one column of a column-major
//! buffer. When every dense operand of an element-wise expression shares the
//! destination's order, the expression can be evaluated one run at a time
//! with these slice kernels instead of per-element index arithmetic.
//!
//! All kernels write into their first argument. Operands must have the same
//! length as the destination.

use strata_core::Scalar;

/// `out[i] = src[i]`
#[inline]
pub fn copy_run<T: Scalar>(out: &mut [T], src: &[T]) {
    out.copy_from_slice(src);
}

/// `out[i] += rhs[i]`
#[inline]
pub fn add_assign_run<T: Scalar>(out: &mut [T], rhs: &[T]) {
    debug_assert_eq!(out.len(), rhs.len());
    for (o, &r) in out.iter_mut().zip(rhs) {
        *o = *o + r;
    }
}

/// `out[i] -= rhs[i]`
#[inline]
pub fn sub_assign_run<T: Scalar>(out: &mut [T], rhs: &[T]) {
    debug_assert_eq!(out.len(), rhs.len());
    for (o, &r) in out.iter_mut().zip(rhs) {
        *o = *o - r;
    }
}

/// `out[i] *= rhs[i]`
#[inline]
pub fn mul_assign_run<T: Scalar>(out: &mut [T], rhs: &[T]) {
    debug_assert_eq!(out.len(), rhs.len());
    for (o, &r) in out.iter_mut().zip(rhs) {
        *o = *o * r;
    }
}

/// `out[i] *= factor`
#[inline]
pub fn scale_run<T: Scalar>(out: &mut [T], factor: T) {
    for o in out.iter_mut() {
        *o = *o * factor;
    }
}

/// `out[i] = -out[i]`
#[inline]
pub fn negate_run<T: Scalar>(out: &mut [T]) {
    for o in out.iter_mut() {
        *o = o.negate();
    }
}

/// `out[i] = conj(out[i])`
#[inline]
pub fn conj_run<T: Scalar>(out: &mut [T]) {
    for o in out.iter_mut() {
        *o = o.conj();
    }
}
