//! Compile-time element promotion
//!
//! The promotion table is expressed as trait implementations: combining an
//! `A` operand with a `B` operand yields `<A as Promote<B>>::Output`, and both
//! sides convert into it through [`CastInto`]. A pair with no implementation
//! (an integer with a complex type) is rejected by the compiler, which is the
//! earliest possible point a type deduction can fail.
//!
//! | lhs \ rhs | i32 | i64 | f32 | f64 | c32 | c64 |
//! |-----------|-----|-----|-----|-----|-----|-----|
//! | i32       | i32 | i64 | f32 | f64 |  -  |  -  |
//! | i64       | i64 | i64 | f64 | f64 |  -  |  -  |
//! | f32       | f32 | f64 | f32 | f64 | c32 | c64 |
//! | f64       | f64 | f64 | f64 | f64 | c64 | c64 |
//! | c32       |  -  |  -  | c32 | c64 | c32 | c64 |
//! | c64       |  -  |  -  | c64 | c64 | c64 | c64 |
//!
//! [`ElementKind::promote`](crate::ElementKind::promote) implements the same
//! table at runtime.

use crate::scalar::Scalar;
use scirs2_core::numeric::Complex;

/// Lossless (or precision-widening) conversion of one element type into another
pub trait CastInto<T>: Scalar {
    /// Convert `self` into `T`
    fn cast_into(self) -> T;
}

/// Result element type of combining `Self` with `Rhs`
pub trait Promote<Rhs: Scalar>: Scalar {
    /// The promoted element type
    type Output: Scalar;
}

/// Shorthand for the promoted element type of `A` and `B`
pub type Promoted<A, B> = <A as Promote<B>>::Output;

macro_rules! cast_identity {
    ($($ty:ty),*) => {
        $(
            impl CastInto<$ty> for $ty {
                #[inline(always)]
                fn cast_into(self) -> $ty {
                    self
                }
            }
        )*
    };
}

cast_identity!(i32, i64, f32, f64, Complex<f32>, Complex<f64>);

macro_rules! cast_as {
    ($($from:ty => $to:ty),* $(,)?) => {
        $(
            impl CastInto<$to> for $from {
                #[inline(always)]
                fn cast_into(self) -> $to {
                    self as $to
                }
            }
        )*
    };
}

cast_as!(i32 => i64, i32 => f32, i32 => f64, i64 => f64, f32 => f64);

impl CastInto<Complex<f32>> for f32 {
    #[inline(always)]
    fn cast_into(self) -> Complex<f32> {
        Complex::new(self, 0.0)
    }
}

impl CastInto<Complex<f64>> for f32 {
    #[inline(always)]
    fn cast_into(self) -> Complex<f64> {
        Complex::new(self as f64, 0.0)
    }
}

impl CastInto<Complex<f64>> for f64 {
    #[inline(always)]
    fn cast_into(self) -> Complex<f64> {
        Complex::new(self, 0.0)
    }
}

impl CastInto<Complex<f64>> for Complex<f32> {
    #[inline(always)]
    fn cast_into(self) -> Complex<f64> {
        Complex::new(self.re as f64, self.im as f64)
    }
}

macro_rules! promote_table {
    ($($lhs:ty, $rhs:ty => $out:ty;)*) => {
        $(
            impl Promote<$rhs> for $lhs {
                type Output = $out;
            }
        )*
    };
}

type C32 = Complex<f32>;
type C64 = Complex<f64>;

promote_table! {
    i32, i32 => i32;
    i32, i64 => i64;
    i32, f32 => f32;
    i32, f64 => f64;
    i64, i32 => i64;
    i64, i64 => i64;
    i64, f32 => f64;
    i64, f64 => f64;
    f32, i32 => f32;
    f32, i64 => f64;
    f32, f32 => f32;
    f32, f64 => f64;
    f32, C32 => C32;
    f32, C64 => C64;
    f64, i32 => f64;
    f64, i64 => f64;
    f64, f32 => f64;
    f64, f64 => f64;
    f64, C32 => C64;
    f64, C64 => C64;
    C32, f32 => C32;
    C32, f64 => C64;
    C32, C32 => C32;
    C32, C64 => C64;
    C64, f32 => C64;
    C64, f64 => C64;
    C64, C32 => C64;
    C64, C64 => C64;
}
