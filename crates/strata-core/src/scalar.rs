//! Element types accepted by strata matrices
//!
//! [`Scalar`] is the bound every matrix element satisfies. It adds the few
//! operations structural adaptors need on top of the numeric traits
//! re-exported by `scirs2_core::numeric` (conjugation, a realness test and a
//! magnitude used for tolerance checks).
//!
//! [`ElementKind`] is the runtime mirror of the element type, used to
//! describe promotions in errors and diagnostics.

use crate::error::{StrataError, StrataResult};
use scirs2_core::numeric::{Complex, Num};
use std::fmt;

/// Runtime tag of a matrix element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Complex with 32-bit float components
    C32,
    /// Complex with 64-bit float components
    C64,
}

impl ElementKind {
    /// Whether the kind carries an imaginary component
    pub fn is_complex(self) -> bool {
        matches!(self, ElementKind::C32 | ElementKind::C64)
    }

    /// Whether the kind is an integer type
    pub fn is_integer(self) -> bool {
        matches!(self, ElementKind::I32 | ElementKind::I64)
    }

    /// Width in bits of one real component
    pub fn component_bits(self) -> u32 {
        match self {
            ElementKind::I32 | ElementKind::F32 | ElementKind::C32 => 32,
            ElementKind::I64 | ElementKind::F64 | ElementKind::C64 => 64,
        }
    }

    /// Deduce the element kind produced by combining `self` with `other`
    ///
    /// Real with complex yields complex, differing precisions yield the wider
    /// precision, and an integer paired with a float of narrower width widens
    /// to 64-bit float so no integer precision is lost. Integers never combine
    /// with complex operands.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::ElementKind;
    ///
    /// assert_eq!(ElementKind::F32.promote(ElementKind::F64).unwrap(), ElementKind::F64);
    /// assert_eq!(ElementKind::F64.promote(ElementKind::C32).unwrap(), ElementKind::C64);
    /// assert!(ElementKind::I32.promote(ElementKind::C64).is_err());
    /// ```
    pub fn promote(self, other: ElementKind) -> StrataResult<ElementKind> {
        use ElementKind::*;

        let fail = || StrataError::TypeDeductionFailure {
            lhs: self,
            rhs: other,
        };

        if self == other {
            return Ok(self);
        }

        if (self.is_integer() && other.is_complex()) || (self.is_complex() && other.is_integer()) {
            return Err(fail());
        }

        let wide = self.component_bits().max(other.component_bits()) == 64;
        let out = match (self.is_complex() || other.is_complex(), self.is_integer() && other.is_integer()) {
            (true, _) => {
                if wide {
                    C64
                } else {
                    C32
                }
            }
            (false, true) => {
                if wide {
                    I64
                } else {
                    I32
                }
            }
            (false, false) => {
                // i32 x f32 stays single precision, i64 with any float widens
                if wide || matches!((self, other), (I64, _) | (_, I64)) {
                    F64
                } else {
                    F32
                }
            }
        };
        Ok(out)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::I32 => "i32",
            ElementKind::I64 => "i64",
            ElementKind::F32 => "f32",
            ElementKind::F64 => "f64",
            ElementKind::C32 => "c32",
            ElementKind::C64 => "c64",
        };
        f.write_str(name)
    }
}

/// Element type of a strata matrix
///
/// Implemented for `i32`, `i64`, `f32`, `f64`, `Complex<f32>` and
/// `Complex<f64>`.
pub trait Scalar: Copy + Num + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag of this type
    const KIND: ElementKind;

    /// Complex conjugate (identity for real types)
    fn conj(self) -> Self;

    /// Whether the imaginary component is exactly zero
    fn is_real(self) -> bool;

    /// Absolute value as `f64`, used for tolerance comparisons
    fn magnitude(self) -> f64;

    /// Additive inverse
    #[inline]
    fn negate(self) -> Self {
        Self::zero() - self
    }
}

macro_rules! impl_real_scalar {
    ($ty:ty, $kind:expr) => {
        impl Scalar for $ty {
            const KIND: ElementKind = $kind;

            #[inline(always)]
            fn conj(self) -> Self {
                self
            }

            #[inline(always)]
            fn is_real(self) -> bool {
                true
            }

            #[inline(always)]
            fn magnitude(self) -> f64 {
                (self as f64).abs()
            }
        }
    };
}

impl_real_scalar!(i32, ElementKind::I32);
impl_real_scalar!(i64, ElementKind::I64);
impl_real_scalar!(f32, ElementKind::F32);
impl_real_scalar!(f64, ElementKind::F64);

macro_rules! impl_complex_scalar {
    ($ty:ty, $kind:expr) => {
        impl Scalar for Complex<$ty> {
            const KIND: ElementKind = $kind;

            #[inline(always)]
            fn conj(self) -> Self {
                Complex::new(self.re, -self.im)
            }

            #[inline(always)]
            fn is_real(self) -> bool {
                self.im == 0.0
            }

            #[inline(always)]
            fn magnitude(self) -> f64 {
                (self.re as f64).hypot(self.im as f64)
            }
        }
    };
}

impl_complex_scalar!(f32, ElementKind::C32);
impl_complex_scalar!(f64, ElementKind::C64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_table_is_symmetric() {
        let kinds = [
            ElementKind::I32,
            ElementKind::I64,
            ElementKind::F32,
            ElementKind::F64,
            ElementKind::C32,
            ElementKind::C64,
        ];
        for &a in &kinds {
            for &b in &kinds {
                assert_eq!(a.promote(b).ok(), b.promote(a).ok(), "{} x {}", a, b);
            }
        }
    }

    #[test]
    fn test_promotion_entries() {
        use ElementKind::*;
        assert_eq!(I32.promote(I64).unwrap(), I64);
        assert_eq!(I32.promote(F32).unwrap(), F32);
        assert_eq!(I64.promote(F32).unwrap(), F64);
        assert_eq!(F32.promote(C32).unwrap(), C32);
        assert_eq!(F32.promote(C64).unwrap(), C64);
        assert_eq!(F64.promote(C32).unwrap(), C64);
        assert_eq!(C32.promote(C64).unwrap(), C64);
    }

    #[test]
    fn test_integer_complex_has_no_promotion() {
        let err = ElementKind::I64.promote(ElementKind::C32).unwrap_err();
        assert_eq!(
            err,
            StrataError::TypeDeductionFailure {
                lhs: ElementKind::I64,
                rhs: ElementKind::C32
            }
        );
    }

    #[test]
    fn test_complex_conj_and_realness() {
        let z = Complex::new(1.0f64, 2.0);
        assert_eq!(Scalar::conj(z), Complex::new(1.0, -2.0));
        assert!(!z.is_real());
        assert!(Complex::new(3.0f32, 0.0).is_real());
        assert!((z.magnitude() - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_real_negate() {
        assert_eq!(3.5f64.negate(), -3.5);
        assert_eq!(Scalar::conj(-2i32), -2);
    }
}
