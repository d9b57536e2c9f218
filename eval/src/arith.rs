//! `Arithmetic` trait and the decimal arithmetic used by the evaluator.
//!
//! An [`Arithmetic`] defines fallible arithmetic operations on numbers: addition, subtraction,
//! multiplication, division, remainder, exponentiation and negation. The arithmetic can have
//! a state; [`DecimalArithmetic`] stores the precision and the rounding mode applied
//! to every result.

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

use core::num::NonZeroU64;

use crate::error::ArithmeticError;

/// Encapsulates arithmetic operations on a certain number type.
///
/// Unlike operations on built-in number types, arithmetic operations may be fallible.
pub trait Arithmetic<T> {
    /// Adds two values.
    fn add(&self, x: T, y: T) -> Result<T, ArithmeticError>;

    /// Subtracts two values.
    fn sub(&self, x: T, y: T) -> Result<T, ArithmeticError>;

    /// Multiplies two values.
    fn mul(&self, x: T, y: T) -> Result<T, ArithmeticError>;

    /// Divides two values.
    ///
    /// # Errors
    ///
    /// Returns an error if `y` is zero.
    fn div(&self, x: T, y: T) -> Result<T, ArithmeticError>;

    /// Computes the remainder of dividing `x` by `y`.
    ///
    /// # Errors
    ///
    /// Returns an error if `y` is zero.
    fn rem(&self, x: T, y: T) -> Result<T, ArithmeticError>;

    /// Raises `x` to the power of `y`.
    fn pow(&self, x: T, y: T) -> Result<T, ArithmeticError>;

    /// Negates a value.
    fn neg(&self, x: T) -> Result<T, ArithmeticError>;
}

/// Default number of significant digits kept in arithmetic results.
pub const DEFAULT_PRECISION: u64 = 68;

/// Maximum magnitude of a decimal exponent accepted in number literals and in rounding
/// to a negative scale.
pub const MAX_SCALE: i64 = 10_000;

/// Integer exponents up to this value are computed exactly; larger ones go through `f64`.
const MAX_EXACT_EXPONENT: u64 = 1_000_000;

/// Decimal arithmetic with a fixed number of significant digits.
///
/// Every result is rounded to [`precision`](Self::precision()) significant digits using
/// the configured [`RoundingMode`].
///
/// # Examples
///
/// ```
/// # use bigdecimal::{BigDecimal, RoundingMode};
/// # use core::num::NonZeroU64;
/// use formula_eval::arith::{Arithmetic, DecimalArithmetic};
///
/// let arithmetic = DecimalArithmetic::new(NonZeroU64::new(5).unwrap(), RoundingMode::HalfUp);
/// let third = arithmetic.div(BigDecimal::from(1), BigDecimal::from(3))?;
/// assert_eq!(third.to_string(), "0.33333");
/// let err = arithmetic.div(BigDecimal::from(1), BigDecimal::from(0)).unwrap_err();
/// assert_eq!(err.to_string(), "Division by zero");
/// # Ok::<_, formula_eval::ArithmeticError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalArithmetic {
    precision: NonZeroU64,
    rounding: RoundingMode,
}

impl Default for DecimalArithmetic {
    fn default() -> Self {
        Self {
            precision: NonZeroU64::new(DEFAULT_PRECISION).unwrap_or(NonZeroU64::MIN),
            rounding: RoundingMode::HalfEven,
        }
    }
}

impl DecimalArithmetic {
    /// Creates an arithmetic with the specified precision and rounding mode.
    pub fn new(precision: NonZeroU64, rounding: RoundingMode) -> Self {
        Self {
            precision,
            rounding,
        }
    }

    /// Returns the number of significant digits kept in results.
    pub fn precision(&self) -> NonZeroU64 {
        self.precision
    }

    /// Returns the rounding mode.
    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Rounds `x` to the configured precision. Values that already fit into the precision
    /// are returned as is.
    pub fn round_to_precision(&self, x: &BigDecimal) -> BigDecimal {
        if x.digits() <= self.precision.get() {
            return x.clone();
        }
        let rounded = x.with_precision_round(self.precision, self.rounding);
        trim_fraction_zeros(rounded)
    }

    /// Rounds `x` to `scale` digits after the decimal point using the configured rounding mode.
    /// A negative `scale` rounds to tens, hundreds etc.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is less than `-MAX_SCALE`.
    pub fn round(&self, x: &BigDecimal, scale: i64) -> Result<BigDecimal, ArithmeticError> {
        if scale < -MAX_SCALE {
            return Err(ArithmeticError::ScaleOutOfRange(scale));
        }
        Ok(round_to_scale(x, scale, self.rounding))
    }

    /// Rounds `x` to an integer in the specified `mode`.
    pub fn round_integer(x: &BigDecimal, mode: RoundingMode) -> BigDecimal {
        round_to_scale(x, 0, mode)
    }

    fn int_pow(&self, base: BigDecimal, mut exponent: u64) -> BigDecimal {
        let mut result = BigDecimal::one();
        let mut power = base;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = self.round_to_precision(&(&result * &power));
            }
            exponent >>= 1;
            if exponent > 0 {
                power = self.round_to_precision(&(&power * &power));
            }
        }
        result
    }

    fn float_pow(&self, x: &BigDecimal, y: &BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        let x = x.to_f64().ok_or(ArithmeticError::NonFinitePower)?;
        let y = y.to_f64().ok_or(ArithmeticError::NonFinitePower)?;
        let result = x.powf(y);
        if !result.is_finite() {
            return Err(ArithmeticError::NonFinitePower);
        }
        BigDecimal::from_f64(result)
            .map(|result| self.round_to_precision(&result))
            .ok_or(ArithmeticError::NonFinitePower)
    }
}

/// Rounds `x` to `scale` without materializing powers of ten larger than the digits of `x`.
fn round_to_scale(x: &BigDecimal, scale: i64, mode: RoundingMode) -> BigDecimal {
    if x.is_zero() {
        return BigDecimal::zero();
    }
    let (_, current_scale) = x.as_bigint_and_exponent();
    if scale >= current_scale {
        return x.clone();
    }

    let dropped_digits = current_scale.saturating_sub(scale);
    let digits = i64::try_from(x.digits()).unwrap_or(i64::MAX);
    if dropped_digits > digits.saturating_add(1) {
        // All digits are dropped; the outcome only depends on the sign and the rounding mode,
        // which a tiny value of the same sign reproduces.
        let sign = if x.is_negative() { -1 } else { 1 };
        let tiny = BigDecimal::new(BigInt::from(sign), scale.saturating_add(2));
        return tiny.with_scale_round(scale, mode);
    }
    x.with_scale_round(scale, mode)
}

/// Checks whether `x` has no fractional part.
pub(crate) fn is_integer(x: &BigDecimal) -> bool {
    let (_, scale) = x.as_bigint_and_exponent();
    if scale <= 0 {
        return true;
    }
    if u64::try_from(scale).map_or(true, |scale| scale >= x.digits()) {
        // |x| < 1
        return x.is_zero();
    }
    x.normalized().as_bigint_and_exponent().1 <= 0
}

/// Removes trailing zeros after the decimal point.
fn trim_fraction_zeros(x: BigDecimal) -> BigDecimal {
    let (_, scale) = x.as_bigint_and_exponent();
    if scale <= 0 {
        return x;
    }
    let normalized = x.normalized();
    if normalized.as_bigint_and_exponent().1 < 0 {
        normalized.with_scale(0)
    } else {
        normalized
    }
}

impl Arithmetic<BigDecimal> for DecimalArithmetic {
    fn add(&self, x: BigDecimal, y: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        Ok(self.round_to_precision(&(x + y)))
    }

    fn sub(&self, x: BigDecimal, y: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        Ok(self.round_to_precision(&(x - y)))
    }

    fn mul(&self, x: BigDecimal, y: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        Ok(self.round_to_precision(&(x * y)))
    }

    fn div(&self, x: BigDecimal, y: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        if y.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self.round_to_precision(&(x / y)))
    }

    fn rem(&self, x: BigDecimal, y: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        if y.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self.round_to_precision(&(x % y)))
    }

    fn pow(&self, x: BigDecimal, y: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        let (_, y_scale) = y.as_bigint_and_exponent();
        let integer_digits = i64::try_from(y.digits())
            .unwrap_or(i64::MAX)
            .saturating_sub(y_scale);
        if integer_digits > 7 || !is_integer(&y) {
            return self.float_pow(&x, &y);
        }
        let (exponent, _) = y.with_scale(0).into_bigint_and_exponent();
        let abs_exponent = exponent.abs().to_u64();
        let Some(abs_exponent) = abs_exponent.filter(|&exp| exp <= MAX_EXACT_EXPONENT) else {
            return self.float_pow(&x, &y);
        };

        if exponent.is_negative() {
            if x.is_zero() {
                return Err(ArithmeticError::ZeroToNegativePower);
            }
            let power = self.int_pow(x, abs_exponent);
            self.div(BigDecimal::one(), power)
        } else {
            Ok(self.int_pow(x, abs_exponent))
        }
    }

    fn neg(&self, x: BigDecimal) -> Result<BigDecimal, ArithmeticError> {
        Ok(-x)
    }
}

/// Creates a decimal from two 36-digit chunks: `(high * 10^36 + low) * 10^-scale`.
pub(crate) fn decimal_from_chunks(high: u128, low: u128, scale: i64) -> BigDecimal {
    let digits = BigInt::from(high) * BigInt::from(10_u8).pow(36) + BigInt::from(low);
    BigDecimal::new(digits, scale)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(DecimalArithmetic: Arithmetic<BigDecimal>, Send, Sync);

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn basic_operations() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.add(dec("0.1"), dec("0.2")).unwrap(), dec("0.3"));
        assert_eq!(arith.sub(dec("1"), dec("2.5")).unwrap(), dec("-1.5"));
        assert_eq!(arith.mul(dec("1.5"), dec("4")).unwrap(), dec("6"));
        assert_eq!(arith.div(dec("1"), dec("4")).unwrap(), dec("0.25"));
        assert_eq!(arith.rem(dec("7"), dec("3")).unwrap(), dec("1"));
        assert_eq!(arith.neg(dec("3")).unwrap(), dec("-3"));
    }

    #[test]
    fn division_by_zero() {
        let arith = DecimalArithmetic::default();
        let err = arith.div(dec("3"), dec("0")).unwrap_err();
        assert_eq!(err, ArithmeticError::DivisionByZero);
        let err = arith.rem(dec("3"), dec("0.000")).unwrap_err();
        assert_eq!(err, ArithmeticError::DivisionByZero);
    }

    #[test]
    fn results_are_rounded_to_precision() {
        let arith = DecimalArithmetic::new(NonZeroU64::new(4).unwrap(), RoundingMode::HalfEven);
        assert_eq!(arith.div(dec("2"), dec("3")).unwrap(), dec("0.6667"));
        assert_eq!(arith.add(dec("1000"), dec("0.5")).unwrap(), dec("1000"));
        assert_eq!(arith.add(dec("1000"), dec("1.5")).unwrap(), dec("1002"));

        let arith = DecimalArithmetic::default();
        let third = arith.div(dec("1"), dec("3")).unwrap();
        assert_eq!(third.digits(), DEFAULT_PRECISION);
    }

    #[test]
    fn integer_powers() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.pow(dec("2"), dec("10")).unwrap(), dec("1024"));
        assert_eq!(arith.pow(dec("-2"), dec("3")).unwrap(), dec("-8"));
        assert_eq!(arith.pow(dec("1.5"), dec("2")).unwrap(), dec("2.25"));
        assert_eq!(arith.pow(dec("2"), dec("-2")).unwrap(), dec("0.25"));
        assert_eq!(arith.pow(dec("7"), dec("0")).unwrap(), dec("1"));
        assert_eq!(arith.pow(dec("0"), dec("0")).unwrap(), dec("1"));

        let err = arith.pow(dec("0"), dec("-1")).unwrap_err();
        assert_eq!(err.to_string(), "Zero cannot be raised to a negative power");
    }

    #[test]
    fn fractional_powers() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.pow(dec("4"), dec("0.5")).unwrap(), dec("2"));
        assert_matches!(
            arith.pow(dec("-4"), dec("0.5")),
            Err(ArithmeticError::NonFinitePower)
        );
    }

    #[test]
    fn results_are_not_padded() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.add(dec("1"), dec("2")).unwrap().to_string(), "3");
        assert_eq!(arith.div(dec("10"), dec("4")).unwrap().to_string(), "2.5");
        assert_eq!(arith.mul(dec("0.5"), dec("0.5")).unwrap().to_string(), "0.25");
        assert_eq!(arith.pow(dec("2"), dec("-2")).unwrap().to_string(), "0.25");
        let root = arith.round_to_precision(&dec("16").sqrt().unwrap());
        assert_eq!(root.to_string(), "4");
    }

    #[test]
    fn huge_exponents_do_not_hang() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.pow(dec("1"), dec("1e30")).unwrap(), dec("1"));
        assert_eq!(arith.pow(dec("1"), dec("1000000001")).unwrap(), dec("1"));
        assert_matches!(
            arith.pow(dec("2"), dec("1e30")),
            Err(ArithmeticError::NonFinitePower)
        );
        assert!(!is_integer(&dec("1e-1000000000")));
        assert!(is_integer(&dec("1e1000000000")));
        assert!(is_integer(&dec("2.5000e3")));
        assert!(!is_integer(&dec("2.5001e3")));
    }

    #[test]
    fn rounding_to_scale() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.round(&dec("2.5"), 0).unwrap(), dec("2"));
        assert_eq!(arith.round(&dec("3.5"), 0).unwrap(), dec("4"));
        assert_eq!(arith.round(&dec("1.2345"), 2).unwrap(), dec("1.23"));
        assert_eq!(arith.round(&dec("1250"), -2).unwrap(), dec("1200"));
        assert_eq!(arith.round(&dec("1.5"), 10).unwrap().to_string(), "1.5");

        let floor = DecimalArithmetic::round_integer(&dec("-1.5"), RoundingMode::Floor);
        assert_eq!(floor, dec("-2"));
        let ceiling = DecimalArithmetic::round_integer(&dec("1e-1000000000"), RoundingMode::Ceiling);
        assert_eq!(ceiling, dec("1"));
    }

    #[test]
    fn rounding_to_extreme_scales() {
        let arith = DecimalArithmetic::default();
        assert_eq!(arith.round(&dec("1"), 10_000_000_000).unwrap(), dec("1"));
        assert_eq!(arith.round(&dec("0.001"), 0).unwrap(), dec("0"));
        assert_eq!(arith.round(&dec("123.45"), -9_000).unwrap(), dec("0"));
        assert_eq!(arith.round(&dec("0.000"), -9_000).unwrap(), dec("0"));

        let up = DecimalArithmetic::new(NonZeroU64::MIN, RoundingMode::Up);
        assert_eq!(up.round(&dec("123.45"), -9_000).unwrap(), dec("1e9000"));
        assert_eq!(up.round(&dec("-0.5"), -5).unwrap(), dec("-1e5"));

        let err = arith.round(&dec("1"), -10_000_000_000).unwrap_err();
        assert_eq!(err, ArithmeticError::ScaleOutOfRange(-10_000_000_000));
        assert_eq!(err.to_string(), "Scale -10000000000 is out of range");
    }

    #[test]
    fn decimal_chunks() {
        let value = decimal_from_chunks(1, 5, 37);
        assert_eq!(value, dec("0.1000000000000000000000000000000000005"));
    }
}
