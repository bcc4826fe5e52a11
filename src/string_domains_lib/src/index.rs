//! Saturating index arithmetic for the string domains.
//!
//! All index, length and repetition computations inside the domains use the
//! [`IndexInt`] type: a non-negative counter extended with two sentinels,
//! `Negative` for invalid or "not found" indices and `Infinite` for
//! unbounded quantities. [`IndexInterval`] is a closed interval over
//! `IndexInt`, used to describe the possible values of an index or length
//! argument of a string operation.

use std::cmp;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};

use crate::prelude::*;

/// A saturating, sign-aware integer used for all index, length and
/// repetition arithmetic in the string domains.
///
/// The derived total order places `Negative` below every finite value
/// (it behaves like −1) and `Infinite` above every finite value.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum IndexInt {
    /// An invalid or "not found" index.
    Negative,
    /// A non-negative count.
    Finite(u64),
    /// The unbounded value.
    Infinite,
}

impl IndexInt {
    /// The finite value zero.
    pub const ZERO: IndexInt = IndexInt::Finite(0);
    /// The finite value one.
    pub const ONE: IndexInt = IndexInt::Finite(1);

    /// Create an index value from a possibly negative number.
    /// Negative inputs are clamped to the `Negative` sentinel.
    pub fn for_value(value: i64) -> IndexInt {
        if value < 0 {
            IndexInt::Negative
        } else {
            IndexInt::Finite(value as u64)
        }
    }

    /// Create an index value from a number that the caller guarantees to be
    /// non-negative. Panics on negative input.
    pub fn for_non_negative(value: i64) -> IndexInt {
        if value < 0 {
            panic!("negative value used as a non-negative index");
        }
        IndexInt::Finite(value as u64)
    }

    /// Check for the `Negative` sentinel.
    pub fn is_negative(&self) -> bool {
        matches!(self, IndexInt::Negative)
    }

    /// Check for the `Infinite` sentinel.
    pub fn is_infinite(&self) -> bool {
        matches!(self, IndexInt::Infinite)
    }

    /// Check for the finite value zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, IndexInt::Finite(0))
    }

    /// Return the contained finite value or an error for both sentinels.
    pub fn try_to_u64(&self) -> Result<u64, Error> {
        match self {
            IndexInt::Finite(value) => Ok(*value),
            IndexInt::Negative => Err(anyhow!("index is negative")),
            IndexInt::Infinite => Err(anyhow!("index is unbounded")),
        }
    }

    /// Return the contained finite value as a `usize` or an error for both sentinels.
    pub fn try_to_usize(&self) -> Result<usize, Error> {
        Ok(self.try_to_u64()? as usize)
    }

    /// Subtraction that clamps an underflow to zero instead of `Negative`
    /// and treats an infinite subtrahend as consuming everything.
    /// Used for the running shifts of the brick slicing walks,
    /// where a negative remainder simply means "nothing left to consume".
    pub fn sub_clamped(self, rhs: IndexInt) -> IndexInt {
        match (self, rhs) {
            (IndexInt::Negative, _) | (_, IndexInt::Negative) => {
                panic!("clamped subtraction on a negative index")
            }
            (IndexInt::Infinite, _) => IndexInt::Infinite,
            (_, IndexInt::Infinite) => IndexInt::ZERO,
            (IndexInt::Finite(minuend), IndexInt::Finite(subtrahend)) => {
                IndexInt::Finite(minuend.saturating_sub(subtrahend))
            }
        }
    }

    /// Division rounding towards positive infinity.
    /// Follows the same sentinel rules as the `/` operator.
    pub fn div_ceil(self, rhs: IndexInt) -> IndexInt {
        match (self, rhs) {
            (IndexInt::Negative, _) | (_, IndexInt::Negative) => {
                panic!("division on a negative index")
            }
            (_, IndexInt::Infinite) => IndexInt::ZERO,
            (IndexInt::Infinite, _) | (_, IndexInt::Finite(0)) => IndexInt::Infinite,
            (IndexInt::Finite(dividend), IndexInt::Finite(divisor)) => {
                IndexInt::Finite(dividend.div_ceil(divisor))
            }
        }
    }
}

impl Add for IndexInt {
    type Output = IndexInt;

    /// Saturating addition. Overflow and infinite operands saturate to
    /// `Infinite`; `Negative` operands are a caller bug.
    fn add(self, rhs: IndexInt) -> IndexInt {
        match (self, rhs) {
            (IndexInt::Negative, _) | (_, IndexInt::Negative) => {
                panic!("addition on a negative index")
            }
            (IndexInt::Infinite, _) | (_, IndexInt::Infinite) => IndexInt::Infinite,
            (IndexInt::Finite(left), IndexInt::Finite(right)) => left
                .checked_add(right)
                .map_or(IndexInt::Infinite, IndexInt::Finite),
        }
    }
}

impl Sub for IndexInt {
    type Output = IndexInt;

    /// Subtraction. An infinite minuend stays infinite, an infinite
    /// subtrahend and `Negative` operands are caller bugs, and a finite
    /// underflow is clamped to `Negative`.
    fn sub(self, rhs: IndexInt) -> IndexInt {
        match (self, rhs) {
            (IndexInt::Negative, _) | (_, IndexInt::Negative) => {
                panic!("subtraction on a negative index")
            }
            (_, IndexInt::Infinite) => panic!("subtraction of an unbounded index"),
            (IndexInt::Infinite, _) => IndexInt::Infinite,
            (IndexInt::Finite(minuend), IndexInt::Finite(subtrahend)) => {
                if minuend >= subtrahend {
                    IndexInt::Finite(minuend - subtrahend)
                } else {
                    IndexInt::Negative
                }
            }
        }
    }
}

impl Mul for IndexInt {
    type Output = IndexInt;

    /// Saturating multiplication. Overflow and infinite operands saturate
    /// to `Infinite`; `Negative` operands are a caller bug.
    fn mul(self, rhs: IndexInt) -> IndexInt {
        match (self, rhs) {
            (IndexInt::Negative, _) | (_, IndexInt::Negative) => {
                panic!("multiplication on a negative index")
            }
            (IndexInt::Infinite, _) | (_, IndexInt::Infinite) => IndexInt::Infinite,
            (IndexInt::Finite(left), IndexInt::Finite(right)) => left
                .checked_mul(right)
                .map_or(IndexInt::Infinite, IndexInt::Finite),
        }
    }
}

impl Div for IndexInt {
    type Output = IndexInt;

    /// Floor division. An infinite divisor yields zero; a zero divisor or
    /// an infinite dividend yields `Infinite`; `Negative` operands are a
    /// caller bug.
    fn div(self, rhs: IndexInt) -> IndexInt {
        match (self, rhs) {
            (IndexInt::Negative, _) | (_, IndexInt::Negative) => {
                panic!("division on a negative index")
            }
            (_, IndexInt::Infinite) => IndexInt::ZERO,
            (IndexInt::Infinite, _) | (_, IndexInt::Finite(0)) => IndexInt::Infinite,
            (IndexInt::Finite(dividend), IndexInt::Finite(divisor)) => {
                IndexInt::Finite(dividend / divisor)
            }
        }
    }
}

impl Sum for IndexInt {
    fn sum<I: Iterator<Item = IndexInt>>(iter: I) -> IndexInt {
        iter.fold(IndexInt::ZERO, |acc, value| acc + value)
    }
}

impl fmt::Display for IndexInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexInt::Negative => write!(f, "-1"),
            IndexInt::Finite(value) => write!(f, "{value}"),
            IndexInt::Infinite => write!(f, "inf"),
        }
    }
}

/// A closed interval `[lower, upper]` of [`IndexInt`] values.
///
/// Index and length arguments of the string transfer functions are
/// intervals, since the analysis usually only knows bounds on them.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct IndexInterval {
    lower: IndexInt,
    upper: IndexInt,
}

impl IndexInterval {
    /// Construct a new interval. Both bounds are inclusive.
    pub fn new(lower: IndexInt, upper: IndexInt) -> IndexInterval {
        IndexInterval { lower, upper }
    }

    /// The interval containing exactly one finite value.
    pub fn constant(value: u64) -> IndexInterval {
        IndexInterval {
            lower: IndexInt::Finite(value),
            upper: IndexInt::Finite(value),
        }
    }

    /// The interval of all possible index values, including "not found".
    pub fn unknown() -> IndexInterval {
        IndexInterval {
            lower: IndexInt::Negative,
            upper: IndexInt::Infinite,
        }
    }

    /// The empty interval.
    pub fn empty() -> IndexInterval {
        IndexInterval {
            lower: IndexInt::Infinite,
            upper: IndexInt::ZERO,
        }
    }

    /// The inclusive lower bound.
    pub fn lower_bound(&self) -> IndexInt {
        self.lower
    }

    /// The inclusive upper bound.
    pub fn upper_bound(&self) -> IndexInt {
        self.upper
    }

    /// An interval is empty if its bounds are out of order.
    pub fn is_bottom(&self) -> bool {
        self.lower > self.upper
    }

    /// Whether the interval contains exactly one finite value.
    pub fn is_constant(&self) -> bool {
        self.lower == self.upper && matches!(self.lower, IndexInt::Finite(_))
    }

    /// Raise a `Negative` lower bound to zero. Index arguments of string
    /// operations are interpreted as non-negative positions.
    pub fn clamp_lower_to_zero(self) -> IndexInterval {
        IndexInterval {
            lower: cmp::max(self.lower, IndexInt::ZERO),
            upper: self.upper,
        }
    }

    /// The running shift of the brick slicing walks: after consuming a
    /// brick whose length lies in `[min_consumed, max_consumed]`, the
    /// remaining index interval is
    /// `[lower - max_consumed, upper - min_consumed]` with both bounds
    /// clamped at zero.
    pub fn shift_down(self, min_consumed: IndexInt, max_consumed: IndexInt) -> IndexInterval {
        IndexInterval {
            lower: self.lower.sub_clamped(max_consumed),
            upper: self.upper.sub_clamped(min_consumed),
        }
    }

    /// Shift both bounds up by a finite constant.
    pub fn add_constant(self, value: u64) -> IndexInterval {
        IndexInterval {
            lower: self.lower + IndexInt::Finite(value),
            upper: self.upper + IndexInt::Finite(value),
        }
    }
}

impl fmt::Display for IndexInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order() {
        assert!(IndexInt::Negative < IndexInt::ZERO);
        assert!(IndexInt::ZERO < IndexInt::Finite(5));
        assert!(IndexInt::Finite(5) < IndexInt::Infinite);
        assert!(IndexInt::Negative < IndexInt::Infinite);
        assert_eq!(
            cmp::max(IndexInt::Finite(3), IndexInt::Infinite),
            IndexInt::Infinite
        );
    }

    #[test]
    fn clamping_constructors() {
        assert_eq!(IndexInt::for_value(-7), IndexInt::Negative);
        assert_eq!(IndexInt::for_value(7), IndexInt::Finite(7));
        assert_eq!(IndexInt::for_non_negative(0), IndexInt::ZERO);
    }

    #[test]
    #[should_panic]
    fn non_negative_constructor_rejects_negative_input() {
        IndexInt::for_non_negative(-1);
    }

    #[test]
    fn saturating_arithmetic() {
        assert_eq!(
            IndexInt::Finite(2) + IndexInt::Finite(3),
            IndexInt::Finite(5)
        );
        assert_eq!(IndexInt::Finite(2) + IndexInt::Infinite, IndexInt::Infinite);
        assert_eq!(
            IndexInt::Finite(u64::MAX) + IndexInt::ONE,
            IndexInt::Infinite
        );
        assert_eq!(
            IndexInt::Finite(5) - IndexInt::Finite(2),
            IndexInt::Finite(3)
        );
        assert_eq!(IndexInt::Finite(2) - IndexInt::Finite(5), IndexInt::Negative);
        assert_eq!(IndexInt::Infinite - IndexInt::Finite(5), IndexInt::Infinite);
        assert_eq!(
            IndexInt::Finite(4) * IndexInt::Finite(3),
            IndexInt::Finite(12)
        );
        assert_eq!(IndexInt::Finite(4) * IndexInt::Infinite, IndexInt::Infinite);
    }

    #[test]
    #[should_panic]
    fn addition_rejects_negative_operands() {
        let _ = IndexInt::Negative + IndexInt::ONE;
    }

    #[test]
    #[should_panic]
    fn subtraction_rejects_unbounded_subtrahend() {
        let _ = IndexInt::Finite(5) - IndexInt::Infinite;
    }

    #[test]
    fn division_rules() {
        assert_eq!(IndexInt::Finite(7) / IndexInt::Finite(2), IndexInt::Finite(3));
        assert_eq!(IndexInt::Finite(7) / IndexInt::Infinite, IndexInt::ZERO);
        assert_eq!(IndexInt::Finite(7) / IndexInt::ZERO, IndexInt::Infinite);
        assert_eq!(IndexInt::Infinite / IndexInt::Finite(2), IndexInt::Infinite);
        assert_eq!(
            IndexInt::Finite(7).div_ceil(IndexInt::Finite(2)),
            IndexInt::Finite(4)
        );
    }

    #[test]
    fn conversions() {
        assert_eq!(IndexInt::Finite(9).try_to_u64().unwrap(), 9);
        assert!(IndexInt::Negative.try_to_u64().is_err());
        assert!(IndexInt::Infinite.try_to_usize().is_err());
    }

    #[test]
    fn summation() {
        let values = [IndexInt::Finite(1), IndexInt::Finite(2), IndexInt::Finite(3)];
        assert_eq!(values.into_iter().sum::<IndexInt>(), IndexInt::Finite(6));
        let with_infinity = [IndexInt::Finite(1), IndexInt::Infinite];
        assert_eq!(with_infinity.into_iter().sum::<IndexInt>(), IndexInt::Infinite);
    }

    #[test]
    fn interval_shifting() {
        let interval = IndexInterval::new(IndexInt::Finite(5), IndexInt::Finite(9));
        let shifted = interval.shift_down(IndexInt::Finite(2), IndexInt::Finite(7));
        assert_eq!(shifted.lower_bound(), IndexInt::ZERO);
        assert_eq!(shifted.upper_bound(), IndexInt::Finite(7));

        let unbounded = IndexInterval::new(IndexInt::ZERO, IndexInt::Infinite);
        let shifted = unbounded.shift_down(IndexInt::Finite(3), IndexInt::Finite(3));
        assert_eq!(shifted.upper_bound(), IndexInt::Infinite);
    }

    #[test]
    fn interval_classification() {
        assert!(IndexInterval::empty().is_bottom());
        assert!(IndexInterval::constant(4).is_constant());
        assert!(!IndexInterval::unknown().is_constant());
        assert_eq!(
            IndexInterval::unknown().clamp_lower_to_zero().lower_bound(),
            IndexInt::ZERO
        );
    }
}
