//! This module contains the abstract domains for string analysis
//! together with the traits that characterize them.
//!
//! Each abstract domain represents a set of possible string values.
//! The centerpiece is the [`BricksDomain`], which tracks strings as an
//! ordered sequence of [`Brick`] building blocks.

mod bricks;
pub use bricks::*;

mod strings;
pub use strings::*;

/// The main trait describing an abstract domain.
///
/// Each abstract domain is partially ordered and has a maximal element (`Top`)
/// that can be generated with [`HasTop::top`].
pub trait AbstractDomain: Sized + Eq + Clone {
    /// Return an upper bound (with respect to the partial order on the domain)
    /// for the two inputs `self` and `other`.
    #[must_use]
    fn merge(&self, other: &Self) -> Self;

    /// Return an upper bound (with respect to the partial order on the domain)
    /// for the two inputs `self` and `other`.
    ///
    /// Modifies `self` in-place to become the upper bound.
    fn merge_with(&mut self, other: &Self) -> &mut Self {
        if self != other {
            let new_value = self.merge(other);
            *self = new_value;
        }
        self
    }

    /// Returns whether the element represents the top element (i.e. maximal
    /// with respect to the partial order) or not.
    fn is_top(&self) -> bool;
}

/// A trait for abstract domains that can generate their `Top` element.
///
/// The `Top` element represents maximal uncertainty, i.e. every possible
/// value of the domain.
pub trait HasTop {
    /// Generate a `Top` element with the same structural parameters as `self`.
    #[must_use]
    fn top(&self) -> Self;
}

/// A trait for abstract domains with a least element (`Bottom`).
///
/// The `Bottom` element represents the empty set of values,
/// i.e. unreachable code or a contradiction.
pub trait HasBottom {
    /// Generate the `Bottom` element of the domain.
    #[must_use]
    fn bottom(&self) -> Self;

    /// Returns whether the element is the `Bottom` element of the domain.
    fn is_bottom(&self) -> bool;
}
