//! This module contains the brick sequence domain for strings.
//!
//! The [`BricksDomain`] contains an ordered list of [`Brick`] values.
//! It represents the composition of a string through sub sequences.
//! When a literal string is abstracted, it is defined as a single brick
//! which occurs at least and at most one time.
//! e.g. "foo" => \[\[{"foo"}\]^{1,1}\]
//!
//! If two strings are concatenated, their brick sequences are concatenated.
//! e.g. B1 = \[\[{"a"}\]^{1,1}\], B2 = \[\[{"b"}\]^{1,1}\] => B_new = \[\[{"a"}\]^{1,1}, \[{"b"}\]^{1,1}\]
//!
//! A set of strings can be built from multiple configurations of bricks
//! e.g. \[{"abc"}\]^{1,1} <=> \[{"a"}\]^{1,1}\[{"b"}\]^{1,1}\[{"c"}\]^{1,1},
//! so the sequence is rewritten into a normalized form after every
//! structurally significant operation. Normalization, padding and widening
//! are delegated to a pluggable [`BricksPolicy`]; the zero-sized
//! [`StandardPolicy`] implements the threshold-based variant and is the
//! default.

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;

use super::{AbstractDomain, HasBottom, HasTop, StringDomain};
use crate::index::IndexInt;
use crate::prelude::*;

mod brick;
pub use brick::{Brick, ValueSet};

mod policy;
pub use policy::{
    BricksPolicy, NormalizationSite, StandardPolicy, EXPANSION_THRESHOLD, INTERVAL_THRESHOLD,
    LENGTH_THRESHOLD, SEQUENCE_THRESHOLD,
};

mod operations;

/// An ordered sequence of bricks representing one abstracted string,
/// namely the concatenation, in order, of the sets denoted by each brick.
/// The empty sequence denotes exactly the empty string.
///
/// The policy type parameter selects the normalization and widening
/// strategy without being part of the runtime representation.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BricksDomain<P: BricksPolicy = StandardPolicy> {
    bricks: Vec<Brick>,
    #[serde(skip)]
    _policy: PhantomData<P>,
}

impl<P: BricksPolicy> BricksDomain<P> {
    /// Creates a sequence domain from a list of bricks and normalizes it.
    pub fn from_bricks(bricks: Vec<Brick>) -> Self {
        Self::from_raw(P::normalize(bricks, NormalizationSite::Conversion))
    }

    /// Creates a sequence domain from an already normalized list of bricks.
    pub(crate) fn from_raw(bricks: Vec<Brick>) -> Self {
        BricksDomain {
            bricks,
            _policy: PhantomData,
        }
    }

    /// Returns the brick sequence.
    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    /// The domain element representing every possible string.
    pub fn top_value() -> Self {
        Self::from_raw(vec![Brick::top()])
    }

    /// The domain element representing no string at all.
    pub fn bottom_value() -> Self {
        Self::from_raw(vec![Brick::bottom()])
    }

    /// The widen function of the sequence domain, used by fixpoint engines
    /// in place of [`AbstractDomain::merge`] once iteration has to be forced
    /// to converge. Delegated to the policy.
    pub fn widen(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let widened = P::widen(&self.bricks, &other.bricks);
        Self::from_raw(P::normalize(widened, NormalizationSite::Join))
    }

    /// Pads the shorter of the two sequences via the policy, then combines
    /// the bricks pairwise.
    fn zip_with(&self, other: &Self, combine: impl Fn(&Brick, &Brick) -> Brick) -> Vec<Brick> {
        let mut left = self.bricks.clone();
        let mut right = other.bricks.clone();
        if left.len() < right.len() {
            left = P::extend(&left, &right);
        } else if right.len() < left.len() {
            right = P::extend(&right, &left);
        }
        left.iter()
            .zip(right.iter())
            .map(|(left_brick, right_brick)| combine(left_brick, right_brick))
            .collect()
    }

    /// Decides whether the front brick of a sequence acts as a whole brick
    /// at the current position of the meet walk: no string of the opposing
    /// front brick can extend past it into its successor.
    fn front_is_whole(sequence: &VecDeque<Brick>, opposing_front: &Brick) -> bool {
        match sequence.get(1) {
            None => true,
            Some(successor) => !successor.can_overlap(opposing_front),
        }
    }

    /// Strips the literal off the front of every alternative of `composite`.
    ///
    /// Applicable only if `composite` is a single-repetition literal brick.
    /// The outer `None` means the derivation fails because some alternative
    /// does not start with the literal. The inner `None` means every
    /// alternative is consumed completely by the literal.
    fn derive_remainder(literal: &str, composite: &Brick) -> Option<Option<Brick>> {
        if composite.min() != IndexInt::ONE || composite.max() != IndexInt::ONE {
            return None;
        }
        let values = composite.values().literals()?;
        let mut remainders = std::collections::BTreeSet::new();
        for value in values {
            remainders.insert(value.strip_prefix(literal)?.to_string());
        }
        if remainders.iter().all(|remainder| remainder.is_empty()) {
            Some(None)
        } else {
            Some(Some(Brick::new(
                ValueSet::Literal(remainders),
                IndexInt::ONE,
                IndexInt::ONE,
            )))
        }
    }

    /// Returns the exact single literal of a single-repetition brick, if any.
    fn to_single_literal(brick: &Brick) -> Option<&String> {
        if brick.min() != IndexInt::ONE || brick.max() != IndexInt::ONE {
            return None;
        }
        let values = brick.values().literals()?;
        if values.len() == 1 {
            values.first()
        } else {
            None
        }
    }
}

impl<P: BricksPolicy> fmt::Display for BricksDomain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bricks: ")?;
        for brick in self.bricks.iter() {
            write!(f, "{brick} ")?;
        }

        Ok(())
    }
}

impl<P: BricksPolicy> From<String> for BricksDomain<P> {
    /// Returns the abstraction of a known literal string.
    fn from(string: String) -> Self {
        if string.is_empty() {
            Self::from_raw(Vec::new())
        } else {
            Self::from_raw(vec![Brick::from_literal(&string)])
        }
    }
}

impl<P: BricksPolicy> AbstractDomain for BricksDomain<P> {
    /// Takes care of merging two brick sequences by padding the shorter one
    /// and joining the bricks pairwise.
    fn merge(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_top() {
            other.clone()
        } else if other.is_bottom() || self.is_top() {
            self.clone()
        } else if self == other {
            self.clone()
        } else {
            let joined = self.zip_with(other, Brick::join);
            Self::from_raw(P::normalize(joined, NormalizationSite::Join))
        }
    }

    /// Check whether the sequence represents every possible string.
    fn is_top(&self) -> bool {
        !self.bricks.is_empty() && self.bricks.iter().all(|brick| brick.is_top())
    }
}

impl<P: BricksPolicy> HasTop for BricksDomain<P> {
    /// Return the *Top* value of the domain.
    fn top(&self) -> Self {
        Self::top_value()
    }
}

impl<P: BricksPolicy> HasBottom for BricksDomain<P> {
    /// Return the *Bottom* value of the domain.
    fn bottom(&self) -> Self {
        Self::bottom_value()
    }

    /// A sequence is *Bottom* if any of its bricks is. One impossible block
    /// makes the whole sequence impossible.
    fn is_bottom(&self) -> bool {
        self.bricks.iter().any(|brick| brick.is_bottom())
    }
}

impl<P: BricksPolicy> StringDomain for BricksDomain<P> {
    fn from_constant(value: &str) -> Self {
        Self::from(value.to_string())
    }

    /// Returns the literal string if the sequence denotes exactly one value.
    fn try_to_constant(&self) -> Option<String> {
        if self.is_bottom() {
            return None;
        }
        let mut constant = String::new();
        for brick in self.bricks.iter() {
            constant.push_str(&brick.to_constant()?);
        }
        Some(constant)
    }

    /// An under-approximating check of the partial order: a cursor walk
    /// requiring every brick of `self` to be covered by a brick of `other`.
    /// A *Top* brick of `other` swallows any number of bricks of `self`.
    fn is_less_or_equal(&self, other: &Self) -> bool {
        if self.is_bottom() || other.is_top() {
            return true;
        }
        if other.is_bottom() || self.is_top() {
            return false;
        }
        if self == other {
            return true;
        }

        let mut self_cursor = 0;
        let mut other_cursor = 0;
        while self_cursor < self.bricks.len() && other_cursor < other.bricks.len() {
            let other_brick = &other.bricks[other_cursor];
            if other_brick.is_top() {
                self_cursor += 1;
            } else if self.bricks[self_cursor].less_than_equal(other_brick) {
                self_cursor += 1;
                other_cursor += 1;
            } else {
                return false;
            }
        }
        self.bricks[self_cursor..]
            .iter()
            .all(|brick| brick.must_be_empty())
            && other.bricks[other_cursor..]
                .iter()
                .all(|brick| brick.can_be_empty())
    }

    /// Computes a lower bound of two sequences with a two-cursor walk.
    ///
    /// Front bricks that are whole at the current position are met directly.
    /// If one front brick is partially covered by an exact single literal on
    /// the other side, the literal is stripped off as a common prefix and the
    /// walk continues on the remainder. In every other case the remainder of
    /// the left operand is copied unchanged, which over-approximates the
    /// intersection by ignoring the right remainder entirely.
    fn intersect(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom_value();
        }
        if self.is_top() {
            return other.clone();
        }
        if other.is_top() || self == other {
            return self.clone();
        }

        let mut left: VecDeque<Brick> = self.bricks.iter().cloned().collect();
        let mut right: VecDeque<Brick> = other.bricks.iter().cloned().collect();
        let mut result: Vec<Brick> = Vec::new();
        let mut gave_up = false;

        loop {
            let (left_front, right_front) = match (left.front(), right.front()) {
                (Some(left_front), Some(right_front)) => {
                    (left_front.clone(), right_front.clone())
                }
                _ => break,
            };
            let left_whole = Self::front_is_whole(&left, &right_front);
            let right_whole = Self::front_is_whole(&right, &left_front);

            if left_whole && right_whole {
                let met = left_front.meet(&right_front);
                if met.is_bottom() {
                    return Self::bottom_value();
                }
                result.push(met);
                left.pop_front();
                right.pop_front();
                continue;
            }

            if let Some(literal) = Self::to_single_literal(&right_front) {
                if let Some(remainder) = Self::derive_remainder(literal, &left_front) {
                    result.push(right_front.clone());
                    right.pop_front();
                    left.pop_front();
                    if let Some(remainder) = remainder {
                        left.push_front(remainder);
                    }
                    continue;
                }
            }
            if let Some(literal) = Self::to_single_literal(&left_front) {
                if let Some(remainder) = Self::derive_remainder(literal, &right_front) {
                    result.push(left_front.clone());
                    left.pop_front();
                    right.pop_front();
                    if let Some(remainder) = remainder {
                        right.push_front(remainder);
                    }
                    continue;
                }
            }

            // No simple case applies. The walk stops and keeps the left
            // remainder as an over-approximation of the intersection.
            gave_up = true;
            break;
        }

        // If the left sequence ended while the right one still requires
        // content, the intersection is empty. The mirrored case, the right
        // sequence ending with mandatory left bricks remaining, is not
        // refuted: the left remainder is kept as an over-approximation.
        if !gave_up && left.is_empty() && !right.iter().all(|brick| brick.can_be_empty()) {
            return Self::bottom_value();
        }

        result.extend(left);

        Self::from_raw(P::normalize(result, NormalizationSite::Join))
    }
}

#[cfg(test)]
mod tests;
