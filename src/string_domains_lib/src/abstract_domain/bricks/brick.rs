//! This module contains the Brick structure.
//! The Brick structure represents the set of all strings that can be built
//! through concatenation of a bounded number of repetitions, each repetition
//! drawn independently from a set of literal alternatives.
//!
//! For instance, let \[{"mo", "de"}\]^{1,2} be a Brick. The following set of strings is
//! constructed through the aforementioned Brick:
//!    - {mo, de, momo, dede, mode, demo}

use std::cmp;
use std::collections::BTreeSet;
use std::fmt;

use crate::index::IndexInt;
use crate::prelude::*;
use itertools::Itertools;

/// The set of literal alternatives of a brick.
///
/// `AnyString` is the top of the value dimension and represents every
/// possible string.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum ValueSet {
    /// Any string is possible.
    AnyString,
    /// One of the contained literals.
    Literal(BTreeSet<String>),
}

impl ValueSet {
    /// Checks whether the set is unconstrained.
    pub fn is_any(&self) -> bool {
        matches!(self, ValueSet::AnyString)
    }

    /// Returns the literal alternatives, or `None` for an unconstrained set.
    pub fn literals(&self) -> Option<&BTreeSet<String>> {
        match self {
            ValueSet::AnyString => None,
            ValueSet::Literal(values) => Some(values),
        }
    }

    /// Returns the literal alternatives of a set the caller knows to be constrained.
    pub(crate) fn expect_literals(&self) -> &BTreeSet<String> {
        match self {
            ValueSet::AnyString => panic!("Unexpected unconstrained value set."),
            ValueSet::Literal(values) => values,
        }
    }

    /// Computes the union of two value sets. `AnyString` absorbs everything.
    pub fn union(&self, other: &ValueSet) -> ValueSet {
        match (self, other) {
            (ValueSet::AnyString, _) | (_, ValueSet::AnyString) => ValueSet::AnyString,
            (ValueSet::Literal(left), ValueSet::Literal(right)) => {
                ValueSet::Literal(left.union(right).cloned().collect())
            }
        }
    }

    /// Computes the intersection of two value sets. `AnyString` is neutral.
    pub fn intersection(&self, other: &ValueSet) -> ValueSet {
        match (self, other) {
            (ValueSet::AnyString, _) => other.clone(),
            (_, ValueSet::AnyString) => self.clone(),
            (ValueSet::Literal(left), ValueSet::Literal(right)) => {
                ValueSet::Literal(left.intersection(right).cloned().collect())
            }
        }
    }
}

/// A single Brick with its set of literal alternatives and the minimum and
/// maximum number of repetitions.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Brick {
    values: ValueSet,
    min: IndexInt,
    max: IndexInt,
}

impl Brick {
    /// Creates a brick from its raw parts.
    pub fn new(values: ValueSet, min: IndexInt, max: IndexInt) -> Self {
        Brick { values, min, max }
    }

    /// Creates the brick denoting exactly the given literal string.
    /// The empty string is represented by the empty brick with zero repetitions.
    pub fn from_literal(value: &str) -> Self {
        if value.is_empty() {
            Brick::empty_string()
        } else {
            Brick {
                values: ValueSet::Literal(BTreeSet::from([value.to_string()])),
                min: IndexInt::ONE,
                max: IndexInt::ONE,
            }
        }
    }

    /// Creates the brick denoting every possible string.
    pub fn top() -> Self {
        Brick {
            values: ValueSet::AnyString,
            min: IndexInt::ZERO,
            max: IndexInt::Infinite,
        }
    }

    /// Creates the brick denoting no string at all.
    pub fn bottom() -> Self {
        Brick {
            values: ValueSet::Literal(BTreeSet::new()),
            min: IndexInt::Infinite,
            max: IndexInt::ZERO,
        }
    }

    /// Creates the brick denoting exactly the empty string (Rule 1 shape).
    pub fn empty_string() -> Self {
        Brick {
            values: ValueSet::Literal(BTreeSet::new()),
            min: IndexInt::ZERO,
            max: IndexInt::ZERO,
        }
    }

    /// Returns a reference to the value set of the brick.
    pub fn values(&self) -> &ValueSet {
        &self.values
    }

    /// Returns the minimum number of repetitions.
    pub fn min(&self) -> IndexInt {
        self.min
    }

    /// Returns the maximum number of repetitions.
    pub fn max(&self) -> IndexInt {
        self.max
    }

    /// Checks whether the brick represents every possible string.
    pub fn is_top(&self) -> bool {
        self.values.is_any() && !self.is_bottom()
    }

    /// Checks whether the brick represents no string at all.
    /// This is the case if the bounds are out of order or if at least one
    /// repetition is required but no alternative exists to repeat.
    pub fn is_bottom(&self) -> bool {
        if self.min > self.max {
            return true;
        }
        match self.values.literals() {
            Some(values) => values.is_empty() && self.min > IndexInt::ZERO,
            None => false,
        }
    }

    /// Checks whether the brick represents only the empty string.
    pub fn must_be_empty(&self) -> bool {
        !self.is_bottom() && self.max_length().is_zero()
    }

    /// Checks whether the brick can represent the empty string.
    pub fn can_be_empty(&self) -> bool {
        !self.is_bottom() && self.min_length().is_zero()
    }

    /// The character length of the shortest literal alternative.
    pub(crate) fn shortest_value_length(&self) -> IndexInt {
        match self.values.literals() {
            None => IndexInt::ZERO,
            Some(values) => values
                .iter()
                .map(|value| IndexInt::Finite(char_len(value) as u64))
                .min()
                .unwrap_or(IndexInt::ZERO),
        }
    }

    /// The character length of the longest literal alternative.
    pub(crate) fn longest_value_length(&self) -> IndexInt {
        match self.values.literals() {
            None => IndexInt::Infinite,
            Some(values) => values
                .iter()
                .map(|value| IndexInt::Finite(char_len(value) as u64))
                .max()
                .unwrap_or(IndexInt::ZERO),
        }
    }

    /// A lower bound on the character length of the represented strings.
    pub fn min_length(&self) -> IndexInt {
        if self.shortest_value_length().is_zero() {
            return IndexInt::ZERO;
        }
        self.min * self.shortest_value_length()
    }

    /// An upper bound on the character length of the represented strings.
    pub fn max_length(&self) -> IndexInt {
        if self.longest_value_length().is_zero() {
            return IndexInt::ZERO;
        }
        self.max * self.longest_value_length()
    }

    /// Computes an upper bound of two bricks by taking the union of the
    /// value sets and the convex hull of the repetition bounds.
    pub fn join(&self, other: &Brick) -> Brick {
        Brick {
            values: self.values.union(&other.values),
            min: cmp::min(self.min, other.min),
            max: cmp::max(self.max, other.max),
        }
    }

    /// Computes a lower bound of two bricks.
    ///
    /// The exact intersection of value sets and repetition bounds is only
    /// sound if no string of one brick can start inside a repetition of the
    /// other. This holds if the bricks cannot positionally overlap or if all
    /// alternatives share a single fixed length. In every other case the left
    /// operand is returned unchanged, which over-approximates the
    /// intersection.
    pub fn meet(&self, other: &Brick) -> Brick {
        if self.is_bottom() || other.is_bottom() {
            return Brick::bottom();
        }
        if self.is_top() {
            return other.clone();
        }
        if other.is_top() || self == other {
            return self.clone();
        }
        if !self.can_overlap(other) || self.has_single_value_length_with(other) {
            let result = Brick {
                values: self.values.intersection(&other.values),
                min: cmp::max(self.min, other.min),
                max: cmp::min(self.max, other.max),
            };
            if result.is_bottom() {
                return Brick::bottom();
            }
            return result;
        }

        self.clone()
    }

    /// An under-approximating check whether every string of `self` is also a
    /// string of `other`. A `false` result carries no information.
    pub fn less_than_equal(&self, other: &Brick) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_top() {
            return true;
        }
        if other.is_bottom() || self.is_top() {
            return false;
        }
        if self.must_be_empty() && other.can_be_empty() {
            return true;
        }
        let left = self.values.expect_literals();
        let right = other.values.expect_literals();
        left.is_subset(right) && self.min >= other.min && self.max <= other.max
    }

    /// Checks whether a string of one brick can start inside or across a
    /// repetition boundary of the other.
    ///
    /// Returns `true` whenever either brick can be empty or is unconstrained.
    /// Otherwise every pair of literal alternatives is checked for a
    /// substring or suffix-prefix overlap in linear time.
    pub fn can_overlap(&self, other: &Brick) -> bool {
        if self.can_be_empty() || other.can_be_empty() {
            return true;
        }
        if self.values.is_any() || other.values.is_any() {
            return true;
        }
        for left in self.values.expect_literals() {
            for right in other.values.expect_literals() {
                if strings_overlap(left, right) {
                    return true;
                }
            }
        }
        false
    }

    fn has_single_value_length_with(&self, other: &Brick) -> bool {
        let mut lengths = self
            .values
            .literals()
            .into_iter()
            .chain(other.values.literals())
            .flatten()
            .map(|value| char_len(value));
        match lengths.next() {
            None => true,
            Some(first) => lengths.all(|length| length == first),
        }
    }

    /// Returns the unique literal string the brick denotes, if any.
    pub fn to_constant(&self) -> Option<String> {
        if self.min != self.max {
            return None;
        }
        let repeats = self.min.try_to_usize().ok()?;
        if repeats == 0 {
            return Some(String::new());
        }
        let values = self.values.literals()?;
        if values.len() != 1 {
            return None;
        }
        Some(values.first().unwrap().repeat(repeats))
    }

    /// The longest prefix shared by all represented strings.
    pub fn to_prefix(&self) -> String {
        if self.min < IndexInt::ONE {
            return String::new();
        }
        match self.values.literals() {
            None => String::new(),
            Some(values) => values
                .iter()
                .skip(1)
                .fold(values.first().cloned().unwrap_or_default(), |prefix, value| {
                    common_prefix(&prefix, value)
                }),
        }
    }

    /// The longest suffix shared by all represented strings.
    pub fn to_suffix(&self) -> String {
        if self.min < IndexInt::ONE {
            return String::new();
        }
        match self.values.literals() {
            None => String::new(),
            Some(values) => values
                .iter()
                .skip(1)
                .fold(values.first().cloned().unwrap_or_default(), |suffix, value| {
                    common_suffix(&suffix, value)
                }),
        }
    }

    /// Replaces every occurrence of a character in all literal alternatives.
    pub fn replace(&self, from: char, to: char) -> Brick {
        match self.values.literals() {
            None => self.clone(),
            Some(values) => Brick {
                values: ValueSet::Literal(
                    values
                        .iter()
                        .map(|value| value.replace(from, &to.to_string()))
                        .collect(),
                ),
                min: self.min,
                max: self.max,
            },
        }
    }

    /// **merge** bricks with the same indices max = 1, min = 1, in a new single brick
    /// with the new string set being the concatenation of the former two. e.g. B0 = \[{a,cd}\]^{1,1}
    /// and B1 = \[{b,ef}\]^{1,1} become B_new = \[{ab, aef, cdb, cdef}\]^{1,1}.
    pub fn merge_bricks_with_bound_one(&self, other: &Brick) -> Self {
        let values: BTreeSet<String> = self
            .values
            .expect_literals()
            .iter()
            .cartesian_product(other.values.expect_literals().iter())
            .map(|(left, right)| left.clone() + right)
            .collect();

        Brick {
            values: ValueSet::Literal(values),
            min: IndexInt::ONE,
            max: IndexInt::ONE,
        }
    }

    /// **transform** a brick in which the number of applications is constant (min = max) into one in which
    /// min = max = 1. e.g. B = \[{a,b}\]^{2,2} => B_new = \[{aa, ab, ba, bb}\]^{1,1}.
    pub fn transform_brick_with_min_max_equal(&self, repeats: u64) -> Self {
        let values =
            Self::generate_permutations_of_fixed_length(repeats, self.values.expect_literals());
        Brick {
            values: ValueSet::Literal(values),
            min: IndexInt::ONE,
            max: IndexInt::ONE,
        }
    }

    /// **merge** two bricks in which the set of strings is the same. e.g. B1 = \[S\]^{m1, M1}
    /// and B2 = \[S\]^{m2, M2} => B_new = \[S\]^{m1+m2, M1+M2}
    pub fn merge_bricks_with_equal_content(&self, other: &Brick) -> Self {
        Brick {
            values: self.values.clone(),
            min: self.min + other.min,
            max: self.max + other.max,
        }
    }

    /// **break** a single brick with min >= 1 and max != min into two simpler bricks where B = \[S\]^{min,max} =>
    /// B1 = \[S^min\]^{1,1}, B2 = \[S\]^{0, max-min}.
    /// e.g. B = \[{a}\]^{2,5} => B1 = \[{aa}\]^{1,1}, B2 = \[{a}\]^{0,3}
    ///
    /// Both bounds must be finite.
    pub fn break_single_brick_into_simpler_bricks(&self) -> (Self, Self) {
        let repeats = self
            .min
            .try_to_u64()
            .unwrap_or_else(|_| panic!("Unexpected unbounded repetition count."));
        let brick_1 = self.transform_brick_with_min_max_equal(repeats);
        let brick_2 = Brick {
            values: self.values.clone(),
            min: IndexInt::ZERO,
            max: self.max - self.min,
        };

        (brick_1, brick_2)
    }

    /// Generates all concatenations of a fixed number of repetitions.
    /// For instance, \[{a,b}\] with repeats = 2 becomes \[{aa, ab, ba, bb}\].
    pub fn generate_permutations_of_fixed_length(
        repeats: u64,
        values: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let mut generated = BTreeSet::from([String::new()]);
        for _ in 0..repeats {
            generated = generated
                .iter()
                .cartesian_product(values.iter())
                .map(|(prefix, value)| prefix.clone() + value)
                .collect();
        }
        generated
    }
}

impl fmt::Display for Brick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values.literals() {
            None => write!(f, "[T]^({},{})", self.min, self.max),
            Some(values) => write!(f, "{:?}^({},{})", values, self.min, self.max),
        }
    }
}

/// The number of characters in a string.
pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Splits a string at a character index.
pub(crate) fn char_split(value: &str, index: usize) -> (&str, &str) {
    let byte_index = value
        .char_indices()
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(value.len());
    value.split_at(byte_index)
}

fn common_prefix(left: &str, right: &str) -> String {
    left.chars()
        .zip(right.chars())
        .take_while(|(first, second)| first == second)
        .map(|(character, _)| character)
        .collect()
}

fn common_suffix(left: &str, right: &str) -> String {
    let suffix: Vec<char> = left
        .chars()
        .rev()
        .zip(right.chars().rev())
        .take_while(|(first, second)| first == second)
        .map(|(character, _)| character)
        .collect();
    suffix.into_iter().rev().collect()
}

/// Checks whether `pattern` occurs somewhere in `text` or whether a suffix
/// of `text` is a prefix of `pattern`, using the failure function of the
/// Knuth-Morris-Pratt algorithm. Checking in both directions decides whether
/// two strings can overlap at all.
fn scan_overlap(text: &[u8], pattern: &[u8]) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let failure = failure_function(pattern);
    let mut state = 0;
    for &byte in text {
        while state > 0 && pattern[state] != byte {
            state = failure[state - 1];
        }
        if pattern[state] == byte {
            state += 1;
        }
        if state == pattern.len() {
            return true;
        }
    }
    state > 0
}

fn failure_function(pattern: &[u8]) -> Vec<usize> {
    let mut failure = vec![0; pattern.len()];
    let mut state = 0;
    for index in 1..pattern.len() {
        while state > 0 && pattern[index] != pattern[state] {
            state = failure[state - 1];
        }
        if pattern[index] == pattern[state] {
            state += 1;
        }
        failure[index] = state;
    }
    failure
}

pub(crate) fn strings_overlap(left: &str, right: &str) -> bool {
    scan_overlap(left.as_bytes(), right.as_bytes())
        || scan_overlap(right.as_bytes(), left.as_bytes())
}
