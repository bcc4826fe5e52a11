//! Traits and helper types shared by all string abstract domains.

use std::collections::BTreeSet;
use std::fmt;

use super::{AbstractDomain, HasBottom, HasTop};
use crate::index::IndexInterval;
use crate::prelude::*;

/// An abstract domain representing sets of strings.
pub trait StringDomain: AbstractDomain + HasTop + HasBottom {
    /// Create the abstraction of a known literal string.
    fn from_constant(value: &str) -> Self;

    /// Return the literal string if the element denotes exactly one value.
    fn try_to_constant(&self) -> Option<String>;

    /// An under-approximating check of the partial order of the domain.
    ///
    /// If `true` is returned, every string represented by `self` is also
    /// represented by `other`. A `false` result carries no information.
    fn is_less_or_equal(&self, other: &Self) -> bool;

    /// Return a lower bound (with respect to the partial order on the
    /// domain) for the two inputs `self` and `other`.
    #[must_use]
    fn intersect(&self, other: &Self) -> Self;
}

/// An argument of a string operation: either a known literal
/// (e.g. from constant folding in the caller) or an abstract value.
///
/// Transfer functions can use the literal for extra precision
/// without changing their signatures.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum WithConstants<D> {
    /// A known literal string.
    Constant(String),
    /// An abstract value.
    Abstraction(D),
}

impl<D: StringDomain> WithConstants<D> {
    /// Return the abstract value, abstracting a contained literal if necessary.
    pub fn to_abstract(&self) -> D {
        match self {
            WithConstants::Constant(value) => D::from_constant(value),
            WithConstants::Abstraction(domain) => domain.clone(),
        }
    }

    /// Return the literal string if one is known.
    pub fn try_to_constant(&self) -> Option<String> {
        match self {
            WithConstants::Constant(value) => Some(value.clone()),
            WithConstants::Abstraction(domain) => domain.try_to_constant(),
        }
    }

    /// Return the literal character if the argument denotes exactly one
    /// string of length one.
    pub fn try_to_char(&self) -> Option<char> {
        let value = self.try_to_constant()?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(character), None) => Some(character),
            _ => None,
        }
    }
}

/// The four-valued abstract boolean returned by string predicates
/// that cannot be refined further.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AbstractBool {
    /// The predicate was evaluated on an unreachable value.
    Bottom,
    /// The predicate is false for every represented string.
    False,
    /// The predicate is true for every represented string.
    True,
    /// The predicate may be true or false.
    Top,
}

/// The result of a string predicate such as `contains` or `equals`.
///
/// Besides the four boolean outcomes, a predicate may carry a
/// *refinement*: the abstract value the queried variable is known to
/// have on the branch where the predicate holds. The caller can use it
/// to sharpen the variable's abstraction after a conditional.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StringPredicate<V, D> {
    /// The predicate was evaluated on an unreachable value.
    Bottom,
    /// The predicate is false for every represented string.
    False,
    /// The predicate is true for every represented string.
    True,
    /// The predicate may be true or false.
    Top,
    /// The predicate may be true or false, but if it is true,
    /// `variable` is known to satisfy the abstraction `if_true`.
    Refinement {
        /// The program variable the refinement applies to.
        variable: V,
        /// The refined abstraction of the variable on the true branch.
        if_true: D,
    },
}

impl<V, D> From<AbstractBool> for StringPredicate<V, D> {
    fn from(value: AbstractBool) -> Self {
        match value {
            AbstractBool::Bottom => StringPredicate::Bottom,
            AbstractBool::False => StringPredicate::False,
            AbstractBool::True => StringPredicate::True,
            AbstractBool::Top => StringPredicate::Top,
        }
    }
}

/// An abstraction of a single character, as returned by `get_char_at`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum CharacterSet {
    /// Any character is possible.
    Top,
    /// The character is one of the contained values.
    Value(BTreeSet<char>),
}

impl CharacterSet {
    /// The set containing exactly one character.
    pub fn singleton(character: char) -> CharacterSet {
        CharacterSet::Value(BTreeSet::from([character]))
    }

    /// Compute the union of two character sets.
    pub fn union(self, other: CharacterSet) -> CharacterSet {
        match (self, other) {
            (CharacterSet::Top, _) | (_, CharacterSet::Top) => CharacterSet::Top,
            (CharacterSet::Value(mut left), CharacterSet::Value(right)) => {
                left.extend(right);
                CharacterSet::Value(left)
            }
        }
    }
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterSet::Top => write!(f, "Top"),
            CharacterSet::Value(characters) => write!(f, "{characters:?}"),
        }
    }
}

/// The transfer functions of the concrete string operations,
/// parameterized by the program variable type `V`.
///
/// Every operation is a pure function returning a new abstract value.
/// Index and length arguments are [`IndexInterval`]s, since the analysis
/// usually only knows bounds on them. Operations are free to return
/// coarser results (up to `Top`) when a precise computation is infeasible.
pub trait StringOperations<V: Clone + Eq>: StringDomain {
    /// The abstraction of the concatenation of `left` and `right`.
    fn concat(left: &WithConstants<Self>, right: &WithConstants<Self>) -> Self;

    /// The abstraction of inserting `other` into `self` at `index`.
    fn insert(&self, index: IndexInterval, other: &WithConstants<Self>) -> Self;

    /// The abstraction of the substring of length `length` starting at `index`.
    fn substring(&self, index: IndexInterval, length: IndexInterval) -> Self;

    /// The abstraction of removing `length` characters starting at `index`.
    fn remove(&self, index: IndexInterval, length: IndexInterval) -> Self;

    /// The abstraction of replacing every occurrence of `from` with `to`.
    fn replace(&self, from: &WithConstants<Self>, to: &WithConstants<Self>) -> Self;

    /// The abstraction of trimming the characters of `trimmed` from both ends.
    fn trim(&self, trimmed: &WithConstants<Self>) -> Self;

    /// The abstraction of trimming the characters of `trimmed` from the start.
    fn trim_start(&self, trimmed: &WithConstants<Self>) -> Self;

    /// The abstraction of trimming the characters of `trimmed` from the end.
    fn trim_end(&self, trimmed: &WithConstants<Self>) -> Self;

    /// The abstraction of left-padding to `length` characters with `fill`.
    fn pad_left(&self, length: IndexInterval, fill: &WithConstants<Self>) -> Self;

    /// The abstraction of right-padding to `length` characters with `fill`.
    fn pad_right(&self, length: IndexInterval, fill: &WithConstants<Self>) -> Self;

    /// Evaluate whether the represented strings are empty.
    fn is_empty(&self) -> AbstractBool;

    /// Evaluate whether the strings represented by `self` (held by
    /// `variable`) contain the strings represented by `needle`.
    fn contains(&self, variable: &V, needle: &WithConstants<Self>) -> StringPredicate<V, Self>;

    /// Evaluate whether the represented strings start with `needle`,
    /// compared by ordinal character values.
    fn starts_with(&self, variable: &V, needle: &WithConstants<Self>) -> StringPredicate<V, Self>;

    /// Evaluate whether the represented strings end with `needle`,
    /// compared by ordinal character values.
    fn ends_with(&self, variable: &V, needle: &WithConstants<Self>) -> StringPredicate<V, Self>;

    /// Evaluate whether the represented strings equal `other`.
    fn equals(&self, variable: &V, other: &WithConstants<Self>) -> StringPredicate<V, Self>;

    /// Bounds on the length of the represented strings.
    fn get_length(&self) -> IndexInterval;

    /// Bounds on the index of the first occurrence of `needle` at or after
    /// `offset`, searching at most `count` characters. A lower bound of
    /// `-1` represents "possibly not found".
    fn index_of(
        &self,
        needle: &WithConstants<Self>,
        offset: IndexInterval,
        count: IndexInterval,
    ) -> IndexInterval;

    /// The set of possible characters at position `index`.
    fn get_char_at(&self, index: IndexInterval) -> CharacterSet;

    /// The abstraction of overwriting the character at position `index`.
    fn set_char_at(&self, index: IndexInterval, character: &WithConstants<Self>) -> Self;
}
