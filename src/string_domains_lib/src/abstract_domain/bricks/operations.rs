//! This module implements the transfer functions of the concrete string
//! operations over the brick sequence domain.
//!
//! The central algorithm is index-interval-driven slicing: [`before`] and
//! [`after`] walk a brick sequence left to right while shifting a running
//! index interval by the length bounds of every processed brick, splitting
//! bricks whose boundaries do not align with the requested cut. Substring,
//! removal, insertion and character access are all expressed through these
//! two walks. The predicate operations reduce containment, prefix and
//! suffix queries to an emptiness test of the intersection with a template
//! sequence built around the needle.

use std::cmp;
use std::collections::BTreeSet;

use super::brick::{char_len, char_split};
use super::{Brick, BricksDomain, BricksPolicy, NormalizationSite, ValueSet};
use crate::abstract_domain::{
    AbstractBool, CharacterSet, HasBottom, StringDomain, StringOperations, StringPredicate,
    WithConstants,
};
use crate::index::{IndexInt, IndexInterval};

/// An over-approximation of the prefixes whose character length lies in the
/// given interval, taken from strings in the brick sequence.
fn before(bricks: &[Brick], interval: IndexInterval) -> Vec<Brick> {
    let mut interval = interval.clamp_lower_to_zero();
    if interval.is_bottom() {
        return vec![Brick::top()];
    }
    let mut result = Vec::new();
    for brick in bricks {
        if interval.upper_bound().is_zero() {
            break;
        }
        interval = add_brick_before(brick, interval, &mut result);
    }
    result
}

/// An over-approximation of the suffixes starting at a character index in
/// the given interval, taken from strings in the brick sequence.
fn after(bricks: &[Brick], interval: IndexInterval) -> Vec<Brick> {
    let mut interval = interval.clamp_lower_to_zero();
    if interval.is_bottom() {
        return vec![Brick::top()];
    }
    let mut result = Vec::new();
    for (position, brick) in bricks.iter().enumerate() {
        if interval.upper_bound().is_zero() {
            // The cut has certainly happened, the rest stays unchanged.
            result.extend(bricks[position..].iter().cloned());
            break;
        }
        interval = add_brick_after(brick, interval, &mut result);
    }
    result
}

/// Adds the part of a brick that may lie in front of the cut interval to the
/// result and returns the interval shifted by the consumed length.
fn add_brick_before(brick: &Brick, interval: IndexInterval, result: &mut Vec<Brick>) -> IndexInterval {
    let lower = interval.lower_bound();
    let upper = interval.upper_bound();

    // The whole brick lies in front of the cut.
    if brick.max_length() <= lower {
        result.push(brick.clone());
        return interval.shift_down(brick.min_length(), brick.max_length());
    }
    // An unconstrained brick consumes an unknown amount of the interval.
    if brick.values().is_any() {
        result.push(Brick::top());
        return IndexInterval::new(IndexInt::ZERO, upper);
    }

    let shortest = brick.shortest_value_length();
    let longest = brick.longest_value_length();

    // The cut lies beyond at least one full repetition. Split those off as
    // one brick and descend into the remainder with shifted indices. The
    // split repetitions are only guaranteed up to the brick's own minimum.
    // With values of mixed length only the minimum repetition count is
    // certainly consumed, so the remainder and the shifted interval have to
    // account for anything between `whole_min` and `whole_max` repetitions.
    if !shortest.is_zero() && lower > shortest {
        let whole_max = cmp::min(lower / shortest, brick.max());
        let whole_min = cmp::min(lower / longest, cmp::min(brick.min(), whole_max));
        result.push(Brick::new(brick.values().clone(), whole_min, whole_max));
        let (remainder_max, shifted) = if shortest == longest {
            (
                brick.max() - whole_max,
                interval.shift_down(whole_max * shortest, whole_max * longest),
            )
        } else {
            (
                brick.max() - whole_min,
                interval.shift_down(whole_min * shortest, whole_max * longest),
            )
        };
        let remainder = Brick::new(
            brick.values().clone(),
            brick.min().sub_clamped(whole_max),
            remainder_max,
        );
        return add_brick_before(&remainder, shifted, result);
    }

    // The cut falls inside the first repetition. The repetitions possibly
    // completed before the cut form one brick, the partially consumed
    // repetition contributes its possible prefixes as a second brick. When
    // whole repetitions may precede the partial one, the cut within it can
    // fall anywhere, so the prefix enumeration starts at zero.
    let values = brick.values().expect_literals();
    let repeats = repeat_count_after(brick.max(), shortest, upper);
    if !repeats.is_zero() {
        result.push(Brick::new(brick.values().clone(), IndexInt::ZERO, repeats));
    }
    let cut_lower = if repeats.is_zero() { lower } else { IndexInt::ZERO };
    let prefixes = prefix_alternatives(values, cut_lower, upper);
    if !prefixes.is_empty() {
        let guaranteed =
            brick.min() >= IndexInt::ONE && lower > IndexInt::ZERO && repeats.is_zero();
        let min = if guaranteed { IndexInt::ONE } else { IndexInt::ZERO };
        result.push(Brick::new(ValueSet::Literal(prefixes), min, IndexInt::ONE));
    }

    interval.shift_down(brick.min_length(), brick.max_length())
}

/// Adds the part of a brick that may lie behind the cut interval to the
/// result and returns the interval shifted by the consumed length.
fn add_brick_after(brick: &Brick, interval: IndexInterval, result: &mut Vec<Brick>) -> IndexInterval {
    let lower = interval.lower_bound();
    let upper = interval.upper_bound();

    // The whole brick lies in front of the cut and is dropped.
    if brick.max_length() <= lower {
        return interval.shift_down(brick.min_length(), brick.max_length());
    }
    // An unconstrained brick consumes an unknown amount of the interval.
    if brick.values().is_any() {
        result.push(Brick::top());
        return IndexInterval::new(IndexInt::ZERO, upper);
    }

    let shortest = brick.shortest_value_length();
    let longest = brick.longest_value_length();

    // The cut lies beyond at least one full repetition. Drop those and
    // descend into the remainder with shifted indices. As in
    // [`add_brick_before`], mixed value lengths only certainly consume the
    // minimum repetition count.
    if !shortest.is_zero() && lower > shortest {
        let whole_max = cmp::min(lower / shortest, brick.max());
        let whole_min = cmp::min(lower / longest, cmp::min(brick.min(), whole_max));
        let (remainder_max, shifted) = if shortest == longest {
            (
                brick.max() - whole_max,
                interval.shift_down(whole_max * shortest, whole_max * longest),
            )
        } else {
            (
                brick.max() - whole_min,
                interval.shift_down(whole_min * shortest, whole_max * longest),
            )
        };
        let remainder = Brick::new(
            brick.values().clone(),
            brick.min().sub_clamped(whole_max),
            remainder_max,
        );
        return add_brick_after(&remainder, shifted, result);
    }

    // The cut falls inside the first repetition. The partially consumed
    // repetition contributes its possible suffixes as one brick, followed by
    // the repetitions possibly left untouched behind the cut. When whole
    // repetitions may precede the partial one, the cut within it can fall
    // anywhere, so the suffix enumeration starts at zero.
    let values = brick.values().expect_literals();
    let whole_repeats = repeat_count_after(brick.max(), shortest, upper);
    let cut_lower = if whole_repeats.is_zero() { lower } else { IndexInt::ZERO };
    let suffixes = suffix_alternatives(values, cut_lower, upper);
    if !suffixes.is_empty() {
        let guaranteed =
            brick.min() >= IndexInt::ONE && upper < shortest && whole_repeats.is_zero();
        let min = if guaranteed { IndexInt::ONE } else { IndexInt::ZERO };
        result.push(Brick::new(ValueSet::Literal(suffixes), min, IndexInt::ONE));
    }
    let consumed = whole_repeats + IndexInt::ONE;
    let kept = Brick::new(
        brick.values().clone(),
        brick.min().sub_clamped(consumed),
        brick.max().sub_clamped(IndexInt::ONE),
    );
    if !kept.max().is_zero() {
        result.push(kept);
    }

    interval.shift_down(brick.min_length(), brick.max_length())
}

/// The number of full repetitions that can still lie in front of a cut at
/// `max_index`, not counting the repetition the cut falls into.
fn repeat_count_after(max_repeats: IndexInt, min_len: IndexInt, max_index: IndexInt) -> IndexInt {
    if min_len.is_zero() || max_index.is_infinite() {
        max_repeats.sub_clamped(IndexInt::ONE)
    } else {
        cmp::min(max_repeats, max_index.div_ceil(min_len)).sub_clamped(IndexInt::ONE)
    }
}

/// All prefixes of the literal alternatives whose character length lies in
/// `[lower, upper]`, capped at the length of each alternative.
fn prefix_alternatives(
    values: &BTreeSet<String>,
    lower: IndexInt,
    upper: IndexInt,
) -> BTreeSet<String> {
    let mut prefixes = BTreeSet::new();
    for value in values {
        let length = char_len(value);
        let from = cmp::min(lower.try_to_usize().unwrap_or(0), length);
        let to = cmp::min(upper.try_to_usize().unwrap_or(length), length);
        for cut in from..=to {
            if cut == 0 {
                continue;
            }
            prefixes.insert(char_split(value, cut).0.to_string());
        }
    }
    prefixes
}

/// All suffixes of the literal alternatives starting at a character index in
/// `[lower, upper]`, capped at the length of each alternative.
fn suffix_alternatives(
    values: &BTreeSet<String>,
    lower: IndexInt,
    upper: IndexInt,
) -> BTreeSet<String> {
    let mut suffixes = BTreeSet::new();
    for value in values {
        let length = char_len(value);
        let from = cmp::min(lower.try_to_usize().unwrap_or(0), length);
        let to = cmp::min(upper.try_to_usize().unwrap_or(length), length);
        for cut in from..=to {
            if cut == length {
                continue;
            }
            suffixes.insert(char_split(value, cut).1.to_string());
        }
    }
    suffixes
}

/// The phases of the trimming walk over a brick sequence.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum TrimPhase {
    /// Every character so far was a trimmed character.
    Trimming,
    /// Trimming may or may not have concluded.
    MaybeTrimming,
    /// Trimming has certainly concluded.
    Done,
}

/// The trimming walk shared by start- and end-trimming. End-trimming walks
/// the reversed sequence with suffix trimming and reverses the result.
fn trim_bricks(bricks: &[Brick], trim: &BTreeSet<char>, from_end: bool) -> Vec<Brick> {
    let is_trim_char = |character: char| trim.contains(&character);
    let trim_value = |value: &String| -> String {
        if from_end {
            value.trim_end_matches(is_trim_char).to_string()
        } else {
            value.trim_start_matches(is_trim_char).to_string()
        }
    };

    let ordered: Vec<&Brick> = if from_end {
        bricks.iter().rev().collect()
    } else {
        bricks.iter().collect()
    };

    let mut result: Vec<Brick> = Vec::new();
    let mut phase = TrimPhase::Trimming;
    for brick in ordered {
        if phase == TrimPhase::Done {
            result.push(brick.clone());
            continue;
        }
        // Empty bricks contribute nothing and pass the phase through.
        if brick.must_be_empty() {
            continue;
        }
        let values = match brick.values().literals() {
            None => {
                result.push(brick.clone());
                phase = TrimPhase::MaybeTrimming;
                continue;
            }
            Some(values) => values,
        };
        let trimmed: BTreeSet<String> = values.iter().map(trim_value).collect();
        let fully_trimmed = trimmed.iter().all(|value| value.is_empty());
        let may_continue =
            trimmed.iter().any(|value| value.is_empty()) || brick.can_be_empty();

        match phase {
            TrimPhase::Trimming => {
                if fully_trimmed {
                    // Every repetition trims away completely.
                    continue;
                }
                if brick.min() >= IndexInt::ONE && !may_continue {
                    // Exactly the first repetition is trimmed, the rest
                    // stays as it is.
                    result.push(Brick::new(
                        ValueSet::Literal(trimmed),
                        IndexInt::ONE,
                        IndexInt::ONE,
                    ));
                    if !brick.max().sub_clamped(IndexInt::ONE).is_zero() {
                        result.push(Brick::new(
                            brick.values().clone(),
                            brick.min() - IndexInt::ONE,
                            brick.max() - IndexInt::ONE,
                        ));
                    }
                    phase = TrimPhase::Done;
                } else {
                    let union: BTreeSet<String> = values.union(&trimmed).cloned().collect();
                    result.push(Brick::new(
                        ValueSet::Literal(union),
                        IndexInt::ZERO,
                        brick.max(),
                    ));
                    phase = if may_continue {
                        TrimPhase::MaybeTrimming
                    } else {
                        TrimPhase::Done
                    };
                }
            }
            TrimPhase::MaybeTrimming => {
                let union: BTreeSet<String> = values.union(&trimmed).cloned().collect();
                result.push(Brick::new(
                    ValueSet::Literal(union),
                    IndexInt::ZERO,
                    brick.max(),
                ));
                if !may_continue {
                    phase = TrimPhase::Done;
                }
            }
            TrimPhase::Done => unreachable!(),
        }
    }

    if from_end {
        result.reverse();
    }
    result
}

impl<P: BricksPolicy> BricksDomain<P> {
    fn normalized(bricks: Vec<Brick>) -> Self {
        Self::from_raw(P::normalize(bricks, NormalizationSite::TransferFunction))
    }

    fn trimmed(&self, trimmed: &WithConstants<Self>, start: bool, end: bool) -> Self {
        if self.is_bottom() {
            return Self::bottom_value();
        }
        let trim_chars: BTreeSet<char> = match trimmed.try_to_constant() {
            Some(characters) if !characters.is_empty() => characters.chars().collect(),
            _ => return Self::top_value(),
        };
        let mut bricks = self.bricks().to_vec();
        if start {
            bricks = trim_bricks(&bricks, &trim_chars, false);
        }
        if end {
            bricks = trim_bricks(&bricks, &trim_chars, true);
        }
        Self::normalized(bricks)
    }

    fn padded(&self, length: IndexInterval, fill: &WithConstants<Self>, at_end: bool) -> Self {
        if self.is_bottom() {
            return Self::bottom_value();
        }
        let current_min: IndexInt = self.bricks().iter().map(|brick| brick.min_length()).sum();
        if current_min >= length.upper_bound() {
            return self.clone();
        }
        let shortfall = length.upper_bound().sub_clamped(current_min);
        let pad_brick = match fill.try_to_char() {
            Some(fill_char) => Brick::new(
                ValueSet::Literal(BTreeSet::from([fill_char.to_string()])),
                IndexInt::ZERO,
                shortfall,
            ),
            None => Brick::top(),
        };
        let mut bricks = self.bricks().to_vec();
        if at_end {
            bricks.push(pad_brick);
        } else {
            bricks.insert(0, pad_brick);
        }
        Self::normalized(bricks)
    }

    /// Builds the template sequence for a containment style query and
    /// intersects the current value with it. An empty intersection refutes
    /// the query, any other result is returned as a refinement of the
    /// queried variable.
    fn match_template<V: Clone + Eq>(
        &self,
        variable: &V,
        needle: &Self,
        top_before: bool,
        top_after: bool,
    ) -> StringPredicate<V, Self> {
        if needle.is_bottom() {
            return StringPredicate::Bottom;
        }
        let mut template: Vec<Brick> = Vec::new();
        if top_before {
            template.push(Brick::top());
        }
        template.extend(needle.bricks().iter().cloned());
        if top_after {
            template.push(Brick::top());
        }
        let template = Self::from_bricks(template);

        let met = self.intersect(&template);
        if met.is_bottom() {
            StringPredicate::False
        } else {
            StringPredicate::Refinement {
                variable: variable.clone(),
                if_true: met,
            }
        }
    }
}

impl<V: Clone + Eq, P: BricksPolicy> StringOperations<V> for BricksDomain<P> {
    fn concat(left: &WithConstants<Self>, right: &WithConstants<Self>) -> Self {
        let left = left.to_abstract();
        let right = right.to_abstract();
        if left.is_bottom() || right.is_bottom() {
            return Self::bottom_value();
        }
        let mut bricks = left.bricks().to_vec();
        bricks.extend(right.bricks().iter().cloned());
        Self::normalized(bricks)
    }

    fn insert(&self, index: IndexInterval, other: &WithConstants<Self>) -> Self {
        let other = other.to_abstract();
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom_value();
        }
        let mut bricks = before(self.bricks(), index);
        bricks.extend(other.bricks().iter().cloned());
        bricks.extend(after(self.bricks(), index));
        Self::normalized(bricks)
    }

    fn substring(&self, index: IndexInterval, length: IndexInterval) -> Self {
        if self.is_bottom() {
            return Self::bottom_value();
        }
        let suffix = after(self.bricks(), index);
        Self::normalized(before(&suffix, length))
    }

    fn remove(&self, index: IndexInterval, length: IndexInterval) -> Self {
        if self.is_bottom() {
            return Self::bottom_value();
        }
        let mut bricks = before(self.bricks(), index);
        if !length.upper_bound().is_infinite() {
            let suffix = after(self.bricks(), index);
            bricks.extend(after(&suffix, length));
        }
        Self::normalized(bricks)
    }

    fn replace(&self, from: &WithConstants<Self>, to: &WithConstants<Self>) -> Self {
        if self.is_bottom() {
            return Self::bottom_value();
        }
        match (from.try_to_char(), to.try_to_char()) {
            (Some(from_char), Some(to_char)) => Self::normalized(
                self.bricks()
                    .iter()
                    .map(|brick| brick.replace(from_char, to_char))
                    .collect(),
            ),
            _ => Self::top_value(),
        }
    }

    fn trim(&self, trimmed: &WithConstants<Self>) -> Self {
        self.trimmed(trimmed, true, true)
    }

    fn trim_start(&self, trimmed: &WithConstants<Self>) -> Self {
        self.trimmed(trimmed, true, false)
    }

    fn trim_end(&self, trimmed: &WithConstants<Self>) -> Self {
        self.trimmed(trimmed, false, true)
    }

    fn pad_left(&self, length: IndexInterval, fill: &WithConstants<Self>) -> Self {
        self.padded(length, fill, false)
    }

    fn pad_right(&self, length: IndexInterval, fill: &WithConstants<Self>) -> Self {
        self.padded(length, fill, true)
    }

    fn is_empty(&self) -> AbstractBool {
        if self.is_bottom() {
            return AbstractBool::Bottom;
        }
        let length = StringOperations::<V>::get_length(self);
        if length.upper_bound().is_zero() {
            AbstractBool::True
        } else if length.lower_bound() > IndexInt::ZERO {
            AbstractBool::False
        } else {
            AbstractBool::Top
        }
    }

    fn contains(&self, variable: &V, needle: &WithConstants<Self>) -> StringPredicate<V, Self> {
        if self.is_bottom() {
            return StringPredicate::Bottom;
        }
        if let Some(literal) = needle.try_to_constant() {
            if literal.is_empty() {
                return StringPredicate::True;
            }
            let contained_in_every_value = |brick: &Brick| {
                brick.min() >= IndexInt::ONE
                    && brick
                        .values()
                        .literals()
                        .is_some_and(|values| values.iter().all(|value| value.contains(&literal)))
            };
            if self.bricks().iter().any(contained_in_every_value) {
                return StringPredicate::True;
            }
        }
        self.match_template(variable, &needle.to_abstract(), true, true)
    }

    fn starts_with(&self, variable: &V, needle: &WithConstants<Self>) -> StringPredicate<V, Self> {
        if self.is_bottom() {
            return StringPredicate::Bottom;
        }
        if let Some(literal) = needle.try_to_constant() {
            if literal.is_empty() {
                return StringPredicate::True;
            }
            if let Some(first) = self.bricks().first() {
                if first.to_prefix().starts_with(&literal) {
                    return StringPredicate::True;
                }
            }
        }
        self.match_template(variable, &needle.to_abstract(), false, true)
    }

    fn ends_with(&self, variable: &V, needle: &WithConstants<Self>) -> StringPredicate<V, Self> {
        if self.is_bottom() {
            return StringPredicate::Bottom;
        }
        if let Some(literal) = needle.try_to_constant() {
            if literal.is_empty() {
                return StringPredicate::True;
            }
            if let Some(last) = self.bricks().last() {
                if last.to_suffix().ends_with(&literal) {
                    return StringPredicate::True;
                }
            }
        }
        self.match_template(variable, &needle.to_abstract(), true, false)
    }

    fn equals(&self, variable: &V, other: &WithConstants<Self>) -> StringPredicate<V, Self> {
        let other = other.to_abstract();
        if self.is_bottom() || other.is_bottom() {
            return StringPredicate::Bottom;
        }
        if let (Some(left), Some(right)) = (self.try_to_constant(), other.try_to_constant()) {
            return if left == right {
                StringPredicate::True
            } else {
                StringPredicate::False
            };
        }
        let met = self.intersect(&other);
        if met.is_bottom() {
            StringPredicate::False
        } else {
            StringPredicate::Refinement {
                variable: variable.clone(),
                if_true: met,
            }
        }
    }

    fn get_length(&self) -> IndexInterval {
        if self.is_bottom() {
            return IndexInterval::empty();
        }
        IndexInterval::new(
            self.bricks().iter().map(|brick| brick.min_length()).sum(),
            self.bricks().iter().map(|brick| brick.max_length()).sum(),
        )
    }

    fn index_of(
        &self,
        needle: &WithConstants<Self>,
        offset: IndexInterval,
        count: IndexInterval,
    ) -> IndexInterval {
        if self.is_bottom() {
            return IndexInterval::empty();
        }
        // Only the default search over the whole string is supported.
        if offset != IndexInterval::constant(0) || !count.upper_bound().is_infinite() {
            return IndexInterval::unknown();
        }
        let needle_length = StringOperations::<V>::get_length(&needle.to_abstract());
        let self_length = StringOperations::<V>::get_length(self);
        if needle_length.upper_bound().is_zero() {
            return IndexInterval::constant(0);
        }
        if self_length.upper_bound().is_zero() {
            return IndexInterval::new(IndexInt::Negative, IndexInt::Negative);
        }
        IndexInterval::new(
            IndexInt::Negative,
            self_length
                .upper_bound()
                .sub_clamped(needle_length.lower_bound()),
        )
    }

    fn get_char_at(&self, index: IndexInterval) -> CharacterSet {
        if self.is_bottom() {
            return CharacterSet::Value(BTreeSet::new());
        }
        let suffix = after(self.bricks(), index);
        let mut characters = BTreeSet::new();
        for brick in suffix.iter() {
            let values = match brick.values().literals() {
                None => return CharacterSet::Top,
                Some(values) => values,
            };
            for value in values {
                if let Some(first) = value.chars().next() {
                    characters.insert(first);
                }
            }
            if !brick.can_be_empty() {
                break;
            }
        }
        CharacterSet::Value(characters)
    }

    fn set_char_at(&self, index: IndexInterval, character: &WithConstants<Self>) -> Self {
        if self.is_bottom() {
            return Self::bottom_value();
        }
        let char_brick = match character.try_to_char() {
            Some(new_char) => Brick::new(
                ValueSet::Literal(BTreeSet::from([new_char.to_string()])),
                IndexInt::ONE,
                IndexInt::ONE,
            ),
            None => Brick::new(ValueSet::AnyString, IndexInt::ONE, IndexInt::ONE),
        };
        let mut bricks = before(self.bricks(), index);
        bricks.push(char_brick);
        bricks.extend(after(
            self.bricks(),
            index.clamp_lower_to_zero().add_constant(1),
        ));
        Self::normalized(bricks)
    }
}
