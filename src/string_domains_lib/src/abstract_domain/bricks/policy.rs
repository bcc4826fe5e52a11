//! This module implements the normalization and widening policy of the brick sequence domain.
//! The policy is a pluggable strategy: the sequence domain calls back into it after every
//! structurally significant operation to keep sequences bounded and to make fixpoint
//! iteration converge. The exact widening procedure of the standard policy depends on three constants.
//!  - The *interval threshold* overapproximates the number of times string sequences can occur in a brick.
//!  - The *sequence threshold* overapproximates the number of literal alternatives in a brick by forcing a *Top* value.
//!  - The *length threshold* overapproximates the number of bricks in a sequence and forces a *Top* value.
//! A merge is processed without widening when none of the thresholds are exceeded.

use std::fmt::Debug;

use super::brick::Brick;
use crate::index::IndexInt;
use crate::prelude::*;

pub const INTERVAL_THRESHOLD: u64 = 8;
pub const SEQUENCE_THRESHOLD: usize = 8;
pub const LENGTH_THRESHOLD: usize = 8;
/// An upper bound on the size of literal sets produced by the normalization
/// rules that expand repetitions into explicit concatenations.
pub const EXPANSION_THRESHOLD: usize = 64;

/// The place in the domain logic from which a normalization is requested.
/// A policy may normalize more or less aggressively depending on the site.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum NormalizationSite {
    /// After a join of two sequences.
    Join,
    /// After a string-operation transfer function.
    TransferFunction,
    /// Before converting the sequence into another representation.
    Conversion,
}

/// The strategy governing sequence padding, normalization and widening
/// of the brick sequence domain.
pub trait BricksPolicy: PartialEq + Eq + Clone + Debug {
    /// Pad the shorter of two brick sequences so that both have the same
    /// length and pairwise operations are well-defined.
    fn extend(shorter: &[Brick], longer: &[Brick]) -> Vec<Brick>;

    /// Rewrite a brick sequence into its normalized form.
    fn normalize(bricks: Vec<Brick>, site: NormalizationSite) -> Vec<Brick>;

    /// Widen `current` against `previous` during fixpoint iteration.
    fn widen(previous: &[Brick], current: &[Brick]) -> Vec<Brick>;
}

/// The default policy with the threshold-based widening.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct StandardPolicy {
    _private: (),
}

impl BricksPolicy for StandardPolicy {
    /// Before merging two brick sequences, the shorter one has to be padded
    /// with empty string bricks. To achieve higher positional
    /// correspondence, empty string bricks will be added in a way that
    /// equal bricks have the same indices in both lists.
    fn extend(shorter: &[Brick], longer: &[Brick]) -> Vec<Brick> {
        let mut short_list: Vec<Brick> = shorter.to_vec();
        let mut new_list: Vec<Brick> = Vec::new();
        let len_diff = longer.len() - short_list.len();

        let mut empty_bricks_added = 0;

        for long_brick in longer.iter() {
            if empty_bricks_added >= len_diff {
                new_list.push(short_list.remove(0));
            } else if short_list.is_empty() || short_list.first().unwrap() != long_brick {
                new_list.push(Brick::empty_string());
                empty_bricks_added += 1;
            } else {
                new_list.push(short_list.remove(0));
            }
        }

        new_list
    }

    /// A set of strings can be built from multiple configurations of bricks
    /// e.g. \[{abc}\]^{1,1} <=> \[{a}\]^{1,1}\[{b}\]^{1,1}\[{c}\]^{1,1}
    ///
    /// Introducing a normalized form \[T\]^{1,1} or \[T\]^{0, max>0}
    /// will keep string representations unambiguous.
    ///
    /// Normalizing can be seen as some kind of fixpoint for a set of 5 rules that are applied
    /// to the list of bricks until the state stays unchanged:
    /// 1. **remove** bricks that denote only the empty string
    /// 2. **merge** successive bricks with the same indices max = 1, min = 1, in a new single brick.
    ///    The new string set is the concatenation of the former two. e.g. B0 = \[{a,cd}\]^{1,1}
    ///    and B1 = \[{b,ef}\]^{1,1} become B_new = \[{ab, aef, cdb, cdef}\]^{1,1}.
    /// 3. **transform** a brick in which the number of applications is constant (min = max) into one in which
    ///    min = max = 1. e.g. B = \[{a,b}\]^{2,2} => B_new = \[{aa, ab, ba, bb}\]^{1,1}.
    /// 4. **merge** two successive bricks in which the set of strings is the same. e.g. B1 = \[S\]^{m1, M1}
    ///    and B2 = \[S\]^{m2, M2} => B_new = \[S\]^{m1+m2, M1+M2}
    /// 5. **break** a single brick with min >= 1 and max != min into two simpler bricks where B = \[S\]^{min,max} =>
    ///    B1 = \[S^min\]^{1,1}, B2 = \[S\]^{0, max-min}.
    ///    e.g. B = \[{a}\]^{2,5} => B1 = \[{aa}\]^{1,1}, B2 = \[{a}\]^{0,3}
    ///
    /// The expanding rules 2, 3 and 5 are skipped whenever they would produce
    /// a literal set larger than [`EXPANSION_THRESHOLD`]. Rule 4 skips the
    /// pair produced by rule 5 so that the two rules cannot undo each other.
    /// The standard policy normalizes the same way at every site.
    fn normalize(bricks: Vec<Brick>, _site: NormalizationSite) -> Vec<Brick> {
        if bricks.iter().any(|brick| brick.is_bottom()) {
            return vec![Brick::bottom()];
        }

        let mut normalized = bricks;
        let mut lookup = normalized.clone();
        let mut unchanged = false;
        // Every rule application shrinks the list or moves it towards the
        // normalized shape. The sweep bound cuts off rule interactions that
        // would otherwise cycle.
        let max_sweeps = 4 * lookup.len() + 16;
        let mut sweeps = 0;
        while !unchanged && sweeps < max_sweeps {
            sweeps += 1;
            for (index, current_brick) in lookup.iter().enumerate() {
                // Ignore Top value bricks.
                if current_brick.is_top() {
                    continue;
                }

                // --Step 1-- Check whether the brick contains the empty string only.
                // If so, remove the brick from the list.
                if current_brick.must_be_empty() {
                    normalized.remove(index);
                    break;
                }

                // --Step 3-- Check whether the lower and upper bound are equal and greater than 1.
                // If so, create all concatenations of the size of min=max and set the bounds to 1.
                if let (Ok(repeats), true) = (
                    current_brick.min().try_to_u64(),
                    current_brick.min() == current_brick.max(),
                ) {
                    if repeats > 1 && expansion_is_affordable(current_brick, repeats) {
                        normalized[index] =
                            current_brick.transform_brick_with_min_max_equal(repeats);
                        break;
                    }
                }

                // --Step 5-- Check whether min >= 1 and max > min.
                // If so, break the brick into simpler bricks.
                if let Ok(repeats) = current_brick.min().try_to_u64() {
                    if repeats >= 1
                        && current_brick.max() > current_brick.min()
                        && expansion_is_affordable(current_brick, repeats)
                    {
                        let (new_brick1, new_brick2) =
                            current_brick.break_single_brick_into_simpler_bricks();
                        normalized[index] = new_brick1;
                        normalized.insert(index + 1, new_brick2);
                        break;
                    }
                }

                // Check whether bricks can be merged.
                if let Some(next_brick) = lookup.get(index + 1) {
                    if next_brick.is_top() {
                        continue;
                    }
                    // --Step 2-- Check whether two successive bricks are bound by one in min and max.
                    // If so, merge them by taking the cartesian product of the literal sets.
                    if (
                        current_brick.min(),
                        current_brick.max(),
                        next_brick.min(),
                        next_brick.max(),
                    ) == (IndexInt::ONE, IndexInt::ONE, IndexInt::ONE, IndexInt::ONE)
                        && product_is_affordable(current_brick, next_brick)
                    {
                        normalized[index] = current_brick.merge_bricks_with_bound_one(next_brick);
                        normalized.remove(index + 1);
                        break;
                    }
                    // --Step 4-- Check whether two successive bricks have equal content.
                    // If so, merge them with the same content and add their min and max values together.
                    // The pair (S,1,1)(S,0,_) is the output shape of rule 5 and stays as it is.
                    else if current_brick.values() == next_brick.values()
                        && !(current_brick.min() == IndexInt::ONE
                            && current_brick.max() == IndexInt::ONE
                            && next_brick.min() == IndexInt::ZERO)
                    {
                        normalized[index] = current_brick.merge_bricks_with_equal_content(next_brick);
                        normalized.remove(index + 1);
                        break;
                    }
                }
            }

            if lookup == normalized {
                unchanged = true;
            } else {
                lookup = normalized.clone();
            }
        }

        normalized
    }

    /// The widen function of the standard policy.
    /// If the two brick sequences are not comparable or either sequence exceeds
    /// the length threshold, the single *Top* brick is returned.
    /// Otherwise, the shorter sequence is padded and each pair of bricks
    /// is widened individually.
    fn widen(previous: &[Brick], current: &[Brick]) -> Vec<Brick> {
        if previous.len() > LENGTH_THRESHOLD || current.len() > LENGTH_THRESHOLD {
            return vec![Brick::top()];
        }

        let mut new_previous = previous.to_vec();
        let mut new_current = current.to_vec();
        if previous.len() < current.len() {
            new_previous = Self::extend(previous, current);
        } else if current.len() < previous.len() {
            new_current = Self::extend(current, previous);
        }

        if !list_less_or_equal(&new_previous, &new_current)
            && !list_less_or_equal(&new_current, &new_previous)
        {
            return vec![Brick::top()];
        }

        new_previous
            .iter()
            .zip(new_current.iter())
            .map(|(previous_brick, current_brick)| widen_brick(previous_brick, current_brick))
            .collect()
    }
}

/// Checks whether every brick of the first sequence is less or equal than
/// its counterpart in the second sequence. Empty string bricks are ignored
/// for order comparisons.
fn list_less_or_equal(first: &[Brick], second: &[Brick]) -> bool {
    first
        .iter()
        .zip(second.iter())
        .all(|(first_brick, second_brick)| {
            first_brick.must_be_empty()
                || second_brick.must_be_empty()
                || first_brick.less_than_equal(second_brick)
        })
}

/// Widens a pair of bricks by taking the union of the two bricks' literal
/// sets and the convex hull of their bounds. If the number of literal
/// alternatives exceeds the sequence threshold, *Top* is returned.
/// If the width of the merged interval exceeds the interval threshold
/// or is unbounded, the bounds are widened to `[0, inf]`.
fn widen_brick(previous: &Brick, current: &Brick) -> Brick {
    let joined = previous.join(current);
    if joined.is_bottom() {
        return joined;
    }
    match joined.values().literals() {
        None => Brick::top(),
        Some(values) => {
            if values.len() > SEQUENCE_THRESHOLD {
                return Brick::top();
            }
            if joined.max().is_infinite()
                || joined.max() - joined.min() > IndexInt::Finite(INTERVAL_THRESHOLD)
            {
                Brick::new(joined.values().clone(), IndexInt::ZERO, IndexInt::Infinite)
            } else {
                joined
            }
        }
    }
}

fn expansion_is_affordable(brick: &Brick, repeats: u64) -> bool {
    if repeats > EXPANSION_THRESHOLD as u64 {
        return false;
    }
    match brick.values().literals() {
        None => false,
        Some(values) => values
            .len()
            .checked_pow(repeats as u32)
            .is_some_and(|size| size <= EXPANSION_THRESHOLD),
    }
}

fn product_is_affordable(left: &Brick, right: &Brick) -> bool {
    match (left.values().literals(), right.values().literals()) {
        (Some(left_values), Some(right_values)) => left_values
            .len()
            .checked_mul(right_values.len())
            .is_some_and(|size| size <= EXPANSION_THRESHOLD),
        _ => false,
    }
}
