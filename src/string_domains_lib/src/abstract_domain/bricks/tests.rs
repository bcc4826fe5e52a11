use std::collections::BTreeSet;

use super::*;
use crate::abstract_domain::StringDomain;
use crate::index::{IndexInt, IndexInterval};

impl Brick {
    fn mock_brick(values: Vec<&str>, min: u64, max: u64) -> Brick {
        Brick::new(
            ValueSet::Literal(values.into_iter().map(String::from).collect()),
            IndexInt::Finite(min),
            IndexInt::Finite(max),
        )
    }
}

struct Setup {
    brick0: Brick,
    brick1: Brick,
    brick2: Brick,
    brick3: Brick,
    brick4: Brick,
    brick5: Brick,
}

impl Setup {
    fn new() -> Self {
        Setup {
            brick0: Brick::mock_brick(vec!["a", "b"], 2, 2),
            brick1: Brick::mock_brick(vec!["a", "cd"], 1, 1),
            brick2: Brick::mock_brick(vec!["b", "ef"], 1, 1),
            brick3: Brick::mock_brick(vec!["a", "b"], 2, 3),
            brick4: Brick::mock_brick(vec!["a", "b"], 0, 1),
            brick5: Brick::mock_brick(vec!["a"], 1, 1),
        }
    }
}

fn bricks(list: Vec<Brick>) -> BricksDomain {
    BricksDomain::from_raw(list)
}

#[test]
fn test_join_brick() {
    let setup = Setup::new();
    let joined = setup.brick0.join(&setup.brick4);
    let expected = Brick::mock_brick(vec!["a", "b"], 0, 2);

    assert_eq!(joined, expected);

    let joined = Brick::from_literal("ab").join(&Brick::from_literal("cd"));
    let expected = Brick::mock_brick(vec!["ab", "cd"], 1, 1);

    assert_eq!(joined, expected);

    // Bottom is the neutral element of the join.
    assert_eq!(Brick::bottom().join(&setup.brick0), setup.brick0);
}

#[test]
fn test_brick_is_less_or_equal() {
    let setup = Setup::new();
    // Test Case 1: brick0 = {a,b}^[2,2] is less than brick3 = {a,b}^[2,3]
    assert!(setup.brick0.less_than_equal(&setup.brick3));
    // Test Case 2: brick0 = {a,b}^[2,2] is less than Top
    assert!(setup.brick0.less_than_equal(&Brick::top()));
    // Test Case 3: Top is not less than brick0 = {a,b}^[2,2]
    assert!(!Brick::top().less_than_equal(&setup.brick0));
    // Test Case 4: Top is less than Top
    assert!(Brick::top().less_than_equal(&Brick::top()));
    // Test Case 5: the empty string brick is less than a brick that can be empty.
    assert!(Brick::empty_string().less_than_equal(&setup.brick4));
    // Test Case 6: the empty string brick is not less than a brick
    // that cannot be empty.
    assert!(!Brick::empty_string().less_than_equal(&setup.brick0));
    // Test Case 7: Bottom is less than everything.
    assert!(Brick::bottom().less_than_equal(&Brick::empty_string()));
}

#[test]
fn test_brick_meet() {
    let setup = Setup::new();
    // Disjoint value sets of the same fixed length meet to Bottom.
    let met = setup.brick5.meet(&Brick::mock_brick(vec!["c"], 1, 1));
    assert!(met.is_bottom());

    // Same fixed length, overlapping sets: the exact intersection.
    let met = Brick::from_literal("ab").meet(&Brick::mock_brick(vec!["ab", "cd"], 1, 1));
    assert_eq!(met, Brick::from_literal("ab"));

    // Mixed lengths with a possible overlap fall back to the left operand.
    let left = Brick::mock_brick(vec!["a", "bb"], 1, 2);
    let met = left.meet(&setup.brick4);
    assert_eq!(met, left);

    // Top is the neutral element of the meet.
    assert_eq!(setup.brick0.meet(&Brick::top()), setup.brick0);
    assert_eq!(Brick::top().meet(&setup.brick0), setup.brick0);
}

#[test]
fn test_can_overlap() {
    let setup = Setup::new();
    assert!(!setup.brick5.can_overlap(&Brick::mock_brick(vec!["b"], 1, 1)));
    // A suffix of "ab" is a prefix of "ba".
    assert!(Brick::from_literal("ab").can_overlap(&Brick::from_literal("ba")));
    // Possibly empty bricks always overlap.
    assert!(setup.brick4.can_overlap(&setup.brick5));
    assert!(Brick::top().can_overlap(&setup.brick5));
}

#[test]
fn test_brick_to_constant() {
    let setup = Setup::new();
    assert_eq!(Brick::from_literal("abc").to_constant().unwrap(), "abc");
    assert_eq!(
        Brick::mock_brick(vec!["a"], 2, 2).to_constant().unwrap(),
        "aa"
    );
    assert_eq!(Brick::empty_string().to_constant().unwrap(), "");
    assert!(setup.brick0.to_constant().is_none());
    assert!(Brick::top().to_constant().is_none());
}

#[test]
fn test_prefix_and_suffix() {
    let brick = Brick::mock_brick(vec!["abc", "abd"], 1, 1);
    assert_eq!(brick.to_prefix(), "ab");
    assert_eq!(brick.to_suffix(), "");

    let brick = Brick::mock_brick(vec!["ac", "bc"], 1, 1);
    assert_eq!(brick.to_suffix(), "c");

    // Optional bricks guarantee no prefix.
    let brick = Brick::mock_brick(vec!["ab"], 0, 1);
    assert_eq!(brick.to_prefix(), "");
}

#[test]
fn test_brick_replace() {
    let brick = Brick::mock_brick(vec!["aba", "c"], 1, 2);
    let replaced = brick.replace('a', 'x');
    assert_eq!(replaced, Brick::mock_brick(vec!["xbx", "c"], 1, 2));
    // Unconstrained bricks stay unconstrained.
    assert_eq!(Brick::top().replace('a', 'x'), Brick::top());
}

#[test]
fn test_must_be_empty() {
    let setup = Setup::new();
    assert!(!Brick::mock_brick(vec!["a"], 2, 2).must_be_empty());
    assert!(Brick::mock_brick(vec![""], 1, 1).must_be_empty());
    assert!(Brick::empty_string().must_be_empty());
    assert!(!setup.brick5.must_be_empty());
}

#[test]
fn test_merge_bricks_domain() {
    let setup = Setup::new();
    let first_bricks = bricks(vec![setup.brick0.clone()]);
    let second_bricks = bricks(vec![setup.brick0.clone(), setup.brick1.clone()]);

    let merged_bricks = first_bricks.merge(&second_bricks);

    let normalized_brick = Brick::mock_brick(vec!["aa", "ab", "ba", "bb"], 1, 1);
    let merged_with_empty = Brick::mock_brick(vec!["a", "cd"], 0, 1);
    let expected = bricks(vec![normalized_brick, merged_with_empty]);

    assert_eq!(merged_bricks, expected);
}

#[test]
fn test_bricks_is_less_or_equal() {
    let setup = Setup::new();
    let bricks1 = vec![setup.brick3.clone(), Brick::mock_brick(vec!["c", "d"], 4, 5)];
    let bricks2 = vec![
        Brick::mock_brick(vec!["a", "b"], 1, 4),
        Brick::mock_brick(vec!["c", "d", "e"], 4, 5),
    ];

    // Test Case 1: bricks1 is less or equal to bricks2
    assert!(bricks(bricks1.clone()).is_less_or_equal(&bricks(bricks2.clone())));

    // Test Case 2: leftover bricks on the right are fine if they can be empty.
    let mut longer = bricks2.clone();
    longer.push(setup.brick4.clone());
    assert!(bricks(bricks1.clone()).is_less_or_equal(&bricks(longer)));

    // Test Case 3: a Top brick on the right swallows a brick of the left.
    let left = bricks(vec![Brick::from_literal("ab"), Brick::from_literal("cd")]);
    let right = bricks(vec![Brick::from_literal("ab"), Brick::top()]);
    assert!(left.is_less_or_equal(&right));

    // Test Case 4: leftover bricks on the left must be empty.
    let left = bricks(vec![Brick::from_literal("ab"), Brick::empty_string()]);
    let right = bricks(vec![Brick::from_literal("ab")]);
    assert!(left.is_less_or_equal(&right));

    // Test Case 5: incomparable bricks fail the check.
    let left = bricks(vec![setup.brick5.clone()]);
    let right = bricks(vec![Brick::mock_brick(vec!["b"], 1, 1)]);
    assert!(!left.is_less_or_equal(&right));
}

#[test]
fn test_bricks_widen() {
    // Test Case 1: No widening is applied since no thresholds are exceeded.
    let previous = bricks(vec![Brick::from_literal("ab")]);
    let current = bricks(vec![Brick::mock_brick(vec!["ab", "cd"], 1, 1)]);
    assert_eq!(previous.widen(&current), current);

    // Test Case 2: Widening is applied since the interval threshold is exceeded.
    let previous = bricks(vec![Brick::mock_brick(vec!["a"], 0, 1)]);
    let current = bricks(vec![Brick::mock_brick(vec!["a"], 0, 10)]);
    let expected = bricks(vec![Brick::new(
        ValueSet::Literal(BTreeSet::from(["a".to_string()])),
        IndexInt::ZERO,
        IndexInt::Infinite,
    )]);
    assert_eq!(previous.widen(&current), expected);

    // Test Case 3: Widening is applied since the sequence threshold is exceeded.
    let large_values: Vec<String> = (0..=SEQUENCE_THRESHOLD).map(|i| i.to_string()).collect();
    let previous = bricks(vec![Brick::mock_brick(vec!["0"], 1, 1)]);
    let current = bricks(vec![Brick::mock_brick(
        large_values.iter().map(String::as_str).collect(),
        1,
        1,
    )]);
    assert_eq!(previous.widen(&current), BricksDomain::top_value());

    // Test Case 4: The length threshold is exceeded.
    let long_list = vec![Brick::from_literal("a"); LENGTH_THRESHOLD + 1];
    let previous = bricks(long_list);
    let current = bricks(vec![Brick::from_literal("a")]);
    assert_eq!(previous.widen(&current), BricksDomain::top_value());

    // Test Case 5: The operands are not comparable.
    let previous = bricks(vec![Brick::from_literal("ab")]);
    let current = bricks(vec![Brick::from_literal("cd")]);
    assert_eq!(previous.widen(&current), BricksDomain::top_value());
}

#[test]
fn test_normalize() {
    let setup = Setup::new();
    // ["a"]^{1,1}["a", "b"]^{2,3}["a", "b"]^{0,1}
    let to_normalize = vec![setup.brick5, setup.brick3, setup.brick4];
    let normalized = StandardPolicy::normalize(to_normalize, NormalizationSite::Join);

    let expected_brick1 = Brick::mock_brick(vec!["aaa", "aab", "aba", "abb"], 1, 1);
    let expected_brick2 = Brick::mock_brick(vec!["a", "b"], 0, 2);

    assert_eq!(normalized, vec![expected_brick1, expected_brick2]);
}

#[test]
fn test_normalize_collapses_bottom() {
    let setup = Setup::new();
    let to_normalize = vec![setup.brick5, Brick::bottom()];
    assert_eq!(
        StandardPolicy::normalize(to_normalize, NormalizationSite::Join),
        vec![Brick::bottom()]
    );
}

#[test]
fn test_normalize_skips_oversized_expansion() {
    // 3^4 = 81 alternatives exceed the expansion threshold,
    // so the brick stays as it is.
    let oversized = Brick::mock_brick(vec!["a", "b", "c"], 4, 4);
    assert_eq!(
        StandardPolicy::normalize(vec![oversized.clone()], NormalizationSite::Join),
        vec![oversized]
    );
}

#[test]
fn test_generate_permutations_of_fixed_length() {
    let values: BTreeSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
    let result = Brick::generate_permutations_of_fixed_length(2, &values);
    let expected: BTreeSet<String> = ["aa", "ab", "ac", "ba", "bb", "bc", "ca", "cb", "cc"]
        .into_iter()
        .map(String::from)
        .collect();

    assert_eq!(result, expected);
}

#[test]
fn test_break_single_brick_into_simpler_bricks() {
    let setup = Setup::new();
    let complex_brick = setup.brick3; // ["a", "b"]^{2,3}
    let (result1, result2) = complex_brick.break_single_brick_into_simpler_bricks();
    let expected_brick1 = Brick::mock_brick(vec!["aa", "ab", "ba", "bb"], 1, 1);
    let expected_brick2 = Brick::mock_brick(vec!["a", "b"], 0, 1);

    assert_eq!(result1, expected_brick1);
    assert_eq!(result2, expected_brick2);
}

#[test]
fn test_merge_bricks_with_equal_content() {
    let setup = Setup::new();
    let result = setup.brick0.merge_bricks_with_equal_content(&setup.brick4);

    assert_eq!(result, setup.brick3);
}

#[test]
fn test_transform_brick_with_min_max_equal() {
    let setup = Setup::new();
    let result = setup.brick0.transform_brick_with_min_max_equal(2);
    let expected_brick = Brick::mock_brick(vec!["aa", "ab", "ba", "bb"], 1, 1);

    assert_eq!(result, expected_brick);
}

#[test]
fn test_merge_bricks_with_bound_one() {
    let setup = Setup::new();
    let result = setup.brick1.merge_bricks_with_bound_one(&setup.brick2);
    let expected_brick = Brick::mock_brick(vec!["ab", "aef", "cdb", "cdef"], 1, 1);

    assert_eq!(result, expected_brick);
}

#[test]
fn test_extend() {
    let setup = Setup::new();
    let empty_brick = Brick::empty_string();
    let short_list = vec![
        setup.brick0.clone(),
        setup.brick1.clone(),
        setup.brick2.clone(),
    ];
    let long_list = vec![
        setup.brick3,
        setup.brick0.clone(),
        setup.brick1.clone(),
        setup.brick4,
        setup.brick5,
    ];

    let new_list = StandardPolicy::extend(&short_list, &long_list);
    let expected_list = vec![
        empty_brick.clone(),
        setup.brick0,
        setup.brick1,
        empty_brick,
        setup.brick2,
    ];

    assert_eq!(new_list, expected_list);
}

#[test]
fn test_intersect() {
    let setup = Setup::new();

    // Equal operands are their own intersection.
    let value: BricksDomain = BricksDomain::from("ab".to_string());
    assert_eq!(value.intersect(&value), value);

    // Disjoint fixed-length alternatives refute each other.
    let left = bricks(vec![setup.brick5.clone()]);
    let right = bricks(vec![Brick::mock_brick(vec!["b"], 1, 1)]);
    assert!(left.intersect(&right).is_bottom());

    // A single literal on one side is stripped off the other side's
    // front brick to realign the sequences.
    let left = bricks(vec![Brick::from_literal("ab")]);
    let right = bricks(vec![Brick::from_literal("a"), Brick::from_literal("b")]);
    assert_eq!(left.intersect(&right), BricksDomain::from("ab".to_string()));

    // The right sequence requires content the left cannot provide.
    let left = bricks(vec![Brick::from_literal("a")]);
    let right = bricks(vec![Brick::from_literal("a"), Brick::from_literal("b")]);
    assert!(left.intersect(&right).is_bottom());

    // Top is the neutral element of the intersection.
    let value = bricks(vec![setup.brick0.clone()]);
    assert_eq!(value.intersect(&BricksDomain::top_value()), value);
}

#[test]
fn test_constant_round_trip() {
    let value: BricksDomain = BricksDomain::from_constant("hello");
    assert_eq!(value.try_to_constant().unwrap(), "hello");

    let empty: BricksDomain = BricksDomain::from_constant("");
    assert_eq!(empty.try_to_constant().unwrap(), "");

    let top: BricksDomain = BricksDomain::top_value();
    assert!(top.try_to_constant().is_none());
}

#[test]
fn test_top_and_bottom_classification() {
    let value: BricksDomain = BricksDomain::from_constant("a");
    assert!(!value.is_top());
    assert!(!value.is_bottom());
    let top: BricksDomain = BricksDomain::top_value();
    assert!(top.is_top());
    let bottom: BricksDomain = BricksDomain::bottom_value();
    assert!(bottom.is_bottom());
    // One impossible brick makes the whole sequence impossible.
    assert!(bricks(vec![Brick::from_literal("a"), Brick::bottom()]).is_bottom());
    // The empty sequence denotes exactly the empty string.
    let empty: BricksDomain = BricksDomain::from_constant("");
    assert!(!empty.is_top());
    assert!(!empty.is_bottom());
}

#[test]
fn test_lattice_laws() {
    let values: Vec<BricksDomain> = vec![
        BricksDomain::from_constant("ab"),
        bricks(vec![Brick::mock_brick(vec!["ab", "cd"], 1, 1)]),
        BricksDomain::from_constant(""),
        BricksDomain::top_value(),
        BricksDomain::bottom_value(),
    ];

    for left in values.iter() {
        for right in values.iter() {
            let joined = left.merge(right);
            assert_eq!(joined, right.merge(left));
            assert!(left.is_less_or_equal(&joined));
            assert!(left.intersect(right).is_less_or_equal(left));
        }
        assert!(BricksDomain::bottom_value().is_less_or_equal(left));
        assert!(left.is_less_or_equal(&BricksDomain::top_value()));
    }
}

#[test]
fn test_display() {
    let value: BricksDomain = BricksDomain::from_constant("ab");
    assert_eq!(format!("{value}"), "Bricks: {\"ab\"}^(1,1) ");
    let top: BricksDomain = BricksDomain::top_value();
    assert_eq!(format!("{top}"), "Bricks: [T]^(0,inf) ");
}

#[test]
fn test_get_length_interval() {
    use crate::abstract_domain::StringOperations;

    let value: BricksDomain = BricksDomain::from_constant("abc");
    let length = <BricksDomain as StringOperations<String>>::get_length(&value);
    assert_eq!(length, IndexInterval::constant(3));
}
