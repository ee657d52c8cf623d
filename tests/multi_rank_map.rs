use std::collections::BTreeMap;

use offset_tree::{Avl, Balance, Error, MultiRankMap, Splay};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 1_000;

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum RankOp {
    Insert(i16, usize),
    Remove(i16),
    Adjust(i16, i8),
    RankOf(i16),
    ByRank(usize),
}

fn rank_op_strategy() -> impl Strategy<Value = RankOp> {
    prop_oneof![
        3 => (-200i16..200, 1usize..10).prop_map(|(k, n)| RankOp::Insert(k, n)),
        2 => (-200i16..200).prop_map(RankOp::Remove),
        4 => (-200i16..200, -6i8..6).prop_map(|(k, d)| RankOp::Adjust(k, d)),
        2 => (-200i16..200).prop_map(RankOp::RankOf),
        2 => (0usize..4_000).prop_map(RankOp::ByRank),
    ]
}

fn replay<S: Balance>(ops: &[RankOp]) -> Result<(), TestCaseError> {
    let mut map: MultiRankMap<i16, u8, S> = MultiRankMap::new();
    let mut model: BTreeMap<i16, usize> = BTreeMap::new();

    for op in ops {
        match *op {
            RankOp::Insert(k, count) => {
                let expected = if model.contains_key(&k) {
                    Err(Error::KeyConflict)
                } else {
                    model.insert(k, count);
                    Ok(())
                };
                prop_assert_eq!(map.try_insert(k, 0, count), expected, "insert({}, {})", k, count);
            }
            RankOp::Remove(k) => {
                let expected = model.remove(&k).map(|_| 0).ok_or(Error::NotFound);
                prop_assert_eq!(map.try_remove(&k), expected, "remove({})", k);
            }
            RankOp::Adjust(k, delta) => {
                let current = model.get(&k).copied().unwrap_or(0);
                let wanted = current as isize + isize::from(delta);
                let result = map.try_adjust_count(k, isize::from(delta));
                if wanted < 0 {
                    prop_assert!(matches!(result, Err(Error::ArgumentInvalid(_))), "adjust({}, {})", k, delta);
                } else {
                    let wanted = wanted as usize;
                    prop_assert_eq!(result, Ok(wanted), "adjust({}, {})", k, delta);
                    if wanted == 0 {
                        model.remove(&k);
                    } else {
                        model.insert(k, wanted);
                    }
                }
            }
            RankOp::RankOf(k) => {
                let expected = model.contains_key(&k).then(|| model.range(..k).map(|(_, n)| n).sum::<usize>());
                prop_assert_eq!(map.rank_of(&k), expected, "rank_of({})", k);
                prop_assert_eq!(map.count_of(&k), model.get(&k).copied().unwrap_or(0));
            }
            RankOp::ByRank(rank) => {
                let mut below = 0;
                let mut expected = None;
                for (&k, &n) in &model {
                    if rank < below + n {
                        expected = Some((k, n));
                        break;
                    }
                    below += n;
                }
                prop_assert_eq!(map.get_by_rank(rank).map(|(k, _, n)| (*k, n)), expected, "get_by_rank({})", rank);
            }
        }
        prop_assert_eq!(map.len(), model.len());
        prop_assert_eq!(map.extent(), model.values().sum::<usize>());
    }

    map.validate();
    let entries: Vec<(i16, usize)> = map.iter().map(|(k, _, n)| (*k, n)).collect();
    let expected: Vec<(i16, usize)> = model.into_iter().collect();
    prop_assert_eq!(entries, expected);
    Ok(())
}

// ─── Ranks (compared against BTreeMap of counts) ─────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn avl_ranks_match_btreemap(ops in proptest::collection::vec(rank_op_strategy(), TEST_SIZE)) {
        replay::<Avl>(&ops)?;
    }

    #[test]
    fn splay_ranks_match_btreemap(ops in proptest::collection::vec(rank_op_strategy(), TEST_SIZE)) {
        replay::<Splay>(&ops)?;
    }
}

// ─── Deterministic scenarios ─────────────────────────────────────────────────

#[test]
fn word_frequencies_by_rank() {
    let mut words: MultiRankMap<&str, ()> = MultiRankMap::new();
    for word in "the cat and the hat and the bat".split(' ') {
        words.adjust_count(word, 1);
    }
    // and:2 bat:1 cat:1 hat:1 the:3
    assert_eq!(words.extent(), 8);
    assert_eq!(words.rank_of("hat"), Some(4));
    assert_eq!(words.get_by_rank(7).map(|(k, _, n)| (*k, n)), Some(("the", 3)));
    assert_eq!(words.get_by_rank(8), None);

    assert_eq!(words.adjust_count("the", -3), 0);
    assert!(!words.contains_key("the"));
    assert_eq!(words.extent(), 5);
}

#[test]
fn zero_count_insert_is_rejected() {
    let mut map: MultiRankMap<u8, u8, Splay> = MultiRankMap::new();
    assert!(matches!(map.try_insert(1, 1, 0), Err(Error::ArgumentInvalid(_))));
    assert!(map.is_empty());
}

#[test]
fn extend_accumulates_duplicate_keys() {
    let map: MultiRankMap<char, (), Avl> = [('a', (), 2), ('b', (), 1), ('a', (), 3)].into_iter().collect();
    let entries: Vec<(char, usize)> = map.iter().map(|(k, _, n)| (*k, n)).collect();
    assert_eq!(entries, [('a', 5), ('b', 1)]);
}

#[test]
fn narrow_count_overflows() {
    let mut map: MultiRankMap<u8, (), Avl, u16> = MultiRankMap::new();
    map.insert(1, (), 65_000);
    assert_eq!(map.try_adjust_count(2, 536), Err(Error::Overflow));
    assert!(!map.contains_key(&2));
    assert_eq!(map.try_adjust_count(2, 535), Ok(535));
    assert_eq!(map.extent(), u16::MAX);
    map.validate();
}

#[test]
fn remove_entry_reports_the_count() {
    let mut map: MultiRankMap<char, &str, Splay> = [('a', "x", 2), ('b', "y", 4)].into_iter().collect();
    assert_eq!(map.remove_entry(&'b'), Some(('b', "y", 4)));
    assert_eq!(map.remove_entry(&'b'), None);
    assert_eq!(map.extent(), 2);
    map.validate();
}
