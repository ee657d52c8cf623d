use offset_tree::{AllocationMode, Avl, Balance, Error, HugeList, HugeListOptions, Splay};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 500;

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum ListOp {
    Push(u16),
    Insert(usize, u16),
    InsertRange(usize, Vec<u16>),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    ReplaceRange(usize, usize, Vec<u16>),
    RemoveAll(u16),
    Set(usize, u16),
    Get(usize),
}

fn items() -> impl Strategy<Value = Vec<u16>> {
    proptest::collection::vec(0u16..100, 0..24)
}

fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => (0u16..100).prop_map(ListOp::Push),
        3 => (any::<usize>(), 0u16..100).prop_map(|(at, item)| ListOp::Insert(at, item)),
        3 => (any::<usize>(), items()).prop_map(|(at, items)| ListOp::InsertRange(at, items)),
        3 => any::<usize>().prop_map(ListOp::RemoveAt),
        2 => (any::<usize>(), 0usize..20).prop_map(|(at, count)| ListOp::RemoveRange(at, count)),
        2 => (any::<usize>(), 0usize..12, items()).prop_map(|(at, count, items)| ListOp::ReplaceRange(at, count, items)),
        1 => (2u16..20).prop_map(ListOp::RemoveAll),
        1 => (any::<usize>(), 0u16..100).prop_map(|(at, item)| ListOp::Set(at, item)),
        2 => any::<usize>().prop_map(ListOp::Get),
    ]
}

fn replay<S: Balance>(block_size: usize, ops: Vec<ListOp>) -> Result<(), TestCaseError> {
    let mut list: HugeList<u16, S> = HugeList::with_block_size(block_size);
    let mut model: Vec<u16> = Vec::new();

    for op in ops {
        match op {
            ListOp::Push(item) => {
                list.push(item);
                model.push(item);
            }
            ListOp::Insert(at, item) => {
                let index = at % (model.len() + 1);
                list.insert(index, item);
                model.insert(index, item);
            }
            ListOp::InsertRange(at, items) => {
                let index = at % (model.len() + 1);
                list.insert_range(index, items.iter().copied());
                model.splice(index..index, items);
            }
            ListOp::RemoveAt(at) => {
                if model.is_empty() {
                    prop_assert!(matches!(list.try_remove_at(0), Err(Error::ArgumentInvalid(_))));
                    continue;
                }
                let index = at % model.len();
                prop_assert_eq!(list.remove_at(index), model.remove(index));
            }
            ListOp::RemoveRange(at, count) => {
                let index = at % (model.len() + 1);
                let result = list.try_remove_range(index, count);
                if index + count > model.len() {
                    prop_assert!(matches!(result, Err(Error::ArgumentInvalid(_))));
                } else {
                    prop_assert_eq!(result, Ok(()));
                    model.drain(index..index + count);
                }
            }
            ListOp::ReplaceRange(at, count, items) => {
                let index = at % (model.len() + 1);
                let count = count.min(model.len() - index);
                list.replace_range(index, count, items.iter().copied());
                model.splice(index..index + count, items);
            }
            ListOp::RemoveAll(divisor) => {
                let before = model.len();
                model.retain(|item| item % divisor != 0);
                prop_assert_eq!(list.remove_all(|item| item % divisor == 0), before - model.len());
            }
            ListOp::Set(at, item) => {
                if model.is_empty() {
                    continue;
                }
                let index = at % model.len();
                prop_assert_eq!(list.set(index, item), std::mem::replace(&mut model[index], item));
            }
            ListOp::Get(at) => {
                let index = at % (model.len() + 1);
                prop_assert_eq!(list.get(index), model.get(index));
            }
        }

        list.validate();
        prop_assert_eq!(list.len(), model.len());
    }

    prop_assert_eq!(list.to_vec(), model.clone());
    prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), model);
    Ok(())
}

// ─── Segment invariants (compared against Vec) ───────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn avl_list_matches_vec(block_size in 1usize..9, ops in proptest::collection::vec(list_op_strategy(), TEST_SIZE)) {
        replay::<Avl>(block_size, ops)?;
    }

    #[test]
    fn splay_list_matches_vec(block_size in 1usize..9, ops in proptest::collection::vec(list_op_strategy(), TEST_SIZE)) {
        replay::<Splay>(block_size, ops)?;
    }

    #[test]
    fn search_family_matches_slice(mut items in proptest::collection::vec(0u32..200, 0..400), probe in 0u32..200) {
        let mut list: HugeList<u32> = HugeList::with_block_size(7);
        list.extend(items.iter().copied());
        prop_assert_eq!(list.index_of(&probe), items.iter().position(|item| *item == probe));
        prop_assert_eq!(list.last_index_of(&probe), items.iter().rposition(|item| *item == probe));

        items.sort_unstable();
        let mut sorted: HugeList<u32> = items.iter().copied().collect();
        let first = items.partition_point(|item| *item < probe);
        match sorted.binary_search_first_by(|item| item.cmp(&probe)) {
            Ok(index) => {
                prop_assert_eq!(index, first);
                prop_assert_eq!(items[index], probe);
            }
            Err(index) => {
                prop_assert_eq!(index, first);
                prop_assert!(items.get(index) != Some(&probe));
            }
        }
        match sorted.binary_search_by(|item| item.cmp(&probe)) {
            Ok(index) => prop_assert_eq!(items[index], probe),
            Err(index) => prop_assert_eq!(index, first),
        }
    }
}

// ─── Deterministic scenarios ─────────────────────────────────────────────────

#[test]
fn ten_appends_with_block_size_four() {
    for mode in [AllocationMode::GrowAndRetainFreed, AllocationMode::GrowDiscardFreed] {
        let mut list: HugeList<u64> = HugeList::with_options(HugeListOptions {
            max_block_size: 4,
            allocation_mode: mode,
            ..HugeListOptions::default()
        });
        for item in 0..10 {
            list.push(item);
        }
        let segments = list.segments();
        assert_eq!(list.len(), 10);
        assert!(segments.iter().all(|&(length, _)| length <= 4));
        assert!(segments.iter().filter(|&&(length, capacity)| capacity > length).count() <= 1);
        list.validate();
    }
}

#[test]
fn deleting_at_a_junction_merges_segments() {
    let mut list: HugeList<char> = HugeList::with_block_size(6);
    list.extend("abcdefghijkl".chars());
    list.remove_range(3, 2);
    list.remove_range(4, 3);
    assert_eq!(list.segments().len(), 2);

    list.remove_at(3);
    assert_eq!(list.segments().len(), 1);
    assert_eq!(list.to_vec().into_iter().collect::<String>(), "abcjkl");
    list.validate();
}

#[test]
fn binary_search_over_a_thousand() {
    let mut list: HugeList<u32> = (0..1000).collect();
    assert_eq!(list.binary_search_by(|item| item.cmp(&500)), Ok(500));
    assert_eq!(list.binary_search_by(|item| item.cmp(&1000)), Err(1000));

    list.remove_at(500);
    assert_eq!(list.binary_search_by(|item| item.cmp(&500)), Err(500));
}

#[test]
fn clear_is_idempotent() {
    let mut list: HugeList<u8, Splay> = HugeList::with_block_size(8);
    list.extend(0..100);
    list.clear();
    list.clear();
    assert!(list.is_empty());
    assert!(list.segments().is_empty());
    list.push(1);
    assert_eq!(list.to_vec(), [1]);
    list.validate();
}

#[test]
fn clone_is_independent() {
    let mut original: HugeList<String> = HugeList::with_block_size(3);
    original.extend((0..10).map(|n| n.to_string()));
    let mut copy = original.clone();
    copy.set(0, "zero".to_owned());
    copy.remove_range(5, 5);
    original.push("10".to_owned());

    assert_eq!(original.len(), 11);
    assert_eq!(original.get(0).map(String::as_str), Some("0"));
    assert_eq!(copy.len(), 5);
    assert_eq!(copy.get(0).map(String::as_str), Some("zero"));
    original.validate();
    copy.validate();
}

#[test]
fn fast_cursor_is_invalidated_by_edit() {
    let mut list: HugeList<u32> = (0..20).collect();
    let mut cursor = list.fast_cursor();
    assert_eq!(cursor.next(&list), Ok(Some(&0)));
    list.set(5, 50);
    assert_eq!(cursor.next(&list), Ok(Some(&1)));
    list.remove_at(10);
    assert_eq!(cursor.next(&list), Err(Error::InvalidState));
}

#[test]
fn robust_cursor_follows_indices_across_edits() {
    let mut list: HugeList<u32, Splay> = (0..6).collect();
    let mut cursor = list.cursor();
    let mut seen = Vec::new();
    while let Some(item) = cursor.next(&mut list).unwrap() {
        let item = *item;
        seen.push(item);
        if item == 2 {
            list.insert(3, 100);
        }
    }
    assert_eq!(seen, [0, 1, 2, 100, 3, 4, 5]);
}

#[test]
fn zero_sized_elements() {
    let mut list: HugeList<()> = HugeList::with_block_size(5);
    list.extend(std::iter::repeat_n((), 23));
    list.remove_range(2, 9);
    assert_eq!(list.len(), 14);
    list.validate();
}
