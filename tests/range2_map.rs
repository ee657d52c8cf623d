use offset_tree::{Avl, Balance, Error, Range2, Range2Map, Side, Splay};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 1_000;

// ─── Model: a Vec of (x_length, y_length, value) laid end to end ─────────────

#[derive(Debug, Clone)]
enum Range2Op {
    Insert(usize, u32, u32),
    Remove(usize),
    Adjust(usize, i8, i8),
    Probe(u32),
    Set(usize),
}

fn range2_op_strategy() -> impl Strategy<Value = Range2Op> {
    prop_oneof![
        5 => (any::<usize>(), 1u32..20, 1u32..20).prop_map(|(at, x, y)| Range2Op::Insert(at, x, y)),
        3 => any::<usize>().prop_map(Range2Op::Remove),
        3 => (any::<usize>(), -8i8..8, -8i8..8).prop_map(|(at, dx, dy)| Range2Op::Adjust(at, dx, dy)),
        4 => (0u32..4_000).prop_map(Range2Op::Probe),
        1 => any::<usize>().prop_map(Range2Op::Set),
    ]
}

type Model = Vec<(u32, u32, u32)>;

/// Starts of every entry on both sides.
fn starts(model: &Model) -> Vec<(u32, u32)> {
    model
        .iter()
        .scan((0, 0), |(x, y), &(x_len, y_len, _)| {
            let this = (*x, *y);
            *x += x_len;
            *y += y_len;
            Some(this)
        })
        .collect()
}

fn y_extent(model: &Model) -> u32 {
    model.iter().map(|&(_, y_len, _)| y_len).sum()
}

/// `(x_start, x_length, y_start, y_length, value)` for entry `index`.
fn expected(model: &Model, layout: &[(u32, u32)], index: usize) -> (u32, u32, u32, u32, u32) {
    let (x_start, y_start) = layout[index];
    let (x_len, y_len, value) = model[index];
    (x_start, x_len, y_start, y_len, value)
}

fn flatten(range: Range2<'_, u32, u32>) -> (u32, u32, u32, u32, u32) {
    (range.x_start, range.x_length, range.y_start, range.y_length, *range.value)
}

fn replay<S: Balance>(ops: &[Range2Op]) -> Result<(), TestCaseError> {
    let mut map: Range2Map<u32, S, u32> = Range2Map::new();
    let mut model: Model = Vec::new();
    let mut next_value = 0;

    for op in ops {
        let layout = starts(&model);
        let extent = y_extent(&model);
        match *op {
            Range2Op::Insert(which, x_len, y_len) => {
                let index = which % (model.len() + 1);
                let start = layout.get(index).map_or(extent, |&(_, y)| y);
                prop_assert_eq!(map.try_insert(start, Side::Y, x_len, y_len, next_value), Ok(()));
                model.insert(index, (x_len, y_len, next_value));
                next_value += 1;
            }
            Range2Op::Remove(which) => {
                if model.is_empty() {
                    prop_assert_eq!(map.try_remove(0, Side::Y), Err(Error::NotFound));
                    continue;
                }
                let index = which % model.len();
                prop_assert_eq!(map.try_remove(layout[index].1, Side::Y), Ok(model[index].2));
                model.remove(index);
            }
            Range2Op::Adjust(which, dx, dy) => {
                if model.is_empty() {
                    continue;
                }
                let index = which % model.len();
                let result = map.try_adjust_length(layout[index].1, Side::Y, isize::from(dx), isize::from(dy));
                let x = i64::from(model[index].0) + i64::from(dx);
                let y = i64::from(model[index].1) + i64::from(dy);
                if x < 0 || y < 0 || (x == 0) != (y == 0) {
                    prop_assert!(matches!(result, Err(Error::ArgumentInvalid(_))), "adjust {} by ({}, {})", index, dx, dy);
                } else {
                    prop_assert_eq!(result, Ok(()));
                    if x == 0 {
                        model.remove(index);
                    } else {
                        model[index].0 = u32::try_from(x).unwrap();
                        model[index].1 = u32::try_from(y).unwrap();
                    }
                }
            }
            Range2Op::Probe(position) => {
                let covering = layout.iter().rposition(|&(_, y)| y <= position).filter(|_| position < extent);
                let want = covering.map(|index| expected(&model, &layout, index));
                prop_assert_eq!(map.get_range(position, Side::Y).map(flatten), want, "get_range({})", position);

                let less = layout.iter().rposition(|&(_, y)| y < position);
                let want = less.map(|index| expected(&model, &layout, index));
                prop_assert_eq!(map.nearest_less(position, Side::Y).map(flatten), want, "nearest_less({})", position);

                let greater = layout.iter().position(|&(_, y)| y > position);
                let want = greater.map(|index| expected(&model, &layout, index)).ok_or(extent);
                prop_assert_eq!(map.nearest_greater(position, Side::Y).map(flatten), want, "nearest_greater({})", position);

                let exact = layout.iter().position(|&(_, y)| y == position);
                prop_assert_eq!(map.get(position, Side::Y).copied(), exact.map(|index| model[index].2));
            }
            Range2Op::Set(which) => {
                if model.is_empty() {
                    continue;
                }
                let index = which % model.len();
                prop_assert_eq!(map.set(layout[index].1, Side::Y, next_value), model[index].2);
                model[index].2 = next_value;
                next_value += 1;
            }
        }
        prop_assert_eq!(map.len(), model.len());
        prop_assert_eq!(map.extent(Side::Y), y_extent(&model));
        prop_assert_eq!(map.extent(Side::X), model.iter().map(|&(x_len, _, _)| x_len).sum::<u32>());
    }

    map.validate();
    let layout = starts(&model);
    let entries: Vec<_> = map.iter().map(flatten).collect();
    let want: Vec<_> = (0..model.len()).map(|index| expected(&model, &layout, index)).collect();
    prop_assert_eq!(entries, want);
    Ok(())
}

// ─── Y-side lookups (compared against the model) ─────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn avl_y_side_matches_model(ops in proptest::collection::vec(range2_op_strategy(), TEST_SIZE)) {
        replay::<Avl>(&ops)?;
    }

    #[test]
    fn splay_y_side_matches_model(ops in proptest::collection::vec(range2_op_strategy(), TEST_SIZE)) {
        replay::<Splay>(&ops)?;
    }
}

// ─── Deterministic scenarios ─────────────────────────────────────────────────

#[test]
fn y_lookups_survive_rebalancing() {
    let mut map: Range2Map<u32> = Range2Map::new();
    // Inserting at the front of the Y side forces repeated rotations.
    for value in 0..64 {
        map.insert(0, Side::Y, 3, 1, value);
    }
    for position in 0..64 {
        let range = map.get_range(position, Side::Y).unwrap();
        assert_eq!((range.x_start, range.y_start, *range.value), (position * 3, position, 63 - position as u32));
    }
    assert_eq!(map.extent(Side::X), 192);
    map.validate();
}
