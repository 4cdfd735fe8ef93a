use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::ptr::NonNull;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rbtree_collections::{Entry, Error, IntIntMap, Item, StrPtrMap, TreeMap};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn key_strategy() -> impl Strategy<Value = i32> {
    -300i32..300i32
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Add(i32, i32),
    Set(i32, i32),
    Remove(i32),
    Take(i32),
    GetValue(i32),
    SetValueAt(i32, i32),
    Ceiling(i32),
    Floor(i32),
    Higher(i32),
    Lower(i32),
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        4 => (key_strategy(), any::<i32>()).prop_map(|(k, v)| MapOp::Add(k, v)),
        3 => (key_strategy(), any::<i32>()).prop_map(|(k, v)| MapOp::Set(k, v)),
        2 => key_strategy().prop_map(MapOp::Remove),
        1 => key_strategy().prop_map(MapOp::Take),
        2 => key_strategy().prop_map(MapOp::GetValue),
        1 => (key_strategy(), any::<i32>()).prop_map(|(k, v)| MapOp::SetValueAt(k, v)),
        1 => key_strategy().prop_map(MapOp::Ceiling),
        1 => key_strategy().prop_map(MapOp::Floor),
        1 => key_strategy().prop_map(MapOp::Higher),
        1 => key_strategy().prop_map(MapOp::Lower),
    ]
}

fn key_of(map: &IntIntMap, item: Result<Item, Error>) -> Option<i32> {
    item.ok().map(|item| *map.entry(item).unwrap().key())
}

// ─── Model-based ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of operations on both IntIntMap and BTreeMap and asserts
    /// identical results at every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut map = IntIntMap::new();
        let mut model: BTreeMap<i32, i32> = BTreeMap::new();

        for op in &ops {
            match *op {
                MapOp::Add(k, v) => {
                    let result = map.add(k, v);
                    if model.contains_key(&k) {
                        prop_assert_eq!(result, Err(Error::KeyAlreadyExists), "add({}, {})", k, v);
                    } else {
                        model.insert(k, v);
                        let entry = map.entry(result.unwrap()).unwrap();
                        prop_assert_eq!((entry.key(), entry.value()), (&k, &v));
                    }
                }
                MapOp::Set(k, v) => {
                    prop_assert_eq!(map.set(k, v), Ok(model.insert(k, v)), "set({}, {})", k, v);
                }
                MapOp::Remove(k) => {
                    let expected = model.remove(&k).map(drop).ok_or(Error::KeyNotFound);
                    prop_assert_eq!(map.remove(&k), expected, "remove({})", k);
                }
                MapOp::Take(k) => {
                    prop_assert_eq!(map.take(&k), model.remove(&k).ok_or(Error::KeyNotFound), "take({})", k);
                }
                MapOp::GetValue(k) => {
                    prop_assert_eq!(map.get_value(&k), model.get(&k).ok_or(Error::KeyNotFound), "get_value({})", k);
                }
                MapOp::SetValueAt(k, v) => {
                    match map.get(&k) {
                        Ok(item) => {
                            let old = model.insert(k, v);
                            prop_assert_eq!(map.entry_set_value(item, v).ok(), old);
                        }
                        Err(err) => {
                            prop_assert_eq!(err, Error::KeyNotFound);
                            prop_assert!(!model.contains_key(&k));
                        }
                    }
                }
                MapOp::Ceiling(k) => {
                    let expected = model.range((Included(k), Unbounded)).next().map(|(k, _)| *k);
                    prop_assert_eq!(key_of(&map, map.ceiling(&k)), expected, "ceiling({})", k);
                }
                MapOp::Floor(k) => {
                    let expected = model.range((Unbounded, Included(k))).next_back().map(|(k, _)| *k);
                    prop_assert_eq!(key_of(&map, map.floor(&k)), expected, "floor({})", k);
                }
                MapOp::Higher(k) => {
                    let expected = model.range((Excluded(k), Unbounded)).next().map(|(k, _)| *k);
                    prop_assert_eq!(key_of(&map, map.higher(&k)), expected, "higher({})", k);
                }
                MapOp::Lower(k) => {
                    let expected = model.range((Unbounded, Excluded(k))).next_back().map(|(k, _)| *k);
                    prop_assert_eq!(key_of(&map, map.lower(&k)), expected, "lower({})", k);
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        prop_assert!(map.iter().eq(model.iter()));
    }

    /// A full map keeps rejecting new keys but still replaces values of present ones.
    #[test]
    fn full_map_still_replaces(
        max_len in 1usize..32,
        keys in proptest::collection::vec(key_strategy(), 0..100),
    ) {
        let mut map = IntIntMap::with_max_len(max_len);
        let mut model = BTreeMap::new();

        for (i, k) in keys.into_iter().enumerate() {
            let v = i32::try_from(i).unwrap();
            if model.len() == max_len && !model.contains_key(&k) {
                prop_assert_eq!(map.set(k, v), Err(Error::MemoryAllocationFailed));
            } else {
                prop_assert_eq!(map.set(k, v), Ok(model.insert(k, v)));
            }
        }
        prop_assert!(map.iter().eq(model.iter()));
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn string_keys_by_borrowed_form() {
    let mut map: TreeMap<String, usize> = TreeMap::new();
    for (i, word) in ["delta", "alpha", "charlie", "bravo"].into_iter().enumerate() {
        map.add(word.to_string(), i).unwrap();
    }

    assert_eq!(map.get_value("charlie"), Ok(&2));
    assert_eq!(map.entry(map.ceiling("b").unwrap()).unwrap().key(), "bravo");
    assert_eq!(map.take("alpha"), Ok(1));
    assert_eq!(map.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), ["bravo", "charlie", "delta"]);
}

#[test]
fn pointer_values_are_not_owned() {
    let mut targets = [1u8, 2, 3];
    let mut map: StrPtrMap<u8> = StrPtrMap::new();
    for (name, target) in ["one", "two", "three"].into_iter().zip(targets.iter_mut()) {
        map.add(name.to_string(), NonNull::from(target)).unwrap();
    }

    let ptr = *map.get_value("two").unwrap();
    map.clear();
    assert!(map.is_empty());
    assert_eq!(ptr, NonNull::from(&mut targets[1]));
    assert_eq!(targets, [1, 2, 3]);
}

#[test]
fn take_item_and_stale_items() {
    let mut map = IntIntMap::new();
    let a = map.add(1, 10).unwrap();
    let b = map.add(2, 20).unwrap();

    assert_eq!(map.take_item(a), Ok((1, 10)));
    assert_eq!(map.entry(a).err(), Some(Error::ItemIsInvalid));
    assert_eq!(map.entry_set_value(a, 0), Err(Error::ItemIsInvalid));
    assert_eq!(map.first(), Ok(b));
    assert_eq!(map.next(b), Err(Error::EndOfSequence));

    map.remove_item(b).unwrap();
    assert_eq!(map.first(), Err(Error::MapIsEmpty));
    assert_eq!(map.last(), Err(Error::MapIsEmpty));
}

#[test]
fn copy_entries_between_maps() {
    let mut source = IntIntMap::new();
    for k in 0..5 {
        source.add(k, k * 10).unwrap();
    }

    let mut dest = IntIntMap::new();
    dest.add(2, -1).unwrap();
    assert_eq!(dest.extend_from_stream(&source), Ok(4));
    assert_eq!(dest.get_value(&2), Ok(&-1));
    assert_eq!(dest.len(), 5);

    let copy = IntIntMap::from_stream(&source).unwrap();
    assert_eq!(copy, source);
}

#[test]
fn debug_formats_as_map() {
    let mut map = IntIntMap::new();
    map.add(2, 20).unwrap();
    map.add(1, 10).unwrap();
    assert_eq!(format!("{map:?}"), "{1: 10, 2: 20}");

    let entry = Entry::new("k", 7);
    assert_eq!(entry.key(), &"k");
    assert_eq!(entry.into_parts(), ("k", 7));
}
