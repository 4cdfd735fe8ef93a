use std::rc::{Rc, Weak};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rbtree_collections::{Entry, Error, Map, StrWeakMap, WeakValueMap};

fn dead<T>(value: T) -> Weak<T> {
    let owner = Rc::new(value);
    Rc::downgrade(&owner)
}

// ─── Liveness gate ───────────────────────────────────────────────────────────

#[test]
fn dead_referents_are_rejected_without_mutation() {
    let mut map = StrWeakMap::new();
    let alive = Rc::new(1);
    let item = map.add("a".to_string(), Rc::downgrade(&alive)).unwrap();

    assert_eq!(map.add("b".to_string(), dead(2)), Err(Error::StrongIsInvalid));
    assert_eq!(map.set("a".to_string(), dead(3)).err(), Some(Error::StrongIsInvalid));
    assert_eq!(map.set("c".to_string(), dead(4)).err(), Some(Error::StrongIsInvalid));
    assert_eq!(map.entry_set_value(item, dead(5)).err(), Some(Error::StrongIsInvalid));

    assert_eq!(map.len(), 1);
    assert!(!map.contains("b"));
    assert_eq!(*map.upgrade("a").unwrap(), 1);
}

#[test]
fn liveness_is_checked_before_duplicates() {
    let mut map = WeakValueMap::new();
    let owner = Rc::new("x");
    map.add(1, Rc::downgrade(&owner)).unwrap();

    assert_eq!(map.add(1, dead("y")), Err(Error::StrongIsInvalid));
    assert_eq!(map.add(1, Rc::downgrade(&owner)), Err(Error::KeyAlreadyExists));
}

#[test]
fn stale_item_wins_over_dead_referent() {
    let mut map = WeakValueMap::new();
    let owner = Rc::new(0u8);
    let item = map.add(1, Rc::downgrade(&owner)).unwrap();
    map.remove(&1).unwrap();

    assert_eq!(map.entry_set_value(item, dead(1)).err(), Some(Error::ItemIsInvalid));
}

#[test]
fn entries_whose_referent_died_can_be_removed() {
    let mut map = StrWeakMap::new();
    let a = Rc::new('a');
    let b = Rc::new('b');
    map.add("a".to_string(), Rc::downgrade(&a)).unwrap();
    let item_b = map.add("b".to_string(), Rc::downgrade(&b)).unwrap();

    drop(a);
    drop(b);
    assert_eq!(map.upgrade("a").err(), Some(Error::StrongIsInvalid));
    assert_eq!(map.remove("a"), Ok(()));
    assert_eq!(map.remove_item(item_b), Ok(()));
    assert!(map.is_empty());
}

#[test]
fn replacing_a_live_handle_returns_the_old_one() {
    let mut map = WeakValueMap::new();
    let first = Rc::new(1);
    let second = Rc::new(2);

    assert!(map.set(7, Rc::downgrade(&first)).unwrap().is_none());
    let old = map.set(7, Rc::downgrade(&second)).unwrap().unwrap();
    assert!(Rc::ptr_eq(&old.upgrade().unwrap(), &first));
    assert!(Rc::ptr_eq(&map.upgrade(&7).unwrap(), &second));
}

#[test]
fn map_never_keeps_referents_alive() {
    let mut map = WeakValueMap::new();
    let owner = Rc::new(String::from("payload"));
    map.add(1, Rc::downgrade(&owner)).unwrap();

    assert_eq!(Rc::strong_count(&owner), 1);
    assert_eq!(Rc::weak_count(&owner), 1);

    map.clear();
    assert_eq!(Rc::weak_count(&owner), 0);
}

#[test]
fn copy_stops_at_a_dead_referent() {
    let a = Rc::new(1);
    let b = Rc::new(2);
    let mut source = WeakValueMap::new();
    source.add(1, Rc::downgrade(&a)).unwrap();
    source.add(2, Rc::downgrade(&b)).unwrap();
    drop(b);

    let mut dest = WeakValueMap::new();
    assert_eq!(dest.extend_from_stream(&source), Err(Error::StrongIsInvalid));
    assert_eq!(dest.len(), 1);
    assert!(dest.contains(&1));
}

#[test]
fn sorted_search_through_the_map_trait() {
    fn keys<M, V>(map: &M) -> Vec<i32>
    where
        M: Map<Key = i32, Element = Entry<i32, V>>,
    {
        let mut out = Vec::new();
        let mut cursor = map.first();
        while let Ok(item) = cursor {
            out.push(*map.element(item).unwrap().key());
            cursor = map.next(item);
        }
        out
    }

    let owners: Vec<Rc<i32>> = (0..5).map(Rc::new).collect();
    let mut map = WeakValueMap::new();
    for owner in owners.iter().rev() {
        Map::add(&mut map, **owner * 10, Rc::downgrade(owner)).unwrap();
    }
    assert_eq!(keys(&map), [0, 10, 20, 30, 40]);
    assert_eq!(*map.entry(map.floor(&25).unwrap()).unwrap().key(), 20);
}

// ─── Model-based ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Adds a mix of live and dead handles, drops some owners, and checks that exactly the live
    /// ones survive a purge.
    #[test]
    fn purge_drops_exactly_the_released(
        plan in proptest::collection::btree_map(0i32..200, (any::<bool>(), any::<bool>()), 0..100),
    ) {
        let mut map = WeakValueMap::new();
        let mut owners = Vec::new();
        let mut expected_live = Vec::new();

        for (&key, &(live_at_add, keep)) in &plan {
            if live_at_add {
                let owner = Rc::new(key);
                prop_assert!(map.add(key, Rc::downgrade(&owner)).is_ok());
                if keep {
                    owners.push(owner);
                    expected_live.push(key);
                }
            } else {
                prop_assert_eq!(map.add(key, dead(key)), Err(Error::StrongIsInvalid));
            }
        }

        let added = plan.values().filter(|(live, _)| *live).count();
        prop_assert_eq!(map.purge_invalid(), added - expected_live.len());
        prop_assert_eq!(map.iter().map(|(k, _)| *k).collect::<Vec<_>>(), expected_live.clone());
        for key in expected_live {
            prop_assert_eq!(*map.upgrade(&key).unwrap(), key);
        }
        prop_assert_eq!(map.purge_invalid(), 0);
    }
}
