use std::collections::BTreeMap;

use fixed_hash::{CachedHash, DefaultHashBuilder, FixedHashMap, Global, PoolError};

type Map = FixedHashMap<u32, String, 8, 7, false>;

fn sorted<'a>(iter: impl Iterator<Item = (&'a u32, &'a String)>) -> Vec<(u32, String)> {
    let mut pairs: Vec<_> = iter.map(|(k, v)| (*k, v.clone())).collect();
    pairs.sort();
    pairs
}

#[test]
fn test_basic_operations() {
    let mut map = Map::new();
    assert!(map.is_empty());
    assert_eq!(map.max_size(), 8);
    assert!(!map.can_overflow());
    assert_eq!(map.bucket_count(), 7);

    assert_eq!(map.insert(1, "one".into()).unwrap(), None);
    assert_eq!(map.insert(2, "two".into()).unwrap(), None);
    assert_eq!(map.len(), 2);
    assert!(map.contains_key(&1));
    assert_eq!(map.count(&2), 1);
    assert_eq!(map.count(&3), 0);
    assert_eq!(map.get(&1).map(String::as_str), Some("one"));
    assert_eq!(map[&2], "two");

    map.get_mut(&2).unwrap().push('!');
    assert_eq!(map[&2], "two!");

    assert_eq!(map.remove(&1).as_deref(), Some("one"));
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.len(), 1);
    assert!(map.validate());
}

#[test]
#[should_panic(expected = "key not found")]
fn test_index_missing_key_panics() {
    let map = Map::new();
    let _ = &map[&42];
}

#[test]
fn test_iteration_visits_every_entry_once() {
    let map: Map = (0..8).map(|k| (k, k.to_string())).collect();
    assert_eq!(map.iter().len(), 8);
    let expected: Vec<_> = (0..8).map(|k| (k, k.to_string())).collect();
    assert_eq!(sorted(map.iter()), expected);

    let mut keys: Vec<u32> = map.keys().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, (0..8).collect::<Vec<_>>());
    assert_eq!(map.values().count(), 8);

    // Borrowing IntoIterator matches iter().
    assert_eq!((&map).into_iter().count(), 8);
}

#[test]
fn test_iteration_order_follows_buckets() {
    let map: FixedHashMap<u32, (), 16, 5, false> = (0..12).map(|k| (k, ())).collect();
    let buckets: Vec<usize> = map.keys().map(|k| map.bucket_index(k)).collect();
    assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
    let total: usize = (0..5).map(|i| map.bucket_size(i)).sum();
    assert_eq!(total, 12);
    assert_eq!(map.bucket_size(5), 0);
}

#[test]
fn test_mutation_through_iterators() {
    let mut map: FixedHashMap<u32, u32, 8, 7, false> = (0..5).map(|k| (k, k)).collect();
    for (_, v) in map.iter_mut() {
        *v *= 10;
    }
    for v in map.values_mut() {
        *v += 1;
    }
    for (k, v) in &mut map {
        assert_eq!(*v, *k * 10 + 1);
    }
    let mut drained: Vec<(u32, u32)> = map.into_iter().collect();
    drained.sort_unstable();
    assert_eq!(drained, vec![(0, 1), (1, 11), (2, 21), (3, 31), (4, 41)]);
}

#[test]
fn test_retain() {
    let mut map: FixedHashMap<u32, u32, 16, 7> = (0..16).map(|k| (k, k)).collect();
    map.retain(|k, v| {
        *v += 100;
        k % 3 == 0
    });
    assert_eq!(map.len(), 6);
    assert!(map.iter().all(|(k, v)| k % 3 == 0 && *v == k + 100));
    assert!(map.validate());
}

#[test]
fn test_try_from_iter_reports_capacity() {
    let result = FixedHashMap::<u32, u32, 3, 3, false>::try_from_iter((0..4).map(|k| (k, k)));
    assert_eq!(
        result.err(),
        Some(PoolError::CapacityExceeded { capacity: 3 })
    );

    // Duplicate keys do not use up capacity.
    let map = FixedHashMap::<u32, u32, 3, 3, false>::try_from_iter([(1, 1), (1, 2), (2, 2)]).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map[&1], 2);
}

#[test]
#[should_panic(expected = "FixedHashMap::extend")]
fn test_extend_past_capacity_panics() {
    let mut map: FixedHashMap<u32, u32, 2, 3, false> = FixedHashMap::new();
    map.extend((0..3).map(|k| (k, k)));
}

#[test]
fn test_try_extend_keeps_prefix() {
    let mut map: FixedHashMap<u32, u32, 2, 3, false> = FixedHashMap::new();
    assert!(map.try_extend((0..3).map(|k| (k, k))).is_err());
    assert_eq!(map.len(), 2);
    assert!(map.contains_key(&0) && map.contains_key(&1));
}

#[test]
fn test_equality_and_debug() {
    let a: FixedHashMap<u8, u8, 4, 5> = [(1, 10), (2, 20)].try_into().unwrap();
    let b: FixedHashMap<u8, u8, 4, 5> = [(2, 20), (1, 10)].try_into().unwrap();
    let c: FixedHashMap<u8, u8, 4, 5> = [(1, 10), (2, 21)].try_into().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    let single: FixedHashMap<u8, u8, 4, 5> = [(7, 8)].try_into().unwrap();
    assert_eq!(format!("{single:?}"), "{7: 8}");
    assert_eq!(format!("{:?}", FixedHashMap::<u8, u8, 4, 5>::default()), "{}");
}

#[test]
fn test_clone_from_replaces_contents() {
    let source: FixedHashMap<u32, u32, 4, 5> = [(1, 1), (2, 2)].try_into().unwrap();
    let mut target: FixedHashMap<u32, u32, 4, 5> = [(9, 9)].try_into().unwrap();
    target.clone_from(&source);
    assert_eq!(target, source);
    assert!(!target.contains_key(&9));
}

#[test]
fn test_move_keeps_contents_reachable() {
    let mut map: FixedHashMap<u32, u32, 8, 7, false> = FixedHashMap::new();
    for k in 0..8 {
        map.insert(k, k + 1).unwrap();
    }
    let boxed = Box::new(map);
    assert!(boxed.validate());
    assert!((0..8).all(|k| boxed.get(&k) == Some(&(k + 1))));

    let moved = *boxed;
    assert!((0..8).all(|k| moved[&k] == k + 1));
}

#[test]
fn test_cached_and_uncached_agree() {
    type Cached = FixedHashMap<String, usize, 4, 3, true, DefaultHashBuilder, Global, CachedHash>;
    let mut cached = Cached::new();
    let mut plain: FixedHashMap<String, usize, 4, 3> = FixedHashMap::new();
    for (i, word) in "the quick brown fox jumps over the lazy dog".split(' ').enumerate() {
        cached.insert(word.to_string(), i).unwrap();
        plain.insert(word.to_string(), i).unwrap();
    }
    assert_eq!(cached.len(), plain.len());
    assert_eq!(cached.bucket_count(), plain.bucket_count());
    let mut reference = BTreeMap::new();
    for (k, v) in plain.iter() {
        reference.insert(k.clone(), *v);
    }
    for (k, v) in cached.iter() {
        assert_eq!(reference.get(k), Some(v));
    }
    assert!(cached.validate());
}

#[test]
fn test_get_or_insert_on_full_map() {
    let mut map: FixedHashMap<u32, u32, 1, 2, false> = FixedHashMap::new();
    assert!(map.get_or_insert(1, 1).unwrap().1);
    let (value, inserted) = map.get_or_insert(1, 5).unwrap();
    assert!(!inserted);
    assert_eq!(*value, 1);
    assert!(map.get_or_insert(2, 2).is_err());
}
