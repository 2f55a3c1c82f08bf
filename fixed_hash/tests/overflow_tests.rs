mod common;

use std::cell::Cell;
use std::mem;
use std::rc::Rc;

use common::{CountingAllocator, DropCounter};
use fixed_hash::{
    DefaultHashBuilder, FixedHashMap, FixedHashSet, PoolError, LARGE_INLINE_FOOTPRINT,
};

type CountingMap<const N: usize, const B: usize> =
    FixedHashMap<u32, u32, N, B, true, DefaultHashBuilder, CountingAllocator>;

#[test]
fn test_no_overflow_calls_within_capacity() {
    let alloc = CountingAllocator::new();
    let mut map: CountingMap<16, 17> = FixedHashMap::with_overflow_allocator(alloc.clone());

    for round in 0..10 {
        for key in 0..16 {
            map.insert(key, round).unwrap();
        }
        for key in (0..16).step_by(2) {
            assert_eq!(map.remove(&key), Some(round));
        }
        for key in (0..16).step_by(2) {
            map.insert(key + 100, round).unwrap();
        }
        map.clear();
    }

    assert_eq!(alloc.allocations(), 0);
    assert_eq!(map.bucket_count(), 17);
    assert!(!map.has_overflowed());
}

#[test]
fn test_growth_and_release() {
    let alloc = CountingAllocator::new();
    let mut map: CountingMap<4, 3> = FixedHashMap::with_overflow_allocator(alloc.clone());

    for key in 0..100 {
        map.insert(key, key + 1).unwrap();
    }
    assert_eq!(map.len(), 100);
    assert!(map.bucket_count() >= 100);
    assert!(map.load_factor() <= map.max_load_factor());
    assert!(map.validate());
    assert!((0..100).all(|key| map.get(&key) == Some(&(key + 1))));

    let total: usize = (0..map.bucket_count()).map(|i| map.bucket_size(i)).sum();
    assert_eq!(total, 100);

    map.clear();
    assert!(map.has_overflowed(), "a grown bucket array survives clear");
    assert!(map.bucket_count() > 3);

    map.clear_and_free_buckets();
    assert_eq!(map.bucket_count(), 3);
    assert!(!map.has_overflowed());
    assert_eq!(alloc.outstanding(), 0);
}

#[test]
fn test_node_allocation_failure_is_forwarded() {
    let alloc = CountingAllocator::failing_after(0);
    let mut map: CountingMap<2, 7> = FixedHashMap::with_overflow_allocator(alloc);

    map.insert(1, 1).unwrap();
    map.insert(2, 2).unwrap();
    let result = map.insert(3, 3);
    assert!(matches!(
        result,
        Err(PoolError::OutOfMemory {
            allocator: "counting",
            ..
        })
    ));
    assert_eq!(map.len(), 2);
    assert!(!map.contains_key(&3));
    assert!(map.validate());
}

#[test]
fn test_bucket_growth_failure_leaves_map_usable() {
    let alloc = CountingAllocator::failing_after(0);
    let mut map: CountingMap<8, 2> = FixedHashMap::with_overflow_allocator(alloc);

    map.insert(1, 1).unwrap();
    map.insert(2, 2).unwrap();
    assert!(map.insert(3, 3).is_err());
    assert_eq!(map.len(), 2);
    assert_eq!(map.bucket_count(), 2);
    assert!(map.validate());

    // A looser load factor lets the inline buckets take the whole arena.
    map.set_max_load_factor(4.0);
    for key in 3..=8 {
        map.insert(key, key).unwrap();
    }
    assert_eq!(map.len(), 8);
    assert_eq!(map.bucket_count(), 2);
    assert!(map.insert(9, 9).is_err());
    assert!(map.validate());
}

#[test]
fn test_fixed_map_ignores_load_factor() {
    let mut map: FixedHashMap<u32, u32, 8, 2, false> = FixedHashMap::new();
    let pinned = map.max_load_factor();
    assert!(pinned >= 10_000.0);
    map.set_max_load_factor(0.5);
    assert_eq!(map.max_load_factor(), pinned);

    for key in 0..8 {
        map.insert(key, key).unwrap();
    }
    assert_eq!(map.bucket_count(), 2);
    assert!(map.validate());
}

#[test]
fn test_reset_lose_memory_skips_destructors() {
    let alloc = CountingAllocator::new();
    let drops = Rc::new(Cell::new(0));
    let mut map: FixedHashMap<u32, DropCounter, 2, 2, true, DefaultHashBuilder, CountingAllocator> =
        FixedHashMap::with_overflow_allocator(alloc.clone());

    for id in 0..4 {
        map.insert(id, DropCounter::new(id, &drops)).unwrap();
    }
    // Two spilled nodes plus one grown bucket array.
    assert_eq!(alloc.allocations(), 3);

    map.reset_lose_memory();
    assert_eq!(drops.get(), 0);
    assert!(map.is_empty());
    assert_eq!(map.bucket_count(), 2);
    assert!(map.validate());
    // The bucket array is returned; the spilled nodes are abandoned.
    assert_eq!(alloc.outstanding(), 2);

    map.insert(9, DropCounter::new(9, &drops)).unwrap();
    assert_eq!(map.get(&9).map(|d| d.id), Some(9));
}

#[test]
fn test_destructors_run_on_clear_and_drop() {
    let drops = Rc::new(Cell::new(0));
    let mut map: FixedHashMap<u32, DropCounter, 3, 2> = FixedHashMap::new();
    for id in 0..6 {
        map.insert(id, DropCounter::new(id, &drops)).unwrap();
    }
    map.insert(0, DropCounter::new(100, &drops)).unwrap();
    assert_eq!(drops.get(), 1, "replaced value is dropped");

    map.retain(|key, _| key % 2 == 0);
    assert_eq!(drops.get(), 4);

    map.clear();
    assert_eq!(drops.get(), 7);

    map.insert(1, DropCounter::new(1, &drops)).unwrap();
    drop(map);
    assert_eq!(drops.get(), 8);
}

#[test]
fn test_into_iter_drops_unvisited_elements() {
    let drops = Rc::new(Cell::new(0));
    let mut map: FixedHashMap<u32, DropCounter, 2, 2> = FixedHashMap::new();
    for id in 0..5 {
        map.insert(id, DropCounter::new(id, &drops)).unwrap();
    }
    let mut iter = map.into_iter();
    assert_eq!(iter.len(), 5);
    let (_, first) = iter.next().unwrap();
    drop(first);
    assert_eq!(iter.len(), 4);
    drop(iter);
    assert_eq!(drops.get(), 5);
}

#[test]
fn test_swap_exchanges_spilled_and_inline() {
    let mut spilled: FixedHashSet<u32, 2, 2> = (0..20).collect();
    let mut inline: FixedHashSet<u32, 2, 2> = [100].try_into().unwrap();
    assert!(spilled.has_overflowed());

    spilled.swap(&mut inline);

    assert_eq!(spilled.len(), 1);
    assert!(spilled.contains(&100));
    assert!(!spilled.has_overflowed());
    assert_eq!(inline.len(), 20);
    assert!((0..20).all(|v| inline.contains(&v)));
    assert!(spilled.validate() && inline.validate());
}

#[test]
fn test_clone_of_spilled_map_keeps_layout() {
    let alloc = CountingAllocator::new();
    let mut map: CountingMap<4, 3> = FixedHashMap::with_overflow_allocator(alloc.clone());
    for key in 0..40 {
        map.insert(key, key * key).unwrap();
    }
    let copy = map.clone();
    assert_eq!(copy.bucket_count(), map.bucket_count());
    assert!(copy.iter().eq(map.iter()));
    assert_eq!(copy, map);
    assert!(copy.overflow_allocator() == map.overflow_allocator());

    drop(copy);
    drop(map);
    assert_eq!(alloc.outstanding(), 0);
}

#[test]
fn test_clone_reports_allocator_failure() {
    let alloc = CountingAllocator::failing_after(2);
    let mut map: CountingMap<2, 5> = FixedHashMap::with_overflow_allocator(alloc.clone());
    for key in 0..4 {
        map.insert(key, key).unwrap();
    }
    assert_eq!(alloc.allocations(), 2);
    assert!(map.try_clone().is_err());
    drop(map);
    assert_eq!(alloc.outstanding(), 0);
}

#[test]
fn test_large_footprint_threshold() {
    assert_eq!(LARGE_INLINE_FOOTPRINT, 16 * 1024);
    assert!(mem::size_of::<FixedHashMap<u64, u64, 2048, 2053>>() > LARGE_INLINE_FOOTPRINT);
    assert!(mem::size_of::<FixedHashMap<u64, u64, 16, 17>>() < LARGE_INLINE_FOOTPRINT);
}

#[test]
fn test_allocator_swap_refused_while_buckets_spilled() {
    let first = CountingAllocator::new();
    let second = CountingAllocator::new();
    let mut map: CountingMap<8, 2> = FixedHashMap::with_overflow_allocator(first.clone());
    for key in 0..3 {
        map.insert(key, key).unwrap();
    }
    assert!(map.bucket_count() > 2);
    assert_eq!(first.allocations(), 1);

    assert_eq!(
        map.set_overflow_allocator(second.clone()),
        Err(PoolError::AllocatorInUse {
            allocator: "counting",
            outstanding: 1
        })
    );
    assert!(*map.overflow_allocator() == first);

    drop(map);
    assert_eq!(first.deallocations(), 1);
    assert_eq!(second.allocations(), 0);
    assert_eq!(second.deallocations(), 0);
}

#[test]
fn test_allocator_swap_refused_while_nodes_spilled() {
    let first = CountingAllocator::new();
    let second = CountingAllocator::new();
    let mut map: CountingMap<2, 7> = FixedHashMap::with_overflow_allocator(first.clone());
    for key in 1..=3 {
        map.insert(key, key).unwrap();
    }
    assert_eq!(map.bucket_count(), 7);
    assert_eq!(first.outstanding(), 1);

    assert!(map.set_overflow_allocator(second.clone()).is_err());
    // An equal allocator is always accepted.
    map.set_overflow_allocator(first.clone()).unwrap();

    assert_eq!(map.remove(&3), Some(3));
    assert_eq!(first.outstanding(), 0);
    map.set_overflow_allocator(second.clone()).unwrap();
    assert!(*map.overflow_allocator() == second);

    map.insert(3, 3).unwrap();
    drop(map);
    assert_eq!(first.allocations(), 1);
    assert_eq!(second.allocations(), 1);
    assert_eq!(second.outstanding(), 0);
}

#[test]
fn test_allocator_swap_allowed_after_freeing_buckets() {
    let first = CountingAllocator::new();
    let second = CountingAllocator::new();
    let mut set: FixedHashSet<u32, 4, 2, true, DefaultHashBuilder, CountingAllocator> =
        FixedHashSet::with_overflow_allocator(first.clone());
    for v in 0..6 {
        set.insert(v).unwrap();
    }
    assert!(set.set_overflow_allocator(second.clone()).is_err());

    set.clear_and_free_buckets();
    set.set_overflow_allocator(second.clone()).unwrap();
    assert_eq!(first.outstanding(), 0);

    for v in 0..6 {
        set.insert(v).unwrap();
    }
    drop(set);
    assert!(second.allocations() > 0);
    assert_eq!(second.outstanding(), 0);
}

#[test]
fn test_unusable_load_factor_is_ignored() {
    let mut map: CountingMap<4, 3> = FixedHashMap::new();
    let before = map.max_load_factor();
    for bad in [0.0, -2.0, f32::NAN, f32::INFINITY] {
        map.set_max_load_factor(bad);
        assert_eq!(map.max_load_factor(), before);
    }

    for key in 0..20 {
        map.insert(key, key).unwrap();
    }
    assert!(map.load_factor() <= map.max_load_factor());
    assert!(map.validate());
}

#[test]
fn test_node_failure_after_bucket_growth_keeps_elements() {
    let alloc = CountingAllocator::failing_after(1);
    let mut map: CountingMap<2, 2> = FixedHashMap::with_overflow_allocator(alloc.clone());
    map.insert(1, 10).unwrap();
    map.insert(2, 20).unwrap();

    assert!(matches!(
        map.insert(3, 30),
        Err(PoolError::OutOfMemory { .. })
    ));
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&10));
    assert_eq!(map.get(&2), Some(&20));
    assert!(!map.contains_key(&3));
    // The bucket array grew before the node allocation failed.
    assert!(map.bucket_count() > 2);
    assert!(map.validate());

    drop(map);
    assert_eq!(alloc.outstanding(), 0);
}
