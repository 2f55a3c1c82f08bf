use nodepool::{FixedBucketStorage, Global, HeapBuckets, NodePtr};

type Heads = FixedBucketStorage<NodePtr<u64>, 7>;

#[test]
fn test_fresh_storage_is_empty() {
    let storage = Heads::new();
    assert_eq!(storage.bucket_count(), 7);
    assert!(storage.heads().iter().all(Option::is_none));
    assert!(storage.sentinel_intact());
    assert_eq!(storage.inline_ptr(), storage.with_sentinel().as_ptr());
}

#[test]
fn test_sentinel_stays_empty_through_growth() {
    let global = Global::named("bucket test");
    let mut storage = Heads::new();
    storage.heads_mut().fill(Some(NodePtr::Inline(3)));
    assert!(storage.sentinel_intact());

    for count in [11, 23, 47] {
        let heap = HeapBuckets::allocate(count, &global).unwrap();
        if let Some(old) = storage.install(heap) {
            unsafe { old.release(&global) };
        }
        assert_eq!(storage.bucket_count(), count);
        assert_eq!(storage.heads().len(), count);
        assert!(storage.heads().iter().all(Option::is_none));
        storage.heads_mut().fill(Some(NodePtr::Inline(1)));
        assert!(storage.sentinel_intact());
    }

    if let Some(heap) = storage.reset_inline() {
        unsafe { heap.release(&global) };
    }
    assert!(!storage.is_spilled());
    assert_eq!(storage.bucket_count(), 7);
}

#[test]
fn test_inline_array_moves_with_owner() {
    let mut storage = Heads::new();
    storage.heads_mut()[4] = Some(NodePtr::Inline(9));
    let moved = Box::new(storage);
    assert_eq!(moved.heads()[4], Some(NodePtr::Inline(9)));
    assert_eq!(moved.inline_ptr(), moved.heads().as_ptr());
    assert!(moved.sentinel_intact());
}
