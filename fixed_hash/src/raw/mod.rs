//! Open-chaining hash table over a fixed node pool and bucket array.
//!
//! The table knows nothing about keys: callers pass the hash of the element
//! they are looking for together with an equality closure, and a hasher
//! closure wherever nodes may have to be redistributed.

mod iter;

use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ptr;

use nodepool::{
    FixedBucketStorage, FixedNodeAllocator, HeapBuckets, NodePtr, OverflowAllocator, PoolError,
};

use crate::hash_code::HashCodePolicy;
use crate::policy::PrimeRehashPolicy;
use crate::tracing_helpers::{debug_log, trace_log, warn_log};
use crate::Result;

pub(crate) use iter::{RawChain, RawIntoIter, RawIter, RawIterMut};

/// Inline footprint above which constructing a table on the stack is
/// likely to overflow small thread stacks.
pub const LARGE_INLINE_FOOTPRINT: usize = 16 * 1024;

pub(crate) fn make_hash<Q: Hash + ?Sized, S: BuildHasher>(hash_builder: &S, key: &Q) -> u64 {
    hash_builder.hash_one(key)
}

pub(crate) struct Node<T, C: HashCodePolicy> {
    value: T,
    next: Link<T, C>,
    hash: C::Stored,
}

pub(crate) type NodeRef<T, C> = NodePtr<Node<T, C>>;
pub(crate) type Link<T, C> = Option<NodeRef<T, C>>;

pub(crate) struct RawTable<
    T,
    const N: usize,
    const B: usize,
    const OVERFLOW: bool,
    A: OverflowAllocator,
    C: HashCodePolicy,
> {
    nodes: FixedNodeAllocator<Node<T, C>, N, OVERFLOW, A>,
    buckets: FixedBucketStorage<NodeRef<T, C>, B>,
    len: usize,
    policy: PrimeRehashPolicy,
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C>
    RawTable<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    pub(crate) fn new(overflow: A) -> Self {
        let table = Self {
            nodes: FixedNodeAllocator::with_overflow(overflow),
            buckets: FixedBucketStorage::new(),
            len: 0,
            policy: if OVERFLOW {
                PrimeRehashPolicy::new(PrimeRehashPolicy::DEFAULT_MAX_LOAD_FACTOR, B)
            } else {
                PrimeRehashPolicy::pinned(B)
            },
        };
        if mem::size_of::<Self>() > LARGE_INLINE_FOOTPRINT {
            warn_log!(
                bytes = mem::size_of::<Self>(),
                limit = LARGE_INLINE_FOOTPRINT,
                "fixed hash table with a large inline footprint constructed"
            );
        }
        table
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.bucket_count()
    }

    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    pub(crate) fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.bucket_count() as u64) as usize
    }

    pub(crate) fn bucket_size(&self, index: usize) -> usize {
        let mut link = self.buckets.heads().get(index).copied().flatten();
        let mut size = 0;
        while let Some(p) = link {
            size += 1;
            link = self.node(p).next;
        }
        size
    }

    pub(crate) fn nodes(&self) -> &FixedNodeAllocator<Node<T, C>, N, OVERFLOW, A> {
        &self.nodes
    }

    /// A spilled bucket array counts as an outstanding block of the current
    /// delegate, as do overflow nodes.
    pub(crate) fn set_overflow_allocator(&mut self, overflow: A) -> Result<()> {
        let current = self.nodes.overflow_allocator();
        if self.buckets.is_spilled() && overflow != *current {
            return Err(PoolError::AllocatorInUse {
                allocator: current.name(),
                outstanding: self.nodes.overflow_in_use() + 1,
            });
        }
        self.nodes.set_overflow_allocator(overflow)
    }

    /// `true` while any node or the bucket array lives in overflow memory.
    pub(crate) fn has_overflowed(&self) -> bool {
        self.nodes.overflow_in_use() > 0 || self.buckets.is_spilled()
    }

    pub(crate) fn max_load_factor(&self) -> f32 {
        self.policy.max_load_factor()
    }

    /// Ignored when overflow is disabled: the pinned load factor is what keeps
    /// a fixed table from ever asking for more buckets.
    pub(crate) fn set_max_load_factor(&mut self, max_load_factor: f32) {
        if OVERFLOW
            && !self
                .policy
                .set_max_load_factor(max_load_factor, self.bucket_count())
        {
            warn_log!(max_load_factor, "ignoring unusable max load factor");
        }
    }

    #[inline]
    fn node(&self, p: NodeRef<T, C>) -> &Node<T, C> {
        #[allow(unsafe_code)]
        // SAFETY: every handle reachable from a bucket chain is a live,
        // initialized node of this table's allocator.
        unsafe {
            self.nodes.view().get(p)
        }
    }

    #[inline]
    fn node_mut(&mut self, p: NodeRef<T, C>) -> &mut Node<T, C> {
        #[allow(unsafe_code)]
        // SAFETY: as in `node`, and `&mut self` rules out other references.
        unsafe {
            &mut *self.nodes.as_mut_ptr(p)
        }
    }

    #[inline]
    pub(crate) fn get(&self, p: NodeRef<T, C>) -> &T {
        &self.node(p).value
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, p: NodeRef<T, C>) -> &mut T {
        &mut self.node_mut(p).value
    }

    #[inline]
    fn matches(node: &Node<T, C>, hash: u64, eq: &mut impl FnMut(&T) -> bool) -> bool {
        C::cached(node.hash).map_or(true, |cached| cached == hash) && eq(&node.value)
    }

    fn hash_of(&self, p: NodeRef<T, C>, hasher: &impl Fn(&T) -> u64) -> u64 {
        let node = self.node(p);
        C::cached(node.hash).unwrap_or_else(|| hasher(&node.value))
    }

    pub(crate) fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<NodeRef<T, C>> {
        let mut link = self.buckets.heads()[self.bucket_index(hash)];
        while let Some(p) = link {
            let node = self.node(p);
            if Self::matches(node, hash, &mut eq) {
                return Some(p);
            }
            link = node.next;
        }
        None
    }

    /// Number of elements in the chain for `hash` that satisfy `eq`.
    pub(crate) fn count(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> usize {
        let mut link = self.buckets.heads()[self.bucket_index(hash)];
        let mut count = 0;
        while let Some(p) = link {
            let node = self.node(p);
            if Self::matches(node, hash, &mut eq) {
                count += 1;
            }
            link = node.next;
        }
        count
    }

    /// All elements equal under `eq`. Equal elements are kept adjacent in
    /// their chain, so the range is the first match and its successors.
    pub(crate) fn equal_range(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> RawChain<'_, T, C> {
        let first = self.find(hash, &mut eq);
        let mut remaining = 0;
        let mut link = first;
        while let Some(p) = link {
            let node = self.node(p);
            if !Self::matches(node, hash, &mut eq) {
                break;
            }
            remaining += 1;
            link = node.next;
        }
        RawChain::new(self.nodes.view(), first, remaining)
    }

    fn allocate_node(&mut self, hash: C::Stored, value: T, next: Link<T, C>) -> Result<NodeRef<T, C>> {
        let p = self.nodes.allocate()?;
        #[allow(unsafe_code)]
        // SAFETY: `p` was just handed out and holds no value.
        unsafe {
            self.nodes.as_mut_ptr(p).write(Node { value, next, hash });
        }
        self.len += 1;
        Ok(p)
    }

    /// Grows the bucket array ahead of one insertion if the policy asks for it.
    fn reserve_one(&mut self, hasher: &impl Fn(&T) -> u64) -> Result<()> {
        if !OVERFLOW {
            return Ok(());
        }
        let bucket_count = self.bucket_count();
        if let Some(grown) = self.policy.rehash_required(bucket_count, self.len, 1) {
            if let Err(error) = self.rehash(grown, hasher) {
                self.policy.reset(bucket_count);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Moves every node into a freshly allocated array of `new_count` buckets.
    fn rehash(&mut self, new_count: usize, hasher: &impl Fn(&T) -> u64) -> Result<()> {
        let fresh = HeapBuckets::allocate(new_count, self.nodes.overflow_allocator())?;
        debug_log!(
            from = self.bucket_count(),
            to = new_count,
            len = self.len,
            "growing bucket array"
        );

        // Detaching chain by chain keeps runs of equal elements adjacent.
        let mut pending: Link<T, C> = None;
        for index in 0..self.bucket_count() {
            let mut link = self.buckets.heads_mut()[index].take();
            while let Some(p) = link {
                link = mem::replace(&mut self.node_mut(p).next, pending);
                pending = Some(p);
            }
        }

        if let Some(old) = self.buckets.install(fresh) {
            #[allow(unsafe_code)]
            // SAFETY: spilled arrays come from this table's overflow allocator.
            unsafe {
                old.release(self.nodes.overflow_allocator());
            }
        }

        while let Some(p) = pending {
            let index = self.bucket_index(self.hash_of(p, hasher));
            let head = self.buckets.heads()[index];
            pending = mem::replace(&mut self.node_mut(p).next, head);
            self.buckets.heads_mut()[index] = Some(p);
        }
        Ok(())
    }

    /// Links `value` at the head of its chain without looking for duplicates.
    pub(crate) fn insert_new(
        &mut self,
        hash: u64,
        value: T,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<NodeRef<T, C>> {
        self.reserve_one(&hasher)?;
        let index = self.bucket_index(hash);
        let head = self.buckets.heads()[index];
        let p = self.allocate_node(C::store(hash), value, head)?;
        self.buckets.heads_mut()[index] = Some(p);
        Ok(p)
    }

    /// Links `value` right after the first element equal to it, or at the
    /// head of its chain if there is none.
    pub(crate) fn insert_equal(
        &mut self,
        hash: u64,
        value: T,
        eq: impl Fn(&T, &T) -> bool,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<NodeRef<T, C>> {
        self.reserve_one(&hasher)?;
        match self.find(hash, |existing| eq(existing, &value)) {
            Some(first) => {
                let next = self.node(first).next;
                let p = self.allocate_node(C::store(hash), value, next)?;
                self.node_mut(first).next = Some(p);
                Ok(p)
            }
            None => {
                let index = self.bucket_index(hash);
                let head = self.buckets.heads()[index];
                let p = self.allocate_node(C::store(hash), value, head)?;
                self.buckets.heads_mut()[index] = Some(p);
                Ok(p)
            }
        }
    }

    /// Moves the value out of an unlinked node and returns its slot.
    fn take_node(&mut self, p: NodeRef<T, C>) -> T {
        #[allow(unsafe_code)]
        // SAFETY: `p` is live and no longer reachable from any chain; the value
        // is read exactly once before the slot goes back to the allocator.
        let node = unsafe {
            let node = ptr::read(self.nodes.as_ptr(p));
            self.nodes.deallocate(p);
            node
        };
        self.len -= 1;
        node.value
    }

    fn unlink(&mut self, index: usize, prev: Link<T, C>, p: NodeRef<T, C>) -> T {
        let next = self.node(p).next;
        match prev {
            Some(q) => self.node_mut(q).next = next,
            None => self.buckets.heads_mut()[index] = next,
        }
        self.take_node(p)
    }

    /// Unlinks and returns the first element equal under `eq`.
    pub(crate) fn remove(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.bucket_index(hash);
        let mut prev = None;
        let mut link = self.buckets.heads()[index];
        while let Some(p) = link {
            let node = self.node(p);
            if Self::matches(node, hash, &mut eq) {
                return Some(self.unlink(index, prev, p));
            }
            link = node.next;
            prev = Some(p);
        }
        None
    }

    pub(crate) fn remove_all(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        while self.remove(hash, &mut eq).is_some() {
            removed += 1;
        }
        removed
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        for index in 0..self.bucket_count() {
            let mut prev = None;
            let mut link = self.buckets.heads()[index];
            while let Some(p) = link {
                let node = self.node_mut(p);
                link = node.next;
                if keep(&mut node.value) {
                    prev = Some(p);
                } else {
                    drop(self.unlink(index, prev, p));
                }
            }
        }
    }

    /// Pops the head of the first non-empty chain at or after `cursor`.
    pub(crate) fn pop_from(&mut self, cursor: &mut usize) -> Option<T> {
        while *cursor < self.bucket_count() {
            if let Some(p) = self.buckets.heads()[*cursor] {
                let next = self.node(p).next;
                self.buckets.heads_mut()[*cursor] = next;
                return Some(self.take_node(p));
            }
            *cursor += 1;
        }
        None
    }

    /// Drops every element and returns every slot; the bucket array is kept.
    pub(crate) fn clear(&mut self) {
        for index in 0..self.bucket_count() {
            let mut link = self.buckets.heads_mut()[index].take();
            while let Some(p) = link {
                link = self.node(p).next;
                drop(self.take_node(p));
            }
        }
        debug_assert_eq!(self.len, 0);
    }

    fn release_spilled_buckets(&mut self) {
        if let Some(heap) = self.buckets.reset_inline() {
            debug_log!(
                buckets = heap.bucket_count(),
                "releasing overflow bucket array"
            );
            #[allow(unsafe_code)]
            // SAFETY: spilled arrays come from this table's overflow allocator.
            unsafe {
                heap.release(self.nodes.overflow_allocator());
            }
        }
    }

    /// `clear()`, then back to the inline bucket array and a pristine allocator.
    pub(crate) fn clear_and_free_buckets(&mut self) {
        self.clear();
        self.release_spilled_buckets();
        self.nodes.reset();
        self.policy.reset(B);
    }

    /// Forgets every element without dropping it. Overflow nodes are leaked.
    pub(crate) fn reset_lose_memory(&mut self) {
        if self.nodes.overflow_in_use() > 0 {
            warn_log!(
                abandoned = self.nodes.overflow_in_use(),
                "reset_lose_memory abandoning overflow nodes"
            );
        }
        self.release_spilled_buckets();
        self.nodes.reset();
        self.len = 0;
        self.policy.reset(B);
    }

    pub(crate) fn iter(&self) -> RawIter<'_, T, C> {
        RawIter::new(self.buckets.with_sentinel(), self.nodes.view(), self.len)
    }

    pub(crate) fn iter_mut(&mut self) -> RawIterMut<'_, T, C> {
        RawIterMut::new(
            self.buckets.with_sentinel(),
            self.nodes.view_mut(),
            self.len,
        )
    }

    /// Deep copy into a table with its own arena, preserving chain order.
    /// Only the overflow allocator is shared with `self`.
    pub(crate) fn try_clone_with(&self, mut clone: impl FnMut(&T) -> T) -> Result<Self> {
        trace_log!(
            len = self.len,
            buckets = self.bucket_count(),
            "cloning fixed hash table"
        );
        let mut copy = Self::new(self.nodes.overflow_allocator().clone());
        if self.buckets.is_spilled() {
            let heap = HeapBuckets::allocate(self.bucket_count(), copy.nodes.overflow_allocator())?;
            let previous = copy.buckets.install(heap);
            debug_assert!(previous.is_none());
        }
        copy.policy = self.policy;

        for index in 0..self.bucket_count() {
            let mut tail: Link<T, C> = None;
            let mut link = self.buckets.heads()[index];
            while let Some(p) = link {
                let node = self.node(p);
                let q = copy.allocate_node(node.hash, clone(&node.value), None)?;
                match tail {
                    Some(t) => copy.node_mut(t).next = Some(q),
                    None => copy.buckets.heads_mut()[index] = Some(q),
                }
                tail = Some(q);
                link = node.next;
            }
        }
        Ok(copy)
    }

    /// Structural self-check: sentinel untouched, every node in the bucket
    /// its hash selects, cached hashes current, counts consistent.
    pub(crate) fn validate(&self, hasher: impl Fn(&T) -> u64) -> bool {
        if !self.buckets.sentinel_intact() {
            return false;
        }
        let mut seen = 0;
        for (index, head) in self.buckets.heads().iter().enumerate() {
            let mut link = *head;
            while let Some(p) = link {
                let node = self.node(p);
                let hash = hasher(&node.value);
                if C::cached(node.hash).is_some_and(|cached| cached != hash) {
                    return false;
                }
                if self.bucket_index(hash) != index {
                    return false;
                }
                seen += 1;
                if seen > self.len {
                    return false;
                }
                link = node.next;
            }
        }
        seen == self.len && self.nodes.in_use() == self.len
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> Drop
    for RawTable<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn drop(&mut self) {
        self.clear();
        self.release_spilled_buckets();
    }
}

// The table exclusively owns every node it links, inline or spilled.
#[allow(unsafe_code)]
unsafe impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> Send
    for RawTable<T, N, B, OVERFLOW, A, C>
where
    T: Send,
    A: OverflowAllocator + Send,
    C: HashCodePolicy,
{
}

#[allow(unsafe_code)]
unsafe impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> Sync
    for RawTable<T, N, B, OVERFLOW, A, C>
where
    T: Sync,
    A: OverflowAllocator + Sync,
    C: HashCodePolicy,
{
}
