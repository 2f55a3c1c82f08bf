use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::arena::{InlineArena, Slot, NIL};
use crate::error::PoolError;
use crate::overflow::{Global, OverflowAllocator};
use crate::tracing_helpers::{debug_log, trace_log};

/// Handle to a node slot handed out by [`FixedNodeAllocator`].
///
/// Inline slots are addressed by index rather than by address, so a handle
/// stays valid when the allocator (and the container embedding it) is moved.
pub enum NodePtr<T> {
    /// Slot `index` of the inline arena
    Inline(usize),
    /// Block obtained from the overflow allocator
    Overflow(NonNull<T>),
}

impl<T> NodePtr<T> {
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self, NodePtr::Inline(_))
    }
}

impl<T> Clone for NodePtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodePtr<T> {}

impl<T> PartialEq for NodePtr<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodePtr::Inline(a), NodePtr::Inline(b)) => a == b,
            (NodePtr::Overflow(a), NodePtr::Overflow(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Eq for NodePtr<T> {}

impl<T> fmt::Debug for NodePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodePtr::Inline(index) => f.debug_tuple("Inline").field(index).finish(),
            NodePtr::Overflow(ptr) => f.debug_tuple("Overflow").field(ptr).finish(),
        }
    }
}

/// Hands out fixed-size slots for `T` from an embedded [`InlineArena`],
/// delegating to an [`OverflowAllocator`] once the arena is exhausted if
/// `OVERFLOW` is `true`.
///
/// The allocator owns raw storage only. Writing a value into a slot,
/// and dropping it before the slot is returned, is the caller's job.
///
/// Fresh slots are carved in address order by a bump index; returned slots go
/// onto an intrusive LIFO free list threaded through the slots themselves.
pub struct FixedNodeAllocator<T, const N: usize, const OVERFLOW: bool, A = Global> {
    arena: InlineArena<T, N>,
    free_head: usize,
    next_unused: usize,
    inline_in_use: usize,
    overflow_in_use: usize,
    overflow: A,
}

impl<T, const N: usize, const OVERFLOW: bool, A> FixedNodeAllocator<T, N, OVERFLOW, A>
where
    A: OverflowAllocator + Default,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_overflow(A::default())
    }
}

impl<T, const N: usize, const OVERFLOW: bool, A> Default for FixedNodeAllocator<T, N, OVERFLOW, A>
where
    A: OverflowAllocator + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, const OVERFLOW: bool, A: OverflowAllocator>
    FixedNodeAllocator<T, N, OVERFLOW, A>
{
    /// Creates an allocator with every inline slot free.
    #[must_use]
    pub fn with_overflow(overflow: A) -> Self {
        Self {
            arena: InlineArena::new(),
            free_head: NIL,
            next_unused: 0,
            inline_in_use: 0,
            overflow_in_use: 0,
            overflow,
        }
    }

    /// Marks every inline slot free again, in address order, without looking
    /// at slot contents.
    ///
    /// Overflow blocks still outstanding are forgotten, not freed: only call
    /// this once they have been released or deliberately abandoned.
    pub fn reset(&mut self) {
        trace_log!(
            inline_in_use = self.inline_in_use,
            overflow_in_use = self.overflow_in_use,
            "node allocator reset"
        );
        self.free_head = NIL;
        self.next_unused = 0;
        self.inline_in_use = 0;
        self.overflow_in_use = 0;
    }

    /// Returns a free slot.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::CapacityExceeded` if the arena is full and overflow
    /// is disabled, or forwards the overflow allocator's `PoolError::OutOfMemory`.
    pub fn allocate(&mut self) -> Result<NodePtr<T>, PoolError> {
        if self.free_head != NIL {
            let index = self.free_head;
            #[allow(unsafe_code)]
            // SAFETY: slots on the free list hold the link written by `deallocate`.
            let next = unsafe { (*self.arena.slot(index)).next_free };
            self.free_head = next;
            self.inline_in_use += 1;
            return Ok(NodePtr::Inline(index));
        }

        if self.next_unused < N {
            let index = self.next_unused;
            self.next_unused += 1;
            self.inline_in_use += 1;
            return Ok(NodePtr::Inline(index));
        }

        if !OVERFLOW {
            return Err(PoolError::CapacityExceeded { capacity: N });
        }

        debug_log!(
            capacity = N,
            allocator = self.overflow.name(),
            "inline arena exhausted, allocating node from overflow"
        );
        let block = self.overflow.allocate(Layout::new::<T>())?;
        self.overflow_in_use += 1;
        Ok(NodePtr::Overflow(block.cast()))
    }

    /// Returns a slot to the source it came from.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator, must not
    /// have been deallocated since, and any value in it must already have been
    /// dropped or moved out.
    #[allow(unsafe_code)]
    pub unsafe fn deallocate(&mut self, ptr: NodePtr<T>) {
        match ptr {
            NodePtr::Inline(index) => {
                debug_assert!(index < self.next_unused, "slot {index} was never handed out");
                let slot = self.arena.slot_mut(index);
                ptr::addr_of_mut!((*slot).next_free).write(self.free_head);
                self.free_head = index;
                self.inline_in_use -= 1;
            }
            NodePtr::Overflow(block) => {
                debug_assert!(
                    !self.arena.contains(block.as_ptr()),
                    "overflow block lies inside the inline arena"
                );
                self.overflow.deallocate(block.cast(), Layout::new::<T>());
                self.overflow_in_use -= 1;
            }
        }
    }

    /// Returns `true` if `ptr` points into this allocator's inline arena.
    #[must_use]
    pub fn owns(&self, ptr: *const T) -> bool {
        self.arena.contains(ptr)
    }

    /// Recovers the handle for a raw slot pointer, classifying it by the
    /// arena's address range.
    #[must_use]
    pub fn resolve(&self, ptr: NonNull<T>) -> NodePtr<T> {
        match self.arena.index_of(ptr.as_ptr()) {
            Some(index) => NodePtr::Inline(index),
            None => NodePtr::Overflow(ptr),
        }
    }

    /// Raw pointer to the storage behind `ptr`.
    #[must_use]
    pub fn as_ptr(&self, ptr: NodePtr<T>) -> *const T {
        match ptr {
            NodePtr::Inline(index) => self.arena.slot(index).cast(),
            NodePtr::Overflow(block) => block.as_ptr(),
        }
    }

    /// Mutable raw pointer to the storage behind `ptr`.
    #[must_use]
    pub fn as_mut_ptr(&mut self, ptr: NodePtr<T>) -> *mut T {
        match ptr {
            NodePtr::Inline(index) => self.arena.slot_mut(index).cast(),
            NodePtr::Overflow(block) => block.as_ptr(),
        }
    }

    /// Shared view resolving handles to references for the borrow's lifetime.
    #[must_use]
    pub fn view(&self) -> NodeView<'_, T> {
        NodeView {
            base: self.arena.base(),
            _marker: PhantomData,
        }
    }

    /// Exclusive view resolving handles to mutable references.
    #[must_use]
    pub fn view_mut(&mut self) -> NodeViewMut<'_, T> {
        NodeViewMut {
            base: self.arena.base_mut(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn arena(&self) -> &InlineArena<T, N> {
        &self.arena
    }

    /// Number of inline slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[must_use]
    pub const fn can_overflow(&self) -> bool {
        OVERFLOW
    }

    #[must_use]
    pub fn inline_in_use(&self) -> usize {
        self.inline_in_use
    }

    #[must_use]
    pub fn overflow_in_use(&self) -> usize {
        self.overflow_in_use
    }

    /// Slots currently handed out, from either source.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.inline_in_use + self.overflow_in_use
    }

    #[must_use]
    pub fn inline_available(&self) -> usize {
        N - self.inline_in_use
    }

    #[must_use]
    pub fn overflow_allocator(&self) -> &A {
        &self.overflow
    }

    /// Replaces the overflow delegate.
    ///
    /// Blocks already obtained from the old delegate are later returned through
    /// the new one, so a delegate that does not compare equal is only accepted
    /// while none are outstanding.
    ///
    /// # Errors
    ///
    /// `PoolError::AllocatorInUse` when overflow slots are live and `overflow`
    /// differs from the current delegate. The pool keeps its delegate.
    pub fn set_overflow_allocator(&mut self, overflow: A) -> Result<(), PoolError> {
        if self.overflow_in_use > 0 && overflow != self.overflow {
            return Err(PoolError::AllocatorInUse {
                allocator: self.overflow.name(),
                outstanding: self.overflow_in_use,
            });
        }
        self.overflow = overflow;
        Ok(())
    }

    /// Copies only the overflow delegate of `other`; the arena is never shared.
    ///
    /// # Errors
    ///
    /// As for [`FixedNodeAllocator::set_overflow_allocator`].
    pub fn copy_overflow_allocator(&mut self, other: &Self) -> Result<(), PoolError> {
        self.set_overflow_allocator(other.overflow.clone())
    }
}

impl<T, const N: usize, const OVERFLOW: bool, A: OverflowAllocator> fmt::Debug
    for FixedNodeAllocator<T, N, OVERFLOW, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedNodeAllocator")
            .field("capacity", &N)
            .field("overflow_enabled", &OVERFLOW)
            .field("inline_in_use", &self.inline_in_use)
            .field("overflow_in_use", &self.overflow_in_use)
            .field("overflow_allocator", &self.overflow.name())
            .finish()
    }
}

/// Resolves [`NodePtr`]s to shared references tied to an allocator borrow.
pub struct NodeView<'a, T> {
    base: *const Slot<T>,
    _marker: PhantomData<&'a T>,
}

impl<T> Clone for NodeView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeView<'_, T> {}

impl<'a, T> NodeView<'a, T> {
    /// # Safety
    ///
    /// `ptr` must be a live slot of the borrowed allocator holding an
    /// initialized value.
    #[allow(unsafe_code)]
    #[must_use]
    pub unsafe fn get(self, ptr: NodePtr<T>) -> &'a T {
        match ptr {
            NodePtr::Inline(index) => &*self.base.add(index).cast::<T>(),
            NodePtr::Overflow(block) => &*block.as_ptr(),
        }
    }
}

/// Resolves [`NodePtr`]s to mutable references tied to an exclusive
/// allocator borrow.
pub struct NodeViewMut<'a, T> {
    base: *mut Slot<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> NodeViewMut<'a, T> {
    /// # Safety
    ///
    /// `ptr` must be a live slot of the borrowed allocator holding an
    /// initialized value, and no other reference to that slot may exist
    /// while the returned one is alive.
    #[allow(unsafe_code)]
    #[must_use]
    pub unsafe fn get_mut(&self, ptr: NodePtr<T>) -> &'a mut T {
        match ptr {
            NodePtr::Inline(index) => &mut *self.base.add(index).cast::<T>(),
            NodePtr::Overflow(block) => &mut *block.as_ptr(),
        }
    }

    /// Raw pointer to the storage behind `ptr`, for reads that must not
    /// create a reference.
    #[must_use]
    pub fn as_ptr(&self, ptr: NodePtr<T>) -> *mut T {
        match ptr {
            NodePtr::Inline(index) => self.base.wrapping_add(index).cast(),
            NodePtr::Overflow(block) => block.as_ptr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Pool<const OVERFLOW: bool> = FixedNodeAllocator<u64, 3, OVERFLOW>;

    #[test]
    fn test_fresh_slots_in_address_order() {
        let mut pool = Pool::<false>::new();
        assert_eq!(pool.allocate(), Ok(NodePtr::Inline(0)));
        assert_eq!(pool.allocate(), Ok(NodePtr::Inline(1)));
        assert_eq!(pool.allocate(), Ok(NodePtr::Inline(2)));
        assert_eq!(pool.in_use(), 3);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut pool = Pool::<false>::new();
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        unsafe {
            pool.deallocate(a);
            pool.deallocate(b);
        }
        assert_eq!(pool.allocate(), Ok(b));
        assert_eq!(pool.allocate(), Ok(a));
        assert_eq!(pool.allocate(), Ok(NodePtr::Inline(2)));
    }

    #[test]
    fn test_exhaustion_without_overflow() {
        let mut pool = Pool::<false>::new();
        for _ in 0..3 {
            pool.allocate().unwrap();
        }
        assert_eq!(
            pool.allocate(),
            Err(PoolError::CapacityExceeded { capacity: 3 })
        );
        assert_eq!(pool.in_use(), 3);
    }

    #[test]
    fn test_exhaustion_with_overflow() {
        let mut pool = Pool::<true>::new();
        for _ in 0..3 {
            pool.allocate().unwrap();
        }
        let spilled = pool.allocate().unwrap();
        assert!(!spilled.is_inline());
        assert!(!pool.owns(pool.as_ptr(spilled)));
        assert_eq!(pool.overflow_in_use(), 1);

        unsafe { pool.deallocate(spilled) };
        assert_eq!(pool.overflow_in_use(), 0);
        assert_eq!(pool.inline_in_use(), 3);
    }

    #[test]
    fn test_resolve_uses_address_range() {
        let mut pool = Pool::<true>::new();
        let inline = pool.allocate().unwrap();
        let raw = NonNull::new(pool.as_mut_ptr(inline)).unwrap();
        assert!(pool.owns(raw.as_ptr()));
        assert_eq!(pool.resolve(raw), inline);
    }

    #[test]
    fn test_reset_restores_address_order() {
        let mut pool = Pool::<false>::new();
        let a = pool.allocate().unwrap();
        pool.allocate().unwrap();
        unsafe { pool.deallocate(a) };
        pool.reset();
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.allocate(), Ok(NodePtr::Inline(0)));
        assert_eq!(pool.allocate(), Ok(NodePtr::Inline(1)));
    }

    #[test]
    fn test_views_resolve_written_values() {
        let mut pool = Pool::<true>::new();
        let mut handles = [NodePtr::Inline(0); 4];
        for (i, handle) in handles.iter_mut().enumerate() {
            *handle = pool.allocate().unwrap();
            unsafe { pool.as_mut_ptr(*handle).write(i as u64 * 10) };
        }
        let view = pool.view();
        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(unsafe { *view.get(*handle) }, i as u64 * 10);
        }
        for handle in handles {
            unsafe { pool.deallocate(handle) };
        }
    }
}
