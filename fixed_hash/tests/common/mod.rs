#![allow(dead_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use fixed_hash::{Global, OverflowAllocator, PoolError};

#[derive(Debug, Default)]
struct Counters {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
}

/// Overflow allocator that counts calls and can be told to fail.
///
/// Clones share their counters and compare equal to each other.
#[derive(Debug, Clone, Default)]
pub struct CountingAllocator {
    counters: Rc<Counters>,
    fail_after: Option<usize>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `n` allocations, then reports out of memory.
    pub fn failing_after(n: usize) -> Self {
        Self {
            counters: Rc::default(),
            fail_after: Some(n),
        }
    }

    pub fn allocations(&self) -> usize {
        self.counters.allocations.get()
    }

    pub fn deallocations(&self) -> usize {
        self.counters.deallocations.get()
    }

    pub fn outstanding(&self) -> usize {
        self.allocations() - self.deallocations()
    }
}

impl PartialEq for CountingAllocator {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.counters, &other.counters)
    }
}

impl OverflowAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, PoolError> {
        if self
            .fail_after
            .is_some_and(|limit| self.allocations() >= limit)
        {
            return Err(PoolError::OutOfMemory {
                allocator: self.name(),
                size: layout.size(),
                align: layout.align(),
            });
        }
        let ptr = Global::new().allocate(layout)?;
        self.counters.allocations.set(self.allocations() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.deallocations.set(self.deallocations() + 1);
        Global::new().deallocate(ptr, layout);
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Element that counts how many times it has been dropped.
#[derive(Debug)]
pub struct DropCounter {
    pub id: u32,
    drops: Rc<Cell<usize>>,
}

impl DropCounter {
    pub fn new(id: u32, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            id,
            drops: Rc::clone(drops),
        }
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}
