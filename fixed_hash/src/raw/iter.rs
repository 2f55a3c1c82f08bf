use core::iter::FusedIterator;

use nodepool::{NodeView, NodeViewMut, OverflowAllocator};

use super::{Link, Node, RawTable};
use crate::hash_code::HashCodePolicy;

/// Walks buckets in index order and each chain front to back, stopping at
/// the sentinel slot.
pub(crate) struct RawIter<'a, T, C: HashCodePolicy> {
    heads: &'a [Link<T, C>],
    view: NodeView<'a, Node<T, C>>,
    bucket: usize,
    next: Link<T, C>,
    remaining: usize,
}

impl<'a, T, C: HashCodePolicy> RawIter<'a, T, C> {
    pub(super) fn new(
        heads: &'a [Link<T, C>],
        view: NodeView<'a, Node<T, C>>,
        remaining: usize,
    ) -> Self {
        Self {
            heads,
            view,
            bucket: 0,
            next: None,
            remaining,
        }
    }
}

impl<T, C: HashCodePolicy> Clone for RawIter<'_, T, C> {
    fn clone(&self) -> Self {
        Self {
            heads: self.heads,
            view: self.view,
            bucket: self.bucket,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, T, C: HashCodePolicy> Iterator for RawIter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(p) = self.next {
                #[allow(unsafe_code)]
                // SAFETY: chains only hold live nodes, and the shared borrow
                // behind `view` keeps them alive and unchanged for 'a.
                let node = unsafe { self.view.get(p) };
                self.next = node.next;
                self.remaining -= 1;
                return Some(&node.value);
            }
            if self.remaining == 0 || self.bucket + 1 >= self.heads.len() {
                return None;
            }
            self.next = self.heads[self.bucket];
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C: HashCodePolicy> ExactSizeIterator for RawIter<'_, T, C> {}
impl<T, C: HashCodePolicy> FusedIterator for RawIter<'_, T, C> {}

pub(crate) struct RawIterMut<'a, T, C: HashCodePolicy> {
    heads: &'a [Link<T, C>],
    view: NodeViewMut<'a, Node<T, C>>,
    bucket: usize,
    next: Link<T, C>,
    remaining: usize,
}

impl<'a, T, C: HashCodePolicy> RawIterMut<'a, T, C> {
    pub(super) fn new(
        heads: &'a [Link<T, C>],
        view: NodeViewMut<'a, Node<T, C>>,
        remaining: usize,
    ) -> Self {
        Self {
            heads,
            view,
            bucket: 0,
            next: None,
            remaining,
        }
    }
}

impl<'a, T, C: HashCodePolicy> Iterator for RawIterMut<'a, T, C> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(p) = self.next {
                #[allow(unsafe_code)]
                // SAFETY: each live node is reached exactly once during the
                // walk, so the references handed out never alias.
                let node = unsafe { self.view.get_mut(p) };
                self.next = node.next;
                self.remaining -= 1;
                return Some(&mut node.value);
            }
            if self.remaining == 0 || self.bucket + 1 >= self.heads.len() {
                return None;
            }
            self.next = self.heads[self.bucket];
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C: HashCodePolicy> ExactSizeIterator for RawIterMut<'_, T, C> {}
impl<T, C: HashCodePolicy> FusedIterator for RawIterMut<'_, T, C> {}

/// A run of adjacent nodes within one chain.
pub(crate) struct RawChain<'a, T, C: HashCodePolicy> {
    view: NodeView<'a, Node<T, C>>,
    next: Link<T, C>,
    remaining: usize,
}

impl<'a, T, C: HashCodePolicy> RawChain<'a, T, C> {
    pub(super) fn new(view: NodeView<'a, Node<T, C>>, first: Link<T, C>, remaining: usize) -> Self {
        Self {
            view,
            next: first,
            remaining,
        }
    }
}

impl<T, C: HashCodePolicy> Clone for RawChain<'_, T, C> {
    fn clone(&self) -> Self {
        Self {
            view: self.view,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, T, C: HashCodePolicy> Iterator for RawChain<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let p = self.next?;
        #[allow(unsafe_code)]
        // SAFETY: see `RawIter::next`.
        let node = unsafe { self.view.get(p) };
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C: HashCodePolicy> ExactSizeIterator for RawChain<'_, T, C> {}
impl<T, C: HashCodePolicy> FusedIterator for RawChain<'_, T, C> {}

/// Owning iterator; unvisited elements are dropped with the table.
pub(crate) struct RawIntoIter<
    T,
    const N: usize,
    const B: usize,
    const OVERFLOW: bool,
    A: OverflowAllocator,
    C: HashCodePolicy,
> {
    table: RawTable<T, N, B, OVERFLOW, A, C>,
    cursor: usize,
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> RawIntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    pub(crate) fn new(table: RawTable<T, N, B, OVERFLOW, A, C>) -> Self {
        Self { table, cursor: 0 }
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> Iterator
    for RawIntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.table.pop_from(&mut self.cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len(), Some(self.table.len()))
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> ExactSizeIterator
    for RawIntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> FusedIterator
    for RawIntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}
