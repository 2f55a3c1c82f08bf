use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;

use nodepool::{Global, OverflowAllocator, PoolError};

use crate::hash_code::{HashCodePolicy, UncachedHash};
use crate::map::{self, FixedHashMap};
use crate::{DefaultHashBuilder, Result};

/// A hash set backed by a [`FixedHashMap`] with `()` values.
///
/// The generic parameters mean the same as for the map.
///
/// ```
/// use fixed_hash::FixedHashSet;
///
/// let mut seen: FixedHashSet<u32, 8, 11> = FixedHashSet::new();
/// assert!(seen.insert(3).unwrap());
/// assert!(!seen.insert(3).unwrap());
/// assert!(seen.contains(&3));
/// ```
pub struct FixedHashSet<
    T,
    const N: usize,
    const B: usize,
    const OVERFLOW: bool = true,
    S = DefaultHashBuilder,
    A: OverflowAllocator = Global,
    C: HashCodePolicy = UncachedHash,
> {
    map: FixedHashMap<T, (), N, B, OVERFLOW, S, A, C>,
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    S: Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: FixedHashMap::new(),
        }
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    pub fn with_hasher(hash_builder: S) -> Self
    where
        A: Default,
    {
        Self {
            map: FixedHashMap::with_hasher(hash_builder),
        }
    }

    pub fn with_overflow_allocator(overflow: A) -> Self
    where
        S: Default,
    {
        Self {
            map: FixedHashMap::with_overflow_allocator(overflow),
        }
    }

    pub fn with_hasher_and_allocator(hash_builder: S, overflow: A) -> Self {
        Self {
            map: FixedHashMap::with_hasher_and_allocator(hash_builder, overflow),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub const fn max_size(&self) -> usize {
        N
    }

    #[must_use]
    pub const fn can_overflow(&self) -> bool {
        OVERFLOW
    }

    #[must_use]
    pub fn has_overflowed(&self) -> bool {
        self.map.has_overflowed()
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.map.bucket_count()
    }

    #[must_use]
    pub fn bucket_size(&self, index: usize) -> usize {
        self.map.bucket_size(index)
    }

    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.map.load_factor()
    }

    #[must_use]
    pub fn max_load_factor(&self) -> f32 {
        self.map.max_load_factor()
    }

    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.map.set_max_load_factor(max_load_factor);
    }

    pub fn hasher(&self) -> &S {
        self.map.hasher()
    }

    pub fn overflow_allocator(&self) -> &A {
        self.map.overflow_allocator()
    }

    /// # Errors
    ///
    /// `PoolError::AllocatorInUse` while overflow memory is live and the
    /// allocators differ.
    pub fn set_overflow_allocator(&mut self, overflow: A) -> Result<()> {
        self.map.set_overflow_allocator(overflow)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn clear_and_free_buckets(&mut self) {
        self.map.clear_and_free_buckets();
    }

    /// See [`FixedHashMap::reset_lose_memory`].
    pub fn reset_lose_memory(&mut self) {
        self.map.reset_lose_memory();
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.map.swap(&mut other.map);
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.map.retain(|value, _| f(value));
    }

    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            inner: self.map.keys(),
        }
    }

    #[must_use]
    pub fn inline_buffer_ptr(&self) -> *const u8 {
        self.map.inline_buffer_ptr()
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    /// Adds `value`, returning `false` if an equal value was already present.
    /// The stored value is left untouched in that case.
    ///
    /// # Errors
    ///
    /// See [`FixedHashMap::insert`].
    pub fn insert(&mut self, value: T) -> Result<bool> {
        self.map.get_or_insert(value, ()).map(|(_, inserted)| inserted)
    }

    /// Adds `value`, replacing and returning an equal value if present.
    ///
    /// # Errors
    ///
    /// See [`FixedHashMap::insert`].
    pub fn replace(&mut self, value: T) -> Result<Option<T>> {
        self.map
            .replace_entry(value, ())
            .map(|previous| previous.map(|(old, ())| old))
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get_key_value(value).map(|(stored, ())| stored)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(value)
    }

    pub fn count<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.count(value)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove_entry(value).map(|(stored, ())| stored)
    }

    pub fn bucket_index<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.map.bucket_index(value)
    }

    #[must_use]
    pub fn validate(&self) -> bool {
        self.map.validate()
    }

    /// # Errors
    ///
    /// See [`FixedHashMap::try_clone`].
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
        S: Clone,
    {
        Ok(Self {
            map: self.map.try_clone()?,
        })
    }

    /// # Errors
    ///
    /// See [`FixedHashMap::try_extend`].
    pub fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.insert(value)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// See [`FixedHashMap::try_extend`].
    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        S: Default,
        A: Default,
    {
        let mut set = Self::with_hasher_and_allocator(S::default(), A::default());
        set.try_extend(iter)?;
        Ok(set)
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Default
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    S: Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Clone
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash + Clone,
    S: BuildHasher + Clone,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Extend<T>
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        if let Err(error) = self.try_extend(iter) {
            panic!("FixedHashSet::extend: {error}");
        }
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> FromIterator<T>
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, const M: usize, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    TryFrom<[T; M]> for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    type Error = PoolError;

    fn try_from(values: [T; M]) -> Result<Self> {
        Self::try_from_iter(values)
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> PartialEq
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Eq
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> fmt::Debug
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    T: fmt::Debug,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> IntoIterator
    for &'a FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> IntoIterator
    for FixedHashSet<T, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = T;
    type IntoIter = IntoIter<T, N, B, OVERFLOW, A, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

pub struct Iter<'a, T, C: HashCodePolicy> {
    pub(crate) inner: map::Keys<'a, T, (), C>,
}

impl<T, C: HashCodePolicy> Clone for Iter<'_, T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T, C: HashCodePolicy> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, C: HashCodePolicy> ExactSizeIterator for Iter<'_, T, C> {}
impl<T, C: HashCodePolicy> FusedIterator for Iter<'_, T, C> {}

pub struct IntoIter<
    T,
    const N: usize,
    const B: usize,
    const OVERFLOW: bool,
    A: OverflowAllocator,
    C: HashCodePolicy,
> {
    pub(crate) inner: map::IntoIter<T, (), N, B, OVERFLOW, A, C>,
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> Iterator
    for IntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(value, ())| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> ExactSizeIterator
    for IntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}

impl<T, const N: usize, const B: usize, const OVERFLOW: bool, A, C> FusedIterator
    for IntoIter<T, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}
