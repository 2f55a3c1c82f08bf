use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;

use nodepool::{Global, OverflowAllocator, PoolError};

use crate::hash_code::{HashCodePolicy, UncachedHash};
use crate::map::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::raw::{make_hash, RawChain, RawIntoIter, RawTable};
use crate::{DefaultHashBuilder, Result};

/// A hash map that keeps every inserted pair, equal keys included.
///
/// Entries with equal keys sit next to each other in their chain, so
/// [`get_all`](Self::get_all) and [`equal_range`](Self::equal_range) walk a
/// single run. Storage and the generic parameters are as for
/// [`FixedHashMap`](crate::FixedHashMap).
///
/// ```
/// use fixed_hash::FixedHashMultimap;
///
/// let mut tags: FixedHashMultimap<&str, u8, 8, 5, false> = FixedHashMultimap::new();
/// tags.insert("a", 1).unwrap();
/// tags.insert("b", 2).unwrap();
/// tags.insert("a", 3).unwrap();
/// assert_eq!(tags.count("a"), 2);
/// let mut values: Vec<u8> = tags.get_all("a").copied().collect();
/// values.sort_unstable();
/// assert_eq!(values, [1, 3]);
/// assert_eq!(tags.remove_all("a"), 2);
/// ```
pub struct FixedHashMultimap<
    K,
    V,
    const N: usize,
    const B: usize,
    const OVERFLOW: bool = true,
    S = DefaultHashBuilder,
    A: OverflowAllocator = Global,
    C: HashCodePolicy = UncachedHash,
> {
    table: RawTable<(K, V), N, B, OVERFLOW, A, C>,
    hash_builder: S,
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    S: Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher_and_allocator(S::default(), A::default())
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    pub fn with_hasher(hash_builder: S) -> Self
    where
        A: Default,
    {
        Self::with_hasher_and_allocator(hash_builder, A::default())
    }

    pub fn with_overflow_allocator(overflow: A) -> Self
    where
        S: Default,
    {
        Self::with_hasher_and_allocator(S::default(), overflow)
    }

    pub fn with_hasher_and_allocator(hash_builder: S, overflow: A) -> Self {
        Self {
            table: RawTable::new(overflow),
            hash_builder,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
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
        self.table.has_overflowed()
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    #[must_use]
    pub fn bucket_size(&self, index: usize) -> usize {
        self.table.bucket_size(index)
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    #[must_use]
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.table.set_max_load_factor(max_load_factor);
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    pub fn overflow_allocator(&self) -> &A {
        self.table.nodes().overflow_allocator()
    }

    /// # Errors
    ///
    /// As for [`FixedHashMap::set_overflow_allocator`](crate::FixedHashMap::set_overflow_allocator).
    pub fn set_overflow_allocator(&mut self, overflow: A) -> Result<()> {
        self.table.set_overflow_allocator(overflow)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn clear_and_free_buckets(&mut self) {
        self.table.clear_and_free_buckets();
    }

    pub fn reset_lose_memory(&mut self) {
        self.table.reset_lose_memory();
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.table.retain(|entry| f(&entry.0, &mut entry.1));
    }

    /// Every pair; a key appears once per value stored under it.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter {
            inner: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, C> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V, C> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V, C> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, C> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    #[must_use]
    pub fn inline_buffer_ptr(&self) -> *const u8 {
        self.table.nodes().arena().as_ptr()
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    /// Adds the pair, after any entries already stored under an equal key.
    ///
    /// # Errors
    ///
    /// `PoolError::CapacityExceeded` when the arena is full with overflow
    /// disabled; any error of the overflow allocator otherwise.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let hash = make_hash(&self.hash_builder, &key);
        let hash_builder = &self.hash_builder;
        self.table.insert_equal(
            hash,
            (key, value),
            |(stored, _), (new, _)| stored == new,
            |(k, _)| make_hash(hash_builder, k),
        )?;
        Ok(())
    }

    /// First value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|p| &self.table.get(p).1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        let p = self
            .table
            .find(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)?;
        Some(&mut self.table.get_mut(p).1)
    }

    /// All entries stored under `key`, as one contiguous run.
    pub fn equal_range<Q>(&self, key: &Q) -> EqualRange<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        EqualRange {
            inner: self
                .table
                .equal_range(hash, |(k, _)| Borrow::<Q>::borrow(k) == key),
        }
    }

    /// All values stored under `key`.
    pub fn get_all<Q>(&self, key: &Q) -> GetAll<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        GetAll {
            inner: self.equal_range(key),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .count(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
    }

    /// Removes the first entry stored under `key`.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .remove(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes every entry stored under `key` and returns how many there were.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .remove_all(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
    }

    pub fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.table.bucket_index(make_hash(&self.hash_builder, key))
    }

    #[must_use]
    pub fn validate(&self) -> bool {
        self.table
            .validate(|(k, _)| make_hash(&self.hash_builder, k))
    }

    /// # Errors
    ///
    /// Whatever the overflow allocator reports while copying.
    pub fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        Ok(Self {
            table: self.table.try_clone_with(|(k, v)| (k.clone(), v.clone()))?,
            hash_builder: self.hash_builder.clone(),
        })
    }

    /// # Errors
    ///
    /// As for [`insert`](Self::insert); earlier pairs stay inserted.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// As for [`insert`](Self::insert).
    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
        A: Default,
    {
        let mut map = Self::with_hasher_and_allocator(S::default(), A::default());
        map.try_extend(iter)?;
        Ok(map)
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Default
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    S: Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Clone
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(map) => map,
            Err(error) => panic!("FixedHashMultimap::clone: {error}"),
        }
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Extend<(K, V)>
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if let Err(error) = self.try_extend(iter) {
            panic!("FixedHashMultimap::extend: {error}");
        }
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> FromIterator<(K, V)>
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, const M: usize, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    TryFrom<[(K, V); M]> for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    type Error = PoolError;

    fn try_from(pairs: [(K, V); M]) -> Result<Self> {
        Self::try_from_iter(pairs)
    }
}

/// Equal as multisets of pairs: every pair occurs as often in one map as in
/// the other.
impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> PartialEq
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                let mine = self.get_all(k).filter(|w| *w == v).count();
                let theirs = other.get_all(k).filter(|w| *w == v).count();
                mine == theirs
            })
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Eq
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> fmt::Debug
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> IntoIterator
    for &'a FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> IntoIterator
    for &'a mut FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> IntoIterator
    for FixedHashMultimap<K, V, N, B, OVERFLOW, S, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, N, B, OVERFLOW, A, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: RawIntoIter::new(self.table),
        }
    }
}

/// The run of entries sharing one key.
pub struct EqualRange<'a, K, V, C: HashCodePolicy> {
    inner: RawChain<'a, (K, V), C>,
}

impl<K, V, C: HashCodePolicy> Clone for EqualRange<'_, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C: HashCodePolicy> Iterator for EqualRange<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for EqualRange<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for EqualRange<'_, K, V, C> {}

pub struct GetAll<'a, K, V, C: HashCodePolicy> {
    inner: EqualRange<'a, K, V, C>,
}

impl<K, V, C: HashCodePolicy> Clone for GetAll<'_, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C: HashCodePolicy> Iterator for GetAll<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for GetAll<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for GetAll<'_, K, V, C> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_keys_stay_adjacent_across_growth() {
        let mut map: FixedHashMultimap<u32, u32, 4, 2> = FixedHashMultimap::new();
        for round in 0..5 {
            for key in 0..6 {
                map.insert(key, round).unwrap();
            }
        }
        assert!(map.bucket_count() > 2);
        assert!(map.validate());
        for key in 0..6 {
            assert_eq!(map.count(&key), 5);
            assert_eq!(map.equal_range(&key).len(), 5);
            assert!(map.equal_range(&key).all(|(k, _)| *k == key));
        }
    }

    #[test]
    fn test_remove_first_then_all() {
        let mut map: FixedHashMultimap<char, u8, 8, 3, false> =
            [('x', 1), ('y', 2), ('x', 3)].try_into().unwrap();
        assert!(map.remove(&'x').is_some());
        assert_eq!(map.count(&'x'), 1);
        assert_eq!(map.remove_all(&'x'), 1);
        assert_eq!(map.remove_all(&'x'), 0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: FixedHashMultimap<u8, u8, 8, 3> = [(1, 1), (1, 2), (2, 2)].try_into().unwrap();
        let b: FixedHashMultimap<u8, u8, 8, 3> = [(1, 2), (2, 2), (1, 1)].try_into().unwrap();
        let c: FixedHashMultimap<u8, u8, 8, 3> = [(1, 1), (1, 1), (2, 2)].try_into().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
