use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use core::ops::Index;

use nodepool::{Global, OverflowAllocator, PoolError};

use crate::hash_code::{HashCodePolicy, UncachedHash};
use crate::raw::{make_hash, NodeRef, RawIntoIter, RawIter, RawIterMut, RawTable};
use crate::{DefaultHashBuilder, Result};

/// A hash map with unique keys whose nodes live in an inline arena of `N`
/// slots and whose bucket array starts out as `B` inline heads.
///
/// - `OVERFLOW`: once the arena is full (or the load factor calls for more
///   buckets), take memory from the overflow allocator `A`. When `false`,
///   inserting the `N + 1`-th element fails with
///   [`PoolError::CapacityExceeded`] and the bucket count never changes.
/// - `S`: hash builder, [`DefaultHashBuilder`] unless given.
/// - `C`: [`UncachedHash`] recomputes hashes on rehash; [`CachedHash`]
///   stores them in the nodes.
///
/// Every insertion returns a [`Result`]; nothing in the map panics on
/// exhaustion except the `Clone`, `FromIterator` and `Extend` impls, which
/// have `try_` twins.
///
/// ```
/// use fixed_hash::FixedHashMap;
///
/// let mut ports: FixedHashMap<&str, u16, 4, 7, false> = FixedHashMap::new();
/// ports.insert("http", 80).unwrap();
/// ports.insert("https", 443).unwrap();
/// assert_eq!(ports.get("https"), Some(&443));
/// assert_eq!(ports.insert("http", 8080).unwrap(), Some(80));
/// assert_eq!(ports.len(), 2);
/// ```
///
/// [`CachedHash`]: crate::CachedHash
pub struct FixedHashMap<
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
    FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    S: Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    /// Creates an empty map with `B` buckets and no heap memory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher_and_allocator(S::default(), A::default())
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
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

    /// Inline node capacity. With overflow enabled the map can hold more.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        N
    }

    #[must_use]
    pub const fn can_overflow(&self) -> bool {
        OVERFLOW
    }

    /// Returns `true` while any node or the bucket array is held in
    /// overflow memory.
    #[must_use]
    pub fn has_overflowed(&self) -> bool {
        self.table.has_overflowed()
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Length of the chain in bucket `index`; zero if out of range.
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

    /// Takes effect from the next insertion. A map that cannot overflow
    /// keeps its pinned load factor and ignores the request, as does any map
    /// given a value that is not a finite positive number.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.table.set_max_load_factor(max_load_factor);
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    pub fn overflow_allocator(&self) -> &A {
        self.table.nodes().overflow_allocator()
    }

    /// Replaces the overflow allocator.
    ///
    /// # Errors
    ///
    /// `PoolError::AllocatorInUse` when overflow nodes or a grown bucket
    /// array are live and `overflow` does not compare equal to the current
    /// allocator. The map keeps its allocator; after
    /// [`clear_and_free_buckets`](Self::clear_and_free_buckets) any
    /// allocator is accepted.
    pub fn set_overflow_allocator(&mut self, overflow: A) -> Result<()> {
        self.table.set_overflow_allocator(overflow)
    }

    /// Drops every element. A grown bucket array is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Drops every element and returns to the inline bucket array, releasing
    /// all overflow memory.
    pub fn clear_and_free_buckets(&mut self) {
        self.table.clear_and_free_buckets();
    }

    /// Empties the map without running any destructor. Overflow nodes are
    /// leaked; a grown bucket array is released.
    pub fn reset_lose_memory(&mut self) {
        self.table.reset_lose_memory();
    }

    /// Exchanges the contents of two maps, overflow allocators included.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.table.retain(|entry| f(&entry.0, &mut entry.1));
    }

    /// Iterates in bucket order, each chain front to back.
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

    /// Address of this instance's node arena. Unchanged by inserting into
    /// the map, different for every map.
    #[must_use]
    pub fn inline_buffer_ptr(&self) -> *const u8 {
        self.table.nodes().arena().as_ptr()
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn find<Q>(&self, key: &Q) -> Option<NodeRef<(K, V), C>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table.find(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
    }

    fn insert_absent(&mut self, hash: u64, key: K, value: V) -> Result<NodeRef<(K, V), C>> {
        let hash_builder = &self.hash_builder;
        self.table
            .insert_new(hash, (key, value), |(k, _)| make_hash(hash_builder, k))
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// An existing entry keeps its key and gets the new value, without
    /// allocating.
    ///
    /// # Errors
    ///
    /// `PoolError::CapacityExceeded` when the key is new and the arena is
    /// full with overflow disabled; any error of the overflow allocator
    /// otherwise. No element is inserted or removed on error, though the
    /// bucket array may already have grown.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = make_hash(&self.hash_builder, &key);
        if let Some(p) = self.table.find(hash, |(k, _)| *k == key) {
            return Ok(Some(mem::replace(&mut self.table.get_mut(p).1, value)));
        }
        self.insert_absent(hash, key, value)?;
        Ok(None)
    }

    /// Like `insert`, but an existing entry is replaced as a whole, key
    /// included, and returned.
    pub(crate) fn replace_entry(&mut self, key: K, value: V) -> Result<Option<(K, V)>> {
        let hash = make_hash(&self.hash_builder, &key);
        if let Some(p) = self.table.find(hash, |(k, _)| *k == key) {
            return Ok(Some(mem::replace(self.table.get_mut(p), (key, value))));
        }
        self.insert_absent(hash, key, value)?;
        Ok(None)
    }

    /// Inserts `value` only if `key` is absent. Returns the value stored
    /// under `key` and whether it was inserted.
    ///
    /// # Errors
    ///
    /// As for [`insert`](Self::insert).
    pub fn get_or_insert(&mut self, key: K, value: V) -> Result<(&mut V, bool)> {
        let hash = make_hash(&self.hash_builder, &key);
        if let Some(p) = self.table.find(hash, |(k, _)| *k == key) {
            return Ok((&mut self.table.get_mut(p).1, false));
        }
        let p = self.insert_absent(hash, key, value)?;
        Ok((&mut self.table.get_mut(p).1, true))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|p| &self.table.get(p).1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let p = self.find(key)?;
        Some(&mut self.table.get_mut(p).1)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|p| {
            let (k, v) = self.table.get(p);
            (k, v)
        })
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// `1` if `key` is present, `0` otherwise.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        usize::from(self.contains_key(key))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .remove(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
    }

    /// Bucket that `key` hashes to under the current bucket count.
    pub fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.table.bucket_index(make_hash(&self.hash_builder, key))
    }

    /// Checks the internal structure: sentinel slot empty, every entry in
    /// the bucket its key hashes to, and element and node counts in
    /// agreement.
    #[must_use]
    pub fn validate(&self) -> bool {
        self.table
            .validate(|(k, _)| make_hash(&self.hash_builder, k))
    }

    /// Copies the map into a new instance with its own arena. Bucket count
    /// and iteration order are preserved.
    ///
    /// # Errors
    ///
    /// Whatever the overflow allocator reports while copying spilled nodes
    /// or buckets.
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

    /// Inserts every pair, stopping at the first error. Pairs inserted before
    /// the failure stay in the map.
    ///
    /// # Errors
    ///
    /// As for [`insert`](Self::insert).
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
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
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
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    /// # Panics
    ///
    /// If the overflow allocator fails; see [`FixedHashMap::try_clone`].
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(map) => map,
            Err(error) => panic!("FixedHashMap::clone: {error}"),
        }
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Extend<(K, V)>
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    /// # Panics
    ///
    /// On the first insertion error; see [`FixedHashMap::try_extend`].
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if let Err(error) = self.try_extend(iter) {
            panic!("FixedHashMap::extend: {error}");
        }
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> FromIterator<(K, V)>
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    A: OverflowAllocator + Default,
    C: HashCodePolicy,
{
    /// # Panics
    ///
    /// On the first insertion error; see [`FixedHashMap::try_from_iter`].
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, const M: usize, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C>
    TryFrom<[(K, V); M]> for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
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

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> PartialEq
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|w| *v == *w))
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Eq
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}

impl<K, Q, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> Index<&Q>
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    S: BuildHasher,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Output = V;

    /// # Panics
    ///
    /// If `key` is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("FixedHashMap: key not found"),
        }
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> fmt::Debug
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, const N: usize, const B: usize, const OVERFLOW: bool, S, A, C> IntoIterator
    for &'a FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
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
    for &'a mut FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
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
    for FixedHashMap<K, V, N, B, OVERFLOW, S, A, C>
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

/// Borrowing iterator over the entries of a [`FixedHashMap`].
pub struct Iter<'a, K, V, C: HashCodePolicy> {
    pub(crate) inner: RawIter<'a, (K, V), C>,
}

impl<K, V, C: HashCodePolicy> Clone for Iter<'_, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C: HashCodePolicy> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for Iter<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for Iter<'_, K, V, C> {}

pub struct IterMut<'a, K, V, C: HashCodePolicy> {
    pub(crate) inner: RawIterMut<'a, (K, V), C>,
}

impl<'a, K, V, C: HashCodePolicy> Iterator for IterMut<'a, K, V, C> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.0, &mut entry.1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for IterMut<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for IterMut<'_, K, V, C> {}

pub struct Keys<'a, K, V, C: HashCodePolicy> {
    pub(crate) inner: Iter<'a, K, V, C>,
}

impl<K, V, C: HashCodePolicy> Clone for Keys<'_, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C: HashCodePolicy> Iterator for Keys<'a, K, V, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for Keys<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for Keys<'_, K, V, C> {}

pub struct Values<'a, K, V, C: HashCodePolicy> {
    pub(crate) inner: Iter<'a, K, V, C>,
}

impl<K, V, C: HashCodePolicy> Clone for Values<'_, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C: HashCodePolicy> Iterator for Values<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for Values<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for Values<'_, K, V, C> {}

pub struct ValuesMut<'a, K, V, C: HashCodePolicy> {
    pub(crate) inner: IterMut<'a, K, V, C>,
}

impl<'a, K, V, C: HashCodePolicy> Iterator for ValuesMut<'a, K, V, C> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCodePolicy> ExactSizeIterator for ValuesMut<'_, K, V, C> {}
impl<K, V, C: HashCodePolicy> FusedIterator for ValuesMut<'_, K, V, C> {}

/// Owning iterator over the entries of a [`FixedHashMap`].
pub struct IntoIter<
    K,
    V,
    const N: usize,
    const B: usize,
    const OVERFLOW: bool,
    A: OverflowAllocator,
    C: HashCodePolicy,
> {
    pub(crate) inner: RawIntoIter<(K, V), N, B, OVERFLOW, A, C>,
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, A, C> Iterator
    for IntoIter<K, V, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, A, C> ExactSizeIterator
    for IntoIter<K, V, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}

impl<K, V, const N: usize, const B: usize, const OVERFLOW: bool, A, C> FusedIterator
    for IntoIter<K, V, N, B, OVERFLOW, A, C>
where
    A: OverflowAllocator,
    C: HashCodePolicy,
{
}
