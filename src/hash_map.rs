//! Chained hash table map with a fixed bucket count.
//!
//! This module provides [`HashTableMap`], a mutable key-value container that
//! resolves collisions purely by per-bucket chaining.
//!
//! # Overview
//!
//! The table owns a fixed-length array of [`BUCKET_COUNT`](HashTableMap::BUCKET_COUNT)
//! buckets. A key is hashed once and reduced modulo the bucket count to select
//! its bucket; every operation then works inside that bucket's doubly-linked
//! chain. The table never grows and is never rehashed, so average chain length
//! is unbounded as entries accumulate.
//!
//! - O(chain length) get
//! - O(chain length) insert
//! - O(chain length) remove
//! - O(1) per-bucket length
//! - O(bucket count) len and `is_empty`
//!
//! Nodes live in an arena of index-addressed slots rather than in separately
//! allocated heap nodes. Chain neighbors reference each other by slot index,
//! and every cursor dereference validates that its slot still holds a live
//! entry.
//!
//! # Traversal Order
//!
//! Buckets are visited in index order `0..BUCKET_COUNT`; within a bucket,
//! nodes are visited in insertion order (new entries append to the chain
//! tail; overwriting an existing key updates the value in place and keeps the
//! node's position). This order is the contract used by iteration, cursor
//! stepping, and cloning; equality and hashing ignore it and compare contents
//! only.
//!
//! # Examples
//!
//! ```rust
//! use arenamap::HashTableMap;
//!
//! let mut map = HashTableMap::new();
//! map.insert("one", 1);
//! map.insert("two", 2);
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&"one"), Some(&1));
//!
//! let mut cursor = map.cursor_front();
//! while !cursor.is_end() {
//!     let (_, value) = cursor.entry().unwrap();
//!     assert!(*value == 1 || *value == 2);
//!     cursor.move_next().unwrap();
//! }
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::mem;
use std::ptr;

use rustc_hash::FxBuildHasher;
use static_assertions::const_assert;

use crate::error::MapError;

/// Number of bucket chains in every table; fixed for the container's
/// lifetime.
const BUCKET_COUNT: usize = 10;

const_assert!(BUCKET_COUNT > 0);

// =============================================================================
// Bucket and Node Definitions
// =============================================================================

/// Endpoints and length of one doubly-linked bucket chain.
#[derive(Clone, Copy)]
struct Bucket {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl Bucket {
    const EMPTY: Self = Self {
        head: None,
        tail: None,
        len: 0,
    };
}

/// One entry in its bucket chain. Neighbor links are arena slot indices.
struct ChainNode<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// =============================================================================
// HashTableMap Definition
// =============================================================================

/// A chained hash table map with a fixed bucket count.
///
/// Collisions are resolved purely by per-bucket chaining: no probing, no
/// secondary hashing, no growth. A key appears in at most one node, in
/// exactly the bucket selected by hashing the key modulo
/// [`BUCKET_COUNT`](Self::BUCKET_COUNT).
///
/// The hasher defaults to [`FxBuildHasher`] and must be deterministic for
/// equal keys; any [`BuildHasher`] can be substituted through
/// [`with_hasher`](Self::with_hasher).
///
/// # Time Complexity
///
/// | Operation               | Complexity        |
/// |-------------------------|-------------------|
/// | `new`                   | O(1)              |
/// | `get`                   | O(chain length)   |
/// | `insert`                | O(chain length)   |
/// | `remove`                | O(chain length)   |
/// | `len`                   | O(bucket count)   |
/// | `bucket_len`            | O(1)              |
/// | cursor step             | O(bucket count)   |
///
/// # Examples
///
/// ```rust
/// use arenamap::HashTableMap;
///
/// let mut map = HashTableMap::new();
/// *map.get_or_insert_default("hits") += 1;
/// *map.get_or_insert_default("hits") += 1;
///
/// assert_eq!(map.get(&"hits"), Some(&2));
/// assert_eq!(map.len(), 1);
/// ```
pub struct HashTableMap<K, V, S = FxBuildHasher> {
    /// Fixed array of chain endpoints, one per bucket.
    buckets: [Bucket; BUCKET_COUNT],
    /// Arena of node slots; `None` marks a destroyed node.
    slots: Vec<Option<ChainNode<K, V>>>,
    /// Stack of vacant slot indices available for reuse.
    free: Vec<usize>,
    /// Hasher state used to select a bucket for a key.
    hasher: S,
}

impl<K, V> HashTableMap<K, V> {
    /// Creates a new empty map using the default [`FxBuildHasher`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let map: HashTableMap<i32, String> = HashTableMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_hasher(FxBuildHasher)
    }
}

impl<K, V, S> HashTableMap<K, V, S> {
    /// Number of bucket chains in every table.
    ///
    /// Fixed at compile time; the table is never resized or rehashed.
    pub const BUCKET_COUNT: usize = BUCKET_COUNT;

    /// Creates a new empty map that selects buckets with the given hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    /// use std::hash::RandomState;
    ///
    /// let map: HashTableMap<i32, i32, RandomState> =
    ///     HashTableMap::with_hasher(RandomState::new());
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_hasher(hasher: S) -> Self {
        Self {
            buckets: [Bucket::EMPTY; BUCKET_COUNT],
            slots: Vec::new(),
            free: Vec::new(),
            hasher,
        }
    }

    /// Returns a reference to the map's hasher.
    #[inline]
    pub const fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Returns the number of entries in the map.
    ///
    /// Computed as the sum of all per-bucket counts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    /// assert_eq!(map.len(), 2);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len).sum()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the chain length of the bucket at `bucket_index`, or `None` if
    /// the index is not below [`BUCKET_COUNT`](Self::BUCKET_COUNT).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(7, "seven");
    /// let bucket_index = map.bucket_of(&7);
    /// assert_eq!(map.bucket_len(bucket_index), Some(1));
    /// ```
    #[must_use]
    pub fn bucket_len(&self, bucket_index: usize) -> Option<usize> {
        self.buckets.get(bucket_index).map(|bucket| bucket.len)
    }

    /// Removes every entry, leaving the map empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.buckets = [Bucket::EMPTY; BUCKET_COUNT];
        self.slots.clear();
        self.free.clear();
    }

    /// Returns a read-only cursor positioned at the first entry, or at the
    /// end sentinel if the map is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    ///
    /// let cursor = map.cursor_front();
    /// assert_eq!(cursor.entry(), Ok((&1, &"one")));
    /// ```
    #[must_use]
    pub fn cursor_front(&self) -> HashTableMapCursor<'_, K, V, S> {
        let (bucket_index, node_index) = self.first_position();
        HashTableMapCursor {
            map: self,
            bucket_index,
            node_index,
        }
    }

    /// Returns the end sentinel cursor, one position past the last entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::{HashTableMap, MapError};
    ///
    /// let map: HashTableMap<i32, i32> = HashTableMap::new();
    /// assert_eq!(map.cursor_end().entry(), Err(MapError::NotFound));
    /// ```
    #[must_use]
    pub fn cursor_end(&self) -> HashTableMapCursor<'_, K, V, S> {
        HashTableMapCursor {
            map: self,
            bucket_index: BUCKET_COUNT,
            node_index: None,
        }
    }

    /// Returns a mutable cursor positioned at the first entry, or at the end
    /// sentinel if the map is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, 10);
    ///
    /// let mut cursor = map.cursor_front_mut();
    /// *cursor.value_mut().unwrap() += 1;
    /// assert_eq!(map.get(&1), Some(&11));
    /// ```
    pub fn cursor_front_mut(&mut self) -> HashTableMapCursorMut<'_, K, V, S> {
        let (bucket_index, node_index) = self.first_position();
        HashTableMapCursorMut {
            map: self,
            bucket_index,
            node_index,
        }
    }

    /// Returns an iterator over the entries in traversal order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// assert_eq!(map.iter().count(), 2);
    /// ```
    #[must_use]
    pub fn iter(&self) -> HashTableMapIterator<'_, K, V, S> {
        HashTableMapIterator {
            map: self,
            front: self.first_position(),
            back: self.last_position(),
            remaining: self.len(),
        }
    }

    /// Returns an iterator over the keys in traversal order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in traversal order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    // -------------------------------------------------------------------------
    // Arena access and chain navigation
    // -------------------------------------------------------------------------

    fn node(&self, node_index: usize) -> Option<&ChainNode<K, V>> {
        self.slots.get(node_index)?.as_ref()
    }

    fn node_mut(&mut self, node_index: usize) -> Option<&mut ChainNode<K, V>> {
        self.slots.get_mut(node_index)?.as_mut()
    }

    /// First traversal position: head of the first non-empty bucket.
    fn first_position(&self) -> (usize, Option<usize>) {
        for (bucket_index, bucket) in self.buckets.iter().enumerate() {
            if bucket.head.is_some() {
                return (bucket_index, bucket.head);
            }
        }
        (BUCKET_COUNT, None)
    }

    /// Last traversal position: tail of the last non-empty bucket.
    fn last_position(&self) -> (usize, Option<usize>) {
        for (bucket_index, bucket) in self.buckets.iter().enumerate().rev() {
            if bucket.tail.is_some() {
                return (bucket_index, bucket.tail);
            }
        }
        (BUCKET_COUNT, None)
    }

    /// Position following `node_index`: the chain successor, or the head of
    /// the next non-empty bucket, or the end sentinel.
    fn position_after(&self, bucket_index: usize, node_index: usize) -> (usize, Option<usize>) {
        if let Some(next_index) = self.node(node_index).and_then(|node| node.next) {
            return (bucket_index, Some(next_index));
        }
        for (index, bucket) in self.buckets.iter().enumerate().skip(bucket_index + 1) {
            if bucket.head.is_some() {
                return (index, bucket.head);
            }
        }
        (BUCKET_COUNT, None)
    }

    /// Position preceding `node_index`, or `None` when the node is the first
    /// traversal position.
    fn position_before(&self, bucket_index: usize, node_index: usize) -> Option<(usize, usize)> {
        if let Some(prev_index) = self.node(node_index).and_then(|node| node.prev) {
            return Some((bucket_index, prev_index));
        }
        for (index, bucket) in self.buckets.iter().enumerate().take(bucket_index).rev() {
            if let Some(tail_index) = bucket.tail {
                return Some((index, tail_index));
            }
        }
        None
    }

    /// Appends a fresh node to the tail of the bucket's chain and returns its
    /// slot index.
    fn append_node(&mut self, bucket_index: usize, key: K, value: V) -> usize {
        let tail_index = self.buckets[bucket_index].tail;
        let node = ChainNode {
            key,
            value,
            prev: tail_index,
            next: None,
        };
        let node_index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        match tail_index {
            Some(previous_tail) => {
                if let Some(previous) = self.node_mut(previous_tail) {
                    previous.next = Some(node_index);
                }
            }
            None => self.buckets[bucket_index].head = Some(node_index),
        }
        let bucket = &mut self.buckets[bucket_index];
        bucket.tail = Some(node_index);
        bucket.len += 1;
        node_index
    }

    /// Unlinks the node from its bucket chain, patching neighbor links or the
    /// chain endpoints, and frees its slot. Returns `None` if the slot does
    /// not hold a live node.
    fn unlink(&mut self, bucket_index: usize, node_index: usize) -> Option<ChainNode<K, V>> {
        let node = self.slots.get_mut(node_index)?.take()?;
        match node.prev {
            Some(prev_index) => {
                if let Some(previous) = self.node_mut(prev_index) {
                    previous.next = node.next;
                }
            }
            None => self.buckets[bucket_index].head = node.next,
        }
        match node.next {
            Some(next_index) => {
                if let Some(following) = self.node_mut(next_index) {
                    following.prev = node.prev;
                }
            }
            None => self.buckets[bucket_index].tail = node.prev,
        }
        let bucket = &mut self.buckets[bucket_index];
        bucket.len = bucket.len.saturating_sub(1);
        self.free.push(node_index);
        Some(node)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashTableMap<K, V, S> {
    /// Returns the index of the bucket that stores (or would store) the key.
    ///
    /// Deterministic for equal keys: the hash reduced modulo
    /// [`BUCKET_COUNT`](Self::BUCKET_COUNT).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let map: HashTableMap<u64, i32> = HashTableMap::new();
    /// assert!(map.bucket_of(&42) < HashTableMap::<u64, i32>::BUCKET_COUNT);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        (self.hasher.hash_one(key) % BUCKET_COUNT as u64) as usize
    }

    /// Scans one bucket's chain for a node whose key equals `key`.
    fn find_in_bucket<Q>(&self, bucket_index: usize, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut current = self.buckets.get(bucket_index)?.head;
        while let Some(node_index) = current {
            let node = self.node(node_index)?;
            if node.key.borrow() == key {
                return Some(node_index);
            }
            current = node.next;
        }
        None
    }

    fn find_index<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket_index = self.bucket_of(key);
        let node_index = self.find_in_bucket(bucket_index, key)?;
        Some((bucket_index, node_index))
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (_, node_index) = self.find_index(key)?;
        self.node(node_index).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (_, node_index) = self.find_index(key)?;
        self.node_mut(node_index).map(|node| &mut node.value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Returns a reference to the value for the key, failing with
    /// [`MapError::NotFound`] if the key is absent.
    ///
    /// Unlike [`get_or_insert_default`](Self::get_or_insert_default), this
    /// never materializes an entry.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotFound`] if the key is not in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::{HashTableMap, MapError};
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    ///
    /// assert_eq!(map.value_of(&1), Ok(&"one"));
    /// assert_eq!(map.value_of(&2), Err(MapError::NotFound));
    /// ```
    pub fn value_of<Q>(&self, key: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(MapError::NotFound)
    }

    /// Returns a mutable reference to the value for the key, failing with
    /// [`MapError::NotFound`] if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotFound`] if the key is not in the map.
    pub fn value_of_mut<Q>(&mut self, key: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(MapError::NotFound)
    }

    /// Returns a mutable reference to the value for `key`, inserting an entry
    /// built by `default` if the key is absent.
    ///
    /// An existing entry keeps its chain position and its value; a fresh
    /// entry is appended to the tail of its bucket's chain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.get_or_insert_with("logins", || 10);
    /// *map.get_or_insert_with("logins", || 0) += 1;
    ///
    /// assert_eq!(map.get(&"logins"), Some(&11));
    /// ```
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let bucket_index = self.bucket_of(&key);
        let node_index = match self.find_in_bucket(bucket_index, &key) {
            Some(index) => index,
            None => self.append_node(bucket_index, key, default()),
        };
        match self.slots[node_index].as_mut() {
            Some(node) => &mut node.value,
            None => unreachable!("a resolved chain index always holds a live node"),
        }
    }

    /// Returns a mutable reference to the value for `key`, inserting a
    /// default-constructed value if the key is absent.
    ///
    /// This is the subscript operation: it never fails, but always
    /// materializes an entry for an absent key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map: HashTableMap<&str, u32> = HashTableMap::new();
    /// *map.get_or_insert_default("count") += 1;
    /// assert_eq!(map.get(&"count"), Some(&1));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Inserts a key-value pair, returning the previous value if the key was
    /// already present.
    ///
    /// Overwriting mutates the existing entry's value in place: the node
    /// keeps its chain position and the stored key is untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// assert_eq!(map.insert(1, "one"), None);
    /// assert_eq!(map.insert(1, "ONE"), Some("one"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let bucket_index = self.bucket_of(&key);
        if let Some(node_index) = self.find_in_bucket(bucket_index, &key) {
            if let Some(node) = self.slots[node_index].as_mut() {
                return Some(mem::replace(&mut node.value, value));
            }
        }
        self.append_node(bucket_index, key, value);
        None
    }

    /// Removes the entry for the key, returning the stored pair.
    ///
    /// The node is unlinked from its bucket's chain (patching neighbor links
    /// or the chain endpoints), the bucket's count is decremented, and the
    /// slot is freed.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotFound`] if the key is not in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::{HashTableMap, MapError};
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    ///
    /// assert_eq!(map.remove(&1), Ok((1, "one")));
    /// assert_eq!(map.remove(&1), Err(MapError::NotFound));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, V), MapError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket_index, node_index) = self.find_index(key).ok_or(MapError::NotFound)?;
        let node = self
            .unlink(bucket_index, node_index)
            .ok_or(MapError::NotFound)?;
        Ok((node.key, node.value))
    }

    /// Returns a read-only cursor positioned at the entry for the key, or the
    /// end cursor if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    ///
    /// assert_eq!(map.find(&1).entry(), Ok((&1, &"one")));
    /// assert!(map.find(&2).is_end());
    /// ```
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> HashTableMapCursor<'_, K, V, S>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.find_index(key) {
            Some((bucket_index, node_index)) => HashTableMapCursor {
                map: self,
                bucket_index,
                node_index: Some(node_index),
            },
            None => self.cursor_end(),
        }
    }

    /// Returns a mutable cursor positioned at the entry for the key, or at
    /// the end sentinel if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    ///
    /// let mut cursor = map.find_mut(&1);
    /// assert_eq!(cursor.remove_current(), Ok((1, "one")));
    /// assert!(map.is_empty());
    /// ```
    pub fn find_mut<Q>(&mut self, key: &Q) -> HashTableMapCursorMut<'_, K, V, S>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = self.find_index(key);
        match position {
            Some((bucket_index, node_index)) => HashTableMapCursorMut {
                map: self,
                bucket_index,
                node_index: Some(node_index),
            },
            None => HashTableMapCursorMut {
                map: self,
                bucket_index: BUCKET_COUNT,
                node_index: None,
            },
        }
    }
}

// =============================================================================
// Cursor Implementation
// =============================================================================

/// A read-only bidirectional cursor over a [`HashTableMap`].
///
/// A cursor is bound to one map instance and one position: a live node (plus
/// its owning bucket index, enabling cross-bucket stepping) or the end
/// sentinel. Two cursors are equal only if they reference the same map and
/// the same position.
///
/// # Examples
///
/// ```rust
/// use arenamap::HashTableMap;
///
/// let mut map = HashTableMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// let mut seen = 0;
/// let mut cursor = map.cursor_front();
/// while !cursor.is_end() {
///     seen += 1;
///     cursor.move_next().unwrap();
/// }
/// assert_eq!(seen, 2);
/// ```
pub struct HashTableMapCursor<'a, K, V, S = FxBuildHasher> {
    map: &'a HashTableMap<K, V, S>,
    /// Owning bucket of the current node; `BUCKET_COUNT` at the end sentinel.
    bucket_index: usize,
    /// Arena slot of the current node; `None` at the end sentinel.
    node_index: Option<usize>,
}

impl<'a, K, V, S> HashTableMapCursor<'a, K, V, S> {
    /// Returns `true` if the cursor is at the end sentinel.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.node_index.is_none()
    }

    /// Returns the entry at the cursor position.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotFound`] at the end sentinel and
    /// [`MapError::InvalidPosition`] if the position no longer refers to a
    /// live node.
    pub fn entry(&self) -> Result<(&'a K, &'a V), MapError> {
        match self.node_index {
            Some(node_index) => self
                .map
                .node(node_index)
                .map(|node| (&node.key, &node.value))
                .ok_or(MapError::InvalidPosition),
            None => Err(MapError::NotFound),
        }
    }

    /// Returns the key at the cursor position.
    ///
    /// # Errors
    ///
    /// Same as [`entry`](Self::entry).
    pub fn key(&self) -> Result<&'a K, MapError> {
        self.entry().map(|(key, _)| key)
    }

    /// Returns the value at the cursor position.
    ///
    /// # Errors
    ///
    /// Same as [`entry`](Self::entry).
    pub fn value(&self) -> Result<&'a V, MapError> {
        self.entry().map(|(_, value)| value)
    }

    /// Advances to the next position in traversal order.
    ///
    /// Moving past the last entry lands on the end sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is already at the
    /// end sentinel.
    pub fn move_next(&mut self) -> Result<(), MapError> {
        let Some(node_index) = self.node_index else {
            return Err(MapError::InvalidPosition);
        };
        let (bucket_index, node_index) = self.map.position_after(self.bucket_index, node_index);
        self.bucket_index = bucket_index;
        self.node_index = node_index;
        Ok(())
    }

    /// Retreats to the previous position in traversal order.
    ///
    /// Retreating from the end sentinel lands on the last entry.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is at the first
    /// entry, or at the end sentinel of an empty map.
    pub fn move_prev(&mut self) -> Result<(), MapError> {
        match self.node_index {
            None => {
                let (bucket_index, node_index) = self.map.last_position();
                if node_index.is_none() {
                    return Err(MapError::InvalidPosition);
                }
                self.bucket_index = bucket_index;
                self.node_index = node_index;
                Ok(())
            }
            Some(node_index) => match self.map.position_before(self.bucket_index, node_index) {
                Some((bucket_index, prev_index)) => {
                    self.bucket_index = bucket_index;
                    self.node_index = Some(prev_index);
                    Ok(())
                }
                None => Err(MapError::InvalidPosition),
            },
        }
    }
}

impl<K, V, S> Clone for HashTableMapCursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for HashTableMapCursor<'_, K, V, S> {}

impl<K, V, S> fmt::Debug for HashTableMapCursor<'_, K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HashTableMapCursor")
            .field("bucket_index", &self.bucket_index)
            .field("node_index", &self.node_index)
            .finish()
    }
}

impl<K, V, S> PartialEq for HashTableMapCursor<'_, K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.map, other.map)
            && self.bucket_index == other.bucket_index
            && self.node_index == other.node_index
    }
}

impl<K, V, S> Eq for HashTableMapCursor<'_, K, V, S> {}

/// A mutable bidirectional cursor over a [`HashTableMap`].
///
/// Holds a mutable borrow of the map, so no other access can overlap its
/// lifetime. In addition to the read-only cursor operations it updates the
/// current value in place and removes the current entry.
///
/// # Examples
///
/// ```rust
/// use arenamap::HashTableMap;
///
/// let mut map = HashTableMap::new();
/// map.insert(1, 10);
/// map.insert(2, 20);
///
/// let mut cursor = map.cursor_front_mut();
/// while let Ok(value) = cursor.value_mut() {
///     *value += 1;
///     if cursor.move_next().is_err() {
///         break;
///     }
/// }
/// assert_eq!(map.get(&1), Some(&11));
/// assert_eq!(map.get(&2), Some(&21));
/// ```
pub struct HashTableMapCursorMut<'a, K, V, S = FxBuildHasher> {
    map: &'a mut HashTableMap<K, V, S>,
    bucket_index: usize,
    node_index: Option<usize>,
}

impl<K, V, S> HashTableMapCursorMut<'_, K, V, S> {
    /// Returns `true` if the cursor is at the end sentinel.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.node_index.is_none()
    }

    /// Reborrows this cursor as a read-only cursor at the same position.
    #[must_use]
    pub fn as_cursor(&self) -> HashTableMapCursor<'_, K, V, S> {
        HashTableMapCursor {
            map: &*self.map,
            bucket_index: self.bucket_index,
            node_index: self.node_index,
        }
    }

    /// Returns the entry at the cursor position.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotFound`] at the end sentinel and
    /// [`MapError::InvalidPosition`] if the position no longer refers to a
    /// live node.
    pub fn entry(&self) -> Result<(&K, &V), MapError> {
        match self.node_index {
            Some(node_index) => self
                .map
                .node(node_index)
                .map(|node| (&node.key, &node.value))
                .ok_or(MapError::InvalidPosition),
            None => Err(MapError::NotFound),
        }
    }

    /// Returns a mutable reference to the value at the cursor position.
    ///
    /// # Errors
    ///
    /// Same as [`entry`](Self::entry).
    pub fn value_mut(&mut self) -> Result<&mut V, MapError> {
        match self.node_index {
            Some(node_index) => self
                .map
                .node_mut(node_index)
                .map(|node| &mut node.value)
                .ok_or(MapError::InvalidPosition),
            None => Err(MapError::NotFound),
        }
    }

    /// Advances to the next position in traversal order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is already at the
    /// end sentinel.
    pub fn move_next(&mut self) -> Result<(), MapError> {
        let Some(node_index) = self.node_index else {
            return Err(MapError::InvalidPosition);
        };
        let (bucket_index, node_index) = self.map.position_after(self.bucket_index, node_index);
        self.bucket_index = bucket_index;
        self.node_index = node_index;
        Ok(())
    }

    /// Retreats to the previous position in traversal order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is at the first
    /// entry, or at the end sentinel of an empty map.
    pub fn move_prev(&mut self) -> Result<(), MapError> {
        match self.node_index {
            None => {
                let (bucket_index, node_index) = self.map.last_position();
                if node_index.is_none() {
                    return Err(MapError::InvalidPosition);
                }
                self.bucket_index = bucket_index;
                self.node_index = node_index;
                Ok(())
            }
            Some(node_index) => match self.map.position_before(self.bucket_index, node_index) {
                Some((bucket_index, prev_index)) => {
                    self.bucket_index = bucket_index;
                    self.node_index = Some(prev_index);
                    Ok(())
                }
                None => Err(MapError::InvalidPosition),
            },
        }
    }

    /// Removes the entry at the cursor position and advances the cursor to
    /// the following position.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is not positioned
    /// on a live entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let mut map = HashTableMap::new();
    /// map.insert(1, "one");
    ///
    /// let mut cursor = map.cursor_front_mut();
    /// assert_eq!(cursor.remove_current(), Ok((1, "one")));
    /// assert!(cursor.is_end());
    /// ```
    pub fn remove_current(&mut self) -> Result<(K, V), MapError> {
        let Some(node_index) = self.node_index else {
            return Err(MapError::InvalidPosition);
        };
        let following = self.map.position_after(self.bucket_index, node_index);
        let node = self
            .map
            .unlink(self.bucket_index, node_index)
            .ok_or(MapError::InvalidPosition)?;
        self.bucket_index = following.0;
        self.node_index = following.1;
        Ok((node.key, node.value))
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of a [`HashTableMap`] in traversal order.
pub struct HashTableMapIterator<'a, K, V, S = FxBuildHasher> {
    map: &'a HashTableMap<K, V, S>,
    front: (usize, Option<usize>),
    back: (usize, Option<usize>),
    remaining: usize,
}

impl<'a, K, V, S> Iterator for HashTableMapIterator<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_index = self.front.1?;
        let node = self.map.node(node_index)?;
        self.front = self.map.position_after(self.front.0, node_index);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> DoubleEndedIterator for HashTableMapIterator<'_, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_index = self.back.1?;
        let node = self.map.node(node_index)?;
        self.back = match self.map.position_before(self.back.0, node_index) {
            Some((bucket_index, prev_index)) => (bucket_index, Some(prev_index)),
            None => (0, None),
        };
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K, V, S> ExactSizeIterator for HashTableMapIterator<'_, K, V, S> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over the entries of a [`HashTableMap`].
pub struct HashTableMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for HashTableMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for HashTableMapIntoIterator<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for HashTableMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, S: Default> Default for HashTableMap<K, V, S> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> IntoIterator for HashTableMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = HashTableMapIntoIterator<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut order = Vec::with_capacity(self.len());
        let mut position = self.first_position();
        while let Some(node_index) = position.1 {
            order.push(node_index);
            position = self.position_after(position.0, node_index);
        }
        let entries: Vec<(K, V)> = order
            .into_iter()
            .filter_map(|node_index| {
                self.slots[node_index]
                    .take()
                    .map(|node| (node.key, node.value))
            })
            .collect();
        HashTableMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTableMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = HashTableMapIterator<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for HashTableMap<K, V, S> {
    /// Builds a map from an ordered sequence of pairs; for duplicate keys the
    /// last-seen value wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for HashTableMap<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V, const N: usize> From<[(K, V); N]> for HashTableMap<K, V> {
    /// The initializer-list construction: duplicates resolve to the
    /// last-seen value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::HashTableMap;
    ///
    /// let map = HashTableMap::from([("a", 1), ("a", 2), ("b", 3)]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(&"a"), Some(&2));
    /// ```
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

/// Content comparison: equal lengths and, for every entry of `self`, an
/// equal value stored under the same key in `other`.
///
/// Chain order within a bucket reflects insertion history, so a lockstep
/// traversal walk would distinguish maps that hold the same entries. Keyed
/// lookup makes equality depend on contents alone.
impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for HashTableMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for HashTableMap<K, V, S> {}

/// Hashes the length plus a commutative combination of per-entry hashes.
///
/// Each entry is hashed independently with a fixed [`FxHasher`] and the
/// results are folded with wrapping addition, so the hash ignores chain
/// order the same way equality does and equal maps produce equal hashes.
///
/// [`FxHasher`]: rustc_hash::FxHasher
impl<K: Hash, V: Hash, S> Hash for HashTableMap<K, V, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        let mut combined: u64 = 0;
        for (key, value) in self {
            let mut entry_hasher = rustc_hash::FxHasher::default();
            key.hash(&mut entry_hasher);
            value.hash(&mut entry_hasher);
            combined = combined.wrapping_add(entry_hasher.finish());
        }
        combined.hash(state);
    }
}

/// Full logical copy: every entry is re-inserted into a fresh map in the
/// source's traversal order; no node is aliased.
impl<K: Clone + Hash + Eq, V: Clone, S: BuildHasher + Clone> Clone for HashTableMap<K, V, S> {
    fn clone(&self) -> Self {
        let mut map = Self::with_hasher(self.hasher.clone());
        for (key, value) in self {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashTableMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for HashTableMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}
