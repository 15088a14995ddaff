//! Ordered map backed by a plain binary search tree.
//!
//! This module provides [`OrderedTreeMap`], a mutable key-value container
//! whose iteration order is sorted key order.
//!
//! # Overview
//!
//! The tree performs no rebalancing: its shape depends solely on insertion
//! order, and a sorted insertion sequence degenerates into a linked list.
//!
//! - O(height) get
//! - O(height) insert
//! - O(height) remove
//! - O(height) min/max
//! - O(1) len and `is_empty`
//!
//! where height is O(N) in the worst case.
//!
//! Nodes live in an arena of index-addressed slots; each node links to its
//! parent, left child, and right child by slot index. In-order traversal
//! navigates those links directly (leftmost descent into a right subtree,
//! otherwise parent ascent), so cursors step in sorted order without any
//! auxiliary stack.
//!
//! # Removal
//!
//! Removal distinguishes three cases by child count: a leaf is detached from
//! its parent; a single-child node is spliced out by re-parenting the child;
//! a two-child node has its entry overwritten in place with the in-order
//! successor's entry, after which the successor node (which has at most one
//! child) is the one actually unlinked. Node identities are therefore not
//! stable across a two-child removal.
//!
//! # Examples
//!
//! ```rust
//! use arenamap::OrderedTreeMap;
//!
//! let mut map = OrderedTreeMap::new();
//! for key in [5, 3, 8, 1, 4] {
//!     map.insert(key, key * 10);
//! }
//!
//! let keys: Vec<i32> = map.keys().copied().collect();
//! assert_eq!(keys, vec![1, 3, 4, 5, 8]);
//!
//! map.remove(&5).unwrap();
//! let keys: Vec<i32> = map.keys().copied().collect();
//! assert_eq!(keys, vec![1, 3, 4, 8]);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ptr;

use crate::error::MapError;

// =============================================================================
// Node Definition
// =============================================================================

/// One tree node. Parent and child links are arena slot indices.
struct TreeNode<K, V> {
    key: K,
    value: V,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Which child slot of a parent a descent step would occupy.
#[derive(Clone, Copy)]
enum Branch {
    Left,
    Right,
}

/// Outcome of a binary-search descent for one key.
enum Descent {
    /// The key is already present at this slot index.
    Found(usize),
    /// The key is absent; a new node would hang off this parent (or become
    /// the root when `None`).
    Vacant(Option<(usize, Branch)>),
}

// =============================================================================
// OrderedTreeMap Definition
// =============================================================================

/// An ordered map backed by a plain (unbalanced) binary search tree.
///
/// Every key in a node's left subtree compares less than the node's key, and
/// every key in the right subtree compares greater; duplicate keys never
/// exist. Iteration and cursor traversal visit entries in sorted key order.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `new`          | O(1)       |
/// | `get`          | O(height)  |
/// | `insert`       | O(height)  |
/// | `remove`       | O(height)  |
/// | `first`/`last` | O(height)  |
/// | `len`          | O(1)       |
/// | `is_empty`     | O(1)       |
///
/// The tree is not self-balancing, so height is O(N) in the worst case.
///
/// # Examples
///
/// ```rust
/// use arenamap::OrderedTreeMap;
///
/// let mut map = OrderedTreeMap::new();
/// map.insert(3, "three");
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// // Entries are always in sorted order
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&1, &2, &3]);
/// ```
pub struct OrderedTreeMap<K, V> {
    /// Arena of node slots; `None` marks a destroyed node.
    slots: Vec<Option<TreeNode<K, V>>>,
    /// Stack of vacant slot indices available for reuse.
    free: Vec<usize>,
    /// Slot index of the root node; `None` when the tree is empty.
    root: Option<usize>,
    /// Number of live nodes.
    length: usize,
}

impl<K, V> OrderedTreeMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let map: OrderedTreeMap<i32, String> = OrderedTreeMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Removes every entry, leaving the map empty.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
        self.length = 0;
    }

    /// Returns the entry with the smallest key, or `None` if the map is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(2, "two");
    /// map.insert(1, "one");
    /// assert_eq!(map.first(), Some((&1, &"one")));
    /// ```
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        let node = self.node(self.first_index()?)?;
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the largest key, or `None` if the map is
    /// empty.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        let node = self.node(self.last_index()?)?;
        Some((&node.key, &node.value))
    }

    /// Returns a read-only cursor positioned at the smallest key, or at the
    /// end sentinel if the map is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(2, "two");
    /// map.insert(1, "one");
    ///
    /// let cursor = map.cursor_front();
    /// assert_eq!(cursor.entry(), Ok((&1, &"one")));
    /// ```
    #[must_use]
    pub fn cursor_front(&self) -> OrderedTreeMapCursor<'_, K, V> {
        OrderedTreeMapCursor {
            map: self,
            node_index: self.first_index(),
        }
    }

    /// Returns the end sentinel cursor, one position past the largest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::{MapError, OrderedTreeMap};
    ///
    /// let map: OrderedTreeMap<i32, i32> = OrderedTreeMap::new();
    /// assert_eq!(map.cursor_end().entry(), Err(MapError::NotFound));
    /// ```
    #[must_use]
    pub fn cursor_end(&self) -> OrderedTreeMapCursor<'_, K, V> {
        OrderedTreeMapCursor {
            map: self,
            node_index: None,
        }
    }

    /// Returns a mutable cursor positioned at the smallest key, or at the
    /// end sentinel if the map is empty.
    pub fn cursor_front_mut(&mut self) -> OrderedTreeMapCursorMut<'_, K, V> {
        let node_index = self.first_index();
        OrderedTreeMapCursorMut {
            map: self,
            node_index,
        }
    }

    /// Returns an iterator over the entries in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(2, "two");
    /// map.insert(1, "one");
    ///
    /// let entries: Vec<(&i32, &&str)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&1, &"one"), (&2, &"two")]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> OrderedTreeMapIterator<'_, K, V> {
        OrderedTreeMapIterator {
            map: self,
            front: self.first_index(),
            back: self.last_index(),
            remaining: self.length,
        }
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    // -------------------------------------------------------------------------
    // Arena access and in-order navigation
    // -------------------------------------------------------------------------

    fn node(&self, node_index: usize) -> Option<&TreeNode<K, V>> {
        self.slots.get(node_index)?.as_ref()
    }

    fn node_mut(&mut self, node_index: usize) -> Option<&mut TreeNode<K, V>> {
        self.slots.get_mut(node_index)?.as_mut()
    }

    /// Leftmost descendant of the subtree rooted at `node_index`.
    fn leftmost(&self, mut node_index: usize) -> usize {
        while let Some(left_index) = self.node(node_index).and_then(|node| node.left) {
            node_index = left_index;
        }
        node_index
    }

    /// Rightmost descendant of the subtree rooted at `node_index`.
    fn rightmost(&self, mut node_index: usize) -> usize {
        while let Some(right_index) = self.node(node_index).and_then(|node| node.right) {
            node_index = right_index;
        }
        node_index
    }

    /// Slot of the smallest key, or `None` when empty.
    fn first_index(&self) -> Option<usize> {
        self.root.map(|root_index| self.leftmost(root_index))
    }

    /// Slot of the largest key, or `None` when empty.
    fn last_index(&self) -> Option<usize> {
        self.root.map(|root_index| self.rightmost(root_index))
    }

    /// In-order successor: leftmost node of the right subtree when one
    /// exists, otherwise the first ancestor reached from a left child.
    fn next_index(&self, node_index: usize) -> Option<usize> {
        let node = self.node(node_index)?;
        if let Some(right_index) = node.right {
            return Some(self.leftmost(right_index));
        }
        let mut current = node_index;
        let mut parent = node.parent;
        while let Some(parent_index) = parent {
            let parent_node = self.node(parent_index)?;
            if parent_node.right == Some(current) {
                current = parent_index;
                parent = parent_node.parent;
            } else {
                return Some(parent_index);
            }
        }
        None
    }

    /// In-order predecessor; mirror image of [`next_index`](Self::next_index).
    fn prev_index(&self, node_index: usize) -> Option<usize> {
        let node = self.node(node_index)?;
        if let Some(left_index) = node.left {
            return Some(self.rightmost(left_index));
        }
        let mut current = node_index;
        let mut parent = node.parent;
        while let Some(parent_index) = parent {
            let parent_node = self.node(parent_index)?;
            if parent_node.left == Some(current) {
                current = parent_index;
                parent = parent_node.parent;
            } else {
                return Some(parent_index);
            }
        }
        None
    }

    /// Stores a fresh node below `parent` (or as the root) and returns its
    /// slot index.
    fn attach_node(&mut self, parent: Option<(usize, Branch)>, key: K, value: V) -> usize {
        let node = TreeNode {
            key,
            value,
            parent: parent.map(|(parent_index, _)| parent_index),
            left: None,
            right: None,
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
        match parent {
            Some((parent_index, branch)) => {
                if let Some(parent_node) = self.node_mut(parent_index) {
                    match branch {
                        Branch::Left => parent_node.left = Some(node_index),
                        Branch::Right => parent_node.right = Some(node_index),
                    }
                }
            }
            None => self.root = Some(node_index),
        }
        self.length += 1;
        node_index
    }

    /// Swaps the entries stored at two distinct live slots, leaving all tree
    /// links untouched.
    fn swap_entries(&mut self, first: usize, second: usize) {
        if first == second {
            return;
        }
        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        let (front, back) = self.slots.split_at_mut(high);
        let (Some(low_slot), Some(high_slot)) = (front.get_mut(low), back.first_mut()) else {
            return;
        };
        if let (Some(low_node), Some(high_node)) = (low_slot.as_mut(), high_slot.as_mut()) {
            mem::swap(&mut low_node.key, &mut high_node.key);
            mem::swap(&mut low_node.value, &mut high_node.value);
        }
    }

    /// Unlinks a node with at most one child: the child (if any) is
    /// re-parented into the node's position, or becomes the root. Returns
    /// `None` if the slot does not hold a live node.
    fn detach(&mut self, node_index: usize, child: Option<usize>) -> Option<TreeNode<K, V>> {
        let node = self.slots.get_mut(node_index)?.take()?;
        if let Some(child_index) = child {
            if let Some(child_node) = self.node_mut(child_index) {
                child_node.parent = node.parent;
            }
        }
        match node.parent {
            Some(parent_index) => {
                if let Some(parent_node) = self.node_mut(parent_index) {
                    if parent_node.left == Some(node_index) {
                        parent_node.left = child;
                    } else {
                        parent_node.right = child;
                    }
                }
            }
            None => self.root = child,
        }
        self.free.push(node_index);
        Some(node)
    }

    /// Three-case removal. A two-child node has its entry overwritten with
    /// the in-order successor's entry, then the loop re-dispatches onto the
    /// successor, which has at most one child; the branch that unlinks
    /// destroys exactly one node. Returns the entry originally stored at
    /// `node_index`.
    fn remove_node(&mut self, node_index: usize) -> Option<(K, V)> {
        let mut current = node_index;
        loop {
            let (left, right) = {
                let node = self.node(current)?;
                (node.left, node.right)
            };
            if let (Some(_), Some(right_index)) = (left, right) {
                let successor = self.leftmost(right_index);
                self.swap_entries(current, successor);
                current = successor;
            } else {
                let node = self.detach(current, left.or(right))?;
                self.length -= 1;
                return Some((node.key, node.value));
            }
        }
    }
}

impl<K: Ord, V> OrderedTreeMap<K, V> {
    /// Iterative binary-search descent for `key`.
    fn descend(&self, key: &K) -> Descent {
        let mut parent: Option<(usize, Branch)> = None;
        let mut current = self.root;
        while let Some(node_index) = current {
            let Some(node) = self.node(node_index) else {
                break;
            };
            match key.cmp(&node.key) {
                Ordering::Equal => return Descent::Found(node_index),
                Ordering::Less => {
                    parent = Some((node_index, Branch::Left));
                    current = node.left;
                }
                Ordering::Greater => {
                    parent = Some((node_index, Branch::Right));
                    current = node.right;
                }
            }
        }
        Descent::Vacant(parent)
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(node_index) = current {
            let node = self.node(node_index)?;
            match key.cmp(node.key.borrow()) {
                Ordering::Less => current = node.left,
                Ordering::Greater => current = node.right,
                Ordering::Equal => return Some(node_index),
            }
        }
        None
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
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
        Q: Ord + ?Sized,
    {
        let node_index = self.find_index(key)?;
        self.node(node_index).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_index = self.find_index(key)?;
        self.node_mut(node_index).map(|node| &mut node.value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
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
    /// use arenamap::{MapError, OrderedTreeMap};
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(1, "one");
    ///
    /// assert_eq!(map.value_of(&1), Ok(&"one"));
    /// assert_eq!(map.value_of(&2), Err(MapError::NotFound));
    /// ```
    pub fn value_of<Q>(&self, key: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
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
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(MapError::NotFound)
    }

    /// Returns a mutable reference to the value for `key`, inserting an entry
    /// built by `default` if the key is absent.
    ///
    /// The descent compares `key` against each visited node, turning right on
    /// greater and left on lesser, and returns the existing value slot
    /// immediately on equality. On reaching an absent child position a new
    /// leaf is created there.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.get_or_insert_with(1, || 10);
    /// *map.get_or_insert_with(1, || 0) += 5;
    ///
    /// assert_eq!(map.get(&1), Some(&15));
    /// ```
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let node_index = match self.descend(&key) {
            Descent::Found(index) => index,
            Descent::Vacant(parent) => self.attach_node(parent, key, default()),
        };
        match self.slots[node_index].as_mut() {
            Some(node) => &mut node.value,
            None => unreachable!("a resolved tree index always holds a live node"),
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
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map: OrderedTreeMap<&str, u32> = OrderedTreeMap::new();
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
    /// Overwriting mutates the existing node's value in place; the stored key
    /// and the node's position are untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// assert_eq!(map.insert(1, "one"), None);
    /// assert_eq!(map.insert(1, "ONE"), Some("one"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.descend(&key) {
            Descent::Found(node_index) => self
                .node_mut(node_index)
                .map(|node| mem::replace(&mut node.value, value)),
            Descent::Vacant(parent) => {
                self.attach_node(parent, key, value);
                None
            }
        }
    }

    /// Removes the entry for the key, returning the stored pair.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotFound`] if the key is not in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::{MapError, OrderedTreeMap};
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(1, "one");
    ///
    /// assert_eq!(map.remove(&1), Ok((1, "one")));
    /// assert_eq!(map.remove(&1), Err(MapError::NotFound));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, V), MapError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_index = self.find_index(key).ok_or(MapError::NotFound)?;
        self.remove_node(node_index).ok_or(MapError::NotFound)
    }

    /// Returns a read-only cursor positioned at the entry for the key, or
    /// the end cursor if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(1, "one");
    ///
    /// assert_eq!(map.find(&1).entry(), Ok((&1, &"one")));
    /// assert!(map.find(&2).is_end());
    /// ```
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> OrderedTreeMapCursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        OrderedTreeMapCursor {
            map: self,
            node_index: self.find_index(key),
        }
    }

    /// Returns a mutable cursor positioned at the entry for the key, or at
    /// the end sentinel if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(1, "one");
    ///
    /// let mut cursor = map.find_mut(&1);
    /// assert_eq!(cursor.remove_current(), Ok((1, "one")));
    /// assert!(map.is_empty());
    /// ```
    pub fn find_mut<Q>(&mut self, key: &Q) -> OrderedTreeMapCursorMut<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_index = self.find_index(key);
        OrderedTreeMapCursorMut {
            map: self,
            node_index,
        }
    }
}

// =============================================================================
// Cursor Implementation
// =============================================================================

/// A read-only bidirectional cursor over an [`OrderedTreeMap`].
///
/// A cursor is bound to one map instance and one position: a live node or
/// the end sentinel. Stepping follows in-order succession, so forward
/// traversal visits keys in ascending order. Two cursors are equal only if
/// they reference the same map and the same position.
///
/// # Examples
///
/// ```rust
/// use arenamap::OrderedTreeMap;
///
/// let mut map = OrderedTreeMap::new();
/// map.insert(2, "two");
/// map.insert(1, "one");
///
/// let mut cursor = map.cursor_front();
/// assert_eq!(cursor.key(), Ok(&1));
/// cursor.move_next().unwrap();
/// assert_eq!(cursor.key(), Ok(&2));
/// ```
pub struct OrderedTreeMapCursor<'a, K, V> {
    map: &'a OrderedTreeMap<K, V>,
    /// Arena slot of the current node; `None` at the end sentinel.
    node_index: Option<usize>,
}

impl<'a, K, V> OrderedTreeMapCursor<'a, K, V> {
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

    /// Advances to the in-order successor.
    ///
    /// Moving past the largest key lands on the end sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is already at the
    /// end sentinel.
    pub fn move_next(&mut self) -> Result<(), MapError> {
        let Some(node_index) = self.node_index else {
            return Err(MapError::InvalidPosition);
        };
        self.node_index = self.map.next_index(node_index);
        Ok(())
    }

    /// Retreats to the in-order predecessor.
    ///
    /// Retreating from the end sentinel lands on the largest key.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is at the first
    /// entry, or at the end sentinel of an empty map.
    pub fn move_prev(&mut self) -> Result<(), MapError> {
        match self.node_index {
            None => {
                let last_index = self.map.last_index();
                if last_index.is_none() {
                    return Err(MapError::InvalidPosition);
                }
                self.node_index = last_index;
                Ok(())
            }
            Some(node_index) => match self.map.prev_index(node_index) {
                Some(prev_index) => {
                    self.node_index = Some(prev_index);
                    Ok(())
                }
                None => Err(MapError::InvalidPosition),
            },
        }
    }
}

impl<K, V> Clone for OrderedTreeMapCursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for OrderedTreeMapCursor<'_, K, V> {}

impl<K, V> fmt::Debug for OrderedTreeMapCursor<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OrderedTreeMapCursor")
            .field("node_index", &self.node_index)
            .finish()
    }
}

impl<K, V> PartialEq for OrderedTreeMapCursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.map, other.map) && self.node_index == other.node_index
    }
}

impl<K, V> Eq for OrderedTreeMapCursor<'_, K, V> {}

/// A mutable bidirectional cursor over an [`OrderedTreeMap`].
///
/// Holds a mutable borrow of the map, so no other access can overlap its
/// lifetime. In addition to the read-only cursor operations it updates the
/// current value in place and removes the current entry.
///
/// # Examples
///
/// ```rust
/// use arenamap::OrderedTreeMap;
///
/// let mut map = OrderedTreeMap::new();
/// map.insert(1, 10);
///
/// let mut cursor = map.cursor_front_mut();
/// *cursor.value_mut().unwrap() += 1;
/// assert_eq!(map.get(&1), Some(&11));
/// ```
pub struct OrderedTreeMapCursorMut<'a, K, V> {
    map: &'a mut OrderedTreeMap<K, V>,
    node_index: Option<usize>,
}

impl<K, V> OrderedTreeMapCursorMut<'_, K, V> {
    /// Returns `true` if the cursor is at the end sentinel.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.node_index.is_none()
    }

    /// Reborrows this cursor as a read-only cursor at the same position.
    #[must_use]
    pub fn as_cursor(&self) -> OrderedTreeMapCursor<'_, K, V> {
        OrderedTreeMapCursor {
            map: &*self.map,
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

    /// Advances to the in-order successor.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is already at the
    /// end sentinel.
    pub fn move_next(&mut self) -> Result<(), MapError> {
        let Some(node_index) = self.node_index else {
            return Err(MapError::InvalidPosition);
        };
        self.node_index = self.map.next_index(node_index);
        Ok(())
    }

    /// Retreats to the in-order predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is at the first
    /// entry, or at the end sentinel of an empty map.
    pub fn move_prev(&mut self) -> Result<(), MapError> {
        match self.node_index {
            None => {
                let last_index = self.map.last_index();
                if last_index.is_none() {
                    return Err(MapError::InvalidPosition);
                }
                self.node_index = last_index;
                Ok(())
            }
            Some(node_index) => match self.map.prev_index(node_index) {
                Some(prev_index) => {
                    self.node_index = Some(prev_index);
                    Ok(())
                }
                None => Err(MapError::InvalidPosition),
            },
        }
    }

    /// Removes the entry at the cursor position and advances the cursor to
    /// the following position in key order.
    ///
    /// When the removed node has two children, the in-order successor's
    /// entry is moved into the node's slot before the successor is unlinked,
    /// so the cursor stays on the same slot and observes the next key.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPosition`] if the cursor is not positioned
    /// on a live entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let mut map = OrderedTreeMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// let mut cursor = map.cursor_front_mut();
    /// assert_eq!(cursor.remove_current(), Ok((1, "one")));
    /// assert_eq!(cursor.entry(), Ok((&2, &"two")));
    /// ```
    pub fn remove_current(&mut self) -> Result<(K, V), MapError> {
        let Some(node_index) = self.node_index else {
            return Err(MapError::InvalidPosition);
        };
        let (left, right) = {
            let node = self.map.node(node_index).ok_or(MapError::InvalidPosition)?;
            (node.left, node.right)
        };
        let following = if left.is_some() && right.is_some() {
            // The successor's entry lands in this slot before the successor
            // node is unlinked.
            Some(node_index)
        } else {
            self.map.next_index(node_index)
        };
        let entry = self
            .map
            .remove_node(node_index)
            .ok_or(MapError::InvalidPosition)?;
        self.node_index = following;
        Ok(entry)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of an [`OrderedTreeMap`] in ascending key
/// order.
pub struct OrderedTreeMapIterator<'a, K, V> {
    map: &'a OrderedTreeMap<K, V>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for OrderedTreeMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_index = self.front?;
        let node = self.map.node(node_index)?;
        self.front = self.map.next_index(node_index);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for OrderedTreeMapIterator<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_index = self.back?;
        let node = self.map.node(node_index)?;
        self.back = self.map.prev_index(node_index);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for OrderedTreeMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over the entries of an [`OrderedTreeMap`].
pub struct OrderedTreeMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for OrderedTreeMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for OrderedTreeMapIntoIterator<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for OrderedTreeMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for OrderedTreeMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> IntoIterator for OrderedTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = OrderedTreeMapIntoIterator<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut order = Vec::with_capacity(self.length);
        let mut position = self.first_index();
        while let Some(node_index) = position {
            order.push(node_index);
            position = self.next_index(node_index);
        }
        let entries: Vec<(K, V)> = order
            .into_iter()
            .filter_map(|node_index| {
                self.slots[node_index]
                    .take()
                    .map(|node| (node.key, node.value))
            })
            .collect();
        OrderedTreeMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = OrderedTreeMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedTreeMap<K, V> {
    /// Builds a map from an ordered sequence of pairs; for duplicate keys the
    /// last-seen value wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for OrderedTreeMap<K, V> {
    /// The initializer-list construction: duplicates resolve to the
    /// last-seen value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arenamap::OrderedTreeMap;
    ///
    /// let map = OrderedTreeMap::from([("a", 1), ("a", 2), ("b", 3)]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(&"a"), Some(&2));
    /// ```
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

/// Lockstep comparison of the two in-order traversals: a genuine sorted-order
/// content comparison, independent of either tree's shape.
impl<K: PartialEq, V: PartialEq> PartialEq for OrderedTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length
            && self
                .iter()
                .zip(other.iter())
                .all(|((left_key, left_value), (right_key, right_value))| {
                    left_key == right_key && left_value == right_value
                })
    }
}

impl<K: Eq, V: Eq> Eq for OrderedTreeMap<K, V> {}

/// Hashes the length, then every entry in ascending key order, so insertion
/// order never affects the hash and equal maps hash equally.
impl<K: Hash, V: Hash> Hash for OrderedTreeMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

/// Full logical copy: every entry is re-inserted into a fresh map in
/// ascending key order; no node is aliased. The copy's shape is therefore a
/// right spine, independent of the source's shape.
impl<K: Clone + Ord, V: Clone> Clone for OrderedTreeMap<K, V> {
    fn clone(&self) -> Self {
        let mut map = Self::new();
        for (key, value) in self {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedTreeMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for OrderedTreeMap<K, V> {
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
