//! # arenamap
//!
//! Arena-backed associative containers with bidirectional cursors.
//!
//! ## Overview
//!
//! This library provides two generic key-value containers that share one
//! external contract while using entirely independent engines:
//!
//! - [`HashTableMap`]: a chained hash table with a fixed number of buckets.
//!   Each bucket is a doubly-linked chain of nodes; collisions are resolved
//!   purely by chaining and the table never grows.
//! - [`OrderedTreeMap`]: a plain (unbalanced) binary search tree. Iteration
//!   visits entries in sorted key order; the tree shape depends solely on
//!   insertion order.
//!
//! Both containers store their nodes in an arena of index-addressed slots
//! instead of pointer-linked heap allocations, so cursor dereference can
//! validate that a position still refers to a live entry and report
//! [`MapError::InvalidPosition`] instead of touching freed memory.
//!
//! ## Cursors
//!
//! Each container offers a read-only cursor and a mutable cursor. A cursor is
//! bound to one container instance and one position, supports forward and
//! backward stepping bounded by the begin/end sentinels, and fails with a
//! [`MapError`] when dereferenced at the end or stepped outside the valid
//! range. The mutable cursor additionally updates the current value in place
//! and removes the current entry.
//!
//! ## Example
//!
//! ```rust
//! use arenamap::{HashTableMap, OrderedTreeMap};
//!
//! let mut hashed = HashTableMap::new();
//! hashed.insert("one", 1);
//! hashed.insert("two", 2);
//! assert_eq!(hashed.get(&"one"), Some(&1));
//!
//! let mut ordered: OrderedTreeMap<i32, &str> = [(3, "three"), (1, "one")].into();
//! ordered.insert(2, "two");
//! let keys: Vec<&i32> = ordered.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use arenamap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::MapError;
    pub use crate::hash_map::HashTableMap;
    pub use crate::tree_map::OrderedTreeMap;
}

pub mod error;
pub mod hash_map;
pub mod tree_map;

pub use error::MapError;
pub use hash_map::HashTableMap;
pub use tree_map::OrderedTreeMap;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containers_share_one_contract() {
        let mut hashed: HashTableMap<i32, i32> = HashTableMap::new();
        let mut ordered: OrderedTreeMap<i32, i32> = OrderedTreeMap::new();

        hashed.insert(1, 10);
        ordered.insert(1, 10);

        assert_eq!(hashed.value_of(&1), ordered.value_of(&1));
        assert_eq!(hashed.value_of(&2), Err(MapError::NotFound));
        assert_eq!(ordered.value_of(&2), Err(MapError::NotFound));
    }
}
