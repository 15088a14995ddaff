//! Error types shared by the map containers.
//!
//! Both [`HashTableMap`](crate::HashTableMap) and
//! [`OrderedTreeMap`](crate::OrderedTreeMap) report failures through the same
//! [`MapError`] enum, so callers that treat the two containers
//! interchangeably can handle errors uniformly.
//!
//! Every error is raised synchronously at the point of violation; nothing is
//! retried internally. A failing mutation leaves the container untouched.

/// Represents errors reported by the map containers and their cursors.
///
/// # Examples
///
/// ```rust
/// use arenamap::{MapError, OrderedTreeMap};
///
/// let map: OrderedTreeMap<i32, String> = OrderedTreeMap::new();
/// assert_eq!(map.value_of(&1), Err(MapError::NotFound));
/// assert_eq!(
///     format!("{}", MapError::NotFound),
///     "key or cursor position not found in the container"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// A key-based access, a key-based removal, or a dereference of the end
    /// cursor did not resolve to a live entry.
    NotFound,
    /// A cursor was stepped past the end, stepped before the beginning, or
    /// used for removal while not positioned on a live entry.
    InvalidPosition,
}

impl std::fmt::Display for MapError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => {
                write!(formatter, "key or cursor position not found in the container")
            }
            Self::InvalidPosition => {
                write!(formatter, "cursor moved or dereferenced outside the valid range")
            }
        }
    }
}

impl std::error::Error for MapError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        assert_eq!(
            format!("{}", MapError::NotFound),
            "key or cursor position not found in the container"
        );
    }

    #[test]
    fn test_invalid_position_display() {
        assert_eq!(
            format!("{}", MapError::InvalidPosition),
            "cursor moved or dereferenced outside the valid range"
        );
    }

    #[test]
    fn test_error_is_copy_and_comparable() {
        let error = MapError::NotFound;
        let copy = error;
        assert_eq!(error, copy);
        assert_ne!(MapError::NotFound, MapError::InvalidPosition);
    }
}
