//! Identifiers for hierarchy nodes.

use serde::{Deserialize, Serialize};

/// Opaque host handle for a node (small string key, e.g. a bone or object name).
pub type NodeHandle = String;

/// Dense index of a node inside a collected [`Tree`](crate::hierarchy::Tree) arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator for arena indices.
#[derive(Default, Debug)]
pub struct IndexAllocator {
    next: u32,
}

impl IndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> NodeIndex {
        let id = NodeIndex(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.next as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IndexAllocator::new();
        assert!(alloc.is_empty());
        assert_eq!(alloc.alloc(), NodeIndex(0));
        assert_eq!(alloc.alloc(), NodeIndex(1));
        assert_eq!(alloc.len(), 2);
    }
}
