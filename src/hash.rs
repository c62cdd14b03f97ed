//! Bucket hashing for the unique table.
//!
//! The bucket of a node depends on the current table size, so every call site
//! passes the size explicitly. A resize is then just "rehash everything with
//! the new size", and tests can swap in a deliberately weak hash function to
//! force collisions.

use crate::node::{Node, NodeId};
use crate::utils::MyHash;

/// Maps a node triple to a bucket in `0..size`.
pub trait NodeHasher {
    /// Bucket of `(variable, low, high)` in a table with `size` buckets.
    ///
    /// Must be a pure function of its arguments and return a value in `0..size`.
    fn hash(&self, variable: u32, low: NodeId, high: NodeId, size: usize) -> usize;
}

/// Default hasher: Szudzik pairing of the triple, reduced modulo the size.
#[derive(Debug, Default, Copy, Clone)]
pub struct PairingHasher;

impl NodeHasher for PairingHasher {
    fn hash(&self, variable: u32, low: NodeId, high: NodeId, size: usize) -> usize {
        assert!(size > 0, "Table size must be positive");
        (Node::new(variable, low, high).hash() % size as u64) as usize
    }
}
