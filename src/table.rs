//! Hash-consed unique table of BDD nodes.
//!
//! The table maps a structural key `(variable, low, high)` to a [`NodeId`],
//! guaranteeing that every distinct triple is stored exactly once.
//!
//! # Layout
//!
//! ```text
//! entries:  [ F | T | n2 | n3 | n4 | ... | n(len-1) | <free> ... ]   (capacity slots)
//!                      │          ▲
//!                      └─ next ───┘   same-bucket chain links
//! buckets:  [ head | head | ... ]                                     (capacity buckets)
//! ```
//!
//! - Ids `0` and `1` are the `false` and `true` terminals. They are created
//!   together with the table and never enter the hash index.
//! - Every other entry lives in exactly one bucket chain, ordered from the
//!   oldest node (the bucket head) to the newest. Since terminals are
//!   never chained, the id `0` doubles as the "none" marker for bucket heads
//!   and chain links.
//! - The number of buckets always equals the arena capacity, so growing the
//!   arena changes every bucket assignment and requires a full rehash.
//!
//! # Lifecycle
//!
//! Nodes are created lazily by [`UniqueTable::get`], and removed only in bulk
//! by [`UniqueTable::compact`], driven by a liveness bitmap computed by the
//! owner of the table (see [`Factory`][crate::factory::Factory]).

use std::fmt::Debug;

use log::{debug, trace};

use crate::config::{GrowthPolicy, TableConfig};
use crate::error::{Result, TableError};
use crate::hash::{NodeHasher, PairingHasher};
use crate::node::{Node, NodeId};

/// Marker for an empty bucket or the end of a chain.
pub(crate) const NONE: u32 = 0;

#[derive(Debug, Copy, Clone)]
pub(crate) struct Entry {
    pub(crate) node: Node,
    /// Next entry in the same bucket, or [`NONE`].
    pub(crate) next: u32,
}

impl Entry {
    pub(crate) fn new(node: Node) -> Self {
        Self { node, next: NONE }
    }
}

/// Snapshot of the table's sizing and collection counters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TableStats {
    pub allocated: usize,
    pub capacity: usize,
    pub max_capacity: usize,
    pub resizes: usize,
    pub compactions: usize,
    pub collected: usize,
}

pub struct UniqueTable<H = PairingHasher> {
    pub(crate) entries: Vec<Entry>,
    pub(crate) buckets: Vec<u32>,
    /// Number of slots the arena may hold before it has to grow.
    capacity: usize,
    max_capacity: usize,
    growth: GrowthPolicy,
    hasher: H,
    /// Set by compaction: buckets are cleared and must be rebuilt before lookups.
    pub(crate) index_stale: bool,
    resizes: usize,
    pub(crate) compactions: usize,
    pub(crate) collected: usize,
}

impl UniqueTable {
    pub fn new(config: TableConfig) -> Self {
        Self::with_hasher(config, PairingHasher)
    }
}

impl Default for UniqueTable {
    fn default() -> Self {
        UniqueTable::new(TableConfig::default())
    }
}

impl<H> UniqueTable<H>
where
    H: NodeHasher,
{
    /// Create a table that buckets nodes with the given `hasher`.
    pub fn with_hasher(config: TableConfig, hasher: H) -> Self {
        config.validate();

        let capacity = config.initial_capacity;
        let mut entries = Vec::with_capacity(capacity);
        entries.push(Entry::new(Node::terminal(NodeId::FALSE)));
        entries.push(Entry::new(Node::terminal(NodeId::TRUE)));

        Self {
            entries,
            buckets: vec![NONE; capacity],
            capacity,
            max_capacity: config.max_capacity,
            growth: config.growth,
            hasher,
            index_stale: false,
            resizes: 0,
            compactions: 0,
            collected: 0,
        }
    }
}

impl<H> UniqueTable<H> {
    /// Number of allocated ids (terminals included), which is also the next free id.
    pub fn allocated(&self) -> usize {
        self.entries.len()
    }
    /// Current number of slots (and buckets).
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }
    /// Number of ids that can be allocated without growing the arena.
    pub fn free_slots(&self) -> usize {
        self.capacity - self.entries.len()
    }
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
    /// Whether the hash index must be rebuilt before lookups can be trusted.
    pub fn is_index_stale(&self) -> bool {
        self.index_stale
    }
    pub fn stats(&self) -> TableStats {
        TableStats {
            allocated: self.allocated(),
            capacity: self.capacity,
            max_capacity: self.max_capacity,
            resizes: self.resizes,
            compactions: self.compactions,
            collected: self.collected,
        }
    }

    fn check(&self, id: NodeId) -> Result<usize> {
        if id.index() < self.entries.len() {
            Ok(id.index())
        } else {
            Err(TableError::OutOfRange {
                id,
                allocated: self.entries.len(),
            })
        }
    }

    /// The stored triple of `id`.
    pub fn node(&self, id: NodeId) -> Result<Node> {
        let i = self.check(id)?;
        Ok(self.entries[i].node)
    }
    pub fn variable(&self, id: NodeId) -> Result<u32> {
        self.node(id).map(|node| node.variable)
    }
    pub fn low(&self, id: NodeId) -> Result<NodeId> {
        self.node(id).map(|node| node.low)
    }
    pub fn high(&self, id: NodeId) -> Result<NodeId> {
        self.node(id).map(|node| node.high)
    }

    /// Successor of `id` in its bucket chain.
    pub fn next(&self, id: NodeId) -> Result<Option<NodeId>> {
        let i = self.check(id)?;
        Ok(link(self.entries[i].next))
    }

    /// Head of the chain in bucket `bucket`, or `None` if the bucket is empty.
    pub fn bucket(&self, bucket: usize) -> Result<Option<NodeId>> {
        match self.buckets.get(bucket) {
            Some(&head) => Ok(link(head)),
            None => Err(TableError::InvalidArgument(format!(
                "bucket {} is out of range (size {})",
                bucket,
                self.buckets.len()
            ))),
        }
    }

    /// Iterate over the chain starting in bucket `bucket`, oldest node first.
    ///
    /// An invalid bucket yields an empty chain.
    pub fn chain(&self, bucket: usize) -> impl Iterator<Item = NodeId> + '_ {
        let head = self.buckets.get(bucket).copied().and_then(link);
        std::iter::successors(head, move |id| link(self.entries[id.index()].next))
    }
}

fn link(raw: u32) -> Option<NodeId> {
    if raw == NONE {
        None
    } else {
        Some(NodeId::new(raw))
    }
}

impl<H> UniqueTable<H>
where
    H: NodeHasher,
{
    /// Bucket of the triple for the current table size.
    pub fn hash(&self, variable: u32, low: NodeId, high: NodeId) -> usize {
        self.hasher.hash(variable, low, high, self.buckets.len())
    }

    /// Link `id` after `tail` in the chain of `bucket` (or make it the head).
    fn append(&mut self, bucket: usize, tail: Option<NodeId>, id: NodeId) {
        match tail {
            Some(tail) => self.entries[tail.index()].next = id.get(),
            None => self.buckets[bucket] = id.get(),
        }
    }

    /// Return the unique id of `(variable, low, high)`, allocating it if needed.
    ///
    /// Repeated calls with the same triple return the same id, until the next
    /// compaction. When the arena is full, it is grown first; if it is already
    /// at its maximum capacity, [`TableError::CapacityExceeded`] is returned
    /// and the table is left unchanged.
    ///
    /// The children are not validated: the table interns whatever triple it is given.
    pub fn get(&mut self, variable: u32, low: NodeId, high: NodeId) -> Result<NodeId> {
        let node = Node::new(variable, low, high);

        if let Some(terminal) = node.terminal_id() {
            return Ok(terminal);
        }

        if self.index_stale {
            debug!("get: hash index is stale after compaction, rebuilding");
            self.rebuild_index();
        }

        let mut bucket = self.hash(variable, low, high);
        let mut tail = None;
        for id in self.chain(bucket) {
            if self.entries[id.index()].node == node {
                return Ok(id);
            }
            tail = Some(id);
        }

        if self.is_full() {
            self.grow()?;
            // The bucket count has changed, so has the bucket of the new node.
            bucket = self.hash(variable, low, high);
            tail = self.chain(bucket).last();
        }

        // New nodes go to the end of the chain, so chains keep insertion order.
        let id = NodeId::new(self.entries.len() as u32);
        self.entries.push(Entry::new(node));
        self.append(bucket, tail, id);
        trace!("get: allocated {} = {} in bucket #{}", id, node, bucket);

        Ok(id)
    }

    /// Grow the arena according to the growth policy and rehash all nodes.
    ///
    /// Ids are preserved, only the bucket layout changes.
    fn grow(&mut self) -> Result<()> {
        if self.capacity >= self.max_capacity {
            debug!(
                "grow: unique table is full ({} of maximum {} slots)",
                self.entries.len(),
                self.max_capacity
            );
            return Err(TableError::CapacityExceeded {
                max_capacity: self.max_capacity,
            });
        }

        let new_capacity = self.growth.next_capacity(self.capacity, self.max_capacity);
        debug!(
            "grow: resizing unique table from {} to {} slots",
            self.capacity, new_capacity
        );

        self.entries.reserve_exact(new_capacity - self.entries.len());
        self.buckets = vec![NONE; new_capacity];
        self.capacity = new_capacity;
        self.resizes += 1;
        self.rebuild_index();

        Ok(())
    }

    /// Recompute all bucket heads and chain links from the current arena contents.
    ///
    /// Nodes are spliced at the front of their chains in decreasing id order,
    /// so every chain lists its nodes in increasing id order, the same links
    /// that [`get`][Self::get] produces by appending.
    /// Calling this twice in a row has no observable effect the second time.
    pub fn rebuild_index(&mut self) {
        debug!(
            "rebuild_index: rehashing {} nodes into {} buckets",
            self.entries.len() - NodeId::NUM_TERMINALS,
            self.buckets.len()
        );

        self.buckets.fill(NONE);
        let size = self.buckets.len();

        for i in (NodeId::NUM_TERMINALS..self.entries.len()).rev() {
            let Node {
                variable,
                low,
                high,
            } = self.entries[i].node;
            let bucket = self.hasher.hash(variable, low, high, size);
            self.entries[i].next = self.buckets[bucket];
            self.buckets[bucket] = i as u32;
        }

        self.index_stale = false;
    }
}

impl<H> Debug for UniqueTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniqueTable")
            .field("allocated", &self.allocated())
            .field("capacity", &self.capacity)
            .field("max_capacity", &self.max_capacity)
            .field("resizes", &self.resizes)
            .field("compactions", &self.compactions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::utils::pairing2;

    /// Ignores the variable, so that nodes with equal children collide.
    struct ChildrenHasher;

    impl NodeHasher for ChildrenHasher {
        fn hash(&self, _variable: u32, low: NodeId, high: NodeId, size: usize) -> usize {
            (pairing2(low.get() as u64, high.get() as u64) % size as u64) as usize
        }
    }

    fn id(i: u32) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn test_terminals_are_reserved() {
        let mut table = UniqueTable::new(TableConfig::new(10, 10));
        assert_eq!(table.allocated(), 2);
        assert_eq!(table.variable(NodeId::FALSE), Ok(Node::FALSE_VARIABLE));
        assert_eq!(table.variable(NodeId::TRUE), Ok(Node::TRUE_VARIABLE));
        assert_eq!(table.low(NodeId::TRUE), Ok(NodeId::TRUE));

        // Ordinary allocation starts right after the terminals.
        assert_eq!(table.get(3, NodeId::FALSE, NodeId::TRUE), Ok(id(2)));

        // Asking for a terminal triple returns the terminal itself.
        let t = Node::terminal(NodeId::TRUE);
        assert_eq!(table.get(t.variable, t.low, t.high), Ok(NodeId::TRUE));
        assert_eq!(table.allocated(), 3);
    }

    #[test]
    fn test_canonicity() {
        let mut table = UniqueTable::new(TableConfig::new(10, 10));
        let a = table.get(3, id(0), id(1)).unwrap();
        let b = table.get(4, id(0), id(1)).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.get(3, id(0), id(1)), Ok(a));
        assert_eq!(table.get(4, id(0), id(1)), Ok(b));
        assert_eq!(table.allocated(), 4);
    }

    #[test]
    fn test_no_reduction() {
        let mut table = UniqueTable::new(TableConfig::new(10, 10));
        let a = table.get(7, id(1), id(1)).unwrap();
        assert_eq!(table.low(a), Ok(id(1)));
        assert_eq!(table.high(a), Ok(id(1)));
    }

    #[test]
    fn test_accessors() {
        let mut table = UniqueTable::new(TableConfig::new(10, 10));
        let a = table.get(13, id(20), id(41)).unwrap();
        assert_eq!(table.variable(a), Ok(13));
        assert_eq!(table.low(a), Ok(id(20)));
        assert_eq!(table.high(a), Ok(id(41)));
        assert_eq!(table.node(a), Ok(Node::new(13, id(20), id(41))));
    }

    #[test]
    fn test_accessors_out_of_range() {
        let table = UniqueTable::new(TableConfig::new(10, 10));
        let err = TableError::OutOfRange {
            id: id(2),
            allocated: 2,
        };
        assert_eq!(table.variable(id(2)), Err(err.clone()));
        assert_eq!(table.low(id(2)), Err(err.clone()));
        assert_eq!(table.high(id(2)), Err(err.clone()));
        assert_eq!(table.next(id(2)), Err(err));
    }

    #[test]
    fn test_new_node_is_bucket_head() {
        let mut table = UniqueTable::new(TableConfig::new(10, 10));
        let bucket = table.hash(13, id(20), id(41));
        let a = table.get(13, id(20), id(41)).unwrap();
        assert_eq!(table.bucket(bucket), Ok(Some(a)));
        assert_eq!(table.next(a), Ok(None));
    }

    #[test]
    fn test_bucket_out_of_range() {
        let table = UniqueTable::new(TableConfig::new(10, 10));
        assert_eq!(table.bucket(9), Ok(None));
        assert!(matches!(
            table.bucket(table.capacity()),
            Err(TableError::InvalidArgument(_))
        ));
        assert_eq!(table.chain(table.capacity()).count(), 0);
    }

    #[test]
    fn test_two_nodes_same_bucket() {
        let mut table = UniqueTable::with_hasher(TableConfig::new(10, 10), ChildrenHasher);
        let a = table.get(13, id(20), id(41)).unwrap();
        let b = table.get(1024, id(20), id(41)).unwrap();
        assert_ne!(a, b);

        let bucket = table.hash(13, id(20), id(41));
        assert_eq!(bucket, table.hash(1024, id(20), id(41)));
        // The second node is appended after the first one.
        assert_eq!(table.bucket(bucket), Ok(Some(a)));
        assert_eq!(table.next(a), Ok(Some(b)));
        assert_eq!(table.next(b), Ok(None));
        assert_eq!(table.chain(bucket).collect::<Vec<_>>(), vec![a, b]);

        // Both are still found.
        assert_eq!(table.get(13, id(20), id(41)), Ok(a));
        assert_eq!(table.get(1024, id(20), id(41)), Ok(b));
    }

    #[test]
    fn test_rebuild_restores_buckets() {
        let mut table = UniqueTable::new(TableConfig::new(10, 10));
        let a = table.get(3, id(0), id(1)).unwrap();
        let b = table.get(4, id(10), id(1)).unwrap();
        let c = table.get(5, id(100), id(0)).unwrap();

        let ha = table.hash(3, id(0), id(1));
        let hb = table.hash(4, id(10), id(1));
        let hc = table.hash(5, id(100), id(0));
        assert_ne!(ha, hb);
        assert_ne!(ha, hc);
        assert_ne!(hb, hc);

        table.buckets.fill(NONE);
        table.rebuild_index();

        // Each bucket head is the node with that hash.
        assert_eq!(table.bucket(ha), Ok(Some(a)));
        assert_eq!(table.bucket(hb), Ok(Some(b)));
        assert_eq!(table.bucket(hc), Ok(Some(c)));
    }

    #[test]
    fn test_rebuild_restores_chain_links() {
        let mut table = UniqueTable::with_hasher(TableConfig::new(10, 10), ChildrenHasher);
        let head = table.get(3, id(0), id(1)).unwrap();
        let a = table.get(4, id(10), id(1)).unwrap();
        let b = table.get(5, id(10), id(1)).unwrap();
        let bucket = table.hash(5, id(10), id(1));
        assert_eq!(table.chain(bucket).collect::<Vec<_>>(), vec![head, a, b]);
        assert_eq!(table.next(a), Ok(Some(b)));

        // Break the link and the buckets.
        table.entries[a.index()].next = NONE;
        table.buckets.fill(NONE);
        table.rebuild_index();

        assert_eq!(table.next(a), Ok(Some(b)));
        assert_eq!(table.next(b), Ok(None));
        assert_eq!(table.bucket(bucket), Ok(Some(head)));
    }

    #[test]
    fn test_rebuild_matches_insertion_links() {
        let mut table = UniqueTable::with_hasher(TableConfig::new(8, 64), ChildrenHasher);
        // Few distinct children, so most buckets hold long chains.
        for v in 0..40 {
            table.get(v, id(v % 4), id(1)).unwrap();
        }
        let buckets = table.buckets.clone();
        let links: Vec<_> = table.entries.iter().map(|e| e.next).collect();

        table.rebuild_index();
        assert_eq!(table.buckets, buckets);
        assert_eq!(table.entries.iter().map(|e| e.next).collect::<Vec<_>>(), links);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut table = UniqueTable::with_hasher(TableConfig::new(16, 16), ChildrenHasher);
        let ids: Vec<_> = (0..10)
            .map(|v| table.get(v, id(v % 3), id(v % 2)).unwrap())
            .collect();

        table.rebuild_index();
        let buckets = table.buckets.clone();
        let links: Vec<_> = table.entries.iter().map(|e| e.next).collect();

        table.rebuild_index();
        assert_eq!(table.buckets, buckets);
        assert_eq!(table.entries.iter().map(|e| e.next).collect::<Vec<_>>(), links);

        for (v, &expected) in (0..10).zip(&ids) {
            assert_eq!(table.get(v, id(v % 3), id(v % 2)), Ok(expected));
        }
        assert_eq!(table.allocated(), 12);
    }

    #[test]
    fn test_resize_in_the_middle_of_lookups() {
        let mut table = UniqueTable::with_hasher(TableConfig::new(4, 16), ChildrenHasher);
        assert_eq!(table.get(1, id(2), id(3)), Ok(id(2)));
        assert_eq!(table.get(2, id(2), id(3)), Ok(id(3)));
        assert!(table.is_full());

        // This triggers resizing: the hash changes in the middle of the operation.
        let first = table.get(3, id(3), id(2)).unwrap();
        let second = table.get(3, id(3), id(2)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, id(4));

        assert_eq!(table.capacity(), 8);
        assert_eq!(table.stats().resizes, 1);

        // Resizing preserves ids.
        assert_eq!(table.get(1, id(2), id(3)), Ok(id(2)));
        assert_eq!(table.get(2, id(2), id(3)), Ok(id(3)));
    }

    #[test]
    fn test_many_resizes() {
        let mut table = UniqueTable::new(TableConfig::new(2, 1 << 12));
        for v in 0..1000 {
            assert_eq!(table.get(v, id(0), id(1)), Ok(id(v + 2)));
        }
        assert_eq!(table.capacity(), 1024);
        assert_eq!(table.stats().resizes, 9);
        for v in 0..1000 {
            assert_eq!(table.get(v, id(0), id(1)), Ok(id(v + 2)));
        }
        assert_eq!(table.allocated(), 1002);
    }

    #[test]
    fn test_linear_growth() {
        let config = TableConfig::new(4, 10).with_growth(GrowthPolicy::Linear(3));
        let mut table = UniqueTable::new(config);
        for v in 0..5 {
            table.get(v, id(0), id(1)).unwrap();
        }
        assert_eq!(table.capacity(), 7);
        for v in 5..8 {
            table.get(v, id(0), id(1)).unwrap();
        }
        assert_eq!(table.capacity(), 10);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut table = UniqueTable::new(TableConfig::new(4, 4));
        let a = table.get(1, id(0), id(1)).unwrap();
        let b = table.get(2, id(0), id(1)).unwrap();
        assert!(table.is_full());

        assert_eq!(
            table.get(3, id(0), id(1)),
            Err(TableError::CapacityExceeded { max_capacity: 4 })
        );

        // The failed request did not change anything.
        assert_eq!(table.allocated(), 4);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.get(1, id(0), id(1)), Ok(a));
        assert_eq!(table.get(2, id(0), id(1)), Ok(b));
    }

    #[test]
    fn test_debug() {
        let table = UniqueTable::new(TableConfig::new(4, 8));
        assert_eq!(
            format!("{:?}", table),
            "UniqueTable { allocated: 2, capacity: 4, max_capacity: 8, resizes: 0, compactions: 0 }"
        );
    }
}
