//! Owner of a [`UniqueTable`] that decides what is alive.
//!
//! The unique table only stores nodes; the factory keeps track of the nodes
//! that are referenced from the outside (*roots*), computes reachability from
//! them, and runs a garbage collection pass (compaction followed by an index
//! rebuild) whenever the table runs out of space.
//!
//! Node ids are *not* stable across a collection. Callers that need to keep a
//! node across calls to [`Factory::mk`] must [`protect`][Factory::protect] it
//! and read its current id back through the returned [`RootHandle`].

use std::collections::VecDeque;

use log::{debug, info};

use crate::collector::Relocation;
use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::hash::{NodeHasher, PairingHasher};
use crate::node::{Node, NodeId};
use crate::table::UniqueTable;

/// Handle to a protected node, valid across garbage collections.
#[derive(Debug, Eq, PartialEq)]
pub struct RootHandle(usize);

pub struct Factory<H = PairingHasher> {
    table: UniqueTable<H>,
    /// Current ids of protected nodes, indexed by handle.
    roots: Vec<Option<NodeId>>,
    /// Released handle slots, available for reuse.
    free_roots: Vec<usize>,
    gc_count: usize,
}

impl Factory {
    pub fn new(config: TableConfig) -> Self {
        Self::with_table(UniqueTable::new(config))
    }
}

impl Default for Factory {
    fn default() -> Self {
        Factory::new(TableConfig::default())
    }
}

impl<H> Factory<H>
where
    H: NodeHasher,
{
    pub fn with_table(table: UniqueTable<H>) -> Self {
        Self {
            table,
            roots: Vec::new(),
            free_roots: Vec::new(),
            gc_count: 0,
        }
    }

    pub fn table(&self) -> &UniqueTable<H> {
        &self.table
    }

    pub fn zero(&self) -> NodeId {
        NodeId::FALSE
    }
    pub fn one(&self) -> NodeId {
        NodeId::TRUE
    }

    /// Number of garbage collection passes run so far.
    pub fn gc_count(&self) -> usize {
        self.gc_count
    }

    pub fn node(&self, id: NodeId) -> Result<Node> {
        self.table.node(id)
    }

    /// Return the node `(variable, low, high)`, collecting garbage if the table is full.
    ///
    /// Redundant tests (`low == high`) are skipped by returning `low`.
    /// Both children must be allocated. They are kept alive during the
    /// collection, and the returned node refers to their new ids.
    pub fn mk(&mut self, variable: u32, low: NodeId, high: NodeId) -> Result<NodeId> {
        self.table.node(low)?;
        self.table.node(high)?;

        if low == high {
            return Ok(low);
        }

        match self.table.get(variable, low, high) {
            Err(TableError::CapacityExceeded { max_capacity }) => {
                info!(
                    "mk: unique table is full ({} slots), collecting garbage",
                    max_capacity
                );
                let relocation = self.gc_with(&[low, high])?;
                let low = relocation.apply(low);
                let high = relocation.apply(high);
                self.table.get(variable, low, high)
            }
            res => res,
        }
    }

    /// The node testing `variable`, i.e. `(variable, zero, one)`.
    pub fn mk_var(&mut self, variable: u32) -> Result<NodeId> {
        self.mk(variable, NodeId::FALSE, NodeId::TRUE)
    }

    /// Keep `id` (and everything reachable from it) alive across collections.
    pub fn protect(&mut self, id: NodeId) -> Result<RootHandle> {
        self.table.node(id)?;
        let slot = match self.free_roots.pop() {
            Some(slot) => {
                self.roots[slot] = Some(id);
                slot
            }
            None => {
                self.roots.push(Some(id));
                self.roots.len() - 1
            }
        };
        Ok(RootHandle(slot))
    }

    /// Current id of a protected node.
    pub fn root(&self, handle: &RootHandle) -> Option<NodeId> {
        self.roots.get(handle.0).copied().flatten()
    }

    /// Stop protecting a node. Its id is returned one last time.
    pub fn release(&mut self, handle: RootHandle) -> Option<NodeId> {
        let id = self.roots.get_mut(handle.0).and_then(Option::take);
        if id.is_some() {
            self.free_roots.push(handle.0);
        }
        id
    }

    /// Iterate over the current ids of all protected nodes.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().flatten().copied()
    }

    /// Liveness bitmap of all allocated ids: terminals, plus everything
    /// reachable from the roots and from `extra`.
    pub fn mark_alive(&self, extra: &[NodeId]) -> Vec<bool> {
        let n = self.table.allocated();
        let mut alive = vec![false; n];
        alive[..NodeId::NUM_TERMINALS].fill(true);

        let mut queue: VecDeque<NodeId> = self.roots().chain(extra.iter().copied()).collect();
        while let Some(id) = queue.pop_front() {
            let i = id.index();
            if i >= n || alive[i] {
                continue;
            }
            alive[i] = true;
            if let Ok(node) = self.table.node(id) {
                queue.push_back(node.low);
                queue.push_back(node.high);
            }
        }

        alive
    }

    /// Run a garbage collection pass, returning the number of removed nodes.
    ///
    /// Ids of unprotected nodes become meaningless afterwards.
    pub fn collect_garbage(&mut self) -> Result<usize> {
        self.gc_with(&[]).map(|relocation| relocation.dead())
    }

    fn gc_with(&mut self, extra: &[NodeId]) -> Result<Relocation> {
        debug!(
            "gc: marking from {} roots and {} temporaries",
            self.roots().count(),
            extra.len()
        );

        let alive = self.mark_alive(extra);
        let relocation = Relocation::from_liveness(&alive);

        let dead = self.table.compact(&alive)?;
        self.table.rebuild_index();
        debug_assert_eq!(dead, relocation.dead());

        for root in self.roots.iter_mut().flatten() {
            *root = relocation.apply(*root);
        }
        self.gc_count += 1;

        info!(
            "gc: collected {} nodes, {} of {} slots in use",
            dead,
            self.table.allocated(),
            self.table.capacity()
        );

        Ok(relocation)
    }
}
