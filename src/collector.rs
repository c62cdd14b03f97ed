//! Garbage collection by compaction.
//!
//! The table does not know which nodes are reachable. The owner computes a
//! liveness bitmap (one flag per allocated id) and hands it to
//! [`UniqueTable::compact`], which removes the dead nodes and slides the
//! survivors down, preserving their relative order:
//!
//! ```text
//! alive:   [ T  T  F  T  T  F  T ]
//! old id:    0  1  2  3  4  5  6
//! new id:    0  1  -  2  3  -  4
//! ```
//!
//! Every survivor is renumbered to `old - dead_before(old)`, and every child
//! reference to a survivor is rewritten accordingly. Children may be numbered
//! above their parent, so the complete old-to-new mapping ([`Relocation`]) is
//! computed before anything moves.

use log::debug;

use crate::error::{Result, TableError};
use crate::hash::NodeHasher;
use crate::node::NodeId;
use crate::table::{Entry, UniqueTable, NONE};

/// Mapping from pre-compaction ids to post-compaction ids.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Relocation {
    targets: Vec<Option<NodeId>>,
    dead: usize,
}

impl Relocation {
    /// Compute the new id of every live id in `alive`.
    pub fn from_liveness(alive: &[bool]) -> Self {
        let mut dead = 0;
        let targets = alive
            .iter()
            .enumerate()
            .map(|(i, &is_alive)| {
                if is_alive {
                    Some(NodeId::new((i - dead) as u32))
                } else {
                    dead += 1;
                    None
                }
            })
            .collect();
        Self { targets, dead }
    }

    /// New id of `id`, or `None` if it is dead or was never allocated.
    pub fn get(&self, id: NodeId) -> Option<NodeId> {
        self.targets.get(id.index()).copied().flatten()
    }

    /// Like [`get`][Self::get], but leaves dead and unknown ids unchanged.
    pub fn apply(&self, id: NodeId) -> NodeId {
        self.get(id).unwrap_or(id)
    }

    /// Number of removed ids.
    pub fn dead(&self) -> usize {
        self.dead
    }

    /// Number of surviving ids, which is also the first free id after compaction.
    pub fn live(&self) -> usize {
        self.targets.len() - self.dead
    }

    pub fn is_identity(&self) -> bool {
        self.dead == 0
    }
}

impl<H> UniqueTable<H>
where
    H: NodeHasher,
{
    /// Remove all nodes marked dead in `alive` and renumber the survivors.
    ///
    /// `alive` must have exactly one entry per allocated id, and both
    /// terminals must be marked alive; otherwise [`TableError::InvalidArgument`]
    /// is returned and the table is not modified.
    ///
    /// Returns the number of removed nodes. Afterwards the hash index is empty
    /// and must be rebuilt with [`rebuild_index`][UniqueTable::rebuild_index]
    /// (the next [`get`][UniqueTable::get] does so on its own if needed).
    pub fn compact(&mut self, alive: &[bool]) -> Result<usize> {
        if alive.len() != self.entries.len() {
            return Err(TableError::InvalidArgument(format!(
                "liveness bitmap has {} entries, but {} nodes are allocated",
                alive.len(),
                self.entries.len()
            )));
        }
        if let Some(t) = (0..NodeId::NUM_TERMINALS).find(|&t| !alive[t]) {
            return Err(TableError::InvalidArgument(format!(
                "terminal {} is marked dead",
                NodeId::new(t as u32)
            )));
        }

        let relocation = Relocation::from_liveness(alive);
        if relocation.is_identity() {
            debug!("compact: all {} nodes are alive", self.entries.len());
            return Ok(0);
        }

        self.relocate(&relocation);
        Ok(relocation.dead())
    }

    /// Move every live entry to its new position and rewrite its children.
    ///
    /// Entries are processed in increasing order of their old ids, and no entry
    /// moves up, so each entry is read before its slot can be overwritten.
    fn relocate(&mut self, relocation: &Relocation) {
        debug!(
            "compact: removing {} of {} nodes",
            relocation.dead(),
            self.entries.len()
        );

        for old in 0..self.entries.len() {
            let Some(new) = relocation.get(NodeId::new(old as u32)) else {
                continue;
            };
            let mut node = self.entries[old].node;
            node.low = relocation.apply(node.low);
            node.high = relocation.apply(node.high);
            self.entries[new.index()] = Entry::new(node);
        }
        self.entries.truncate(relocation.live());

        // Chains still point to old positions.
        self.buckets.fill(NONE);
        self.index_stale = true;

        self.compactions += 1;
        self.collected += relocation.dead();

        debug!(
            "compact: {} nodes left, next free id is {}",
            self.entries.len(),
            self.entries.len()
        );
    }
}
