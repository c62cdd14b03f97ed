//! # bdd-table: the unique table of a BDD engine
//!
//! A Binary Decision Diagram is **canonical**: structurally identical
//! sub-functions are always the same physical node. This crate provides the
//! node store that guarantees it, a **hash-consed** table mapping a structural
//! key `(variable, low, high)` to a stable integer [`NodeId`][crate::node::NodeId].
//!
//! ## Key Features
//!
//! - **Hash-consing**: [`UniqueTable::get`][crate::table::UniqueTable::get] returns
//!   the existing id for a known triple and allocates a new one otherwise.
//! - **Transparent resizing**: the arena and the open-chained hash index grow together,
//!   according to a [`GrowthPolicy`][crate::config::GrowthPolicy], up to a hard maximum.
//!   Resizing never changes ids.
//! - **Compacting garbage collection**: [`UniqueTable::compact`][crate::table::UniqueTable::compact]
//!   removes the nodes marked dead by an external liveness bitmap and renumbers
//!   the survivors, rewriting all child references.
//! - **Factory**: [`Factory`][crate::factory::Factory] owns a table, tracks
//!   protected roots and collects garbage when the table runs out of space.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_table::config::TableConfig;
//! use bdd_table::node::NodeId;
//! use bdd_table::table::UniqueTable;
//!
//! let mut table = UniqueTable::new(TableConfig::new(16, 1024));
//!
//! // Ids 0 and 1 are the terminals, so the first node gets id 2.
//! let x = table.get(3, NodeId::FALSE, NodeId::TRUE)?;
//! assert_eq!(x, NodeId::new(2));
//!
//! // The same triple always yields the same id.
//! assert_eq!(table.get(3, NodeId::FALSE, NodeId::TRUE)?, x);
//!
//! // Collect everything except the terminals.
//! assert_eq!(table.compact(&[true, true, false])?, 1);
//! table.rebuild_index();
//! assert_eq!(table.allocated(), 2);
//! # Ok::<(), bdd_table::error::TableError>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`table`]**: the arena, the hash index, lookup/insert and resizing.
//! - **[`collector`]**: compaction driven by a liveness bitmap.
//! - **[`factory`]**: root tracking and garbage collection policy.

pub mod collector;
pub mod config;
pub mod error;
pub mod factory;
pub mod hash;
pub mod node;
pub mod table;
pub mod utils;
