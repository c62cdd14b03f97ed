//! Sizing configuration for the unique table.

use std::cmp::{max, min};

use crate::node::NodeId;

/// How the arena grows when it runs out of free slots.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub enum GrowthPolicy {
    /// Double the capacity.
    #[default]
    Doubling,
    /// Multiply the capacity by the given factor (must be `> 1.0`).
    Factor(f64),
    /// Add a fixed number of slots (must be positive).
    Linear(usize),
}

impl GrowthPolicy {
    /// Capacity to grow to from `capacity`, capped at `max_capacity`.
    ///
    /// Always at least `capacity + 1` (unless capped).
    pub fn next_capacity(&self, capacity: usize, max_capacity: usize) -> usize {
        let grown = match *self {
            GrowthPolicy::Doubling => capacity.saturating_mul(2),
            GrowthPolicy::Factor(f) => (capacity as f64 * f).ceil() as usize,
            GrowthPolicy::Linear(step) => capacity.saturating_add(step),
        };
        min(max(grown, capacity + 1), max_capacity)
    }

    fn validate(&self) {
        match *self {
            GrowthPolicy::Doubling => {}
            GrowthPolicy::Factor(f) => assert!(f > 1.0, "Growth factor must be greater than 1"),
            GrowthPolicy::Linear(step) => assert!(step > 0, "Growth step must be positive"),
        }
    }
}

/// Construction parameters of a [`UniqueTable`][crate::table::UniqueTable].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TableConfig {
    /// Number of slots allocated up front (terminals included).
    pub initial_capacity: usize,
    /// Hard limit on the number of slots.
    pub max_capacity: usize,
    pub growth: GrowthPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::from_bits(10, 24)
    }
}

impl TableConfig {
    pub fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_capacity,
            growth: GrowthPolicy::default(),
        }
    }

    /// Table of initial size `2^initial_bits`, growing up to `2^max_bits`.
    ///
    /// # Panics
    ///
    /// Panics unless `initial_bits <= max_bits <= 31`.
    pub fn from_bits(initial_bits: usize, max_bits: usize) -> Self {
        assert!(max_bits <= 31, "Table bits should be in the range 0..=31");
        assert!(
            initial_bits <= max_bits,
            "Initial table bits must not exceed maximum table bits"
        );
        Self::new(1 << initial_bits, 1 << max_bits)
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Panics if the configuration cannot describe a usable table.
    pub(crate) fn validate(&self) {
        assert!(
            self.initial_capacity >= NodeId::NUM_TERMINALS,
            "Initial capacity must hold the {} terminals",
            NodeId::NUM_TERMINALS
        );
        assert!(
            self.max_capacity >= self.initial_capacity,
            "Maximum capacity must not be smaller than the initial capacity"
        );
        assert!(
            self.max_capacity <= u32::MAX as usize,
            "Maximum capacity must fit into 32-bit node ids"
        );
        self.growth.validate();
    }
}
