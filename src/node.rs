use std::fmt::{Display, Formatter};

/// Identifier of a node in the [`UniqueTable`][crate::table::UniqueTable].
///
/// This is a plain index into the node arena, never a pointer.
/// Ids are stable across resizes, but *not* across compactions:
/// see [`compact`][crate::table::UniqueTable::compact].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Terminal node representing the constant `false`.
    pub const FALSE: NodeId = NodeId(0);
    /// Terminal node representing the constant `true`.
    pub const TRUE: NodeId = NodeId(1);

    /// Number of reserved terminal ids at the bottom of the id space.
    pub const NUM_TERMINALS: usize = 2;

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the raw index.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Return the index as `usize`, for addressing the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_terminal(self) -> bool {
        (self.0 as usize) < Self::NUM_TERMINALS
    }
}

impl From<u32> for NodeId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            NodeId::FALSE => write!(f, "@0(false)"),
            NodeId::TRUE => write!(f, "@1(true)"),
            NodeId(i) => write!(f, "@{}", i),
        }
    }
}

/// Structural key of a node: `(variable, low, high)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Node {
    pub variable: u32,
    pub low: NodeId,
    pub high: NodeId,
}

impl Node {
    /// Sentinel variable stored in the `false` terminal.
    pub const FALSE_VARIABLE: u32 = u32::MAX - 1;
    /// Sentinel variable stored in the `true` terminal.
    pub const TRUE_VARIABLE: u32 = u32::MAX;

    pub const fn new(variable: u32, low: NodeId, high: NodeId) -> Self {
        Self { variable, low, high }
    }

    /// The fixed triple of the terminal with the given id.
    ///
    /// Both children of a terminal point back to the terminal itself.
    pub(crate) const fn terminal(id: NodeId) -> Self {
        let variable = if id.get() == NodeId::FALSE.get() {
            Self::FALSE_VARIABLE
        } else {
            Self::TRUE_VARIABLE
        };
        Self::new(variable, id, id)
    }

    /// Check whether this triple is one of the terminal sentinels.
    pub fn terminal_id(&self) -> Option<NodeId> {
        [NodeId::FALSE, NodeId::TRUE]
            .into_iter()
            .find(|&t| *self == Self::terminal(t))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(x{}, {}, {})", self.variable, self.low, self.high)
    }
}
