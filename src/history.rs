//! Capture history arena.
//!
//! Every capture boundary a path crosses is appended as a node pointing at
//! the path's previous tip, forming a persistent singly-linked list. Nodes
//! are never mutated or removed while a search runs, so forking a path is a
//! copy of its [`Tip`] and sibling paths share their common history. The
//! arena is dropped as a whole when the search returns.

/// Which side of a group a history node records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    /// Decode a capture slot into its group id and boundary.
    pub fn from_slot(slot: usize) -> (usize, Boundary) {
        let boundary = if slot % 2 == 0 {
            Boundary::Start
        } else {
            Boundary::End
        };
        (slot / 2, boundary)
    }
}

/// One recorded capture boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryNode {
    pub group: usize,
    pub boundary: Boundary,
    /// Byte offset into the haystack.
    pub offset: usize,
    /// Previous event on the same path.
    pub parent: Tip,
}

/// Handle to the newest event of a path's history. `Tip::EMPTY` has none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tip(Option<usize>);

impl Tip {
    pub const EMPTY: Tip = Tip(None);
}

/// Append-only arena holding the history of every path in one search.
#[derive(Debug, Default)]
pub struct HistoryArena {
    nodes: Vec<HistoryNode>,
}

impl HistoryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a boundary on top of `tip`, returning the new tip.
    #[inline]
    pub fn extend(&mut self, tip: Tip, group: usize, offset: usize, boundary: Boundary) -> Tip {
        let index = self.nodes.len();
        self.nodes.push(HistoryNode {
            group,
            boundary,
            offset,
            parent: tip,
        });
        Tip(Some(index))
    }

    /// Total number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate a path's events from newest to oldest.
    pub fn walk(&self, tip: Tip) -> Walk<'_> {
        Walk { arena: self, next: tip }
    }
}

/// Iterator over one path's history, newest event first.
pub struct Walk<'a> {
    arena: &'a HistoryArena,
    next: Tip,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a HistoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.arena.nodes[self.next.0?];
        self.next = node.parent;
        Some(node)
    }
}
