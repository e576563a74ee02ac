//! Match results: projection of a capture-history chain into per-group spans.

use std::ops::Range;
use std::sync::Arc;

use crate::history::{Boundary, HistoryArena, Tip};

/// A half-open byte range of the haystack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

/// One capture on the accepting path.
///
/// Captures are stored in order of their opening event, so the captures
/// nested inside `tree[i]` are exactly `tree[i + 1..tree[i].end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CaptureNode {
    pub group: usize,
    pub span: Span,
    /// Index one past the last capture nested inside this one.
    pub end: usize,
    closed: bool,
}

/// Rebuild the nesting of captures from the chain ending at `tip`.
///
/// The walk yields events newest first, so they are reversed and each
/// `End` closes the innermost open capture of its group. Opens that are
/// never closed stay in the tree but are not reported.
pub(crate) fn capture_tree(history: &HistoryArena, tip: Tip) -> Vec<CaptureNode> {
    let mut events: Vec<_> = history.walk(tip).collect();
    events.reverse();

    let mut tree: Vec<CaptureNode> = Vec::with_capacity(events.len() / 2);
    let mut open: Vec<usize> = Vec::new();
    for node in events {
        match node.boundary {
            Boundary::Start => {
                open.push(tree.len());
                tree.push(CaptureNode {
                    group: node.group,
                    span: Span::new(node.offset, node.offset),
                    end: 0,
                    closed: false,
                });
            }
            Boundary::End => {
                let Some(depth) = open.iter().rposition(|&i| tree[i].group == node.group) else {
                    continue;
                };
                let innermost = open[depth];
                tree[innermost].span.end = node.offset;
                tree[innermost].closed = true;
                for i in open.drain(depth..) {
                    tree[i].end = tree.len();
                }
            }
        }
    }
    for i in open {
        tree[i].end = tree.len();
    }
    tree
}

/// Group the closed captures by group id, keeping their order.
fn group_spans(captures: &[CaptureNode], group_count: usize) -> Vec<Vec<Span>> {
    let mut groups = vec![Vec::new(); group_count];
    for capture in captures.iter().filter(|capture| capture.closed) {
        if let Some(spans) = groups.get_mut(capture.group) {
            spans.push(capture.span);
        }
    }
    groups
}

/// Rebuild every group's spans, oldest first, from the chain ending at `tip`.
pub fn project(history: &HistoryArena, tip: Tip, group_count: usize) -> Vec<Vec<Span>> {
    group_spans(&capture_tree(history, tip), group_count)
}

/// A successful match: the overall span plus every capture of every group.
///
/// Group 0 is the whole match. A repeated group keeps one span per
/// iteration, in the order the iterations happened.
///
/// Each capture can also be viewed as a match of its own through
/// [`Match::sub_matches`] and [`Match::children`]. Queries on such a
/// sub-match only see the captures nested inside it, so a repeated record
/// group can be asked for the fields of one record at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match<'h> {
    haystack: &'h str,
    whole: Span,
    groups: Vec<Vec<Span>>,
    names: Arc<[Option<String>]>,
    tree: Arc<[CaptureNode]>,
    node: usize,
}

impl<'h> Match<'h> {
    /// Build a match from the accepting path's history.
    ///
    /// Returns `None` if the chain lacks a whole-match span, which a tip
    /// produced by the VM always has.
    pub(crate) fn from_history(
        haystack: &'h str,
        history: &HistoryArena,
        tip: Tip,
        names: Arc<[Option<String>]>,
    ) -> Option<Self> {
        let tree: Arc<[CaptureNode]> = capture_tree(history, tip).into();
        let node = tree
            .iter()
            .position(|capture| capture.group == 0 && capture.closed)?;
        Some(Self::scoped(haystack, tree, node, names))
    }

    fn scoped(
        haystack: &'h str,
        tree: Arc<[CaptureNode]>,
        node: usize,
        names: Arc<[Option<String>]>,
    ) -> Self {
        Match {
            haystack,
            whole: tree[node].span,
            groups: group_spans(&tree[node..tree[node].end], names.len()),
            names,
            tree,
            node,
        }
    }

    /// Group this match was captured by; 0 for a whole match.
    pub fn group(&self) -> usize {
        self.tree[self.node].group
    }

    /// Byte offset where the match starts.
    pub fn start(&self) -> usize {
        self.whole.start
    }

    /// Byte offset where the match ends (exclusive).
    pub fn end(&self) -> usize {
        self.whole.end
    }

    pub fn range(&self) -> Range<usize> {
        self.whole.range()
    }

    /// The matched text.
    pub fn as_str(&self) -> &'h str {
        &self.haystack[self.whole.range()]
    }

    /// Number of groups including group 0.
    pub fn group_len(&self) -> usize {
        self.groups.len()
    }

    /// Last span captured by `group`, or `None` if it never participated.
    pub fn span(&self, group: usize) -> Option<Span> {
        self.spans(group).last().copied()
    }

    /// Every span captured by `group`, in match order.
    pub fn spans(&self, group: usize) -> &[Span] {
        self.groups.get(group).map_or(&[], Vec::as_slice)
    }

    /// Last text captured by `group`.
    pub fn get(&self, group: usize) -> Option<&'h str> {
        self.span(group).map(|span| &self.haystack[span.range()])
    }

    /// Every text captured by `group`, in match order.
    pub fn get_all(&self, group: usize) -> Vec<&'h str> {
        self.spans(group)
            .iter()
            .map(|span| &self.haystack[span.range()])
            .collect()
    }

    /// Last text captured by the group called `name`.
    pub fn name(&self, name: &str) -> Option<&'h str> {
        self.get(self.group_index(name)?)
    }

    /// Every text captured by the group called `name`.
    pub fn get_all_named(&self, name: &str) -> Vec<&'h str> {
        self.group_index(name)
            .map(|group| self.get_all(group))
            .unwrap_or_default()
    }

    /// Every capture of `group` nested inside this match, as a match of its own.
    pub fn sub_matches(&self, group: usize) -> impl Iterator<Item = Match<'h>> {
        let nested = self.node + 1..self.tree[self.node].end;
        nested
            .filter(move |&i| self.tree[i].closed && self.tree[i].group == group)
            .map(move |i| self.sub_match(i))
    }

    /// Every capture of the group called `name` nested inside this match.
    pub fn sub_matches_named(&self, name: &str) -> Vec<Match<'h>> {
        self.group_index(name)
            .map(|group| self.sub_matches(group).collect())
            .unwrap_or_default()
    }

    /// The outermost captures directly inside this match.
    pub fn children(&self) -> Vec<Match<'h>> {
        let mut children = Vec::new();
        let mut i = self.node + 1;
        while i < self.tree[self.node].end {
            if self.tree[i].closed {
                children.push(self.sub_match(i));
            }
            i = self.tree[i].end;
        }
        children
    }

    fn sub_match(&self, node: usize) -> Match<'h> {
        Self::scoped(self.haystack, self.tree.clone(), node, self.names.clone())
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|group| group.as_deref() == Some(name))
    }
}
