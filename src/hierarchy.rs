//! Rebuilds the owner/child tree from a flat record sequence.
//!
//! Records arrive in stream order and may name an earlier record as their
//! owner by position. [`HierarchyBuilder`] keeps every position in an arena,
//! including positions whose record was skipped, so owner indices stay
//! aligned with the stream. Resolution is a single forward pass; [`finish`]
//! folds the arena into trees that keep arrival order.
//!
//! Owner chains are limited to [`MAX_OWNER_DEPTH`] levels; a record that
//! would nest deeper is placed at the top level with a warning.
//!
//! [`flatten`] is the inverse used by the writers: a pre-order walk that
//! numbers records and reports each one's owner position.
//!
//! [`finish`]: HierarchyBuilder::finish

use crate::diagnostics::Diagnostics;

/// Deepest owner nesting kept when rebuilding trees.
pub const MAX_OWNER_DEPTH: usize = 64;

/// A record that may be the owner of other records.
pub trait OwnedRecord {
    fn can_own(&self) -> bool;
}

/// A record and the records it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<R> {
    pub record: R,
    pub children: Vec<Node<R>>,
}

impl<R> Node<R> {
    pub fn new(record: R) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    pub fn with_children(record: R, children: Vec<Node<R>>) -> Self {
        Self { record, children }
    }

    /// Number of records below this node.
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += node.children.len();
            pending.extend(&node.children);
        }
        count
    }
}

/// Where a pushed record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    AtTopLevel,
    InsideOwner(usize),
}

#[derive(Debug)]
enum Slot<R> {
    Record(R),
    /// A record that was skipped while reading
    Dropped,
    /// The document header, which owns nothing in the tree
    Document,
}

#[derive(Debug)]
struct Entry<R> {
    slot: Slot<R>,
    parent: Option<usize>,
    depth: usize,
}

/// Append-only arena of the records of one stream.
#[derive(Debug)]
pub struct HierarchyBuilder<R> {
    entries: Vec<Entry<R>>,
    fallback: Option<usize>,
}

impl<R: OwnedRecord> Default for HierarchyBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: OwnedRecord> HierarchyBuilder<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            fallback: None,
        }
    }

    /// Attach records without a usable owner to the record at `position`
    /// instead of the top level, once that record has been pushed.
    pub fn with_fallback(mut self, position: usize) -> Self {
        self.fallback = Some(position);
        self
    }

    /// Positions consumed so far, including dropped and header slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a record. A negative `owner` means the record names no owner.
    ///
    /// An owner that is out of range, not earlier in the stream, skipped,
    /// or unable to own records produces one warning and the record is
    /// placed as if it named no owner. An owner already at
    /// [`MAX_OWNER_DEPTH`] produces one warning and the record goes to the
    /// top level.
    pub fn push(&mut self, record: R, owner: i32, diags: &mut Diagnostics, stream: &str) -> Placement {
        let position = self.entries.len();
        let placement = match usize::try_from(owner) {
            Err(_) => self.fallback_for(position),
            Ok(target) => match self.entries.get(target) {
                _ if target >= position => {
                    diags.warning(
                        stream,
                        Some(position),
                        format!("owner index {target} does not refer to an earlier record"),
                    );
                    self.fallback_for(position)
                },
                Some(Entry { slot: Slot::Document, .. }) => Placement::AtTopLevel,
                Some(Entry { slot: Slot::Record(r), .. }) if r.can_own() => {
                    Placement::InsideOwner(target)
                },
                Some(Entry { slot: Slot::Record(_), .. }) => {
                    diags.warning(
                        stream,
                        Some(position),
                        format!("record {target} cannot own other records"),
                    );
                    self.fallback_for(position)
                },
                Some(Entry { slot: Slot::Dropped, .. }) | None => {
                    diags.warning(
                        stream,
                        Some(position),
                        format!("owner index {target} refers to a skipped record"),
                    );
                    self.fallback_for(position)
                },
            },
        };
        let placement = match placement {
            Placement::InsideOwner(owner) if self.entries[owner].depth >= MAX_OWNER_DEPTH => {
                diags.warning(
                    stream,
                    Some(position),
                    format!("owner chain is deeper than {MAX_OWNER_DEPTH} records"),
                );
                Placement::AtTopLevel
            },
            placement => placement,
        };
        let (parent, depth) = match placement {
            Placement::AtTopLevel => (None, 0),
            Placement::InsideOwner(owner) => (Some(owner), self.entries[owner].depth + 1),
        };
        self.entries.push(Entry {
            slot: Slot::Record(record),
            parent,
            depth,
        });
        placement
    }

    /// Reserve the position of a record that was skipped.
    pub fn push_dropped(&mut self) {
        self.entries.push(Entry {
            slot: Slot::Dropped,
            parent: None,
            depth: 0,
        });
    }

    /// Reserve the position of the document header.
    pub fn push_document(&mut self) {
        self.entries.push(Entry {
            slot: Slot::Document,
            parent: None,
            depth: 0,
        });
    }

    fn fallback_for(&self, position: usize) -> Placement {
        match self.fallback {
            Some(f) if f < position => match &self.entries[f].slot {
                Slot::Record(r) if r.can_own() => Placement::InsideOwner(f),
                _ => Placement::AtTopLevel,
            },
            _ => Placement::AtTopLevel,
        }
    }

    /// Fold the arena into top-level trees, keeping arrival order.
    pub fn finish(self) -> Vec<Node<R>> {
        let mut slots: Vec<Option<Node<R>>> = Vec::with_capacity(self.entries.len());
        let mut parents = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            parents.push(entry.parent);
            slots.push(match entry.slot {
                Slot::Record(record) => Some(Node::new(record)),
                Slot::Dropped | Slot::Document => None,
            });
        }

        // Children always follow their owner, so walking backwards finishes
        // every subtree before its owner is taken.
        let mut roots = Vec::new();
        for index in (0..slots.len()).rev() {
            let Some(mut node) = slots[index].take() else {
                continue;
            };
            node.children.reverse();
            match parents[index].and_then(|p| slots[p].as_mut()) {
                Some(owner) => owner.children.push(node),
                None => roots.push(node),
            }
        }
        roots.reverse();
        roots
    }
}

/// One record in write order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRecord<'a, R> {
    pub record: &'a R,
    /// Stream position of the owner
    pub owner: Option<usize>,
}

/// Number the records of `nodes` in pre-order, starting at position `base`.
///
/// Each subtree directly follows its root, so reading the output back
/// yields the same trees.
pub fn flatten<'a, R: 'a>(
    nodes: impl IntoIterator<Item = &'a Node<R>>,
    base: usize,
) -> Vec<FlatRecord<'a, R>> {
    let mut out = Vec::new();
    let mut pending: Vec<(&'a Node<R>, Option<usize>)> = Vec::new();
    for root in nodes {
        pending.push((root, None));
        while let Some((node, owner)) = pending.pop() {
            let position = base + out.len();
            out.push(FlatRecord {
                record: &node.record,
                owner,
            });
            pending.extend(node.children.iter().rev().map(|child| (child, Some(position))));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Rec {
        Component(&'static str),
        Line(u32),
    }

    impl OwnedRecord for Rec {
        fn can_own(&self) -> bool {
            matches!(self, Rec::Component(_))
        }
    }

    #[test]
    fn test_component_owns_following_records() {
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new();
        b.push(Rec::Component("U1"), -1, &mut diags, "Data");
        b.push(Rec::Line(1), 0, &mut diags, "Data");
        b.push(Rec::Line(2), 0, &mut diags, "Data");
        for i in 3..6 {
            assert_eq!(b.push(Rec::Line(i), 0, &mut diags, "Data"), Placement::InsideOwner(0));
        }
        let roots = b.finish();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].record, Rec::Component("U1"));
        let lines: Vec<_> = roots[0].children.iter().map(|c| c.record.clone()).collect();
        assert_eq!(lines, (1..6).map(Rec::Line).collect::<Vec<_>>());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_out_of_range_owner_warns_once() {
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new();
        b.push(Rec::Component("U1"), -1, &mut diags, "Data");
        assert_eq!(b.push(Rec::Line(1), 99, &mut diags, "Data"), Placement::AtTopLevel);
        let roots = b.finish();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[1].record, Rec::Line(1));
        assert_eq!(diags.len(), 1);
        assert!(diags.has_warnings());
    }

    #[test]
    fn test_invalid_owners() {
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new();
        b.push(Rec::Line(0), -1, &mut diags, "Data");
        b.push_dropped();
        // self reference, non-owner target, dropped target
        assert_eq!(b.push(Rec::Line(2), 2, &mut diags, "Data"), Placement::AtTopLevel);
        assert_eq!(b.push(Rec::Line(3), 0, &mut diags, "Data"), Placement::AtTopLevel);
        assert_eq!(b.push(Rec::Line(4), 1, &mut diags, "Data"), Placement::AtTopLevel);
        assert_eq!(diags.len(), 3);
        assert_eq!(b.len(), 5);
        assert_eq!(b.finish().len(), 4);
    }

    #[test]
    fn test_document_slot_owner_is_top_level() {
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new();
        b.push_document();
        assert_eq!(b.push(Rec::Line(1), 0, &mut diags, "Data"), Placement::AtTopLevel);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_fallback_owner() {
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new().with_fallback(0);
        assert_eq!(b.push(Rec::Component("R1"), -1, &mut diags, "R1/Data"), Placement::AtTopLevel);
        assert_eq!(b.push(Rec::Line(1), -1, &mut diags, "R1/Data"), Placement::InsideOwner(0));
        assert_eq!(b.push(Rec::Line(2), 40, &mut diags, "R1/Data"), Placement::InsideOwner(0));
        assert_eq!(diags.len(), 1);
        let roots = b.finish();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 2);
    }

    #[test]
    fn test_nested_owners_and_flatten() {
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new();
        b.push(Rec::Component("A"), -1, &mut diags, "Data");
        b.push(Rec::Component("A.1"), 0, &mut diags, "Data");
        b.push(Rec::Line(1), 1, &mut diags, "Data");
        b.push(Rec::Line(2), 0, &mut diags, "Data");
        b.push(Rec::Component("B"), -1, &mut diags, "Data");
        b.push(Rec::Line(3), 4, &mut diags, "Data");
        let roots = b.finish();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].descendant_count(), 3);
        assert_eq!(roots[0].children[0].children[0].record, Rec::Line(1));

        let flat = flatten(&roots, 1);
        let owners: Vec<_> = flat.iter().map(|f| f.owner).collect();
        assert_eq!(owners, vec![None, Some(1), Some(2), Some(1), None, Some(5)]);

        // Re-reading the flattened order rebuilds the same trees.
        let mut b = HierarchyBuilder::new();
        b.push_document();
        for f in &flat {
            let owner = f.owner.map_or(-1, |o| o as i32);
            b.push(f.record.clone(), owner, &mut diags, "Data");
        }
        assert_eq!(b.finish(), roots);
        assert!(diags.is_empty());
    }

    fn depth(node: &Node<Rec>) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(node, 0)];
        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(node.children.iter().map(|c| (c, level + 1)));
        }
        deepest
    }

    #[test]
    fn test_long_owner_chain_is_bounded() {
        const CHAIN: usize = 120_000;
        let mut diags = Diagnostics::new();
        let mut b = HierarchyBuilder::new();
        for i in 0..CHAIN {
            b.push(Rec::Component("U"), i as i32 - 1, &mut diags, "Data");
        }
        // Every (MAX_OWNER_DEPTH + 1)th record restarts the chain.
        let restarts = (CHAIN - 1) / (MAX_OWNER_DEPTH + 1);
        assert_eq!(diags.count(crate::diagnostics::Severity::Warning), restarts);

        let roots = b.finish();
        assert_eq!(roots.len(), restarts + 1);
        assert!(roots.iter().all(|r| depth(r) <= MAX_OWNER_DEPTH));
        let total: usize = roots.iter().map(|r| 1 + r.descendant_count()).sum();
        assert_eq!(total, CHAIN);

        let flat = flatten(&roots, 0);
        assert_eq!(flat.len(), CHAIN);
        assert_eq!(flat[1].owner, Some(0));
        assert_eq!(flat[MAX_OWNER_DEPTH + 1].owner, None);
        drop(roots);
    }

    #[test]
    fn test_flatten_deep_tree_built_by_hand() {
        let mut node = Node::new(Rec::Line(0));
        for i in 1..1_000 {
            node = Node::with_children(Rec::Component("U"), vec![node]);
            if i % 250 == 0 {
                assert_eq!(node.descendant_count(), i);
            }
        }
        let flat = flatten([&node], 0);
        assert_eq!(flat.len(), 1_000);
        assert_eq!(flat.last().map(|f| f.owner), Some(Some(998)));
        assert_eq!(flat[999].record, &Rec::Line(0));
    }
}
