//! Points: named gaps in a child list.

use std::ops::Index;
use std::ops::IndexMut;

use super::NodeId;
use super::Tree;
use crate::direction::Dir;
use crate::direction::Ends;

/// A snapshot of `(parent, left neighbor, right neighbor)`.
///
/// A point names where a splice should land without performing it. It is a
/// plain value: copying it is cheap and it does not follow later edits, so
/// re-check it with `is_well_formed` if the tree may have changed since.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub parent: NodeId,
    pub ends: Ends<Option<NodeId>>,
}

impl Point {
    pub fn new(parent: NodeId, leftward: Option<NodeId>, rightward: Option<NodeId>) -> Point {
        return Point {
            parent,
            ends: Ends::new(leftward, rightward),
        };
    }

    /// The gap at the `dir` end of `parent`'s children.
    pub fn at_end<T, H>(tree: &Tree<T, H>, parent: NodeId, dir: Dir) -> Point {
        let mut ends = Ends::default();
        ends[dir.opposite()] = tree.end(parent, dir);
        return Point { parent, ends };
    }

    /// The gap on the `dir` side of `node`, or `None` if `node` is free.
    pub fn beside<T, H>(tree: &Tree<T, H>, node: NodeId, dir: Dir) -> Option<Point> {
        let parent = tree.parent(node)?;
        let ends = Ends::with_dir(dir, tree.sibling(node, dir), Some(node));
        return Some(Point { parent, ends });
    }

    /// Whether the gap still exists in `tree`.
    pub fn is_well_formed<T, H>(&self, tree: &Tree<T, H>) -> bool {
        return tree.is_well_formed(self.parent, self.ends.left, self.ends.right);
    }
}

impl Index<Dir> for Point {
    type Output = Option<NodeId>;

    fn index(&self, dir: Dir) -> &Option<NodeId> {
        return &self.ends[dir];
    }
}

impl IndexMut<Dir> for Point {
    fn index_mut(&mut self, dir: Dir) -> &mut Option<NodeId> {
        return &mut self.ends[dir];
    }
}
