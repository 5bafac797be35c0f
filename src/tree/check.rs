//! Well-formedness checks.
//!
//! `is_well_formed` is the one predicate that decides whether a
//! `(parent, leftward, rightward)` triple names a real gap in the current
//! tree. Every splice runs it before touching a link. `validate` is the
//! slow whole-subtree audit used by tests, the fuzz harness and the
//! `tree-invariants` feature. Run the suite with
//! `--features tree-invariants` to audit after every splice.

use thiserror::Error;

use super::NodeId;
use super::Tree;
use crate::direction::Dir;

/// A splice that was refused. The tree is unchanged when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpliceError {
    #[error("gap ({left:?}, {right:?}) is not well-formed under {parent}")]
    IllFormedGap {
        parent: NodeId,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
    #[error("fragment ends {left} and {right} have different parents")]
    ParentMismatch { left: NodeId, right: NodeId },
    #[error("fragment has one end but not the other")]
    HalfEmpty,
    #[error("{right} is not reachable rightward from {left}")]
    NotARun { left: NodeId, right: NodeId },
    #[error("{node} is still attached under {parent}")]
    StillAttached { node: NodeId, parent: NodeId },
    #[error("{0} is chained to a detached run")]
    InRun(NodeId),
    #[error("adopting under {parent} would make a node its own ancestor")]
    Cycle { parent: NodeId },
    #[error("links around {node} are corrupted")]
    Corrupted { node: NodeId },
    #[error("stale or foreign node id {0}")]
    StaleId(NodeId),
}

/// The first structural invariant `validate` found broken.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("{node}: {dir:?} sibling is {found:?}, expected {expected:?}")]
    BrokenSiblingLink {
        node: NodeId,
        dir: Dir,
        expected: Option<NodeId>,
        found: Option<NodeId>,
    },
    #[error("{node}: parent is {found:?}, expected {expected}")]
    ParentMismatch {
        node: NodeId,
        expected: NodeId,
        found: Option<NodeId>,
    },
    #[error("{parent}: {dir:?} end is {found:?}, expected {expected:?}")]
    BadEnd {
        parent: NodeId,
        dir: Dir,
        expected: Option<NodeId>,
        found: Option<NodeId>,
    },
    #[error("cycle reached through {node}")]
    Cycle { node: NodeId },
    #[error("stale node id {0}")]
    StaleId(NodeId),
}

impl<T, H> Tree<T, H> {
    /// Whether `leftward` and `rightward` are adjacent under `parent`, with
    /// `None` standing for the corresponding end of the child list. An empty
    /// child list has exactly one gap: `(parent, None, None)`.
    pub fn is_well_formed(
        &self,
        parent: NodeId,
        leftward: Option<NodeId>,
        rightward: Option<NodeId>,
    ) -> bool {
        let Some(p) = self.get_node(parent) else {
            return false;
        };

        let left_ok = match leftward {
            None => p.ends.left == rightward,
            Some(l) => match self.get_node(l) {
                Some(l) => l.siblings.right == rightward && l.parent == Some(parent),
                None => false,
            },
        };

        let right_ok = match rightward {
            None => p.ends.right == leftward,
            Some(r) => match self.get_node(r) {
                Some(r) => r.siblings.left == leftward && r.parent == Some(parent),
                None => false,
            },
        };

        return left_ok && right_ok;
    }

    /// `is_well_formed` as a result.
    pub fn check_gap(
        &self,
        parent: NodeId,
        leftward: Option<NodeId>,
        rightward: Option<NodeId>,
    ) -> Result<(), SpliceError> {
        self.try_node(parent)?;
        if self.is_well_formed(parent, leftward, rightward) {
            return Ok(());
        }
        return Err(SpliceError::IllFormedGap {
            parent,
            left: leftward,
            right: rightward,
        });
    }

    /// Audits every link in the subtree under `root`.
    pub fn validate(&self, root: NodeId) -> Result<(), InvariantError> {
        if !self.contains(root) {
            return Err(InvariantError::StaleId(root));
        }

        let mut stack = vec![root];
        let mut visited = 0usize;
        while let Some(parent) = stack.pop() {
            visited += 1;
            if visited > self.len {
                return Err(InvariantError::Cycle { node: parent });
            }

            let ends = self.node(parent).ends;
            let mut prev: Option<NodeId> = None;
            let mut cursor = ends.left;
            let mut steps = 0usize;
            while let Some(child) = cursor {
                steps += 1;
                if steps > self.len {
                    return Err(InvariantError::Cycle { node: child });
                }
                let Some(node) = self.get_node(child) else {
                    return Err(InvariantError::StaleId(child));
                };
                if node.parent != Some(parent) {
                    return Err(InvariantError::ParentMismatch {
                        node: child,
                        expected: parent,
                        found: node.parent,
                    });
                }
                if node.siblings.left != prev {
                    return Err(InvariantError::BrokenSiblingLink {
                        node: child,
                        dir: Dir::Left,
                        expected: prev,
                        found: node.siblings.left,
                    });
                }
                stack.push(child);
                prev = cursor;
                cursor = node.siblings.right;
            }

            if ends.right != prev {
                return Err(InvariantError::BadEnd {
                    parent,
                    dir: Dir::Right,
                    expected: prev,
                    found: ends.right,
                });
            }
        }

        return Ok(());
    }

    #[cfg(feature = "tree-invariants")]
    pub(crate) fn debug_validate(&self, node: NodeId) {
        let root = self.root_of(node);
        if let Err(err) = self.validate(root) {
            panic!("INVARIANT VIOLATED under {root}: {err}");
        }
    }

    #[cfg(not(feature = "tree-invariants"))]
    #[inline(always)]
    pub(crate) fn debug_validate(&self, _node: NodeId) {}
}
