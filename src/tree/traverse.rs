//! Traversal: children, ancestors, post-order.
//!
//! Visitors that can stop early return `ControlFlow<()>`; `Break` ends the
//! walk. The visitor only sees ids, so it cannot reshape the tree while the
//! walk holds a borrow of it. Collect ids first when a pass needs to mutate.

use std::ops::ControlFlow;

use smallvec::SmallVec;

use super::NodeId;
use super::Tree;

/// Inclusive left-to-right walk over a run of siblings.
pub struct Siblings<'t, T, H> {
    tree: &'t Tree<T, H>,
    next: Option<NodeId>,
    last: Option<NodeId>,
}

impl<'t, T, H> Siblings<'t, T, H> {
    pub(crate) fn new(
        tree: &'t Tree<T, H>,
        first: Option<NodeId>,
        last: Option<NodeId>,
    ) -> Siblings<'t, T, H> {
        return Siblings { tree, next: first, last };
    }
}

impl<T, H> Iterator for Siblings<'_, T, H> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = if Some(current) == self.last {
            None
        } else {
            self.tree.right(current)
        };
        return Some(current);
    }
}

/// A node followed by each of its ancestors up to the root.
pub struct Ancestors<'t, T, H> {
    tree: &'t Tree<T, H>,
    next: Option<NodeId>,
}

impl<T, H> Iterator for Ancestors<'_, T, H> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        return Some(current);
    }
}

impl<T, H> Tree<T, H> {
    /// Direct children of `node`, left to right.
    pub fn child_iter(&self, node: NodeId) -> Siblings<'_, T, H> {
        let ends = self.node(node).ends;
        return Siblings::new(self, ends.left, ends.right);
    }

    /// `node`, its parent, its grandparent, ..., the root.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_, T, H> {
        self.node(node);
        return Ancestors { tree: self, next: Some(node) };
    }

    /// Visits the direct children of `node` left to right until `visit`
    /// breaks. Does not descend.
    pub fn each_child<F>(&self, node: NodeId, mut visit: F) -> &Self
    where
        F: FnMut(NodeId) -> ControlFlow<()>,
    {
        for child in self.child_iter(node) {
            if visit(child).is_break() {
                break;
            }
        }
        return self;
    }

    /// Threads an accumulator through the direct children of `node`.
    pub fn fold_children<A, F>(&self, node: NodeId, init: A, combine: F) -> A
    where
        F: FnMut(A, NodeId) -> A,
    {
        return self.child_iter(node).fold(init, combine);
    }

    /// Visits `node` and then each ancestor up to and including the root,
    /// until `visit` breaks.
    pub fn bubble<F>(&self, node: NodeId, mut visit: F) -> &Self
    where
        F: FnMut(NodeId) -> ControlFlow<()>,
    {
        for ancestor in self.ancestors(node) {
            if visit(ancestor).is_break() {
                break;
            }
        }
        return self;
    }

    /// Visits every descendant of `node` before `node` itself, children left
    /// to right. Always runs to completion.
    pub fn post_order<F>(&self, node: NodeId, mut visit: F) -> &Self
    where
        F: FnMut(NodeId),
    {
        // (node, children already pushed)
        let mut stack: SmallVec<[(NodeId, bool); 16]> = SmallVec::new();
        stack.push((node, false));

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                visit(id);
                continue;
            }
            stack.push((id, true));
            let mut child = self.last_child(id);
            while let Some(c) = child {
                stack.push((c, false));
                child = self.left(c);
            }
        }
        return self;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::build;

    #[test]
    fn each_child_visits_in_order() {
        let (tree, root, kids) = build(&["a", "b", "c"]);
        let mut seen = Vec::new();
        tree.each_child(root, |c| {
            seen.push(c);
            ControlFlow::Continue(())
        });
        assert_eq!(seen, kids);
    }

    #[test]
    fn each_child_stops_early() {
        let (tree, root, kids) = build(&["a", "b", "c"]);
        let mut seen = Vec::new();
        tree.each_child(root, |c| {
            seen.push(c);
            ControlFlow::Break(())
        });
        assert_eq!(seen, [kids[0]]);
    }

    #[test]
    fn each_child_of_leaf_visits_nothing() {
        let (tree, _root, kids) = build(&["a"]);
        let mut count = 0;
        tree.each_child(kids[0], |_| {
            count += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(count, 0);
    }

    #[test]
    fn fold_children_threads_accumulator() {
        let (tree, root, _kids) = build(&["x", "y", "z"]);
        let joined = tree.fold_children(root, String::new(), |mut acc, c| {
            acc.push_str(tree.data(c));
            acc
        });
        assert_eq!(joined, "xyz");
    }

    #[test]
    fn bubble_reaches_root() {
        let (mut tree, root, kids) = build(&["a"]);
        let mid = tree.create("mid");
        let leaf = tree.create("leaf");
        tree.adopt(mid, kids[0], None, None);
        tree.adopt(leaf, mid, None, None);

        let mut seen = Vec::new();
        tree.bubble(leaf, |n| {
            seen.push(n);
            ControlFlow::Continue(())
        });
        assert_eq!(seen, [leaf, mid, kids[0], root]);

        let mut seen = Vec::new();
        tree.bubble(leaf, |n| {
            seen.push(n);
            if n == mid { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(seen, [leaf, mid]);
    }

    #[test]
    fn post_order_children_first() {
        //        root
        //      /  |  \
        //     a   b   c
        //    / \
        //   d   e
        let (mut tree, root, kids) = build(&["a", "b", "c"]);
        let d = tree.create("d");
        let e = tree.create("e");
        tree.adopt(d, kids[0], None, None);
        tree.adopt(e, kids[0], Some(d), None);

        let mut order = Vec::new();
        tree.post_order(root, |n| order.push(*tree.data(n)));
        assert_eq!(order, ["d", "e", "a", "b", "c", "root"]);
    }

    #[test]
    fn post_order_survives_deep_chains() {
        let mut tree: Tree<u32> = Tree::new();
        let root = tree.create(0);
        let mut tip = root;
        for i in 1..10_000 {
            let next = tree.create(i);
            tree.adopt(next, tip, None, None);
            tip = next;
        }

        let mut count = 0u32;
        let mut first = None;
        tree.post_order(root, |n| {
            if first.is_none() {
                first = Some(n);
            }
            count += 1;
        });
        assert_eq!(count, 10_000);
        assert_eq!(first, Some(tip));
    }
}
