//! Fragments: views over runs of siblings, and the splice surgery itself.
//!
//! A fragment names an inclusive run `[left_end, right_end]` of nodes that
//! share a parent. It only points at the run; the nodes never learn that a
//! fragment exists, and the run may be attached or detached. Like a DOM
//! `DocumentFragment` its contents must be siblings, but like a `Range` it
//! holds one-way references and does not own what it describes.
//!
//! Single-node `adopt`/`disown` on `Tree` build a one-node fragment and
//! delegate here, so there is exactly one implementation of each splice.

use std::ops::ControlFlow;

use super::NodeId;
use super::Point;
use super::SpliceError;
use super::Tree;
use super::traverse::Siblings;
use crate::direction::Dir;
use crate::direction::Ends;

/// A non-owning view over a contiguous run of siblings.
///
/// `handles` is the render-synchronization set for the run, gathered once
/// when the fragment is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment<H = ()> {
    ends: Ends<Option<NodeId>>,
    disowned: bool,
    handles: Vec<H>,
}

impl<H> Default for Fragment<H> {
    fn default() -> Self {
        return Self::empty();
    }
}

impl<H: Clone> Fragment<H> {
    /// A fragment whose `dir` end is `with_dir` and whose other end is
    /// `opp_dir`. Both ends absent gives the empty fragment.
    ///
    /// The run's render handles are concatenated into one `Vec` in a single
    /// pass; that pass also proves the right end is reachable from the left.
    pub fn new<T>(
        tree: &Tree<T, H>,
        with_dir: Option<NodeId>,
        opp_dir: Option<NodeId>,
        dir: Dir,
    ) -> Result<Fragment<H>, SpliceError> {
        let (with_dir, opp_dir) = match (with_dir, opp_dir) {
            (None, None) => return Ok(Fragment::empty()),
            (Some(with_dir), Some(opp_dir)) => (with_dir, opp_dir),
            _ => return Err(SpliceError::HalfEmpty),
        };

        let (left, right) = dir.arrange(with_dir, opp_dir);
        if tree.try_node(left)?.parent != tree.try_node(right)?.parent {
            return Err(SpliceError::ParentMismatch { left, right });
        }

        let mut handles = Vec::new();
        let mut cursor = Some(left);
        loop {
            let Some(id) = cursor else {
                return Err(SpliceError::NotARun { left, right });
            };
            let node = tree.try_node(id)?;
            handles.extend(node.handles.iter().cloned());
            if id == right {
                break;
            }
            cursor = node.siblings.right;
        }

        return Ok(Fragment {
            ends: Ends::new(Some(left), Some(right)),
            disowned: false,
            handles,
        });
    }

    /// `new` with the ends given left to right.
    pub fn span<T>(
        tree: &Tree<T, H>,
        left: NodeId,
        right: NodeId,
    ) -> Result<Fragment<H>, SpliceError> {
        return Fragment::new(tree, Some(left), Some(right), Dir::Left);
    }
}

impl<H> Fragment<H> {
    /// The fragment over nothing. Every operation on it is a no-op.
    pub fn empty() -> Fragment<H> {
        return Fragment::bare(Ends::default());
    }

    /// A fragment with no handle set, for splicing single nodes.
    pub(crate) fn bare(ends: Ends<Option<NodeId>>) -> Fragment<H> {
        return Fragment {
            ends,
            disowned: false,
            handles: Vec::new(),
        };
    }

    #[inline]
    pub fn end(&self, dir: Dir) -> Option<NodeId> {
        return self.ends[dir];
    }

    #[inline]
    pub fn left_end(&self) -> Option<NodeId> {
        return self.ends.left;
    }

    #[inline]
    pub fn right_end(&self) -> Option<NodeId> {
        return self.ends.right;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.ends.left.is_none();
    }

    /// Set by `disown`, cleared by `adopt`.
    #[inline]
    pub fn is_disowned(&self) -> bool {
        return self.disowned;
    }

    pub fn handles(&self) -> &[H] {
        return &self.handles;
    }

    /// Splices the run into `parent` between the adjacent siblings
    /// `leftward` and `rightward`.
    ///
    /// The destination gap is checked first; a run that is still attached
    /// somewhere, or that contains `parent`, is refused. Otherwise one
    /// left-to-right pass re-parents every element and rebuilds the chain.
    pub fn adopt<T>(
        &mut self,
        tree: &mut Tree<T, H>,
        parent: NodeId,
        leftward: Option<NodeId>,
        rightward: Option<NodeId>,
    ) -> Result<&mut Self, SpliceError> {
        tree.check_gap(parent, leftward, rightward)?;

        let (Some(left_end), Some(right_end)) = (self.ends.left, self.ends.right) else {
            return Ok(self);
        };

        let head = tree.try_node(left_end)?;
        if let Some(old_parent) = head.parent {
            return Err(SpliceError::StillAttached {
                node: left_end,
                parent: old_parent,
            });
        }
        // Only a whole detached run may move; a slice of one would leave
        // its neighbors pointing at the moved nodes.
        if head.siblings.left.is_some() {
            return Err(SpliceError::InRun(left_end));
        }
        if tree.try_node(right_end)?.siblings.right.is_some() {
            return Err(SpliceError::InRun(right_end));
        }

        let root = tree.root_of(parent);
        if Siblings::new(tree, Some(left_end), Some(right_end)).any(|el| el == root) {
            return Err(SpliceError::Cycle { parent });
        }

        // Checks done; nothing below can fail.
        if leftward.is_none() {
            tree.node_mut(parent).ends.left = Some(left_end);
        }
        match rightward {
            Some(r) => tree.node_mut(r).siblings.left = Some(right_end),
            None => tree.node_mut(parent).ends.right = Some(right_end),
        }

        let mut prev = leftward;
        let mut cursor = Some(left_end);
        while let Some(el) = cursor {
            let node = tree.node_mut(el);
            let next = node.siblings.right;
            node.siblings.left = prev;
            node.parent = Some(parent);
            if let Some(p) = prev {
                tree.node_mut(p).siblings.right = Some(el);
            }
            prev = Some(el);
            cursor = if el == right_end { None } else { next };
        }
        tree.node_mut(right_end).siblings.right = rightward;

        self.disowned = false;
        log::trace!(
            target: "arbor.splice",
            "adopt [{left_end}..{right_end}] under {parent} between {leftward:?} and {rightward:?}"
        );
        tree.debug_validate(parent);
        return Ok(self);
    }

    /// `adopt` with the neighbors given relative to `dir`: `with_dir` is the
    /// neighbor on the `dir` side of the gap.
    pub fn with_dir_adopt<T>(
        &mut self,
        tree: &mut Tree<T, H>,
        dir: Dir,
        parent: NodeId,
        with_dir: Option<NodeId>,
        opp_dir: Option<NodeId>,
    ) -> Result<&mut Self, SpliceError> {
        let (leftward, rightward) = dir.arrange(with_dir, opp_dir);
        return self.adopt(tree, parent, leftward, rightward);
    }

    /// Adopts the run into the gap named by `point`.
    pub fn adopt_at<T>(
        &mut self,
        tree: &mut Tree<T, H>,
        point: &Point,
    ) -> Result<&mut Self, SpliceError> {
        return self.adopt(tree, point.parent, point[Dir::Left], point[Dir::Right]);
    }

    /// Detaches the run from its parent and closes the gap behind it.
    ///
    /// The run keeps its internal chain so it can be adopted elsewhere as a
    /// unit, but its outer links and every element's parent are cleared.
    /// Empty, already-disowned and free runs are left alone. A view whose
    /// ends no longer bound one run is refused with `NotARun`.
    pub fn disown<T>(&mut self, tree: &mut Tree<T, H>) -> Result<&mut Self, SpliceError> {
        let (Some(left_end), Some(right_end)) = (self.ends.left, self.ends.right) else {
            return Ok(self);
        };
        if self.disowned {
            return Ok(self);
        }

        let head = tree.try_node(left_end)?;
        let Some(parent) = head.parent else {
            return Ok(self);
        };
        let before = head.siblings.left;
        let after = tree.try_node(right_end)?.siblings.right;

        if !tree.is_well_formed(parent, before, Some(left_end)) {
            return Err(SpliceError::Corrupted { node: left_end });
        }
        if !tree.is_well_formed(parent, Some(right_end), after) {
            return Err(SpliceError::Corrupted { node: right_end });
        }
        // A view taken before the run was reshaped may no longer span it.
        let mut cursor = Some(left_end);
        while cursor != Some(right_end) {
            let Some(el) = cursor else {
                return Err(SpliceError::NotARun { left: left_end, right: right_end });
            };
            let node = tree.node(el);
            if node.parent != Some(parent) {
                return Err(SpliceError::NotARun { left: left_end, right: right_end });
            }
            cursor = node.siblings.right;
        }

        match before {
            Some(b) => tree.node_mut(b).siblings.right = after,
            None => tree.node_mut(parent).ends.left = after,
        }
        match after {
            Some(a) => tree.node_mut(a).siblings.left = before,
            None => tree.node_mut(parent).ends.right = before,
        }

        tree.node_mut(left_end).siblings.left = None;
        tree.node_mut(right_end).siblings.right = None;
        let mut cursor = Some(left_end);
        while let Some(el) = cursor {
            let node = tree.node_mut(el);
            node.parent = None;
            cursor = if el == right_end { None } else { node.siblings.right };
        }

        self.disowned = true;
        log::trace!(target: "arbor.splice", "disown [{left_end}..{right_end}] from {parent}");
        tree.debug_validate(parent);
        return Ok(self);
    }

    /// Disowns the run and hands back its render handles so the view layer
    /// can drop them. The elements' own handle sets are cleared.
    pub fn remove<T>(&mut self, tree: &mut Tree<T, H>) -> Result<Vec<H>, SpliceError> {
        self.disown(tree)?;

        let mut cursor = self.ends.left;
        while let Some(el) = cursor {
            let node = tree.node_mut(el);
            node.handles.clear();
            cursor = if Some(el) == self.ends.right { None } else { node.siblings.right };
        }

        return Ok(std::mem::take(&mut self.handles));
    }

    /// Elements of the run, left to right.
    pub fn iter<'t, T>(&self, tree: &'t Tree<T, H>) -> Siblings<'t, T, H> {
        return Siblings::new(tree, self.ends.left, self.ends.right);
    }

    /// Visits the run left to right until `visit` breaks.
    pub fn each<T, F>(&self, tree: &Tree<T, H>, mut visit: F) -> &Self
    where
        F: FnMut(NodeId) -> ControlFlow<()>,
    {
        for el in self.iter(tree) {
            if visit(el).is_break() {
                break;
            }
        }
        return self;
    }

    /// Threads an accumulator through the run, left to right.
    pub fn fold<T, A, F>(&self, tree: &Tree<T, H>, init: A, combine: F) -> A
    where
        F: FnMut(A, NodeId) -> A,
    {
        return self.iter(tree).fold(init, combine);
    }

    /// Number of elements in the run.
    pub fn len<T>(&self, tree: &Tree<T, H>) -> usize {
        return self.iter(tree).count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::build;
    use crate::tree::tests::names;

    #[test]
    fn disown_tail_run() {
        let (mut tree, root, kids) = build(&["b", "c", "d"]);
        let (b, c, d) = (kids[0], kids[1], kids[2]);

        let mut frag = tree.select_children(c, d);
        frag.disown(&mut tree).unwrap();

        assert_eq!(names(&tree, root), ["b"]);
        assert_eq!(tree.right(b), None);
        assert_eq!(tree.last_child(root), Some(b));
        assert_eq!(tree.parent(c), None);
        assert_eq!(tree.parent(d), None);
        assert_eq!(tree.left(c), None);
        assert_eq!(tree.right(c), Some(d));
        assert!(frag.is_disowned());
        tree.validate(root).unwrap();
    }

    #[test]
    fn disown_refuses_view_of_reshaped_run() {
        let (mut tree, root, kids) = build(&["a", "b", "c", "d"]);
        let (b, c, d) = (kids[1], kids[2], kids[3]);
        let mut frag = tree.select_children(b, c);

        // Move `b` after `c`; the view still says [b..c].
        tree.disown(b);
        tree.adopt(b, root, Some(c), Some(d));
        let before = format!("{tree:?}");

        assert_eq!(
            frag.disown(&mut tree).map(|_| ()),
            Err(SpliceError::NotARun { left: b, right: c })
        );
        assert!(!frag.is_disowned());
        assert_eq!(format!("{tree:?}"), before);
        assert_eq!(names(&tree, root), ["a", "c", "b", "d"]);
        assert_eq!(tree.parent(d), Some(root));
        tree.validate(root).unwrap();
    }

    #[test]
    fn disown_middle_then_adopt_elsewhere() {
        let (mut tree, root, kids) = build(&["a", "b", "c", "d", "e"]);
        let mut frag = tree.select_children(kids[1], kids[3]);
        frag.disown(&mut tree).unwrap();
        assert_eq!(names(&tree, root), ["a", "e"]);

        let other = tree.create("other");
        frag.adopt(&mut tree, other, None, None).unwrap();
        assert_eq!(names(&tree, other), ["b", "c", "d"]);
        assert_eq!(tree.first_child(other), Some(kids[1]));
        assert_eq!(tree.last_child(other), Some(kids[3]));
        assert!(!frag.is_disowned());
        tree.validate(root).unwrap();
        tree.validate(other).unwrap();
    }

    #[test]
    fn adopt_between_existing_children() {
        let (mut tree, root, kids) = build(&["a", "d"]);
        let (x, y) = (tree.create("b"), tree.create("c"));
        let holder = tree.create("holder");
        tree.adopt(x, holder, None, None);
        tree.adopt(y, holder, Some(x), None);

        let mut frag = tree.children(holder);
        frag.disown(&mut tree).unwrap();
        assert!(tree.is_leaf(holder));

        frag.adopt(&mut tree, root, Some(kids[0]), Some(kids[1])).unwrap();
        assert_eq!(names(&tree, root), ["a", "b", "c", "d"]);
        assert_eq!(tree.left(kids[1]), Some(y));
        tree.validate(root).unwrap();
    }

    #[test]
    fn second_disown_is_noop() {
        let (mut tree, root, kids) = build(&["a", "b", "c"]);
        let mut frag = tree.select_children(kids[1], kids[1]);
        frag.disown(&mut tree).unwrap();
        let snapshot = tree.clone();

        frag.disown(&mut tree).unwrap();
        assert_eq!(format!("{tree:?}"), format!("{snapshot:?}"));

        // A second view of the same run sees free nodes and does nothing.
        let mut again = Fragment::<()>::bare(Ends::splat(Some(kids[1])));
        again.disown(&mut tree).unwrap();
        assert!(!again.is_disowned());
        assert_eq!(names(&tree, root), ["a", "c"]);
    }

    #[test]
    fn empty_fragment_is_noop() {
        let (mut tree, root, kids) = build(&["a"]);
        let snapshot = format!("{tree:?}");

        let mut frag: Fragment = Fragment::empty();
        frag.adopt(&mut tree, root, None, Some(kids[0])).unwrap();
        frag.disown(&mut tree).unwrap();
        assert!(frag.is_empty());
        assert_eq!(frag, Fragment::empty());
        assert_eq!(format!("{tree:?}"), snapshot);
        assert_eq!(frag.len(&tree), 0);
    }

    #[test]
    fn empty_fragment_still_checks_destination() {
        let (mut tree, root, kids) = build(&["a", "b"]);
        let mut frag: Fragment = Fragment::empty();
        assert!(frag.adopt(&mut tree, root, Some(kids[1]), Some(kids[0])).is_err());
    }

    #[test]
    fn new_orders_ends_by_dir() {
        let (tree, _root, kids) = build(&["a", "b", "c"]);
        let frag = Fragment::new(&tree, Some(kids[2]), Some(kids[0]), Dir::Right).unwrap();
        assert_eq!(frag.left_end(), Some(kids[0]));
        assert_eq!(frag.right_end(), Some(kids[2]));
        assert_eq!(frag.end(Dir::Right), Some(kids[2]));
        assert_eq!(frag.len(&tree), 3);
    }

    #[test]
    fn new_rejects_bad_runs() {
        let (mut tree, root, kids) = build(&["a", "b"]);
        let stranger = tree.create("x");

        assert_eq!(
            Fragment::new(&tree, Some(kids[0]), None, Dir::Left),
            Err(SpliceError::HalfEmpty)
        );
        assert_eq!(
            Fragment::span(&tree, kids[0], stranger),
            Err(SpliceError::ParentMismatch { left: kids[0], right: stranger })
        );
        assert_eq!(
            Fragment::span(&tree, kids[1], kids[0]),
            Err(SpliceError::NotARun { left: kids[1], right: kids[0] })
        );
        assert_eq!(
            Fragment::span(&tree, root, root).map(|f| f.len(&tree)),
            Ok(1)
        );
    }

    #[test]
    fn adopt_refuses_cycles() {
        let (mut tree, root, kids) = build(&["a"]);
        tree.disown(kids[0]);
        let inner = tree.create("inner");
        tree.adopt(inner, kids[0], None, None);

        let mut frag = tree.select_children(kids[0], kids[0]);
        assert_eq!(
            frag.adopt(&mut tree, inner, None, None).map(|_| ()),
            Err(SpliceError::Cycle { parent: inner })
        );
        assert_eq!(
            frag.adopt(&mut tree, kids[0], Some(inner), None).map(|_| ()),
            Err(SpliceError::Cycle { parent: kids[0] })
        );
        assert!(tree.is_leaf(root));
        tree.validate(kids[0]).unwrap();
    }

    #[test]
    fn adopt_refuses_slice_of_detached_run() {
        let (mut tree, root, kids) = build(&["a", "b", "c"]);
        let mut run = tree.children(root);
        run.disown(&mut tree).unwrap();

        let other = tree.create("other");
        assert_eq!(tree.try_adopt(kids[1], other, None, None), Err(SpliceError::InRun(kids[1])));
        assert_eq!(tree.try_adopt(kids[0], other, None, None), Err(SpliceError::InRun(kids[0])));

        run.adopt(&mut tree, other, None, None).unwrap();
        assert_eq!(names(&tree, other), ["a", "b", "c"]);
    }

    #[test]
    fn handles_are_gathered_once_and_removed() {
        let mut tree: Tree<(), &'static str> = Tree::new();
        let root = tree.create(());
        let mut prev = None;
        for handles in [&["a1", "a2"][..], &["b"][..], &[][..], &["d"][..]] {
            let kid = tree.create(());
            tree.add_handles(kid, handles.iter().copied());
            tree.adopt(kid, root, prev, None);
            prev = Some(kid);
        }

        let mut frag = tree.children(root);
        assert_eq!(frag.handles(), &["a1", "a2", "b", "d"]);

        let removed = frag.remove(&mut tree).unwrap();
        assert_eq!(removed, ["a1", "a2", "b", "d"]);
        assert!(frag.handles().is_empty());
        assert!(tree.is_leaf(root));
        for el in frag.iter(&tree) {
            assert!(tree.handles(el).is_empty());
        }
    }

    #[test]
    fn each_stops_and_fold_threads() {
        let (tree, root, kids) = build(&["a", "b", "c", "d"]);
        let frag = tree.select_children(kids[1], kids[3]);

        let mut seen = Vec::new();
        frag.each(&tree, |el| {
            seen.push(el);
            if el == kids[2] { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(seen, [kids[1], kids[2]]);

        let joined = frag.fold(&tree, String::new(), |acc, el| acc + *tree.data(el));
        assert_eq!(joined, "bcd");
        assert_eq!(tree.children(root).len(&tree), 4);
    }

    #[test]
    fn with_dir_adopt_and_adopt_at() {
        let (mut tree, root, kids) = build(&["a", "d"]);
        let b = tree.create("b");
        let c = tree.create("c");

        let mut fb = Fragment::span(&tree, b, b).unwrap();
        fb.with_dir_adopt(&mut tree, Dir::Left, root, Some(kids[0]), Some(kids[1])).unwrap();

        let point = Point::new(root, Some(b), Some(kids[1]));
        let mut fc = Fragment::span(&tree, c, c).unwrap();
        fc.adopt_at(&mut tree, &point).unwrap();
        assert_eq!(names(&tree, root), ["a", "b", "c", "d"]);
    }
}
