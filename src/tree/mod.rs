//! Arena-backed document tree.
//!
//! Nodes live in a `Vec` of slots and refer to each other by `NodeId`
//! (slot index plus generation), never by pointer. Every node carries:
//!
//! - a parent back-reference (`None` while the node is free)
//! - left/right sibling links under that parent
//! - the first/last child pair ("ends")
//! - a tree-unique serial used by the registry link protocol
//! - a payload `T` and the render handles `H` linked to it
//!
//! Tree shape only changes through the splice operations (`adopt`,
//! `disown` and friends), which all go through a `Fragment`. Splicing a run
//! of `k` siblings touches O(k) slots regardless of the size of the tree.

mod check;
mod fragment;
mod point;
mod traverse;

use std::fmt;

use smallvec::SmallVec;

use crate::direction::Dir;
use crate::direction::Ends;
use crate::registry::Registry;

pub use check::InvariantError;
pub use check::SpliceError;
pub use fragment::Fragment;
pub use point::Point;
pub use traverse::Ancestors;
pub use traverse::Siblings;

/// Handles merged into a single node. Most nodes render to one element.
pub type Handles<H> = SmallVec<[H; 2]>;

/// A stable reference to a node in one `Tree`.
///
/// Releasing a node bumps its slot's generation, so an id that outlived its
/// node is detected instead of silently naming the slot's next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index in the arena.
    #[inline]
    pub fn index(self) -> usize {
        return self.index as usize;
    }

    #[inline]
    pub fn generation(self) -> u32 {
        return self.generation;
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "#{}v{}", self.index, self.generation);
    }
}

/// Structural links plus payload of one node.
#[derive(Clone, Debug)]
pub(crate) struct Node<T, H> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) siblings: Ends<Option<NodeId>>,
    pub(crate) ends: Ends<Option<NodeId>>,
    pub(crate) serial: u32,
    pub(crate) data: T,
    pub(crate) handles: Handles<H>,
}

#[derive(Clone, Debug)]
struct Slot<T, H> {
    generation: u32,
    node: Option<Node<T, H>>,
}

/// A forest of nodes; every free node is the root of its own tree.
#[derive(Clone, Debug)]
pub struct Tree<T, H = ()> {
    slots: Vec<Slot<T, H>>,
    /// Vacant slot indices, reused last-in first-out.
    free: Vec<u32>,
    len: usize,
    next_serial: u32,
}

impl<T, H> Default for Tree<T, H> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<T, H> Tree<T, H> {
    pub fn new() -> Tree<T, H> {
        return Tree::with_capacity(0);
    }

    pub fn with_capacity(capacity: usize) -> Tree<T, H> {
        return Tree {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
            next_serial: 1,
        };
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    // --- Allocation ---

    /// Creates a free node holding `data`.
    pub fn create(&mut self, data: T) -> NodeId {
        let serial = self.next_serial;
        self.next_serial = serial.checked_add(1).unwrap_or_else(|| {
            panic!("node serial overflowed after {serial} creations")
        });

        let node = Node {
            parent: None,
            siblings: Ends::default(),
            ends: Ends::default(),
            serial,
            data,
            handles: SmallVec::new(),
        };

        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId { index, generation: slot.generation };
        }

        let index = u32::try_from(self.slots.len())
            .unwrap_or_else(|_| panic!("node index overflowed the arena"));
        self.slots.push(Slot { generation: 0, node: Some(node) });
        return NodeId { index, generation: 0 };
    }

    /// Creates a free node and records its serial in `registry` so render
    /// elements tagged with that serial can be linked back to it.
    pub fn create_registered(&mut self, registry: &mut Registry, data: T) -> NodeId {
        let id = self.create(data);
        registry.register(self.serial(id), id);
        return id;
    }

    /// Returns a free node and its whole subtree to the arena, handing back
    /// the node's payload. Descendant payloads are dropped.
    ///
    /// Panics if the node is attached or still chained to a detached run.
    pub fn release(&mut self, node: NodeId) -> T {
        return match self.try_release(node) {
            Ok(data) => data,
            Err(err) => panic!("release: {err}"),
        };
    }

    pub fn try_release(&mut self, node: NodeId) -> Result<T, SpliceError> {
        let n = self.try_node(node)?;
        if let Some(parent) = n.parent {
            return Err(SpliceError::StillAttached { node, parent });
        }
        if n.siblings.left.is_some() || n.siblings.right.is_some() {
            return Err(SpliceError::InRun(node));
        }

        // Children first; they are unreachable once the root goes.
        let mut descendants = Vec::new();
        self.each_child(node, |child| {
            descendants.push(child);
            std::ops::ControlFlow::Continue(())
        });
        while let Some(id) = descendants.pop() {
            self.each_child(id, |child| {
                descendants.push(child);
                std::ops::ControlFlow::Continue(())
            });
            self.vacate(id);
        }

        let data = self.vacate(node).data;
        log::trace!(target: "arbor.splice", "released {node}");
        return Ok(data);
    }

    fn vacate(&mut self, id: NodeId) -> Node<T, H> {
        let slot = &mut self.slots[id.index()];
        let node = match slot.node.take() {
            Some(node) => node,
            None => panic!("stale node id {id}"),
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        return node;
    }

    // --- Slot access ---

    /// Whether `id` names a live node of this tree.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        return self.get_node(id).is_some();
    }

    #[inline]
    fn get_node(&self, id: NodeId) -> Option<&Node<T, H>> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        return slot.node.as_ref();
    }

    #[inline]
    pub(crate) fn try_node(&self, id: NodeId) -> Result<&Node<T, H>, SpliceError> {
        return self.get_node(id).ok_or(SpliceError::StaleId(id));
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<T, H> {
        return match self.get_node(id) {
            Some(node) => node,
            None => panic!("stale node id {id}"),
        };
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T, H> {
        let slot = self.slots.get_mut(id.index());
        return match slot {
            Some(slot) if slot.generation == id.generation => match slot.node.as_mut() {
                Some(node) => node,
                None => panic!("stale node id {id}"),
            },
            _ => panic!("stale node id {id}"),
        };
    }

    // --- Accessors ---

    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        return self.node(node).parent;
    }

    /// Adjacent sibling on the `dir` side.
    #[inline]
    pub fn sibling(&self, node: NodeId, dir: Dir) -> Option<NodeId> {
        return self.node(node).siblings[dir];
    }

    #[inline]
    pub fn left(&self, node: NodeId) -> Option<NodeId> {
        return self.sibling(node, Dir::Left);
    }

    #[inline]
    pub fn right(&self, node: NodeId) -> Option<NodeId> {
        return self.sibling(node, Dir::Right);
    }

    /// The child at the `dir` end of the child list.
    #[inline]
    pub fn end(&self, node: NodeId, dir: Dir) -> Option<NodeId> {
        return self.node(node).ends[dir];
    }

    #[inline]
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        return self.end(node, Dir::Left);
    }

    #[inline]
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        return self.end(node, Dir::Right);
    }

    /// Tree-unique serial, starting at 1.
    #[inline]
    pub fn serial(&self, node: NodeId) -> u32 {
        return self.node(node).serial;
    }

    #[inline]
    pub fn data(&self, node: NodeId) -> &T {
        return &self.node(node).data;
    }

    #[inline]
    pub fn data_mut(&mut self, node: NodeId) -> &mut T {
        return &mut self.node_mut(node).data;
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        return self.get_node(node).map(|n| &n.data);
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        if !self.contains(node) {
            return None;
        }
        return Some(self.data_mut(node));
    }

    /// No children.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        let ends = self.node(node).ends;
        return ends.left.is_none() && ends.right.is_none();
    }

    /// Not attached to any parent.
    #[inline]
    pub fn is_free(&self, node: NodeId) -> bool {
        return self.node(node).parent.is_none();
    }

    /// Render handles linked to `node`.
    pub fn handles(&self, node: NodeId) -> &[H] {
        return &self.node(node).handles;
    }

    /// Merges more render handles into `node`, for nodes whose
    /// representation spans several elements.
    pub fn add_handles<I>(&mut self, node: NodeId, handles: I)
    where
        I: IntoIterator<Item = H>,
    {
        self.node_mut(node).handles.extend(handles);
    }

    /// Number of ancestors above `node`.
    pub fn depth(&self, node: NodeId) -> usize {
        return self.ancestors(node).count() - 1;
    }

    /// The topmost ancestor of `node` (itself if free).
    pub fn root_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        return current;
    }

    // --- Splicing single nodes ---

    /// A fragment over just `node`, without collecting render handles.
    fn single(&self, node: NodeId) -> Result<Fragment<H>, SpliceError> {
        self.try_node(node)?;
        return Ok(Fragment::bare(Ends::splat(Some(node))));
    }

    /// Inserts free `node` under `parent` between the adjacent siblings
    /// `leftward` and `rightward` (`None` meaning the corresponding end).
    ///
    /// Panics if the gap is not well-formed or the node is attached.
    pub fn adopt(
        &mut self,
        node: NodeId,
        parent: NodeId,
        leftward: Option<NodeId>,
        rightward: Option<NodeId>,
    ) -> NodeId {
        return match self.try_adopt(node, parent, leftward, rightward) {
            Ok(node) => node,
            Err(err) => panic!("adopt: {err}"),
        };
    }

    /// Like `adopt`, but reports a rejected splice instead of panicking.
    /// The tree is untouched on error.
    pub fn try_adopt(
        &mut self,
        node: NodeId,
        parent: NodeId,
        leftward: Option<NodeId>,
        rightward: Option<NodeId>,
    ) -> Result<NodeId, SpliceError> {
        self.single(node)?.adopt(self, parent, leftward, rightward)?;
        return Ok(node);
    }

    /// `adopt` with the neighbors given relative to `dir`: `with_dir` is
    /// the neighbor on the `dir` side of the gap.
    pub fn with_dir_adopt(
        &mut self,
        node: NodeId,
        dir: Dir,
        parent: NodeId,
        with_dir: Option<NodeId>,
        opp_dir: Option<NodeId>,
    ) -> NodeId {
        let (leftward, rightward) = dir.arrange(with_dir, opp_dir);
        return self.adopt(node, parent, leftward, rightward);
    }

    /// Detaches `node` from its parent, joining its former neighbors.
    /// A free node is left alone.
    pub fn disown(&mut self, node: NodeId) -> NodeId {
        return match self.try_disown(node) {
            Ok(node) => node,
            Err(err) => panic!("disown: {err}"),
        };
    }

    pub fn try_disown(&mut self, node: NodeId) -> Result<NodeId, SpliceError> {
        self.single(node)?.disown(self)?;
        return Ok(node);
    }

    /// Disowns `node` and hands back its render handles so the view layer
    /// can drop them.
    pub fn remove(&mut self, node: NodeId) -> Handles<H> {
        self.disown(node);
        return std::mem::take(&mut self.node_mut(node).handles);
    }

    /// Adopts free `node` at `point` so that it ends up on the point's `dir`
    /// side, then moves the point past it. This is how a cursor inserts a
    /// freshly built node to its left or right.
    pub fn create_dir(&mut self, node: NodeId, dir: Dir, point: &mut Point) -> NodeId {
        self.adopt(node, point.parent, point[Dir::Left], point[Dir::Right]);
        point[dir] = Some(node);
        return node;
    }

    pub fn create_left_of(&mut self, node: NodeId, point: &mut Point) -> NodeId {
        return self.create_dir(node, Dir::Left, point);
    }
}

impl<T, H: Clone> Tree<T, H> {
    /// A view over the contiguous run of `parent`'s children from
    /// `left_child` to `right_child`. Nothing is mutated.
    pub fn select_children(&self, left_child: NodeId, right_child: NodeId) -> Fragment<H> {
        return match Fragment::span(self, left_child, right_child) {
            Ok(fragment) => fragment,
            Err(err) => panic!("select_children: {err}"),
        };
    }

    /// A view over all of `node`'s children; empty for a leaf.
    pub fn children(&self, node: NodeId) -> Fragment<H> {
        let ends = self.node(node).ends;
        return match Fragment::new(self, ends.left, ends.right, Dir::Left) {
            Ok(fragment) => fragment,
            Err(err) => panic!("children: {err}"),
        };
    }
}
