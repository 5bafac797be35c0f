//! Identity registry for linking render elements back to nodes.
//!
//! Nodes and the elements that depict them are built in separate passes:
//!
//! 1. Nodes are created with `Tree::create_registered`, which records each
//!    node's serial here and schedules a cleanup.
//! 2. The render layer builds its elements and tags each one with the serial
//!    of the node it depicts (`Tree::serial`).
//! 3. `Registry::link` walks the elements, resolves each tag, strips it, and
//!    binds element and node to each other.
//!
//! Once linking is done the caller runs `flush`, which drops every entry so
//! the registry holds no ids past the construction burst. Looking a serial up
//! after that is an explicit `LinkError::Unresolved`.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::tree::NodeId;
use crate::tree::Tree;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("no node registered under serial {0}")]
    Unresolved(u32),
    #[error("serial {serial} names {node}, which has been released")]
    Released { serial: u32, node: NodeId },
}

/// Which kind of node an element tag refers to. One element may carry a
/// tag of each kind (a command's outer element can also host its block).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkRole {
    Command,
    Block,
}

impl LinkRole {
    pub const ALL: [LinkRole; 2] = [LinkRole::Command, LinkRole::Block];

    /// Attribute name the render layer uses for this tag.
    pub fn attribute(self) -> &'static str {
        return match self {
            LinkRole::Command => "arbor-command-id",
            LinkRole::Block => "arbor-block-id",
        };
    }
}

/// What the linking pass needs from a render element.
pub trait Element {
    type Handle: Clone;

    /// A handle the node can keep to reach this element.
    fn handle(&self) -> Self::Handle;

    /// Reads and removes the serial tagged for `role`, if any.
    fn take_tag(&mut self, role: LinkRole) -> Option<u32>;

    /// Records the node this element depicts.
    fn bind(&mut self, role: LinkRole, node: NodeId);

    fn children_mut(&mut self) -> &mut [Self]
    where
        Self: Sized;
}

/// Serial to node map for one construction burst.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    by_serial: FxHashMap<u32, NodeId>,
    clear_scheduled: bool,
}

impl Registry {
    pub fn new() -> Registry {
        return Registry::default();
    }

    /// Records `node` under `serial` and schedules a cleanup.
    pub fn register(&mut self, serial: u32, node: NodeId) {
        self.by_serial.insert(serial, node);
        self.schedule_clear();
    }

    pub fn resolve(&self, serial: u32) -> Result<NodeId, LinkError> {
        return self
            .by_serial
            .get(&serial)
            .copied()
            .ok_or(LinkError::Unresolved(serial));
    }

    pub fn len(&self) -> usize {
        return self.by_serial.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.by_serial.is_empty();
    }

    /// Requests a cleanup at the next `flush`. Requests made while one is
    /// already pending are absorbed.
    pub fn schedule_clear(&mut self) {
        if !self.clear_scheduled {
            self.clear_scheduled = true;
        }
    }

    pub fn is_clear_scheduled(&self) -> bool {
        return self.clear_scheduled;
    }

    /// Runs the pending cleanup, if any. Returns whether one ran.
    pub fn flush(&mut self) -> bool {
        if !self.clear_scheduled {
            return false;
        }
        self.clear();
        return true;
    }

    /// Drops every entry and any pending cleanup.
    pub fn clear(&mut self) {
        if !self.by_serial.is_empty() {
            log::debug!(
                target: "arbor.registry",
                "dropping {} registered node(s)",
                self.by_serial.len()
            );
        }
        self.by_serial.clear();
        self.clear_scheduled = false;
    }

    /// Links every tagged element in `elements` (and their descendants,
    /// pre-order) to the node its tag names: the node gains the element's
    /// handle and the element is bound to the node. Tags are stripped as
    /// they are consumed. Returns the number of links made.
    ///
    /// Stops at the first tag that does not resolve; links made before it
    /// are kept.
    pub fn link<T, E>(
        &self,
        tree: &mut Tree<T, E::Handle>,
        elements: &mut [E],
    ) -> Result<usize, LinkError>
    where
        E: Element,
    {
        let mut linked = 0;
        for element in elements.iter_mut() {
            linked += self.link_one(tree, element)?;
        }
        return Ok(linked);
    }

    fn link_one<T, E>(&self, tree: &mut Tree<T, E::Handle>, element: &mut E) -> Result<usize, LinkError>
    where
        E: Element,
    {
        let mut linked = 0;
        for role in LinkRole::ALL {
            let Some(serial) = element.take_tag(role) else {
                continue;
            };
            let node = self.resolve(serial)?;
            if !tree.contains(node) {
                return Err(LinkError::Released { serial, node });
            }
            tree.add_handles(node, [element.handle()]);
            element.bind(role, node);
            log::trace!(target: "arbor.registry", "linked {role:?} serial {serial} to {node}");
            linked += 1;
        }

        for child in element.children_mut() {
            linked += self.link_one(tree, child)?;
        }
        return Ok(linked);
    }
}
