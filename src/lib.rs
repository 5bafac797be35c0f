//! Arbor - an arena tree with atomic splicing of sibling runs.
//!
//! The tree backs a structured editor: a cursor names a gap between two
//! siblings, and edits detach a run of siblings from one gap and attach it at
//! another. Each splice costs O(run length), checks its destination before
//! touching anything, and leaves every structural invariant intact.
//!
//! # Quick Start
//!
//! ```
//! use arbor::tree::Tree;
//!
//! let mut tree: Tree<&str> = Tree::new();
//! let root = tree.create("root");
//! let b = tree.create("b");
//! let c = tree.create("c");
//! let d = tree.create("d");
//! tree.adopt(b, root, None, None);
//! tree.adopt(c, root, Some(b), None);
//! tree.adopt(d, root, Some(c), None);
//!
//! // Move `c d` under a new parent.
//! let mut run = tree.select_children(c, d);
//! run.disown(&mut tree).unwrap();
//! let holder = tree.create("holder");
//! run.adopt(&mut tree, holder, None, None).unwrap();
//!
//! let names: Vec<_> = tree.child_iter(holder).map(|n| *tree.data(n)).collect();
//! assert_eq!(names, ["c", "d"]);
//! assert_eq!(tree.last_child(root), Some(b));
//! ```

pub mod direction;
pub mod registry;
pub mod tree;

pub use direction::Dir;
pub use direction::Ends;
