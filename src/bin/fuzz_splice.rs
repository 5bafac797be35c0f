//! AFL fuzz harness for the splice engine.
//!
//! Drives a small forest through random adopt / disown / move sequences and
//! checks after every step that:
//! 1. Every tree passes `Tree::validate`
//! 2. Child lists and parents match a plain `Vec`-of-children model
//! 3. A refused splice changed nothing

use afl::fuzz;
use arbor::tree::{NodeId, Tree};

const MAX_NODES: usize = 48;

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Create a fresh free node
    Create,
    /// Adopt node `node` under `parent` at child position `pos`
    Adopt { node: u8, parent: u8, pos: u8 },
    /// Disown a single node
    Disown { node: u8 },
    /// Move a run of `parent`'s children under `to` at position `pos`
    Move { parent: u8, start: u8, len: u8, to: u8, pos: u8 },
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 4;
        let rest = &bytes[1..];

        match op_type {
            0 => Some((FuzzOp::Create, rest)),
            1 if rest.len() >= 3 => {
                let op = FuzzOp::Adopt { node: rest[0], parent: rest[1], pos: rest[2] };
                Some((op, &rest[3..]))
            }
            2 if !rest.is_empty() => Some((FuzzOp::Disown { node: rest[0] }, &rest[1..])),
            3 if rest.len() >= 5 => {
                let op = FuzzOp::Move {
                    parent: rest[0],
                    start: rest[1],
                    len: rest[2],
                    to: rest[3],
                    pos: rest[4],
                };
                Some((op, &rest[5..]))
            }
            _ => None,
        }
    }
}

/// Reference model: parent and ordered children per node index.
struct Model {
    parent: Vec<Option<usize>>,
    kids: Vec<Vec<usize>>,
}

impl Model {
    fn is_ancestor_or_self(&self, ancestor: usize, mut node: usize) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent[node] {
                Some(p) => node = p,
                None => return false,
            }
        }
    }
}

fn gap(tree: &Tree<usize>, parent: NodeId, pos: u8) -> (Option<NodeId>, Option<NodeId>) {
    let kids: Vec<NodeId> = tree.child_iter(parent).collect();
    let at = pos as usize % (kids.len() + 1);
    let left = if at == 0 { None } else { Some(kids[at - 1]) };
    (left, kids.get(at).copied())
}

fn check(tree: &Tree<usize>, ids: &[NodeId], model: &Model) {
    for (i, &id) in ids.iter().enumerate() {
        let kids: Vec<usize> = tree.child_iter(id).map(|c| *tree.data(c)).collect();
        assert_eq!(kids, model.kids[i], "children of node {} diverged", i);
        assert_eq!(
            tree.parent(id).map(|p| *tree.data(p)),
            model.parent[i],
            "parent of node {} diverged",
            i
        );
        if tree.is_free(id) {
            assert_eq!(tree.left(id), None);
            assert_eq!(tree.right(id), None);
            tree.validate(id).unwrap();
        }
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut tree: Tree<usize> = Tree::new();
        let mut ids = vec![tree.create(0)];
        let mut model = Model { parent: vec![None], kids: vec![Vec::new()] };
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;
            let n = ids.len();

            match op {
                FuzzOp::Create => {
                    if n < MAX_NODES {
                        ids.push(tree.create(n));
                        model.parent.push(None);
                        model.kids.push(Vec::new());
                    }
                }

                FuzzOp::Adopt { node, parent, pos } => {
                    let (node, parent) = (node as usize % n, parent as usize % n);
                    let (left, right) = gap(&tree, ids[parent], pos);
                    let expect_ok = model.parent[node].is_none()
                        && !model.is_ancestor_or_self(node, parent);

                    let result = tree.try_adopt(ids[node], ids[parent], left, right);
                    assert_eq!(result.is_ok(), expect_ok, "adopt {:?}", result);
                    if expect_ok {
                        let at = left.map_or(0, |l| {
                            model.kids[parent].iter().position(|&k| k == *tree.data(l)).unwrap() + 1
                        });
                        model.kids[parent].insert(at, node);
                        model.parent[node] = Some(parent);
                    }
                }

                FuzzOp::Disown { node } => {
                    let node = node as usize % n;
                    tree.disown(ids[node]);
                    if let Some(p) = model.parent[node].take() {
                        model.kids[p].retain(|&k| k != node);
                    }
                }

                FuzzOp::Move { parent, start, len, to, pos } => {
                    let (parent, to) = (parent as usize % n, to as usize % n);
                    let count = model.kids[parent].len();
                    if count == 0 {
                        continue;
                    }
                    let start = start as usize % count;
                    let len = (len as usize % (count - start)) + 1;
                    let moved: Vec<usize> = model.kids[parent][start..start + len].to_vec();

                    let first = ids[moved[0]];
                    let last = ids[moved[len - 1]];
                    let home = (tree.left(first), tree.right(last));

                    let mut run = tree.select_children(first, last);
                    run.disown(&mut tree).unwrap();
                    model.kids[parent].drain(start..start + len);
                    for &m in &moved {
                        model.parent[m] = None;
                    }

                    let (left, right) = gap(&tree, ids[to], pos);
                    let expect_ok = !moved.iter().any(|&m| model.is_ancestor_or_self(m, to));
                    let snapshot = format!("{:?}", tree);

                    let adopted = run.adopt(&mut tree, ids[to], left, right).map(|_| ());
                    match adopted {
                        Ok(()) => {
                            assert!(expect_ok, "adopt into own subtree succeeded");
                            let at = left.map_or(0, |l| {
                                model.kids[to].iter().position(|&k| k == *tree.data(l)).unwrap() + 1
                            });
                            model.kids[to].splice(at..at, moved.iter().copied());
                            for &m in &moved {
                                model.parent[m] = Some(to);
                            }
                        }
                        Err(_) => {
                            assert!(!expect_ok, "legal adopt was refused");
                            assert_eq!(format!("{:?}", tree), snapshot, "refused adopt mutated");
                            run.adopt(&mut tree, ids[parent], home.0, home.1).unwrap();
                            model.kids[parent].splice(start..start, moved.iter().copied());
                            for &m in &moved {
                                model.parent[m] = Some(parent);
                            }
                        }
                    }
                }
            }

            check(&tree, &ids, &model);
        }
    });
}
