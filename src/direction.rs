//! Directions along a child list.
//!
//! Most splice and traversal code is written once against a `Dir` instead of
//! twice (once per side). `Ends<T>` is the matching pair type: a node's two
//! sibling links, a node's two child-list ends, and a fragment's two ends are
//! all `Ends` indexed by `Dir`.

use std::ops::Index;
use std::ops::IndexMut;

/// One side of a gap or a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Left,
    Right,
}

impl Dir {
    /// Both directions, left first.
    pub const BOTH: [Dir; 2] = [Dir::Left, Dir::Right];

    /// The other side.
    #[inline]
    pub fn opposite(self) -> Dir {
        return match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        };
    }

    /// Orders a `(with, opposite)` pair into `(left, right)`.
    #[inline]
    pub fn arrange<T>(self, with_dir: T, opp_dir: T) -> (T, T) {
        return match self {
            Dir::Left => (with_dir, opp_dir),
            Dir::Right => (opp_dir, with_dir),
        };
    }
}

/// A left/right pair addressed by `Dir`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ends<T> {
    pub left: T,
    pub right: T,
}

impl<T> Ends<T> {
    pub fn new(left: T, right: T) -> Ends<T> {
        return Ends { left, right };
    }

    /// Builds a pair where `with_dir` lands on the `dir` side.
    pub fn with_dir(dir: Dir, with_dir: T, opp_dir: T) -> Ends<T> {
        let (left, right) = dir.arrange(with_dir, opp_dir);
        return Ends { left, right };
    }
}

impl<T: Copy> Ends<T> {
    /// Both sides set to the same value.
    pub fn splat(value: T) -> Ends<T> {
        return Ends { left: value, right: value };
    }
}

impl<T> Index<Dir> for Ends<T> {
    type Output = T;

    #[inline]
    fn index(&self, dir: Dir) -> &T {
        return match dir {
            Dir::Left => &self.left,
            Dir::Right => &self.right,
        };
    }
}

impl<T> IndexMut<Dir> for Ends<T> {
    #[inline]
    fn index_mut(&mut self, dir: Dir) -> &mut T {
        return match dir {
            Dir::Left => &mut self.left,
            Dir::Right => &mut self.right,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Dir::BOTH {
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Dir::Left.opposite(), Dir::Right);
    }

    #[test]
    fn arrange_orders_by_side() {
        assert_eq!(Dir::Left.arrange("with", "opp"), ("with", "opp"));
        assert_eq!(Dir::Right.arrange("with", "opp"), ("opp", "with"));
    }

    #[test]
    fn ends_index_by_dir() {
        let mut ends = Ends::new(1, 2);
        assert_eq!(ends[Dir::Left], 1);
        assert_eq!(ends[Dir::Right], 2);

        ends[Dir::Right] = 5;
        assert_eq!(ends.right, 5);

        let flipped = Ends::with_dir(Dir::Right, 'w', 'o');
        assert_eq!(flipped, Ends::new('o', 'w'));
        assert_eq!(Ends::splat(None::<u8>), Ends::default());
    }
}
