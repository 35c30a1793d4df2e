//! Re-rooting: move the (bookkeeping) root to a different leaf while
//! preserving the unrooted topology, in O(depth).

use crate::arena::{TreeArena, UNSET};
use crate::rng::Rng;

/// Move `arena`'s root from `old` to `new`. `new` must be a leaf distinct
/// from `old`. Walks the parent chain from `new` up to `old`, flipping each
/// branch's orientation along the way, then clears `old`'s children (it
/// becomes an ordinary leaf). Marks every internal branch dirty. Returns
/// `old`, mirroring the original `lvb_reroot` return convention.
pub fn reroot(arena: &mut TreeArena, old: i64, new: i64) -> i64 {
    assert!(arena.is_leaf(new), "reroot: new root {new} is not a leaf");
    assert_ne!(new, old, "reroot: new root must differ from old root");

    let nbranches = arena.branch_count();
    let old_parent: Vec<i64> = (0..nbranches).map(|b| arena.parent(b)).collect();

    let mut current = new;
    let mut previous = UNSET;
    while current != old {
        assert_ne!(current, UNSET, "reroot: walked off the tree before reaching old root");
        let parnt = old_parent[current as usize];
        let sister = if current == arena.left(parnt) {
            arena.right(parnt)
        } else if current == arena.right(parnt) {
            arena.left(parnt)
        } else {
            panic!(
                "internal error in reroot(): branch {current} has old parent {parnt}, \
                 but {parnt} does not have it as a child"
            );
        };

        arena.set_parent(current, previous);
        arena.set_left(current, parnt);
        arena.set_right(current, sister);
        arena.set_parent(parnt, current);
        arena.set_parent(sister, current);

        previous = current;
        current = parnt;
    }

    arena.set_left(old, UNSET);
    arena.set_right(old, UNSET);

    for b in arena.n()..nbranches {
        arena.mark_dirty(b);
    }

    arena.root = new;
    old
}

/// Re-root to a uniformly random leaf other than `old`. Returns the new root.
pub fn reroot_arbitrary(rng: &mut Rng, arena: &mut TreeArena, old: i64) -> i64 {
    let new = loop {
        let candidate = rng.randpint(arena.n() - 1);
        if candidate != old {
            break candidate;
        }
    };
    reroot(arena, old, new);
    new
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::random_tree;
    use crate::compare::TreeCompare;

    #[test]
    fn reroot_round_trip_preserves_topology() {
        let mut rng = Rng::new(77);
        let original = random_tree(&mut rng, 10, 4);
        let mut working = original.clone();

        let old_root = working.root;
        reroot(&mut working, old_root, 3);
        reroot(&mut working, 3, old_root);

        let mut cmp = TreeCompare::new(10);
        assert!(cmp.trees_equal(&original, original.root, &working, working.root));
    }

    #[test]
    fn reroot_clears_old_roots_children() {
        let mut rng = Rng::new(5);
        let mut arena = random_tree(&mut rng, 6, 2);
        let old_root = arena.root;
        reroot(&mut arena, old_root, 2);
        assert_eq!(arena.left(old_root), UNSET);
        assert_eq!(arena.right(old_root), UNSET);
        assert_eq!(arena.root, 2);
    }

    #[test]
    #[should_panic]
    fn reroot_rejects_non_leaf_target() {
        let mut rng = Rng::new(5);
        let mut arena = random_tree(&mut rng, 8, 2);
        let internal = arena.n();
        reroot(&mut arena, arena.root, internal);
    }
}
