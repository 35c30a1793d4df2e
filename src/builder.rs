//! Random topology construction and canonicalisation.
//!
//! `random_tree` builds a tree by repeated sprouting (§4.C): starting from a
//! 3-leaf star, `n - 3` times a random current leaf (never the root) is
//! turned into an internal branch with two fresh leaf children. This is
//! uniform *by insertion order*, not uniform over unlabelled topologies - it
//! is biased toward balanced trees, and that bias is preserved deliberately
//! because it matches the original engine's sampling distribution.

use crate::arena::{TreeArena, UNSET};
use crate::reroot::reroot;
use crate::rng::Rng;

/// Build a uniformly-shaped-by-insertion random unrooted binary tree over
/// `n` objects with `m`-byte statesets, with object indices already assigned
/// to canonical leaf positions (post-condition: for every leaf `i < n`, the
/// leaf living at branch `i` corresponds to object `i`).
pub fn random_tree(rng: &mut Rng, n: i64, m: i64) -> TreeArena {
    let mut arena = TreeArena::alloc(n, m);
    arena.mark_all_dirty();
    let leafmask = random_topology(rng, &mut arena);
    let objnos = random_leaf_assignment(rng, &arena, &leafmask);
    make_canonical(&mut arena, objnos);
    arena
}

/// Fill `arena` with a random topology; `arena[0]` is the root. Returns, for
/// each branch index, whether it is a leaf.
fn random_topology(rng: &mut Rng, arena: &mut TreeArena) -> Vec<bool> {
    let n = arena.n();
    let nbranches = arena.branch_count();
    let mut is_leaf = vec![false; nbranches as usize];
    let mut next_free: i64 = 0;

    arena.set_parent(0, UNSET);
    is_leaf[next_free as usize] = true;
    next_free += 1;

    arena.set_left(0, next_free);
    arena.set_parent(next_free, 0);
    is_leaf[next_free as usize] = true;
    next_free += 1;

    arena.set_right(0, next_free);
    arena.set_parent(next_free, 0);
    is_leaf[next_free as usize] = true;
    next_free += 1;

    let mut leaves = 3;
    while leaves < n {
        let togrow = loop {
            let candidate = 1 + rng.randpint(next_free - 2);
            if is_leaf[candidate as usize] {
                break candidate;
            }
        };

        arena.set_left(togrow, next_free);
        arena.set_parent(next_free, togrow);
        is_leaf[next_free as usize] = true;
        next_free += 1;

        arena.set_right(togrow, next_free);
        arena.set_parent(next_free, togrow);
        is_leaf[next_free as usize] = true;
        next_free += 1;

        is_leaf[togrow as usize] = false;
        leaves += 1;
    }

    is_leaf
}

/// Uniformly permute object ids `0..n` onto the leaf branches flagged in
/// `leafmask`. Returns, for every branch, its assigned object id or `UNSET`
/// for internal branches.
fn random_leaf_assignment(rng: &mut Rng, arena: &TreeArena, leafmask: &[bool]) -> Vec<i64> {
    let n = arena.n();
    let nbranches = arena.branch_count();
    let mut used = vec![false; n as usize];
    let mut objnos = vec![UNSET; nbranches as usize];
    let mut assigned = 0;

    for b in 0..nbranches {
        if leafmask[b as usize] {
            let candidate = loop {
                let c = rng.randpint(n - 1);
                if !used[c as usize] {
                    break c;
                }
            };
            objnos[b as usize] = candidate;
            used[candidate as usize] = true;
            assigned += 1;
        }
    }

    assert_eq!(assigned, n, "random_leaf_assignment: not every object was placed");
    objnos
}

/// Rewrite every reference to branch `was` (as a parent, left, or right
/// child anywhere in the tree) to name `now` instead.
fn rewrite_references(arena: &mut TreeArena, was: i64, now: i64) {
    for b in 0..arena.branch_count() {
        if arena.parent(b) == was {
            arena.set_parent(b, now);
        }
        if arena.left(b) == was {
            arena.set_left(b, now);
        }
        if arena.right(b) == was {
            arena.set_right(b, now);
        }
    }
}

/// Re-label branches so that object `i` always lives at branch index `i`
/// for `i < n`, and re-root to branch 0 if the object-0 leaf did not land
/// there by chance (§4.C `tree_make_canonical`).
///
/// Implemented by repeated swapping: the branch currently holding object
/// `i` is swapped with whatever currently sits at branch index `i`, using
/// a pair of out-of-range sentinel indices to avoid aliasing while
/// rewriting cross-references during the swap.
fn make_canonical(arena: &mut TreeArena, mut objnos: Vec<i64>) {
    let nbranches = arena.branch_count();
    let sentinel_1 = nbranches;
    let sentinel_2 = nbranches + 1;

    loop {
        let mut swap_made = false;
        for i in 0..nbranches {
            let obj_no = objnos[i as usize];
            if obj_no != UNSET && obj_no != i {
                // Snapshot both records before either is rewritten, so that
                // a direct adjacency between `obj_no` and `i` (one is the
                // other's parent or child) is not lost mid-swap.
                let (mut p1, mut l1, mut r1, c1) =
                    (arena.parent(obj_no), arena.left(obj_no), arena.right(obj_no), arena.changes(obj_no));
                rewrite_references(arena, obj_no, sentinel_1);

                let (mut p2, mut l2, mut r2, c2) =
                    (arena.parent(i), arena.left(i), arena.right(i), arena.changes(i));
                rewrite_references(arena, i, sentinel_2);

                if p1 == i {
                    p1 = sentinel_2;
                }
                if l1 == i {
                    l1 = sentinel_2;
                }
                if r1 == i {
                    r1 = sentinel_2;
                }
                if p2 == obj_no {
                    p2 = sentinel_1;
                }
                if l2 == obj_no {
                    l2 = sentinel_1;
                }
                if r2 == obj_no {
                    r2 = sentinel_1;
                }

                arena.set_parent(i, p1);
                arena.set_left(i, l1);
                arena.set_right(i, r1);
                arena.set_changes(i, c1);

                arena.set_parent(obj_no, p2);
                arena.set_left(obj_no, l2);
                arena.set_right(obj_no, r2);
                arena.set_changes(obj_no, c2);

                rewrite_references(arena, sentinel_1, i);
                rewrite_references(arena, sentinel_2, obj_no);

                objnos.swap(i as usize, obj_no as usize);
                swap_made = true;
            }
        }
        if !swap_made {
            break;
        }
    }

    // sset views are addressed by the arena itself, not carried on the
    // swapped branch records, so no patch-up is needed here (unlike the
    // original's pointer-based implementation).

    let mut root = UNSET;
    for i in 0..arena.n() {
        if arena.parent(i) == UNSET {
            assert_eq!(root, UNSET, "tree_make_canonical: more than one root found");
            root = i;
        }
    }
    assert_ne!(root, UNSET, "tree_make_canonical: no root found among leaves");

    arena.root = root;
    if root != 0 {
        reroot(arena, root, 0);
    }

    for i in 0..arena.n() {
        assert_eq!(objnos[i as usize], i, "tree_make_canonical: leaf {i} not canonical");
    }
    for i in arena.n()..nbranches {
        assert_eq!(objnos[i as usize], UNSET, "tree_make_canonical: branch {i} should be internal");
    }
}
