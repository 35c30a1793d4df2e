//! Topology mutators: nearest-neighbour interchange (NNI) and subtree
//! pruning and regrafting (SPR), each a local rearrangement applied to a
//! duplicate of a source tree, followed by dirty-flag propagation that
//! invalidates exactly the ancestor chain above the change.

use crate::arena::{TreeArena, UNSET};
use crate::rng::Rng;

/// Mark `node` and every proper ancestor dirty, stopping before the root
/// (the root is inherently dirty after any change and is never marked
/// explicitly - §4.D). `node` must be an internal branch with a parent.
fn mark_dirty_below(tree: &mut TreeArena, node: i64) {
    assert!(node >= tree.n(), "mark_dirty_below: {node} is a leaf/root, not an internal branch");
    assert_ne!(tree.parent(node), UNSET, "mark_dirty_below: {node} has no parent");

    let mut current = node;
    loop {
        tree.mark_dirty(current);
        current = tree.parent(current);
        if tree.parent(current) == UNSET {
            break;
        }
    }
}

/// Apply a nearest-neighbour interchange at internal branch `u`, flipping
/// `b <-> c` when `left` is `false` ("heads") or `a <-> c` when `left` is
/// `true` ("tails"), where `v = parent(u)`, `a = left(u)`, `b = right(u)`,
/// `c = sibling(u)`. Applying the same `(u, left)` twice restores the
/// original topology (§8 property 7).
fn nni_at(tree: &mut TreeArena, u: i64, left: bool) {
    let v = tree.parent(u);
    let a = tree.left(u);
    let b = tree.right(u);
    let c = if tree.left(v) == u { tree.right(v) } else { tree.left(v) };

    if !left {
        tree.replace_child(v, c, b);
        tree.set_left(u, a);
        tree.set_right(u, c);
        tree.set_parent(a, u);
        tree.set_parent(c, u);
        tree.set_parent(b, v);
    } else {
        tree.replace_child(v, c, a);
        tree.set_left(u, b);
        tree.set_right(u, c);
        tree.set_parent(b, u);
        tree.set_parent(c, u);
        tree.set_parent(a, v);
    }

    mark_dirty_below(tree, u);
}

/// Copy `src` into `dest`, then apply a random NNI at a uniformly chosen
/// internal branch, with a fair coin choosing heads/tails. Requires
/// `src.n() >= 4` (with 3 leaves there is no internal branch to pick).
pub fn nni(rng: &mut Rng, dest: &mut TreeArena, src: &TreeArena) {
    assert!(src.n() >= 4, "nni: need at least 4 leaves to have an internal branch");
    dest.copy_from(src);
    let n = dest.n();
    let nbranches = dest.branch_count();
    let u = n + rng.randpint(nbranches - n - 1);
    let left = rng.uni() >= 0.5;
    nni_at(dest, u, left);
}

/// Copy `src` into `dest`, then apply a deterministic NNI at branch `u`
/// (which must be internal and not the root), choosing the `left`/`right`
/// outcome explicitly so test code can exercise both without the RNG.
pub fn nni_deterministic(dest: &mut TreeArena, src: &TreeArena, u: i64, left: bool) {
    dest.copy_from(src);
    assert_ne!(u, dest.root, "nni_deterministic: u must not be the root");
    assert!(u >= dest.n(), "nni_deterministic: u must be an internal branch");
    nni_at(dest, u, left);
}

fn is_descendant(tree: &TreeArena, ancestor: i64, candidate: i64) -> bool {
    let mut cur = tree.parent(candidate);
    while cur != UNSET {
        if cur == ancestor {
            return true;
        }
        cur = tree.parent(cur);
    }
    false
}

/// Copy `src` into `dest`, then prune a random subtree and regraft it at a
/// random, valid edge. If no valid regraft site exists (possible for very
/// small trees), this is a no-op and `dest` remains a plain copy of `src`.
pub fn spr(rng: &mut Rng, dest: &mut TreeArena, src: &TreeArena) {
    assert!(src.n() >= 4, "spr: need at least 4 leaves to rearrange");
    dest.copy_from(src);
    let tree = dest;
    let root = tree.root;
    let nbranches = tree.branch_count();

    let root_left = tree.left(root);
    let root_right = tree.right(root);

    let src_candidates: Vec<i64> = (0..nbranches)
        .filter(|&b| b != root && b != root_left && b != root_right)
        .collect();
    assert!(!src_candidates.is_empty(), "spr: no eligible source branch");
    let src_branch = src_candidates[rng.randpint(src_candidates.len() as i64 - 1) as usize];

    let src_parent = tree.parent(src_branch);
    assert_ne!(src_parent, UNSET);
    let src_sister = tree.sibling(src_branch);
    assert_ne!(src_sister, UNSET);

    let dest_candidates: Vec<i64> = (0..nbranches)
        .filter(|&b| {
            b != src_branch
                && b != src_parent
                && b != src_sister
                && b != root
                && !is_descendant(tree, src_branch, b)
        })
        .collect();

    if dest_candidates.is_empty() {
        return;
    }
    let dest_branch = dest_candidates[rng.randpint(dest_candidates.len() as i64 - 1) as usize];

    // Excise src together with its parent, reconnecting src's sister
    // directly to its grandparent.
    tree.replace_child(src_parent, src_branch, UNSET);
    tree.set_parent(src_branch, UNSET);

    let parents_par = tree.parent(src_parent);
    assert_ne!(parents_par, UNSET);
    tree.replace_child(parents_par, src_parent, src_sister);
    tree.set_parent(src_sister, parents_par);

    // Re-use the freed branch as the new internal node above dest.
    let excess_br = src_parent;
    tree.clear_branch(excess_br);

    let dest_parent = tree.parent(dest_branch);
    tree.replace_child(dest_parent, dest_branch, excess_br);
    tree.set_parent(excess_br, dest_parent);
    tree.set_left(excess_br, dest_branch);
    tree.set_parent(dest_branch, excess_br);

    tree.set_right(excess_br, src_branch);
    tree.set_parent(src_branch, excess_br);

    mark_dirty_below(tree, excess_br);
    if parents_par != root {
        mark_dirty_below(tree, parents_par);
    }
}
