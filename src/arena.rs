//! Tree arena: contiguous allocation of branches plus per-branch statesets.
//!
//! A tree is a pointer-graph of fixed-size branch records, addressed by
//! integer index rather than heap pointers, so that the whole tree -
//! scalars and statesets alike - is a single allocation. `TreeArena::copy_from`
//! is therefore a pair of memcpy-equivalent slice copies, never a per-node walk.
//!
//! Branches `0..n` are leaves (one-to-one with objects `0..n`); branches
//! `n..branch_count()` are internal. Exactly one branch is the root
//! (`parent == UNSET`); in canonical form it is always branch `0`.

use std::io::{self, Write};

/// Sentinel for "no branch here". Distinguishable from any valid branch index.
pub const UNSET: i64 = -1;

/// Smallest tree this engine will build (a 3-leaf star).
pub const MIN_N: i64 = 3;
/// Largest object count supported without reconfiguring the build.
pub const MAX_N: i64 = 1_000_000;
/// Smallest character matrix width.
pub const MIN_M: i64 = 1;
/// Largest character matrix width supported without reconfiguring the build.
pub const MAX_M: i64 = 1_000_000;

/// Number of branches in an unrooted binary tree of `n` leaves.
pub fn branch_count(n: i64) -> i64 {
    (n << 1) - 3
}

/// Per-branch scalar links. The stateset bytes live in the arena's second
/// region and are addressed separately (see [`TreeArena::sset`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchLinks {
    pub parent: i64,
    pub left: i64,
    pub right: i64,
    pub changes: i64,
}

impl Default for BranchLinks {
    fn default() -> Self {
        BranchLinks { parent: UNSET, left: UNSET, right: UNSET, changes: UNSET }
    }
}

/// A single contiguous allocation holding `branch_count(n)` branches and
/// their statesets (`branch_count(n) * m` bytes).
///
/// The first byte of each branch's stateset view doubles as a dirty flag:
/// `0` means stale, any nonzero value means the stateset is valid. This
/// convention is relied on by the (out-of-scope) parsimony scorer and is
/// never touched directly outside [`TreeArena::is_dirty`] / [`TreeArena::mark_dirty`].
#[derive(Clone, Debug)]
pub struct TreeArena {
    n: usize,
    m: usize,
    links: Vec<BranchLinks>,
    ssets: Vec<u8>,
    /// Index of the current root branch (`parent == UNSET`).
    pub root: i64,
}

impl TreeArena {
    /// Allocate a tree arena for `n` objects of `m` characters each.
    /// All scalars start `UNSET`; every stateset starts dirty.
    pub fn alloc(n: i64, m: i64) -> Self {
        assert!(n >= MIN_N && n <= MAX_N, "n={n} out of range [{MIN_N}, {MAX_N}]");
        assert!(m >= MIN_M && m <= MAX_M, "m={m} out of range [{MIN_M}, {MAX_M}]");
        let branches = branch_count(n) as usize;
        TreeArena {
            n: n as usize,
            m: m as usize,
            links: vec![BranchLinks::default(); branches],
            ssets: vec![0u8; branches * m as usize],
            root: UNSET,
        }
    }

    #[inline]
    pub fn n(&self) -> i64 {
        self.n as i64
    }

    #[inline]
    pub fn m(&self) -> i64 {
        self.m as i64
    }

    #[inline]
    pub fn branch_count(&self) -> i64 {
        branch_count(self.n as i64)
    }

    #[inline]
    fn idx(&self, b: i64) -> usize {
        assert!(b >= 0 && (b as usize) < self.links.len(), "branch index {b} out of range");
        b as usize
    }

    #[inline]
    pub fn is_leaf(&self, b: i64) -> bool {
        (self.idx(b) as i64) < self.n()
    }

    #[inline]
    pub fn parent(&self, b: i64) -> i64 {
        self.links[self.idx(b)].parent
    }

    #[inline]
    pub fn left(&self, b: i64) -> i64 {
        self.links[self.idx(b)].left
    }

    #[inline]
    pub fn right(&self, b: i64) -> i64 {
        self.links[self.idx(b)].right
    }

    #[inline]
    pub fn changes(&self, b: i64) -> i64 {
        self.links[self.idx(b)].changes
    }

    #[inline]
    pub fn set_parent(&mut self, b: i64, v: i64) {
        let i = self.idx(b);
        self.links[i].parent = v;
    }

    #[inline]
    pub fn set_left(&mut self, b: i64, v: i64) {
        let i = self.idx(b);
        self.links[i].left = v;
    }

    #[inline]
    pub fn set_right(&mut self, b: i64, v: i64) {
        let i = self.idx(b);
        self.links[i].right = v;
    }

    #[inline]
    pub fn set_changes(&mut self, b: i64, v: i64) {
        let i = self.idx(b);
        self.links[i].changes = v;
    }

    /// Replace branch `b`'s sister of `old` with `new` in the parent's child
    /// slot naming `old`. Crashes with a diagnostic if `old` is not actually
    /// a child of `b` (structural invariant violation, §7 kind 2).
    pub fn replace_child(&mut self, parent: i64, old: i64, new: i64) {
        let i = self.idx(parent);
        if self.links[i].left == old {
            self.links[i].left = new;
        } else if self.links[i].right == old {
            self.links[i].right = new;
        } else {
            panic!(
                "internal error: branch {old} is not a child of its claimed parent {parent} \
                 (parent has left={}, right={})",
                self.links[i].left, self.links[i].right
            );
        }
    }

    /// Sister of `branch` under its parent, or `UNSET` if `branch` is the root.
    pub fn sibling(&self, branch: i64) -> i64 {
        let p = self.parent(branch);
        if p == UNSET {
            return UNSET;
        }
        if self.left(p) == branch {
            self.right(p)
        } else if self.right(p) == branch {
            self.left(p)
        } else {
            panic!(
                "internal error: branch {branch} claims parent {p}, but {p} has \
                 left={}, right={}",
                self.left(p),
                self.right(p)
            );
        }
    }

    /// View of the `m`-byte stateset for branch `b`. Byte 0 is the dirty flag.
    #[inline]
    pub fn sset(&self, b: i64) -> &[u8] {
        let i = self.idx(b);
        &self.ssets[i * self.m..(i + 1) * self.m]
    }

    #[inline]
    pub fn sset_mut(&mut self, b: i64) -> &mut [u8] {
        let i = self.idx(b);
        &mut self.ssets[i * self.m..(i + 1) * self.m]
    }

    #[inline]
    pub fn is_dirty(&self, b: i64) -> bool {
        self.sset(b)[0] == 0
    }

    #[inline]
    pub fn mark_dirty(&mut self, b: i64) {
        self.sset_mut(b)[0] = 0;
    }

    /// Reset branch `b` to all-`UNSET` scalars and a dirty stateset.
    pub fn clear_branch(&mut self, b: i64) {
        let i = self.idx(b);
        self.links[i] = BranchLinks::default();
        self.ssets[i * self.m] = 0;
    }

    /// Mark every branch dirty: internal, external and root alike.
    pub fn mark_all_dirty(&mut self) {
        for i in 0..self.links.len() {
            self.ssets[i * self.m] = 0;
        }
    }

    /// Copy the whole arena (scalars and statesets) from `src` into `self`.
    /// It is a fatal error for the two arenas to differ in `n` or `m`.
    pub fn copy_from(&mut self, src: &TreeArena) {
        assert_eq!(self.n, src.n, "treecopy: arenas have different n");
        assert_eq!(self.m, src.m, "treecopy: arenas have different m");
        self.links.copy_from_slice(&src.links);
        self.ssets.copy_from_slice(&src.ssets);
        self.root = src.root;
    }

    /// Copy per-object encoded statesets (one `m`-byte row per object, in
    /// object-index order) into the matching leaf branches, and mark every
    /// internal branch dirty. The root's own stateset byte is left as-is;
    /// it is always treated as dirty by the engine regardless (§4.D).
    pub fn init_statesets(&mut self, encoded: &[Vec<u8>]) {
        assert_eq!(encoded.len(), self.n, "init_statesets: row count does not match n");
        for (obj, row) in encoded.iter().enumerate() {
            assert_eq!(row.len(), self.m, "init_statesets: row {obj} has wrong width");
            let start = obj * self.m;
            self.ssets[start..start + self.m].copy_from_slice(row);
        }
        for b in (self.n as i64)..self.branch_count() {
            self.mark_dirty(b);
        }
    }

    /// Dump the branch table as tab-separated diagnostics, mirroring the
    /// original engine's `treedump`. I/O failure here is fatal per §7.
    pub fn dump(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "Branch\tParent\tLeft\tRight\tChanges\tDirty")?;
        for b in 0..self.branch_count() {
            writeln!(
                w,
                "{b}\t{}\t{}\t{}\t{}\t{}",
                self.parent(b),
                self.left(b),
                self.right(b),
                self.changes(b),
                if self.is_dirty(b) { "yes" } else { "no" },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_count_matches_formula() {
        assert_eq!(branch_count(3), 3);
        assert_eq!(branch_count(4), 5);
        assert_eq!(branch_count(10), 17);
    }

    #[test]
    fn alloc_starts_unset_and_dirty() {
        let t = TreeArena::alloc(5, 4);
        assert_eq!(t.branch_count(), 7);
        for b in 0..t.branch_count() {
            assert_eq!(t.parent(b), UNSET);
            assert_eq!(t.left(b), UNSET);
            assert_eq!(t.right(b), UNSET);
            assert!(t.is_dirty(b));
        }
    }

    #[test]
    fn copy_from_duplicates_and_is_independent() {
        let mut src = TreeArena::alloc(5, 4);
        src.set_parent(1, 0);
        src.sset_mut(1)[0] = 7;
        let mut dst = TreeArena::alloc(5, 4);
        dst.copy_from(&src);
        assert_eq!(dst.parent(1), 0);
        assert_eq!(dst.sset(1)[0], 7);

        dst.set_parent(1, 2);
        assert_eq!(src.parent(1), 0);
    }

    #[test]
    #[should_panic]
    fn copy_from_rejects_mismatched_sizes() {
        let src = TreeArena::alloc(5, 4);
        let mut dst = TreeArena::alloc(6, 4);
        dst.copy_from(&src);
    }

    #[test]
    fn replace_child_updates_correct_slot() {
        let mut t = TreeArena::alloc(4, 1);
        t.set_left(0, 1);
        t.set_right(0, 2);
        t.replace_child(0, 2, 3);
        assert_eq!(t.right(0), 3);
        assert_eq!(t.left(0), 1);
    }

    #[test]
    #[should_panic]
    fn replace_child_panics_on_non_child() {
        let mut t = TreeArena::alloc(4, 1);
        t.set_left(0, 1);
        t.set_right(0, 2);
        t.replace_child(0, 5, 3);
    }

    #[test]
    fn sibling_returns_unset_for_root() {
        let t = TreeArena::alloc(4, 1);
        assert_eq!(t.sibling(0), UNSET);
    }
}
