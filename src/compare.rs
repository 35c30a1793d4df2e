//! Bipartition comparator: decide whether two trees share the same
//! unrooted topology, independent of which leaf each currently uses as its
//! bookkeeping root.
//!
//! Grounded in the original engine's `treecmp`/`makesets`/`fillsets`/`sort`/
//! `setstcmp`: each internal branch of a tree corresponds to one bipartition
//! of the object set (the leaves reachable below it versus the rest). Two
//! trees describe the same unrooted topology exactly when their bipartition
//! sets are equal once both trees are rooted at the same leaf. The two
//! `Objset` scratch tables are allocated once per comparator and reused
//! across calls, matching §3's "owned by the comparator and reused across
//! calls" and §5's "sized for the fixed N of the run".

use crate::arena::TreeArena;
use crate::reroot::reroot;

/// One bipartition: the sorted list of object ids in a subtree.
pub type Objset = Vec<i64>;

/// Owns the scratch tree used to re-root a working copy of the second
/// argument before comparison, plus the two `Objset` tables the original
/// calls `eventsets1`/`eventsets2`, so repeated comparisons (as happen
/// inside a search loop) do not re-allocate.
pub struct TreeCompare {
    n: i64,
    scratch: TreeArena,
    sets_a: Vec<Objset>,
    sets_b: Vec<Objset>,
}

impl TreeCompare {
    /// Build a comparator for trees over `n` objects. Each tree of `n`
    /// leaves has exactly `n - 3` non-root internal branches, hence `n - 3`
    /// rows per comparison (§4.F "Total rows per tree: N − 3").
    pub fn new(n: i64) -> Self {
        assert!(n >= 3, "TreeCompare::new: n must be at least 3, got {n}");
        let rows = (n - 3).max(0) as usize;
        TreeCompare {
            n,
            scratch: TreeArena::alloc(n, 1),
            sets_a: vec![Vec::new(); rows],
            sets_b: vec![Vec::new(); rows],
        }
    }

    /// Copy only the topology (parent/left/right/root) of `src` into the
    /// scratch arena, ignoring statesets - the comparator never reads them.
    fn load_topology(&mut self, src: &TreeArena) {
        for b in 0..src.branch_count() {
            self.scratch.set_parent(b, src.parent(b));
            self.scratch.set_left(b, src.left(b));
            self.scratch.set_right(b, src.right(b));
        }
        self.scratch.root = src.root;
    }

    fn collect_descendants(tree: &TreeArena, branch: i64, out: &mut Objset) {
        if tree.is_leaf(branch) {
            out.push(branch);
            return;
        }
        Self::collect_descendants(tree, tree.left(branch), out);
        Self::collect_descendants(tree, tree.right(branch), out);
    }

    /// `fillsets` + `getobjs`: for every non-root internal branch of `tree`,
    /// write the sorted list of object ids below it into `out`, then sort
    /// the whole table by `(cnt, lexicographic list)` so two topologically
    /// equal trees produce byte-identical tables regardless of branch
    /// numbering or rooting (`sort`).
    fn fillsets(tree: &TreeArena, out: &mut [Objset]) {
        debug_assert_eq!(out.len() as i64, tree.n() - 3);
        for (row, b) in (tree.n()..tree.branch_count()).enumerate() {
            out[row].clear();
            Self::collect_descendants(tree, b, &mut out[row]);
            out[row].sort_unstable();
        }
        out.sort_unstable_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    }

    /// `setstcmp`: row-wise comparison of two canonicalised Objset tables.
    fn setstcmp(a: &[Objset], b: &[Objset]) -> bool {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
    }

    /// Do `a` (rooted at `root_a`) and `b` (rooted at `root_b`) describe the
    /// same unrooted topology? `b` is re-rooted to `root_a`'s leaf (via an
    /// internal scratch copy; `b` itself is never mutated) before the
    /// bipartition tables are compared. §8 property 9: this relation is
    /// reflexive, symmetric and transitive, and independent of either tree's
    /// chosen root.
    pub fn trees_equal(&mut self, a: &TreeArena, root_a: i64, b: &TreeArena, root_b: i64) -> bool {
        assert_eq!(a.n(), self.n, "trees_equal: tree a has a different object count");
        assert_eq!(b.n(), self.n, "trees_equal: tree b has a different object count");
        assert!(a.is_leaf(root_a), "trees_equal: root_a {root_a} is not a leaf");
        assert!(b.is_leaf(root_b), "trees_equal: root_b {root_b} is not a leaf");

        self.load_topology(b);
        if root_b != root_a {
            reroot(&mut self.scratch, root_b, root_a);
        }

        let mut sets_a = std::mem::take(&mut self.sets_a);
        Self::fillsets(a, &mut sets_a);
        self.sets_a = sets_a;

        let mut sets_b = std::mem::take(&mut self.sets_b);
        Self::fillsets(&self.scratch, &mut sets_b);
        self.sets_b = sets_b;

        Self::setstcmp(&self.sets_a, &self.sets_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::random_tree;
    use crate::mutate::nni;
    use crate::rng::Rng;

    #[test]
    fn identical_trees_compare_equal() {
        let mut rng = Rng::new(11);
        let a = random_tree(&mut rng, 9, 2);
        let b = a.clone();
        let mut cmp = TreeCompare::new(9);
        assert!(cmp.trees_equal(&a, a.root, &b, b.root));
    }

    #[test]
    fn equality_is_independent_of_rooting() {
        let mut rng = Rng::new(13);
        let a = random_tree(&mut rng, 9, 2);
        let mut b = a.clone();
        let old = b.root;
        reroot(&mut b, old, 5);

        let mut cmp = TreeCompare::new(9);
        assert!(cmp.trees_equal(&a, a.root, &b, b.root));
    }

    #[test]
    fn an_nni_move_usually_changes_the_topology() {
        let mut rng = Rng::new(17);
        let a = random_tree(&mut rng, 10, 2);
        let mut b = TreeArena::alloc(10, 2);
        nni(&mut rng, &mut b, &a);

        let mut cmp = TreeCompare::new(10);
        assert!(!cmp.trees_equal(&a, a.root, &b, b.root));
    }

    #[test]
    fn reroot_then_compare_round_trip() {
        let mut rng = Rng::new(19);
        let a = random_tree(&mut rng, 12, 2);
        let mut b = a.clone();
        let old = b.root;
        reroot(&mut b, old, 7);
        reroot(&mut b, 7, old);

        let mut cmp = TreeCompare::new(12);
        assert!(cmp.trees_equal(&a, a.root, &b, b.root));
    }

    #[test]
    fn comparator_is_reusable_across_many_calls_without_reallocating_rows() {
        let mut rng = Rng::new(23);
        let mut cmp = TreeCompare::new(8);
        for _ in 0..50 {
            let a = random_tree(&mut rng, 8, 2);
            let b = a.clone();
            assert!(cmp.trees_equal(&a, a.root, &b, b.root));
            assert_eq!(cmp.sets_a.len(), 5);
            assert_eq!(cmp.sets_b.len(), 5);
        }
    }

    #[test]
    fn equivalence_is_transitive_across_three_rootings() {
        let mut rng = Rng::new(29);
        let base = random_tree(&mut rng, 11, 2);
        let mut at0 = base.clone();
        let mut at1 = base.clone();
        reroot(&mut at1, at1.root, 1);
        let mut at2 = base.clone();
        reroot(&mut at2, at2.root, 2);

        let mut cmp = TreeCompare::new(11);
        assert!(cmp.trees_equal(&at0, at0.root, &at1, at1.root));
        assert!(cmp.trees_equal(&at1, at1.root, &at2, at2.root));
        assert!(cmp.trees_equal(&at0, at0.root, &at2, at2.root));
    }
}
