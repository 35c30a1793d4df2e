//! Canonical Newick printer.
//!
//! Grounded in the original engine's `ur_print`/`lvb_treeprint`, but threaded
//! through an explicit [`Printer`] context instead of module-level static
//! flags, so printing is re-entrant and safe to call concurrently from
//! independent trees.
//!
//! The bookkeeping root is itself an ordinary leaf (§3), so printing it as
//! an ordinary ancestor would misrepresent the tree as rooted. Instead the
//! root leaf is listed alongside its own two subtrees at the outermost
//! level, producing the standard unrooted trifurcation:
//! `(root_name,left_subtree,right_subtree);`.

use std::io::{self, Write};

use crate::arena::TreeArena;

/// Prints trees using object names supplied at construction time, indexed
/// by object id (`names[i]` is the label for leaf `i`).
pub struct Printer<'a> {
    names: &'a [String],
}

impl<'a> Printer<'a> {
    /// Build a printer over `names`, one label per object, in object-id order.
    pub fn new(names: &'a [String]) -> Self {
        Printer { names }
    }

    /// Write `tree` as a single unrooted Newick statement, terminated by `;`
    /// and a trailing newline.
    pub fn print_tree(&self, tree: &TreeArena, w: &mut impl Write) -> io::Result<()> {
        assert_eq!(self.names.len() as i64, tree.n(), "Printer: name count does not match tree size");
        let root = tree.root;
        write!(w, "(")?;
        self.write_leaf(root, w)?;
        write!(w, ",")?;
        self.print_subtree(tree, tree.left(root), w)?;
        write!(w, ",")?;
        self.print_subtree(tree, tree.right(root), w)?;
        writeln!(w, ");")
    }

    /// Render `tree` to an owned `String` rather than an arbitrary writer.
    pub fn tree_to_string(&self, tree: &TreeArena) -> String {
        let mut buf = Vec::new();
        self.print_tree(tree, &mut buf).expect("writing to an in-memory buffer cannot fail");
        String::from_utf8(buf).expect("object names must be valid UTF-8")
    }

    fn write_leaf(&self, leaf: i64, w: &mut impl Write) -> io::Result<()> {
        write!(w, "{}", self.names[leaf as usize])
    }

    fn print_subtree(&self, tree: &TreeArena, branch: i64, w: &mut impl Write) -> io::Result<()> {
        if tree.is_leaf(branch) {
            return self.write_leaf(branch, w);
        }
        write!(w, "(")?;
        self.print_subtree(tree, tree.left(branch), w)?;
        write!(w, ",")?;
        self.print_subtree(tree, tree.right(branch), w)?;
        write!(w, ")")
    }
}

/// Default `object0`, `object1`, ... names for callers with no real labels.
pub fn default_names(n: i64) -> Vec<String> {
    (0..n).map(|i| format!("object{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::random_tree;
    use crate::rng::Rng;

    #[test]
    fn prints_balanced_parens_terminated_by_semicolon() {
        let mut rng = Rng::new(41);
        let tree = random_tree(&mut rng, 9, 2);
        let names = default_names(9);
        let printer = Printer::new(&names);
        let s = printer.tree_to_string(&tree);

        assert!(s.trim_end().ends_with(");"));
        let opens = s.matches('(').count();
        let closes = s.matches(')').count();
        assert_eq!(opens, closes);
        for i in 0..9 {
            assert!(s.contains(&format!("object{i}")), "missing object{i} in {s}");
        }
    }

    #[test]
    fn four_leaf_tree_prints_as_trifurcation() {
        let mut arena = TreeArena::alloc(4, 1);
        // root=0, children 1 and 4 (internal), 4's children are 2 and 3.
        arena.root = 0;
        arena.set_left(0, 1);
        arena.set_right(0, 4);
        arena.set_parent(1, 0);
        arena.set_parent(4, 0);
        arena.set_left(4, 2);
        arena.set_right(4, 3);
        arena.set_parent(2, 4);
        arena.set_parent(3, 4);

        let names = default_names(4);
        let printer = Printer::new(&names);
        assert_eq!(printer.tree_to_string(&arena), "(object0,object1,(object2,object3));\n");
    }
}
