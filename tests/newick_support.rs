//! A small bundled Newick parser, used only by the printer round-trip test
//! (§8 property 11). Understands exactly the shape [`lvb_tree::print::Printer`]
//! emits: `(root_leaf,left_subtree,right_subtree);` with leaves as bare,
//! comma/paren-free tokens. Not a general-purpose Newick reader - real
//! parsing is an external concern per spec.md §1.

use std::collections::HashSet;

#[derive(Debug, Clone)]
pub enum Node {
    Leaf(String),
    Internal(Box<Node>, Box<Node>),
}

/// Parse a full statement of the form `(root,left,right);` into the root
/// leaf's name and its two subtrees.
pub fn parse_statement(text: &str) -> (String, Node, Node) {
    let trimmed = text.trim().trim_end_matches(['\n', '\r']);
    let trimmed = trimmed.strip_suffix(';').expect("newick statement must end with ';'");
    assert!(trimmed.starts_with('(') && trimmed.ends_with(')'), "malformed top-level parens: {trimmed:?}");
    let inner = &trimmed[1..trimmed.len() - 1];
    let parts = split_top_level(inner);
    assert_eq!(parts.len(), 3, "expected exactly 3 top-level fields (root,left,right), got {parts:?}");
    let root_name = parts[0].to_string();
    (root_name, parse_node(parts[1]), parse_node(parts[2]))
}

fn parse_node(s: &str) -> Node {
    let s = s.trim();
    if s.starts_with('(') {
        assert!(s.ends_with(')'), "unbalanced parens in {s:?}");
        let inner = &s[1..s.len() - 1];
        let parts = split_top_level(inner);
        assert_eq!(parts.len(), 2, "internal node must have exactly 2 children, got {parts:?}");
        Node::Internal(Box::new(parse_node(parts[0])), Box::new(parse_node(parts[1])))
    } else {
        Node::Leaf(s.to_string())
    }
}

/// Split `s` on top-level commas, treating nested `(...)` as opaque.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn collect_leaves(node: &Node, out: &mut Vec<String>) {
    match node {
        Node::Leaf(name) => out.push(name.clone()),
        Node::Internal(l, r) => {
            collect_leaves(l, out);
            collect_leaves(r, out);
        }
    }
}

fn collect_bipartitions(node: &Node, name_to_id: &std::collections::HashMap<&str, i64>, out: &mut HashSet<Vec<i64>>) {
    if let Node::Internal(l, r) = node {
        let mut names = Vec::new();
        collect_leaves(node, &mut names);
        let mut ids: Vec<i64> = names.iter().map(|n| name_to_id[n.as_str()]).collect();
        ids.sort_unstable();
        out.insert(ids);
        collect_bipartitions(l, name_to_id, out);
        collect_bipartitions(r, name_to_id, out);
    }
}

/// The set of bipartitions implied by a parsed statement, keyed by object
/// id via `names` (the same label list the printer was given).
pub fn bipartitions(root_name: &str, left: &Node, right: &Node, names: &[String]) -> HashSet<Vec<i64>> {
    let name_to_id: std::collections::HashMap<&str, i64> =
        names.iter().enumerate().map(|(i, n)| (n.as_str(), i as i64)).collect();
    assert!(name_to_id.contains_key(root_name), "root leaf {root_name:?} not found among object names");

    let mut out = HashSet::new();
    collect_bipartitions(left, &name_to_id, &mut out);
    collect_bipartitions(right, &name_to_id, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_leaf_trifurcation() {
        let (root, left, right) = parse_statement("(object0,object1,(object2,object3));\n");
        assert_eq!(root, "object0");
        assert!(matches!(left, Node::Leaf(ref n) if n == "object1"));
        assert!(matches!(right, Node::Internal(..)));
    }

    #[test]
    fn bipartitions_exclude_leaves_and_pick_up_the_inner_split() {
        let (root, left, right) = parse_statement("(object0,object1,(object2,object3));\n");
        let names = vec!["object0".into(), "object1".into(), "object2".into(), "object3".into()];
        let sets = bipartitions(&root, &left, &right, &names);
        assert_eq!(sets.len(), 1);
        assert!(sets.contains(&vec![2, 3]));
    }
}
