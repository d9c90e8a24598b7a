use indexmap::IndexSet;

use crate::node::Node;

/// Names of all symbols referenced below `node`, unique and in order of
/// first appearance (depth-first, left to right). Call operators are not
/// variables and are never included.
pub fn free_variables(node: &Node) -> IndexSet<String> {
    let mut vars = IndexSet::new();
    node.walk(&mut |n| {
        if let Node::Symbol { name } = n {
            if !vars.contains(name) {
                vars.insert(name.clone());
            }
        }
    });
    vars
}
