//! In-memory model for sampled phylogenetic trees.
//!
//! # Overview
//! A [`Node`] is one vertex of a strictly binary tree: either a leaf
//! (no children) or an internal node (exactly two children). Every node
//! carries a branch length, an opaque metadata string (`theta=<value>`
//! on sampled trees, `mTheta=<mean>` on consensus trees) and a stable
//! `index`.
//!
//! # Node indices
//! Indices are assigned at parse time so that structurally corresponding
//! nodes of two trees with the *same topology* share the same index:
//! leaves take their position in the shared label list, internal nodes
//! take `num_leaves + postorder counter`. The consensus and statistics
//! code relies on this correspondence and never re-validates it.

/// A single vertex of a binary tree, owning its subtree.
///
/// `children` is `Some` for internal nodes and `None` for leaves; a node
/// never has exactly one child. `Clone` is a deep copy: the clone shares
/// no mutable state with the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identity of this tree position (see module docs).
    pub index: usize,
    /// Length of the branch leading into this node, non-negative.
    pub length: f64,
    /// Opaque per-node annotation, `key=value` shaped.
    pub metadata: String,
    /// Left and right subtrees, present together or not at all.
    pub children: Option<Box<(Node, Node)>>,
}

impl Node {
    /// Creates a leaf with the given index, branch length and metadata.
    pub fn leaf(index: usize, length: f64, metadata: impl Into<String>) -> Self {
        Node {
            index,
            length,
            metadata: metadata.into(),
            children: None,
        }
    }

    /// Creates an internal node over two subtrees.
    pub fn internal(
        index: usize,
        length: f64,
        metadata: impl Into<String>,
        left: Node,
        right: Node,
    ) -> Self {
        Node {
            index,
            length,
            metadata: metadata.into(),
            children: Some(Box::new((left, right))),
        }
    }

    /// True iff this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Borrows both children of an internal node.
    pub fn children(&self) -> Option<(&Node, &Node)> {
        self.children.as_deref().map(|c| (&c.0, &c.1))
    }

    /// Mutably borrows both children of an internal node.
    pub fn children_mut(&mut self) -> Option<(&mut Node, &mut Node)> {
        self.children.as_deref_mut().map(|c| (&mut c.0, &mut c.1))
    }

    /// Height of this node: its own branch length plus, for internal
    /// nodes, the height of the left child.
    ///
    /// Precondition: the tree is ultrametric (both children reach the
    /// same height), so following one child is sufficient. Nothing here
    /// checks that; non-ultrametric input silently reports the
    /// left-path height.
    pub fn height(&self) -> f64 {
        match self.children() {
            None => self.length,
            Some((left, _)) => self.length + left.height(),
        }
    }

    /// Canonical topology string: leaf indices plus parenthesis nesting,
    /// ignoring branch lengths and metadata.
    ///
    /// Two trees get the same key iff they have the same shape with the
    /// same leaves in the same left/right order. Children are ordered:
    /// a tree and its mirror image yield different keys on purpose.
    pub fn topology_key(&self) -> String {
        let mut key = String::new();
        self.write_topology_key(&mut key);
        key
    }

    fn write_topology_key(&self, out: &mut String) {
        match self.children() {
            None => {
                out.push_str(&self.index.to_string());
            }
            Some((left, right)) => {
                out.push('(');
                left.write_topology_key(out);
                out.push(',');
                right.write_topology_key(out);
                out.push(')');
            }
        }
    }

    /// Visits every node in postorder (children before parent), the
    /// traversal order shared by the report header and table rows.
    pub fn postorder(&self, visit: &mut impl FnMut(&Node)) {
        if let Some((left, right)) = self.children() {
            left.postorder(visit);
            right.postorder(visit);
        }
        visit(self);
    }
}

/// An ordered forest of sampled trees over a shared leaf-label list.
///
/// Built in full by the reader before analysis starts. `labels[i]` is
/// the label of the leaf with node index `i`.
#[derive(Debug, Clone)]
pub struct TreeSet {
    pub trees: Vec<Node>,
    pub labels: Vec<String>,
}

impl TreeSet {
    /// Node count of every tree in the set (binary: `2 * leaves - 1`).
    pub fn num_nodes(&self) -> usize {
        2 * self.labels.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((0,1),2) with unit branch lengths below the root.
    fn cherry_tree() -> Node {
        let a = Node::leaf(0, 1.0, "theta=0.1");
        let b = Node::leaf(1, 1.0, "theta=0.2");
        let c = Node::leaf(2, 1.5, "theta=0.3");
        let ab = Node::internal(3, 0.5, "theta=0.4", a, b);
        Node::internal(4, 0.0, "theta=0.5", ab, c)
    }

    #[test]
    fn leaf_detection() {
        let tree = cherry_tree();
        assert!(!tree.is_leaf());
        let (left, right) = tree.children().unwrap();
        assert!(!left.is_leaf());
        assert!(right.is_leaf());
    }

    #[test]
    fn height_follows_left_path() {
        let tree = cherry_tree();
        // root 0.0 + internal 0.5 + leaf 1.0
        assert!((tree.height() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn topology_key_ignores_lengths_and_metadata() {
        let mut other = cherry_tree();
        other.length = 9.0;
        other.metadata = "theta=0.99".to_string();
        assert_eq!(cherry_tree().topology_key(), other.topology_key());
        assert_eq!(cherry_tree().topology_key(), "((0,1),2)");
    }

    #[test]
    fn mirror_image_is_a_different_topology() {
        let a = Node::leaf(0, 1.0, "theta=0.1");
        let b = Node::leaf(1, 1.0, "theta=0.2");
        let c = Node::leaf(2, 1.5, "theta=0.3");
        let ab = Node::internal(3, 0.5, "theta=0.4", a, b);
        let mirrored = Node::internal(4, 0.0, "theta=0.5", c, ab);
        assert_ne!(cherry_tree().topology_key(), mirrored.topology_key());
    }

    #[test]
    fn clone_is_deep() {
        let tree = cherry_tree();
        let mut copy = tree.clone();
        copy.children_mut().unwrap().0.length = 42.0;
        assert!((tree.children().unwrap().0.length - 0.5).abs() < 1e-12);
    }

    #[test]
    fn postorder_visits_children_before_parent() {
        let tree = cherry_tree();
        let mut order = Vec::new();
        tree.postorder(&mut |n| order.push(n.index));
        assert_eq!(order, vec![0, 1, 3, 2, 4]);
    }
}
