//! Hierarchy collection: walks the provider's node graph from the selected root
//! into an arena-backed [`Tree`] annotated with depth.
//!
//! Traversal is depth-first pre-order with children visited in the host's declared
//! order, so depth assignment and node order are stable across runs.

use std::collections::{HashMap, HashSet};

use crate::ids::{IndexAllocator, NodeHandle, NodeIndex};
use crate::provider::TransformProvider;

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub handle: NodeHandle,
    /// Back-reference into the arena; never owning.
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// Distance from the root (root = 0).
    pub depth: u32,
}

/// Nodes reachable from one root, stored in pre-order. Index 0 is the root.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    lookup: HashMap<NodeHandle, NodeIndex>,
}

impl Tree {
    #[inline]
    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A collected tree always holds at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, idx: NodeIndex) -> &TreeNode {
        &self.nodes[idx.index()]
    }

    pub fn find(&self, handle: &str) -> Option<NodeIndex> {
        self.lookup.get(handle).copied()
    }

    /// Nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIndex(i as u32), n))
    }

    /// Indices sorted by non-decreasing depth; ties keep pre-order.
    pub fn depth_order(&self) -> Vec<NodeIndex> {
        let mut order: Vec<NodeIndex> = (0..self.nodes.len() as u32).map(NodeIndex).collect();
        order.sort_by_key(|idx| self.nodes[idx.index()].depth);
        order
    }

    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.handle.as_str())
    }
}

/// Collect the tree rooted at `root`.
///
/// Returns `None` when the root itself is not animatable. Ineligible descendants
/// are pruned together with their subtree. A node reached a second time keeps its
/// first placement.
pub fn collect_tree<P: TransformProvider + ?Sized>(provider: &P, root: &str) -> Option<Tree> {
    if !provider.is_animatable(root) {
        return None;
    }

    let mut alloc = IndexAllocator::new();
    let mut nodes: Vec<TreeNode> = Vec::new();
    let mut lookup: HashMap<NodeHandle, NodeIndex> = HashMap::new();
    let mut seen: HashSet<NodeHandle> = HashSet::new();

    // (handle, parent, depth); children are pushed reversed to pop in declared order
    let mut stack: Vec<(NodeHandle, Option<NodeIndex>, u32)> = vec![(root.to_string(), None, 0)];
    while let Some((handle, parent, depth)) = stack.pop() {
        if !seen.insert(handle.clone()) {
            log::warn!("node '{handle}' reached twice while collecting hierarchy; keeping first placement");
            continue;
        }
        if parent.is_some() && !provider.is_animatable(&handle) {
            log::debug!("skipping non-animatable node '{handle}' and its subtree");
            continue;
        }

        let idx = alloc.alloc();
        if let Some(p) = parent {
            nodes[p.index()].children.push(idx);
        }
        let children = provider.children(&handle);
        lookup.insert(handle.clone(), idx);
        nodes.push(TreeNode {
            handle,
            parent,
            children: Vec::with_capacity(children.len()),
            depth,
        });

        for child in children.into_iter().rev() {
            stack.push((child, Some(idx), depth + 1));
        }
    }

    log::debug!(
        "collected {} node(s) under '{root}' (max depth {})",
        nodes.len(),
        nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    );
    Some(Tree { nodes, lookup })
}
