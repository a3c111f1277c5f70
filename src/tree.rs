//! Motion tree: kinematic states linked by trajectory-generator edges.
//!
//! Nodes and edges live in flat vectors indexed by dense integer IDs, so the
//! tree is trivially cloneable and serializable and parent/child relations
//! are plain indices. The root always has ID 0; every other node has exactly
//! one incoming edge, stored in its parent's outgoing list.

use serde::{Deserialize, Serialize};

use crate::core::{KinState, Pose2D};

/// Dense node identifier; IDs are issued in strictly increasing order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node ID.
    pub const ROOT: NodeId = NodeId(0);

    /// Index into dense node storage.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// ID for a dense storage index.
    #[inline]
    pub(crate) fn from_index(index: usize) -> NodeId {
        NodeId(index as u32)
    }
}

/// A tree node: kinematic state plus accumulated cost from the root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeNode {
    /// State reached at this node.
    pub state: KinState,
    /// Accumulated cost from the root (0 at the root).
    pub cost: f64,
    /// Parent node; `None` only at the root.
    pub parent: Option<NodeId>,
}

/// An edge: one trajectory-generator primitive connecting parent to child.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveEdge {
    /// Source node.
    pub parent: NodeId,
    /// Destination node.
    pub child: NodeId,
    /// Index of the generator in the planner's PTG set.
    pub ptg_index: usize,
    /// Trajectory (alpha bin) index within the generator.
    pub trajectory_index: usize,
    /// Un-normalized distance traveled along the trajectory.
    pub ptg_dist: f64,
    /// Path step corresponding to `ptg_dist`.
    pub ptg_step: u32,
    /// Speed scale the edge was planned at.
    pub speed_scale: f64,
    /// Edge cost (the trajectory distance).
    pub cost: f64,
    /// Optional interpolated poses along the edge, for visualization.
    pub interpolated_path: Option<Vec<Pose2D>>,
}

/// Search tree of kinematic states connected by motion primitives.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MotionTree {
    nodes: Vec<TreeNode>,
    /// Outgoing edges per node, in insertion order.
    children: Vec<Vec<MoveEdge>>,
}

impl MotionTree {
    /// Empty tree; insert the root before anything else.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next ID that will be issued.
    #[inline]
    pub fn next_free_node_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    /// The root ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True before the root is inserted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert the root node with cost zero.
    pub fn insert_root(&mut self, id: NodeId, state: KinState) {
        debug_assert!(self.nodes.is_empty());
        debug_assert_eq!(id, NodeId::ROOT);
        self.nodes.push(TreeNode {
            state,
            cost: 0.0,
            parent: None,
        });
        self.children.push(Vec::new());
    }

    /// Insert a new node and the edge reaching it.
    ///
    /// The child ID must be the next free ID; the child cost is derived from
    /// the parent cost plus the edge cost.
    pub fn insert_node_and_edge(
        &mut self,
        parent: NodeId,
        child_id: NodeId,
        child_state: KinState,
        edge: MoveEdge,
    ) {
        debug_assert_eq!(child_id, self.next_free_node_id());
        debug_assert_eq!(edge.parent, parent);
        debug_assert_eq!(edge.child, child_id);
        debug_assert!(parent.index() < self.nodes.len());

        let cost = self.nodes[parent.index()].cost + edge.cost;
        self.nodes.push(TreeNode {
            state: child_state,
            cost,
            parent: Some(parent),
        });
        self.children.push(Vec::new());
        self.children[parent.index()].push(edge);
    }

    /// Node by ID.
    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    /// All nodes with their IDs, in ID order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Outgoing edges of a node, in insertion order.
    #[inline]
    pub fn edges_from(&self, id: NodeId) -> &[MoveEdge] {
        &self.children[id.index()]
    }

    /// Parent of a node; `None` at the root.
    #[inline]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// The edge reaching a node from its parent; `None` at the root.
    pub fn incoming_edge(&self, id: NodeId) -> Option<&MoveEdge> {
        let parent = self.nodes[id.index()].parent?;
        self.children[parent.index()]
            .iter()
            .find(|e| e.child == id)
    }

    /// Mutable access to the edge reaching a node.
    pub(crate) fn incoming_edge_mut(&mut self, id: NodeId) -> Option<&mut MoveEdge> {
        let parent = self.nodes[id.index()].parent?;
        self.children[parent.index()]
            .iter_mut()
            .find(|e| e.child == id)
    }

    /// Replace a node's incoming edge with one from a different parent,
    /// updating state, parent link, and cost. Descendant costs are refreshed
    /// by the caller.
    pub fn reparent(&mut self, child: NodeId, new_state: KinState, new_edge: MoveEdge) {
        debug_assert_eq!(new_edge.child, child);
        debug_assert_ne!(child, NodeId::ROOT);

        if let Some(old_parent) = self.nodes[child.index()].parent {
            self.children[old_parent.index()].retain(|e| e.child != child);
        }
        let new_parent = new_edge.parent;
        let cost = self.nodes[new_parent.index()].cost + new_edge.cost;
        self.children[new_parent.index()].push(new_edge);

        let node = &mut self.nodes[child.index()];
        node.parent = Some(new_parent);
        node.state = new_state;
        node.cost = cost;
    }

    /// Overwrite a node's state and cost (used when an ancestor is rewired).
    pub(crate) fn update_node(&mut self, id: NodeId, state: KinState, cost: f64) {
        let node = &mut self.nodes[id.index()];
        node.state = state;
        node.cost = cost;
    }

    /// IDs of the direct children of a node.
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children[id.index()].iter().map(|e| e.child).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Pose2D, Twist2D};

    fn state_at(x: f64, y: f64) -> KinState {
        KinState::at_pose(Pose2D::new(x, y, 0.0))
    }

    fn edge(parent: NodeId, child: NodeId, cost: f64) -> MoveEdge {
        MoveEdge {
            parent,
            child,
            ptg_index: 0,
            trajectory_index: 0,
            ptg_dist: cost,
            ptg_step: 0,
            speed_scale: 1.0,
            cost,
            interpolated_path: None,
        }
    }

    fn three_node_tree() -> MotionTree {
        let mut tree = MotionTree::new();
        let root = tree.next_free_node_id();
        tree.insert_root(root, state_at(0.0, 0.0));

        let a = tree.next_free_node_id();
        tree.insert_node_and_edge(root, a, state_at(1.0, 0.0), edge(root, a, 1.0));

        let b = tree.next_free_node_id();
        tree.insert_node_and_edge(a, b, state_at(2.0, 0.0), edge(a, b, 1.0));
        tree
    }

    #[test]
    fn test_dense_ids_and_costs() {
        let tree = three_node_tree();
        assert_eq!(tree.len(), 3);
        for (i, (id, _)) in tree.nodes().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(tree.node(NodeId(2)).cost, 2.0);
        assert_eq!(tree.node(NodeId::ROOT).cost, 0.0);
    }

    #[test]
    fn test_single_incoming_edge() {
        let tree = three_node_tree();
        assert!(tree.incoming_edge(NodeId::ROOT).is_none());
        for (id, node) in tree.nodes() {
            if id != NodeId::ROOT {
                let e = tree.incoming_edge(id).unwrap();
                assert_eq!(e.child, id);
                assert_eq!(Some(e.parent), node.parent);
            }
        }
    }

    #[test]
    fn test_edges_in_insertion_order() {
        let mut tree = MotionTree::new();
        let root = tree.next_free_node_id();
        tree.insert_root(root, state_at(0.0, 0.0));
        for i in 1..4 {
            let id = tree.next_free_node_id();
            tree.insert_node_and_edge(root, id, state_at(i as f64, 0.0), edge(root, id, 1.0));
        }
        let children: Vec<_> = tree.edges_from(root).iter().map(|e| e.child.index()).collect();
        assert_eq!(children, vec![1, 2, 3]);
    }

    #[test]
    fn test_reparent() {
        let mut tree = three_node_tree();
        // Add a cheaper sibling of `a`, then hang `b` off it.
        let c = tree.next_free_node_id();
        tree.insert_node_and_edge(
            NodeId::ROOT,
            c,
            state_at(0.5, 0.5),
            edge(NodeId::ROOT, c, 0.5),
        );

        let b = NodeId(2);
        let new_state = KinState::new(Pose2D::new(2.0, 0.0, 0.0), Twist2D::zero());
        tree.reparent(b, new_state, edge(c, b, 0.6));

        assert_eq!(tree.parent_of(b), Some(c));
        assert!((tree.node(b).cost - 1.1).abs() < 1e-12);
        // The old parent no longer lists b.
        assert!(tree.edges_from(NodeId(1)).iter().all(|e| e.child != b));
        assert_eq!(tree.incoming_edge(b).unwrap().parent, c);
    }
}
