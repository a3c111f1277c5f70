//! Tree snapshots for offline visualization.
//!
//! On a decimated schedule the planner dumps the current motion tree to a
//! `debug_rrtstar_{iter:05}.3Dscene` file: a version byte followed by a
//! bincode-encoded [`SceneSnapshot`]. Snapshots are self-contained (world
//! poses, per-edge polylines, highlighted newest node) so a viewer needs no
//! access to the planner state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Pose2D;
use crate::error::{PlanError, Result};
use crate::tree::{MotionTree, NodeId};

const SCENE_VERSION: u8 = 1;

/// One node of a rendered tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneNode {
    /// World pose.
    pub pose: Pose2D,
    /// Accumulated cost from the root.
    pub cost: f64,
}

/// One rendered edge, with its polyline in world coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneEdge {
    /// Parent node index.
    pub parent: u32,
    /// Child node index.
    pub child: u32,
    /// Polyline from parent to child (at least the two endpoints).
    pub polyline: Vec<Pose2D>,
}

/// A self-contained render of a motion tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// All nodes, indexed by dense node ID.
    pub nodes: Vec<SceneNode>,
    /// All edges.
    pub edges: Vec<SceneEdge>,
    /// Index of the node to highlight (the newest insertion).
    pub highlight: u32,
}

impl SceneSnapshot {
    /// Render a tree with one highlighted node.
    pub fn from_tree(tree: &MotionTree, highlight: NodeId) -> Self {
        let nodes = tree
            .nodes()
            .map(|(_, n)| SceneNode {
                pose: n.state.pose,
                cost: n.cost,
            })
            .collect();

        let mut edges = Vec::new();
        for (id, _) in tree.nodes() {
            for edge in tree.edges_from(id) {
                let parent_pose = tree.node(edge.parent).state.pose;
                let polyline = match &edge.interpolated_path {
                    Some(rel_poses) => rel_poses
                        .iter()
                        .map(|rel| parent_pose.compose(rel))
                        .collect(),
                    None => vec![parent_pose, tree.node(edge.child).state.pose],
                };
                edges.push(SceneEdge {
                    parent: edge.parent.index() as u32,
                    child: edge.child.index() as u32,
                    polyline,
                });
            }
        }

        Self {
            nodes,
            edges,
            highlight: highlight.index() as u32,
        }
    }
}

/// Write a snapshot of the tree to a scene file.
pub fn save_scene_file(path: &Path, tree: &MotionTree, highlight: NodeId) -> Result<()> {
    let snapshot = SceneSnapshot::from_tree(tree, highlight);
    let mut bytes = vec![SCENE_VERSION];
    bytes.extend_from_slice(&bincode::serialize(&snapshot)?);
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a scene file back. Fails on an unknown version byte.
pub fn load_scene_file(path: &Path) -> Result<SceneSnapshot> {
    let bytes = fs::read(path)?;
    let (version, payload) = bytes
        .split_first()
        .ok_or_else(|| PlanError::Serialization("empty scene file".into()))?;
    if *version != SCENE_VERSION {
        return Err(PlanError::SerializationVersion {
            found: *version,
            expected: SCENE_VERSION,
        });
    }
    Ok(bincode::deserialize(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KinState;
    use crate::tree::MoveEdge;

    fn small_tree() -> MotionTree {
        let mut tree = MotionTree::new();
        let root = tree.next_free_node_id();
        tree.insert_root(root, KinState::at_pose(Pose2D::identity()));
        let child = tree.next_free_node_id();
        tree.insert_node_and_edge(
            root,
            child,
            KinState::at_pose(Pose2D::new(1.0, 0.0, 0.0)),
            MoveEdge {
                parent: root,
                child,
                ptg_index: 0,
                trajectory_index: 15,
                ptg_dist: 1.0,
                ptg_step: 100,
                speed_scale: 1.0,
                cost: 1.0,
                interpolated_path: Some(vec![
                    Pose2D::identity(),
                    Pose2D::new(0.5, 0.0, 0.0),
                    Pose2D::new(1.0, 0.0, 0.0),
                ]),
            },
        );
        tree
    }

    #[test]
    fn test_snapshot_shape() {
        let tree = small_tree();
        let snap = SceneSnapshot::from_tree(&tree, NodeId::ROOT);
        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.edges.len(), 1);
        assert_eq!(snap.edges[0].polyline.len(), 3);
        assert_eq!(snap.highlight, 0);
    }

    #[test]
    fn test_save_load_round_trip() {
        let tree = small_tree();
        let dir = std::env::temp_dir();
        let path = dir.join("marga_plan_scene_test.3Dscene");
        save_scene_file(&path, &tree, NodeId::ROOT).unwrap();

        let snap = load_scene_file(&path).unwrap();
        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.edges[0].child, 1);

        // Corrupt the version byte.
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] = 9;
        fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            load_scene_file(&path),
            Err(PlanError::SerializationVersion { found: 9, .. })
        ));

        let _ = fs::remove_file(&path);
    }
}
