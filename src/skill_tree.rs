//! Skill tree module.
//!
//! Provides the `SkillTree` type, which represents skill prerequisites as a
//! directed acyclic graph (DAG). If skill B requires skill A, there is an
//! edge `A -> B`. The skill buff source uses it to ignore skills whose
//! prerequisites are not all unlocked.

use crate::error::{EngineError, Result};
use crate::ids::SkillId;
use crate::snapshot::SkillDefinition;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Prerequisite graph over skill ids.
///
/// # Examples
///
/// ```rust
/// use titanstat::skill_tree::SkillTree;
/// use titanstat::SkillId;
///
/// let mut tree = SkillTree::new();
/// let squat = SkillId::new("squat");
/// let front_squat = SkillId::new("front-squat");
///
/// // front-squat requires squat
/// tree.add_prerequisite(front_squat.clone(), squat.clone());
///
/// let order = tree.unlock_order().unwrap();
/// let a = order.iter().position(|s| s == &squat).unwrap();
/// let b = order.iter().position(|s| s == &front_squat).unwrap();
/// assert!(a < b);
/// ```
#[derive(Debug, Clone)]
pub struct SkillTree {
    graph: DiGraph<SkillId, ()>,
    node_map: HashMap<SkillId, NodeIndex>,
}

impl SkillTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build a tree from skill definitions and reject cycles.
    pub fn from_definitions(definitions: &[SkillDefinition]) -> Result<Self> {
        let mut tree = Self::new();
        for def in definitions {
            tree.add_skill(def.id.clone());
            for prereq in &def.prerequisites {
                tree.add_prerequisite(def.id.clone(), prereq.clone());
            }
        }
        tree.detect_cycles()?;
        Ok(tree)
    }

    /// Add a node if it doesn't exist and return its index.
    pub fn add_skill(&mut self, skill: SkillId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&skill) {
            idx
        } else {
            let idx = self.graph.add_node(skill.clone());
            self.node_map.insert(skill, idx);
            idx
        }
    }

    /// `skill` requires `prerequisite`.
    pub fn add_prerequisite(&mut self, skill: SkillId, prerequisite: SkillId) {
        let skill_idx = self.add_skill(skill);
        let prereq_idx = self.add_skill(prerequisite);
        self.graph.add_edge(prereq_idx, skill_idx, ());
    }

    /// Whether the tree knows this skill.
    pub fn contains(&self, skill: &SkillId) -> bool {
        self.node_map.contains_key(skill)
    }

    /// Detect prerequisite cycles.
    ///
    /// Returns `InvalidSkillTree` with the cycle path, closed by repeating
    /// its first skill.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if !visited.contains(&node) {
                if let Some(cycle) = self.dfs_cycle(node, &mut visited, &mut on_stack, &mut path) {
                    return Err(EngineError::InvalidSkillTree { path: cycle });
                }
            }
        }
        Ok(())
    }

    fn dfs_cycle(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<SkillId>,
    ) -> Option<Vec<SkillId>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(self.graph[node].clone());

        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&next) {
                if let Some(cycle) = self.dfs_cycle(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(&next) {
                let start = &self.graph[next];
                let pos = path.iter().position(|s| s == start).unwrap_or(0);
                let mut cycle = path[pos..].to_vec();
                cycle.push(start.clone());
                return Some(cycle);
            }
        }

        on_stack.remove(&node);
        path.pop();
        None
    }

    /// Skills in an order where prerequisites always come first.
    pub fn unlock_order(&self) -> Result<Vec<SkillId>> {
        self.detect_cycles()?;
        toposort(&self.graph, None)
            .map(|indices| indices.into_iter().map(|i| self.graph[i].clone()).collect())
            .map_err(|cycle| EngineError::InvalidSkillTree {
                path: vec![self.graph[cycle.node_id()].clone()],
            })
    }

    /// Every direct and transitive prerequisite of `skill`.
    pub fn ancestors(&self, skill: &SkillId) -> Vec<SkillId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.node_map.get(skill).copied().into_iter().collect();

        while let Some(idx) = stack.pop() {
            for prereq in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if seen.insert(prereq) {
                    out.push(self.graph[prereq].clone());
                    stack.push(prereq);
                }
            }
        }
        out.sort();
        out
    }

    /// Whether every prerequisite of `skill` is in `unlocked`.
    pub fn prerequisites_met(&self, skill: &SkillId, unlocked: &HashSet<&SkillId>) -> bool {
        self.ancestors(skill).iter().all(|s| unlocked.contains(s))
    }
}

impl Default for SkillTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, prereqs: &[&str]) -> SkillDefinition {
        SkillDefinition {
            id: SkillId::new(id),
            name: id.to_string(),
            effects: Vec::new(),
            prerequisites: prereqs.iter().map(|p| SkillId::new(p)).collect(),
        }
    }

    #[test]
    fn test_tree_from_definitions() {
        let tree = SkillTree::from_definitions(&[
            def("squat", &[]),
            def("front-squat", &["squat"]),
            def("pistol-squat", &["front-squat"]),
        ])
        .unwrap();
        assert!(tree.contains(&SkillId::new("pistol-squat")));
        assert_eq!(
            tree.ancestors(&SkillId::new("pistol-squat")),
            vec![SkillId::new("front-squat"), SkillId::new("squat")]
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let err = SkillTree::from_definitions(&[
            def("a", &["c"]),
            def("b", &["a"]),
            def("c", &["b"]),
        ])
        .unwrap_err();
        match err {
            EngineError::InvalidSkillTree { path } => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("Expected InvalidSkillTree, got {other:?}"),
        }
    }

    #[test]
    fn test_prerequisites_met() {
        let tree = SkillTree::from_definitions(&[
            def("squat", &[]),
            def("front-squat", &["squat"]),
            def("pistol-squat", &["front-squat"]),
        ])
        .unwrap();
        let squat = SkillId::new("squat");
        let front = SkillId::new("front-squat");
        let pistol = SkillId::new("pistol-squat");

        let partial: HashSet<&SkillId> = [&front].into_iter().collect();
        assert!(!tree.prerequisites_met(&pistol, &partial));

        let full: HashSet<&SkillId> = [&squat, &front].into_iter().collect();
        assert!(tree.prerequisites_met(&pistol, &full));
        assert!(tree.prerequisites_met(&squat, &HashSet::new()));
    }

    #[test]
    fn test_unknown_skill_has_no_ancestors() {
        let tree = SkillTree::new();
        assert!(tree.ancestors(&SkillId::new("ghost")).is_empty());
    }
}
