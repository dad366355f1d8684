//! Read model for the org chart: nested nodes with aggregate progress.

use std::collections::HashMap;

use crate::forest::EntityForest;
use crate::models::{DetailedCompany, EntityStatus};

/// One entity laid out in its tree, with children nested below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub status: EntityStatus,
    pub ownership: Option<u8>,
    /// Progress over every step of every category of this entity
    pub overall_progress: u8,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub depth: usize,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_entity(entity: &DetailedCompany, depth: usize, children: Vec<TreeNode>) -> Self {
        let (completed_steps, total_steps) = entity.step_totals();
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            status: entity.status,
            ownership: entity.ownership,
            overall_progress: entity.overall_progress(),
            completed_steps,
            total_steps,
            depth,
            children,
        }
    }

    /// Pre-order iterator over this node and all nodes below it
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn subtree_size(&self) -> usize {
        self.walk().len()
    }
}

/// Lays out every root of the forest with its children in collection order.
///
/// Entities whose parent does not exist, or that only sit on a cycle, are
/// unreachable from a root and are left out, as the org chart does. Use
/// [`crate::integrity::check_entities`] to report them.
pub fn build_forest(forest: &EntityForest) -> Vec<TreeNode> {
    let entities = forest.entities();

    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (idx, entity) in entities.iter().enumerate() {
        match entity.parent_id.as_deref() {
            Some(parent) => children.entry(parent).or_default().push(idx),
            None => roots.push(idx),
        }
    }

    // Pre-order walk with an explicit stack; visited guards against cycles
    let mut order: Vec<(usize, usize)> = Vec::new();
    let mut visited = vec![false; entities.len()];
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&idx| (idx, 0)).collect();
    while let Some((idx, depth)) = stack.pop() {
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        order.push((idx, depth));
        if let Some(kids) = children.get(entities[idx].id.as_str()) {
            stack.extend(kids.iter().rev().filter(|&&k| !visited[k]).map(|&k| (k, depth + 1)));
        }
    }

    // Descendants come after their ancestor in pre-order, so build bottom-up
    let mut built: HashMap<usize, TreeNode> = HashMap::new();
    for &(idx, depth) in order.iter().rev() {
        let entity = &entities[idx];
        let kids = children
            .get(entity.id.as_str())
            .map(|kids| kids.iter().filter_map(|k| built.remove(k)).collect())
            .unwrap_or_default();
        built.insert(idx, TreeNode::from_entity(entity, depth, kids));
    }

    roots.iter().filter_map(|idx| built.remove(idx)).collect()
}
