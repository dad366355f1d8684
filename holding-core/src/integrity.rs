//! Referential-integrity checks for a forest of entities.
//!
//! The stores never create dangling parents or cycles on their own; these
//! checks exist for data arriving from a backup file.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::DetailedCompany;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Two entities share an id
    DuplicateId { id: String },
    /// `parent_id` does not name an entity of the same collection
    DanglingParent { id: String, parent_id: String },
    /// A parent chain loops back on itself; ids listed in chain order
    Cycle { ids: Vec<String> },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateId { id } => write!(f, "duplicate entity id '{}'", id),
            IntegrityIssue::DanglingParent { id, parent_id } => {
                write!(f, "entity '{}' references missing parent '{}'", id, parent_id)
            }
            IntegrityIssue::Cycle { ids } => write!(f, "parent cycle {}", ids.join(" -> ")),
        }
    }
}

/// Runs every check over one collection
pub fn check_entities(entities: &[DetailedCompany]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for entity in entities {
        if !seen.insert(entity.id.as_str()) && reported.insert(entity.id.as_str()) {
            issues.push(IntegrityIssue::DuplicateId {
                id: entity.id.clone(),
            });
        }
    }

    for entity in entities {
        if let Some(parent) = entity.parent_id.as_deref() {
            if !seen.contains(parent) {
                issues.push(IntegrityIssue::DanglingParent {
                    id: entity.id.clone(),
                    parent_id: parent.to_string(),
                });
            }
        }
    }

    issues.extend(find_cycles(entities).into_iter().map(|ids| IntegrityIssue::Cycle { ids }));
    issues
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Finds every parent cycle, each reported once.
///
/// Follows each parent chain iteratively; a chain that reaches a node still
/// being visited closes a cycle.
pub fn find_cycles(entities: &[DetailedCompany]) -> Vec<Vec<String>> {
    let mut parent_of: HashMap<&str, Option<&str>> = HashMap::new();
    for entity in entities {
        parent_of
            .entry(entity.id.as_str())
            .or_insert(entity.parent_id.as_deref());
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut cycles = Vec::new();

    for entity in entities {
        let mut path: Vec<&str> = Vec::new();
        let mut current = entity.id.as_str();
        loop {
            match marks.get(current) {
                Some(Mark::Done) => break,
                Some(Mark::Visiting) => {
                    if let Some(start) = path.iter().position(|id| *id == current) {
                        cycles.push(path[start..].iter().map(|id| id.to_string()).collect());
                    }
                    break;
                }
                None => {
                    marks.insert(current, Mark::Visiting);
                    path.push(current);
                    match parent_of.get(current).copied().flatten() {
                        Some(parent) if parent_of.contains_key(parent) => current = parent,
                        _ => break,
                    }
                }
            }
        }
        for id in path {
            marks.insert(id, Mark::Done);
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;

    #[test]
    fn test_demo_data_is_clean() {
        assert!(check_entities(&defaults::demo_companies()).is_empty());
        assert!(check_entities(&defaults::demo_erp_systems()).is_empty());
    }

    #[test]
    fn test_dangling_parent_detected() {
        let mut entities = defaults::demo_companies();
        entities[2].parent_id = Some("erp_core".into());
        let issues = check_entities(&entities);
        assert_eq!(
            issues,
            vec![IntegrityIssue::DanglingParent {
                id: "c3".into(),
                parent_id: "erp_core".into()
            }]
        );
    }

    #[test]
    fn test_cycle_detected_once() {
        let mut entities = defaults::demo_companies();
        entities[0].parent_id = Some("c3".into());
        let cycles = find_cycles(&entities);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["c1".to_string(), "c3".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let mut entities = defaults::demo_companies();
        entities[4].parent_id = Some("c5".into());
        let issues = check_entities(&entities);
        assert_eq!(issues, vec![IntegrityIssue::Cycle { ids: vec!["c5".into()] }]);
        assert_eq!(issues[0].to_string(), "parent cycle c5");
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let mut entities = defaults::demo_companies();
        let mut copy = entities[4].clone();
        copy.name = "Copy".into();
        entities.push(copy.clone());
        entities.push(copy);
        let issues = check_entities(&entities);
        assert_eq!(issues, vec![IntegrityIssue::DuplicateId { id: "c5".into() }]);
    }
}
