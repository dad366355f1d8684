//! Entity tree store: one forest of detailed entities linked by `parent_id`.
//!
//! The forest is kept as a flat list in insertion order. Parent/child links
//! are ids, so traversals walk the list with explicit stacks instead of
//! recursion. All mutations validate first and write last: an `Err` leaves
//! the forest untouched.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::error::{require_percentage, require_text, StoreError, StoreResult};
use crate::models::{
    new_id, CompanyCategory, CompanyStep, DetailedCompany, EntityDraft, EntityPatch, EntityStatus,
    ForestKind, TemplateCategory,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityForest {
    kind: ForestKind,
    entities: Vec<DetailedCompany>,
}

impl EntityForest {
    pub fn new(kind: ForestKind) -> Self {
        Self {
            kind,
            entities: Vec::new(),
        }
    }

    pub fn with_entities(kind: ForestKind, entities: Vec<DetailedCompany>) -> Self {
        Self { kind, entities }
    }

    pub fn kind(&self) -> ForestKind {
        self.kind
    }

    pub fn entities(&self) -> &[DetailedCompany] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Replaces every entity at once (used by backup restore)
    pub fn replace_all(&mut self, entities: Vec<DetailedCompany>) {
        self.entities = entities;
    }

    pub fn get(&self, id: &str) -> Option<&DetailedCompany> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: &str) -> StoreResult<&mut DetailedCompany> {
        self.entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("Entity", id))
    }

    /// Entities without a parent, in collection order
    pub fn roots(&self) -> Vec<&DetailedCompany> {
        self.entities.iter().filter(|e| e.is_root()).collect()
    }

    /// Direct children of `id`, in collection order
    pub fn children(&self, id: &str) -> Vec<&DetailedCompany> {
        self.entities
            .iter()
            .filter(|e| e.parent_id.as_deref() == Some(id))
            .collect()
    }

    /// `id` plus every entity whose ancestor chain reaches it.
    ///
    /// Breadth-first over a parent → children index. The visited set makes
    /// the walk terminate even when an imported forest contains a cycle.
    pub fn descendant_closure(&self, id: &str) -> HashSet<String> {
        let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();
        for entity in &self.entities {
            if let Some(parent) = entity.parent_id.as_deref() {
                children_of.entry(parent).or_default().push(entity.id.as_str());
            }
        }

        let mut closure = HashSet::new();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !closure.insert(current.to_string()) {
                continue;
            }
            if let Some(kids) = children_of.get(current) {
                queue.extend(kids.iter().copied());
            }
        }
        closure
    }

    /// Builds a new entity whose checklist is cloned from `template`.
    ///
    /// `parent_id` is stored as given. Returns the new entity's id.
    pub fn create_entity(
        &mut self,
        parent_id: Option<&str>,
        draft: EntityDraft,
        template: &[TemplateCategory],
    ) -> StoreResult<String> {
        let status = draft.status.unwrap_or(EntityStatus::Idea);
        self.check_status(status)?;

        let ownership = match (parent_id, self.kind.tracks_ownership()) {
            (Some(_), true) => Some(require_percentage(draft.ownership.unwrap_or(100), "Ownership")?),
            _ => None,
        };

        let name = match draft.name.trim() {
            "" => self.kind.default_entity_name().to_string(),
            trimmed => trimmed.to_string(),
        };

        let entity = DetailedCompany {
            id: new_id(&self.kind.to_string()),
            name,
            logo: draft.logo.filter(|l| !l.trim().is_empty()),
            parent_id: parent_id.map(str::to_string),
            ownership,
            status,
            categories: template.iter().map(CompanyCategory::from_template).collect(),
        };
        let id = entity.id.clone();
        debug!(
            "Created {} {} ({}) with {} template categories",
            self.kind,
            entity.name,
            id,
            entity.categories.len()
        );
        self.entities.push(entity);
        Ok(id)
    }

    /// Shallow-merges name, logo, status and ownership; categories untouched
    pub fn update_entity(&mut self, id: &str, patch: EntityPatch) -> StoreResult<()> {
        let name = patch
            .name
            .as_deref()
            .map(|n| require_text(n, "Entity name"))
            .transpose()?;
        if let Some(status) = patch.status {
            self.check_status(status)?;
        }
        let ownership = patch
            .ownership
            .map(|o| require_percentage(o, "Ownership"))
            .transpose()?;
        if ownership.is_some() {
            let has_parent = self
                .get(id)
                .ok_or_else(|| StoreError::not_found("Entity", id))?
                .parent_id
                .is_some();
            if !self.kind.tracks_ownership() || !has_parent {
                return Err(StoreError::Validation(
                    "Ownership only applies to company entities with a parent".to_string(),
                ));
            }
        }

        let entity = self.get_mut(id)?;
        if let Some(name) = name {
            entity.name = name;
        }
        if let Some(logo) = patch.logo {
            entity.logo = if logo.trim().is_empty() { None } else { Some(logo) };
        }
        if let Some(status) = patch.status {
            entity.status = status;
        }
        if let Some(ownership) = ownership {
            entity.ownership = Some(ownership);
        }
        Ok(())
    }

    /// Removes `id` and all of its descendants in one pass.
    ///
    /// Returns the removed ids in collection order.
    pub fn delete_entity(&mut self, id: &str) -> StoreResult<Vec<String>> {
        if self.get(id).is_none() {
            return Err(StoreError::not_found("Entity", id));
        }
        let closure = self.descendant_closure(id);
        let removed: Vec<String> = self
            .entities
            .iter()
            .filter(|e| closure.contains(&e.id))
            .map(|e| e.id.clone())
            .collect();
        self.entities.retain(|e| !closure.contains(&e.id));
        debug!("Deleted {} {} and {} descendants", self.kind, id, removed.len() - 1);
        Ok(removed)
    }

    /// Re-applies a template to an existing entity: appends every template
    /// category whose name the entity does not already have.
    ///
    /// Returns the number of categories added.
    pub fn apply_template(&mut self, id: &str, template: &[TemplateCategory]) -> StoreResult<usize> {
        let entity = self.get_mut(id)?;
        let existing: HashSet<String> = entity.categories.iter().map(|c| c.name.clone()).collect();
        let missing: Vec<CompanyCategory> = template
            .iter()
            .filter(|t| !existing.contains(&t.name))
            .map(CompanyCategory::from_template)
            .collect();
        let added = missing.len();
        entity.categories.extend(missing);
        Ok(added)
    }

    // =========================================================================
    // Category operations
    // =========================================================================

    pub fn add_category(&mut self, entity_id: &str, name: &str) -> StoreResult<String> {
        let name = require_text(name, "Category name")?;
        let category = CompanyCategory::new(name);
        let id = category.id.clone();
        self.get_mut(entity_id)?.categories.push(category);
        Ok(id)
    }

    pub fn rename_category(&mut self, entity_id: &str, category_id: &str, name: &str) -> StoreResult<()> {
        let name = require_text(name, "Category name")?;
        self.category_mut(entity_id, category_id)?.name = name;
        Ok(())
    }

    pub fn delete_category(&mut self, entity_id: &str, category_id: &str) -> StoreResult<()> {
        let entity = self.get_mut(entity_id)?;
        let original_len = entity.categories.len();
        entity.categories.retain(|c| c.id != category_id);
        if entity.categories.len() == original_len {
            return Err(StoreError::not_found("Category", category_id));
        }
        Ok(())
    }

    fn category_mut(&mut self, entity_id: &str, category_id: &str) -> StoreResult<&mut CompanyCategory> {
        self.get_mut(entity_id)?
            .categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| StoreError::not_found("Category", category_id))
    }

    // =========================================================================
    // Step operations
    // =========================================================================

    pub fn add_step(&mut self, entity_id: &str, category_id: &str, label: &str) -> StoreResult<String> {
        let label = require_text(label, "Step label")?;
        let category = self.category_mut(entity_id, category_id)?;
        let step = CompanyStep::new(label);
        let id = step.id.clone();
        category.steps.push(step);
        category.recompute_progress();
        Ok(id)
    }

    pub fn rename_step(
        &mut self,
        entity_id: &str,
        category_id: &str,
        step_id: &str,
        label: &str,
    ) -> StoreResult<()> {
        let label = require_text(label, "Step label")?;
        let step = self
            .category_mut(entity_id, category_id)?
            .steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or_else(|| StoreError::not_found("Step", step_id))?;
        step.label = label;
        Ok(())
    }

    pub fn delete_step(&mut self, entity_id: &str, category_id: &str, step_id: &str) -> StoreResult<()> {
        let category = self.category_mut(entity_id, category_id)?;
        let original_len = category.steps.len();
        category.steps.retain(|s| s.id != step_id);
        if category.steps.len() == original_len {
            return Err(StoreError::not_found("Step", step_id));
        }
        category.recompute_progress();
        Ok(())
    }

    /// Flips a step's completion flag and returns the new value
    pub fn toggle_step(&mut self, entity_id: &str, category_id: &str, step_id: &str) -> StoreResult<bool> {
        let category = self.category_mut(entity_id, category_id)?;
        let step = category
            .steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or_else(|| StoreError::not_found("Step", step_id))?;
        step.is_completed = !step.is_completed;
        let completed = step.is_completed;
        category.recompute_progress();
        Ok(completed)
    }

    fn check_status(&self, status: EntityStatus) -> StoreResult<()> {
        if self.kind.allows_status(status) {
            Ok(())
        } else {
            Err(StoreError::Validation(format!(
                "Status {} is not available for {} entities",
                status, self.kind
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::models::completion_percentage;

    fn forest_with_root(name: &str) -> (EntityForest, String) {
        let mut forest = EntityForest::new(ForestKind::Company);
        let id = forest.create_entity(None, EntityDraft::named(name), &[]).unwrap();
        (forest, id)
    }

    fn assert_progress_invariant(forest: &EntityForest) {
        for entity in forest.entities() {
            for cat in &entity.categories {
                assert_eq!(cat.progress, completion_percentage(cat.completed_steps(), cat.steps.len()));
            }
        }
    }

    #[test]
    fn test_checklist_scenario() {
        let (mut forest, id) = forest_with_root("RFX Corp");
        assert!(forest.get(&id).unwrap().categories.is_empty());

        let cat_id = forest.add_category(&id, "Legal").unwrap();
        let cat = forest.get(&id).unwrap().category(&cat_id).unwrap();
        assert_eq!(cat.name, "Legal");
        assert_eq!(cat.progress, 0);
        assert!(cat.steps.is_empty());

        let step_id = forest.add_step(&id, &cat_id, "File incorporation").unwrap();
        let cat = forest.get(&id).unwrap().category(&cat_id).unwrap();
        assert_eq!(cat.steps.len(), 1);
        assert!(!cat.steps[0].is_completed);
        assert_eq!(cat.progress, 0);

        assert!(forest.toggle_step(&id, &cat_id, &step_id).unwrap());
        assert_eq!(forest.get(&id).unwrap().category(&cat_id).unwrap().progress, 100);
    }

    #[test]
    fn test_progress_invariant_over_mixed_operations() {
        let (mut forest, id) = forest_with_root("RFX Corp");
        let cat_id = forest.add_category(&id, "Ops").unwrap();
        let s1 = forest.add_step(&id, &cat_id, "one").unwrap();
        let s2 = forest.add_step(&id, &cat_id, "two").unwrap();
        let s3 = forest.add_step(&id, &cat_id, "three").unwrap();

        forest.toggle_step(&id, &cat_id, &s1).unwrap();
        assert_eq!(forest.get(&id).unwrap().category(&cat_id).unwrap().progress, 33);
        forest.toggle_step(&id, &cat_id, &s2).unwrap();
        assert_eq!(forest.get(&id).unwrap().category(&cat_id).unwrap().progress, 67);
        forest.delete_step(&id, &cat_id, &s3).unwrap();
        assert_eq!(forest.get(&id).unwrap().category(&cat_id).unwrap().progress, 100);
        forest.toggle_step(&id, &cat_id, &s2).unwrap();
        assert_eq!(forest.get(&id).unwrap().category(&cat_id).unwrap().progress, 50);
        forest.delete_step(&id, &cat_id, &s1).unwrap();
        forest.delete_step(&id, &cat_id, &s2).unwrap();
        assert_eq!(forest.get(&id).unwrap().category(&cat_id).unwrap().progress, 0);
        assert_progress_invariant(&forest);
    }

    #[test]
    fn test_rename_step_keeps_progress() {
        let (mut forest, id) = forest_with_root("RFX Corp");
        let cat_id = forest.add_category(&id, "Ops").unwrap();
        let step = forest.add_step(&id, &cat_id, "draft").unwrap();
        forest.toggle_step(&id, &cat_id, &step).unwrap();

        forest.rename_step(&id, &cat_id, &step, "final").unwrap();
        let cat = forest.get(&id).unwrap().category(&cat_id).unwrap();
        assert_eq!(cat.steps[0].label, "final");
        assert_eq!(cat.progress, 100);
    }

    #[test]
    fn test_create_instantiates_current_template() {
        let mut template = defaults::company_template();
        template[0].steps.push("Nuovo step".to_string());
        template.remove(1);

        let mut forest = EntityForest::new(ForestKind::Company);
        let id = forest.create_entity(None, EntityDraft::named("Alpha"), &template).unwrap();
        let entity = forest.get(&id).unwrap();

        assert_eq!(entity.categories.len(), template.len());
        for (cat, tpl) in entity.categories.iter().zip(&template) {
            assert_eq!(cat.name, tpl.name);
            assert_ne!(cat.id, tpl.id);
            assert_eq!(cat.progress, 0);
            let labels: Vec<&str> = cat.steps.iter().map(|s| s.label.as_str()).collect();
            let expected: Vec<&str> = tpl.steps.iter().map(String::as_str).collect();
            assert_eq!(labels, expected);
        }
        assert_eq!(entity.categories[0].steps.last().unwrap().label, "Nuovo step");
    }

    #[test]
    fn test_create_defaults() {
        let mut forest = EntityForest::new(ForestKind::Company);
        let root = forest.create_entity(None, EntityDraft::default(), &[]).unwrap();
        let child = forest.create_entity(Some(&root), EntityDraft::named("Child"), &[]).unwrap();

        let root_entity = forest.get(&root).unwrap();
        assert_eq!(root_entity.name, "Nuova Azienda");
        assert_eq!(root_entity.status, EntityStatus::Idea);
        assert_eq!(root_entity.ownership, None);

        let child_entity = forest.get(&child).unwrap();
        assert_eq!(child_entity.parent_id.as_deref(), Some(root.as_str()));
        assert_eq!(child_entity.ownership, Some(100));
    }

    #[test]
    fn test_create_erp_has_no_ownership() {
        let mut forest = EntityForest::new(ForestKind::Erp);
        let root = forest.create_entity(None, EntityDraft::named("Core"), &[]).unwrap();
        let draft = EntityDraft {
            ownership: Some(40),
            ..EntityDraft::named("Portal")
        };
        let child = forest.create_entity(Some(&root), draft, &[]).unwrap();
        assert_eq!(forest.get(&child).unwrap().ownership, None);
        assert_eq!(forest.get(&root).unwrap().name, "Core");
    }

    #[test]
    fn test_create_rejects_foreign_status() {
        let mut forest = EntityForest::new(ForestKind::Erp);
        let draft = EntityDraft {
            status: Some(EntityStatus::Exit),
            ..EntityDraft::named("Legacy")
        };
        assert!(matches!(
            forest.create_entity(None, draft, &[]),
            Err(StoreError::Validation(_))
        ));
        assert!(forest.is_empty());
    }

    #[test]
    fn test_update_entity_merges_fields() {
        let mut forest = EntityForest::with_entities(ForestKind::Company, defaults::demo_companies());
        let before = forest.get("c4").unwrap().categories.clone();

        forest
            .update_entity(
                "c4",
                EntityPatch {
                    name: Some("RFX Properties".into()),
                    status: Some(EntityStatus::Attivo),
                    ownership: Some(60),
                    logo: Some("logo.png".into()),
                },
            )
            .unwrap();

        let entity = forest.get("c4").unwrap();
        assert_eq!(entity.name, "RFX Properties");
        assert_eq!(entity.status, EntityStatus::Attivo);
        assert_eq!(entity.ownership, Some(60));
        assert_eq!(entity.logo.as_deref(), Some("logo.png"));
        assert_eq!(entity.categories, before);
    }

    #[test]
    fn test_update_entity_validates_before_writing() {
        let mut forest = EntityForest::with_entities(ForestKind::Company, defaults::demo_companies());
        let before = forest.clone();

        let result = forest.update_entity(
            "c2",
            EntityPatch {
                name: Some("Renamed".into()),
                ownership: Some(150),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(forest, before);

        let missing = forest.update_entity("zzz", EntityPatch::default());
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_update_entity_rejects_ownership_on_root() {
        let (mut forest, root) = forest_with_root("RFX Corp");
        let before = forest.clone();

        let result = forest.update_entity(
            &root,
            EntityPatch {
                name: Some("Renamed".into()),
                ownership: Some(40),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(forest, before);
    }

    #[test]
    fn test_update_entity_rejects_ownership_on_erp() {
        let mut forest = EntityForest::new(ForestKind::Erp);
        let root = forest.create_entity(None, EntityDraft::named("Core"), &[]).unwrap();
        let child = forest
            .create_entity(Some(root.as_str()), EntityDraft::named("HR"), &[])
            .unwrap();
        let before = forest.clone();

        let result = forest.update_entity(
            &child,
            EntityPatch {
                ownership: Some(40),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(forest, before);
        assert_eq!(forest.get(&child).unwrap().ownership, None);
    }

    #[test]
    fn test_delete_cascades_to_all_descendants() {
        let mut forest = EntityForest::with_entities(ForestKind::Company, defaults::demo_companies());

        let removed = forest.delete_entity("c2").unwrap();
        assert_eq!(removed, vec!["c2".to_string(), "c3".to_string()]);

        let remaining: Vec<&str> = forest.entities().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(remaining, vec!["c1", "c4", "c5"]);
    }

    #[test]
    fn test_delete_root_with_two_children() {
        let (mut forest, root) = forest_with_root("R");
        let a = forest.create_entity(Some(&root), EntityDraft::named("A"), &[]).unwrap();
        let b = forest.create_entity(Some(&root), EntityDraft::named("B"), &[]).unwrap();
        let other = forest.create_entity(None, EntityDraft::named("Other"), &[]).unwrap();

        let removed = forest.delete_entity(&root).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(forest.get(&root).is_none());
        assert!(forest.get(&a).is_none());
        assert!(forest.get(&b).is_none());
        assert!(forest.get(&other).is_some());
    }

    #[test]
    fn test_delete_terminates_on_cycle() {
        let mut entities = defaults::demo_companies();
        entities[0].parent_id = Some("c3".into());
        let mut forest = EntityForest::with_entities(ForestKind::Company, entities);

        let removed = forest.delete_entity("c2").unwrap();
        assert_eq!(removed.len(), 5);
        assert!(forest.is_empty());
    }

    #[test]
    fn test_delete_missing_entity() {
        let mut forest = EntityForest::with_entities(ForestKind::Company, defaults::demo_companies());
        assert!(forest.delete_entity("nope").is_err());
        assert_eq!(forest.len(), 5);
    }

    #[test]
    fn test_apply_template_adds_missing_categories() {
        let mut forest = EntityForest::with_entities(ForestKind::Company, defaults::demo_companies());
        let added = forest.apply_template("c1", &defaults::company_template()).unwrap();
        assert_eq!(added, 3);

        let names: Vec<&str> = forest.get("c1").unwrap().categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Costituzione", "Immagine Coordinata", "Struttura Commerciale", "Sistema CRM"]
        );
        assert_eq!(forest.get("c1").unwrap().categories[0].progress, 100);
    }

    #[test]
    fn test_category_crud_and_missing_ids() {
        let (mut forest, id) = forest_with_root("RFX Corp");
        let cat = forest.add_category(&id, "Finanza").unwrap();
        forest.rename_category(&id, &cat, "Finance").unwrap();
        assert_eq!(forest.get(&id).unwrap().categories[0].name, "Finance");

        assert!(matches!(
            forest.add_step(&id, "missing", "x"),
            Err(StoreError::NotFound { kind: "Category", .. })
        ));
        assert!(matches!(forest.add_category(&id, ""), Err(StoreError::Validation(_))));
        assert!(forest.toggle_step(&id, &cat, "missing").is_err());

        forest.delete_category(&id, &cat).unwrap();
        assert!(forest.get(&id).unwrap().categories.is_empty());
        assert!(forest.delete_category(&id, &cat).is_err());
    }

    #[test]
    fn test_roots_and_children() {
        let forest = EntityForest::with_entities(ForestKind::Company, defaults::demo_companies());
        let roots: Vec<&str> = forest.roots().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(roots, vec!["c1"]);
        let kids: Vec<&str> = forest.children("c1").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(kids, vec!["c2", "c4", "c5"]);
        assert_eq!(forest.descendant_closure("c1").len(), 5);
    }
}
