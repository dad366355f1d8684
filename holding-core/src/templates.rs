//! Template store: the company and ERP checklist blueprints.

use log::debug;

use crate::defaults;
use crate::error::{require_text, StoreError, StoreResult};
use crate::models::{ForestKind, TemplateCategory};

/// Holds both template sets. Every operation is parameterized by the
/// [`ForestKind`] whose set it acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStore {
    company: Vec<TemplateCategory>,
    erp: Vec<TemplateCategory>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::factory()
    }
}

impl TemplateStore {
    /// Both sets at their factory contents
    pub fn factory() -> Self {
        Self {
            company: defaults::company_template(),
            erp: defaults::erp_template(),
        }
    }

    pub fn empty() -> Self {
        Self {
            company: Vec::new(),
            erp: Vec::new(),
        }
    }

    pub fn categories(&self, kind: ForestKind) -> &[TemplateCategory] {
        match kind {
            ForestKind::Company => &self.company,
            ForestKind::Erp => &self.erp,
        }
    }

    fn categories_mut(&mut self, kind: ForestKind) -> &mut Vec<TemplateCategory> {
        match kind {
            ForestKind::Company => &mut self.company,
            ForestKind::Erp => &mut self.erp,
        }
    }

    /// Replaces a whole set (used by backup restore)
    pub fn replace(&mut self, kind: ForestKind, categories: Vec<TemplateCategory>) {
        *self.categories_mut(kind) = categories;
    }

    pub fn category(&self, kind: ForestKind, category_id: &str) -> Option<&TemplateCategory> {
        self.categories(kind).iter().find(|c| c.id == category_id)
    }

    fn category_mut(&mut self, kind: ForestKind, category_id: &str) -> StoreResult<&mut TemplateCategory> {
        self.categories_mut(kind)
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| StoreError::not_found("Template category", category_id))
    }

    /// Appends a new category with no steps and returns its id
    pub fn add_category(&mut self, kind: ForestKind, name: &str) -> StoreResult<String> {
        let name = require_text(name, "Category name")?;
        let category = TemplateCategory {
            id: crate::models::new_id(&format!("{}_tpl_cat", kind)),
            name,
            steps: Vec::new(),
        };
        let id = category.id.clone();
        debug!("Adding {} template category {} ({})", kind, category.name, id);
        self.categories_mut(kind).push(category);
        Ok(id)
    }

    pub fn rename_category(&mut self, kind: ForestKind, category_id: &str, name: &str) -> StoreResult<()> {
        let name = require_text(name, "Category name")?;
        self.category_mut(kind, category_id)?.name = name;
        Ok(())
    }

    pub fn delete_category(&mut self, kind: ForestKind, category_id: &str) -> StoreResult<()> {
        let categories = self.categories_mut(kind);
        let original_len = categories.len();
        categories.retain(|c| c.id != category_id);
        if categories.len() == original_len {
            return Err(StoreError::not_found("Template category", category_id));
        }
        debug!("Deleted {} template category {}", kind, category_id);
        Ok(())
    }

    pub fn add_step(&mut self, kind: ForestKind, category_id: &str, label: &str) -> StoreResult<()> {
        let label = require_text(label, "Step label")?;
        self.category_mut(kind, category_id)?.steps.push(label);
        Ok(())
    }

    /// Replaces the label at `index`; an index past the end is rejected
    pub fn update_step(
        &mut self,
        kind: ForestKind,
        category_id: &str,
        index: usize,
        label: &str,
    ) -> StoreResult<()> {
        let label = require_text(label, "Step label")?;
        let category = self.category_mut(kind, category_id)?;
        let len = category.steps.len();
        match category.steps.get_mut(index) {
            Some(slot) => {
                *slot = label;
                Ok(())
            }
            None => Err(StoreError::IndexOutOfBounds {
                category_id: category_id.to_string(),
                index,
                len,
            }),
        }
    }

    /// Removes the label at `index`; an index past the end is rejected
    pub fn delete_step(&mut self, kind: ForestKind, category_id: &str, index: usize) -> StoreResult<String> {
        let category = self.category_mut(kind, category_id)?;
        if index >= category.steps.len() {
            return Err(StoreError::IndexOutOfBounds {
                category_id: category_id.to_string(),
                index,
                len: category.steps.len(),
            });
        }
        Ok(category.steps.remove(index))
    }

    /// Restores BOTH sets to their factory contents, discarding edits
    pub fn reset_to_defaults(&mut self) {
        debug!("Resetting company and erp templates to factory defaults");
        *self = Self::factory();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_category_appends_empty() {
        let mut store = TemplateStore::empty();
        let id = store.add_category(ForestKind::Company, "Legale").unwrap();

        let cats = store.categories(ForestKind::Company);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].id, id);
        assert_eq!(cats[0].name, "Legale");
        assert!(cats[0].steps.is_empty());
        assert!(id.starts_with("company_tpl_cat-"));
        assert!(store.categories(ForestKind::Erp).is_empty());
    }

    #[test]
    fn test_add_category_blank_name_rejected() {
        let mut store = TemplateStore::empty();
        let result = store.add_category(ForestKind::Erp, "   ");
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.categories(ForestKind::Erp).is_empty());
    }

    #[test]
    fn test_rename_and_delete_category() {
        let mut store = TemplateStore::factory();
        store.rename_category(ForestKind::Company, "tpl_cat_2", "Brand").unwrap();
        assert_eq!(store.category(ForestKind::Company, "tpl_cat_2").unwrap().name, "Brand");

        store.delete_category(ForestKind::Company, "tpl_cat_2").unwrap();
        assert!(store.category(ForestKind::Company, "tpl_cat_2").is_none());
        assert_eq!(store.categories(ForestKind::Company).len(), 3);
    }

    #[test]
    fn test_missing_category_leaves_state_untouched() {
        let mut store = TemplateStore::factory();
        let before = store.clone();

        assert!(matches!(
            store.rename_category(ForestKind::Erp, "nope", "X"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(store.delete_category(ForestKind::Erp, "nope").is_err());
        assert!(store.add_step(ForestKind::Erp, "nope", "Step").is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_step_operations() {
        let mut store = TemplateStore::factory();
        store.add_step(ForestKind::Erp, "erp_tpl_core", "Monitoring").unwrap();
        let steps = &store.category(ForestKind::Erp, "erp_tpl_core").unwrap().steps;
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[5], "Monitoring");

        store.update_step(ForestKind::Erp, "erp_tpl_core", 0, "Setup Cloud").unwrap();
        let removed = store.delete_step(ForestKind::Erp, "erp_tpl_core", 1).unwrap();
        assert_eq!(removed, "Progettazione Database Relazionale (SQL)");

        let steps = &store.category(ForestKind::Erp, "erp_tpl_core").unwrap().steps;
        assert_eq!(steps[0], "Setup Cloud");
        assert_eq!(steps.len(), 5);
    }

    #[test]
    fn test_update_step_out_of_bounds_is_rejected() {
        let mut store = TemplateStore::empty();
        let id = store.add_category(ForestKind::Company, "Legal").unwrap();
        for label in ["a", "b", "c"] {
            store.add_step(ForestKind::Company, &id, label).unwrap();
        }
        let before = store.clone();

        let err = store
            .update_step(ForestKind::Company, &id, 5, "New Label")
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::IndexOutOfBounds {
                category_id: id.clone(),
                index: 5,
                len: 3
            }
        );
        assert!(store.delete_step(ForestKind::Company, &id, 3).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_reset_restores_both_sets() {
        let mut store = TemplateStore::factory();
        store.delete_category(ForestKind::Company, "tpl_cat_1").unwrap();
        store.add_category(ForestKind::Erp, "Extra").unwrap();

        store.reset_to_defaults();
        assert_eq!(store, TemplateStore::factory());
    }
}
