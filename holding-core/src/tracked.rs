//! Flat store of lightweight tracked items (products, partners).

use log::debug;

use crate::error::{require_percentage, require_text, StoreError, StoreResult};
use crate::models::{new_id, EntityType, TrackedDraft, TrackedEntity, TrackedPatch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleEntityStore {
    items: Vec<TrackedEntity>,
}

impl SimpleEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<TrackedEntity>) -> Self {
        Self { items }
    }

    pub fn list(&self) -> &[TrackedEntity] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&TrackedEntity> {
        self.items.iter().find(|e| e.id == id)
    }

    pub fn filter_by_type(&self, entity_type: EntityType) -> Vec<&TrackedEntity> {
        self.items.iter().filter(|e| e.entity_type == entity_type).collect()
    }

    pub fn replace_all(&mut self, items: Vec<TrackedEntity>) {
        self.items = items;
    }

    /// Adds a new item and returns its id
    pub fn create(&mut self, draft: TrackedDraft) -> StoreResult<String> {
        let name = require_text(&draft.name, "Name")?;
        let progress = require_percentage(draft.progress, "Progress")?;
        let item = TrackedEntity {
            id: new_id(&draft.entity_type.to_string()),
            entity_type: draft.entity_type,
            name,
            status: draft.status,
            description: draft.description,
            progress,
            start_date: draft.start_date,
        };
        let id = item.id.clone();
        debug!("Tracking {} {} ({})", item.entity_type, item.name, id);
        self.items.push(item);
        Ok(id)
    }

    pub fn update(&mut self, id: &str, patch: TrackedPatch) -> StoreResult<()> {
        let name = patch.name.as_deref().map(|n| require_text(n, "Name")).transpose()?;
        let progress = patch
            .progress
            .map(|p| require_percentage(p, "Progress"))
            .transpose()?;

        let item = self
            .items
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("Tracked item", id))?;
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(progress) = progress {
            item.progress = progress;
        }
        if let Some(start_date) = patch.start_date {
            item.start_date = start_date;
        }
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> StoreResult<TrackedEntity> {
        let pos = self
            .items
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("Tracked item", id))?;
        Ok(self.items.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::models::EntityStatus;

    #[test]
    fn test_create_and_filter() {
        let mut store = SimpleEntityStore::with_items(defaults::demo_tracked());
        let mut draft = TrackedDraft::new(EntityType::Partner, "Studio Legale Rossi");
        draft.progress = 10;
        let id = store.create(draft).unwrap();

        assert_eq!(store.list().len(), 2);
        let partners = store.filter_by_type(EntityType::Partner);
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].id, id);
        assert_eq!(partners[0].progress, 10);
        assert_eq!(store.filter_by_type(EntityType::Product)[0].name, "RFX Wallet");
    }

    #[test]
    fn test_create_validates() {
        let mut store = SimpleEntityStore::new();
        assert!(matches!(
            store.create(TrackedDraft::new(EntityType::Product, "  ")),
            Err(StoreError::Validation(_))
        ));
        let mut draft = TrackedDraft::new(EntityType::Product, "Wallet");
        draft.progress = 120;
        assert!(store.create(draft).is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_update_sets_progress_directly() {
        let mut store = SimpleEntityStore::with_items(defaults::demo_tracked());
        store
            .update(
                "p1",
                TrackedPatch {
                    progress: Some(80),
                    status: Some(EntityStatus::Attivo),
                    ..Default::default()
                },
            )
            .unwrap();
        let item = store.get("p1").unwrap();
        assert_eq!(item.progress, 80);
        assert_eq!(item.status, EntityStatus::Attivo);
        assert_eq!(item.name, "RFX Wallet");

        assert!(store.update("missing", TrackedPatch::default()).is_err());
    }

    #[test]
    fn test_delete() {
        let mut store = SimpleEntityStore::with_items(defaults::demo_tracked());
        let removed = store.delete("p1").unwrap();
        assert_eq!(removed.name, "RFX Wallet");
        assert!(store.list().is_empty());
        assert!(matches!(store.delete("p1"), Err(StoreError::NotFound { .. })));
    }
}
