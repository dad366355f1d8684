//! The full working state: both template sets, both forests and the tracked
//! items, owned by one value that callers pass around explicitly.

use crate::defaults;
use crate::error::StoreResult;
use crate::forest::EntityForest;
use crate::integrity::{self, IntegrityIssue};
use crate::models::{EntityDraft, ForestKind};
use crate::templates::TemplateStore;
use crate::tracked::SimpleEntityStore;
use crate::tree::{self, TreeNode};

/// Mutations take `&mut self`, so there is exactly one writer at a time.
/// Readers that must not observe later changes take a [`snapshot`](Self::snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessState {
    pub templates: TemplateStore,
    pub companies: EntityForest,
    pub erp_systems: EntityForest,
    pub tracked: SimpleEntityStore,
}

impl Default for BusinessState {
    fn default() -> Self {
        Self::new()
    }
}

impl BusinessState {
    /// Factory templates and empty collections
    pub fn new() -> Self {
        Self {
            templates: TemplateStore::factory(),
            companies: EntityForest::new(ForestKind::Company),
            erp_systems: EntityForest::new(ForestKind::Erp),
            tracked: SimpleEntityStore::new(),
        }
    }

    /// Factory templates plus the demo group
    pub fn demo() -> Self {
        Self {
            templates: TemplateStore::factory(),
            companies: EntityForest::with_entities(ForestKind::Company, defaults::demo_companies()),
            erp_systems: EntityForest::with_entities(ForestKind::Erp, defaults::demo_erp_systems()),
            tracked: SimpleEntityStore::with_items(defaults::demo_tracked()),
        }
    }

    /// An immutable copy that stays valid while this state keeps changing
    pub fn snapshot(&self) -> BusinessState {
        self.clone()
    }

    pub fn forest(&self, kind: ForestKind) -> &EntityForest {
        match kind {
            ForestKind::Company => &self.companies,
            ForestKind::Erp => &self.erp_systems,
        }
    }

    pub fn forest_mut(&mut self, kind: ForestKind) -> &mut EntityForest {
        match kind {
            ForestKind::Company => &mut self.companies,
            ForestKind::Erp => &mut self.erp_systems,
        }
    }

    /// Creates an entity in the `kind` forest from that kind's current template
    pub fn create_entity(
        &mut self,
        kind: ForestKind,
        parent_id: Option<&str>,
        draft: EntityDraft,
    ) -> StoreResult<String> {
        let template = self.templates.categories(kind);
        let forest = match kind {
            ForestKind::Company => &mut self.companies,
            ForestKind::Erp => &mut self.erp_systems,
        };
        forest.create_entity(parent_id, draft, template)
    }

    /// Appends the current template's missing categories to an existing entity
    pub fn apply_template(&mut self, kind: ForestKind, entity_id: &str) -> StoreResult<usize> {
        let template = self.templates.categories(kind);
        let forest = match kind {
            ForestKind::Company => &mut self.companies,
            ForestKind::Erp => &mut self.erp_systems,
        };
        forest.apply_template(entity_id, template)
    }

    pub fn tree(&self, kind: ForestKind) -> Vec<TreeNode> {
        tree::build_forest(self.forest(kind))
    }

    /// Integrity issues of both forests, tagged with their kind
    pub fn integrity_issues(&self) -> Vec<(ForestKind, IntegrityIssue)> {
        ForestKind::ALL
            .iter()
            .flat_map(|&kind| {
                integrity::check_entities(self.forest(kind).entities())
                    .into_iter()
                    .map(move |issue| (kind, issue))
            })
            .collect()
    }
}
