use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;

/// Generates a fresh identifier with a readable prefix (e.g. `cat-3f2a...`)
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Rounded completion percentage, half-up, 0 when there is nothing to complete
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((200 * completed + total) / (2 * total)).min(100) as u8
}

/// Selects one of the two forests and its matching template set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForestKind {
    Company,
    Erp,
}

impl fmt::Display for ForestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestKind::Company => write!(f, "company"),
            ForestKind::Erp => write!(f, "erp"),
        }
    }
}

impl FromStr for ForestKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "company" | "companies" => Ok(ForestKind::Company),
            "erp" | "erps" => Ok(ForestKind::Erp),
            other => Err(StoreError::Validation(format!(
                "Unknown kind '{}' (expected company or erp)",
                other
            ))),
        }
    }
}

impl ForestKind {
    pub const ALL: [ForestKind; 2] = [ForestKind::Company, ForestKind::Erp];

    /// Name given to a new entity created without one
    pub fn default_entity_name(&self) -> &'static str {
        match self {
            ForestKind::Company => "Nuova Azienda",
            ForestKind::Erp => "Nuovo Sistema ERP",
        }
    }

    /// Terminal status for this kind: companies exit, ERP systems are deprecated
    pub fn retired_status(&self) -> EntityStatus {
        match self {
            ForestKind::Company => EntityStatus::Exit,
            ForestKind::Erp => EntityStatus::Deprecated,
        }
    }

    pub fn allows_status(&self, status: EntityStatus) -> bool {
        match status {
            EntityStatus::Exit | EntityStatus::Deprecated => status == self.retired_status(),
            _ => true,
        }
    }

    /// Only companies carry an ownership percentage towards their parent
    pub fn tracks_ownership(&self) -> bool {
        matches!(self, ForestKind::Company)
    }

    /// Statuses selectable for this kind, in lifecycle order
    pub fn statuses(&self) -> [EntityStatus; 5] {
        [
            EntityStatus::Idea,
            EntityStatus::Pianificazione,
            EntityStatus::Sviluppo,
            EntityStatus::Attivo,
            self.retired_status(),
        ]
    }
}

/// Lifecycle status of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityStatus {
    Idea,
    Pianificazione,
    Sviluppo,
    Attivo,
    Exit,
    Deprecated,
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Idea => write!(f, "Idea"),
            EntityStatus::Pianificazione => write!(f, "Pianificazione"),
            EntityStatus::Sviluppo => write!(f, "Sviluppo"),
            EntityStatus::Attivo => write!(f, "Attivo"),
            EntityStatus::Exit => write!(f, "Exit"),
            EntityStatus::Deprecated => write!(f, "Deprecated"),
        }
    }
}

impl FromStr for EntityStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idea" => Ok(EntityStatus::Idea),
            "pianificazione" | "planning" => Ok(EntityStatus::Pianificazione),
            "sviluppo" | "development" => Ok(EntityStatus::Sviluppo),
            "attivo" | "active" => Ok(EntityStatus::Attivo),
            "exit" => Ok(EntityStatus::Exit),
            "deprecated" | "deprecato" => Ok(EntityStatus::Deprecated),
            other => Err(StoreError::Validation(format!("Unknown status '{}'", other))),
        }
    }
}

/// Type of a lightweight tracked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Company,
    Erp,
    Product,
    Partner,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Company => write!(f, "company"),
            EntityType::Erp => write!(f, "erp"),
            EntityType::Product => write!(f, "product"),
            EntityType::Partner => write!(f, "partner"),
        }
    }
}

impl FromStr for EntityType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "company" => Ok(EntityType::Company),
            "erp" => Ok(EntityType::Erp),
            "product" => Ok(EntityType::Product),
            "partner" => Ok(EntityType::Partner),
            other => Err(StoreError::Validation(format!("Unknown entity type '{}'", other))),
        }
    }
}

/// Blueprint category: a name and the labels of its steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl TemplateCategory {
    pub fn new(id: &str, name: &str, steps: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A single completable checklist item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStep {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl CompanyStep {
    pub fn new(label: String) -> Self {
        Self {
            id: new_id("step"),
            label,
            is_completed: false,
        }
    }
}

/// A named group of steps with a derived completion percentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub steps: Vec<CompanyStep>,
}

impl CompanyCategory {
    /// Creates an empty category with a fresh id
    pub fn new(name: String) -> Self {
        Self {
            id: new_id("cat"),
            name,
            progress: 0,
            steps: Vec::new(),
        }
    }

    /// Instantiates a template category: fresh ids, nothing completed
    pub fn from_template(template: &TemplateCategory) -> Self {
        Self {
            id: new_id("cat"),
            name: template.name.clone(),
            progress: 0,
            steps: template
                .steps
                .iter()
                .map(|label| CompanyStep::new(label.clone()))
                .collect(),
        }
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_completed).count()
    }

    /// Re-derives `progress` from the current steps
    pub fn recompute_progress(&mut self) {
        self.progress = completion_percentage(self.completed_steps(), self.steps.len());
    }
}

/// A node of a forest: a company or an ERP system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedCompany {
    pub id: String,
    pub name: String,

    /// Image reference (URL or path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Percentage owned by the parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<u8>,

    pub status: EntityStatus,

    #[serde(default)]
    pub categories: Vec<CompanyCategory>,
}

impl DetailedCompany {
    /// Completed and total step counts across all categories
    pub fn step_totals(&self) -> (usize, usize) {
        self.categories.iter().fold((0, 0), |(done, total), cat| {
            (done + cat.completed_steps(), total + cat.steps.len())
        })
    }

    /// Aggregate progress over every step of every category, computed on read
    pub fn overall_progress(&self) -> u8 {
        let (done, total) = self.step_totals();
        completion_percentage(done, total)
    }

    pub fn category(&self, category_id: &str) -> Option<&CompanyCategory> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Fields supplied when creating a detailed entity
#[derive(Debug, Clone, Default)]
pub struct EntityDraft {
    pub name: String,
    pub logo: Option<String>,
    pub status: Option<EntityStatus>,
    pub ownership: Option<u8>,
}

impl EntityDraft {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Partial update for a detailed entity; `None` leaves the field as is.
/// An empty logo string clears the logo.
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub status: Option<EntityStatus>,
    pub ownership: Option<u8>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.logo.is_none() && self.status.is_none() && self.ownership.is_none()
    }
}

/// Lightweight tracked item (product, partner) with manual progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub status: EntityStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub progress: u8,
    /// Written as `YYYY-MM-DD`; RFC 3339 instants are read as their UTC date
    #[serde(deserialize_with = "deserialize_start_date")]
    pub start_date: NaiveDate,
}

fn deserialize_start_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc).date_naive())
        .map_err(|_| serde::de::Error::custom(format!("invalid start date '{}'", raw)))
}

/// Fields supplied when creating a tracked item
#[derive(Debug, Clone)]
pub struct TrackedDraft {
    pub entity_type: EntityType,
    pub name: String,
    pub status: EntityStatus,
    pub description: String,
    pub progress: u8,
    pub start_date: NaiveDate,
}

impl TrackedDraft {
    pub fn new(entity_type: EntityType, name: &str) -> Self {
        Self {
            entity_type,
            name: name.to_string(),
            status: EntityStatus::Idea,
            description: String::new(),
            progress: 0,
            start_date: Utc::now().date_naive(),
        }
    }
}

/// Partial update for a tracked item
#[derive(Debug, Clone, Default)]
pub struct TrackedPatch {
    pub name: Option<String>,
    pub status: Option<EntityStatus>,
    pub description: Option<String>,
    pub progress: Option<u8>,
    pub start_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percentage_rounds_half_up() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(1, 8), 13);
        assert_eq!(completion_percentage(3, 5), 60);
        assert_eq!(completion_percentage(4, 4), 100);
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id("cat");
        let b = new_id("cat");
        assert_ne!(a, b);
        assert!(a.starts_with("cat-"));
    }

    #[test]
    fn test_forest_kind_statuses() {
        assert!(ForestKind::Company.allows_status(EntityStatus::Exit));
        assert!(!ForestKind::Company.allows_status(EntityStatus::Deprecated));
        assert!(ForestKind::Erp.allows_status(EntityStatus::Deprecated));
        assert!(!ForestKind::Erp.allows_status(EntityStatus::Exit));
        assert!(ForestKind::Erp.allows_status(EntityStatus::Attivo));
        assert_eq!(ForestKind::Erp.statuses()[4], EntityStatus::Deprecated);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("attivo".parse::<EntityStatus>().unwrap(), EntityStatus::Attivo);
        assert_eq!("Deprecato".parse::<EntityStatus>().unwrap(), EntityStatus::Deprecated);
        assert!("closed".parse::<EntityStatus>().is_err());
        assert_eq!("erp".parse::<ForestKind>().unwrap(), ForestKind::Erp);
        assert_eq!("partner".parse::<EntityType>().unwrap(), EntityType::Partner);
    }

    #[test]
    fn test_category_from_template_gets_fresh_ids() {
        let tpl = TemplateCategory::new("tpl_cat_1", "Costituzione", &["Rogito notarile", "Partita IVA"]);
        let cat = CompanyCategory::from_template(&tpl);

        assert_ne!(cat.id, tpl.id);
        assert_eq!(cat.name, "Costituzione");
        assert_eq!(cat.progress, 0);
        assert_eq!(cat.steps.len(), 2);
        assert_eq!(cat.steps[1].label, "Partita IVA");
        assert!(cat.steps.iter().all(|s| !s.is_completed));
        assert_ne!(cat.steps[0].id, cat.steps[1].id);
    }

    #[test]
    fn test_overall_progress_spans_categories() {
        let mut first = CompanyCategory::new("A".into());
        first.steps.push(CompanyStep::new("a1".into()));
        first.steps[0].is_completed = true;
        let mut second = CompanyCategory::new("B".into());
        second.steps.push(CompanyStep::new("b1".into()));
        second.steps.push(CompanyStep::new("b2".into()));

        let company = DetailedCompany {
            id: "c1".into(),
            name: "RFX Corp".into(),
            logo: None,
            parent_id: None,
            ownership: None,
            status: EntityStatus::Attivo,
            categories: vec![first, second],
        };

        assert_eq!(company.step_totals(), (1, 3));
        assert_eq!(company.overall_progress(), 33);
    }

    #[test]
    fn test_detailed_company_json_field_names() {
        let company = DetailedCompany {
            id: "c2".into(),
            name: "Digital2Web S.r.l.".into(),
            logo: None,
            parent_id: Some("c1".into()),
            ownership: Some(100),
            status: EntityStatus::Pianificazione,
            categories: vec![],
        };
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["parentId"], "c1");
        assert_eq!(json["status"], "Pianificazione");
        assert!(json.get("logo").is_none());
    }

    #[test]
    fn test_tracked_entity_type_field() {
        let json = r#"{"id":"p1","type":"product","name":"RFX Wallet","status":"Sviluppo",
            "description":"App","progress":45,"startDate":"2024-02-01"}"#;
        let item: TrackedEntity = serde_json::from_str(json).unwrap();
        assert_eq!(item.entity_type, EntityType::Product);
        assert_eq!(item.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_tracked_start_date_accepts_instants() {
        let json = r#"{"id":"p1","type":"product","name":"RFX Wallet","status":"Sviluppo",
            "startDate":"2024-02-01T00:00:00.000Z"}"#;
        let item: TrackedEntity = serde_json::from_str(json).unwrap();
        assert_eq!(item.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let shifted = json.replace("2024-02-01T00:00:00.000Z", "2024-02-01T23:30:00-02:00");
        let item: TrackedEntity = serde_json::from_str(&shifted).unwrap();
        assert_eq!(item.start_date, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());

        let bad = json.replace("2024-02-01T00:00:00.000Z", "next spring");
        assert!(serde_json::from_str::<TrackedEntity>(&bad).is_err());
    }
}
