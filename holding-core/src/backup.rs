//! Backup/restore codec: the full state as a versioned JSON document.
//!
//! ```json
//! { "version": "1.2", "timestamp": "2024-05-01T10:00:00.000Z",
//!   "data": { "template": [], "erpTemplate": [], "companies": [],
//!             "erpSystems": [], "simpleEntities": [] } }
//! ```
//!
//! On import each of the five slices under `data` is optional and replaces
//! the matching part of the state only when present.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::integrity::{self, IntegrityIssue};
use crate::models::{DetailedCompany, ForestKind, TemplateCategory, TrackedEntity};
use crate::state::BusinessState;

/// Version written into every exported document
pub const BACKUP_VERSION: &str = "1.2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default)]
    pub version: String,
    /// ISO-8601 instant of the export
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub data: Option<BackupData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Vec<TemplateCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erp_template: Option<Vec<TemplateCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<DetailedCompany>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erp_systems: Option<Vec<DetailedCompany>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_entities: Option<Vec<TrackedEntity>>,
}

/// How import treats referential-integrity problems in the entity slices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    /// Reject the document, leaving the state untouched
    #[default]
    Strict,
    /// Accept the document as-is and report the issues
    Permissive,
}

/// What an import replaced, and what it tolerated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub version: String,
    pub timestamp: String,
    pub replaced: Vec<&'static str>,
    pub issues: Vec<(ForestKind, IntegrityIssue)>,
}

impl BackupDocument {
    /// Captures every slice of `state` at instant `now`
    pub fn capture(state: &BusinessState, now: DateTime<Utc>) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            data: Some(BackupData {
                template: Some(state.templates.categories(ForestKind::Company).to_vec()),
                erp_template: Some(state.templates.categories(ForestKind::Erp).to_vec()),
                companies: Some(state.companies.entities().to_vec()),
                erp_systems: Some(state.erp_systems.entities().to_vec()),
                simple_entities: Some(state.tracked.list().to_vec()),
            }),
        }
    }

    pub fn to_json_bytes(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| StoreError::Format(e.to_string()))
    }

    /// Parses a document; fails unless it is a JSON object with a `data` object
    pub fn parse(bytes: &[u8]) -> StoreResult<Self> {
        let document: BackupDocument =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Format(e.to_string()))?;
        if document.data.is_none() {
            return Err(StoreError::Format("missing 'data' section".to_string()));
        }
        Ok(document)
    }
}

/// Serializes the full state, stamped with the current instant, to UTF-8 JSON
pub fn export_snapshot(state: &BusinessState) -> StoreResult<Vec<u8>> {
    BackupDocument::capture(state, Utc::now()).to_json_bytes()
}

/// Restores the slices present in `bytes` into `state`.
///
/// Under [`ImportPolicy::Strict`] the entity slices are checked for duplicate
/// ids, dangling parents and cycles before anything is written.
pub fn import_snapshot(
    state: &mut BusinessState,
    bytes: &[u8],
    policy: ImportPolicy,
) -> StoreResult<ImportSummary> {
    let document = BackupDocument::parse(bytes)?;
    let data = document.data.unwrap_or_default();

    let mut issues = Vec::new();
    for (kind, slice) in [
        (ForestKind::Company, &data.companies),
        (ForestKind::Erp, &data.erp_systems),
    ] {
        if let Some(entities) = slice {
            issues.extend(
                integrity::check_entities(entities)
                    .into_iter()
                    .map(|issue| (kind, issue)),
            );
        }
    }

    if !issues.is_empty() {
        match policy {
            ImportPolicy::Strict => {
                let details: Vec<String> = issues
                    .iter()
                    .map(|(kind, issue)| format!("{}: {}", kind, issue))
                    .collect();
                return Err(StoreError::Integrity(details.join("; ")));
            }
            ImportPolicy::Permissive => {
                for (kind, issue) in &issues {
                    warn!("Importing {} forest with integrity issue: {}", kind, issue);
                }
            }
        }
    }

    let mut replaced = Vec::new();
    if let Some(template) = data.template {
        state.templates.replace(ForestKind::Company, template);
        replaced.push("template");
    }
    if let Some(erp_template) = data.erp_template {
        state.templates.replace(ForestKind::Erp, erp_template);
        replaced.push("erpTemplate");
    }
    if let Some(companies) = data.companies {
        state.companies.replace_all(companies);
        replaced.push("companies");
    }
    if let Some(erp_systems) = data.erp_systems {
        state.erp_systems.replace_all(erp_systems);
        replaced.push("erpSystems");
    }
    if let Some(simple_entities) = data.simple_entities {
        state.tracked.replace_all(simple_entities);
        replaced.push("simpleEntities");
    }

    info!(
        "Imported backup version {} from {} ({} slices)",
        document.version,
        document.timestamp,
        replaced.len()
    );

    Ok(ImportSummary {
        version: document.version,
        timestamp: document.timestamp,
        replaced,
        issues,
    })
}

/// `<product>_backup_<YYYY-MM-DD>.json`
pub fn backup_file_name(product: &str, date: NaiveDate) -> String {
    format!("{}_backup_{}.json", product, date.format("%Y-%m-%d"))
}

/// Writes a dated backup of `state` into `dir` and returns its path
pub fn write_backup(state: &BusinessState, dir: &Path, product: &str) -> Result<PathBuf> {
    let path = dir.join(backup_file_name(product, Utc::now().date_naive()));
    write_backup_to(state, &path)?;
    Ok(path)
}

/// Writes a backup of `state` to an explicit path
pub fn write_backup_to(state: &BusinessState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create backup directory {:?}", parent))?;
        }
    }
    let bytes = export_snapshot(state)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write backup file {:?}", path))?;
    info!("Wrote backup to {}", path.display());
    Ok(())
}

/// Reads a backup file and restores it into `state`
pub fn restore_from_file(
    state: &mut BusinessState,
    path: &Path,
    policy: ImportPolicy,
) -> Result<ImportSummary> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read backup file {:?}", path))?;
    let summary = import_snapshot(state, &bytes, policy)
        .with_context(|| format!("Failed to import backup {:?}", path))?;
    Ok(summary)
}
