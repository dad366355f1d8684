pub mod ai;
pub mod backup;
pub mod config;
pub mod defaults;
pub mod error;
pub mod export;
pub mod forest;
pub mod integrity;
pub mod models;
pub mod state;
pub mod storage;
pub mod templates;
pub mod tracked;
pub mod tree;

// Re-export commonly used types
pub use ai::{AiClient, AiError, AiMode, Assistant, ChatMessage, ChatRole, ChatSession, TextGenerator};
pub use backup::{
    backup_file_name, export_snapshot, import_snapshot, restore_from_file, write_backup,
    write_backup_to, BackupData, BackupDocument, ImportPolicy, ImportSummary, BACKUP_VERSION,
};
pub use config::{determine_data_path, get_config_path, AiConfig, AiModeSetting, Config};
pub use error::{StoreError, StoreResult};
pub use export::{export_status_report, render_status_report};
pub use forest::EntityForest;
pub use integrity::IntegrityIssue;
pub use models::{
    completion_percentage, CompanyCategory, CompanyStep, DetailedCompany, EntityDraft,
    EntityPatch, EntityStatus, EntityType, ForestKind, TemplateCategory, TrackedDraft,
    TrackedEntity, TrackedPatch,
};
pub use state::BusinessState;
pub use storage::Storage;
pub use templates::TemplateStore;
pub use tracked::SimpleEntityStore;
pub use tree::TreeNode;
