use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Track the companies and ERP systems of a holding")]
pub struct Cli {
    /// Path to the session file (overrides HOLDING_DATA_FILE and the config)
    #[clap(long, global = true)]
    pub file: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the category/step templates new entities are built from
    Template {
        #[clap(subcommand)]
        command: TemplateCommand,
    },

    /// Manage companies and ERP systems
    Entity {
        #[clap(subcommand)]
        command: EntityCommand,
    },

    /// Manage the categories of one entity
    Category {
        #[clap(subcommand)]
        command: CategoryCommand,
    },

    /// Manage the checklist steps of one entity
    Step {
        #[clap(subcommand)]
        command: StepCommand,
    },

    /// Manage tracked products and partners
    Tracked {
        #[clap(subcommand)]
        command: TrackedCommand,
    },

    /// Export or restore a JSON backup
    Backup {
        #[clap(subcommand)]
        command: BackupCommand,
    },

    /// Check both forests for dangling parents, duplicate ids and cycles
    Check,

    /// Write a markdown status report
    Report {
        /// Output file (prints to stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Talk to the AI advisor
    Chat {
        /// Send a single message instead of starting an interactive session
        #[clap(long, short = 'm')]
        message: Option<String>,
    },

    /// Strategic analysis (SWOT, risks, opportunities) of a business text
    Analyze {
        /// Text to analyze (an editor opens when neither text nor --input is given)
        text: Option<String>,

        /// Read the text from a file
        #[clap(long, short = 'i')]
        input: Option<PathBuf>,
    },

    /// Show or initialize the configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List template categories and their steps
    List {
        /// company or erp
        #[clap(long, default_value = "company")]
        kind: String,
    },

    /// Add a template category
    AddCategory {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Name of the category
        name: String,
    },

    /// Rename a template category
    RenameCategory {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Category id
        id: String,

        /// New name
        name: String,
    },

    /// Delete a template category
    DeleteCategory {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Category id
        id: String,
    },

    /// Append a step to a template category
    AddStep {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Category id
        category: String,

        /// Step label
        label: String,
    },

    /// Replace the step at a position (0-based)
    UpdateStep {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Category id
        category: String,

        /// Step position
        index: usize,

        /// New label
        label: String,
    },

    /// Remove the step at a position (0-based)
    DeleteStep {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Category id
        category: String,

        /// Step position
        index: usize,
    },

    /// Restore both factory templates
    Reset {
        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    /// List entities
    List {
        #[clap(long, default_value = "company")]
        kind: String,
    },

    /// Show the hierarchy with progress
    Tree {
        #[clap(long, default_value = "company")]
        kind: String,
    },

    /// Show one entity with its categories and steps
    Show {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        id: String,
    },

    /// Create an entity from the current template
    Add {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Name (a default name is used when omitted)
        #[clap(long)]
        name: Option<String>,

        /// Parent entity id
        #[clap(long)]
        parent: Option<String>,

        /// Initial status
        #[clap(long)]
        status: Option<String>,

        /// Ownership percentage held by the parent (companies only)
        #[clap(long)]
        ownership: Option<u8>,

        /// Logo URL
        #[clap(long)]
        logo: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Edit name, logo, status or ownership
    Edit {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        id: String,

        #[clap(long)]
        name: Option<String>,

        /// Logo URL; an empty value removes the logo
        #[clap(long)]
        logo: Option<String>,

        #[clap(long)]
        status: Option<String>,

        #[clap(long)]
        ownership: Option<u8>,
    },

    /// Delete an entity together with all of its descendants
    Delete {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        id: String,

        /// Skip confirmation prompts
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Add the template categories an entity is missing
    ApplyTemplate {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Add an empty category to an entity
    Add {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Name of the category
        name: String,
    },

    /// Rename a category
    Rename {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Category id
        category: String,

        /// New name
        name: String,
    },

    /// Delete a category with its steps
    Delete {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Category id
        category: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum StepCommand {
    /// Append a step to a category
    Add {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Category id
        category: String,

        /// Step label
        label: String,
    },

    /// Rename a step
    Rename {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Category id
        category: String,

        /// Step id
        step: String,

        /// New label
        label: String,
    },

    /// Delete a step
    Delete {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Category id
        category: String,

        /// Step id
        step: String,
    },

    /// Flip a step between done and not done
    Toggle {
        #[clap(long, default_value = "company")]
        kind: String,

        /// Entity id
        entity: String,

        /// Category id
        category: String,

        /// Step id
        step: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrackedCommand {
    /// List tracked items
    List {
        /// Only items of this type (company, erp, product, partner)
        #[clap(long = "type")]
        entity_type: Option<String>,
    },

    /// Track a new item
    Add {
        /// company, erp, product or partner
        #[clap(long = "type", default_value = "product")]
        entity_type: String,

        /// Name of the item
        name: String,

        #[clap(long)]
        status: Option<String>,

        #[clap(long)]
        description: Option<String>,

        /// Progress percentage (0-100)
        #[clap(long)]
        progress: Option<u8>,

        /// Start date (YYYY-MM-DD), defaults to today
        #[clap(long)]
        start_date: Option<String>,
    },

    /// Edit a tracked item
    Edit {
        /// Item id
        id: String,

        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        status: Option<String>,

        #[clap(long)]
        description: Option<String>,

        #[clap(long)]
        progress: Option<u8>,

        #[clap(long)]
        start_date: Option<String>,
    },

    /// Stop tracking an item
    Delete {
        /// Item id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Write every slice of the state to a JSON backup
    Export {
        /// Output file (defaults to <backup_dir>/<product>_backup_<date>.json)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace the state with the slices present in a backup
    Import {
        /// Backup file
        file: PathBuf,

        /// Accept documents with dangling parents, duplicate ids or cycles
        #[clap(long)]
        permissive: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the path of the configuration file
    Path,

    /// Write a default configuration file if none exists
    Init,
}
