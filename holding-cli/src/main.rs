mod cli;
mod prompts;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use colored::{ColoredString, Colorize};
use log::LevelFilter;
use std::fs;
use std::path::Path;

use holding_core::{
    determine_data_path, export_status_report, get_config_path, render_status_report,
    restore_from_file, write_backup, write_backup_to, AiClient, AiModeSetting, Assistant,
    ChatMessage, ChatRole, ChatSession, Config, EntityDraft, EntityPatch, EntityStatus,
    EntityType, ForestKind, ImportPolicy, Storage, TrackedDraft, TrackedPatch,
};

use crate::cli::{
    BackupCommand, CategoryCommand, Cli, Command, ConfigCommand, EntityCommand, StepCommand,
    TemplateCommand, TrackedCommand,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = get_config_path()?;
    let config = Config::load_or_default(&config_path)?;

    // Determine which session file to use
    let data_path = determine_data_path(cli.file.as_deref(), &config);
    let storage = Storage::new(&data_path).with_demo_seed(config.seed_demo_data);

    match &cli.command {
        Command::Template { command } => handle_template_command(command, &storage)?,
        Command::Entity { command } => handle_entity_command(command, &storage)?,
        Command::Category { command } => handle_category_command(command, &storage)?,
        Command::Step { command } => handle_step_command(command, &storage)?,
        Command::Tracked { command } => handle_tracked_command(command, &storage)?,
        Command::Backup { command } => handle_backup_command(command, &storage, &config)?,
        Command::Check => check_integrity(&storage)?,
        Command::Report { output } => write_report(&storage, &config, output.as_deref())?,
        Command::Chat { message } => chat(&config, message.as_deref())?,
        Command::Analyze { text, input } => analyze(&config, text.as_deref(), input.as_deref())?,
        Command::Config { command } => {
            handle_config_command(command, &config_path, &config, &data_path)?
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn parse_kind(kind_str: &str) -> Result<ForestKind> {
    Ok(kind_str.parse()?)
}

fn parse_status(status_str: &str) -> Result<EntityStatus> {
    Ok(status_str.parse()?)
}

fn parse_type(type_str: &str) -> Result<EntityType> {
    Ok(type_str.parse()?)
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date_str))
}

fn status_colored(status: EntityStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        EntityStatus::Idea => label.yellow(),
        EntityStatus::Pianificazione => label.blue(),
        EntityStatus::Sviluppo => label.cyan(),
        EntityStatus::Attivo => label.green(),
        EntityStatus::Exit => label.magenta(),
        EntityStatus::Deprecated => label.red(),
    }
}

/// Ten-cell bar; each cell is 10%
fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) + 5) / 10;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn handle_template_command(cmd: &TemplateCommand, storage: &Storage) -> Result<()> {
    match cmd {
        TemplateCommand::List { kind } => {
            let kind = parse_kind(kind)?;
            let state = storage.load()?;
            let categories = state.templates.categories(kind);

            if categories.is_empty() {
                println!("{}", "No template categories.".yellow());
                return Ok(());
            }

            for category in categories {
                println!("{} {}", category.name.blue().bold(), format!("[{}]", category.id).dimmed());
                for (index, label) in category.steps.iter().enumerate() {
                    println!("  {:>2}. {}", index, label);
                }
            }
        }
        TemplateCommand::AddCategory { kind, name } => {
            let kind = parse_kind(kind)?;
            let id = storage
                .update_atomically(|state| Ok(state.templates.add_category(kind, name)?))?;
            println!("{} {}", "Template category added:".green(), id);
        }
        TemplateCommand::RenameCategory { kind, id, name } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| Ok(state.templates.rename_category(kind, id, name)?))?;
            println!("{}", "Template category renamed.".green());
        }
        TemplateCommand::DeleteCategory { kind, id } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| Ok(state.templates.delete_category(kind, id)?))?;
            println!("{}", "Template category deleted.".green());
            println!("Existing entities keep their copy of this category.");
        }
        TemplateCommand::AddStep { kind, category, label } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| Ok(state.templates.add_step(kind, category, label)?))?;
            println!("{}", "Template step added.".green());
        }
        TemplateCommand::UpdateStep {
            kind,
            category,
            index,
            label,
        } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| {
                Ok(state.templates.update_step(kind, category, *index, label)?)
            })?;
            println!("{}", "Template step updated.".green());
        }
        TemplateCommand::DeleteStep {
            kind,
            category,
            index,
        } => {
            let kind = parse_kind(kind)?;
            let removed = storage
                .update_atomically(|state| Ok(state.templates.delete_step(kind, category, *index)?))?;
            println!("{} {}", "Template step deleted:".green(), removed);
        }
        TemplateCommand::Reset { yes } => {
            if !*yes && !prompts::confirm_template_reset()? {
                println!("{}", "Reset cancelled.".yellow());
                return Ok(());
            }
            storage.update_atomically(|state| {
                state.templates.reset_to_defaults();
                Ok(())
            })?;
            println!("{}", "Templates restored to factory defaults.".green());
        }
    }

    Ok(())
}

fn handle_entity_command(cmd: &EntityCommand, storage: &Storage) -> Result<()> {
    match cmd {
        EntityCommand::List { kind } => list_entities(storage, parse_kind(kind)?)?,
        EntityCommand::Tree { kind } => show_tree(storage, parse_kind(kind)?)?,
        EntityCommand::Show { kind, id } => show_entity(storage, parse_kind(kind)?, id)?,
        EntityCommand::Add {
            kind,
            name,
            parent,
            status,
            ownership,
            logo,
            interactive,
        } => {
            let kind = parse_kind(kind)?;
            let (draft, parent) = if *interactive {
                let state = storage.load()?;
                prompts::prompt_new_entity(kind, state.forest(kind).entities())?
            } else {
                let draft = EntityDraft {
                    name: name.clone().unwrap_or_default(),
                    logo: logo.clone(),
                    status: status.as_deref().map(parse_status).transpose()?,
                    ownership: *ownership,
                };
                (draft, parent.clone())
            };

            let id = storage.update_atomically(|state| {
                if let Some(parent_id) = parent.as_deref() {
                    if state.forest(kind).get(parent_id).is_none() {
                        anyhow::bail!("Parent {} entity not found: {}", kind, parent_id);
                    }
                }
                Ok(state.create_entity(kind, parent.as_deref(), draft)?)
            })?;
            println!("{} {}", "Entity created:".green(), id);
        }
        EntityCommand::Edit {
            kind,
            id,
            name,
            logo,
            status,
            ownership,
        } => {
            let kind = parse_kind(kind)?;
            let patch = EntityPatch {
                name: name.clone(),
                logo: logo.clone(),
                status: status.as_deref().map(parse_status).transpose()?,
                ownership: *ownership,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to change: pass --name, --logo, --status or --ownership");
            }
            storage.update_atomically(|state| Ok(state.forest_mut(kind).update_entity(id, patch)?))?;
            println!("{}", "Entity updated.".green());
        }
        EntityCommand::Delete { kind, id, yes } => delete_entity(storage, parse_kind(kind)?, id, *yes)?,
        EntityCommand::ApplyTemplate { kind, id } => {
            let kind = parse_kind(kind)?;
            let added = storage.update_atomically(|state| Ok(state.apply_template(kind, id)?))?;
            if added == 0 {
                println!("{}", "Entity already has every template category.".yellow());
            } else {
                println!("{} {} categories added.", "Template applied:".green(), added);
            }
        }
    }

    Ok(())
}

fn list_entities(storage: &Storage, kind: ForestKind) -> Result<()> {
    let state = storage.load()?;
    let forest = state.forest(kind);

    if forest.is_empty() {
        println!("{}", format!("No {} entities found.", kind).yellow());
        return Ok(());
    }

    println!(
        "{:<40} | {:<28} | {:<14} | {:<12} | {:>5} | {:>8}",
        "ID", "Name", "Status", "Parent", "Own%", "Progress"
    );
    println!("{}", "-".repeat(120));

    for entity in forest.entities() {
        let ownership = entity
            .ownership
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<40} | {:<28} | {:<14} | {:<12} | {:>5} | {:>7}%",
            entity.id,
            entity.name,
            status_colored(entity.status),
            entity.parent_id.as_deref().unwrap_or("-"),
            ownership,
            entity.overall_progress()
        );
    }

    Ok(())
}

fn show_tree(storage: &Storage, kind: ForestKind) -> Result<()> {
    let state = storage.load()?;
    let roots = state.tree(kind);

    if roots.is_empty() {
        println!("{}", format!("No {} entities found.", kind).yellow());
        return Ok(());
    }

    let mut shown = 0;
    for root in &roots {
        for node in root.walk() {
            shown += 1;
            let ownership = node
                .ownership
                .map(|o| format!(" {}%", o).dimmed().to_string())
                .unwrap_or_default();
            println!(
                "{}{}{} [{}] {} {:>3}% {}",
                "  ".repeat(node.depth),
                node.name.bold(),
                ownership,
                status_colored(node.status),
                progress_bar(node.overall_progress),
                node.overall_progress,
                format!("({})", node.id).dimmed()
            );
        }
    }

    let hidden = state.forest(kind).len().saturating_sub(shown);
    if hidden > 0 {
        println!(
            "{}",
            format!(
                "{} entities are not reachable from a root; run `holding check`.",
                hidden
            )
            .yellow()
        );
    }

    Ok(())
}

fn show_entity(storage: &Storage, kind: ForestKind, id: &str) -> Result<()> {
    let state = storage.load()?;
    let forest = state.forest(kind);
    let entity = forest.get(id).context("Entity not found")?;

    println!("{}: {}", "ID".blue(), entity.id);
    println!("{}: {}", "Name".blue(), entity.name);
    println!("{}: {}", "Status".blue(), status_colored(entity.status));
    if let Some(parent_id) = &entity.parent_id {
        let parent_name = forest.get(parent_id).map(|p| p.name.as_str()).unwrap_or("(missing)");
        println!("{}: {} ({})", "Parent".blue(), parent_name, parent_id);
    }
    if let Some(ownership) = entity.ownership {
        println!("{}: {}%", "Ownership".blue(), ownership);
    }
    if let Some(logo) = &entity.logo {
        println!("{}: {}", "Logo".blue(), logo);
    }

    let (done, total) = entity.step_totals();
    println!(
        "{}: {} {}% ({}/{} steps)",
        "Progress".blue(),
        progress_bar(entity.overall_progress()),
        entity.overall_progress(),
        done,
        total
    );

    let children = forest.children(&entity.id);
    if !children.is_empty() {
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        println!("{}: {}", "Children".blue(), names.join(", "));
    }

    for category in &entity.categories {
        println!();
        println!(
            "{} {}% {}",
            category.name.bold(),
            category.progress,
            format!("[{}]", category.id).dimmed()
        );
        for step in &category.steps {
            let mark = if step.is_completed {
                "[x]".green()
            } else {
                "[ ]".normal()
            };
            println!("  {} {} {}", mark, step.label, format!("({})", step.id).dimmed());
        }
    }

    Ok(())
}

fn delete_entity(storage: &Storage, kind: ForestKind, id: &str, skip_confirm: bool) -> Result<()> {
    let state = storage.load()?;
    let forest = state.forest(kind);
    let entity = forest.get(id).context("Entity not found")?;
    let descendants = forest.descendant_closure(id).len() - 1;

    println!("{}", "Entity to delete:".yellow());
    println!("  ID: {}", entity.id);
    println!("  Name: {}", entity.name);
    println!("  Descendants: {}", descendants);

    // Confirm deletion unless --yes flag is used
    if !skip_confirm && !prompts::confirm_entity_delete(entity, descendants)? {
        println!("{}", "Deletion cancelled.".yellow());
        return Ok(());
    }

    let removed = storage.update_atomically(|state| Ok(state.forest_mut(kind).delete_entity(id)?))?;
    println!("{} {} entities removed.", "Deleted:".green(), removed.len());

    Ok(())
}

fn handle_category_command(cmd: &CategoryCommand, storage: &Storage) -> Result<()> {
    match cmd {
        CategoryCommand::Add { kind, entity, name } => {
            let kind = parse_kind(kind)?;
            let id = storage
                .update_atomically(|state| Ok(state.forest_mut(kind).add_category(entity, name)?))?;
            println!("{} {}", "Category added:".green(), id);
        }
        CategoryCommand::Rename {
            kind,
            entity,
            category,
            name,
        } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| {
                Ok(state.forest_mut(kind).rename_category(entity, category, name)?)
            })?;
            println!("{}", "Category renamed.".green());
        }
        CategoryCommand::Delete {
            kind,
            entity,
            category,
        } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| {
                Ok(state.forest_mut(kind).delete_category(entity, category)?)
            })?;
            println!("{}", "Category deleted.".green());
        }
    }

    Ok(())
}

fn handle_step_command(cmd: &StepCommand, storage: &Storage) -> Result<()> {
    match cmd {
        StepCommand::Add {
            kind,
            entity,
            category,
            label,
        } => {
            let kind = parse_kind(kind)?;
            let id = storage.update_atomically(|state| {
                Ok(state.forest_mut(kind).add_step(entity, category, label)?)
            })?;
            println!("{} {}", "Step added:".green(), id);
        }
        StepCommand::Rename {
            kind,
            entity,
            category,
            step,
            label,
        } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| {
                Ok(state.forest_mut(kind).rename_step(entity, category, step, label)?)
            })?;
            println!("{}", "Step renamed.".green());
        }
        StepCommand::Delete {
            kind,
            entity,
            category,
            step,
        } => {
            let kind = parse_kind(kind)?;
            storage.update_atomically(|state| {
                Ok(state.forest_mut(kind).delete_step(entity, category, step)?)
            })?;
            println!("{}", "Step deleted.".green());
        }
        StepCommand::Toggle {
            kind,
            entity,
            category,
            step,
        } => {
            let kind = parse_kind(kind)?;
            let (completed, progress) = storage.update_atomically(|state| {
                let forest = state.forest_mut(kind);
                let completed = forest.toggle_step(entity, category, step)?;
                let progress = forest
                    .get(entity)
                    .and_then(|e| e.category(category))
                    .map(|c| c.progress)
                    .unwrap_or_default();
                Ok((completed, progress))
            })?;
            let label = if completed { "done".green() } else { "open".yellow() };
            println!("Step is now {}; category at {}%.", label, progress);
        }
    }

    Ok(())
}

fn handle_tracked_command(cmd: &TrackedCommand, storage: &Storage) -> Result<()> {
    match cmd {
        TrackedCommand::List { entity_type } => {
            let state = storage.load()?;
            let items = match entity_type {
                Some(type_str) => state.tracked.filter_by_type(parse_type(type_str)?),
                None => state.tracked.list().iter().collect(),
            };

            if items.is_empty() {
                println!("{}", "No tracked items found.".yellow());
                return Ok(());
            }

            println!(
                "{:<40} | {:<8} | {:<24} | {:<14} | {:>8} | {:<10}",
                "ID", "Type", "Name", "Status", "Progress", "Start"
            );
            println!("{}", "-".repeat(120));
            for item in items {
                println!(
                    "{:<40} | {:<8} | {:<24} | {:<14} | {:>7}% | {}",
                    item.id,
                    item.entity_type,
                    item.name,
                    status_colored(item.status),
                    item.progress,
                    item.start_date.format("%Y-%m-%d")
                );
            }
        }
        TrackedCommand::Add {
            entity_type,
            name,
            status,
            description,
            progress,
            start_date,
        } => {
            let mut draft = TrackedDraft::new(parse_type(entity_type)?, name);
            if let Some(status) = status {
                draft.status = parse_status(status)?;
            }
            if let Some(description) = description {
                draft.description = description.clone();
            }
            if let Some(progress) = progress {
                draft.progress = *progress;
            }
            if let Some(start_date) = start_date {
                draft.start_date = parse_date(start_date)?;
            }
            let id = storage.update_atomically(|state| Ok(state.tracked.create(draft)?))?;
            println!("{} {}", "Tracked item added:".green(), id);
        }
        TrackedCommand::Edit {
            id,
            name,
            status,
            description,
            progress,
            start_date,
        } => {
            let patch = TrackedPatch {
                name: name.clone(),
                status: status.as_deref().map(parse_status).transpose()?,
                description: description.clone(),
                progress: *progress,
                start_date: start_date.as_deref().map(parse_date).transpose()?,
            };
            storage.update_atomically(|state| Ok(state.tracked.update(id, patch)?))?;
            println!("{}", "Tracked item updated.".green());
        }
        TrackedCommand::Delete { id } => {
            let removed = storage.update_atomically(|state| Ok(state.tracked.delete(id)?))?;
            println!("{} {}", "No longer tracking:".green(), removed.name);
        }
    }

    Ok(())
}

fn handle_backup_command(cmd: &BackupCommand, storage: &Storage, config: &Config) -> Result<()> {
    match cmd {
        BackupCommand::Export { output } => {
            let state = storage.load()?;
            let path = match output {
                Some(path) => {
                    write_backup_to(&state, path)?;
                    path.clone()
                }
                None => write_backup(&state, Path::new(&config.backup_dir), &config.product_name)?,
            };
            println!("{} {}", "Backup written:".green(), path.display());
        }
        BackupCommand::Import { file, permissive } => {
            let policy = if *permissive {
                ImportPolicy::Permissive
            } else {
                ImportPolicy::Strict
            };
            let summary =
                storage.update_atomically(|state| restore_from_file(state, file, policy))?;

            println!("{} {}", "Backup restored:".green(), file.display());
            if !summary.version.is_empty() || !summary.timestamp.is_empty() {
                println!("  Version {} from {}", summary.version, summary.timestamp);
            }
            if summary.replaced.is_empty() {
                println!("  {}", "The backup contained no data slices.".yellow());
            } else {
                println!("  Replaced: {}", summary.replaced.join(", "));
            }
            for (kind, issue) in &summary.issues {
                println!("  {} [{}] {}", "warning:".yellow(), kind, issue);
            }
        }
    }

    Ok(())
}

fn check_integrity(storage: &Storage) -> Result<()> {
    let state = storage.load()?;
    let issues = state.integrity_issues();

    if issues.is_empty() {
        println!("{}", "No integrity issues found.".green());
        return Ok(());
    }

    for (kind, issue) in &issues {
        println!("{} [{}] {}", "error:".red(), kind, issue);
    }
    anyhow::bail!("{} integrity issue(s) found", issues.len())
}

fn write_report(storage: &Storage, config: &Config, output: Option<&Path>) -> Result<()> {
    let state = storage.load()?;
    match output {
        Some(path) => {
            export_status_report(&state, &config.holding_name, path)?;
            println!("{} {}", "Report written:".green(), path.display());
        }
        None => {
            let today = chrono::Local::now().date_naive();
            print!("{}", render_status_report(&state, &config.holding_name, today));
        }
    }
    Ok(())
}

fn build_assistant(config: &Config) -> Assistant<AiClient> {
    let client = AiClient::from_config(&config.ai);
    if !client.is_available() && config.ai.mode != AiModeSetting::Disabled {
        println!(
            "{}",
            format!("AI command '{}' not found; replies will be fallbacks.", config.ai.command)
                .yellow()
        );
    }
    log::info!("AI mode: {}", client.mode_description());
    Assistant::new(client, config.holding_name.clone())
}

fn advisor_name(config: &Config) -> String {
    format!("{} Advisor", config.product_name.to_uppercase())
}

fn print_message(message: &ChatMessage, advisor: &str) {
    match message.role {
        ChatRole::Model => println!("{} {}", format!("{}:", advisor).cyan().bold(), message.text),
        ChatRole::User => println!("{} {}", "Tu:".bold(), message.text),
    }
}

fn chat(config: &Config, message: Option<&str>) -> Result<()> {
    let assistant = build_assistant(config);
    let advisor = advisor_name(config);
    let mut session = ChatSession::new(&advisor);

    if let Some(message) = message {
        let reply = session
            .send(&assistant, message)
            .context("Message must not be empty")?;
        println!("{}", reply.text);
        return Ok(());
    }

    for message in session.messages() {
        print_message(message, &advisor);
    }
    while let Some(line) = prompts::prompt_chat_line()? {
        if let Some(reply) = session.send(&assistant, &line) {
            print_message(reply, &advisor);
        }
    }

    Ok(())
}

fn analyze(config: &Config, text: Option<&str>, input: Option<&Path>) -> Result<()> {
    let content = match (text, input) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        (None, None) => prompts::prompt_analysis_text()?,
    };
    if content.trim().is_empty() {
        anyhow::bail!("Nothing to analyze: the text is empty");
    }

    let assistant = build_assistant(config);
    println!("{}", assistant.analyze_business_text(&content));
    Ok(())
}

fn handle_config_command(
    cmd: &ConfigCommand,
    config_path: &Path,
    config: &Config,
    data_path: &Path,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            println!("{}: {}", "Config file".blue(), config_path.display());
            println!("{}: {}", "Session file".blue(), data_path.display());
            println!("{}: {}", "Backup directory".blue(), config.backup_dir);
            println!("{}: {}", "Product name".blue(), config.product_name);
            println!("{}: {}", "Holding name".blue(), config.holding_name);
            println!("{}: {}", "Seed demo data".blue(), config.seed_demo_data);
            let mode = match config.ai.mode {
                AiModeSetting::Cli => format!("cli ({} {})", config.ai.command, config.ai.args.join(" ")),
                AiModeSetting::Disabled => "disabled".to_string(),
            };
            println!("{}: {}", "AI".blue(), mode.trim_end());
        }
        ConfigCommand::Path => {
            println!("{}", config_path.display());
        }
        ConfigCommand::Init => {
            if config_path.exists() {
                println!("{} {}", "Config already exists:".yellow(), config_path.display());
            } else {
                Config::create_default(config_path)?;
                println!("{} {}", "Config written:".green(), config_path.display());
            }
        }
    }

    Ok(())
}
