use anyhow::Result;
use inquire::error::InquireError;
use inquire::{Confirm, CustomType, Select, Text};

use holding_core::{DetailedCompany, EntityDraft, ForestKind};

/// Two-step confirmation before a cascading delete
pub fn confirm_entity_delete(entity: &DetailedCompany, descendants: usize) -> Result<bool> {
    let first = if descendants == 0 {
        format!("Delete '{}'?", entity.name)
    } else {
        format!(
            "Delete '{}' and its {} descendant(s)?",
            entity.name, descendants
        )
    };
    if !Confirm::new(&first).with_default(false).prompt()? {
        return Ok(false);
    }

    let confirm = Confirm::new("Are you sure? This cannot be undone.")
        .with_default(false)
        .prompt()?;
    Ok(confirm)
}

pub fn confirm_template_reset() -> Result<bool> {
    let confirm = Confirm::new("Restore the factory templates? Custom categories and steps are lost.")
        .with_default(false)
        .prompt()?;
    Ok(confirm)
}

/// Prompts for a new entity; returns the draft and the chosen parent id
pub fn prompt_new_entity(
    kind: ForestKind,
    candidates: &[DetailedCompany],
) -> Result<(EntityDraft, Option<String>)> {
    let name = Text::new("Name:")
        .with_default(kind.default_entity_name())
        .prompt()?;

    let status = Select::new("Status:", kind.statuses().to_vec())
        .with_starting_cursor(0)
        .prompt()?;

    let mut parent_options = vec!["(none - new root)".to_string()];
    parent_options.extend(candidates.iter().map(|e| format!("{} [{}]", e.name, e.id)));
    let parent_index = Select::new("Parent:", parent_options)
        .raw_prompt()?
        .index;
    let parent_id = parent_index
        .checked_sub(1)
        .and_then(|i| candidates.get(i))
        .map(|e| e.id.clone());

    let ownership = if kind.tracks_ownership() && parent_id.is_some() {
        Some(
            CustomType::<u8>::new("Ownership %:")
                .with_default(100)
                .with_error_message("Enter a number between 0 and 100")
                .prompt()?,
        )
    } else {
        None
    };

    let logo = Text::new("Logo URL (optional):").prompt()?;

    let draft = EntityDraft {
        name,
        logo: Some(logo).filter(|l| !l.trim().is_empty()),
        status: Some(status),
        ownership,
    };
    Ok((draft, parent_id))
}

/// Multiline text for the strategic analysis, written in the user's editor
pub fn prompt_analysis_text() -> Result<String> {
    let text = inquire::Editor::new("Text to analyze:").prompt()?;
    Ok(text)
}

/// Next line of an interactive chat; `None` ends the session
pub fn prompt_chat_line() -> Result<Option<String>> {
    match Text::new("Tu:")
        .with_help_message("exit or Esc to quit")
        .prompt()
    {
        Ok(line) => {
            let trimmed = line.trim();
            if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                Ok(None)
            } else {
                Ok(Some(line))
            }
        }
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
