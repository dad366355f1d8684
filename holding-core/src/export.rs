use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use std::fs;
use std::path::Path;

use crate::models::{EntityType, ForestKind};
use crate::state::BusinessState;
use crate::tree::TreeNode;

fn section_title(kind: ForestKind) -> &'static str {
    match kind {
        ForestKind::Company => "Struttura Societaria",
        ForestKind::Erp => "Sistemi ERP",
    }
}

fn type_title(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Company => "Aziende",
        EntityType::Erp => "ERP",
        EntityType::Product => "Prodotti",
        EntityType::Partner => "Partner",
    }
}

fn push_node(output: &mut String, node: &TreeNode) {
    let indent = "  ".repeat(node.depth);
    let ownership = node
        .ownership
        .map(|o| format!(" | quota {}%", o))
        .unwrap_or_default();
    output.push_str(&format!(
        "{}- **{}** ({}){} | avanzamento {}% ({}/{} step)\n",
        indent,
        node.name,
        node.status,
        ownership,
        node.overall_progress,
        node.completed_steps,
        node.total_steps
    ));
}

/// Renders both forests and the tracked items as a markdown report
pub fn render_status_report(state: &BusinessState, title: &str, date: NaiveDate) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} - Stato della Holding\n\n", title));
    output.push_str(&format!("_Generato il {}_\n\n", date.format("%Y-%m-%d")));

    for kind in ForestKind::ALL {
        output.push_str(&format!("## {}\n\n", section_title(kind)));
        let roots = state.tree(kind);
        if roots.is_empty() {
            output.push_str("Nessuna entità.\n\n");
            continue;
        }
        for root in &roots {
            for node in root.walk() {
                push_node(&mut output, node);
            }
        }
        output.push('\n');
    }

    // Grouped in type order, items keep their collection order
    let items = state.tracked.list();
    if !items.is_empty() {
        output.push_str("## Progetti Tracciati\n\n");
        for entity_type in [
            EntityType::Product,
            EntityType::Partner,
            EntityType::Company,
            EntityType::Erp,
        ] {
            let group = state.tracked.filter_by_type(entity_type);
            if group.is_empty() {
                continue;
            }
            output.push_str(&format!("### {}\n\n", type_title(entity_type)));
            for item in group {
                output.push_str(&format!(
                    "- **{}** ({}) | avanzamento {}% | dal {}\n",
                    item.name,
                    item.status,
                    item.progress,
                    item.start_date.format("%Y-%m-%d")
                ));
                if !item.description.is_empty() {
                    output.push_str(&format!("  {}\n", item.description));
                }
            }
            output.push('\n');
        }
    }

    output
}

/// Writes the status report to `output_path`
pub fn export_status_report(state: &BusinessState, title: &str, output_path: &Path) -> Result<()> {
    let report = render_status_report(state, title, chrono::Local::now().date_naive());
    fs::write(output_path, report)
        .with_context(|| format!("Failed to write report to {:?}", output_path))?;
    info!("Exported status report to {}", output_path.display());
    Ok(())
}
