//! CLI presentation: text and json formatters per command.

use crate::batch::{BatchEvent, BatchReport, BatchSummary};
use crate::cli::parse::OutputFormat;
use crate::error::ApiError;
use crate::lifecycle::{AccessedArtifact, DeletionReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::{Deserialize, Serialize};

const NO_SOURCE: &str = "<no source>";

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::OutputError(e.to_string()))
}

/// One progress line for a text sweep
pub fn format_batch_event(event: &BatchEvent<'_>) -> String {
    match event {
        BatchEvent::GeneratorStarted { id } => format!("Validating generator: {}", id),
        BatchEvent::Artifact { report, .. } => {
            let name = report.name.as_deref().unwrap_or(NO_SOURCE);
            format!("  {} [{}]", name, report.outcome)
        }
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> String {
    format!(
        "Generators: {}, artifacts: {}, generated: {}, skipped: {}, missing source: {}, failed: {}",
        summary.ids_considered,
        summary.artifacts,
        summary.generated,
        summary.skipped,
        summary.missing_source,
        summary.failed
    )
}

pub fn format_batch_report_text(report: &BatchReport) -> String {
    let mut lines = Vec::new();
    for generator in &report.generators {
        lines.push(format_batch_event(&BatchEvent::GeneratorStarted { id: &generator.id }));
        for artifact in &generator.artifacts {
            lines.push(format_batch_event(&BatchEvent::Artifact {
                id: &generator.id,
                report: artifact,
            }));
        }
    }
    lines.push(format_batch_summary(&report.summary));
    lines.join("\n")
}

pub fn format_batch_report_json(report: &BatchReport) -> Result<String, ApiError> {
    to_json(report)
}

/// One row of `cachekit list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecListEntry {
    pub id: String,
    pub pre_cache: bool,
}

pub fn format_spec_list_text(entries: &[SpecListEntry]) -> String {
    if entries.is_empty() {
        return "No generators match.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Generator", "Pre-cache"]);
    for entry in entries {
        table.add_row(vec![
            entry.id.clone(),
            if entry.pre_cache { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_spec_list_json(entries: &[SpecListEntry]) -> Result<String, ApiError> {
    to_json(&serde_json::json!({ "generators": entries }))
}

pub fn format_accessed_artifact(accessed: &AccessedArtifact, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(accessed);
    }
    let url = accessed.url.as_deref().unwrap_or(NO_SOURCE);
    Ok(match &accessed.outcome {
        Some(outcome) if outcome.is_generation_error() => format!("{} [{}]", url, outcome),
        _ => url.to_string(),
    })
}

pub fn format_deletion_report(source: &str, report: &DeletionReport) -> String {
    let mut s = format!("Removed {} artifact(s) for {}", report.removed.len(), source);
    for name in &report.removed {
        s.push_str(&format!("\n  - {}", name));
    }
    if !report.delete_errors.is_empty() {
        s.push_str(&format!("\n\nErrors ({}):", report.delete_errors.len()));
        for (name, error) in &report.delete_errors {
            s.push_str(&format!("\n  - {}: {}", name, error));
        }
    }
    s
}
