//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use vexim_core::{DeleteReport, ExportedPhase, ObjectOutcome, ObjectReport, PhaseReport};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&line_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since single-item views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    line_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => line_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}

// ── Report rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct PhaseRow {
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Duplicate")]
    duplicates: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Failed")]
    failed: String,
    #[tabled(rename = "Unmapped")]
    unmapped: usize,
}

pub fn phase_row(report: &PhaseReport, color: bool) -> PhaseRow {
    let failed = report.failed();
    PhaseRow {
        phase: report.phase.to_string(),
        created: report.created(),
        duplicates: report.duplicates(),
        skipped: report.skipped(),
        failed: if color && failed > 0 {
            failed.red().to_string()
        } else {
            failed.to_string()
        },
        unmapped: report.unmapped(),
    }
}

pub fn phase_line(report: &PhaseReport) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        report.phase,
        report.created(),
        report.duplicates(),
        report.skipped(),
        report.failed()
    )
}

/// One line per object that did not simply get created, for the table view.
pub fn object_notes(phases: &[PhaseReport], color: bool) -> String {
    let mut out = Vec::new();
    for phase in phases {
        for object in &phase.objects {
            if let Some(note) = object_note(object, color) {
                out.push(format!("  {} {note}", qualified_name(phase, object)));
            }
        }
    }
    out.join("\n")
}

fn qualified_name(phase: &PhaseReport, object: &ObjectReport) -> String {
    match object.subtype {
        Some(ref sub) => format!("{}{sub}/{}", phase.phase, object.name),
        None => format!("{} {}", phase.phase, object.name),
    }
}

fn object_note(object: &ObjectReport, color: bool) -> Option<String> {
    let (label, detail) = match object.outcome {
        ObjectOutcome::Created if object.unmapped => ("unmapped", "submitted without rewriting"),
        ObjectOutcome::Created => return None,
        ObjectOutcome::Duplicate { ref details } => ("duplicate", details.as_str()),
        ObjectOutcome::Skipped { ref reason } => ("skipped", reason.as_str()),
        ObjectOutcome::Failed { ref error } => ("failed", error.as_str()),
    };
    let label = match (color, &object.outcome) {
        (false, _) => label.to_owned(),
        (true, ObjectOutcome::Failed { .. }) => label.red().to_string(),
        (true, _) => label.yellow().to_string(),
    };
    Some(format!("{label}: {detail}"))
}

#[derive(Tabled)]
pub struct ExportRow {
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Objects")]
    objects: usize,
    #[tabled(rename = "Missing subtypes")]
    missing: String,
}

impl From<&ExportedPhase> for ExportRow {
    fn from(p: &ExportedPhase) -> Self {
        Self {
            phase: p.phase.to_string(),
            objects: p.objects,
            missing: p.missing_subtypes.join(" "),
        }
    }
}

#[derive(Tabled)]
pub struct DeleteRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Deleted")]
    deleted: usize,
    #[tabled(rename = "Refused")]
    refused: usize,
}

impl From<&DeleteReport> for DeleteRow {
    fn from(d: &DeleteReport) -> Self {
        Self {
            target: d.target.clone(),
            deleted: d.deleted,
            refused: d.refused.len(),
        }
    }
}
