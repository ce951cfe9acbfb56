// ── Run reports ──
//
// Serializable summaries of import, export and clean runs. The CLI renders
// them as tables or dumps them as JSON/YAML.

use serde::Serialize;

use crate::model::Phase;

/// What happened to one archived object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObjectOutcome {
    Created,
    /// The controller already had an object with this name.
    Duplicate { details: String },
    /// Not importable (unsupported policy or config type).
    Skipped { reason: String },
    /// Rejected or unresolvable, recorded instead of aborting the run.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectReport {
    pub subtype: Option<String>,
    pub name: String,
    pub outcome: ObjectOutcome,
    /// Submitted without reference rewriting (no reference table for the
    /// subtype).
    pub unmapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub objects: Vec<ObjectReport>,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            objects: Vec::new(),
        }
    }

    pub fn push(&mut self, object: ObjectReport) {
        self.objects.push(object);
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, ObjectOutcome::Created))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, ObjectOutcome::Duplicate { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ObjectOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ObjectOutcome::Failed { .. }))
    }

    pub fn unmapped(&self) -> usize {
        self.objects.iter().filter(|o| o.unmapped).count()
    }

    fn count(&self, pred: impl Fn(&ObjectOutcome) -> bool) -> usize {
        self.objects.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Result of a full import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub phases: Vec<PhaseReport>,
}

impl ImportReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn has_failures(&self) -> bool {
        self.phases.iter().any(|p| p.failed() > 0)
    }
}

/// Per-phase export counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedPhase {
    pub phase: Phase,
    pub objects: usize,
    /// Subtypes the controller does not offer.
    pub missing_subtypes: Vec<String>,
}

/// Outcome of deleting every object of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub target: String,
    pub deleted: usize,
    /// `(id, controller diagnostic)` for objects the controller refused to
    /// delete (factory defaults, read-only lists).
    pub refused: Vec<(String, String)>,
}
