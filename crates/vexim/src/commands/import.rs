//! `vexim import`: replay an archive onto the controller.

use vexim_core::{Archive, Controller, ImportScope, UnresolvedPolicy};

use crate::cli::{GlobalOpts, ImportArgs, ImportScopeArg, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

impl From<ImportScopeArg> for ImportScope {
    fn from(arg: ImportScopeArg) -> Self {
        match arg {
            ImportScopeArg::All => Self::All,
            ImportScopeArg::Policies => Self::Policies,
            ImportScopeArg::Templates => Self::Templates,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: ImportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = util::archive_path(args.archive);
    let archive = Archive::read(&path)?;
    tracing::info!(path = %path.display(), documents = archive.len(), "archive loaded");

    let policy = if args.skip_unresolved {
        UnresolvedPolicy::Skip
    } else {
        UnresolvedPolicy::Abort
    };
    let report = controller
        .orchestrator()
        .on_unresolved(policy)
        .import(&archive, args.scope.into())
        .await?;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &report.phases,
        |p| output::phase_row(p, color),
        output::phase_line,
    );
    output::print_output(&out, global.quiet);

    if matches!(global.output, OutputFormat::Table) {
        output::print_output(&output::object_notes(&report.phases, color), global.quiet);
    }

    if report.has_failures() {
        let failed = report.phases.iter().map(vexim_core::PhaseReport::failed).sum();
        return Err(CliError::ImportFailed { failed });
    }
    Ok(())
}
