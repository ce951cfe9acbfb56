//! `vexim export`: read the controller's configuration into an archive.

use vexim_core::Controller;

use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, ExportRow};

use super::util;

pub async fn handle(
    controller: &Controller,
    args: ExportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = util::archive_path(args.archive);
    let export = controller.orchestrator().export().await?;
    export.archive.write(&path)?;

    let out = output::render_list(&global.output, &export.phases, |p| ExportRow::from(p), |p| {
        format!("{}\t{}", p.phase, p.objects)
    });
    output::print_output(&out, global.quiet);

    if !global.quiet {
        eprintln!(
            "✓ Wrote {} documents to {}",
            export.archive.len(),
            path.display()
        );
    }
    Ok(())
}
