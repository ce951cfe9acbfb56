//! `vexim clean`: delete configuration from the controller.

use std::fmt::Write as _;

use vexim_core::{CleanReport, CleanScope, Controller};

use crate::cli::{CleanArgs, CleanScopeArg, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, DeleteRow};

use super::util;

impl From<CleanScopeArg> for CleanScope {
    fn from(arg: CleanScopeArg) -> Self {
        match arg {
            CleanScopeArg::All => Self::All,
            CleanScopeArg::Policies => Self::Policies,
            CleanScopeArg::Templates => Self::Templates,
            CleanScopeArg::Devices => Self::Devices,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: CleanArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let scope = CleanScope::from(args.scope);
    let lifecycle = controller.lifecycle();

    if lifecycle.has_attached_devices().await? {
        let proceed = util::confirm(
            "ATTENTION: devices are attached to device templates. They will be \
             moved back to CLI mode. Continue?",
            &format!("clean {scope}"),
            global.yes,
        )?;
        if !proceed {
            return Err(CliError::Aborted);
        }
    }

    let report = lifecycle.clean(scope).await?;
    let out = output::render_single(&global.output, &report, detail, |r| {
        r.deletes
            .iter()
            .map(|d| format!("{}\t{}", d.target, d.deleted))
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(report: &CleanReport) -> String {
    let mut out = String::new();
    if report.deactivated > 0 {
        let _ = writeln!(out, "Deactivated {} vSmart policies", report.deactivated);
    }
    if report.detached > 0 {
        let _ = writeln!(out, "Detached {} devices", report.detached);
    }
    if report.certificates > 0 {
        let _ = writeln!(out, "Invalidated {} certificates", report.certificates);
    }
    if report.pushed {
        let _ = writeln!(out, "Pushed certificate list to controllers");
    }
    let rows: Vec<DeleteRow> = report.deletes.iter().map(DeleteRow::from).collect();
    out.push_str(&tabled::Table::new(rows).with(tabled::settings::Style::rounded()).to_string());

    for delete in &report.deletes {
        for (id, reason) in &delete.refused {
            let _ = write!(out, "\n  {} {id} refused: {reason}", delete.target);
        }
    }
    out
}
