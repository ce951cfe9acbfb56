//! Device and policy lifecycle commands: certificates, push, template
//! detach, policy deactivation.

use vexim_core::{Controller, Validity};

use crate::cli::{
    CertificatesArgs, CertificatesCommand, GlobalOpts, PoliciesArgs, PoliciesCommand,
    TemplatesArgs, TemplatesCommand,
};
use crate::error::CliError;

use super::util;

fn report(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("✓ {message}");
    }
}

pub async fn certificates(
    controller: &Controller,
    args: CertificatesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let validity = match args.command {
        CertificatesCommand::Validate => Validity::Valid,
        CertificatesCommand::Invalidate => {
            if !util::confirm(
                "Invalidate every vEdge certificate?",
                "certificates invalidate",
                global.yes,
            )? {
                return Err(CliError::Aborted);
            }
            Validity::Invalid
        }
    };
    let count = controller
        .lifecycle()
        .set_certificate_validity(validity)
        .await?;
    report(global, &format!("Marked {count} certificates {validity}"));
    Ok(())
}

pub async fn push(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.lifecycle().push_to_controllers().await?;
    report(global, "Pushed certificate list to controllers");
    Ok(())
}

pub async fn templates(
    controller: &Controller,
    args: TemplatesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TemplatesCommand::Detach => {
            let count = controller.lifecycle().detach_device_templates().await?;
            report(global, &format!("Detached {count} devices"));
        }
    }
    Ok(())
}

pub async fn policies(
    controller: &Controller,
    args: PoliciesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PoliciesCommand::Deactivate => {
            let count = controller.lifecycle().deactivate_policies().await?;
            report(global, &format!("Deactivated {count} vSmart policies"));
        }
    }
    Ok(())
}
