//! `vexim users`: password changes and user creation.

use vexim_core::{Controller, NewUser};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: UsersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UsersCommand::Password { username } => {
            let password = util::prompt_new_password("New password")?;
            controller
                .lifecycle()
                .update_password(&username, &password)
                .await?;
            if !global.quiet {
                eprintln!("✓ Password updated for '{username}'");
            }
        }
        UsersCommand::Add {
            username,
            group,
            description,
        } => {
            let password = util::prompt_new_password("Password")?;
            let user = NewUser {
                group,
                description,
                username,
                password,
            };
            controller.lifecycle().add_user(&user).await?;
            if !global.quiet {
                eprintln!("✓ Created user '{}' in group '{}'", user.username, user.group);
            }
        }
    }
    Ok(())
}
