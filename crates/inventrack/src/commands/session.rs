//! Session command handlers.

use dialoguer::Input;
use secrecy::SecretString;

use inventrack_core::SessionUser;

use crate::cli::{GlobalOpts, SessionArgs, SessionCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::Context;

fn detail(user: &SessionUser) -> String {
    output::detail_lines(&[
        ("User", user.id.clone()),
        ("Email", output::or_dash(user.email.as_deref())),
        ("Name", output::or_dash(user.full_name.as_deref())),
    ])
}

fn render(global: &GlobalOpts, user: &SessionUser) -> Result<(), CliError> {
    let out = output::render_single(&global.output, user, detail, |u| u.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Email from the flag, the profile, or an interactive prompt.
fn login_email(ctx: &Context, explicit: Option<String>) -> Result<String, CliError> {
    if let Some(email) = explicit
        .or_else(|| ctx.target.profile.email.clone())
        .or_else(|| std::env::var("INVENTRACK_EMAIL").ok())
    {
        return Ok(email);
    }
    Input::new()
        .with_prompt("Email")
        .interact_text()
        .map_err(CliError::prompt)
}

/// Password from the credential chain, or an interactive prompt.
fn login_password(ctx: &Context) -> Result<SecretString, CliError> {
    if let Ok(password) =
        inventrack_config::resolve_password(&ctx.target.profile, &ctx.target.profile_name)
    {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ").map_err(CliError::prompt)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: SessionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Login { email, save } => {
            let email = login_email(ctx, email)?;
            let password = login_password(ctx)?;
            let user = ctx.login(&email, &password).await?;

            if save {
                config::store_password(&ctx.target.profile_name, &password)?;
                output::print_status(
                    &format!(
                        "Password stored in system keyring for profile '{}'",
                        ctx.target.profile_name
                    ),
                    global.quiet,
                );
            }
            output::print_status("Signed in", global.quiet);
            render(global, &user)
        }

        SessionCommand::Logout => {
            ctx.inventory.logout().await?;
            output::print_status(
                &format!(
                    "Signed out; cached data for profile '{}' cleared",
                    ctx.target.profile_name
                ),
                global.quiet,
            );
            Ok(())
        }

        SessionCommand::Whoami => {
            let user = ctx.sign_in().await?;
            render(global, &user)
        }
    }
}
