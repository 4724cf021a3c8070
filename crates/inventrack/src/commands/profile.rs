//! Profile command handlers.

use bytes::Bytes;
use bytesize::ByteSize;

use inventrack_core::{EditOutcome, EntityId, EntityKind, ImageFile, Profile};

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

fn detail(p: &Profile) -> String {
    output::detail_lines(&[
        ("User", p.user_id.to_string()),
        ("Name", output::or_dash(p.full_name.as_deref())),
        ("Email", output::or_dash(p.email.as_deref())),
        ("Phone", output::or_dash(p.phone.as_deref())),
        ("Company", output::or_dash(p.company.as_deref())),
        ("Avatar", output::or_dash(p.avatar_url.as_deref())),
    ])
}

fn render(global: &GlobalOpts, profile: &Profile) -> Result<(), CliError> {
    let out = output::render_single(&global.output, profile, detail, |p| p.user_id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Sign in, refresh the profile store, and return the signed-in user's id.
async fn fetch(ctx: &Context) -> Result<EntityId, CliError> {
    let user = ctx.sign_in().await?;
    let user_id = EntityId::from(user.id.as_str());
    util::check_load(ctx.inventory.profile().load(&user_id).await?)?;
    Ok(user_id)
}

fn current(ctx: &Context, user_id: &EntityId) -> Result<Profile, CliError> {
    ctx.inventory
        .profile()
        .profile()
        .ok_or_else(|| util::not_found(EntityKind::Profile, &user_id.to_string()))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: ProfileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProfileCommand::Show { cached } => {
            let profile = if cached {
                let snap = ctx.inventory.profile().snapshot();
                util::report_cached(&*snap, global.quiet);
                match snap.data.clone() {
                    Some(profile) => profile,
                    None => return Ok(()),
                }
            } else {
                let user_id = fetch(ctx).await?;
                current(ctx, &user_id)?
            };
            render(global, &profile)
        }

        ProfileCommand::Edit(edit) => {
            let user_id = fetch(ctx).await?;
            let original = current(ctx, &user_id)?;
            let submitted = util::submitted_fields(&original, &edit)?;
            match ctx.inventory.edit_profile(&original, &submitted).await? {
                EditOutcome::NoChanges => {
                    output::print_status("No changes to save", global.quiet);
                    Ok(())
                }
                EditOutcome::Updated { patch, record } => {
                    output::print_status(
                        &format!("Profile updated ({})", util::field_list(&patch)),
                        global.quiet,
                    );
                    render(global, &record)
                }
            }
        }

        ProfileCommand::UploadImage { path, content_type } => {
            let bytes = tokio::fs::read(&path).await?;
            let size = ByteSize::b(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
            let image = ImageFile {
                file_name: path
                    .file_name()
                    .map_or_else(|| "avatar".into(), |n| n.to_string_lossy().into_owned()),
                content_type: content_type
                    .unwrap_or_else(|| util::guess_content_type(&path).to_owned()),
                bytes: Bytes::from(bytes),
            };

            fetch(ctx).await?;
            let url = ctx.inventory.upload_avatar(image).await?;
            output::print_status(&format!("Uploaded {size} avatar"), global.quiet);
            output::print_output(&url, global.quiet);
            Ok(())
        }
    }
}
