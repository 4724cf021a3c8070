//! Supplier command handlers.

use std::sync::Arc;

use tabled::Tabled;

use inventrack_core::{EditOutcome, EntityId, EntityKind, Supplier, SupplierDraft};

use crate::cli::{GlobalOpts, SupplierAddArgs, SuppliersArgs, SuppliersCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SupplierRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Contact")]
    contact: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
}

impl From<&Arc<Supplier>> for SupplierRow {
    fn from(s: &Arc<Supplier>) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            contact: output::or_dash(s.contact_name.as_deref()),
            email: output::or_dash(s.email.as_deref()),
            phone: output::or_dash(s.phone.as_deref()),
        }
    }
}

fn detail(s: &Supplier) -> String {
    output::detail_lines(&[
        ("ID", s.id.to_string()),
        ("Name", s.name.clone()),
        ("Contact", output::or_dash(s.contact_name.as_deref())),
        ("Email", output::or_dash(s.email.as_deref())),
        ("Phone", output::or_dash(s.phone.as_deref())),
        ("Address", output::or_dash(s.address.as_deref())),
    ])
}

fn draft_from_args(args: SupplierAddArgs) -> Result<SupplierDraft, CliError> {
    if let Some(ref path) = args.from_file {
        return Ok(serde_json::from_value(util::read_json_file(path)?)?);
    }
    Ok(SupplierDraft {
        name: args.name.unwrap_or_default(),
        contact_name: args.contact_name,
        email: args.email,
        phone: args.phone,
        address: args.address,
    })
}

async fn fetch(ctx: &Context) -> Result<(), CliError> {
    ctx.sign_in().await?;
    util::check_load(ctx.inventory.suppliers().load().await?)
}

fn find(ctx: &Context, id: &str) -> Result<Arc<Supplier>, CliError> {
    ctx.inventory
        .suppliers()
        .get(&EntityId::from(id))
        .ok_or_else(|| util::not_found(EntityKind::Supplier, id))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: SuppliersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SuppliersCommand::List(list) => {
            if list.cached {
                util::report_cached(&*ctx.inventory.suppliers().snapshot(), global.quiet);
            } else {
                fetch(ctx).await?;
            }
            let rows: Vec<Arc<Supplier>> = ctx
                .inventory
                .suppliers()
                .records()
                .into_iter()
                .filter(|s| util::matches_filter(&s.name, list.filter.as_deref()))
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                |s| SupplierRow::from(s),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SuppliersCommand::Get { id } => {
            fetch(ctx).await?;
            let supplier = find(ctx, &id)?;
            let out =
                output::render_single(&global.output, &*supplier, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SuppliersCommand::Add(add) => {
            let draft = draft_from_args(add)?;
            ctx.sign_in().await?;
            let created = ctx.inventory.create_supplier(&draft).await?;
            output::print_status(&format!("Supplier {} created", created.id), global.quiet);
            let out =
                output::render_single(&global.output, &*created, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SuppliersCommand::Edit { id, edit } => {
            fetch(ctx).await?;
            let original = find(ctx, &id)?;
            let submitted = util::submitted_fields(&*original, &edit)?;
            match ctx.inventory.edit_supplier(&original, &submitted).await? {
                EditOutcome::NoChanges => {
                    output::print_status("No changes to save", global.quiet);
                }
                EditOutcome::Updated { patch, record } => {
                    output::print_status(
                        &format!("Supplier {id} updated ({})", util::field_list(&patch)),
                        global.quiet,
                    );
                    let out =
                        output::render_single(&global.output, &record, detail, |s| s.id.to_string())?;
                    output::print_output(&out, global.quiet);
                }
            }
            Ok(())
        }

        SuppliersCommand::Delete { id } => {
            fetch(ctx).await?;
            let supplier = find(ctx, &id)?;
            if !util::confirm(&format!("Delete supplier '{}'?", supplier.name), global.yes)? {
                return Ok(());
            }
            ctx.inventory.delete_supplier(&supplier.id).await?;
            output::print_status(&format!("Supplier {id} deleted"), global.quiet);
            Ok(())
        }
    }
}
