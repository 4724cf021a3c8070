//! Product command handlers.

use std::sync::Arc;

use tabled::Tabled;

use inventrack_core::{EditOutcome, EntityId, EntityKind, Product, ProductDraft};

use crate::cli::{GlobalOpts, ProductAddArgs, ProductsArgs, ProductsCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Store")]
    store: u32,
    #[tabled(rename = "Warehouse")]
    warehouse: u32,
    #[tabled(rename = "Stock")]
    stock: String,
}

impl ProductRow {
    fn new(p: &Product, color: bool) -> Self {
        let stock = if p.needs_reorder() {
            output::warn_marker("LOW", color)
        } else {
            "ok".into()
        };
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            category: output::or_dash(p.category.as_deref()),
            price: format!("{:.2}", p.unit_price),
            store: p.store_quantity,
            warehouse: p.warehouse_quantity,
            stock,
        }
    }
}

fn detail(p: &Product) -> String {
    output::detail_lines(&[
        ("ID", p.id.to_string()),
        ("Name", p.name.clone()),
        ("Category", output::or_dash(p.category.as_deref())),
        ("Description", output::or_dash(p.description.as_deref())),
        (
            "Supplier",
            p.supplier_id
                .as_ref()
                .map_or_else(|| "-".into(), ToString::to_string),
        ),
        ("Unit cost", format!("{:.2}", p.unit_cost)),
        ("Unit price", format!("{:.2}", p.unit_price)),
        ("Store qty", p.store_quantity.to_string()),
        ("Warehouse qty", p.warehouse_quantity.to_string()),
        ("Reorder at", p.reorder_level.to_string()),
        (
            "Stock value",
            format!(
                "{:.2}",
                p.stock_value.unwrap_or_else(|| p.computed_stock_value())
            ),
        ),
    ])
}

fn draft_from_args(args: ProductAddArgs) -> Result<ProductDraft, CliError> {
    if let Some(ref path) = args.from_file {
        return Ok(serde_json::from_value(util::read_json_file(path)?)?);
    }
    Ok(ProductDraft {
        name: args.name.unwrap_or_default(),
        category: args.category,
        description: args.description,
        supplier_id: args.supplier.map(EntityId::from),
        unit_cost: args.unit_cost,
        unit_price: args.unit_price,
        store_quantity: args.store_qty,
        warehouse_quantity: args.warehouse_qty,
        reorder_level: args.reorder_level,
    })
}

/// Sign in and refresh the product store.
async fn fetch(ctx: &Context) -> Result<(), CliError> {
    ctx.sign_in().await?;
    util::check_load(ctx.inventory.products().load().await?)
}

fn find(ctx: &Context, id: &str) -> Result<Arc<Product>, CliError> {
    ctx.inventory
        .products()
        .get(&EntityId::from(id))
        .ok_or_else(|| util::not_found(EntityKind::Product, id))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: ProductsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        ProductsCommand::List { list, low_stock } => {
            if list.cached {
                util::report_cached(&*ctx.inventory.products().snapshot(), global.quiet);
            } else {
                fetch(ctx).await?;
            }
            let rows: Vec<Arc<Product>> = ctx
                .inventory
                .products()
                .records()
                .into_iter()
                .filter(|p| util::matches_filter(&p.name, list.filter.as_deref()))
                .filter(|p| !low_stock || p.needs_reorder())
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                |p| ProductRow::new(p, color),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Get { id } => {
            fetch(ctx).await?;
            let product = find(ctx, &id)?;
            let out = output::render_single(
                &global.output,
                &*product,
                detail,
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Add(add) => {
            let draft = draft_from_args(add)?;
            ctx.sign_in().await?;
            let created = ctx.inventory.create_product(&draft).await?;
            output::print_status(&format!("Product {} created", created.id), global.quiet);
            let out = output::render_single(
                &global.output,
                &*created,
                detail,
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Edit { id, edit } => {
            fetch(ctx).await?;
            let original = find(ctx, &id)?;
            let submitted = util::submitted_fields(&*original, &edit)?;
            match ctx.inventory.edit_product(&original, &submitted).await? {
                EditOutcome::NoChanges => {
                    output::print_status("No changes to save", global.quiet);
                }
                EditOutcome::Updated { patch, record } => {
                    output::print_status(
                        &format!("Product {id} updated ({})", util::field_list(&patch)),
                        global.quiet,
                    );
                    let out = output::render_single(
                        &global.output,
                        &record,
                        detail,
                        |p| p.id.to_string(),
                    )?;
                    output::print_output(&out, global.quiet);
                }
            }
            Ok(())
        }

        ProductsCommand::Delete { id } => {
            fetch(ctx).await?;
            let product = find(ctx, &id)?;
            if !util::confirm(&format!("Delete product '{}'?", product.name), global.yes)? {
                return Ok(());
            }
            ctx.inventory.delete_product(&product.id).await?;
            output::print_status(&format!("Product {id} deleted"), global.quiet);
            Ok(())
        }
    }
}
