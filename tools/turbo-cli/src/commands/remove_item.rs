//! Remove-item command - remove a line item, then reconcile gifts.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use turbo_commerce::ids::{CartId, LineItemId};
use turbo_commerce::reconcile::RemovalOutcome;

use super::RemoveItemArgs;
use crate::context::Context;

/// Run the remove-item command.
pub async fn run(args: RemoveItemArgs, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let services = ctx.services()?;
    let cart_id = CartId::new(args.cart_id);
    let line_item_id = LineItemId::new(args.line_item_id);

    if !args.yes && !output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove line item {} from cart {}?", line_item_id, cart_id))
            .default(false)
            .interact()?;

        if !confirmed {
            output.info("Removal cancelled");
            return Ok(());
        }
    }

    let spinner = output.spinner(&format!("Removing line item {}...", line_item_id));
    let result = services.actions.remove_item(&cart_id, &line_item_id).await;
    spinner.finish_and_clear();
    let result = result.with_context(|| format!("Failed to remove line item {}", line_item_id))?;

    let cart_deleted = result.outcome.is_cart_deleted();

    if output.is_json() {
        output.json(&serde_json::json!({
            "cart_id": cart_id,
            "line_item_id": line_item_id,
            "cart_deleted": cart_deleted,
            "reconciliation": result.reconciliation,
        }));
        return Ok(());
    }

    match &result.outcome {
        RemovalOutcome::CartDeleted => {
            output.success("Line item removed; the cart is now empty and was deleted");
            return Ok(());
        }
        RemovalOutcome::CartUpdated(cart) => {
            output.success(&format!("Removed line item {}", line_item_id));
            output.debug(&format!("{} line item(s) remain", cart.line_items.len()));
        }
    }

    match result.reconciliation {
        Some(report) => {
            if let Some(message) = &report.message {
                output.info(message);
            }
            for id in &report.removed_gift_line_item_ids {
                output.list_item(&format!("removed gift {}", id));
            }
            if !report.failed_line_item_ids.is_empty() {
                bail!(
                    "{} gift line item(s) could not be removed",
                    report.failed_line_item_ids.len()
                );
            }
        }
        None => output.warn("Gift reconciliation did not complete; run `turbo reconcile` to retry"),
    }

    Ok(())
}
