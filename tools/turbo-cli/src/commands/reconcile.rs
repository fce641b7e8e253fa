//! Reconcile command - run one gift reconciliation pass on a cart.

use anyhow::{Context as _, Result};
use turbo_commerce::ids::CartId;

use super::ReconcileArgs;
use crate::context::Context;
use crate::output::decision_badge;

/// Run the reconcile command.
pub async fn run(args: ReconcileArgs, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let services = ctx.services()?;
    let cart_id = CartId::new(args.cart_id);

    let spinner = output.spinner(&format!("Reconciling gifts in cart {}...", cart_id));
    let report = services.reconciler.reconcile(&cart_id).await;
    spinner.finish_and_clear();
    let report = report.with_context(|| format!("Reconciliation failed for cart {}", cart_id))?;

    if output.is_json() {
        output.json(&report);
        return Ok(());
    }

    if report.decisions.is_empty() {
        output.info("No free gifts in cart");
        return Ok(());
    }

    output.header(&format!("Gift lines in cart {}", cart_id));
    let rows: Vec<Vec<String>> = report
        .decisions
        .iter()
        .map(|check| {
            vec![
                check.line_item_id.to_string(),
                check.gift_key.to_string(),
                check.quantity.to_string(),
                check.allowed.to_string(),
                decision_badge(check.decision),
            ]
        })
        .collect();
    output.table(&["LINE ITEM", "GIFT", "QTY", "ALLOWED", "DECISION"], &rows);
    println!();

    for id in &report.failed_line_item_ids {
        output.warn(&format!("Could not remove line item {}", id));
    }
    if report.cart_deleted {
        output.info("Removing the last gift emptied the cart; it was deleted");
    }

    match &report.message {
        Some(message) => output.success(message),
        None => output.success("All free gifts are entitled"),
    }
    Ok(())
}
