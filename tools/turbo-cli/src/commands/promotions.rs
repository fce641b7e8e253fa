//! Promotions command - show the gift promotions that apply to a product.

use anyhow::{bail, Result};
use turbo_commerce::ids::ProductId;
use turbo_commerce::promotion::PromotionCatalog;

use super::PromotionsArgs;
use crate::context::Context;
use crate::output::yes_no;

/// Run the promotions command.
pub async fn run(args: PromotionsArgs, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let services = ctx.services()?;
    let product_id = ProductId::new(args.product_id);

    let spinner = output.spinner(&format!("Looking up promotions for product {}...", product_id));
    let promotions = services.catalog.promotions_for_product(product_id).await;
    spinner.finish_and_clear();

    let Some(promotions) = promotions else {
        bail!("Promotion catalog unreachable for product {}", product_id);
    };

    if output.is_json() {
        output.json(&promotions);
        return Ok(());
    }

    if promotions.is_empty() {
        output.info(&format!("No gift promotions apply to product {}", product_id));
        return Ok(());
    }

    output.header(&format!("Gift promotions for product {}", product_id));
    for promotion in &promotions {
        println!();
        output.kv("Promotion", &format!("{} ({})", promotion.name, promotion.id));
        if let Some(display_name) = &promotion.display_name {
            output.kv("Display name", display_name);
        }
        if let Some(code) = &promotion.promo_code {
            output.kv("Code", code);
        }
        output.kv("Minimum quantity", &promotion.minimum_quantity.to_string());
        output.kv("Apply once", yes_no(promotion.apply_once));
        for gift in &promotion.gift_items {
            output.list_item(&format!("{} x {}", gift.quantity, gift.key()));
        }
    }

    output.debug(&format!("{} promotion(s) returned", promotions.len()));
    Ok(())
}
