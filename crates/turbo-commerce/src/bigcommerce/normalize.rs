//! Turning promotion records into typed gift promotions.

use tracing::{debug, warn};

use crate::bigcommerce::wire::{PromotionRecord, PromotionRule, PromotionStatus};
use crate::ids::{ProductId, PromotionId, VariantId};
use crate::promotion::{GiftItem, Promotion};

/// Check if any rule of the record grants a gift.
pub fn has_gift_rule(record: &PromotionRecord) -> bool {
    record.rules.iter().any(|rule| rule.gift_item().is_some())
}

/// Check if a rule applies to a paid product.
///
/// A rule listing products applies only to those. A rule listing none
/// applies to every product as long as it grants a gift.
pub fn rule_applies(rule: &PromotionRule, product_id: ProductId) -> bool {
    let products = rule.condition_products();
    if products.is_empty() {
        rule.gift_item().is_some()
    } else {
        products.contains(&product_id.get())
    }
}

/// Check if a record is an enabled gift promotion for a paid product.
pub fn is_applicable(record: &PromotionRecord, product_id: ProductId) -> bool {
    if record.status != PromotionStatus::Enabled {
        debug!(promotion_id = record.id, status = ?record.status, "skipped, not enabled");
        return false;
    }
    if !has_gift_rule(record) {
        debug!(promotion_id = record.id, "skipped, no gift items");
        return false;
    }
    record.rules.iter().any(|rule| rule_applies(rule, product_id))
}

/// Build a typed promotion from a record.
///
/// Threshold and apply-once come from the first gift rule. Gifts come from
/// every gift rule in order. Returns `None` when no gift names a product.
pub fn normalize_promotion(record: &PromotionRecord) -> Option<Promotion> {
    let gift_rule = record.rules.iter().find(|rule| rule.gift_item().is_some())?;

    let gift_items: Vec<GiftItem> = record
        .rules
        .iter()
        .filter_map(PromotionRule::gift_item)
        .filter_map(|gift| match gift.product_id {
            Some(product_id) => Some(GiftItem {
                product_id: ProductId::new(product_id),
                // Variant 0 is the platform's "no variant".
                variant_id: gift.variant_id.filter(|&v| v != 0).map(VariantId::new),
                quantity: gift.quantity,
            }),
            None => {
                warn!(promotion_id = record.id, "gift item without product id dropped");
                None
            }
        })
        .collect();

    if gift_items.is_empty() {
        warn!(promotion_id = record.id, "promotion has no usable gift items, skipping");
        return None;
    }

    Some(Promotion {
        id: PromotionId::new(record.id),
        name: record.name.clone(),
        display_name: record.display_name.clone(),
        promo_code: record.display_name.clone(),
        minimum_quantity: gift_rule.minimum_quantity().unwrap_or(1).max(1),
        apply_once: gift_rule.apply_once.unwrap_or(false),
        gift_items,
    })
}

/// Typed promotions applicable to a paid product, paired with their records.
pub fn select_for_product(
    records: &[PromotionRecord],
    product_id: ProductId,
) -> Vec<(&PromotionRecord, Promotion)> {
    records
        .iter()
        .filter(|record| is_applicable(record, product_id))
        .filter_map(|record| normalize_promotion(record).map(|promo| (record, promo)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigcommerce::wire::PromotionsPage;

    fn records(json: &str) -> Vec<PromotionRecord> {
        serde_json::from_str::<PromotionsPage>(json).unwrap().data
    }

    const CATALOG: &str = r#"{"data": [
        {"id": 1, "name": "Targeted", "status": "ENABLED", "display_name": "Free mug",
         "rules": [{"action": {"gift_item": {"product_id": 200, "variant_id": 7, "quantity": 1}},
                    "apply_once": true,
                    "condition": {"cart": {"items": {"products": [111]}, "minimum_quantity": 3}}}]},
        {"id": 2, "name": "Broad", "status": "ENABLED",
         "rules": [{"action": {"gift_item": {"product_id": 300, "quantity": 1}}}]},
        {"id": 3, "name": "Disabled", "status": "DISABLED",
         "rules": [{"action": {"gift_item": {"product_id": 400, "quantity": 1}}}]},
        {"id": 4, "name": "Discount only", "status": "ENABLED",
         "rules": [{"condition": {"cart": {"items": {"products": [111]}}}}]},
        {"id": 5, "name": "Other product", "status": "ENABLED",
         "rules": [{"action": {"gift_item": {"product_id": 500, "quantity": 1}},
                    "condition": {"cart": {"items": {"products": [999]}}}}]}
    ]}"#;

    #[test]
    fn test_select_for_listed_product() {
        let records = records(CATALOG);
        let ids: Vec<u64> = select_for_product(&records, ProductId::new(111))
            .iter()
            .map(|(_, promo)| promo.id.get())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_broad_promotion_applies_to_any_product() {
        let records = records(CATALOG);
        let ids: Vec<u64> = select_for_product(&records, ProductId::new(42))
            .iter()
            .map(|(_, promo)| promo.id.get())
            .collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_normalized_fields() {
        let records = records(CATALOG);
        let promo = normalize_promotion(&records[0]).unwrap();
        assert_eq!(promo.minimum_quantity, 3);
        assert!(promo.apply_once);
        assert_eq!(promo.promo_code.as_deref(), Some("Free mug"));
        assert_eq!(promo.gift_items[0].variant_id, Some(VariantId::new(7)));

        let broad = normalize_promotion(&records[1]).unwrap();
        assert_eq!(broad.minimum_quantity, 1);
        assert!(!broad.apply_once);
        assert_eq!(broad.gift_items[0].variant_id, None);
    }

    #[test]
    fn test_zero_minimum_clamped() {
        let records = records(
            r#"{"data": [{"id": 9, "name": "Zero", "status": "ENABLED",
                "rules": [{"action": {"gift_item": {"product_id": 1, "quantity": 1}},
                           "condition": {"cart": {"minimum_quantity": 0}}}]}]}"#,
        );
        assert_eq!(normalize_promotion(&records[0]).unwrap().minimum_quantity, 1);
    }

    #[test]
    fn test_gift_without_product_dropped() {
        let records = records(
            r#"{"data": [{"id": 9, "name": "Bad gift", "status": "ENABLED",
                "rules": [{"action": {"gift_item": {"quantity": 1}}}]}]}"#,
        );
        assert!(normalize_promotion(&records[0]).is_none());
        assert!(select_for_product(&records, ProductId::new(1)).is_empty());
    }
}
