//! Cart snapshot and line item classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::ids::{CartId, GiftKey, LineItemId, ProductId, VariantId};
use crate::money::{Currency, Money};

/// A cart as read from the platform at one instant.
///
/// Physical and digital items are flattened into `line_items`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSnapshot {
    /// Platform cart identifier.
    pub id: CartId,
    /// Cart currency.
    pub currency: Currency,
    /// Items in the cart.
    pub line_items: Vec<LineItem>,
}

/// A line item in a cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Cart-scoped line item identifier.
    pub id: LineItemId,
    /// Product this line is for.
    pub product_id: ProductId,
    /// Variant, when the platform reports one.
    pub variant_id: Option<VariantId>,
    /// Product name at time of read.
    pub name: String,
    /// Quantity.
    pub quantity: u32,
    /// Line total after discounts.
    pub extended_sale_price: Money,
}

impl LineItem {
    /// A zero-priced line is presumed to be a promotional gift.
    pub fn is_gift_candidate(&self) -> bool {
        self.extended_sale_price.is_zero()
    }

    /// The gift identity of this line.
    pub fn gift_key(&self) -> GiftKey {
        GiftKey::new(self.product_id, self.variant_id)
    }
}

/// Line items split by price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartPartition {
    /// Paid items that count toward promotion thresholds.
    pub qualifying: Vec<LineItem>,
    /// Zero-priced items pending entitlement checks.
    pub gift_candidates: Vec<LineItem>,
}

impl CartPartition {
    /// Total paid quantity per product.
    pub fn qualifying_quantities(&self) -> BTreeMap<ProductId, u64> {
        let mut totals = BTreeMap::new();
        for item in &self.qualifying {
            *totals.entry(item.product_id).or_insert(0) += u64::from(item.quantity);
        }
        totals
    }
}

impl CartSnapshot {
    /// Create an empty snapshot.
    pub fn new(id: CartId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            line_items: Vec::new(),
        }
    }

    /// Check that every line can be classified.
    pub fn validate(&self) -> Result<(), CommerceError> {
        for item in &self.line_items {
            if item.quantity == 0 {
                return Err(CommerceError::MalformedCart(format!(
                    "line item {} has zero quantity",
                    item.id
                )));
            }
            if item.extended_sale_price.is_negative() {
                return Err(CommerceError::MalformedCart(format!(
                    "line item {} has negative price {}",
                    item.id, item.extended_sale_price
                )));
            }
        }
        Ok(())
    }

    /// Split line items into qualifying and gift-candidate sets.
    pub fn partition(&self) -> Result<CartPartition, CommerceError> {
        self.validate()?;

        let (gift_candidates, qualifying): (Vec<_>, Vec<_>) = self
            .line_items
            .iter()
            .cloned()
            .partition(LineItem::is_gift_candidate);

        Ok(CartPartition {
            qualifying,
            gift_candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, product: u64, quantity: u32, cents: i64) -> LineItem {
        LineItem {
            id: LineItemId::new(id),
            product_id: ProductId::new(product),
            variant_id: None,
            name: format!("Product {}", product),
            quantity,
            extended_sale_price: Money::new(cents, Currency::USD),
        }
    }

    fn cart(items: Vec<LineItem>) -> CartSnapshot {
        let mut cart = CartSnapshot::new(CartId::new("cart-1"), Currency::USD);
        cart.line_items = items;
        cart
    }

    #[test]
    fn test_partition_by_price() {
        let cart = cart(vec![
            item("a", 111, 2, 2000),
            item("b", 200, 1, 0),
            item("c", 112, 1, 500),
        ]);

        let parts = cart.partition().unwrap();
        assert_eq!(parts.qualifying.len(), 2);
        assert_eq!(parts.gift_candidates.len(), 1);
        assert_eq!(parts.gift_candidates[0].id.as_str(), "b");
    }

    #[test]
    fn test_qualifying_quantities_sum_per_product() {
        let cart = cart(vec![
            item("a", 111, 2, 2000),
            item("b", 111, 3, 3000),
            item("c", 112, 1, 500),
        ]);

        let totals = cart.partition().unwrap().qualifying_quantities();
        assert_eq!(totals.get(&ProductId::new(111)), Some(&5));
        assert_eq!(totals.get(&ProductId::new(112)), Some(&1));
    }

    #[test]
    fn test_zero_quantity_is_malformed() {
        let cart = cart(vec![item("a", 111, 0, 2000)]);
        assert!(matches!(
            cart.partition(),
            Err(CommerceError::MalformedCart(_))
        ));
    }

    #[test]
    fn test_negative_price_is_malformed() {
        let cart = cart(vec![item("a", 111, 1, -100)]);
        assert!(matches!(
            cart.validate(),
            Err(CommerceError::MalformedCart(_))
        ));
    }

    #[test]
    fn test_gift_key_uses_none_sentinel() {
        let mut gift = item("g", 200, 1, 0);
        assert_eq!(gift.gift_key().to_string(), "200-none");
        gift.variant_id = Some(VariantId::new(7));
        assert_eq!(gift.gift_key().to_string(), "200-7");
    }
}
