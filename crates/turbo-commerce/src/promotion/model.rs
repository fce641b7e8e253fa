//! Normalized free-gift promotion types.

use serde::{Deserialize, Serialize};

use crate::ids::{GiftKey, ProductId, PromotionId, VariantId};

/// A gift granted by a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftItem {
    /// Gift product.
    pub product_id: ProductId,
    /// Pinned variant; `None` grants any variant.
    pub variant_id: Option<VariantId>,
    /// Units granted per activation.
    pub quantity: u32,
}

impl GiftItem {
    /// The entitlement key for this gift.
    pub fn key(&self) -> GiftKey {
        GiftKey::new(self.product_id, self.variant_id)
    }
}

/// An enabled promotion that grants at least one free gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Platform promotion ID.
    pub id: PromotionId,
    /// Internal promotion name.
    pub name: String,
    /// Customer-facing name.
    pub display_name: Option<String>,
    /// Code or label shown to the customer.
    pub promo_code: Option<String>,
    /// Paid units needed per activation. Always at least 1.
    pub minimum_quantity: u32,
    /// Grant at most one activation per cart.
    pub apply_once: bool,
    /// Gifts granted per activation, in rule order.
    pub gift_items: Vec<GiftItem>,
}

impl Promotion {
    /// Create a promotion with a single gift.
    pub fn single_gift(
        id: PromotionId,
        name: impl Into<String>,
        minimum_quantity: u32,
        apply_once: bool,
        gift: GiftItem,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: None,
            promo_code: None,
            minimum_quantity: minimum_quantity.max(1),
            apply_once,
            gift_items: vec![gift],
        }
    }
}
