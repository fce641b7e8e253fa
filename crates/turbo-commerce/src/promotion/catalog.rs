//! Promotion catalog port.

use async_trait::async_trait;

use crate::ids::ProductId;
use crate::promotion::Promotion;

/// Source of free-gift promotions for a paid product.
#[async_trait]
pub trait PromotionCatalog: Send + Sync {
    /// Enabled gift promotions that apply to `product_id`.
    ///
    /// Returns `None` when the catalog could not be read or returned an
    /// invalid payload, and `Some(vec![])` when nothing applies. Callers treat
    /// `None` as "no promotion applies" and never fail on it.
    async fn promotions_for_product(&self, product_id: ProductId) -> Option<Vec<Promotion>>;
}
