//! Boundaries the reconciler drives.
//!
//! The cart and its cache are owned elsewhere. These traits are what the
//! reconciler needs from them; the BigCommerce adapters implement the cart
//! side and the hosting layer supplies cache invalidation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cart::CartSnapshot;
use crate::error::CommerceError;
use crate::ids::{CartId, LineItemId};

/// Cache tag covering every cached view of the cart.
pub const CART_CACHE_TAG: &str = "cart";

/// Whether a removal should trigger a fresh reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Revalidation {
    /// Customer-initiated; reconcile afterwards.
    #[default]
    Run,
    /// Issued by a reconciliation pass; must not re-enter it.
    Skip,
}

/// A request to delete one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLineItem {
    pub cart_id: CartId,
    pub line_item_id: LineItemId,
    pub revalidation: Revalidation,
}

impl RemoveLineItem {
    /// A customer-initiated removal.
    pub fn new(cart_id: CartId, line_item_id: LineItemId) -> Self {
        Self {
            cart_id,
            line_item_id,
            revalidation: Revalidation::Run,
        }
    }

    /// Mark this removal as issued by reconciliation.
    pub fn skip_revalidation(mut self) -> Self {
        self.revalidation = Revalidation::Skip;
        self
    }
}

/// Result of a successful removal.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// The cart still exists, as the platform returned it after the removal.
    CartUpdated(CartSnapshot),
    /// The removed item was the last one and the platform deleted the cart.
    CartDeleted,
}

impl RemovalOutcome {
    /// Check if the cart is gone.
    pub fn is_cart_deleted(&self) -> bool {
        matches!(self, RemovalOutcome::CartDeleted)
    }
}

/// Reads carts.
#[async_trait]
pub trait CartReader: Send + Sync {
    /// Fetch a cart. `Ok(None)` when the cart does not exist.
    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>, CommerceError>;
}

/// Deletes cart line items.
#[async_trait]
pub trait LineItemRemover: Send + Sync {
    /// Remove one line item.
    async fn remove_line_item(&self, request: RemoveLineItem)
        -> Result<RemovalOutcome, CommerceError>;
}

/// Invalidates tagged cache entries.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate every entry carrying `tag`. Returns how many were dropped.
    async fn invalidate_tag(&self, tag: &str) -> Result<u64, CommerceError>;
}

/// Invalidator for hosts without a tagged cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoopCacheInvalidator {
    async fn invalidate_tag(&self, _tag: &str) -> Result<u64, CommerceError> {
        Ok(0)
    }
}
