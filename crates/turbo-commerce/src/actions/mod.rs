//! Cart actions that trigger gift reconciliation.
//!
//! Dependencies run one way: actions call the reconciler, the reconciler
//! calls the ports. Reconciliation here is always secondary to the mutation
//! that triggered it; its failures are logged and never fail the action.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn, Instrument};
use turbo_observability::{request_span, RequestId};

use crate::cart::LineItem;
use crate::error::CommerceError;
use crate::ids::{CartId, LineItemId, ProductId, VariantId};
use crate::reconcile::{
    CacheInvalidator, CartReader, GiftReconciler, LineItemRemover, NoopCacheInvalidator,
    ReconcileReport, RemovalOutcome, RemoveLineItem, Revalidation, CART_CACHE_TAG,
};

/// The gift a customer picked when a promotion offers several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftSelection {
    pub product_id: ProductId,
    /// When `None`, any variant of the product counts as selected.
    pub variant_id: Option<VariantId>,
}

impl GiftSelection {
    /// Check if a line item is the selected gift.
    pub fn matches(&self, item: &LineItem) -> bool {
        item.product_id == self.product_id
            && self
                .variant_id
                .map_or(true, |variant| item.variant_id == Some(variant))
    }
}

/// Result of a customer-initiated removal.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveItemResult {
    pub outcome: RemovalOutcome,
    /// The follow-up pass, when one ran and succeeded.
    pub reconciliation: Option<ReconcileReport>,
}

/// Result of pruning unselected gifts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub removed: Vec<LineItemId>,
    pub failed: Vec<LineItemId>,
    /// The follow-up pass. `None` when the cart was deleted or the pass failed.
    pub reconciliation: Option<ReconcileReport>,
}

/// Cart mutations that keep gifts reconciled.
pub struct CartActions {
    carts: Arc<dyn CartReader>,
    remover: Arc<dyn LineItemRemover>,
    cache: Arc<dyn CacheInvalidator>,
    reconciler: Arc<GiftReconciler>,
}

impl CartActions {
    /// Create actions over the cart ports and a reconciler.
    pub fn new(
        carts: Arc<dyn CartReader>,
        remover: Arc<dyn LineItemRemover>,
        reconciler: Arc<GiftReconciler>,
    ) -> Self {
        Self {
            carts,
            remover,
            cache: Arc::new(NoopCacheInvalidator),
            reconciler,
        }
    }

    /// Set the cache invalidated after mutations.
    pub fn with_cache_invalidator(mut self, cache: Arc<dyn CacheInvalidator>) -> Self {
        self.cache = cache;
        self
    }

    /// Remove a line item on the customer's behalf, then reconcile gifts.
    pub async fn remove_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<RemoveItemResult, CommerceError> {
        self.remove(RemoveLineItem::new(cart_id.clone(), line_item_id.clone()))
            .await
    }

    /// Remove a line item, reconciling afterwards unless the request skips it.
    ///
    /// No pass runs when the removal deleted the cart.
    pub async fn remove(&self, request: RemoveLineItem) -> Result<RemoveItemResult, CommerceError> {
        let span = request_span(&RequestId::generate(), "remove_line_item");
        self.run_remove(request).instrument(span).await
    }

    async fn run_remove(&self, request: RemoveLineItem) -> Result<RemoveItemResult, CommerceError> {
        let cart_id = request.cart_id.clone();
        let revalidation = request.revalidation;

        let outcome = self.remover.remove_line_item(request).await?;
        self.invalidate_cart_cache().await;

        let reconciliation = match (&outcome, revalidation) {
            (RemovalOutcome::CartDeleted, _) => {
                debug!(cart_id = %cart_id, "cart deleted by removal");
                None
            }
            (_, Revalidation::Skip) => None,
            (RemovalOutcome::CartUpdated(_), Revalidation::Run) => {
                self.after_cart_change(&cart_id).await
            }
        };

        Ok(RemoveItemResult {
            outcome,
            reconciliation,
        })
    }

    /// Best-effort pass after an add-to-cart or coupon change.
    ///
    /// Returns `None` when the pass failed; the failure is logged.
    pub async fn after_cart_change(&self, cart_id: &CartId) -> Option<ReconcileReport> {
        match self.reconciler.reconcile(cart_id).await {
            Ok(report) => {
                if !report.is_noop() {
                    info!(
                        cart_id = %cart_id,
                        removed = ?report.removed_gift_line_item_ids,
                        "gifts removed after cart change"
                    );
                }
                Some(report)
            }
            Err(e) => {
                warn!(cart_id = %cart_id, error = %e, "gift reconciliation failed");
                None
            }
        }
    }

    /// Remove gifts the customer did not pick.
    ///
    /// Applying a gift coupon adds every gift the promotion offers. This keeps
    /// the main product and the selected gift and removes every other
    /// zero-priced line, then runs one reconciliation pass.
    pub async fn prune_unselected_gifts(
        &self,
        cart_id: &CartId,
        main_product: ProductId,
        selection: GiftSelection,
    ) -> Result<PruneReport, CommerceError> {
        let span = request_span(&RequestId::generate(), "prune_unselected_gifts");
        self.run_prune(cart_id, main_product, selection)
            .instrument(span)
            .await
    }

    async fn run_prune(
        &self,
        cart_id: &CartId,
        main_product: ProductId,
        selection: GiftSelection,
    ) -> Result<PruneReport, CommerceError> {
        let Some(cart) = self.carts.get_cart(cart_id).await? else {
            return Err(CommerceError::CartNotFound(cart_id.clone()));
        };

        let unwanted: Vec<&LineItem> = cart
            .line_items
            .iter()
            .filter(|item| item.is_gift_candidate())
            .filter(|item| item.product_id != main_product && !selection.matches(item))
            .collect();

        let mut report = PruneReport::default();
        let mut cart_deleted = false;

        for item in unwanted {
            let request =
                RemoveLineItem::new(cart_id.clone(), item.id.clone()).skip_revalidation();
            match self.remover.remove_line_item(request).await {
                Ok(outcome) => {
                    info!(line_item_id = %item.id, name = %item.name, "unselected gift removed");
                    report.removed.push(item.id.clone());
                    if outcome.is_cart_deleted() {
                        cart_deleted = true;
                        break;
                    }
                }
                Err(e) => {
                    error!(line_item_id = %item.id, error = %e, "failed to remove unselected gift");
                    report.failed.push(item.id.clone());
                }
            }
        }

        if !report.removed.is_empty() {
            self.invalidate_cart_cache().await;
        }
        if !cart_deleted {
            report.reconciliation = self.after_cart_change(cart_id).await;
        }

        Ok(report)
    }

    async fn invalidate_cart_cache(&self) {
        if let Err(e) = self.cache.invalidate_tag(CART_CACHE_TAG).await {
            warn!(error = %e, tag = CART_CACHE_TAG, "cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    fn line(product: u64, variant: Option<u64>) -> LineItem {
        LineItem {
            id: LineItemId::new("l"),
            product_id: ProductId::new(product),
            variant_id: variant.map(VariantId::new),
            name: "Gift".to_string(),
            quantity: 1,
            extended_sale_price: Money::zero(Currency::USD),
        }
    }

    #[test]
    fn test_selection_without_variant_matches_any_variant() {
        let selection = GiftSelection {
            product_id: ProductId::new(200),
            variant_id: None,
        };
        assert!(selection.matches(&line(200, None)));
        assert!(selection.matches(&line(200, Some(5))));
        assert!(!selection.matches(&line(201, None)));
    }

    #[test]
    fn test_selection_with_variant_requires_match() {
        let selection = GiftSelection {
            product_id: ProductId::new(200),
            variant_id: Some(VariantId::new(5)),
        };
        assert!(selection.matches(&line(200, Some(5))));
        assert!(!selection.matches(&line(200, Some(6))));
        assert!(!selection.matches(&line(200, None)));
    }
}
