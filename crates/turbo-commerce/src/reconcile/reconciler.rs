//! Gift reconciliation pass.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn, Instrument};
use turbo_observability::RequestId;

use crate::error::CommerceError;
use crate::ids::{CartId, GiftKey, LineItemId, ProductId};
use crate::promotion::{calculate_entitlement, dedupe_promotions, Promotion, PromotionCatalog};
use crate::reconcile::ports::{
    CacheInvalidator, CartReader, LineItemRemover, NoopCacheInvalidator, RemoveLineItem,
    CART_CACHE_TAG,
};

/// Default bound on each outbound call made during a pass.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Reconciler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Bound on each cart load, promotion lookup, and removal.
    #[serde(with = "turbo_data::millis", default = "default_call_timeout")]
    pub call_timeout: Duration,
}

fn default_call_timeout() -> Duration {
    DEFAULT_CALL_TIMEOUT
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// What a pass decided for one gift candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftDecision {
    /// Within entitlement.
    Keep,
    /// Nothing grants this gift.
    RemoveUnentitled,
    /// More units than granted. The whole line is removed.
    RemoveExcess,
}

impl GiftDecision {
    /// Decide for a line holding `quantity` units of a gift allowed `allowed` times.
    pub fn for_quantity(quantity: u32, allowed: u64) -> Self {
        if allowed == 0 {
            GiftDecision::RemoveUnentitled
        } else if u64::from(quantity) > allowed {
            GiftDecision::RemoveExcess
        } else {
            GiftDecision::Keep
        }
    }

    /// Check if the line must go.
    pub fn is_removal(&self) -> bool {
        !matches!(self, GiftDecision::Keep)
    }
}

/// One gift candidate and the decision made for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftCheck {
    pub line_item_id: LineItemId,
    pub gift_key: GiftKey,
    pub quantity: u32,
    pub allowed: u64,
    pub decision: GiftDecision,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Gift lines actually removed.
    pub removed_gift_line_item_ids: Vec<LineItemId>,
    /// Gift lines whose removal failed or timed out.
    pub failed_line_item_ids: Vec<LineItemId>,
    /// Decision per gift candidate, in cart order.
    pub decisions: Vec<GiftCheck>,
    /// Customer-facing notice, present when something was removed.
    pub message: Option<String>,
    /// Set when a removal emptied and deleted the cart.
    pub cart_deleted: bool,
}

impl ReconcileReport {
    /// A pass that had nothing to do.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of gift lines removed.
    pub fn removed_count(&self) -> usize {
        self.removed_gift_line_item_ids.len()
    }

    /// Check if nothing was removed.
    pub fn is_noop(&self) -> bool {
        self.removed_gift_line_item_ids.is_empty()
    }
}

/// Notice shown to the customer after removals.
pub fn removal_message(removed: usize, no_promotions: bool) -> Option<String> {
    match (removed, no_promotions) {
        (0, _) => None,
        (_, true) => Some("Free gifts removed - qualifying products no longer in cart".to_string()),
        (1, false) => Some("1 free gift removed due to cart changes".to_string()),
        (n, false) => Some(format!("{} free gifts removed due to cart changes", n)),
    }
}

/// Keeps a cart's zero-priced gift lines consistent with its entitlement.
///
/// Every removal it issues carries [`Revalidation::Skip`], so a pass never
/// triggers another pass.
///
/// [`Revalidation::Skip`]: crate::reconcile::Revalidation::Skip
pub struct GiftReconciler {
    carts: Arc<dyn CartReader>,
    remover: Arc<dyn LineItemRemover>,
    catalog: Arc<dyn PromotionCatalog>,
    cache: Arc<dyn CacheInvalidator>,
    config: ReconcilerConfig,
}

impl GiftReconciler {
    /// Create a reconciler with no cache invalidation and default timeouts.
    pub fn new(
        carts: Arc<dyn CartReader>,
        remover: Arc<dyn LineItemRemover>,
        catalog: Arc<dyn PromotionCatalog>,
    ) -> Self {
        Self {
            carts,
            remover,
            catalog,
            cache: Arc::new(NoopCacheInvalidator),
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the cache invalidated after removals.
    pub fn with_cache_invalidator(mut self, cache: Arc<dyn CacheInvalidator>) -> Self {
        self.cache = cache;
        self
    }

    /// Override reconciler settings.
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one reconciliation pass on a cart.
    ///
    /// A missing cart is a no-op. Promotion lookup failures and removal
    /// failures degrade the pass; only a cart that cannot be loaded or
    /// classified is an error.
    pub async fn reconcile(&self, cart_id: &CartId) -> Result<ReconcileReport, CommerceError> {
        let request_id = RequestId::generate();
        let span = tracing::info_span!("gift_reconcile", cart_id = %cart_id, request_id = %request_id);
        self.run_pass(cart_id).instrument(span).await
    }

    async fn run_pass(&self, cart_id: &CartId) -> Result<ReconcileReport, CommerceError> {
        let timeout = self.config.call_timeout;

        let cart = tokio::time::timeout(timeout, self.carts.get_cart(cart_id))
            .await
            .map_err(|_| CommerceError::timeout("cart load", timeout))??;

        let Some(cart) = cart else {
            debug!("cart not found, nothing to reconcile");
            return Ok(ReconcileReport::empty());
        };

        let partition = cart.partition()?;
        if partition.gift_candidates.is_empty() {
            debug!(line_items = cart.line_items.len(), "no gift candidates");
            return Ok(ReconcileReport::empty());
        }

        let qualifying = partition.qualifying_quantities();
        debug!(
            gift_candidates = partition.gift_candidates.len(),
            qualifying_products = qualifying.len(),
            "cart partitioned"
        );

        let resolved = self.resolve_promotions(&qualifying).await;
        let no_promotions = dedupe_promotions(&resolved).is_empty();

        let decisions: Vec<GiftCheck> = if no_promotions {
            info!(
                gift_candidates = partition.gift_candidates.len(),
                "no active promotions, every gift is unentitled"
            );
            partition
                .gift_candidates
                .iter()
                .map(|item| GiftCheck {
                    line_item_id: item.id.clone(),
                    gift_key: item.gift_key(),
                    quantity: item.quantity,
                    allowed: 0,
                    decision: GiftDecision::RemoveUnentitled,
                })
                .collect()
        } else {
            let entitlement = calculate_entitlement(&qualifying, &resolved);
            partition
                .gift_candidates
                .iter()
                .map(|item| {
                    let gift_key = item.gift_key();
                    let allowed = entitlement.allowed(&gift_key);
                    let decision = GiftDecision::for_quantity(item.quantity, allowed);
                    debug!(
                        line_item_id = %item.id,
                        gift_key = %gift_key,
                        quantity = item.quantity,
                        allowed,
                        ?decision,
                        "gift checked"
                    );
                    GiftCheck {
                        line_item_id: item.id.clone(),
                        gift_key,
                        quantity: item.quantity,
                        allowed,
                        decision,
                    }
                })
                .collect()
        };

        let mut report = self.apply_removals(cart_id, decisions).await;

        if !report.removed_gift_line_item_ids.is_empty() {
            if let Err(e) = self.cache.invalidate_tag(CART_CACHE_TAG).await {
                warn!(error = %e, tag = CART_CACHE_TAG, "cache invalidation failed");
            }
        }

        report.message = removal_message(report.removed_count(), no_promotions);
        info!(
            removed = report.removed_count(),
            failed = report.failed_line_item_ids.len(),
            kept = report
                .decisions
                .iter()
                .filter(|check| !check.decision.is_removal())
                .count(),
            "gift reconciliation complete"
        );
        Ok(report)
    }

    /// Look up promotions for every paid product concurrently.
    ///
    /// Only successful lookups are returned; a failed or timed-out lookup
    /// leaves its product out.
    async fn resolve_promotions(
        &self,
        qualifying: &BTreeMap<ProductId, u64>,
    ) -> BTreeMap<ProductId, Vec<Promotion>> {
        let timeout = self.config.call_timeout;
        let lookups = qualifying.keys().map(|&product_id| async move {
            let result =
                tokio::time::timeout(timeout, self.catalog.promotions_for_product(product_id))
                    .await;
            (product_id, result)
        });

        let mut resolved = BTreeMap::new();
        for (product_id, result) in join_all(lookups).await {
            match result {
                Ok(Some(promotions)) => {
                    debug!(%product_id, count = promotions.len(), "promotions resolved");
                    resolved.insert(product_id, promotions);
                }
                Ok(None) => {
                    warn!(%product_id, "promotion lookup failed, treating as no promotions");
                }
                Err(_) => {
                    warn!(
                        %product_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "promotion lookup timed out, treating as no promotions"
                    );
                }
            }
        }
        resolved
    }

    /// Remove every line marked for removal, one at a time.
    async fn apply_removals(&self, cart_id: &CartId, decisions: Vec<GiftCheck>) -> ReconcileReport {
        let timeout = self.config.call_timeout;
        let mut report = ReconcileReport::empty();

        for check in decisions.iter().filter(|check| check.decision.is_removal()) {
            if report.cart_deleted {
                debug!(line_item_id = %check.line_item_id, "cart deleted, skipping removal");
                continue;
            }

            let request = RemoveLineItem::new(cart_id.clone(), check.line_item_id.clone())
                .skip_revalidation();

            match tokio::time::timeout(timeout, self.remover.remove_line_item(request)).await {
                Ok(Ok(outcome)) => {
                    info!(
                        line_item_id = %check.line_item_id,
                        decision = ?check.decision,
                        "gift removed"
                    );
                    report.removed_gift_line_item_ids.push(check.line_item_id.clone());
                    report.cart_deleted = outcome.is_cart_deleted();
                }
                Ok(Err(e)) => {
                    error!(line_item_id = %check.line_item_id, error = %e, "failed to remove gift");
                    report.failed_line_item_ids.push(check.line_item_id.clone());
                }
                Err(_) => {
                    error!(
                        line_item_id = %check.line_item_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "gift removal timed out"
                    );
                    report.failed_line_item_ids.push(check.line_item_id.clone());
                }
            }
        }

        report.decisions = decisions;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_for_quantity() {
        assert_eq!(GiftDecision::for_quantity(1, 0), GiftDecision::RemoveUnentitled);
        assert_eq!(GiftDecision::for_quantity(2, 1), GiftDecision::RemoveExcess);
        assert_eq!(GiftDecision::for_quantity(1, 1), GiftDecision::Keep);
        assert_eq!(GiftDecision::for_quantity(1, 3), GiftDecision::Keep);
    }

    #[test]
    fn test_removal_messages() {
        assert_eq!(removal_message(0, true), None);
        assert_eq!(
            removal_message(2, true).as_deref(),
            Some("Free gifts removed - qualifying products no longer in cart")
        );
        assert_eq!(
            removal_message(1, false).as_deref(),
            Some("1 free gift removed due to cart changes")
        );
        assert_eq!(
            removal_message(3, false).as_deref(),
            Some("3 free gifts removed due to cart changes")
        );
    }

    #[test]
    fn test_config_deserializes_millis() {
        let config: ReconcilerConfig = serde_json::from_str(r#"{"call_timeout": 750}"#).unwrap();
        assert_eq!(config.call_timeout, Duration::from_millis(750));

        let config: ReconcilerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);
    }
}
