//! Gift entitlement calculation.
//!
//! Turns the paid quantities of a cart and the promotions resolved for each
//! paid product into the maximum quantity of each distinct gift the cart may
//! hold. Pure and synchronous; the reconciler does all I/O.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::ids::{GiftKey, ProductId};
use crate::promotion::Promotion;

/// Maximum allowed quantity per gift key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntitlementMap {
    allowed: BTreeMap<GiftKey, u64>,
}

impl EntitlementMap {
    /// Create an empty map. Every gift is allowed zero times.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to the allowance of `key`.
    pub fn grant(&mut self, key: GiftKey, count: u64) {
        let entry = self.allowed.entry(key).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Allowed quantity for a gift, zero when nothing grants it.
    pub fn allowed(&self, key: &GiftKey) -> u64 {
        self.allowed.get(key).copied().unwrap_or(0)
    }

    /// Iterate allowances in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&GiftKey, &u64)> {
        self.allowed.iter()
    }

    /// Number of gift keys with an entry.
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Check if no gift has an entry.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Activations earned by `qualifying_qty` paid units.
///
/// `minimum` below 1 is treated as 1.
pub fn gifts_allowed(qualifying_qty: u64, minimum: u32, apply_once: bool) -> u64 {
    let minimum = u64::from(minimum.max(1));
    if apply_once {
        u64::from(qualifying_qty >= minimum)
    } else {
        qualifying_qty / minimum
    }
}

/// Unique promotions across all lookups, in first-seen order.
pub fn dedupe_promotions(resolved: &BTreeMap<ProductId, Vec<Promotion>>) -> Vec<&Promotion> {
    let mut seen = HashSet::new();
    resolved
        .values()
        .flatten()
        .filter(|promo| seen.insert(promo.id))
        .collect()
}

/// Compute gift entitlement for a cart.
///
/// `qualifying` is the paid quantity per product. `resolved` holds the
/// promotions of each paid product whose lookup succeeded; products whose
/// lookup failed are simply absent and contribute nothing.
///
/// Each promotion is counted once, using the summed quantity of every paid
/// product that reached it. Its activation count is added to each of its
/// gift keys, independent of the gift's per-activation quantity.
pub fn calculate_entitlement(
    qualifying: &BTreeMap<ProductId, u64>,
    resolved: &BTreeMap<ProductId, Vec<Promotion>>,
) -> EntitlementMap {
    let mut entitlement = EntitlementMap::new();

    for promo in dedupe_promotions(resolved) {
        let qualifying_qty: u64 = resolved
            .iter()
            .filter(|(_, promos)| promos.iter().any(|p| p.id == promo.id))
            .map(|(product_id, _)| qualifying.get(product_id).copied().unwrap_or(0))
            .sum();

        if qualifying_qty == 0 {
            debug!(promotion_id = %promo.id, "no qualifying quantity, skipping");
            continue;
        }

        let activations = gifts_allowed(qualifying_qty, promo.minimum_quantity, promo.apply_once);
        debug!(
            promotion_id = %promo.id,
            qualifying_qty,
            minimum = promo.minimum_quantity,
            apply_once = promo.apply_once,
            activations,
            "promotion evaluated"
        );

        for gift in &promo.gift_items {
            entitlement.grant(gift.key(), activations);
        }
    }

    entitlement
}
