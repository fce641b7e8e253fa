//! Cart reconciliation.
//!
//! Contains the ports to the cart platform and cache, and the
//! [`GiftReconciler`] that drives them.

mod ports;
mod reconciler;

pub use ports::{
    CacheInvalidator, CartReader, LineItemRemover, NoopCacheInvalidator, RemovalOutcome,
    RemoveLineItem, Revalidation, CART_CACHE_TAG,
};
pub use reconciler::{
    removal_message, GiftCheck, GiftDecision, GiftReconciler, ReconcileReport, ReconcilerConfig,
    DEFAULT_CALL_TIMEOUT,
};
