//! Free-gift promotion reconciliation for TurboCommerce storefronts.
//!
//! A cart's zero-priced line items are free gifts granted by promotions.
//! As the cart changes, this crate decides which of those gifts the cart is
//! still entitled to and removes the rest:
//!
//! - **Promotion**: typed gift promotions, the [`PromotionCatalog`](promotion::PromotionCatalog) port, and
//!   the entitlement calculator
//! - **Cart**: the read-only [`CartSnapshot`](cart::CartSnapshot) and price-based classification
//! - **Reconcile**: the [`GiftReconciler`](reconcile::GiftReconciler) pass and its cart/cache ports
//! - **Actions**: customer-facing mutations that trigger reconciliation
//! - **BigCommerce**: Management REST and Storefront GraphQL adapters
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_commerce::prelude::*;
//!
//! let config = BigCommerceConfig::from_env()?;
//! let management = ManagementClient::new(&config);
//! let storefront = Arc::new(StorefrontClient::new(&config, management.clone()));
//! let catalog = Arc::new(BigCommercePromotionCatalog::new(management));
//!
//! let reconciler = GiftReconciler::new(storefront.clone(), storefront, catalog);
//! let report = reconciler.reconcile(&CartId::new("8f1c...")).await?;
//! if let Some(message) = report.message {
//!     println!("{}", message);
//! }
//! ```

pub mod actions;
pub mod bigcommerce;
pub mod cart;
pub mod error;
pub mod ids;
pub mod money;
pub mod promotion;
pub mod reconcile;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{CartPartition, CartSnapshot, LineItem};

    // Promotions
    pub use crate::promotion::{
        calculate_entitlement, gifts_allowed, EntitlementMap, GiftItem, Promotion,
        PromotionCatalog,
    };

    // Reconciliation
    pub use crate::reconcile::{
        CacheInvalidator, CartReader, GiftDecision, GiftReconciler, LineItemRemover,
        ReconcileReport, ReconcilerConfig, RemovalOutcome, RemoveLineItem, Revalidation,
    };

    // Actions
    pub use crate::actions::{CartActions, GiftSelection, PruneReport, RemoveItemResult};

    // BigCommerce
    pub use crate::bigcommerce::{
        BigCommerceConfig, BigCommercePromotionCatalog, ManagementClient, StorefrontClient,
    };
}
