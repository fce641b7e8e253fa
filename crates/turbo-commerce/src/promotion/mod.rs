//! Free-gift promotions.
//!
//! Contains the normalized promotion model, the catalog port, and the
//! entitlement calculator.

mod catalog;
mod entitlement;
mod model;

pub use catalog::PromotionCatalog;
pub use entitlement::{calculate_entitlement, dedupe_promotions, gifts_allowed, EntitlementMap};
pub use model::{GiftItem, Promotion};
