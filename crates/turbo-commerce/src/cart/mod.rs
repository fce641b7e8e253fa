//! Cart module.
//!
//! The cart itself is owned by the commerce platform. This module holds the
//! read-only snapshot the reconciler decides against.

mod snapshot;

pub use snapshot::{CartPartition, CartSnapshot, LineItem};
