//! Entity trait: identity + creation order.

use chrono::{DateTime, Utc};

/// A persisted record with a stable identity.
///
/// `created_at` together with `id` gives every entity a total, deterministic order,
/// which read paths use to sort sibling records.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;

    /// Sort key: creation time first, id as tie-breaker.
    fn creation_key(&self) -> (DateTime<Utc>, Self::Id) {
        (self.created_at(), self.id().clone())
    }
}
