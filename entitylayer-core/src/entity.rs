//! The structural contract every stored entity must satisfy.
//!
//! An entity is any record persisted in the store. Beyond its own fields it
//! carries four lifecycle fields the operator layer manages on every write:
//! identity, creation time, update time, and status. This module defines the
//! trait exposing those fields and the constants naming them on the wire.

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::status::EntityStatus;

/// Wire names of the lifecycle fields the operator layer manages.
///
/// Entity types must serialize their lifecycle fields under exactly these
/// keys (see the [`Entity`] example); the operator layer uses them when
/// applying write defaults and building reload filters.
pub mod fields {
    /// Storage-assigned identity. Immutable after creation.
    pub const ID: &str = "_id";
    /// Creation timestamp. Set once, never overwritten.
    pub const CREATED_AT: &str = "createdAt";
    /// Last-write timestamp. Refreshed on every write.
    pub const UPDATED_AT: &str = "updatedAt";
    /// Lifecycle status code. Defaults to ACTIVE at creation.
    pub const STATUS: &str = "status";
}

/// Core trait that all entities stored through the operator layer must implement.
///
/// Every entity declares its collection name at compile time and exposes the
/// four lifecycle fields. The collection name is a hard naming contract
/// between the entity model and the storage layout: the lower-cased type
/// name (e.g. `Widget` -> `"widget"`).
///
/// The operator layer never constructs an entity itself; entities only come
/// into existence by deserializing the canonical stored document, so after
/// any successful write path [`Entity::id`] is always `Some`.
///
/// # Example
///
/// ```ignore
/// use entitylayer_core::{entity::Entity, status::EntityStatus};
/// use bson::{DateTime, oid::ObjectId};
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Widget {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<ObjectId>,
///     pub name: String,
///     #[serde(rename = "createdAt")]
///     pub created_at: DateTime,
///     #[serde(rename = "updatedAt")]
///     pub updated_at: DateTime,
///     pub status: EntityStatus,
/// }
///
/// impl Entity for Widget {
///     fn collection_name() -> &'static str { "widget" }
///     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
///     fn created_at(&self) -> DateTime { self.created_at }
///     fn updated_at(&self) -> DateTime { self.updated_at }
///     fn status(&self) -> EntityStatus { self.status }
/// }
/// ```
pub trait Entity: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns the name of the collection this entity type is stored in.
    ///
    /// This should be a static, lower-case identifier (e.g. "widget",
    /// "account"). An empty name is a contract violation and is rejected by
    /// the operator layer before any storage call.
    fn collection_name() -> &'static str;

    /// Returns this entity's storage-assigned identifier.
    ///
    /// `None` only before the entity has been persisted for the first time.
    fn id(&self) -> Option<&ObjectId>;

    /// Returns the timestamp this entity was first persisted.
    fn created_at(&self) -> DateTime;

    /// Returns the timestamp of the last write that touched this entity.
    fn updated_at(&self) -> DateTime;

    /// Returns this entity's lifecycle status.
    fn status(&self) -> EntityStatus;
}
