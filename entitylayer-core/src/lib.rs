//! Storage-agnostic contract for the entitylayer project.
//!
//! This crate defines what every stored entity looks like and how failures
//! are classified, independent of any concrete database driver:
//!
//! - **Entity contract** ([`entity`]) - The trait every persisted type must satisfy,
//!   plus the lifecycle field names it is bound to
//! - **Lifecycle status** ([`status`]) - The enumerated entity states and their
//!   single-character wire codes
//! - **Partial fields** ([`patch`]) - Presence-tracking patches for create and
//!   update operations
//! - **Error handling** ([`error`]) - The four-kind error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use entitylayer_core::{entity::Entity, status::EntityStatus};
//! use bson::{DateTime, oid::ObjectId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Widget {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//!     #[serde(rename = "createdAt")]
//!     pub created_at: DateTime,
//!     #[serde(rename = "updatedAt")]
//!     pub updated_at: DateTime,
//!     pub status: EntityStatus,
//! }
//!
//! impl Entity for Widget {
//!     fn collection_name() -> &'static str {
//!         "widget"
//!     }
//!
//!     fn id(&self) -> Option<&ObjectId> {
//!         self.id.as_ref()
//!     }
//!
//!     fn created_at(&self) -> DateTime {
//!         self.created_at
//!     }
//!
//!     fn updated_at(&self) -> DateTime {
//!         self.updated_at
//!     }
//!
//!     fn status(&self) -> EntityStatus {
//!         self.status
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as entitylayer_core;

pub mod entity;
pub mod error;
pub mod patch;
pub mod status;
