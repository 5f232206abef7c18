//! A typed entity access layer over MongoDB.
//!
//! This crate is the primary entry point for the entitylayer project. It
//! re-exports the entity contract and error taxonomy from
//! `entitylayer-core` and the MongoDB connector, operator layer, and
//! transaction coordinator from `entitylayer-mongodb`.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use entitylayer::prelude::*;
//! use bson::{DateTime, doc, oid::ObjectId};
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
//!     fn collection_name() -> &'static str { "widget" }
//!     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
//!     fn created_at(&self) -> DateTime { self.created_at }
//!     fn updated_at(&self) -> DateTime { self.updated_at }
//!     fn status(&self) -> EntityStatus { self.status }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = Arc::new(MongoConnector::new(
//!         "mongodb://localhost:27017",
//!         "my_database",
//!     ));
//!     let widgets = connector.entities::<Widget>();
//!
//!     // Create applies lifecycle defaults and returns the stored copy.
//!     let widget = widgets.create(Patch::new().set("name", "x")).await?;
//!     assert_eq!(widget.status, EntityStatus::Active);
//!
//!     // Upsert by id, then reload the canonical document.
//!     let id = *widget.id().unwrap();
//!     let widget = widgets
//!         .update_one(id, Patch::new().set("status", EntityStatus::Deleted), None)
//!         .await?;
//!     assert_eq!(widget.status, EntityStatus::Deleted);
//!
//!     widgets.delete(doc! { "_id": id }).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Transactions
//!
//! A [`TransactionCoordinator`](prelude::TransactionCoordinator) wraps a
//! unit of work in an atomic session; operator calls made through the
//! `*_with_session` variants participate in the same atomic unit, and a
//! failing unit of work rolls everything back while the original error
//! propagates unmodified.

pub use entitylayer_core::{entity, error, patch, status};
pub use entitylayer_mongodb::{collection, connector, transaction};

pub mod prelude;
